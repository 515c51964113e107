//! Player service
//!
//! Runs the controller on a single task. UI commands arrive over an mpsc
//! channel, background outcomes over the controller's signal channel, and
//! events fan out to subscribers through a broadcast channel.

use crate::controller::{PlaybackController, Signal};
use crate::error::{PlaybackError, Result};
use crate::events::PlaybackEvent;
use crate::progress::ProgressBar;
use crate::session::PlaybackSession;
use cadence_core::{PlayMode, PlaylistSnapshot, Track};
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Capacity of the event fan-out
const EVENT_CAPACITY: usize = 256;

/// Commands sent to the player service
#[derive(Debug)]
pub enum PlaybackCommand {
    /// Flip play/pause
    TogglePlay,

    Pause,

    /// Skip to next track
    Next,

    /// Go to previous track
    Previous,

    /// Seek to position (in seconds)
    Seek(f64),

    /// Seek to a fraction (0.0-1.0) of the track
    SeekByClick(f64),

    /// Set volume (clamped to 0-100)
    SetVolume(i32),

    ToggleMute,

    ToggleMode,

    SetMode(PlayMode),

    SetTrack(Track),

    PlayAll {
        snapshot: PlaylistSnapshot,
        start_index: usize,
    },

    ShufflePlay(PlaylistSnapshot),

    SelectFromList {
        track: Track,
        index: usize,
        snapshot: PlaylistSnapshot,
    },

    StartDrag {
        bar: ProgressBar,
        x: f64,
    },

    DragTo {
        bar: Option<ProgressBar>,
        x: f64,
    },

    EndDrag,

    ClearPlaylist,

    /// Reply with a copy of the session
    Snapshot(oneshot::Sender<PlaybackSession>),

    /// Stop the service and hand the controller back
    Shutdown,
}

/// Handle to the player service for sending commands
#[derive(Clone)]
pub struct PlayerHandle {
    command_tx: mpsc::UnboundedSender<PlaybackCommand>,
    events_tx: broadcast::Sender<PlaybackEvent>,
}

impl PlayerHandle {
    pub fn send(&self, command: PlaybackCommand) -> Result<()> {
        self.command_tx
            .send(command)
            .map_err(|_| PlaybackError::ServiceClosed)
    }

    pub fn toggle_play(&self) -> Result<()> {
        self.send(PlaybackCommand::TogglePlay)
    }

    pub fn pause(&self) -> Result<()> {
        self.send(PlaybackCommand::Pause)
    }

    pub fn next(&self) -> Result<()> {
        self.send(PlaybackCommand::Next)
    }

    pub fn previous(&self) -> Result<()> {
        self.send(PlaybackCommand::Previous)
    }

    pub fn seek(&self, seconds: f64) -> Result<()> {
        self.send(PlaybackCommand::Seek(seconds))
    }

    pub fn set_volume(&self, level: i32) -> Result<()> {
        self.send(PlaybackCommand::SetVolume(level))
    }

    pub fn toggle_mute(&self) -> Result<()> {
        self.send(PlaybackCommand::ToggleMute)
    }

    pub fn toggle_mode(&self) -> Result<()> {
        self.send(PlaybackCommand::ToggleMode)
    }

    pub fn play_all(&self, snapshot: PlaylistSnapshot, start_index: usize) -> Result<()> {
        self.send(PlaybackCommand::PlayAll {
            snapshot,
            start_index,
        })
    }

    pub fn shuffle_play(&self, snapshot: PlaylistSnapshot) -> Result<()> {
        self.send(PlaybackCommand::ShufflePlay(snapshot))
    }

    /// Current session as seen by the service
    pub async fn session(&self) -> Result<PlaybackSession> {
        let (reply, response) = oneshot::channel();
        self.send(PlaybackCommand::Snapshot(reply))?;
        response.await.map_err(|_| PlaybackError::ServiceClosed)
    }

    /// Subscribe to playback events
    pub fn subscribe(&self) -> broadcast::Receiver<PlaybackEvent> {
        self.events_tx.subscribe()
    }

    pub fn shutdown(&self) -> Result<()> {
        self.send(PlaybackCommand::Shutdown)
    }
}

impl std::fmt::Debug for PlayerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlayerHandle")
            .field("closed", &self.command_tx.is_closed())
            .finish_non_exhaustive()
    }
}

enum Wake {
    Command(Option<PlaybackCommand>),
    Signal(Signal),
}

/// Event loop that owns the controller
pub struct PlayerService {
    controller: PlaybackController,
    commands: mpsc::UnboundedReceiver<PlaybackCommand>,
    events: broadcast::Sender<PlaybackEvent>,
}

impl PlayerService {
    pub fn new(controller: PlaybackController) -> (Self, PlayerHandle) {
        let (command_tx, commands) = mpsc::unbounded_channel();
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        let handle = PlayerHandle {
            command_tx,
            events_tx: events.clone(),
        };
        let service = Self {
            controller,
            commands,
            events,
        };
        (service, handle)
    }

    /// Run the service on its own task
    pub fn spawn(controller: PlaybackController) -> (PlayerHandle, JoinHandle<PlaybackController>) {
        let (service, handle) = Self::new(controller);
        (handle, tokio::spawn(service.run()))
    }

    /// Process commands and signals until shutdown or every handle is dropped
    ///
    /// Returns the controller, torn down, so the caller can persist it.
    pub async fn run(mut self) -> PlaybackController {
        info!("Player service started");

        loop {
            let wake = tokio::select! {
                command = self.commands.recv() => Wake::Command(command),
                Some(signal) = self.controller.next_signal() => Wake::Signal(signal),
            };

            match wake {
                Wake::Command(None | Some(PlaybackCommand::Shutdown)) => break,
                Wake::Command(Some(command)) => self.execute(command),
                Wake::Signal(signal) => self.controller.handle_signal(signal),
            }
            self.publish_events();
        }

        self.controller.teardown();
        self.publish_events();
        info!("Player service stopped");
        self.controller
    }

    fn execute(&mut self, command: PlaybackCommand) {
        debug!(?command, "Executing command");
        let controller = &mut self.controller;

        let result = match command {
            PlaybackCommand::TogglePlay => controller.toggle_play(),
            PlaybackCommand::Pause => {
                controller.pause();
                Ok(())
            }
            PlaybackCommand::Next => controller.next(),
            PlaybackCommand::Previous => controller.prev(),
            PlaybackCommand::Seek(seconds) => controller.seek(seconds),
            PlaybackCommand::SeekByClick(fraction) => controller.seek_by_click(fraction),
            PlaybackCommand::SetVolume(level) => {
                controller.set_volume(level);
                Ok(())
            }
            PlaybackCommand::ToggleMute => {
                controller.toggle_mute();
                Ok(())
            }
            PlaybackCommand::ToggleMode => {
                controller.toggle_mode();
                Ok(())
            }
            PlaybackCommand::SetMode(mode) => {
                controller.set_mode(mode);
                Ok(())
            }
            PlaybackCommand::SetTrack(track) => controller.set_track(track),
            PlaybackCommand::PlayAll {
                snapshot,
                start_index,
            } => controller.play_all(snapshot, start_index),
            PlaybackCommand::ShufflePlay(snapshot) => controller.shuffle_play(snapshot),
            PlaybackCommand::SelectFromList {
                track,
                index,
                snapshot,
            } => controller.select_from_list(track, index, snapshot),
            PlaybackCommand::StartDrag { bar, x } => {
                controller.start_drag(bar, x);
                Ok(())
            }
            PlaybackCommand::DragTo { bar, x } => {
                controller.drag_to(bar, x);
                Ok(())
            }
            PlaybackCommand::EndDrag => {
                controller.end_drag();
                Ok(())
            }
            PlaybackCommand::ClearPlaylist => {
                controller.clear_playlist();
                Ok(())
            }
            PlaybackCommand::Snapshot(reply) => {
                let _ = reply.send(controller.session().clone());
                Ok(())
            }
            // Handled by the loop
            PlaybackCommand::Shutdown => Ok(()),
        };

        if let Err(err) = result {
            warn!(error = %err, "Command failed");
        }
    }

    fn publish_events(&mut self) {
        for event in self.controller.drain_events() {
            // No subscribers is fine
            let _ = self.events.send(event);
        }
    }
}
