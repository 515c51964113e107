//! Playback controller - core orchestration
//!
//! Owns the session, drives the resource and turns every asynchronous
//! outcome (load, play, timers, telemetry, media events) into a [`Signal`]
//! handled on the controller's own task.
//!
//! Play requests carry a generation. `pause`, a track change or a new play
//! bump it, and any settlement or timer from an older generation is ignored.
//! Spawned loads and plays check the generation before touching the
//! resource, and a superseded play that started anyway is paused again.
//! At most one play request is pending at a time.

use crate::{
    error::{PlaybackError, ResourceError, Result},
    events::{PlaybackEvent, SessionObserver, SessionObservers},
    mode::{Direction, ModeSelector, Step},
    progress::{DragState, DragUpdate, PointerCapture, ProgressBar, ProgressTracker},
    resource::{MediaEvent, ResourceLease, SharedResource},
    session::PlaybackSession,
    shuffle::ShuffleOrder,
    types::{PlaybackConfig, PlaybackState},
    volume::VolumeChange,
};
use cadence_core::{
    PlayMode, PlayStatReporter, PlaylistSnapshot, SessionIdentity, Track, TrackId,
};
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, error, info, warn};

/// Retries granted to a play request that gets interrupted
const PLAY_RETRIES: u8 = 1;

/// Asynchronous outcome delivered back to the controller
#[derive(Debug)]
pub enum Signal {
    /// `load` settled
    Loaded {
        generation: u64,
        url: String,
        result: std::result::Result<f64, ResourceError>,
    },

    /// `play` settled
    PlaySettled {
        generation: u64,
        result: std::result::Result<(), ResourceError>,
    },

    /// Advance delay elapsed after a skip
    AutoplayDue { generation: u64 },

    /// Retry delay elapsed after an interrupted play
    RetryDue { generation: u64, retries_left: u8 },

    /// Play-stat report finished
    Reported {
        track_id: TrackId,
        result: cadence_core::Result<()>,
    },

    /// Forwarded from the resource subscription
    Media(MediaEvent),
}

/// Generation counter shared with the tasks it guards
///
/// A spawned load or play checks it before touching the resource, so work
/// superseded before it ran never reaches the backend.
#[derive(Debug, Clone, Default)]
struct Generation(Arc<AtomicU64>);

impl Generation {
    fn bump(&self) -> u64 {
        self.0.fetch_add(1, Ordering::AcqRel) + 1
    }

    fn current(&self) -> u64 {
        self.0.load(Ordering::Acquire)
    }

    fn is_current(&self, generation: u64) -> bool {
        self.current() == generation
    }
}

#[derive(Debug, Clone, Copy)]
struct PendingPlay {
    generation: u64,
    retries_left: u8,
}

/// The playback state machine
///
/// Must be created inside a Tokio runtime: media events are forwarded from
/// the resource by a spawned task. Background work reports back through
/// [`next_signal`](Self::next_signal) / [`handle_signal`](Self::handle_signal),
/// or [`settle`](Self::settle) which drains until nothing is in flight.
pub struct PlaybackController {
    resource: ResourceLease,
    reporter: Arc<dyn PlayStatReporter>,
    identity: SessionIdentity,
    config: PlaybackConfig,

    session: PlaybackSession,
    state: PlaybackState,
    shuffle_order: Option<ShuffleOrder>,
    progress: ProgressTracker,

    observers: SessionObservers,

    // Event queue for UI synchronization
    pending_events: Vec<PlaybackEvent>,

    play_generation: Generation,
    load_generation: Generation,
    load_pending: bool,
    pending_play: Option<PendingPlay>,
    // Play once metadata arrives, with this many retries
    play_when_ready: Option<u8>,
    metadata_ready: bool,

    signals_tx: mpsc::UnboundedSender<Signal>,
    signals_rx: mpsc::UnboundedReceiver<Signal>,
    in_flight: usize,
}

impl PlaybackController {
    /// Create a controller with a fresh session
    pub fn new(
        resource: &SharedResource,
        reporter: Arc<dyn PlayStatReporter>,
        config: PlaybackConfig,
    ) -> Result<Self> {
        let session = PlaybackSession::new(&config);
        Self::with_session(resource, reporter, config, session)
    }

    /// Create a controller around a restored session
    ///
    /// Fails with [`PlaybackError::ResourceBusy`] if another controller holds
    /// the resource.
    pub fn with_session(
        resource: &SharedResource,
        reporter: Arc<dyn PlayStatReporter>,
        config: PlaybackConfig,
        mut session: PlaybackSession,
    ) -> Result<Self> {
        let resource = resource.lease()?;
        let (signals_tx, signals_rx) = mpsc::unbounded_channel();
        spawn_media_forwarder(resource.subscribe(), signals_tx.clone());

        // Nothing is playing on a fresh resource
        session.is_playing = false;
        session.first_load_completed = false;

        let mut controller = Self {
            resource,
            reporter,
            identity: SessionIdentity::authenticated(),
            config,
            session,
            state: PlaybackState::Idle,
            shuffle_order: None,
            progress: ProgressTracker::default(),
            observers: SessionObservers::default(),
            pending_events: Vec::new(),
            play_generation: Generation::default(),
            load_generation: Generation::default(),
            load_pending: false,
            pending_play: None,
            play_when_ready: None,
            metadata_ready: false,
            signals_tx,
            signals_rx,
            in_flight: 0,
        };

        controller.resource.set_volume(controller.session.volume.level());
        controller.resource.set_muted(controller.session.is_muted());
        if controller.session.play_mode == PlayMode::Random {
            controller.regenerate_order_keeping_track();
        }

        Ok(controller)
    }

    #[must_use]
    pub fn with_identity(mut self, identity: SessionIdentity) -> Self {
        self.identity = identity;
        self
    }

    #[must_use]
    pub fn with_pointer_capture(mut self, capture: Arc<dyn PointerCapture>) -> Self {
        self.progress = ProgressTracker::new(capture);
        self
    }

    /// Register an observer; observers run in registration order
    pub fn subscribe(&mut self, observer: Arc<dyn SessionObserver>) {
        self.observers.subscribe(observer);
    }

    // ===== Playback Control =====

    /// Flip between playing and paused
    ///
    /// This is a user gesture: it unlocks autoplay for the rest of the session.
    pub fn toggle_play(&mut self) -> Result<()> {
        if self.session.current_track.is_none() {
            self.surface_error("Select a track to play first");
            return Err(PlaybackError::NoTrackLoaded);
        }

        self.mark_interacted();

        let starting = self.pending_play.is_some() || self.play_when_ready.is_some();
        if self.session.is_playing || starting {
            self.pause();
        } else {
            if self.identity.is_guest() {
                self.notice("Guest listening plays a preview only");
            }
            if !self.metadata_ready && !self.load_pending {
                // Nothing loaded and nothing loading; the gesture retries the load
                info!("Retrying load of the current track");
                self.reload_current_track();
                self.play_when_ready = Some(PLAY_RETRIES);
                return Ok(());
            }
            self.attempt_autoplay_with(PLAY_RETRIES);
        }
        Ok(())
    }

    /// Pause playback, cancelling any pending play request
    pub fn pause(&mut self) {
        self.cancel_pending_play();
        self.resource.pause();
        self.session.is_playing = false;

        if self.state == PlaybackState::Playing {
            self.set_state(PlaybackState::Paused);
        }
    }

    /// Play if a user gesture has been seen this session
    pub fn attempt_autoplay(&mut self) {
        self.attempt_autoplay_with(PLAY_RETRIES);
    }

    /// Skip to next track
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Result<()> {
        self.navigate(Direction::Forward)
    }

    /// Go to previous track
    pub fn prev(&mut self) -> Result<()> {
        self.navigate(Direction::Backward)
    }

    /// Make `track` current
    ///
    /// Re-setting the track that is already loaded resumes in place without
    /// reloading. Otherwise the resource is paused, a play-stat is reported,
    /// and the track is loaded; playback starts on load only after a user
    /// gesture.
    pub fn set_track(&mut self, track: Track) -> Result<()> {
        if !track.has_stream() {
            self.surface_error(format!("\"{}\" has no playable stream", track.name));
            return Err(PlaybackError::MissingStreamUrl(track.id));
        }

        let same_id = self.session.current_track_id() == Some(&track.id);
        if same_id {
            if self.resource.source().as_deref() == Some(track.url.as_str()) {
                debug!(track_id = %track.id, "Track already loaded, resuming in place");
                self.resource.seek(self.session.current_time);
                if self.session.is_playing {
                    self.request_play(PLAY_RETRIES);
                }
                return Ok(());
            }
            let loading_same_url = self.state == PlaybackState::Loading
                && self
                    .session
                    .current_track
                    .as_ref()
                    .is_some_and(|current| current.url == track.url);
            if loading_same_url {
                debug!(track_id = %track.id, "Track already loading");
                return Ok(());
            }
        }

        self.pause();
        self.report_play(&track.id);
        // A later pause clears this, so a pause during loading wins
        if self.session.user_interacted {
            self.play_when_ready = Some(PLAY_RETRIES);
        }

        if !same_id {
            self.session.reset_position();
            self.session.duration = 0.0;
        }

        let url = track.url.clone();
        let track_id = track.id.clone();
        let previous = self.session.current_track.replace(track);

        info!(track_id = %track_id, "Loading track");
        self.issue_load(url);

        if !same_id {
            self.emit(PlaybackEvent::TrackChanged {
                track_id: Some(track_id),
                previous_track_id: previous.map(|t| t.id),
            });
        }
        self.set_state(PlaybackState::Loading);
        Ok(())
    }

    /// Replace the playlist and start playing from `start_index`
    ///
    /// In random mode a new shuffle order is built and playback starts at its
    /// first entry instead.
    pub fn play_all(&mut self, snapshot: PlaylistSnapshot, start_index: usize) -> Result<()> {
        if snapshot.is_empty() {
            warn!("Play all requested with an empty playlist");
            self.notice("The playlist is empty");
            return Err(PlaybackError::EmptyPlaylist);
        }
        if start_index >= snapshot.len() {
            return Err(PlaybackError::IndexOutOfBounds(start_index));
        }

        self.pause();
        self.replace_playlist(snapshot);

        let index = if self.session.play_mode == PlayMode::Random {
            self.shuffle_order = Some(ShuffleOrder::generate(self.session.playlist.len()));
            0
        } else {
            start_index
        };

        let track = self
            .active_track(index)
            .cloned()
            .ok_or(PlaybackError::IndexOutOfBounds(index))?;
        self.session.current_index = index;
        self.mark_interacted();
        self.session.reset_position();
        self.set_track(track)?;
        self.attempt_autoplay_with(PLAY_RETRIES);
        Ok(())
    }

    /// Switch to random mode and play `snapshot` in a fresh shuffle order
    pub fn shuffle_play(&mut self, snapshot: PlaylistSnapshot) -> Result<()> {
        if snapshot.is_empty() {
            warn!("Shuffle play requested with an empty playlist");
            self.notice("The playlist is empty");
            return Err(PlaybackError::EmptyPlaylist);
        }

        if self.session.play_mode != PlayMode::Random {
            self.session.play_mode = PlayMode::Random;
            self.emit(PlaybackEvent::ModeChanged {
                mode: PlayMode::Random,
            });
        }
        self.play_all(snapshot, 0)
    }

    /// Play a track picked from a list view
    ///
    /// In random mode the order is regenerated from `snapshot` and the index
    /// is relocated to wherever the picked track landed, so the pick always
    /// plays.
    pub fn select_from_list(
        &mut self,
        track: Track,
        index: usize,
        snapshot: PlaylistSnapshot,
    ) -> Result<()> {
        let index = if self.session.play_mode == PlayMode::Random {
            let snapshot_index = snapshot
                .position_of(&track.id)
                .ok_or_else(|| PlaybackError::TrackNotInPlaylist(track.id.clone()))?;
            let order = ShuffleOrder::generate(snapshot.len());
            let position = order
                .position_of(snapshot_index)
                .ok_or(PlaybackError::IndexOutOfBounds(snapshot_index))?;
            self.replace_playlist(snapshot);
            self.shuffle_order = Some(order);
            position
        } else {
            if index >= snapshot.len() {
                return Err(PlaybackError::IndexOutOfBounds(index));
            }
            self.replace_playlist(snapshot);
            index
        };

        self.session.current_index = index;
        self.mark_interacted();
        self.set_track(track)?;
        self.attempt_autoplay_with(PLAY_RETRIES);
        Ok(())
    }

    /// Called when the resource reports the end of the current track
    pub fn on_ended(&mut self) -> Result<()> {
        let Some(track_id) = self.session.current_track_id().cloned() else {
            return Ok(());
        };

        self.session.is_playing = false;
        self.set_state(PlaybackState::Ended);
        self.emit(PlaybackEvent::TrackFinished { track_id });

        if self.session.play_mode == PlayMode::Single {
            self.resource.seek(0.0);
            self.session.current_time = 0.0;
            self.session.progress_percent = 0.0;
            self.emit_position();
            self.attempt_autoplay_with(PLAY_RETRIES);
            Ok(())
        } else {
            self.next()
        }
    }

    /// Drop the playlist and the current track
    pub fn clear_playlist(&mut self) {
        self.pause();
        // Any load still in flight belongs to the cleared track
        self.load_generation.bump();
        self.load_pending = false;
        self.metadata_ready = false;
        self.progress.teardown();

        let previous = self.session.current_track.take();
        self.session.playlist = PlaylistSnapshot::default();
        self.shuffle_order = None;
        self.session.current_index = 0;
        self.session.reset_position();
        self.session.duration = 0.0;

        self.emit(PlaybackEvent::PlaylistChanged { length: 0 });
        if let Some(previous) = previous {
            self.emit(PlaybackEvent::TrackChanged {
                track_id: None,
                previous_track_id: Some(previous.id),
            });
        }
        self.set_state(PlaybackState::Idle);
        info!("Playlist cleared");
    }

    /// Load the restored current track, parked at its saved position
    pub fn restore_current_track(&mut self) -> Result<()> {
        match self.session.current_track.clone() {
            Some(track) => self.set_track(track),
            None => Ok(()),
        }
    }

    /// Release UI-bound state when the front-end goes away
    ///
    /// Playback itself is left as is; the session outlives the UI.
    pub fn teardown(&mut self) {
        self.progress.teardown();
        self.identity.forget_guest_id();
        debug!(
            current_time = self.session.current_time,
            is_playing = self.session.is_playing,
            "Controller torn down"
        );
    }

    // ===== Mode =====

    /// Cycle Sequential -> Single -> Loop -> Random
    pub fn toggle_mode(&mut self) -> PlayMode {
        let mode = self.session.play_mode.next();
        self.set_mode(mode);
        self.notice(format!("{} mode", mode.display_name()));
        mode
    }

    /// Switch play mode
    ///
    /// Entering random mode regenerates the shuffle order. The current index
    /// is relocated so it keeps pointing at the current track.
    pub fn set_mode(&mut self, mode: PlayMode) {
        if self.session.play_mode == mode {
            return;
        }
        self.session.play_mode = mode;

        if mode == PlayMode::Random {
            self.regenerate_order_keeping_track();
        } else {
            self.shuffle_order = None;
            if let Some(index) = self.current_snapshot_index() {
                self.session.current_index = index;
            }
        }

        info!(mode = %mode, "Play mode changed");
        self.emit(PlaybackEvent::ModeChanged { mode });
    }

    // ===== Volume Control =====

    /// Set volume (clamped to 0-100); 0 mutes, anything above unmutes
    pub fn set_volume(&mut self, level: i32) {
        let change = self.session.volume.set_level(level);
        self.apply_volume_change(change);
    }

    pub fn toggle_mute(&mut self) {
        self.session.volume.toggle_mute();
        self.apply_volume_change(VolumeChange {
            level: false,
            muted: true,
        });
    }

    // ===== Seeking and Progress =====

    /// Seek to a position in seconds
    pub fn seek(&mut self, seconds: f64) -> Result<()> {
        if self.session.current_track.is_none() {
            return Err(PlaybackError::NoTrackLoaded);
        }
        self.apply_seek(seconds);
        Ok(())
    }

    /// Seek to a fraction (0.0-1.0) of the track
    pub fn seek_by_click(&mut self, fraction: f64) -> Result<()> {
        match ProgressTracker::seek_time(fraction, self.session.duration) {
            Some(seconds) => self.seek(seconds),
            None => {
                debug!("Ignoring click seek without a known duration");
                Ok(())
            }
        }
    }

    /// Begin dragging the progress bar; returns false if no drag started
    pub fn start_drag(&mut self, bar: ProgressBar, x: f64) -> bool {
        match self.progress.start_drag(bar, x, self.session.duration) {
            Some(percent) => {
                self.show_drag_percent(percent);
                true
            }
            None => false,
        }
    }

    /// Move the drag pointer; a missing bar ends the drag
    pub fn drag_to(&mut self, bar: Option<ProgressBar>, x: f64) {
        match self.progress.drag_to(bar, x, self.session.duration) {
            DragUpdate::Moved(percent) => self.show_drag_percent(percent),
            DragUpdate::Ended(seek) => {
                debug!("Drag target lost, ending drag");
                if let Some(seconds) = seek {
                    self.apply_seek(seconds);
                }
            }
            DragUpdate::Inactive => {}
        }
    }

    /// Finish the drag and seek once; returns the seek time
    pub fn end_drag(&mut self) -> Option<f64> {
        let seek = self.progress.end_drag(self.session.duration);
        if let Some(seconds) = seek {
            self.apply_seek(seconds);
        }
        seek
    }

    /// Apply a raw media event from the resource
    pub fn handle_media_event(&mut self, event: MediaEvent) {
        match event {
            MediaEvent::MetadataReady { duration } => self.update_duration(duration),
            MediaEvent::TimeUpdated { current_time } => {
                // Drag owns the displayed position; stale updates belong to the old track
                if self.progress.is_dragging() || self.state == PlaybackState::Loading {
                    return;
                }
                self.session.current_time = current_time.max(0.0);
                self.session.progress_percent =
                    ProgressTracker::progress_percent(current_time, self.session.duration);
                self.emit_position();
            }
            MediaEvent::BufferUpdated { buffered_end } => {
                if let Some(percent) =
                    ProgressTracker::buffer_percent(buffered_end, self.session.duration)
                {
                    self.session.buffer_percent = percent;
                    self.emit(PlaybackEvent::BufferUpdate {
                        buffer_percent: percent,
                    });
                }
            }
            MediaEvent::Ended => {
                if self.state == PlaybackState::Loading {
                    debug!("Ignoring end of the previous track");
                    return;
                }
                if let Err(err) = self.on_ended() {
                    warn!(error = %err, "Auto-advance failed");
                }
            }
        }
    }

    // ===== Signals =====

    /// Wait for the next background outcome
    pub async fn next_signal(&mut self) -> Option<Signal> {
        self.signals_rx.recv().await
    }

    /// Apply a background outcome
    pub fn handle_signal(&mut self, signal: Signal) {
        if !matches!(signal, Signal::Media(_)) {
            self.in_flight = self.in_flight.saturating_sub(1);
        }

        match signal {
            Signal::Loaded {
                generation,
                url,
                result,
            } => self.on_loaded(generation, &url, result),
            Signal::PlaySettled { generation, result } => self.on_play_settled(generation, result),
            Signal::AutoplayDue { generation } => {
                if self.play_generation.is_current(generation) {
                    self.attempt_autoplay_with(PLAY_RETRIES);
                } else {
                    debug!(generation, "Ignoring stale autoplay timer");
                }
            }
            Signal::RetryDue {
                generation,
                retries_left,
            } => {
                if self.play_generation.is_current(generation) {
                    debug!(generation, "Retrying interrupted play");
                    self.attempt_autoplay_with(retries_left);
                } else {
                    debug!(generation, "Ignoring stale retry");
                }
            }
            Signal::Reported { track_id, result } => {
                if let Err(err) = result {
                    warn!(track_id = %track_id, error = %err, "Failed to report play");
                }
            }
            Signal::Media(event) => self.handle_media_event(event),
        }
    }

    /// Process signals until no background work is in flight
    pub async fn settle(&mut self) {
        while self.in_flight > 0 {
            match self.signals_rx.recv().await {
                Some(signal) => self.handle_signal(signal),
                None => break,
            }
        }
    }

    /// Whether no background work is in flight
    pub fn is_settled(&self) -> bool {
        self.in_flight == 0
    }

    // ===== State Queries =====

    pub fn session(&self) -> &PlaybackSession {
        &self.session
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn config(&self) -> &PlaybackConfig {
        &self.config
    }

    pub fn identity(&self) -> &SessionIdentity {
        &self.identity
    }

    pub fn shuffle_order(&self) -> Option<&ShuffleOrder> {
        self.shuffle_order.as_ref()
    }

    pub fn is_dragging(&self) -> bool {
        self.progress.is_dragging()
    }

    pub fn drag_state(&self) -> Option<DragState> {
        self.progress.drag_state()
    }

    /// Length of the sequence navigation walks
    pub fn active_len(&self) -> usize {
        match self.active_order() {
            Some(order) => order.len(),
            None => self.session.playlist.len(),
        }
    }

    /// Track at a position of the active sequence
    pub fn active_track(&self, index: usize) -> Option<&Track> {
        let snapshot_index = match self.active_order() {
            Some(order) => order.get(index)?,
            None => index,
        };
        self.session.playlist.get(snapshot_index)
    }

    /// Drain pending events
    ///
    /// Events accumulate until drained; the player service drains after
    /// every step.
    pub fn drain_events(&mut self) -> Vec<PlaybackEvent> {
        std::mem::take(&mut self.pending_events)
    }

    pub fn has_pending_events(&self) -> bool {
        !self.pending_events.is_empty()
    }

    // ===== Internals =====

    fn navigate(&mut self, direction: Direction) -> Result<()> {
        self.pause();

        let step = ModeSelector::step(
            self.session.play_mode,
            self.session.current_index,
            self.active_len(),
            direction,
        );

        match step {
            Step::Index(index) => {
                let track = self
                    .active_track(index)
                    .cloned()
                    .ok_or(PlaybackError::IndexOutOfBounds(index))?;
                self.session.current_index = index;
                self.mark_interacted();
                // Navigating always starts the target from the top
                self.session.reset_position();
                self.set_track(track)?;

                let generation = self.play_generation.current();
                self.schedule(
                    self.config.advance_delay(),
                    Signal::AutoplayDue { generation },
                );
            }
            Step::Stop => {
                info!(index = self.session.current_index, "Reached the end of the playlist");
                self.session.is_playing = false;
            }
            Step::Stay => debug!(?direction, "Nothing to navigate to"),
        }
        Ok(())
    }

    fn attempt_autoplay_with(&mut self, retries_left: u8) {
        if !self.session.first_load_completed {
            debug!("Autoplay held until the first user play");
            return;
        }
        self.request_play(retries_left);
    }

    fn request_play(&mut self, retries_left: u8) {
        if self.session.current_track.is_none() || self.state == PlaybackState::Playing {
            return;
        }
        if self.pending_play.is_some() {
            debug!("Play already in flight");
            return;
        }
        if !self.metadata_ready {
            self.play_when_ready = Some(retries_left);
            return;
        }
        self.issue_play(retries_left);
    }

    fn issue_play(&mut self, retries_left: u8) {
        let generation = self.play_generation.bump();
        self.pending_play = Some(PendingPlay {
            generation,
            retries_left,
        });

        debug!(generation, "Issuing play");
        let resource = self.resource.handle();
        let latest = self.play_generation.clone();
        self.spawn(async move {
            let result = if latest.is_current(generation) {
                resource.play().await
            } else {
                Err(ResourceError::Interrupted)
            };
            Signal::PlaySettled { generation, result }
        });
    }

    fn issue_load(&mut self, url: String) {
        self.metadata_ready = false;
        self.load_pending = true;
        let generation = self.load_generation.bump();

        debug!(generation, url = %url, "Issuing load");
        let resource = self.resource.handle();
        let latest = self.load_generation.clone();
        self.spawn(async move {
            let result = if latest.is_current(generation) {
                resource.load(&url).await
            } else {
                Err(ResourceError::Interrupted)
            };
            Signal::Loaded {
                generation,
                url,
                result,
            }
        });
    }

    /// Load the current track again, keeping the play intent
    fn reload_current_track(&mut self) {
        let Some(url) = self.session.current_track.as_ref().map(|t| t.url.clone()) else {
            return;
        };
        let resume = self.session.is_playing
            || self.pending_play.is_some()
            || self.play_when_ready.is_some();
        self.pause();
        if resume {
            self.play_when_ready = Some(PLAY_RETRIES);
        }
        self.issue_load(url);
        self.set_state(PlaybackState::Loading);
    }

    fn cancel_pending_play(&mut self) {
        self.play_generation.bump();
        self.play_when_ready = None;
        if let Some(pending) = self.pending_play.take() {
            debug!(generation = pending.generation, "Cancelled pending play");
        }
    }

    fn on_loaded(&mut self, generation: u64, url: &str, result: std::result::Result<f64, ResourceError>) {
        if !self.load_generation.is_current(generation) {
            let current_url = self.session.current_track.as_ref().map(|t| t.url.as_str());
            let displaced = result.is_ok()
                && !self.load_pending
                && current_url.is_some_and(|current| current != url)
                && self.resource.source().as_deref() == Some(url);
            if displaced {
                warn!(url, "Superseded load replaced the current media, reloading");
                self.reload_current_track();
            } else {
                debug!(generation, url, "Ignoring stale load");
            }
            return;
        }
        self.load_pending = false;

        match result {
            Ok(duration) => {
                self.metadata_ready = true;
                self.update_duration(duration);

                let parked = self.session.current_time;
                if parked > 0.0 {
                    debug!(parked, "Restoring parked position");
                    self.resource.seek(parked);
                }
                self.set_state(PlaybackState::Paused);

                if let Some(retries_left) = self.play_when_ready.take() {
                    self.attempt_autoplay_with(retries_left);
                }
            }
            Err(err) => {
                error!(url, error = %err, "Failed to load track");
                self.play_when_ready = None;
                self.session.is_playing = false;
                self.set_state(PlaybackState::Paused);
                self.surface_error(format!("Could not load track: {err}"));
            }
        }
    }

    fn on_play_settled(&mut self, generation: u64, result: std::result::Result<(), ResourceError>) {
        if self.pending_play.map(|p| p.generation) != Some(generation) {
            // A superseded play that still started must not outlive the pause
            if result.is_ok() && self.pending_play.is_none() && !self.session.is_playing {
                debug!(generation, "Stale play started the resource, pausing it");
                self.resource.pause();
            } else {
                debug!(generation, "Ignoring stale play settlement");
            }
            return;
        }
        let retries_left = self.pending_play.take().map_or(0, |p| p.retries_left);

        match result {
            Ok(()) => {
                self.session.is_playing = true;
                self.set_state(PlaybackState::Playing);
            }
            Err(ResourceError::AutoplayBlocked) => {
                info!("Autoplay blocked, waiting for a user gesture");
                self.session.is_playing = false;
                self.set_state(PlaybackState::Paused);
            }
            Err(ResourceError::Interrupted) if retries_left > 0 => {
                debug!(generation, "Play interrupted, retrying");
                let generation = self.play_generation.current();
                self.schedule(
                    self.config.retry_delay(),
                    Signal::RetryDue {
                        generation,
                        retries_left: retries_left - 1,
                    },
                );
            }
            Err(ResourceError::Interrupted) => {
                debug!(generation, "Play interrupted again, giving up");
                self.session.is_playing = false;
            }
            Err(err) => {
                error!(error = %err, "Playback failed");
                self.session.is_playing = false;
                self.set_state(PlaybackState::Paused);
                self.surface_error(format!("Playback failed: {err}"));
            }
        }
    }

    fn report_play(&mut self, track_id: &TrackId) {
        let stat = self.identity.play_stat(track_id);
        let reporter = self.reporter.clone();
        self.spawn(async move {
            let result = reporter.report(&stat).await;
            Signal::Reported {
                track_id: stat.track_id,
                result,
            }
        });
    }

    fn mark_interacted(&mut self) {
        self.session.first_load_completed = true;
        if !self.session.user_interacted {
            self.session.user_interacted = true;
            self.emit(PlaybackEvent::UserInteracted);
        }
    }

    fn replace_playlist(&mut self, snapshot: PlaylistSnapshot) {
        let changed = self.session.playlist != snapshot;
        self.session.playlist = snapshot;
        self.shuffle_order = None;
        if changed {
            self.emit(PlaybackEvent::PlaylistChanged {
                length: self.session.playlist.len(),
            });
        }
    }

    fn active_order(&self) -> Option<&ShuffleOrder> {
        match &self.shuffle_order {
            Some(order) if self.session.play_mode == PlayMode::Random && !order.is_empty() => {
                Some(order)
            }
            _ => None,
        }
    }

    fn current_snapshot_index(&self) -> Option<usize> {
        let id = self.session.current_track_id()?;
        self.session.playlist.position_of(id)
    }

    fn regenerate_order_keeping_track(&mut self) {
        let order = ShuffleOrder::generate(self.session.playlist.len());
        if let Some(position) = self
            .current_snapshot_index()
            .and_then(|index| order.position_of(index))
        {
            self.session.current_index = position;
        }
        self.shuffle_order = Some(order);
    }

    fn apply_volume_change(&mut self, change: VolumeChange) {
        // Level always lands before mute, on the resource and for observers
        if change.level {
            let level = self.session.volume.level();
            self.resource.set_volume(level);
            self.emit(PlaybackEvent::VolumeChanged { level });
        }
        if change.muted {
            let is_muted = self.session.is_muted();
            self.resource.set_muted(is_muted);
            self.emit(PlaybackEvent::MuteChanged { is_muted });
        }
    }

    fn apply_seek(&mut self, seconds: f64) {
        let duration = self.session.duration;
        let seconds = if seconds.is_finite() { seconds.max(0.0) } else { 0.0 };
        let target = if duration > 0.0 {
            seconds.min(duration)
        } else {
            seconds
        };

        self.resource.seek(target);
        self.session.current_time = target;
        self.session.progress_percent = ProgressTracker::progress_percent(target, duration);
        self.emit_position();
    }

    fn show_drag_percent(&mut self, percent: f64) {
        self.session.progress_percent = percent;
        self.emit(PlaybackEvent::DragUpdated { percent });
    }

    fn update_duration(&mut self, duration: f64) {
        if !duration.is_finite() || duration < 0.0 || duration == self.session.duration {
            return;
        }
        self.session.duration = duration;
        self.session.progress_percent =
            ProgressTracker::progress_percent(self.session.current_time, duration);
        self.emit(PlaybackEvent::DurationChanged { duration });
    }

    fn spawn<F>(&mut self, task: F)
    where
        F: Future<Output = Signal> + Send + 'static,
    {
        self.in_flight += 1;
        let signals = self.signals_tx.clone();
        tokio::spawn(async move {
            let signal = task.await;
            // Receiver lives as long as the controller
            let _ = signals.send(signal);
        });
    }

    fn schedule(&mut self, delay: Duration, signal: Signal) {
        self.spawn(async move {
            tokio::time::sleep(delay).await;
            signal
        });
    }

    fn set_state(&mut self, state: PlaybackState) {
        if self.state != state {
            self.state = state;
            self.emit(PlaybackEvent::StateChanged { state });
        }
    }

    fn surface_error(&mut self, message: impl Into<String>) {
        self.emit(PlaybackEvent::Error {
            message: message.into(),
        });
    }

    fn notice(&mut self, message: impl Into<String>) {
        self.emit(PlaybackEvent::Notice {
            message: message.into(),
        });
    }

    fn emit_position(&mut self) {
        self.emit(PlaybackEvent::PositionUpdate {
            current_time: self.session.current_time,
            duration: self.session.duration,
            progress_percent: self.session.progress_percent,
        });
    }

    fn emit(&mut self, event: PlaybackEvent) {
        self.observers.notify(&event, &self.session);
        self.pending_events.push(event);
    }
}

impl std::fmt::Debug for PlaybackController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackController")
            .field("state", &self.state)
            .field("session", &self.session)
            .field("play_generation", &self.play_generation.current())
            .field("in_flight", &self.in_flight)
            .finish_non_exhaustive()
    }
}

fn spawn_media_forwarder(
    mut events: broadcast::Receiver<MediaEvent>,
    signals: mpsc::UnboundedSender<Signal>,
) {
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => {
                    if signals.send(Signal::Media(event)).is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Media events dropped");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::PlaybackResource;
    use crate::simulated::{SimulatedConfig, SimulatedResource};
    use cadence_core::traits::NoopReporter;

    fn create_test_track(id: &str) -> Track {
        Track::new(id, format!("https://cdn.example/{id}.mp3"), format!("Track {id}"))
    }

    fn playlist(count: usize) -> PlaylistSnapshot {
        PlaylistSnapshot::new(
            Some("album:test".to_string()),
            (0..count).map(|i| create_test_track(&format!("t{i}"))).collect(),
        )
    }

    fn controller() -> (PlaybackController, SharedResource) {
        let resource = SharedResource::new(SimulatedResource::new(SimulatedConfig::default()));
        let controller = PlaybackController::new(
            &resource,
            Arc::new(NoopReporter),
            PlaybackConfig::default(),
        )
        .unwrap();
        (controller, resource)
    }

    #[tokio::test]
    async fn second_controller_is_rejected() {
        let (_controller, resource) = controller();
        let second =
            PlaybackController::new(&resource, Arc::new(NoopReporter), PlaybackConfig::default());
        assert!(matches!(second, Err(PlaybackError::ResourceBusy)));
    }

    #[tokio::test]
    async fn toggle_without_track_fails() {
        let (mut controller, _resource) = controller();
        assert!(matches!(
            controller.toggle_play(),
            Err(PlaybackError::NoTrackLoaded)
        ));
        assert!(controller
            .drain_events()
            .iter()
            .any(|e| matches!(e, PlaybackEvent::Error { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn play_all_starts_playing() {
        let (mut controller, _resource) = controller();
        controller.play_all(playlist(3), 1).unwrap();
        controller.settle().await;

        assert_eq!(controller.state(), PlaybackState::Playing);
        assert!(controller.session().is_playing);
        assert_eq!(controller.session().current_index, 1);
        assert_eq!(
            controller.session().current_track_id().map(TrackId::as_str),
            Some("t1")
        );
    }

    #[tokio::test]
    async fn empty_playlist_is_rejected() {
        let (mut controller, _resource) = controller();
        assert!(matches!(
            controller.play_all(PlaylistSnapshot::default(), 0),
            Err(PlaybackError::EmptyPlaylist)
        ));
        assert!(matches!(
            controller.shuffle_play(PlaylistSnapshot::default()),
            Err(PlaybackError::EmptyPlaylist)
        ));
        assert_eq!(controller.session().play_mode, PlayMode::Sequential);
    }

    #[tokio::test]
    async fn missing_stream_url_leaves_state_alone() {
        let (mut controller, _resource) = controller();
        let silent = Track::new("x", "  ", "Silent");

        assert!(matches!(
            controller.set_track(silent),
            Err(PlaybackError::MissingStreamUrl(_))
        ));
        assert!(controller.session().current_track.is_none());
        assert_eq!(controller.state(), PlaybackState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn pause_cancels_pending_play() {
        let (mut controller, _resource) = controller();
        controller.play_all(playlist(2), 0).unwrap();
        // Load settles first, which issues the play
        controller.pause();
        controller.settle().await;

        assert!(!controller.session().is_playing);
        assert_ne!(controller.state(), PlaybackState::Playing);
    }

    #[tokio::test(start_paused = true)]
    async fn paused_resource_does_not_play_on() {
        let simulated = SimulatedResource::new(SimulatedConfig::default())
            .with_duration("https://cdn.example/t0.mp3", 2.0);
        let resource = SharedResource::new(simulated.clone());
        let mut controller =
            PlaybackController::new(&resource, Arc::new(NoopReporter), PlaybackConfig::default())
                .unwrap();

        controller.play_all(playlist(2), 0).unwrap();
        controller.settle().await;
        assert!(simulated.is_playing());
        controller.pause();

        controller.toggle_play().unwrap();
        controller.pause();
        controller.settle().await;
        assert!(!simulated.is_playing());

        // Long enough for the track to have ended had it kept playing
        tokio::time::sleep(Duration::from_secs(6)).await;
        assert!(!simulated.is_playing());
        assert!(simulated.position() < 2.0);
        assert_eq!(
            simulated.source().as_deref(),
            Some("https://cdn.example/t0.mp3")
        );
        assert_eq!(controller.state(), PlaybackState::Paused);
    }

    #[tokio::test(start_paused = true)]
    async fn toggle_mode_cycles_and_reshuffles() {
        let (mut controller, _resource) = controller();
        controller.play_all(playlist(6), 4).unwrap();
        controller.settle().await;

        assert_eq!(controller.toggle_mode(), PlayMode::Single);
        assert_eq!(controller.toggle_mode(), PlayMode::Loop);
        assert!(controller.shuffle_order().is_none());
        assert_eq!(controller.toggle_mode(), PlayMode::Random);

        let order = controller.shuffle_order().unwrap();
        assert_eq!(order.len(), 6);
        // Index follows the current track into the shuffled order
        let index = controller.session().current_index;
        assert_eq!(order.get(index), Some(4));

        assert_eq!(controller.toggle_mode(), PlayMode::Sequential);
        assert_eq!(controller.session().current_index, 4);
    }

    #[tokio::test]
    async fn clear_playlist_goes_idle() {
        let (mut controller, _resource) = controller();
        controller.play_all(playlist(3), 0).unwrap();
        controller.clear_playlist();

        assert!(controller.session().current_track.is_none());
        assert!(controller.session().playlist.is_empty());
        assert_eq!(controller.state(), PlaybackState::Idle);
        // The cleared track's load is ignored when it lands
        controller.settle().await;
        assert_eq!(controller.state(), PlaybackState::Idle);
    }

    #[tokio::test]
    async fn volume_events_fire_level_then_mute() {
        let (mut controller, _resource) = controller();
        controller.set_volume(0);
        controller.set_volume(40);

        let events = controller.drain_events();
        assert_eq!(
            events,
            vec![
                PlaybackEvent::VolumeChanged { level: 0 },
                PlaybackEvent::MuteChanged { is_muted: true },
                PlaybackEvent::VolumeChanged { level: 40 },
                PlaybackEvent::MuteChanged { is_muted: false },
            ]
        );
    }
}
