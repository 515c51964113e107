//! Shared fixtures for controller integration tests
//!
//! `FakeResource` records what the controller asked of it. Calls settle
//! immediately unless a delay is configured; play outcomes can be scripted
//! per call.

#![allow(dead_code)]

use async_trait::async_trait;
use cadence_core::{CoreError, PlayStat, PlayStatReporter, PlaylistSnapshot, Track};
use cadence_playback::{
    MediaEvent, PlaybackConfig, PlaybackController, PlaybackEvent, PlaybackResource,
    ResourceError, SharedResource,
};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::broadcast;

pub const DURATION: f64 = 200.0;

/// Everything the controller did to the resource
#[derive(Debug, Default)]
pub struct FakeState {
    pub source: Option<String>,
    /// Whether media is audibly playing right now
    pub playing: bool,
    pub loads: Vec<String>,
    pub plays: usize,
    pub pauses: usize,
    pub seeks: Vec<f64>,
    /// Volume and mute calls in order, as `volume:N` / `muted:B`
    pub output: Vec<String>,
    pub play_results: VecDeque<Result<(), ResourceError>>,
    pub unreachable: HashSet<String>,
    pub load_delays: HashMap<String, Duration>,
    pub play_delay: Option<Duration>,
}

pub struct FakeResource {
    state: Mutex<FakeState>,
    events: broadcast::Sender<MediaEvent>,
}

impl FakeResource {
    pub fn new() -> Arc<Self> {
        let (events, _) = broadcast::channel(16);
        Arc::new(Self {
            state: Mutex::new(FakeState::default()),
            events,
        })
    }

    pub fn shared(self: &Arc<Self>) -> SharedResource {
        SharedResource::from_arc(self.clone())
    }

    pub fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    /// Outcome of the next `play` call; unscripted calls succeed
    pub fn script_play(&self, result: Result<(), ResourceError>) {
        self.state().play_results.push_back(result);
    }

    pub fn fail_loading(&self, url: &str) {
        self.state().unreachable.insert(url.to_string());
    }

    pub fn recover_loading(&self, url: &str) {
        self.state().unreachable.remove(url);
    }

    /// Hold loads of `url` for `delay` before they land
    pub fn delay_loading(&self, url: &str, delay: Duration) {
        self.state().load_delays.insert(url.to_string(), delay);
    }

    /// Hold every `play` for `delay` before it settles
    pub fn delay_plays(&self, delay: Duration) {
        self.state().play_delay = Some(delay);
    }

    pub fn is_playing(&self) -> bool {
        self.state().playing
    }

    pub fn source_url(&self) -> Option<String> {
        self.state().source.clone()
    }

    pub fn plays(&self) -> usize {
        self.state().plays
    }

    pub fn loads(&self) -> Vec<String> {
        self.state().loads.clone()
    }

    pub fn seeks(&self) -> Vec<f64> {
        self.state().seeks.clone()
    }
}

#[async_trait]
impl PlaybackResource for FakeResource {
    fn source(&self) -> Option<String> {
        self.state().source.clone()
    }

    async fn load(&self, url: &str) -> Result<f64, ResourceError> {
        let delay = {
            let mut state = self.state();
            state.loads.push(url.to_string());
            if state.unreachable.contains(url) {
                return Err(ResourceError::LoadFailed(format!("{url} is unreachable")));
            }
            state.load_delays.get(url).copied()
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state();
        state.source = Some(url.to_string());
        state.playing = false;
        Ok(DURATION)
    }

    async fn play(&self) -> Result<(), ResourceError> {
        let (result, delay) = {
            let mut state = self.state();
            state.plays += 1;
            (
                state.play_results.pop_front().unwrap_or(Ok(())),
                state.play_delay,
            )
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if result.is_ok() {
            self.state().playing = true;
        }
        result
    }

    fn pause(&self) {
        let mut state = self.state();
        state.pauses += 1;
        state.playing = false;
    }

    fn seek(&self, seconds: f64) {
        self.state().seeks.push(seconds);
    }

    fn set_volume(&self, level: u8) {
        self.state().output.push(format!("volume:{level}"));
    }

    fn set_muted(&self, muted: bool) {
        self.state().output.push(format!("muted:{muted}"));
    }

    fn subscribe(&self) -> broadcast::Receiver<MediaEvent> {
        self.events.subscribe()
    }
}

/// Reporter that remembers every stat it was handed
#[derive(Default)]
pub struct RecordingReporter {
    stats: Mutex<Vec<PlayStat>>,
    offline: bool,
}

impl RecordingReporter {
    pub fn offline() -> Self {
        Self {
            stats: Mutex::new(Vec::new()),
            offline: true,
        }
    }

    pub fn stats(&self) -> Vec<PlayStat> {
        self.stats.lock().unwrap().clone()
    }
}

#[async_trait]
impl PlayStatReporter for RecordingReporter {
    async fn report(&self, stat: &PlayStat) -> cadence_core::Result<()> {
        self.stats.lock().unwrap().push(stat.clone());
        if self.offline {
            return Err(CoreError::telemetry("collector unreachable"));
        }
        Ok(())
    }
}

pub fn track(n: usize) -> Track {
    Track::new(
        format!("t{n}"),
        format!("https://cdn.example/t{n}.mp3"),
        format!("Track {n}"),
    )
}

pub fn tracks(len: usize) -> PlaylistSnapshot {
    PlaylistSnapshot::new(Some("album:42".to_string()), (0..len).map(track).collect())
}

pub fn controller(fake: &Arc<FakeResource>) -> PlaybackController {
    PlaybackController::new(
        &fake.shared(),
        Arc::new(RecordingReporter::default()),
        PlaybackConfig::default(),
    )
    .unwrap()
}

pub fn controller_with_reporter(
    fake: &Arc<FakeResource>,
    reporter: Arc<RecordingReporter>,
) -> PlaybackController {
    PlaybackController::new(&fake.shared(), reporter, PlaybackConfig::default()).unwrap()
}

/// Current track id as a plain string
pub fn current_id(controller: &PlaybackController) -> Option<String> {
    controller
        .session()
        .current_track_id()
        .map(|id| id.as_str().to_string())
}

pub fn errors(events: &[PlaybackEvent]) -> Vec<String> {
    events
        .iter()
        .filter_map(|event| match event {
            PlaybackEvent::Error { message } => Some(message.clone()),
            _ => None,
        })
        .collect()
}
