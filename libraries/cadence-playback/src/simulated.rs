//! Simulated playback resource
//!
//! An in-process resource that "plays" a clock driven by tokio time. It
//! emits the same media events a real backend would, which makes it usable
//! both for the CLI and for deterministic tests under paused time.

use crate::error::ResourceError;
use crate::resource::{MediaEvent, PlaybackResource};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

/// Configuration for [`SimulatedResource`]
#[derive(Debug, Clone)]
pub struct SimulatedConfig {
    /// Interval between time updates (default: 250ms)
    pub tick: Duration,

    /// Duration in seconds for URLs without an explicit one (default: 180)
    pub default_duration: f64,

    /// Refuse to play until [`SimulatedResource::allow_autoplay`] is called
    pub block_autoplay: bool,
}

impl Default for SimulatedConfig {
    fn default() -> Self {
        Self {
            tick: Duration::from_millis(250),
            default_duration: 180.0,
            block_autoplay: false,
        }
    }
}

#[derive(Default)]
struct ClockState {
    source: Option<String>,
    duration: f64,
    position: f64,
    playing: bool,
    volume: u8,
    muted: bool,
    gesture_seen: bool,
    durations: HashMap<String, f64>,
    unreachable: HashSet<String>,
    clock: Option<JoinHandle<()>>,
    load_count: usize,
}

impl ClockState {
    fn stop_clock(&mut self) {
        self.playing = false;
        if let Some(clock) = self.clock.take() {
            clock.abort();
        }
    }
}

/// Clock-driven stand-in for a media backend
#[derive(Clone)]
pub struct SimulatedResource {
    state: Arc<Mutex<ClockState>>,
    events: broadcast::Sender<MediaEvent>,
    config: SimulatedConfig,
}

impl SimulatedResource {
    pub fn new(config: SimulatedConfig) -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            state: Arc::new(Mutex::new(ClockState {
                volume: 100,
                ..ClockState::default()
            })),
            events,
            config,
        }
    }

    /// Report `seconds` as the duration of `url`
    #[must_use]
    pub fn with_duration(self, url: impl Into<String>, seconds: f64) -> Self {
        lock(&self.state).durations.insert(url.into(), seconds);
        self
    }

    /// Make loads of `url` fail
    #[must_use]
    pub fn with_unreachable(self, url: impl Into<String>) -> Self {
        lock(&self.state).unreachable.insert(url.into());
        self
    }

    /// Record a user gesture, lifting the autoplay block
    pub fn allow_autoplay(&self) {
        lock(&self.state).gesture_seen = true;
    }

    pub fn position(&self) -> f64 {
        lock(&self.state).position
    }

    pub fn is_playing(&self) -> bool {
        lock(&self.state).playing
    }

    pub fn volume(&self) -> u8 {
        lock(&self.state).volume
    }

    pub fn is_muted(&self) -> bool {
        lock(&self.state).muted
    }

    /// Number of loads that actually switched the source
    pub fn load_count(&self) -> usize {
        lock(&self.state).load_count
    }

    fn start_clock(&self) -> JoinHandle<()> {
        let state = self.state.clone();
        let events = self.events.clone();
        let tick = self.config.tick;

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(tick);
            // First tick completes immediately
            interval.tick().await;

            loop {
                interval.tick().await;
                let (position, ended) = {
                    let mut state = lock(&state);
                    if !state.playing {
                        return;
                    }
                    state.position = (state.position + tick.as_secs_f64()).min(state.duration);
                    let ended = state.position >= state.duration;
                    if ended {
                        state.playing = false;
                        state.clock = None;
                    }
                    (state.position, ended)
                };

                trace!(position, "Simulated clock tick");
                let _ = events.send(MediaEvent::TimeUpdated {
                    current_time: position,
                });
                if ended {
                    let _ = events.send(MediaEvent::Ended);
                    return;
                }
            }
        })
    }
}

#[async_trait]
impl PlaybackResource for SimulatedResource {
    fn source(&self) -> Option<String> {
        lock(&self.state).source.clone()
    }

    async fn load(&self, url: &str) -> Result<f64, ResourceError> {
        let duration = {
            let mut state = lock(&self.state);
            if state.source.as_deref() == Some(url) {
                return Ok(state.duration);
            }
            if state.unreachable.contains(url) {
                return Err(ResourceError::LoadFailed(format!("{url} is unreachable")));
            }

            state.stop_clock();
            state.source = Some(url.to_string());
            state.position = 0.0;
            state.duration = state
                .durations
                .get(url)
                .copied()
                .unwrap_or(self.config.default_duration);
            state.load_count += 1;
            state.duration
        };

        debug!(url, duration, "Simulated load");
        let _ = self.events.send(MediaEvent::MetadataReady { duration });
        let _ = self.events.send(MediaEvent::BufferUpdated {
            buffered_end: duration,
        });
        Ok(duration)
    }

    async fn play(&self) -> Result<(), ResourceError> {
        let mut state = lock(&self.state);
        if state.source.is_none() {
            return Err(ResourceError::Playback("no media loaded".to_string()));
        }
        if self.config.block_autoplay && !state.gesture_seen {
            return Err(ResourceError::AutoplayBlocked);
        }

        if state.position >= state.duration {
            state.position = 0.0;
        }
        state.playing = true;
        if state.clock.is_none() {
            state.clock = Some(self.start_clock());
        }
        Ok(())
    }

    fn pause(&self) {
        lock(&self.state).stop_clock();
    }

    fn seek(&self, seconds: f64) {
        let position = {
            let mut state = lock(&self.state);
            state.position = seconds.clamp(0.0, state.duration.max(0.0));
            state.position
        };
        let _ = self.events.send(MediaEvent::TimeUpdated {
            current_time: position,
        });
    }

    fn set_volume(&self, level: u8) {
        lock(&self.state).volume = level.min(100);
    }

    fn set_muted(&self, muted: bool) {
        lock(&self.state).muted = muted;
    }

    fn subscribe(&self) -> broadcast::Receiver<MediaEvent> {
        self.events.subscribe()
    }
}

fn lock(state: &Mutex<ClockState>) -> MutexGuard<'_, ClockState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn clock_advances_and_ends() {
        let resource = SimulatedResource::new(SimulatedConfig {
            tick: Duration::from_millis(500),
            ..SimulatedConfig::default()
        })
        .with_duration("a.mp3", 1.0);
        let mut events = resource.subscribe();

        assert_eq!(resource.load("a.mp3").await, Ok(1.0));
        resource.play().await.unwrap();

        let mut seen = Vec::new();
        while let Ok(event) = events.recv().await {
            let done = event == MediaEvent::Ended;
            seen.push(event);
            if done {
                break;
            }
        }

        assert_eq!(seen[0], MediaEvent::MetadataReady { duration: 1.0 });
        assert!(seen.contains(&MediaEvent::TimeUpdated { current_time: 1.0 }));
        assert_eq!(seen.last(), Some(&MediaEvent::Ended));
        assert!(!resource.is_playing());
    }

    #[tokio::test]
    async fn reloading_same_url_is_idempotent() {
        let resource = SimulatedResource::new(SimulatedConfig::default());
        resource.load("a.mp3").await.unwrap();
        resource.seek(42.0);
        resource.load("a.mp3").await.unwrap();

        assert_eq!(resource.load_count(), 1);
        assert_eq!(resource.position(), 42.0);
    }

    #[tokio::test]
    async fn unreachable_url_fails() {
        let resource = SimulatedResource::new(SimulatedConfig::default()).with_unreachable("bad");
        assert!(matches!(
            resource.load("bad").await,
            Err(ResourceError::LoadFailed(_))
        ));
        assert_eq!(resource.source(), None);
    }

    #[tokio::test]
    async fn autoplay_block_lifts_after_gesture() {
        let resource = SimulatedResource::new(SimulatedConfig {
            block_autoplay: true,
            ..SimulatedConfig::default()
        });
        resource.load("a.mp3").await.unwrap();

        assert_eq!(resource.play().await, Err(ResourceError::AutoplayBlocked));
        resource.allow_autoplay();
        assert_eq!(resource.play().await, Ok(()));
        resource.pause();
        assert!(!resource.is_playing());
    }

    #[tokio::test]
    async fn play_without_source_fails() {
        let resource = SimulatedResource::new(SimulatedConfig::default());
        assert!(matches!(
            resource.play().await,
            Err(ResourceError::Playback(_))
        ));
    }
}
