//! Player service driven end to end by the simulated clock

use cadence_core::traits::NoopReporter;
use cadence_core::{PlaylistSnapshot, Track};
use cadence_playback::{
    PlaybackConfig, PlaybackController, PlaybackEvent, PlaybackState, PlayerService,
    SharedResource, SimulatedConfig, SimulatedResource,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

fn playlist() -> PlaylistSnapshot {
    PlaylistSnapshot::new(
        None,
        vec![
            Track::new("intro", "https://cdn.example/intro.mp3", "Intro"),
            Track::new("outro", "https://cdn.example/outro.mp3", "Outro"),
        ],
    )
}

fn simulated() -> SimulatedResource {
    SimulatedResource::new(SimulatedConfig {
        tick: Duration::from_millis(250),
        ..SimulatedConfig::default()
    })
    .with_duration("https://cdn.example/intro.mp3", 1.0)
    .with_duration("https://cdn.example/outro.mp3", 1.0)
}

async fn wait_for(
    events: &mut broadcast::Receiver<PlaybackEvent>,
    mut wanted: impl FnMut(&PlaybackEvent) -> bool,
) {
    loop {
        match events.recv().await {
            Ok(event) if wanted(&event) => return,
            Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => {}
            Err(broadcast::error::RecvError::Closed) => panic!("service stopped"),
        }
    }
}

fn finished(id: &'static str) -> impl FnMut(&PlaybackEvent) -> bool {
    move |event| matches!(event, PlaybackEvent::TrackFinished { track_id } if track_id.as_str() == id)
}

#[tokio::test(start_paused = true)]
async fn playlist_plays_through_and_stops() {
    let resource = simulated();
    let controller = PlaybackController::new(
        &SharedResource::new(resource.clone()),
        Arc::new(NoopReporter),
        PlaybackConfig::default(),
    )
    .unwrap();
    let (handle, task) = PlayerService::spawn(controller);
    let mut events = handle.subscribe();

    handle.play_all(playlist(), 0).unwrap();

    wait_for(&mut events, finished("intro")).await;
    wait_for(&mut events, |event| {
        matches!(event, PlaybackEvent::StateChanged { state: PlaybackState::Playing })
    })
    .await;
    assert_eq!(
        handle.session().await.unwrap().current_track_id().map(|id| id.as_str().to_string()),
        Some("outro".to_string())
    );

    wait_for(&mut events, finished("outro")).await;
    let session = handle.session().await.unwrap();
    assert_eq!(session.current_index, 1);
    assert!(!session.is_playing);
    assert!(!resource.is_playing());

    handle.shutdown().unwrap();
    let controller = task.await.unwrap();
    assert_eq!(controller.state(), PlaybackState::Ended);
}

#[tokio::test(start_paused = true)]
async fn blocked_autoplay_waits_for_toggle() {
    let resource = SimulatedResource::new(SimulatedConfig {
        block_autoplay: true,
        ..SimulatedConfig::default()
    });
    let controller = PlaybackController::new(
        &SharedResource::new(resource.clone()),
        Arc::new(NoopReporter),
        PlaybackConfig::default(),
    )
    .unwrap();
    let (handle, task) = PlayerService::spawn(controller);
    let mut events = handle.subscribe();

    handle.play_all(playlist(), 0).unwrap();
    wait_for(&mut events, |event| {
        matches!(event, PlaybackEvent::StateChanged { state: PlaybackState::Paused })
    })
    .await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!handle.session().await.unwrap().is_playing);

    resource.allow_autoplay();
    handle.toggle_play().unwrap();
    wait_for(&mut events, |event| {
        matches!(event, PlaybackEvent::StateChanged { state: PlaybackState::Playing })
    })
    .await;
    assert!(resource.is_playing());

    handle.shutdown().unwrap();
    task.await.unwrap();
}
