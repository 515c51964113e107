//! Seeking, dragging and volume through the controller

mod common;

use cadence_playback::{MediaEvent, PlaybackEvent, PointerCapture, ProgressBar};
use common::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Default)]
struct CountingCapture {
    acquired: AtomicUsize,
    released: AtomicUsize,
}

impl PointerCapture for CountingCapture {
    fn acquire(&self) {
        self.acquired.fetch_add(1, Ordering::SeqCst);
    }

    fn release(&self) {
        self.released.fetch_add(1, Ordering::SeqCst);
    }
}

fn bar() -> ProgressBar {
    ProgressBar::new(0.0, 200.0)
}

#[tokio::test(start_paused = true)]
async fn drag_seeks_once_on_release() {
    let fake = FakeResource::new();
    let capture = Arc::new(CountingCapture::default());
    let mut controller = controller(&fake).with_pointer_capture(capture.clone());

    controller.play_all(tracks(2), 0).unwrap();
    controller.settle().await;
    assert_eq!(controller.session().duration, DURATION);
    let seeks_before = fake.seeks().len();

    assert!(controller.start_drag(bar(), 20.0));
    controller.drag_to(Some(bar()), 100.0);
    controller.drain_events();

    // Resource time updates do not move the displayed position mid-drag
    controller.handle_media_event(MediaEvent::TimeUpdated { current_time: 12.0 });
    controller.handle_media_event(MediaEvent::TimeUpdated { current_time: 13.0 });
    assert_eq!(controller.session().progress_percent, 50.0);
    assert!(controller
        .drain_events()
        .iter()
        .all(|e| !matches!(e, PlaybackEvent::PositionUpdate { .. })));
    assert_eq!(fake.seeks().len(), seeks_before);

    assert_eq!(controller.end_drag(), Some(100.0));

    assert_eq!(fake.seeks()[seeks_before..], [100.0]);
    assert_eq!(controller.session().current_time, 100.0);
    assert_eq!(capture.acquired.load(Ordering::SeqCst), 1);
    assert_eq!(capture.released.load(Ordering::SeqCst), 1);

    controller.handle_media_event(MediaEvent::TimeUpdated { current_time: 150.0 });
    assert_eq!(controller.session().progress_percent, 75.0);
}

#[tokio::test(start_paused = true)]
async fn drag_needs_a_known_duration() {
    let fake = FakeResource::new();
    let mut controller = controller(&fake);

    assert!(!controller.start_drag(bar(), 50.0));
    assert!(!controller.is_dragging());
    assert_eq!(controller.end_drag(), None);
}

#[tokio::test(start_paused = true)]
async fn losing_the_bar_ends_the_drag_with_a_seek() {
    let fake = FakeResource::new();
    let capture = Arc::new(CountingCapture::default());
    let mut controller = controller(&fake).with_pointer_capture(capture.clone());

    controller.play_all(tracks(1), 0).unwrap();
    controller.settle().await;

    controller.start_drag(bar(), 50.0);
    controller.drag_to(None, 0.0);

    assert!(!controller.is_dragging());
    assert_eq!(fake.seeks().last(), Some(&50.0));
    assert_eq!(capture.released.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn teardown_releases_an_abandoned_drag() {
    let fake = FakeResource::new();
    let capture = Arc::new(CountingCapture::default());
    let mut controller = controller(&fake).with_pointer_capture(capture.clone());

    controller.play_all(tracks(1), 0).unwrap();
    controller.settle().await;
    controller.start_drag(bar(), 10.0);
    let seeks = fake.seeks().len();

    controller.teardown();

    assert_eq!(capture.released.load(Ordering::SeqCst), 1);
    assert_eq!(fake.seeks().len(), seeks);
}

#[tokio::test(start_paused = true)]
async fn click_seek_maps_fraction_to_time() {
    let fake = FakeResource::new();
    let mut controller = controller(&fake);

    controller.play_all(tracks(1), 0).unwrap();
    controller.settle().await;
    controller.seek_by_click(0.25).unwrap();

    assert_eq!(fake.seeks().last(), Some(&50.0));
    assert_eq!(controller.session().progress_percent, 25.0);
}

#[tokio::test(start_paused = true)]
async fn seek_is_clamped_to_the_track() {
    let fake = FakeResource::new();
    let mut controller = controller(&fake);

    controller.play_all(tracks(1), 0).unwrap();
    controller.settle().await;

    controller.seek(500.0).unwrap();
    assert_eq!(fake.seeks().last(), Some(&DURATION));
    controller.seek(-4.0).unwrap();
    assert_eq!(fake.seeks().last(), Some(&0.0));
}

#[tokio::test(start_paused = true)]
async fn time_updates_drive_progress() {
    let fake = FakeResource::new();
    let mut controller = controller(&fake);

    controller.play_all(tracks(1), 0).unwrap();
    controller.settle().await;
    controller.drain_events();

    controller.handle_media_event(MediaEvent::TimeUpdated { current_time: 50.0 });
    controller.handle_media_event(MediaEvent::BufferUpdated { buffered_end: 150.0 });

    assert_eq!(controller.session().progress_percent, 25.0);
    assert_eq!(controller.session().buffer_percent, 75.0);
    let events = controller.drain_events();
    assert!(events.contains(&PlaybackEvent::BufferUpdate {
        buffer_percent: 75.0
    }));
}

#[tokio::test(start_paused = true)]
async fn volume_is_clamped_and_zero_mutes() {
    let fake = FakeResource::new();
    let mut controller = controller(&fake);
    // Initial level and mute pushed at construction
    assert_eq!(fake.state().output, ["volume:70", "muted:false"]);

    controller.set_volume(-10);
    assert_eq!(controller.session().volume.level(), 0);
    assert!(controller.session().is_muted());

    controller.set_volume(150);
    assert_eq!(controller.session().volume.level(), 100);
    assert!(!controller.session().is_muted());

    assert_eq!(
        fake.state().output[2..],
        ["volume:0", "muted:true", "volume:100", "muted:false"]
    );
}

#[tokio::test(start_paused = true)]
async fn volume_event_precedes_mute_event() {
    let fake = FakeResource::new();
    let mut controller = controller(&fake);

    controller.set_volume(0);
    let events = controller.drain_events();

    assert_eq!(
        events,
        vec![
            PlaybackEvent::VolumeChanged { level: 0 },
            PlaybackEvent::MuteChanged { is_muted: true },
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn mute_keeps_the_level() {
    let fake = FakeResource::new();
    let mut controller = controller(&fake);
    controller.set_volume(40);

    controller.toggle_mute();
    assert!(controller.session().is_muted());
    assert_eq!(controller.session().volume.level(), 40);

    controller.toggle_mute();
    assert!(!controller.session().is_muted());
    assert_eq!(fake.state().output.last().map(String::as_str), Some("muted:false"));
}
