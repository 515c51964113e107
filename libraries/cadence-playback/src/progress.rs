//! Progress tracking
//!
//! Maps between playback time and the displayed percentage, and owns the
//! drag gesture on the progress bar. While a drag is active the tracker owns
//! the displayed percentage and resource time updates are ignored.

use std::sync::Arc;

/// Pointer capture held for the duration of a drag
///
/// `acquire` corresponds to grabbing global pointer move/up listeners,
/// `release` to removing them.
pub trait PointerCapture: Send + Sync {
    fn acquire(&self);
    fn release(&self);
}

/// Capture that does nothing, for headless front-ends
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopCapture;

impl PointerCapture for NoopCapture {
    fn acquire(&self) {}
    fn release(&self) {}
}

/// Releases its capture when dropped
struct CaptureGuard {
    capture: Arc<dyn PointerCapture>,
}

impl CaptureGuard {
    fn acquire(capture: Arc<dyn PointerCapture>) -> Self {
        capture.acquire();
        Self { capture }
    }
}

impl Drop for CaptureGuard {
    fn drop(&mut self) {
        self.capture.release();
    }
}

/// Horizontal geometry of the progress bar
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressBar {
    pub left: f64,
    pub width: f64,
}

impl ProgressBar {
    pub fn new(left: f64, width: f64) -> Self {
        Self { left, width }
    }

    /// Fraction (0.0-1.0) of the bar at pointer position `x`
    pub fn fraction_at(&self, x: f64) -> f64 {
        if self.width <= 0.0 || !self.width.is_finite() {
            return 0.0;
        }
        ((x - self.left) / self.width).clamp(0.0, 1.0)
    }
}

/// Snapshot of an active drag
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragState {
    /// 0-100
    pub percent: f64,
}

/// Result of moving the pointer during a drag
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DragUpdate {
    /// Displayed percentage moved
    Moved(f64),

    /// The drag ended abnormally; carries the seek time, if any
    Ended(Option<f64>),

    /// No drag was active
    Inactive,
}

struct ActiveDrag {
    percent: f64,
    _guard: CaptureGuard,
}

pub struct ProgressTracker {
    capture: Arc<dyn PointerCapture>,
    drag: Option<ActiveDrag>,
}

impl ProgressTracker {
    pub fn new(capture: Arc<dyn PointerCapture>) -> Self {
        Self {
            capture,
            drag: None,
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    pub fn drag_state(&self) -> Option<DragState> {
        self.drag.as_ref().map(|d| DragState { percent: d.percent })
    }

    /// Percentage of `duration` reached at `current_time`
    pub fn progress_percent(current_time: f64, duration: f64) -> f64 {
        if duration > 0.0 && duration.is_finite() {
            (current_time / duration * 100.0).clamp(0.0, 100.0)
        } else {
            0.0
        }
    }

    /// Percentage of `duration` that has been buffered
    ///
    /// `None` while the duration is unknown.
    pub fn buffer_percent(buffered_end: f64, duration: f64) -> Option<f64> {
        (duration > 0.0 && duration.is_finite())
            .then(|| (buffered_end / duration * 100.0).clamp(0.0, 100.0))
    }

    /// Seek time for a click at `fraction` of the bar
    pub fn seek_time(fraction: f64, duration: f64) -> Option<f64> {
        (duration > 0.0 && duration.is_finite()).then(|| fraction.clamp(0.0, 1.0) * duration)
    }

    /// Begin a drag at pointer position `x`
    ///
    /// Refuses (returns `None`) when the duration is unknown. Returns the
    /// initial displayed percentage otherwise.
    pub fn start_drag(&mut self, bar: ProgressBar, x: f64, duration: f64) -> Option<f64> {
        if duration <= 0.0 || !duration.is_finite() {
            return None;
        }

        // Drop any stale drag first so its capture is released before the new one
        self.drag = None;
        let percent = bar.fraction_at(x) * 100.0;
        self.drag = Some(ActiveDrag {
            percent,
            _guard: CaptureGuard::acquire(self.capture.clone()),
        });
        Some(percent)
    }

    /// Move the pointer during a drag
    ///
    /// A missing bar or a duration that went away ends the drag.
    pub fn drag_to(&mut self, bar: Option<ProgressBar>, x: f64, duration: f64) -> DragUpdate {
        let Some(drag) = self.drag.as_mut() else {
            return DragUpdate::Inactive;
        };

        match bar {
            Some(bar) if duration > 0.0 => {
                drag.percent = bar.fraction_at(x) * 100.0;
                DragUpdate::Moved(drag.percent)
            }
            _ => DragUpdate::Ended(self.end_drag(duration)),
        }
    }

    /// Finish the drag, returning the seek time
    ///
    /// The pointer capture is always released, even when no seek results.
    pub fn end_drag(&mut self, duration: f64) -> Option<f64> {
        let drag = self.drag.take()?;
        let seek = Self::seek_time(drag.percent / 100.0, duration);
        drop(drag);
        seek
    }

    /// Abandon any drag without seeking
    pub fn teardown(&mut self) {
        self.drag = None;
    }
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new(Arc::new(NoopCapture))
    }
}

impl std::fmt::Debug for ProgressTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressTracker")
            .field("drag", &self.drag_state())
            .finish_non_exhaustive()
    }
}

/// Format seconds as `MM:SS`
///
/// Zero, negative and non-finite inputs render as `00:00`.
pub fn format_time(seconds: f64) -> String {
    if !seconds.is_finite() || seconds <= 0.0 {
        return "00:00".to_string();
    }
    let total = seconds.floor() as u64;
    format!("{:02}:{:02}", total / 60, total % 60)
}
