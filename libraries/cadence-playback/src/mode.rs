//! Mode selector
//!
//! Pure next/previous index selection for each play mode. The caller picks
//! the active sequence (snapshot or shuffle order) and applies the result.

use cadence_core::PlayMode;

/// Navigation direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

/// Outcome of a navigation step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Move to this index in the active sequence
    Index(usize),

    /// End of a sequential run: stop playback and stay on the last track
    Stop,

    /// Nothing to do (start of a sequential run, or empty sequence)
    Stay,
}

/// Computes the next index for a play mode
pub struct ModeSelector;

impl ModeSelector {
    /// Step through a sequence of `len` tracks from `index`
    ///
    /// | mode       | forward              | backward             |
    /// |------------|----------------------|----------------------|
    /// | Sequential | `i+1`, else `Stop`   | `i-1`, else `Stay`   |
    /// | Loop       | `(i+1) % n`          | `(i-1+n) % n`        |
    /// | Random     | `(i+1) % n`          | `(i-1+n) % n`        |
    /// | Single     | `(i+1) % n`          | `(i-1+n) % n`        |
    ///
    /// An `index` past the end is treated as the last position, so the
    /// returned index is always inside `0..len`.
    pub fn step(mode: PlayMode, index: usize, len: usize, direction: Direction) -> Step {
        if len == 0 {
            return Step::Stay;
        }
        let index = index.min(len - 1);

        match (mode, direction) {
            (PlayMode::Sequential, Direction::Forward) => {
                if index + 1 < len {
                    Step::Index(index + 1)
                } else {
                    Step::Stop
                }
            }
            (PlayMode::Sequential, Direction::Backward) => {
                if index > 0 {
                    Step::Index(index - 1)
                } else {
                    Step::Stay
                }
            }
            (PlayMode::Loop | PlayMode::Random | PlayMode::Single, Direction::Forward) => {
                Step::Index((index + 1) % len)
            }
            // Single repeat only changes what happens at the end of a track
            (PlayMode::Loop | PlayMode::Random | PlayMode::Single, Direction::Backward) => {
                Step::Index((index + len - 1) % len)
            }
        }
    }

    pub fn next(mode: PlayMode, index: usize, len: usize) -> Step {
        Self::step(mode, index, len, Direction::Forward)
    }

    pub fn previous(mode: PlayMode, index: usize, len: usize) -> Step {
        Self::step(mode, index, len, Direction::Backward)
    }
}
