//! Volume control
//!
//! Volume range is 0-100, applied to the resource as a linear level. A level
//! of 0 implies mute; raising the level above 0 clears mute.

/// Volume controller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Volume {
    /// Volume level (0-100)
    level: u8,

    /// Mute state (preserves volume level)
    muted: bool,
}

/// Which parts of the volume changed after an update
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VolumeChange {
    pub level: bool,
    pub muted: bool,
}

impl VolumeChange {
    pub fn any(self) -> bool {
        self.level || self.muted
    }
}

impl Volume {
    /// Create new volume controller
    ///
    /// A level of 0 starts muted regardless of `muted`.
    pub fn new(level: u8, muted: bool) -> Self {
        let level = level.min(100);
        Self {
            level,
            muted: muted || level == 0,
        }
    }

    /// Set volume level, clamping into 0-100
    ///
    /// Returns which fields changed so callers can apply level before mute.
    pub fn set_level(&mut self, level: i32) -> VolumeChange {
        let clamped = level.clamp(0, 100) as u8;
        // 0 mutes, any audible level unmutes
        let muted = clamped == 0;

        let change = VolumeChange {
            level: clamped != self.level,
            muted: muted != self.muted,
        };
        self.level = clamped;
        self.muted = muted;
        change
    }

    /// Get current volume level (0-100)
    pub fn level(&self) -> u8 {
        self.level
    }

    /// Toggle mute state (preserves volume level)
    pub fn toggle_mute(&mut self) {
        self.muted = !self.muted;
    }

    /// Check if muted
    pub fn is_muted(&self) -> bool {
        self.muted
    }

    /// Linear gain for the resource: 0.0 when muted, otherwise `level / 100`
    pub fn gain(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            f32::from(self.level) / 100.0
        }
    }
}

impl Default for Volume {
    fn default() -> Self {
        Self::new(70, false)
    }
}
