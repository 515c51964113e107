/// Play mode type
use serde::{Deserialize, Serialize};

/// How next/previous/ended select the following track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayMode {
    /// Play through once, stop at the end
    #[default]
    Sequential,
    /// Repeat the whole list
    Loop,
    /// Play through a shuffled order, repeating it
    Random,
    /// Repeat the current track when it ends
    Single,
}

impl PlayMode {
    /// Toggle cycle order
    pub const CYCLE: [PlayMode; 4] = [
        PlayMode::Sequential,
        PlayMode::Single,
        PlayMode::Loop,
        PlayMode::Random,
    ];

    /// Next mode in the toggle cycle
    ///
    /// Sequential -> Single -> Loop -> Random -> Sequential
    #[must_use]
    pub fn next(self) -> Self {
        match self {
            Self::Sequential => Self::Single,
            Self::Single => Self::Loop,
            Self::Loop => Self::Random,
            Self::Random => Self::Sequential,
        }
    }

    /// Convert to string representation
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sequential => "sequential",
            Self::Loop => "loop",
            Self::Random => "random",
            Self::Single => "single",
        }
    }

    /// Parse from string
    #[must_use]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "sequential" => Some(Self::Sequential),
            "loop" => Some(Self::Loop),
            "random" => Some(Self::Random),
            "single" => Some(Self::Single),
            _ => None,
        }
    }

    /// Human readable name
    #[must_use]
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Sequential => "Sequential",
            Self::Loop => "Loop",
            Self::Random => "Shuffle",
            Self::Single => "Single repeat",
        }
    }
}

impl std::fmt::Display for PlayMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
