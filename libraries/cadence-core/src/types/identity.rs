/// Session identity and play-stat types
use crate::types::TrackId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identity used to tag telemetry
///
/// Guest sessions carry a locally generated identifier, created on first
/// use and reused for the lifetime of the session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionIdentity {
    is_guest: bool,
    guest_id: Option<String>,
}

impl SessionIdentity {
    /// Identity of a signed-in user
    pub fn authenticated() -> Self {
        Self {
            is_guest: false,
            guest_id: None,
        }
    }

    /// Anonymous guest identity (id generated lazily)
    pub fn guest() -> Self {
        Self {
            is_guest: true,
            guest_id: None,
        }
    }

    /// Guest identity with a previously issued identifier
    pub fn guest_with_id(guest_id: impl Into<String>) -> Self {
        Self {
            is_guest: true,
            guest_id: Some(guest_id.into()),
        }
    }

    /// Whether this is a guest session
    pub fn is_guest(&self) -> bool {
        self.is_guest
    }

    /// Guest identifier, generating it on first call
    ///
    /// Returns `None` for authenticated sessions.
    pub fn guest_id(&mut self) -> Option<&str> {
        if !self.is_guest {
            return None;
        }
        Some(
            self.guest_id
                .get_or_insert_with(|| Uuid::new_v4().to_string())
                .as_str(),
        )
    }

    /// Drop the guest identifier (a new one is issued on next use)
    pub fn forget_guest_id(&mut self) {
        self.guest_id = None;
    }

    /// Build the play-stat record for a track
    pub fn play_stat(&mut self, track_id: &TrackId) -> PlayStat {
        PlayStat {
            track_id: track_id.clone(),
            is_guest: self.is_guest,
            guest_id: self.guest_id().map(str::to_string),
        }
    }
}

/// One "track began playing" telemetry record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayStat {
    /// Track that started
    pub track_id: TrackId,

    /// Whether the listener is an anonymous guest
    pub is_guest: bool,

    /// Guest identifier (`None` for authenticated listeners)
    pub guest_id: Option<String>,
}
