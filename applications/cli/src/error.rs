/// CLI error types
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid playlist: {0}")]
    Playlist(String),

    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    #[error("Invalid argument for {command}: {reason}")]
    InvalidArgument { command: String, reason: String },

    #[error(transparent)]
    Storage(#[from] cadence_storage::StorageError),

    #[error(transparent)]
    Playback(#[from] cadence_playback::PlaybackError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub fn invalid_argument(command: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            command: command.into(),
            reason: reason.into(),
        }
    }
}
