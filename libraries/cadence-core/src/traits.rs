/// Collaborator traits the playback engine calls out to
use crate::error::Result;
use crate::types::PlayStat;
use async_trait::async_trait;

/// Best-effort telemetry sink recording that a track began playing
///
/// Called once per track change. The engine never retries a failed report
/// and never surfaces the failure to the user; implementations should not
/// block for long.
#[async_trait]
pub trait PlayStatReporter: Send + Sync {
    /// Record a single play
    ///
    /// # Errors
    /// Returns an error if the report could not be delivered
    async fn report(&self, stat: &PlayStat) -> Result<()>;
}

/// Reporter that drops every play stat
///
/// Useful for offline sessions and tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopReporter;

#[async_trait]
impl PlayStatReporter for NoopReporter {
    async fn report(&self, _stat: &PlayStat) -> Result<()> {
        Ok(())
    }
}
