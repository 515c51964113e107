//! Play-stat sink that writes to the log

use async_trait::async_trait;
use cadence_core::{PlayStat, PlayStatReporter};
use tracing::info;

/// Reports every play as a structured log line
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingReporter;

#[async_trait]
impl PlayStatReporter for LoggingReporter {
    async fn report(&self, stat: &PlayStat) -> cadence_core::Result<()> {
        info!(
            target: "cadence::telemetry",
            track_id = %stat.track_id,
            is_guest = stat.is_guest,
            guest_id = stat.guest_id.as_deref().unwrap_or("-"),
            "Track started"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadence_core::TrackId;

    #[tokio::test]
    async fn logging_never_fails() {
        let stat = PlayStat {
            track_id: TrackId::new("t1"),
            is_guest: true,
            guest_id: Some("g-1".to_string()),
        };
        assert!(LoggingReporter.report(&stat).await.is_ok());
    }
}
