//! Cadence CLI Library
//!
//! Terminal front-end for the Cadence playback engine: configuration,
//! playlist loading, the command parser and the telemetry sink.
//!
//! This library exposes those pieces for testing purposes.

pub mod catalog;
pub mod commands;
pub mod config;
pub mod error;
pub mod telemetry;

// Re-export commonly used types for convenience
pub use commands::ReplCommand;
pub use config::CliConfig;
pub use error::{CliError, Result};
pub use telemetry::LoggingReporter;
