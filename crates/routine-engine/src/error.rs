//! Error types for the routine engine

use thiserror::Error;

/// Errors that can occur in the routine engine
#[derive(Error, Debug)]
pub enum EngineError {
    /// Schedule time is not in HH:MM format
    #[error("Invalid time format: {0}")]
    InvalidTimeFormat(String),

    /// Schedule day is not an English weekday name
    #[error("Invalid weekday: {0}")]
    InvalidWeekday(String),

    /// Automation config entry is inconsistent
    #[error("Invalid automation config: {0}")]
    InvalidConfig(String),

    /// The engine gave up after repeated navigation failures
    #[error("Too many consecutive navigation failures")]
    TooManyFailures,

    /// Game control failure
    #[error("Control error: {0}")]
    Control(#[from] game_control::ControlError),

    /// Transport failure
    #[error("Transport error: {0}")]
    Transport(#[from] adb_transport::TransportError),

    /// IO error (persistence)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
