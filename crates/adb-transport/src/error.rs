//! Error types for the ADB transport

use thiserror::Error;

/// Errors that can occur while talking to the adb binary
#[derive(Error, Debug)]
pub enum TransportError {
    /// The adb binary could not be spawned
    #[error("Failed to spawn adb ({binary}): {source}")]
    Spawn {
        binary: String,
        #[source]
        source: std::io::Error,
    },

    /// adb exited with a non-zero status
    #[error("adb {command} failed: {stderr}")]
    CommandFailed { command: String, stderr: String },

    /// Output from adb could not be parsed
    #[error("Failed to parse adb output: {0}")]
    ParseFailed(String),

    /// No devices are connected
    #[error("No devices connected")]
    NoDevices,

    /// A recording is already in progress
    #[error("Screen recording already in progress")]
    AlreadyRecording,

    /// No recording is in progress
    #[error("No screen recording in progress")]
    NotRecording,

    /// IO error (pulling files, writing screenshots)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
