//! Error types for the game control layer

use thiserror::Error;

/// Errors that can occur while driving the game
#[derive(Error, Debug)]
pub enum ControlError {
    /// Transport-level failure
    #[error("Transport error: {0}")]
    Transport(#[from] adb_transport::TransportError),

    /// Template not present in the configured registry
    #[error("Unknown template: {0}")]
    UnknownTemplate(String),

    /// Invalid percent coordinate (expects "NN%" strings)
    #[error("Invalid percent coordinate: {0}")]
    InvalidPercent(String),

    /// UI element missing from configuration
    #[error("Unknown UI element: {0}")]
    UnknownUiElement(String),

    /// Screenshot could not be decoded
    #[error("Failed to decode screenshot: {0}")]
    ScreenshotDecode(String),

    /// Webhook URL not configured
    #[error("Webhook URL not configured")]
    WebhookNotConfigured,

    /// Webhook delivery failed
    #[error("Webhook delivery failed: {0}")]
    WebhookFailed(String),

    /// HTTP client error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error (configuration files)
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
