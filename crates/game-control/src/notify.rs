//! Webhook notification delivery
//!
//! Posts messages (optionally with a file attachment) to a
//! Discord-compatible webhook URL.

use crate::config::WebhookConfig;
use crate::error::ControlError;
use std::path::Path;

/// Environment variable overriding the configured webhook URL
pub const WEBHOOK_URL_ENV: &str = "WEBHOOK_URL";
/// Environment variable for the VS recording upload webhook
pub const VS_WEBHOOK_URL_ENV: &str = "VS_UPLOAD_WEBHOOK_URL";

/// Sends notifications to a configured webhook
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: Option<String>,
    username: String,
}

impl WebhookNotifier {
    /// Build from config, letting `WEBHOOK_URL` override the file value
    pub fn from_config(config: &WebhookConfig) -> Self {
        let url = std::env::var(WEBHOOK_URL_ENV)
            .ok()
            .or_else(|| config.url.clone());
        Self {
            client: reqwest::Client::new(),
            url,
            username: config.username.clone(),
        }
    }

    /// Build with an explicit URL (e.g. the VS upload webhook)
    pub fn with_url(url: String, username: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: Some(url),
            username: username.to_string(),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.url.is_some()
    }

    /// Send a text message
    pub async fn send(&self, content: &str) -> Result<(), ControlError> {
        let url = self.url.as_ref().ok_or(ControlError::WebhookNotConfigured)?;
        let body = serde_json::json!({
            "content": content,
            "username": self.username,
        });

        let response = self.client.post(url).json(&body).send().await?;
        if !response.status().is_success() {
            return Err(ControlError::WebhookFailed(format!(
                "status {}",
                response.status()
            )));
        }
        tracing::debug!("Webhook message delivered");
        Ok(())
    }

    /// Send a message with a file attachment (multipart upload)
    pub async fn send_with_file(&self, content: &str, file: &Path) -> Result<(), ControlError> {
        let url = self.url.as_ref().ok_or(ControlError::WebhookNotConfigured)?;

        let bytes = tokio::fs::read(file).await?;
        let filename = file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "attachment.bin".to_string());

        let payload = serde_json::json!({
            "content": content,
            "username": self.username,
        });
        let form = reqwest::multipart::Form::new()
            .text("payload_json", payload.to_string())
            .part(
                "files[0]",
                reqwest::multipart::Part::bytes(bytes).file_name(filename),
            );

        let response = self.client.post(url).multipart(form).send().await?;
        if !response.status().is_success() {
            return Err(ControlError::WebhookFailed(format!(
                "status {}",
                response.status()
            )));
        }
        tracing::info!("Webhook attachment delivered: {:?}", file);
        Ok(())
    }
}
