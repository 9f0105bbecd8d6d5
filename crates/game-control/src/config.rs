//! Game configuration
//!
//! Loaded from a JSON file: package name, adb settings, timing knobs,
//! matching thresholds, percent-based UI coordinates and the template
//! registry.

use crate::error::ControlError;
use adb_transport::{AdbEndpoint, ScreenSize};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top-level game configuration
#[derive(Debug, Clone, Deserialize)]
pub struct GameConfig {
    /// Android package name of the game
    pub package_name: String,
    /// adb binary and optional TCP endpoint
    #[serde(default)]
    pub adb: AdbConfig,
    /// Timing knobs (seconds)
    #[serde(default)]
    pub timings: Timings,
    /// Default template match threshold (0.0 - 1.0)
    #[serde(default = "default_match_threshold")]
    pub match_threshold: f32,
    /// Maximum attempts to reach the home screen before giving up
    #[serde(default = "default_max_home_attempts")]
    pub max_home_attempts: u32,
    /// Maximum applicants accepted per secretary position
    #[serde(default = "default_max_accept_count")]
    pub max_accept_count: u32,
    /// UI elements addressed by screen percentage
    #[serde(default)]
    pub ui_elements: HashMap<String, PercentPoint>,
    /// Template registry (name -> image path + optional threshold)
    #[serde(default)]
    pub templates: HashMap<String, TemplateConfig>,
    /// Screen recording settings
    #[serde(default)]
    pub recording: RecordingConfig,
    /// Webhook notification settings
    #[serde(default)]
    pub webhook: WebhookConfig,
}

/// adb binary location and optional TCP endpoint
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AdbConfig {
    pub binary_path: String,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub enforce_connection: bool,
}

impl Default for AdbConfig {
    fn default() -> Self {
        Self {
            binary_path: "adb".to_string(),
            host: None,
            port: None,
            enforce_connection: false,
        }
    }
}

impl AdbConfig {
    /// TCP endpoint, when both host and port are configured
    pub fn endpoint(&self) -> Option<AdbEndpoint> {
        match (&self.host, self.port) {
            (Some(host), Some(port)) if port > 0 => Some(AdbEndpoint {
                host: host.clone(),
                port,
            }),
            _ => None,
        }
    }
}

/// Timing knobs, all in seconds
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Timings {
    pub menu_animation: f64,
    pub tap_delay: f64,
    pub settle_time: f64,
    pub launch_wait: f64,
    pub max_home_wait: f64,
    pub home_check_interval: f64,
    pub list_timeout: f64,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            menu_animation: 2.0,
            tap_delay: 1.0,
            settle_time: 1.0,
            launch_wait: 30.0,
            max_home_wait: 60.0,
            home_check_interval: 5.0,
            list_timeout: 10.0,
        }
    }
}

impl Timings {
    pub fn menu_animation(&self) -> Duration {
        Duration::from_secs_f64(self.menu_animation)
    }

    pub fn tap_delay(&self) -> Duration {
        Duration::from_secs_f64(self.tap_delay)
    }

    pub fn settle_time(&self) -> Duration {
        Duration::from_secs_f64(self.settle_time)
    }

    pub fn launch_wait(&self) -> Duration {
        Duration::from_secs_f64(self.launch_wait)
    }

    pub fn max_home_wait(&self) -> Duration {
        Duration::from_secs_f64(self.max_home_wait)
    }

    pub fn home_check_interval(&self) -> Duration {
        Duration::from_secs_f64(self.home_check_interval)
    }

    pub fn list_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.list_timeout)
    }
}

/// A screen position expressed as percentages of width/height
///
/// Deserialized from `{"x": "48%", "y": "95%"}`.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(try_from = "RawPercentPoint")]
pub struct PercentPoint {
    pub x: f32,
    pub y: f32,
}

#[derive(Deserialize)]
struct RawPercentPoint {
    x: String,
    y: String,
}

impl TryFrom<RawPercentPoint> for PercentPoint {
    type Error = ControlError;

    fn try_from(raw: RawPercentPoint) -> Result<Self, Self::Error> {
        Ok(Self {
            x: parse_percent(&raw.x)?,
            y: parse_percent(&raw.y)?,
        })
    }
}

impl PercentPoint {
    /// Resolve against a screen size into pixel coordinates
    pub fn resolve(&self, size: ScreenSize) -> (i32, i32) {
        let x = (size.width as f32 * self.x / 100.0) as i32;
        let y = (size.height as f32 * self.y / 100.0) as i32;
        (x, y)
    }
}

/// Parse a "NN%" string into its numeric value
fn parse_percent(s: &str) -> Result<f32, ControlError> {
    let trimmed = s.trim().trim_end_matches('%');
    let value: f32 = trimmed
        .parse()
        .map_err(|_| ControlError::InvalidPercent(s.to_string()))?;
    if !(0.0..=100.0).contains(&value) {
        return Err(ControlError::InvalidPercent(s.to_string()));
    }
    Ok(value)
}

/// Registry entry for a template image
#[derive(Debug, Clone, Deserialize)]
pub struct TemplateConfig {
    /// Path relative to the config directory
    pub path: PathBuf,
    /// Per-template threshold override
    #[serde(default)]
    pub threshold: Option<f32>,
}

/// Screen recording settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RecordingConfig {
    /// Directory where pulled recordings are stored
    pub output_dir: PathBuf,
    /// Rotation budget for the output directory, in bytes
    pub max_folder_bytes: u64,
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("records"),
            // 2 GiB
            max_folder_bytes: 2 * 1024 * 1024 * 1024,
        }
    }
}

/// Webhook notification settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WebhookConfig {
    pub url: Option<String>,
    pub username: String,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            url: None,
            username: "Game Bot".to_string(),
        }
    }
}

fn default_match_threshold() -> f32 {
    0.9
}

fn default_max_home_attempts() -> u32 {
    5
}

fn default_max_accept_count() -> u32 {
    8
}

impl GameConfig {
    /// Load configuration from a JSON file
    pub async fn load(path: &Path) -> Result<Self, ControlError> {
        let contents = tokio::fs::read_to_string(path).await?;
        let config: Self = serde_json::from_str(&contents)?;
        tracing::info!(
            "Loaded game config from {:?} ({} templates, {} ui elements)",
            path,
            config.templates.len(),
            config.ui_elements.len()
        );
        Ok(config)
    }

    /// Threshold for a template, falling back to the global default
    pub fn threshold_for(&self, template: &str) -> f32 {
        self.templates
            .get(template)
            .and_then(|t| t.threshold)
            .unwrap_or(self.match_threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_percent() {
        assert_eq!(parse_percent("48%").unwrap(), 48.0);
        assert_eq!(parse_percent("3.5%").unwrap(), 3.5);
        assert!(parse_percent("oops").is_err());
        assert!(parse_percent("150%").is_err());
    }

    #[test]
    fn test_percent_point_resolve() {
        let point = PercentPoint { x: 50.0, y: 25.0 };
        let size = ScreenSize {
            width: 1080,
            height: 2400,
        };
        assert_eq!(point.resolve(size), (540, 600));
    }

    #[test]
    fn test_config_deserialization() {
        let json = r#"{
            "package_name": "com.example.game",
            "adb": { "binary_path": "adb", "host": "10.0.0.2", "port": 5555, "enforce_connection": true },
            "ui_elements": { "profile": { "x": "6%", "y": "3%" } },
            "templates": { "home": { "path": "templates/home.png", "threshold": 0.85 } }
        }"#;
        let config: GameConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.package_name, "com.example.game");
        assert_eq!(config.adb.endpoint().unwrap().port, 5555);
        assert_eq!(config.threshold_for("home"), 0.85);
        assert_eq!(config.threshold_for("unknown"), 0.9);
        assert_eq!(config.ui_elements["profile"].x, 6.0);
        assert_eq!(config.max_home_attempts, 5);
    }

    #[test]
    fn test_minimal_config() {
        let config: GameConfig = serde_json::from_str(r#"{"package_name": "a.b.c"}"#).unwrap();
        assert!(config.adb.endpoint().is_none());
        assert_eq!(config.timings.launch_wait, 30.0);
        assert_eq!(config.recording.output_dir, PathBuf::from("records"));
    }
}
