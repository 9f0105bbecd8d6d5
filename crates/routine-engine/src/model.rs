//! Automation configuration model
//!
//! Routines come from a JSON file with two ordered arrays: interval
//! checks and scheduled events. Arrays (not maps) so execution order is
//! explicit and stable.

use crate::error::EngineError;
use serde::Deserialize;
use std::path::Path;

/// Top-level automation configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AutomationConfig {
    /// Interval-gated checks, run in listed order
    #[serde(default)]
    pub time_checks: Vec<CheckSpec>,
    /// Day/time scheduled events, run in listed order
    #[serde(default)]
    pub scheduled_events: Vec<EventSpec>,
}

/// An interval-gated routine entry
#[derive(Debug, Clone, Deserialize)]
pub struct CheckSpec {
    pub name: String,
    pub handler: HandlerKind,
    /// Minimum seconds between runs
    pub interval: u64,
}

/// A scheduled routine entry
#[derive(Debug, Clone, Deserialize)]
pub struct EventSpec {
    pub name: String,
    pub handler: HandlerKind,
    /// Absent schedule means run-once/immediate semantics
    #[serde(default)]
    pub schedule: Option<Schedule>,
}

/// Day-of-week + time-of-day window
///
/// `day` is an English weekday name (case-insensitive), `time` is
/// "HH:MM". Either field may be omitted.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Schedule {
    #[serde(default)]
    pub day: Option<String>,
    #[serde(default)]
    pub time: Option<String>,
}

/// Known routine implementations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandlerKind {
    Cleanup,
    Reset,
    Help,
    AllianceDonate,
    DigCheck,
    Secretary,
    VsCapture,
}

impl AutomationConfig {
    /// Load automation configuration from a JSON file
    ///
    /// A missing file yields an empty configuration, matching how the
    /// bot treats unconfigured installs.
    pub async fn load(path: &Path) -> Result<Self, EngineError> {
        let contents = match tokio::fs::read_to_string(path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!("No automation config at {:?}, using empty configuration", path);
                return Ok(Self::default());
            }
            Err(e) => return Err(e.into()),
        };
        let config: Self = serde_json::from_str(&contents)?;
        tracing::info!(
            "Loaded automation config: {} time checks, {} scheduled events",
            config.time_checks.len(),
            config.scheduled_events.len()
        );
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_preserves_order() {
        let json = r#"{
            "time_checks": [
                { "name": "reset", "handler": "reset", "interval": 2700 },
                { "name": "cleanup", "handler": "cleanup", "interval": 3600 },
                { "name": "donate", "handler": "alliance_donate", "interval": 43200 }
            ],
            "scheduled_events": [
                { "name": "vs_capture", "handler": "vs_capture",
                  "schedule": { "day": "sunday", "time": "01:50" } }
            ]
        }"#;
        let config: AutomationConfig = serde_json::from_str(json).unwrap();
        let names: Vec<&str> = config.time_checks.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["reset", "cleanup", "donate"]);
        assert_eq!(config.time_checks[0].handler, HandlerKind::Reset);
        let schedule = config.scheduled_events[0].schedule.as_ref().unwrap();
        assert_eq!(schedule.day.as_deref(), Some("sunday"));
        assert_eq!(schedule.time.as_deref(), Some("01:50"));
    }

    #[test]
    fn test_event_without_schedule() {
        let json = r#"{ "scheduled_events": [ { "name": "once", "handler": "vs_capture" } ] }"#;
        let config: AutomationConfig = serde_json::from_str(json).unwrap();
        assert!(config.scheduled_events[0].schedule.is_none());
    }

    #[test]
    fn test_unknown_handler_rejected() {
        let json = r#"{ "time_checks": [ { "name": "x", "handler": "mystery", "interval": 60 } ] }"#;
        assert!(serde_json::from_str::<AutomationConfig>(json).is_err());
    }
}
