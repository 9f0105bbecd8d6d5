//! Run-state persistence using JSON file storage
//!
//! Last-run timestamps survive restarts so interval routines do not all
//! fire immediately after the bot comes back up.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Which kind of gate a routine uses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckKind {
    /// Interval-based health check
    IntervalCheck,
    /// Day/time scheduled event
    ScheduledEvent,
}

/// Persisted last-run timestamps, keyed by routine name
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct AutomationState {
    /// Unix epoch seconds of the last successful run per interval check
    #[serde(default)]
    pub time_checks: HashMap<String, i64>,
    /// Unix epoch seconds of the last successful run per scheduled event
    #[serde(default)]
    pub scheduled_events: HashMap<String, i64>,
}

/// File-backed store for [`AutomationState`]
pub struct StateStore {
    path: PathBuf,
    state: AutomationState,
}

impl StateStore {
    /// Load state from a JSON file
    ///
    /// A missing or unreadable file starts fresh rather than failing:
    /// the worst case is routines running once more than necessary.
    pub async fn load(path: &Path) -> Self {
        let state = match fs::read_to_string(path).await {
            Ok(contents) => match serde_json::from_str::<AutomationState>(&contents) {
                Ok(state) => {
                    tracing::info!(
                        "Loaded state for {} checks and {} events from {:?}",
                        state.time_checks.len(),
                        state.scheduled_events.len(),
                        path
                    );
                    state
                }
                Err(e) => {
                    tracing::warn!("Failed to parse state file {:?}: {}", path, e);
                    AutomationState::default()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No state file found at {:?}, starting fresh", path);
                AutomationState::default()
            }
            Err(e) => {
                tracing::warn!("Failed to read state file {:?}: {}", path, e);
                AutomationState::default()
            }
        };
        Self {
            path: path.to_path_buf(),
            state,
        }
    }

    /// Last successful run of a routine, if any
    pub fn last_run(&self, kind: CheckKind, name: &str) -> Option<DateTime<Utc>> {
        let map = match kind {
            CheckKind::IntervalCheck => &self.state.time_checks,
            CheckKind::ScheduledEvent => &self.state.scheduled_events,
        };
        map.get(name)
            .and_then(|&secs| Utc.timestamp_opt(secs, 0).single())
    }

    /// Record a successful run
    pub fn set_last_run(&mut self, kind: CheckKind, name: &str, at: DateTime<Utc>) {
        let map = match kind {
            CheckKind::IntervalCheck => &mut self.state.time_checks,
            CheckKind::ScheduledEvent => &mut self.state.scheduled_events,
        };
        map.insert(name.to_string(), at.timestamp());
    }

    /// Save state atomically: write to a temp file, then rename
    pub async fn save(&self) -> Result<(), std::io::Error> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let json = serde_json::to_string_pretty(&self.state)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;

        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, &json).await?;
        fs::rename(&tmp_path, &self.path).await?;

        tracing::debug!("Saved automation state to {:?}", self.path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[tokio::test]
    async fn test_missing_file_starts_fresh() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::load(&dir.path().join("state.json")).await;
        assert!(store.last_run(CheckKind::IntervalCheck, "reset").is_none());
    }

    #[tokio::test]
    async fn test_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        let at = Utc.with_ymd_and_hms(2024, 3, 4, 12, 0, 0).unwrap();

        let mut store = StateStore::load(&path).await;
        store.set_last_run(CheckKind::IntervalCheck, "reset", at);
        store.set_last_run(CheckKind::ScheduledEvent, "vs_capture", at);
        store.save().await.unwrap();

        let reloaded = StateStore::load(&path).await;
        assert_eq!(reloaded.last_run(CheckKind::IntervalCheck, "reset"), Some(at));
        assert_eq!(
            reloaded.last_run(CheckKind::ScheduledEvent, "vs_capture"),
            Some(at)
        );
        // Kinds are namespaced independently
        assert!(reloaded
            .last_run(CheckKind::ScheduledEvent, "reset")
            .is_none());
    }

    #[tokio::test]
    async fn test_corrupt_file_starts_fresh() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, "{not json").await.unwrap();
        let store = StateStore::load(&path).await;
        assert!(store.last_run(CheckKind::IntervalCheck, "reset").is_none());
    }
}
