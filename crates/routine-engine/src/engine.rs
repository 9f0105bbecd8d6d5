//! Core automation engine
//!
//! Owns the ordered routine list, the shared game context and the
//! persisted run state, and drives everything from one sequential loop.
//! Routines never overlap; one broken routine never kills the process.

use crate::error::EngineError;
use crate::model::AutomationConfig;
use crate::persistence::{CheckKind, StateStore};
use crate::routine::Routine;
use crate::routines;
use chrono::{DateTime, Utc};
use game_control::GameContext;
use std::time::Duration;

/// Consecutive cycle failures before the engine gives up
const MAX_CONSECUTIVE_FAILURES: u32 = 5;
/// Backoff sleeps are capped at one hour
const MAX_BACKOFF_SECS: f64 = 3600.0;
/// Pause between cycles to avoid busy-looping the device
const CYCLE_PACING: Duration = Duration::from_secs(1);

/// A registered routine with its persistence namespace
pub struct EngineEntry {
    pub kind: CheckKind,
    pub routine: Box<dyn Routine>,
}

/// The main automation engine
pub struct AutomationEngine {
    /// Routines in config order, interval checks before scheduled events
    entries: Vec<EngineEntry>,
    ctx: GameContext,
    store: StateStore,
}

impl AutomationEngine {
    /// Build the engine from config, seeding gates from persisted state
    pub fn new(
        ctx: GameContext,
        config: &AutomationConfig,
        store: StateStore,
    ) -> Result<Self, EngineError> {
        let mut entries = Vec::new();

        for spec in &config.time_checks {
            let last_run = store.last_run(CheckKind::IntervalCheck, &spec.name);
            entries.push(EngineEntry {
                kind: CheckKind::IntervalCheck,
                routine: routines::build_interval(spec, last_run)?,
            });
        }

        for spec in &config.scheduled_events {
            let last_check = store.last_run(CheckKind::ScheduledEvent, &spec.name);
            entries.push(EngineEntry {
                kind: CheckKind::ScheduledEvent,
                routine: routines::build_scheduled(spec, last_check)?,
            });
        }

        tracing::info!("Initialized engine with {} routines", entries.len());
        Ok(Self {
            entries,
            ctx,
            store,
        })
    }

    /// Registered routine names, in execution order
    pub fn routine_names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.routine.name()).collect()
    }

    /// Main loop: cycle forever, backing off on repeated failures
    ///
    /// Returns only on a fatal condition; graceful shutdown is the
    /// caller's job (ctrl-c handling lives in the binary).
    pub async fn run(&mut self) -> Result<(), EngineError> {
        let mut consecutive_failures = 0u32;

        loop {
            if self.cycle().await? {
                consecutive_failures = 0;
                tokio::time::sleep(CYCLE_PACING).await;
            } else {
                consecutive_failures += 1;
                self.handle_cycle_failure(consecutive_failures).await?;
            }
        }
    }

    /// One cycle: make sure the game is up, then run eligible routines
    ///
    /// `Ok(false)` means the game could not be brought to a usable
    /// state; the caller decides how hard to back off.
    async fn cycle(&mut self) -> Result<bool, EngineError> {
        if !self.verify_game_running().await {
            return Ok(false);
        }
        self.run_scheduled_tasks(Utc::now()).await;
        Ok(true)
    }

    /// Run every eligible routine in order
    ///
    /// Successful runs advance the routine's gate and are persisted
    /// immediately, so a crash never replays more than the in-flight
    /// routine.
    async fn run_scheduled_tasks(&mut self, now: DateTime<Utc>) {
        for entry in &mut self.entries {
            if !entry.routine.should_run(now) {
                continue;
            }

            tracing::info!("Running {} routine", entry.routine.name());
            if entry.routine.start(&mut self.ctx).await {
                entry.routine.after_run(now);
                self.store.set_last_run(entry.kind, entry.routine.name(), now);
                if let Err(e) = self.store.save().await {
                    tracing::warn!("Failed to persist run state: {}", e);
                }
            } else {
                tracing::warn!("{} routine did not complete", entry.routine.name());
            }
        }
    }

    /// Verify the game is in the foreground and at the home screen,
    /// launching and retrying with exponential backoff
    ///
    /// All errors are logged and collapsed into `false`.
    async fn verify_game_running(&mut self) -> bool {
        let package = self.ctx.config.package_name.clone();
        let launch_wait = self.ctx.config.timings.launch_wait();
        let check_interval = self.ctx.config.timings.home_check_interval();

        let mut retry_count = 0;
        while retry_count < self.ctx.config.max_home_attempts {
            match self.ctx.foreground_app().await {
                Ok(Some(app)) if app == package => {}
                Ok(app) => {
                    tracing::info!("Game not running (foreground: {:?}), launching", app);
                    self.ctx.state.is_home = false;
                    if let Err(e) = self.ctx.launch_game().await {
                        tracing::error!("Failed to launch game: {}", e);
                        return false;
                    }
                    tokio::time::sleep(launch_wait).await;
                }
                Err(e) => {
                    tracing::error!("Error verifying game status: {}", e);
                    return false;
                }
            }

            match self.ctx.navigate_home(false).await {
                Ok(true) => {
                    self.ctx.state.is_home = true;
                    return true;
                }
                Ok(false) => {}
                Err(e) => {
                    tracing::error!("Error navigating home: {}", e);
                    return false;
                }
            }

            retry_count += 1;
            let sleep_time = backoff_delay(check_interval, retry_count);
            tracing::debug!(
                "Navigation failed, waiting {:?} before retry {}",
                sleep_time,
                retry_count
            );
            tokio::time::sleep(sleep_time).await;
        }

        tracing::error!("Failed to verify game is running after maximum attempts");
        false
    }

    /// Back off after a failed cycle and force a game restart
    async fn handle_cycle_failure(&mut self, consecutive_failures: u32) -> Result<(), EngineError> {
        if consecutive_failures >= MAX_CONSECUTIVE_FAILURES {
            tracing::error!(
                "Maximum retries ({}) reached, stopping automation",
                MAX_CONSECUTIVE_FAILURES
            );
            return Err(EngineError::TooManyFailures);
        }

        let sleep_time = backoff_delay(
            self.ctx.config.timings.launch_wait(),
            consecutive_failures,
        );
        tracing::warn!(
            "Cycle failure #{}, sleeping for {:?}",
            consecutive_failures,
            sleep_time
        );
        tokio::time::sleep(sleep_time).await;

        tracing::info!("Forcing game restart...");
        self.ctx.state.is_home = false;
        if let Err(e) = self.ctx.launch_game().await {
            tracing::error!("Forced restart failed: {}", e);
        }
        Ok(())
    }
}

/// Exponential backoff: `base * 2^n`, capped at one hour
fn backoff_delay(base: Duration, failures: u32) -> Duration {
    let secs = (base.as_secs_f64() * 2f64.powi(failures as i32)).min(MAX_BACKOFF_SECS);
    Duration::from_secs_f64(secs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CheckSpec, EventSpec, HandlerKind, Schedule};
    use adb_transport::AdbTransport;
    use game_control::{GameConfig, TemplateLibrary};

    fn test_context() -> GameContext {
        let config: GameConfig =
            serde_json::from_str(r#"{"package_name": "com.example.game"}"#).unwrap();
        let transport = AdbTransport::with_serial("/nonexistent/adb-test-binary", "serial0");
        GameContext::new(
            config,
            transport,
            TemplateLibrary::empty(),
            std::env::temp_dir(),
        )
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        assert_eq!(backoff_delay(Duration::from_secs(30), 1), Duration::from_secs(60));
        assert_eq!(backoff_delay(Duration::from_secs(30), 2), Duration::from_secs(120));
        assert_eq!(backoff_delay(Duration::from_secs(30), 10), Duration::from_secs(3600));
    }

    #[tokio::test]
    async fn test_engine_preserves_config_order() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::load(&dir.path().join("state.json")).await;

        let config = AutomationConfig {
            time_checks: vec![
                CheckSpec {
                    name: "reset".to_string(),
                    handler: HandlerKind::Reset,
                    interval: 2700,
                },
                CheckSpec {
                    name: "cleanup".to_string(),
                    handler: HandlerKind::Cleanup,
                    interval: 3600,
                },
            ],
            scheduled_events: vec![EventSpec {
                name: "vs_capture".to_string(),
                handler: HandlerKind::VsCapture,
                schedule: Some(Schedule {
                    day: Some("sunday".to_string()),
                    time: Some("01:50".to_string()),
                }),
            }],
        };

        let engine = AutomationEngine::new(test_context(), &config, store).unwrap();
        assert_eq!(engine.routine_names(), vec!["reset", "cleanup", "vs_capture"]);
    }

    #[tokio::test]
    async fn test_engine_rejects_zero_interval() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::load(&dir.path().join("state.json")).await;

        let config = AutomationConfig {
            time_checks: vec![CheckSpec {
                name: "reset".to_string(),
                handler: HandlerKind::Reset,
                interval: 0,
            }],
            scheduled_events: Vec::new(),
        };

        assert!(matches!(
            AutomationEngine::new(test_context(), &config, store),
            Err(EngineError::InvalidConfig(_))
        ));
    }
}
