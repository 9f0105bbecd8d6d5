//! The routine interface
//!
//! A routine owns its own eligibility gate and exposes the lifecycle
//! the engine drives: `should_run` -> `start` -> `after_run`.

use crate::error::EngineError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use game_control::GameContext;

/// A unit of scheduled automation work
#[async_trait]
pub trait Routine: Send {
    /// Stable name used in config, state persistence and logs
    fn name(&self) -> &str;

    /// Whether the routine is eligible to run at `now`
    fn should_run(&self, now: DateTime<Utc>) -> bool;

    /// Perform the routine's work
    ///
    /// `Ok(false)` means the routine declined or could not finish;
    /// `Err` means something on the device side went wrong. The engine
    /// treats both as "not run" for bookkeeping purposes.
    async fn execute(&mut self, ctx: &mut GameContext) -> Result<bool, EngineError>;

    /// Record a successful run at `now`
    ///
    /// Called by the engine only when [`Routine::start`] reported
    /// success, never from `start` itself.
    fn after_run(&mut self, now: DateTime<Utc>);

    /// Run the routine after making sure the game is on the home screen
    ///
    /// All failures, navigation included, are logged and collapsed into
    /// `false` so one broken routine never stops the cycle.
    async fn start(&mut self, ctx: &mut GameContext) -> bool {
        if !ctx.ensure_home().await {
            tracing::warn!("{}: could not reach home screen, skipping", self.name());
            return false;
        }

        match self.execute(ctx).await {
            Ok(done) => done,
            Err(e) => {
                tracing::error!("{}: {}", self.name(), e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adb_transport::AdbTransport;
    use game_control::{GameConfig, TemplateLibrary};

    struct StubRoutine {
        executed: bool,
        result: Result<bool, EngineError>,
    }

    #[async_trait]
    impl Routine for StubRoutine {
        fn name(&self) -> &str {
            "stub"
        }

        fn should_run(&self, _now: DateTime<Utc>) -> bool {
            true
        }

        async fn execute(&mut self, _ctx: &mut GameContext) -> Result<bool, EngineError> {
            self.executed = true;
            std::mem::replace(&mut self.result, Ok(false))
        }

        fn after_run(&mut self, _now: DateTime<Utc>) {}
    }

    fn test_context() -> GameContext {
        let config: GameConfig =
            serde_json::from_str(r#"{"package_name": "com.example.game"}"#).unwrap();
        // A transport that cannot spawn anything, so any navigation
        // attempt fails fast
        let transport = AdbTransport::with_serial("/nonexistent/adb-test-binary", "serial0");
        GameContext::new(
            config,
            transport,
            TemplateLibrary::empty(),
            std::env::temp_dir(),
        )
    }

    #[tokio::test]
    async fn test_start_runs_execute_when_home() {
        let mut ctx = test_context();
        ctx.state.is_home = true;
        let mut routine = StubRoutine {
            executed: false,
            result: Ok(true),
        };
        assert!(routine.start(&mut ctx).await);
        assert!(routine.executed);
    }

    #[tokio::test]
    async fn test_start_skips_execute_when_navigation_fails() {
        let mut ctx = test_context();
        let mut routine = StubRoutine {
            executed: false,
            result: Ok(true),
        };
        assert!(!routine.start(&mut ctx).await);
        assert!(!routine.executed);
    }

    #[tokio::test]
    async fn test_start_converts_errors_to_false() {
        let mut ctx = test_context();
        ctx.state.is_home = true;
        let mut routine = StubRoutine {
            executed: false,
            result: Err(EngineError::TooManyFailures),
        };
        assert!(!routine.start(&mut ctx).await);
        assert!(routine.executed);
    }
}
