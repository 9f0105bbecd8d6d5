//! Game restart routine

use crate::error::EngineError;
use crate::gate::RunGate;
use crate::routine::Routine;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use game_control::GameContext;
use std::time::Duration;

const NAVIGATE_RETRIES: u32 = 3;

/// Restarts the game app and navigates back to the home screen
pub struct ResetRoutine {
    name: String,
    gate: RunGate,
}

impl ResetRoutine {
    pub fn new(name: String, gate: RunGate) -> Self {
        Self { name, gate }
    }
}

#[async_trait]
impl Routine for ResetRoutine {
    fn name(&self) -> &str {
        &self.name
    }

    fn should_run(&self, now: DateTime<Utc>) -> bool {
        self.gate.is_due(now)
    }

    async fn execute(&mut self, ctx: &mut GameContext) -> Result<bool, EngineError> {
        tracing::info!("Launching game");
        ctx.state.is_home = false;
        ctx.launch_game().await?;
        tokio::time::sleep(ctx.config.timings.launch_wait()).await;

        for _ in 0..NAVIGATE_RETRIES {
            if ctx.navigate_home(true).await? {
                ctx.state.is_home = true;
                return Ok(true);
            }
            tokio::time::sleep(Duration::from_secs(2)).await;
        }

        tracing::error!("Failed to navigate home after reset");
        Ok(false)
    }

    fn after_run(&mut self, now: DateTime<Utc>) {
        self.gate.mark_run(now);
    }
}
