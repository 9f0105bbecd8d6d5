//! Scratch-file cleanup routine

use crate::error::EngineError;
use crate::gate::RunGate;
use crate::routine::Routine;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use game_control::GameContext;

/// Removes local scratch screenshots and stale device-side captures
pub struct CleanupRoutine {
    name: String,
    gate: RunGate,
}

impl CleanupRoutine {
    pub fn new(name: String, gate: RunGate) -> Self {
        Self { name, gate }
    }
}

#[async_trait]
impl Routine for CleanupRoutine {
    fn name(&self) -> &str {
        &self.name
    }

    fn should_run(&self, now: DateTime<Utc>) -> bool {
        self.gate.is_due(now)
    }

    async fn execute(&mut self, ctx: &mut GameContext) -> Result<bool, EngineError> {
        ctx.cleanup_tmp_files().await?;
        ctx.cleanup_device_screenshots().await?;
        Ok(true)
    }

    fn after_run(&mut self, now: DateTime<Utc>) {
        self.gate.mark_run(now);
    }
}
