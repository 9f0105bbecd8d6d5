//! Dig marker check routine

use crate::error::EngineError;
use crate::gate::RunGate;
use crate::routine::Routine;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use game_control::{GameContext, WebhookNotifier};

/// Looks for the dig marker on the map and pings the webhook when found
pub struct DigCheckRoutine {
    name: String,
    gate: RunGate,
}

impl DigCheckRoutine {
    pub fn new(name: String, gate: RunGate) -> Self {
        Self { name, gate }
    }
}

#[async_trait]
impl Routine for DigCheckRoutine {
    fn name(&self) -> &str {
        &self.name
    }

    fn should_run(&self, now: DateTime<Utc>) -> bool {
        self.gate.is_due(now)
    }

    async fn execute(&mut self, ctx: &mut GameContext) -> Result<bool, EngineError> {
        let Some(found) = ctx.find_template("dig").await? else {
            tracing::debug!("No dig marker on screen");
            return Ok(true);
        };

        tracing::info!("Dig marker found at ({}, {})", found.x, found.y);
        ctx.humanized_tap(found.x, found.y).await?;

        // Notification is best effort; a down webhook must not fail the run
        let notifier = WebhookNotifier::from_config(&ctx.config.webhook);
        if notifier.is_configured() {
            if let Err(e) = notifier.send("Dig marker spotted, go collect!").await {
                tracing::warn!("Failed to send dig notification: {}", e);
            }
        }
        Ok(true)
    }

    fn after_run(&mut self, now: DateTime<Utc>) {
        self.gate.mark_run(now);
    }
}
