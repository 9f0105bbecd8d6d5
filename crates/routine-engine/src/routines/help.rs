//! Alliance help routine

use crate::error::EngineError;
use crate::gate::RunGate;
use crate::routine::Routine;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use game_control::session::TapRequest;
use game_control::GameContext;

/// Taps the alliance help button when it is on screen
///
/// The button being absent just means nobody needs helping, so this
/// routine always reports success.
pub struct HelpRoutine {
    name: String,
    gate: RunGate,
}

impl HelpRoutine {
    pub fn new(name: String, gate: RunGate) -> Self {
        Self { name, gate }
    }
}

#[async_trait]
impl Routine for HelpRoutine {
    fn name(&self) -> &str {
        &self.name
    }

    fn should_run(&self, now: DateTime<Utc>) -> bool {
        self.gate.is_due(now)
    }

    async fn execute(&mut self, ctx: &mut GameContext) -> Result<bool, EngineError> {
        ctx.find_and_tap(TapRequest {
            failure_msg: Some("No help needed at this time"),
            success_msg: Some("Helping allies!"),
            ..TapRequest::new("help")
        })
        .await?;
        Ok(true)
    }

    fn after_run(&mut self, now: DateTime<Utc>) {
        self.gate.mark_run(now);
    }
}
