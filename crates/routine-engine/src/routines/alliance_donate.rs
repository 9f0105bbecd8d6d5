//! Alliance tech donation routine

use crate::error::EngineError;
use crate::gate::RunGate;
use crate::routine::Routine;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use game_control::controls::human_delay;
use game_control::session::TapRequest;
use game_control::GameContext;
use std::time::Duration;

/// Hold on the donate button long enough to spend all donation attempts
const DONATE_HOLD: Duration = Duration::from_secs(15);

/// Donates to the recommended alliance tech
///
/// Tap chain: alliance icon -> tech icon -> recommended flag ->
/// long-press the donate button.
pub struct AllianceDonateRoutine {
    name: String,
    gate: RunGate,
}

impl AllianceDonateRoutine {
    pub fn new(name: String, gate: RunGate) -> Self {
        Self { name, gate }
    }

    async fn navigate_and_donate(&self, ctx: &mut GameContext) -> Result<bool, EngineError> {
        let steps = ["alliance", "alliance_tech", "recommended_flag"];
        for template in steps {
            let tapped = ctx
                .find_and_tap(TapRequest {
                    failure_msg: Some("Donate navigation step not found"),
                    ..TapRequest::new(template)
                })
                .await?;
            if !tapped {
                return Ok(false);
            }
            human_delay(ctx.config.timings.menu_animation()).await;
        }

        let donated = ctx
            .find_and_tap(TapRequest {
                failure_msg: Some("Donate button not found"),
                success_msg: Some("Donating to alliance tech"),
                long_press: Some(DONATE_HOLD),
                ..TapRequest::new("donate")
            })
            .await?;
        Ok(donated)
    }
}

#[async_trait]
impl Routine for AllianceDonateRoutine {
    fn name(&self) -> &str {
        &self.name
    }

    fn should_run(&self, now: DateTime<Utc>) -> bool {
        self.gate.is_due(now)
    }

    async fn execute(&mut self, ctx: &mut GameContext) -> Result<bool, EngineError> {
        ctx.state.is_home = false;
        let donated = self.navigate_and_donate(ctx).await?;

        // Leave the game back at the home screen for the next routine
        if ctx.navigate_home(false).await? {
            ctx.state.is_home = true;
        }
        Ok(donated)
    }

    fn after_run(&mut self, now: DateTime<Utc>) {
        self.gate.mark_run(now);
    }
}
