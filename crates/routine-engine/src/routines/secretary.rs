//! Secretary applicant processing routine

use crate::error::EngineError;
use crate::gate::RunGate;
use crate::routine::Routine;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use game_control::controls::human_delay;
use game_control::vision::Match;
use game_control::GameContext;

/// Secretary positions, processed in this order
const POSITIONS: [&str; 5] = ["strategy", "security", "development", "science", "interior"];

/// How close an applicant badge must be to a position slot to count
const APPLICANT_GAP_X: i32 = 100;
const APPLICANT_GAP_Y: i32 = 28;

/// Back presses allowed when returning to the secretary menu
const MAX_EXIT_ATTEMPTS: u32 = 10;

/// Accepts pending secretary applicants for each position
///
/// Opens the profile and secretary menus, then for every position with
/// an applicant badge nearby: opens the position, opens the applicant
/// list and accepts candidates top-down up to the configured cap.
pub struct SecretaryRoutine {
    name: String,
    gate: RunGate,
}

impl SecretaryRoutine {
    pub fn new(name: String, gate: RunGate) -> Self {
        Self { name, gate }
    }

    async fn open_secretary_menu(&self, ctx: &mut GameContext) -> Result<(), EngineError> {
        ctx.tap_ui_element("profile").await?;
        human_delay(ctx.config.timings.menu_animation()).await;
        ctx.tap_ui_element("secretary_menu").await?;
        human_delay(ctx.config.timings.menu_animation()).await;
        Ok(())
    }

    /// Accept applicants for one position; `Ok(false)` aborts the run
    async fn process_position(
        &self,
        ctx: &mut GameContext,
        position: &str,
    ) -> Result<bool, EngineError> {
        let Some(slot) = ctx.find_template(position).await? else {
            tracing::warn!("Could not find {} secretary position", position);
            return Ok(true);
        };

        ctx.humanized_tap(slot.x, slot.y).await?;
        human_delay(ctx.config.timings.tap_delay()).await;

        let list_timeout = ctx.config.timings.list_timeout();
        let Some(list) = ctx.wait_for_template("list", list_timeout).await? else {
            tracing::error!("List button not found for {}", position);
            return Ok(false);
        };
        ctx.humanized_tap(list.x, list.y).await?;
        human_delay(ctx.config.timings.tap_delay()).await;

        // Long lists open mid-scroll; bring them back to the top
        if ctx.find_all_templates("accept").await?.len() > 5 {
            ctx.swipe_batch(30, 70, 3).await?;
            human_delay(ctx.config.timings.settle_time()).await;
        }

        let mut accepted = 0u32;
        while accepted < ctx.config.max_accept_count {
            // Buttons move after each accept, so re-detect every pass
            let accepts = ctx.find_all_templates("accept").await?;
            let Some(topmost) = accepts.first() else {
                break;
            };
            ctx.humanized_tap(topmost.x, topmost.y).await?;
            human_delay(ctx.config.timings.tap_delay()).await;
            accepted += 1;
        }
        tracing::info!("Accepted {} candidates for {}", accepted, position);

        self.exit_to_secretary_menu(ctx).await
    }

    /// Press back until the secretary menu header is visible again
    async fn exit_to_secretary_menu(&self, ctx: &mut GameContext) -> Result<bool, EngineError> {
        let menu_animation = ctx.config.timings.menu_animation();
        for _ in 0..MAX_EXIT_ATTEMPTS {
            if ctx
                .wait_for_template("president", menu_animation)
                .await?
                .is_some()
            {
                return Ok(true);
            }
            ctx.press_back().await?;
            human_delay(menu_animation).await;
        }
        tracing::error!("Failed to return to secretary menu");
        Ok(false)
    }
}

fn has_nearby_applicant(badges: &[Match], slot: &Match) -> bool {
    badges
        .iter()
        .any(|b| (b.x - slot.x).abs() <= APPLICANT_GAP_X && (b.y - slot.y).abs() <= APPLICANT_GAP_Y)
}

#[async_trait]
impl Routine for SecretaryRoutine {
    fn name(&self) -> &str {
        &self.name
    }

    fn should_run(&self, now: DateTime<Utc>) -> bool {
        self.gate.is_due(now)
    }

    async fn execute(&mut self, ctx: &mut GameContext) -> Result<bool, EngineError> {
        ctx.state.is_home = false;
        self.open_secretary_menu(ctx).await?;

        let badges = ctx.find_all_templates("applicant").await?;
        for position in POSITIONS {
            if let Some(slot) = ctx.find_template(position).await? {
                if !has_nearby_applicant(&badges, &slot) {
                    tracing::debug!("No applicants for {}", position);
                    continue;
                }
            }
            if !self.process_position(ctx, position).await? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn after_run(&mut self, now: DateTime<Utc>) {
        self.gate.mark_run(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(x: i32, y: i32) -> Match {
        Match { x, y, score: 1.0 }
    }

    #[test]
    fn test_applicant_proximity() {
        let slot = at(500, 300);
        assert!(has_nearby_applicant(&[at(560, 310)], &slot));
        assert!(has_nearby_applicant(&[at(400, 290)], &slot));
        // Too far horizontally
        assert!(!has_nearby_applicant(&[at(650, 300)], &slot));
        // Too far vertically
        assert!(!has_nearby_applicant(&[at(500, 340)], &slot));
        assert!(!has_nearby_applicant(&[], &slot));
    }
}
