//! Weekly VS ranking capture routine

use crate::error::EngineError;
use crate::gate::RunGate;
use crate::routine::Routine;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use game_control::controls::human_delay;
use game_control::notify::VS_WEBHOOK_URL_ENV;
use game_control::session::TapRequest;
use game_control::{GameContext, VideoCapture, WebhookNotifier};
use std::time::Duration;

/// Swipes needed to scroll through the full ranking list
const RANKING_SWIPES: u32 = 19;
/// Slow swipe so every row stays readable on the recording
const SWIPE_MS: u32 = 500;

/// Records a scroll-through of the weekly VS rankings and uploads it
pub struct VsCaptureRoutine {
    name: String,
    gate: RunGate,
}

impl VsCaptureRoutine {
    pub fn new(name: String, gate: RunGate) -> Self {
        Self { name, gate }
    }

    async fn navigate_to_weekly_vs(&self, ctx: &mut GameContext) -> Result<bool, EngineError> {
        let steps = [
            ("vs_menu", "Could not find vs button"),
            ("points_ranking", "Could not find points_ranking button"),
            ("weekly_rank", "Could not find weekly_rank button"),
        ];
        for (template, failure_msg) in steps {
            let tapped = ctx
                .find_and_tap(TapRequest {
                    failure_msg: Some(failure_msg),
                    critical: true,
                    ..TapRequest::new(template)
                })
                .await?;
            if !tapped {
                return Ok(false);
            }
            human_delay(ctx.config.timings.menu_animation()).await;
        }

        ctx.tap_ui_element("alliance_toggle").await?;
        human_delay(ctx.config.timings.settle_time()).await;
        Ok(true)
    }

    async fn record_rankings(
        &self,
        ctx: &mut GameContext,
        video: &mut VideoCapture,
    ) -> Result<std::path::PathBuf, EngineError> {
        let filename = format!(
            "weekly_vs_recording_{}.mp4",
            Utc::now().format("%Y%m%d_%H%M%S")
        );
        tracing::info!("Starting screen recording: {}", filename);
        video.start(&ctx.transport, &filename).await?;

        let size = ctx.screen_size().await?;
        let x = (size.width / 2) as i32;
        let start_y = (size.height * 60 / 100) as i32;
        let end_y = (size.height * 30 / 100) as i32;

        for _ in 0..RANKING_SWIPES {
            ctx.transport.swipe(x, start_y, x, end_y, SWIPE_MS).await?;
            human_delay(Duration::from_secs(1)).await;
        }

        let local = video.stop(&ctx.transport).await?;
        tracing::info!("Weekly video recording completed");
        Ok(local)
    }

    async fn upload(&self, ctx: &GameContext, video_path: &std::path::Path) {
        let notifier = match std::env::var(VS_WEBHOOK_URL_ENV) {
            Ok(url) => WebhookNotifier::with_url(url, "VS Rankings Bot"),
            Err(_) => WebhookNotifier::from_config(&ctx.config.webhook),
        };
        if !notifier.is_configured() {
            tracing::error!("No webhook configured for VS recording upload");
            return;
        }
        match notifier
            .send_with_file("**Weekly VS Rankings Recording**", video_path)
            .await
        {
            Ok(()) => tracing::info!("Uploaded VS recording to webhook"),
            Err(e) => tracing::error!("Failed to upload VS recording: {}", e),
        }
    }
}

#[async_trait]
impl Routine for VsCaptureRoutine {
    fn name(&self) -> &str {
        &self.name
    }

    fn should_run(&self, now: DateTime<Utc>) -> bool {
        self.gate.is_due(now)
    }

    async fn execute(&mut self, ctx: &mut GameContext) -> Result<bool, EngineError> {
        ctx.state.is_home = false;
        if !self.navigate_to_weekly_vs(ctx).await? {
            return Ok(false);
        }

        let mut video = VideoCapture::new(&ctx.config.recording);
        let local = match self.record_rankings(ctx, &mut video).await {
            Ok(path) => path,
            Err(e) => {
                // Never leave a screenrecord child running on the device
                video.abort(&ctx.transport).await;
                return Err(e);
            }
        };

        // Upload is best effort; the recording is already on disk
        self.upload(ctx, &local).await;
        Ok(true)
    }

    fn after_run(&mut self, now: DateTime<Utc>) {
        self.gate.mark_run(now);
    }
}
