//! Game session context
//!
//! [`GameContext`] bundles the transport, configuration, template
//! library and shared state, and exposes the screen-level operations
//! routines are written against.

use crate::config::GameConfig;
use crate::controls::{self, TAP_JITTER};
use crate::error::ControlError;
use crate::vision::{self, Match, TemplateLibrary};
use adb_transport::{AdbTransport, ScreenSize};
use image::GrayImage;
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// Shared automation state consulted by the start sequencer
#[derive(Debug, Default)]
pub struct GameState {
    /// Whether the game is known to be on the home screen
    pub is_home: bool,
}

/// Options for [`GameContext::find_and_tap`]
#[derive(Default)]
pub struct TapRequest<'a> {
    pub template: &'a str,
    /// Logged when the template is not on screen
    pub failure_msg: Option<&'a str>,
    /// Logged right before tapping
    pub success_msg: Option<&'a str>,
    /// Log the failure message at error level instead of info
    pub critical: bool,
    /// Long-press instead of tapping
    pub long_press: Option<Duration>,
    /// Poll for the template instead of a single screenshot
    pub timeout: Option<Duration>,
}

impl<'a> TapRequest<'a> {
    pub fn new(template: &'a str) -> Self {
        Self {
            template,
            ..Self::default()
        }
    }
}

/// Everything a routine needs to drive the game
pub struct GameContext {
    pub transport: AdbTransport,
    pub config: GameConfig,
    pub templates: TemplateLibrary,
    pub state: GameState,
    tmp_dir: PathBuf,
}

impl GameContext {
    pub fn new(
        config: GameConfig,
        transport: AdbTransport,
        templates: TemplateLibrary,
        tmp_dir: PathBuf,
    ) -> Self {
        Self {
            transport,
            config,
            templates,
            state: GameState::default(),
            tmp_dir,
        }
    }

    /// Local scratch directory for screenshots
    pub fn tmp_dir(&self) -> &PathBuf {
        &self.tmp_dir
    }

    /// Capture the current screen into the tmp dir and decode it
    pub async fn screenshot(&self) -> Result<GrayImage, ControlError> {
        let path = self.tmp_dir.join("screen.png");
        self.transport.screencap_to(&path).await?;
        let img = image::open(&path)
            .map_err(|e| ControlError::ScreenshotDecode(e.to_string()))?
            .to_luma8();
        Ok(img)
    }

    /// Find the best on-screen match for a template
    pub async fn find_template(&self, name: &str) -> Result<Option<Match>, ControlError> {
        let template = self.templates.get(name)?;
        let screen = self.screenshot().await?;
        let found = vision::match_template(&screen, &template.image, template.threshold);
        tracing::debug!("find_template({}) -> {:?}", name, found);
        Ok(found)
    }

    /// Find all on-screen matches for a template, top-to-bottom
    pub async fn find_all_templates(&self, name: &str) -> Result<Vec<Match>, ControlError> {
        let template = self.templates.get(name)?;
        let screen = self.screenshot().await?;
        let matches = vision::match_all(&screen, &template.image, template.threshold);
        tracing::debug!("Found {} matches for {}", matches.len(), name);
        Ok(matches)
    }

    /// Poll until a template appears or the timeout passes
    pub async fn wait_for_template(
        &self,
        name: &str,
        timeout: Duration,
    ) -> Result<Option<Match>, ControlError> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(found) = self.find_template(name).await? {
                return Ok(Some(found));
            }
            if Instant::now() >= deadline {
                return Ok(None);
            }
            tokio::time::sleep(Duration::from_secs(1)).await;
        }
    }

    /// Find a template and tap (or long-press) it
    ///
    /// Returns `Ok(false)` when the template is not on screen.
    pub async fn find_and_tap(&self, req: TapRequest<'_>) -> Result<bool, ControlError> {
        let found = match req.timeout {
            Some(timeout) => self.wait_for_template(req.template, timeout).await?,
            None => self.find_template(req.template).await?,
        };

        let Some(found) = found else {
            if let Some(msg) = req.failure_msg {
                if req.critical {
                    tracing::error!("{}", msg);
                } else {
                    tracing::info!("{}", msg);
                }
            }
            return Ok(false);
        };

        if let Some(msg) = req.success_msg {
            tracing::info!("{}", msg);
        }

        match req.long_press {
            Some(duration) => self.humanized_long_press(found.x, found.y, duration).await?,
            None => self.humanized_tap(found.x, found.y).await?,
        }
        Ok(true)
    }

    /// Tap with pixel jitter
    pub async fn humanized_tap(&self, x: i32, y: i32) -> Result<(), ControlError> {
        let (x, y) = controls::jittered(x, y, TAP_JITTER);
        self.transport.tap(x, y).await?;
        Ok(())
    }

    /// Long-press with pixel jitter
    pub async fn humanized_long_press(
        &self,
        x: i32,
        y: i32,
        duration: Duration,
    ) -> Result<(), ControlError> {
        let (x, y) = controls::jittered(x, y, TAP_JITTER);
        self.transport
            .long_press(x, y, duration.as_millis() as u32)
            .await?;
        Ok(())
    }

    /// Repeat a vertical swipe, pausing between passes
    ///
    /// Start and end heights are percentages of the screen; swiping
    /// from a low start to a high end scrolls a list back toward its
    /// top.
    pub async fn swipe_batch(
        &self,
        start_y_pct: u32,
        end_y_pct: u32,
        count: u32,
    ) -> Result<(), ControlError> {
        let size = self.screen_size().await?;
        let x = (size.width / 2) as i32;
        let start_y = (size.height * start_y_pct / 100) as i32;
        let end_y = (size.height * end_y_pct / 100) as i32;
        for _ in 0..count {
            self.transport.swipe(x, start_y, x, end_y, 300).await?;
            controls::human_delay(self.config.timings.settle_time()).await;
        }
        Ok(())
    }

    /// Tap a UI element addressed by screen percentage
    pub async fn tap_ui_element(&self, name: &str) -> Result<(), ControlError> {
        let point = self
            .config
            .ui_elements
            .get(name)
            .copied()
            .ok_or_else(|| ControlError::UnknownUiElement(name.to_string()))?;
        let size = self.screen_size().await?;
        let (x, y) = point.resolve(size);
        self.humanized_tap(x, y).await
    }

    /// Device screen size
    pub async fn screen_size(&self) -> Result<ScreenSize, ControlError> {
        Ok(self.transport.screen_size().await?)
    }

    /// Press the back button
    pub async fn press_back(&self) -> Result<(), ControlError> {
        Ok(self.transport.press_back().await?)
    }

    /// Remove stale screenshots from the device
    pub async fn cleanup_device_screenshots(&self) -> Result<(), ControlError> {
        self.transport.rm("/sdcard/screen*.png").await?;
        tracing::debug!("Cleaned up device screenshots");
        Ok(())
    }

    /// Remove local scratch PNGs
    pub async fn cleanup_tmp_files(&self) -> Result<(), ControlError> {
        let mut entries = match tokio::fs::read_dir(&self.tmp_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e.into()),
        };
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().map_or(false, |ext| ext == "png") {
                if let Err(e) = tokio::fs::remove_file(&path).await {
                    tracing::warn!("Failed to remove {:?}: {}", path, e);
                } else {
                    tracing::debug!("Cleaned up temporary file: {:?}", path);
                }
            }
        }
        Ok(())
    }
}
