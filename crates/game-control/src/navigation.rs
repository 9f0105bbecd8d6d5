//! Home navigation and game lifecycle

use crate::controls::human_delay;
use crate::error::ControlError;
use crate::session::GameContext;
use std::time::{Duration, Instant};

impl GameContext {
    /// Navigate back to the home screen
    ///
    /// Unless `force` is set, short-circuits when the home template is
    /// already visible. Otherwise presses back repeatedly, dismissing
    /// the quit dialog when it appears, until the home template shows up
    /// or the deadline passes.
    pub async fn navigate_home(&self, force: bool) -> Result<bool, ControlError> {
        if !force {
            if self.find_template("home").await?.is_some() {
                return Ok(true);
            }
        }

        let deadline = Instant::now() + self.config.timings.max_home_wait();
        while Instant::now() < deadline {
            if self.find_template("quit").await?.is_some() {
                // The quit dialog means we backed out of the game root
                self.press_back().await?;
                human_delay(self.config.timings.menu_animation()).await;

                if self.find_template("home").await?.is_some() {
                    return Ok(true);
                }
            }

            self.press_back().await?;
            human_delay(self.config.timings.menu_animation()).await;

            if self.find_template("home").await?.is_some() {
                return Ok(true);
            }
        }

        tracing::warn!("Failed to reach home screen within timeout");
        Ok(false)
    }

    /// Restart the game: force-stop, settle, relaunch
    pub async fn launch_game(&self) -> Result<(), ControlError> {
        let package = self.config.package_name.clone();
        self.transport.force_stop(&package).await?;
        tokio::time::sleep(Duration::from_secs(2)).await;
        self.transport.launch_package(&package).await?;
        Ok(())
    }

    /// Package name of the app currently in the foreground
    pub async fn foreground_app(&self) -> Result<Option<String>, ControlError> {
        Ok(self.transport.foreground_app().await?)
    }

    /// Make sure the game is at the home screen before a routine runs
    ///
    /// Short-circuits on the shared `is_home` flag; any navigation
    /// failure is logged and reported as `false` instead of an error.
    pub async fn ensure_home(&mut self) -> bool {
        if self.state.is_home {
            return true;
        }
        match self.navigate_home(false).await {
            Ok(true) => {
                self.state.is_home = true;
                true
            }
            Ok(false) => false,
            Err(e) => {
                tracing::error!("Error navigating home: {}", e);
                false
            }
        }
    }
}
