//! Game control layer
//!
//! High-level collaborators for driving the game over ADB: configuration,
//! template matching, humanized input, home navigation, screen recording
//! and webhook notification.

pub mod config;
pub mod controls;
pub mod error;
pub mod navigation;
pub mod notify;
pub mod session;
pub mod video;
pub mod vision;

pub use config::{GameConfig, PercentPoint};
pub use error::ControlError;
pub use notify::WebhookNotifier;
pub use session::{GameContext, GameState};
pub use video::VideoCapture;
pub use vision::TemplateLibrary;
