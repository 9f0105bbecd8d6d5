//! ADB subprocess transport
//!
//! This crate wraps the `adb` binary with an async command interface:
//! device discovery, shell input injection, screenshot capture and
//! screen recording for a single Android target.

pub mod error;
pub mod parse;
pub mod transport;

pub use error::TransportError;
pub use parse::ScreenSize;
pub use transport::{AdbEndpoint, AdbTransport};
