//! Routine scheduling engine
//!
//! Decides when scripted game routines are eligible to run (interval
//! gating, day-of-week + time-window gating, once-per-day gating) and
//! drives them sequentially against the game.

pub mod engine;
pub mod error;
pub mod gate;
pub mod model;
pub mod persistence;
pub mod routine;
pub mod routines;

pub use engine::AutomationEngine;
pub use error::EngineError;
pub use gate::{IntervalGate, RunGate, ScheduleGate};
pub use model::{AutomationConfig, HandlerKind, Schedule};
pub use persistence::{CheckKind, StateStore};
pub use routine::Routine;
