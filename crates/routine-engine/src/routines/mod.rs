//! Concrete routine implementations
//!
//! Each routine pairs a [`RunGate`] with a scripted action sequence.
//! The factories here turn config entries into boxed trait objects,
//! seeding gates from persisted last-run timestamps.

mod alliance_donate;
mod cleanup;
mod dig_check;
mod help;
mod reset;
mod secretary;
mod vs_capture;

pub use alliance_donate::AllianceDonateRoutine;
pub use cleanup::CleanupRoutine;
pub use dig_check::DigCheckRoutine;
pub use help::HelpRoutine;
pub use reset::ResetRoutine;
pub use secretary::SecretaryRoutine;
pub use vs_capture::VsCaptureRoutine;

use crate::error::EngineError;
use crate::gate::{IntervalGate, RunGate, ScheduleGate};
use crate::model::{CheckSpec, EventSpec, HandlerKind};
use crate::routine::Routine;
use chrono::{DateTime, Utc};

/// Build an interval-gated routine from a config entry
pub fn build_interval(
    spec: &CheckSpec,
    last_run: Option<DateTime<Utc>>,
) -> Result<Box<dyn Routine>, EngineError> {
    if spec.interval == 0 {
        return Err(EngineError::InvalidConfig(format!(
            "{}: interval must be greater than zero",
            spec.name
        )));
    }
    let gate = RunGate::Interval(IntervalGate::new(spec.interval, last_run));
    Ok(build(spec.handler, spec.name.clone(), gate))
}

/// Build a schedule-gated routine from a config entry
pub fn build_scheduled(
    spec: &EventSpec,
    last_check: Option<DateTime<Utc>>,
) -> Result<Box<dyn Routine>, EngineError> {
    let gate = RunGate::Schedule(ScheduleGate::new(spec.schedule.as_ref(), last_check)?);
    Ok(build(spec.handler, spec.name.clone(), gate))
}

fn build(handler: HandlerKind, name: String, gate: RunGate) -> Box<dyn Routine> {
    match handler {
        HandlerKind::Cleanup => Box::new(CleanupRoutine::new(name, gate)),
        HandlerKind::Reset => Box::new(ResetRoutine::new(name, gate)),
        HandlerKind::Help => Box::new(HelpRoutine::new(name, gate)),
        HandlerKind::AllianceDonate => Box::new(AllianceDonateRoutine::new(name, gate)),
        HandlerKind::DigCheck => Box::new(DigCheckRoutine::new(name, gate)),
        HandlerKind::Secretary => Box::new(SecretaryRoutine::new(name, gate)),
        HandlerKind::VsCapture => Box::new(VsCaptureRoutine::new(name, gate)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_build_interval_seeds_last_run() {
        let spec = CheckSpec {
            name: "cleanup".to_string(),
            handler: HandlerKind::Cleanup,
            interval: 3600,
        };
        let now = Utc::now();

        let routine = build_interval(&spec, Some(now)).unwrap();
        assert_eq!(routine.name(), "cleanup");
        assert!(!routine.should_run(now + Duration::seconds(10)));
        assert!(routine.should_run(now + Duration::seconds(3600)));

        // Without persisted state the first run is immediate
        let routine = build_interval(&spec, None).unwrap();
        assert!(routine.should_run(now));
    }

    #[test]
    fn test_build_interval_rejects_zero() {
        let spec = CheckSpec {
            name: "cleanup".to_string(),
            handler: HandlerKind::Cleanup,
            interval: 0,
        };
        assert!(matches!(
            build_interval(&spec, None),
            Err(EngineError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_build_scheduled_validates_schedule() {
        let spec = EventSpec {
            name: "vs_capture".to_string(),
            handler: HandlerKind::VsCapture,
            schedule: Some(crate::model::Schedule {
                day: Some("someday".to_string()),
                time: None,
            }),
        };
        assert!(matches!(
            build_scheduled(&spec, None),
            Err(EngineError::InvalidWeekday(_))
        ));
    }
}
