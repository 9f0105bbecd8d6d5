//! Eligibility gates
//!
//! Pure predicates over a passed-in clock value, so routines can be
//! tested at any simulated time.

use crate::error::EngineError;
use crate::model::Schedule;
use chrono::{DateTime, Datelike, Duration, NaiveTime, Utc, Weekday};

/// Tolerance around a scheduled time, in seconds (5 minutes)
const SCHEDULE_WINDOW_SECS: i64 = 300;

/// Interval gate: due when enough wall-clock time has passed
#[derive(Debug, Clone)]
pub struct IntervalGate {
    interval: Duration,
    last_run: Option<DateTime<Utc>>,
}

impl IntervalGate {
    pub fn new(interval_secs: u64, last_run: Option<DateTime<Utc>>) -> Self {
        Self {
            interval: Duration::seconds(interval_secs as i64),
            last_run,
        }
    }

    /// True when no prior run exists or the interval has elapsed
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        match self.last_run {
            None => true,
            Some(last) => now - last >= self.interval,
        }
    }

    /// Record a successful run
    pub fn mark_run(&mut self, now: DateTime<Utc>) {
        self.last_run = Some(now);
    }

    pub fn last_run(&self) -> Option<DateTime<Utc>> {
        self.last_run
    }
}

/// Schedule gate: day-of-week + time-of-day window, at most once per
/// UTC calendar date
#[derive(Debug, Clone)]
pub struct ScheduleGate {
    day: Option<Weekday>,
    time: Option<NaiveTime>,
    /// Whether any schedule was configured at all
    scheduled: bool,
    last_check: Option<DateTime<Utc>>,
}

impl ScheduleGate {
    /// Compile an optional schedule, validating day and time formats
    pub fn new(
        schedule: Option<&Schedule>,
        last_check: Option<DateTime<Utc>>,
    ) -> Result<Self, EngineError> {
        let Some(schedule) = schedule else {
            return Ok(Self {
                day: None,
                time: None,
                scheduled: false,
                last_check,
            });
        };

        let day = schedule.day.as_deref().map(parse_weekday).transpose()?;
        let time = schedule.time.as_deref().map(parse_time).transpose()?;
        Ok(Self {
            day,
            time,
            scheduled: true,
            last_check,
        })
    }

    /// Evaluate eligibility at `now`
    ///
    /// No schedule at all means run-once/immediate semantics: always
    /// eligible (the once-per-day gate still applies once it has run).
    ///
    /// Known limitation, kept on purpose: the time window does not wrap
    /// across midnight, so a target near 00:00 will not match a check
    /// made just before midnight the previous day.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        if let Some(last) = self.last_check {
            if last.date_naive() == now.date_naive() {
                return false;
            }
        }

        if !self.scheduled {
            return true;
        }

        if let Some(day) = self.day {
            if now.weekday() != day {
                return false;
            }
        }

        if let Some(time) = self.time {
            let target = now.date_naive().and_time(time);
            let diff = (now.naive_utc() - target).num_seconds().abs();
            if diff > SCHEDULE_WINDOW_SECS {
                return false;
            }
        }

        true
    }

    /// Record a successful run
    pub fn mark_run(&mut self, now: DateTime<Utc>) {
        self.last_check = Some(now);
    }

    pub fn last_check(&self) -> Option<DateTime<Utc>> {
        self.last_check
    }
}

/// Either gate behind one interface
///
/// Concrete routines hold a `RunGate` so the same routine body can be
/// driven as an interval check or a scheduled event.
#[derive(Debug, Clone)]
pub enum RunGate {
    Interval(IntervalGate),
    Schedule(ScheduleGate),
}

impl RunGate {
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        match self {
            RunGate::Interval(gate) => gate.is_due(now),
            RunGate::Schedule(gate) => gate.is_due(now),
        }
    }

    pub fn mark_run(&mut self, now: DateTime<Utc>) {
        match self {
            RunGate::Interval(gate) => gate.mark_run(now),
            RunGate::Schedule(gate) => gate.mark_run(now),
        }
    }
}

/// Parse a case-insensitive English weekday name
fn parse_weekday(s: &str) -> Result<Weekday, EngineError> {
    match s.to_ascii_lowercase().as_str() {
        "monday" => Ok(Weekday::Mon),
        "tuesday" => Ok(Weekday::Tue),
        "wednesday" => Ok(Weekday::Wed),
        "thursday" => Ok(Weekday::Thu),
        "friday" => Ok(Weekday::Fri),
        "saturday" => Ok(Weekday::Sat),
        "sunday" => Ok(Weekday::Sun),
        _ => Err(EngineError::InvalidWeekday(s.to_string())),
    }
}

/// Parse an "HH:MM" time string
fn parse_time(s: &str) -> Result<NaiveTime, EngineError> {
    NaiveTime::parse_from_str(s, "%H:%M")
        .map_err(|_| EngineError::InvalidTimeFormat(s.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    fn gate(day: Option<&str>, time: Option<&str>) -> ScheduleGate {
        let schedule = Schedule {
            day: day.map(str::to_string),
            time: time.map(str::to_string),
        };
        ScheduleGate::new(Some(&schedule), None).unwrap()
    }

    #[test]
    fn test_interval_no_prior_run_is_due() {
        let gate = IntervalGate::new(60, None);
        assert!(gate.is_due(Utc::now()));
    }

    #[test]
    fn test_interval_elapsed() {
        let now = utc(2024, 3, 4, 12, 0);
        let gate = IntervalGate::new(60, Some(now - Duration::seconds(30)));
        assert!(!gate.is_due(now));

        let gate = IntervalGate::new(60, Some(now - Duration::seconds(61)));
        assert!(gate.is_due(now));

        let gate = IntervalGate::new(60, Some(now - Duration::seconds(60)));
        assert!(gate.is_due(now));
    }

    #[test]
    fn test_interval_mark_run() {
        let now = utc(2024, 3, 4, 12, 0);
        let mut gate = IntervalGate::new(60, None);
        gate.mark_run(now);
        assert_eq!(gate.last_run(), Some(now));
        assert!(!gate.is_due(now + Duration::seconds(59)));
        assert!(gate.is_due(now + Duration::seconds(60)));
    }

    #[test]
    fn test_no_schedule_always_due() {
        let gate = ScheduleGate::new(None, None).unwrap();
        assert!(gate.is_due(utc(2024, 3, 4, 23, 59)));
    }

    #[test]
    fn test_empty_schedule_is_due() {
        // Schedule present but with neither day nor time
        let gate = gate(None, None);
        assert!(gate.is_due(utc(2024, 3, 4, 17, 30)));
    }

    #[test]
    fn test_day_and_time_window() {
        // 2024-03-04 is a Monday
        let gate = gate(Some("monday"), Some("09:00"));
        assert!(gate.is_due(utc(2024, 3, 4, 9, 3)));
        assert!(!gate.is_due(utc(2024, 3, 4, 9, 6)));
        // Tuesday at the right time
        assert!(!gate.is_due(utc(2024, 3, 5, 9, 0)));
    }

    #[test]
    fn test_window_is_symmetric() {
        let gate = gate(None, Some("09:00"));
        assert!(gate.is_due(utc(2024, 3, 4, 8, 55)));
        assert!(!gate.is_due(utc(2024, 3, 4, 8, 54)));
        assert!(gate.is_due(utc(2024, 3, 4, 9, 5)));
    }

    #[test]
    fn test_once_per_day_gate() {
        let mut gate = gate(Some("monday"), Some("09:00"));
        let now = utc(2024, 3, 4, 9, 0);
        assert!(gate.is_due(now));
        gate.mark_run(now);
        // Same UTC date, still inside the window
        assert!(!gate.is_due(utc(2024, 3, 4, 9, 4)));
        // Next Monday is fine again
        assert!(gate.is_due(utc(2024, 3, 11, 9, 0)));
    }

    #[test]
    fn test_day_case_insensitive() {
        let gate = gate(Some("MONDAY"), None);
        assert!(gate.is_due(utc(2024, 3, 4, 15, 0)));
        assert!(!gate.is_due(utc(2024, 3, 5, 15, 0)));
    }

    #[test]
    fn test_midnight_does_not_wrap() {
        // Target 00:02, checked at 23:59 the previous day: the naive
        // same-date difference is huge, so this is not eligible.
        let gate = gate(None, Some("00:02"));
        assert!(!gate.is_due(utc(2024, 3, 4, 23, 59)));
        assert!(gate.is_due(utc(2024, 3, 5, 0, 1)));
    }

    #[test]
    fn test_invalid_schedule_rejected() {
        let bad_day = Schedule {
            day: Some("moonday".to_string()),
            time: None,
        };
        assert!(matches!(
            ScheduleGate::new(Some(&bad_day), None),
            Err(EngineError::InvalidWeekday(_))
        ));

        let bad_time = Schedule {
            day: None,
            time: Some("9 o'clock".to_string()),
        };
        assert!(matches!(
            ScheduleGate::new(Some(&bad_time), None),
            Err(EngineError::InvalidTimeFormat(_))
        ));
    }
}
