use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Utc};

/// Time primitives
///
/// A point in time as epoch milliseconds. Feed timestamps, the timeline cursor
/// and scheduler deadlines all share this unit.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Time(pub i64); // ms

impl Time {
    pub const ZERO: Time = Time(0);
    /// Later than any real timestamp; used as an "everything" cursor.
    pub const MAX: Time = Time(i64::MAX);

    pub const fn from_millis(ms: i64) -> Self {
        Time(ms)
    }

    pub const fn saturating_add_ms(self, ms: u64) -> Self {
        Time(self.0.saturating_add_unsigned(ms))
    }

    /// Milliseconds elapsed from `earlier` to `self`, zero if `earlier` is later.
    pub const fn millis_since(self, earlier: Time) -> u64 {
        if self.0 <= earlier.0 {
            return 0;
        }
        self.0.abs_diff(earlier.0)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TimeSpan {
    pub start: Time,
    pub end: Time,
}

impl TimeSpan {
    pub fn new(start: Time, end: Time) -> Self {
        Self { start, end }
    }

    pub fn instant(t: Time) -> Self {
        Self { start: t, end: t }
    }

    pub fn duration_ms(&self) -> u64 {
        self.end.millis_since(self.start)
    }

    pub fn contains(&self, t: Time) -> bool {
        t >= self.start && t <= self.end
    }

    pub fn clamp(&self, t: Time) -> Time {
        if t < self.start {
            self.start
        } else if t > self.end {
            self.end
        } else {
            t
        }
    }
}

/// Source of "now" for components that measure elapsed wall time.
pub trait Clock: Send + Sync {
    fn now(&self) -> Time;
}

#[derive(Debug, Default, Copy, Clone)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Time {
        Time(Utc::now().timestamp_millis())
    }
}

/// Clock that only moves when told to. Shared across tasks by reference.
#[derive(Debug, Default)]
pub struct ManualClock {
    now_ms: AtomicI64,
}

impl ManualClock {
    pub fn new(start: Time) -> Self {
        Self {
            now_ms: AtomicI64::new(start.0),
        }
    }

    pub fn set(&self, t: Time) {
        self.now_ms.store(t.0, Ordering::SeqCst);
    }

    pub fn advance(&self, ms: i64) {
        self.now_ms.fetch_add(ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Time {
        Time(self.now_ms.load(Ordering::SeqCst))
    }
}

pub const TIMESTAMP_FORMAT: &str = "%b %-d, %Y %H:%M:%S";

/// Human-readable UTC timestamp, or `"Unknown"` when absent or out of range.
pub fn format_time(t: Option<Time>) -> String {
    t.and_then(|t| DateTime::<Utc>::from_timestamp_millis(t.0))
        .map(|dt| dt.format(TIMESTAMP_FORMAT).to_string())
        .unwrap_or_else(|| "Unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::{Clock, ManualClock, Time, TimeSpan, format_time};

    #[test]
    fn span_clamps_and_contains() {
        let span = TimeSpan::new(Time(10), Time(20));
        assert!(span.contains(Time(10)));
        assert!(span.contains(Time(20)));
        assert!(!span.contains(Time(21)));
        assert_eq!(span.clamp(Time(5)), Time(10));
        assert_eq!(span.clamp(Time(25)), Time(20));
        assert_eq!(span.duration_ms(), 10);
    }

    #[test]
    fn saturating_add_stays_in_range() {
        assert_eq!(Time::MAX.saturating_add_ms(5), Time::MAX);
        assert_eq!(Time(1).saturating_add_ms(2), Time(3));
        assert_eq!(Time(1).millis_since(Time(4)), 0);
    }

    #[test]
    fn manual_clock_moves_only_when_told() {
        let clock = ManualClock::new(Time(100));
        assert_eq!(clock.now(), Time(100));
        clock.advance(50);
        assert_eq!(clock.now(), Time(150));
        clock.set(Time(7));
        assert_eq!(clock.now(), Time(7));
    }

    #[test]
    fn formats_known_and_unknown_times() {
        assert_eq!(format_time(Some(Time(0))), "Jan 1, 1970 00:00:00");
        assert_eq!(
            format_time(Some(Time(1_700_000_000_000))),
            "Nov 14, 2023 22:13:20"
        );
        assert_eq!(format_time(None), "Unknown");
    }
}
