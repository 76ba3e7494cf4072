//! Injected time and identifier sources.
//!
//! The store never reads the wall clock or invents identifiers directly;
//! it goes through these traits so tests can pin both.

use std::cell::Cell;

use chrono::{DateTime, TimeDelta, Utc};

/// Source of the current instant, used for `DTSTAMP` and `LAST-MODIFIED`.
pub trait Clock {
    /// Returns the current instant in UTC, truncated to whole seconds.
    fn now_utc(&self) -> DateTime<Utc>;
}

/// The real wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_utc(&self) -> DateTime<Utc> {
        // iCalendar DATE-TIME has one-second resolution.
        let now = Utc::now();
        now - TimeDelta::nanoseconds(i64::from(now.timestamp_subsec_nanos()))
    }
}

/// A deterministic clock for tests, advanced explicitly.
#[derive(Debug)]
pub struct FixedClock {
    instant: Cell<DateTime<Utc>>,
}

impl FixedClock {
    #[must_use]
    pub fn new(instant: DateTime<Utc>) -> Self {
        Self {
            instant: Cell::new(instant),
        }
    }

    /// Moves the clock forward by the given number of seconds.
    pub fn tick(&self, seconds: i64) {
        self.instant
            .set(self.instant.get() + TimeDelta::seconds(seconds));
    }
}

impl Clock for FixedClock {
    fn now_utc(&self) -> DateTime<Utc> {
        self.instant.get()
    }
}

/// Source of fresh UIDs for new items and forked series.
pub trait UidFactory {
    fn new_uid(&self) -> String;
}

/// Random UIDs (UUID v4), the production default.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidFactory;

impl UidFactory for UuidFactory {
    fn new_uid(&self) -> String {
        uuid::Uuid::new_v4().to_string()
    }
}

/// Counter-based UIDs for deterministic tests (`mock-uid-1`, `mock-uid-2`, ...).
#[derive(Debug)]
pub struct SequentialUidFactory {
    prefix: String,
    counter: Cell<u64>,
}

impl SequentialUidFactory {
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            counter: Cell::new(0),
        }
    }
}

impl UidFactory for SequentialUidFactory {
    fn new_uid(&self) -> String {
        let next = self.counter.get() + 1;
        self.counter.set(next);
        format!("{}-{next}", self.prefix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn fixed_clock_ticks() {
        let clock = FixedClock::new(Utc.with_ymd_and_hms(2022, 8, 29, 9, 0, 0).unwrap());
        clock.tick(10);
        assert_eq!(
            clock.now_utc(),
            Utc.with_ymd_and_hms(2022, 8, 29, 9, 0, 10).unwrap()
        );
    }

    #[test]
    fn sequential_uids() {
        let uids = SequentialUidFactory::new("mock-uid");
        assert_eq!(uids.new_uid(), "mock-uid-1");
        assert_eq!(uids.new_uid(), "mock-uid-2");
    }

    #[test]
    fn system_clock_whole_seconds() {
        let now = SystemClock.now_utc();
        assert_eq!(now.timestamp_subsec_nanos(), 0);
    }
}
