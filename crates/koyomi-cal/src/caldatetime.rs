//! The date-or-date-time value used throughout the calendar domain.
//!
//! Anchors, recurrence ids, `EXDATE`/`RDATE` entries, and occurrence
//! starts all carry either a DATE (all-day) or a DATE-TIME. This module
//! gives that union one type with the comparison semantics the timeline
//! and recurrence engine need.

use std::fmt;

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Timelike};
use koyomi_rfc::ical::core::{Date, DateTime, DateTimeForm};
use koyomi_rfc::ical::expand::{TimeZoneResolver, convert_to_utc_lenient};

/// A DATE or DATE-TIME value in the anchor's value type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CalDateTime {
    Date(Date),
    DateTime(DateTime),
}

/// Sort key for an occurrence start: an instant plus the all-day flag.
///
/// All-day values compare before timed values at the same instant, which
/// yields the required "all-day first" ordering at a day boundary
/// (`false < true` for the `timed` field).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct OccurrenceKey {
    pub instant: NaiveDateTime,
    pub timed: bool,
}

/// Builds a `NaiveDate`, clamping an out-of-range day to the month's end.
///
/// Decoded values are calendar-validated, so clamping is only reachable
/// for hand-built values; it keeps the arithmetic total without panics.
fn clamped_ymd(year: u16, month: u8, day: u8) -> NaiveDate {
    let y = i32::from(year);
    let m = u32::from(month).clamp(1, 12);
    NaiveDate::from_ymd_opt(y, m, u32::from(day))
        .unwrap_or_else(|| last_day_of_month(y, m))
}

/// The last day of the given month.
pub(crate) fn last_day_of_month(year: i32, month: u32) -> NaiveDate {
    let (next_y, next_m) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_y, next_m, 1)
        .and_then(|d| d.pred_opt())
        .unwrap_or_default()
}

impl CalDateTime {
    /// Whether this is a DATE (all-day) value.
    #[must_use]
    pub fn is_date(&self) -> bool {
        matches!(self, Self::Date(_))
    }

    /// The form of a timed value; `None` for dates.
    #[must_use]
    pub fn form(&self) -> Option<&DateTimeForm> {
        match self {
            Self::Date(_) => None,
            Self::DateTime(dt) => Some(&dt.form),
        }
    }

    /// The `TZID` of a zoned value.
    #[must_use]
    pub fn tzid(&self) -> Option<&str> {
        match self {
            Self::Date(_) => None,
            Self::DateTime(dt) => dt.tzid(),
        }
    }

    /// Whether both values are dates or both are date-times.
    #[must_use]
    pub fn same_value_type(&self, other: &Self) -> bool {
        self.is_date() == other.is_date()
    }

    /// The calendar-date part.
    #[must_use]
    pub fn naive_date(&self) -> NaiveDate {
        match self {
            Self::Date(d) => clamped_ymd(d.year, d.month, d.day),
            Self::DateTime(dt) => clamped_ymd(dt.year, dt.month, dt.day),
        }
    }

    /// The wall-clock time part; midnight for dates.
    #[must_use]
    pub fn naive_time(&self) -> NaiveTime {
        match self {
            Self::Date(_) => NaiveTime::MIN,
            Self::DateTime(dt) => NaiveTime::from_hms_opt(
                u32::from(dt.hour),
                u32::from(dt.minute),
                u32::from(dt.second),
            )
            .unwrap_or(NaiveTime::MIN),
        }
    }

    /// The wall-clock fields as a naive date-time (dates at midnight).
    #[must_use]
    pub fn naive(&self) -> NaiveDateTime {
        self.naive_date().and_time(self.naive_time())
    }

    /// Rebuilds a value of the same kind and form from new naive fields.
    ///
    /// This is how the recurrence engine turns generated wall-clock
    /// candidates back into values of the anchor's type.
    #[must_use]
    pub fn with_naive(&self, naive: NaiveDateTime) -> Self {
        let date = naive.date();
        let year = u16::try_from(date.year()).unwrap_or(0);
        let month = u8::try_from(date.month()).unwrap_or(1);
        let day = u8::try_from(date.day()).unwrap_or(1);
        match self {
            Self::Date(_) => Self::Date(Date { year, month, day }),
            Self::DateTime(dt) => Self::DateTime(DateTime {
                year,
                month,
                day,
                hour: u8::try_from(naive.time().hour()).unwrap_or(0),
                minute: u8::try_from(naive.time().minute()).unwrap_or(0),
                second: u8::try_from(naive.time().second()).unwrap_or(0),
                form: dt.form.clone(),
            }),
        }
    }

    /// Shifts by a wall-clock delta, preserving kind and form.
    #[must_use]
    pub fn shift(&self, delta: TimeDelta) -> Self {
        self.with_naive(self.naive() + delta)
    }

    /// Sort key for timeline merging.
    ///
    /// Zoned values resolve to their UTC instant (DST gaps shift forward
    /// an hour for ordering purposes); floating values and dates compare
    /// on their wall clock. An unresolvable `TZID` falls back to the wall
    /// clock so ordering stays total.
    #[must_use]
    pub fn sort_key(&self, resolver: &TimeZoneResolver) -> OccurrenceKey {
        let instant = match self {
            Self::Date(_) => self.naive(),
            Self::DateTime(dt) => match &dt.form {
                DateTimeForm::Utc | DateTimeForm::Floating => self.naive(),
                DateTimeForm::Zoned { tzid } => {
                    match convert_to_utc_lenient(self.naive(), tzid, resolver) {
                        Ok(utc) => utc.naive_utc(),
                        Err(err) => {
                            tracing::warn!(%tzid, %err, "Falling back to wall-clock ordering");
                            self.naive()
                        }
                    }
                }
            },
        };
        OccurrenceKey {
            instant,
            timed: !self.is_date(),
        }
    }

    /// Equality for `EXDATE` filtering and `RECURRENCE-ID` matching.
    ///
    /// Dates compare by calendar day. Two absolute date-times (UTC or
    /// zoned) compare as instants. When either side is floating, matching
    /// is on wall time — this resolves the zoned-master/bare-local
    /// recurrence-id ambiguity in favor of wall time within the master's
    /// zone. Value-type mismatches never match.
    #[must_use]
    pub fn matches(&self, other: &Self, resolver: &TimeZoneResolver) -> bool {
        match (self, other) {
            (Self::Date(a), Self::Date(b)) => a == b,
            (Self::DateTime(a), Self::DateTime(b)) => {
                let a_absolute = !a.is_floating();
                let b_absolute = !b.is_floating();
                if a_absolute && b_absolute {
                    self.sort_key(resolver).instant == other.sort_key(resolver).instant
                } else {
                    self.naive() == other.naive()
                }
            }
            _ => false,
        }
    }

    /// Wall-clock rendering without any zone marker, used as a stable
    /// key for override lookup tables.
    #[must_use]
    pub fn wall_string(&self) -> String {
        match self {
            Self::Date(d) => d.to_string(),
            Self::DateTime(dt) => format!(
                "{:04}{:02}{:02}T{:02}{:02}{:02}",
                dt.year, dt.month, dt.day, dt.hour, dt.minute, dt.second
            ),
        }
    }
}

impl fmt::Display for CalDateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Date(d) => write!(f, "{d}"),
            Self::DateTime(dt) => write!(f, "{dt}"),
        }
    }
}

impl From<Date> for CalDateTime {
    fn from(d: Date) -> Self {
        Self::Date(d)
    }
}

impl From<DateTime> for CalDateTime {
    fn from(dt: DateTime) -> Self {
        Self::DateTime(dt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn floating(y: u16, mo: u8, d: u8, h: u8, mi: u8, s: u8) -> CalDateTime {
        CalDateTime::DateTime(DateTime::floating(y, mo, d, h, mi, s))
    }

    #[test]
    fn all_day_sorts_before_timed_midnight() {
        let resolver = TimeZoneResolver::new();
        let all_day = CalDateTime::Date(Date::new(2022, 8, 29));
        let timed = floating(2022, 8, 29, 0, 0, 0);
        assert!(all_day.sort_key(&resolver) < timed.sort_key(&resolver));
    }

    #[test]
    fn zoned_sorts_by_instant() {
        let resolver = TimeZoneResolver::new();
        // 09:00 in New York is 14:00 UTC in January.
        let ny = CalDateTime::DateTime(DateTime::zoned(
            "America/New_York",
            2026, 1, 15, 9, 0, 0,
        ));
        let utc = CalDateTime::DateTime(DateTime::utc(2026, 1, 15, 13, 0, 0));
        assert!(utc.sort_key(&resolver) < ny.sort_key(&resolver));
    }

    #[test]
    fn matches_on_wall_time_when_floating() {
        let resolver = TimeZoneResolver::new();
        let zoned = CalDateTime::DateTime(DateTime::zoned(
            "Europe/Stockholm",
            2022, 9, 5, 9, 0, 0,
        ));
        let bare = floating(2022, 9, 5, 9, 0, 0);
        assert!(zoned.matches(&bare, &resolver));
        assert!(bare.matches(&zoned, &resolver));
    }

    #[test]
    fn matches_absolute_values_as_instants() {
        let resolver = TimeZoneResolver::new();
        // 09:00 Stockholm == 07:00 UTC in September (CEST).
        let zoned = CalDateTime::DateTime(DateTime::zoned(
            "Europe/Stockholm",
            2022, 9, 5, 9, 0, 0,
        ));
        let utc = CalDateTime::DateTime(DateTime::utc(2022, 9, 5, 7, 0, 0));
        assert!(zoned.matches(&utc, &resolver));
    }

    #[test]
    fn value_type_mismatch_never_matches() {
        let resolver = TimeZoneResolver::new();
        let date = CalDateTime::Date(Date::new(2022, 9, 5));
        let timed = floating(2022, 9, 5, 0, 0, 0);
        assert!(!date.matches(&timed, &resolver));
    }

    #[test]
    fn shift_preserves_form() {
        let start = floating(2022, 8, 29, 9, 0, 0);
        let shifted = start.shift(TimeDelta::days(7));
        assert_eq!(shifted, floating(2022, 9, 5, 9, 0, 0));

        let date = CalDateTime::Date(Date::new(2022, 8, 29));
        assert_eq!(
            date.shift(TimeDelta::days(1)),
            CalDateTime::Date(Date::new(2022, 8, 30))
        );
    }

    #[test]
    fn wall_string_ignores_form() {
        let utc = CalDateTime::DateTime(DateTime::utc(2022, 9, 5, 9, 0, 0));
        assert_eq!(utc.wall_string(), "20220905T090000");
        let date = CalDateTime::Date(Date::new(2022, 9, 5));
        assert_eq!(date.wall_string(), "20220905");
    }

    #[test]
    fn last_day_of_month_handles_december() {
        assert_eq!(
            last_day_of_month(2022, 12),
            NaiveDate::from_ymd_opt(2022, 12, 31).unwrap()
        );
        assert_eq!(
            last_day_of_month(2024, 2),
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
        );
    }
}
