//! Lazy expansion of recurrence rules into occurrence starts.
//!
//! [`RecurrenceIter`] turns an event's anchor (`DTSTART`), `RRULE`,
//! `RDATE`, and `EXDATE` into a strictly ascending stream of
//! [`CalDateTime`] values in the anchor's value type. Expansion is pure
//! wall-clock arithmetic in the anchor's own zone; absolute instants only
//! matter when comparing against a UTC `UNTIL` bound.
//!
//! Supported frequencies are `DAILY`, `WEEKLY`, and `MONTHLY`. The other
//! RFC 5545 frequencies decode and round-trip, but asking for their
//! expansion is a [`RecurrenceError::UnsupportedFrequency`].

use std::collections::VecDeque;

use chrono::{Datelike, Days, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Timelike};
use koyomi_rfc::ical::core::{Frequency, RRule, RRuleUntil, WeekdayNum};
use koyomi_rfc::ical::expand::TimeZoneResolver;

use crate::caldatetime::{CalDateTime, last_day_of_month};
use crate::error::RecurrenceError;
use crate::event::Event;

/// Consecutive filtered-out dates tolerated before a rule is considered
/// exhausted. Covers any `BYMONTH` gap with two orders of magnitude of
/// slack while keeping degenerate rules (BYMONTHDAY=31 in February,
/// forever) finite.
const MISS_LIMIT: u32 = 10_000;

/// Empty months tolerated before a monthly rule is considered exhausted.
const EMPTY_MONTH_LIMIT: u32 = 1_200;

/// Lazy, strictly ascending occurrence starts for one event.
pub struct RecurrenceIter<'a> {
    anchor: CalDateTime,
    anchor_naive: NaiveDateTime,
    resolver: &'a TimeZoneResolver,
    generator: Option<RuleGen>,
    count_remaining: Option<u32>,
    until: Option<NaiveDateTime>,
    /// Anchor still pending for rule-less (RDATE-only or single) events.
    anchor_pending: bool,
    rdates: Vec<CalDateTime>,
    rdate_idx: usize,
    exdates: Vec<CalDateTime>,
    pending_rule: Option<CalDateTime>,
    last_seen: Option<NaiveDateTime>,
    finite: bool,
    generated: u32,
    cap: u32,
}

impl<'a> RecurrenceIter<'a> {
    /// Builds the occurrence iterator for an event.
    ///
    /// ## Errors
    ///
    /// Fails for unsupported or undecoded frequencies, misplaced `BYDAY`
    /// ordinals, and unresolvable zones on a UTC `UNTIL` bound.
    pub fn for_event(
        event: &Event,
        resolver: &'a TimeZoneResolver,
        max_expansions: u32,
    ) -> Result<Self, RecurrenceError> {
        if event.undecoded_rrule.is_some() {
            return Err(RecurrenceError::UndecodedRule);
        }
        Self::new(
            event.dtstart.clone(),
            event.rrule.as_ref(),
            &event.rdate,
            &event.exdate,
            resolver,
            max_expansions,
        )
    }

    /// Builds an iterator from the recurrence parts directly.
    ///
    /// ## Errors
    ///
    /// See [`RecurrenceIter::for_event`].
    pub fn new(
        anchor: CalDateTime,
        rrule: Option<&RRule>,
        rdates: &[CalDateTime],
        exdates: &[CalDateTime],
        resolver: &'a TimeZoneResolver,
        max_expansions: u32,
    ) -> Result<Self, RecurrenceError> {
        let anchor_naive = anchor.naive();

        let generator = match rrule {
            Some(rule) => Some(RuleGen::build(rule, &anchor)?),
            None => None,
        };
        let until = match rrule.and_then(|r| r.until.as_ref()) {
            Some(bound) => Some(until_wall_clock(bound, &anchor, resolver)?),
            None => None,
        };
        let count_remaining = rrule.and_then(|r| r.count);
        let finite = generator.is_none() || count_remaining.is_some() || until.is_some();

        let mut sorted_rdates: Vec<CalDateTime> = rdates.to_vec();
        sorted_rdates.sort_by_key(CalDateTime::naive);
        sorted_rdates.dedup_by_key(|d| d.naive());

        Ok(Self {
            anchor,
            anchor_naive,
            resolver,
            generator,
            count_remaining,
            until,
            anchor_pending: rrule.is_none(),
            rdates: sorted_rdates,
            rdate_idx: 0,
            exdates: exdates.to_vec(),
            pending_rule: None,
            last_seen: None,
            finite,
            generated: 0,
            cap: max_expansions,
        })
    }

    /// Whether the underlying rule is bounded.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.finite
    }

    /// Materializes the whole sequence.
    ///
    /// ## Errors
    ///
    /// Refuses unbounded rules: collecting one would silently truncate at
    /// the expansion cap.
    pub fn try_collect(self) -> Result<Vec<CalDateTime>, RecurrenceError> {
        if !self.finite {
            return Err(RecurrenceError::UnboundedExpansion);
        }
        Ok(self.collect())
    }

    /// Pulls the next rule-generated candidate, honoring COUNT and UNTIL.
    fn pull_rule(&mut self) -> Option<CalDateTime> {
        if self.anchor_pending {
            self.anchor_pending = false;
            return Some(self.anchor.clone());
        }

        let generator = self.generator.as_mut()?;
        if self.count_remaining == Some(0) {
            self.generator = None;
            return None;
        }

        loop {
            let Some(naive) = generator.next_candidate() else {
                self.generator = None;
                return None;
            };
            // Window alignment can produce candidates before the anchor.
            if naive < self.anchor_naive {
                continue;
            }
            if let Some(until) = self.until {
                if naive > until {
                    self.generator = None;
                    return None;
                }
            }
            if let Some(count) = &mut self.count_remaining {
                *count -= 1;
            }
            return Some(self.anchor.with_naive(naive));
        }
    }

    /// Merges the rule stream with the sorted RDATE list.
    fn next_merged(&mut self) -> Option<CalDateTime> {
        if self.pending_rule.is_none() {
            self.pending_rule = self.pull_rule();
        }

        let rule_key = self.pending_rule.as_ref().map(CalDateTime::naive);
        let rdate_key = self.rdates.get(self.rdate_idx).map(CalDateTime::naive);

        match (rule_key, rdate_key) {
            (None, None) => None,
            (Some(_), None) => self.pending_rule.take(),
            (None, Some(_)) => {
                let value = self.rdates[self.rdate_idx].clone();
                self.rdate_idx += 1;
                Some(value)
            }
            (Some(rule_at), Some(rdate_at)) => {
                if rdate_at < rule_at {
                    let value = self.rdates[self.rdate_idx].clone();
                    self.rdate_idx += 1;
                    Some(value)
                } else {
                    if rdate_at == rule_at {
                        self.rdate_idx += 1;
                    }
                    self.pending_rule.take()
                }
            }
        }
    }
}

impl Iterator for RecurrenceIter<'_> {
    type Item = CalDateTime;

    fn next(&mut self) -> Option<CalDateTime> {
        loop {
            if self.generated >= self.cap {
                return None;
            }
            let candidate = self.next_merged()?;
            self.generated += 1;

            let naive = candidate.naive();
            if self.last_seen == Some(naive) {
                continue;
            }
            self.last_seen = Some(naive);

            if self
                .exdates
                .iter()
                .any(|x| x.matches(&candidate, self.resolver))
            {
                continue;
            }
            return Some(candidate);
        }
    }
}

/// Translates an `UNTIL` bound into the anchor's wall clock.
///
/// With a zoned anchor the bound is a UTC instant (RFC 5545 §3.3.10) and
/// is converted into the anchor's zone before wall-clock comparison.
fn until_wall_clock(
    bound: &RRuleUntil,
    anchor: &CalDateTime,
    resolver: &TimeZoneResolver,
) -> Result<NaiveDateTime, RecurrenceError> {
    match bound {
        RRuleUntil::Date(d) => Ok(CalDateTime::Date(*d).naive()),
        RRuleUntil::DateTime(dt) => {
            let wall = CalDateTime::DateTime(dt.clone()).naive();
            match (anchor.tzid(), dt.is_utc()) {
                (Some(tzid), true) => {
                    let tz = resolver.resolve(tzid)?;
                    Ok(tz.from_utc_datetime(&wall).naive_local())
                }
                _ => Ok(wall),
            }
        }
    }
}

/// Generates the rule's candidate date-times in ascending order.
struct RuleGen {
    stepper: Stepper,
    times: Vec<NaiveTime>,
    time_idx: usize,
    current_date: Option<NaiveDate>,
    by_month: Vec<u8>,
    weekday_filter: Vec<chrono::Weekday>,
}

impl RuleGen {
    fn build(rule: &RRule, anchor: &CalDateTime) -> Result<Self, RecurrenceError> {
        let freq = rule.freq.ok_or(RecurrenceError::MissingFrequency)?;
        let anchor_date = anchor.naive_date();
        let interval = u64::from(rule.effective_interval());

        let stepper = match freq {
            Frequency::Daily => Stepper::Daily {
                next: Some(anchor_date),
                step: interval,
            },
            Frequency::Weekly => {
                let weekdays = if rule.by_day.is_empty() {
                    vec![anchor_date.weekday()]
                } else {
                    rule.by_day
                        .iter()
                        .map(weekday_without_ordinal)
                        .collect::<Result<Vec<_>, _>>()?
                };
                let wkst = u64::from(rule.effective_wkst().days_from_monday());
                let mut offsets: Vec<u64> = weekdays
                    .iter()
                    .map(|w| (7 + u64::from(w.num_days_from_monday()) - wkst) % 7)
                    .collect();
                offsets.sort_unstable();
                offsets.dedup();

                let anchor_offset =
                    (7 + u64::from(anchor_date.weekday().num_days_from_monday()) - wkst) % 7;
                let week_start = anchor_date
                    .checked_sub_days(Days::new(anchor_offset))
                    .unwrap_or(anchor_date);

                Stepper::Weekly {
                    week_start,
                    step_days: interval * 7,
                    offsets,
                    week: 0,
                    idx: 0,
                }
            }
            Frequency::Monthly => {
                let shape = if !rule.by_monthday.is_empty() {
                    MonthlyShape::ByMonthDay(rule.by_monthday.clone())
                } else if !rule.by_day.is_empty() {
                    MonthlyShape::ByDay(rule.by_day.clone())
                } else {
                    MonthlyShape::AnchorDay(u8::try_from(anchor_date.day()).unwrap_or(31))
                };
                Stepper::Monthly {
                    ym: month_index(anchor_date),
                    step: i64::from(rule.effective_interval()),
                    shape,
                    by_setpos: rule.by_setpos.clone(),
                    queue: VecDeque::new(),
                    empty_months: 0,
                }
            }
            other => return Err(RecurrenceError::UnsupportedFrequency(other)),
        };

        // DAILY treats BYDAY as a filter; ordinals make no sense there.
        let weekday_filter = if freq == Frequency::Daily && !rule.by_day.is_empty() {
            rule.by_day
                .iter()
                .map(weekday_without_ordinal)
                .collect::<Result<Vec<_>, _>>()?
        } else {
            Vec::new()
        };

        let times = if anchor.is_date() {
            vec![NaiveTime::MIN]
        } else {
            build_times(rule, anchor.naive_time())
        };

        Ok(Self {
            stepper,
            times,
            time_idx: 0,
            current_date: None,
            by_month: rule.by_month.clone(),
            weekday_filter,
        })
    }

    fn next_candidate(&mut self) -> Option<NaiveDateTime> {
        loop {
            if self.current_date.is_none() {
                self.current_date = self.next_filtered_date();
                self.time_idx = 0;
            }
            let date = self.current_date?;

            if self.time_idx < self.times.len() {
                let time = self.times[self.time_idx];
                self.time_idx += 1;
                return Some(date.and_time(time));
            }
            self.current_date = None;
        }
    }

    fn next_filtered_date(&mut self) -> Option<NaiveDate> {
        let mut misses = 0u32;
        loop {
            let date = self.stepper.next_date()?;

            let month_ok = self.by_month.is_empty()
                || u8::try_from(date.month()).is_ok_and(|m| self.by_month.contains(&m));
            let weekday_ok = self.weekday_filter.is_empty()
                || self.weekday_filter.contains(&date.weekday());

            if month_ok && weekday_ok {
                return Some(date);
            }
            misses += 1;
            if misses > MISS_LIMIT {
                return None;
            }
        }
    }
}

/// Frequency-specific date stepping.
enum Stepper {
    Daily {
        next: Option<NaiveDate>,
        step: u64,
    },
    Weekly {
        week_start: NaiveDate,
        step_days: u64,
        offsets: Vec<u64>,
        week: u64,
        idx: usize,
    },
    Monthly {
        /// Absolute month index (year * 12 + month - 1).
        ym: i64,
        step: i64,
        shape: MonthlyShape,
        by_setpos: Vec<i16>,
        queue: VecDeque<NaiveDate>,
        empty_months: u32,
    },
}

enum MonthlyShape {
    /// No BY* part: the anchor's day of month, skipping short months.
    AnchorDay(u8),
    ByMonthDay(Vec<i8>),
    ByDay(Vec<WeekdayNum>),
}

impl Stepper {
    fn next_date(&mut self) -> Option<NaiveDate> {
        match self {
            Self::Daily { next, step } => {
                let date = (*next)?;
                *next = date.checked_add_days(Days::new(*step));
                Some(date)
            }
            Self::Weekly {
                week_start,
                step_days,
                offsets,
                week,
                idx,
            } => {
                let offset = offsets.get(*idx).copied()?;
                let date = week_start.checked_add_days(Days::new(*week * *step_days + offset))?;
                *idx += 1;
                if *idx == offsets.len() {
                    *idx = 0;
                    *week += 1;
                }
                Some(date)
            }
            Self::Monthly {
                ym,
                step,
                shape,
                by_setpos,
                queue,
                empty_months,
            } => loop {
                if let Some(date) = queue.pop_front() {
                    return Some(date);
                }
                if *empty_months > EMPTY_MONTH_LIMIT {
                    return None;
                }
                let (year, month) = split_month_index(*ym)?;
                *ym += *step;

                let days = month_candidates(year, month, shape, by_setpos);
                if days.is_empty() {
                    *empty_months += 1;
                } else {
                    *empty_months = 0;
                    queue.extend(days);
                }
            },
        }
    }
}

fn month_index(date: NaiveDate) -> i64 {
    i64::from(date.year()) * 12 + i64::from(date.month0())
}

fn split_month_index(ym: i64) -> Option<(i32, u32)> {
    let year = i32::try_from(ym.div_euclid(12)).ok()?;
    let month = u32::try_from(ym.rem_euclid(12) + 1).ok()?;
    Some((year, month))
}

/// The candidate days of one month, sorted, with BYSETPOS applied.
fn month_candidates(
    year: i32,
    month: u32,
    shape: &MonthlyShape,
    by_setpos: &[i16],
) -> Vec<NaiveDate> {
    let month_len = i32::try_from(last_day_of_month(year, month).day()).unwrap_or(31);

    let mut days: Vec<i32> = match shape {
        MonthlyShape::AnchorDay(day) => {
            let day = i32::from(*day);
            if day <= month_len { vec![day] } else { Vec::new() }
        }
        MonthlyShape::ByMonthDay(list) => list
            .iter()
            .filter_map(|md| {
                let day = if *md > 0 {
                    i32::from(*md)
                } else if *md < 0 {
                    // Counted from the month's end: -1 is the last day.
                    month_len + 1 + i32::from(*md)
                } else {
                    return None;
                };
                (1..=month_len).contains(&day).then_some(day)
            })
            .collect(),
        MonthlyShape::ByDay(entries) => {
            let first_weekday = NaiveDate::from_ymd_opt(year, month, 1)
                .map_or(0, |d| i32::try_from(d.weekday().num_days_from_monday()).unwrap_or(0));
            let mut acc = Vec::new();
            for entry in entries {
                let target = i32::from(entry.weekday.days_from_monday());
                let first = 1 + (7 + target - first_weekday) % 7;
                let occurrences = (month_len - first) / 7 + 1;
                match entry.ordinal {
                    None => {
                        for i in 0..occurrences {
                            acc.push(first + i * 7);
                        }
                    }
                    Some(n) if n > 0 => {
                        let day = first + (i32::from(n) - 1) * 7;
                        if day <= month_len {
                            acc.push(day);
                        }
                    }
                    Some(n) => {
                        let last = first + (occurrences - 1) * 7;
                        let day = last + (i32::from(n) + 1) * 7;
                        if day >= 1 {
                            acc.push(day);
                        }
                    }
                }
            }
            acc
        }
    };

    days.sort_unstable();
    days.dedup();

    let selected: Vec<i32> = if by_setpos.is_empty() {
        days
    } else {
        let n = i32::try_from(days.len()).unwrap_or(0);
        let mut selected: Vec<i32> = by_setpos
            .iter()
            .filter_map(|pos| {
                let idx = if *pos > 0 {
                    i32::from(*pos) - 1
                } else if *pos < 0 {
                    n + i32::from(*pos)
                } else {
                    return None;
                };
                if !(0..n).contains(&idx) {
                    return None;
                }
                days.get(usize::try_from(idx).ok()?).copied()
            })
            .collect();
        selected.sort_unstable();
        selected.dedup();
        selected
    };

    selected
        .into_iter()
        .filter_map(|day| NaiveDate::from_ymd_opt(year, month, u32::try_from(day).ok()?))
        .collect()
}

/// Cartesian product of the BYHOUR/BYMINUTE/BYSECOND parts, defaulting
/// each level to the anchor's time component, sorted.
fn build_times(rule: &RRule, anchor_time: NaiveTime) -> Vec<NaiveTime> {
    fn level(values: &[u8], default: u32) -> Vec<u32> {
        if values.is_empty() {
            vec![default]
        } else {
            values.iter().map(|v| u32::from(*v)).collect()
        }
    }

    let hours = level(&rule.by_hour, anchor_time.hour());
    let minutes = level(&rule.by_minute, anchor_time.minute());
    let seconds = level(&rule.by_second, anchor_time.second());

    let mut times = Vec::with_capacity(hours.len() * minutes.len() * seconds.len());
    for h in &hours {
        for m in &minutes {
            for s in &seconds {
                if let Some(t) = NaiveTime::from_hms_opt(*h, *m, *s) {
                    times.push(t);
                }
            }
        }
    }
    times.sort_unstable();
    times.dedup();
    if times.is_empty() {
        times.push(anchor_time);
    }
    times
}

fn weekday_without_ordinal(entry: &WeekdayNum) -> Result<chrono::Weekday, RecurrenceError> {
    if entry.ordinal.is_some() {
        return Err(RecurrenceError::MisplacedByDayOrdinal);
    }
    Ok(match entry.weekday.days_from_monday() {
        0 => chrono::Weekday::Mon,
        1 => chrono::Weekday::Tue,
        2 => chrono::Weekday::Wed,
        3 => chrono::Weekday::Thu,
        4 => chrono::Weekday::Fri,
        5 => chrono::Weekday::Sat,
        _ => chrono::Weekday::Sun,
    })
}
