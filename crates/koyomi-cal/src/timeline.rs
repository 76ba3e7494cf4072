//! A merged, chronologically ordered view over a calendar's events.
//!
//! One lazy source per recurring master plus a single pre-sorted source
//! of non-recurring items feed a binary heap keyed by occurrence start.
//! Only iterator heads are materialized, so unbounded series are safe;
//! range queries stop pulling a source once its head passes the bound.
//!
//! Override resolution is authoritative: an override with a given
//! `RECURRENCE-ID` beats the master's generated candidate at that slot,
//! and an `EXDATE` for the same id beats both.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use chrono::TimeDelta;
use koyomi_core::CalendarConfig;
use koyomi_rfc::ical::core::Date;
use koyomi_rfc::ical::expand::TimeZoneResolver;

use crate::caldatetime::{CalDateTime, OccurrenceKey};
use crate::calendar::Calendar;
use crate::error::CalResult;
use crate::event::Event;
use crate::recurrence::RecurrenceIter;

/// One materialized instance of an event.
#[derive(Debug, Clone)]
pub struct Occurrence<'a> {
    pub uid: &'a str,
    /// The series slot this occurrence fills; `None` for standalone items.
    pub recurrence_id: Option<CalDateTime>,
    pub start: CalDateTime,
    pub end: CalDateTime,
    /// The event the occurrence was materialized from (the override when
    /// one replaces a generated candidate).
    pub event: &'a Event,
    pub is_override: bool,
}

/// A timeline query factory over a borrowed calendar snapshot.
///
/// Borrowing makes the snapshot rule structural: the calendar cannot be
/// mutated while any timeline built from it is alive.
pub struct Timeline<'a> {
    calendar: &'a Calendar,
    resolver: &'a TimeZoneResolver,
    config: CalendarConfig,
}

impl<'a> Timeline<'a> {
    pub(crate) fn new(
        calendar: &'a Calendar,
        resolver: &'a TimeZoneResolver,
        config: CalendarConfig,
    ) -> Self {
        Self {
            calendar,
            resolver,
            config,
        }
    }

    /// All occurrences in chronological order.
    ///
    /// Unbounded series are clipped at `max_expansions` candidates each.
    ///
    /// ## Errors
    ///
    /// Fails if any series rule cannot be expanded (unsupported or
    /// undecoded frequency).
    pub fn iter(&self) -> CalResult<TimelineIter<'a>> {
        self.build(None, None, None)
    }

    /// Occurrences intersecting `[start, end)`.
    ///
    /// ## Errors
    ///
    /// See [`Timeline::iter`].
    pub fn overlapping(
        &self,
        start: &CalDateTime,
        end: &CalDateTime,
    ) -> CalResult<TimelineIter<'a>> {
        self.build(
            Some(start.sort_key(self.resolver)),
            None,
            Some(end.sort_key(self.resolver)),
        )
    }

    /// Occurrences active on the given day.
    ///
    /// ## Errors
    ///
    /// See [`Timeline::iter`].
    pub fn on_date(&self, date: Date) -> CalResult<TimelineIter<'a>> {
        let start = CalDateTime::Date(date);
        let end = start.shift(TimeDelta::days(1));
        self.overlapping(&start, &end)
    }

    /// Occurrences starting strictly after the given value.
    ///
    /// ## Errors
    ///
    /// See [`Timeline::iter`].
    pub fn start_after(&self, instant: &CalDateTime) -> CalResult<TimelineIter<'a>> {
        self.build(None, Some(instant.sort_key(self.resolver)), None)
    }

    fn build(
        &self,
        overlap_start: Option<OccurrenceKey>,
        starts_after: Option<OccurrenceKey>,
        end_bound: Option<OccurrenceKey>,
    ) -> CalResult<TimelineIter<'a>> {
        let calendar: &'a Calendar = self.calendar;
        let resolver: &'a TimeZoneResolver = self.resolver;
        let mut sources: Vec<SourceState<'a>> = Vec::new();
        let mut singles: Vec<SingleEntry<'a>> = Vec::new();

        for event in &calendar.events {
            if event.is_override() {
                continue; // attached to its master below, or as an orphan
            }
            if event.is_recurring() {
                let iter = RecurrenceIter::for_event(event, resolver, self.config.max_expansions)?;
                let suppressed = calendar
                    .overrides(&event.uid)
                    .iter()
                    .filter_map(|o| o.recurrence_id.clone())
                    .collect();
                sources.push(SourceState::Series {
                    iter,
                    event,
                    suppressed,
                });
            } else {
                singles.push(SingleEntry {
                    start: event.dtstart.clone(),
                    recurrence_id: None,
                    event,
                    is_override: false,
                });
            }
        }

        // Overrides ride the singles source so the merged stream stays
        // ordered even when an override moves its instance in time. An
        // override whose slot is EXDATEd is suppressed outright.
        for event in &calendar.events {
            let Some(rid) = &event.recurrence_id else {
                continue;
            };
            let exdated = calendar.master(&event.uid).is_some_and(|master| {
                master.exdate.iter().any(|x| x.matches(rid, resolver))
            });
            if exdated {
                tracing::debug!(uid = %event.uid, rid = %rid, "Override suppressed by EXDATE");
                continue;
            }
            singles.push(SingleEntry {
                start: event.dtstart.clone(),
                recurrence_id: Some(rid.clone()),
                event,
                is_override: true,
            });
        }

        singles.sort_by(|a, b| {
            a.start
                .sort_key(resolver)
                .cmp(&b.start.sort_key(resolver))
                .then_with(|| a.event.uid.cmp(&b.event.uid))
        });
        sources.push(SourceState::Singles {
            entries: singles,
            next: 0,
        });

        Ok(TimelineIter {
            sources,
            heap: BinaryHeap::new(),
            resolver,
            overlap_start,
            starts_after,
            end_bound,
            primed: false,
        })
    }
}

struct SingleEntry<'a> {
    start: CalDateTime,
    recurrence_id: Option<CalDateTime>,
    event: &'a Event,
    is_override: bool,
}

enum SourceState<'a> {
    Series {
        iter: RecurrenceIter<'a>,
        event: &'a Event,
        /// Recurrence ids whose generated candidate an override replaces.
        suppressed: Vec<CalDateTime>,
    },
    Singles {
        entries: Vec<SingleEntry<'a>>,
        next: usize,
    },
}

impl<'a> SourceState<'a> {
    fn next(
        &mut self,
        resolver: &TimeZoneResolver,
    ) -> Option<(CalDateTime, Option<CalDateTime>, &'a Event, bool)> {
        match self {
            Self::Series {
                iter,
                event,
                suppressed,
            } => loop {
                let start = iter.next()?;
                if suppressed.iter().any(|s| s.matches(&start, resolver)) {
                    continue;
                }
                return Some((start.clone(), Some(start), *event, false));
            },
            Self::Singles { entries, next } => {
                let entry = entries.get(*next)?;
                *next += 1;
                Some((
                    entry.start.clone(),
                    entry.recurrence_id.clone(),
                    entry.event,
                    entry.is_override,
                ))
            }
        }
    }
}

struct HeapEntry<'a> {
    key: OccurrenceKey,
    source: usize,
    start: CalDateTime,
    recurrence_id: Option<CalDateTime>,
    event: &'a Event,
    is_override: bool,
}

impl HeapEntry<'_> {
    /// Ties break all-day before timed (inside the key), then by UID,
    /// then by source insertion order.
    fn ordering(&self, other: &Self) -> Ordering {
        self.key
            .cmp(&other.key)
            .then_with(|| self.event.uid.cmp(&other.event.uid))
            .then_with(|| self.source.cmp(&other.source))
    }
}

impl PartialEq for HeapEntry<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.ordering(other) == Ordering::Equal
    }
}

impl Eq for HeapEntry<'_> {}

impl PartialOrd for HeapEntry<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HeapEntry<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.ordering(other)
    }
}

/// Lazy merged iteration over a calendar's occurrences.
pub struct TimelineIter<'a> {
    sources: Vec<SourceState<'a>>,
    heap: BinaryHeap<Reverse<HeapEntry<'a>>>,
    resolver: &'a TimeZoneResolver,
    /// Yield only occurrences ending after this key.
    overlap_start: Option<OccurrenceKey>,
    /// Yield only occurrences starting strictly after this key.
    starts_after: Option<OccurrenceKey>,
    /// Stop pulling a source once its head reaches this key (exclusive).
    end_bound: Option<OccurrenceKey>,
    primed: bool,
}

impl TimelineIter<'_> {
    /// Pulls the next head from a source into the heap, unless the source
    /// has passed the range's end bound.
    fn refill(&mut self, idx: usize) {
        let resolver = self.resolver;
        if let Some((start, recurrence_id, event, is_override)) = self.sources[idx].next(resolver)
        {
            let key = start.sort_key(resolver);
            if let Some(end) = self.end_bound {
                if key >= end {
                    // Sources are ascending; nothing further can qualify.
                    return;
                }
            }
            self.heap.push(Reverse(HeapEntry {
                key,
                source: idx,
                start,
                recurrence_id,
                event,
                is_override,
            }));
        }
    }
}

impl<'a> Iterator for TimelineIter<'a> {
    type Item = Occurrence<'a>;

    fn next(&mut self) -> Option<Occurrence<'a>> {
        if !self.primed {
            self.primed = true;
            for idx in 0..self.sources.len() {
                self.refill(idx);
            }
        }

        loop {
            let Reverse(entry) = self.heap.pop()?;
            self.refill(entry.source);

            if let Some(after) = self.starts_after {
                if entry.key <= after {
                    continue;
                }
            }

            let end = entry.event.end_of(&entry.start);
            if let Some(range_start) = self.overlap_start {
                let end_key = end.sort_key(self.resolver);
                let intersects = if end_key <= entry.key {
                    // Zero-length occurrence: in range when its instant is.
                    entry.key >= range_start
                } else {
                    end_key > range_start
                };
                if !intersects {
                    continue;
                }
            }

            return Some(Occurrence {
                uid: &entry.event.uid,
                recurrence_id: entry.recurrence_id,
                start: entry.start,
                end,
                event: entry.event,
                is_override: entry.is_override,
            });
        }
    }
}
