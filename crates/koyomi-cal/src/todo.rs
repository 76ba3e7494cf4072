//! The typed VTODO model.

use chrono::TimeDelta;
use koyomi_rfc::ical::core::{Component, DateTime, Duration, Property, RRule};

use crate::caldatetime::CalDateTime;
use crate::error::ValidationError;
use crate::event::RelatedTo;

/// A to-do item.
///
/// Unlike events, a to-do may have no time information at all; `DUE`
/// and `DURATION` are both optional (and `DURATION` requires `DTSTART`
/// per RFC 5545 §3.6.2).
#[derive(Debug, Clone, PartialEq)]
pub struct Todo {
    pub uid: String,
    pub dtstamp: DateTime,
    pub dtstart: Option<CalDateTime>,
    pub due: Option<CalDateTime>,
    pub duration: Option<Duration>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub status: Option<String>,
    pub percent_complete: Option<i32>,
    pub priority: Option<i32>,
    pub sequence: Option<i32>,
    pub created: Option<DateTime>,
    pub last_modified: Option<DateTime>,
    pub rrule: Option<RRule>,
    pub rdate: Vec<CalDateTime>,
    pub exdate: Vec<CalDateTime>,
    pub recurrence_id: Option<CalDateTime>,
    pub related_to: Vec<RelatedTo>,
    pub categories: Vec<String>,
    pub extra: Vec<Property>,
    pub children: Vec<Component>,
    pub property_order: Vec<String>,
}

impl Todo {
    /// Creates a bare to-do. `DTSTAMP` starts at the epoch; the store
    /// refreshes it on `add`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            uid: String::new(),
            dtstamp: DateTime::utc(1970, 1, 1, 0, 0, 0),
            dtstart: None,
            due: None,
            duration: None,
            summary: None,
            description: None,
            location: None,
            status: None,
            percent_complete: None,
            priority: None,
            sequence: None,
            created: None,
            last_modified: None,
            rrule: None,
            rdate: Vec::new(),
            exdate: Vec::new(),
            recurrence_id: None,
            related_to: Vec::new(),
            categories: Vec::new(),
            extra: Vec::new(),
            children: Vec::new(),
            property_order: Vec::new(),
        }
    }

    /// The to-do's length, when it has one.
    #[must_use]
    pub fn computed_duration(&self) -> Option<TimeDelta> {
        match (&self.dtstart, &self.due, &self.duration) {
            (Some(start), Some(due), _) => Some(due.naive() - start.naive()),
            (_, _, Some(duration)) => Some(TimeDelta::seconds(duration.num_seconds())),
            _ => None,
        }
    }

    /// Checks the structural invariants of RFC 5545 §3.6.2.
    ///
    /// ## Errors
    ///
    /// Returns the first violated invariant.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.due.is_some() && self.duration.is_some() {
            return Err(ValidationError::DtendAndDuration);
        }
        if let (Some(start), Some(due)) = (&self.dtstart, &self.due) {
            if !due.same_value_type(start) {
                return Err(ValidationError::MixedValueTypes);
            }
            if due.naive() <= start.naive() {
                return Err(ValidationError::EndBeforeStart);
            }
        }
        if let Some(rrule) = &self.rrule {
            if rrule.count.is_some() && rrule.until.is_some() {
                return Err(ValidationError::CountAndUntil);
            }
        }
        Ok(())
    }
}

impl Default for Todo {
    fn default() -> Self {
        Self::new()
    }
}
