//! The typed VEVENT model.

use chrono::TimeDelta;
use koyomi_rfc::ical::core::{Component, DateTime, Duration, Property, RRule, RRuleUntil};

use crate::caldatetime::CalDateTime;
use crate::error::ValidationError;

/// How one item relates to another (`RELATED-TO;RELTYPE=`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationshipType {
    Parent,
    Child,
    Sibling,
}

impl RelationshipType {
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "PARENT" => Some(Self::Parent),
            "CHILD" => Some(Self::Child),
            "SIBLING" => Some(Self::Sibling),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Parent => "PARENT",
            Self::Child => "CHILD",
            Self::Sibling => "SIBLING",
        }
    }
}

/// A `RELATED-TO` entry: the referenced UID plus the relationship type.
///
/// Stored as a UID reference, never an object pointer, so parent/child
/// graphs cannot create reference cycles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelatedTo {
    pub uid: String,
    pub reltype: RelationshipType,
}

impl RelatedTo {
    #[must_use]
    pub fn parent(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            reltype: RelationshipType::Parent,
        }
    }
}

/// A calendar event.
///
/// Fields the core manipulates are typed; everything else rides along in
/// `extra` and survives a round-trip untouched. `property_order` records
/// the original property sequence so re-encoding can replay it.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub uid: String,
    pub dtstamp: DateTime,
    pub dtstart: CalDateTime,
    pub dtend: Option<CalDateTime>,
    pub duration: Option<Duration>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub status: Option<String>,
    pub sequence: Option<i32>,
    pub created: Option<DateTime>,
    pub last_modified: Option<DateTime>,
    pub rrule: Option<RRule>,
    /// Raw RRULE text when the rule did not decode (lenient mode keeps it).
    pub undecoded_rrule: Option<String>,
    pub rdate: Vec<CalDateTime>,
    pub exdate: Vec<CalDateTime>,
    pub recurrence_id: Option<CalDateTime>,
    pub related_to: Vec<RelatedTo>,
    pub categories: Vec<String>,
    /// Properties outside the typed catalog, in appearance order.
    pub extra: Vec<Property>,
    /// Child components (VALARM and friends), preserved verbatim.
    pub children: Vec<Component>,
    /// Original property names in appearance order, for re-encoding.
    pub property_order: Vec<String>,
}

impl Event {
    /// Creates a bare event starting at `dtstart`.
    ///
    /// `DTSTAMP` starts at the epoch; the store refreshes it on `add`.
    #[must_use]
    pub fn new(dtstart: CalDateTime) -> Self {
        Self {
            uid: String::new(),
            dtstamp: DateTime::utc(1970, 1, 1, 0, 0, 0),
            dtstart,
            dtend: None,
            duration: None,
            summary: None,
            description: None,
            location: None,
            status: None,
            sequence: None,
            created: None,
            last_modified: None,
            rrule: None,
            undecoded_rrule: None,
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

    /// Whether this event is an all-day event.
    #[must_use]
    pub fn is_all_day(&self) -> bool {
        self.dtstart.is_date()
    }

    /// Whether this event generates more than one occurrence.
    #[must_use]
    pub fn is_recurring(&self) -> bool {
        self.rrule.is_some() || self.undecoded_rrule.is_some() || !self.rdate.is_empty()
    }

    /// Whether this event is an override of a series instance.
    #[must_use]
    pub fn is_override(&self) -> bool {
        self.recurrence_id.is_some()
    }

    /// The event's length as a wall-clock delta.
    ///
    /// `DTEND` wins over `DURATION`; with neither, all-day events span one
    /// day and timed events are instantaneous (RFC 5545 §3.6.1).
    #[must_use]
    pub fn computed_duration(&self) -> TimeDelta {
        if let Some(dtend) = &self.dtend {
            dtend.naive() - self.dtstart.naive()
        } else if let Some(duration) = &self.duration {
            TimeDelta::seconds(duration.num_seconds())
        } else if self.is_all_day() {
            TimeDelta::days(1)
        } else {
            TimeDelta::zero()
        }
    }

    /// The end of an occurrence that starts at `start`.
    #[must_use]
    pub fn end_of(&self, start: &CalDateTime) -> CalDateTime {
        start.shift(self.computed_duration())
    }

    /// Checks the structural invariants of §3.6.1 and §3.8.5.
    ///
    /// ## Errors
    ///
    /// Returns the first violated invariant.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.dtend.is_some() && self.duration.is_some() {
            return Err(ValidationError::DtendAndDuration);
        }
        if let Some(dtend) = &self.dtend {
            if !dtend.same_value_type(&self.dtstart) {
                return Err(ValidationError::MixedValueTypes);
            }
            if dtend.naive() <= self.dtstart.naive() {
                return Err(ValidationError::EndBeforeStart);
            }
        }
        if let Some(rrule) = &self.rrule {
            if rrule.count.is_some() && rrule.until.is_some() {
                return Err(ValidationError::CountAndUntil);
            }
            if let Some(until) = &rrule.until {
                let until_is_date = matches!(until, RRuleUntil::Date(_));
                if until_is_date != self.dtstart.is_date() {
                    return Err(ValidationError::UntilTypeMismatch);
                }
            }
        }
        for entry in &self.exdate {
            if !entry.same_value_type(&self.dtstart) {
                return Err(ValidationError::DateListTypeMismatch("EXDATE"));
            }
        }
        for entry in &self.rdate {
            if !entry.same_value_type(&self.dtstart) {
                return Err(ValidationError::DateListTypeMismatch("RDATE"));
            }
        }
        if let Some(rid) = &self.recurrence_id {
            if !rid.same_value_type(&self.dtstart) {
                return Err(ValidationError::RecurrenceIdTypeMismatch);
            }
        }
        Ok(())
    }
}
