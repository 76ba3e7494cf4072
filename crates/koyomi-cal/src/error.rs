//! Error types for the calendar domain.

use koyomi_rfc::ical::core::Frequency;
use koyomi_rfc::ical::expand::ConversionError;
use koyomi_rfc::ical::parse::ParseError;
use thiserror::Error;

/// A property value did not match its declared or expected type.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("{property}: expected a {expected} value")]
    TypeMismatch {
        property: String,
        expected: &'static str,
    },

    #[error("{property}: TZID parameter is not allowed here")]
    TzidNotAllowed { property: String },

    #[error("{property}: not a valid calendar date")]
    InvalidDate { property: String },

    #[error("missing required property {0}")]
    MissingProperty(&'static str),

    #[error("{property}: VALUE parameter conflicts with the actual value")]
    ValueParamConflict { property: String },
}

/// An item violates an RFC 5545 structural invariant.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("DTEND and DURATION are mutually exclusive")]
    DtendAndDuration,

    #[error("COUNT and UNTIL are mutually exclusive")]
    CountAndUntil,

    #[error("DTEND must be after DTSTART")]
    EndBeforeStart,

    #[error("DTSTART and DTEND must share a value type")]
    MixedValueTypes,

    #[error("{0} entries must share DTSTART's value type")]
    DateListTypeMismatch(&'static str),

    #[error("UNTIL value type does not match DTSTART")]
    UntilTypeMismatch,

    #[error("RECURRENCE-ID does not match any occurrence of the series")]
    OrphanOverride,

    #[error("RECURRENCE-ID value type does not match the master's DTSTART")]
    RecurrenceIdTypeMismatch,
}

/// A recurrence rule cannot be expanded.
#[derive(Error, Debug)]
pub enum RecurrenceError {
    #[error("unsupported recurrence frequency {0}")]
    UnsupportedFrequency(Frequency),

    #[error("recurrence rule has no FREQ part")]
    MissingFrequency,

    #[error("the recurrence rule did not decode; cannot expand")]
    UndecodedRule,

    #[error("BYDAY ordinals are only supported with FREQ=MONTHLY")]
    MisplacedByDayOrdinal,

    #[error("unbounded expansion requested without a range or count bound")]
    UnboundedExpansion,

    #[error(transparent)]
    Timezone(#[from] ConversionError),
}

/// A store mutation could not be applied.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("an item with UID {0} already exists")]
    UidExists(String),

    #[error("no item with UID {0}")]
    NotFound(String),

    #[error("item {0} is not recurring")]
    NotRecurring(String),

    #[error("unsupported relationship type {0}")]
    UnsupportedRelationship(String),

    #[error("a single-instance edit cannot change the recurrence rule")]
    RRuleOnInstance,

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Recurrence(#[from] RecurrenceError),
}

/// Umbrella error for the public calendar surface.
#[derive(Error, Debug)]
pub enum CalError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Recurrence(#[from] RecurrenceError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type CalResult<T> = std::result::Result<T, CalError>;
