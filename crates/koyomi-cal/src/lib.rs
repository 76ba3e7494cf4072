//! Typed calendar domain for the koyomi iCalendar library.
//!
//! Bridges the raw component tree from `koyomi-rfc` into typed
//! [`Calendar`]/[`Event`]/[`Todo`] values and implements the three pieces
//! of calendar machinery on top of them:
//!
//! - the recurrence engine ([`recurrence`]): lazy expansion of
//!   `RRULE`/`RDATE`/`EXDATE` into ordered occurrence starts,
//! - the timeline ([`timeline`]): a merged, chronologically ordered view
//!   over every series in a calendar, with range queries,
//! - the store ([`store`]): edits and deletes over recurring series with
//!   RFC 5545 bookkeeping (`SEQUENCE`, `DTSTAMP`, `EXDATE`, `UNTIL`,
//!   override migration).

pub mod caldatetime;
pub mod calendar;
pub mod codec;
pub mod error;
pub mod event;
pub mod recurrence;
pub mod store;
pub mod timeline;
pub mod todo;

pub use caldatetime::CalDateTime;
pub use calendar::Calendar;
pub use codec::{decode_calendar, decode_calendar_with, encode_calendar};
pub use error::{
    CalError, CalResult, DecodeError, RecurrenceError, StoreError, ValidationError,
};
pub use event::{Event, RelatedTo, RelationshipType};
pub use recurrence::RecurrenceIter;
pub use store::{EditScope, EventPatch, EventStore, TodoPatch, TodoStore};
pub use timeline::{Occurrence, Timeline};
pub use todo::Todo;
