//! RFC 5545 iCalendar content-line codec.
//!
//! Parsing, typed values, and serialization for iCalendar documents.
//! The crate stays at the text-and-component level: it knows about
//! content lines, components, parameters, and value types, but has no
//! opinion on calendar semantics (recurrence expansion, stores, and
//! timelines live in `koyomi-cal`).

pub mod ical;
