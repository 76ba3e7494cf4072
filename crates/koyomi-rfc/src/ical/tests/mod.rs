//! Cross-module tests for the iCalendar codec.

mod round_trip;
