//! Shared primitives for the koyomi iCalendar library.
//!
//! This crate carries the pieces that every other koyomi crate needs but
//! that belong to none of them in particular: configuration and the
//! injected clock and UID factory.

pub mod clock;
pub mod config;

pub use clock::{Clock, FixedClock, SequentialUidFactory, SystemClock, UidFactory, UuidFactory};
pub use config::CalendarConfig;
