//! Koyomi iCalendar library - integration test support.
//!
//! This crate re-exports the workspace crates to support integration
//! tests that use `koyomi_test::` paths.

pub use koyomi_cal as cal;
pub use koyomi_core as base;
pub use koyomi_rfc as rfc;
