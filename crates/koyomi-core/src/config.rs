//! Library configuration.

use serde::Deserialize;

/// Default bound on candidate generation for unbounded recurrences.
///
/// Ten years of daily occurrences; wide enough for any realistic range
/// query while keeping a runaway rule finite.
pub const DEFAULT_MAX_EXPANSIONS: u32 = 3650;

/// Options recognized by the calendar codec and the recurrence engine.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CalendarConfig {
    /// Reject unknown recurrence frequencies and malformed text escapes
    /// instead of preserving them verbatim.
    pub strict_rfc5545: bool,
    /// Upper bound on generated occurrence candidates per series when no
    /// range bound is supplied.
    pub max_expansions: u32,
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            strict_rfc5545: false,
            max_expansions: DEFAULT_MAX_EXPANSIONS,
        }
    }
}

impl CalendarConfig {
    /// Returns a configuration with strict RFC 5545 conformance enabled.
    #[must_use]
    pub fn strict() -> Self {
        Self {
            strict_rfc5545: true,
            ..Self::default()
        }
    }
}
