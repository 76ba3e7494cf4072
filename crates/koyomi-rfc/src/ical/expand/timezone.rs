//! Timezone resolution and UTC conversion for iCalendar date-times.
//!
//! The library ships no timezone database of its own: a `TZID` is resolved
//! through a caller-supplied lookup hook first, falling back to the IANA
//! names `chrono-tz` knows.

use std::cell::RefCell;
use std::collections::HashMap;
use std::str::FromStr;

use chrono::{DateTime, LocalResult, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

/// Caller-supplied timezone lookup: `TZID` name in, zone out.
pub type TzLookup = dyn Fn(&str) -> Option<Tz> + Send + Sync;

/// Error during timezone conversion.
#[derive(Debug, thiserror::Error)]
pub enum ConversionError {
    /// Unknown or invalid timezone identifier.
    #[error("Unknown timezone: {0}")]
    UnknownTimezone(String),

    /// Non-existent time during DST gap.
    #[error("Non-existent time (DST gap): {0}")]
    NonExistentTime(String),

    /// Invalid datetime fields.
    #[error("Invalid datetime: {0}")]
    InvalidDateTime(String),
}

/// Resolver for timezone identifiers.
///
/// Caches successful resolutions; the cache uses interior mutability so
/// a resolver can be shared by several lazy iterators.
pub struct TimeZoneResolver {
    cache: RefCell<HashMap<String, Tz>>,
    lookup: Option<Box<TzLookup>>,
}

impl TimeZoneResolver {
    /// Creates a resolver backed only by the IANA table.
    #[must_use]
    pub fn new() -> Self {
        Self {
            cache: RefCell::new(HashMap::new()),
            lookup: None,
        }
    }

    /// Creates a resolver that consults `lookup` before the IANA table.
    #[must_use]
    pub fn with_lookup(lookup: impl Fn(&str) -> Option<Tz> + Send + Sync + 'static) -> Self {
        Self {
            cache: RefCell::new(HashMap::new()),
            lookup: Some(Box::new(lookup)),
        }
    }

    /// Resolves a timezone identifier to a `chrono_tz::Tz`.
    ///
    /// ## Errors
    ///
    /// Returns `ConversionError::UnknownTimezone` if neither the lookup
    /// hook nor the IANA table recognizes the TZID.
    pub fn resolve(&self, tzid: &str) -> Result<Tz, ConversionError> {
        if let Some(tz) = self.cache.borrow().get(tzid) {
            return Ok(*tz);
        }

        let normalized = normalize_tzid(tzid);

        let tz = self
            .lookup
            .as_ref()
            .and_then(|lookup| lookup(tzid))
            .or_else(|| Tz::from_str(normalized).ok())
            .ok_or_else(|| ConversionError::UnknownTimezone(tzid.to_string()))?;

        self.cache.borrow_mut().insert(tzid.to_string(), tz);
        Ok(tz)
    }
}

impl Default for TimeZoneResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TimeZoneResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimeZoneResolver")
            .field("cached", &self.cache.borrow().len())
            .field("has_lookup", &self.lookup.is_some())
            .finish()
    }
}

/// Normalizes common CalDAV/iCalendar timezone identifiers.
///
/// Several calendar clients prefix IANA names with a vendor path.
fn normalize_tzid(tzid: &str) -> &str {
    tzid.strip_prefix("/mozilla.org/")
        .or_else(|| tzid.strip_prefix("/softwarestudio.org/"))
        .or_else(|| tzid.strip_prefix("/freeassociation.sourceforge.net/"))
        .unwrap_or(tzid)
}

/// Converts a local wall-clock time to UTC using the named timezone.
///
/// Handles DST gaps (non-existent times) and folds (ambiguous times):
/// a fold resolves to the first occurrence per RFC 5545 §3.3.5, a gap is
/// an error.
///
/// ## Errors
///
/// Returns an error if the timezone cannot be resolved or the local time
/// falls in a DST gap.
pub fn convert_to_utc(
    local_time: NaiveDateTime,
    tzid: &str,
    resolver: &TimeZoneResolver,
) -> Result<DateTime<Utc>, ConversionError> {
    let tz = resolver.resolve(tzid)?;

    match tz.from_local_datetime(&local_time) {
        LocalResult::None => Err(ConversionError::NonExistentTime(format!(
            "{local_time} in timezone {tzid}"
        ))),
        LocalResult::Single(dt) => Ok(dt.with_timezone(&Utc)),
        // DST fold: RFC 5545 §3.3.5 picks the occurrence before the shift.
        LocalResult::Ambiguous(dt1, _dt2) => Ok(dt1.with_timezone(&Utc)),
    }
}

/// Lenient variant of [`convert_to_utc`]: a DST gap shifts forward one
/// hour instead of failing. Used where a total ordering matters more
/// than strictness (timeline sort keys).
pub fn convert_to_utc_lenient(
    local_time: NaiveDateTime,
    tzid: &str,
    resolver: &TimeZoneResolver,
) -> Result<DateTime<Utc>, ConversionError> {
    match convert_to_utc(local_time, tzid, resolver) {
        Err(ConversionError::NonExistentTime(_)) => {
            let shifted = local_time + chrono::TimeDelta::hours(1);
            convert_to_utc(shifted, tzid, resolver)
        }
        other => other,
    }
}
