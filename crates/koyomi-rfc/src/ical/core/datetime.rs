//! Date-time, time, and UTC offset types (RFC 5545 §3.3.5, §3.3.12, §3.3.14).

use std::fmt;

use super::value::Date;

/// The three forms an iCalendar DATE-TIME can take (RFC 5545 §3.3.5).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DateTimeForm {
    /// Form 2: absolute instant, `Z` suffix.
    Utc,
    /// Form 1: floating local time, no zone attached.
    Floating,
    /// Form 3: local time qualified by a `TZID` parameter.
    Zoned { tzid: String },
}

/// An iCalendar DATE-TIME value.
///
/// Kept as broken-down wall-clock fields plus a form tag rather than an
/// absolute instant: zoned and floating values have no instant until a
/// timezone resolver is applied, and round-tripping must not normalize.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DateTime {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    pub form: DateTimeForm,
}

impl DateTime {
    /// Creates a UTC date-time.
    #[must_use]
    pub fn utc(year: u16, month: u8, day: u8, hour: u8, minute: u8, second: u8) -> Self {
        Self {
            year,
            month,
            day,
            hour,
            minute,
            second,
            form: DateTimeForm::Utc,
        }
    }

    /// Creates a floating (zone-less) date-time.
    #[must_use]
    pub fn floating(year: u16, month: u8, day: u8, hour: u8, minute: u8, second: u8) -> Self {
        Self {
            year,
            month,
            day,
            hour,
            minute,
            second,
            form: DateTimeForm::Floating,
        }
    }

    /// Creates a date-time in the named timezone.
    #[must_use]
    pub fn zoned(
        tzid: impl Into<String>,
        year: u16,
        month: u8,
        day: u8,
        hour: u8,
        minute: u8,
        second: u8,
    ) -> Self {
        Self {
            year,
            month,
            day,
            hour,
            minute,
            second,
            form: DateTimeForm::Zoned { tzid: tzid.into() },
        }
    }

    #[must_use]
    pub fn is_utc(&self) -> bool {
        self.form == DateTimeForm::Utc
    }

    #[must_use]
    pub fn is_floating(&self) -> bool {
        self.form == DateTimeForm::Floating
    }

    /// Returns the `TZID` when this is a zoned date-time.
    #[must_use]
    pub fn tzid(&self) -> Option<&str> {
        match &self.form {
            DateTimeForm::Zoned { tzid } => Some(tzid),
            DateTimeForm::Utc | DateTimeForm::Floating => None,
        }
    }

    /// Returns the calendar-date part.
    #[must_use]
    pub fn date(&self) -> Date {
        Date {
            year: self.year,
            month: self.month,
            day: self.day,
        }
    }

    /// Returns the same wall-clock fields with a different form.
    #[must_use]
    pub fn with_form(mut self, form: DateTimeForm) -> Self {
        self.form = form;
        self
    }
}

impl fmt::Display for DateTime {
    /// Formats as `YYYYMMDDTHHMMSS[Z]`. The `TZID` parameter is property
    /// metadata and is not part of the value text.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}{:02}{:02}T{:02}{:02}{:02}",
            self.year, self.month, self.day, self.hour, self.minute, self.second
        )?;
        if self.is_utc() {
            write!(f, "Z")?;
        }
        Ok(())
    }
}

/// An iCalendar TIME value (RFC 5545 §3.3.12).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Time {
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    pub is_utc: bool,
}

impl fmt::Display for Time {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}{:02}{:02}", self.hour, self.minute, self.second)?;
        if self.is_utc {
            write!(f, "Z")?;
        }
        Ok(())
    }
}

/// An iCalendar UTC-OFFSET value (RFC 5545 §3.3.14).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UtcOffset {
    seconds: i32,
}

impl UtcOffset {
    #[must_use]
    pub fn from_seconds(seconds: i32) -> Self {
        Self { seconds }
    }

    #[must_use]
    pub fn as_seconds(self) -> i32 {
        self.seconds
    }

    /// Signed hour component.
    #[must_use]
    pub fn hours(self) -> i32 {
        self.seconds / 3600
    }

    /// Minute component (always non-negative).
    #[must_use]
    pub fn minutes(self) -> i32 {
        (self.seconds.abs() % 3600) / 60
    }
}

impl fmt::Display for UtcOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.seconds < 0 { '-' } else { '+' };
        let abs = self.seconds.abs();
        write!(f, "{sign}{:02}{:02}", abs / 3600, (abs % 3600) / 60)?;
        if abs % 60 != 0 {
            write!(f, "{:02}", abs % 60)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_utc() {
        let dt = DateTime::utc(1997, 9, 1, 13, 0, 0);
        assert_eq!(dt.to_string(), "19970901T130000Z");
    }

    #[test]
    fn display_floating() {
        let dt = DateTime::floating(2022, 8, 29, 9, 0, 0);
        assert_eq!(dt.to_string(), "20220829T090000");
    }

    #[test]
    fn display_zoned_omits_suffix() {
        let dt = DateTime::zoned("Europe/Stockholm", 2022, 8, 29, 9, 0, 0);
        assert_eq!(dt.to_string(), "20220829T090000");
        assert_eq!(dt.tzid(), Some("Europe/Stockholm"));
    }

    #[test]
    fn utc_offset_display() {
        assert_eq!(UtcOffset::from_seconds(5 * 3600 + 30 * 60).to_string(), "+0530");
        assert_eq!(UtcOffset::from_seconds(-8 * 3600).to_string(), "-0800");
    }

    #[test]
    fn utc_offset_components() {
        let offset = UtcOffset::from_seconds(-8 * 3600);
        assert_eq!(offset.hours(), -8);
        assert_eq!(offset.minutes(), 0);
    }
}
