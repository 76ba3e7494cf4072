//! iCalendar DURATION values (RFC 5545 §3.3.6).

use std::fmt;

/// A nominal duration: the ISO 8601 subset RFC 5545 permits.
///
/// Weeks are exclusive with the day/time components in the text form
/// (`P2W` vs `P1DT2H`), but the struct stores both; `Display` picks the
/// week form only when no other component is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Duration {
    pub negative: bool,
    pub weeks: u32,
    pub days: u32,
    pub hours: u32,
    pub minutes: u32,
    pub seconds: u32,
}

impl Duration {
    /// The zero duration (`PT0S`).
    #[must_use]
    pub fn zero() -> Self {
        Self::default()
    }

    /// A duration of whole days.
    #[must_use]
    pub fn days(days: u32) -> Self {
        Self {
            days,
            ..Self::default()
        }
    }

    /// Total signed length in seconds.
    #[must_use]
    pub fn num_seconds(self) -> i64 {
        let magnitude = i64::from(self.weeks) * 7 * 86_400
            + i64::from(self.days) * 86_400
            + i64::from(self.hours) * 3600
            + i64::from(self.minutes) * 60
            + i64::from(self.seconds);
        if self.negative { -magnitude } else { magnitude }
    }

    #[must_use]
    pub fn is_zero(self) -> bool {
        self.num_seconds() == 0
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negative {
            write!(f, "-")?;
        }
        write!(f, "P")?;

        let has_time = self.hours > 0 || self.minutes > 0 || self.seconds > 0;
        if self.weeks > 0 && self.days == 0 && !has_time {
            return write!(f, "{}W", self.weeks);
        }

        // Weeks outside the pure week form are carried as days.
        let days = self.days + self.weeks * 7;
        if days > 0 {
            write!(f, "{days}D")?;
        }
        if has_time || days == 0 {
            write!(f, "T")?;
            if self.hours > 0 {
                write!(f, "{}H", self.hours)?;
            }
            if self.minutes > 0 {
                write!(f, "{}M", self.minutes)?;
            }
            if self.seconds > 0 || !has_time {
                write!(f, "{}S", self.seconds)?;
            }
        }
        Ok(())
    }
}
