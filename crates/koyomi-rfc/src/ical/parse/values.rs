//! Value type parsers for iCalendar (RFC 5545 §3.3).

use super::error::{ParseError, ParseErrorKind, ParseResult};
use crate::ical::core::{
    Date, DateTime, DateTimeForm, Duration, Frequency, Period, RRule, RRuleUntil, Time, UtcOffset,
    Weekday, WeekdayNum,
};

/// Parses a DATE value (RFC 5545 §3.3.4).
///
/// Format: YYYYMMDD (e.g., "19970714")
///
/// ## Errors
/// Returns an error if the string is not a valid 8-digit date.
pub fn parse_date(s: &str, line: usize, col: usize) -> ParseResult<Date> {
    if s.len() != 8 || !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ParseError::new(ParseErrorKind::InvalidDate, line, col));
    }

    let year = s[0..4]
        .parse::<u16>()
        .map_err(|_| ParseError::new(ParseErrorKind::InvalidDate, line, col))?;
    let month = s[4..6]
        .parse::<u8>()
        .map_err(|_| ParseError::new(ParseErrorKind::InvalidDate, line, col))?;
    let day = s[6..8]
        .parse::<u8>()
        .map_err(|_| ParseError::new(ParseErrorKind::InvalidDate, line, col))?;

    if !(1..=12).contains(&month) || !(1..=31).contains(&day) {
        return Err(ParseError::new(ParseErrorKind::InvalidDate, line, col));
    }

    Ok(Date { year, month, day })
}

/// Parses a TIME value (RFC 5545 §3.3.12).
///
/// Format: HHMMSS[Z] (e.g., "133000", "133000Z")
///
/// ## Errors
/// Returns an error if the string is not a valid 6-digit time.
pub fn parse_time(s: &str, line: usize, col: usize) -> ParseResult<Time> {
    let (time_str, is_utc) = match s.strip_suffix('Z') {
        Some(stripped) => (stripped, true),
        None => (s, false),
    };

    if time_str.len() != 6 || !time_str.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ParseError::new(ParseErrorKind::InvalidTime, line, col));
    }

    let hour = time_str[0..2]
        .parse::<u8>()
        .map_err(|_| ParseError::new(ParseErrorKind::InvalidTime, line, col))?;
    let minute = time_str[2..4]
        .parse::<u8>()
        .map_err(|_| ParseError::new(ParseErrorKind::InvalidTime, line, col))?;
    let second = time_str[4..6]
        .parse::<u8>()
        .map_err(|_| ParseError::new(ParseErrorKind::InvalidTime, line, col))?;

    // Allow 60 for leap seconds
    if hour > 23 || minute > 59 || second > 60 {
        return Err(ParseError::new(ParseErrorKind::InvalidTime, line, col));
    }

    Ok(Time {
        hour,
        minute,
        second,
        is_utc,
    })
}

/// Parses a DATE-TIME value (RFC 5545 §3.3.5).
///
/// Format: YYYYMMDD"T"HHMMSS[Z] (e.g., "19970714T133000Z")
///
/// The `TZID` comes from the property parameter, not the value text; a
/// trailing `Z` and a `TZID` together are contradictory and rejected.
///
/// ## Errors
/// Returns an error if the string is not a valid datetime format.
pub fn parse_datetime(
    s: &str,
    tzid: Option<&str>,
    line: usize,
    col: usize,
) -> ParseResult<DateTime> {
    let t_pos = s
        .find('T')
        .ok_or_else(|| ParseError::new(ParseErrorKind::InvalidDateTime, line, col))?;

    let date = parse_date(&s[..t_pos], line, col)?;
    let time = parse_time(&s[t_pos + 1..], line, col + t_pos + 1)?;

    let form = if time.is_utc {
        if tzid.is_some() {
            return Err(
                ParseError::new(ParseErrorKind::InvalidDateTime, line, col)
                    .with_context("'Z' suffix and TZID parameter are mutually exclusive"),
            );
        }
        DateTimeForm::Utc
    } else if let Some(tz) = tzid {
        DateTimeForm::Zoned {
            tzid: tz.to_string(),
        }
    } else {
        DateTimeForm::Floating
    };

    Ok(DateTime {
        year: date.year,
        month: date.month,
        day: date.day,
        hour: time.hour,
        minute: time.minute,
        second: time.second,
        form,
    })
}

/// Parses a UTC-OFFSET value (RFC 5545 §3.3.14).
///
/// Format: (+|-)HHMM[SS] (e.g., "+0530", "-0800")
///
/// ## Errors
/// Returns an error if the string is not a valid UTC offset format.
pub fn parse_utc_offset(s: &str, line: usize, col: usize) -> ParseResult<UtcOffset> {
    if s.len() < 5 {
        return Err(ParseError::new(ParseErrorKind::InvalidUtcOffset, line, col));
    }

    let sign = match s.chars().next() {
        Some('+') => 1,
        Some('-') => -1,
        _ => return Err(ParseError::new(ParseErrorKind::InvalidUtcOffset, line, col)),
    };

    let hours = s[1..3]
        .parse::<i32>()
        .map_err(|_| ParseError::new(ParseErrorKind::InvalidUtcOffset, line, col))?;
    let minutes = s[3..5]
        .parse::<i32>()
        .map_err(|_| ParseError::new(ParseErrorKind::InvalidUtcOffset, line, col))?;
    let seconds = if s.len() >= 7 {
        s[5..7]
            .parse::<i32>()
            .map_err(|_| ParseError::new(ParseErrorKind::InvalidUtcOffset, line, col))?
    } else {
        0
    };

    Ok(UtcOffset::from_seconds(
        sign * (hours * 3600 + minutes * 60 + seconds),
    ))
}

/// Parses a DURATION value (RFC 5545 §3.3.6).
///
/// Format: [+|-]P[nW] or [+|-]P[nD][T[nH][nM][nS]]
///
/// ## Errors
/// Returns an error if the string is not a valid duration format.
pub fn parse_duration(s: &str, line: usize, col: usize) -> ParseResult<Duration> {
    let err = || ParseError::new(ParseErrorKind::InvalidDuration, line, col);

    let mut rest = s;
    let mut dur = Duration::zero();
    if let Some(stripped) = rest.strip_prefix('-') {
        dur.negative = true;
        rest = stripped;
    } else if let Some(stripped) = rest.strip_prefix('+') {
        rest = stripped;
    }

    rest = rest.strip_prefix('P').ok_or_else(err)?;
    if rest.is_empty() {
        return Err(err());
    }

    let mut in_time = false;
    let mut num: Option<u32> = None;
    let mut seen_component = false;

    for c in rest.chars() {
        match c {
            '0'..='9' => {
                let digit = u32::from(c as u8 - b'0');
                num = Some(
                    num.unwrap_or(0)
                        .checked_mul(10)
                        .and_then(|n| n.checked_add(digit))
                        .ok_or_else(err)?,
                );
            }
            'T' if !in_time && num.is_none() => in_time = true,
            'W' if !in_time && !seen_component => {
                dur.weeks = num.take().ok_or_else(err)?;
                seen_component = true;
            }
            'D' if !in_time => {
                dur.days = num.take().ok_or_else(err)?;
                seen_component = true;
            }
            'H' if in_time => {
                dur.hours = num.take().ok_or_else(err)?;
                seen_component = true;
            }
            'M' if in_time => {
                dur.minutes = num.take().ok_or_else(err)?;
                seen_component = true;
            }
            'S' if in_time => {
                dur.seconds = num.take().ok_or_else(err)?;
                seen_component = true;
            }
            _ => return Err(err()),
        }
    }

    // Trailing digits without a designator, or "P"/"PT" alone
    if num.is_some() || !seen_component {
        return Err(err());
    }

    Ok(dur)
}

/// Parses a PERIOD value (RFC 5545 §3.3.9).
///
/// Format: start"/"end or start"/"duration
///
/// ## Errors
/// Returns an error if the string is not a valid period format.
pub fn parse_period(s: &str, tzid: Option<&str>, line: usize, col: usize) -> ParseResult<Period> {
    let slash_pos = s
        .find('/')
        .ok_or_else(|| ParseError::new(ParseErrorKind::InvalidPeriod, line, col))?;

    let start_str = &s[..slash_pos];
    let end_str = &s[slash_pos + 1..];

    let start = parse_datetime(start_str, tzid, line, col)?;

    if end_str.starts_with(['P', '+', '-']) {
        let duration = parse_duration(end_str, line, col + slash_pos + 1)?;
        Ok(Period::Duration { start, duration })
    } else {
        let end = parse_datetime(end_str, tzid, line, col + slash_pos + 1)?;
        Ok(Period::Explicit { start, end })
    }
}

/// Parses a RECUR (RRULE) value (RFC 5545 §3.3.10).
///
/// ## Errors
/// Returns an error if the string is not a valid recurrence rule.
pub fn parse_rrule(s: &str, line: usize, col: usize) -> ParseResult<RRule> {
    let mut rrule = RRule::new();

    for part in s.split(';') {
        let eq_pos = part
            .find('=')
            .ok_or_else(|| ParseError::new(ParseErrorKind::InvalidRRule, line, col))?;

        parse_rrule_part(&mut rrule, &part[..eq_pos], &part[eq_pos + 1..], line, col)?;
    }

    Ok(rrule)
}

/// Parses a single RRULE key-value pair.
fn parse_rrule_part(
    rrule: &mut RRule,
    key: &str,
    value: &str,
    line: usize,
    col: usize,
) -> ParseResult<()> {
    match key.to_ascii_uppercase().as_str() {
        "FREQ" => {
            rrule.freq = Some(
                Frequency::parse(value)
                    .ok_or_else(|| ParseError::new(ParseErrorKind::InvalidFrequency, line, col))?,
            );
        }
        "INTERVAL" => {
            let interval: u32 = value
                .parse()
                .map_err(|_| ParseError::new(ParseErrorKind::InvalidRRule, line, col))?;
            if interval == 0 {
                return Err(ParseError::new(ParseErrorKind::InvalidRRule, line, col)
                    .with_context("INTERVAL must be at least 1"));
            }
            rrule.interval = Some(interval);
        }
        "COUNT" => {
            if rrule.until.is_some() {
                return Err(ParseError::new(
                    ParseErrorKind::UntilCountConflict,
                    line,
                    col,
                ));
            }
            rrule.count = Some(
                value
                    .parse()
                    .map_err(|_| ParseError::new(ParseErrorKind::InvalidRRule, line, col))?,
            );
        }
        "UNTIL" => {
            if rrule.count.is_some() {
                return Err(ParseError::new(
                    ParseErrorKind::UntilCountConflict,
                    line,
                    col,
                ));
            }
            // UNTIL can be DATE or DATE-TIME
            rrule.until = Some(if value.contains('T') {
                RRuleUntil::DateTime(parse_datetime(value, None, line, col)?)
            } else {
                RRuleUntil::Date(parse_date(value, line, col)?)
            });
        }
        "WKST" => {
            rrule.wkst = Some(
                Weekday::parse(value)
                    .ok_or_else(|| ParseError::new(ParseErrorKind::InvalidWeekday, line, col))?,
            );
        }
        "BYSECOND" => rrule.by_second = parse_number_list(value, line, col)?,
        "BYMINUTE" => rrule.by_minute = parse_number_list(value, line, col)?,
        "BYHOUR" => rrule.by_hour = parse_number_list(value, line, col)?,
        "BYDAY" => rrule.by_day = parse_byday(value, line, col)?,
        "BYMONTHDAY" => rrule.by_monthday = parse_number_list(value, line, col)?,
        "BYYEARDAY" => rrule.by_yearday = parse_number_list(value, line, col)?,
        "BYWEEKNO" => rrule.by_weekno = parse_number_list(value, line, col)?,
        "BYMONTH" => rrule.by_month = parse_number_list(value, line, col)?,
        "BYSETPOS" => rrule.by_setpos = parse_number_list(value, line, col)?,
        _ => {} // Unknown rule part - ignore
    }
    Ok(())
}

/// Parses a comma-separated list of numbers.
fn parse_number_list<T: std::str::FromStr>(
    s: &str,
    line: usize,
    col: usize,
) -> ParseResult<Vec<T>> {
    s.split(',')
        .map(|v| {
            v.trim()
                .parse()
                .map_err(|_| ParseError::new(ParseErrorKind::InvalidRRule, line, col))
        })
        .collect()
}

/// Parses a BYDAY value (weekdays with optional ordinals).
fn parse_byday(s: &str, line: usize, col: usize) -> ParseResult<Vec<WeekdayNum>> {
    s.split(',')
        .map(|v| parse_weekday_num(v.trim(), line, col))
        .collect()
}

/// Parses a single weekday with optional ordinal (e.g., "MO", "1MO", "-1FR").
fn parse_weekday_num(s: &str, line: usize, col: usize) -> ParseResult<WeekdayNum> {
    if s.len() < 2 {
        return Err(ParseError::new(ParseErrorKind::InvalidWeekday, line, col));
    }

    let weekday_str = &s[s.len() - 2..];
    let ordinal_str = &s[..s.len() - 2];

    let weekday = Weekday::parse(weekday_str)
        .ok_or_else(|| ParseError::new(ParseErrorKind::InvalidWeekday, line, col))?;

    let ordinal = if ordinal_str.is_empty() {
        None
    } else {
        Some(
            ordinal_str
                .parse()
                .map_err(|_| ParseError::new(ParseErrorKind::InvalidRRule, line, col))?,
        )
    };

    Ok(WeekdayNum { ordinal, weekday })
}

/// Unescapes text values (RFC 5545 §3.3.11).
///
/// Escape sequences: \\ \, \; \n \N
#[must_use]
pub fn unescape_text(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars();

    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n' | 'N') => result.push('\n'),
                Some(',') => result.push(','),
                Some(';') => result.push(';'),
                Some('\\') | None => result.push('\\'),
                Some(other) => {
                    // Invalid escape, preserve as-is
                    result.push('\\');
                    result.push(other);
                }
            }
        } else {
            result.push(c);
        }
    }

    result
}

/// Splits a TEXT list on unescaped commas, unescaping each element.
///
/// Empty elements are dropped; `A\,B,C` yields `["A,B", "C"]`.
#[must_use]
pub fn parse_text_list(raw: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                current.push('\\');
                if let Some(next) = chars.next() {
                    current.push(next);
                }
            }
            ',' => parts.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    parts.push(current);
    parts
        .into_iter()
        .filter(|p| !p.is_empty())
        .map(|p| unescape_text(&p))
        .collect()
}

/// Strict variant of [`unescape_text`]: an invalid escape is an error.
pub fn unescape_text_strict(s: &str, line: usize, col: usize) -> ParseResult<String> {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars();

    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n' | 'N') => result.push('\n'),
                Some(',') => result.push(','),
                Some(';') => result.push(';'),
                Some('\\') => result.push('\\'),
                _ => {
                    return Err(ParseError::new(ParseErrorKind::InvalidEscape, line, col));
                }
            }
        } else {
            result.push(c);
        }
    }

    Ok(result)
}

/// Parses a BOOLEAN value (RFC 5545 §3.3.2).
///
/// ## Errors
/// Returns an error if the string is not "TRUE" or "FALSE".
pub fn parse_boolean(s: &str, line: usize, col: usize) -> ParseResult<bool> {
    match s.to_ascii_uppercase().as_str() {
        "TRUE" => Ok(true),
        "FALSE" => Ok(false),
        _ => Err(ParseError::new(ParseErrorKind::InvalidBoolean, line, col)),
    }
}

/// Parses an INTEGER value (RFC 5545 §3.3.8).
///
/// ## Errors
/// Returns an error if the string is not a valid integer.
pub fn parse_integer(s: &str, line: usize, col: usize) -> ParseResult<i32> {
    s.parse()
        .map_err(|_| ParseError::new(ParseErrorKind::InvalidInteger, line, col))
}

/// Parses a FLOAT value (RFC 5545 §3.3.7).
///
/// ## Errors
/// Returns an error if the string is not a valid floating-point number.
pub fn parse_float(s: &str, line: usize, col: usize) -> ParseResult<f64> {
    s.parse()
        .map_err(|_| ParseError::new(ParseErrorKind::InvalidFloat, line, col))
}
