//! iCalendar document parser (RFC 5545).
//!
//! Parses complete iCalendar documents into typed structures.

use super::error::{ParseError, ParseErrorKind, ParseResult};
use super::lexer::{parse_content_line, split_lines, split_lines_strict};
use super::values::{
    parse_boolean, parse_date, parse_datetime, parse_duration, parse_float, parse_integer,
    parse_period, parse_rrule, parse_text_list, parse_utc_offset, unescape_text,
    unescape_text_strict,
};
use crate::ical::core::{
    Component, ComponentKind, ContentLine, Date, DateTime, ICalendar, Period, Property, Value,
};

/// Parser behavior switches.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParseOptions {
    /// Reject ill-formed folds, malformed escapes, and unparseable RRULEs
    /// instead of preserving them.
    pub strict: bool,
}

/// Parses an iCalendar document from a string (lenient mode).
///
/// ## Errors
///
/// Returns an error if the input is not valid iCalendar.
pub fn parse(input: &str) -> ParseResult<ICalendar> {
    parse_with_options(input, ParseOptions::default())
}

/// Parses an iCalendar document with explicit options.
///
/// The document must contain a single top-level `VCALENDAR`.
///
/// ## Errors
///
/// Returns an error if the input is not valid iCalendar.
#[tracing::instrument(skip(input), fields(input_len = input.len()))]
pub fn parse_with_options(input: &str, options: ParseOptions) -> ParseResult<ICalendar> {
    let mut roots = parse_all(input, options)?;
    let root = roots
        .drain(..)
        .next()
        .ok_or_else(|| ParseError::new(ParseErrorKind::MissingBegin, 1, 1))?;

    if root.kind != Some(ComponentKind::Calendar) {
        tracing::warn!("Root component is not VCALENDAR");
        return Err(
            ParseError::new(ParseErrorKind::MissingBegin, 1, 1).with_context("expected VCALENDAR")
        );
    }

    Ok(ICalendar { root })
}

/// Parses a stream holding one or more top-level components.
///
/// ## Errors
///
/// Returns an error on nesting violations, properties outside any
/// component, or (strict mode) ill-formed folding.
pub fn parse_all(input: &str, options: ParseOptions) -> ParseResult<Vec<Component>> {
    let lines = if options.strict {
        split_lines_strict(input)?
    } else {
        split_lines(input)
    };

    if lines.is_empty() {
        return Err(ParseError::new(ParseErrorKind::MissingBegin, 1, 1));
    }

    tracing::trace!(count = lines.len(), "Split content lines");

    let content_lines: Vec<(usize, ContentLine)> = lines
        .into_iter()
        .map(|(line_num, line)| parse_content_line(&line, line_num).map(|cl| (line_num, cl)))
        .collect::<ParseResult<_>>()?;

    let mut iter = content_lines.into_iter().peekable();
    let mut roots = Vec::new();

    while let Some((line_num, content_line)) = iter.next() {
        if content_line.name != "BEGIN" {
            return Err(ParseError::new(
                ParseErrorKind::PropertyOutsideComponent,
                line_num,
                1,
            )
            .with_context(format!("property {} outside any component", content_line.name)));
        }
        let name = content_line.raw_value.to_ascii_uppercase();
        roots.push(parse_component_body(&mut iter, line_num, &name, options)?);
    }

    tracing::debug!(roots = roots.len(), "Parsed iCalendar stream");

    Ok(roots)
}

/// Parses a component's body given that its BEGIN line was consumed.
fn parse_component_body(
    iter: &mut std::iter::Peekable<impl Iterator<Item = (usize, ContentLine)>>,
    begin_line_num: usize,
    component_name: &str,
    options: ParseOptions,
) -> ParseResult<Component> {
    let mut component = Component {
        kind: Some(ComponentKind::parse(component_name)),
        name: component_name.to_string(),
        properties: Vec::new(),
        children: Vec::new(),
    };

    let mut last_line_num = begin_line_num;

    loop {
        let Some((line_num, content_line)) = iter.next() else {
            return Err(
                ParseError::new(ParseErrorKind::MissingEnd, last_line_num, 1)
                    .with_context(format!("missing END:{component_name}")),
            );
        };
        last_line_num = line_num;

        match content_line.name.as_str() {
            "BEGIN" => {
                let nested_name = content_line.raw_value.to_ascii_uppercase();
                let nested = parse_component_body(iter, line_num, &nested_name, options)?;
                component.children.push(nested);
            }
            "END" => {
                let end_name = content_line.raw_value.to_ascii_uppercase();
                if end_name != component_name {
                    return Err(
                        ParseError::new(ParseErrorKind::MismatchedComponent, line_num, 1)
                            .with_context(format!(
                                "expected END:{component_name}, got END:{end_name}"
                            )),
                    );
                }
                break;
            }
            _ => {
                let property = parse_property(content_line, line_num, options)?;
                component.properties.push(property);
            }
        }
    }

    Ok(component)
}

/// Parses a property from a content line, resolving the value type.
fn parse_property(cl: ContentLine, line_num: usize, options: ParseOptions) -> ParseResult<Property> {
    let value_type = determine_value_type(&cl);
    let tzid = cl.tzid().map(str::to_string);

    let parsed_value = parse_value(&cl.raw_value, value_type, tzid.as_deref(), line_num, options)?;

    Ok(Property {
        name: cl.name,
        params: cl.params,
        value: parsed_value,
        raw_value: cl.raw_value,
    })
}

/// Determines the value type for a property.
fn determine_value_type(cl: &ContentLine) -> ValueType {
    // Check explicit VALUE parameter first
    if let Some(value_type) = cl.value_type() {
        return ValueType::from_param(value_type);
    }

    // Use property-specific defaults
    match cl.name.as_str() {
        // Date-time properties
        "DTSTART" | "DTEND" | "DTSTAMP" | "CREATED" | "LAST-MODIFIED" | "COMPLETED" | "DUE"
        | "RECURRENCE-ID" => ValueType::DateTime,

        // EXDATE/RDATE default to date-time; sniff dates and periods
        "EXDATE" | "RDATE" => {
            if cl.raw_value.contains('/') {
                ValueType::Period
            } else if !cl.raw_value.contains('T') {
                ValueType::Date
            } else {
                ValueType::DateTime
            }
        }

        // Duration-or-datetime properties
        "DURATION" | "TRIGGER" => {
            if cl.raw_value.starts_with(['P', '-', '+']) {
                ValueType::Duration
            } else {
                ValueType::DateTime
            }
        }

        "PERCENT-COMPLETE" | "PRIORITY" | "REPEAT" | "SEQUENCE" => ValueType::Integer,

        "RSVP" => ValueType::Boolean,

        "RRULE" | "EXRULE" => ValueType::Recur,

        "TZOFFSETFROM" | "TZOFFSETTO" => ValueType::UtcOffset,

        "URL" | "TZURL" | "SOURCE" => ValueType::Uri,

        "FREEBUSY" => ValueType::Period,

        "ATTENDEE" | "ORGANIZER" => ValueType::CalAddress,

        // Comma-separated text lists
        "CATEGORIES" | "RESOURCES" => ValueType::TextList,

        // Default to text
        _ => ValueType::Text,
    }
}

/// Internal enum for value type handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ValueType {
    Binary,
    Boolean,
    CalAddress,
    Date,
    DateTime,
    Duration,
    Float,
    Integer,
    Period,
    Recur,
    Text,
    TextList,
    Time,
    Uri,
    UtcOffset,
    Unknown,
}

impl ValueType {
    fn from_param(s: &str) -> Self {
        match s.to_ascii_uppercase().as_str() {
            "BINARY" => Self::Binary,
            "BOOLEAN" => Self::Boolean,
            "CAL-ADDRESS" => Self::CalAddress,
            "DATE" => Self::Date,
            "DATE-TIME" => Self::DateTime,
            "DURATION" => Self::Duration,
            "FLOAT" => Self::Float,
            "INTEGER" => Self::Integer,
            "PERIOD" => Self::Period,
            "RECUR" => Self::Recur,
            "TEXT" => Self::Text,
            "TIME" => Self::Time,
            "URI" => Self::Uri,
            "UTC-OFFSET" => Self::UtcOffset,
            _ => Self::Unknown,
        }
    }
}

/// Parses a raw value string into a typed Value.
fn parse_value(
    raw: &str,
    value_type: ValueType,
    tzid: Option<&str>,
    line_num: usize,
    options: ParseOptions,
) -> ParseResult<Value> {
    match value_type {
        ValueType::Text => {
            if options.strict {
                Ok(Value::Text(unescape_text_strict(raw, line_num, 1)?))
            } else {
                Ok(Value::Text(unescape_text(raw)))
            }
        }
        ValueType::TextList => {
            if options.strict {
                unescape_text_strict(raw, line_num, 1)?;
            }
            Ok(Value::TextList(parse_text_list(raw)))
        }
        ValueType::DateTime => {
            // Handle comma-separated list (EXDATE, RDATE)
            if raw.contains(',') {
                let dts: Vec<DateTime> = raw
                    .split(',')
                    .map(|s| parse_datetime(s.trim(), tzid, line_num, 1))
                    .collect::<ParseResult<_>>()?;
                Ok(Value::DateTimeList(dts))
            } else {
                Ok(Value::DateTime(parse_datetime(raw, tzid, line_num, 1)?))
            }
        }
        ValueType::Date => {
            if raw.contains(',') {
                let dates: Vec<Date> = raw
                    .split(',')
                    .map(|s| parse_date(s.trim(), line_num, 1))
                    .collect::<ParseResult<_>>()?;
                Ok(Value::DateList(dates))
            } else {
                Ok(Value::Date(parse_date(raw, line_num, 1)?))
            }
        }
        ValueType::Duration => Ok(Value::Duration(parse_duration(raw, line_num, 1)?)),
        ValueType::Period => {
            // Handle comma-separated periods (FREEBUSY)
            if raw.contains(',') {
                let periods: Vec<Period> = raw
                    .split(',')
                    .map(|s| parse_period(s.trim(), tzid, line_num, 1))
                    .collect::<ParseResult<_>>()?;
                Ok(Value::PeriodList(periods))
            } else {
                Ok(Value::Period(parse_period(raw, tzid, line_num, 1)?))
            }
        }
        ValueType::Integer => Ok(Value::Integer(parse_integer(raw, line_num, 1)?)),
        ValueType::Float => Ok(Value::Float(parse_float(raw, line_num, 1)?)),
        ValueType::Boolean => Ok(Value::Boolean(parse_boolean(raw, line_num, 1)?)),
        ValueType::Recur => match parse_rrule(raw, line_num, 1) {
            Ok(rrule) => Ok(Value::Recur(Box::new(rrule))),
            // Lenient mode preserves an unparseable rule verbatim so it
            // survives a round-trip.
            Err(err) => {
                if options.strict {
                    Err(err)
                } else {
                    tracing::debug!(%err, "Preserving unparseable RRULE verbatim");
                    Ok(Value::Unknown(raw.to_string()))
                }
            }
        },
        ValueType::UtcOffset => Ok(Value::UtcOffset(parse_utc_offset(raw, line_num, 1)?)),
        ValueType::Uri | ValueType::CalAddress => Ok(Value::Uri(raw.to_string())),
        ValueType::Binary => {
            // RFC 5545 §3.3.1: Base64 decode
            use base64::{Engine, engine::general_purpose::STANDARD};
            let decoded = STANDARD.decode(raw).map_err(|e| {
                ParseError::new(ParseErrorKind::InvalidValue, line_num, 1)
                    .with_context(format!("invalid Base64 encoding: {e}"))
            })?;
            Ok(Value::Binary(decoded))
        }
        ValueType::Time => {
            let time = super::values::parse_time(raw, line_num, 1)?;
            Ok(Value::Time(time))
        }
        ValueType::Unknown => Ok(Value::Unknown(raw.to_string())),
    }
}
