//! Typed decoding and encoding between the component tree and the domain.
//!
//! Decoding lifts the properties the core manipulates into typed fields
//! and carries everything else (unknown properties, VALARMs, X-components)
//! verbatim. The original property order of each item is recorded so
//! re-encoding replays it; programmatically built items encode in a
//! canonical order instead.

use std::collections::HashSet;

use koyomi_core::CalendarConfig;
use koyomi_rfc::ical::build::{escape_text, serialize};
use koyomi_rfc::ical::core::{
    Component, ComponentKind, DateTime, ICalendar, Parameter, Property, Value,
};
use koyomi_rfc::ical::parse::{ParseOptions, parse_with_options};

use crate::caldatetime::CalDateTime;
use crate::calendar::Calendar;
use crate::error::{CalError, CalResult, DecodeError};
use crate::event::{Event, RelatedTo, RelationshipType};
use crate::todo::Todo;

/// Decodes an iCalendar document with default (lenient) options.
///
/// ## Errors
///
/// Fails on syntactic errors; see [`decode_calendar_with`].
pub fn decode_calendar(text: &str) -> CalResult<Calendar> {
    decode_calendar_with(text, &CalendarConfig::default())
}

/// Decodes an iCalendar document.
///
/// Lenient mode (the default) preserves unknown-but-well-formed content
/// and only hard syntactic errors fail; strict mode additionally rejects
/// ill-formed folding, malformed escapes, unknown frequencies, and
/// structural invariant violations.
///
/// ## Errors
///
/// Returns the first parse, decode, or (strict mode) validation error.
pub fn decode_calendar_with(text: &str, config: &CalendarConfig) -> CalResult<Calendar> {
    let parsed = parse_with_options(
        text,
        ParseOptions {
            strict: config.strict_rfc5545,
        },
    )?;

    let mut calendar = Calendar::new();
    calendar.prodid.clear();
    calendar.version.clear();

    for prop in &parsed.root.properties {
        match prop.name.as_str() {
            "PRODID" => calendar.prodid = text_value(prop)?,
            "VERSION" => calendar.version = text_value(prop)?,
            _ => calendar.extra_props.push(prop.clone()),
        }
    }
    if calendar.version.is_empty() {
        calendar.version = "2.0".to_string();
    }

    for child in &parsed.root.children {
        match child.kind {
            Some(ComponentKind::Event) => {
                calendar.events.push(decode_event(child, config)?);
            }
            Some(ComponentKind::Todo) => {
                calendar.todos.push(decode_todo(child, config)?);
            }
            Some(ComponentKind::Journal) => calendar.journals.push(child.clone()),
            Some(ComponentKind::FreeBusy) => calendar.freebusy.push(child.clone()),
            Some(ComponentKind::Timezone) => calendar.timezones.push(child.clone()),
            _ => calendar.extra_components.push(child.clone()),
        }
    }

    tracing::debug!(
        events = calendar.events.len(),
        todos = calendar.todos.len(),
        "Decoded calendar"
    );
    Ok(calendar)
}

/// Encodes a calendar back to iCalendar text (CRLF, folded at 75 octets).
#[must_use]
pub fn encode_calendar(calendar: &Calendar) -> String {
    let mut root = Component::new(ComponentKind::Calendar);
    root.add_property(Property::text("VERSION", calendar.version.clone()));
    root.add_property(Property::text("PRODID", calendar.prodid.clone()));
    for prop in &calendar.extra_props {
        root.add_property(prop.clone());
    }

    for tz in &calendar.timezones {
        root.add_child(tz.clone());
    }
    for event in &calendar.events {
        root.add_child(encode_event(event));
    }
    for todo in &calendar.todos {
        root.add_child(encode_todo(todo));
    }
    for journal in &calendar.journals {
        root.add_child(journal.clone());
    }
    for freebusy in &calendar.freebusy {
        root.add_child(freebusy.clone());
    }
    for extra in &calendar.extra_components {
        root.add_child(extra.clone());
    }

    serialize(&ICalendar { root })
}

// ---- event ----

fn decode_event(component: &Component, config: &CalendarConfig) -> CalResult<Event> {
    let mut uid = None;
    let mut dtstamp = None;
    let mut dtstart = None;
    let mut order: Vec<String> = Vec::new();

    let mut collected = Event::new(CalDateTime::Date(koyomi_rfc::ical::core::Date::new(
        1970, 1, 1,
    )));

    for prop in &component.properties {
        order.push(prop.name.clone());
        match prop.name.as_str() {
            "UID" => uid = Some(text_value(prop)?),
            "DTSTAMP" => dtstamp = Some(utc_stamp(prop)?),
            "DTSTART" => dtstart = Some(date_or_datetime(prop)?),
            "DTEND" => collected.dtend = Some(date_or_datetime(prop)?),
            "DURATION" => collected.duration = Some(duration_value(prop)?),
            "SUMMARY" => collected.summary = Some(text_value(prop)?),
            "DESCRIPTION" => collected.description = Some(text_value(prop)?),
            "LOCATION" => collected.location = Some(text_value(prop)?),
            "STATUS" => collected.status = Some(text_value(prop)?),
            "SEQUENCE" => collected.sequence = Some(integer_value(prop)?),
            "CREATED" => collected.created = Some(utc_stamp(prop)?),
            "LAST-MODIFIED" => collected.last_modified = Some(utc_stamp(prop)?),
            "RRULE" => match &prop.value {
                Value::Recur(rule) => collected.rrule = Some((**rule).clone()),
                // An unparseable rule survives lenient decode verbatim.
                Value::Unknown(raw) | Value::Text(raw) => {
                    collected.undecoded_rrule = Some(raw.clone());
                }
                _ => {
                    return Err(type_mismatch(prop, "RECUR").into());
                }
            },
            "RDATE" => collected.rdate.extend(date_list(prop)?),
            "EXDATE" => collected.exdate.extend(date_list(prop)?),
            "RECURRENCE-ID" => collected.recurrence_id = Some(date_or_datetime(prop)?),
            "RELATED-TO" => collected.related_to.push(related_to(prop)?),
            "CATEGORIES" => collected.categories.extend(text_list_value(prop)),
            _ => collected.extra.push(prop.clone()),
        }
    }

    let mut event = collected;
    event.uid = uid.ok_or(DecodeError::MissingProperty("UID"))?;
    event.dtstamp = dtstamp.ok_or(DecodeError::MissingProperty("DTSTAMP"))?;
    event.dtstart = dtstart.ok_or(DecodeError::MissingProperty("DTSTART"))?;
    event.children = component.children.clone();
    event.property_order = order;

    if config.strict_rfc5545 {
        event.validate().map_err(CalError::from)?;
    }
    Ok(event)
}

fn encode_event(event: &Event) -> Component {
    let mut groups: Vec<(String, Vec<Property>)> = Vec::new();
    let mut push = |name: &str, props: Vec<Property>| {
        if !props.is_empty() {
            groups.push((name.to_string(), props));
        }
    };

    push("UID", vec![Property::text("UID", event.uid.clone())]);
    push("DTSTAMP", vec![Property::datetime("DTSTAMP", event.dtstamp.clone())]);
    push("DTSTART", vec![caldatetime_property("DTSTART", &event.dtstart)]);
    push(
        "DTEND",
        event
            .dtend
            .as_ref()
            .map(|v| vec![caldatetime_property("DTEND", v)])
            .unwrap_or_default(),
    );
    push(
        "DURATION",
        event
            .duration
            .map(|d| vec![Property::duration("DURATION", d)])
            .unwrap_or_default(),
    );
    push("SUMMARY", optional_text("SUMMARY", event.summary.as_deref()));
    push(
        "DESCRIPTION",
        optional_text("DESCRIPTION", event.description.as_deref()),
    );
    push("LOCATION", optional_text("LOCATION", event.location.as_deref()));
    push("STATUS", optional_text("STATUS", event.status.as_deref()));
    push(
        "SEQUENCE",
        event
            .sequence
            .map(|s| vec![Property::integer("SEQUENCE", s)])
            .unwrap_or_default(),
    );
    push(
        "CREATED",
        event
            .created
            .as_ref()
            .map(|dt| vec![Property::datetime("CREATED", dt.clone())])
            .unwrap_or_default(),
    );
    push(
        "LAST-MODIFIED",
        event
            .last_modified
            .as_ref()
            .map(|dt| vec![Property::datetime("LAST-MODIFIED", dt.clone())])
            .unwrap_or_default(),
    );
    push("RRULE", rrule_properties(event));
    push(
        "RDATE",
        date_list_property("RDATE", &event.rdate)
            .map(|p| vec![p])
            .unwrap_or_default(),
    );
    push(
        "EXDATE",
        date_list_property("EXDATE", &event.exdate)
            .map(|p| vec![p])
            .unwrap_or_default(),
    );
    push(
        "RECURRENCE-ID",
        event
            .recurrence_id
            .as_ref()
            .map(|v| vec![caldatetime_property("RECURRENCE-ID", v)])
            .unwrap_or_default(),
    );
    push(
        "RELATED-TO",
        event.related_to.iter().map(related_to_property).collect(),
    );
    push("CATEGORIES", categories_property(&event.categories));

    for prop in &event.extra {
        if let Some(group) = groups.iter_mut().find(|(name, _)| *name == prop.name) {
            group.1.push(prop.clone());
        } else {
            groups.push((prop.name.clone(), vec![prop.clone()]));
        }
    }

    let mut component = Component::event();
    emit_ordered(&mut component, groups, &event.property_order);
    for child in &event.children {
        component.add_child(child.clone());
    }
    component
}

// ---- todo ----

fn decode_todo(component: &Component, config: &CalendarConfig) -> CalResult<Todo> {
    let mut uid = None;
    let mut dtstamp = None;
    let mut todo = Todo::new();
    let mut order: Vec<String> = Vec::new();

    for prop in &component.properties {
        order.push(prop.name.clone());
        match prop.name.as_str() {
            "UID" => uid = Some(text_value(prop)?),
            "DTSTAMP" => dtstamp = Some(utc_stamp(prop)?),
            "DTSTART" => todo.dtstart = Some(date_or_datetime(prop)?),
            "DUE" => todo.due = Some(date_or_datetime(prop)?),
            "DURATION" => todo.duration = Some(duration_value(prop)?),
            "SUMMARY" => todo.summary = Some(text_value(prop)?),
            "DESCRIPTION" => todo.description = Some(text_value(prop)?),
            "LOCATION" => todo.location = Some(text_value(prop)?),
            "STATUS" => todo.status = Some(text_value(prop)?),
            "PERCENT-COMPLETE" => todo.percent_complete = Some(integer_value(prop)?),
            "PRIORITY" => todo.priority = Some(integer_value(prop)?),
            "SEQUENCE" => todo.sequence = Some(integer_value(prop)?),
            "CREATED" => todo.created = Some(utc_stamp(prop)?),
            "LAST-MODIFIED" => todo.last_modified = Some(utc_stamp(prop)?),
            "RRULE" => {
                if let Value::Recur(rule) = &prop.value {
                    todo.rrule = Some((**rule).clone());
                } else {
                    todo.extra.push(prop.clone());
                }
            }
            "RDATE" => todo.rdate.extend(date_list(prop)?),
            "EXDATE" => todo.exdate.extend(date_list(prop)?),
            "RECURRENCE-ID" => todo.recurrence_id = Some(date_or_datetime(prop)?),
            "RELATED-TO" => todo.related_to.push(related_to(prop)?),
            "CATEGORIES" => todo.categories.extend(text_list_value(prop)),
            _ => todo.extra.push(prop.clone()),
        }
    }

    todo.uid = uid.ok_or(DecodeError::MissingProperty("UID"))?;
    todo.dtstamp = dtstamp.ok_or(DecodeError::MissingProperty("DTSTAMP"))?;
    todo.children = component.children.clone();
    todo.property_order = order;

    if config.strict_rfc5545 {
        todo.validate().map_err(CalError::from)?;
    }
    Ok(todo)
}

fn encode_todo(todo: &Todo) -> Component {
    let mut groups: Vec<(String, Vec<Property>)> = Vec::new();
    let mut push = |name: &str, props: Vec<Property>| {
        if !props.is_empty() {
            groups.push((name.to_string(), props));
        }
    };

    push("UID", vec![Property::text("UID", todo.uid.clone())]);
    push("DTSTAMP", vec![Property::datetime("DTSTAMP", todo.dtstamp.clone())]);
    push(
        "DTSTART",
        todo.dtstart
            .as_ref()
            .map(|v| vec![caldatetime_property("DTSTART", v)])
            .unwrap_or_default(),
    );
    push(
        "DUE",
        todo.due
            .as_ref()
            .map(|v| vec![caldatetime_property("DUE", v)])
            .unwrap_or_default(),
    );
    push(
        "DURATION",
        todo.duration
            .map(|d| vec![Property::duration("DURATION", d)])
            .unwrap_or_default(),
    );
    push("SUMMARY", optional_text("SUMMARY", todo.summary.as_deref()));
    push(
        "DESCRIPTION",
        optional_text("DESCRIPTION", todo.description.as_deref()),
    );
    push("LOCATION", optional_text("LOCATION", todo.location.as_deref()));
    push("STATUS", optional_text("STATUS", todo.status.as_deref()));
    push(
        "PERCENT-COMPLETE",
        todo.percent_complete
            .map(|p| vec![Property::integer("PERCENT-COMPLETE", p)])
            .unwrap_or_default(),
    );
    push(
        "PRIORITY",
        todo.priority
            .map(|p| vec![Property::integer("PRIORITY", p)])
            .unwrap_or_default(),
    );
    push(
        "SEQUENCE",
        todo.sequence
            .map(|s| vec![Property::integer("SEQUENCE", s)])
            .unwrap_or_default(),
    );
    push(
        "CREATED",
        todo.created
            .as_ref()
            .map(|dt| vec![Property::datetime("CREATED", dt.clone())])
            .unwrap_or_default(),
    );
    push(
        "LAST-MODIFIED",
        todo.last_modified
            .as_ref()
            .map(|dt| vec![Property::datetime("LAST-MODIFIED", dt.clone())])
            .unwrap_or_default(),
    );
    push(
        "RRULE",
        todo.rrule
            .as_ref()
            .map(|r| vec![Property::recur("RRULE", r.clone())])
            .unwrap_or_default(),
    );
    push(
        "RDATE",
        date_list_property("RDATE", &todo.rdate)
            .map(|p| vec![p])
            .unwrap_or_default(),
    );
    push(
        "EXDATE",
        date_list_property("EXDATE", &todo.exdate)
            .map(|p| vec![p])
            .unwrap_or_default(),
    );
    push(
        "RECURRENCE-ID",
        todo.recurrence_id
            .as_ref()
            .map(|v| vec![caldatetime_property("RECURRENCE-ID", v)])
            .unwrap_or_default(),
    );
    push(
        "RELATED-TO",
        todo.related_to.iter().map(related_to_property).collect(),
    );
    push("CATEGORIES", categories_property(&todo.categories));

    for prop in &todo.extra {
        if let Some(group) = groups.iter_mut().find(|(name, _)| *name == prop.name) {
            group.1.push(prop.clone());
        } else {
            groups.push((prop.name.clone(), vec![prop.clone()]));
        }
    }

    let mut component = Component::todo();
    emit_ordered(&mut component, groups, &todo.property_order);
    for child in &todo.children {
        component.add_child(child.clone());
    }
    component
}

// ---- shared helpers ----

/// Emits property groups replaying the recorded order first, then any
/// remaining groups in canonical order.
fn emit_ordered(
    component: &mut Component,
    groups: Vec<(String, Vec<Property>)>,
    order: &[String],
) {
    let mut emitted: HashSet<&str> = HashSet::new();
    for name in order {
        if emitted.contains(name.as_str()) {
            continue;
        }
        if let Some((group_name, props)) = groups.iter().find(|(n, _)| n == name) {
            for prop in props {
                component.add_property(prop.clone());
            }
            emitted.insert(group_name.as_str());
        }
    }
    for (name, props) in &groups {
        if emitted.contains(name.as_str()) {
            continue;
        }
        for prop in props {
            component.add_property(prop.clone());
        }
    }
}

fn type_mismatch(prop: &Property, expected: &'static str) -> DecodeError {
    DecodeError::TypeMismatch {
        property: prop.name.clone(),
        expected,
    }
}

fn text_value(prop: &Property) -> Result<String, DecodeError> {
    match &prop.value {
        Value::Text(s) | Value::Unknown(s) | Value::Uri(s) => Ok(s.clone()),
        _ => Err(type_mismatch(prop, "TEXT")),
    }
}

fn integer_value(prop: &Property) -> Result<i32, DecodeError> {
    prop.as_integer().ok_or_else(|| type_mismatch(prop, "INTEGER"))
}

fn duration_value(prop: &Property) -> Result<koyomi_rfc::ical::core::Duration, DecodeError> {
    prop.as_duration()
        .copied()
        .ok_or_else(|| type_mismatch(prop, "DURATION"))
}

/// `DTSTAMP`/`CREATED`/`LAST-MODIFIED`: a UTC date-time, `TZID` forbidden.
fn utc_stamp(prop: &Property) -> Result<DateTime, DecodeError> {
    if prop.get_param("TZID").is_some() {
        return Err(DecodeError::TzidNotAllowed {
            property: prop.name.clone(),
        });
    }
    let dt = prop
        .as_datetime()
        .ok_or_else(|| type_mismatch(prop, "DATE-TIME"))?;
    check_calendar_date(dt.year, dt.month, dt.day, prop)?;
    Ok(dt.clone())
}

fn date_or_datetime(prop: &Property) -> Result<CalDateTime, DecodeError> {
    match &prop.value {
        Value::Date(d) => {
            if prop
                .get_param_value("VALUE")
                .is_some_and(|v| !v.eq_ignore_ascii_case("DATE"))
            {
                return Err(DecodeError::ValueParamConflict {
                    property: prop.name.clone(),
                });
            }
            check_calendar_date(d.year, d.month, d.day, prop)?;
            Ok(CalDateTime::Date(*d))
        }
        Value::DateTime(dt) => {
            if prop
                .get_param_value("VALUE")
                .is_some_and(|v| v.eq_ignore_ascii_case("DATE"))
            {
                return Err(DecodeError::ValueParamConflict {
                    property: prop.name.clone(),
                });
            }
            check_calendar_date(dt.year, dt.month, dt.day, prop)?;
            Ok(CalDateTime::DateTime(dt.clone()))
        }
        _ => Err(type_mismatch(prop, "DATE or DATE-TIME")),
    }
}

/// `EXDATE`/`RDATE`: one or more dates, date-times, or periods (a period
/// contributes its start).
fn date_list(prop: &Property) -> Result<Vec<CalDateTime>, DecodeError> {
    match &prop.value {
        Value::Date(d) => Ok(vec![CalDateTime::Date(*d)]),
        Value::DateList(list) => Ok(list.iter().map(|d| CalDateTime::Date(*d)).collect()),
        Value::DateTime(dt) => Ok(vec![CalDateTime::DateTime(dt.clone())]),
        Value::DateTimeList(list) => Ok(list
            .iter()
            .map(|dt| CalDateTime::DateTime(dt.clone()))
            .collect()),
        Value::Period(period) => Ok(vec![CalDateTime::DateTime(period.start().clone())]),
        Value::PeriodList(list) => Ok(list
            .iter()
            .map(|p| CalDateTime::DateTime(p.start().clone()))
            .collect()),
        _ => Err(type_mismatch(prop, "DATE or DATE-TIME")),
    }
}

fn related_to(prop: &Property) -> Result<RelatedTo, DecodeError> {
    let uid = text_value(prop)?;
    let reltype = match prop.get_param_value("RELTYPE") {
        // Unknown relationship types are preserved as-is elsewhere; the
        // typed field only tracks the three RFC 5545 values.
        Some(value) => RelationshipType::parse(value).unwrap_or(RelationshipType::Parent),
        None => RelationshipType::Parent,
    };
    Ok(RelatedTo { uid, reltype })
}

fn check_calendar_date(
    year: u16,
    month: u8,
    day: u8,
    prop: &Property,
) -> Result<(), DecodeError> {
    chrono::NaiveDate::from_ymd_opt(i32::from(year), u32::from(month), u32::from(day))
        .map(|_| ())
        .ok_or_else(|| DecodeError::InvalidDate {
            property: prop.name.clone(),
        })
}

fn text_list_value(prop: &Property) -> Vec<String> {
    match &prop.value {
        Value::TextList(list) => list.clone(),
        Value::Text(s) | Value::Unknown(s) => vec![s.clone()],
        _ => vec![prop.raw_value.clone()],
    }
}

fn optional_text(name: &str, value: Option<&str>) -> Vec<Property> {
    value.map(|v| vec![Property::text(name, v)]).unwrap_or_default()
}

fn caldatetime_property(name: &str, value: &CalDateTime) -> Property {
    match value {
        CalDateTime::Date(d) => Property::date(name, *d),
        CalDateTime::DateTime(dt) => Property::datetime(name, dt.clone()),
    }
}

fn rrule_properties(event: &Event) -> Vec<Property> {
    if let Some(rule) = &event.rrule {
        return vec![Property::recur("RRULE", rule.clone())];
    }
    if let Some(raw) = &event.undecoded_rrule {
        return vec![Property {
            name: "RRULE".to_string(),
            params: Vec::new(),
            value: Value::Unknown(raw.clone()),
            raw_value: raw.clone(),
        }];
    }
    Vec::new()
}

/// Emits EXDATE/RDATE as one comma-joined line per value-type group.
fn date_list_property(name: &str, entries: &[CalDateTime]) -> Option<Property> {
    let first = entries.first()?;
    if first.is_date() {
        let dates: Vec<_> = entries
            .iter()
            .filter_map(|e| match e {
                CalDateTime::Date(d) => Some(*d),
                CalDateTime::DateTime(_) => None,
            })
            .collect();
        let raw = dates
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",");
        Some(Property {
            name: name.to_string(),
            params: vec![Parameter::value_type("DATE")],
            value: Value::DateList(dates),
            raw_value: raw,
        })
    } else {
        let dts: Vec<DateTime> = entries
            .iter()
            .filter_map(|e| match e {
                CalDateTime::DateTime(dt) => Some(dt.clone()),
                CalDateTime::Date(_) => None,
            })
            .collect();
        let params = match dts.first().and_then(DateTime::tzid) {
            Some(tzid) => vec![Parameter::tzid(tzid)],
            None => Vec::new(),
        };
        let raw = dts
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",");
        Some(Property {
            name: name.to_string(),
            params,
            value: Value::DateTimeList(dts),
            raw_value: raw,
        })
    }
}

fn related_to_property(relation: &RelatedTo) -> Property {
    let mut prop = Property::text("RELATED-TO", relation.uid.clone());
    if relation.reltype != RelationshipType::Parent {
        prop.add_param(Parameter::new("RELTYPE", relation.reltype.as_str()));
    }
    prop
}

fn categories_property(categories: &[String]) -> Vec<Property> {
    if categories.is_empty() {
        return Vec::new();
    }
    let raw = categories
        .iter()
        .map(|c| escape_text(c))
        .collect::<Vec<_>>()
        .join(",");
    vec![Property {
        name: "CATEGORIES".to_string(),
        params: Vec::new(),
        value: Value::TextList(categories.to_vec()),
        raw_value: raw,
    }]
}

#[cfg(test)]
mod tests {
    use super::*;
    use koyomi_rfc::ical::core::DateTime;

    const ANNUAL_REVIEW: &str = "\
BEGIN:VCALENDAR\r\n\
VERSION:2.0\r\n\
PRODID:-//Test//Test//EN\r\n\
BEGIN:VEVENT\r\n\
UID:19970901T130000Z-123401@example.com\r\n\
DTSTAMP:19970901T130000Z\r\n\
DTSTART:19970903T163000Z\r\n\
DTEND:19970903T190000Z\r\n\
SUMMARY:Annual Employee Review\r\n\
CLASS:PRIVATE\r\n\
CATEGORIES:BUSINESS,HUMAN RESOURCES\r\n\
END:VEVENT\r\n\
END:VCALENDAR\r\n";

    #[test]
    fn decode_typed_fields() {
        let calendar = decode_calendar(ANNUAL_REVIEW).unwrap();
        assert_eq!(calendar.prodid, "-//Test//Test//EN");
        assert_eq!(calendar.events.len(), 1);

        let event = &calendar.events[0];
        assert_eq!(event.uid, "19970901T130000Z-123401@example.com");
        assert_eq!(event.summary.as_deref(), Some("Annual Employee Review"));
        assert_eq!(
            event.categories,
            vec!["BUSINESS".to_string(), "HUMAN RESOURCES".to_string()]
        );
        // CLASS is outside the typed catalog and rides along.
        assert_eq!(event.extra.len(), 1);
        assert_eq!(event.extra[0].name, "CLASS");
    }

    #[test]
    fn encode_replays_original_property_order() {
        let calendar = decode_calendar(ANNUAL_REVIEW).unwrap();
        let encoded = encode_calendar(&calendar);
        assert_eq!(encoded, ANNUAL_REVIEW);
    }

    #[test]
    fn encode_uses_canonical_order_for_built_events() {
        let mut calendar = Calendar::new();
        let mut event = Event::new(CalDateTime::DateTime(DateTime::utc(2022, 8, 29, 9, 0, 0)));
        event.uid = "built@example.com".into();
        event.dtstamp = DateTime::utc(2022, 8, 29, 8, 0, 0);
        event.summary = Some("Built".into());
        calendar.events.push(event);

        let encoded = encode_calendar(&calendar);
        let uid_pos = encoded.find("UID:").unwrap();
        let dtstamp_pos = encoded.find("DTSTAMP:").unwrap();
        let dtstart_pos = encoded.find("DTSTART:").unwrap();
        let summary_pos = encoded.find("SUMMARY:").unwrap();
        assert!(uid_pos < dtstamp_pos);
        assert!(dtstamp_pos < dtstart_pos);
        assert!(dtstart_pos < summary_pos);
    }

    #[test]
    fn decode_requires_dtstamp() {
        let input = "\
BEGIN:VCALENDAR\r\n\
VERSION:2.0\r\n\
BEGIN:VEVENT\r\n\
UID:x@example.com\r\n\
DTSTART:20220829T090000\r\n\
END:VEVENT\r\n\
END:VCALENDAR\r\n";
        assert!(matches!(
            decode_calendar(input),
            Err(CalError::Decode(DecodeError::MissingProperty("DTSTAMP")))
        ));
    }

    #[test]
    fn decode_rejects_tzid_on_dtstamp() {
        let input = "\
BEGIN:VCALENDAR\r\n\
VERSION:2.0\r\n\
BEGIN:VEVENT\r\n\
UID:x@example.com\r\n\
DTSTAMP;TZID=America/New_York:20220829T090000\r\n\
DTSTART:20220829T090000\r\n\
END:VEVENT\r\n\
END:VCALENDAR\r\n";
        assert!(matches!(
            decode_calendar(input),
            Err(CalError::Decode(DecodeError::TzidNotAllowed { .. }))
        ));
    }

    #[test]
    fn decode_rejects_invalid_calendar_date() {
        let input = "\
BEGIN:VCALENDAR\r\n\
VERSION:2.0\r\n\
BEGIN:VEVENT\r\n\
UID:x@example.com\r\n\
DTSTAMP:20220829T090000Z\r\n\
DTSTART:20220230T090000\r\n\
END:VEVENT\r\n\
END:VCALENDAR\r\n";
        assert!(matches!(
            decode_calendar(input),
            Err(CalError::Decode(DecodeError::InvalidDate { .. }))
        ));
    }

    #[test]
    fn decode_zoned_dtstart() {
        let input = "\
BEGIN:VCALENDAR\r\n\
VERSION:2.0\r\n\
BEGIN:VEVENT\r\n\
UID:x@example.com\r\n\
DTSTAMP:20220829T090000Z\r\n\
DTSTART;TZID=Europe/Stockholm:20220829T090000\r\n\
END:VEVENT\r\n\
END:VCALENDAR\r\n";
        let calendar = decode_calendar(input).unwrap();
        assert_eq!(
            calendar.events[0].dtstart.tzid(),
            Some("Europe/Stockholm")
        );
    }

    #[test]
    fn decode_all_day_event() {
        let input = "\
BEGIN:VCALENDAR\r\n\
VERSION:2.0\r\n\
BEGIN:VEVENT\r\n\
UID:x@example.com\r\n\
DTSTAMP:20220829T090000Z\r\n\
DTSTART;VALUE=DATE:20220829\r\n\
DTEND;VALUE=DATE:20220830\r\n\
END:VEVENT\r\n\
END:VCALENDAR\r\n";
        let calendar = decode_calendar(input).unwrap();
        assert!(calendar.events[0].is_all_day());

        let encoded = encode_calendar(&calendar);
        assert!(encoded.contains("DTSTART;VALUE=DATE:20220829"));
    }

    #[test]
    fn exdate_round_trips_as_comma_list() {
        let input = "\
BEGIN:VCALENDAR\r\n\
VERSION:2.0\r\n\
BEGIN:VEVENT\r\n\
UID:x@example.com\r\n\
DTSTAMP:20220829T090000Z\r\n\
DTSTART:20220829T090000\r\n\
RRULE:FREQ=DAILY;COUNT=10\r\n\
EXDATE:20220830T090000\r\n\
EXDATE:20220901T090000\r\n\
END:VEVENT\r\n\
END:VCALENDAR\r\n";
        let calendar = decode_calendar(input).unwrap();
        assert_eq!(calendar.events[0].exdate.len(), 2);

        // Repeated input lines normalize to one comma-joined line.
        let encoded = encode_calendar(&calendar);
        assert!(encoded.contains("EXDATE:20220830T090000,20220901T090000"));
    }

    #[test]
    fn valarm_survives_round_trip() {
        let input = "\
BEGIN:VCALENDAR\r\n\
VERSION:2.0\r\n\
BEGIN:VEVENT\r\n\
UID:x@example.com\r\n\
DTSTAMP:20220829T090000Z\r\n\
DTSTART:20220829T090000\r\n\
BEGIN:VALARM\r\n\
ACTION:DISPLAY\r\n\
TRIGGER:-PT15M\r\n\
END:VALARM\r\n\
END:VEVENT\r\n\
END:VCALENDAR\r\n";
        let calendar = decode_calendar(input).unwrap();
        assert_eq!(calendar.events[0].children.len(), 1);

        let encoded = encode_calendar(&calendar);
        assert!(encoded.contains("BEGIN:VALARM"));
        assert!(encoded.contains("TRIGGER:-PT15M"));
    }

    #[test]
    fn lenient_preserves_unknown_frequency_strict_rejects() {
        let input = "\
BEGIN:VCALENDAR\r\n\
VERSION:2.0\r\n\
BEGIN:VEVENT\r\n\
UID:x@example.com\r\n\
DTSTAMP:20220829T090000Z\r\n\
DTSTART:20220829T090000\r\n\
RRULE:FREQ=FORTNIGHTLY\r\n\
END:VEVENT\r\n\
END:VCALENDAR\r\n";
        let calendar = decode_calendar(input).unwrap();
        assert_eq!(
            calendar.events[0].undecoded_rrule.as_deref(),
            Some("FREQ=FORTNIGHTLY")
        );
        let encoded = encode_calendar(&calendar);
        assert!(encoded.contains("RRULE:FREQ=FORTNIGHTLY"));

        assert!(decode_calendar_with(input, &CalendarConfig::strict()).is_err());
    }

    #[test]
    fn journal_and_timezone_pass_through() {
        let input = "\
BEGIN:VCALENDAR\r\n\
VERSION:2.0\r\n\
BEGIN:VTIMEZONE\r\n\
TZID:America/New_York\r\n\
END:VTIMEZONE\r\n\
BEGIN:VJOURNAL\r\n\
UID:j@example.com\r\n\
DTSTAMP:20220829T090000Z\r\n\
SUMMARY:Notes\r\n\
END:VJOURNAL\r\n\
END:VCALENDAR\r\n";
        let calendar = decode_calendar(input).unwrap();
        assert_eq!(calendar.timezones.len(), 1);
        assert_eq!(calendar.journals.len(), 1);

        let encoded = encode_calendar(&calendar);
        assert!(encoded.contains("BEGIN:VTIMEZONE"));
        assert!(encoded.contains("BEGIN:VJOURNAL"));
    }
}
