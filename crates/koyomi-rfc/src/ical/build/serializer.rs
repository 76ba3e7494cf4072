//! Document serialization (RFC 5545 §3.4–§3.6).

use base64::{Engine, engine::general_purpose::STANDARD};

use super::escape::{escape_param_value, escape_text};
use super::fold::fold_line;
use crate::ical::core::{Component, ICalendar, Property, Value};

/// Serializes a complete iCalendar document with CRLF line endings and
/// 75-octet folding.
#[must_use]
pub fn serialize(ical: &ICalendar) -> String {
    let mut out = String::new();
    serialize_component(&ical.root, &mut out);
    out
}

/// Serializes one component (recursively) into `out`.
pub fn serialize_component(component: &Component, out: &mut String) {
    out.push_str("BEGIN:");
    out.push_str(&component.name);
    out.push_str("\r\n");

    for property in &component.properties {
        out.push_str(&fold_line(&serialize_property(property)));
        out.push_str("\r\n");
    }

    for child in &component.children {
        serialize_component(child, out);
    }

    out.push_str("END:");
    out.push_str(&component.name);
    out.push_str("\r\n");
}

/// Serializes a single property to its unfolded content-line text.
#[must_use]
pub fn serialize_property(property: &Property) -> String {
    let mut line = String::with_capacity(property.name.len() + property.raw_value.len() + 16);
    line.push_str(&property.name);

    for param in &property.params {
        line.push(';');
        line.push_str(&param.name);
        line.push('=');
        for (i, value) in param.values.iter().enumerate() {
            if i > 0 {
                line.push(',');
            }
            line.push_str(&escape_param_value(value));
        }
    }

    line.push(':');
    line.push_str(&render_value(&property.value));
    line
}

/// Renders a typed value back to content-line text.
///
/// Text gets re-escaped; list values are normalized to the comma-joined
/// shape; unknown values are emitted verbatim.
fn render_value(value: &Value) -> String {
    fn join<T: std::fmt::Display>(items: &[T]) -> String {
        items
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",")
    }

    match value {
        Value::Text(s) => escape_text(s),
        Value::TextList(items) => items
            .iter()
            .map(|item| escape_text(item))
            .collect::<Vec<_>>()
            .join(","),
        Value::Integer(i) => i.to_string(),
        Value::Float(f) => f.to_string(),
        Value::Boolean(b) => String::from(if *b { "TRUE" } else { "FALSE" }),
        Value::Date(d) => d.to_string(),
        Value::DateList(v) => join(v),
        Value::DateTime(dt) => dt.to_string(),
        Value::DateTimeList(v) => join(v),
        Value::Duration(d) => d.to_string(),
        Value::Period(p) => p.to_string(),
        Value::PeriodList(v) => join(v),
        Value::Recur(r) => r.to_string(),
        Value::Time(t) => t.to_string(),
        Value::UtcOffset(o) => o.to_string(),
        Value::Binary(data) => STANDARD.encode(data),
        Value::Uri(u) | Value::Unknown(u) => u.clone(),
    }
}
