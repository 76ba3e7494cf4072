//! Text and parameter value escaping (RFC 5545 §3.3.11, RFC 6868).

/// Escapes a TEXT value: `\` `;` `,` and newline get backslash escapes.
#[must_use]
pub fn escape_text(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => result.push_str("\\\\"),
            ';' => result.push_str("\\;"),
            ',' => result.push_str("\\,"),
            '\n' => result.push_str("\\n"),
            '\r' => {} // swallowed; bare CR cannot appear in a content line
            _ => result.push(c),
        }
    }
    result
}

/// Escapes a parameter value, quoting when necessary.
///
/// Values containing `:` `;` `,` are double-quoted (RFC 5545 §3.2);
/// double quotes, newlines, and carets inside a value use RFC 6868
/// caret encoding since they cannot appear even inside quotes.
#[must_use]
pub fn escape_param_value(s: &str) -> String {
    let needs_caret = s.contains(['"', '\n', '^']);
    let encoded = if needs_caret {
        let mut out = String::with_capacity(s.len());
        for c in s.chars() {
            match c {
                '^' => out.push_str("^^"),
                '"' => out.push_str("^'"),
                '\n' => out.push_str("^n"),
                _ => out.push(c),
            }
        }
        out
    } else {
        s.to_string()
    };

    if encoded.contains([':', ';', ',']) {
        format!("\"{encoded}\"")
    } else {
        encoded
    }
}
