//! Content line lexer for iCalendar (RFC 5545 §3.1).
//!
//! Handles line unfolding and tokenization of content lines.

use super::error::{ParseError, ParseErrorKind, ParseResult};
use crate::ical::core::{ContentLine, Parameter};

/// Strips a leading UTF-8 byte order mark, if present.
fn strip_bom(input: &str) -> &str {
    input.strip_prefix('\u{feff}').unwrap_or(input)
}

/// Splits input into logical content lines, merging folded continuations.
///
/// Handles both CRLF and bare LF line endings. Lines starting with SP/HTAB
/// are continuations of the previous line; per RFC 5545 §3.1 unfolding
/// removes the line break and the single whitespace character (no space is
/// inserted). Blank lines are skipped. Returns each logical line with the
/// 1-based physical line number it started on.
#[must_use]
pub fn split_lines(input: &str) -> Vec<(usize, String)> {
    let mut lines: Vec<(usize, String)> = Vec::new();

    for (i, raw_line) in strip_bom(input).lines().enumerate() {
        let line = raw_line.trim_end_matches('\r');
        if line.is_empty() {
            continue;
        }

        if line.starts_with([' ', '\t']) {
            let continuation = &line[1..];
            if let Some((_, prev)) = lines.last_mut() {
                prev.push_str(continuation);
            } else {
                // Orphan continuation; lenient mode keeps it as a line.
                lines.push((i + 1, continuation.to_string()));
            }
        } else if !line.contains(':') {
            // Lenient: treat lines without a colon as folded continuations.
            if let Some((_, prev)) = lines.last_mut() {
                prev.push_str(line);
            } else {
                lines.push((i + 1, line.to_string()));
            }
        } else {
            lines.push((i + 1, line.to_string()));
        }
    }

    lines
}

/// Strict variant of [`split_lines`]: a continuation with no preceding
/// line is an error instead of being silently kept.
pub fn split_lines_strict(input: &str) -> ParseResult<Vec<(usize, String)>> {
    let mut lines: Vec<(usize, String)> = Vec::new();

    for (i, raw_line) in strip_bom(input).lines().enumerate() {
        let line = raw_line.trim_end_matches('\r');
        if line.is_empty() {
            continue;
        }

        if line.starts_with([' ', '\t']) {
            match lines.last_mut() {
                Some((_, prev)) => prev.push_str(&line[1..]),
                None => {
                    return Err(ParseError::new(ParseErrorKind::IllFormedFold, i + 1, 1));
                }
            }
        } else {
            lines.push((i + 1, line.to_string()));
        }
    }

    Ok(lines)
}

/// Parses a single content line.
///
/// Format: `name *(";" param) ":" value`
///
/// ## Errors
/// Returns an error if the line is malformed or contains invalid characters.
pub fn parse_content_line(line: &str, line_num: usize) -> ParseResult<ContentLine> {
    let mut chars = line.char_indices().peekable();

    // Property name ends at the first ';' or ':'.
    let mut name_end = 0;
    let mut delimiter = None;
    while let Some(&(i, c)) = chars.peek() {
        if c == ';' || c == ':' {
            name_end = i;
            delimiter = Some(c);
            break;
        }
        if !c.is_ascii_alphanumeric() && c != '-' {
            return Err(ParseError::new(
                ParseErrorKind::InvalidPropertyName,
                line_num,
                i + 1,
            ));
        }
        chars.next();
    }

    if name_end == 0 {
        return Err(ParseError::new(
            ParseErrorKind::MissingPropertyName,
            line_num,
            1,
        ));
    }

    let name = line[..name_end].to_ascii_uppercase();
    chars.next(); // consume the delimiter

    let mut params = Vec::new();
    if delimiter == Some(';') {
        loop {
            let (param, next_is_colon) = parse_parameter(&mut chars, line, line_num)?;
            params.push(param);
            if next_is_colon {
                break;
            }
        }
    }

    // The delimiter (and parse_parameter) consumed the ':' already; the
    // remainder of the line is the value.
    let value_start = chars.peek().map_or(line.len(), |&(i, _)| i);
    let value = &line[value_start..];

    Ok(ContentLine {
        name,
        params,
        raw_value: value.to_string(),
    })
}

/// Parses a single parameter from the character stream.
///
/// Returns the parameter and whether the terminating delimiter was ':'.
fn parse_parameter(
    chars: &mut std::iter::Peekable<std::str::CharIndices<'_>>,
    line: &str,
    line_num: usize,
) -> ParseResult<(Parameter, bool)> {
    let start = chars.peek().map_or(line.len(), |&(i, _)| i);

    // Parameter name (up to '=')
    let mut name_end = start;
    while let Some(&(i, c)) = chars.peek() {
        if c == '=' {
            name_end = i;
            chars.next(); // consume '='
            break;
        }
        if !c.is_ascii_alphanumeric() && c != '-' {
            return Err(ParseError::new(
                ParseErrorKind::InvalidParameter,
                line_num,
                i + 1,
            ));
        }
        chars.next();
    }

    if name_end == start {
        return Err(ParseError::new(
            ParseErrorKind::InvalidParameter,
            line_num,
            start + 1,
        ));
    }

    let param_name = line[start..name_end].to_ascii_uppercase();

    // Parameter values (comma-separated, each possibly quoted)
    let mut values = Vec::new();
    loop {
        let value = parse_param_value(chars, line, line_num)?;
        values.push(value);

        match chars.peek() {
            Some(&(_, ',')) => {
                chars.next();
            }
            Some(&(_, ';')) => {
                chars.next();
                return Ok((Parameter::with_values(param_name, values), false));
            }
            Some(&(_, ':')) => {
                chars.next();
                return Ok((Parameter::with_values(param_name, values), true));
            }
            Some(&(i, c)) => {
                return Err(
                    ParseError::new(ParseErrorKind::InvalidParameter, line_num, i + 1)
                        .with_context(format!("unexpected character '{c}'")),
                );
            }
            None => {
                return Err(ParseError::new(
                    ParseErrorKind::MissingColon,
                    line_num,
                    line.len(),
                ));
            }
        }
    }
}

/// Parses a parameter value (possibly quoted).
///
/// Quoted values may contain ':' ';' ',' and use RFC 6868 caret encoding
/// for '"', newline, and '^' itself.
fn parse_param_value(
    chars: &mut std::iter::Peekable<std::str::CharIndices<'_>>,
    line: &str,
    line_num: usize,
) -> ParseResult<String> {
    let Some(&(start, first)) = chars.peek() else {
        return Err(ParseError::new(
            ParseErrorKind::InvalidParameter,
            line_num,
            line.len(),
        ));
    };

    if first == '"' {
        chars.next(); // consume opening quote
        let mut value = String::new();
        let mut closed = false;

        while let Some((_i, c)) = chars.next() {
            if c == '"' {
                closed = true;
                break;
            }
            if c == '^' {
                match chars.peek() {
                    Some(&(_, '^')) => {
                        value.push('^');
                        chars.next();
                    }
                    Some(&(_, 'n')) => {
                        value.push('\n');
                        chars.next();
                    }
                    Some(&(_, '\'')) => {
                        value.push('"');
                        chars.next();
                    }
                    // Invalid caret escape, preserve as-is
                    _ => value.push('^'),
                }
            } else {
                value.push(c);
            }
        }

        if !closed {
            return Err(ParseError::new(
                ParseErrorKind::UnclosedQuote,
                line_num,
                start + 1,
            ));
        }

        Ok(value)
    } else {
        // Unquoted value (ends at ',' ';' or ':')
        let mut end = start;
        while let Some(&(i, c)) = chars.peek() {
            if c == ',' || c == ';' || c == ':' {
                break;
            }
            end = i + c.len_utf8();
            chars.next();
        }
        Ok(line[start..end].to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_unfolds_continuations() {
        let input = "DESCRIPTION:This is a long description\r\n that continues here\r\n";
        let lines = split_lines(input);
        assert_eq!(lines.len(), 1);
        assert_eq!(
            lines[0].1,
            "DESCRIPTION:This is a long descriptionthat continues here"
        );
    }

    #[test]
    fn split_handles_bare_lf() {
        let input = "SUMMARY:First\n Second\nLOCATION:Here\n";
        let lines = split_lines(input);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].1, "SUMMARY:FirstSecond");
        assert_eq!(lines[1].1, "LOCATION:Here");
    }

    #[test]
    fn split_strips_bom() {
        let input = "\u{feff}BEGIN:VCALENDAR\r\n";
        let lines = split_lines(input);
        assert_eq!(lines[0].1, "BEGIN:VCALENDAR");
    }

    #[test]
    fn split_tracks_line_numbers() {
        let input = "A:1\r\nB:2\r\n folded\r\nC:3\r\n";
        let lines = split_lines(input);
        assert_eq!(
            lines,
            vec![
                (1, "A:1".to_string()),
                (2, "B:2folded".to_string()),
                (4, "C:3".to_string())
            ]
        );
    }

    #[test]
    fn split_strict_rejects_orphan_continuation() {
        let err = split_lines_strict(" orphan\r\n").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::IllFormedFold);
        assert_eq!(err.line, 1);
    }

    #[test]
    fn parse_simple_line() {
        let result = parse_content_line("SUMMARY:Team Meeting", 1).unwrap();
        assert_eq!(result.name, "SUMMARY");
        assert!(result.params.is_empty());
        assert_eq!(result.raw_value, "Team Meeting");
    }

    #[test]
    fn parse_line_with_params() {
        let line = "DTSTART;TZID=America/New_York:20260123T120000";
        let result = parse_content_line(line, 1).unwrap();
        assert_eq!(result.name, "DTSTART");
        assert_eq!(result.params.len(), 1);
        assert_eq!(result.params[0].name, "TZID");
        assert_eq!(result.params[0].value(), Some("America/New_York"));
        assert_eq!(result.raw_value, "20260123T120000");
    }

    #[test]
    fn parse_line_with_quoted_param() {
        let line = "ATTENDEE;CN=\"Doe, Jane\":mailto:jane@example.com";
        let result = parse_content_line(line, 1).unwrap();
        assert_eq!(result.params[0].value(), Some("Doe, Jane"));
        assert_eq!(result.raw_value, "mailto:jane@example.com");
    }

    #[test]
    fn parse_line_with_multiple_param_values() {
        let line = "ATTENDEE;ROLE=REQ-PARTICIPANT,OPT-PARTICIPANT:mailto:test@example.com";
        let result = parse_content_line(line, 1).unwrap();
        assert_eq!(result.params[0].values.len(), 2);
        assert_eq!(result.params[0].values[0], "REQ-PARTICIPANT");
        assert_eq!(result.params[0].values[1], "OPT-PARTICIPANT");
    }

    #[test]
    fn parse_line_with_caret_encoding() {
        let line = "ATTENDEE;CN=\"Test^nName\":mailto:test@example.com";
        let result = parse_content_line(line, 1).unwrap();
        assert_eq!(result.params[0].value(), Some("Test\nName"));
    }

    #[test]
    fn parse_line_unclosed_quote() {
        let line = "ATTENDEE;CN=\"Unclosed:mailto:test@example.com";
        let err = parse_content_line(line, 1).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnclosedQuote);
    }

    #[test]
    fn parse_line_missing_colon() {
        assert!(parse_content_line("INVALID", 1).is_err());
    }

    #[test]
    fn parse_line_empty_value() {
        let result = parse_content_line("X-EMPTY:", 1).unwrap();
        assert_eq!(result.raw_value, "");
    }
}
