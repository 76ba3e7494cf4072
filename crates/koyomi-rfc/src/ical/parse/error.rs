//! Parse errors with source positions.

use std::fmt;

/// What went wrong, without the position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    // Content line lexing (RFC 5545 §3.1)
    IllFormedFold,
    MissingPropertyName,
    InvalidPropertyName,
    InvalidParameter,
    UnclosedQuote,
    MissingColon,

    // Component structure (RFC 5545 §3.4, §3.6)
    MissingBegin,
    MissingEnd,
    MismatchedComponent,
    PropertyOutsideComponent,

    // Value types (RFC 5545 §3.3)
    InvalidDate,
    InvalidTime,
    InvalidDateTime,
    InvalidDuration,
    InvalidPeriod,
    InvalidUtcOffset,
    InvalidInteger,
    InvalidFloat,
    InvalidBoolean,
    InvalidValue,
    InvalidEscape,

    // Recurrence rules (RFC 5545 §3.3.10)
    InvalidRRule,
    InvalidFrequency,
    InvalidWeekday,
    UntilCountConflict,
}

impl ParseErrorKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::IllFormedFold => "continuation line without a preceding line",
            Self::MissingPropertyName => "missing property name",
            Self::InvalidPropertyName => "invalid character in property name",
            Self::InvalidParameter => "invalid parameter",
            Self::UnclosedQuote => "unterminated quoted parameter value",
            Self::MissingColon => "missing ':' between name and value",
            Self::MissingBegin => "expected BEGIN",
            Self::MissingEnd => "unterminated component",
            Self::MismatchedComponent => "mismatched BEGIN/END",
            Self::PropertyOutsideComponent => "property outside any component",
            Self::InvalidDate => "invalid DATE value",
            Self::InvalidTime => "invalid TIME value",
            Self::InvalidDateTime => "invalid DATE-TIME value",
            Self::InvalidDuration => "invalid DURATION value",
            Self::InvalidPeriod => "invalid PERIOD value",
            Self::InvalidUtcOffset => "invalid UTC-OFFSET value",
            Self::InvalidInteger => "invalid INTEGER value",
            Self::InvalidFloat => "invalid FLOAT value",
            Self::InvalidBoolean => "invalid BOOLEAN value",
            Self::InvalidValue => "invalid value",
            Self::InvalidEscape => "invalid text escape",
            Self::InvalidRRule => "invalid recurrence rule",
            Self::InvalidFrequency => "invalid recurrence frequency",
            Self::InvalidWeekday => "invalid weekday code",
            Self::UntilCountConflict => "COUNT and UNTIL are mutually exclusive",
        }
    }
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parse error at a specific line and column (both 1-based).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub line: usize,
    pub col: usize,
    pub context: Option<String>,
}

impl ParseError {
    #[must_use]
    pub fn new(kind: ParseErrorKind, line: usize, col: usize) -> Self {
        Self {
            kind,
            line,
            col,
            context: None,
        }
    }

    /// Attaches free-form context to the error message.
    #[must_use]
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at line {}, column {}", self.kind, self.line, self.col)?;
        if let Some(context) = &self.context {
            write!(f, " ({context})")?;
        }
        Ok(())
    }
}

impl std::error::Error for ParseError {}

pub type ParseResult<T> = std::result::Result<T, ParseError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_with_context() {
        let err = ParseError::new(ParseErrorKind::MismatchedComponent, 4, 1)
            .with_context("expected END:VEVENT, got END:VCALENDAR");
        let text = err.to_string();
        assert!(text.contains("line 4"));
        assert!(text.contains("END:VCALENDAR"));
    }

    #[test]
    fn display_without_context() {
        let err = ParseError::new(ParseErrorKind::UnclosedQuote, 2, 10);
        assert_eq!(
            err.to_string(),
            "unterminated quoted parameter value at line 2, column 10"
        );
    }
}
