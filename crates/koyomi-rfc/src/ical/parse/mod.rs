//! iCalendar parsing (RFC 5545 §3.1–§3.3).
//!
//! - Lexer: line unfolding and content-line tokenization
//! - Parser: BEGIN/END component structure
//! - Values: typed value codecs

mod error;
mod lexer;
mod parser;
mod values;

pub use error::{ParseError, ParseErrorKind, ParseResult};
pub use lexer::{parse_content_line, split_lines, split_lines_strict};
pub use parser::{ParseOptions, parse, parse_all, parse_with_options};
pub use values::{
    parse_boolean, parse_date, parse_datetime, parse_duration, parse_float, parse_integer,
    parse_period, parse_rrule, parse_text_list, parse_time, parse_utc_offset, unescape_text,
    unescape_text_strict,
};
