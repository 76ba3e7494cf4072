//! Content line folding (RFC 5545 §3.1).

/// Maximum octets per physical line, excluding the line break.
const FOLD_LIMIT: usize = 75;

/// Folds a logical line at 75 octets.
///
/// Continuation lines begin with a single space, which counts against
/// their own 75-octet budget. Splits land on UTF-8 character boundaries,
/// so a multi-byte character is never cut (the limit is honored because
/// boundaries are at most three octets before the cap).
///
/// The returned string contains CRLF between segments but no trailing
/// line break.
#[must_use]
pub fn fold_line(line: &str) -> String {
    if line.len() <= FOLD_LIMIT {
        return line.to_string();
    }

    let mut result = String::with_capacity(line.len() + line.len() / FOLD_LIMIT * 3);
    let mut remaining = line;
    let mut first = true;

    while !remaining.is_empty() {
        // Continuation lines lose one octet to the leading space.
        let budget = if first { FOLD_LIMIT } else { FOLD_LIMIT - 1 };

        if remaining.len() <= budget {
            if !first {
                result.push_str("\r\n ");
            }
            result.push_str(remaining);
            break;
        }

        let mut split = budget;
        while !remaining.is_char_boundary(split) {
            split -= 1;
        }

        if !first {
            result.push_str("\r\n ");
        }
        result.push_str(&remaining[..split]);
        remaining = &remaining[split..];
        first = false;
    }

    result
}
