// ABOUTME: Translation of reference-date layouts like 2006-01-02 into strftime strings
// ABOUTME: Scans the layout greedily, longest token first, copying unknown text through

use chrono::{Local, TimeZone};

use super::error::FuncError;

/// Layout the `date` helper renders timestamps with.
pub(crate) const EVENT_TIME_FORMAT: &str = "2006-01-02 15:04:05";

/// Layout tokens and their strftime equivalents, ordered so longer tokens
/// win over their prefixes during the greedy scan.
const LAYOUT_TOKENS: &[(&str, &str)] = &[
    (".000000000", "%.9f"),
    ("January", "%B"),
    (".000000", "%.6f"),
    ("Monday", "%A"),
    ("-07:00", "%:z"),
    ("-0700", "%z"),
    ("2006", "%Y"),
    (".000", "%.3f"),
    ("Jan", "%b"),
    ("Mon", "%a"),
    ("MST", "%Z"),
    ("15", "%H"),
    ("01", "%m"),
    ("02", "%d"),
    ("03", "%I"),
    ("04", "%M"),
    ("05", "%S"),
    ("06", "%y"),
    ("PM", "%p"),
    ("pm", "%P"),
    ("1", "%-m"),
    ("2", "%-d"),
    ("3", "%-I"),
    ("4", "%-M"),
    ("5", "%-S"),
];

/// Convert a reference-date layout into a chrono strftime string.
/// Text that matches no token is copied through literally.
pub(crate) fn to_strftime(layout: &str) -> String {
    let mut format = String::with_capacity(layout.len());
    let mut rest = layout;
    'scan: while !rest.is_empty() {
        for (token, directive) in LAYOUT_TOKENS {
            if let Some(tail) = rest.strip_prefix(token) {
                format.push_str(directive);
                rest = tail;
                continue 'scan;
            }
        }
        let mut chars = rest.chars();
        if let Some(c) = chars.next() {
            if c == '%' {
                format.push_str("%%");
            } else {
                format.push(c);
            }
            rest = chars.as_str();
        }
    }
    format
}

/// Render a unix timestamp in the local timezone using a reference-date layout.
pub(crate) fn format_epoch(epoch: i64, layout: &str) -> Result<String, FuncError> {
    let timestamp = Local
        .timestamp_opt(epoch, 0)
        .single()
        .ok_or_else(|| FuncError::new(format!("timestamp {epoch} is out of range")))?;
    Ok(timestamp.format(&to_strftime(layout)).to_string())
}
