//! Literal text rendering for query rows and reconstructed objects
//!
//! Strings are single-quoted, rows are parenthesised tuples and result sets
//! are bracketed lists, e.g. `[(1, 'Widget', 9.99)]`.

use std::fmt::Write as _;

use rusqlite::types::Value;

use crate::store::Row;

/// Single-quote a string, escaping backslashes, quotes and control characters
pub fn quote_str(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('\'');
    out
}

/// Render a float so whole numbers keep a trailing `.0`
pub fn format_float(f: f64) -> String {
    format!("{f:?}")
}

fn format_blob(bytes: &[u8]) -> String {
    let mut out = String::from("b'");
    for &b in bytes {
        match b {
            b'\\' => out.push_str("\\\\"),
            b'\'' => out.push_str("\\'"),
            0x20..=0x7e => out.push(char::from(b)),
            _ => {
                let _ = write!(out, "\\x{b:02x}");
            }
        }
    }
    out.push('\'');
    out
}

/// Render one column value
pub fn format_value(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Integer(i) => i.to_string(),
        Value::Real(f) => format_float(*f),
        Value::Text(s) => quote_str(s),
        Value::Blob(b) => format_blob(b),
    }
}

/// Render one row as a tuple; single-column rows keep a trailing comma
pub fn format_row(row: &Row) -> String {
    let items: Vec<String> = row.iter().map(format_value).collect();
    if items.len() == 1 {
        format!("({},)", items[0])
    } else {
        format!("({})", items.join(", "))
    }
}

/// Render a full result set
pub fn format_rows(rows: &[Row]) -> String {
    let items: Vec<String> = rows.iter().map(format_row).collect();
    format!("[{}]", items.join(", "))
}
