//! Query string parsing module
//!
//! Decodes `application/x-www-form-urlencoded` pairs. Values come back exactly
//! as the client sent them after percent decoding; nothing is trimmed or
//! filtered.

use percent_encoding::percent_decode_str;

/// Decode a single component (`+` is a space, `%XX` a byte)
fn decode_component(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    percent_decode_str(&spaced).decode_utf8_lossy().into_owned()
}

/// Split a query string into decoded key/value pairs, in order
pub fn parse_query(query: &str) -> Vec<(String, String)> {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| match pair.split_once('=') {
            Some((key, value)) => (decode_component(key), decode_component(value)),
            None => (decode_component(pair), String::new()),
        })
        .collect()
}

/// First value for `key`, if present
pub fn get_param(query: Option<&str>, key: &str) -> Option<String> {
    parse_query(query?)
        .into_iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v)
}

/// First value for `key`, or `default` when absent
pub fn param_or(query: Option<&str>, key: &str, default: &str) -> String {
    get_param(query, key).unwrap_or_else(|| default.to_string())
}
