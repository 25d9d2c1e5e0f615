//! Access log lines
//!
//! `combined` and `common` are fixed `$variable` patterns, `json` is a
//! structured object, and anything else is taken as a custom pattern. Patterns
//! are expanded in one pass, so request text that looks like a variable is
//! logged as sent.

use chrono::Local;

const TIME_LOCAL: &str = "%d/%b/%Y:%H:%M:%S %z";

const COMMON_PATTERN: &str = "$remote_addr - - [$time_local] \"$request\" $status $body_bytes_sent";

const COMBINED_PATTERN: &str = concat!(
    "$remote_addr - - [$time_local] \"$request\" $status $body_bytes_sent",
    " \"$http_referer\" \"$http_user_agent\""
);

/// One served request, filled in by the router
#[derive(Debug, Clone)]
pub struct AccessLogEntry {
    pub remote_addr: String,
    pub time: chrono::DateTime<Local>,
    pub method: String,
    pub path: String,
    /// Raw query string, without the `?`
    pub query: Option<String>,
    /// `1.0`, `1.1` or `2`
    pub http_version: String,
    pub status: u16,
    pub body_bytes: usize,
    pub referer: Option<String>,
    pub user_agent: Option<String>,
    pub request_time_us: u64,
}

impl AccessLogEntry {
    /// Entry stamped with the current local time; the router sets the rest
    pub fn new(remote_addr: String, method: String, path: String) -> Self {
        Self {
            remote_addr,
            time: Local::now(),
            method,
            path,
            query: None,
            http_version: "1.1".to_string(),
            status: 200,
            body_bytes: 0,
            referer: None,
            user_agent: None,
            request_time_us: 0,
        }
    }

    /// Render with a named format (`combined`, `common`, `json`) or a pattern
    pub fn format(&self, format: &str) -> String {
        match format {
            "combined" => self.expand(COMBINED_PATTERN),
            "common" => self.expand(COMMON_PATTERN),
            "json" => self.to_json(),
            pattern => self.expand(pattern),
        }
    }

    fn request_uri(&self) -> String {
        match &self.query {
            Some(q) => format!("{}?{q}", self.path),
            None => self.path.clone(),
        }
    }

    /// Value of one pattern variable, `None` for names we don't know
    ///
    /// Known: `remote_addr`, `time_local`, `time_iso8601`, `request`,
    /// `request_method`, `request_uri`, `request_time` (seconds, 3 decimals),
    /// `status`, `body_bytes_sent`, `http_referer`, `http_user_agent`.
    fn variable(&self, name: &str) -> Option<String> {
        let value = match name {
            "remote_addr" => self.remote_addr.clone(),
            "time_local" => self.time.format(TIME_LOCAL).to_string(),
            "time_iso8601" => self.time.to_rfc3339(),
            "request" => format!(
                "{} {} HTTP/{}",
                self.method,
                self.request_uri(),
                self.http_version
            ),
            "request_method" => self.method.clone(),
            "request_uri" => self.request_uri(),
            "request_time" => {
                #[allow(clippy::cast_precision_loss)]
                let seconds = self.request_time_us as f64 / 1_000_000.0;
                format!("{seconds:.3}")
            }
            "status" => self.status.to_string(),
            "body_bytes_sent" => self.body_bytes.to_string(),
            "http_referer" => self.referer.clone().unwrap_or_else(|| "-".to_string()),
            "http_user_agent" => self.user_agent.clone().unwrap_or_else(|| "-".to_string()),
            _ => return None,
        };
        Some(value)
    }

    /// Replace each `$name` in `pattern` once. Substituted values are never
    /// scanned again; unknown names stay as written.
    fn expand(&self, pattern: &str) -> String {
        let mut out = String::with_capacity(pattern.len() + 64);
        let mut rest = pattern;

        while let Some(pos) = rest.find('$') {
            out.push_str(&rest[..pos]);
            let after = &rest[pos + 1..];
            let name_len = after
                .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
                .unwrap_or(after.len());
            let name = &after[..name_len];

            match self.variable(name) {
                Some(value) => out.push_str(&value),
                None => {
                    out.push('$');
                    out.push_str(name);
                }
            }
            rest = &after[name_len..];
        }
        out.push_str(rest);
        out
    }

    fn to_json(&self) -> String {
        serde_json::json!({
            "remote_addr": self.remote_addr,
            "time": self.time.to_rfc3339(),
            "method": self.method,
            "path": self.path,
            "query": self.query,
            "http_version": self.http_version,
            "status": self.status,
            "body_bytes": self.body_bytes,
            "referer": self.referer,
            "user_agent": self.user_agent,
            "request_time_us": self.request_time_us,
        })
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn search_entry() -> AccessLogEntry {
        let mut entry = AccessLogEntry::new(
            "10.0.0.7".to_string(),
            "GET".to_string(),
            "/search".to_string(),
        );
        entry.query = Some("q=x%27%20OR%20%271%27%3D%271".to_string());
        entry.status = 200;
        entry.body_bytes = 96;
        entry.referer = Some("http://localhost:5000/".to_string());
        entry.user_agent = Some("sqlmap/1.8".to_string());
        entry.request_time_us = 2600;
        entry
    }

    #[test]
    fn test_combined_keeps_raw_query() {
        let log = search_entry().format("combined");
        assert!(log.starts_with("10.0.0.7 - - ["));
        assert!(log.contains("\"GET /search?q=x%27%20OR%20%271%27%3D%271 HTTP/1.1\" 200 96"));
        assert!(log.ends_with("\"http://localhost:5000/\" \"sqlmap/1.8\""));
    }

    #[test]
    fn test_common_omits_agent() {
        let mut entry = search_entry();
        entry.query = None;
        let log = entry.format("common");
        assert!(log.contains("\"GET /search HTTP/1.1\" 200 96"));
        assert!(!log.contains("sqlmap"));
    }

    #[test]
    fn test_json_is_parseable() {
        let mut entry = search_entry();
        entry.user_agent = None;
        let parsed: serde_json::Value = serde_json::from_str(&entry.format("json")).unwrap();
        assert_eq!(parsed["path"], "/search");
        assert_eq!(parsed["status"], 200);
        assert_eq!(parsed["user_agent"], serde_json::Value::Null);
        assert_eq!(parsed["request_time_us"], 2600);
    }

    #[test]
    fn test_custom_pattern() {
        let log = search_entry().format("$request_method $request_uri -> $status in $request_time");
        assert_eq!(
            log,
            "GET /search?q=x%27%20OR%20%271%27%3D%271 -> 200 in 0.003"
        );
    }

    #[test]
    fn test_variables_in_request_are_not_expanded() {
        let mut entry = search_entry();
        entry.query = Some("q=$status$remote_addr".to_string());
        entry.user_agent = Some("$http_referer".to_string());

        let log = entry.format("combined");
        assert!(log.contains("\"GET /search?q=$status$remote_addr HTTP/1.1\" 200 96"), "got: {log}");
        assert!(log.ends_with("\"$http_referer\""), "got: {log}");

        let log = entry.format("$request_uri|$status");
        assert_eq!(log, "/search?q=$status$remote_addr|200");
    }

    #[test]
    fn test_unknown_variable_left_alone() {
        let log = search_entry().format("$status $nope $ end$");
        assert_eq!(log, "200 $nope $ end$");
    }
}
