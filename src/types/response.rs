//! Captured response snapshot.

use bytes::Bytes;
use std::time::SystemTime;

/// An immutable captured response.
///
/// Snapshots are cheap to clone (`Bytes` body). A cache write always stores a
/// clone of what is handed back to the caller, so what was returned and what
/// was cached never diverge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseSnapshot {
    pub status: u16,
    pub status_text: String,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
    pub captured_at: SystemTime,
}

impl ResponseSnapshot {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            status_text: canonical_reason(status).to_string(),
            headers: Vec::new(),
            body: Bytes::new(),
            captured_at: SystemTime::now(),
        }
    }

    pub fn with_status_text(mut self, text: impl Into<String>) -> Self {
        self.status_text = text.into();
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_captured_at(mut self, at: SystemTime) -> Self {
        self.captured_at = at;
        self
    }

    /// Status in the 2xx range.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Case-insensitive header lookup (first match wins).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

fn canonical_reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        204 => "No Content",
        301 => "Moved Permanently",
        304 => "Not Modified",
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        500 => "Internal Server Error",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        504 => "Gateway Timeout",
        _ => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_range() {
        assert!(ResponseSnapshot::new(200).is_success());
        assert!(ResponseSnapshot::new(204).is_success());
        assert!(!ResponseSnapshot::new(304).is_success());
        assert!(!ResponseSnapshot::new(500).is_success());
    }

    #[test]
    fn test_header_lookup_ignores_case() {
        let snap = ResponseSnapshot::new(200).with_header("Content-Type", "application/json");
        assert_eq!(snap.header("content-type"), Some("application/json"));
        assert_eq!(snap.header("etag"), None);
    }

    #[test]
    fn test_reason_phrase() {
        assert_eq!(ResponseSnapshot::new(503).status_text, "Service Unavailable");
        assert_eq!(ResponseSnapshot::new(299).status_text, "");
    }
}
