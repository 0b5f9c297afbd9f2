//! HTTP request head representation.
//!
//! Headers are kept as the raw header-line bytes in arrival order, so the
//! original casing and ordering survive; lookups scan linearly and compare keys
//! case-insensitively.

use bytes::Bytes;

/// A parsed HTTP request head.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    method: String,
    target: Bytes,
    version: String,
    headers: Vec<Bytes>,
}

impl HttpRequest {
    pub fn new(method: String, target: Bytes, version: String, headers: Vec<Bytes>) -> Self {
        Self { method, target, version, headers }
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    /// The raw request-target, e.g. `/index.html?a=1`.
    pub fn target(&self) -> &Bytes {
        &self.target
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// The header lines without their CRLF, in arrival order.
    pub fn headers(&self) -> &[Bytes] {
        &self.headers
    }

    /// Returns the value of the first header whose key matches `key`, ignoring ASCII case.
    pub fn field_get(&self, key: &str) -> Option<&[u8]> {
        field_get(&self.headers, key)
    }

    /// Whether the method admits a request body.
    ///
    /// `GET` and `HEAD` never carry one.
    pub fn body_allowed(&self) -> bool {
        !matches!(self.method.as_str(), "GET" | "HEAD")
    }
}

/// Looks up `key` in a list of raw `Key: Value` lines.
///
/// The value is returned with surrounding whitespace trimmed.
pub fn field_get<'a>(headers: &'a [Bytes], key: &str) -> Option<&'a [u8]> {
    headers.iter().find_map(|line| {
        let colon = line.iter().position(|b| *b == b':')?;
        line[..colon].eq_ignore_ascii_case(key.as_bytes()).then(|| line[colon + 1..].trim_ascii())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(headers: &[&'static str]) -> HttpRequest {
        HttpRequest::new(
            "POST".to_string(),
            Bytes::from_static(b"/echo"),
            "HTTP/1.1".to_string(),
            headers.iter().map(|h| Bytes::from_static(h.as_bytes())).collect(),
        )
    }

    #[test]
    fn field_get_ignores_case() {
        let req = request(&["Host: 127.0.0.1:8080", "content-length: 12", "Accept: */*"]);

        assert_eq!(req.field_get("Content-Length"), Some(&b"12"[..]));
        assert_eq!(req.field_get("HOST"), Some(&b"127.0.0.1:8080"[..]));
        assert_eq!(req.field_get("accept"), Some(&b"*/*"[..]));
        assert_eq!(req.field_get("Transfer-Encoding"), None);
    }

    #[test]
    fn field_get_returns_first_match() {
        let req = request(&["X-Trace: first", "x-trace: second"]);
        assert_eq!(req.field_get("X-TRACE"), Some(&b"first"[..]));
    }

    #[test]
    fn field_get_does_not_match_prefix() {
        let req = request(&["Content-Length-Extra: 1"]);
        assert_eq!(req.field_get("Content-Length"), None);
    }

    #[test]
    fn body_allowed_by_method() {
        assert!(request(&[]).body_allowed());

        let get = HttpRequest::new("GET".to_string(), Bytes::from_static(b"/"), "HTTP/1.1".to_string(), vec![]);
        assert!(!get.body_allowed());

        let head = HttpRequest::new("HEAD".to_string(), Bytes::from_static(b"/"), "HTTP/1.1".to_string(), vec![]);
        assert!(!head.body_allowed());
    }
}
