use http::StatusCode;

/// Reason phrase used for status codes outside the table.
pub const UNKNOWN_REASON: &str = "Unknown";

/// Resolves the reason phrase of a status line.
///
/// Backed by the IANA registry of the `http` crate, e.g. `200 OK`, `400 Bad Request`,
/// `404 Not Found`, `413 Payload Too Large`, `501 Not Implemented`. Never fails.
pub fn reason_phrase(code: u16) -> &'static str {
    StatusCode::from_u16(code).ok().and_then(|status| status.canonical_reason()).unwrap_or(UNKNOWN_REASON)
}
