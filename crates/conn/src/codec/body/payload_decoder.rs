//! Resolution of the request body framing.
//!
//! Decides from the request head how the body is delimited:
//! - no-body methods: empty, and any declared body is rejected
//! - Content-Length: a length-delimited body
//! - chunked transfer-encoding, or no framing at all: rejected as unsupported

use tracing::trace;

use crate::ensure;
use crate::protocol::{HttpRequest, ParseError, PayloadSize};

/// Determines the payload framing of `request`.
///
/// # Errors
///
/// - [`ParseError::InvalidContentLength`] if Content-Length is not a non-negative integer
/// - [`ParseError::BodyNotAllowed`] if a no-body method declares a body
/// - [`ParseError::UnsupportedChunkedEncoding`] for chunked bodies without Content-Length
/// - [`ParseError::UnsupportedBodyFraming`] if neither Content-Length nor chunked is present
pub fn parse_payload(request: &HttpRequest) -> Result<PayloadSize, ParseError> {
    let content_length = request.field_get("Content-Length").map(parse_content_length).transpose()?;
    let chunked = is_chunked(request.field_get("Transfer-Encoding"));

    if !request.body_allowed() {
        let declares_body = content_length.is_some_and(|length| length > 0) || chunked;
        ensure!(!declares_body, ParseError::body_not_allowed(request.method()));
        return Ok(PayloadSize::Empty);
    }

    let payload_size = match (content_length, chunked) {
        (Some(0), _) => PayloadSize::Empty,
        (Some(length), _) => PayloadSize::Length(length),
        (None, true) => return Err(ParseError::UnsupportedChunkedEncoding),
        (None, false) => return Err(ParseError::UnsupportedBodyFraming),
    };

    trace!(?payload_size, "resolved request payload");
    Ok(payload_size)
}

fn parse_content_length(value: &[u8]) -> Result<u64, ParseError> {
    let value = value.trim_ascii();
    ensure!(
        !value.is_empty() && value.iter().all(u8::is_ascii_digit),
        ParseError::invalid_content_length(format!("value {} is not a non-negative integer", String::from_utf8_lossy(value)))
    );

    // only ascii digits remain, the conversion can just overflow
    std::str::from_utf8(value)
        .ok()
        .and_then(|digits| digits.parse::<u64>().ok())
        .ok_or_else(|| ParseError::invalid_content_length(format!("value {} is out of range", String::from_utf8_lossy(value))))
}

/// Checks if the Transfer-Encoding header indicates chunked encoding.
///
/// According to RFC 7230, chunked must be the last encoding if present.
fn is_chunked(header_value: Option<&[u8]>) -> bool {
    const CHUNKED: &[u8] = b"chunked";
    header_value
        .and_then(|value| value.rsplit(|b| *b == b',').next())
        .is_some_and(|last| last.trim_ascii().eq_ignore_ascii_case(CHUNKED))
}
