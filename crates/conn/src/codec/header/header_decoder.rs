//! HTTP request head framing and parsing
//!
//! Decoding a request head happens in two stages:
//!
//! 1. [`HeaderBlockFramer`] waits for the `\r\n\r\n` terminator and takes the
//!    whole head block off the buffer. A buffer that reaches the size limit
//!    without a terminator is rejected instead of growing forever.
//! 2. [`parse_request`] splits the block into the request line and the header
//!    lines and validates both.
//!
//! [`RequestHeadDecoder`] chains the two.
//!
//! # Limits
//!
//! - Maximum header block size: 8KB by default, see [`MAX_HEADER_BYTES`]

use bytes::Bytes;
use tracing::trace;

use crate::buffer::GrowableBuffer;
use crate::codec::Framer;
use crate::ensure;
use crate::protocol::{HttpRequest, ParseError};

/// Default maximum size in bytes of a buffered head block without a terminator
pub const MAX_HEADER_BYTES: usize = 8 * 1024;

const HEAD_TERMINATOR: &[u8] = b"\r\n\r\n";
const CRLF: &[u8] = b"\r\n";

/// Frames a request head terminated by an empty line.
#[derive(Debug, Clone, Copy)]
pub struct HeaderBlockFramer {
    max_size: usize,
}

impl HeaderBlockFramer {
    pub fn new() -> Self {
        Self::with_max_size(MAX_HEADER_BYTES)
    }

    pub fn with_max_size(max_size: usize) -> Self {
        Self { max_size }
    }
}

impl Default for HeaderBlockFramer {
    fn default() -> Self {
        Self::new()
    }
}

impl Framer for HeaderBlockFramer {
    type Item = Bytes;
    type Error = ParseError;

    /// Returns the head block including its terminator.
    ///
    /// # Errors
    ///
    /// [`ParseError::TooLargeHeader`] once `max_size` bytes are buffered without a terminator.
    fn decode(&mut self, src: &mut GrowableBuffer) -> Result<Option<Self::Item>, Self::Error> {
        match find(src.view(), HEAD_TERMINATOR) {
            Some(index) => {
                let size = index + HEAD_TERMINATOR.len();
                trace!(head_size = size, "framed request head");
                Ok(Some(src.split_to(size)?))
            }
            None => {
                ensure!(src.len() < self.max_size, ParseError::too_large_header(src.len(), self.max_size));
                Ok(None)
            }
        }
    }
}

/// Frames and parses request heads.
#[derive(Debug, Default, Clone, Copy)]
pub struct RequestHeadDecoder {
    framer: HeaderBlockFramer,
}

impl RequestHeadDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_size(max_size: usize) -> Self {
        Self { framer: HeaderBlockFramer::with_max_size(max_size) }
    }
}

impl Framer for RequestHeadDecoder {
    type Item = HttpRequest;
    type Error = ParseError;

    fn decode(&mut self, src: &mut GrowableBuffer) -> Result<Option<Self::Item>, Self::Error> {
        match self.framer.decode(src)? {
            Some(block) => parse_request(&block).map(Some),
            None => Ok(None),
        }
    }
}

/// Parses a head block ending in `\r\n\r\n` into an [`HttpRequest`].
///
/// Header lines are zero-copy slices of `block`.
pub fn parse_request(block: &Bytes) -> Result<HttpRequest, ParseError> {
    ensure!(block.ends_with(HEAD_TERMINATOR), ParseError::malformed_request_line("missing head terminator"));
    let head = block.slice(..block.len() - HEAD_TERMINATOR.len());

    let mut lines = split_lines(&head);
    // split_lines always yields at least one line
    let request_line = lines.next().unwrap_or_default();
    let (method, target, version) = parse_request_line(&request_line)?;

    let headers = lines
        .map(|line| {
            if validate_header(&line) {
                Ok(line)
            } else {
                Err(ParseError::malformed_header(String::from_utf8_lossy(&line)))
            }
        })
        .collect::<Result<Vec<_>, ParseError>>()?;

    trace!(method = %method, header_count = headers.len(), "parsed request head");
    Ok(HttpRequest::new(method, target, version, headers))
}

/// Splits `METHOD SP TARGET SP VERSION` into its three tokens.
fn parse_request_line(line: &Bytes) -> Result<(String, Bytes, String), ParseError> {
    let mut tokens = line
        .split(u8::is_ascii_whitespace)
        .filter(|token| !token.is_empty())
        .map(|token| line.slice_ref(token));

    let (Some(method), Some(target), Some(version), None) = (tokens.next(), tokens.next(), tokens.next(), tokens.next())
    else {
        return Err(ParseError::malformed_request_line(format!(
            "expect method, target and version in {:?}",
            String::from_utf8_lossy(line)
        )));
    };

    let method = String::from_utf8(method.to_vec()).map_err(|_e| ParseError::malformed_request_line("method is not utf-8"))?;
    let version =
        String::from_utf8(version.to_vec()).map_err(|_e| ParseError::malformed_request_line("version is not utf-8"))?;

    Ok((method, target, version))
}

/// Checks `key ":" [whitespace] value` with a non-empty key free of whitespace
/// and colons, and a non-empty value.
fn validate_header(line: &[u8]) -> bool {
    let Some(colon) = line.iter().position(|b| *b == b':') else {
        return false;
    };

    let (key, rest) = (&line[..colon], &line[colon + 1..]);
    if key.is_empty() || key.iter().any(u8::is_ascii_whitespace) {
        return false;
    }

    let value_start = rest.iter().position(|b| *b != b' ' && *b != b'\t').unwrap_or(rest.len());
    !rest[value_start..].is_empty()
}

fn split_lines(head: &Bytes) -> impl Iterator<Item = Bytes> + '_ {
    let mut start = Some(0);
    std::iter::from_fn(move || {
        let from = start?;
        match find(&head[from..], CRLF) {
            Some(index) => {
                start = Some(from + index + CRLF.len());
                Some(head.slice(from..from + index))
            }
            None => {
                start = None;
                Some(head.slice(from..))
            }
        }
    })
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|window| window == needle)
}
