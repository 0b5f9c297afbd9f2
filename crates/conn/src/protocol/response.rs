//! HTTP response representation.
//!
//! A response is a [`ResponseHead`] (status code plus raw header lines) and a
//! [`ResponseBody`]. The `Content-Length` header is derived from the body when
//! the response is written, see
//! [`MessageWriter`](crate::connection::MessageWriter).

use std::fmt::Display;

use bytes::Bytes;
use http::StatusCode;

use crate::protocol::body::BodyReader;

/// A response body never borrows a connection.
pub type ResponseBody = BodyReader<'static>;

/// Status code and header lines of a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseHead {
    status: u16,
    headers: Vec<Bytes>,
}

impl ResponseHead {
    pub fn new(status: u16) -> Self {
        Self { status, headers: Vec::new() }
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    /// Header lines without CRLF, in insertion order.
    pub fn headers(&self) -> &[Bytes] {
        &self.headers
    }

    /// Appends a raw `Key: Value` line.
    pub fn push_header<B: Into<Bytes>>(&mut self, line: B) {
        self.headers.push(line.into());
    }

    /// Replaces every `Content-Length` line with one carrying `length`.
    pub(crate) fn set_content_length(&mut self, length: u64) {
        self.headers.retain(|line| !is_content_length(line));
        self.headers.push(Bytes::from(format!("Content-Length: {length}")));
    }
}

fn is_content_length(line: &[u8]) -> bool {
    const KEY: &[u8] = b"content-length";
    line.iter().position(|b| *b == b':').is_some_and(|colon| line[..colon].eq_ignore_ascii_case(KEY))
}

/// A complete HTTP response.
#[derive(Debug)]
pub struct HttpResponse {
    head: ResponseHead,
    body: ResponseBody,
}

impl HttpResponse {
    pub fn new(status: u16, body: ResponseBody) -> Self {
        Self { head: ResponseHead::new(status), body }
    }

    /// A `200 OK` response with an in-memory body.
    pub fn ok<B: Into<Bytes>>(body: B) -> Self {
        Self::new(StatusCode::OK.as_u16(), BodyReader::from_memory(body))
    }

    /// A plain-text error response carrying `message` and a trailing newline.
    pub fn error<M: Display>(status: StatusCode, message: M) -> Self {
        Self::new(status.as_u16(), BodyReader::from_memory(format!("{message}\n")))
            .with_header(Bytes::from_static(b"Content-Type: text/plain"))
    }

    /// Appends a raw `Key: Value` line.
    #[must_use]
    pub fn with_header<B: Into<Bytes>>(mut self, line: B) -> Self {
        self.head.push_header(line);
        self
    }

    pub fn status(&self) -> u16 {
        self.head.status()
    }

    pub fn head(&self) -> &ResponseHead {
        &self.head
    }

    pub fn body_mut(&mut self) -> &mut ResponseBody {
        &mut self.body
    }

    pub fn into_parts(self) -> (ResponseHead, ResponseBody) {
        (self.head, self.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_content_length_replaces_existing() {
        let mut head = ResponseHead::new(200);
        head.push_header("Server: test");
        head.push_header("content-length: 99");

        head.set_content_length(5);

        assert_eq!(head.headers(), &[Bytes::from_static(b"Server: test"), Bytes::from_static(b"Content-Length: 5")]);
    }

    #[test]
    fn error_response_has_message_body() {
        let response = HttpResponse::error(StatusCode::BAD_REQUEST, "bad request line");
        assert_eq!(response.status(), 400);
        assert_eq!(response.body.declared_length(), Some(17));
    }
}
