use std::io;
use std::sync::Arc;

use http::StatusCode;
use thiserror::Error;

use crate::buffer::BufferError;

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("request error: {source}")]
    RequestError {
        #[from]
        source: ParseError,
    },

    #[error("response error: {source}")]
    ResponseError {
        #[from]
        source: SendError,
    },

    #[error("connection error: {source}")]
    ConnectionError {
        #[from]
        source: ConnectionError,
    },
}

/// Failure of the underlying transport.
///
/// The error is `Clone` so a connection can latch it and hand the same error to
/// every later read or write.
#[derive(Debug, Error, Clone)]
pub enum ConnectionError {
    #[error("transport error: {source}")]
    Transport { source: Arc<io::Error> },

    #[error("transport destroyed")]
    Destroyed,
}

impl ConnectionError {
    pub fn transport<E: Into<io::Error>>(e: E) -> Self {
        Self::Transport { source: Arc::new(e.into()) }
    }
}

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("header size too large, current: {current_size} exceed the limit {max_size}")]
    TooLargeHeader { current_size: usize, max_size: usize },

    #[error("malformed request line: {reason}")]
    MalformedRequestLine { reason: String },

    #[error("malformed header: {reason}")]
    MalformedHeader { reason: String },

    #[error("http body not allowed for method {method}")]
    BodyNotAllowed { method: String },

    #[error("invalid content-length header: {reason}")]
    InvalidContentLength { reason: String },

    #[error("unsupported body framing: neither content-length nor chunked")]
    UnsupportedBodyFraming,

    #[error("unsupported transfer-encoding: chunked")]
    UnsupportedChunkedEncoding,

    #[error("unexpected eof: {reason}")]
    UnexpectedEof { reason: String },

    #[error("buffer error: {source}")]
    Buffer {
        #[from]
        source: BufferError,
    },

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },

    #[error("connection error: {source}")]
    Connection {
        #[from]
        source: ConnectionError,
    },
}

impl ParseError {
    pub fn too_large_header(current_size: usize, max_size: usize) -> Self {
        Self::TooLargeHeader { current_size, max_size }
    }

    pub fn malformed_request_line<S: ToString>(str: S) -> Self {
        Self::MalformedRequestLine { reason: str.to_string() }
    }

    pub fn malformed_header<S: ToString>(str: S) -> Self {
        Self::MalformedHeader { reason: str.to_string() }
    }

    pub fn body_not_allowed<S: ToString>(method: S) -> Self {
        Self::BodyNotAllowed { method: method.to_string() }
    }

    pub fn invalid_content_length<S: ToString>(str: S) -> Self {
        Self::InvalidContentLength { reason: str.to_string() }
    }

    pub fn unexpected_eof<S: ToString>(str: S) -> Self {
        Self::UnexpectedEof { reason: str.to_string() }
    }

    pub fn io<E: Into<io::Error>>(e: E) -> Self {
        Self::Io { source: e.into() }
    }

    /// The status code of the error response the client should receive.
    ///
    /// Returns `None` for failures below HTTP, where no response is attempted.
    pub fn status_code(&self) -> Option<StatusCode> {
        match self {
            Self::TooLargeHeader { .. } => Some(StatusCode::PAYLOAD_TOO_LARGE),
            Self::MalformedRequestLine { .. }
            | Self::MalformedHeader { .. }
            | Self::BodyNotAllowed { .. }
            | Self::InvalidContentLength { .. }
            | Self::UnexpectedEof { .. } => Some(StatusCode::BAD_REQUEST),
            Self::UnsupportedBodyFraming | Self::UnsupportedChunkedEncoding => Some(StatusCode::NOT_IMPLEMENTED),
            Self::Buffer { .. } | Self::Io { .. } | Self::Connection { .. } => None,
        }
    }
}

#[derive(Error, Debug)]
pub enum SendError {
    #[error("response body length is unknown, chunked responses are not supported")]
    UnknownBodyLength,

    #[error("invalid body: {reason}")]
    InvalidBody { reason: String },

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },

    #[error("connection error: {source}")]
    Connection {
        #[from]
        source: ConnectionError,
    },
}

impl SendError {
    pub fn invalid_body<S: ToString>(str: S) -> Self {
        Self::InvalidBody { reason: str.to_string() }
    }
}
