//! Core HTTP protocol types.
//!
//! # Architecture
//!
//! - **Request** ([`request`]): [`HttpRequest`], the parsed request head with raw
//!   header lines and case-insensitive lookup
//! - **Response** ([`response`]): [`HttpResponse`] and its [`ResponseHead`]
//! - **Body** ([`body`]): [`body::BodyReader`], the pull-based body of both
//! - **Framing** ([`message`]): [`PayloadSize`], the resolved request body framing
//! - **Status** ([`status`]): the reason phrase table
//! - **Errors** ([`error`]):
//!   - [`HttpError`]: Top-level error type
//!   - [`ParseError`]: Request framing, parsing and body errors
//!   - [`SendError`]: Response sending errors
//!   - [`ConnectionError`]: Transport failures, latched by a connection

mod message;
pub use message::PayloadSize;

mod request;
pub use request::field_get;
pub use request::HttpRequest;

mod response;
pub use response::HttpResponse;
pub use response::ResponseBody;
pub use response::ResponseHead;

mod status;
pub use status::reason_phrase;
pub use status::UNKNOWN_REASON;

mod error;
pub use error::ConnectionError;
pub use error::HttpError;
pub use error::ParseError;
pub use error::SendError;

pub mod body;
