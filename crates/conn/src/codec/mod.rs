//! Framing and HTTP codec module
//!
//! Turns the bytes accumulated in a [`GrowableBuffer`](crate::buffer::GrowableBuffer)
//! into frames, and response heads back into bytes.
//!
//! # Architecture
//!
//! - Framing:
//!   - [`Framer`]: Extracts one complete frame at a time from the read buffer
//!   - [`LineFramer`]: `\n`-terminated messages of the line protocol
//!   - [`HeaderBlockFramer`]: `\r\n\r\n`-terminated HTTP request heads, size limited
//!
//! - Request handling:
//!   - [`RequestHeadDecoder`]: Frames and parses HTTP request heads
//!   - Body framing resolution via [`parse_payload`]
//!
//! - Response handling:
//!   - [`HeaderEncoder`]: Encodes outgoing HTTP response heads
//!
//! # Example
//!
//! ```
//! use micro_conn::buffer::GrowableBuffer;
//! use micro_conn::codec::{Framer, RequestHeadDecoder};
//!
//! let mut buffer = GrowableBuffer::new();
//! let mut decoder = RequestHeadDecoder::new();
//!
//! buffer.push(b"GET /index.html HTTP/1.1\r\nHost: 127.0.0.1\r\n");
//! assert!(decoder.decode(&mut buffer).unwrap().is_none());
//!
//! buffer.push(b"\r\n");
//! let request = decoder.decode(&mut buffer).unwrap().unwrap();
//! assert_eq!(request.method(), "GET");
//! assert_eq!(request.field_get("host"), Some(&b"127.0.0.1"[..]));
//! ```

mod body;
mod framer;
mod header;
mod line_framer;

pub use body::parse_payload;
pub use framer::Framer;
pub use header::{parse_request, HeaderBlockFramer, HeaderEncoder, RequestHeadDecoder, MAX_HEADER_BYTES};
pub use line_framer::LineFramer;
