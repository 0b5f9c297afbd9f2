//! HTTP head processing module for decoding request heads and encoding response heads
//!
//! # Components
//!
//! - [`HeaderBlockFramer`]: Frames a request head block from the read buffer
//!   - Enforces the header size limit while the terminator is missing
//! - [`RequestHeadDecoder`]: Frames and parses a request head
//!   - Validates the request line and each header line
//! - [`HeaderEncoder`]: Encodes response heads to bytes
//!   - Resolves the reason phrase of the status line

mod header_decoder;
mod header_encoder;

pub use header_decoder::parse_request;
pub use header_decoder::HeaderBlockFramer;
pub use header_decoder::RequestHeadDecoder;
pub use header_decoder::MAX_HEADER_BYTES;
pub use header_encoder::HeaderEncoder;
