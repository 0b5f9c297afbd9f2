//! Connection handling module
//!
//! This module provides the sequential read/write interface over a push
//! transport and the two protocol pipelines built on top of it.
//!
//! # Components
//!
//! - [`Connection`]: Suspendable read/write over a transport:
//!   - At most one outstanding read, enforced through `&mut self`
//!   - One granted transport event per read (backpressure)
//!   - Sticky end-of-stream and sticky errors, see [`ConnectionState`]
//! - [`HttpConnection`]: HTTP/1.1 request pipeline:
//!   - Pipelined requests served strictly in arrival order
//!   - Content-Length framed request bodies
//!   - Error responses for client errors
//! - [`LineConnection`]: Newline-delimited echo protocol
//! - [`MessageWriter`]: Writes a response head followed by its body

mod connection;
mod http_connection;
mod line_connection;
mod message_writer;

pub use connection::{Connection, ConnectionState};
pub use http_connection::HttpConnection;
pub use line_connection::LineConnection;
pub use message_writer::MessageWriter;
