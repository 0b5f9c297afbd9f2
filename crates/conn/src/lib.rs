//! A suspendable connection core with line and HTTP/1.1 framing
//!
//! This crate provides a byte-stream connection abstraction with explicit
//! backpressure, frame extraction from an accumulating read buffer, and two
//! protocols built on top: a newline-delimited echo protocol and an HTTP/1.1
//! request pipeline with `Content-Length` framed bodies.
//!
//! # Features
//!
//! - One outstanding read per connection, one transport event per read
//! - Sticky end-of-stream and sticky transport errors
//! - Pipelined HTTP requests served strictly in arrival order
//! - Zero-copy request heads sliced out of the read buffer
//! - Size-limited header framing
//! - Client errors answered with HTTP error responses
//!
//! # Example
//!
//! ```no_run
//! use micro_conn::handler::DemoHandler;
//! use micro_conn::server::Server;
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() {
//!     let server = Server::builder()
//!         .address("127.0.0.1:8080")
//!         .handler(DemoHandler::new())
//!         .build()
//!         .unwrap();
//!
//!     server.run(CancellationToken::new()).await.unwrap();
//! }
//! ```
//!
//! # Architecture
//!
//! The crate is organized into several key modules:
//!
//! - [`buffer`]: The growable read buffer frames are extracted from
//! - [`transport`]: The push-transport contract and a tokio IO driver for it
//! - [`connection`]: Suspendable read/write and the protocol pipelines
//! - [`codec`]: Framers, request head parsing and response head encoding
//! - [`protocol`]: Request, response and body types, and the error types
//! - [`handler`]: Request handler trait and utilities
//! - [`server`]: Configuration and the TCP accept loop
//!
//! # Error Handling
//!
//! - [`protocol::HttpError`]: Top-level error type
//! - [`protocol::ParseError`]: Request framing and parsing errors, each client
//!   error maps to an HTTP status through [`protocol::ParseError::status_code`]
//! - [`protocol::SendError`]: Response sending errors
//! - [`protocol::ConnectionError`]: Transport failures, latched by the connection
//!
//! # Limitations
//!
//! - HTTP/1.1 only
//! - Chunked transfer-encoding is rejected with 501
//! - Maximum header size: 8KB by default

pub mod buffer;
pub mod codec;
pub mod connection;
pub mod handler;
pub mod protocol;
pub mod server;
pub mod transport;

mod utils;
pub(crate) use utils::ensure;
