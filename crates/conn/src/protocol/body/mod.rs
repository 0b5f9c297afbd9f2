//! Message body handling.
//!
//! Both request and response bodies are a [`BodyReader`]: a pull-based source
//! with a declared length that yields chunks until an empty chunk marks the end.
//!
//! A request body either is empty (no-body methods, `Content-Length: 0`) or reads
//! exactly `Content-Length` bytes from the connection, borrowing the connection
//! and its read buffer for the duration of one request. The pipeline drains what
//! the handler left unread before the next request head is framed.
//!
//! Response bodies are `BodyReader<'static>`: in-memory bytes or a stream of
//! chunks.

mod body_reader;

pub use body_reader::BodyReader;
