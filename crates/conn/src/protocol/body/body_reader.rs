use std::cmp;
use std::fmt;
use std::io;

use bytes::{Bytes, BytesMut};
use futures::stream::BoxStream;
use futures::{Stream, StreamExt};
use tracing::trace;

use crate::buffer::GrowableBuffer;
use crate::connection::Connection;
use crate::protocol::ParseError;

/// A pull-based, single-use message body.
///
/// [`BodyReader::read`] yields the next chunk, or an empty `Bytes` once the body
/// is exhausted; every later call yields empty again. The set of sources is
/// closed:
///
/// - in-memory bytes, see [`BodyReader::from_memory`]
/// - the length-delimited rest of a request on a connection, see
///   [`BodyReader::from_connection`]
/// - a stream of chunks, see [`BodyReader::from_stream`]
pub struct BodyReader<'conn> {
    kind: Kind<'conn>,
}

enum Kind<'conn> {
    Memory { data: Option<Bytes>, length: u64 },
    Connection(LengthBody<'conn>),
    Stream { stream: Option<BoxStream<'static, io::Result<Bytes>>>, length: Option<u64> },
}

impl BodyReader<'static> {
    /// An already exhausted body of length zero.
    pub fn empty() -> Self {
        Self::from_memory(Bytes::new())
    }

    /// A body serving a private copy of `data` in one chunk.
    pub fn from_memory<B: Into<Bytes>>(data: B) -> Self {
        let data: Bytes = data.into();
        let length = data.len() as u64;
        Self { kind: Kind::Memory { data: Some(data), length } }
    }

    /// A body pulling chunks from `stream`.
    ///
    /// `length` is the declared length; `None` means unknown, which a response
    /// writer refuses since only `Content-Length` framing is supported.
    pub fn from_stream<S>(stream: S, length: Option<u64>) -> Self
    where
        S: Stream<Item = io::Result<Bytes>> + Send + 'static,
    {
        Self { kind: Kind::Stream { stream: Some(stream.boxed()), length } }
    }
}

impl<'conn> BodyReader<'conn> {
    /// A body of exactly `length` bytes read from `connection`.
    ///
    /// Bytes already sitting in `buffer` are served first. Chunks read from the
    /// connection go through `buffer` as well, so bytes past `length` stay there
    /// for the next pipelined request.
    pub fn from_connection(connection: &'conn mut Connection, buffer: &'conn mut GrowableBuffer, length: u64) -> Self {
        Self { kind: Kind::Connection(LengthBody { connection, buffer, remaining: length, length }) }
    }

    /// The declared body length, `None` when unknown.
    pub fn declared_length(&self) -> Option<u64> {
        match &self.kind {
            Kind::Memory { length, .. } => Some(*length),
            Kind::Connection(body) => Some(body.length),
            Kind::Stream { length, .. } => *length,
        }
    }

    /// Returns the next chunk; empty means the body is exhausted.
    pub async fn read(&mut self) -> Result<Bytes, ParseError> {
        match &mut self.kind {
            Kind::Memory { data, .. } => Ok(data.take().unwrap_or_default()),
            Kind::Connection(body) => body.read().await,
            Kind::Stream { stream, .. } => loop {
                let Some(inner) = stream else {
                    return Ok(Bytes::new());
                };

                match inner.next().await {
                    Some(Ok(bytes)) if bytes.is_empty() => {}
                    Some(Ok(bytes)) => return Ok(bytes),
                    Some(Err(e)) => {
                        stream.take();
                        return Err(ParseError::io(e));
                    }
                    None => {
                        stream.take();
                        return Ok(Bytes::new());
                    }
                }
            },
        }
    }

    /// Reads the whole remaining body into one buffer.
    pub async fn collect(&mut self) -> Result<Bytes, ParseError> {
        let first = self.read().await?;
        let second = self.read().await?;
        if second.is_empty() {
            return Ok(first);
        }

        let mut collected = BytesMut::with_capacity(first.len() + second.len());
        collected.extend_from_slice(&first);
        collected.extend_from_slice(&second);
        loop {
            let chunk = self.read().await?;
            if chunk.is_empty() {
                return Ok(collected.freeze());
            }
            collected.extend_from_slice(&chunk);
        }
    }

    /// Discards the remaining body, returning how many bytes were skipped.
    pub async fn drain(&mut self) -> Result<u64, ParseError> {
        let mut skipped = 0u64;
        loop {
            let chunk = self.read().await?;
            if chunk.is_empty() {
                return Ok(skipped);
            }
            skipped += chunk.len() as u64;
        }
    }
}

impl fmt::Debug for BodyReader<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match &self.kind {
            Kind::Memory { .. } => "memory",
            Kind::Connection(_) => "connection",
            Kind::Stream { .. } => "stream",
        };
        f.debug_struct("BodyReader").field("kind", &kind).field("declared_length", &self.declared_length()).finish()
    }
}

/// The length-delimited request body still on the connection.
struct LengthBody<'conn> {
    connection: &'conn mut Connection,
    buffer: &'conn mut GrowableBuffer,
    /// The number of bytes remaining to be read from the payload
    remaining: u64,
    length: u64,
}

impl LengthBody<'_> {
    async fn read(&mut self) -> Result<Bytes, ParseError> {
        if self.remaining == 0 {
            return Ok(Bytes::new());
        }

        if self.buffer.is_empty() {
            let data = self.connection.read().await?;
            if data.is_empty() {
                return Err(ParseError::unexpected_eof(format!("connection closed with {} body bytes missing", self.remaining)));
            }
            self.buffer.push(&data);
        }

        // Read the minimum of remaining length and available bytes
        let size = cmp::min(self.remaining, self.buffer.len() as u64);
        let chunk = self.buffer.split_to(usize::try_from(size).unwrap_or(usize::MAX))?;
        self.remaining -= chunk.len() as u64;

        trace!(size = chunk.len(), remaining = self.remaining, "read request body chunk");
        Ok(chunk)
    }
}
