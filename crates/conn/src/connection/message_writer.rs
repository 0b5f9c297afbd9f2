use bytes::BytesMut;
use tokio_util::codec::Encoder;
use tracing::trace;

use crate::codec::HeaderEncoder;
use crate::connection::Connection;
use crate::ensure;
use crate::protocol::{HttpResponse, ResponseBody, ResponseHead, SendError};

/// Initial capacity of the head serialization buffer
const INIT_BUFFER_SIZE: usize = 4 * 1024;

/// Writes complete responses to a [`Connection`].
///
/// The head is always written before the first body byte, and the whole body
/// is written before `write_response` returns, so responses never interleave.
#[derive(Debug)]
pub struct MessageWriter {
    buffer: BytesMut,
    encoder: HeaderEncoder,
}

impl MessageWriter {
    pub fn new() -> Self {
        Self::with_capacity(INIT_BUFFER_SIZE)
    }

    pub fn with_capacity(buffer_size: usize) -> Self {
        Self { buffer: BytesMut::with_capacity(buffer_size), encoder: HeaderEncoder }
    }

    /// Writes `response` with a `Content-Length` header derived from its body.
    ///
    /// # Errors
    ///
    /// - [`SendError::UnknownBodyLength`] before anything is written if the body
    ///   has no declared length
    /// - [`SendError::InvalidBody`] if the body yields more or fewer bytes than declared
    /// - [`SendError::Connection`] if the transport fails
    pub async fn write_response(&mut self, connection: &mut Connection, response: HttpResponse) -> Result<(), SendError> {
        let (head, mut body, length) = self.write_head(connection, response).await?;

        let mut written = 0u64;
        loop {
            let chunk = body.read().await.map_err(|e| SendError::invalid_body(format!("can't read response body: {e}")))?;
            if chunk.is_empty() {
                break;
            }

            written += chunk.len() as u64;
            ensure!(written <= length, SendError::invalid_body(format!("body exceeds declared length {length}")));
            connection.write(chunk).await?;
        }

        ensure!(written == length, SendError::invalid_body(format!("body ended after {written} of {length} bytes")));
        trace!(status = head.status(), body_size = written, "response written");
        Ok(())
    }

    /// Writes only the head of `response`, as the answer to a `HEAD` request.
    ///
    /// `Content-Length` still carries the declared body length; the body is dropped unread.
    pub async fn write_response_head(&mut self, connection: &mut Connection, response: HttpResponse) -> Result<(), SendError> {
        let (head, _body, length) = self.write_head(connection, response).await?;
        trace!(status = head.status(), content_length = length, "response head written");
        Ok(())
    }

    async fn write_head(
        &mut self,
        connection: &mut Connection,
        response: HttpResponse,
    ) -> Result<(ResponseHead, ResponseBody, u64), SendError> {
        let (mut head, body) = response.into_parts();
        let length = body.declared_length().ok_or(SendError::UnknownBodyLength)?;

        head.set_content_length(length);
        self.buffer.clear();
        self.encoder.encode(&head, &mut self.buffer)?;
        connection.write(self.buffer.split().freeze()).await?;
        Ok((head, body, length))
    }
}

impl Default for MessageWriter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::body::BodyReader;
    use crate::transport::{channel, Outbound, OutboundPeer};
    use bytes::Bytes;
    use std::io;

    /// Acknowledges every write and collects the written bytes until teardown.
    async fn collect_writes(outbound: &mut OutboundPeer, count: usize) -> Vec<Bytes> {
        let mut writes = Vec::new();
        while writes.len() < count {
            match outbound.next().await {
                Some(Outbound::Write { data, ack }) => {
                    writes.push(data);
                    ack.send(Ok(())).unwrap();
                }
                other => panic!("unexpected outbound {other:?}"),
            }
        }
        writes
    }

    #[tokio::test]
    async fn writes_head_then_body() {
        let (handle, peer) = channel();
        let (_inbound, mut outbound) = peer.into_split();
        let mut connection = Connection::new(handle);
        let mut writer = MessageWriter::new();

        let response = HttpResponse::ok("hello").with_header("Server: test").with_header("Content-Length: 99");
        let (written, writes) = tokio::join!(writer.write_response(&mut connection, response), collect_writes(&mut outbound, 2));

        written.unwrap();
        assert_eq!(&writes[0][..], b"HTTP/1.1 200 OK\r\nServer: test\r\nContent-Length: 5\r\n\r\n");
        assert_eq!(&writes[1][..], b"hello");
    }

    #[tokio::test]
    async fn empty_body_writes_head_only() {
        let (handle, peer) = channel();
        let (_inbound, mut outbound) = peer.into_split();
        let mut connection = Connection::new(handle);
        let mut writer = MessageWriter::new();

        let response = HttpResponse::new(404, BodyReader::empty());
        let (written, writes) = tokio::join!(writer.write_response(&mut connection, response), collect_writes(&mut outbound, 1));

        written.unwrap();
        assert_eq!(&writes[0][..], b"HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\n\r\n");
    }

    #[tokio::test]
    async fn head_response_keeps_length_without_body() {
        let (handle, peer) = channel();
        let (_inbound, mut outbound) = peer.into_split();
        let mut connection = Connection::new(handle);
        let mut writer = MessageWriter::new();

        let response = HttpResponse::ok("hello").with_header("Server: test");
        let (written, writes) = tokio::join!(writer.write_response_head(&mut connection, response), collect_writes(&mut outbound, 1));
        written.unwrap();
        assert_eq!(&writes[0][..], b"HTTP/1.1 200 OK\r\nServer: test\r\nContent-Length: 5\r\n\r\n");

        drop(connection);
        assert!(outbound.next().await.is_none());
    }

    #[tokio::test]
    async fn unknown_length_fails_before_writing() {
        let (handle, peer) = channel();
        let (_inbound, mut outbound) = peer.into_split();
        let mut connection = Connection::new(handle);
        let mut writer = MessageWriter::new();

        let body = BodyReader::from_stream(futures::stream::empty::<io::Result<Bytes>>(), None);
        let result = writer.write_response(&mut connection, HttpResponse::new(200, body)).await;
        assert!(matches!(result, Err(SendError::UnknownBodyLength)));

        drop(connection);
        assert!(outbound.next().await.is_none());
    }

    #[tokio::test]
    async fn short_stream_is_invalid() {
        let (handle, peer) = channel();
        let (_inbound, mut outbound) = peer.into_split();
        let mut connection = Connection::new(handle);
        let mut writer = MessageWriter::new();

        let chunks = vec![Ok(Bytes::from_static(b"abc"))];
        let body = BodyReader::from_stream(futures::stream::iter(chunks), Some(5));
        let (written, writes) =
            tokio::join!(writer.write_response(&mut connection, HttpResponse::new(200, body)), collect_writes(&mut outbound, 2));

        assert!(matches!(written, Err(SendError::InvalidBody { .. })));
        assert_eq!(&writes[1][..], b"abc");
    }
}
