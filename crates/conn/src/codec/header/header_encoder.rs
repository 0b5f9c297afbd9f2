//! HTTP response head encoder
//!
//! Serializes a [`ResponseHead`] into `HTTP/1.1 <code> <reason>\r\n`, one
//! `Key: Value\r\n` line per header, and the terminating empty line.

use std::io;
use std::io::Write;

use bytes::{BufMut, BytesMut};
use tokio_util::codec::Encoder;

use crate::protocol::{reason_phrase, ResponseHead, SendError};

/// Initial buffer size allocated for header serialization
const INIT_HEADER_SIZE: usize = 4 * 1024;

/// Encoder for HTTP response heads implementing the [`Encoder`] trait.
///
/// Header lines are written as given; the writer is responsible for adding the
/// `Content-Length` line before encoding.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeaderEncoder;

impl Encoder<&ResponseHead> for HeaderEncoder {
    type Error = SendError;

    fn encode(&mut self, head: &ResponseHead, dst: &mut BytesMut) -> Result<(), Self::Error> {
        dst.reserve(INIT_HEADER_SIZE);

        write!(FastWrite(dst), "HTTP/1.1 {} {}\r\n", head.status(), reason_phrase(head.status()))?;

        for line in head.headers() {
            dst.put_slice(line);
            dst.put_slice(b"\r\n");
        }
        dst.put_slice(b"\r\n");
        Ok(())
    }
}

/// Fast writer implementation for writing to BytesMut.
///
/// Lets `write!` format straight into the reserved buffer.
struct FastWrite<'a>(&'a mut BytesMut);

impl Write for FastWrite<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.put_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_status_line_and_headers() {
        let mut head = ResponseHead::new(200);
        head.push_header("Server: micro-conn");
        head.push_header("Content-Length: 12");

        let mut dst = BytesMut::new();
        HeaderEncoder.encode(&head, &mut dst).unwrap();

        assert_eq!(&dst[..], b"HTTP/1.1 200 OK\r\nServer: micro-conn\r\nContent-Length: 12\r\n\r\n");
    }

    #[test]
    fn encode_unknown_status() {
        let mut head = ResponseHead::new(299);
        head.push_header("Content-Length: 0");

        let mut dst = BytesMut::new();
        HeaderEncoder.encode(&head, &mut dst).unwrap();

        assert_eq!(&dst[..], b"HTTP/1.1 299 Unknown\r\nContent-Length: 0\r\n\r\n");
    }

    #[test]
    fn encode_without_headers() {
        let mut dst = BytesMut::new();
        HeaderEncoder.encode(&ResponseHead::new(404), &mut dst).unwrap();

        assert_eq!(&dst[..], b"HTTP/1.1 404 Not Found\r\n\r\n");
    }
}
