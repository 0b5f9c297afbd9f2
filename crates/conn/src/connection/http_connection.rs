use std::sync::Arc;

use bytes::Bytes;
use http::StatusCode;
use tracing::{debug, error, info, warn};

use crate::buffer::GrowableBuffer;
use crate::codec::{parse_payload, Framer, RequestHeadDecoder};
use crate::connection::{Connection, MessageWriter};
use crate::handler::Handler;
use crate::protocol::body::BodyReader;
use crate::protocol::{HttpError, HttpRequest, HttpResponse, ParseError, PayloadSize};

/// An HTTP/1.1 connection that processes pipelined requests in arrival order
///
/// `HttpConnection` handles the full lifecycle of an HTTP connection, including:
/// - Framing request heads out of the read buffer, reading more only when needed
/// - Resolving the body framing and handing a body reader to the handler
/// - Draining body bytes the handler left unread
/// - Writing each response completely before the next request is looked at
///
/// Client errors are answered with a best-effort error response, after which the
/// connection is closed. Transport errors abort without a response.
#[derive(Debug)]
pub struct HttpConnection {
    connection: Connection,
    buffer: GrowableBuffer,
    head_decoder: RequestHeadDecoder,
    writer: MessageWriter,
}

impl HttpConnection {
    pub fn new(connection: Connection) -> Self {
        Self {
            connection,
            buffer: GrowableBuffer::with_capacity(8 * 1024),
            head_decoder: RequestHeadDecoder::new(),
            writer: MessageWriter::new(),
        }
    }

    pub fn with_max_header_size(connection: Connection, max_header_size: usize) -> Self {
        Self { head_decoder: RequestHeadDecoder::with_max_size(max_header_size), ..Self::new(connection) }
    }

    /// Serves requests until the peer ends the stream or a fatal error occurs.
    ///
    /// Returns `Ok` when the peer closed the connection between two requests.
    pub async fn process<H>(mut self, handler: Arc<H>) -> Result<(), HttpError>
    where
        H: Handler + ?Sized,
    {
        loop {
            let request = match self.read_request_head().await {
                Ok(Some(request)) => request,
                Ok(None) => {
                    info!("cant read more request, break this connection down");
                    self.connection.close().await?;
                    return Ok(());
                }
                Err(e) => return self.reject(e).await,
            };

            let payload_size = match parse_payload(&request) {
                Ok(payload_size) => payload_size,
                Err(e) => return self.reject(e).await,
            };

            if let Err(e) = self.do_process(request, payload_size, handler.as_ref()).await {
                return match e {
                    HttpError::RequestError { source } => self.reject(source).await,
                    e => {
                        error!(cause = %e, "failed to send response, connection shutdown");
                        self.connection.destroy();
                        Err(e)
                    }
                };
            }
        }
    }

    /// Returns the next request head, or `None` if the stream ended on a request boundary.
    async fn read_request_head(&mut self) -> Result<Option<HttpRequest>, ParseError> {
        loop {
            if let Some(request) = self.head_decoder.decode(&mut self.buffer)? {
                return Ok(Some(request));
            }

            let data = self.connection.read().await?;
            if data.is_empty() {
                if self.buffer.is_empty() {
                    return Ok(None);
                }
                return Err(ParseError::unexpected_eof(format!(
                    "connection closed with {} bytes of an incomplete request head",
                    self.buffer.len()
                )));
            }
            self.buffer.push(&data);
        }
    }

    async fn do_process<H>(&mut self, request: HttpRequest, payload_size: PayloadSize, handler: &H) -> Result<(), HttpError>
    where
        H: Handler + ?Sized,
    {
        debug!(
            method = request.method(),
            target = %String::from_utf8_lossy(request.target()),
            ?payload_size,
            "receive request"
        );

        let head_only = request.method() == "HEAD";
        let mut body = BodyReader::from_connection(&mut self.connection, &mut self.buffer, payload_size.length());

        let response = match handler.call(request, &mut body).await {
            Ok(response) => response,
            Err(e) => {
                error!(cause = %e, "handle request error");
                HttpResponse::error(StatusCode::INTERNAL_SERVER_ERROR, "internal server error")
            }
        };

        // skip body if request handler don't read body
        let skipped = body.drain().await?;
        if skipped > 0 {
            debug!(skipped, "skip unread request body");
        }
        drop(body);

        if head_only {
            self.writer.write_response_head(&mut self.connection, response).await?;
        } else {
            self.writer.write_response(&mut self.connection, response).await?;
        }
        Ok(())
    }

    /// Answers a client error with an error response and closes the connection.
    ///
    /// Failures below HTTP get no response, the transport is torn down right away.
    /// Once the peer ended the stream the error is only logged.
    async fn reject(mut self, e: ParseError) -> Result<(), HttpError> {
        let Some(status) = e.status_code() else {
            warn!(cause = %e, "can't receive next request, connection shutdown");
            self.connection.destroy();
            return Err(e.into());
        };

        if self.connection.is_ended() {
            warn!(cause = %e, status = status.as_u16(), "peer already ended the stream, skip error response");
            if let Err(close_error) = self.connection.close().await {
                debug!(cause = %close_error, "can't close connection after end of stream");
            }
            return Err(e.into());
        }

        warn!(cause = %e, status = status.as_u16(), "reject request");
        let response = HttpResponse::error(status, &e).with_header(Bytes::from_static(b"Connection: close"));
        match self.writer.write_response(&mut self.connection, response).await {
            Ok(()) => {
                if let Err(close_error) = self.connection.close().await {
                    debug!(cause = %close_error, "can't close connection after error response");
                }
            }
            Err(send_error) => {
                debug!(cause = %send_error, "can't send error response");
                self.connection.destroy();
            }
        }

        Err(e.into())
    }
}
