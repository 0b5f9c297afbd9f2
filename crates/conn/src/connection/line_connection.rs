use bytes::{Bytes, BytesMut};
use tracing::{debug, info, trace};

use crate::buffer::GrowableBuffer;
use crate::codec::{Framer, LineFramer};
use crate::connection::Connection;
use crate::protocol::ParseError;

const QUIT: &[u8] = b"quit\n";
const GOODBYE: &[u8] = b"Goodbye!";
const ECHO_PREFIX: &[u8] = b"Echo: ";

/// A connection speaking the newline-delimited echo protocol.
///
/// Every `\n`-terminated message is answered with `Echo: ` followed by the
/// message. `quit\n` is answered with `Goodbye!` and closes the connection.
#[derive(Debug)]
pub struct LineConnection {
    connection: Connection,
    buffer: GrowableBuffer,
    framer: LineFramer,
}

impl LineConnection {
    pub fn new(connection: Connection) -> Self {
        Self { connection, buffer: GrowableBuffer::new(), framer: LineFramer::new() }
    }

    /// Answers messages until `quit` or end of stream.
    pub async fn process(mut self) -> Result<(), ParseError> {
        loop {
            let Some(message) = self.framer.decode(&mut self.buffer)? else {
                let data = self.connection.read().await?;
                if data.is_empty() {
                    if !self.buffer.is_empty() {
                        debug!(size = self.buffer.len(), "discard unterminated message at end of stream");
                    }
                    info!("peer finished sending, close line connection");
                    self.connection.close().await?;
                    return Ok(());
                }
                self.buffer.push(&data);
                continue;
            };

            if &message[..] == QUIT {
                info!("receive quit, close line connection");
                self.connection.write(Bytes::from_static(GOODBYE)).await?;
                self.connection.close().await?;
                return Ok(());
            }

            trace!(size = message.len(), "echo message");
            let mut reply = BytesMut::with_capacity(ECHO_PREFIX.len() + message.len());
            reply.extend_from_slice(ECHO_PREFIX);
            reply.extend_from_slice(&message);
            self.connection.write(reply.freeze()).await?;
        }
    }
}
