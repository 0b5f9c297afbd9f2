//! Drives a tokio byte stream through the push-transport contract.

use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, trace};

use super::{channel, InboundPeer, Outbound, OutboundPeer, TransportEvent, TransportHandle};

/// Spawns the reader and writer tasks for `io` and returns the connection's handle.
///
/// The reader task issues one read of up to `read_buffer_size` bytes per granted
/// demand, so nothing is pulled off the socket while no read is outstanding. The
/// writer task writes every outbound chunk fully before acknowledging it.
///
/// Must be called from within a tokio runtime.
pub fn spawn<IO>(io: IO, read_buffer_size: usize) -> TransportHandle
where
    IO: AsyncRead + AsyncWrite + Send + 'static,
{
    let (handle, peer) = channel();
    let (reader, writer) = tokio::io::split(io);
    let (inbound, outbound) = peer.into_split();

    tokio::spawn(read_loop(reader, inbound, read_buffer_size));
    tokio::spawn(write_loop(writer, outbound));

    handle
}

async fn read_loop<R>(mut reader: R, peer: InboundPeer, read_buffer_size: usize)
where
    R: AsyncRead + Unpin,
{
    let mut buf = BytesMut::with_capacity(read_buffer_size);

    while peer.demanded().await {
        buf.reserve(read_buffer_size);

        let read_result = tokio::select! {
            biased;
            () = peer.torn_down() => break,
            read_result = reader.read_buf(&mut buf) => read_result,
        };

        let event = match read_result {
            Ok(0) => TransportEvent::End,
            Ok(size) => {
                trace!(size, "read bytes from transport");
                TransportEvent::Data(buf.split().freeze())
            }
            Err(e) => TransportEvent::Error(e),
        };

        let terminal = !matches!(event, TransportEvent::Data(_));
        if !peer.deliver(event).await || terminal {
            break;
        }
    }

    trace!("transport reader finished");
}

async fn write_loop<W>(mut writer: W, mut peer: OutboundPeer)
where
    W: AsyncWrite + Unpin,
{
    while let Some(outbound) = peer.next().await {
        match outbound {
            Outbound::Write { data, ack } => {
                let write_result = tokio::select! {
                    biased;
                    () = peer.torn_down() => break,
                    write_result = write_and_flush(&mut writer, &data) => write_result,
                };

                let failed = write_result.is_err();
                if ack.send(write_result).is_err() {
                    debug!("write acknowledgement receiver dropped");
                }
                if failed {
                    break;
                }
            }

            Outbound::Shutdown { ack } => {
                let shutdown_result = writer.shutdown().await;
                if ack.send(shutdown_result).is_err() {
                    debug!("shutdown acknowledgement receiver dropped");
                }
                break;
            }
        }
    }

    trace!("transport writer finished");
}

async fn write_and_flush<W>(writer: &mut W, data: &[u8]) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(data).await?;
    writer.flush().await
}
