use bytes::Bytes;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::protocol::ConnectionError;
use crate::transport::{TransportEvent, TransportHandle};

/// Lifecycle of a [`Connection`]. `Ended` and `Errored` are terminal.
#[derive(Debug, Clone)]
pub enum ConnectionState {
    Open,
    /// The peer finished sending; reads return empty from now on.
    Ended,
    /// The transport failed; every operation fails with the latched error.
    Errored(ConnectionError),
}

/// A sequential read/write interface over a push transport.
///
/// `read` takes `&mut self`, so the borrow checker guarantees at most one
/// outstanding read per connection. While no read is outstanding the transport
/// is paused; each read grants the transport exactly one event and resolves
/// with it.
#[derive(Debug)]
pub struct Connection {
    transport: TransportHandle,
    state: ConnectionState,
}

impl Connection {
    pub fn new(transport: TransportHandle) -> Self {
        Self { transport, state: ConnectionState::Open }
    }

    pub fn state(&self) -> &ConnectionState {
        &self.state
    }

    pub fn is_ended(&self) -> bool {
        matches!(self.state, ConnectionState::Ended)
    }

    /// Returns the next chunk of bytes, or an empty `Bytes` at end of stream.
    ///
    /// Once the stream ended every call returns empty immediately; once the
    /// transport failed every call returns the same error.
    pub async fn read(&mut self) -> Result<Bytes, ConnectionError> {
        loop {
            match &self.state {
                ConnectionState::Open => {}
                ConnectionState::Ended => return Ok(Bytes::new()),
                ConnectionState::Errored(e) => return Err(e.clone()),
            }

            self.transport.resume();
            match self.transport.next_event().await {
                Ok(TransportEvent::Data(bytes)) if bytes.is_empty() => {
                    trace!("ignore empty data event");
                }
                Ok(TransportEvent::Data(bytes)) => {
                    trace!(size = bytes.len(), "connection read");
                    return Ok(bytes);
                }
                Ok(TransportEvent::End) => {
                    debug!("connection reached end of stream");
                    self.state = ConnectionState::Ended;
                    return Ok(Bytes::new());
                }
                Ok(TransportEvent::Error(e)) => return Err(self.latch(ConnectionError::transport(e))),
                Err(e) => return Err(self.latch(e)),
            }
        }
    }

    /// Enqueues `data` and resolves once the transport acknowledged it.
    ///
    /// Writes after end of stream resolve immediately without reaching the
    /// transport; writes after a transport failure fail with the latched error.
    pub async fn write(&mut self, data: Bytes) -> Result<(), ConnectionError> {
        match &self.state {
            ConnectionState::Open => {}
            ConnectionState::Ended => {
                trace!(size = data.len(), "drop write after end of stream");
                return Ok(());
            }
            ConnectionState::Errored(e) => return Err(e.clone()),
        }

        if data.is_empty() {
            return Ok(());
        }

        trace!(size = data.len(), "connection write");
        match self.transport.write(data).await {
            Ok(()) => Ok(()),
            Err(e) => Err(self.latch(e)),
        }
    }

    /// Shuts the write side down gracefully, then tears the transport down.
    pub async fn close(&mut self) -> Result<(), ConnectionError> {
        if let ConnectionState::Errored(e) = &self.state {
            return Err(e.clone());
        }

        let result = self.transport.shutdown().await;
        self.destroy();
        result
    }

    /// Tears the transport down without a graceful shutdown.
    pub fn destroy(&mut self) {
        self.transport.destroy();
        if !matches!(self.state, ConnectionState::Errored(_)) {
            self.state = ConnectionState::Errored(ConnectionError::Destroyed);
        }
    }

    /// A token that tears this connection's transport down when cancelled.
    ///
    /// Suspended reads and writes of the owning task then resolve with
    /// [`ConnectionError::Destroyed`].
    pub fn teardown_token(&self) -> CancellationToken {
        self.transport.teardown_token()
    }

    fn latch(&mut self, e: ConnectionError) -> ConnectionError {
        if !matches!(e, ConnectionError::Destroyed) {
            warn!(cause = %e, "connection failed");
        }
        self.state = ConnectionState::Errored(e.clone());
        e
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{channel, Outbound};
    use std::io;
    use std::time::Duration;

    #[tokio::test]
    async fn read_resolves_with_one_event() {
        let (handle, peer) = channel();
        let mut connection = Connection::new(handle);

        let transport = async {
            assert!(peer.inbound().demanded().await);
            assert!(peer.inbound().deliver(TransportEvent::Data(Bytes::from_static(b"abc"))).await);
        };

        let (read, ()) = tokio::join!(connection.read(), transport);
        assert_eq!(&read.unwrap()[..], b"abc");
    }

    #[tokio::test]
    async fn end_of_stream_is_sticky() {
        let (handle, peer) = channel();
        let mut connection = Connection::new(handle);

        let transport = async {
            assert!(peer.inbound().demanded().await);
            assert!(peer.inbound().deliver(TransportEvent::End).await);
        };

        let (read, ()) = tokio::join!(connection.read(), transport);
        assert!(read.unwrap().is_empty());
        assert!(connection.is_ended());

        // no further demand is granted, the peer would block forever otherwise
        assert!(connection.read().await.unwrap().is_empty());
        assert!(connection.read().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn transport_error_is_sticky() {
        let (handle, mut peer) = channel();
        let mut connection = Connection::new(handle);

        let transport = async {
            assert!(peer.inbound().demanded().await);
            let e = io::Error::new(io::ErrorKind::ConnectionReset, "reset by peer");
            assert!(peer.inbound().deliver(TransportEvent::Error(e)).await);
        };

        let (read, ()) = tokio::join!(connection.read(), transport);
        let first = read.unwrap_err();
        assert!(matches!(first, ConnectionError::Transport { .. }));

        let second = connection.read().await.unwrap_err();
        assert_eq!(second.to_string(), first.to_string());

        let write = connection.write(Bytes::from_static(b"x")).await.unwrap_err();
        assert_eq!(write.to_string(), first.to_string());

        // the failed connection never reached the transport's write side
        assert!(tokio::time::timeout(Duration::from_millis(20), peer.outbound().next()).await.is_err());
    }

    #[tokio::test]
    async fn write_error_latches() {
        let (handle, mut peer) = channel();
        let mut connection = Connection::new(handle);

        let transport = async {
            match peer.outbound().next().await {
                Some(Outbound::Write { ack, .. }) => {
                    ack.send(Err(io::Error::from(io::ErrorKind::BrokenPipe))).unwrap();
                }
                other => panic!("unexpected outbound {other:?}"),
            }
        };

        let (write, ()) = tokio::join!(connection.write(Bytes::from_static(b"x")), transport);
        assert!(matches!(write, Err(ConnectionError::Transport { .. })));
        assert!(matches!(connection.state(), ConnectionState::Errored(_)));
        assert!(connection.read().await.is_err());
    }

    #[tokio::test]
    async fn write_after_end_is_noop() {
        let (handle, mut peer) = channel();
        let mut connection = Connection::new(handle);

        let end = async {
            assert!(peer.inbound().demanded().await);
            assert!(peer.inbound().deliver(TransportEvent::End).await);
        };
        let (read, ()) = tokio::join!(connection.read(), end);
        assert!(read.unwrap().is_empty());

        // nobody acknowledges, the write must not wait for the transport
        connection.write(Bytes::from_static(b"late reply")).await.unwrap();
        assert!(connection.is_ended());
        assert!(tokio::time::timeout(Duration::from_millis(20), peer.outbound().next()).await.is_err());
    }

    #[tokio::test]
    async fn teardown_resolves_suspended_write() {
        let (handle, mut peer) = channel();
        let mut connection = Connection::new(handle);
        let token = connection.teardown_token();

        // the write is taken but never acknowledged
        let teardown = async {
            let pending = peer.outbound().next().await;
            assert!(matches!(pending, Some(Outbound::Write { .. })));
            tokio::time::sleep(Duration::from_millis(10)).await;
            token.cancel();
            pending
        };

        let (write, _pending) = tokio::join!(connection.write(Bytes::from_static(b"stuck")), teardown);
        assert!(matches!(write, Err(ConnectionError::Destroyed)));
        assert!(matches!(connection.state(), ConnectionState::Errored(ConnectionError::Destroyed)));
        assert!(matches!(connection.write(Bytes::from_static(b"x")).await, Err(ConnectionError::Destroyed)));
    }

    #[tokio::test]
    async fn teardown_resolves_suspended_read() {
        let (handle, _peer) = channel();
        let mut connection = Connection::new(handle);
        let token = connection.teardown_token();

        let teardown = async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            token.cancel();
        };

        let (read, ()) = tokio::join!(connection.read(), teardown);
        assert!(matches!(read, Err(ConnectionError::Destroyed)));
        assert!(matches!(connection.read().await, Err(ConnectionError::Destroyed)));
    }

    #[tokio::test]
    async fn destroy_fails_later_operations() {
        let (handle, _peer) = channel();
        let mut connection = Connection::new(handle);

        connection.destroy();
        assert!(matches!(connection.read().await, Err(ConnectionError::Destroyed)));
        assert!(matches!(connection.write(Bytes::from_static(b"x")).await, Err(ConnectionError::Destroyed)));
    }
}
