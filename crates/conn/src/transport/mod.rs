//! Push-based transport collaborator.
//!
//! A transport delivers inbound byte chunks as events and accepts outbound
//! writes with an acknowledgement. This module models that contract with
//! channels instead of shared callback state:
//!
//! - [`TransportHandle`]: the side owned by a [`Connection`](crate::connection::Connection).
//!   It grants demand, receives events and submits writes.
//! - [`TransportPeer`]: the side driven by the actual transport. It waits for
//!   demand, pushes events and serves writes.
//!
//! # Backpressure
//!
//! Delivery is demand-driven. [`TransportHandle::resume`] grants exactly one
//! event; the transport stays paused until the next grant. Granting twice
//! without an event in between still yields a single event, so a transport
//! never has more than one chunk in flight towards its connection.
//!
//! # Teardown
//!
//! Both sides share a [`CancellationToken`]. Cancelling it (through
//! [`TransportHandle::destroy`], a cloned [`TransportHandle::teardown_token`],
//! or dropping the handle) makes every suspended operation on either side
//! resolve instead of waiting forever.
//!
//! [`spawn`] drives any tokio `AsyncRead + AsyncWrite` through a peer.

mod io;

pub use io::spawn;

use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::{mpsc, oneshot, Notify};
use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};
use tracing::trace;

use crate::protocol::ConnectionError;

/// One notification pushed by the transport.
#[derive(Debug)]
pub enum TransportEvent {
    /// A chunk of inbound bytes.
    Data(Bytes),
    /// The peer finished sending.
    End,
    /// The transport failed.
    Error(std::io::Error),
}

/// A request from the connection to the transport's write side.
#[derive(Debug)]
pub enum Outbound {
    /// Enqueue `data`; `ack` resolves once the transport accepted it.
    Write { data: Bytes, ack: oneshot::Sender<std::io::Result<()>> },
    /// Finish the write side; `ack` resolves once it is shut down.
    Shutdown { ack: oneshot::Sender<std::io::Result<()>> },
}

/// Creates a connected handle/peer pair.
pub fn channel() -> (TransportHandle, TransportPeer) {
    let demand = Arc::new(Notify::new());
    let teardown = CancellationToken::new();
    let (event_sender, event_receiver) = mpsc::channel(1);
    let (outbound_sender, outbound_receiver) = mpsc::channel(1);

    let handle = TransportHandle {
        demand: Arc::clone(&demand),
        events: event_receiver,
        outbound: outbound_sender,
        teardown: teardown.clone(),
    };

    let peer = TransportPeer {
        inbound: InboundPeer { demand, events: event_sender, teardown: teardown.clone() },
        outbound: OutboundPeer { outbound: outbound_receiver, teardown },
    };

    (handle, peer)
}

/// The connection's side of a transport.
#[derive(Debug)]
pub struct TransportHandle {
    demand: Arc<Notify>,
    events: mpsc::Receiver<TransportEvent>,
    outbound: mpsc::Sender<Outbound>,
    teardown: CancellationToken,
}

impl TransportHandle {
    /// Lets the transport deliver exactly one more event.
    #[inline]
    pub fn resume(&self) {
        self.demand.notify_one();
    }

    /// Waits for the next event.
    ///
    /// Fails with [`ConnectionError::Destroyed`] once the transport is torn down or
    /// its peer went away.
    pub async fn next_event(&mut self) -> Result<TransportEvent, ConnectionError> {
        tokio::select! {
            biased;
            () = self.teardown.cancelled() => Err(ConnectionError::Destroyed),
            event = self.events.recv() => event.ok_or(ConnectionError::Destroyed),
        }
    }

    /// Enqueues `data` and waits for the transport's acknowledgement.
    pub async fn write(&self, data: Bytes) -> Result<(), ConnectionError> {
        let (ack, acked) = oneshot::channel();
        self.submit(Outbound::Write { data, ack }, acked).await
    }

    /// Shuts the write side down, waiting for the transport's acknowledgement.
    pub async fn shutdown(&self) -> Result<(), ConnectionError> {
        let (ack, acked) = oneshot::channel();
        self.submit(Outbound::Shutdown { ack }, acked).await
    }

    async fn submit(&self, outbound: Outbound, acked: oneshot::Receiver<std::io::Result<()>>) -> Result<(), ConnectionError> {
        let submit_and_wait = async {
            self.outbound.send(outbound).await.map_err(|_closed| ConnectionError::Destroyed)?;
            match acked.await {
                Ok(result) => result.map_err(ConnectionError::transport),
                Err(_canceled) => Err(ConnectionError::Destroyed),
            }
        };

        tokio::select! {
            biased;
            () = self.teardown.cancelled() => Err(ConnectionError::Destroyed),
            result = submit_and_wait => result,
        }
    }

    /// Tears the transport down; suspended operations on both sides resolve.
    pub fn destroy(&self) {
        if !self.teardown.is_cancelled() {
            trace!("destroy transport");
            self.teardown.cancel();
        }
    }

    pub fn is_destroyed(&self) -> bool {
        self.teardown.is_cancelled()
    }

    /// A token that tears this transport down when cancelled from anywhere.
    pub fn teardown_token(&self) -> CancellationToken {
        self.teardown.clone()
    }
}

impl Drop for TransportHandle {
    fn drop(&mut self) {
        self.teardown.cancel();
    }
}

/// The transport's side of the contract.
#[derive(Debug)]
pub struct TransportPeer {
    inbound: InboundPeer,
    outbound: OutboundPeer,
}

impl TransportPeer {
    /// Splits the peer so that reading and writing can be driven by separate tasks.
    pub fn into_split(self) -> (InboundPeer, OutboundPeer) {
        (self.inbound, self.outbound)
    }

    pub fn inbound(&self) -> &InboundPeer {
        &self.inbound
    }

    pub fn outbound(&mut self) -> &mut OutboundPeer {
        &mut self.outbound
    }
}

/// Delivers inbound events when the connection asks for them.
#[derive(Debug)]
pub struct InboundPeer {
    demand: Arc<Notify>,
    events: mpsc::Sender<TransportEvent>,
    teardown: CancellationToken,
}

impl InboundPeer {
    /// Waits until the connection grants one event.
    ///
    /// Returns `false` once the transport is torn down.
    pub async fn demanded(&self) -> bool {
        tokio::select! {
            biased;
            () = self.teardown.cancelled() => false,
            () = self.demand.notified() => true,
        }
    }

    /// Pushes one event. Returns `false` if the connection side is gone.
    pub async fn deliver(&self, event: TransportEvent) -> bool {
        tokio::select! {
            biased;
            () = self.teardown.cancelled() => false,
            sent = self.events.send(event) => sent.is_ok(),
        }
    }

    /// Resolves once the transport is torn down.
    pub fn torn_down(&self) -> WaitForCancellationFuture<'_> {
        self.teardown.cancelled()
    }
}

/// Serves the connection's outbound requests.
#[derive(Debug)]
pub struct OutboundPeer {
    outbound: mpsc::Receiver<Outbound>,
    teardown: CancellationToken,
}

impl OutboundPeer {
    /// The next outbound request, or `None` once the transport is torn down.
    pub async fn next(&mut self) -> Option<Outbound> {
        tokio::select! {
            biased;
            () = self.teardown.cancelled() => None,
            outbound = self.outbound.recv() => outbound,
        }
    }

    /// Resolves once the transport is torn down.
    pub fn torn_down(&self) -> WaitForCancellationFuture<'_> {
        self.teardown.cancelled()
    }
}
