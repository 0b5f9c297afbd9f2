//! TCP server bootstrap.
//!
//! [`Server::builder`] collects a [`ServerConfig`]; [`Server::run`] binds the
//! listener and hands every accepted stream to an [`HttpConnection`] or a
//! [`LineConnection`], either as its own task or one connection at a time.

use std::fmt;
use std::io;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4, ToSocketAddrs};
use std::sync::Arc;

use thiserror::Error;
use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, info_span, warn, Instrument};

use crate::codec::MAX_HEADER_BYTES;
use crate::connection::{Connection, HttpConnection, LineConnection};
use crate::ensure;
use crate::handler::Handler;
use crate::transport;

/// Default size of a single transport read
pub const DEFAULT_READ_BUFFER_SIZE: usize = 8 * 1024;

/// The protocol spoken on every accepted connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    Http,
    Line,
}

impl Protocol {
    /// `127.0.0.1:8080` for HTTP, `127.0.0.1:8000` for the line protocol.
    pub fn default_address(self) -> SocketAddr {
        let port = match self {
            Self::Http => 8080,
            Self::Line => 8000,
        };
        SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::LOCALHOST, port))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    address: Vec<SocketAddr>,
    protocol: Protocol,
    concurrent: bool,
    read_buffer_size: usize,
    max_header_size: usize,
}

impl ServerConfig {
    pub fn address(&self) -> &[SocketAddr] {
        &self.address
    }

    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    /// Whether connections are served concurrently or one at a time.
    pub fn concurrent(&self) -> bool {
        self.concurrent
    }

    pub fn read_buffer_size(&self) -> usize {
        self.read_buffer_size
    }

    pub fn max_header_size(&self) -> usize {
        self.max_header_size
    }
}

#[derive(Error, Debug)]
pub enum ServerBuildError {
    #[error("invalid address: {source}")]
    InvalidAddress { source: io::Error },
    #[error("handler must be set for the http protocol")]
    MissingHandler,
    #[error("{name} must be greater than zero")]
    ZeroSize { name: &'static str },
}

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("bind server error: {source}")]
    Bind { source: io::Error },
}

pub struct ServerBuilder {
    address: Option<io::Result<Vec<SocketAddr>>>,
    protocol: Protocol,
    concurrent: bool,
    read_buffer_size: usize,
    max_header_size: usize,
    handler: Option<Arc<dyn Handler>>,
}

impl ServerBuilder {
    fn new() -> Self {
        Self {
            address: None,
            protocol: Protocol::Http,
            concurrent: true,
            read_buffer_size: DEFAULT_READ_BUFFER_SIZE,
            max_header_size: MAX_HEADER_BYTES,
            handler: None,
        }
    }

    /// Defaults to [`Protocol::default_address`].
    pub fn address<A: ToSocketAddrs>(mut self, address: A) -> Self {
        self.address = Some(address.to_socket_addrs().map(Iterator::collect));
        self
    }

    pub fn protocol(mut self, protocol: Protocol) -> Self {
        self.protocol = protocol;
        self
    }

    /// `false` serves one connection at a time.
    pub fn concurrent(mut self, concurrent: bool) -> Self {
        self.concurrent = concurrent;
        self
    }

    pub fn read_buffer_size(mut self, read_buffer_size: usize) -> Self {
        self.read_buffer_size = read_buffer_size;
        self
    }

    pub fn max_header_size(mut self, max_header_size: usize) -> Self {
        self.max_header_size = max_header_size;
        self
    }

    pub fn handler(mut self, handler: impl Handler + 'static) -> Self {
        self.handler = Some(Arc::new(handler));
        self
    }

    pub fn build(self) -> Result<Server, ServerBuildError> {
        let address = match self.address {
            Some(Ok(address)) if address.is_empty() => {
                return Err(ServerBuildError::InvalidAddress { source: io::Error::from(io::ErrorKind::AddrNotAvailable) });
            }
            Some(Ok(address)) => address,
            Some(Err(source)) => return Err(ServerBuildError::InvalidAddress { source }),
            None => vec![self.protocol.default_address()],
        };

        ensure!(self.read_buffer_size > 0, ServerBuildError::ZeroSize { name: "read buffer size" });
        ensure!(self.max_header_size > 0, ServerBuildError::ZeroSize { name: "max header size" });

        let service = match self.protocol {
            Protocol::Http => Service::Http(self.handler.ok_or(ServerBuildError::MissingHandler)?),
            Protocol::Line => Service::Line,
        };

        let config = ServerConfig {
            address,
            protocol: self.protocol,
            concurrent: self.concurrent,
            read_buffer_size: self.read_buffer_size,
            max_header_size: self.max_header_size,
        };
        Ok(Server { config, service })
    }
}

impl fmt::Debug for ServerBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerBuilder")
            .field("address", &self.address)
            .field("protocol", &self.protocol)
            .field("concurrent", &self.concurrent)
            .field("has_handler", &self.handler.is_some())
            .finish_non_exhaustive()
    }
}

enum Service {
    Http(Arc<dyn Handler>),
    Line,
}

#[derive(Debug)]
pub struct Server {
    config: ServerConfig,
    service: Service,
}

impl fmt::Debug for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http(_) => f.write_str("Http"),
            Self::Line => f.write_str("Line"),
        }
    }
}

impl Server {
    pub fn builder() -> ServerBuilder {
        ServerBuilder::new()
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Binds the configured address and serves until `shutdown` is cancelled.
    pub async fn run(self, shutdown: CancellationToken) -> Result<(), ServerError> {
        info!(address = ?self.config.address, protocol = ?self.config.protocol, "start listening");
        let tcp_listener = TcpListener::bind(self.config.address.as_slice()).await.map_err(|source| {
            error!(cause = %source, "bind server error");
            ServerError::Bind { source }
        })?;

        self.serve(tcp_listener, shutdown).await;
        Ok(())
    }

    /// Accepts connections from `tcp_listener` until `shutdown` is cancelled.
    ///
    /// Cancelling `shutdown` also tears down every connection still being served.
    pub async fn serve(self, tcp_listener: TcpListener, shutdown: CancellationToken) {
        let server = Arc::new(self);
        loop {
            let (tcp_stream, remote_addr) = tokio::select! {
                biased;
                () = shutdown.cancelled() => {
                    info!("receive shutdown signal, stop accepting");
                    return;
                }
                accepted = tcp_listener.accept() => match accepted {
                    Ok(stream_and_addr) => stream_and_addr,
                    Err(e) => {
                        warn!(cause = %e, "failed to accept");
                        continue;
                    }
                },
            };

            let span = info_span!("connection", remote = %remote_addr);
            let task = Arc::clone(&server).serve_connection(tcp_stream, shutdown.clone()).instrument(span);
            if server.config.concurrent {
                tokio::spawn(task);
            } else {
                task.await;
            }
        }
    }

    async fn serve_connection(self: Arc<Self>, tcp_stream: TcpStream, shutdown: CancellationToken) {
        if let Err(e) = tcp_stream.set_nodelay(true) {
            debug!(cause = %e, "can't set TCP_NODELAY");
        }

        info!("accept connection");
        let connection = Connection::new(transport::spawn(tcp_stream, self.config.read_buffer_size));
        let teardown = connection.teardown_token();

        let process = async {
            match &self.service {
                Service::Http(handler) => {
                    let http_connection = HttpConnection::with_max_header_size(connection, self.config.max_header_size);
                    log_outcome(http_connection.process(Arc::clone(handler)).await);
                }
                Service::Line => log_outcome(LineConnection::new(connection).process().await),
            }
        };

        tokio::select! {
            () = process => {}
            () = shutdown.cancelled() => {
                debug!("server shutdown, tear connection down");
                teardown.cancel();
            }
        }
    }
}

fn log_outcome<E: fmt::Display>(result: Result<(), E>) {
    match result {
        Ok(()) => info!("finished process, connection shutdown"),
        Err(e) => error!(cause = %e, "service has error, connection shutdown"),
    }
}
