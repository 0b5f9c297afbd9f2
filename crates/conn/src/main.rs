use std::error::Error;

use clap::{Parser, ValueEnum};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use micro_conn::codec::MAX_HEADER_BYTES;
use micro_conn::handler::DemoHandler;
use micro_conn::server::{Protocol, Server, DEFAULT_READ_BUFFER_SIZE};

#[derive(Parser)]
#[command(name = "micro-conn")]
#[command(about = "Line echo and HTTP/1.1 server over a backpressured connection core", long_about = None)]
struct Cli {
    /// Protocol spoken on accepted connections
    #[arg(short, long, value_enum, default_value_t = Mode::Http)]
    mode: Mode,

    /// Address to listen on, defaults to 127.0.0.1:8080 (http) or 127.0.0.1:8000 (line)
    #[arg(short, long)]
    address: Option<String>,

    /// Serve one connection at a time
    #[arg(long)]
    sequential: bool,

    /// Maximum bytes taken from the socket per read
    #[arg(long, default_value_t = DEFAULT_READ_BUFFER_SIZE)]
    read_buffer_size: usize,

    /// Maximum size of a request head
    #[arg(long, default_value_t = MAX_HEADER_BYTES)]
    max_header_size: usize,

    #[arg(long, default_value_t = Level::INFO)]
    log_level: Level,
}

#[derive(Clone, Copy, ValueEnum)]
enum Mode {
    /// HTTP/1.1 with the demo handler
    Http,
    /// Newline-delimited echo
    Line,
}

impl From<Mode> for Protocol {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Http => Protocol::Http,
            Mode::Line => Protocol::Line,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let cli = Cli::parse();

    let subscriber = FmtSubscriber::builder().with_max_level(cli.log_level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let mut builder = Server::builder()
        .protocol(cli.mode.into())
        .concurrent(!cli.sequential)
        .read_buffer_size(cli.read_buffer_size)
        .max_header_size(cli.max_header_size)
        .handler(DemoHandler::new());
    if let Some(address) = &cli.address {
        builder = builder.address(address.as_str());
    }
    let server = builder.build()?;

    let shutdown = CancellationToken::new();
    let ctrl_c = shutdown.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("receive ctrl-c, shutting down");
                ctrl_c.cancel();
            }
            Err(e) => warn!(cause = %e, "can't listen for ctrl-c"),
        }
    });

    server.run(shutdown).await?;
    Ok(())
}
