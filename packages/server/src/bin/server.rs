//! Line-oriented TCP chat server.
//!
//! Clients register with `USER:<name>` and chat with `MSG:<text>`.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin tertulia-server
//! cargo run --bin tertulia-server -- --host 127.0.0.1 --port 12345 --admin-port 8080
//! ```

use std::time::Duration;

use clap::Parser;
use tertulia_server::{
    config::ServerConfig,
    ui::{ChatServer, shutdown_signal},
    usecase::dispatcher::DEFAULT_SEND_TIMEOUT,
};
use tertulia_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "tertulia-server")]
#[command(about = "Line-oriented TCP chat server with history replay", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, default_value = "0.0.0.0")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, default_value = "12345")]
    port: u16,

    /// Number of recent chat lines replayed to newcomers
    #[arg(long, default_value = "100")]
    history_capacity: usize,

    /// Maximum concurrent connections (0 = unlimited)
    #[arg(long, default_value = "0")]
    max_connections: usize,

    /// Consecutive failed deliveries before a client is dropped (0 = never)
    #[arg(long, default_value = "3")]
    max_send_failures: u32,

    /// Seconds connections get to close on shutdown
    #[arg(long, default_value = "5")]
    shutdown_grace_secs: u64,

    /// Port for the read-only admin HTTP API (disabled when omitted)
    #[arg(long)]
    admin_port: Option<u16>,
}

impl From<Args> for ServerConfig {
    fn from(args: Args) -> Self {
        Self {
            host: args.host,
            port: args.port,
            history_capacity: args.history_capacity,
            max_connections: args.max_connections,
            max_send_failures: args.max_send_failures,
            send_timeout: DEFAULT_SEND_TIMEOUT,
            shutdown_grace: Duration::from_secs(args.shutdown_grace_secs),
            admin_port: args.admin_port,
        }
    }
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    let config = ServerConfig::from(Args::parse());

    let server = match ChatServer::bind(config).await {
        Ok(server) => server,
        Err(e) => {
            tracing::error!("Server error: {}", e);
            std::process::exit(1);
        }
    };

    tracing::info!("Press Ctrl+C to shutdown gracefully");
    if let Err(e) = server.run_until(shutdown_signal()).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
