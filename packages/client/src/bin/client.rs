//! Terminal chat client for the Tertulia line-protocol server.
//!
//! Registers with the given username, prints every server line and sends
//! typed lines as chat messages. `/name <newname>` retries registration
//! after a rejected name; `/quit`, Ctrl+C or Ctrl+D exit.
//! Automatically reconnects on disconnection (max 5 attempts with 5 second interval).
//!
//! Run with:
//! ```not_rust
//! cargo run --bin tertulia-client -- --username alice
//! cargo run --bin tertulia-client -- -H 192.168.1.10 -p 12345 -u bob
//! ```

use clap::Parser;

use tertulia_client::run_client;
use tertulia_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "tertulia-client")]
#[command(about = "Terminal client for the Tertulia chat server", long_about = None)]
struct Args {
    /// Server address
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Server port
    #[arg(short = 'p', long, default_value = "12345")]
    port: u16,

    /// Username to register with (3-15 letters, digits, '_' or '-')
    #[arg(short = 'u', long)]
    username: String,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    let args = Args::parse();

    // Run the client
    if let Err(e) = run_client(args.host, args.port, args.username).await {
        tracing::error!("Client error: {}", e);
        std::process::exit(1);
    }
}
