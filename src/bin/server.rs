//! Rendezvous relay server for the arcdps cooldown HUD.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin relay-server
//! cargo run --bin relay-server -- --host 0.0.0.0 --port 3000
//! ```
//!
//! The default bind is loopback-only; a reverse proxy or tunnel is expected
//! to provide external exposure and TLS termination.

use std::path::PathBuf;

use clap::Parser;
use cooldown_relay::{common::logger::setup_logger, server::run_server};

#[derive(Parser, Debug)]
#[command(name = "relay-server")]
#[command(about = "HTTP relay for squad cooldown state", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, default_value = "3456")]
    port: u16,

    /// Directory containing the downloadable plugin binary
    #[arg(long, default_value = ".")]
    asset_dir: PathBuf,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    let args = Args::parse();

    if let Err(e) = run_server(args.host, args.port, args.asset_dir).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
