//! Now-playing chat server.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin encore-server -- --port 4000
//! ```

use clap::Parser;
use encore_server::ServerConfig;
use encore_shared::logger::setup_logger;

#[tokio::main]
async fn main() {
    let config = ServerConfig::parse();

    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), &config.log_level);

    // Run the server
    if let Err(e) = encore_server::run(config).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
