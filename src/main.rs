//! File storage server - Entry Point
//!
//! Stores uploaded files under a root directory and serves deletes,
//! folder creation and zip exports over HTTP.

use log::{error, info};

use file_storage::Server;
use file_storage::config::ServerConfig;
use file_storage::error::ServerError;

#[tokio::main]
async fn main() {
    // RUST_LOG overrides the default level
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("Launching file storage server...");

    if let Err(e) = run().await {
        error!("{}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), ServerError> {
    let config = ServerConfig::load()?;
    let server = Server::new(config)?;
    server.start().await
}
