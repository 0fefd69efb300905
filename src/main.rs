//! sha256d-miner daemon
//!
//! Listens for job connections and runs the ingest → search → emit cycle
//! over each, one connection and one job at a time.

use sha256d_miner::{
    config::Config, engine::Engine, transport::TcpTransport, Result, APP_NAME, APP_VERSION,
};

use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load()?;

    // Initialize tracing; RUST_LOG overrides --log-level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.to_string()));
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();

    if config.print_config {
        print_configuration(&config)?;
        return Ok(());
    }

    info!("Starting {} v{}", APP_NAME, APP_VERSION);

    let listener = TcpListener::bind(config.listen_addr()?).await?;
    info!(listen = %config.listen, "waiting for job connections");

    // One connection at a time; the engine processes its jobs strictly in
    // sequence, so there is never more than one active search.
    loop {
        let (stream, peer) = listener.accept().await?;
        info!(%peer, "connection accepted");

        let engine = Engine::new(config.batch_size);
        let mut transport = TcpTransport::new(stream);
        match engine.run(&mut transport).await {
            Ok(()) => info!(%peer, "connection finished"),
            Err(err) => error!(%peer, category = err.category(), %err, "connection failed"),
        }
    }
}

/// Print current configuration as JSON
fn print_configuration(config: &Config) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(config)?);
    Ok(())
}
