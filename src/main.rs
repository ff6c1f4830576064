use anyhow::Result;
use tracing::info;

use petrel_uci::UciEngine;

fn main() -> Result<()> {
    // Log to stderr; stdout carries the UCI protocol.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();
    info!("petrel starting");

    UciEngine::new().run()?;
    Ok(())
}
