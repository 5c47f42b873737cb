use anyhow::Result;
use tracing_subscriber::EnvFilter;

use inlet::{Server, ServerConfig, StdoutSink};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let server = Server::bind(ServerConfig::default(), StdoutSink)?;
    let handle = server.start()?;
    handle.join();
    Ok(())
}
