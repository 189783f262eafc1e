use anyhow::Result;
use arrlink::config::Config;
use dotenvy::dotenv;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=info"));
    // stdout carries protocol frames on the stdio transport.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let loaded = dotenv();
    init_tracing();
    match loaded {
        Ok(path) => info!("Loaded environment from {:?}", path),
        Err(e) => warn!("No .env file loaded ({}) - relying on environment", e),
    }
    let config = Config::from_env()?;
    info!(
        "Radarr at {} (key {}), Sonarr at {} (key {})",
        config.radarr_url,
        if config.radarr_api_key.is_some() { "set" } else { "missing" },
        config.sonarr_url,
        if config.sonarr_api_key.is_some() { "set" } else { "missing" },
    );
    arrlink::app::run(config).await
}
