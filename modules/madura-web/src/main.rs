use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use madura_common::Config;
use madura_web::{build_router, settings::validate_api_base, spawn_poller, AppState};

#[derive(Parser)]
#[command(name = "web", about = "Fermenter and batch tracking front-end")]
struct Cli {
    /// Backend base URL (overrides MADURA_API_BASE)
    #[arg(long)]
    api_base: Option<String>,

    /// Bind host (overrides WEB_HOST)
    #[arg(long)]
    host: Option<String>,

    /// Bind port (overrides WEB_PORT)
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Shell variables win over .env
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("madura_web=info".parse()?)
                .add_directive("madura_client=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    let mut config = Config::from_env()?;
    if let Some(base) = cli.api_base {
        config.api_base = validate_api_base(&base).map_err(anyhow::Error::msg)?;
    }
    if let Some(host) = cli.host {
        config.web_host = host;
    }
    if let Some(port) = cli.port {
        config.web_port = port;
    }

    let state = Arc::new(AppState::new(&config)?);
    spawn_poller(state.clone(), config.health_interval);

    let app = build_router(state);

    let addr = config.bind_addr();
    info!(api_base = %config.api_base, "Madura web server starting on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
