use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;
mod forward;

use config::load_settings;
use forward::{build_router, ProxyState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = load_settings()?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&settings.log_filter))
        .init();

    let routes = settings.route_table()?;
    for route in routes.routes() {
        info!(prefix = %route.prefix, target = %route.target, "proxy: route");
    }
    let state = ProxyState::new(routes).context("failed to build upstream http client")?;
    let app = build_router(Arc::new(state));

    let addr: SocketAddr = settings
        .bind_addr
        .parse()
        .with_context(|| format!("invalid bind address '{}'", settings.bind_addr))?;
    info!(%addr, environment = %settings.environment, "proxy listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
