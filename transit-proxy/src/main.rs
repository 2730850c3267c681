use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use transit_proxy::cache::{CacheConfig, ResponseCache};
use transit_proxy::config::Config;
use transit_proxy::here::{HereClient, HereConfig};
use transit_proxy::supplemental::ExtraBoards;
use transit_proxy::web::{AppState, create_router};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "transit_proxy=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    // A missing or broken file only disables merging
    let extra_boards = ExtraBoards::load_or_empty(&config.extra_departures_path);

    let mut here_config = HereConfig::new(&config.here_api_key);
    if let Some(url) = &config.here_base_url {
        here_config = here_config.with_base_url(url);
    }
    let here = HereClient::new(here_config)?;

    let cache = ResponseCache::new(&CacheConfig::new(config.cache_ttl));

    let state = AppState::new(here, cache, extra_boards);
    let app = create_router(state);

    let addr = config.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "transit proxy listening");
    info!("  GET /api/stations?latitude=&longitude=&radius=");
    info!("  GET /api/departures?stationId=");
    info!("  GET /health");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
