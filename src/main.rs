use std::{net::SocketAddr, path::Path, sync::Arc};

use anyhow::{Context, Result};
use motor_metrics::{AppState, config::Settings, listing_api, makes, routes};
use tokio::net::TcpListener;
use tower_http::services::ServeDir;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file first. Ignore errors (e.g., file not found)
    dotenv::dotenv().ok();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "motor_metrics=info,tower_http=info".into()),
        )
        .with(fmt::layer())
        .init();

    tracing::info!("Initializing Motor Metrics server...");

    let settings = match Settings::new() {
        Ok(s) => {
            tracing::info!("Configuration loaded successfully.");
            s
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e);
        }
    };

    // Reference data is loaded once, before any request is served
    makes::init(settings.makes_file.as_deref().map(Path::new))?;

    let http_client = Arc::new(listing_api::build_client(&settings)?);
    tracing::info!(search_url = %settings.search_url, "Shared HTTP client created.");

    let addr: SocketAddr = settings.server_address.parse().with_context(|| {
        format!("Invalid server address format: {}", settings.server_address)
    })?;

    let app_state = AppState::new(settings, http_client);
    let app = routes::create_router(app_state).nest_service("/static", ServeDir::new("static"));

    let listener = match TcpListener::bind(&addr).await {
        Ok(l) => {
            tracing::info!("Server listening on {}", addr);
            l
        }
        Err(e) => {
            tracing::error!("Failed to bind to address {}: {}", addr, e);
            return Err(e.into());
        }
    };

    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}
