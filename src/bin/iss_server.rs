//! ISS tracker HTTP server
//!
//! Serves the position and sighting datasets over the routes listed at
//! `GET /help`. Configuration comes from `ISS_CONFIG` and `ISS_*` overrides.

use std::sync::Arc;

use anyhow::Context;
use iss_tracker::api::{create_router, ApiState};
use iss_tracker::{AppConfig, DatasetLoader, DatasetStore};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "iss_tracker=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting ISS tracker server");

    let config = AppConfig::load().context("loading configuration")?;
    tracing::info!(
        "Sources: positions={} sightings={}",
        config.position_source,
        config.sighting_source
    );

    let store = Arc::new(DatasetStore::new());
    let loader = Arc::new(
        DatasetLoader::from_config(store, &config).context("building source fetcher")?,
    );

    if config.preload {
        match loader.reload_all().await {
            Ok(report) => tracing::info!(
                "Preloaded {} positions and {} sightings",
                report.positions,
                report.sightings
            ),
            Err(e) => tracing::warn!("Preload failed, POST /load_data to retry: {}", e),
        }
    } else {
        tracing::info!("Data not loaded yet, POST /load_data to read it");
    }

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let state = ApiState::new(loader).with_dump_dir(config.dump_dir.clone());
    let app = create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("binding {}", config.bind_addr))?;
    tracing::info!("Listening on http://{}", config.bind_addr);

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
