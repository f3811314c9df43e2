use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use marquee_api::{app, sessions, AppState};
use marquee_core::storage::KeyValueStore;
use marquee_store::app_config::{Config, StorageBackend};
use marquee_store::{MemoryStore, RedisStore};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "marquee_api=debug,marquee_booking=debug,marquee_store=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("Failed to load config")?;
    tracing::info!("Starting Marquee API on port {}", config.server.port);

    let store: Arc<dyn KeyValueStore> = match config.storage.backend {
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage, reservations are lost on restart");
            Arc::new(MemoryStore::new())
        }
        StorageBackend::Redis => {
            let url = config
                .storage
                .redis_url
                .as_deref()
                .context("storage.redis_url is required for the redis backend")?;
            let redis = RedisStore::new(url).await.context("Failed to connect to Redis")?;
            Arc::new(redis)
        }
    };

    let state = AppState::from_config(&config, store);
    let _sweeper = sessions::spawn_idle_sweeper(state.clone());
    let app = app(state);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address")?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
