use std::sync::Arc;

use attendance_tracker::api::router;
use attendance_tracker::config::AppConfig;
use attendance_tracker::db::SqliteStore;
use attendance_tracker::state::AppState;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "attendance_tracker=debug".to_string()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::new_from_env()?;

    let store = SqliteStore::connect(&config.database_url, config.max_connections).await?;
    store.migrate().await?;

    let state = AppState {
        store: Arc::new(store),
        config: config.clone(),
    };

    let app = router(state);

    info!(
        "listening on http://{} (threshold {}%)",
        config.bind_addr,
        config.threshold.percent()
    );

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
