use anyhow::Context;
use axum::http::{HeaderValue, Method, header};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use learning_center_server::{
    AppState, DocumentStore, app_router, config::Config, constants::DEFAULT_LOG_FILTER,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().context("Configuration error")?;

    let store = DocumentStore::open(&config.data_path)
        .await
        .with_context(|| format!("Failed to open data directory {}", config.data_path))?;
    tracing::info!(data_path = %config.data_path, "document store ready");

    let app_state = AppState::new(store);

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT]);
    let cors = match &config.frontend_origin {
        Some(origin) => {
            let origin_header = origin
                .parse::<HeaderValue>()
                .with_context(|| format!("Invalid FRONTEND_ORIGIN '{}'", origin))?;
            cors.allow_origin(origin_header)
        }
        None => cors.allow_origin(Any),
    };

    let app = app_router(app_state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    let bind_address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind to {}", bind_address))?;

    tracing::info!("Server running on http://{}", bind_address);

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
