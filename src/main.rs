// [library] Error handling crate - `Result<T>` is `Result<T, anyhow::Error>`
use anyhow::Result;

// [library] HTTP utilities from axum web framework
use axum::http::{
    header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
    HeaderValue, Method,
};

use std::sync::Arc;

use storefront::{
    config::Config,
    db::create_pool,
    orders::{MySqlOrderStore, OrderService},
    web::{self, AppState},
};

// [library] Tower ecosystem - middleware for CORS and request tracing
use tower_http::{cors::CorsLayer, trace::TraceLayer};

// [library] Structured logging framework
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
    // [library] Environment-based log filtering - RUST_LOG overrides the default
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("storefront=info,tower_http=debug")),
        )
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting storefront API");

    let config = Config::from_env()?;
    let bind_address = config.bind_address();

    info!("Connecting to database...");
    let db = create_pool(&config).await?;
    info!("Database connection pool established");

    // [business] The order service gets the pool as an explicit dependency
    let orders = OrderService::new(Arc::new(MySqlOrderStore::new(db.clone())));

    let allowed_origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    let app = web::create_app_router(AppState::new(db, config, orders))
        .layer(
            // [security] Browser storefront sends bearer tokens, not cookies
            CorsLayer::new()
                .allow_origin(allowed_origins)
                .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
                .allow_headers([ACCEPT, AUTHORIZATION, CONTENT_TYPE]),
        )
        .layer(TraceLayer::new_for_http());

    info!("Server starting on {}", bind_address);
    let listener = tokio::net::TcpListener::bind(&bind_address).await?;

    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}
