//! IoT Device Dashboard Backend
//!
//! A REST backend serving device, dashboard and auth endpoints from a SQLite
//! store, degrading to fixed sample data whenever the store is unavailable.

mod api;
mod auth;
mod config;
mod dashboard;
mod db;
mod errors;
mod models;
mod sample;

use std::sync::Arc;

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use config::Config;
use db::DataSource;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub data: DataSource,
    pub config: Arc<Config>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env();

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting IoT Dashboard Backend");
    tracing::info!("Bind address: {}", config.bind_addr);

    // Open the store if configured. Absence or failure degrades to sample
    // data; it never aborts startup.
    let data = match &config.db_path {
        Some(path) => match db::init_database(path, config.db_max_connections).await {
            Ok(pool) => {
                tracing::info!("Store connected: {:?}", path);
                DataSource::new(pool)
            }
            Err(err) => {
                tracing::warn!("Store init failed ({}); serving sample data", err);
                DataSource::without_store()
            }
        },
        None => {
            tracing::warn!("No IOT_DB_PATH configured; serving sample data");
            DataSource::without_store()
        }
    };

    let state = AppState {
        data: data.clone(),
        config: Arc::new(config.clone()),
    };

    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // The entry point owns the store lifecycle; release the pool on the way out.
    data.close().await;
    tracing::info!("Store connections closed");

    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c().await.ok();
    tracing::info!("Shutdown signal received");
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    // The dashboard frontend is served from a different origin
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        // Health
        .route("/health", get(api::health_check))
        // Auth
        .route("/auth/login", post(api::login))
        .route("/auth/verify", get(api::verify))
        .route("/auth/logout", post(api::logout))
        // Devices
        .route("/devices", get(api::list_devices))
        .route("/devices", post(api::create_device))
        .route("/devices/{id}", get(api::get_device))
        .route("/devices/{id}", put(api::update_device))
        .route("/devices/{id}", delete(api::delete_device))
        // Dashboard
        .route("/dashboard", get(api::get_dashboard));

    Router::new()
        .nest("/api", api_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests;
