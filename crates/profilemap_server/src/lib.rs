//! HTTP server for profilemap: JSON API plus server-rendered pages.
//!
//! # Responsibility
//! - Compose configuration, logging, store and providers at startup.
//! - Route requests to API and page handlers.
//!
//! # Invariants
//! - All handlers share one [`AppState`]; there is no global client.
//! - Shutdown waits for in-flight requests after Ctrl+C or SIGTERM.

use std::time::Duration;

use axum::{
    http::{header::CONTENT_TYPE, Method},
    routing::get,
    Router,
};
use log::{error, info};
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::CorsLayer;

pub mod api;
pub mod config;
pub mod error;
pub mod pages;
pub mod state;
mod templates;

pub use config::{Config, ConfigError};
pub use error::{AppError, StartupError};
pub use state::AppState;

/// Builds the full application router over `state`.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    let api = Router::new()
        .route(
            "/api/profiles",
            get(api::list_profiles).post(api::create_profile),
        )
        .route(
            "/api/profiles/{id}",
            get(api::get_profile)
                .put(api::update_profile)
                .delete(api::delete_profile),
        )
        .route("/api/geocode", get(api::geocode))
        .route("/api/health", get(api::health))
        .layer(cors);

    Router::new()
        .merge(api)
        .merge(pages::routes())
        .fallback(pages::not_found)
        .with_state(state)
}

/// Loads configuration from the environment and serves until shutdown.
pub async fn run() -> Result<(), StartupError> {
    let config = Config::load()?;
    profilemap_core::init_logging(&config.log_level, config.log_dir.as_deref())?;

    let state = AppState::from_config(&config)?;
    let app = build_router(state);

    let listener = TcpListener::bind(config.bind).await?;
    info!(
        "event=server_start module=server status=ok bind={} db_path={}",
        config.bind,
        config.db_path.display()
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("event=server_stop module=server status=ok");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            error!("event=signal module=server status=error signal=ctrl_c error={err}");
            std::future::pending::<()>().await;
        }
        info!("event=signal module=server status=ok signal=ctrl_c");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("event=signal module=server status=ok signal=terminate");
            }
            Err(err) => {
                error!(
                    "event=signal module=server status=error signal=terminate error={err}"
                );
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
