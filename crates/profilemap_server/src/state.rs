//! Shared request state.
//!
//! # Responsibility
//! - Own the single store connection, the optional geocoder and map settings.
//! - Run profile use-cases on the blocking pool.
//!
//! # Invariants
//! - The connection lock is held for exactly one service call.
//! - A missing geocoder only disables geocoding features.

use std::sync::{Arc, Mutex};

use log::{error, warn};
use profilemap_core::db::open_db;
use profilemap_core::{
    Geocoder, MapConfig, MapboxGeocoder, ProfileService, ServiceResult, SqliteProfileRepository,
};
use rusqlite::Connection;

use crate::config::Config;
use crate::error::{AppError, StartupError};

/// Service type handed to [`AppState::with_profiles`] callbacks.
pub type Profiles<'conn> = ProfileService<SqliteProfileRepository<'conn>>;

#[derive(Clone)]
pub struct AppState {
    db: Arc<Mutex<Connection>>,
    geocoder: Option<Arc<dyn Geocoder>>,
    pub map: MapConfig,
}

impl AppState {
    pub fn new(conn: Connection, geocoder: Option<Arc<dyn Geocoder>>, map: MapConfig) -> Self {
        Self {
            db: Arc::new(Mutex::new(conn)),
            geocoder,
            map,
        }
    }

    /// Opens the store and provider clients described by `config`.
    pub fn from_config(config: &Config) -> Result<Self, StartupError> {
        let conn = open_db(&config.db_path)?;

        let geocoder: Option<Arc<dyn Geocoder>> = match config.mapbox_token.as_deref() {
            Some(token) => Some(Arc::new(
                MapboxGeocoder::new(token)?.with_base_url(&config.mapbox_api_base)?,
            )),
            None => {
                warn!("event=config module=server status=degraded feature=geocoding reason=missing_mapbox_token");
                None
            }
        };

        let map = config.map_config();
        if map.static_maps_key.is_none() {
            warn!("event=config module=server status=degraded feature=static_map reason=missing_key");
        }
        if map.mapbox_token.is_none() {
            warn!("event=config module=server status=degraded feature=interactive_map reason=missing_mapbox_token");
        }

        Ok(Self::new(conn, geocoder, map))
    }

    /// Runs one profile use-case against the shared connection.
    pub async fn with_profiles<T, F>(&self, op: F) -> Result<T, AppError>
    where
        T: Send + 'static,
        F: for<'conn> FnOnce(&Profiles<'conn>) -> ServiceResult<T> + Send + 'static,
    {
        let db = Arc::clone(&self.db);
        let joined = tokio::task::spawn_blocking(move || -> Result<T, AppError> {
            let conn = db.lock().map_err(|_| {
                error!("event=store_lock module=server status=error error=poisoned");
                AppError::Store
            })?;
            let repo = SqliteProfileRepository::try_new(&conn).map_err(|err| {
                error!("event=store_check module=server status=error error={err}");
                AppError::Store
            })?;
            let service = ProfileService::new(repo);
            let result = op(&service);
            result.map_err(AppError::from)
        })
        .await;

        match joined {
            Ok(result) => result,
            Err(err) => {
                error!("event=store_task module=server status=error error={err}");
                Err(AppError::Internal)
            }
        }
    }

    /// Returns the configured geocoder.
    ///
    /// # Errors
    /// - `GeocoderUnavailable` when no provider token was configured.
    pub fn geocoder(&self) -> Result<Arc<dyn Geocoder>, AppError> {
        self.geocoder.clone().ok_or(AppError::GeocoderUnavailable)
    }
}
