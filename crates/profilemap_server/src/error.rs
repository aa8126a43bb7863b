use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use log::{error, warn};
use profilemap_core::db::DbError;
use profilemap_core::{GeocodeError, LoggingError, ProfileServiceError, ProfileValidationError};
use serde_json::json;
use thiserror::Error;

use crate::config::ConfigError;

/// Request-level failure. `Display` is the message shown to callers.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    Validation(#[from] ProfileValidationError),

    #[error("Profile not found")]
    NotFound,

    #[error("Failed to access profile store")]
    Store,

    #[error("No location found for that address")]
    NoGeocodeMatch,

    #[error("Geocoding is not configured")]
    GeocoderUnavailable,

    #[error("Geocoding provider request failed")]
    GeocoderUpstream,

    #[error("Malformed request body: {0}")]
    MalformedBody(String),

    #[error("Internal error")]
    Internal,
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::MalformedBody(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound | AppError::NoGeocodeMatch => StatusCode::NOT_FOUND,
            AppError::Store | AppError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::GeocoderUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            AppError::GeocoderUpstream => StatusCode::BAD_GATEWAY,
        }
    }
}

// The service already logged the store failure with its details.
impl From<ProfileServiceError> for AppError {
    fn from(value: ProfileServiceError) -> Self {
        match value {
            ProfileServiceError::Validation(err) => AppError::Validation(err),
            ProfileServiceError::NotFound(_) => AppError::NotFound,
            ProfileServiceError::Store(_) => AppError::Store,
        }
    }
}

impl From<GeocodeError> for AppError {
    fn from(value: GeocodeError) -> Self {
        match value {
            GeocodeError::NotConfigured => AppError::GeocoderUnavailable,
            other => {
                warn!("event=geocode module=server status=error error={other}");
                AppError::GeocoderUpstream
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!("event=request module=server status=error error={self}");
        }

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

/// Startup failure of the server binary.
#[derive(Error, Debug)]
pub enum StartupError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("logging setup failed: {0}")]
    Logging(#[from] LoggingError),

    #[error("failed to open profile store: {0}")]
    Db(#[from] DbError),

    #[error("failed to set up geocoder: {0}")]
    Geocoder(#[from] GeocodeError),

    #[error("server i/o error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::AppError;
    use axum::http::StatusCode;
    use profilemap_core::{GeocodeError, ProfileServiceError, ProfileValidationError, RepoError};
    use uuid::Uuid;

    #[test]
    fn service_errors_map_to_status_codes() {
        let validation: AppError =
            ProfileServiceError::Validation(ProfileValidationError::MissingField("name")).into();
        assert_eq!(validation.status(), StatusCode::BAD_REQUEST);
        assert_eq!(validation.to_string(), "missing required field: name");

        let not_found: AppError = ProfileServiceError::NotFound(Uuid::new_v4()).into();
        assert_eq!(not_found.status(), StatusCode::NOT_FOUND);

        let store: AppError =
            ProfileServiceError::Store(RepoError::InvalidData("secret detail".to_string())).into();
        assert_eq!(store.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!store.to_string().contains("secret detail"));
    }

    #[test]
    fn geocode_errors_map_to_gateway_statuses() {
        let unavailable: AppError = GeocodeError::NotConfigured.into();
        assert_eq!(unavailable.status(), StatusCode::SERVICE_UNAVAILABLE);

        let upstream: AppError = GeocodeError::Status(401).into();
        assert_eq!(upstream.status(), StatusCode::BAD_GATEWAY);
        assert!(!upstream.to_string().contains("401"));
    }
}
