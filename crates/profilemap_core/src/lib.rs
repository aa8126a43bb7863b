//! Core domain logic for profilemap.
//! This crate is the single source of truth for profile invariants.

pub mod db;
pub mod geocode;
pub mod logging;
pub mod map;
pub mod model;
pub mod repo;
pub mod service;

pub use geocode::{GeocodeError, GeocodeMatch, GeocodeResult, Geocoder, MapboxGeocoder};
pub use logging::{default_log_level, init_logging, logging_status, LogDestination, LoggingError};
pub use map::{InteractiveMap, MapConfig};
pub use model::profile::{
    CoordinateInput, Profile, ProfileDraft, ProfileId, ProfileInput, ProfileValidationError,
};
pub use repo::profile_repo::{
    ProfileListQuery, ProfileRepository, RepoError, RepoResult, SqliteProfileRepository,
};
pub use service::profile_service::{
    Clock, DeleteOutcome, ProfileService, ProfileServiceError, ServiceResult, SystemClock,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
