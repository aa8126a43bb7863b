//! Address-to-coordinate lookup.
//!
//! # Responsibility
//! - Define the `Geocoder` seam used by the create/edit form.
//! - Provide the Mapbox-backed implementation.
//!
//! # Invariants
//! - Geocoding never persists anything.
//! - The first provider match wins; callers only learn how many candidates
//!   were collapsed into it.
//! - No retries.

mod mapbox;

pub use mapbox::{parse_base_url, MapboxGeocoder, DEFAULT_MAPBOX_API_BASE};

use async_trait::async_trait;
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type GeocodeResult<T> = Result<T, GeocodeError>;

/// Top geocoding candidate for an address.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeocodeMatch {
    pub latitude: f64,
    pub longitude: f64,
    /// Provider's formatted label for the match, when given.
    pub place_name: Option<String>,
    /// Total candidates returned; values above 1 mean matches were dropped.
    pub candidates: usize,
}

impl GeocodeMatch {
    pub fn is_ambiguous(&self) -> bool {
        self.candidates > 1
    }
}

/// Geocoding failure.
#[derive(Debug)]
pub enum GeocodeError {
    /// No provider credentials were supplied.
    NotConfigured,
    /// Base URL cannot be used to build request URLs.
    InvalidBaseUrl(String),
    /// Transport failure.
    Http(reqwest::Error),
    /// Provider answered with a non-success status.
    Status(u16),
    /// Provider body does not have the expected shape.
    InvalidResponse(String),
}

impl Display for GeocodeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotConfigured => write!(f, "geocoding is not configured"),
            Self::InvalidBaseUrl(url) => write!(f, "invalid geocoding base url `{url}`"),
            Self::Http(err) => write!(f, "geocoding request failed: {err}"),
            Self::Status(status) => write!(f, "geocoding provider returned status {status}"),
            Self::InvalidResponse(message) => {
                write!(f, "invalid geocoding response: {message}")
            }
        }
    }
}

impl Error for GeocodeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Http(err) => Some(err),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for GeocodeError {
    fn from(value: reqwest::Error) -> Self {
        Self::Http(value)
    }
}

/// Converts free-text addresses into coordinates.
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Returns the first match, or `None` when nothing matched.
    ///
    /// Blank addresses return `Ok(None)` without contacting the provider.
    async fn geocode(&self, address: &str) -> GeocodeResult<Option<GeocodeMatch>>;
}
