//! Mapbox Geocoding v5 client.

use super::{GeocodeError, GeocodeMatch, GeocodeResult, Geocoder};
use async_trait::async_trait;
use log::{info, warn};
use reqwest::{Client, Url};
use serde::Deserialize;
use std::time::Instant;

pub const DEFAULT_MAPBOX_API_BASE: &str = "https://api.mapbox.com";

/// Parses an API host usable as the base of geocoding request paths.
///
/// # Errors
/// - `InvalidBaseUrl` when `raw` is not an absolute URL that can carry path
///   segments.
pub fn parse_base_url(raw: &str) -> GeocodeResult<Url> {
    match Url::parse(raw.trim()) {
        Ok(url) if !url.cannot_be_a_base() => Ok(url),
        _ => Err(GeocodeError::InvalidBaseUrl(raw.to_string())),
    }
}

#[derive(Debug, Deserialize)]
struct FeatureCollection {
    #[serde(default)]
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    /// `[longitude, latitude]`
    center: [f64; 2],
    #[serde(default)]
    place_name: Option<String>,
}

/// Geocoder backed by `mapbox.places` forward geocoding.
#[derive(Debug, Clone)]
pub struct MapboxGeocoder {
    client: Client,
    base_url: Url,
    token: String,
}

impl MapboxGeocoder {
    /// Creates a client against the public Mapbox API.
    ///
    /// # Errors
    /// - `NotConfigured` when `token` is blank.
    pub fn new(token: impl Into<String>) -> GeocodeResult<Self> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(GeocodeError::NotConfigured);
        }
        Ok(Self {
            client: Client::new(),
            base_url: parse_base_url(DEFAULT_MAPBOX_API_BASE)?,
            token: token.trim().to_string(),
        })
    }

    /// Points the client at another API host (self-hosted proxy, tests).
    ///
    /// # Errors
    /// - `InvalidBaseUrl` when `base_url` fails [`parse_base_url`].
    pub fn with_base_url(mut self, base_url: &str) -> GeocodeResult<Self> {
        self.base_url = parse_base_url(base_url)?;
        Ok(self)
    }

    fn request_url(&self, address: &str) -> GeocodeResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| GeocodeError::InvalidBaseUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(["geocoding", "v5", "mapbox.places"])
            .push(&format!("{address}.json"));
        url.query_pairs_mut()
            .append_pair("access_token", &self.token);
        Ok(url)
    }
}

#[async_trait]
impl Geocoder for MapboxGeocoder {
    async fn geocode(&self, address: &str) -> GeocodeResult<Option<GeocodeMatch>> {
        let address = address.trim();
        if address.is_empty() {
            return Ok(None);
        }

        let started_at = Instant::now();
        let url = self.request_url(address)?;
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            warn!(
                "event=geocode module=geocode status=error duration_ms={} http_status={}",
                started_at.elapsed().as_millis(),
                status.as_u16()
            );
            return Err(GeocodeError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        let found = first_match(&body)?;
        info!(
            "event=geocode module=geocode status=ok duration_ms={} candidates={}",
            started_at.elapsed().as_millis(),
            found.as_ref().map_or(0, |m| m.candidates)
        );
        Ok(found)
    }
}

fn first_match(body: &str) -> GeocodeResult<Option<GeocodeMatch>> {
    let collection: FeatureCollection = serde_json::from_str(body)
        .map_err(|err| GeocodeError::InvalidResponse(err.to_string()))?;
    let candidates = collection.features.len();

    Ok(collection.features.into_iter().next().map(|feature| {
        let [longitude, latitude] = feature.center;
        GeocodeMatch {
            latitude,
            longitude,
            place_name: feature.place_name,
            candidates,
        }
    }))
}
