//! Map display helpers.
//!
//! # Responsibility
//! - Build the static map image URL and interactive map embed settings for
//!   one marker.
//!
//! # Invariants
//! - A missing provider key yields `None`; it never fails the caller.

use reqwest::Url;
use serde::Serialize;

const STATIC_MAPS_ENDPOINT: &str = "https://maps.googleapis.com/maps/api/staticmap";
const MAP_ZOOM: u8 = 14;
const STATIC_MAP_SIZE: &str = "600x300";
const MAPBOX_STYLE: &str = "mapbox://styles/mapbox/streets-v11";

/// Provider credentials for map rendering.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MapConfig {
    /// Google Static Maps API key.
    pub static_maps_key: Option<String>,
    /// Mapbox public access token.
    pub mapbox_token: Option<String>,
}

/// Settings consumed by the Mapbox GL page script.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InteractiveMap {
    pub access_token: String,
    pub style: &'static str,
    pub zoom: u8,
    pub latitude: f64,
    pub longitude: f64,
    /// Popup heading.
    pub label: String,
    /// Popup body.
    pub address: String,
}

impl MapConfig {
    /// Google Static Maps image URL centered on one red marker.
    pub fn static_map_url(&self, latitude: f64, longitude: f64) -> Option<String> {
        let key = non_blank(self.static_maps_key.as_deref())?;
        let center = format!("{latitude},{longitude}");
        let zoom = MAP_ZOOM.to_string();
        let markers = format!("color:red|{center}");
        let url = Url::parse_with_params(
            STATIC_MAPS_ENDPOINT,
            [
                ("center", center.as_str()),
                ("zoom", zoom.as_str()),
                ("size", STATIC_MAP_SIZE),
                ("maptype", "roadmap"),
                ("markers", markers.as_str()),
                ("key", key),
            ],
        )
        .ok()?;
        Some(url.into())
    }

    /// Interactive single-marker map settings.
    pub fn interactive_map(
        &self,
        latitude: f64,
        longitude: f64,
        label: &str,
        address: &str,
    ) -> Option<InteractiveMap> {
        let token = non_blank(self.mapbox_token.as_deref())?;
        Some(InteractiveMap {
            access_token: token.to_string(),
            style: MAPBOX_STYLE,
            zoom: MAP_ZOOM,
            latitude,
            longitude,
            label: label.to_string(),
            address: address.to_string(),
        })
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}
