//! Process configuration read from environment variables.
//!
//! # Invariants
//! - Values are read once, at startup.
//! - Blank provider keys are treated as unset.

use profilemap_core::geocode::{parse_base_url, DEFAULT_MAPBOX_API_BASE};
use profilemap_core::{default_log_level, MapConfig};
use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

const DEFAULT_BIND: &str = "0.0.0.0:3000";
const DEFAULT_DB_PATH: &str = "profilemap.sqlite3";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {key} value `{value}`: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub bind: SocketAddr,
    pub db_path: PathBuf,
    pub log_level: String,
    /// `None` logs to stderr.
    pub log_dir: Option<String>,
    pub mapbox_token: Option<String>,
    pub mapbox_api_base: String,
    pub static_maps_key: Option<String>,
}

impl Config {
    /// Loads configuration from the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Loads configuration through an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        Ok(Self {
            bind: try_load("PROFILEMAP_BIND", var("PROFILEMAP_BIND"), DEFAULT_BIND)?,
            db_path: var("PROFILEMAP_DB_PATH")
                .map_or_else(|| PathBuf::from(DEFAULT_DB_PATH), PathBuf::from),
            log_level: var("PROFILEMAP_LOG_LEVEL")
                .unwrap_or_else(|| default_log_level().to_string()),
            log_dir: var("PROFILEMAP_LOG_DIR"),
            mapbox_token: var("MAPBOX_TOKEN"),
            mapbox_api_base: api_base(var("MAPBOX_API_BASE"))?,
            static_maps_key: var("GOOGLE_MAPS_STATIC_API_KEY"),
        })
    }

    pub fn map_config(&self) -> MapConfig {
        MapConfig {
            static_maps_key: self.static_maps_key.clone(),
            mapbox_token: self.mapbox_token.clone(),
        }
    }
}

fn try_load<T: FromStr>(
    key: &'static str,
    value: Option<String>,
    default: &str,
) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    let value = value.unwrap_or_else(|| default.to_string());
    value.parse().map_err(|err: T::Err| ConfigError::Invalid {
        key,
        reason: err.to_string(),
        value,
    })
}

fn api_base(value: Option<String>) -> Result<String, ConfigError> {
    let value = value.unwrap_or_else(|| DEFAULT_MAPBOX_API_BASE.to_string());
    match parse_base_url(&value) {
        Ok(_) => Ok(value),
        Err(err) => Err(ConfigError::Invalid {
            key: "MAPBOX_API_BASE",
            reason: err.to_string(),
            value,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::{Config, ConfigError};
    use std::collections::HashMap;

    fn load(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_environment_is_empty() {
        let config = load(&[]).unwrap();

        assert_eq!(config.bind.to_string(), "0.0.0.0:3000");
        assert_eq!(config.db_path.to_str(), Some("profilemap.sqlite3"));
        assert_eq!(config.mapbox_api_base, "https://api.mapbox.com");
        assert!(config.log_dir.is_none());
        assert!(config.mapbox_token.is_none());
        assert!(config.static_maps_key.is_none());
    }

    #[test]
    fn blank_provider_keys_are_unset() {
        let config = load(&[("MAPBOX_TOKEN", "  "), ("GOOGLE_MAPS_STATIC_API_KEY", "")]).unwrap();

        assert!(config.mapbox_token.is_none());
        assert_eq!(config.map_config().static_maps_key, None);
    }

    #[test]
    fn explicit_values_override_defaults() {
        let config = load(&[
            ("PROFILEMAP_BIND", "127.0.0.1:8080"),
            ("PROFILEMAP_DB_PATH", "/tmp/p.db"),
            ("PROFILEMAP_LOG_LEVEL", "debug"),
            ("MAPBOX_TOKEN", "pk.abc"),
        ])
        .unwrap();

        assert_eq!(config.bind.port(), 8080);
        assert_eq!(config.db_path.to_str(), Some("/tmp/p.db"));
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.map_config().mapbox_token.as_deref(), Some("pk.abc"));
    }

    #[test]
    fn unparsable_mapbox_api_base_is_rejected() {
        let err = load(&[("MAPBOX_API_BASE", "api.mapbox.com")]).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                key: "MAPBOX_API_BASE",
                ref value,
                ..
            } if value == "api.mapbox.com"
        ));

        let config = load(&[("MAPBOX_API_BASE", "http://localhost:8089/")]).unwrap();
        assert_eq!(config.mapbox_api_base, "http://localhost:8089/");
    }

    #[test]
    fn unparsable_bind_address_is_rejected() {
        let err = load(&[("PROFILEMAP_BIND", "not-an-address")]).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                key: "PROFILEMAP_BIND",
                ..
            }
        ));
    }
}
