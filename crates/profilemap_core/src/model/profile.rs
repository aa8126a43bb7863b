//! Profile domain model.
//!
//! # Responsibility
//! - Define the persisted `Profile` record and its writable field set.
//! - Turn raw caller input (JSON bodies, HTML forms) into validated drafts.
//!
//! # Invariants
//! - `id` is stable and never reused for another profile.
//! - `name`, `description` and `address` are never blank once validated.
//! - `image_url` is `None` rather than an empty string, and otherwise an
//!   absolute `http`/`https` URL.
//! - Coordinates are finite; their range is not checked.

use chrono::{DateTime, Utc};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier for a profile record.
pub type ProfileId = Uuid;

/// A named, located point of interest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: ProfileId,
    pub name: String,
    pub description: String,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Serialized as `null` when absent.
    pub image_url: Option<String>,
    /// Set once by the writer at insert time.
    pub created_at: DateTime<Utc>,
    /// Refreshed by the writer on every update.
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    /// Builds a new record with a generated id from validated fields.
    pub fn new(draft: ProfileDraft, now: DateTime<Utc>) -> Self {
        Self::with_id(Uuid::new_v4(), draft, now)
    }

    /// Builds a record with a caller-provided id.
    pub fn with_id(id: ProfileId, draft: ProfileDraft, now: DateTime<Utc>) -> Self {
        Self {
            id,
            name: draft.name,
            description: draft.description,
            address: draft.address,
            latitude: draft.latitude,
            longitude: draft.longitude,
            image_url: draft.image_url,
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns the writable part of this record.
    pub fn draft(&self) -> ProfileDraft {
        ProfileDraft {
            name: self.name.clone(),
            description: self.description.clone(),
            address: self.address.clone(),
            latitude: self.latitude,
            longitude: self.longitude,
            image_url: self.image_url.clone(),
        }
    }
}

/// Validated writable field set shared by create and update.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileDraft {
    pub name: String,
    pub description: String,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    pub image_url: Option<String>,
}

impl ProfileDraft {
    /// Re-checks the draft invariants.
    ///
    /// Drafts built through [`ProfileInput::validate`] always pass; this
    /// guards drafts assembled by hand before they reach storage.
    pub fn validate(&self) -> Result<(), ProfileValidationError> {
        for (field, value) in [
            ("name", &self.name),
            ("description", &self.description),
            ("address", &self.address),
        ] {
            if value.trim().is_empty() {
                return Err(ProfileValidationError::MissingField(field));
            }
        }

        for (field, value) in [("latitude", self.latitude), ("longitude", self.longitude)] {
            if !value.is_finite() {
                return Err(ProfileValidationError::InvalidCoordinate {
                    field,
                    value: value.to_string(),
                });
            }
        }

        match self.image_url.as_deref() {
            Some(url) if url.trim().is_empty() => return Err(ProfileValidationError::EmptyImageUrl),
            Some(url) => check_image_url(url)?,
            None => {}
        }

        Ok(())
    }
}

/// Coordinate as received from callers: JSON number or form text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CoordinateInput {
    Number(f64),
    Text(String),
}

impl CoordinateInput {
    fn parse(&self, field: &'static str) -> Result<f64, ProfileValidationError> {
        let value = match self {
            Self::Number(value) => *value,
            Self::Text(text) => {
                let trimmed = text.trim();
                if trimmed.is_empty() {
                    return Err(ProfileValidationError::MissingField(field));
                }
                trimmed
                    .parse::<f64>()
                    .map_err(|_| ProfileValidationError::InvalidCoordinate {
                        field,
                        value: trimmed.to_string(),
                    })?
            }
        };

        if !value.is_finite() {
            return Err(ProfileValidationError::InvalidCoordinate {
                field,
                value: value.to_string(),
            });
        }
        Ok(value)
    }
}

impl Display for CoordinateInput {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(value) => write!(f, "{value}"),
            Self::Text(text) => f.write_str(text),
        }
    }
}

impl From<f64> for CoordinateInput {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

/// Raw, unvalidated profile input.
///
/// Every field is optional so that missing values surface as validation
/// errors instead of deserialization failures.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileInput {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub latitude: Option<CoordinateInput>,
    #[serde(default)]
    pub longitude: Option<CoordinateInput>,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl ProfileInput {
    /// Validates and normalizes input into a writable draft.
    ///
    /// # Errors
    /// - `MissingField` when a required text field is absent or blank, or a
    ///   coordinate is absent or blank.
    /// - `InvalidCoordinate` when a coordinate is not a finite number.
    pub fn validate(&self) -> Result<ProfileDraft, ProfileValidationError> {
        let name = required_text("name", self.name.as_deref())?;
        let description = required_text("description", self.description.as_deref())?;
        let address = required_text("address", self.address.as_deref())?;
        let latitude = required_coordinate("latitude", self.latitude.as_ref())?;
        let longitude = required_coordinate("longitude", self.longitude.as_ref())?;
        let image_url = self
            .image_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .map(str::to_string);
        if let Some(url) = image_url.as_deref() {
            check_image_url(url)?;
        }

        Ok(ProfileDraft {
            name,
            description,
            address,
            latitude,
            longitude,
            image_url,
        })
    }
}

fn required_text(field: &'static str, value: Option<&str>) -> Result<String, ProfileValidationError> {
    match value.map(str::trim) {
        Some(text) if !text.is_empty() => Ok(text.to_string()),
        _ => Err(ProfileValidationError::MissingField(field)),
    }
}

fn check_image_url(url: &str) -> Result<(), ProfileValidationError> {
    match Url::parse(url) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => Ok(()),
        _ => Err(ProfileValidationError::UnsupportedImageUrl(url.to_string())),
    }
}

fn required_coordinate(
    field: &'static str,
    value: Option<&CoordinateInput>,
) -> Result<f64, ProfileValidationError> {
    value
        .ok_or(ProfileValidationError::MissingField(field))?
        .parse(field)
}

/// Validation failure for profile input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileValidationError {
    /// Required field is absent or blank.
    MissingField(&'static str),
    /// Coordinate does not parse as a finite number.
    InvalidCoordinate { field: &'static str, value: String },
    /// `image_url` is present but blank.
    EmptyImageUrl,
    /// `image_url` is not an absolute `http`/`https` URL.
    UnsupportedImageUrl(String),
}

impl ProfileValidationError {
    /// Name of the offending field.
    pub fn field(&self) -> &'static str {
        match self {
            Self::MissingField(field) => field,
            Self::InvalidCoordinate { field, .. } => field,
            Self::EmptyImageUrl | Self::UnsupportedImageUrl(_) => "image_url",
        }
    }
}

impl Display for ProfileValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingField(field) => write!(f, "missing required field: {field}"),
            Self::InvalidCoordinate { field, value } => {
                write!(f, "{field} must be a number, got `{value}`")
            }
            Self::EmptyImageUrl => write!(f, "image_url must be null instead of empty"),
            Self::UnsupportedImageUrl(url) => {
                write!(f, "image_url must be an http or https URL, got `{url}`")
            }
        }
    }
}

impl Error for ProfileValidationError {}

#[cfg(test)]
mod tests {
    use super::{CoordinateInput, ProfileInput, ProfileValidationError};

    fn cafe_input() -> ProfileInput {
        ProfileInput {
            name: Some("Cafe X".to_string()),
            description: Some("Coffee shop".to_string()),
            address: Some("1 Main St".to_string()),
            latitude: Some(CoordinateInput::Number(40.0)),
            longitude: Some(CoordinateInput::Number(-73.0)),
            image_url: None,
        }
    }

    #[test]
    fn validate_trims_text_and_accepts_numeric_text() {
        let mut input = cafe_input();
        input.name = Some("  Cafe X ".to_string());
        input.latitude = Some(CoordinateInput::Text(" 40.5 ".to_string()));

        let draft = input.validate().expect("input should validate");
        assert_eq!(draft.name, "Cafe X");
        assert_eq!(draft.latitude, 40.5);
        assert_eq!(draft.longitude, -73.0);
    }

    #[test]
    fn validate_rejects_blank_required_text() {
        let mut input = cafe_input();
        input.description = Some("   ".to_string());

        let err = input.validate().expect_err("blank description must fail");
        assert_eq!(err, ProfileValidationError::MissingField("description"));
    }

    #[test]
    fn validate_rejects_missing_coordinate() {
        let mut input = cafe_input();
        input.longitude = None;

        let err = input.validate().expect_err("missing longitude must fail");
        assert_eq!(err.field(), "longitude");
    }

    #[test]
    fn validate_rejects_unparsable_and_non_finite_coordinates() {
        let mut input = cafe_input();
        input.latitude = Some(CoordinateInput::Text("north".to_string()));
        assert!(matches!(
            input.validate(),
            Err(ProfileValidationError::InvalidCoordinate { field: "latitude", .. })
        ));

        input.latitude = Some(CoordinateInput::Text("NaN".to_string()));
        assert!(matches!(
            input.validate(),
            Err(ProfileValidationError::InvalidCoordinate { field: "latitude", .. })
        ));
    }

    #[test]
    fn validate_does_not_enforce_coordinate_range() {
        let mut input = cafe_input();
        input.latitude = Some(CoordinateInput::Number(123.0));
        input.longitude = Some(CoordinateInput::Number(-500.0));

        let draft = input.validate().expect("out-of-range values are accepted");
        assert_eq!(draft.latitude, 123.0);
    }

    #[test]
    fn empty_image_url_becomes_none() {
        let mut input = cafe_input();
        input.image_url = Some("  ".to_string());
        assert_eq!(input.validate().unwrap().image_url, None);

        input.image_url = Some(" https://example.com/a.png ".to_string());
        assert_eq!(
            input.validate().unwrap().image_url.as_deref(),
            Some("https://example.com/a.png")
        );
    }

    #[test]
    fn image_url_must_use_http_or_https() {
        let mut input = cafe_input();
        for url in ["javascript:alert(1)", " JavaScript:alert(1) ", "data:image/png;base64,AA", "/img/a.png"] {
            input.image_url = Some(url.to_string());
            let err = input.validate().expect_err("non-http image url must fail");
            assert_eq!(err.field(), "image_url");
            assert!(matches!(err, ProfileValidationError::UnsupportedImageUrl(_)));
        }

        input.image_url = Some("HTTP://example.com/a.png".to_string());
        assert!(input.validate().is_ok());
    }

    #[test]
    fn json_input_accepts_numbers_strings_and_missing_fields() {
        let input: ProfileInput = serde_json::from_str(
            r#"{"name":"A","description":"B","address":"C","latitude":"1.5","longitude":2}"#,
        )
        .expect("json should deserialize");
        assert_eq!(input.latitude, Some(CoordinateInput::Text("1.5".to_string())));
        assert_eq!(input.longitude, Some(CoordinateInput::Number(2.0)));
        assert_eq!(input.image_url, None);

        let empty: ProfileInput = serde_json::from_str("{}").expect("empty object is valid");
        assert_eq!(
            empty.validate().unwrap_err(),
            ProfileValidationError::MissingField("name")
        );
    }
}
