//! JSON HTTP API.
//!
//! # Invariants
//! - Error bodies are `{"error": "<message>"}`.
//! - A malformed id is reported as not found.
//! - Deleting is idempotent and always answers `{"success": true}`.

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use profilemap_core::{
    core_version, GeocodeMatch, Profile, ProfileId, ProfileInput, ProfileValidationError,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    query: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct GeocodeParams {
    address: Option<String>,
}

pub async fn list_profiles(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<Profile>>, AppError> {
    let profiles = state
        .with_profiles(move |profiles| profiles.search(params.query.as_deref()))
        .await?;
    Ok(Json(profiles))
}

pub async fn create_profile(
    State(state): State<AppState>,
    payload: Result<Json<ProfileInput>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(input) = payload.map_err(|err| AppError::MalformedBody(err.body_text()))?;
    let profile = state
        .with_profiles(move |profiles| profiles.create(&input))
        .await?;
    Ok((StatusCode::CREATED, Json(profile)))
}

pub async fn get_profile(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Profile>, AppError> {
    let id = parse_id(&id)?;
    let profile = state
        .with_profiles(move |profiles| profiles.get(id))
        .await?;
    Ok(Json(profile))
}

pub async fn update_profile(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<ProfileInput>, JsonRejection>,
) -> Result<Json<Profile>, AppError> {
    let id = parse_id(&id)?;
    let Json(input) = payload.map_err(|err| AppError::MalformedBody(err.body_text()))?;
    let profile = state
        .with_profiles(move |profiles| profiles.update(id, &input))
        .await?;
    Ok(Json(profile))
}

pub async fn delete_profile(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    // Nothing can exist under an id that does not parse.
    if let Ok(id) = parse_id(&id) {
        state
            .with_profiles(move |profiles| profiles.delete(id))
            .await?;
    }
    Ok(Json(json!({ "success": true })))
}

pub async fn geocode(
    State(state): State<AppState>,
    Query(params): Query<GeocodeParams>,
) -> Result<Json<GeocodeMatch>, AppError> {
    let address = params
        .address
        .as_deref()
        .map(str::trim)
        .filter(|address| !address.is_empty())
        .ok_or(ProfileValidationError::MissingField("address"))?;

    let geocoder = state.geocoder()?;
    let found = geocoder.geocode(address).await?;
    found.map(Json).ok_or(AppError::NoGeocodeMatch)
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok", "version": core_version() }))
}

pub(crate) fn parse_id(raw: &str) -> Result<ProfileId, AppError> {
    ProfileId::parse_str(raw.trim()).map_err(|_| AppError::NotFound)
}
