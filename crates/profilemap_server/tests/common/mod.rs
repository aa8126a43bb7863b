#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header::CONTENT_TYPE, Method, Request, StatusCode},
    response::Response,
    Router,
};
use profilemap_core::db::open_db_in_memory;
use profilemap_core::{GeocodeError, GeocodeMatch, GeocodeResult, Geocoder, MapConfig};
use profilemap_server::{build_router, AppState};
use tower::ServiceExt;

pub fn app() -> Router {
    app_with(None, MapConfig::default())
}

pub fn app_with(geocoder: Option<Arc<dyn Geocoder>>, map: MapConfig) -> Router {
    let conn = open_db_in_memory().unwrap();
    build_router(AppState::new(conn, geocoder, map))
}

/// Router over a store whose profiles table has been dropped.
pub fn broken_store_app() -> Router {
    let conn = open_db_in_memory().unwrap();
    conn.execute_batch("DROP TABLE profiles;").unwrap();
    build_router(AppState::new(conn, None, MapConfig::default()))
}

/// Answers every lookup with the same result.
pub struct FixedGeocoder(pub Option<GeocodeMatch>);

#[async_trait]
impl Geocoder for FixedGeocoder {
    async fn geocode(&self, _address: &str) -> GeocodeResult<Option<GeocodeMatch>> {
        Ok(self.0.clone())
    }
}

pub struct FailingGeocoder;

#[async_trait]
impl Geocoder for FailingGeocoder {
    async fn geocode(&self, _address: &str) -> GeocodeResult<Option<GeocodeMatch>> {
        Err(GeocodeError::Status(500))
    }
}

pub fn geocode_match(candidates: usize) -> GeocodeMatch {
    GeocodeMatch {
        latitude: 40.7128,
        longitude: -74.006,
        place_name: Some("New York, NY".to_string()),
        candidates,
    }
}

pub async fn send(app: &Router, request: Request<Body>) -> Response {
    app.clone().oneshot(request).await.unwrap()
}

pub async fn body_text(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn json_request(method: Method, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn form_request(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Creates a profile through the API and returns its JSON representation.
pub async fn create_via_api(app: &Router, name: &str, address: &str) -> serde_json::Value {
    let response = send(
        app,
        json_request(
            Method::POST,
            "/api/profiles",
            serde_json::json!({
                "name": name,
                "description": format!("{name} description"),
                "address": address,
                "latitude": 40.0,
                "longitude": -73.0,
            }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = body_json(response).await;
    // Keeps creation timestamps distinct so newest-first order is deterministic.
    tokio::time::sleep(Duration::from_millis(2)).await;
    created
}
