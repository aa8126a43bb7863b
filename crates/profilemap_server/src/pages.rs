//! Server-rendered HTML pages.
//!
//! # Responsibility
//! - List/search, detail, admin dashboard, create/edit forms and delete
//!   confirmation.
//!
//! # Invariants
//! - Successful writes answer with a 303 redirect to `/admin`.
//! - Validation failures re-render the form with the entered values (400).
//! - Geocoding from the form never persists anything.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
    Form, Router,
};
use log::error;
use minijinja::{context, Value};
use profilemap_core::{
    CoordinateInput, InteractiveMap, MapConfig, Profile, ProfileId, ProfileInput,
};
use serde::{Deserialize, Serialize};

use crate::api::parse_id;
use crate::error::AppError;
use crate::state::AppState;
use crate::templates;

const EXCERPT_CHARS: usize = 100;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/profiles/{id}", get(detail))
        .route("/admin", get(admin))
        .route("/admin/create", get(create_form).post(create_submit))
        .route("/admin/edit/{id}", get(edit_form).post(edit_submit))
        .route("/admin/delete/{id}", get(delete_confirm).post(delete_submit))
}

/// Page-level failure, rendered as an HTML page.
#[derive(Debug)]
pub struct PageError(AppError);

impl From<AppError> for PageError {
    fn from(value: AppError) -> Self {
        Self(value)
    }
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        match self.0 {
            AppError::NotFound => not_found_page(),
            err => {
                if err.status() == StatusCode::INTERNAL_SERVER_ERROR {
                    error!("event=page module=server status=error error={err}");
                }
                render_page(
                    err.status(),
                    "error.html",
                    context! { message => err.to_string() },
                )
            }
        }
    }
}

type PageResult = Result<Response, PageError>;

#[derive(Debug, Serialize)]
struct ProfileView<'a> {
    #[serde(flatten)]
    profile: &'a Profile,
    initial: String,
    created_date: String,
}

impl<'a> ProfileView<'a> {
    fn new(profile: &'a Profile) -> Self {
        Self {
            profile,
            initial: profile.name.chars().next().map(String::from).unwrap_or_default(),
            created_date: profile.created_at.format("%Y-%m-%d").to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
struct MapView {
    interactive: Option<InteractiveMap>,
    static_url: Option<String>,
    latitude: f64,
    longitude: f64,
}

impl MapView {
    fn new(config: &MapConfig, profile: &Profile) -> Self {
        Self {
            interactive: config.interactive_map(
                profile.latitude,
                profile.longitude,
                &profile.name,
                &profile.address,
            ),
            static_url: config.static_map_url(profile.latitude, profile.longitude),
            latitude: profile.latitude,
            longitude: profile.longitude,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct IndexParams {
    #[serde(default)]
    q: String,
    summary: Option<String>,
}

async fn index(State(state): State<AppState>, Query(params): Query<IndexParams>) -> PageResult {
    let text = params.q.clone();
    let profiles = state
        .with_profiles(move |profiles| profiles.search(Some(text.as_str())))
        .await?;

    // Unknown or malformed summary ids select nothing.
    let selected = match params.summary.as_deref().map(parse_id) {
        Some(Ok(id)) => {
            state
                .with_profiles(move |profiles| profiles.find(id))
                .await?
        }
        _ => None,
    };

    let cards: Vec<_> = profiles.iter().map(ProfileView::new).collect();
    Ok(render_page(
        StatusCode::OK,
        "index.html",
        context! {
            q => params.q,
            profiles => cards,
            selected => selected.as_ref().map(ProfileView::new),
            map => selected.as_ref().map(|profile| MapView::new(&state.map, profile)),
        },
    ))
}

async fn detail(State(state): State<AppState>, Path(id): Path<String>) -> PageResult {
    let id = parse_id(&id)?;
    let profile = state.with_profiles(move |profiles| profiles.get(id)).await?;

    Ok(render_page(
        StatusCode::OK,
        "detail.html",
        context! {
            profile => ProfileView::new(&profile),
            map => MapView::new(&state.map, &profile),
        },
    ))
}

async fn admin(State(state): State<AppState>) -> PageResult {
    let profiles = state.with_profiles(|profiles| profiles.search(None)).await?;
    let rows: Vec<_> = profiles.iter().map(ProfileView::new).collect();

    Ok(render_page(
        StatusCode::OK,
        "admin.html",
        context! { profiles => rows },
    ))
}

/// Raw form fields as posted by the create/edit page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileForm {
    pub name: String,
    pub description: String,
    pub address: String,
    pub latitude: String,
    pub longitude: String,
    pub image_url: String,
    /// Which submit button was pressed.
    #[serde(skip_serializing)]
    pub action: Option<String>,
}

impl ProfileForm {
    fn from_profile(profile: &Profile) -> Self {
        Self {
            name: profile.name.clone(),
            description: profile.description.clone(),
            address: profile.address.clone(),
            latitude: profile.latitude.to_string(),
            longitude: profile.longitude.to_string(),
            image_url: profile.image_url.clone().unwrap_or_default(),
            action: None,
        }
    }

    fn wants_geocode(&self) -> bool {
        self.action.as_deref() == Some("geocode")
    }

    fn to_input(&self) -> ProfileInput {
        ProfileInput {
            name: Some(self.name.clone()),
            description: Some(self.description.clone()),
            address: Some(self.address.clone()),
            latitude: Some(CoordinateInput::Text(self.latitude.clone())),
            longitude: Some(CoordinateInput::Text(self.longitude.clone())),
            image_url: Some(self.image_url.clone()),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum FormMode {
    Create,
    Edit(ProfileId),
}

impl FormMode {
    fn heading(self) -> &'static str {
        match self {
            FormMode::Create => "Create New Profile",
            FormMode::Edit(_) => "Edit Profile",
        }
    }

    fn submit_label(self) -> &'static str {
        match self {
            FormMode::Create => "Create Profile",
            FormMode::Edit(_) => "Update Profile",
        }
    }

    fn form_action(self) -> String {
        match self {
            FormMode::Create => "/admin/create".to_string(),
            FormMode::Edit(id) => format!("/admin/edit/{id}"),
        }
    }
}

async fn create_form() -> Response {
    form_page(
        StatusCode::OK,
        FormMode::Create,
        &ProfileForm::default(),
        None,
        None,
    )
}

async fn create_submit(State(state): State<AppState>, Form(form): Form<ProfileForm>) -> PageResult {
    submit(state, FormMode::Create, form).await
}

async fn edit_form(State(state): State<AppState>, Path(id): Path<String>) -> PageResult {
    let id = parse_id(&id)?;
    let profile = state.with_profiles(move |profiles| profiles.get(id)).await?;

    Ok(form_page(
        StatusCode::OK,
        FormMode::Edit(id),
        &ProfileForm::from_profile(&profile),
        None,
        None,
    ))
}

async fn edit_submit(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Form(form): Form<ProfileForm>,
) -> PageResult {
    let id = parse_id(&id)?;
    submit(state, FormMode::Edit(id), form).await
}

async fn submit(state: AppState, mode: FormMode, form: ProfileForm) -> PageResult {
    if form.wants_geocode() {
        return Ok(geocode_into_form(&state, mode, form).await);
    }

    let input = form.to_input();
    let saved = match mode {
        FormMode::Create => {
            state
                .with_profiles(move |profiles| profiles.create(&input))
                .await
        }
        FormMode::Edit(id) => {
            state
                .with_profiles(move |profiles| profiles.update(id, &input))
                .await
        }
    };

    match saved {
        Ok(_) => Ok(Redirect::to("/admin").into_response()),
        Err(AppError::Validation(err)) => Ok(form_page(
            StatusCode::BAD_REQUEST,
            mode,
            &form,
            Some(err.to_string()),
            None,
        )),
        Err(err) => Err(err.into()),
    }
}

async fn geocode_into_form(state: &AppState, mode: FormMode, mut form: ProfileForm) -> Response {
    let address = form.address.trim().to_string();
    if address.is_empty() {
        return form_page(
            StatusCode::BAD_REQUEST,
            mode,
            &form,
            Some("Enter an address to look up its coordinates".to_string()),
            None,
        );
    }

    let lookup = match state.geocoder() {
        Ok(geocoder) => geocoder.geocode(&address).await.map_err(AppError::from),
        Err(err) => Err(err),
    };

    match lookup {
        Ok(Some(found)) => {
            form.latitude = found.latitude.to_string();
            form.longitude = found.longitude.to_string();
            let place = found.place_name.as_deref().unwrap_or(address.as_str());
            let notice = if found.is_ambiguous() {
                format!(
                    "{} locations matched; using the first one: {place}",
                    found.candidates
                )
            } else {
                format!("Located: {place}")
            };
            form_page(StatusCode::OK, mode, &form, None, Some(notice))
        }
        Ok(None) => form_page(
            StatusCode::OK,
            mode,
            &form,
            Some(AppError::NoGeocodeMatch.to_string()),
            None,
        ),
        Err(err) => form_page(StatusCode::OK, mode, &form, Some(err.to_string()), None),
    }
}

fn form_page(
    status: StatusCode,
    mode: FormMode,
    form: &ProfileForm,
    error: Option<String>,
    notice: Option<String>,
) -> Response {
    render_page(
        status,
        "form.html",
        context! {
            heading => mode.heading(),
            submit_label => mode.submit_label(),
            form_action => mode.form_action(),
            form => form,
            error => error,
            notice => notice,
        },
    )
}

async fn delete_confirm(State(state): State<AppState>, Path(id): Path<String>) -> PageResult {
    let id = parse_id(&id)?;
    let profile = state.with_profiles(move |profiles| profiles.get(id)).await?;

    Ok(render_page(
        StatusCode::OK,
        "delete.html",
        context! {
            profile => ProfileView::new(&profile),
            excerpt => excerpt(&profile.description, EXCERPT_CHARS),
        },
    ))
}

async fn delete_submit(State(state): State<AppState>, Path(id): Path<String>) -> PageResult {
    if let Ok(id) = parse_id(&id) {
        state
            .with_profiles(move |profiles| profiles.delete(id))
            .await?;
    }
    Ok(Redirect::to("/admin").into_response())
}

pub async fn not_found() -> Response {
    not_found_page()
}

fn not_found_page() -> Response {
    render_page(StatusCode::NOT_FOUND, "not_found.html", context! {})
}

fn render_page(status: StatusCode, name: &str, ctx: Value) -> Response {
    match templates::render(name, ctx) {
        Ok(html) => (status, Html(html)).into_response(),
        Err(err) => {
            error!("event=render module=server status=error template={name} error={err}");
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal error").into_response()
        }
    }
}

fn excerpt(text: &str, max_chars: usize) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}

#[cfg(test)]
mod tests {
    use super::{excerpt, ProfileForm};
    use profilemap_core::CoordinateInput;

    #[test]
    fn excerpt_truncates_on_char_boundaries() {
        assert_eq!(excerpt("short", 100), "short");
        assert_eq!(excerpt("ééééé", 3), "ééé...");
        assert_eq!(excerpt(&"a".repeat(100), 100), "a".repeat(100));
    }

    #[test]
    fn form_fields_become_text_input() {
        let form = ProfileForm {
            name: "Cafe X".to_string(),
            latitude: "40.5".to_string(),
            action: Some("geocode".to_string()),
            ..ProfileForm::default()
        };

        assert!(form.wants_geocode());
        let input = form.to_input();
        assert_eq!(input.latitude, Some(CoordinateInput::Text("40.5".to_string())));
        assert_eq!(input.image_url.as_deref(), Some(""));
        assert_eq!(
            input.validate().unwrap_err().field(),
            "description"
        );
    }
}
