//! Profile use-case service.
//!
//! # Responsibility
//! - Provide list/search, detail, create, update and delete entry points.
//! - Assign writer-side timestamps and identifiers.
//! - Collapse storage failures into a closed three-kind error taxonomy.
//!
//! # Invariants
//! - Nothing is persisted when input validation fails.
//! - `created_at` is written once; `updated_at` strictly increases per update.
//! - Deleting an unknown id is a success, on every caller path.
//! - Log events carry ids and counts only, never field contents.

use crate::model::profile::{Profile, ProfileId, ProfileInput, ProfileValidationError};
use crate::repo::profile_repo::{ProfileListQuery, ProfileRepository, RepoError};
use chrono::{DateTime, Utc};
use log::{error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Time source for writer-assigned timestamps.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Service error for profile use-cases.
#[derive(Debug)]
pub enum ProfileServiceError {
    /// Caller input is missing or malformed.
    Validation(ProfileValidationError),
    /// No profile has the requested id.
    NotFound(ProfileId),
    /// Persistence-layer failure. Details are for logs, not for end users.
    Store(RepoError),
}

impl Display for ProfileServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "profile not found: {id}"),
            Self::Store(err) => write!(f, "profile store error: {err}"),
        }
    }
}

impl Error for ProfileServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::NotFound(_) => None,
            Self::Store(err) => Some(err),
        }
    }
}

impl From<ProfileValidationError> for ProfileServiceError {
    fn from(value: ProfileValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<RepoError> for ProfileServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::NotFound(id),
            RepoError::Validation(err) => Self::Validation(err),
            other => Self::Store(other),
        }
    }
}

pub type ServiceResult<T> = Result<T, ProfileServiceError>;

/// Result of a delete request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// A row was removed.
    Deleted,
    /// No row had the id; nothing changed.
    Absent,
}

/// Profile service facade over repository implementations.
pub struct ProfileService<R: ProfileRepository, C: Clock = SystemClock> {
    repo: R,
    clock: C,
}

impl<R: ProfileRepository> ProfileService<R> {
    /// Creates a service using the wall clock.
    pub fn new(repo: R) -> Self {
        Self::with_clock(repo, SystemClock)
    }
}

impl<R: ProfileRepository, C: Clock> ProfileService<R, C> {
    /// Creates a service with an explicit time source.
    pub fn with_clock(repo: R, clock: C) -> Self {
        Self { repo, clock }
    }

    /// Lists profiles newest first, optionally filtered by name/address text.
    pub fn search(&self, text: Option<&str>) -> ServiceResult<Vec<Profile>> {
        let query = ProfileListQuery {
            text: text.map(str::to_string),
        };
        let filtered = query.text.as_deref().is_some_and(|t| !t.is_empty());
        let profiles = self
            .repo
            .list_profiles(&query)
            .map_err(|err| log_failure("profile_search", None, err.into()))?;
        info!(
            "event=profile_search module=service status=ok filtered={} count={}",
            filtered,
            profiles.len()
        );
        Ok(profiles)
    }

    /// Fetches one profile.
    ///
    /// # Errors
    /// - `NotFound` when zero rows match.
    pub fn get(&self, id: ProfileId) -> ServiceResult<Profile> {
        match self.repo.get_profile(id) {
            Ok(Some(profile)) => Ok(profile),
            Ok(None) => Err(ProfileServiceError::NotFound(id)),
            Err(err) => Err(log_failure("profile_get", Some(id), err.into())),
        }
    }

    /// Fetches one profile, returning `None` when it does not exist.
    pub fn find(&self, id: ProfileId) -> ServiceResult<Option<Profile>> {
        match self.get(id) {
            Ok(profile) => Ok(Some(profile)),
            Err(ProfileServiceError::NotFound(_)) => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Validates input and persists a new profile.
    ///
    /// # Contract
    /// - Generates the id and sets `created_at == updated_at == now`.
    /// - No duplicate detection.
    pub fn create(&self, input: &ProfileInput) -> ServiceResult<Profile> {
        let draft = input
            .validate()
            .map_err(|err| log_failure("profile_create", None, err.into()))?;
        let profile = Profile::new(draft, self.now());

        self.repo
            .insert_profile(&profile)
            .map_err(|err| log_failure("profile_create", Some(profile.id), err.into()))?;

        info!(
            "event=profile_create module=service status=ok profile_id={}",
            profile.id
        );
        Ok(profile)
    }

    /// Validates input and overwrites every writable field of one profile.
    ///
    /// # Contract
    /// - One write; `created_at` untouched; `updated_at` refreshed.
    /// - `NotFound` leaves the store unchanged.
    pub fn update(&self, id: ProfileId, input: &ProfileInput) -> ServiceResult<Profile> {
        let draft = input
            .validate()
            .map_err(|err| log_failure("profile_update", Some(id), err.into()))?;

        let profile = self
            .repo
            .update_profile(id, &draft, self.now())
            .map_err(|err| log_failure("profile_update", Some(id), err.into()))?;

        info!(
            "event=profile_update module=service status=ok profile_id={}",
            id
        );
        Ok(profile)
    }

    /// Removes one profile if present.
    pub fn delete(&self, id: ProfileId) -> ServiceResult<DeleteOutcome> {
        let removed = self
            .repo
            .delete_profile(id)
            .map_err(|err| log_failure("profile_delete", Some(id), err.into()))?;

        let outcome = if removed {
            DeleteOutcome::Deleted
        } else {
            DeleteOutcome::Absent
        };
        info!(
            "event=profile_delete module=service status=ok profile_id={} outcome={:?}",
            id, outcome
        );
        Ok(outcome)
    }

    // Storage keeps microseconds; truncate so returned records equal read-backs.
    fn now(&self) -> DateTime<Utc> {
        let now = self.clock.now();
        DateTime::<Utc>::from_timestamp_micros(now.timestamp_micros()).unwrap_or(now)
    }
}

fn log_failure(
    event: &str,
    id: Option<ProfileId>,
    err: ProfileServiceError,
) -> ProfileServiceError {
    let id = id.map_or_else(|| "-".to_string(), |id| id.to_string());
    match &err {
        ProfileServiceError::Validation(inner) => warn!(
            "event={event} module=service status=rejected profile_id={id} field={}",
            inner.field()
        ),
        ProfileServiceError::NotFound(_) => {
            info!("event={event} module=service status=not_found profile_id={id}")
        }
        ProfileServiceError::Store(inner) => error!(
            "event={event} module=service status=error profile_id={id} error={inner}"
        ),
    }
    err
}
