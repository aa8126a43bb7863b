//! Profile repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD and search APIs over the canonical `profiles` table.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - Write paths must call `ProfileDraft::validate()` before SQL mutations.
//! - Read paths must reject invalid persisted state instead of masking it.
//! - Search filtering happens in SQL, never over a fully loaded table.
//! - List order is `created_at DESC, id ASC`.

use crate::db::migrations::{current_user_version, latest_version};
use crate::db::{DbError, CASEFOLD_FN};
use crate::model::profile::{Profile, ProfileDraft, ProfileId, ProfileValidationError};
use chrono::{DateTime, Utc};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const PROFILE_COLUMNS: &[&str] = &[
    "id",
    "name",
    "description",
    "address",
    "latitude",
    "longitude",
    "image_url",
    "created_at",
    "updated_at",
];

const PROFILE_SELECT_SQL: &str = "SELECT
    id,
    name,
    description,
    address,
    latitude,
    longitude,
    image_url,
    created_at,
    updated_at
FROM profiles";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for profile persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(ProfileValidationError),
    Db(DbError),
    NotFound(ProfileId),
    InvalidData(String),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Required table is missing.
    MissingRequiredTable(&'static str),
    /// Required column is missing from expected table.
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "profile not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted profile data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "profile repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "profile repository requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "profile repository requires column `{column}` in table `{table}`"
            ),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ProfileValidationError> for RepoError {
    fn from(value: ProfileValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Query options for listing profiles.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileListQuery {
    /// Case-insensitive substring matched against `name` or `address`.
    ///
    /// `None` or empty text returns every profile. The text is matched as
    /// given, surrounding whitespace included.
    pub text: Option<String>,
}

impl ProfileListQuery {
    pub fn search(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
        }
    }

    fn needle(&self) -> Option<String> {
        self.text
            .as_deref()
            .filter(|text| !text.is_empty())
            .map(str::to_lowercase)
    }
}

/// Repository interface for profile operations.
pub trait ProfileRepository {
    /// Inserts a fully built record, timestamps included.
    fn insert_profile(&self, profile: &Profile) -> RepoResult<()>;
    /// Overwrites every writable field in one statement and returns the row.
    ///
    /// `updated_at` is stored as `max(updated_at, previous + 1µs)`.
    fn update_profile(
        &self,
        id: ProfileId,
        draft: &ProfileDraft,
        updated_at: DateTime<Utc>,
    ) -> RepoResult<Profile>;
    fn get_profile(&self, id: ProfileId) -> RepoResult<Option<Profile>>;
    fn list_profiles(&self, query: &ProfileListQuery) -> RepoResult<Vec<Profile>>;
    /// Hard-deletes one profile; returns whether a row was removed.
    fn delete_profile(&self, id: ProfileId) -> RepoResult<bool>;
}

/// SQLite-backed profile repository.
pub struct SqliteProfileRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteProfileRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    ///
    /// # Errors
    /// - `UninitializedConnection` when migrations were not applied.
    /// - `MissingRequiredTable` / `MissingRequiredColumn` on schema drift.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_profile_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl ProfileRepository for SqliteProfileRepository<'_> {
    fn insert_profile(&self, profile: &Profile) -> RepoResult<()> {
        profile.draft().validate()?;

        self.conn.execute(
            "INSERT INTO profiles (
                id,
                name,
                description,
                address,
                latitude,
                longitude,
                image_url,
                created_at,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9);",
            params![
                profile.id.to_string(),
                profile.name.as_str(),
                profile.description.as_str(),
                profile.address.as_str(),
                profile.latitude,
                profile.longitude,
                profile.image_url.as_deref(),
                profile.created_at.timestamp_micros(),
                profile.updated_at.timestamp_micros(),
            ],
        )?;

        Ok(())
    }

    fn update_profile(
        &self,
        id: ProfileId,
        draft: &ProfileDraft,
        updated_at: DateTime<Utc>,
    ) -> RepoResult<Profile> {
        draft.validate()?;

        let mut stmt = self.conn.prepare(
            "UPDATE profiles
             SET
                name = ?2,
                description = ?3,
                address = ?4,
                latitude = ?5,
                longitude = ?6,
                image_url = ?7,
                updated_at = MAX(?8, updated_at + 1)
             WHERE id = ?1
             RETURNING
                id,
                name,
                description,
                address,
                latitude,
                longitude,
                image_url,
                created_at,
                updated_at;",
        )?;

        let mut rows = stmt.query(params![
            id.to_string(),
            draft.name.as_str(),
            draft.description.as_str(),
            draft.address.as_str(),
            draft.latitude,
            draft.longitude,
            draft.image_url.as_deref(),
            updated_at.timestamp_micros(),
        ])?;

        let Some(row) = rows.next()? else {
            return Err(RepoError::NotFound(id));
        };
        let profile = parse_profile_row(row)?;
        Ok(profile)
    }

    fn get_profile(&self, id: ProfileId) -> RepoResult<Option<Profile>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{PROFILE_SELECT_SQL} WHERE id = ?1;"))?;

        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_profile_row(row)?));
        }

        Ok(None)
    }

    fn list_profiles(&self, query: &ProfileListQuery) -> RepoResult<Vec<Profile>> {
        let mut sql = format!("{PROFILE_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(needle) = query.needle() {
            sql.push_str(&format!(
                " AND (instr({CASEFOLD_FN}(name), ?1) > 0 OR instr({CASEFOLD_FN}(address), ?1) > 0)"
            ));
            bind_values.push(Value::Text(needle));
        }

        sql.push_str(" ORDER BY created_at DESC, id ASC");

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut profiles = Vec::new();

        while let Some(row) = rows.next()? {
            profiles.push(parse_profile_row(row)?);
        }

        Ok(profiles)
    }

    fn delete_profile(&self, id: ProfileId) -> RepoResult<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM profiles WHERE id = ?1;", [id.to_string()])?;
        Ok(changed > 0)
    }
}

fn parse_profile_row(row: &Row<'_>) -> RepoResult<Profile> {
    let id_text: String = row.get("id")?;
    let id = Uuid::parse_str(&id_text).map_err(|_| {
        RepoError::InvalidData(format!("invalid uuid value `{id_text}` in profiles.id"))
    })?;

    let profile = Profile {
        id,
        name: row.get("name")?,
        description: row.get("description")?,
        address: row.get("address")?,
        latitude: row.get("latitude")?,
        longitude: row.get("longitude")?,
        image_url: row.get("image_url")?,
        created_at: parse_timestamp(row.get("created_at")?, "created_at")?,
        updated_at: parse_timestamp(row.get("updated_at")?, "updated_at")?,
    };
    profile.draft().validate()?;
    Ok(profile)
}

fn parse_timestamp(micros: i64, column: &str) -> RepoResult<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp_micros(micros).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid timestamp `{micros}` in profiles.{column}"
        ))
    })
}

fn ensure_profile_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version = current_user_version(conn)?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    if !table_exists(conn, "profiles")? {
        return Err(RepoError::MissingRequiredTable("profiles"));
    }

    let columns = table_columns(conn, "profiles")?;
    for &column in PROFILE_COLUMNS {
        if !columns.iter().any(|current| current == column) {
            return Err(RepoError::MissingRequiredColumn {
                table: "profiles",
                column,
            });
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists = conn
        .query_row(
            "SELECT 1
             FROM sqlite_master
             WHERE type = 'table' AND name = ?1;",
            [table],
            |row| row.get::<_, i64>(0),
        )
        .optional()?;
    Ok(exists.is_some())
}

fn table_columns(conn: &Connection, table: &str) -> RepoResult<Vec<String>> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    let mut columns = Vec::new();
    while let Some(row) = rows.next()? {
        columns.push(row.get::<_, String>(1)?);
    }
    Ok(columns)
}
