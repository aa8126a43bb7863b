use chrono::{DateTime, Duration, Utc};
use profilemap_core::db::open_db_in_memory;
use profilemap_core::{
    Clock, CoordinateInput, DeleteOutcome, ProfileInput, ProfileService, ProfileServiceError,
    ProfileValidationError, SqliteProfileRepository,
};
use std::cell::Cell;
use uuid::Uuid;

/// Advances one second on every reading.
struct SteppingClock {
    next: Cell<DateTime<Utc>>,
}

impl SteppingClock {
    fn starting_at(seconds: i64) -> Self {
        Self {
            next: Cell::new(DateTime::<Utc>::from_timestamp(seconds, 0).unwrap()),
        }
    }
}

impl Clock for SteppingClock {
    fn now(&self) -> DateTime<Utc> {
        let now = self.next.get();
        self.next.set(now + Duration::seconds(1));
        now
    }
}

fn cafe_input() -> ProfileInput {
    ProfileInput {
        name: Some("Cafe X".to_string()),
        description: Some("Coffee".to_string()),
        address: Some("1 Main St".to_string()),
        latitude: Some(CoordinateInput::Number(40.0)),
        longitude: Some(CoordinateInput::Number(-73.0)),
        image_url: None,
    }
}

#[test]
fn create_then_get_returns_same_profile() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteProfileRepository::try_new(&conn).unwrap();
    let service = ProfileService::new(repo);

    let created = service.create(&cafe_input()).unwrap();
    assert_eq!(created.name, "Cafe X");
    assert_eq!(created.image_url, None);
    assert_eq!(created.created_at, created.updated_at);

    let loaded = service.get(created.id).unwrap();
    assert_eq!(loaded, created);
}

#[test]
fn create_rejects_invalid_input_without_writing() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteProfileRepository::try_new(&conn).unwrap();
    let service = ProfileService::new(repo);

    let mut input = cafe_input();
    input.name = Some("   ".to_string());
    let err = service.create(&input).unwrap_err();
    assert!(matches!(
        err,
        ProfileServiceError::Validation(ProfileValidationError::MissingField("name"))
    ));
    assert!(service.search(None).unwrap().is_empty());
}

#[test]
fn update_keeps_created_at_and_advances_updated_at() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteProfileRepository::try_new(&conn).unwrap();
    let service = ProfileService::with_clock(repo, SteppingClock::starting_at(1_700_000_000));

    let created = service.create(&cafe_input()).unwrap();

    let mut input = cafe_input();
    input.name = Some("Cafe Y".to_string());
    input.image_url = Some("https://example.com/y.png".to_string());
    let updated = service.update(created.id, &input).unwrap();

    assert_eq!(updated.name, "Cafe Y");
    assert_eq!(updated.created_at, created.created_at);
    assert!(updated.updated_at > created.updated_at);
    assert_eq!(service.get(created.id).unwrap(), updated);
}

#[test]
fn update_unknown_id_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteProfileRepository::try_new(&conn).unwrap();
    let service = ProfileService::new(repo);

    let missing = Uuid::new_v4();
    let err = service.update(missing, &cafe_input()).unwrap_err();
    assert!(matches!(err, ProfileServiceError::NotFound(id) if id == missing));
    assert!(service.search(None).unwrap().is_empty());
}

#[test]
fn get_unknown_id_is_not_found_and_find_is_none() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteProfileRepository::try_new(&conn).unwrap();
    let service = ProfileService::new(repo);

    let missing = Uuid::new_v4();
    assert!(matches!(
        service.get(missing),
        Err(ProfileServiceError::NotFound(_))
    ));
    assert!(service.find(missing).unwrap().is_none());
}

#[test]
fn delete_is_idempotent() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteProfileRepository::try_new(&conn).unwrap();
    let service = ProfileService::new(repo);

    let created = service.create(&cafe_input()).unwrap();
    assert_eq!(service.delete(created.id).unwrap(), DeleteOutcome::Deleted);
    assert_eq!(service.delete(created.id).unwrap(), DeleteOutcome::Absent);
    assert_eq!(
        service.delete(Uuid::new_v4()).unwrap(),
        DeleteOutcome::Absent
    );
    assert!(service.find(created.id).unwrap().is_none());
}

#[test]
fn search_lists_newest_first_and_filters() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteProfileRepository::try_new(&conn).unwrap();
    let service = ProfileService::with_clock(repo, SteppingClock::starting_at(1_700_000_000));

    let first = service.create(&cafe_input()).unwrap();
    let mut bakery = cafe_input();
    bakery.name = Some("Bakery".to_string());
    bakery.address = Some("9 Elm Rd".to_string());
    let second = service.create(&bakery).unwrap();

    let all: Vec<_> = service
        .search(None)
        .unwrap()
        .into_iter()
        .map(|profile| profile.id)
        .collect();
    assert_eq!(all, vec![second.id, first.id]);

    let filtered = service.search(Some("MAIN")).unwrap();
    assert_eq!(filtered.len(), 1);
    assert_eq!(filtered[0].id, first.id);

    assert_eq!(service.search(Some("")).unwrap().len(), 2);
    let spaced = service.search(Some(" x")).unwrap();
    assert_eq!(spaced.len(), 1);
    assert_eq!(spaced[0].id, first.id);
}
