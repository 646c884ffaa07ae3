//! SQLite read repository for races and sporting events
//!
//! One generic implementation serves both entity families; the `Family`
//! marker supplies the table name, so the two instantiations cannot drift
//! apart behaviorally.

use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use serde::Serialize;
use std::marker::PhantomData;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

use super::error::StoreError;
use super::query::{apply_filter, Filter};
use super::schema;

/// Derived open/closed classification, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    Open,
    Closed,
}

/// A single race or sporting event.
#[derive(Debug, Clone, Serialize)]
pub struct Entity {
    pub id: String,
    pub meeting_id: String,
    pub name: String,
    pub number: i64,
    pub visible: bool,
    pub advertised_start_time: DateTime<Utc>,
    /// Open iff the advertised start is strictly in the future at read time.
    pub status: Status,
}

/// Marker for one entity family: which table it lives in and how its dummy
/// rows are labelled.
pub trait Family: Send + Sync + 'static {
    const TABLE: &'static str;
    const SEED_LABEL: &'static str;
}

/// The races family.
pub struct Races;

impl Family for Races {
    const TABLE: &'static str = "races";
    const SEED_LABEL: &'static str = "Race";
}

/// The sporting events family.
pub struct Events;

impl Family for Events {
    const TABLE: &'static str = "events";
    const SEED_LABEL: &'static str = "Event";
}

/// Dummy rows inserted per family on first init.
const SEED_COUNT: u32 = 24;

/// Read access to one entity family.
///
/// The connection is shared with the other family's repository; each call
/// takes the lock only for the duration of one statement.
pub struct Repository<F: Family> {
    conn: Arc<Mutex<Connection>>,
    init: OnceLock<Result<(), String>>,
    _family: PhantomData<F>,
}

impl<F: Family> Repository<F> {
    /// Create a new repository over an already-opened database.
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self {
            conn,
            init: OnceLock::new(),
            _family: PhantomData,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn base_select() -> String {
        format!(
            "SELECT id, meeting_id, name, number, visible, advertised_start_time FROM {}",
            F::TABLE
        )
    }

    /// Seed the family's dummy rows exactly once per process.
    ///
    /// Concurrent callers block until the first run finishes; every caller
    /// observes that run's outcome, and later calls never re-seed.
    pub fn init(&self) -> Result<(), StoreError> {
        let outcome = self.init.get_or_init(|| {
            let conn = self.lock();
            let rows = schema::seed_rows(F::SEED_LABEL, SEED_COUNT, Utc::now());
            schema::seed_table(&conn, F::TABLE, &rows).map_err(|e| e.to_string())
        });

        outcome.clone().map_err(StoreError::Seed)
    }

    /// Return all entities matching `filter`.
    ///
    /// An empty result is an empty vec, never an error. A row that fails to
    /// decode aborts the whole call.
    pub fn list(&self, filter: Option<&Filter>) -> Result<Vec<Entity>, StoreError> {
        let (sql, args) = apply_filter(&Self::base_select(), filter)?;

        let conn = self.lock();
        let mut stmt = conn.prepare(&sql).map_err(StoreError::Query)?;

        let result = stmt
            .query_map(params_from_iter(args), entity_from_row)
            .map_err(StoreError::Query)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(StoreError::from_driver);
        result
    }

    /// Look up a single entity by id.
    ///
    /// The identifier is always bound as a parameter. A missing row is
    /// `Ok(None)`, distinguishable from a failed query.
    pub fn get_by_id(&self, id: &str) -> Result<Option<Entity>, StoreError> {
        let sql = format!("{} WHERE id = ?1", Self::base_select());

        let conn = self.lock();
        conn.query_row(&sql, params![id], entity_from_row)
            .optional()
            .map_err(StoreError::from_driver)
    }
}

/// Decode one row (six columns, fixed order) into an [`Entity`].
///
/// Status is derived against the current instant per row, so two rows in the
/// same batch can land on either side of "now".
fn entity_from_row(row: &Row<'_>) -> rusqlite::Result<Entity> {
    let raw_start: String = row.get(5)?;
    let advertised_start_time = DateTime::parse_from_rfc3339(&raw_start)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(5, Type::Text, Box::new(e)))?
        .with_timezone(&Utc);

    let status = if advertised_start_time > Utc::now() {
        Status::Open
    } else {
        Status::Closed
    };

    Ok(Entity {
        id: row.get(0)?,
        meeting_id: row.get(1)?,
        name: row.get(2)?,
        number: row.get(3)?,
        visible: row.get(4)?,
        advertised_start_time,
        status,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use std::thread;

    fn in_memory() -> Arc<Mutex<Connection>> {
        let conn = Connection::open_in_memory().unwrap();
        schema::create_tables(&conn).unwrap();
        Arc::new(Mutex::new(conn))
    }

    fn race_repo() -> Repository<Races> {
        Repository::new(in_memory())
    }

    fn insert(
        repo: &Repository<Races>,
        id: &str,
        meeting_id: &str,
        number: i64,
        visible: bool,
        start: DateTime<Utc>,
    ) {
        repo.lock()
            .execute(
                "INSERT INTO races (id, meeting_id, name, number, visible, advertised_start_time)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    id,
                    meeting_id,
                    format!("Race {id}"),
                    number,
                    visible,
                    start.to_rfc3339(),
                ],
            )
            .unwrap();
    }

    fn seed_scenario(repo: &Repository<Races>) {
        let now = Utc::now();
        insert(repo, "1", "m1", 3, true, now + Duration::hours(1));
        insert(repo, "2", "m2", 1, false, now - Duration::hours(1));
    }

    #[test]
    fn test_list_on_empty_table_returns_empty_vec() {
        let repo = race_repo();
        assert!(repo.list(None).unwrap().is_empty());
    }

    #[test]
    fn test_default_filter_matches_no_filter() {
        let repo = race_repo();
        seed_scenario(&repo);

        let unfiltered = repo.list(None).unwrap();
        let defaulted = repo.list(Some(&Filter::default())).unwrap();

        assert_eq!(unfiltered.len(), 2);
        let ids = |entities: &[Entity]| entities.iter().map(|e| e.id.clone()).collect::<Vec<_>>();
        assert_eq!(ids(&unfiltered), ids(&defaulted));
    }

    #[test]
    fn test_visible_filter_restricts_to_visible_rows() {
        let repo = race_repo();
        seed_scenario(&repo);

        let filter = Filter {
            visible: true,
            ..Filter::default()
        };
        let visible = repo.list(Some(&filter)).unwrap();

        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].id, "1");
        assert_eq!(visible[0].status, Status::Open);
    }

    #[test]
    fn test_meeting_ids_filter_restricts_to_members() {
        let repo = race_repo();
        seed_scenario(&repo);
        insert(&repo, "3", "m3", 5, true, Utc::now());

        let filter = Filter {
            meeting_ids: vec!["m1".to_string(), "m3".to_string()],
            ..Filter::default()
        };
        let listed = repo.list(Some(&filter)).unwrap();

        assert_eq!(listed.len(), 2);
        assert!(listed.iter().all(|e| filter.meeting_ids.contains(&e.meeting_id)));
    }

    #[test]
    fn test_order_by_number_sorts_ascending() {
        let repo = race_repo();
        seed_scenario(&repo);

        let filter = Filter {
            order_type: Some("number".to_string()),
            ..Filter::default()
        };
        let listed = repo.list(Some(&filter)).unwrap();

        let ids: Vec<_> = listed.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["2", "1"]);
    }

    #[test]
    fn test_order_by_start_sorts_ascending() {
        let repo = race_repo();
        seed_scenario(&repo);

        let filter = Filter {
            order_type: Some("start".to_string()),
            ..Filter::default()
        };
        let listed = repo.list(Some(&filter)).unwrap();

        assert_eq!(listed[0].id, "2");
        assert!(listed[0].advertised_start_time <= listed[1].advertised_start_time);
    }

    #[test]
    fn test_unknown_order_key_fails_without_executing() {
        let repo = race_repo();
        seed_scenario(&repo);

        let filter = Filter {
            order_type: Some("colour".to_string()),
            ..Filter::default()
        };
        let err = repo.list(Some(&filter)).unwrap_err();
        assert!(matches!(err, StoreError::InvalidOrder(_)));
    }

    #[test]
    fn test_get_by_id_returns_matching_entity() {
        let repo = race_repo();
        seed_scenario(&repo);

        let race = repo.get_by_id("2").unwrap().unwrap();
        assert_eq!(race.id, "2");
        assert_eq!(race.meeting_id, "m2");
        assert_eq!(race.status, Status::Closed);
    }

    #[test]
    fn test_get_by_id_missing_row_is_none_not_error() {
        let repo = race_repo();
        seed_scenario(&repo);

        assert!(repo.get_by_id("999").unwrap().is_none());
    }

    #[test]
    fn test_get_by_id_binds_hostile_identifiers_harmlessly() {
        let repo = race_repo();
        seed_scenario(&repo);

        for id in ["1 OR 1=1", "1; DROP TABLE races", "' OR '1'='1", "\"1\""] {
            assert!(repo.get_by_id(id).unwrap().is_none(), "id {id:?} matched");
        }

        // The table survived and still answers queries.
        assert_eq!(repo.list(None).unwrap().len(), 2);
    }

    #[test]
    fn test_status_derives_from_start_time() {
        let repo = race_repo();
        seed_scenario(&repo);

        let open = repo.get_by_id("1").unwrap().unwrap();
        let closed = repo.get_by_id("2").unwrap().unwrap();
        assert_eq!(open.status, Status::Open);
        assert_eq!(closed.status, Status::Closed);
    }

    #[test]
    fn test_status_flips_once_start_time_passes() {
        let repo = race_repo();
        insert(
            &repo,
            "soon",
            "m1",
            1,
            true,
            Utc::now() + Duration::milliseconds(100),
        );

        assert_eq!(repo.get_by_id("soon").unwrap().unwrap().status, Status::Open);

        thread::sleep(std::time::Duration::from_millis(200));

        assert_eq!(
            repo.get_by_id("soon").unwrap().unwrap().status,
            Status::Closed
        );
    }

    #[test]
    fn test_malformed_timestamp_is_a_decode_error() {
        let repo = race_repo();
        repo.lock()
            .execute(
                "INSERT INTO races (id, meeting_id, name, number, visible, advertised_start_time)
                 VALUES ('bad', 'm1', 'Race bad', 1, 1, 'not-a-timestamp')",
                [],
            )
            .unwrap();

        assert!(matches!(
            repo.list(None).unwrap_err(),
            StoreError::Decode(_)
        ));
        assert!(matches!(
            repo.get_by_id("bad").unwrap_err(),
            StoreError::Decode(_)
        ));
    }

    #[test]
    fn test_bad_row_aborts_the_whole_list() {
        let repo = race_repo();
        seed_scenario(&repo);
        repo.lock()
            .execute(
                "INSERT INTO races (id, meeting_id, name, number, visible, advertised_start_time)
                 VALUES ('bad', 'm1', 'Race bad', 1, 1, 'not-a-timestamp')",
                [],
            )
            .unwrap();

        // Two rows decode fine, but the corrupt one poisons the batch.
        assert!(repo.list(None).is_err());
    }

    #[test]
    fn test_init_seeds_once_and_is_idempotent() {
        let repo = race_repo();

        repo.init().unwrap();
        repo.init().unwrap();

        let listed = repo.list(None).unwrap();
        assert_eq!(listed.len(), SEED_COUNT as usize);
    }

    #[test]
    fn test_concurrent_init_seeds_exactly_once() {
        let repo = Arc::new(race_repo());

        thread::scope(|s| {
            for _ in 0..50 {
                let repo = Arc::clone(&repo);
                s.spawn(move || repo.init().unwrap());
            }
        });

        assert_eq!(repo.list(None).unwrap().len(), SEED_COUNT as usize);
    }

    #[test]
    fn test_init_failure_outcome_is_shared_and_latched() {
        let conn = in_memory();
        conn.lock()
            .unwrap()
            .execute("DROP TABLE races", [])
            .unwrap();
        let repo = Arc::new(Repository::<Races>::new(Arc::clone(&conn)));

        let mut messages = Vec::new();
        thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    let repo = Arc::clone(&repo);
                    s.spawn(move || repo.init().unwrap_err().to_string())
                })
                .collect();
            for handle in handles {
                messages.push(handle.join().unwrap());
            }
        });

        // All callers observe the one failed run.
        assert!(messages.windows(2).all(|w| w[0] == w[1]));

        // Recreating the table does not trigger a second seeding run.
        schema::create_tables(&conn.lock().unwrap()).unwrap();
        assert!(repo.init().is_err());
        assert!(repo.list(None).unwrap().is_empty());
    }

    #[test]
    fn test_events_family_reads_its_own_table() {
        let conn = in_memory();
        let races = Repository::<Races>::new(Arc::clone(&conn));
        let events = Repository::<Events>::new(conn);

        events.init().unwrap();

        assert!(races.list(None).unwrap().is_empty());
        assert_eq!(events.list(None).unwrap().len(), SEED_COUNT as usize);
        assert!(events.get_by_id("1").unwrap().is_some());
    }

    #[test]
    fn test_entity_serializes_with_derived_status() {
        let repo = race_repo();
        seed_scenario(&repo);

        let race = repo.get_by_id("1").unwrap().unwrap();
        let json = serde_json::to_value(&race).unwrap();

        assert_eq!(json["status"], "OPEN");
        assert_eq!(json["meeting_id"], "m1");
        assert!(json["advertised_start_time"].as_str().unwrap().contains('T'));
    }
}
