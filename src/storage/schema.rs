//! SQLite schema definitions and dummy-data seeding
//!
//! Tables:
//! - races: race entities, one row per race
//! - events: sporting event entities, structurally identical to races
//!
//! Both tables carry the same six columns; the derived open/closed status is
//! never stored.

use anyhow::Context;
use chrono::{DateTime, Duration, Utc};
use rusqlite::{params, Connection, Result};
use std::path::Path;

const TABLES: [&str; 2] = ["races", "events"];

/// Create all tables in the database
pub fn create_tables(conn: &Connection) -> Result<()> {
    for table in TABLES {
        conn.execute(
            &format!(
                r#"
                CREATE TABLE IF NOT EXISTS {table} (
                    id TEXT PRIMARY KEY,
                    meeting_id TEXT NOT NULL,
                    name TEXT NOT NULL,
                    number INTEGER NOT NULL,
                    visible INTEGER NOT NULL,
                    advertised_start_time TEXT NOT NULL
                )
                "#
            ),
            [],
        )?;

        conn.execute(
            &format!("CREATE INDEX IF NOT EXISTS idx_{table}_meeting ON {table}(meeting_id)"),
            [],
        )?;
    }

    Ok(())
}

/// Open the database file, creating parent directories and tables if needed
pub fn open_database(path: &str) -> anyhow::Result<Connection> {
    let path = Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).context("Failed to create database directory")?;
    }

    let conn = Connection::open(path).context("Failed to open database")?;
    create_tables(&conn)?;

    Ok(conn)
}

/// One dummy row, used to seed a freshly created table.
#[derive(Debug, Clone)]
pub struct SeedRow {
    pub id: String,
    pub meeting_id: String,
    pub name: String,
    pub number: i64,
    pub visible: bool,
    pub advertised_start_time: DateTime<Utc>,
}

const VENUES: [&str; 6] = [
    "Ascot Park",
    "Broadmeadow",
    "Caulfield",
    "Dapto",
    "Eagle Farm",
    "Flemington",
];

/// Generate `count` deterministic dummy rows labelled for one entity family.
///
/// Start times straddle `now` so the seeded data contains both upcoming and
/// already-started entries.
pub fn seed_rows(label: &str, count: u32, now: DateTime<Utc>) -> Vec<SeedRow> {
    (1..=count)
        .map(|i| {
            let number = i64::from((i - 1) % 8 + 1);
            SeedRow {
                id: i.to_string(),
                meeting_id: format!("m{}", (i - 1) % 5 + 1),
                name: format!(
                    "{} {} {}",
                    VENUES[(i as usize - 1) % VENUES.len()],
                    label,
                    number
                ),
                number,
                visible: i % 3 != 0,
                advertised_start_time: now + Duration::hours(i64::from(i) - i64::from(count) / 2),
            }
        })
        .collect()
}

/// Insert seed rows into `table`, leaving existing ids untouched.
pub fn seed_table(conn: &Connection, table: &str, rows: &[SeedRow]) -> Result<()> {
    let mut stmt = conn.prepare(&format!(
        "INSERT OR IGNORE INTO {table} \
         (id, meeting_id, name, number, visible, advertised_start_time) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)"
    ))?;

    for row in rows {
        stmt.execute(params![
            row.id,
            row.meeting_id,
            row.name,
            row.number,
            row.visible,
            row.advertised_start_time.to_rfc3339(),
        ])?;
    }

    Ok(())
}
