//! SQLite storage module for races and sporting events
//!
//! Provides read access to the two entity families behind one generic
//! repository, plus schema setup and dummy-data seeding.

pub mod error;
pub mod query;
pub mod repository;
pub mod schema;

pub use error::StoreError;
pub use query::Filter;
pub use repository::{Entity, Events, Races, Repository, Status};
pub use schema::{create_tables, open_database};
