//! Error types for the storage layer.

use thiserror::Error;

/// Errors surfaced by the repository layer.
///
/// Absence of a row is not an error; lookups return `Ok(None)` instead.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Query execution or connectivity failure, surfaced unmodified.
    #[error("query execution failed: {0}")]
    Query(#[source] rusqlite::Error),

    /// A stored row could not be converted into an entity.
    #[error("row decoding failed: {0}")]
    Decode(#[source] rusqlite::Error),

    /// The list filter carried an order key outside the supported set.
    #[error("unsupported order key: {0:?}")]
    InvalidOrder(String),

    /// The one-time dummy-data seed failed; every init caller sees this.
    #[error("database seeding failed: {0}")]
    Seed(String),
}

impl StoreError {
    /// Classify a driver error: conversion failures are data-integrity
    /// problems, everything else is an execution failure.
    pub(crate) fn from_driver(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::FromSqlConversionFailure(..)
            | rusqlite::Error::InvalidColumnType(..) => StoreError::Decode(err),
            other => StoreError::Query(other),
        }
    }
}
