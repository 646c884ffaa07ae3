//! List-query construction.
//!
//! Turns the base select statement plus an optional caller filter into the
//! final SQL text and a positional parameter list. Nothing in this module
//! touches the database.

use rusqlite::types::Value;
use serde::Deserialize;

use super::error::StoreError;

/// Caller-supplied constraints and ordering key for a list query.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Filter {
    /// When true, restrict results to visible entities. False applies no
    /// constraint (one-directional, not tri-state).
    #[serde(default)]
    pub visible: bool,

    /// When non-empty, restrict results to entities whose meeting id is a
    /// member of this set.
    #[serde(default)]
    pub meeting_ids: Vec<String>,

    /// Sort key; absent or empty means store-natural order.
    #[serde(default)]
    pub order_type: Option<String>,
}

/// Resolve a public order key to its column name.
fn order_column(key: &str) -> Option<&'static str> {
    match key {
        "meetingID" => Some("meeting_id"),
        "name" => Some("name"),
        "number" => Some("number"),
        "visible" => Some("visible"),
        "start" => Some("advertised_start_time"),
        _ => None,
    }
}

/// Apply `filter` to the base select statement.
///
/// Returns the final SQL and the bind parameters in placeholder order. An
/// unrecognized order key fails here, before anything executes.
pub fn apply_filter(
    base: &str,
    filter: Option<&Filter>,
) -> Result<(String, Vec<Value>), StoreError> {
    let mut query = base.to_string();
    let mut args: Vec<Value> = Vec::new();

    let Some(filter) = filter else {
        return Ok((query, args));
    };

    let mut clauses: Vec<String> = Vec::new();

    if filter.visible {
        clauses.push("visible = ?".to_string());
        args.push(Value::from(true));
    }

    if !filter.meeting_ids.is_empty() {
        let placeholders = vec!["?"; filter.meeting_ids.len()].join(", ");
        clauses.push(format!("meeting_id IN ({placeholders})"));
        args.extend(filter.meeting_ids.iter().cloned().map(Value::from));
    }

    if !clauses.is_empty() {
        query.push_str(" WHERE ");
        query.push_str(&clauses.join(" AND "));
    }

    if let Some(key) = filter.order_type.as_deref() {
        if !key.is_empty() {
            let column =
                order_column(key).ok_or_else(|| StoreError::InvalidOrder(key.to_string()))?;
            query.push_str(" ORDER BY ");
            query.push_str(column);
        }
    }

    Ok((query, args))
}
