//! Request and response types for the Trackside API.

use serde::{Deserialize, Serialize};

use crate::storage::{Entity, Filter};

/// Body of `POST /v1/list-races`.
#[derive(Debug, Default, Deserialize)]
pub struct ListRacesRequest {
    #[serde(default)]
    pub filter: Option<Filter>,
}

#[derive(Debug, Serialize)]
pub struct ListRacesResponse {
    pub races: Vec<Entity>,
}

/// Body of `POST /v1/list-events`.
#[derive(Debug, Default, Deserialize)]
pub struct ListEventsRequest {
    #[serde(default)]
    pub filter: Option<Filter>,
}

#[derive(Debug, Serialize)]
pub struct ListEventsResponse {
    pub events: Vec<Entity>,
}

#[derive(Debug, Serialize)]
pub struct GetRaceResponse {
    pub race: Entity,
}

#[derive(Debug, Serialize)]
pub struct GetEventResponse {
    pub event: Entity,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}
