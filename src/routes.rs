//! API route handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

use crate::storage::{Events, Races, Repository, StoreError};
use crate::types::{
    ErrorResponse, GetEventResponse, GetRaceResponse, HealthResponse, ListEventsRequest,
    ListEventsResponse, ListRacesRequest, ListRacesResponse,
};

/// Application state shared across handlers.
pub struct AppState {
    pub races: Repository<Races>,
    pub events: Repository<Events>,
}

/// Error type for API handlers.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.into(),
        }
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: msg.into(),
        }
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: msg.into(),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::InvalidOrder(_) => ApiError::bad_request(err.to_string()),
            _ => ApiError::internal(err.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorResponse {
            error: self.status.to_string(),
            message: self.message,
        });
        (self.status, body).into_response()
    }
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// List races matching an optional filter.
pub async fn list_races(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ListRacesRequest>,
) -> Result<Json<ListRacesResponse>, ApiError> {
    let races = state.races.list(req.filter.as_ref())?;
    Ok(Json(ListRacesResponse { races }))
}

/// Fetch a single race by id.
pub async fn get_race(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<GetRaceResponse>, ApiError> {
    match state.races.get_by_id(&id)? {
        Some(race) => Ok(Json(GetRaceResponse { race })),
        None => Err(ApiError::not_found(format!("no race with id {id:?}"))),
    }
}

/// List sporting events matching an optional filter.
pub async fn list_events(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ListEventsRequest>,
) -> Result<Json<ListEventsResponse>, ApiError> {
    let events = state.events.list(req.filter.as_ref())?;
    Ok(Json(ListEventsResponse { events }))
}

/// Fetch a single sporting event by id.
pub async fn get_event(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<GetEventResponse>, ApiError> {
    match state.events.get_by_id(&id)? {
        Some(event) => Ok(Json(GetEventResponse { event })),
        None => Err(ApiError::not_found(format!("no event with id {id:?}"))),
    }
}
