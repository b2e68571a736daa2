/// HTTP request handlers
use crate::domain::{Health, RaceEvent, RaceWeekendState};
use crate::errors::ApiError;
use crate::services::{CalendarOverview, RaceWeekendService};
use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub weekend: Arc<RaceWeekendService>,
}

/// Successful response wrapper
#[derive(Serialize)]
pub struct SuccessResponse<T: Serialize> {
    pub ok: bool,
    #[serde(flatten)]
    pub data: T,
}

impl<T: Serialize> SuccessResponse<T> {
    pub fn new(data: T) -> Self {
        Self { ok: true, data }
    }
}

/// Health check handler
pub async fn health() -> Json<Health> {
    Json(Health {
        status: "ok",
        now: Utc::now(),
    })
}

/// Currently published weekend state
pub async fn get_weekend(
    State(state): State<AppState>,
) -> Json<SuccessResponse<RaceWeekendState>> {
    Json(SuccessResponse::new(state.weekend.current()))
}

/// Countdown to `?to=<RFC3339>` or to the published state's target
pub async fn get_countdown(
    Query(params): Query<HashMap<String, String>>,
    State(state): State<AppState>,
) -> Result<Json<Value>, ApiError> {
    let target = match params.get("to") {
        Some(raw) => DateTime::parse_from_rfc3339(raw)
            .map_err(|e| ApiError::InvalidInput(format!("to={:?}: {}", raw, e)))?,
        None => state
            .weekend
            .current()
            .countdown_target()
            .ok_or_else(|| ApiError::NotFound("nothing to count down to".to_string()))?,
    };

    Ok(Json(serde_json::json!(SuccessResponse::new(
        serde_json::json!({
            "target": target,
            "countdown": state.weekend.countdown_to(&target)
        })
    ))))
}

/// Recompute only when the published state is stale
pub async fn refresh_weekend(State(state): State<AppState>) -> Json<Value> {
    let outcome = state.weekend.refresh_if_stale().await;
    Json(serde_json::json!(SuccessResponse::new(
        serde_json::json!({
            "refresh": outcome,
            "state": state.weekend.current()
        })
    )))
}

/// Recompute immediately
pub async fn force_refresh(State(state): State<AppState>) -> Json<Value> {
    let outcome = state.weekend.force_refresh().await;
    Json(serde_json::json!(SuccessResponse::new(
        serde_json::json!({
            "refresh": outcome,
            "state": state.weekend.current()
        })
    )))
}

/// Loaded season split into upcoming and completed races
pub async fn get_calendar(
    State(state): State<AppState>,
) -> Result<Json<SuccessResponse<CalendarOverview>>, ApiError> {
    let overview = state
        .weekend
        .calendar_overview()
        .ok_or_else(|| ApiError::NotFound("race calendar not loaded".to_string()))?;
    Ok(Json(SuccessResponse::new(overview)))
}

/// Most recent finished race with its classification
pub async fn get_last_race(
    State(state): State<AppState>,
) -> Result<Json<SuccessResponse<RaceEvent>>, ApiError> {
    let race = state
        .weekend
        .last_race_result()
        .ok_or_else(|| ApiError::NotFound("no finished race with results".to_string()))?;
    Ok(Json(SuccessResponse::new(race)))
}

/// Fetch the season calendar again
pub async fn reload_calendar(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let races = state.weekend.reload_calendar().await?;
    Ok(Json(serde_json::json!(SuccessResponse::new(
        serde_json::json!({
            "races": races
        })
    ))))
}
