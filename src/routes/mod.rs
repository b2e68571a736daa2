/// Application routes configuration
use crate::handlers::{
    force_refresh, get_calendar, get_countdown, get_last_race, get_weekend, health,
    refresh_weekend, reload_calendar, AppState,
};
use axum::{routing::get, Router};

/// Build the application router with all routes
pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health))
        // Race weekend endpoints
        .route("/weekend", get(get_weekend))
        .route("/weekend/countdown", get(get_countdown))
        .route("/weekend/refresh", get(refresh_weekend))
        .route("/weekend/force", get(force_refresh))
        // Calendar endpoints
        .route("/calendar", get(get_calendar))
        .route("/calendar/last", get(get_last_race))
        .route("/calendar/reload", get(reload_calendar))
        .with_state(state)
}
