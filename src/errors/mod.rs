/// Unified error handling module
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Unified error response format
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub ok: bool,
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("External API error: {0}")]
    ExternalApi(#[from] reqwest::Error),
    #[error("{source_name} responded with status {status}")]
    Upstream { source_name: &'static str, status: u16 },
    #[error("Timed out: {0}")]
    Timeout(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Internal error: {0}")]
    Internal(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl ApiError {
    /// Message suitable for `RaceWeekendState::Error`
    pub fn state_message(&self) -> String {
        match self {
            ApiError::NotFound(msg) | ApiError::Internal(msg) => msg.clone(),
            other => other.to_string(),
        }
    }

    fn code(&self) -> &'static str {
        match self {
            ApiError::ExternalApi(e) => match e.status().map(|s| s.as_u16()) {
                Some(status) => upstream_code(status),
                None if e.is_timeout() => "UPSTREAM_TIMEOUT",
                None => "UPSTREAM_ERROR",
            },
            ApiError::Upstream { status, .. } => upstream_code(*status),
            ApiError::Timeout(_) => "UPSTREAM_TIMEOUT",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Internal(_) => "INTERNAL_ERROR",
            ApiError::InvalidInput(_) => "INVALID_INPUT",
        }
    }
}

fn upstream_code(status: u16) -> &'static str {
    match status {
        403 => "UPSTREAM_403",
        404 => "UPSTREAM_404",
        429 => "UPSTREAM_429",
        500..=599 => "UPSTREAM_5XX",
        _ => "UPSTREAM_ERROR",
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let error_response = ErrorResponse {
            ok: false,
            error: ErrorDetail {
                code: self.code().to_string(),
                message: self.to_string(),
            },
        };

        // Errors travel in the envelope, never in the status line
        (StatusCode::OK, Json(error_response)).into_response()
    }
}

/// Type alias for API results
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_codes() {
        let err = ApiError::Upstream {
            source_name: "jolpica",
            status: 503,
        };
        assert_eq!(err.code(), "UPSTREAM_5XX");
        assert_eq!(err.to_string(), "jolpica responded with status 503");

        let err = ApiError::Upstream {
            source_name: "open-meteo",
            status: 429,
        };
        assert_eq!(err.code(), "UPSTREAM_429");
    }

    #[test]
    fn test_state_message_keeps_plain_text_for_not_found() {
        let err = ApiError::NotFound("no upcoming races found".to_string());
        assert_eq!(err.state_message(), "no upcoming races found");

        let err = ApiError::Timeout("calendar".to_string());
        assert_eq!(err.state_message(), "Timed out: calendar");
    }
}
