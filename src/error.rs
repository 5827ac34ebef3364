// Error types: filter validation, listing service failures, and the HTTP-facing
// AppError that turns either into a consistent response.

use std::time::Duration;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use thiserror::Error;

// Rejected filter input. Never changes session state.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FilterError {
    #[error("a ZIP code is required")]
    MissingZip,
    #[error("minimum year {min} is after maximum year {max}")]
    InvertedYearRange { min: i32, max: i32 },
    #[error("radius must be between {min} and {max} miles, got {radius}")]
    RadiusOutOfRange { radius: u32, min: u32, max: u32 },
    #[error("minimum year {year} is before {earliest}")]
    YearTooEarly { year: i32, earliest: i32 },
    #[error("maximum year {year} is after {latest}")]
    YearTooLate { year: i32, latest: i32 },
    #[error("a model can only be chosen together with a make")]
    ModelWithoutMake,
    #[error("invalid value for {field}: {value:?}")]
    InvalidNumber { field: &'static str, value: String },
}

// Failure of a call to the listing search or model lookup service.
// The Display text is what the user sees in the error state.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Failed to reach the listing service: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("Failed to fetch listings: {status}")]
    Status { status: reqwest::StatusCode },
    #[error("Failed to read the listing service response: {0}")]
    Decode(#[source] serde_json::Error),
    #[error("The listing service did not respond within {}s", .0.as_secs())]
    Timeout(Duration),
    #[error("make parameter cannot be empty")]
    EmptyMake,
}

impl From<reqwest::Error> for SearchError {
    fn from(error: reqwest::Error) -> Self {
        match error.status() {
            Some(status) => SearchError::Status { status },
            None => SearchError::Transport(error),
        }
    }
}

impl From<serde_json::Error> for SearchError {
    fn from(error: serde_json::Error) -> Self {
        SearchError::Decode(error)
    }
}

// Errors surfaced by the HTTP handlers
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    InvalidFilters(#[from] FilterError),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    NotFound(String),
    #[error(transparent)]
    Upstream(#[from] SearchError),
    #[error(transparent)]
    InternalServerError(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::InvalidFilters(e) => {
                tracing::debug!(error = %e, "Rejected filter input");
                (StatusCode::BAD_REQUEST, e.to_string())
            }
            AppError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            AppError::NotFound(message) => (StatusCode::NOT_FOUND, message),
            AppError::Upstream(e @ SearchError::EmptyMake) => (StatusCode::BAD_REQUEST, e.to_string()),
            AppError::Upstream(e) => {
                tracing::warn!(error = %e, "Listing service call failed");
                (StatusCode::BAD_GATEWAY, e.to_string())
            }
            AppError::InternalServerError(e) => {
                // Log the detailed error, don't expose it
                tracing::error!("Internal server error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error".to_string())
            }
        };

        (status, Json(json!({ "error": error_message }))).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_failure_reads_like_the_front_end_message() {
        let err = SearchError::Status { status: reqwest::StatusCode::INTERNAL_SERVER_ERROR };
        assert_eq!(err.to_string(), "Failed to fetch listings: 500 Internal Server Error");
    }

    #[test]
    fn timeout_message_names_the_limit() {
        let err = SearchError::Timeout(Duration::from_secs(10));
        assert_eq!(err.to_string(), "The listing service did not respond within 10s");
    }

    #[test]
    fn filter_errors_map_to_bad_request() {
        let response = AppError::from(FilterError::MissingZip).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn upstream_errors_map_to_bad_gateway() {
        let err = SearchError::Status { status: reqwest::StatusCode::SERVICE_UNAVAILABLE };
        let response = AppError::from(err).into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }
}
