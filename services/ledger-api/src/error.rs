//! HTTP error mapping

use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use ledger_core::{wire::ErrorResponse, Error as LedgerError};
use tracing::error;

/// Errors returned by the ledger routes
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Body is not valid JSON
    #[error("Invalid JSON body: {0}")]
    BadJson(String),

    /// Path parameter could not be parsed
    #[error("Invalid path parameter: {0}")]
    BadPath(String),

    /// Ledger operation failed
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Metrics export failed
    #[error("Failed to export metrics: {0}")]
    Metrics(String),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadJson(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadPath(rejection.body_text())
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::BadJson(_) | ApiError::BadPath(_) => StatusCode::BAD_REQUEST,
            ApiError::Ledger(err) => match err {
                LedgerError::Validation(_) => StatusCode::BAD_REQUEST,
                LedgerError::SeedUnavailable(_) | LedgerError::EventNotFound(_) => {
                    StatusCode::NOT_FOUND
                }
                LedgerError::NotConnected(_) => StatusCode::SERVICE_UNAVAILABLE,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Metrics(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        let body = match &self {
            ApiError::Ledger(LedgerError::Validation(violations)) => {
                ErrorResponse::new("Missing or invalid fields")
                    .with_details(violations.iter().map(ToString::to_string).collect())
            }
            ApiError::Ledger(LedgerError::SeedUnavailable(_)) => {
                ErrorResponse::new("Seed data not found")
            }
            ApiError::Ledger(LedgerError::EventNotFound(what)) => {
                ErrorResponse::new(format!("Event not found: {}", what))
            }
            ApiError::Ledger(LedgerError::NotConnected(_)) => {
                ErrorResponse::new("Ledger storage not connected")
            }
            ApiError::BadJson(reason) => ErrorResponse::new(format!("Invalid JSON body: {}", reason)),
            ApiError::BadPath(reason) => {
                ErrorResponse::new(format!("Invalid path parameter: {}", reason))
            }
            other => {
                // Internal details stay in the logs
                error!(error = %other, "Ledger request failed");
                ErrorResponse::new("Internal ledger error")
            }
        };

        (status, Json(body)).into_response()
    }
}
