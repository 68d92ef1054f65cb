//! Client error types

use thiserror::Error;

/// Result type for client operations
pub type Result<T> = std::result::Result<T, Error>;

/// Client errors
#[derive(Error, Debug)]
pub enum Error {
    /// Request never produced a response
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Candidate rejected by the ledger
    #[error("Validation failed: {message}")]
    Validation {
        /// Summary
        message: String,
        /// One entry per rejected field
        violations: Vec<String>,
    },

    /// Reset requested but the ledger has no seed data
    #[error("Seed data unavailable: {0}")]
    SeedUnavailable(String),

    /// Unexpected status from the ledger API
    #[error("Server error ({status}): {message}")]
    Server {
        /// HTTP status code
        status: u16,
        /// Server message or body
        message: String,
    },

    /// In-process ledger failure
    #[error(transparent)]
    Ledger(ledger_core::Error),
}

impl From<ledger_core::Error> for Error {
    fn from(err: ledger_core::Error) -> Self {
        let message = err.to_string();
        match err {
            ledger_core::Error::Validation(violations) => Error::Validation {
                message,
                violations: violations.iter().map(ToString::to_string).collect(),
            },
            ledger_core::Error::SeedUnavailable(reason) => Error::SeedUnavailable(reason),
            other => Error::Ledger(other),
        }
    }
}
