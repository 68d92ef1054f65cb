//! Error types for the ledger

use crate::validation::FieldViolation;
use thiserror::Error;

/// Result type for ledger operations
pub type Result<T> = std::result::Result<T, Error>;

/// Boxed underlying cause of a storage failure
pub type StorageCause = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Ledger errors
#[derive(Error, Debug)]
pub enum Error {
    /// Candidate event rejected, with every violated field
    #[error("Validation failed: {}", join_violations(.0))]
    Validation(Vec<FieldViolation>),

    /// Backing store failure (file or document store)
    #[error("Storage error: {context}: {source}")]
    Storage {
        /// What the ledger was doing
        context: String,
        /// Underlying cause
        #[source]
        source: StorageCause,
    },

    /// Reset requested but no seed snapshot exists
    #[error("Seed data unavailable: {0}")]
    SeedUnavailable(String),

    /// Store accessed before initialization
    #[error("Store not connected: {0}")]
    NotConnected(String),

    /// Event not found
    #[error("Event not found: {0}")]
    EventNotFound(String),

    /// Signature creation or verification failed
    #[error("Signature error: {0}")]
    Signature(String),

    /// Concurrency error (actor mailbox closed, etc.)
    #[error("Concurrency error: {0}")]
    Concurrency(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Metrics registry error
    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),
}

impl Error {
    /// Wrap a storage failure with context
    pub fn storage(
        context: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Error::Storage {
            context: context.into(),
            source: Box::new(source),
        }
    }

    /// Violations of a validation error
    pub fn violations(&self) -> Option<&[FieldViolation]> {
        match self {
            Error::Validation(violations) => Some(violations),
            _ => None,
        }
    }
}

fn join_violations(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl From<doc_store::Error> for Error {
    fn from(err: doc_store::Error) -> Self {
        match err {
            doc_store::Error::NotConnected(msg) => Error::NotConnected(msg),
            other => Error::storage("document store", other),
        }
    }
}
