//! Error types for the document store

use thiserror::Error;

/// Result type for document store operations
pub type Result<T> = std::result::Result<T, Error>;

/// Document store errors
#[derive(Error, Debug)]
pub enum Error {
    /// Store used before `connect()` or after `close()`
    #[error("Database not connected: {0}")]
    NotConnected(String),

    /// IO error from the file backend
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Database file could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A document with the same `_id` already exists
    #[error("Duplicate _id {id} in collection {collection}")]
    DuplicateId {
        /// Collection name
        collection: String,
        /// Offending id
        id: String,
    },

    /// Document rejected (bad `_id`, attempt to overwrite `_id`, ...)
    #[error("Invalid document: {0}")]
    InvalidDocument(String),
}
