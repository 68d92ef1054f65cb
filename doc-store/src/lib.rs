//! Wasatah Document Store
//!
//! A small collection-oriented store that stands in for a document-database
//! client during local development.
//!
//! # Model
//!
//! - **Collections**: named lists of JSON documents, kept in insertion order
//! - **Queries**: conjunctions of exact-equality tests plus sort and limit
//! - **Backends**: in-memory, or a single JSON file rewritten atomically
//!
//! # Example
//!
//! ```no_run
//! use doc_store::{DocumentClient, Query, StoreConfig};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> doc_store::Result<()> {
//!     let client = DocumentClient::new(StoreConfig::Memory);
//!     let db = client.connect().await?;
//!     db.ensure_standard_collections().await?;
//!
//!     let users = db.collection("users");
//!     let doc = json!({ "email": "sarah@example.com", "role": "buyer" });
//!     users.insert_one(doc.as_object().cloned().unwrap_or_default()).await?;
//!
//!     let buyers = users.find(&Query::all().eq("role", "buyer")).await?;
//!     assert_eq!(buyers.len(), 1);
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod client;
pub mod error;
pub mod persist;
pub mod query;

// Re-exports
pub use client::{
    Collection, Database, DeleteResult, DocumentClient, InsertManyResult, InsertOneResult,
    StoreConfig, STANDARD_COLLECTIONS,
};
pub use error::{Error, Result};
pub use query::{Document, Query, QueryOp, SortDirection};
