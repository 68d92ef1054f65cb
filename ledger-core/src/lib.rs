//! Wasatah Ledger Core
//!
//! Append-only event ledger for the property demo: listings, offers,
//! identity and deed verifications.
//!
//! # Architecture
//!
//! - **Single Writer**: one actor task owns the read-modify-write cycle
//! - **Snapshots**: readers see the last committed list through a `watch` channel
//! - **Content Hash**: SHA-256 over a canonical JSON projection of each event
//! - **Pluggable Storage**: a JSON file or the `ledger_events` document collection
//!
//! # Invariants
//!
//! - Append-only: events are only removed by a full reset to seed data
//! - Newest first: the list is ordered by reverse append order
//! - Block numbers: `1000 + count` at append time, so unique and consecutive
//! - Immutable: `id`, `hash` and `timestamp` never change once appended

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod actor;
pub mod clock;
pub mod config;
pub mod crypto;
pub mod error;
pub mod ledger;
pub mod metrics;
pub mod seed;
pub mod storage;
pub mod types;
pub mod validation;
pub mod wire;

// Re-exports
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::Config;
pub use error::{Error, Result};
pub use ledger::{Ledger, LedgerOptions};
pub use metrics::LedgerMetrics;
pub use seed::SeedSource;
pub use storage::{DocumentEventStore, EventStore, JsonFileStore};
pub use types::{event_types, Details, EventCandidate, LedgerEvent};
pub use validation::{FieldViolation, ViolationReason};
