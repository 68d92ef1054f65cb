//! Wasatah Ledger Client
//!
//! Local cache of ledger events for UI-side code. The cache talks to the
//! ledger through a [`LedgerSource`]: the HTTP API ([`HttpLedgerSource`]) or
//! an in-process [`ledger_core::Ledger`].
//!
//! ```no_run
//! use ledger_client::{HttpLedgerSource, LedgerStore};
//! use std::time::Duration;
//!
//! # async fn run() -> ledger_client::Result<()> {
//! let source = HttpLedgerSource::new("http://localhost:3001", Duration::from_secs(10))?;
//! let store = LedgerStore::new(source);
//!
//! store.load_all().await?;
//! for event in store.recent_default() {
//!     println!("{} {}", event.id, event.event_type);
//! }
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, missing_debug_implementations)]

pub mod error;
pub mod source;
pub mod store;

pub use error::{Error, Result};
pub use source::{HttpLedgerSource, LedgerSource};
pub use store::{LedgerStore, DEFAULT_RECENT_LIMIT};
