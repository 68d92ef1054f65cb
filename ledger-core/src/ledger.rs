//! Main ledger orchestration layer
//!
//! This module ties together storage, seed data, crypto and the writer actor
//! into the high-level API used by the HTTP service and in-process callers.
//!
//! # Example
//!
//! ```no_run
//! use ledger_core::{event_types, Config, EventCandidate, Ledger};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> ledger_core::Result<()> {
//!     let ledger = Ledger::open(&Config::default()).await?;
//!
//!     let details = json!({ "propertyId": "prop_001", "amount": 2500000 });
//!     let event = ledger
//!         .append(&EventCandidate::new(
//!             event_types::OFFER_MADE,
//!             "user_001",
//!             "Sarah Al-Mansouri",
//!             details.as_object().cloned().unwrap_or_default(),
//!         ))
//!         .await?;
//!     println!("appended {} at block {:?}", event.id, event.block_number);
//!
//!     ledger.shutdown().await
//! }
//! ```

use crate::{
    actor::{spawn_ledger_actor, ActorContext, LedgerHandle, Snapshot},
    clock::{Clock, SystemClock},
    crypto::KeyPair,
    metrics::LedgerMetrics,
    seed::SeedSource,
    storage::{open_store, EventStore},
    types::{EventCandidate, LedgerEvent},
    validation::validate,
    Config, Error, Result,
};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Everything [`Ledger::open_with`] needs besides the store
#[derive(Debug)]
pub struct LedgerOptions {
    /// Seed for bootstrap and reset
    pub seed: SeedSource,
    /// Time source
    pub clock: Arc<dyn Clock>,
    /// Signing key
    pub keypair: Option<KeyPair>,
    /// Writer mailbox capacity
    pub mailbox_capacity: usize,
    /// Pre-built metrics (a fresh registry otherwise)
    pub metrics: Option<LedgerMetrics>,
}

impl Default for LedgerOptions {
    fn default() -> Self {
        Self {
            seed: SeedSource::default(),
            clock: Arc::new(SystemClock),
            keypair: None,
            mailbox_capacity: 1000,
            metrics: None,
        }
    }
}

impl LedgerOptions {
    /// Options described by a config
    pub fn from_config(config: &Config) -> Result<Self> {
        let keypair = config
            .signing
            .key_seed_hex
            .as_deref()
            .map(KeyPair::from_hex_seed)
            .transpose()?;

        Ok(Self {
            seed: config.seed.clone(),
            keypair,
            mailbox_capacity: config.mailbox_capacity,
            ..Self::default()
        })
    }

    /// Set the seed
    pub fn with_seed(mut self, seed: SeedSource) -> Self {
        self.seed = seed;
        self
    }

    /// Set the time source
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Set signing key pair
    pub fn with_keypair(mut self, keypair: KeyPair) -> Self {
        self.keypair = Some(keypair);
        self
    }
}

/// Main ledger interface
#[derive(Debug, Clone)]
pub struct Ledger {
    /// Actor handle for mutations
    handle: LedgerHandle,

    /// Last committed list (for reads)
    snapshot: watch::Receiver<Snapshot>,

    /// Writer task, taken by the first shutdown
    task: Arc<Mutex<Option<JoinHandle<()>>>>,

    /// Verifying key when signing is enabled
    public_key: Option<[u8; 32]>,

    metrics: LedgerMetrics,
}

impl Ledger {
    /// Open ledger with configuration
    pub async fn open(config: &Config) -> Result<Self> {
        let store = open_store(&config.storage).await?;
        Self::open_with(store, LedgerOptions::from_config(config)?).await
    }

    /// Open over an explicit store.
    ///
    /// A store that was never written is initialized with the seed snapshot
    /// (or an empty list when no seed is available).
    pub async fn open_with(store: Box<dyn EventStore>, options: LedgerOptions) -> Result<Self> {
        let metrics = match options.metrics {
            Some(metrics) => metrics,
            None => LedgerMetrics::new()?,
        };

        let initial = match store.load().await? {
            Some(events) => events,
            None => {
                let events = match options.seed.load().await {
                    Ok(events) => events,
                    Err(Error::SeedUnavailable(reason)) => {
                        tracing::warn!(%reason, "No seed data, starting with an empty ledger");
                        Vec::new()
                    }
                    Err(e) => return Err(e),
                };
                store.save(&events).await?;
                tracing::info!(
                    store = %store.describe(),
                    count = events.len(),
                    "Ledger initialized"
                );
                events
            }
        };
        metrics.set_event_count(initial.len());

        let keypair = options.keypair.map(Arc::new);
        let public_key = keypair.as_ref().map(|k| k.public_key());

        let ctx = ActorContext {
            store,
            seed: options.seed,
            clock: options.clock,
            keypair,
            metrics: metrics.clone(),
        };
        let (handle, snapshot, task) = spawn_ledger_actor(ctx, initial, options.mailbox_capacity);

        Ok(Self {
            handle,
            snapshot,
            task: Arc::new(Mutex::new(Some(task))),
            public_key,
            metrics,
        })
    }

    /// All events, newest first
    pub fn list(&self) -> Vec<LedgerEvent> {
        self.snapshot.borrow().as_ref().clone()
    }

    /// Shared view of the committed list
    pub fn snapshot(&self) -> Snapshot {
        self.snapshot.borrow().clone()
    }

    /// Number of events
    pub fn len(&self) -> usize {
        self.snapshot.borrow().len()
    }

    /// True when the ledger holds no events
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Validate and append a new event
    ///
    /// Nothing is written when validation fails; the error lists every
    /// rejected field.
    pub async fn append(&self, candidate: &EventCandidate) -> Result<LedgerEvent> {
        let valid = match validate(candidate) {
            Ok(valid) => valid,
            Err(violations) => {
                self.metrics.record_validation_failure();
                tracing::warn!(
                    fields = ?violations.iter().map(|v| v.field.as_str()).collect::<Vec<_>>(),
                    "Rejected ledger event"
                );
                return Err(Error::Validation(violations));
            }
        };

        self.handle.append(valid).await
    }

    /// Replace every event with the seed snapshot
    pub async fn reset(&self) -> Result<Vec<LedgerEvent>> {
        let snapshot = self.handle.reset().await?;
        Ok(snapshot.as_ref().clone())
    }

    /// Get event by ID
    pub fn get_event(&self, id: &str) -> Result<LedgerEvent> {
        self.snapshot
            .borrow()
            .iter()
            .find(|e| e.id == id)
            .cloned()
            .ok_or_else(|| Error::EventNotFound(id.to_string()))
    }

    /// Get event by block number
    pub fn get_by_block_number(&self, block_number: u64) -> Result<LedgerEvent> {
        self.snapshot
            .borrow()
            .iter()
            .find(|e| e.block_number == Some(block_number))
            .cloned()
            .ok_or_else(|| Error::EventNotFound(format!("block {}", block_number)))
    }

    /// Ed25519 verifying key, when events are signed
    pub fn public_key(&self) -> Option<[u8; 32]> {
        self.public_key
    }

    /// Metrics of this ledger
    pub fn metrics(&self) -> &LedgerMetrics {
        &self.metrics
    }

    /// Stop the writer after queued work. Later mutations fail with `Concurrency`.
    pub async fn shutdown(&self) -> Result<()> {
        let task = self.task.lock().take();
        let Some(task) = task else {
            return Ok(());
        };

        self.handle.shutdown().await?;
        task.await
            .map_err(|e| Error::Concurrency(format!("Writer task failed: {}", e)))
    }
}
