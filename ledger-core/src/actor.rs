//! Actor-based concurrency for the ledger
//!
//! This module implements the single-writer pattern using Tokio actors:
//! - One writer task owns the read-modify-write cycle, so appends never race
//! - Readers never touch the actor; they clone the last committed snapshot
//! - Bounded mailbox gives backpressure to request handlers
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │              HTTP handlers / LedgerStore              │
//! └──────────────┬──────────────────────────┬────────────┘
//!                │ append / reset           │ list / get
//!                ▼                          ▼
//! ┌──────────────────────────┐   ┌──────────────────────────┐
//! │   LedgerHandle (Clone)   │   │ watch::Receiver snapshot │
//! └──────────────┬───────────┘   └──────────────▲───────────┘
//!                │ mpsc::channel (bounded)      │ send_replace
//!                ▼                              │
//! ┌──────────────────────────────────────────────┴───────┐
//! │              LedgerActor (Single Task)                │
//! │   build event → EventStore::save(full list) → commit  │
//! └───────────────────────────────────────────────────────┘
//! ```

use crate::{
    clock::Clock,
    crypto::{event_hash, generate_event_id, random_signature, KeyPair},
    metrics::LedgerMetrics,
    seed::SeedSource,
    storage::EventStore,
    types::LedgerEvent,
    validation::ValidEvent,
    Error, Result,
};
use chrono::SubsecRound;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;

/// Block number of the first event in an empty ledger
pub const BASE_BLOCK_NUMBER: u64 = 1000;

/// Committed event list, newest first
pub type Snapshot = Arc<Vec<LedgerEvent>>;

/// Message sent to the ledger actor
#[derive(Debug)]
pub enum LedgerMessage {
    /// Append a validated event
    Append {
        event: ValidEvent,
        response: oneshot::Sender<Result<LedgerEvent>>,
    },

    /// Replace the list with the seed snapshot
    Reset {
        response: oneshot::Sender<Result<Snapshot>>,
    },

    /// Stop after the messages already queued
    Shutdown,
}

/// Everything the writer needs besides its mailbox
#[derive(Debug)]
pub struct ActorContext {
    /// Backing store
    pub store: Box<dyn EventStore>,
    /// Seed used by reset
    pub seed: SeedSource,
    /// Time source
    pub clock: Arc<dyn Clock>,
    /// Signing key; random signature tokens without it
    pub keypair: Option<Arc<KeyPair>>,
    /// Metrics
    pub metrics: LedgerMetrics,
}

/// Actor that processes ledger messages
#[derive(Debug)]
pub struct LedgerActor {
    ctx: ActorContext,

    /// Mailbox for incoming messages
    mailbox: mpsc::Receiver<LedgerMessage>,

    /// Publisher of committed snapshots
    snapshot: watch::Sender<Snapshot>,
}

impl LedgerActor {
    /// Create new actor
    pub fn new(
        ctx: ActorContext,
        mailbox: mpsc::Receiver<LedgerMessage>,
        snapshot: watch::Sender<Snapshot>,
    ) -> Self {
        Self {
            ctx,
            mailbox,
            snapshot,
        }
    }

    /// Run the actor event loop
    pub async fn run(mut self) {
        while let Some(msg) = self.mailbox.recv().await {
            match msg {
                LedgerMessage::Append { event, response } => {
                    let result = self.append(event).await;
                    // Caller may have gone away; the append is committed regardless
                    let _ = response.send(result);
                }
                LedgerMessage::Reset { response } => {
                    let result = self.reset().await;
                    let _ = response.send(result);
                }
                LedgerMessage::Shutdown => break,
            }
        }

        tracing::info!(store = %self.ctx.store.describe(), "Ledger writer stopped");
    }

    async fn append(&mut self, valid: ValidEvent) -> Result<LedgerEvent> {
        let started = Instant::now();
        let current = self.snapshot.borrow().clone();

        let timestamp = self.ctx.clock.now().trunc_subsecs(3);
        let hash = event_hash(
            &valid.event_type,
            &valid.actor_id,
            &valid.actor_name,
            &valid.details,
            &timestamp,
        );
        let signature = match &self.ctx.keypair {
            Some(keypair) => keypair.sign_hash(&hash)?,
            None => random_signature(),
        };

        let event = LedgerEvent {
            id: generate_event_id(),
            event_type: valid.event_type,
            timestamp,
            hash,
            actor_id: Some(valid.actor_id),
            actor_name: Some(valid.actor_name),
            details: valid.details,
            signature: Some(signature),
            block_number: Some(BASE_BLOCK_NUMBER + current.len() as u64),
            transaction_index: Some(0),
        };

        let mut next = Vec::with_capacity(current.len() + 1);
        next.push(event.clone());
        next.extend(current.iter().cloned());

        self.persist(&next).await?;
        let count = next.len();
        self.snapshot.send_replace(Arc::new(next));

        self.ctx
            .metrics
            .record_append(started.elapsed().as_secs_f64(), count);
        tracing::info!(
            event_id = %event.id,
            event_type = %event.event_type,
            block_number = ?event.block_number,
            "Event appended"
        );

        Ok(event)
    }

    async fn reset(&mut self) -> Result<Snapshot> {
        let events = self.ctx.seed.load().await?;
        self.persist(&events).await?;

        let snapshot = Arc::new(events);
        self.snapshot.send_replace(snapshot.clone());

        self.ctx.metrics.record_reset(snapshot.len());
        tracing::info!(count = snapshot.len(), "Ledger reset to seed data");

        Ok(snapshot)
    }

    async fn persist(&self, events: &[LedgerEvent]) -> Result<()> {
        if let Err(e) = self.ctx.store.save(events).await {
            self.ctx.metrics.record_storage_error();
            tracing::error!(store = %self.ctx.store.describe(), error = %e, "Ledger write failed");
            return Err(e);
        }
        Ok(())
    }
}

/// Handle for sending messages to the actor
#[derive(Debug, Clone)]
pub struct LedgerHandle {
    sender: mpsc::Sender<LedgerMessage>,
}

impl LedgerHandle {
    /// Create new handle
    pub fn new(sender: mpsc::Sender<LedgerMessage>) -> Self {
        Self { sender }
    }

    /// Append a validated event
    pub async fn append(&self, event: ValidEvent) -> Result<LedgerEvent> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(LedgerMessage::Append {
                event,
                response: tx,
            })
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;

        rx.await
            .map_err(|_| Error::Concurrency("Response channel closed".to_string()))?
    }

    /// Reset to the seed snapshot
    pub async fn reset(&self) -> Result<Snapshot> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(LedgerMessage::Reset { response: tx })
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;

        rx.await
            .map_err(|_| Error::Concurrency("Response channel closed".to_string()))?
    }

    /// Shutdown actor
    pub async fn shutdown(&self) -> Result<()> {
        self.sender
            .send(LedgerMessage::Shutdown)
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;
        Ok(())
    }
}

/// Spawn the ledger actor over an already initialized list
pub fn spawn_ledger_actor(
    ctx: ActorContext,
    initial: Vec<LedgerEvent>,
    mailbox_capacity: usize,
) -> (LedgerHandle, watch::Receiver<Snapshot>, JoinHandle<()>) {
    let (tx, rx) = mpsc::channel(mailbox_capacity.max(1));
    let (snapshot_tx, snapshot_rx) = watch::channel(Arc::new(initial));
    let actor = LedgerActor::new(ctx, rx, snapshot_tx);

    let task = tokio::spawn(async move {
        actor.run().await;
    });

    (LedgerHandle::new(tx), snapshot_rx, task)
}
