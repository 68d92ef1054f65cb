//! Client-side cache of ledger events

use crate::{error::Result, source::LedgerSource};
use ledger_core::{Details, EventCandidate, LedgerEvent};
use parking_lot::RwLock;
use tracing::{debug, warn};

/// Default number of events returned by [`LedgerStore::recent_default`]
pub const DEFAULT_RECENT_LIMIT: usize = 10;

#[derive(Debug, Default)]
struct CacheState {
    events: Vec<LedgerEvent>,
    last_error: Option<String>,
    is_loading: bool,
}

/// Cache over a [`LedgerSource`].
///
/// Failed calls never touch the cached events; they only record
/// `last_error`. `is_loading` is set for the duration of each source call.
/// The lock is never held across a source call.
#[derive(Debug)]
pub struct LedgerStore<S> {
    source: S,
    state: RwLock<CacheState>,
}

impl<S: LedgerSource> LedgerStore<S> {
    /// Empty cache over `source`
    pub fn new(source: S) -> Self {
        Self {
            source,
            state: RwLock::new(CacheState::default()),
        }
    }

    /// Underlying source
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Fetch every event and replace the cache
    pub async fn load_all(&self) -> Result<Vec<LedgerEvent>> {
        self.begin();
        match self.source.list().await {
            Ok(events) => {
                let mut state = self.state.write();
                state.events = events.clone();
                state.last_error = None;
                state.is_loading = false;
                debug!(count = events.len(), "Ledger cache loaded");
                Ok(events)
            }
            Err(e) => Err(self.record(e)),
        }
    }

    /// Append an event and prepend it to the cache
    pub async fn add(
        &self,
        event_type: impl Into<String>,
        actor_id: impl Into<String>,
        actor_name: impl Into<String>,
        details: Details,
    ) -> Result<LedgerEvent> {
        let candidate = EventCandidate::new(event_type, actor_id, actor_name, details);
        self.add_candidate(candidate).await
    }

    /// Append a raw candidate and prepend the result to the cache
    pub async fn add_candidate(&self, candidate: EventCandidate) -> Result<LedgerEvent> {
        self.begin();
        match self.source.append(candidate).await {
            Ok(event) => {
                let mut state = self.state.write();
                state.events.insert(0, event.clone());
                state.last_error = None;
                state.is_loading = false;
                Ok(event)
            }
            Err(e) => Err(self.record(e)),
        }
    }

    /// Reset the ledger and replace the cache with the seed events
    pub async fn reset(&self) -> Result<Vec<LedgerEvent>> {
        self.begin();
        match self.source.reset().await {
            Ok(events) => {
                let mut state = self.state.write();
                state.events = events.clone();
                state.last_error = None;
                state.is_loading = false;
                Ok(events)
            }
            Err(e) => Err(self.record(e)),
        }
    }

    /// Cached events of one type
    pub fn events_by_type(&self, event_type: &str) -> Vec<LedgerEvent> {
        self.state
            .read()
            .events
            .iter()
            .filter(|e| e.event_type == event_type)
            .cloned()
            .collect()
    }

    /// Cached events of one actor
    pub fn events_by_actor(&self, actor_id: &str) -> Vec<LedgerEvent> {
        self.state
            .read()
            .events
            .iter()
            .filter(|e| e.actor_id.as_deref() == Some(actor_id))
            .cloned()
            .collect()
    }

    /// First `limit` cached events (newest first)
    pub fn recent(&self, limit: usize) -> Vec<LedgerEvent> {
        self.state.read().events.iter().take(limit).cloned().collect()
    }

    /// The ten newest cached events
    pub fn recent_default(&self) -> Vec<LedgerEvent> {
        self.recent(DEFAULT_RECENT_LIMIT)
    }

    /// Every cached event
    pub fn events(&self) -> Vec<LedgerEvent> {
        self.state.read().events.clone()
    }

    /// Drop cached events (the ledger is untouched)
    pub fn clear(&self) {
        self.state.write().events.clear();
    }

    /// Message of the last failed call
    pub fn last_error(&self) -> Option<String> {
        self.state.read().last_error.clone()
    }

    /// Whether a source call is in flight
    pub fn is_loading(&self) -> bool {
        self.state.read().is_loading
    }

    /// Forget the last failure
    pub fn clear_error(&self) {
        self.state.write().last_error = None;
    }

    fn begin(&self) {
        let mut state = self.state.write();
        state.is_loading = true;
        state.last_error = None;
    }

    fn record(&self, err: crate::Error) -> crate::Error {
        warn!(error = %err, "Ledger call failed");
        let mut state = self.state.write();
        state.last_error = Some(err.to_string());
        state.is_loading = false;
        err
    }
}
