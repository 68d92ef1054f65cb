//! Storage backends for the event list
//!
//! The ledger persists its whole list on every mutation. Both backends make
//! that write atomic:
//!
//! - `JsonFileStore` - `{ "events": [...] }` replaced via temp file + rename
//! - `DocumentEventStore` - the `ledger_events` collection replaced in one write

use crate::{
    config::StorageConfig,
    error::{Error, Result},
    types::{LedgerDocument, LedgerEvent},
};
use async_trait::async_trait;
use doc_store::{persist, Database, Document, DocumentClient, Query};
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Collection holding ledger events in the document store
pub const LEDGER_COLLECTION: &str = "ledger_events";

/// Whole-snapshot event storage
#[async_trait]
pub trait EventStore: Send + Sync + std::fmt::Debug {
    /// Stored events, newest first. `None` when the store was never initialized.
    async fn load(&self) -> Result<Option<Vec<LedgerEvent>>>;

    /// Replace the stored events
    async fn save(&self, events: &[LedgerEvent]) -> Result<()>;

    /// Human-readable location for logs
    fn describe(&self) -> String;
}

/// Single JSON file
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Store at `path` (parent directories are created on first save)
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// File path
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl EventStore for JsonFileStore {
    async fn load(&self) -> Result<Option<Vec<LedgerEvent>>> {
        let bytes = persist::read_if_exists(&self.path)
            .await
            .map_err(|e| Error::storage(format!("reading {}", self.path.display()), e))?;

        match bytes {
            Some(bytes) => {
                let doc: LedgerDocument = serde_json::from_slice(&bytes)
                    .map_err(|e| Error::storage(format!("parsing {}", self.path.display()), e))?;
                tracing::debug!(path = %self.path.display(), events = doc.events.len(), "Loaded ledger file");
                Ok(Some(doc.events))
            }
            None => Ok(None),
        }
    }

    async fn save(&self, events: &[LedgerEvent]) -> Result<()> {
        #[derive(serde::Serialize)]
        struct DocumentRef<'a> {
            events: &'a [LedgerEvent],
        }

        let bytes = serde_json::to_vec_pretty(&DocumentRef { events })
            .map_err(|e| Error::storage("encoding ledger", e))?;

        persist::write_atomic(self.path.clone(), bytes)
            .await
            .map_err(|e| Error::storage(format!("writing {}", self.path.display()), e))?;

        tracing::debug!(path = %self.path.display(), events = events.len(), "Ledger file written");
        Ok(())
    }

    fn describe(&self) -> String {
        format!("json file {}", self.path.display())
    }
}

/// `ledger_events` collection of a document store database
#[derive(Debug, Clone)]
pub struct DocumentEventStore {
    db: Database,
}

impl DocumentEventStore {
    /// Store over an open database
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Store over a client, `NotConnected` if the client was never connected
    pub fn from_client(client: &DocumentClient) -> Result<Self> {
        Ok(Self::new(client.database()?))
    }
}

#[async_trait]
impl EventStore for DocumentEventStore {
    async fn load(&self) -> Result<Option<Vec<LedgerEvent>>> {
        let docs = self.db.collection(LEDGER_COLLECTION).find(&Query::all()).await?;
        // An empty collection is indistinguishable from a freshly created one
        if docs.is_empty() {
            return Ok(None);
        }

        let events = docs
            .into_iter()
            .map(|doc| serde_json::from_value::<LedgerEvent>(Value::Object(doc)))
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| Error::storage("decoding ledger_events", e))?;
        Ok(Some(events))
    }

    async fn save(&self, events: &[LedgerEvent]) -> Result<()> {
        let docs = events
            .iter()
            .map(|event| {
                let mut doc: Document = match serde_json::to_value(event) {
                    Ok(Value::Object(map)) => map,
                    Ok(_) => Document::new(),
                    Err(e) => return Err(Error::storage("encoding ledger event", e)),
                };
                doc.insert("_id".to_string(), Value::String(event.id.clone()));
                Ok(doc)
            })
            .collect::<Result<Vec<_>>>()?;

        self.db.collection(LEDGER_COLLECTION).replace_all(docs).await?;
        Ok(())
    }

    fn describe(&self) -> String {
        format!("document store collection {}", LEDGER_COLLECTION)
    }
}

/// Build the configured backend
pub async fn open_store(config: &StorageConfig) -> Result<Box<dyn EventStore>> {
    let store: Box<dyn EventStore> = match config {
        StorageConfig::JsonFile { path } => Box::new(JsonFileStore::new(path.clone())),
        StorageConfig::DocumentStore { store } => {
            let client = DocumentClient::new(store.clone());
            let db = client.connect().await?;
            db.ensure_standard_collections().await?;
            Box::new(DocumentEventStore::new(db))
        }
    };
    tracing::info!(store = %store.describe(), "Ledger storage ready");
    Ok(store)
}
