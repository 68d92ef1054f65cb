//! Client, database and collection handles
//!
//! ```text
//! DocumentClient ──connect()──▶ Database ──collection(name)──▶ Collection
//!                                   │
//!                     RwLock<BTreeMap<name, Vec<Document>>>
//!                                   │
//!                       (file backend) write_atomic()
//! ```
//!
//! Every mutation works on a copy of the target collection. The copy is
//! persisted first and swapped in only when the write succeeded.

use crate::{
    error::{Error, Result},
    persist,
    query::{Document, Query},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Collections created by [`Database::ensure_standard_collections`]
pub const STANDARD_COLLECTIONS: [&str; 5] = [
    "users",
    "properties",
    "offers",
    "ledger_events",
    "risk_flags",
];

const ID_FIELD: &str = "_id";

/// Backend selection
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "snake_case")]
pub enum StoreConfig {
    /// Process memory only, lost on restart
    #[default]
    Memory,
    /// Whole database persisted as one JSON document
    File {
        /// Database file path
        path: PathBuf,
    },
}

/// Entry point mirroring a database client's connect/get/close lifecycle
#[derive(Debug)]
pub struct DocumentClient {
    config: StoreConfig,
    db: parking_lot::RwLock<Option<Database>>,
}

impl DocumentClient {
    /// Create a disconnected client
    pub fn new(config: StoreConfig) -> Self {
        Self {
            config,
            db: parking_lot::RwLock::new(None),
        }
    }

    /// Backend configuration
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Connect, loading the database file if the file backend is used.
    ///
    /// Connecting twice returns the same database.
    pub async fn connect(&self) -> Result<Database> {
        let existing = self.db.read().clone();
        if let Some(db) = existing {
            return Ok(db);
        }

        let (collections, persist_path) = match &self.config {
            StoreConfig::Memory => {
                tracing::warn!("Using in-memory document store, data will not persist between restarts");
                (BTreeMap::new(), None)
            }
            StoreConfig::File { path } => {
                let collections = match persist::read_if_exists(path).await? {
                    Some(bytes) => serde_json::from_slice(&bytes)?,
                    None => BTreeMap::new(),
                };
                tracing::info!(path = %path.display(), "Opened file-backed document store");
                (collections, Some(path.clone()))
            }
        };

        let db = Database {
            inner: Arc::new(DatabaseInner {
                collections: RwLock::new(collections),
                persist_path,
            }),
        };

        let mut slot = self.db.write();
        Ok(slot.get_or_insert(db).clone())
    }

    /// Connected database, `NotConnected` otherwise
    pub fn database(&self) -> Result<Database> {
        self.db.read().clone().ok_or_else(|| {
            Error::NotConnected("Call connect() before using the database".to_string())
        })
    }

    /// Whether `connect()` has been called
    pub fn is_connected(&self) -> bool {
        self.db.read().is_some()
    }

    /// Drop the connection. Outstanding `Database` handles keep working.
    pub fn close(&self) {
        if self.db.write().take().is_some() {
            tracing::info!("Document store connection closed");
        }
    }
}

/// Shared database handle
#[derive(Debug, Clone)]
pub struct Database {
    inner: Arc<DatabaseInner>,
}

#[derive(Debug)]
struct DatabaseInner {
    collections: RwLock<BTreeMap<String, Vec<Document>>>,
    persist_path: Option<PathBuf>,
}

impl Database {
    /// Collection handle (the collection is created lazily on first insert)
    pub fn collection(&self, name: impl Into<String>) -> Collection {
        Collection {
            db: self.clone(),
            name: name.into(),
        }
    }

    /// Create an empty collection if it does not exist yet
    pub async fn create_collection(&self, name: &str) -> Result<()> {
        if self.has_collection(name).await {
            return Ok(());
        }
        self.mutate(name, |_| Ok(())).await?;
        tracing::debug!(collection = name, "Created collection");
        Ok(())
    }

    /// Create `users`, `properties`, `offers`, `ledger_events`, `risk_flags`
    pub async fn ensure_standard_collections(&self) -> Result<()> {
        for name in STANDARD_COLLECTIONS {
            self.create_collection(name).await?;
        }
        Ok(())
    }

    /// Whether the collection exists
    pub async fn has_collection(&self, name: &str) -> bool {
        self.inner.collections.read().await.contains_key(name)
    }

    /// Names of all collections, sorted
    pub async fn list_collection_names(&self) -> Vec<String> {
        self.inner.collections.read().await.keys().cloned().collect()
    }

    async fn read<T>(&self, name: &str, f: impl FnOnce(&[Document]) -> T) -> T {
        let guard = self.inner.collections.read().await;
        f(guard.get(name).map(Vec::as_slice).unwrap_or(&[]))
    }

    async fn mutate<T>(
        &self,
        name: &str,
        f: impl FnOnce(&mut Vec<Document>) -> Result<T>,
    ) -> Result<T> {
        let mut guard = self.inner.collections.write().await;
        let mut working = guard.get(name).cloned().unwrap_or_default();
        let out = f(&mut working)?;

        if let Some(path) = &self.inner.persist_path {
            let bytes = {
                let mut view: BTreeMap<&str, &Vec<Document>> =
                    guard.iter().map(|(k, v)| (k.as_str(), v)).collect();
                view.insert(name, &working);
                serde_json::to_vec_pretty(&view)?
            };
            persist::write_atomic(path.clone(), bytes)
                .await
                .map_err(|e| {
                    tracing::error!(collection = name, error = %e, "Failed to persist document store");
                    e
                })?;
        }

        guard.insert(name.to_string(), working);
        Ok(out)
    }
}

/// Result of `insert_one`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InsertOneResult {
    /// Id of the inserted document
    pub inserted_id: String,
}

/// Result of `insert_many`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InsertManyResult {
    /// Ids in insertion order
    pub inserted_ids: Vec<String>,
    /// Number of inserted documents
    pub inserted_count: usize,
}

/// Result of `delete_one` / `delete_many`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DeleteResult {
    /// Number of removed documents
    pub deleted_count: usize,
}

/// Handle to one named collection
#[derive(Debug, Clone)]
pub struct Collection {
    db: Database,
    name: String,
}

impl Collection {
    /// Collection name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// First matching document (in sort order when the query sorts)
    pub async fn find_one(&self, query: &Query) -> Result<Option<Document>> {
        let found = self
            .db
            .read(&self.name, |docs| query.first_match(docs).map(|i| docs[i].clone()))
            .await;
        tracing::debug!(collection = %self.name, found = found.is_some(), "find_one");
        Ok(found)
    }

    /// All matching documents, sorted and limited as the query says
    pub async fn find(&self, query: &Query) -> Result<Vec<Document>> {
        let docs = self.db.read(&self.name, |docs| query.apply(docs)).await;
        tracing::debug!(collection = %self.name, matched = docs.len(), "find");
        Ok(docs)
    }

    /// Number of matching documents (sort and limit ignored)
    pub async fn count_documents(&self, query: &Query) -> Result<usize> {
        Ok(self
            .db
            .read(&self.name, |docs| docs.iter().filter(|d| query.matches(d)).count())
            .await)
    }

    /// Insert one document, assigning `_id` when missing
    pub async fn insert_one(&self, mut doc: Document) -> Result<InsertOneResult> {
        let name = self.name.clone();
        let inserted_id = self
            .db
            .mutate(&self.name, move |docs| {
                let id = assign_id(&name, &mut doc, docs)?;
                docs.push(doc);
                Ok(id)
            })
            .await?;
        tracing::debug!(collection = %self.name, id = %inserted_id, "insert_one");
        Ok(InsertOneResult { inserted_id })
    }

    /// Insert several documents; all or none are stored
    pub async fn insert_many(&self, new_docs: Vec<Document>) -> Result<InsertManyResult> {
        let name = self.name.clone();
        let inserted_ids = self
            .db
            .mutate(&self.name, move |docs| {
                let mut ids = Vec::with_capacity(new_docs.len());
                for mut doc in new_docs {
                    ids.push(assign_id(&name, &mut doc, docs)?);
                    docs.push(doc);
                }
                Ok(ids)
            })
            .await?;
        tracing::debug!(collection = %self.name, count = inserted_ids.len(), "insert_many");
        Ok(InsertManyResult {
            inserted_count: inserted_ids.len(),
            inserted_ids,
        })
    }

    /// Overwrite whole fields of the first match. Returns the updated document.
    pub async fn update_one(&self, query: &Query, set: Document) -> Result<Option<Document>> {
        if set.contains_key(ID_FIELD) {
            return Err(Error::InvalidDocument("_id cannot be updated".to_string()));
        }
        if !self.db.has_collection(&self.name).await {
            return Ok(None);
        }

        let updated = self
            .db
            .mutate(&self.name, |docs| {
                Ok(query.first_match(docs).map(|i| {
                    let doc = &mut docs[i];
                    for (field, value) in set {
                        doc.insert(field, value);
                    }
                    doc.clone()
                }))
            })
            .await?;
        tracing::debug!(collection = %self.name, updated = updated.is_some(), "update_one");
        Ok(updated)
    }

    /// Remove the first match
    pub async fn delete_one(&self, query: &Query) -> Result<DeleteResult> {
        if !self.db.has_collection(&self.name).await {
            return Ok(DeleteResult { deleted_count: 0 });
        }

        let deleted_count = self
            .db
            .mutate(&self.name, |docs| {
                Ok(match query.first_match(docs) {
                    Some(i) => {
                        docs.remove(i);
                        1
                    }
                    None => 0,
                })
            })
            .await?;
        tracing::debug!(collection = %self.name, deleted_count, "delete_one");
        Ok(DeleteResult { deleted_count })
    }

    /// Remove every match (sort and limit ignored)
    pub async fn delete_many(&self, query: &Query) -> Result<DeleteResult> {
        if !self.db.has_collection(&self.name).await {
            return Ok(DeleteResult { deleted_count: 0 });
        }

        let deleted_count = self
            .db
            .mutate(&self.name, |docs| {
                let before = docs.len();
                docs.retain(|d| !query.matches(d));
                Ok(before - docs.len())
            })
            .await?;
        tracing::debug!(collection = %self.name, deleted_count, "delete_many");
        Ok(DeleteResult { deleted_count })
    }

    /// Replace the whole collection in one write. Returns the new length.
    pub async fn replace_all(&self, new_docs: Vec<Document>) -> Result<usize> {
        let name = self.name.clone();
        let count = self
            .db
            .mutate(&self.name, move |docs| {
                let mut replacement = Vec::with_capacity(new_docs.len());
                for mut doc in new_docs {
                    assign_id(&name, &mut doc, &replacement)?;
                    replacement.push(doc);
                }
                *docs = replacement;
                Ok(docs.len())
            })
            .await?;
        tracing::debug!(collection = %self.name, count, "replace_all");
        Ok(count)
    }
}

/// Keep a caller-supplied string `_id` (rejecting duplicates) or generate one
fn assign_id(collection: &str, doc: &mut Document, existing: &[Document]) -> Result<String> {
    let id = match doc.get(ID_FIELD) {
        Some(Value::String(id)) => id.clone(),
        Some(other) => {
            return Err(Error::InvalidDocument(format!(
                "_id must be a string, got {}",
                other
            )))
        }
        None => {
            let id = format!("doc_{}", Uuid::now_v7().simple());
            doc.insert(ID_FIELD.to_string(), Value::String(id.clone()));
            id
        }
    };

    let duplicate = existing
        .iter()
        .any(|d| d.get(ID_FIELD).and_then(Value::as_str) == Some(id.as_str()));
    if duplicate {
        return Err(Error::DuplicateId {
            collection: collection.to_string(),
            id,
        });
    }

    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::SortDirection;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    async fn memory_db() -> Database {
        DocumentClient::new(StoreConfig::Memory).connect().await.unwrap()
    }

    #[tokio::test]
    async fn test_database_before_connect() {
        let client = DocumentClient::new(StoreConfig::Memory);
        assert!(matches!(client.database(), Err(Error::NotConnected(_))));

        client.connect().await.unwrap();
        assert!(client.database().is_ok());

        client.close();
        assert!(matches!(client.database(), Err(Error::NotConnected(_))));
    }

    #[tokio::test]
    async fn test_connect_is_idempotent() {
        let client = DocumentClient::new(StoreConfig::Memory);
        let first = client.connect().await.unwrap();
        first
            .collection("users")
            .insert_one(doc(json!({ "name": "Sarah" })))
            .await
            .unwrap();

        let second = client.connect().await.unwrap();
        let found = second.collection("users").find(&Query::all()).await.unwrap();
        assert_eq!(found.len(), 1);
    }

    #[tokio::test]
    async fn test_standard_collections() {
        let db = memory_db().await;
        db.ensure_standard_collections().await.unwrap();
        db.ensure_standard_collections().await.unwrap();

        let names = db.list_collection_names().await;
        assert_eq!(
            names,
            vec!["ledger_events", "offers", "properties", "risk_flags", "users"]
        );
    }

    #[tokio::test]
    async fn test_insert_assigns_and_keeps_ids() {
        let db = memory_db().await;
        let users = db.collection("users");

        let generated = users.insert_one(doc(json!({ "name": "a" }))).await.unwrap();
        assert!(generated.inserted_id.starts_with("doc_"));

        let kept = users
            .insert_one(doc(json!({ "_id": "user_001", "name": "b" })))
            .await
            .unwrap();
        assert_eq!(kept.inserted_id, "user_001");

        let dup = users
            .insert_one(doc(json!({ "_id": "user_001", "name": "c" })))
            .await;
        assert!(matches!(dup, Err(Error::DuplicateId { .. })));
        assert_eq!(users.count_documents(&Query::all()).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_insert_many_is_all_or_nothing() {
        let db = memory_db().await;
        let offers = db.collection("offers");

        let result = offers
            .insert_many(vec![
                doc(json!({ "_id": "o1" })),
                doc(json!({ "_id": "o2" })),
                doc(json!({ "_id": "o1" })),
            ])
            .await;

        assert!(result.is_err());
        assert_eq!(offers.count_documents(&Query::all()).await.unwrap(), 0);

        let ok = offers
            .insert_many(vec![doc(json!({ "amount": 1 })), doc(json!({ "amount": 2 }))])
            .await
            .unwrap();
        assert_eq!(ok.inserted_count, 2);
        assert_eq!(ok.inserted_ids.len(), 2);
    }

    #[tokio::test]
    async fn test_update_one_merges_fields() {
        let db = memory_db().await;
        let props = db.collection("properties");
        props
            .insert_many(vec![
                doc(json!({ "_id": "p1", "status": "listed", "price": 100 })),
                doc(json!({ "_id": "p2", "status": "listed", "price": 200 })),
            ])
            .await
            .unwrap();

        let updated = props
            .update_one(
                &Query::all().eq("status", "listed"),
                doc(json!({ "status": "sold", "buyer": "user_001" })),
            )
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated["_id"], json!("p1"));
        assert_eq!(updated["status"], json!("sold"));
        assert_eq!(updated["price"], json!(100));
        assert_eq!(updated["buyer"], json!("user_001"));

        let still_listed = props
            .find(&Query::all().eq("status", "listed"))
            .await
            .unwrap();
        assert_eq!(still_listed.len(), 1);
        assert_eq!(still_listed[0]["_id"], json!("p2"));
    }

    #[tokio::test]
    async fn test_update_rejects_id_change_and_misses() {
        let db = memory_db().await;
        let props = db.collection("properties");

        let missing = props
            .update_one(&Query::all(), doc(json!({ "status": "x" })))
            .await
            .unwrap();
        assert!(missing.is_none());
        assert!(!db.has_collection("properties").await);

        let bad = props
            .update_one(&Query::all(), doc(json!({ "_id": "other" })))
            .await;
        assert!(matches!(bad, Err(Error::InvalidDocument(_))));
    }

    #[tokio::test]
    async fn test_delete_one_and_many() {
        let db = memory_db().await;
        let flags = db.collection("risk_flags");
        flags
            .insert_many(vec![
                doc(json!({ "user": "u1", "active": true })),
                doc(json!({ "user": "u1", "active": false })),
                doc(json!({ "user": "u2", "active": true })),
            ])
            .await
            .unwrap();

        let one = flags.delete_one(&Query::all().eq("user", "u1")).await.unwrap();
        assert_eq!(one.deleted_count, 1);

        let many = flags.delete_many(&Query::all().eq("active", true)).await.unwrap();
        assert_eq!(many.deleted_count, 1);

        let none = flags.delete_one(&Query::all().eq("user", "nobody")).await.unwrap();
        assert_eq!(none.deleted_count, 0);

        let rest = flags.find(&Query::all()).await.unwrap();
        assert_eq!(rest.len(), 1);
        assert_eq!(rest[0]["user"], json!("u1"));
        assert_eq!(rest[0]["active"], json!(false));
    }

    #[tokio::test]
    async fn test_find_sort_limit() {
        let db = memory_db().await;
        let events = db.collection("ledger_events");
        for n in [1002, 1000, 1001] {
            events
                .insert_one(doc(json!({ "blockNumber": n, "type": "offer_made" })))
                .await
                .unwrap();
        }

        let newest = events
            .find(
                &Query::all()
                    .eq("type", "offer_made")
                    .sort("blockNumber", SortDirection::Descending)
                    .limit(2),
            )
            .await
            .unwrap();
        let blocks: Vec<_> = newest.iter().map(|d| d["blockNumber"].clone()).collect();
        assert_eq!(blocks, vec![json!(1002), json!(1001)]);

        let oldest = events
            .find_one(&Query::all().sort("blockNumber", SortDirection::Ascending))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(oldest["blockNumber"], json!(1000));
    }

    #[tokio::test]
    async fn test_replace_all() {
        let db = memory_db().await;
        let events = db.collection("ledger_events");
        events.insert_one(doc(json!({ "v": 1 }))).await.unwrap();

        let count = events
            .replace_all(vec![
                doc(json!({ "_id": "tx_1", "v": 2 })),
                doc(json!({ "_id": "tx_2", "v": 3 })),
            ])
            .await
            .unwrap();
        assert_eq!(count, 2);

        let docs = events.find(&Query::all()).await.unwrap();
        assert_eq!(docs[0]["_id"], json!("tx_1"));
        assert_eq!(docs[1]["_id"], json!("tx_2"));
    }
}
