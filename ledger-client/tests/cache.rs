//! Cache behaviour over an in-process ledger

use async_trait::async_trait;
use ledger_client::{Error, LedgerSource, LedgerStore, Result};
use ledger_core::{
    config::StorageConfig, event_types, Config, Details, EventCandidate, Ledger, LedgerEvent,
    SeedSource,
};
use doc_store::StoreConfig;
use serde_json::json;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

/// Ledger over the in-memory document store with the embedded seed
async fn seeded_ledger() -> Ledger {
    let mut config = Config::default();
    config.storage = StorageConfig::DocumentStore {
        store: StoreConfig::Memory,
    };
    config.seed = SeedSource::Embedded;
    Ledger::open(&config).await.unwrap()
}

fn details(value: serde_json::Value) -> Details {
    value.as_object().cloned().unwrap()
}

#[tokio::test]
async fn test_load_all_and_queries() {
    let store = LedgerStore::new(seeded_ledger().await);
    assert!(store.events().is_empty());

    let events = store.load_all().await.unwrap();
    assert_eq!(events.len(), 3);
    assert_eq!(store.events(), events);

    assert_eq!(
        store.events_by_type(event_types::IDENTITY_VERIFICATION)[0].id,
        "tx_002"
    );
    assert_eq!(store.events_by_actor("user_002")[0].id, "tx_001");
    assert!(store.events_by_actor("nobody").is_empty());
    assert_eq!(store.recent(2).len(), 2);
    assert_eq!(store.recent_default().len(), 3);
}

#[tokio::test]
async fn test_add_prepends() {
    let store = LedgerStore::new(seeded_ledger().await);
    store.load_all().await.unwrap();

    let event = store
        .add(
            event_types::OFFER_MADE,
            "user_001",
            "Sarah Al-Mansouri",
            details(json!({ "propertyId": "prop_001", "amount": 2500000 })),
        )
        .await
        .unwrap();

    assert_eq!(event.block_number, Some(1003));
    assert_eq!(store.events()[0], event);
    assert_eq!(store.events_by_actor("user_001").len(), 2);
    assert_eq!(store.source().list()[0], event);
}

#[tokio::test]
async fn test_recent_default_limit() {
    let store = LedgerStore::new(seeded_ledger().await);
    store.load_all().await.unwrap();

    for i in 0..12 {
        store
            .add(
                event_types::OFFER_MADE,
                format!("user_{i}"),
                "Buyer",
                details(json!({ "amount": i })),
            )
            .await
            .unwrap();
    }

    let recent = store.recent_default();
    assert_eq!(recent.len(), 10);
    assert_eq!(recent[0].actor_id.as_deref(), Some("user_11"));
}

#[tokio::test]
async fn test_rejected_add_keeps_cache() {
    let store = LedgerStore::new(seeded_ledger().await);
    store.load_all().await.unwrap();
    let before = store.events();

    let err = store
        .add_candidate(EventCandidate::from_json(json!({ "type": "offer_made" })))
        .await
        .unwrap_err();

    match err {
        Error::Validation { violations, .. } => assert_eq!(violations.len(), 3),
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(store.events(), before);
    assert!(store.last_error().unwrap().contains("actorId is required"));

    store.clear_error();
    assert!(store.last_error().is_none());
}

#[tokio::test]
async fn test_reset_replaces_cache() {
    let store = LedgerStore::new(seeded_ledger().await);
    store
        .add(event_types::OFFER_MADE, "user_001", "Sarah", details(json!({ "amount": 1 })))
        .await
        .unwrap();
    assert_eq!(store.events().len(), 1);

    let seed = store.reset().await.unwrap();
    assert_eq!(seed.len(), 3);
    assert_eq!(store.events(), seed);
}

#[tokio::test]
async fn test_clear_is_local() {
    let store = LedgerStore::new(seeded_ledger().await);
    store.load_all().await.unwrap();

    store.clear();
    assert!(store.events().is_empty());
    assert_eq!(store.source().len(), 3);
}

/// Source that fails until switched on
#[derive(Default)]
struct FlakySource {
    healthy: AtomicBool,
}

#[async_trait]
impl LedgerSource for FlakySource {
    async fn list(&self) -> Result<Vec<LedgerEvent>> {
        if self.healthy.load(Ordering::SeqCst) {
            Ok(SeedSource::embedded_events()?)
        } else {
            Err(Error::Server {
                status: 500,
                message: "Internal ledger error".to_string(),
            })
        }
    }

    async fn append(&self, _candidate: EventCandidate) -> Result<LedgerEvent> {
        Err(Error::Server {
            status: 500,
            message: "Internal ledger error".to_string(),
        })
    }

    async fn reset(&self) -> Result<Vec<LedgerEvent>> {
        Err(Error::SeedUnavailable("Seed data not found".to_string()))
    }
}

#[tokio::test]
async fn test_failed_calls_record_error_and_keep_cache() {
    let store = LedgerStore::new(FlakySource::default());

    assert!(store.load_all().await.is_err());
    assert!(store.events().is_empty());
    assert!(store.last_error().unwrap().contains("500"));
    assert!(!store.is_loading());

    store.source().healthy.store(true, Ordering::SeqCst);
    store.load_all().await.unwrap();
    assert_eq!(store.events().len(), 3);
    assert!(store.last_error().is_none());
    assert!(!store.is_loading());

    assert!(matches!(store.reset().await, Err(Error::SeedUnavailable(_))));
    assert_eq!(store.events().len(), 3);
    assert!(store.last_error().is_some());
}

/// Source whose calls wait until released
#[derive(Default)]
struct GatedSource {
    gate: Notify,
}

#[async_trait]
impl LedgerSource for GatedSource {
    async fn list(&self) -> Result<Vec<LedgerEvent>> {
        self.gate.notified().await;
        Ok(SeedSource::embedded_events()?)
    }

    async fn append(&self, _candidate: EventCandidate) -> Result<LedgerEvent> {
        self.gate.notified().await;
        Err(Error::Server {
            status: 500,
            message: "Internal ledger error".to_string(),
        })
    }

    async fn reset(&self) -> Result<Vec<LedgerEvent>> {
        self.gate.notified().await;
        Ok(SeedSource::embedded_events()?)
    }
}

#[tokio::test]
async fn test_is_loading_tracks_in_flight_calls() {
    let store = Arc::new(LedgerStore::new(GatedSource::default()));
    assert!(!store.is_loading());

    // Success path
    let task = tokio::spawn({
        let store = store.clone();
        async move { store.load_all().await }
    });
    while !store.is_loading() {
        tokio::task::yield_now().await;
    }
    store.source().gate.notify_one();
    assert_eq!(task.await.unwrap().unwrap().len(), 3);
    assert!(!store.is_loading());

    // Error path
    let task = tokio::spawn({
        let store = store.clone();
        async move {
            store
                .add(event_types::OFFER_MADE, "user_001", "Sarah", details(json!({ "amount": 1 })))
                .await
        }
    });
    while !store.is_loading() {
        tokio::task::yield_now().await;
    }
    store.source().gate.notify_one();
    assert!(task.await.unwrap().is_err());
    assert!(!store.is_loading());
    assert!(store.last_error().is_some());
    assert_eq!(store.events().len(), 3);
}
