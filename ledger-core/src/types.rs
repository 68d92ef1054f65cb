//! Core types for the ledger
//!
//! Field names follow the JSON wire format (camelCase) so the persisted file,
//! the HTTP bodies and the seed document all share one shape.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Free-form event payload
pub type Details = serde_json::Map<String, Value>;

/// Well-known event types. Any non-empty string is accepted.
pub mod event_types {
    /// A property was put on the market
    pub const PROPERTY_LISTED: &str = "property_listed";
    /// A buyer made an offer
    pub const OFFER_MADE: &str = "offer_made";
    /// The seller accepted an offer
    pub const OFFER_ACCEPTED: &str = "offer_accepted";
    /// The seller rejected an offer
    pub const OFFER_REJECTED: &str = "offer_rejected";
    /// A user's digital identity was checked
    pub const IDENTITY_VERIFICATION: &str = "identity_verification";
    /// A title deed was checked with the land registry
    pub const DEED_VERIFICATION: &str = "deed_verification";
    /// Ownership moved to the buyer
    pub const OWNERSHIP_TRANSFERRED: &str = "ownership_transferred";
}

/// One immutable ledger record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEvent {
    /// Unique event ID (`tx_` + UUIDv7)
    pub id: String,

    /// Event type
    #[serde(rename = "type")]
    pub event_type: String,

    /// Creation time, millisecond precision
    #[serde(with = "timestamp_millis")]
    pub timestamp: DateTime<Utc>,

    /// `0x` + hex SHA-256 of the canonical projection
    pub hash: String,

    /// Originator ID (absent in legacy records)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actor_id: Option<String>,

    /// Originator display name (absent in legacy records)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actor_name: Option<String>,

    /// Domain payload
    pub details: Details,

    /// Opaque provenance tag
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,

    /// Simulated block position
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_number: Option<u64>,

    /// Position within the block (always 0)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_index: Option<u32>,
}

impl LedgerEvent {
    /// Timestamp in its serialized form
    pub fn timestamp_string(&self) -> String {
        format_timestamp(&self.timestamp)
    }
}

/// Persisted document: `{ "events": [...] }`, newest first
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LedgerDocument {
    /// Events, newest first
    pub events: Vec<LedgerEvent>,
}

/// Unvalidated append request.
///
/// Fields stay raw JSON so validation can report wrong types alongside
/// missing fields instead of failing on the first one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventCandidate {
    /// Event type
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub event_type: Option<Value>,

    /// Originator ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actor_id: Option<Value>,

    /// Originator display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actor_name: Option<Value>,

    /// Domain payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl EventCandidate {
    /// Candidate from typed parts
    pub fn new(
        event_type: impl Into<String>,
        actor_id: impl Into<String>,
        actor_name: impl Into<String>,
        details: Details,
    ) -> Self {
        Self {
            event_type: Some(Value::String(event_type.into())),
            actor_id: Some(Value::String(actor_id.into())),
            actor_name: Some(Value::String(actor_name.into())),
            details: Some(Value::Object(details)),
        }
    }

    /// Candidate from an arbitrary JSON body. Anything but an object has no fields.
    pub fn from_json(body: Value) -> Self {
        match body {
            Value::Object(mut map) => Self {
                event_type: map.remove("type"),
                actor_id: map.remove("actorId"),
                actor_name: map.remove("actorName"),
                details: map.remove("details"),
            },
            _ => Self::default(),
        }
    }
}

/// Serialized timestamp form: RFC 3339, milliseconds, `Z` suffix
pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}

mod timestamp_millis {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_timestamp(ts))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|ts| ts.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}
