//! HTTP body envelopes shared by the API service and its client

use crate::types::LedgerEvent;
use serde::{Deserialize, Serialize};

/// `GET /api/ledger`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListResponse {
    /// Events, newest first
    pub events: Vec<LedgerEvent>,
}

/// `{ success: true, data }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataResponse<T> {
    /// Always `true`
    pub success: bool,
    /// Payload
    pub data: T,
}

impl<T> DataResponse<T> {
    /// Successful envelope
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Payload of a reset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResetData {
    /// Seed events
    pub events: Vec<LedgerEvent>,
    /// Number of seed events
    pub count: usize,
}

/// `POST /api/ledger/reset`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResetResponse {
    /// Always `true`
    pub success: bool,
    /// Human-readable summary
    pub message: String,
    /// Seed events
    pub data: ResetData,
}

impl ResetResponse {
    /// Envelope for a completed reset
    pub fn new(events: Vec<LedgerEvent>) -> Self {
        Self {
            success: true,
            message: "Ledger reset to seed data".to_string(),
            data: ResetData {
                count: events.len(),
                events,
            },
        }
    }
}

/// Failure body: `{ success: false, error, details? }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Always `false`
    pub success: bool,
    /// Summary
    pub error: String,
    /// One message per rejected field
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<String>,
}

impl ErrorResponse {
    /// Failure without field details
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
            details: Vec::new(),
        }
    }

    /// Attach field details
    pub fn with_details(mut self, details: Vec<String>) -> Self {
        self.details = details;
        self
    }
}

/// `GET /health`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthResponse {
    /// `"ok"`
    pub status: String,
    /// Server time, RFC 3339
    pub timestamp: String,
}
