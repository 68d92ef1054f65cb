//! Where the cache gets its events from

use crate::error::{Error, Result};
use async_trait::async_trait;
use ledger_core::{
    wire::{DataResponse, ErrorResponse, ListResponse, ResetResponse},
    EventCandidate, Ledger, LedgerEvent,
};
use reqwest::{Client, Response, StatusCode};
use std::time::Duration;
use tracing::{debug, error};

/// Backend of a [`LedgerStore`](crate::LedgerStore)
#[async_trait]
pub trait LedgerSource: Send + Sync {
    /// All events, newest first
    async fn list(&self) -> Result<Vec<LedgerEvent>>;

    /// Append a candidate, returning the stored event
    async fn append(&self, candidate: EventCandidate) -> Result<LedgerEvent>;

    /// Reset to seed data, returning the seed events
    async fn reset(&self) -> Result<Vec<LedgerEvent>>;
}

/// In-process ledger
#[async_trait]
impl LedgerSource for Ledger {
    async fn list(&self) -> Result<Vec<LedgerEvent>> {
        Ok(Ledger::list(self))
    }

    async fn append(&self, candidate: EventCandidate) -> Result<LedgerEvent> {
        Ok(Ledger::append(self, &candidate).await?)
    }

    async fn reset(&self) -> Result<Vec<LedgerEvent>> {
        Ok(Ledger::reset(self).await?)
    }
}

/// Ledger API over HTTP
#[derive(Debug, Clone)]
pub struct HttpLedgerSource {
    base_url: String,
    client: Client,
}

impl HttpLedgerSource {
    /// Client for `base_url` (e.g. `http://localhost:3001`)
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(base_url, client))
    }

    /// Reuse an existing client
    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { base_url, client }
    }

    /// API root
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl LedgerSource for HttpLedgerSource {
    async fn list(&self) -> Result<Vec<LedgerEvent>> {
        let response = self.client.get(self.url("/api/ledger")).send().await?;
        let response = check_status(response, Call::List).await?;

        let body: ListResponse = response.json().await?;
        debug!(count = body.events.len(), "Fetched ledger events");
        Ok(body.events)
    }

    async fn append(&self, candidate: EventCandidate) -> Result<LedgerEvent> {
        let response = self
            .client
            .post(self.url("/api/ledger/append"))
            .json(&candidate)
            .send()
            .await?;
        let response = check_status(response, Call::Append).await?;

        let body: DataResponse<LedgerEvent> = response.json().await?;
        debug!(event_id = %body.data.id, "Appended ledger event");
        Ok(body.data)
    }

    async fn reset(&self) -> Result<Vec<LedgerEvent>> {
        let response = self
            .client
            .post(self.url("/api/ledger/reset"))
            .send()
            .await?;
        let response = check_status(response, Call::Reset).await?;

        let body: ResetResponse = response.json().await?;
        Ok(body.data.events)
    }
}

/// Which API call produced a response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Call {
    List,
    Append,
    Reset,
}

/// Turn a non-2xx response into the matching error.
///
/// Only a 404 from reset means the seed is missing; anywhere else it is a
/// wrong base URL or route.
async fn check_status(response: Response, call: Call) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    let body: Option<ErrorResponse> = serde_json::from_str(&text).ok();
    let message = body
        .as_ref()
        .map(|b| b.error.clone())
        .unwrap_or_else(|| text.clone());

    let err = match status {
        StatusCode::BAD_REQUEST => Error::Validation {
            message,
            violations: body.map(|b| b.details).unwrap_or_default(),
        },
        StatusCode::NOT_FOUND if call == Call::Reset => Error::SeedUnavailable(message),
        _ => Error::Server {
            status: status.as_u16(),
            message,
        },
    };

    error!(status = status.as_u16(), call = ?call, error = %err, "Ledger API request failed");
    Err(err)
}
