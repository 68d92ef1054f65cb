//! Seed snapshots used to bootstrap and reset the ledger

use crate::types::{LedgerDocument, LedgerEvent};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

const EMBEDDED_SEED: &str = include_str!("../data/ledger.seed.json");

/// Where the seed snapshot comes from
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum SeedSource {
    /// Three demo events compiled into the binary (`tx_001..tx_003`)
    #[default]
    Embedded,
    /// `{ "events": [...] }` document on disk
    File {
        /// Seed document path
        path: PathBuf,
    },
    /// Events supplied in code
    #[serde(skip)]
    Inline(Vec<LedgerEvent>),
    /// No seed: reset is refused, first open starts empty
    #[serde(rename = "none")]
    Disabled,
}

impl SeedSource {
    /// Parse the embedded seed document
    pub fn embedded_events() -> Result<Vec<LedgerEvent>> {
        let doc: LedgerDocument = serde_json::from_str(EMBEDDED_SEED)
            .map_err(|e| Error::storage("parsing embedded seed", e))?;
        Ok(doc.events)
    }

    /// Load the seed events, newest first
    pub async fn load(&self) -> Result<Vec<LedgerEvent>> {
        let mut events = self.load_raw().await?;
        // Stable: equal timestamps keep their document order
        events.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(events)
    }

    async fn load_raw(&self) -> Result<Vec<LedgerEvent>> {
        match self {
            SeedSource::Embedded => Self::embedded_events(),
            SeedSource::File { path } => {
                let bytes = match tokio::fs::read(path).await {
                    Ok(bytes) => bytes,
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                        return Err(Error::SeedUnavailable(format!(
                            "seed file {} does not exist",
                            path.display()
                        )))
                    }
                    Err(e) => return Err(Error::storage("reading seed file", e)),
                };
                let doc: LedgerDocument = serde_json::from_slice(&bytes)
                    .map_err(|e| Error::storage("parsing seed file", e))?;
                Ok(doc.events)
            }
            SeedSource::Inline(events) => Ok(events.clone()),
            SeedSource::Disabled => Err(Error::SeedUnavailable(
                "no seed snapshot configured".to_string(),
            )),
        }
    }

    /// Parse the `LEDGER_SEED` style setting: `embedded`, `none` or a path
    pub fn from_setting(value: &str) -> Self {
        match value.trim() {
            "" | "embedded" => SeedSource::Embedded,
            "none" | "disabled" => SeedSource::Disabled,
            path => SeedSource::File {
                path: PathBuf::from(path),
            },
        }
    }
}
