//! Configuration for the ledger service

use crate::seed::SeedSource;
use doc_store::StoreConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Ledger configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Service name
    pub service_name: String,

    /// Service version
    pub service_version: String,

    /// HTTP server configuration
    pub server: ServerConfig,

    /// Event storage backend
    pub storage: StorageConfig,

    /// Seed snapshot for bootstrap and reset
    pub seed: SeedSource,

    /// Signing configuration
    pub signing: SigningConfig,

    /// Writer mailbox capacity (pending appends/resets)
    pub mailbox_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service_name: "wasatah-ledger".to_string(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            server: ServerConfig::default(),
            storage: StorageConfig::default(),
            seed: SeedSource::default(),
            signing: SigningConfig::default(),
            mailbox_capacity: 1000,
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address
    pub listen_addr: String,

    /// Origins allowed by CORS
    pub cors_allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:3001".to_string(),
            // Vite dev server
            cors_allowed_origins: vec![
                "http://localhost:5173".to_string(),
                "http://127.0.0.1:5173".to_string(),
            ],
        }
    }
}

/// Event storage backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "snake_case")]
pub enum StorageConfig {
    /// `{ "events": [...] }` at a fixed path
    JsonFile {
        /// Ledger file path
        path: PathBuf,
    },
    /// `ledger_events` collection of the document store
    DocumentStore {
        /// Document store backend
        #[serde(default)]
        store: StoreConfig,
    },
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig::JsonFile {
            path: PathBuf::from("./data/ledger.json"),
        }
    }
}

/// Signing configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SigningConfig {
    /// Hex-encoded 32-byte Ed25519 seed. Without it signatures are random tokens.
    pub key_seed_hex: Option<String>,
}

impl Config {
    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            crate::Error::Config(format!(
                "Failed to read config {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| crate::Error::Config(format!("Failed to parse config: {}", e)))?;
        Ok(config)
    }

    /// Load from environment variables
    pub fn from_env() -> crate::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup (environment semantics)
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> crate::Result<Self> {
        let mut config = match lookup("LEDGER_CONFIG") {
            Some(path) => Config::from_file(path)?,
            None => Config::default(),
        };

        if let Some(port) = lookup("PORT") {
            let port: u16 = port
                .parse()
                .map_err(|_| crate::Error::Config(format!("Invalid PORT: {}", port)))?;
            config.server.listen_addr = format!("0.0.0.0:{}", port);
        }

        if let Some(addr) = lookup("LEDGER_LISTEN_ADDR") {
            config.server.listen_addr = addr;
        }

        if let Some(backend) = lookup("LEDGER_STORAGE_BACKEND") {
            // Keep a loaded section when the backend is unchanged
            match (backend.as_str(), &config.storage) {
                ("json_file", StorageConfig::JsonFile { .. })
                | ("document_store", StorageConfig::DocumentStore { .. }) => {}
                ("json_file", _) => config.storage = StorageConfig::default(),
                ("document_store", _) => {
                    config.storage = StorageConfig::DocumentStore {
                        store: StoreConfig::Memory,
                    }
                }
                (other, _) => {
                    return Err(crate::Error::Config(format!(
                        "Unknown storage backend: {}",
                        other
                    )))
                }
            }
        }

        if let Some(path) = lookup("LEDGER_FILE") {
            if let StorageConfig::JsonFile { .. } = config.storage {
                config.storage = StorageConfig::JsonFile {
                    path: PathBuf::from(path),
                };
            }
        }

        if let Some(path) = lookup("LEDGER_DOCUMENT_STORE_FILE") {
            if let StorageConfig::DocumentStore { .. } = config.storage {
                config.storage = StorageConfig::DocumentStore {
                    store: StoreConfig::File {
                        path: PathBuf::from(path),
                    },
                };
            }
        }

        if let Some(seed) = lookup("LEDGER_SEED") {
            config.seed = SeedSource::from_setting(&seed);
        }

        if let Some(seed_hex) = lookup("LEDGER_SIGNING_SEED") {
            config.signing.key_seed_hex = Some(seed_hex);
        }

        if let Some(origins) = lookup("LEDGER_CORS_ORIGINS") {
            config.server.cors_allowed_origins = origins
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect();
        }

        Ok(config)
    }
}
