//! Hashing, identifiers and signatures
//!
//! This module provides:
//! - Canonical JSON encoding (recursively sorted keys, no whitespace)
//! - SHA-256 event hashes over `(type, actorId, actorName, details, timestamp)`
//! - Event IDs and opaque signature tokens
//! - Optional Ed25519 signing of event hashes

use crate::types::{format_timestamp, Details, LedgerEvent};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use ed25519_dalek::{Signature as DalekSignature, Signer, SigningKey, Verifier, VerifyingKey};
use serde_json::Value;
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Prefix of signatures produced by a [`KeyPair`]
pub const ED25519_PREFIX: &str = "ed25519:";

/// Canonical JSON text of a value
pub fn canonical_json(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(key.clone()).to_string());
                out.push(':');
                write_canonical(&map[key], out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        leaf => out.push_str(&leaf.to_string()),
    }
}

/// Hash arbitrary bytes using SHA-256
pub fn hash_bytes(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Content hash of an event: `0x` + 64 hex chars
pub fn event_hash(
    event_type: &str,
    actor_id: &str,
    actor_name: &str,
    details: &Details,
    timestamp: &DateTime<Utc>,
) -> String {
    let projection = serde_json::json!({
        "type": event_type,
        "actorId": actor_id,
        "actorName": actor_name,
        "details": Value::Object(details.clone()),
        "timestamp": format_timestamp(timestamp),
    });
    let digest = hash_bytes(canonical_json(&projection).as_bytes());
    format!("0x{}", hex::encode(digest))
}

/// Recompute the hash of a stored event and compare.
///
/// Legacy events without actor fields never verify.
pub fn verify_event_hash(event: &LedgerEvent) -> bool {
    match (&event.actor_id, &event.actor_name) {
        (Some(actor_id), Some(actor_name)) => {
            event_hash(
                &event.event_type,
                actor_id,
                actor_name,
                &event.details,
                &event.timestamp,
            ) == event.hash
        }
        _ => false,
    }
}

/// New event ID: `tx_` + UUIDv7 (time-ordered, random tail)
pub fn generate_event_id() -> String {
    format!("tx_{}", Uuid::now_v7().simple())
}

/// Opaque signature token: `sig_` + 32 random hex chars
pub fn random_signature() -> String {
    format!("sig_{}", hex::encode(rand::random::<[u8; 16]>()))
}

fn hash_digest(hash: &str) -> Result<[u8; 32]> {
    let raw = hash.strip_prefix("0x").unwrap_or(hash);
    let bytes = hex::decode(raw).map_err(|e| Error::Signature(format!("Bad hash: {}", e)))?;
    bytes
        .try_into()
        .map_err(|_| Error::Signature("Hash must be 32 bytes".to_string()))
}

/// Ed25519 key pair for signing event hashes
#[derive(Debug)]
pub struct KeyPair {
    signing_key: SigningKey,
    verifying_key: VerifyingKey,
}

impl KeyPair {
    /// Generate a new random key pair
    pub fn generate() -> Self {
        Self::from_seed(&rand::random::<[u8; 32]>())
    }

    /// Create from seed (32 bytes) - deterministic generation
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        let signing_key = SigningKey::from_bytes(seed);
        let verifying_key = signing_key.verifying_key();

        Self {
            signing_key,
            verifying_key,
        }
    }

    /// Create from a 64-char hex seed
    pub fn from_hex_seed(seed_hex: &str) -> Result<Self> {
        let bytes = hex::decode(seed_hex.trim())
            .map_err(|e| Error::Config(format!("Signing seed is not hex: {}", e)))?;
        let seed: [u8; 32] = bytes
            .try_into()
            .map_err(|_| Error::Config("Signing seed must be 32 bytes".to_string()))?;
        Ok(Self::from_seed(&seed))
    }

    /// Get public key bytes
    pub fn public_key(&self) -> [u8; 32] {
        self.verifying_key.to_bytes()
    }

    /// Signature over the 32 hash bytes: `ed25519:` + 128 hex chars
    pub fn sign_hash(&self, hash: &str) -> Result<String> {
        let digest = hash_digest(hash)?;
        let signature = self.signing_key.sign(&digest);
        Ok(format!("{}{}", ED25519_PREFIX, hex::encode(signature.to_bytes())))
    }
}

/// Verify an `ed25519:` signature of an event against a public key
pub fn verify_event_signature(event: &LedgerEvent, public_key: &[u8; 32]) -> Result<()> {
    let signature = event
        .signature
        .as_deref()
        .and_then(|s| s.strip_prefix(ED25519_PREFIX))
        .ok_or_else(|| Error::Signature("Event carries no ed25519 signature".to_string()))?;

    let bytes: [u8; 64] = hex::decode(signature)
        .map_err(|e| Error::Signature(format!("Bad signature hex: {}", e)))?
        .try_into()
        .map_err(|_| Error::Signature("Signature must be 64 bytes".to_string()))?;

    let verifying_key = VerifyingKey::from_bytes(public_key)
        .map_err(|e| Error::Signature(format!("Bad public key: {}", e)))?;

    verifying_key
        .verify(&hash_digest(&event.hash)?, &DalekSignature::from_bytes(&bytes))
        .map_err(|e| Error::Signature(format!("Verification failed: {}", e)))
}
