//! Append-path validation
//!
//! Every field is checked; the caller gets the full list of violations.

use crate::types::{Details, EventCandidate};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Why a field was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationReason {
    /// Absent or `null`
    Missing,
    /// Blank string or empty object
    Empty,
    /// Present with the wrong JSON type
    WrongType,
}

/// One rejected field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldViolation {
    /// Wire name of the field (`type`, `actorId`, `actorName`, `details`)
    pub field: String,
    /// Reason
    pub reason: ViolationReason,
}

impl FieldViolation {
    /// Create a violation
    pub fn new(field: impl Into<String>, reason: ViolationReason) -> Self {
        Self {
            field: field.into(),
            reason,
        }
    }
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let expected = if self.field == "details" {
            "an object"
        } else {
            "a string"
        };
        match self.reason {
            ViolationReason::Missing => write!(f, "{} is required", self.field),
            ViolationReason::Empty => write!(f, "{} must not be empty", self.field),
            ViolationReason::WrongType => write!(f, "{} must be {}", self.field, expected),
        }
    }
}

/// A candidate that passed validation
#[derive(Debug, Clone, PartialEq)]
pub struct ValidEvent {
    /// Event type
    pub event_type: String,
    /// Originator ID
    pub actor_id: String,
    /// Originator display name
    pub actor_name: String,
    /// Non-empty payload
    pub details: Details,
}

/// Check a candidate, collecting every violation
pub fn validate(candidate: &EventCandidate) -> Result<ValidEvent, Vec<FieldViolation>> {
    let mut violations = Vec::new();

    let event_type = required_string("type", candidate.event_type.as_ref(), &mut violations);
    let actor_id = required_string("actorId", candidate.actor_id.as_ref(), &mut violations);
    let actor_name = required_string("actorName", candidate.actor_name.as_ref(), &mut violations);
    let details = required_object("details", candidate.details.as_ref(), &mut violations);

    match (event_type, actor_id, actor_name, details) {
        (Some(event_type), Some(actor_id), Some(actor_name), Some(details)) => Ok(ValidEvent {
            event_type,
            actor_id,
            actor_name,
            details,
        }),
        _ => Err(violations),
    }
}

fn required_string(
    field: &str,
    value: Option<&Value>,
    violations: &mut Vec<FieldViolation>,
) -> Option<String> {
    match value {
        None | Some(Value::Null) => {
            violations.push(FieldViolation::new(field, ViolationReason::Missing));
            None
        }
        Some(Value::String(s)) if s.trim().is_empty() => {
            violations.push(FieldViolation::new(field, ViolationReason::Empty));
            None
        }
        Some(Value::String(s)) => Some(s.clone()),
        Some(_) => {
            violations.push(FieldViolation::new(field, ViolationReason::WrongType));
            None
        }
    }
}

fn required_object(
    field: &str,
    value: Option<&Value>,
    violations: &mut Vec<FieldViolation>,
) -> Option<Details> {
    match value {
        None | Some(Value::Null) => {
            violations.push(FieldViolation::new(field, ViolationReason::Missing));
            None
        }
        Some(Value::Object(map)) if map.is_empty() => {
            violations.push(FieldViolation::new(field, ViolationReason::Empty));
            None
        }
        Some(Value::Object(map)) => Some(map.clone()),
        Some(_) => {
            violations.push(FieldViolation::new(field, ViolationReason::WrongType));
            None
        }
    }
}
