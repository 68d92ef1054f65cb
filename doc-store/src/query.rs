//! Typed queries over JSON documents
//!
//! A [`Query`] is an ordered list of [`QueryOp`]s:
//!
//! - `Eq` clauses are AND-ed together (no ranges, regexes or OR)
//! - `Sort` clauses form a multi-key comparison, applied in order
//! - `Limit` caps the result length (the last one wins)
//!
//! Missing fields compare equal to `null`. Numbers compare numerically, so
//! `1` and `1.0` are the same value.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;

/// A stored document: a JSON object
pub type Document = serde_json::Map<String, Value>;

/// Sort direction for a single key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    /// Smallest first
    Ascending,
    /// Largest first
    Descending,
}

/// One query operation
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOp {
    /// Field must equal the value
    Eq {
        /// Top-level field name
        field: String,
        /// Expected value
        value: Value,
    },
    /// Sort by field
    Sort {
        /// Top-level field name
        field: String,
        /// Direction
        direction: SortDirection,
    },
    /// Keep at most this many documents
    Limit(usize),
}

/// Query builder
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    ops: Vec<QueryOp>,
}

impl Query {
    /// Query matching every document
    pub fn all() -> Self {
        Self::default()
    }

    /// Build from raw operations
    pub fn from_ops(ops: Vec<QueryOp>) -> Self {
        Self { ops }
    }

    /// Add an equality clause
    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.ops.push(QueryOp::Eq {
            field: field.into(),
            value: value.into(),
        });
        self
    }

    /// Add a sort key
    pub fn sort(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.ops.push(QueryOp::Sort {
            field: field.into(),
            direction,
        });
        self
    }

    /// Set the result limit
    pub fn limit(mut self, limit: usize) -> Self {
        self.ops.push(QueryOp::Limit(limit));
        self
    }

    /// Raw operations
    pub fn ops(&self) -> &[QueryOp] {
        &self.ops
    }

    /// Effective limit, if any
    pub fn limit_value(&self) -> Option<usize> {
        self.ops.iter().rev().find_map(|op| match op {
            QueryOp::Limit(n) => Some(*n),
            _ => None,
        })
    }

    /// Whether the query has sort keys
    pub fn is_sorted(&self) -> bool {
        self.ops.iter().any(|op| matches!(op, QueryOp::Sort { .. }))
    }

    /// Check every equality clause against a document
    pub fn matches(&self, doc: &Document) -> bool {
        self.ops.iter().all(|op| match op {
            QueryOp::Eq { field, value } => {
                values_equal(doc.get(field).unwrap_or(&Value::Null), value)
            }
            _ => true,
        })
    }

    /// Compare two documents by the sort keys
    pub fn compare(&self, a: &Document, b: &Document) -> Ordering {
        for op in &self.ops {
            if let QueryOp::Sort { field, direction } = op {
                let left = a.get(field).unwrap_or(&Value::Null);
                let right = b.get(field).unwrap_or(&Value::Null);
                let ord = match direction {
                    SortDirection::Ascending => compare_values(left, right),
                    SortDirection::Descending => compare_values(right, left),
                };
                if ord != Ordering::Equal {
                    return ord;
                }
            }
        }
        Ordering::Equal
    }

    /// Filter, sort (stable) and limit
    pub fn apply(&self, docs: &[Document]) -> Vec<Document> {
        let mut out: Vec<Document> = docs.iter().filter(|d| self.matches(d)).cloned().collect();
        if self.is_sorted() {
            out.sort_by(|a, b| self.compare(a, b));
        }
        if let Some(limit) = self.limit_value() {
            out.truncate(limit);
        }
        out
    }

    /// Index of the first match in sort order (insertion order without sort keys)
    pub fn first_match(&self, docs: &[Document]) -> Option<usize> {
        let mut matching = docs
            .iter()
            .enumerate()
            .filter(|(_, d)| self.matches(d));
        if self.is_sorted() {
            matching
                .min_by(|(_, a), (_, b)| self.compare(a, b))
                .map(|(i, _)| i)
        } else {
            matching.next().map(|(i, _)| i)
        }
    }
}

/// Equality with numeric coercion
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_f64(), y.as_f64()) {
            (Some(x), Some(y)) => x == y,
            _ => x == y,
        },
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(l, r)| values_equal(l, r))
        }
        (Value::Object(x), Value::Object(y)) => {
            x.len() == y.len()
                && x
                    .iter()
                    .all(|(k, v)| y.get(k).map_or(false, |other| values_equal(v, other)))
        }
        _ => a == b,
    }
}

fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Number(_) => 1,
        Value::String(_) => 2,
        Value::Object(_) => 3,
        Value::Array(_) => 4,
        Value::Bool(_) => 5,
    }
}

/// Total order over JSON values: by type rank, then by value
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Number(x), Value::Number(y)) => {
            let x = x.as_f64().unwrap_or(f64::NAN);
            let y = y.as_f64().unwrap_or(f64::NAN);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Array(x), Value::Array(y)) => {
            for (l, r) in x.iter().zip(y) {
                let ord = compare_values(l, r);
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            x.len().cmp(&y.len())
        }
        (Value::Object(x), Value::Object(y)) => {
            for ((lk, lv), (rk, rv)) in x.iter().zip(y) {
                let ord = lk.cmp(rk).then_with(|| compare_values(lv, rv));
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            x.len().cmp(&y.len())
        }
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}
