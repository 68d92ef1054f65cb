//! Metrics collection for observability
//!
//! This module provides Prometheus metrics for monitoring the ledger.
//!
//! # Metrics
//!
//! - `ledger_events_appended_total` - Events committed by the writer
//! - `ledger_validation_failures_total` - Append requests rejected by validation
//! - `ledger_resets_total` - Successful resets to the seed snapshot
//! - `ledger_storage_errors_total` - Failed persistence attempts
//! - `ledger_append_duration_seconds` - Histogram of append latencies (including persist)
//! - `ledger_events` - Events in the current list
//!
//! Each collector set owns its registry, so several ledgers (tests, embedded
//! use) can coexist in one process.

use prometheus::{Encoder, Histogram, HistogramOpts, IntCounter, IntGauge, Registry, TextEncoder};
use std::fmt;
use std::sync::Arc;

/// Metrics collector
#[derive(Clone)]
pub struct LedgerMetrics {
    /// Events appended
    pub events_appended: IntCounter,

    /// Validation failures
    pub validation_failures: IntCounter,

    /// Resets
    pub resets: IntCounter,

    /// Storage failures
    pub storage_errors: IntCounter,

    /// Append duration histogram
    pub append_duration: Histogram,

    /// Current event count
    pub event_count: IntGauge,

    /// Prometheus registry
    pub registry: Arc<Registry>,
}

impl LedgerMetrics {
    /// Create new metrics collector
    pub fn new() -> prometheus::Result<Self> {
        let registry = Arc::new(Registry::new());

        let events_appended = IntCounter::new(
            "ledger_events_appended_total",
            "Total number of events appended",
        )?;
        registry.register(Box::new(events_appended.clone()))?;

        let validation_failures = IntCounter::new(
            "ledger_validation_failures_total",
            "Total number of append requests rejected by validation",
        )?;
        registry.register(Box::new(validation_failures.clone()))?;

        let resets = IntCounter::new("ledger_resets_total", "Total number of ledger resets")?;
        registry.register(Box::new(resets.clone()))?;

        let storage_errors = IntCounter::new(
            "ledger_storage_errors_total",
            "Total number of failed ledger writes",
        )?;
        registry.register(Box::new(storage_errors.clone()))?;

        let append_duration = Histogram::with_opts(
            HistogramOpts::new(
                "ledger_append_duration_seconds",
                "Histogram of append latencies",
            )
            .buckets(vec![0.001, 0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.0]),
        )?;
        registry.register(Box::new(append_duration.clone()))?;

        let event_count = IntGauge::new("ledger_events", "Number of events in the ledger")?;
        registry.register(Box::new(event_count.clone()))?;

        Ok(Self {
            events_appended,
            validation_failures,
            resets,
            storage_errors,
            append_duration,
            event_count,
            registry,
        })
    }

    /// Record a committed append
    pub fn record_append(&self, duration_seconds: f64, event_count: usize) {
        self.events_appended.inc();
        self.append_duration.observe(duration_seconds);
        self.event_count.set(event_count as i64);
    }

    /// Record a rejected candidate
    pub fn record_validation_failure(&self) {
        self.validation_failures.inc();
    }

    /// Record a committed reset
    pub fn record_reset(&self, event_count: usize) {
        self.resets.inc();
        self.event_count.set(event_count as i64);
    }

    /// Record a failed write
    pub fn record_storage_error(&self) {
        self.storage_errors.inc();
    }

    /// Set the event count gauge
    pub fn set_event_count(&self, event_count: usize) {
        self.event_count.set(event_count as i64);
    }

    /// Get metrics registry
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Prometheus text exposition of every collector
    pub fn export(&self) -> prometheus::Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

impl fmt::Debug for LedgerMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LedgerMetrics")
            .field("events_appended", &self.events_appended.get())
            .field("event_count", &self.event_count.get())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_creation() {
        let metrics = LedgerMetrics::new().unwrap();
        assert_eq!(metrics.events_appended.get(), 0);
        assert_eq!(metrics.resets.get(), 0);
    }

    #[test]
    fn test_independent_registries() {
        let a = LedgerMetrics::new().unwrap();
        let b = LedgerMetrics::new().unwrap();

        a.record_append(0.002, 4);
        assert_eq!(a.events_appended.get(), 1);
        assert_eq!(a.event_count.get(), 4);
        assert_eq!(b.events_appended.get(), 0);
    }

    #[test]
    fn test_record_reset_and_failures() {
        let metrics = LedgerMetrics::new().unwrap();
        metrics.record_validation_failure();
        metrics.record_storage_error();
        metrics.record_reset(3);

        assert_eq!(metrics.validation_failures.get(), 1);
        assert_eq!(metrics.storage_errors.get(), 1);
        assert_eq!(metrics.resets.get(), 1);
        assert_eq!(metrics.event_count.get(), 3);
    }

    #[test]
    fn test_export_text_format() {
        let metrics = LedgerMetrics::new().unwrap();
        metrics.record_append(0.01, 1);

        let text = metrics.export().unwrap();
        assert!(text.contains("ledger_events_appended_total 1"));
        assert!(text.contains("ledger_append_duration_seconds_bucket"));
    }
}
