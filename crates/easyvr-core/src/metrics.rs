//! Link metrics tracking.
//!
//! [`LinkMetrics`] is shared between the engine and any observer through an
//! `Arc`, so a dashboard can read it while the engine is locked in a long
//! transaction.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

/// Reply latency statistics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LatencySummary {
    /// Number of replies measured.
    pub count: u64,
    /// Minimum latency.
    pub min_ms: Option<u64>,
    /// Maximum latency.
    pub max_ms: Option<u64>,
    /// Average latency.
    pub avg_ms: Option<f64>,
}

/// Thread-safe latency tracker.
#[derive(Debug)]
pub struct AtomicLatency {
    count: AtomicU64,
    total_ms: AtomicU64,
    min_ms: AtomicU64,
    max_ms: AtomicU64,
}

impl Default for AtomicLatency {
    fn default() -> Self {
        Self::new()
    }
}

impl AtomicLatency {
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self {
            count: AtomicU64::new(0),
            total_ms: AtomicU64::new(0),
            min_ms: AtomicU64::new(u64::MAX),
            max_ms: AtomicU64::new(0),
        }
    }

    /// Record one measured latency.
    pub fn record(&self, latency: Duration) {
        let ms = latency.as_millis() as u64;
        self.count.fetch_add(1, Ordering::Relaxed);
        self.total_ms.fetch_add(ms, Ordering::Relaxed);
        self.min_ms.fetch_min(ms, Ordering::Relaxed);
        self.max_ms.fetch_max(ms, Ordering::Relaxed);
    }

    /// Get a snapshot of the current statistics.
    pub fn snapshot(&self) -> LatencySummary {
        let count = self.count.load(Ordering::Relaxed);
        if count == 0 {
            return LatencySummary::default();
        }
        let total = self.total_ms.load(Ordering::Relaxed);
        LatencySummary {
            count,
            min_ms: Some(self.min_ms.load(Ordering::Relaxed)),
            max_ms: Some(self.max_ms.load(Ordering::Relaxed)),
            avg_ms: Some(total as f64 / count as f64),
        }
    }

    /// Reset to empty.
    pub fn reset(&self) {
        self.count.store(0, Ordering::Relaxed);
        self.total_ms.store(0, Ordering::Relaxed);
        self.min_ms.store(u64::MAX, Ordering::Relaxed);
        self.max_ms.store(0, Ordering::Relaxed);
    }
}

/// Counters for one engine's serial link.
#[derive(Debug)]
pub struct LinkMetrics {
    created_at: Instant,
    transactions: AtomicU64,
    declined: AtomicU64,
    timeouts: AtomicU64,
    protocol_faults: AtomicU64,
    io_errors: AtomicU64,
    consecutive_faults: AtomicU64,
    bytes_read: AtomicU64,
    bytes_written: AtomicU64,
    /// Time from command byte to status byte.
    pub reply_latency: AtomicLatency,
}

impl Default for LinkMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl LinkMetrics {
    /// Create new empty metrics.
    pub fn new() -> Self {
        Self {
            created_at: Instant::now(),
            transactions: AtomicU64::new(0),
            declined: AtomicU64::new(0),
            timeouts: AtomicU64::new(0),
            protocol_faults: AtomicU64::new(0),
            io_errors: AtomicU64::new(0),
            consecutive_faults: AtomicU64::new(0),
            bytes_read: AtomicU64::new(0),
            bytes_written: AtomicU64::new(0),
            reply_latency: AtomicLatency::new(),
        }
    }

    /// Create shared metrics.
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Record a command byte leaving the host.
    pub fn record_transaction(&self) {
        self.transactions.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a well-formed reply that was not the hoped-for status.
    pub fn record_declined(&self) {
        self.declined.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a well-formed byte from the module.
    pub fn record_byte_read(&self) {
        self.bytes_read.fetch_add(1, Ordering::Relaxed);
        self.consecutive_faults.store(0, Ordering::Relaxed);
    }

    /// Record bytes written.
    pub fn record_bytes_written(&self, bytes: u64) {
        self.bytes_written.fetch_add(bytes, Ordering::Relaxed);
    }

    /// Record a read that got no reply in time.
    pub fn record_timeout(&self) {
        self.timeouts.fetch_add(1, Ordering::Relaxed);
        self.consecutive_faults.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a reply byte that broke the protocol.
    pub fn record_protocol_fault(&self) {
        self.protocol_faults.fetch_add(1, Ordering::Relaxed);
        self.consecutive_faults.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a transport failure.
    pub fn record_io_error(&self) {
        self.io_errors.fetch_add(1, Ordering::Relaxed);
        self.consecutive_faults.fetch_add(1, Ordering::Relaxed);
    }

    /// Link faults since the last well-formed byte.
    pub fn consecutive_faults(&self) -> u64 {
        self.consecutive_faults.load(Ordering::Relaxed)
    }

    /// Whether at least `threshold` link faults happened in a row.
    pub fn is_degraded(&self, threshold: u64) -> bool {
        threshold > 0 && self.consecutive_faults() >= threshold
    }

    /// Time since these metrics were created.
    pub fn uptime(&self) -> Duration {
        self.created_at.elapsed()
    }

    /// Get a summary of all metrics.
    pub fn summary(&self) -> LinkMetricsSummary {
        LinkMetricsSummary {
            uptime_ms: self.uptime().as_millis() as u64,
            transactions: self.transactions.load(Ordering::Relaxed),
            declined: self.declined.load(Ordering::Relaxed),
            timeouts: self.timeouts.load(Ordering::Relaxed),
            protocol_faults: self.protocol_faults.load(Ordering::Relaxed),
            io_errors: self.io_errors.load(Ordering::Relaxed),
            consecutive_faults: self.consecutive_faults(),
            bytes_read: self.bytes_read.load(Ordering::Relaxed),
            bytes_written: self.bytes_written.load(Ordering::Relaxed),
            reply_latency: self.reply_latency.snapshot(),
        }
    }

    /// Reset all counters.
    pub fn reset(&self) {
        for counter in [
            &self.transactions,
            &self.declined,
            &self.timeouts,
            &self.protocol_faults,
            &self.io_errors,
            &self.consecutive_faults,
            &self.bytes_read,
            &self.bytes_written,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
        self.reply_latency.reset();
    }
}

/// Serializable summary of link metrics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LinkMetricsSummary {
    /// Time since the engine was created, in milliseconds.
    pub uptime_ms: u64,
    /// Command bytes sent.
    pub transactions: u64,
    /// Well-formed replies other than the expected status.
    pub declined: u64,
    /// Reads that got no reply in time.
    pub timeouts: u64,
    /// Reply bytes that broke the protocol.
    pub protocol_faults: u64,
    /// Transport failures.
    pub io_errors: u64,
    /// Link faults since the last well-formed byte.
    pub consecutive_faults: u64,
    /// Well-formed bytes received.
    pub bytes_read: u64,
    /// Bytes sent.
    pub bytes_written: u64,
    /// Command-to-status latency.
    pub reply_latency: LatencySummary,
}
