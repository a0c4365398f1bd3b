//! Delivery counters kept per logger
//!
//! The dispatch path counts every record that reaches the sinks and every
//! record a sink rejects. The async queue adds the records it had to drop
//! and how often producers found it full.
//!
//! ```
//! use rust_sink_logger::LoggerMetrics;
//!
//! let metrics = LoggerMetrics::new();
//! metrics.record_logged();
//! metrics.record_logged();
//! metrics.record_logged();
//! assert_eq!(metrics.record_dropped_many(1), 1);
//!
//! let snapshot = metrics.snapshot();
//! assert_eq!(snapshot.written, 3);
//! assert_eq!(snapshot.drop_rate(), 25.0);
//! ```

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Live counters, updated with relaxed atomics from any thread
#[derive(Debug, Default)]
pub struct LoggerMetrics {
    written: AtomicU64,
    dropped: AtomicU64,
    sink_errors: AtomicU64,
    queue_full: AtomicU64,
    blocked: AtomicU64,
}

/// Point-in-time copy of [`LoggerMetrics`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    /// Records handed to the sinks without a sink error
    pub written: u64,
    /// Records discarded by the async queue, at overflow or after shutdown
    pub dropped: u64,
    /// Records at least one sink failed to write
    pub sink_errors: u64,
    /// Times a producer found the queue full
    pub queue_full: u64,
    /// Times a producer waited for room in the queue
    pub blocked: u64,
}

impl MetricsSnapshot {
    /// Share of dropped records among all records seen, in percent
    pub fn drop_rate(&self) -> f64 {
        let seen = self.written + self.dropped;
        if seen == 0 {
            return 0.0;
        }
        self.dropped as f64 * 100.0 / seen as f64
    }
}

fn bump(counter: &AtomicU64, by: u64) -> u64 {
    counter.fetch_add(by, Ordering::Relaxed) + by
}

impl LoggerMetrics {
    pub const fn new() -> Self {
        Self {
            written: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
            sink_errors: AtomicU64::new(0),
            queue_full: AtomicU64::new(0),
            blocked: AtomicU64::new(0),
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            written: self.total_logged(),
            dropped: self.dropped_count(),
            sink_errors: self.sink_errors(),
            queue_full: self.queue_full_events(),
            blocked: self.block_events(),
        }
    }

    #[inline]
    pub fn total_logged(&self) -> u64 {
        self.written.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn sink_errors(&self) -> u64 {
        self.sink_errors.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn queue_full_events(&self) -> u64 {
        self.queue_full.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn block_events(&self) -> u64 {
        self.blocked.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn record_logged(&self) {
        bump(&self.written, 1);
    }

    #[inline]
    pub fn record_dropped(&self) {
        bump(&self.dropped, 1);
    }

    /// Count `count` dropped records and return the new drop total
    #[inline]
    pub fn record_dropped_many(&self, count: u64) -> u64 {
        bump(&self.dropped, count)
    }

    #[inline]
    pub fn record_sink_error(&self) {
        bump(&self.sink_errors, 1);
    }

    #[inline]
    pub fn record_queue_full(&self) {
        bump(&self.queue_full, 1);
    }

    #[inline]
    pub fn record_block(&self) {
        bump(&self.blocked, 1);
    }

    /// See [`MetricsSnapshot::drop_rate`]
    pub fn drop_rate(&self) -> f64 {
        self.snapshot().drop_rate()
    }

    pub fn reset(&self) {
        for counter in [
            &self.written,
            &self.dropped,
            &self.sink_errors,
            &self.queue_full,
            &self.blocked,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}

impl Clone for LoggerMetrics {
    fn clone(&self) -> Self {
        let s = self.snapshot();
        Self {
            written: AtomicU64::new(s.written),
            dropped: AtomicU64::new(s.dropped),
            sink_errors: AtomicU64::new(s.sink_errors),
            queue_full: AtomicU64::new(s.queue_full),
            blocked: AtomicU64::new(s.blocked),
        }
    }
}
