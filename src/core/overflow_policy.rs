//! What an async logger does with a record when its queue is full
//!
//! Records that a policy discards are counted in
//! [`LoggerMetrics`](super::LoggerMetrics) and reported through the
//! logger's [`OverflowCallback`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Queue-full behaviour of an async logger
///
/// ```
/// use rust_sink_logger::OverflowPolicy;
/// use std::time::Duration;
///
/// assert_eq!(OverflowPolicy::default(), OverflowPolicy::Block);
/// assert!(OverflowPolicy::BlockWithTimeout(Duration::from_millis(5)).waits());
/// assert_eq!(OverflowPolicy::DropOldest.to_string(), "drop_oldest");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverflowPolicy {
    /// The producer waits until the worker frees a slot
    #[default]
    Block,

    /// The producer waits at most this long, then the record is dropped
    BlockWithTimeout(Duration),

    /// The incoming record is dropped
    DropNewest,

    /// The oldest queued record is evicted to admit the incoming one
    DropOldest,
}

impl OverflowPolicy {
    /// Whether a producer waits for room before anything is dropped
    #[must_use]
    pub fn waits(&self) -> bool {
        matches!(self, Self::Block | Self::BlockWithTimeout(_))
    }
}

impl fmt::Display for OverflowPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Block => f.write_str("block"),
            Self::BlockWithTimeout(timeout) => write!(f, "block_with_timeout({:?})", timeout),
            Self::DropNewest => f.write_str("drop_newest"),
            Self::DropOldest => f.write_str("drop_oldest"),
        }
    }
}

/// Invoked with the running total of dropped records
///
/// Fires on the first drop and each time the total crosses a multiple of 1000.
pub type OverflowCallback = Arc<dyn Fn(u64) + Send + Sync>;
