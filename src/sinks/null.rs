//! Null sink: renders nothing, counts what it accepts

use crate::core::{BaseSink, LogRecord, Result, SinkBackend};
use std::ops::Range;

#[derive(Default)]
pub struct NullBackend {
    accepted: u64,
}

/// Sink that discards records after the level filter, counting them
pub type NullSink = BaseSink<NullBackend>;

impl NullSink {
    pub fn new() -> Self {
        BaseSink::from_backend("null", NullBackend::default())
    }

    /// Records that passed the level filter so far
    #[must_use]
    pub fn accepted(&self) -> u64 {
        self.with_backend(|b| b.accepted)
    }
}

impl Default for NullSink {
    fn default() -> Self {
        Self::new()
    }
}

impl SinkBackend for NullBackend {
    fn write(&mut self, _: &LogRecord, _: &str, _: Option<Range<usize>>) -> Result<()> {
        self.accepted += 1;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{LogLevel, PatternFormatter, Sink};

    #[test]
    fn test_counts_only_accepted_records() {
        let sink = NullSink::new().with_level(LogLevel::Warn);
        let pattern = PatternFormatter::default();
        for level in [LogLevel::Debug, LogLevel::Warn, LogLevel::Critical] {
            sink.log(&LogRecord::new(level, "n", "x"), &pattern).unwrap();
        }
        assert_eq!(sink.accepted(), 2);
    }
}
