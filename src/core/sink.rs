//! Sink trait for log output destinations
//!
//! A sink filters records by its own level, renders them with its own pattern
//! (falling back to the owning logger's pattern when it has none) and writes
//! the rendered line to its target. Sinks are shared as `Arc<dyn Sink>`, so a
//! level or pattern change made through one handle is seen by every logger
//! holding the same sink.

use super::{
    error::Result,
    log_level::{AtomicLevel, LogLevel},
    log_record::LogRecord,
    pattern::PatternFormatter,
};
use parking_lot::Mutex;
use std::ops::Range;
use std::sync::Arc;

pub trait Sink: Send + Sync {
    /// Filter, render and write one record
    ///
    /// `fallback` is used when the sink has no pattern of its own.
    fn log(&self, record: &LogRecord, fallback: &PatternFormatter) -> Result<()>;
    fn flush(&self) -> Result<()>;
    fn level(&self) -> LogLevel;
    fn set_level(&self, level: LogLevel);
    /// Give the sink its own pattern
    ///
    /// On error the previous pattern stays in effect.
    fn set_pattern(&self, pattern: &str) -> Result<()>;
    /// Drop the sink's own pattern and follow the logger's again
    fn clear_pattern(&self);
    fn name(&self) -> &str;

    #[inline]
    fn should_log(&self, level: LogLevel) -> bool {
        level != LogLevel::Off && level >= self.level()
    }
}

/// Shared handle to a sink
pub type SharedSink = Arc<dyn Sink>;

/// Write target behind a [`BaseSink`]
///
/// Backends are only ever called with the sink's lock held, so they need no
/// synchronisation of their own.
pub trait SinkBackend: Send {
    /// Write one rendered line (terminated by `\n`)
    ///
    /// `color_range` marks the bytes of `line` between `%^` and `%$`.
    fn write(
        &mut self,
        record: &LogRecord,
        line: &str,
        color_range: Option<Range<usize>>,
    ) -> Result<()>;

    fn flush(&mut self) -> Result<()>;
}

struct SinkState<B> {
    formatter: Option<PatternFormatter>,
    backend: B,
    buf: String,
}

/// Level filter, pattern and lock shared by every bundled sink
pub struct BaseSink<B: SinkBackend> {
    name: &'static str,
    level: AtomicLevel,
    state: Mutex<SinkState<B>>,
}

impl<B: SinkBackend> BaseSink<B> {
    pub fn from_backend(name: &'static str, backend: B) -> Self {
        Self {
            name,
            level: AtomicLevel::new(LogLevel::Trace),
            state: Mutex::new(SinkState {
                formatter: None,
                backend,
                buf: String::with_capacity(256),
            }),
        }
    }

    /// Set the level threshold at construction
    #[must_use]
    pub fn with_level(self, level: LogLevel) -> Self {
        self.level.store(level);
        self
    }

    /// Set the sink's own pattern at construction
    ///
    /// # Errors
    ///
    /// Returns an error if the pattern is malformed.
    pub fn with_pattern(self, pattern: &str) -> Result<Self> {
        self.set_pattern(pattern)?;
        Ok(self)
    }

    /// The sink's own pattern, if one was set
    #[must_use]
    pub fn pattern(&self) -> Option<String> {
        self.state
            .lock()
            .formatter
            .as_ref()
            .map(|f| f.pattern().to_string())
    }

    /// Use the sink's own formatter instance, e.g. to pick a UTC clock
    pub fn set_formatter(&self, formatter: PatternFormatter) {
        self.state.lock().formatter = Some(formatter);
    }

    /// Inspect the backend under the sink lock
    pub fn with_backend<R>(&self, f: impl FnOnce(&mut B) -> R) -> R {
        f(&mut self.state.lock().backend)
    }
}

impl<B: SinkBackend> Sink for BaseSink<B> {
    fn log(&self, record: &LogRecord, fallback: &PatternFormatter) -> Result<()> {
        if !self.should_log(record.level) {
            return Ok(());
        }

        let mut guard = self.state.lock();
        let state = &mut *guard;
        state.buf.clear();
        let formatter = state.formatter.as_ref().unwrap_or(fallback);
        let color_range = formatter.format(record, &mut state.buf);
        state.buf.push('\n');
        state.backend.write(record, &state.buf, color_range)
    }

    fn flush(&self) -> Result<()> {
        self.state.lock().backend.flush()
    }

    fn level(&self) -> LogLevel {
        self.level.load()
    }

    fn set_level(&self, level: LogLevel) {
        self.level.store(level);
    }

    fn set_pattern(&self, pattern: &str) -> Result<()> {
        // One guard, so a concurrent set_formatter cannot lose its clock
        let mut state = self.state.lock();
        let time_type = state
            .formatter
            .as_ref()
            .map(PatternFormatter::time_type)
            .unwrap_or_default();
        state.formatter = Some(PatternFormatter::with_time_type(pattern, time_type)?);
        Ok(())
    }

    fn clear_pattern(&self) {
        self.state.lock().formatter = None;
    }

    fn name(&self) -> &str {
        self.name
    }
}
