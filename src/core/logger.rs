//! Main logger implementation

use super::{
    async_queue::AsyncQueue,
    error::{LoggerError, Result},
    formatter::{BraceFormatter, RenderTo, SharedMessageFormatter},
    log_level::{AtomicLevel, LogLevel},
    log_record::LogRecord,
    metrics::LoggerMetrics,
    overflow_policy::{OverflowCallback, OverflowPolicy},
    pattern::PatternFormatter,
    sink::SharedSink,
};
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Default shutdown timeout for logger cleanup (5 seconds)
///
/// This timeout is used when an async logger is dropped without explicit
/// shutdown, and bounds how long `flush()` waits for the worker.
/// For custom timeout control, use the `shutdown()` method instead.
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Handler for sink failures: receives the logger name and the error
pub type ErrorHandler = Arc<dyn Fn(&str, &LoggerError) + Send + Sync>;

/// State shared between a logger and its async worker
pub(crate) struct Dispatch {
    name: String,
    sinks: RwLock<Vec<SharedSink>>,
    pattern: RwLock<Option<Arc<PatternFormatter>>>,
    default_pattern: Arc<PatternFormatter>,
    flush_level: AtomicLevel,
    error_handler: RwLock<Option<ErrorHandler>>,
    last_error_report: Mutex<Option<Instant>>,
    pub(crate) metrics: LoggerMetrics,
}

impl Dispatch {
    fn new(name: String, sinks: Vec<SharedSink>) -> Self {
        Self {
            name,
            sinks: RwLock::new(sinks),
            pattern: RwLock::new(None),
            default_pattern: Arc::new(PatternFormatter::default()),
            flush_level: AtomicLevel::new(LogLevel::Off),
            error_handler: RwLock::new(None),
            last_error_report: Mutex::new(None),
            metrics: LoggerMetrics::new(),
        }
    }

    /// Deliver a record to every sink in attachment order
    ///
    /// Each sink is isolated: an error or panic in one is reported and the
    /// remaining sinks still receive the record.
    pub(crate) fn deliver(&self, record: &LogRecord) {
        // Clone the handles so no lock is held across sink I/O
        let sinks = self.sinks.read().clone();
        let pattern = self
            .pattern
            .read()
            .clone()
            .unwrap_or_else(|| Arc::clone(&self.default_pattern));

        let mut has_error = false;
        for sink in &sinks {
            let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                sink.log(record, &pattern)
            }));

            match result {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    has_error = true;
                    self.report(&e);
                }
                Err(panic_info) => {
                    has_error = true;
                    self.report(&LoggerError::sink_panicked(
                        sink.name(),
                        panic_message(panic_info.as_ref()),
                    ));
                }
            }
        }

        if has_error {
            self.metrics.record_sink_error();
        } else {
            self.metrics.record_logged();
        }

        let flush_level = self.flush_level.load();
        if flush_level != LogLevel::Off && record.level >= flush_level {
            if let Err(e) = self.flush_sinks() {
                self.report(&e);
            }
        }
    }

    /// Flush every sink, returning the first error after trying them all
    pub(crate) fn flush_sinks(&self) -> Result<()> {
        let sinks = self.sinks.read().clone();
        let mut first_error = None;
        for sink in &sinks {
            if let Err(e) = sink.flush() {
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Route an error to the configured handler
    ///
    /// Without a handler, errors are written to stderr at most once per second.
    pub(crate) fn report(&self, err: &LoggerError) {
        if let Some(handler) = self.error_handler.read().clone() {
            handler(&self.name, err);
            return;
        }

        let now = Instant::now();
        let mut last = self.last_error_report.lock();
        if last.is_some_and(|t| now.duration_since(t) < Duration::from_secs(1)) {
            return;
        }
        *last = Some(now);
        eprintln!("[LOGGER ERROR] logger '{}': {}", self.name, err);
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}

/// A named, leveled set of sinks
///
/// Loggers are shared as `Arc<Logger>`; every method takes `&self`.
///
/// # Example
///
/// ```
/// use rust_sink_logger::prelude::*;
/// use rust_sink_logger::sinks::StreamSink;
/// use std::sync::Arc;
///
/// let (sink, buffer) = StreamSink::memory();
/// let logger = Logger::with_sink("app", Arc::new(sink));
/// logger.set_pattern("[%n] [%l] %v").unwrap();
/// logger.set_level(LogLevel::Info);
///
/// logger.debug("hidden", &[]);
/// logger.info("listening on port {}", &[&8080]);
/// assert_eq!(buffer.contents(), "[app] [info] listening on port 8080\n");
/// ```
pub struct Logger {
    level: RwLock<Option<LogLevel>>,
    formatter: SharedMessageFormatter,
    dispatch: Arc<Dispatch>,
    queue: Option<AsyncQueue>,
}

impl Logger {
    /// Synchronous logger without sinks
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_sinks(name, Vec::new())
    }

    #[must_use]
    pub fn with_sink(name: impl Into<String>, sink: SharedSink) -> Self {
        Self::with_sinks(name, vec![sink])
    }

    #[must_use]
    pub fn with_sinks(name: impl Into<String>, sinks: impl IntoIterator<Item = SharedSink>) -> Self {
        Self {
            level: RwLock::new(None),
            formatter: Arc::new(BraceFormatter),
            dispatch: Arc::new(Dispatch::new(name.into(), sinks.into_iter().collect())),
            queue: None,
        }
    }

    /// Create a builder for Logger
    ///
    /// # Example
    /// ```
    /// use rust_sink_logger::prelude::*;
    ///
    /// let logger = Logger::builder()
    ///     .name("worker")
    ///     .level(LogLevel::Debug)
    ///     .async_mode(1000)
    ///     .build();
    /// assert!(logger.is_async());
    /// ```
    #[must_use]
    pub fn builder() -> LoggerBuilder {
        LoggerBuilder::new()
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.dispatch.name
    }

    /// Effective threshold; `Info` when none was set
    #[must_use]
    pub fn level(&self) -> LogLevel {
        self.level.read().unwrap_or_default()
    }

    /// Threshold only if one was set explicitly
    #[must_use]
    pub fn explicit_level(&self) -> Option<LogLevel> {
        *self.level.read()
    }

    pub fn set_level(&self, level: LogLevel) {
        *self.level.write() = Some(level);
    }

    #[inline]
    #[must_use]
    pub fn should_log(&self, level: LogLevel) -> bool {
        level != LogLevel::Off && level >= self.level()
    }

    /// The logger's own pattern, if one was set
    #[must_use]
    pub fn pattern(&self) -> Option<String> {
        self.dispatch
            .pattern
            .read()
            .as_ref()
            .map(|f| f.pattern().to_string())
    }

    /// Set the pattern used by sinks that have none of their own
    ///
    /// # Errors
    ///
    /// Returns [`LoggerError::InvalidPattern`]; the previous pattern stays in effect.
    pub fn set_pattern(&self, pattern: &str) -> Result<()> {
        let formatter = PatternFormatter::new(pattern)?;
        self.set_formatter(formatter);
        Ok(())
    }

    pub fn set_formatter(&self, formatter: PatternFormatter) {
        *self.dispatch.pattern.write() = Some(Arc::new(formatter));
    }

    /// Append a sink; the same sink may be attached more than once
    pub fn add_sink(&self, sink: SharedSink) {
        self.dispatch.sinks.write().push(sink);
    }

    #[must_use]
    pub fn sinks(&self) -> Vec<SharedSink> {
        self.dispatch.sinks.read().clone()
    }

    /// Flush all sinks after every record at or above `level`
    pub fn flush_on(&self, level: LogLevel) {
        self.dispatch.flush_level.store(level);
    }

    #[must_use]
    pub fn flush_level(&self) -> LogLevel {
        self.dispatch.flush_level.load()
    }

    pub fn set_error_handler(&self, handler: ErrorHandler) {
        *self.dispatch.error_handler.write() = Some(handler);
    }

    #[must_use]
    pub fn has_error_handler(&self) -> bool {
        self.dispatch.error_handler.read().is_some()
    }

    #[must_use]
    pub fn is_async(&self) -> bool {
        self.queue.is_some()
    }

    /// Log `template` rendered with `args` at `level`
    ///
    /// Nothing is formatted when `level` is below the threshold. Sink failures
    /// go to the error handler and never reach the caller.
    pub fn log(&self, level: LogLevel, template: &str, args: &[&dyn RenderTo]) {
        if !self.should_log(level) {
            return;
        }
        let message = self.formatter.format(template, args);
        self.dispatch_record(LogRecord::new(level, self.name(), message));
    }

    /// Log an already rendered message
    pub fn log_message(&self, level: LogLevel, message: impl Into<String>) {
        if !self.should_log(level) {
            return;
        }
        self.dispatch_record(LogRecord::new(level, self.name(), message));
    }

    fn dispatch_record(&self, record: LogRecord) {
        match &self.queue {
            Some(queue) => queue.enqueue(record),
            None => self.dispatch.deliver(&record),
        }
    }

    #[inline]
    pub fn trace(&self, template: &str, args: &[&dyn RenderTo]) {
        self.log(LogLevel::Trace, template, args);
    }

    #[inline]
    pub fn debug(&self, template: &str, args: &[&dyn RenderTo]) {
        self.log(LogLevel::Debug, template, args);
    }

    #[inline]
    pub fn info(&self, template: &str, args: &[&dyn RenderTo]) {
        self.log(LogLevel::Info, template, args);
    }

    #[inline]
    pub fn warn(&self, template: &str, args: &[&dyn RenderTo]) {
        self.log(LogLevel::Warn, template, args);
    }

    #[inline]
    pub fn error(&self, template: &str, args: &[&dyn RenderTo]) {
        self.log(LogLevel::Error, template, args);
    }

    #[inline]
    pub fn critical(&self, template: &str, args: &[&dyn RenderTo]) {
        self.log(LogLevel::Critical, template, args);
    }

    /// Flush every sink
    ///
    /// For async loggers the flush is queued behind pending records and this
    /// call waits (up to [`DEFAULT_SHUTDOWN_TIMEOUT`]) for it to complete.
    pub fn flush(&self) -> Result<()> {
        match &self.queue {
            Some(queue) => queue.flush(DEFAULT_SHUTDOWN_TIMEOUT),
            None => self.dispatch.flush_sinks(),
        }
    }

    /// Get the logger metrics for detailed observability
    pub fn metrics(&self) -> &LoggerMetrics {
        &self.dispatch.metrics
    }

    /// Records dropped by the async queue
    pub fn dropped_count(&self) -> u64 {
        self.dispatch.metrics.dropped_count()
    }

    /// Records waiting in the async queue (0 for sync loggers)
    pub fn queued(&self) -> usize {
        self.queue.as_ref().map_or(0, AsyncQueue::len)
    }

    /// Drain the async queue and stop its worker
    ///
    /// Returns `true` if every queued record was written within `timeout`.
    /// On timeout the remaining records are dropped and counted in
    /// [`metrics`](Self::metrics). Synchronous loggers just flush.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use rust_sink_logger::Logger;
    /// use std::time::Duration;
    ///
    /// let logger = Logger::builder().name("app").async_mode(1000).build();
    /// logger.info("Important message", &[]);
    ///
    /// if !logger.shutdown(Duration::from_secs(10)) {
    ///     eprintln!("Warning: Logger shutdown timed out");
    /// }
    /// ```
    pub fn shutdown(&self, timeout: Duration) -> bool {
        let drained = self
            .queue
            .as_ref()
            .map_or(true, |queue| queue.shutdown(timeout));

        if let Err(e) = self.dispatch.flush_sinks() {
            eprintln!("[LOGGER ERROR] Failed to flush during shutdown: {}", e);
            return false;
        }
        drained
    }
}

impl Drop for Logger {
    fn drop(&mut self) {
        if let Some(queue) = self.queue.take() {
            queue.shutdown(DEFAULT_SHUTDOWN_TIMEOUT);
        }

        if let Err(e) = self.dispatch.flush_sinks() {
            eprintln!("[LOGGER ERROR] Failed to flush during shutdown: {}", e);
        }

        let dropped = self.dispatch.metrics.dropped_count();
        if dropped > 0 {
            eprintln!(
                "[LOGGER WARNING] Logger '{}' shutting down with {} dropped records (drop rate: {:.2}%)",
                self.dispatch.name,
                dropped,
                self.dispatch.metrics.drop_rate()
            );
        }
    }
}

impl std::fmt::Debug for Logger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Logger")
            .field("name", &self.dispatch.name)
            .field("level", &self.level())
            .field("sinks", &self.dispatch.sinks.read().len())
            .field("async", &self.is_async())
            .finish()
    }
}

/// Builder for constructing Logger with a fluent API
///
/// # Example
/// ```
/// use rust_sink_logger::prelude::*;
/// use std::sync::Arc;
///
/// let logger = Logger::builder()
///     .name("ingest")
///     .level(LogLevel::Debug)
///     .sink(Arc::new(NullSink::new()))
///     .async_mode(1000)
///     .overflow_policy(OverflowPolicy::DropOldest)
///     .on_overflow(Arc::new(|count| {
///         eprintln!("ALERT: {} records dropped", count);
///     }))
///     .build();
/// ```
pub struct LoggerBuilder {
    name: String,
    level: Option<LogLevel>,
    pattern: Option<String>,
    sinks: Vec<SharedSink>,
    flush_level: Option<LogLevel>,
    error_handler: Option<ErrorHandler>,
    message_formatter: Option<SharedMessageFormatter>,
    async_capacity: Option<usize>,
    overflow_policy: OverflowPolicy,
    on_overflow: Option<OverflowCallback>,
}

impl LoggerBuilder {
    /// Create a new builder with default values
    pub fn new() -> Self {
        Self {
            name: String::new(),
            level: None,
            pattern: None,
            sinks: Vec::new(),
            flush_level: None,
            error_handler: None,
            message_formatter: None,
            async_capacity: None,
            overflow_policy: OverflowPolicy::default(),
            on_overflow: None,
        }
    }

    #[must_use = "builder methods return a new value"]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn level(mut self, level: LogLevel) -> Self {
        self.level = Some(level);
        self
    }

    /// Logger pattern; a malformed pattern is reported through the error
    /// handler at build time and ignored
    #[must_use = "builder methods return a new value"]
    pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn sink(mut self, sink: SharedSink) -> Self {
        self.sinks.push(sink);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn sinks(mut self, sinks: impl IntoIterator<Item = SharedSink>) -> Self {
        self.sinks.extend(sinks);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn flush_on(mut self, level: LogLevel) -> Self {
        self.flush_level = Some(level);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn error_handler(mut self, handler: ErrorHandler) -> Self {
        self.error_handler = Some(handler);
        self
    }

    /// Replace the brace-syntax message formatter
    #[must_use = "builder methods return a new value"]
    pub fn message_formatter(mut self, formatter: SharedMessageFormatter) -> Self {
        self.message_formatter = Some(formatter);
        self
    }

    /// Enable async mode with a queue of `capacity` records
    ///
    /// If not called, the logger will use synchronous mode.
    #[must_use = "builder methods return a new value"]
    pub fn async_mode(mut self, capacity: usize) -> Self {
        self.async_capacity = Some(capacity);
        self
    }

    /// Set the overflow policy for async logging
    ///
    /// Determines what happens when the async queue is full.
    /// Default is [`OverflowPolicy::Block`].
    #[must_use = "builder methods return a new value"]
    pub fn overflow_policy(mut self, policy: OverflowPolicy) -> Self {
        self.overflow_policy = policy;
        self
    }

    /// Set a callback for overflow notifications
    ///
    /// The parameter is the total count of dropped records.
    #[must_use = "builder methods return a new value"]
    pub fn on_overflow(mut self, callback: OverflowCallback) -> Self {
        self.on_overflow = Some(callback);
        self
    }

    /// Build the Logger
    pub fn build(self) -> Logger {
        let dispatch = Arc::new(Dispatch::new(self.name, self.sinks));
        if let Some(level) = self.flush_level {
            dispatch.flush_level.store(level);
        }
        if let Some(handler) = self.error_handler {
            *dispatch.error_handler.write() = Some(handler);
        }
        if let Some(pattern) = self.pattern {
            match PatternFormatter::new(&pattern) {
                Ok(formatter) => *dispatch.pattern.write() = Some(Arc::new(formatter)),
                Err(e) => dispatch.report(&e),
            }
        }

        let queue = self.async_capacity.map(|capacity| {
            AsyncQueue::new(
                capacity,
                self.overflow_policy,
                self.on_overflow,
                Arc::clone(&dispatch),
            )
        });

        Logger {
            level: RwLock::new(self.level),
            formatter: self
                .message_formatter
                .unwrap_or_else(|| Arc::new(BraceFormatter)),
            dispatch,
            queue,
        }
    }
}

impl Default for LoggerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
