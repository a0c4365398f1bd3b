//! # Rust Sink Logger
//!
//! A small structured logging core: named loggers, multiple sinks per logger,
//! pattern-based rendering, synchronous or queued dispatch and size-based file
//! rotation.
//!
//! ## Features
//!
//! - **Independent filters**: every logger and every sink has its own level
//! - **Patterns**: strftime-like `%` directives with colour ranges
//! - **Async dispatch**: bounded queue with configurable overflow handling
//! - **Registry**: explicit [`LoggingContext`] of uniquely named loggers
//!
//! ```
//! use rust_sink_logger::prelude::*;
//!
//! let context = LoggingContext::empty();
//! let (sink, buffer) = StreamSink::memory();
//! let logger = context.create("app", || Ok(sink.with_pattern("[%n] [%l] %v")?)).unwrap();
//!
//! logger.warn("disk {}% full", &[&93]);
//! assert_eq!(buffer.contents(), "[app] [warning] disk 93% full\n");
//! ```

pub mod core;
pub mod macros;
pub mod sinks;

pub mod prelude {
    #[cfg(feature = "console")]
    pub use crate::sinks::{ConsoleSink, ConsoleTarget};
    pub use crate::sinks::{BasicFileSink, NullSink, RotatingFileSink, SharedBuffer, StreamSink};
    pub use crate::core::{
        ErrorHandler, LevelConfig, LogLevel, LogRecord, Logger, LoggerBuilder, LoggerError,
        LoggerMetrics, LoggingContext, OverflowCallback, OverflowPolicy, PatternFormatter,
        RenderTo, Result, SharedSink, Sink, DEFAULT_SHUTDOWN_TIMEOUT,
    };
}

pub use core::{
    format_message, BaseSink, BraceFormatter, ErrorHandler, LevelConfig, LogLevel, LogRecord,
    Logger, LoggerBuilder, LoggerError, LoggerMetrics, LoggingContext, MessageFormatter,
    MetricsSnapshot, OverflowCallback, OverflowPolicy, PatternFormatter, PatternTimeType,
    RenderTo, Result, SharedMessageFormatter, SharedSink, Sink, SinkBackend, DEFAULT_PATTERN,
    DEFAULT_SHUTDOWN_TIMEOUT,
};
