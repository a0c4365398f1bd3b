//! Core logger types and traits

pub(crate) mod async_queue;
pub mod error;
pub mod formatter;
pub mod level_config;
pub mod log_level;
pub mod log_record;
pub mod logger;
pub mod metrics;
pub mod overflow_policy;
pub mod pattern;
pub mod registry;
pub mod sink;

pub use error::{LoggerError, Result};
pub use formatter::{format_message, BraceFormatter, MessageFormatter, RenderTo, SharedMessageFormatter};
pub use level_config::{LevelConfig, DEFAULT_LEVEL_ENV};
pub use log_level::LogLevel;
pub use log_record::LogRecord;
pub use logger::{ErrorHandler, Logger, LoggerBuilder, DEFAULT_SHUTDOWN_TIMEOUT};
pub use metrics::{LoggerMetrics, MetricsSnapshot};
pub use overflow_policy::{OverflowCallback, OverflowPolicy};
pub use pattern::{PatternFormatter, PatternTimeType, DEFAULT_PATTERN};
pub use registry::LoggingContext;
pub use sink::{BaseSink, SharedSink, Sink, SinkBackend};
