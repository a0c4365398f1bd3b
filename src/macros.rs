//! `format!`-style logging macros
//!
//! Each macro tests the logger's level before formatting, so arguments of a
//! suppressed call are never rendered.
//!
//! ```
//! use rust_sink_logger::prelude::*;
//! use rust_sink_logger::{debug, warn};
//! use std::sync::Arc;
//!
//! let (sink, captured) = StreamSink::memory();
//! sink.set_pattern("%l: %v")?;
//! let logger = Logger::with_sink("db", Arc::new(sink));
//!
//! debug!(logger, "pool stats {:?}", (4, 16));
//! warn!(logger, "{} of {} connections busy", 15, 16);
//!
//! assert_eq!(captured.lines(), ["warning: 15 of 16 connections busy"]);
//! # Ok::<(), LoggerError>(())
//! ```

/// Log at a level chosen at runtime
///
/// ```
/// # use rust_sink_logger::prelude::*;
/// use rust_sink_logger::log;
///
/// let logger = Logger::new("net");
/// let level = if cfg!(debug_assertions) { LogLevel::Debug } else { LogLevel::Info };
/// log!(logger, level, "retrying {} after {}ms", "10.0.0.7", 250);
/// ```
#[macro_export]
macro_rules! log {
    ($logger:expr, $level:expr, $($arg:tt)+) => {{
        let logger = &$logger;
        let level = $level;
        if logger.should_log(level) {
            logger.log_message(level, format!($($arg)+));
        }
    }};
}

#[macro_export]
macro_rules! trace {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Trace, $($arg)+)
    };
}

#[macro_export]
macro_rules! debug {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Debug, $($arg)+)
    };
}

#[macro_export]
macro_rules! info {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Info, $($arg)+)
    };
}

#[macro_export]
macro_rules! warn {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Warn, $($arg)+)
    };
}

#[macro_export]
macro_rules! error {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Error, $($arg)+)
    };
}

/// Highest severity below `Off`
#[macro_export]
macro_rules! critical {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Critical, $($arg)+)
    };
}
