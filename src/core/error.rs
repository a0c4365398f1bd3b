//! Error types for the logging core
//!
//! Configuration errors go straight back to the caller. Everything raised
//! while writing records ends up in the logger's error handler.

use std::time::Duration;

pub type Result<T> = std::result::Result<T, LoggerError>;

#[derive(Debug, thiserror::Error)]
pub enum LoggerError {
    #[error("Logger '{name}' already exists")]
    DuplicateLogger { name: String },

    #[error("Invalid pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error("Invalid configuration for {component}: {message}")]
    InvalidConfiguration { component: String, message: String },

    #[error("IO error while {operation}: {message}")]
    IoOperation {
        operation: String,
        message: String,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("File sink error for '{path}': {message}")]
    FileSink { path: String, message: String },

    /// Renaming backups failed; the record still went to the current file
    #[error("File rotation failed for '{path}': {message}")]
    FileRotation { path: String, message: String },

    #[error("Sink '{sink}' panicked: {message}")]
    SinkPanicked { sink: String, message: String },

    /// The async worker did not acknowledge a flush in time
    #[error("Async flush not confirmed within {timeout:?}")]
    FlushTimeout { timeout: Duration },

    #[error("Sink error: {0}")]
    Sink(String),
}

impl LoggerError {
    pub fn duplicate_logger(name: impl Into<String>) -> Self {
        Self::DuplicateLogger { name: name.into() }
    }

    pub fn invalid_pattern(pattern: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidPattern {
            pattern: pattern.into(),
            message: message.into(),
        }
    }

    pub fn config(component: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            component: component.into(),
            message: message.into(),
        }
    }

    pub fn io_operation(
        operation: impl Into<String>,
        message: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        Self::IoOperation {
            operation: operation.into(),
            message: message.into(),
            source,
        }
    }

    pub fn file_sink(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::FileSink {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn file_rotation(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::FileRotation {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn sink_panicked(sink: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SinkPanicked {
            sink: sink.into(),
            message: message.into(),
        }
    }

    pub fn flush_timeout(timeout: Duration) -> Self {
        Self::FlushTimeout { timeout }
    }

    pub fn sink(message: impl Into<String>) -> Self {
        Self::Sink(message.into())
    }

    /// Duplicate names, bad patterns and bad sink settings
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::DuplicateLogger { .. }
                | Self::InvalidPattern { .. }
                | Self::InvalidConfiguration { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_configuration_family() {
        assert!(LoggerError::duplicate_logger("app").is_configuration());
        assert!(LoggerError::invalid_pattern("%$", "x").is_configuration());
        assert!(LoggerError::config("rotating sink", "max_files").is_configuration());

        assert!(!LoggerError::file_sink("/var/log/app.log", "denied").is_configuration());
        assert!(!LoggerError::sink_panicked("console", "boom").is_configuration());
        assert!(!LoggerError::flush_timeout(Duration::from_secs(1)).is_configuration());
    }

    #[test]
    fn test_messages() {
        assert_eq!(
            LoggerError::duplicate_logger("app").to_string(),
            "Logger 'app' already exists"
        );
        assert_eq!(
            LoggerError::invalid_pattern("%$", "color range end without start").to_string(),
            "Invalid pattern '%$': color range end without start"
        );
        assert_eq!(
            LoggerError::file_rotation("app.log", "Disk full").to_string(),
            "File rotation failed for 'app.log': Disk full"
        );
        assert_eq!(
            LoggerError::sink_panicked("net", "connection reset").to_string(),
            "Sink 'net' panicked: connection reset"
        );
        assert_eq!(
            LoggerError::flush_timeout(Duration::from_millis(20)).to_string(),
            "Async flush not confirmed within 20ms"
        );
    }

    #[test]
    fn test_io_operation_keeps_source() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err = LoggerError::io_operation("opening log file", "app.log", io_err);

        assert_eq!(err.to_string(), "IO error while opening log file: app.log");
        assert_eq!(err.source().map(|s| s.to_string()), Some("access denied".into()));
    }

    #[test]
    fn test_io_error_conversion() {
        fn fails() -> Result<()> {
            Err::<(), _>(std::io::Error::new(std::io::ErrorKind::WriteZero, "short write"))?;
            Ok(())
        }
        assert!(matches!(fails(), Err(LoggerError::Io(_))));
    }
}
