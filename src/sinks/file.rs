//! Basic file sink implementation

use crate::core::{BaseSink, LogRecord, LoggerError, Result, SinkBackend};
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::ops::Range;
use std::path::{Path, PathBuf};

pub struct FileBackend {
    path: PathBuf,
    writer: Option<BufWriter<File>>,
}

/// Sink writing every record to a single file
pub type BasicFileSink = BaseSink<FileBackend>;

impl BasicFileSink {
    /// Open `path`, truncating it when `truncate` is set and appending otherwise
    ///
    /// Missing parent directories are created.
    ///
    /// # Errors
    ///
    /// Returns error if the directory or file cannot be created or opened
    pub fn new(path: impl Into<PathBuf>, truncate: bool) -> Result<Self> {
        let path = path.into();
        let file = open_log_file(&path, truncate)?;

        Ok(BaseSink::from_backend(
            "basic_file",
            FileBackend {
                path,
                writer: Some(BufWriter::new(file)),
            },
        ))
    }

    #[must_use]
    pub fn path(&self) -> PathBuf {
        self.with_backend(|b| b.path.clone())
    }
}

/// Create parent directories and open a log file for writing
pub(crate) fn open_log_file(path: &Path, truncate: bool) -> Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| {
            LoggerError::io_operation(
                "create log directory",
                format!("Failed to create directory '{}'", parent.display()),
                e,
            )
        })?;
    }

    let mut options = OpenOptions::new();
    options.create(true);
    if truncate {
        options.write(true).truncate(true);
    } else {
        options.append(true);
    }

    options.open(path).map_err(|e| {
        LoggerError::file_sink(path.display().to_string(), format!("Failed to open: {}", e))
    })
}

impl SinkBackend for FileBackend {
    fn write(&mut self, _record: &LogRecord, line: &str, _: Option<Range<usize>>) -> Result<()> {
        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| LoggerError::sink("File writer not initialized"))?;

        writer.write_all(line.as_bytes()).map_err(|e| {
            LoggerError::file_sink(
                self.path.display().to_string(),
                format!("Failed to write log record: {}", e),
            )
        })
    }

    fn flush(&mut self) -> Result<()> {
        if let Some(ref mut writer) = self.writer {
            writer.flush()?;
        }
        Ok(())
    }
}

impl Drop for FileBackend {
    fn drop(&mut self) {
        // Ensure all buffered data is flushed to disk
        let _ = self.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{LogLevel, PatternFormatter, Sink};
    use tempfile::tempdir;

    #[test]
    fn test_truncate_versus_append() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("basic.log");
        let pattern = PatternFormatter::new("%v").unwrap();

        {
            let sink = BasicFileSink::new(&path, true).unwrap();
            sink.log(&LogRecord::new(LogLevel::Info, "a", "first"), &pattern).unwrap();
        }
        {
            let sink = BasicFileSink::new(&path, false).unwrap();
            sink.log(&LogRecord::new(LogLevel::Info, "a", "second"), &pattern).unwrap();
        }
        assert_eq!(fs::read_to_string(&path).unwrap(), "first\nsecond\n");

        {
            let sink = BasicFileSink::new(&path, true).unwrap();
            sink.log(&LogRecord::new(LogLevel::Info, "a", "third"), &pattern).unwrap();
        }
        assert_eq!(fs::read_to_string(&path).unwrap(), "third\n");
    }

    #[test]
    fn test_open_failure_is_reported() {
        let dir = tempdir().unwrap();
        // A directory cannot be opened as a log file
        let result = BasicFileSink::new(dir.path(), false);
        assert!(result.is_err());
    }
}
