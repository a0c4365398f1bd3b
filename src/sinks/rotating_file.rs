//! Rotating file sink with size-based log rotation
//!
//! When a write would push the current file past `max_size`, the file is
//! rotated: `app.log.{N-1}` becomes `app.log.{N}` (dropping the previous
//! `app.log.{N}`), ..., `app.log` becomes `app.log.1`, and a fresh empty
//! `app.log` is opened before the write proceeds.

use crate::core::{BaseSink, LogRecord, LoggerError, Result, SinkBackend};
use super::file::open_log_file;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::ops::Range;
use std::path::{Path, PathBuf};

/// Configuration for the rotating file sink
///
/// # Examples
///
/// ```
/// use rust_sink_logger::sinks::RotationPolicy;
///
/// let policy = RotationPolicy::new()
///     .with_max_size(5 * 1024 * 1024)
///     .with_max_files(3)
///     .with_rotate_on_open(true);
/// assert_eq!(policy.max_files, 3);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotationPolicy {
    /// Size in bytes that triggers rotation
    pub max_size: u64,
    /// Number of backups kept next to the active file
    pub max_files: usize,
    /// Rotate once when the sink is created
    pub rotate_on_open: bool,
}

impl Default for RotationPolicy {
    fn default() -> Self {
        Self {
            max_size: 10 * 1024 * 1024, // 10 MB
            max_files: 5,
            rotate_on_open: false,
        }
    }
}

impl RotationPolicy {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_max_size(mut self, size: u64) -> Self {
        self.max_size = size;
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_max_files(mut self, count: usize) -> Self {
        self.max_files = count;
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_rotate_on_open(mut self, enabled: bool) -> Self {
        self.rotate_on_open = enabled;
        self
    }
}

pub struct RotatingFileBackend {
    base_path: PathBuf,
    policy: RotationPolicy,
    writer: Option<BufWriter<File>>,
    current_size: u64,
}

/// File sink that rotates by size, keeping a bounded chain of backups
///
/// # Examples
///
/// ```no_run
/// use rust_sink_logger::sinks::RotatingFileSink;
///
/// // 5 MB per file, three backups: app.log, app.log.1 .. app.log.3
/// let sink = RotatingFileSink::new("logs/app.log", 5 * 1024 * 1024, 3).unwrap();
/// ```
pub type RotatingFileSink = BaseSink<RotatingFileBackend>;

impl RotatingFileSink {
    /// Create a rotating sink with `max_size` bytes per file and `max_files` backups
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be created or opened, or if `max_size` is zero
    pub fn new(path: impl AsRef<Path>, max_size: u64, max_files: usize) -> Result<Self> {
        Self::with_policy(
            path,
            RotationPolicy::new()
                .with_max_size(max_size)
                .with_max_files(max_files),
        )
    }

    /// Create a rotating sink with a full policy
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be created or opened, or if `max_size` is zero
    pub fn with_policy(path: impl AsRef<Path>, policy: RotationPolicy) -> Result<Self> {
        if policy.max_size == 0 {
            return Err(LoggerError::config(
                "RotatingFileSink",
                "maximum file size must be greater than zero",
            ));
        }

        let base_path = path.as_ref().to_path_buf();
        let file = open_log_file(&base_path, false)?;
        let current_size = file
            .metadata()
            .map_err(|e| {
                LoggerError::file_sink(
                    base_path.display().to_string(),
                    format!("Cannot access file metadata: {}", e),
                )
            })?
            .len();

        let mut backend = RotatingFileBackend {
            base_path,
            policy,
            writer: Some(BufWriter::new(file)),
            current_size,
        };

        if backend.policy.rotate_on_open && backend.current_size > 0 {
            backend.rotate()?;
        }

        Ok(BaseSink::from_backend("rotating_file", backend))
    }

    /// Bytes written to the active file
    #[must_use]
    pub fn current_size(&self) -> u64 {
        self.with_backend(|b| b.current_size)
    }

    /// Path of the file with the given index (0 is the active file)
    #[must_use]
    pub fn filename_for(&self, index: usize) -> PathBuf {
        self.with_backend(|b| backup_path(&b.base_path, index))
    }

    #[must_use]
    pub fn policy(&self) -> RotationPolicy {
        self.with_backend(|b| b.policy.clone())
    }
}

/// `base` for index 0, `base.N` otherwise
#[must_use]
pub fn backup_path(base: &Path, index: usize) -> PathBuf {
    if index == 0 {
        return base.to_path_buf();
    }
    let mut path = base.to_path_buf();
    let filename = base
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("app.log");
    path.set_file_name(format!("{}.{}", filename, index));
    path
}

impl RotatingFileBackend {
    fn rotate(&mut self) -> Result<()> {
        // Flush and close current file
        if let Some(mut writer) = self.writer.take() {
            writer.flush().map_err(|e| {
                LoggerError::file_rotation(
                    self.base_path.display().to_string(),
                    format!("Failed to flush before rotation: {}", e),
                )
            })?;
        }

        let max_files = self.policy.max_files;
        if max_files == 0 {
            // No backups: start the active file over
            return self.reopen(true);
        }

        let oldest = backup_path(&self.base_path, max_files);
        if oldest.exists() {
            fs::remove_file(&oldest).map_err(|e| {
                LoggerError::file_rotation(
                    oldest.display().to_string(),
                    format!("Failed to remove oldest backup: {}", e),
                )
            })?;
        }

        for i in (0..max_files).rev() {
            let src = backup_path(&self.base_path, i);
            if !src.exists() {
                continue;
            }
            let dst = backup_path(&self.base_path, i + 1);
            if fs::rename(&src, &dst).is_err() {
                // On some platforms rename fails if destination exists
                if dst.exists() {
                    let _ = fs::remove_file(&dst);
                }
                fs::rename(&src, &dst).map_err(|e| {
                    LoggerError::file_rotation(
                        src.display().to_string(),
                        format!("Failed to rename to '{}': {}", dst.display(), e),
                    )
                })?;
            }
        }

        self.reopen(true)
    }

    fn reopen(&mut self, truncate: bool) -> Result<()> {
        let file = open_log_file(&self.base_path, truncate)?;
        self.current_size = if truncate {
            0
        } else {
            file.metadata().map(|m| m.len()).unwrap_or(0)
        };
        self.writer = Some(BufWriter::new(file));
        Ok(())
    }
}

impl SinkBackend for RotatingFileBackend {
    fn write(&mut self, _record: &LogRecord, line: &str, _: Option<Range<usize>>) -> Result<()> {
        let len = line.len() as u64;
        let mut rotation_error = None;

        if self.current_size > 0 && self.current_size + len > self.policy.max_size {
            if let Err(e) = self.rotate() {
                // Keep writing to whatever file is available; the record is not lost
                if self.writer.is_none() {
                    self.reopen(false)?;
                }
                // Reset size tracking to prevent a rotation attempt on every write
                self.current_size = 0;
                rotation_error = Some(e);
            }
        }

        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| LoggerError::sink("Writer not initialized"))?;
        writer.write_all(line.as_bytes()).map_err(|e| {
            LoggerError::file_sink(
                self.base_path.display().to_string(),
                format!("Failed to write log record: {}", e),
            )
        })?;
        self.current_size += len;

        match rotation_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn flush(&mut self) -> Result<()> {
        if let Some(ref mut writer) = self.writer {
            writer.flush().map_err(|e| {
                LoggerError::file_sink(
                    self.base_path.display().to_string(),
                    format!("Failed to flush: {}", e),
                )
            })?;
        }
        Ok(())
    }
}

impl Drop for RotatingFileBackend {
    fn drop(&mut self) {
        if let Some(mut writer) = self.writer.take() {
            let _ = writer.flush();
        }
    }
}
