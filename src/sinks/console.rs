//! Console sink implementation

use crate::core::{BaseSink, LogRecord, Result, SinkBackend};
use colored::Colorize;
use std::io::Write;
use std::ops::Range;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConsoleTarget {
    #[default]
    Stdout,
    Stderr,
}

pub struct ConsoleBackend {
    target: ConsoleTarget,
    use_colors: bool,
}

/// Sink writing to stdout or stderr, coloring the `%^...%$` range by level
pub type ConsoleSink = BaseSink<ConsoleBackend>;

impl ConsoleSink {
    /// Colored sink on stdout
    pub fn new() -> Self {
        Self::with_target(ConsoleTarget::Stdout, true)
    }

    pub fn stderr() -> Self {
        Self::with_target(ConsoleTarget::Stderr, true)
    }

    pub fn with_colors(use_colors: bool) -> Self {
        Self::with_target(ConsoleTarget::Stdout, use_colors)
    }

    pub fn with_target(target: ConsoleTarget, use_colors: bool) -> Self {
        BaseSink::from_backend("console", ConsoleBackend { target, use_colors })
    }
}

impl Default for ConsoleSink {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsoleBackend {
    fn render(&self, record: &LogRecord, line: &str, color_range: Option<Range<usize>>) -> String {
        match color_range {
            Some(range) if self.use_colors && range.start < range.end => {
                let colored_part = line[range.clone()].color(record.level.color_code());
                format!("{}{}{}", &line[..range.start], colored_part, &line[range.end..])
            }
            _ => line.to_string(),
        }
    }
}

impl SinkBackend for ConsoleBackend {
    fn write(
        &mut self,
        record: &LogRecord,
        line: &str,
        color_range: Option<Range<usize>>,
    ) -> Result<()> {
        let output = self.render(record, line, color_range);
        match self.target {
            ConsoleTarget::Stdout => std::io::stdout().lock().write_all(output.as_bytes())?,
            ConsoleTarget::Stderr => std::io::stderr().lock().write_all(output.as_bytes())?,
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        match self.target {
            ConsoleTarget::Stdout => std::io::stdout().flush()?,
            ConsoleTarget::Stderr => std::io::stderr().flush()?,
        }
        Ok(())
    }
}
