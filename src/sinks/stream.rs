//! Stream sink writing to any `Write` target, plus an in-memory buffer

use crate::core::{BaseSink, LogRecord, Result, SinkBackend};
use parking_lot::Mutex;
use std::io::{self, Write};
use std::ops::Range;
use std::sync::Arc;

pub struct StreamBackend<W: Write + Send> {
    writer: W,
}

/// Sink over a caller-provided writer
pub type StreamSink<W> = BaseSink<StreamBackend<W>>;

impl<W: Write + Send> StreamSink<W> {
    pub fn new(writer: W) -> Self {
        BaseSink::from_backend("stream", StreamBackend { writer })
    }
}

impl StreamSink<SharedBuffer> {
    /// Sink writing into a fresh [`SharedBuffer`], returned alongside it
    ///
    /// # Example
    ///
    /// ```
    /// use rust_sink_logger::prelude::*;
    /// use rust_sink_logger::sinks::StreamSink;
    /// use std::sync::Arc;
    ///
    /// let (sink, buffer) = StreamSink::memory();
    /// let logger = Logger::builder().name("mem").pattern("%v").sink(Arc::new(sink)).build();
    /// logger.info("hello {}", &[&"world"]);
    /// assert_eq!(buffer.contents(), "hello world\n");
    /// ```
    pub fn memory() -> (Self, SharedBuffer) {
        let buffer = SharedBuffer::new();
        (Self::new(buffer.clone()), buffer)
    }
}

impl<W: Write + Send> SinkBackend for StreamBackend<W> {
    fn write(&mut self, _record: &LogRecord, line: &str, _: Option<Range<usize>>) -> Result<()> {
        self.writer.write_all(line.as_bytes())?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Cloneable in-memory byte buffer; every clone sees the same bytes
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer {
    bytes: Arc<Mutex<Vec<u8>>>,
}

impl SharedBuffer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Buffer contents decoded as UTF-8 (lossy)
    #[must_use]
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.bytes.lock()).into_owned()
    }

    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_string).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.bytes.lock().clear();
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.bytes.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{LogLevel, PatternFormatter, Sink};

    #[test]
    fn test_memory_sink_captures_lines() {
        let (sink, buffer) = StreamSink::memory();
        let pattern = PatternFormatter::new("[%l] %v").unwrap();
        sink.log(&LogRecord::new(LogLevel::Info, "m", "one"), &pattern).unwrap();
        sink.log(&LogRecord::new(LogLevel::Error, "m", "two"), &pattern).unwrap();

        assert_eq!(buffer.lines(), vec!["[info] one", "[error] two"]);
        buffer.clear();
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_stream_over_vec() {
        let sink = StreamSink::new(Vec::<u8>::new());
        let pattern = PatternFormatter::new("%v").unwrap();
        sink.log(&LogRecord::new(LogLevel::Info, "v", "bytes"), &pattern).unwrap();
        sink.with_backend(|b| assert_eq!(b.writer, b"bytes\n".to_vec()));
    }

    #[test]
    fn test_concurrent_lines_do_not_interleave() {
        let (sink, buffer) = StreamSink::memory();
        let sink = Arc::new(sink);
        let pattern = Arc::new(PatternFormatter::new("%v").unwrap());

        let handles: Vec<_> = (0..4)
            .map(|t| {
                let sink = Arc::clone(&sink);
                let pattern = Arc::clone(&pattern);
                std::thread::spawn(move || {
                    for i in 0..100 {
                        let msg = format!("thread-{}-line-{}-{}", t, i, "x".repeat(64));
                        sink.log(&LogRecord::new(LogLevel::Info, "c", msg), &pattern).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let lines = buffer.lines();
        assert_eq!(lines.len(), 400);
        assert!(lines.iter().all(|l| l.starts_with("thread-") && l.ends_with(&"x".repeat(64))));
    }
}
