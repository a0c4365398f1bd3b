//! Sink implementations

#[cfg(feature = "console")]
pub mod console;
pub mod file;
pub mod null;
pub mod rotating_file;
pub mod stream;

#[cfg(feature = "console")]
pub use console::{ConsoleSink, ConsoleTarget};
pub use file::BasicFileSink;
pub use null::NullSink;
pub use rotating_file::{backup_path, RotatingFileSink, RotationPolicy};
pub use stream::{SharedBuffer, StreamSink};

pub use crate::core::{BaseSink, SharedSink, Sink, SinkBackend};
