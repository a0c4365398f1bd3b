//! Basic logger usage example
//!
//! Demonstrates synchronous logging to the console, logger and sink levels,
//! and patterns.
//!
//! Run with: cargo run --example basic_usage

use rust_sink_logger::prelude::*;
use rust_sink_logger::{critical, info};
use std::sync::Arc;

fn main() -> Result<()> {
    println!("=== Rust Sink Logger - Basic Usage Example ===\n");

    let console: SharedSink = Arc::new(ConsoleSink::new());
    let logger = Logger::with_sink("basic", Arc::clone(&console));
    logger.set_level(LogLevel::Trace);

    println!("1. Logging at different levels:");
    logger.trace("This is a trace message", &[]);
    logger.debug("This is a debug message", &[]);
    logger.info("This is an info message", &[]);
    logger.warn("This is a warning message", &[]);
    logger.error("This is an error message", &[]);
    logger.critical("This is a critical message", &[]);

    println!("\n2. Logger level set to INFO - trace and debug won't show:");
    logger.set_level(LogLevel::Info);
    logger.trace("Trace message (hidden)", &[]);
    logger.debug("Debug message (hidden)", &[]);
    logger.info("Info message (visible)", &[]);

    println!("\n3. Sink level set to ERROR - the sink filters on its own:");
    console.set_level(LogLevel::Error);
    logger.warn("Warning message (hidden by the sink)", &[]);
    logger.error("Error message (visible)", &[]);
    console.set_level(LogLevel::Trace);

    println!("\n4. Custom pattern and arguments:");
    logger.set_pattern("%H:%M:%S %^%L%$ [%n] %v")?;
    logger.info("{} requests served in {}ms", &[&1200, &35]);
    logger.warn("positional: {1} before {0}", &[&"second", &"first"]);

    println!("\n5. Macros with format! syntax:");
    let port = 8080;
    info!(logger, "listening on port {}", port);
    critical!(logger, "shutting down: {}", "demo finished");

    println!("\n=== Example completed successfully! ===");

    Ok(())
}
