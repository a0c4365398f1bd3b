//! File logging example
//!
//! Demonstrates a registry of loggers writing to the console, a plain file and
//! a rotating file.
//!
//! Run with: cargo run --example file_logging

use rust_sink_logger::prelude::*;
use std::sync::Arc;

fn main() -> Result<()> {
    println!("=== Rust Sink Logger - File Logging Example ===\n");

    let context = LoggingContext::empty();
    context.set_pattern("[%Y-%m-%d %H:%M:%S.%e] [%n] [%l] %v")?;
    context.flush_on(LogLevel::Error);

    // Honour LOG_LEVEL=... from the environment or the command line
    context.load_levels(std::env::args());

    let app = context.create("app", || BasicFileSink::new("application.log", true))?;
    app.add_sink(Arc::new(ConsoleSink::new()));

    let audit = context.create("audit", || RotatingFileSink::new("logs/audit.log", 1024, 3))?;

    println!("1. Logging to both console and file:");
    app.info("Application started", &[]);
    app.debug("Loading configuration...", &[]);
    app.warn("Using default settings for some options", &[]);
    app.error("Failed to load optional plugin", &[]);

    println!("\n2. Writing enough audit records to rotate:");
    for i in 1..=50 {
        audit.info("user {} performed action {}", &[&(i % 7), &"login"]);
    }
    for name in context.logger_names() {
        println!("   registered logger: {}", name);
    }

    context.flush_all()?;

    println!("\n=== Example completed successfully! ===");
    println!("Check 'application.log' and 'logs/audit.log*' for the file output");

    Ok(())
}
