//! Async logging example
//!
//! Demonstrates queued logging from several threads and graceful shutdown.
//!
//! Run with: cargo run --example async_logging

use rust_sink_logger::prelude::*;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

fn main() -> Result<()> {
    println!("=== Rust Sink Logger - Async Logging Example ===\n");

    let logger = Arc::new(
        Logger::builder()
            .name("async")
            .sink(Arc::new(ConsoleSink::new()))
            .sink(Arc::new(BasicFileSink::new("async_test.log", true)?))
            .async_mode(1000)
            .overflow_policy(OverflowPolicy::DropOldest)
            .on_overflow(Arc::new(|dropped| {
                eprintln!("ALERT: {} records dropped", dropped);
            }))
            .build(),
    );

    println!("1. High-performance async logging:");
    for i in 0..100 {
        logger.info("Message #{}", &[&i]);
    }
    println!("   Logged 100 messages asynchronously");

    println!("\n2. Multi-threaded logging:");
    let handles: Vec<_> = (0..5)
        .map(|thread_id| {
            let logger = Arc::clone(&logger);
            thread::spawn(move || {
                for i in 0..20 {
                    logger.info("Thread {} - Message {}", &[&thread_id, &i]);
                    thread::sleep(Duration::from_millis(10));
                }
            })
        })
        .collect();

    for handle in handles {
        if handle.join().is_err() {
            eprintln!("worker thread panicked");
        }
    }
    println!("   5 threads logged 20 messages each");

    if !logger.shutdown(DEFAULT_SHUTDOWN_TIMEOUT) {
        eprintln!("Warning: logger shutdown timed out");
    }

    let stats = logger.metrics().snapshot();
    println!(
        "\n   written: {}, dropped: {} ({:.1}%), queue full {} times",
        stats.written,
        stats.dropped,
        stats.drop_rate(),
        stats.queue_full
    );

    println!("\n=== Example completed successfully! ===");
    println!("Check 'async_test.log' for file output");

    Ok(())
}
