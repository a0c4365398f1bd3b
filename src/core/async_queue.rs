//! Bounded queue and worker thread behind async loggers
//!
//! Producers enqueue records; a single worker delivers them to the logger's
//! sinks in enqueue order. Flush requests travel through the same queue so
//! they complete only after every record queued before them.

use super::{
    error::{LoggerError, Result},
    log_record::LogRecord,
    logger::Dispatch,
    overflow_policy::{OverflowCallback, OverflowPolicy},
};
use crossbeam_channel::{bounded, Receiver, SendTimeoutError, Sender, TrySendError};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// How often a blocked producer rechecks whether the queue was shut down
const BLOCK_POLL_INTERVAL: Duration = Duration::from_millis(50);

pub(crate) enum QueueMessage {
    Log(Arc<LogRecord>),
    Flush(Sender<Result<()>>),
    Terminate,
}

pub(crate) struct AsyncQueue {
    sender: Sender<QueueMessage>,
    // Kept so DropOldest can evict and shutdown can drain
    receiver: Receiver<QueueMessage>,
    worker: Mutex<Option<JoinHandle<()>>>,
    policy: OverflowPolicy,
    on_overflow: Option<OverflowCallback>,
    dispatch: Arc<Dispatch>,
    abort: Arc<AtomicBool>,
    stopped: AtomicBool,
}

impl AsyncQueue {
    pub(crate) fn new(
        capacity: usize,
        policy: OverflowPolicy,
        on_overflow: Option<OverflowCallback>,
        dispatch: Arc<Dispatch>,
    ) -> Self {
        let (sender, receiver) = bounded(capacity.max(1));
        let abort = Arc::new(AtomicBool::new(false));

        let worker_receiver = receiver.clone();
        let worker_dispatch = Arc::clone(&dispatch);
        let worker_abort = Arc::clone(&abort);
        let handle = thread::spawn(move || {
            Self::run_worker(&worker_receiver, &worker_dispatch, &worker_abort);
        });

        Self {
            sender,
            receiver,
            worker: Mutex::new(Some(handle)),
            policy,
            on_overflow,
            dispatch,
            abort,
            stopped: AtomicBool::new(false),
        }
    }

    fn run_worker(receiver: &Receiver<QueueMessage>, dispatch: &Dispatch, abort: &AtomicBool) {
        while let Ok(message) = receiver.recv() {
            match message {
                QueueMessage::Log(record) => {
                    if abort.load(Ordering::Acquire) {
                        dispatch.metrics.record_dropped();
                        continue;
                    }
                    dispatch.deliver(&record);

                    // Flush once the backlog is written
                    if receiver.is_empty() {
                        if let Err(e) = dispatch.flush_sinks() {
                            dispatch.report(&e);
                        }
                    }
                }
                QueueMessage::Flush(ack) => {
                    let _ = ack.send(dispatch.flush_sinks());
                }
                QueueMessage::Terminate => break,
            }
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.sender.len()
    }

    pub(crate) fn enqueue(&self, record: LogRecord) {
        if self.stopped.load(Ordering::Acquire) {
            self.drop_records(1);
            return;
        }

        let message = match self.sender.try_send(QueueMessage::Log(Arc::new(record))) {
            Ok(()) => return,
            Err(TrySendError::Full(message)) => message,
            Err(TrySendError::Disconnected(_)) => {
                self.drop_records(1);
                return;
            }
        };

        self.dispatch.metrics.record_queue_full();
        if self.policy.waits() {
            self.dispatch.metrics.record_block();
        }
        match self.policy {
            OverflowPolicy::Block => self.send_blocking(message),
            OverflowPolicy::BlockWithTimeout(timeout) => {
                if self.sender.send_timeout(message, timeout).is_err() {
                    self.drop_records(1);
                }
            }
            OverflowPolicy::DropNewest => self.drop_records(1),
            OverflowPolicy::DropOldest => self.push_evicting_oldest(message),
        }
    }

    /// Wait for room, giving up only once the queue has been shut down
    fn send_blocking(&self, mut message: QueueMessage) {
        loop {
            match self.sender.send_timeout(message, BLOCK_POLL_INTERVAL) {
                Ok(()) => return,
                Err(SendTimeoutError::Timeout(m)) => {
                    if self.stopped.load(Ordering::Acquire) {
                        self.drop_records(1);
                        return;
                    }
                    message = m;
                }
                Err(SendTimeoutError::Disconnected(_)) => {
                    self.drop_records(1);
                    return;
                }
            }
        }
    }

    fn push_evicting_oldest(&self, mut message: QueueMessage) {
        // Control messages are never evicted; they are requeued behind the record
        let mut displaced = Vec::new();
        loop {
            match self.receiver.try_recv() {
                Ok(QueueMessage::Log(_)) => self.drop_records(1),
                Ok(control) => displaced.push(control),
                Err(_) => {}
            }
            match self.sender.try_send(message) {
                Ok(()) => break,
                Err(TrySendError::Full(m)) => message = m,
                Err(TrySendError::Disconnected(_)) => {
                    self.drop_records(1);
                    break;
                }
            }
        }
        for control in displaced {
            let _ = self.sender.send(control);
        }
    }

    fn drop_records(&self, count: u64) {
        let total = self.dispatch.metrics.record_dropped_many(count);
        let previous = total - count;

        // Alert on first drop and periodically thereafter
        if previous == 0 || previous / 1000 != total / 1000 {
            eprintln!(
                "[LOGGER WARNING] Queue full, {} logs dropped. \
                 Consider increasing buffer size or using a different overflow policy.",
                total
            );
            if let Some(ref callback) = self.on_overflow {
                callback(total);
            }
        }
    }

    /// Flush through the queue and wait for the worker to confirm
    pub(crate) fn flush(&self, timeout: Duration) -> Result<()> {
        if self.stopped.load(Ordering::Acquire) {
            return self.dispatch.flush_sinks();
        }

        let (ack_sender, ack_receiver) = bounded(1);
        self.sender
            .send_timeout(QueueMessage::Flush(ack_sender), timeout)
            .map_err(|_| LoggerError::flush_timeout(timeout))?;

        match ack_receiver.recv_timeout(timeout) {
            Ok(result) => result,
            Err(_) => Err(LoggerError::flush_timeout(timeout)),
        }
    }

    /// Stop accepting records, let the worker drain, then stop it
    ///
    /// Returns `false` if the worker did not finish within `timeout`; whatever
    /// it had not written by then is dropped and counted.
    pub(crate) fn shutdown(&self, timeout: Duration) -> bool {
        if self.stopped.swap(true, Ordering::AcqRel) {
            return true;
        }
        let start = Instant::now();

        let terminate_sent = self
            .sender
            .send_timeout(QueueMessage::Terminate, timeout)
            .is_ok();

        let mut finished = false;
        if let Some(handle) = self.worker.lock().take() {
            loop {
                if handle.is_finished() {
                    // Thread finished, join it to check for panics
                    if let Err(e) = handle.join() {
                        eprintln!(
                            "[LOGGER ERROR] Async worker thread panicked during shutdown: {:?}",
                            e
                        );
                    } else {
                        finished = true;
                    }
                    break;
                }

                if !terminate_sent || start.elapsed() >= timeout {
                    eprintln!(
                        "[LOGGER WARNING] Async worker thread did not finish within timeout. \
                         Remaining records are dropped."
                    );
                    self.abort.store(true, Ordering::Release);
                    break;
                }

                thread::sleep(Duration::from_millis(10));
            }
        }

        let mut remaining = 0;
        while let Ok(message) = self.receiver.try_recv() {
            if let QueueMessage::Log(_) = message {
                remaining += 1;
            }
        }
        if remaining > 0 {
            self.dispatch.metrics.record_dropped_many(remaining);
        }

        finished
    }
}

#[cfg(test)]
mod tests {
    use crate::core::{LogLevel, LogRecord, Logger, OverflowPolicy, PatternFormatter, Result, Sink};
    use crate::sinks::StreamSink;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    /// Sink that blocks each write until the gate opens
    struct GatedSink {
        gate: Arc<Mutex<()>>,
        written: Arc<Mutex<Vec<String>>>,
    }

    impl Sink for GatedSink {
        fn log(&self, record: &LogRecord, _: &PatternFormatter) -> Result<()> {
            let _open = self.gate.lock();
            self.written.lock().push(record.message.clone());
            Ok(())
        }
        fn flush(&self) -> Result<()> {
            Ok(())
        }
        fn level(&self) -> LogLevel {
            LogLevel::Trace
        }
        fn set_level(&self, _: LogLevel) {}
        fn set_pattern(&self, _: &str) -> Result<()> {
            Ok(())
        }
        fn clear_pattern(&self) {}
        fn name(&self) -> &str {
            "gated"
        }
    }

    fn gated() -> (GatedSink, Arc<Mutex<()>>, Arc<Mutex<Vec<String>>>) {
        let gate = Arc::new(Mutex::new(()));
        let written = Arc::new(Mutex::new(Vec::new()));
        let sink = GatedSink {
            gate: Arc::clone(&gate),
            written: Arc::clone(&written),
        };
        (sink, gate, written)
    }

    #[test]
    fn test_records_arrive_in_order() {
        let (sink, buffer) = StreamSink::memory();
        let logger = Logger::builder()
            .pattern("%v")
            .sink(Arc::new(sink))
            .async_mode(16)
            .build();

        for msg in ["A", "B", "C"] {
            logger.info(msg, &[]);
        }
        logger.flush().unwrap();
        assert_eq!(buffer.lines(), vec!["A", "B", "C"]);
    }

    #[test]
    fn test_shutdown_drains_queue() {
        let (sink, buffer) = StreamSink::memory();
        let logger = Logger::builder()
            .pattern("%v")
            .sink(Arc::new(sink))
            .async_mode(1024)
            .build();

        for i in 0..500 {
            logger.info("{}", &[&i]);
        }
        assert!(logger.shutdown(Duration::from_secs(5)));
        assert_eq!(buffer.lines().len(), 500);
        assert_eq!(logger.dropped_count(), 0);
    }

    #[test]
    fn test_records_after_shutdown_are_dropped() {
        let (sink, buffer) = StreamSink::memory();
        let logger = Logger::builder()
            .pattern("%v")
            .sink(Arc::new(sink))
            .async_mode(8)
            .build();
        assert!(logger.shutdown(Duration::from_secs(1)));

        logger.info("late", &[]);
        assert!(buffer.is_empty());
        assert_eq!(logger.dropped_count(), 1);
    }

    #[test]
    fn test_drop_newest_keeps_queued_records() {
        let (sink, gate, written) = gated();
        let held = gate.lock();
        let logger = Logger::builder()
            .sink(Arc::new(sink))
            .async_mode(2)
            .overflow_policy(OverflowPolicy::DropNewest)
            .build();

        // The first record may be in the worker (blocked on the gate) or queued
        for i in 0..10 {
            logger.info("{}", &[&i]);
        }
        drop(held);
        logger.flush().unwrap();

        let written = written.lock().clone();
        assert!(written.len() <= 3);
        assert_eq!(written[0], "0");
        assert_eq!(logger.dropped_count() as usize, 10 - written.len());
    }

    #[test]
    fn test_drop_oldest_keeps_newest_records() {
        let (sink, gate, written) = gated();
        let held = gate.lock();
        let alerts = Arc::new(AtomicU64::new(0));
        let alerts_clone = Arc::clone(&alerts);
        let logger = Logger::builder()
            .sink(Arc::new(sink))
            .async_mode(2)
            .overflow_policy(OverflowPolicy::DropOldest)
            .on_overflow(Arc::new(move |total| {
                alerts_clone.store(total, Ordering::Relaxed);
            }))
            .build();

        for i in 0..10 {
            logger.info("{}", &[&i]);
        }
        drop(held);
        logger.flush().unwrap();

        let written = written.lock().clone();
        assert_eq!(written.last().map(String::as_str), Some("9"));
        assert_eq!(logger.dropped_count() as usize, 10 - written.len());
        assert_eq!(alerts.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_block_with_timeout_drops_after_waiting() {
        let (sink, gate, written) = gated();
        let held = gate.lock();
        let logger = Logger::builder()
            .sink(Arc::new(sink))
            .async_mode(1)
            .overflow_policy(OverflowPolicy::BlockWithTimeout(Duration::from_millis(20)))
            .build();

        for i in 0..5 {
            logger.info("{}", &[&i]);
        }
        assert!(logger.dropped_count() >= 3);
        assert!(logger.metrics().block_events() >= 3);
        drop(held);
        logger.flush().unwrap();
        assert_eq!(written.lock().len() + logger.dropped_count() as usize, 5);
    }

    #[test]
    fn test_shutdown_timeout_counts_unwritten_records() {
        let (sink, gate, written) = gated();
        let held = gate.lock();
        let logger = Logger::builder()
            .sink(Arc::new(sink))
            .async_mode(64)
            .build();

        for i in 0..20 {
            logger.info("{}", &[&i]);
        }
        assert!(!logger.shutdown(Duration::from_millis(50)));
        drop(held);

        // The worker may still finish the record it was writing
        std::thread::sleep(Duration::from_millis(100));
        let written = written.lock().len();
        assert!(written <= 1);
        assert_eq!(logger.dropped_count() as usize, 20 - written);
    }
}
