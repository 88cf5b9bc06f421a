//! The driver-side producer: one record slot plus a regeneration loop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use parking_lot::Mutex;
use rand::Rng;

use crate::record::{now_nanos, DriverResult};

/// Default regeneration interval, matching the harness default.
pub const DEFAULT_UPDATE_INTERVAL: Duration = Duration::from_millis(50);

/// Source of the synthetic measurement value. The harness only requires a
/// numeric value per regeneration; how it is chosen is interchangeable.
pub type ValueSampler = Box<dyn FnMut() -> f64 + Send>;

/// State shared between the owning handle and the regeneration thread.
struct Shared {
    /// The single mutable record slot. All mutation and the read-then-stamp
    /// sequence are serialized here so a reader can never observe fields
    /// from two different regenerations.
    slot: Mutex<DriverResult>,
    interval: Mutex<Duration>,
    sampler: Mutex<ValueSampler>,
    running: AtomicBool,
}

impl Shared {
    fn regenerate(&self) {
        let value = (self.sampler.lock())();
        let mut slot = self.slot.lock();
        slot.value = value;
        slot.iteration += 1;
        slot.create_timestamp = now_nanos();
    }
}

/// Owns the record slot and serves reads while a background thread
/// regenerates the record every interval.
///
/// The regeneration loop runs on a plain OS thread so the producer works
/// identically in-process, inside the pipe-protocol child process, and
/// inside the shared library, none of which carry an async runtime.
pub struct Producer {
    shared: Arc<Shared>,
    stop_tx: Mutex<Option<Sender<()>>>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl Producer {
    /// Create a producer with the default uniform random value source.
    pub fn new() -> Self {
        Self::with_sampler(Box::new(|| rand::thread_rng().gen_range(1.0..100.0)))
    }

    /// Create a producer with a custom value source.
    pub fn with_sampler(sampler: ValueSampler) -> Self {
        Self {
            shared: Arc::new(Shared {
                slot: Mutex::new(DriverResult::empty()),
                interval: Mutex::new(DEFAULT_UPDATE_INTERVAL),
                sampler: Mutex::new(sampler),
                running: AtomicBool::new(false),
            }),
            stop_tx: Mutex::new(None),
            handle: Mutex::new(None),
        }
    }

    /// Set the regeneration interval.
    ///
    /// Idempotent with respect to the loop: calling while running only
    /// updates the interval, it never restarts the loop or resets the
    /// iteration counter. The loop picks the new interval up on its next
    /// cycle.
    pub fn connect(&self, interval: Duration) {
        *self.shared.interval.lock() = interval;
        tracing::debug!(interval_ms = interval.as_millis() as u64, "producer interval set");
    }

    /// Start the background regeneration loop. A no-op if already running.
    pub fn start(&self) {
        if self.shared.running.swap(true, Ordering::SeqCst) {
            return;
        }

        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let shared = self.shared.clone();
        let handle = std::thread::spawn(move || {
            loop {
                shared.regenerate();
                let interval = *shared.interval.lock();
                match stop_rx.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => continue,
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            }
            shared.running.store(false, Ordering::SeqCst);
        });

        *self.stop_tx.lock() = Some(stop_tx);
        *self.handle.lock() = Some(handle);
        tracing::debug!("producer regeneration loop started");
    }

    /// Read the current record.
    ///
    /// Stamps the slot's read timestamp first, then returns a snapshot, so
    /// the returned copy always carries a populated `read_timestamp`. After
    /// `disconnect()` this keeps returning the last regenerated state.
    pub fn read(&self) -> DriverResult {
        let mut slot = self.shared.slot.lock();
        slot.read_timestamp = now_nanos();
        *slot
    }

    /// Stop the regeneration loop and join the thread. A no-op if the loop
    /// is not running.
    pub fn disconnect(&self) {
        if let Some(stop_tx) = self.stop_tx.lock().take() {
            let _ = stop_tx.send(());
        }
        if let Some(handle) = self.handle.lock().take() {
            let _ = handle.join();
            tracing::debug!("producer regeneration loop stopped");
        }
    }

    /// Whether the regeneration loop is currently running.
    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::SeqCst)
    }
}

impl Default for Producer {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Producer {
    fn drop(&mut self) {
        self.disconnect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::thread;

    fn fast_producer() -> Producer {
        let producer = Producer::new();
        producer.connect(Duration::from_millis(1));
        producer
    }

    #[test]
    fn test_unstarted_read_returns_stamped_empty_record() {
        let producer = Producer::new();
        let record = producer.read();
        assert_eq!(record.iteration, 0);
        assert_eq!(record.create_timestamp, 0);
        assert!(record.is_read());
    }

    #[test]
    fn test_iteration_increases_while_running() {
        let producer = fast_producer();
        producer.start();
        thread::sleep(Duration::from_millis(20));

        let first = producer.read();
        thread::sleep(Duration::from_millis(20));
        let second = producer.read();

        assert!(first.iteration >= 1);
        assert!(second.iteration > first.iteration);
        assert!(second.read_timestamp > first.read_timestamp);

        producer.disconnect();
    }

    #[test]
    fn test_connect_while_running_does_not_reset() {
        let producer = fast_producer();
        producer.start();
        thread::sleep(Duration::from_millis(10));
        let before = producer.read().iteration;

        producer.connect(Duration::from_millis(2));
        thread::sleep(Duration::from_millis(20));
        let after = producer.read().iteration;

        assert!(producer.is_running());
        assert!(after > before, "iteration reset: {before} -> {after}");

        producer.disconnect();
    }

    #[test]
    fn test_disconnect_stops_loop_and_reads_still_work() {
        let producer = fast_producer();
        producer.start();
        thread::sleep(Duration::from_millis(10));
        producer.disconnect();
        assert!(!producer.is_running());

        let frozen = producer.read();
        thread::sleep(Duration::from_millis(10));
        let later = producer.read();

        assert_eq!(later.iteration, frozen.iteration);
        assert_eq!(later.create_timestamp, frozen.create_timestamp);
        assert!(later.read_timestamp > frozen.read_timestamp);
    }

    #[test]
    fn test_start_is_idempotent() {
        let producer = fast_producer();
        producer.start();
        producer.start();
        thread::sleep(Duration::from_millis(10));
        assert!(producer.is_running());
        producer.disconnect();
    }

    /// Concurrent reads must never observe an (iteration, create_timestamp)
    /// pair mixing two regenerations.
    #[test]
    fn test_no_tearing_under_concurrent_reads() {
        let producer = Arc::new(fast_producer());
        producer.start();

        let mut readers = Vec::new();
        for _ in 0..4 {
            let producer = producer.clone();
            readers.push(thread::spawn(move || {
                let mut seen = Vec::new();
                for _ in 0..200 {
                    let record = producer.read();
                    seen.push((record.iteration, record.create_timestamp));
                }
                seen
            }));
        }

        let mut by_iteration: HashMap<i64, i64> = HashMap::new();
        for reader in readers {
            for (iteration, create_ts) in reader.join().unwrap() {
                let entry = by_iteration.entry(iteration).or_insert(create_ts);
                assert_eq!(
                    *entry, create_ts,
                    "iteration {iteration} observed with two create timestamps"
                );
            }
        }

        producer.disconnect();
    }
}
