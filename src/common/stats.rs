//! Session statistics
//!
//! Counters are written concurrently by the pump loops and the traffic
//! services, and read at any time by the reporter. Every field is an
//! independent atomic; no cross-field consistency is promised.

use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

/// Shared statistics record for one session
#[derive(Debug)]
pub struct Stats {
    bytes_received: AtomicU64,
    bytes_sent: AtomicU64,
    pattern_length_in: AtomicUsize,
    pattern_length_out: AtomicUsize,
    started: Mutex<Instant>,
}

impl Default for Stats {
    fn default() -> Self {
        Self::new()
    }
}

impl Stats {
    /// Creates an empty record whose start time is now
    pub fn new() -> Self {
        Self {
            bytes_received: AtomicU64::new(0),
            bytes_sent: AtomicU64::new(0),
            pattern_length_in: AtomicUsize::new(0),
            pattern_length_out: AtomicUsize::new(0),
            started: Mutex::new(Instant::now()),
        }
    }

    /// Restarts the elapsed-time clock
    pub fn mark_start(&self) {
        if let Ok(mut started) = self.started.lock() {
            *started = Instant::now();
        }
    }

    #[inline]
    pub fn add_received(&self, bytes: usize) {
        self.bytes_received.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    #[inline]
    pub fn add_sent(&self, bytes: usize) {
        self.bytes_sent.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    /// Records the length of the last frame that passed verification
    #[inline]
    pub fn set_pattern_length_in(&self, length: usize) {
        self.pattern_length_in.store(length, Ordering::Relaxed);
    }

    /// Records the length of the last frame handed to the writer
    #[inline]
    pub fn set_pattern_length_out(&self, length: usize) {
        self.pattern_length_out.store(length, Ordering::Relaxed);
    }

    pub fn bytes_received(&self) -> u64 {
        self.bytes_received.load(Ordering::Relaxed)
    }

    pub fn bytes_sent(&self) -> u64 {
        self.bytes_sent.load(Ordering::Relaxed)
    }

    pub fn pattern_length_in(&self) -> usize {
        self.pattern_length_in.load(Ordering::Relaxed)
    }

    pub fn pattern_length_out(&self) -> usize {
        self.pattern_length_out.load(Ordering::Relaxed)
    }

    /// Time since the record was created or last restarted
    pub fn elapsed(&self) -> Duration {
        self.started
            .lock()
            .map(|started| started.elapsed())
            .unwrap_or_default()
    }

    /// Takes a point-in-time copy of every counter
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            bytes_received: self.bytes_received(),
            bytes_sent: self.bytes_sent(),
            pattern_length_in: self.pattern_length_in(),
            pattern_length_out: self.pattern_length_out(),
            elapsed: self.elapsed(),
        }
    }
}

/// Point-in-time copy of a [`Stats`] record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub bytes_received: u64,
    pub bytes_sent: u64,
    pub pattern_length_in: usize,
    pub pattern_length_out: usize,
    pub elapsed: Duration,
}

impl StatsSnapshot {
    /// Whole seconds elapsed, never less than one
    pub fn elapsed_secs(&self) -> u64 {
        self.elapsed.as_secs().max(1)
    }

    /// Average receive rate in bytes per second
    pub fn receive_rate(&self) -> u64 {
        self.bytes_received / self.elapsed_secs()
    }

    /// Average send rate in bytes per second
    pub fn send_rate(&self) -> u64 {
        self.bytes_sent / self.elapsed_secs()
    }
}
