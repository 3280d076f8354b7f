use crate::common::{Quitter, Stats, StatsSnapshot};
use std::fmt::Write as _;
use std::io::Write as _;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{Instant, interval_at};
use tracing::debug;

/// Formats a statistics snapshot as the report lines printed to stdout
///
/// ```
/// use nettest::common::StatsSnapshot;
/// use nettest::session::render_report;
/// use std::time::Duration;
///
/// let snapshot = StatsSnapshot {
///     bytes_received: 2048,
///     bytes_sent: 1024,
///     pattern_length_in: 4,
///     pattern_length_out: 5,
///     elapsed: Duration::from_secs(2),
/// };
///
/// assert_eq!(
///     render_report(&snapshot, true),
///     "Pattern Length : IN|OUT : 4 | 5\n\
///      Bytes : IN|OUT : 2048 | 1024\n\
///      Speed (B/s) : IN|OUT : 1024 | 512\n"
/// );
/// ```
pub fn render_report(snapshot: &StatsSnapshot, include_pattern: bool) -> String {
    let mut out = String::new();
    if include_pattern {
        let _ = writeln!(
            out,
            "Pattern Length : IN|OUT : {} | {}",
            snapshot.pattern_length_in, snapshot.pattern_length_out
        );
    }
    let _ = writeln!(
        out,
        "Bytes : IN|OUT : {} | {}",
        snapshot.bytes_received, snapshot.bytes_sent
    );
    let _ = writeln!(
        out,
        "Speed (B/s) : IN|OUT : {} | {}",
        snapshot.receive_rate(),
        snapshot.send_rate()
    );
    out
}

/// Prints periodic and final statistics for a session
#[derive(Debug, Clone)]
pub struct Reporter {
    stats: Arc<Stats>,
    include_pattern: bool,
}

impl Reporter {
    pub fn new(stats: Arc<Stats>, include_pattern: bool) -> Self {
        Self {
            stats,
            include_pattern,
        }
    }

    /// Current report text
    pub fn render(&self) -> String {
        render_report(&self.stats.snapshot(), self.include_pattern)
    }

    /// Writes the current report to stdout
    pub fn print(&self) {
        let report = self.render();
        let mut stdout = std::io::stdout().lock();
        if let Err(e) = stdout.write_all(report.as_bytes()).and_then(|_| stdout.flush()) {
            debug!(error = %e, "Failed to write report");
        }
    }

    /// Prints a report every `interval` until quit, or just waits for quit
    /// when the interval is zero
    pub async fn run_until_quit(&self, quitter: &Quitter, interval: Duration) {
        if interval.is_zero() {
            quitter.wait().await;
            return;
        }

        let mut ticker = interval_at(Instant::now() + interval, interval);
        loop {
            tokio::select! {
                biased;
                _ = quitter.wait() => break,
                _ = ticker.tick() => self.print(),
            }
        }
    }
}
