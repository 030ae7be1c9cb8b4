//! Diagnostics for a render.  The dispatcher never prints anything
//! itself; it tells a `Reporter` what is happening and the reporter
//! decides whether that goes anywhere.

use std::time::Duration;

/// Where the dispatcher is in its lifecycle.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Assignments are being planned and the buffer split up.
    Planning,
    /// Workers have been started.
    Running,
    /// Every worker has finished; the buffer is complete.
    Joined,
}

/// Receives progress from the dispatcher.  Hooks are called from the
/// worker threads themselves, so implementations must be `Sync`.  All
/// hooks default to doing nothing.
pub trait Reporter: Sync {
    /// The dispatcher moved into `phase`.
    fn phase(&self, _phase: Phase) {}

    /// Worker `thread_id` is about to compute its rows.
    fn worker_started(&self, _thread_id: usize) {}

    /// Worker `thread_id` finished its rows after `elapsed`.
    fn worker_finished(&self, _thread_id: usize, _elapsed: Duration) {}
}

/// Reports nothing.
#[derive(Copy, Clone, Debug, Default)]
pub struct Silent;

impl Reporter for Silent {}

/// Reports through the `log` facade: per-thread timings at info, the
/// rest at debug.
#[derive(Copy, Clone, Debug, Default)]
pub struct LogReporter;

impl Reporter for LogReporter {
    fn phase(&self, phase: Phase) {
        debug!("Dispatcher {:?}", phase);
    }

    fn worker_started(&self, thread_id: usize) {
        debug!("Hello world from thread {}", thread_id);
    }

    fn worker_finished(&self, thread_id: usize, elapsed: Duration) {
        info!("Thread {} took {} ms", thread_id, millis(elapsed));
    }
}

/// Whole milliseconds, as the timings are reported.
pub fn millis(elapsed: Duration) -> u64 {
    elapsed.as_secs() * 1000 + u64::from(elapsed.subsec_millis())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn millis_truncates() {
        assert_eq!(millis(Duration::from_micros(2_999)), 2);
        assert_eq!(millis(Duration::new(3, 250_000_000)), 3250);
    }

    #[test]
    fn reporters_accept_every_hook() {
        for reporter in &[&Silent as &dyn Reporter, &LogReporter] {
            reporter.phase(Phase::Planning);
            reporter.worker_started(0);
            reporter.worker_finished(0, Duration::from_millis(5));
            reporter.phase(Phase::Joined);
        }
    }
}
