use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Master timer shared by every worker of an `optimize` run (spec §5).
///
/// Carries a user-settable time limit and an atomic end flag. Any worker
/// that proves optimality (a bound meets the current best) may set the flag;
/// every worker polls [`Timer::needs_to_end`] inside hot loops and between
/// tree-search levels. Cloning a `Timer` shares the same end flag and start
/// instant, mirroring the role of `aries_solver::signals::Synchro` as a
/// cheaply-clonable communication handle.
#[derive(Clone)]
pub struct Timer {
    start: Instant,
    time_limit: Option<Duration>,
    end: Arc<AtomicBool>,
}

impl Timer {
    pub fn new(time_limit: Option<Duration>) -> Self {
        Timer {
            start: Instant::now(),
            time_limit,
            end: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn unlimited() -> Self {
        Timer::new(None)
    }

    /// `true` once either the time limit has elapsed or the end flag has
    /// been set by some worker (e.g. after proving optimality).
    pub fn needs_to_end(&self) -> bool {
        if self.end.load(Ordering::Relaxed) {
            return true;
        }
        match self.time_limit {
            Some(limit) => self.start.elapsed() >= limit,
            None => false,
        }
    }

    /// Sets the end flag. Idempotent, callable from any worker thread.
    pub fn stop(&self) {
        self.end.store(true, Ordering::Relaxed);
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    pub fn remaining(&self) -> Option<Duration> {
        self.time_limit.map(|l| l.saturating_sub(self.start.elapsed()))
    }
}

impl Default for Timer {
    fn default() -> Self {
        Timer::unlimited()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unlimited_timer_never_ends_until_stopped() {
        let t = Timer::unlimited();
        assert!(!t.needs_to_end());
        t.stop();
        assert!(t.needs_to_end());
    }

    #[test]
    fn shared_clone_observes_stop() {
        let t = Timer::unlimited();
        let clone = t.clone();
        clone.stop();
        assert!(t.needs_to_end());
    }

    #[test]
    fn expired_time_limit_ends() {
        let t = Timer::new(Some(Duration::from_millis(1)));
        std::thread::sleep(Duration::from_millis(5));
        assert!(t.needs_to_end());
    }
}
