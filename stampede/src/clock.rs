use std::time::{Duration, Instant};

/// Shared stopping boundary for a run.
///
/// Constructed once when the pool launches and copied to every virtual
/// user, so all workers race against the identical wall-clock boundary
/// regardless of their own startup jitter. Pure reads, no side effects.
#[derive(Clone, Copy, Debug)]
pub struct Deadline {
    start: Instant,
    end: Instant,
}

impl Deadline {
    pub fn after(duration: Duration) -> Self {
        let start = Instant::now();
        Self {
            start,
            end: start + duration,
        }
    }

    pub fn expired(&self) -> bool {
        Instant::now() >= self.end
    }

    pub fn remaining(&self) -> Duration {
        self.end.saturating_duration_since(Instant::now())
    }

    /// Wall-clock time since the run started.
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}
