use std::time::Duration;

/// Consecutive empty polls per back-off step.
pub const IDLE_STEP_POLLS: u32 = 10;
/// Upper bound for any idle sleep.
pub const MAX_IDLE_SLEEP: Duration = Duration::from_secs(30);

/// Staircase back-off for an idle queue.
///
/// The n-th consecutive empty poll (1-based) sleeps
/// `base * (1 + (n - 1) / IDLE_STEP_POLLS)`, capped at [`MAX_IDLE_SLEEP`].
/// Finding a job resets the staircase to the base interval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdleBackoff {
    base: Duration,
    idle_polls: u32,
}

impl IdleBackoff {
    pub fn new(base: Duration) -> Self {
        Self {
            base,
            idle_polls: 0,
        }
    }

    pub fn idle_polls(&self) -> u32 {
        self.idle_polls
    }

    /// The sleep the next empty poll would get.
    pub fn current_interval(&self) -> Duration {
        let step = 1 + self.idle_polls / IDLE_STEP_POLLS;
        self.base.saturating_mul(step).min(MAX_IDLE_SLEEP)
    }

    /// Records an empty poll and returns how long to sleep for it.
    pub fn on_empty_poll(&mut self) -> Duration {
        let interval = self.current_interval();
        self.idle_polls = self.idle_polls.saturating_add(1);
        interval
    }

    pub fn on_job(&mut self) {
        self.idle_polls = 0;
    }
}
