//! One-shot countdown deadline with at most one pending callback.

use std::time::{Duration, Instant};

/// Interval between countdown ticks.
pub const TICK: Duration = Duration::from_secs(1);

/// A cancellable one-shot timer.
///
/// Scheduling replaces any pending deadline, so there is never more than one
/// outstanding tick.
#[derive(Debug, Default, Clone)]
pub struct CountdownTimer {
    deadline: Option<Instant>,
}

impl CountdownTimer {
    /// Arm the timer to fire one [`TICK`] after `now`.
    pub fn schedule(&mut self, now: Instant) {
        self.deadline = Some(now + TICK);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    #[cfg(test)]
    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Consume the deadline if it has passed.
    pub fn fire(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    /// Time left until the pending deadline, if any.
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(now))
    }
}
