use std::time::{Duration, Instant};

/// Trailing-edge debounce: a burst of `schedule` calls fires once, `delay`
/// after the last call.
#[derive(Debug, Clone)]
pub struct Debounce {
    delay: Duration,
    deadline: Option<Instant>,
}

impl Debounce {
    pub fn new(delay: Duration) -> Self { Self { delay, deadline: None } }

    pub fn delay(&self) -> Duration { self.delay }

    /// Cancels any pending deadline and reschedules at `now + delay`.
    pub fn schedule(&mut self, now: Instant) { self.deadline = Some(now + self.delay); }

    pub fn cancel(&mut self) { self.deadline = None; }

    pub fn is_pending(&self) -> bool { self.deadline.is_some() }

    pub fn deadline(&self) -> Option<Instant> { self.deadline }

    /// Clears and reports a deadline that has passed.
    pub fn fire(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if deadline <= now => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    /// Clears and reports any pending deadline regardless of time.
    pub fn take(&mut self) -> bool { self.deadline.take().is_some() }
}
