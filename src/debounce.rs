//! Trailing-edge debouncer driven by caller-supplied instants.

use std::time::{Duration, Instant};

/// Coalesces bursts of events: [`Debouncer::poll`] fires once the quiet
/// window has passed since the last [`Debouncer::trigger`].
#[derive(Debug, Clone)]
pub struct Debouncer {
    window: Duration,
    deadline: Option<Instant>,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            deadline: None,
        }
    }

    /// Record an event, pushing the deadline back.
    pub fn trigger(&mut self, now: Instant) {
        self.deadline = Some(now + self.window);
    }

    /// True exactly once per burst, when the window has elapsed.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MS: Duration = Duration::from_millis(1);

    #[test]
    fn burst_fires_once() {
        let t0 = Instant::now();
        let mut d = Debouncer::new(150 * MS);
        d.trigger(t0);
        d.trigger(t0 + 100 * MS);
        assert!(!d.poll(t0 + 200 * MS));
        assert!(d.poll(t0 + 250 * MS));
        assert!(!d.poll(t0 + 400 * MS));
    }

    #[test]
    fn idle_never_fires() {
        let mut d = Debouncer::new(150 * MS);
        assert!(!d.poll(Instant::now()));
        assert!(!d.is_pending());
    }

    #[test]
    fn cancel_drops_pending_event() {
        let t0 = Instant::now();
        let mut d = Debouncer::new(150 * MS);
        d.trigger(t0);
        d.cancel();
        assert!(!d.poll(t0 + 200 * MS));
    }
}
