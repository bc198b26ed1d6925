//! Pure pipeline stages
//!
//! Each stage folds one sample into its state and optionally yields an
//! output. Nothing here touches the clock; callers pass the sample's
//! event-time `Instant`.

use std::time::Duration;
use tokio::time::Instant;

/// Per-axis exponential low-pass separating the slow-moving gravity/bias
/// component from the dynamic acceleration of interest.
pub struct ExpSmoother {
    alpha: f32,
    gravity: [f32; 3],
}

impl ExpSmoother {
    pub fn new(alpha: f32) -> Self {
        Self {
            alpha,
            gravity: [0.0; 3],
        }
    }

    /// Fold one raw vector, returning the gravity-removed dynamic part.
    pub fn feed(&mut self, raw: [f32; 3]) -> [f32; 3] {
        let mut dynamic = [0.0; 3];
        for axis in 0..3 {
            self.gravity[axis] = self.alpha * self.gravity[axis] + (1.0 - self.alpha) * raw[axis];
            dynamic[axis] = raw[axis] - self.gravity[axis];
        }
        dynamic
    }
}

/// Emits only the inactive -> active transition, suppressing repeated
/// active samples until the state returns to inactive.
#[derive(Default)]
pub struct EdgeDetector {
    prev: bool,
}

impl EdgeDetector {
    /// Returns true iff this sample is a leading edge.
    pub fn feed(&mut self, active: bool) -> bool {
        let edge = active && !self.prev;
        self.prev = active;
        edge
    }
}

/// Event-time debounce: a candidate edge arms (or restarts) a deadline one
/// window in the future; the event is confirmed when the deadline elapses
/// with no further edge.
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

    /// Register a candidate edge at `now`, restarting the window.
    pub fn arm(&mut self, now: Instant) {
        self.deadline = Some(now + self.window);
    }

    /// Pending emission deadline, if armed.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Consume an elapsed deadline. Returns true when a pending event is
    /// confirmed at `now`.
    pub fn expire(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

/// Duration-based hysteresis: true only once its condition has held
/// continuously for the minimum duration.
pub struct DurationGate {
    min: Duration,
    since: Option<Instant>,
}

impl DurationGate {
    pub fn new(min: Duration) -> Self {
        Self { min, since: None }
    }

    /// Fold one observation of the condition at `now`.
    pub fn feed(&mut self, now: Instant, condition: bool) -> bool {
        if condition {
            let since = *self.since.get_or_insert(now);
            now.duration_since(since) >= self.min
        } else {
            self.since = None;
            false
        }
    }
}
