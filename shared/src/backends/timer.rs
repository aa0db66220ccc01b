use std::time::{Duration, Instant};

/// Rings once `duration` has passed since it was created or last reset
pub struct Timer {
    duration: Duration,
    last: Instant,
}

impl Timer {
    pub fn new(duration: Duration) -> Self {
        Self {
            last: Instant::now(),
            duration,
        }
    }

    pub fn reset(&mut self) {
        self.last = Instant::now();
    }

    pub fn ringing(&self) -> bool {
        self.last.elapsed() >= self.duration
    }
}
