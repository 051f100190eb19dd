use std::time::{Duration, Instant};

/// [Stopwatch] measures wall clock time between laps.
///
/// Used to time level setup and to drive [crate::world::World::update] from a game loop.
pub struct Stopwatch {
    last: Instant,
}

impl Default for Stopwatch {
    fn default() -> Self {
        Self::new()
    }
}

impl Stopwatch {
    pub fn new() -> Self {
        Self {
            last: Instant::now(),
        }
    }

    pub fn lap(&mut self) -> Duration {
        let now = Instant::now();
        let diff = now.duration_since(self.last);
        self.last = now;
        diff
    }
}
