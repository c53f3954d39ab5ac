use std::time::{Duration, Instant};

/// Measures how long an operation takes.
pub trait Timer {
    /// Run `op`, returning its output along with the time it took.
    fn time<T>(&mut self, op: impl FnOnce() -> T) -> (T, Duration);
}

/// Brackets the operation with two reads of the monotonic clock, so the duration is never
/// negative.
#[derive(Debug, Default, Clone, Copy)]
pub struct MonotonicTimer;

impl Timer for MonotonicTimer {
    fn time<T>(&mut self, op: impl FnOnce() -> T) -> (T, Duration) {
        let started = Instant::now();
        let output = op();
        (output, started.elapsed())
    }
}
