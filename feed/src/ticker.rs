use tokio::time::{Duration, Interval};

/// A pause/resume-capable periodic tick source.
///
/// Unlike a cancellation token that tears a task down, pausing a
/// `Ticker` only stops it from firing: the Feed loop's `select!` arm
/// that awaits `tick()` is guarded by `!paused`, so a paused ticker
/// never wakes its task at all — this is what gives an idle Feed its
/// zero-CPU steady state.
pub struct Ticker {
    interval: Interval,
    paused: bool,
}

impl Ticker {
    pub fn new(period: Duration) -> Self {
        let mut interval = tokio::time::interval(period);
        // The first tick from `interval()` fires immediately; consume it
        // so a freshly-created Feed doesn't flush an empty buffer.
        interval.reset();

        Self {
            interval,
            paused: false,
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Idempotent.
    pub fn pause(&mut self) {
        self.paused = true;
    }

    /// Idempotent.
    pub fn start(&mut self) {
        self.paused = false;
    }

    /// Resolves on the next tick. Only meant to be awaited from inside a
    /// `select!` arm guarded by `if !ticker.is_paused()` — polling this
    /// directly while paused would still busy-wait on the underlying
    /// `Interval`.
    pub async fn tick(&mut self) {
        self.interval.tick().await;
    }
}
