//! Time sources for the countdown engine.
//!
//! The engine never reads the wall clock directly: it asks a [`Clock`] for
//! "now" in milliseconds since the Unix epoch. Periodic ticks come from
//! tokio's timer, so a paused tokio runtime drives both deterministically
//! when the engine uses [`TokioClock`].

use std::time::{SystemTime, UNIX_EPOCH};

use tokio::time::Instant;

/// Provider of the current wall-clock time.
pub trait Clock: Send + Sync {
    /// Returns milliseconds since the Unix epoch.
    fn now_millis(&self) -> i64;
}

/// Wall clock backed by [`SystemTime`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_millis() as i64)
            .unwrap_or_default()
    }
}

/// Epoch-anchored clock that advances with [`tokio::time::Instant`].
///
/// Under `#[tokio::test(start_paused = true)]` it only moves when the test
/// advances tokio time.
#[derive(Debug, Clone, Copy)]
pub struct TokioClock {
    epoch_millis: i64,
    anchor: Instant,
}

impl TokioClock {
    /// Anchors the clock to the current system time.
    pub fn new() -> Self {
        Self::starting_at(SystemClock.now_millis())
    }

    /// Anchors the clock to an explicit epoch timestamp.
    pub fn starting_at(epoch_millis: i64) -> Self {
        Self {
            epoch_millis,
            anchor: Instant::now(),
        }
    }
}

impl Default for TokioClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for TokioClock {
    fn now_millis(&self) -> i64 {
        self.epoch_millis + self.anchor.elapsed().as_millis() as i64
    }
}
