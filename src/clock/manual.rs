//! Manual Frames: A deterministic frame source for tests.
//!
//! Drives the pipeline with fabricated timestamps so pacing behavior can be
//! asserted without sleeping on real time.

use super::ticker::FrameTick;
use std::time::{Duration, Instant};

/// A deterministic clock that fabricates frame ticks on demand.
///
/// Every call to [`ManualFrames::tick`] advances the synthetic clock by the
/// given delta and returns the corresponding [`FrameTick`]. Time never moves
/// unless the test says so.
#[derive(Debug, Clone)]
pub struct ManualFrames {
    now: Instant,
    frame: u64,
}

impl ManualFrames {
    /// Create a manual frame source anchored at the current instant.
    ///
    /// The anchor only matters as an origin; all subsequent timestamps are
    /// derived from explicit deltas.
    pub fn new() -> Self {
        Self {
            now: Instant::now(),
            frame: 0,
        }
    }

    /// Get the current synthetic timestamp.
    pub const fn now(&self) -> Instant {
        self.now
    }

    /// Advance the clock by `delta` and produce the resulting tick.
    pub fn tick(&mut self, delta: Duration) -> FrameTick {
        self.now += delta;
        self.frame += 1;
        FrameTick {
            frame: self.frame,
            at: self.now,
            delta,
        }
    }

    /// Advance the clock by `delta` without producing a tick.
    ///
    /// Models a scheduling gap (e.g. a suspended tab) between frames.
    pub fn skip(&mut self, delta: Duration) {
        self.now += delta;
    }
}

impl Default for ManualFrames {
    fn default() -> Self {
        Self::new()
    }
}
