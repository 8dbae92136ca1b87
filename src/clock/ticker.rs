//! Frame Ticker: Dedicated thread for generating frame events.
//!
//! This is the host-side analogue of an animation-frame scheduler. It emits
//! a [`FrameTick`] at a fixed interval and never lets ticks queue up: if the
//! consumer falls behind, ticks are dropped and the next delivered tick
//! simply carries a larger delta. The reveal loop clamps elapsed time, so a
//! dropped tick degrades into a slightly faster catch-up, never an error.

use crossbeam_channel::{bounded, Receiver, Sender};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// A frame event delivered at (approximately) regular intervals.
#[derive(Debug, Clone, Copy)]
pub struct FrameTick {
    /// Frame number (monotonically increasing).
    pub frame: u64,
    /// Timestamp of this tick. Pass this to `RevealSession::on_frame`.
    pub at: Instant,
    /// Time elapsed since the previous delivered tick.
    pub delta: Duration,
}

/// A frame source running on its own thread.
pub struct FrameTicker {
    /// Handle to the ticker thread.
    handle: Option<JoinHandle<()>>,
    /// Flag to signal shutdown.
    shutdown: Arc<AtomicBool>,
    /// Receiver for frame events.
    tick_rx: Receiver<FrameTick>,
    /// Configured tick interval.
    interval: Duration,
}

impl FrameTicker {
    /// Spawn a new frame ticker with the given interval.
    ///
    /// An `interval` of 16ms approximates a 60Hz display refresh.
    ///
    /// # Panics
    ///
    /// Panics if the OS fails to spawn the ticker thread.
    #[allow(clippy::missing_panics_doc)]
    pub fn spawn(interval: Duration) -> Self {
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_clone = shutdown.clone();

        // Bounded channel with a tiny buffer: stale frames are worthless,
        // so a slow consumer drops ticks instead of queueing them.
        let (tick_tx, tick_rx) = bounded(2);

        let handle = thread::Builder::new()
            .name("unspool-frames".to_string())
            .spawn(move || {
                Self::run_loop(&tick_tx, &shutdown_clone, interval);
            })
            .expect("Failed to spawn frame ticker thread");

        Self {
            handle: Some(handle),
            shutdown,
            tick_rx,
            interval,
        }
    }

    /// Get a reference to the tick receiver.
    ///
    /// Use this with `select!` to interleave frames with input:
    ///
    /// ```ignore
    /// loop {
    ///     select! {
    ///         recv(packets_rx) -> packets => pipeline.update(&packets?, false)?,
    ///         recv(ticker.receiver()) -> tick => {
    ///             pipeline.on_frame(tick?.at);
    ///         }
    ///     }
    /// }
    /// ```
    #[inline]
    pub const fn receiver(&self) -> &Receiver<FrameTick> {
        &self.tick_rx
    }

    /// Get the configured tick interval.
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Signal the ticker to shut down.
    ///
    /// Idempotent: calling this on an already-stopped ticker is a no-op.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }

    /// Wait for the ticker thread to finish.
    pub fn join(mut self) {
        self.shutdown();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }

    /// Main ticker loop.
    fn run_loop(tick_tx: &Sender<FrameTick>, shutdown: &Arc<AtomicBool>, interval: Duration) {
        let mut frame = 0u64;
        let mut last_sent = Instant::now();
        let mut next_tick = last_sent + interval;

        loop {
            if shutdown.load(Ordering::Relaxed) {
                break;
            }

            let now = Instant::now();
            if now >= next_tick {
                let tick = FrameTick {
                    frame,
                    at: now,
                    delta: now - last_sent,
                };

                // Non-blocking send: if the buffer is full the consumer is
                // behind, so skip this tick rather than queueing it. The
                // next delivered tick carries the accumulated delta.
                if tick_tx.try_send(tick).is_ok() {
                    last_sent = now;
                }

                frame += 1;
                next_tick += interval;

                // If we fell behind the schedule, realign instead of
                // bursting a backlog of ticks.
                if next_tick < now {
                    next_tick = now + interval;
                }
            } else {
                let sleep_duration = next_tick - now;
                thread::sleep(sleep_duration.min(Duration::from_millis(1)));
            }
        }
    }
}

impl Drop for FrameTicker {
    fn drop(&mut self) {
        self.shutdown();
    }
}
