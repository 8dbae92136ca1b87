//! Value Throttle: Trailing-edge rate limiting for changing values.
//!
//! Downstream consumers of revealed text (markdown parsing, syntax
//! highlighting) are far more expensive than the reveal itself, so their
//! input is rate-limited separately: at most one observed change per
//! interval, with the latest value always eventually winning.
//!
//! The throttle is cooperative, like the rest of the pipeline: instead of
//! owning a timer thread, it records the due time of a deferred emit and
//! the host fires it by calling [`ValueThrottle::poll`]. The host learns
//! when to poll from [`ValueThrottle::next_deadline`].

mod adaptive;

pub use adaptive::render_interval;

use std::time::{Duration, Instant};

/// A trailing-edge rate limiter for an arbitrarily-typed changing value.
///
/// Updates that arrive too soon after the last emit are deferred, not
/// dropped: the pending value is always kept current, and the scheduled
/// trailing emit picks up whatever is pending when it fires.
#[derive(Debug, Clone)]
pub struct ValueThrottle<T> {
    interval: Duration,
    last_emitted_at: Option<Instant>,
    pending: Option<T>,
    /// Due time of the scheduled trailing emit, if any.
    scheduled_at: Option<Instant>,
    current: Option<T>,
}

impl<T> ValueThrottle<T> {
    /// Create a throttle with the given minimum interval between emits.
    ///
    /// A zero interval disables throttling: every update emits immediately.
    pub const fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_emitted_at: None,
            pending: None,
            scheduled_at: None,
            current: None,
        }
    }

    /// Get the most recently emitted value.
    pub const fn value(&self) -> Option<&T> {
        self.current.as_ref()
    }

    /// Get the configured interval.
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Change the interval.
    ///
    /// Takes effect on the next update or poll; setting zero makes the next
    /// poll flush any pending value immediately.
    pub fn set_interval(&mut self, interval: Duration) {
        self.interval = interval;
    }

    /// Record a new input value. Returns `true` if it emitted immediately.
    ///
    /// If the interval has not elapsed since the last emit, the value is
    /// held as pending and a trailing emit is scheduled (unless one already
    /// is; the existing one will pick up this value when it fires).
    pub fn update(&mut self, value: T, now: Instant) -> bool {
        self.pending = Some(value);

        if self.interval.is_zero() {
            // Throttling disabled: emit now, drop any scheduled emit.
            self.scheduled_at = None;
            self.emit(now);
            return true;
        }

        match self.last_emitted_at {
            Some(last) if now.saturating_duration_since(last) < self.interval => {
                if self.scheduled_at.is_none() {
                    self.scheduled_at = Some(last + self.interval);
                }
                false
            }
            _ => {
                // A trailing emit scheduled before the interval elapsed is
                // stale now; it must not fire on top of this fresh one.
                self.scheduled_at = None;
                self.emit(now);
                true
            }
        }
    }

    /// Fire a due trailing emit. Returns `true` if a value was emitted.
    ///
    /// The cooperative analogue of a timer callback: hosts call this when
    /// [`ValueThrottle::next_deadline`] passes (calling early or late is
    /// harmless).
    pub fn poll(&mut self, now: Instant) -> bool {
        if self.interval.is_zero() {
            if self.pending.is_some() {
                self.scheduled_at = None;
                self.emit(now);
                return true;
            }
            return false;
        }
        match self.scheduled_at {
            Some(due) if now >= due => {
                self.scheduled_at = None;
                self.emit(now);
                true
            }
            _ => false,
        }
    }

    /// When the host should next call [`ValueThrottle::poll`], if ever.
    pub const fn next_deadline(&self) -> Option<Instant> {
        self.scheduled_at
    }

    /// Cancel any scheduled trailing emit.
    ///
    /// Idempotent; safe to call on an already-fired or never-scheduled
    /// throttle. Used at teardown so nothing emits after the consumer
    /// stops observing.
    pub fn cancel(&mut self) {
        self.scheduled_at = None;
    }

    fn emit(&mut self, now: Instant) {
        if let Some(value) = self.pending.take() {
            self.current = Some(value);
            self.last_emitted_at = Some(now);
        }
    }
}
