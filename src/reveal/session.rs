//! Reveal Session: The per-message reveal accumulator.
//!
//! A session owns the reveal state for one logical message. It tracks a
//! growing source text plus a "stream done" flag, and advances an internal
//! revealed length once per frame according to a two-speed rate model:
//! steady typing pace while streaming normally, fast-forward once the
//! producer has finished or fallen far behind the display. The externally
//! visible committed length lags the internal one under the commit
//! throttle's batching policy.
//!
//! Frames are driven by the host: call [`RevealSession::on_frame`] with a
//! monotonic timestamp while [`RevealSession::needs_frame`] is true. The
//! session never reads the wall clock itself.

use super::commit::{self, CommitBoundary};
use super::RevealConfig;
use std::time::{Duration, Instant};

/// How a source update related to the previous text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceChange {
    /// Identical text (flags may still have changed).
    Unchanged,
    /// The new text extends the old one; reveal continues where it was.
    Appended,
    /// The text got shorter; revealed lengths clamp down, never to zero.
    Truncated,
    /// The new text does not start with the old one: a new logical message.
    /// Reveal state resets (to zero when enabled, to full when disabled).
    Replaced,
}

/// Result of one frame tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameOutcome {
    /// Whether the externally visible text changed this frame.
    pub committed: bool,
    /// Whether the committed text now covers the full source.
    pub caught_up: bool,
    /// Whether another frame should be scheduled. When false, the loop goes
    /// idle until the source grows again.
    pub schedule_next: bool,
}

/// Frames-only reveal bookkeeping. One per active session.
#[derive(Debug, Clone)]
struct RevealState {
    /// Characters produced by the rate model so far.
    internal_chars: usize,
    /// Committed boundary most recently exposed to the caller.
    committed: CommitBoundary,
    /// Sub-character remainder carried across frames, so low rates do not
    /// accumulate rounding bias.
    fractional_carry: f64,
    /// Cleared whenever the schedule (re)starts, so the first frame after a
    /// gap does not apply a huge elapsed-time jump.
    last_frame_at: Option<Instant>,
    last_commit_at: Option<Instant>,
    /// Whether the previous frame used the catch-up rate (for tracing).
    catch_up_active: bool,
}

impl RevealState {
    const fn zero() -> Self {
        Self {
            internal_chars: 0,
            committed: CommitBoundary { chars: 0, byte: 0 },
            fractional_carry: 0.0,
            last_frame_at: None,
            last_commit_at: None,
            catch_up_active: false,
        }
    }
}

/// Time-paced disclosure of a growing text buffer.
#[derive(Debug, Clone)]
pub struct RevealSession {
    config: RevealConfig,
    enabled: bool,
    full_text: String,
    full_chars: usize,
    done: bool,
    state: RevealState,
}

impl RevealSession {
    /// Create a session with the given pacing configuration.
    pub fn new(config: RevealConfig) -> Self {
        Self {
            enabled: config.enabled,
            config,
            full_text: String::new(),
            full_chars: 0,
            done: false,
            state: RevealState::zero(),
        }
    }

    /// The committed prefix of the source text.
    pub fn revealed_text(&self) -> &str {
        &self.full_text[..self.state.committed.byte]
    }

    /// Whether the committed text covers the full source.
    pub const fn is_caught_up(&self) -> bool {
        self.state.committed.chars >= self.full_chars
    }

    /// Whether the host should keep scheduling frames.
    pub const fn needs_frame(&self) -> bool {
        self.enabled && self.state.internal_chars < self.full_chars
    }

    /// Source length in characters.
    pub const fn full_chars(&self) -> usize {
        self.full_chars
    }

    /// Characters that have arrived but are not yet internally revealed.
    pub const fn backlog_chars(&self) -> usize {
        self.full_chars - self.state.internal_chars
    }

    /// Whether the stream has been marked finished.
    pub const fn is_done(&self) -> bool {
        self.done
    }

    /// Turn timed reveal on or off.
    ///
    /// Disabling exposes the full current text immediately and stops the
    /// frame loop. Idempotent in both directions.
    pub fn set_enabled(&mut self, enabled: bool) {
        if self.enabled == enabled {
            return;
        }
        self.enabled = enabled;
        if !enabled {
            self.expose_all();
        }
    }

    /// Replace the source text and done flag, applying reset semantics.
    ///
    /// Truncation clamps revealed lengths down to the new length; a prefix
    /// mismatch is treated as a new logical message and resets reveal state.
    /// Returns how the update related to the previous source.
    pub fn set_source(&mut self, text: &str, done: bool) -> SourceChange {
        self.done = done;

        if !self.enabled {
            // Disabled mode always shows everything immediately.
            let change = classify(&self.full_text, text);
            self.replace_text(text);
            self.expose_all();
            return change;
        }

        let change = classify(&self.full_text, text);
        match change {
            SourceChange::Unchanged => {}
            SourceChange::Appended => {
                let was_idle = !self.needs_frame();
                self.replace_text(text);
                if was_idle && self.needs_frame() {
                    // Schedule restarts: forget the old frame timestamp so
                    // the idle gap is not counted as elapsed time.
                    self.state.last_frame_at = None;
                }
            }
            SourceChange::Truncated => {
                self.replace_text(text);
                self.clamp_to_source();
                tracing::trace!(full_chars = self.full_chars, "source truncated, clamping reveal");
            }
            SourceChange::Replaced => {
                self.replace_text(text);
                self.state = RevealState::zero();
                tracing::trace!(full_chars = self.full_chars, "source replaced, resetting reveal");
            }
        }
        self.check_invariant();
        change
    }

    /// Run one frame of the rate model.
    ///
    /// Only meaningful while enabled; a disabled session reports caught-up
    /// and asks for no further frames.
    pub fn on_frame(&mut self, now: Instant) -> FrameOutcome {
        if !self.enabled {
            return FrameOutcome {
                committed: false,
                caught_up: true,
                schedule_next: false,
            };
        }

        let backlog = self.backlog_chars();
        if backlog == 0 {
            // Idle until the source grows again; the next set_source call
            // restarts the schedule.
            self.state.last_frame_at = None;
            return FrameOutcome {
                committed: false,
                caught_up: self.is_caught_up(),
                schedule_next: false,
            };
        }

        let elapsed = self
            .state
            .last_frame_at
            .map_or(Duration::ZERO, |last| now.saturating_duration_since(last))
            .min(self.config.max_frame_elapsed);
        self.state.last_frame_at = Some(now);

        // Two-speed model: fast-forward once the producer has finished or
        // fallen far behind the display (inclusive threshold).
        let catch_up =
            self.done || backlog >= self.config.backlog_catch_up_threshold_chars;
        if catch_up != self.state.catch_up_active {
            self.state.catch_up_active = catch_up;
            tracing::trace!(catch_up, backlog, done = self.done, "reveal rate changed");
        }
        let rate = if catch_up {
            self.config.catch_up_chars_per_second
        } else {
            self.config.base_chars_per_second
        };

        let ideal = elapsed.as_secs_f64().mul_add(rate, self.state.fractional_carry);
        let bounded = ideal.min(to_f64(self.config.max_chars_per_frame));
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let advance = (bounded.floor().max(0.0) as usize).max(self.config.min_chars_per_frame);
        self.state.fractional_carry = (bounded - to_f64(advance)).max(0.0);

        self.state.internal_chars = (self.state.internal_chars + advance).min(self.full_chars);

        let committed = self.maybe_commit(now);

        let schedule_next = self.state.internal_chars < self.full_chars;
        if !schedule_next {
            self.state.last_frame_at = None;
        }

        self.check_invariant();
        FrameOutcome {
            committed,
            caught_up: self.is_caught_up(),
            schedule_next,
        }
    }

    /// Externalize the internal length if the commit policy allows it.
    fn maybe_commit(&mut self, now: Instant) -> bool {
        if !commit::should_commit(
            &self.config,
            self.state.internal_chars,
            self.state.committed.chars,
            self.full_chars,
            now,
            self.state.last_commit_at,
        ) {
            return false;
        }

        let boundary = commit::snap_boundary(
            &self.full_text,
            self.state.committed,
            self.state.internal_chars,
            self.full_chars,
        );
        if boundary.chars <= self.state.committed.chars {
            return false;
        }
        self.state.committed = boundary;
        self.state.last_commit_at = Some(now);
        tracing::trace!(
            committed_chars = boundary.chars,
            internal_chars = self.state.internal_chars,
            full_chars = self.full_chars,
            "reveal commit"
        );
        true
    }

    /// Swap in new source text and refresh cached lengths.
    fn replace_text(&mut self, text: &str) {
        if self.full_text != text {
            self.full_text.clear();
            self.full_text.push_str(text);
            self.full_chars = text.chars().count();
        }
    }

    /// Jump both lengths to the end of the current text.
    fn expose_all(&mut self) {
        self.state.internal_chars = self.full_chars;
        self.state.committed = CommitBoundary {
            chars: self.full_chars,
            byte: self.full_text.len(),
        };
        self.state.fractional_carry = 0.0;
        self.state.last_frame_at = None;
    }

    /// Clamp revealed lengths to a shrunken source.
    fn clamp_to_source(&mut self) {
        if self.state.internal_chars > self.full_chars {
            self.state.internal_chars = self.full_chars;
        }
        if self.state.internal_chars >= self.full_chars {
            // The clamp can land past a lagging commit. Nothing is left for
            // the frame loop to schedule, so this is a final catch-up and
            // the remainder commits immediately.
            self.state.committed = CommitBoundary {
                chars: self.full_chars,
                byte: self.full_text.len(),
            };
            self.state.fractional_carry = 0.0;
        } else {
            // Same char count, possibly different bytes: re-derive.
            self.state.committed.byte =
                commit::byte_ahead(&self.full_text, 0, self.state.committed.chars);
        }
    }

    fn check_invariant(&self) {
        debug_assert!(self.state.committed.chars <= self.state.internal_chars);
        debug_assert!(self.state.internal_chars <= self.full_chars);
        debug_assert!(self.full_text.is_char_boundary(self.state.committed.byte));
    }
}

impl Default for RevealSession {
    fn default() -> Self {
        Self::new(RevealConfig::default())
    }
}

/// The append-only-growth predicate behind reset detection.
///
/// "Does not start with the previous text" is read as "new logical
/// message". This is a heuristic: a prefix edit that also extends the text
/// is indistinguishable from a replacement and resets too.
fn is_append_only_growth(prev: &str, next: &str) -> bool {
    next.starts_with(prev)
}

/// Classify a source update against the previous text.
fn classify(prev: &str, next: &str) -> SourceChange {
    if prev == next {
        SourceChange::Unchanged
    } else if is_append_only_growth(prev, next) {
        SourceChange::Appended
    } else if next.chars().count() < prev.chars().count() {
        SourceChange::Truncated
    } else {
        SourceChange::Replaced
    }
}

#[allow(clippy::cast_precision_loss)]
fn to_f64(value: usize) -> f64 {
    value as f64
}
