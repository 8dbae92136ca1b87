//! Adaptive render interval for expensive downstream consumers.
//!
//! Markdown re-parsing cost grows with content size, and its value drops
//! while the display is far behind anyway. The interval therefore scales
//! from a fast ~16ms (small, caught-up content) to a slow ~80ms (large or
//! backlogged content), and collapses to zero once the stream is done so
//! the final frame renders immediately.

use std::time::Duration;

/// Interval at full pressure.
const SLOW: Duration = Duration::from_millis(80);
/// Interval at zero pressure (one 60Hz frame).
const FAST: Duration = Duration::from_millis(16);

/// Content length at or below which size adds no pressure.
const SMALL_TOTAL_CHARS: usize = 4_000;
/// Content length at which size pressure saturates.
const LARGE_TOTAL_CHARS: usize = 24_000;
/// Backlog at which backlog pressure saturates.
const LARGE_BACKLOG_CHARS: usize = 2_000;

/// Choose a markdown re-render interval for the current stream state.
///
/// `total_chars` is the full source length, `backlog_chars` how far the
/// reveal is behind. Returns [`Duration::ZERO`] once `done` so the final
/// text renders without throttling.
pub fn render_interval(total_chars: usize, backlog_chars: usize, done: bool) -> Duration {
    if done {
        return Duration::ZERO;
    }

    let size_pressure = ratio(
        total_chars.saturating_sub(SMALL_TOTAL_CHARS),
        LARGE_TOTAL_CHARS - SMALL_TOTAL_CHARS,
    );
    let backlog_pressure = ratio(backlog_chars, LARGE_BACKLOG_CHARS);
    let pressure = size_pressure.max(backlog_pressure);

    FAST + (SLOW - FAST).mul_f64(pressure)
}

/// Clamp `value / limit` to `0.0..=1.0`.
fn ratio(value: usize, limit: usize) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    let raw = value as f64 / limit as f64;
    raw.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_done_forces_immediate_rendering() {
        assert_eq!(render_interval(100_000, 50_000, true), Duration::ZERO);
    }

    #[test]
    fn test_small_caught_up_content_renders_fast() {
        assert_eq!(render_interval(500, 0, false), FAST);
    }

    #[test]
    fn test_large_content_renders_slow() {
        assert_eq!(render_interval(50_000, 0, false), SLOW);
    }

    #[test]
    fn test_backlog_alone_slows_rendering() {
        assert_eq!(render_interval(1_000, 5_000, false), SLOW);
    }

    #[test]
    fn test_interpolates_between_extremes() {
        let mid = render_interval(14_000, 0, false);
        assert!(mid > FAST && mid < SLOW, "got {mid:?}");
    }
}
