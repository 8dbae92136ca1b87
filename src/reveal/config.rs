//! Configuration for the reveal accumulator and commit throttle.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Pacing configuration for a reveal session.
///
/// Rates are expressed in characters per second; per-frame bounds in
/// characters. All lengths throughout the crate count `char`s, not bytes.
///
/// Deserializes with per-field defaults, so host config files only need to
/// name the settings they override.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RevealConfig {
    /// Steady "typing" pace while the stream is still producing.
    pub base_chars_per_second: f64,
    /// Fast-forward pace once the stream finishes or falls far behind.
    /// Should be much larger than the base rate.
    pub catch_up_chars_per_second: f64,
    /// Backlog size (inclusive) at which the catch-up rate kicks in even
    /// though the stream has not finished.
    pub backlog_catch_up_threshold_chars: usize,
    /// Upper bound on characters revealed in a single frame.
    pub max_chars_per_frame: usize,
    /// Lower bound on characters revealed in a single frame. Zero lets the
    /// fractional carry pace rates below one character per frame; raise it
    /// to force visible progress on every frame.
    pub min_chars_per_frame: usize,
    /// Clamp on per-frame elapsed time, so a frame arriving after a long
    /// scheduling gap (suspended tab) does not apply a huge jump at once.
    pub max_frame_elapsed: Duration,
    /// Minimum time between externally visible commits.
    pub commit_interval: Duration,
    /// Uncommitted backlog that forces a commit before the interval expires.
    pub min_commit_chars: usize,
    /// Whether timed reveal is on. When off, the full text is exposed
    /// immediately and no frame loop runs.
    pub enabled: bool,
}

impl Default for RevealConfig {
    fn default() -> Self {
        Self {
            base_chars_per_second: 80.0,
            catch_up_chars_per_second: 1200.0,
            backlog_catch_up_threshold_chars: 240,
            max_chars_per_frame: 120,
            min_chars_per_frame: 0,
            max_frame_elapsed: Duration::from_millis(250),
            commit_interval: Duration::from_millis(100),
            min_commit_chars: 60,
            enabled: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: RevealConfig =
            serde_json::from_str(r#"{ "base_chars_per_second": 40.0, "enabled": false }"#)
                .unwrap();

        assert!((config.base_chars_per_second - 40.0).abs() < f64::EPSILON);
        assert!(!config.enabled);
        // Everything unnamed keeps its default.
        let defaults = RevealConfig::default();
        assert_eq!(config.max_chars_per_frame, defaults.max_chars_per_frame);
        assert_eq!(config.commit_interval, defaults.commit_interval);
    }
}
