//! Pipeline: Packets in, smoothly revealed text out.
//!
//! Wires the pieces together for the common case of one streamed assistant
//! message: a [`PacketAccumulator`] turns the transport's packet sequence
//! into a growing source text, a [`RevealSession`] paces its disclosure,
//! and a [`ValueThrottle`] rate-limits the revealed text before it reaches
//! an expensive renderer (markdown parsing, highlighting). The pipeline
//! also owns completion detection: a caller-supplied callback fires exactly
//! once per logical message.
//!
//! Hosts feed the pipeline from two directions, never concurrently for the
//! same instance: [`StreamPipeline::update`] when new packets arrive, and
//! [`StreamPipeline::on_frame`] on every tick while
//! [`StreamPipeline::needs_frame`] holds.

use crate::packet::{PacketAccumulator, PacketError};
use crate::reveal::{FrameOutcome, RevealConfig, RevealSession, SourceChange};
use crate::throttle::{render_interval, ValueThrottle};
use serde_json::Value;
use std::time::Instant;

/// A complete packets-to-rendered-text reveal pipeline for one message
/// stream.
pub struct StreamPipeline {
    packets: PacketAccumulator,
    session: RevealSession,
    markdown: ValueThrottle<String>,
    /// Out-of-band "stream finished" flag from the transport.
    done: bool,
    completion_fired: bool,
    on_complete: Option<Box<dyn FnMut()>>,
}

impl StreamPipeline {
    /// Create a pipeline with the given reveal configuration.
    ///
    /// The markdown throttle interval is managed adaptively; see
    /// [`render_interval`].
    pub fn new(config: RevealConfig) -> Self {
        Self {
            packets: PacketAccumulator::new(),
            session: RevealSession::new(config),
            markdown: ValueThrottle::new(render_interval(0, 0, false)),
            done: false,
            completion_fired: false,
            on_complete: None,
        }
    }

    /// Register the completion callback.
    ///
    /// Fires at most once per logical message: when the final-answer
    /// section is complete and the reveal has caught up, or when the stream
    /// was stopped before producing any text. Re-arms automatically when a
    /// new logical message starts.
    pub fn set_on_complete(&mut self, callback: impl FnMut() + 'static) {
        self.on_complete = Some(Box::new(callback));
    }

    /// Feed the full packet sequence seen so far, plus the out-of-band
    /// stream-finished flag.
    ///
    /// # Errors
    ///
    /// Propagates [`PacketError`] from extraction; pipeline state is
    /// untouched on failure.
    pub fn update(
        &mut self,
        packets: &[Value],
        done: bool,
        now: Instant,
    ) -> Result<SourceChange, PacketError> {
        let update = self.packets.update(packets)?;
        if update.was_reset {
            // New logical message: the completion callback may fire again.
            self.completion_fired = false;
        }
        self.done = done;

        let change = self.session.set_source(&update.full_text, done);
        self.sync_markdown(now);
        self.maybe_fire_completion();
        Ok(change)
    }

    /// Run one frame: advance the reveal, refresh the markdown throttle,
    /// and check completion.
    pub fn on_frame(&mut self, now: Instant) -> FrameOutcome {
        let outcome = self.session.on_frame(now);
        if outcome.committed {
            self.sync_markdown(now);
        }
        self.markdown.poll(now);
        self.maybe_fire_completion();
        outcome
    }

    /// Turn timed reveal on or off (off shows everything immediately).
    pub fn set_enabled(&mut self, enabled: bool, now: Instant) {
        self.session.set_enabled(enabled);
        self.sync_markdown(now);
        self.maybe_fire_completion();
    }

    /// The committed (revealed) prefix of the streamed text.
    pub fn revealed_text(&self) -> &str {
        self.session.revealed_text()
    }

    /// The throttled variant of the revealed text, for expensive consumers.
    ///
    /// Lags [`StreamPipeline::revealed_text`] by at most the current render
    /// interval; converges to the full text once the stream finishes.
    pub fn throttled_text(&self) -> &str {
        self.markdown.value().map_or("", String::as_str)
    }

    /// Whether the revealed text covers everything that has arrived.
    pub const fn is_caught_up(&self) -> bool {
        self.session.is_caught_up()
    }

    /// Whether the host should keep scheduling frames.
    ///
    /// True while the reveal is behind or a trailing markdown emit is
    /// pending.
    pub fn needs_frame(&self) -> bool {
        self.session.needs_frame() || self.markdown.next_deadline().is_some()
    }

    /// Read-only access to the underlying reveal session.
    pub const fn session(&self) -> &RevealSession {
        &self.session
    }

    /// Cancel pending work at teardown. Idempotent.
    pub fn cancel(&mut self) {
        self.markdown.cancel();
    }

    /// Refresh the markdown throttle's interval and input.
    fn sync_markdown(&mut self, now: Instant) {
        self.markdown.set_interval(render_interval(
            self.session.full_chars(),
            self.session.backlog_chars(),
            self.done,
        ));
        let revealed = self.session.revealed_text();
        let already_current = self.markdown.value().map(String::as_str) == Some(revealed)
            && self.markdown.next_deadline().is_none();
        if !already_current {
            self.markdown.update(revealed.to_owned(), now);
        }
    }

    fn maybe_fire_completion(&mut self) {
        if self.completion_fired {
            return;
        }
        let answer_done = self.done || self.packets.section_done();
        let finished = answer_done && self.session.is_caught_up();
        // Empty-content abort: stopped before any text was produced.
        let empty_abort = self.packets.stop_seen() && self.packets.text().is_empty();
        if finished || empty_abort {
            self.completion_fired = true;
            tracing::trace!(empty_abort, "reveal pipeline complete");
            if let Some(callback) = self.on_complete.as_mut() {
                callback();
            }
        }
    }
}

impl Default for StreamPipeline {
    fn default() -> Self {
        Self::new(RevealConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualFrames;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::cell::Cell;
    use std::rc::Rc;
    use std::time::Duration;

    const FRAME: Duration = Duration::from_millis(16);

    fn start(id: &str, content: &str) -> Value {
        json!({ "kind": "text_start", "id": id, "content": content })
    }

    fn delta(content: &str) -> Value {
        json!({ "kind": "text_delta", "content": content })
    }

    fn counting_pipeline(config: RevealConfig) -> (StreamPipeline, Rc<Cell<u32>>) {
        let mut pipeline = StreamPipeline::new(config);
        let fired = Rc::new(Cell::new(0));
        let counter = fired.clone();
        pipeline.set_on_complete(move || counter.set(counter.get() + 1));
        (pipeline, fired)
    }

    fn run_to_idle(pipeline: &mut StreamPipeline, frames: &mut ManualFrames, max: usize) {
        for _ in 0..max {
            let tick = frames.tick(FRAME);
            pipeline.on_frame(tick.at);
            if !pipeline.needs_frame() {
                return;
            }
        }
        panic!("pipeline did not go idle within {max} frames");
    }

    #[test]
    fn test_disabled_reveal_shows_full_text_at_once() {
        let (mut pipeline, fired) = counting_pipeline(RevealConfig {
            enabled: false,
            ..RevealConfig::default()
        });
        let frames = ManualFrames::new();

        pipeline
            .update(&[start("m1", "Hello world")], true, frames.now())
            .unwrap();

        assert_eq!(pipeline.revealed_text(), "Hello world");
        assert!(pipeline.is_caught_up());
        assert!(!pipeline.needs_frame());
        assert_eq!(fired.get(), 1);
        // Done forces a zero render interval, so the throttle is current.
        assert_eq!(pipeline.throttled_text(), "Hello world");
    }

    #[test]
    fn test_completion_fires_exactly_once_after_catch_up() {
        let (mut pipeline, fired) = counting_pipeline(RevealConfig {
            base_chars_per_second: 10.0,
            ..RevealConfig::default()
        });
        let mut frames = ManualFrames::new();

        let packets = vec![start("m1", "The quick"), delta(" brown fox")];
        pipeline.update(&packets, false, frames.now()).unwrap();
        for _ in 0..5 {
            let tick = frames.tick(FRAME);
            pipeline.on_frame(tick.at);
        }
        assert!(!pipeline.is_caught_up());
        assert_eq!(fired.get(), 0);

        // Stream finishes with no further growth: fast catch-up, then the
        // callback fires exactly once.
        pipeline.update(&packets, true, frames.now()).unwrap();
        run_to_idle(&mut pipeline, &mut frames, 100);

        assert_eq!(pipeline.revealed_text(), "The quick brown fox");
        assert_eq!(pipeline.throttled_text(), "The quick brown fox");
        assert_eq!(fired.get(), 1);

        // Further idle frames never re-fire.
        let tick = frames.tick(FRAME);
        pipeline.on_frame(tick.at);
        assert_eq!(fired.get(), 1);
    }

    #[test]
    fn test_empty_content_abort_completes_immediately() {
        let (mut pipeline, fired) = counting_pipeline(RevealConfig::default());
        let frames = ManualFrames::new();

        pipeline
            .update(&[json!({ "kind": "stop" })], false, frames.now())
            .unwrap();

        assert_eq!(pipeline.revealed_text(), "");
        assert_eq!(fired.get(), 1);
    }

    #[test]
    fn test_completion_rearms_for_next_message() {
        let (mut pipeline, fired) = counting_pipeline(RevealConfig {
            base_chars_per_second: 10_000.0,
            ..RevealConfig::default()
        });
        let mut frames = ManualFrames::new();

        pipeline
            .update(&[start("m1", "first answer")], true, frames.now())
            .unwrap();
        run_to_idle(&mut pipeline, &mut frames, 50);
        assert_eq!(fired.get(), 1);

        // Wholesale replacement with a new identity: a new logical message.
        pipeline
            .update(&[start("m2", "second answer")], false, frames.now())
            .unwrap();
        assert_eq!(pipeline.revealed_text(), "");
        pipeline
            .update(&[start("m2", "second answer")], true, frames.now())
            .unwrap();
        run_to_idle(&mut pipeline, &mut frames, 50);

        assert_eq!(pipeline.revealed_text(), "second answer");
        assert_eq!(fired.get(), 2);
    }

    #[test]
    fn test_identity_change_replaces_not_concatenates() {
        let mut pipeline = StreamPipeline::new(RevealConfig {
            enabled: false,
            ..RevealConfig::default()
        });
        let frames = ManualFrames::new();

        pipeline
            .update(&[start("m1", "Hi")], false, frames.now())
            .unwrap();
        pipeline
            .update(&[start("m2", "Bye")], false, frames.now())
            .unwrap();

        assert_eq!(pipeline.revealed_text(), "Bye");
    }

    #[test]
    fn test_malformed_packet_propagates() {
        let mut pipeline = StreamPipeline::new(RevealConfig::default());
        let frames = ManualFrames::new();

        let err = pipeline
            .update(&[json!({ "content": "no kind" })], false, frames.now())
            .unwrap_err();
        assert_eq!(err, PacketError::MissingKind);
        assert_eq!(pipeline.revealed_text(), "");
    }

    #[test]
    fn test_section_end_packet_counts_as_answer_done() {
        let (mut pipeline, fired) = counting_pipeline(RevealConfig {
            base_chars_per_second: 10_000.0,
            ..RevealConfig::default()
        });
        let mut frames = ManualFrames::new();

        pipeline
            .update(
                &[start("m1", "done-ish"), json!({ "kind": "section_end" })],
                false,
                frames.now(),
            )
            .unwrap();
        run_to_idle(&mut pipeline, &mut frames, 50);

        assert_eq!(pipeline.revealed_text(), "done-ish");
        assert_eq!(fired.get(), 1);
    }

    #[test]
    fn test_throttled_text_lags_then_converges() {
        let mut pipeline = StreamPipeline::new(RevealConfig {
            catch_up_chars_per_second: 10_000.0,
            ..RevealConfig::default()
        });
        let mut frames = ManualFrames::new();

        // Big backlog: the render interval rises to its slow setting while
        // commits land every frame, so the throttle visibly lags.
        let text = "word ".repeat(1_000);
        let packets = vec![start("m1", &text)];
        pipeline.update(&packets, false, frames.now()).unwrap();

        let mut lagged = false;
        for _ in 0..200 {
            let tick = frames.tick(FRAME);
            pipeline.on_frame(tick.at);
            if pipeline.throttled_text() != pipeline.revealed_text() {
                lagged = true;
            }
            if !pipeline.needs_frame() {
                break;
            }
        }
        assert!(lagged, "throttle never lagged the reveal");

        pipeline.update(&packets, true, frames.now()).unwrap();
        run_to_idle(&mut pipeline, &mut frames, 100);
        assert_eq!(pipeline.throttled_text(), pipeline.revealed_text());
        assert_eq!(pipeline.throttled_text(), text);
    }
}
