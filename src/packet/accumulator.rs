//! Packet Accumulator: Folds an ordered packet sequence into growing text.
//!
//! The caller hands over the *full* sequence seen so far on every update,
//! not just the new tail. The fold is incremental: only packets beyond the
//! previously processed count are scanned, unless a discontinuity forces a
//! full reset. Discontinuities are:
//!
//! - the sequence shrank (e.g. a regenerated transcript),
//! - the message identity token was replaced by a different one,
//! - a previously-seen identity token disappeared.
//!
//! [`PacketAccumulator::fold`] is side-effect free; callers that re-invoke
//! speculatively (render-then-commit hosts) persist the result with
//! [`PacketAccumulator::apply`] only once their own commit point is reached.

use super::{Packet, PacketError};
use serde_json::Value;

/// Result of folding a packet sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PacketUpdate {
    /// Concatenation of all text-bearing fragments.
    pub full_text: String,
    /// Number of packets folded into `full_text`.
    pub processed: usize,
    /// Identity token of the logical message, if one was seen.
    pub identity: Option<String>,
    /// Index of the packet that established the identity, if any. Folds
    /// re-read only this packet instead of rescanning settled history.
    pub identity_at: Option<usize>,
    /// Whether this update discarded previously accumulated text.
    pub was_reset: bool,
    /// Whether a stop packet has been seen.
    pub stop_seen: bool,
    /// Whether the final-answer section has been marked complete.
    pub section_done: bool,
}

/// Accumulates streamed packets into a single growing text.
#[derive(Debug, Default, Clone)]
pub struct PacketAccumulator {
    text: String,
    processed: usize,
    identity: Option<String>,
    identity_at: Option<usize>,
    stop_seen: bool,
    section_done: bool,
}

impl PacketAccumulator {
    /// Create an empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the accumulated text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Get the number of packets already folded in.
    pub const fn processed(&self) -> usize {
        self.processed
    }

    /// Get the identity token of the current logical message.
    pub fn identity(&self) -> Option<&str> {
        self.identity.as_deref()
    }

    /// Whether a stop packet has been seen for the current message.
    pub const fn stop_seen(&self) -> bool {
        self.stop_seen
    }

    /// Whether the final-answer section is complete for the current message.
    pub const fn section_done(&self) -> bool {
        self.section_done
    }

    /// Fold the full packet sequence seen so far, without mutating state.
    ///
    /// # Errors
    ///
    /// Fails fast with [`PacketError::MissingKind`] if any scanned packet
    /// lacks its discriminant; no partial text is produced for that update.
    pub fn fold(&self, packets: &[Value]) -> Result<PacketUpdate, PacketError> {
        let (incoming_identity, identity_at) = self.resolve_identity(packets)?;
        let was_reset = self.detect_reset(packets.len(), incoming_identity.as_deref());

        let (mut full_text, start, mut stop_seen, mut section_done) = if was_reset {
            tracing::trace!(
                processed = self.processed,
                incoming = packets.len(),
                prev_identity = ?self.identity,
                new_identity = ?incoming_identity,
                "packet discontinuity, resetting accumulated text"
            );
            (String::new(), 0, false, false)
        } else {
            (
                self.text.clone(),
                self.processed,
                self.stop_seen,
                self.section_done,
            )
        };

        for value in &packets[start.min(packets.len())..] {
            match Packet::from_value(value)? {
                Packet::TextStart { content, .. } | Packet::TextDelta { content } => {
                    full_text.push_str(&content);
                }
                Packet::Stop => stop_seen = true,
                Packet::SectionEnd => section_done = true,
                Packet::Other { .. } => {}
            }
        }

        Ok(PacketUpdate {
            full_text,
            processed: packets.len(),
            identity: incoming_identity,
            identity_at,
            was_reset,
            stop_seen,
            section_done,
        })
    }

    /// Persist a previously computed fold result.
    pub fn apply(&mut self, update: &PacketUpdate) {
        self.text.clone_from(&update.full_text);
        self.processed = update.processed;
        self.identity.clone_from(&update.identity);
        self.identity_at = update.identity_at;
        self.stop_seen = update.stop_seen;
        self.section_done = update.section_done;
    }

    /// Fold and immediately persist. Convenience for hosts that never
    /// re-invoke speculatively.
    ///
    /// # Errors
    ///
    /// Propagates any [`PacketError`] from [`PacketAccumulator::fold`]
    /// without touching state.
    pub fn update(&mut self, packets: &[Value]) -> Result<PacketUpdate, PacketError> {
        let update = self.fold(packets)?;
        self.apply(&update);
        Ok(update)
    }

    /// Locate the identity token without rescanning settled packets.
    ///
    /// The fast path re-reads only the remembered start-packet position. A
    /// full rescan happens only when the sequence shrank or the remembered
    /// slot no longer holds a start packet (prefix rewritten or rolled
    /// back); with no start packet seen yet, only the unscanned tail can
    /// contain one.
    fn resolve_identity(
        &self,
        packets: &[Value],
    ) -> Result<(Option<String>, Option<usize>), PacketError> {
        if packets.len() < self.processed {
            return find_identity(packets, 0);
        }
        if let Some(index) = self.identity_at {
            if let Some(value) = packets.get(index) {
                if let Packet::TextStart { id, .. } = Packet::from_value(value)? {
                    return Ok((id, Some(index)));
                }
            }
            return find_identity(packets, 0);
        }
        find_identity(packets, self.processed)
    }

    /// Evaluate the reset policy against an incoming sequence.
    fn detect_reset(&self, incoming_len: usize, incoming_identity: Option<&str>) -> bool {
        if incoming_len < self.processed {
            // Sequence shrank: the transcript was regenerated.
            return true;
        }
        match (self.identity.as_deref(), incoming_identity) {
            // A different non-empty token means a new logical message
            // started without the sequence shrinking.
            (Some(prev), Some(next)) => prev != next,
            // The token disappeared: the message was rolled back.
            (Some(_), None) => true,
            _ => false,
        }
    }
}

/// Scan for the first text-start packet at or after `from`, returning its
/// identity token and position.
///
/// Stops at the first text-bearing start packet; packets past it are not
/// examined here (the fold scans them). Empty tokens count as absent.
fn find_identity(
    packets: &[Value],
    from: usize,
) -> Result<(Option<String>, Option<usize>), PacketError> {
    for (index, value) in packets.iter().enumerate().skip(from) {
        if let Packet::TextStart { id, .. } = Packet::from_value(value)? {
            return Ok((id, Some(index)));
        }
    }
    Ok((None, None))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn start(id: &str, content: &str) -> Value {
        json!({ "kind": "text_start", "id": id, "content": content })
    }

    fn delta(content: &str) -> Value {
        json!({ "kind": "text_delta", "content": content })
    }

    #[test]
    fn test_incremental_append() {
        let mut acc = PacketAccumulator::new();

        let update = acc.update(&[start("m1", "Hel")]).unwrap();
        assert_eq!(update.full_text, "Hel");
        assert!(!update.was_reset);

        let update = acc
            .update(&[start("m1", "Hel"), delta("lo"), delta(" world")])
            .unwrap();
        assert_eq!(update.full_text, "Hello world");
        assert_eq!(update.processed, 3);
        assert_eq!(update.identity.as_deref(), Some("m1"));
        assert!(!update.was_reset);
    }

    #[test]
    fn test_non_text_packets_are_counted_but_ignored() {
        let mut acc = PacketAccumulator::new();
        let update = acc
            .update(&[
                json!({ "kind": "status", "value": "thinking" }),
                start("m1", "Hi"),
                json!({ "kind": "citation", "doc": 3 }),
                delta("!"),
            ])
            .unwrap();

        assert_eq!(update.full_text, "Hi!");
        assert_eq!(update.processed, 4);
    }

    #[test]
    fn test_sequence_shrink_resets() {
        let mut acc = PacketAccumulator::new();
        acc.update(&[start("m1", "one"), delta(" two")]).unwrap();

        let update = acc.update(&[start("m1", "fresh")]).unwrap();
        assert!(update.was_reset);
        assert_eq!(update.full_text, "fresh");
    }

    #[test]
    fn identity_change_resets_rather_than_concatenates() {
        // Known limitation pinned by this test: a wholesale-replaced
        // transcript with a new identity is treated as a new message even
        // when the replacement is the same length or longer.
        let mut acc = PacketAccumulator::new();
        acc.update(&[start("m1", "Hi")]).unwrap();

        let update = acc.update(&[start("m2", "Bye")]).unwrap();
        assert!(update.was_reset);
        assert_eq!(update.full_text, "Bye");
        assert_eq!(update.identity.as_deref(), Some("m2"));
    }

    #[test]
    fn test_late_start_packet_establishes_identity() {
        let mut acc = PacketAccumulator::new();
        let status = json!({ "kind": "status", "value": "thinking" });

        let update = acc.update(&[status.clone()]).unwrap();
        assert_eq!(update.identity, None);
        assert_eq!(update.identity_at, None);

        // The start packet arrives after non-text preamble.
        let update = acc.update(&[status.clone(), start("m1", "Hi")]).unwrap();
        assert_eq!(update.identity.as_deref(), Some("m1"));
        assert_eq!(update.identity_at, Some(1));
        assert!(!update.was_reset);

        // Later folds keep resolving from the remembered position.
        let update = acc
            .update(&[status, start("m1", "Hi"), delta("!")])
            .unwrap();
        assert_eq!(update.full_text, "Hi!");
        assert_eq!(update.identity_at, Some(1));
        assert!(!update.was_reset);
    }

    #[test]
    fn test_identity_disappearing_resets() {
        let mut acc = PacketAccumulator::new();
        acc.update(&[start("m1", "Hi")]).unwrap();

        let update = acc.update(&[delta("Hi"), delta(" again")]).unwrap();
        assert!(update.was_reset);
        assert_eq!(update.full_text, "Hi again");
        assert_eq!(update.identity, None);
    }

    #[test]
    fn test_malformed_packet_produces_no_partial_text() {
        let mut acc = PacketAccumulator::new();
        acc.update(&[start("m1", "ok")]).unwrap();

        let err = acc
            .update(&[start("m1", "ok"), json!({ "content": "no kind" })])
            .unwrap_err();
        assert_eq!(err, PacketError::MissingKind);

        // State is untouched by the failed update.
        assert_eq!(acc.text(), "ok");
        assert_eq!(acc.processed(), 1);
    }

    #[test]
    fn test_fold_is_side_effect_free() {
        let acc = PacketAccumulator::new();
        let packets = [start("m1", "Hi")];

        let first = acc.fold(&packets).unwrap();
        let second = acc.fold(&packets).unwrap();
        assert_eq!(first, second);
        assert_eq!(acc.text(), "");
        assert_eq!(acc.processed(), 0);
    }

    #[test]
    fn test_stop_and_section_flags() {
        let mut acc = PacketAccumulator::new();
        let update = acc
            .update(&[
                start("m1", "Answer"),
                json!({ "kind": "section_end" }),
                json!({ "kind": "stop" }),
            ])
            .unwrap();

        assert!(update.section_done);
        assert!(update.stop_seen);

        // Flags reset with the text on discontinuity.
        let update = acc.update(&[start("m2", "Next")]).unwrap();
        assert!(!update.section_done);
        assert!(!update.stop_seen);
    }
}
