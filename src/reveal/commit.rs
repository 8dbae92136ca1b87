//! Commit Throttle: Decides when internal advancement becomes visible.
//!
//! The rate model advances an internal character count every frame; exposing
//! every single advance would thrash downstream renderers. Commits are
//! batched by time and by chunk size, and the committed boundary is snapped
//! backward to a word boundary so the screen never flickers a partial word
//! that gets completed a frame later. Final catch-up (internal reaches the
//! end of the source) always commits immediately.

use super::RevealConfig;
use std::time::Instant;
use unicode_segmentation::GraphemeCursor;

/// Whether the current frame's advancement should be externalized.
pub(super) fn should_commit(
    config: &RevealConfig,
    internal_chars: usize,
    committed_chars: usize,
    full_chars: usize,
    now: Instant,
    last_commit_at: Option<Instant>,
) -> bool {
    if internal_chars <= committed_chars {
        return false;
    }
    if internal_chars >= full_chars {
        // Final catch-up: no batching on completion.
        return true;
    }
    if internal_chars - committed_chars >= config.min_commit_chars {
        return true;
    }
    last_commit_at.is_none_or(|last| now.saturating_duration_since(last) >= config.commit_interval)
}

/// A snapped commit boundary, in both char and byte terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct CommitBoundary {
    pub(super) chars: usize,
    pub(super) byte: usize,
}

/// Snap a proposed commit boundary to the nearest word break.
///
/// Scans backward from the proposed boundary toward the previous committed
/// boundary for whitespace and snaps to just after it. If no whitespace
/// exists in range, or the proposal already reaches the end of the text,
/// the unsnapped boundary is committed — never stall waiting for a space.
/// The result additionally never splits an extended grapheme cluster.
pub(super) fn snap_boundary(
    text: &str,
    committed: CommitBoundary,
    proposed_chars: usize,
    full_chars: usize,
) -> CommitBoundary {
    debug_assert!(proposed_chars >= committed.chars);

    if proposed_chars >= full_chars {
        return CommitBoundary {
            chars: full_chars,
            byte: text.len(),
        };
    }

    let proposed_byte = byte_ahead(text, committed.byte, proposed_chars - committed.chars);
    let unsnapped = align_to_grapheme(
        text,
        CommitBoundary {
            chars: proposed_chars,
            byte: proposed_byte,
        },
        committed,
    );

    let segment = &text[committed.byte..unsnapped.byte];
    match segment
        .char_indices()
        .rev()
        .find(|(_, ch)| ch.is_whitespace())
    {
        Some((offset, ch)) => {
            let byte = committed.byte + offset + ch.len_utf8();
            let chars = committed.chars + text[committed.byte..byte].chars().count();
            CommitBoundary { chars, byte }
        }
        None => unsnapped,
    }
}

/// Walk `chars` characters forward from a known byte offset.
pub(super) fn byte_ahead(text: &str, from_byte: usize, chars: usize) -> usize {
    text[from_byte..]
        .char_indices()
        .nth(chars)
        .map_or(text.len(), |(offset, _)| from_byte + offset)
}

/// Pull a boundary back onto an extended-grapheme-cluster edge.
///
/// Char boundaries can fall inside a cluster (a skin-tone emoji, a combining
/// accent). Revealing such a prefix would display a different glyph than the
/// final text, so the boundary retreats to the previous cluster edge — but
/// never behind what is already committed.
fn align_to_grapheme(text: &str, boundary: CommitBoundary, floor: CommitBoundary) -> CommitBoundary {
    let mut cursor = GraphemeCursor::new(boundary.byte, text.len(), true);
    if cursor.is_boundary(text, 0).unwrap_or(true) {
        return boundary;
    }
    match cursor.prev_boundary(text, 0) {
        Ok(Some(byte)) if byte > floor.byte => CommitBoundary {
            chars: floor.chars + text[floor.byte..byte].chars().count(),
            byte,
        },
        _ => floor,
    }
}
