//! Packet Model: Typed view over the transport's streamed packets.
//!
//! The transport delivers an ordered sequence of loosely-shaped JSON values,
//! each discriminated by a `kind` field. Only the text-bearing kinds matter
//! for reveal; everything else is counted but otherwise ignored. A packet
//! with no `kind` at all is a contract violation and fails extraction hard —
//! the accumulator cannot safely guess packet semantics.

mod accumulator;

pub use accumulator::{PacketAccumulator, PacketUpdate};

use serde_json::Value;
use thiserror::Error;

/// Error raised when a transport packet cannot be interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PacketError {
    /// The packet has no `kind` discriminant (or a non-string one).
    ///
    /// This is a programmer/contract error on the transport side, not a
    /// recoverable runtime condition.
    #[error("packet is missing its `kind` discriminant")]
    MissingKind,
}

/// One interpreted transport packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Packet {
    /// First text-bearing packet of a logical message. Carries the message
    /// identity token (when the transport supplies one) and an initial
    /// content fragment.
    TextStart {
        /// Identity token of the logical message this text belongs to.
        id: Option<String>,
        /// Initial content fragment.
        content: String,
    },
    /// Subsequent text fragment of the current message.
    TextDelta {
        /// Content fragment to append.
        content: String,
    },
    /// The final-answer section of the message is complete.
    SectionEnd,
    /// The stream was stopped (possibly before any text was produced).
    Stop,
    /// Any other packet kind. Not text-bearing; still counted.
    Other {
        /// The discriminant the transport sent.
        kind: String,
    },
}

impl Packet {
    /// Interpret one raw transport value.
    ///
    /// Unknown kinds are accepted as [`Packet::Other`]; only a missing or
    /// non-string `kind` discriminant is an error. Text-bearing kinds with
    /// absent `content`/`id` fields degrade to empty content and no
    /// identity, matching the transport's loose duck typing.
    ///
    /// # Errors
    ///
    /// Returns [`PacketError::MissingKind`] when the value has no usable
    /// `kind` field.
    pub fn from_value(value: &Value) -> Result<Self, PacketError> {
        let kind = value
            .get("kind")
            .and_then(Value::as_str)
            .ok_or(PacketError::MissingKind)?;

        Ok(match kind {
            "text_start" => Self::TextStart {
                id: value
                    .get("id")
                    .and_then(Value::as_str)
                    .filter(|id| !id.is_empty())
                    .map(str::to_owned),
                content: field_text(value),
            },
            "text_delta" => Self::TextDelta {
                content: field_text(value),
            },
            "section_end" => Self::SectionEnd,
            "stop" => Self::Stop,
            other => Self::Other {
                kind: other.to_owned(),
            },
        })
    }

    /// Get the text fragment this packet contributes, if any.
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::TextStart { content, .. } | Self::TextDelta { content } => Some(content),
            _ => None,
        }
    }
}

/// Extract a `content` string field, defaulting to empty.
fn field_text(value: &Value) -> String {
    value
        .get("content")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_text_start_extraction() {
        let packet = Packet::from_value(&json!({
            "kind": "text_start",
            "id": "msg-1",
            "content": "Hello"
        }))
        .unwrap();

        assert_eq!(
            packet,
            Packet::TextStart {
                id: Some("msg-1".to_owned()),
                content: "Hello".to_owned(),
            }
        );
        assert_eq!(packet.text(), Some("Hello"));
    }

    #[test]
    fn test_empty_id_is_no_identity() {
        let packet = Packet::from_value(&json!({
            "kind": "text_start",
            "id": "",
            "content": "x"
        }))
        .unwrap();

        assert_eq!(
            packet,
            Packet::TextStart {
                id: None,
                content: "x".to_owned(),
            }
        );
    }

    #[test]
    fn test_unknown_kind_is_counted_not_text() {
        let packet = Packet::from_value(&json!({
            "kind": "tool_call",
            "name": "search"
        }))
        .unwrap();

        assert_eq!(
            packet,
            Packet::Other {
                kind: "tool_call".to_owned()
            }
        );
        assert_eq!(packet.text(), None);
    }

    #[test]
    fn test_missing_kind_is_a_hard_error() {
        let err = Packet::from_value(&json!({ "content": "orphan" })).unwrap_err();
        assert_eq!(err, PacketError::MissingKind);

        // Non-string discriminants are just as uninterpretable.
        let err = Packet::from_value(&json!({ "kind": 7 })).unwrap_err();
        assert_eq!(err, PacketError::MissingKind);
    }
}
