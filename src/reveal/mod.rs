//! Reveal: Time-paced disclosure of a growing text buffer.
//!
//! The central algorithm of the crate. A [`RevealSession`] exposes a
//! committed prefix of its source text, advancing at a configurable pace
//! independent of how often the source itself grows:
//!
//! - a two-speed rate model (steady typing pace, fast catch-up once the
//!   stream finishes or backlog passes a threshold) with fractional carry
//!   so low rates stay accurate across frames;
//! - a commit throttle that batches externally visible updates by time and
//!   chunk size, snapping commit boundaries to word breaks so partial words
//!   never flicker on screen.

mod commit;
mod config;
mod session;

pub use config::RevealConfig;
pub use session::{FrameOutcome, RevealSession, SourceChange};
