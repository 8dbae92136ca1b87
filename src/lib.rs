//! # Unspool
//!
//! A smooth text-reveal engine for token-streaming chat UIs.
//!
//! Unspool decouples the irregular arrival cadence of streamed assistant
//! text from a steady, human-readable reveal rate, manages catch-up under
//! backlog, and throttles expensive downstream rendering independently of
//! the reveal itself.
//!
//! ## Core Concepts
//!
//! - **Packet accumulation**: transport packets fold into one growing text,
//!   with reset-on-discontinuity detection
//! - **Two-speed reveal**: steady typing pace while streaming, fast-forward
//!   once the producer finishes or falls far behind
//! - **Batched commits**: internal advancement is per-frame, visible
//!   updates are interval-batched and word-snapped
//! - **Trailing-edge throttle**: renderers see at most one change per
//!   interval, and always end up with the latest value
//!
//! ## Example
//!
//! ```rust,ignore
//! use unspool::{RevealConfig, StreamPipeline};
//!
//! let mut pipeline = StreamPipeline::new(RevealConfig::default());
//! pipeline.update(&packets, false, now)?;
//! while pipeline.needs_frame() {
//!     // one call per animation frame
//!     pipeline.on_frame(now);
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod clock;
pub mod packet;
pub mod pipeline;
pub mod reveal;
pub mod throttle;

// Re-exports for convenience
pub use clock::{FrameTick, FrameTicker, ManualFrames};
pub use packet::{Packet, PacketAccumulator, PacketError, PacketUpdate};
pub use pipeline::StreamPipeline;
pub use reveal::{FrameOutcome, RevealConfig, RevealSession, SourceChange};
pub use throttle::{render_interval, ValueThrottle};
