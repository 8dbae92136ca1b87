//! Frame Clock: Timing sources that drive the reveal loop.
//!
//! The reveal pipeline is frame-driven: all pacing decisions happen inside
//! a per-frame callback fed with a monotonic timestamp. This module provides
//! the two frame sources:
//!
//! - [`FrameTicker`]: a dedicated thread that emits [`FrameTick`] events at a
//!   fixed interval over a channel, for real hosts.
//! - [`ManualFrames`]: a deterministic clock that fabricates ticks on demand,
//!   for tests and benchmarks.
//!
//! Sessions never read the wall clock themselves; they take the tick's
//! timestamp as an argument. That keeps every pacing decision reproducible
//! under a fake clock.

mod manual;
mod ticker;

pub use manual::ManualFrames;
pub use ticker::{FrameTick, FrameTicker};
