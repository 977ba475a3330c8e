//! Per-frame input: platform events accumulate into an [`InputState`], and
//! each frame takes one [`FrameInput`] snapshot from it.
//!
//! # Invariants
//! - Scroll accumulates between frames and is consumed exactly once.
//! - Button state is level-triggered: it reflects the last press or release seen.

pub mod frame;

pub use frame::{FrameInput, InputState, PIXELS_PER_LINE};
