//! wgpu render backend for pixelgrab.
//!
//! Draws the grid floor and instanced boxes into a low-resolution offscreen
//! canvas, stretches it over the window with nearest filtering, then draws
//! the crosshair at full resolution.
//!
//! # Invariants
//! - Renderer never mutates the registry or interaction state.
//! - Camera motion is NOT part of the interaction kernel.

mod camera;
mod gpu;
mod shaders;
mod target;

pub use camera::FirstPersonCamera;
pub use gpu::WgpuRenderer;
pub use target::{CANVAS_FORMAT, DEPTH_FORMAT, OffscreenTarget};
