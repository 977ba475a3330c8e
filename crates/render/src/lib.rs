//! Rendering Adapter: renderer-agnostic interface.
//!
//! # Invariants
//! - Renderers read object state; they never mutate the registry or the
//!   interaction state.
//! - The scene is drawn into a canvas `downscale` times smaller than the
//!   display, then stretched over it; overlays are drawn at display resolution.
//! - Object appearance flows through an [`AppearancePolicy`], so visual
//!   feedback for sighted or held boxes can change without touching the backend.

mod appearance;
mod layout;
mod renderer;

pub use appearance::{AppearancePolicy, Color, CubeStyle, FlatAppearance, HighlightAppearance};
pub use layout::{CanvasLayout, LayoutError, Rect, TargetOrigin};
pub use renderer::{DebugTextRenderer, RenderView, Renderer, SceneRef};

pub fn crate_info() -> &'static str {
    "pixelgrab-render v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("render"));
    }
}
