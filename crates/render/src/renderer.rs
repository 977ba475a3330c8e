use glam::Vec3;
use pixelgrab_kernel::{InteractionState, ObjectRegistry};

/// Camera/view configuration for rendering.
#[derive(Debug, Clone, Copy)]
pub struct RenderView {
    /// Camera position in world space.
    pub eye: Vec3,
    /// Point the camera is looking at.
    pub target: Vec3,
    /// Vertical field of view in degrees.
    pub fov_degrees: f32,
}

impl Default for RenderView {
    fn default() -> Self {
        Self {
            eye: Vec3::new(10.0, 2.0, 10.0),
            target: Vec3::ZERO,
            fov_degrees: 60.0,
        }
    }
}

/// Read-only view of everything a frame draws.
#[derive(Debug, Clone, Copy)]
pub struct SceneRef<'a> {
    pub registry: &'a ObjectRegistry,
    pub interaction: &'a InteractionState,
}

/// Renderer-agnostic interface.
///
/// A renderer reads the scene and a view and produces output. It never
/// mutates either.
pub trait Renderer {
    /// The output type produced by this renderer.
    type Output;

    /// Render one frame from the given scene and view.
    fn render(&self, scene: SceneRef<'_>, view: &RenderView) -> Self::Output;
}

/// Human-readable dump of the scene, for the CLI, logs and tests.
#[derive(Debug, Default)]
pub struct DebugTextRenderer;

impl DebugTextRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl Renderer for DebugTextRenderer {
    type Output = String;

    fn render(&self, scene: SceneRef<'_>, view: &RenderView) -> String {
        let mut out = String::new();
        let grab = match (scene.interaction.grabbed(), scene.interaction.grab_distance()) {
            (Some(id), Some(distance)) => format!("{id} @ {distance:.2}"),
            _ => "none".to_string(),
        };
        out.push_str(&format!(
            "=== Scene (boxes={}, grabbed={}) ===\n",
            scene.registry.len(),
            grab
        ));
        out.push_str(&format!(
            "Viewer: eye=({:.1}, {:.1}, {:.1}) target=({:.1}, {:.1}, {:.1}) fov={:.0}\n",
            view.eye.x,
            view.eye.y,
            view.eye.z,
            view.target.x,
            view.target.y,
            view.target.z,
            view.fov_degrees
        ));

        for (id, object) in scene.registry.iter() {
            let p = object.position();
            out.push_str(&format!("  [{id}] pos=({:.2}, {:.2}, {:.2})", p.x, p.y, p.z));
            if object.is_looked_at() {
                out.push_str(" sighted");
            }
            if object.is_grabbed() {
                out.push_str(" held");
            }
            out.push('\n');
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pixelgrab_common::Ray;
    use pixelgrab_kernel::{GrabPolicy, StepInput, step};

    #[test]
    fn debug_renderer_idle_scene() {
        let registry = ObjectRegistry::from_positions([Vec3::ZERO, Vec3::new(1.0, 2.0, 3.0)]);
        let interaction = InteractionState::new();
        let output = DebugTextRenderer::new().render(
            SceneRef {
                registry: &registry,
                interaction: &interaction,
            },
            &RenderView::default(),
        );

        assert!(output.contains("boxes=2"));
        assert!(output.contains("grabbed=none"));
        assert!(output.contains("[box#1] pos=(1.00, 2.00, 3.00)\n"));
        assert!(!output.contains("held"));
    }

    #[test]
    fn debug_renderer_marks_held_box() {
        let mut registry = ObjectRegistry::from_positions([Vec3::ZERO]);
        let viewer = Vec3::new(0.0, 0.0, 10.0);
        let input = StepInput {
            elapsed: 0.0,
            ray: Ray::new(viewer, Vec3::NEG_Z),
            grab_held: true,
            scroll_delta: 0.0,
            viewer_position: viewer,
        };
        let interaction = step(
            &mut registry,
            InteractionState::new(),
            &input,
            &GrabPolicy::default(),
        )
        .state;

        let output = DebugTextRenderer::new().render(
            SceneRef {
                registry: &registry,
                interaction: &interaction,
            },
            &RenderView::default(),
        );
        assert!(output.contains("grabbed=box#0 @ 10.00"));
        assert!(output.contains("sighted held"));
    }

    #[test]
    fn render_view_default() {
        let view = RenderView::default();
        assert_eq!(view.fov_degrees, 60.0);
        assert_eq!(view.target, Vec3::ZERO);
    }
}
