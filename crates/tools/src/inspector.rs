use pixelgrab_common::ObjectId;
use pixelgrab_kernel::{InteractionState, ObjectRegistry};

/// Scene inspector for developer tooling.
///
/// Read-only queries over the registry and interaction state, shared by the
/// CLI and the desktop overlay.
pub struct SceneInspector;

impl SceneInspector {
    /// Produce a summary of the scene.
    pub fn summary(registry: &ObjectRegistry, state: &InteractionState) -> SceneSummary {
        SceneSummary {
            object_count: registry.len(),
            looked_at: registry.looked_at_count(),
            grabbed: state.grabbed(),
            grab_distance: state.grab_distance(),
        }
    }

    pub fn inspect_object(registry: &ObjectRegistry, id: ObjectId) -> Option<ObjectInfo> {
        registry.get(id).map(|object| {
            let bounds = object.bounds();
            ObjectInfo {
                id,
                position: object.position().to_array(),
                min: bounds.min.to_array(),
                max: bounds.max.to_array(),
                looked_at: object.is_looked_at(),
                grabbed: object.is_grabbed(),
            }
        })
    }

    /// Info for every object, in registry order.
    pub fn list_objects(registry: &ObjectRegistry) -> Vec<ObjectInfo> {
        registry
            .ids()
            .filter_map(|id| Self::inspect_object(registry, id))
            .collect()
    }
}

/// Summary of scene state for the inspector.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneSummary {
    pub object_count: usize,
    pub looked_at: usize,
    pub grabbed: Option<ObjectId>,
    pub grab_distance: Option<f32>,
}

impl std::fmt::Display for SceneSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Scene: boxes={} sighted={}",
            self.object_count, self.looked_at
        )?;
        match (self.grabbed, self.grab_distance) {
            (Some(id), Some(distance)) => write!(f, " grabbed={id} distance={distance:.2}"),
            _ => write!(f, " grabbed=none"),
        }
    }
}

/// Detailed info about a single box.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectInfo {
    pub id: ObjectId,
    pub position: [f32; 3],
    pub min: [f32; 3],
    pub max: [f32; 3],
    pub looked_at: bool,
    pub grabbed: bool,
}

impl std::fmt::Display for ObjectInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} pos=({:.2}, {:.2}, {:.2}) bounds=({:.2}, {:.2}, {:.2})..({:.2}, {:.2}, {:.2})",
            self.id,
            self.position[0],
            self.position[1],
            self.position[2],
            self.min[0],
            self.min[1],
            self.min[2],
            self.max[0],
            self.max[1],
            self.max[2],
        )?;
        if self.looked_at {
            write!(f, " sighted")?;
        }
        if self.grabbed {
            write!(f, " held")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use pixelgrab_common::Ray;
    use pixelgrab_kernel::{GrabPolicy, StepInput, step};

    fn grab_first(registry: &mut ObjectRegistry) -> InteractionState {
        let viewer = Vec3::new(0.0, 0.0, 10.0);
        let input = StepInput {
            elapsed: 0.0,
            ray: Ray::new(viewer, Vec3::NEG_Z),
            grab_held: true,
            scroll_delta: 0.0,
            viewer_position: viewer,
        };
        step(registry, InteractionState::new(), &input, &GrabPolicy::default()).state
    }

    #[test]
    fn summary_idle_scene() {
        let registry = ObjectRegistry::from_positions([Vec3::ZERO, Vec3::X * 3.0]);
        let summary = SceneInspector::summary(&registry, &InteractionState::new());
        assert_eq!(summary.object_count, 2);
        assert_eq!(summary.looked_at, 0);
        assert_eq!(summary.grabbed, None);
        assert_eq!(summary.grab_distance, None);
        assert_eq!(format!("{summary}"), "Scene: boxes=2 sighted=0 grabbed=none");
    }

    #[test]
    fn summary_while_holding() {
        let mut registry = ObjectRegistry::from_positions([Vec3::ZERO, Vec3::X * 3.0]);
        let state = grab_first(&mut registry);
        let summary = SceneInspector::summary(&registry, &state);
        assert_eq!(summary.grabbed, Some(ObjectId(0)));
        assert_eq!(summary.looked_at, 1);
        assert!(format!("{summary}").ends_with("grabbed=box#0 distance=10.00"));
    }

    #[test]
    fn inspect_object_found() {
        let registry = ObjectRegistry::from_positions([Vec3::new(1.0, 2.0, 3.0)]);
        let info = SceneInspector::inspect_object(&registry, ObjectId(0)).unwrap();
        assert_eq!(info.position, [1.0, 2.0, 3.0]);
        assert_eq!(info.min, [0.5, 1.5, 2.5]);
        assert_eq!(info.max, [1.5, 2.5, 3.5]);
        assert!(!info.grabbed);
    }

    #[test]
    fn inspect_object_not_found() {
        let registry = ObjectRegistry::from_positions([Vec3::ZERO]);
        assert!(SceneInspector::inspect_object(&registry, ObjectId(7)).is_none());
    }

    #[test]
    fn list_objects_in_registry_order() {
        let mut registry = ObjectRegistry::from_positions([Vec3::ZERO, Vec3::Y * 4.0]);
        grab_first(&mut registry);
        let infos = SceneInspector::list_objects(&registry);
        assert_eq!(infos.len(), 2);
        assert_eq!(infos[1].id, ObjectId(1));
        assert!(format!("{}", infos[0]).ends_with("sighted held"));
    }
}
