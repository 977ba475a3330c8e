use glam::Vec3;
use pixelgrab_common::{ObjectId, Ray};

use crate::registry::ObjectRegistry;

/// Grab bookkeeping shared across all objects.
///
/// `grabbed` names the single held object, so "grabbing" and "exactly one
/// object held" cannot disagree.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct InteractionState {
    grabbed: Option<ObjectId>,
    grab_distance: f32,
}

impl InteractionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_grabbing(&self) -> bool {
        self.grabbed.is_some()
    }

    pub fn grabbed(&self) -> Option<ObjectId> {
        self.grabbed
    }

    /// Distance the held object is kept from the viewer. `None` while nothing
    /// is held.
    pub fn grab_distance(&self) -> Option<f32> {
        self.grabbed.map(|_| self.grab_distance)
    }
}

/// Per-frame inputs to the interaction step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepInput {
    /// Seconds since the previous frame. Not read by the grab logic.
    pub elapsed: f32,
    /// Facing ray from the viewer through the pointer.
    pub ray: Ray,
    pub grab_held: bool,
    /// Scroll-wheel movement this frame, in lines.
    pub scroll_delta: f32,
    pub viewer_position: Vec3,
}

/// Tunables for grab-distance control.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GrabPolicy {
    /// Distance change per scroll line.
    pub scroll_step: f32,
    /// Lower bound on the held distance. `None` leaves it unbounded, which lets
    /// a held box pass behind the viewer.
    pub min_distance: Option<f32>,
}

impl Default for GrabPolicy {
    fn default() -> Self {
        Self {
            scroll_step: 0.5,
            min_distance: None,
        }
    }
}

impl GrabPolicy {
    fn adjust(&self, distance: f32, scroll_delta: f32) -> f32 {
        let adjusted = distance + scroll_delta * self.scroll_step;
        match self.min_distance {
            Some(min) => adjusted.max(min),
            None => adjusted,
        }
    }
}

/// Transitions produced by a step, in the order they happened.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InteractionEvent {
    GrabStarted { id: ObjectId, distance: f32 },
    Released { id: ObjectId },
    Moved { id: ObjectId, from: Vec3, to: Vec3 },
}

/// Result of one interaction step.
#[derive(Debug, Clone, PartialEq)]
pub struct StepOutcome {
    pub state: InteractionState,
    pub events: Vec<InteractionEvent>,
}

/// Run one frame of picking and grab resolution.
///
/// Objects are visited in registry order. Every object's looked-at flag is
/// refreshed from the facing ray. A sighted object is then skipped if another
/// object is held; otherwise a released button frees it, and a held button
/// grabs it (first sighted object wins) and keeps it on the ray at the grab
/// distance, adjusted by scroll. An object the ray misses is left untouched,
/// including a held one.
///
/// The registry's grab flags are authoritative: a `state` that disagrees with
/// them is rebuilt from the registry before the objects are visited.
pub fn step(
    registry: &mut ObjectRegistry,
    state: InteractionState,
    input: &StepInput,
    policy: &GrabPolicy,
) -> StepOutcome {
    let mut state = reconcile(registry, state, input.viewer_position);
    let mut events = Vec::new();

    for (index, object) in registry.objects_mut().iter_mut().enumerate() {
        let id = ObjectId::from(index);
        let hit = object.bounds().intersects_ray(&input.ray);
        object.set_looked_at(hit);
        if !hit {
            continue;
        }

        if !object.is_grabbed() && state.is_grabbing() {
            continue;
        }

        if !input.grab_held {
            if object.is_grabbed() {
                object.set_grabbed(false);
                state.grabbed = None;
                tracing::debug!(%id, "grab released");
                events.push(InteractionEvent::Released { id });
            }
            continue;
        }

        if !object.is_grabbed() {
            object.set_grabbed(true);
            state.grabbed = Some(id);
            state.grab_distance = input.viewer_position.distance(object.position());
            tracing::debug!(%id, distance = state.grab_distance, "grab started");
            events.push(InteractionEvent::GrabStarted {
                id,
                distance: state.grab_distance,
            });
        }

        state.grab_distance = policy.adjust(state.grab_distance, input.scroll_delta);

        let from = object.position();
        let to = input.viewer_position + input.ray.direction * state.grab_distance;
        object.move_to(to);
        if from != to {
            tracing::trace!(%id, ?to, "held object moved");
            events.push(InteractionEvent::Moved { id, from, to });
        }
    }

    debug_assert_eq!(
        registry.grabbed_count(),
        usize::from(state.is_grabbing()),
        "grab flags out of sync with interaction state"
    );

    StepOutcome { state, events }
}

/// Pair `state` with the grab recorded in `registry`. A held box whose
/// distance is unknown is kept at its current distance from the viewer.
fn reconcile(
    registry: &ObjectRegistry,
    state: InteractionState,
    viewer: Vec3,
) -> InteractionState {
    let held = registry.grabbed();
    if held == state.grabbed {
        return state;
    }
    tracing::debug!(?held, stale = ?state.grabbed, "interaction state rebuilt from registry");
    match held.and_then(|id| registry.get(id).map(|o| (id, o.position()))) {
        Some((id, position)) => InteractionState {
            grabbed: Some(id),
            grab_distance: viewer.distance(position),
        },
        None => InteractionState::new(),
    }
}
