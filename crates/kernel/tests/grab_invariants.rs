//! Property tests for grab exclusivity across arbitrary input sequences.

use glam::Vec3;
use pixelgrab_common::{ObjectId, Ray};
use pixelgrab_kernel::{GrabPolicy, InteractionState, ObjectRegistry, StepInput, step};
use proptest::prelude::*;

#[derive(Debug, Clone)]
struct Frame {
    target: usize,
    jitter: (f32, f32),
    held: bool,
    scroll: f32,
}

fn frame_strategy(boxes: usize) -> impl Strategy<Value = Frame> {
    (
        0..boxes + 1,
        (-1.0f32..1.0, -1.0f32..1.0),
        any::<bool>(),
        -3.0f32..3.0,
    )
        .prop_map(|(target, jitter, held, scroll)| Frame {
            target,
            jitter,
            held,
            scroll,
        })
}

fn layout() -> Vec<Vec3> {
    vec![
        Vec3::new(0.0, 1.0, 0.0),
        Vec3::new(0.5, 1.0, 0.5),
        Vec3::new(-3.0, 2.0, 2.0),
        Vec3::new(4.0, 1.0, -5.0),
        Vec3::new(-5.0, 2.0, -1.0),
    ]
}

/// Aim at a box (with jitter so overlaps and near-misses happen), or at the sky
/// when `target` is out of range.
fn aim(reg: &ObjectRegistry, viewer: Vec3, frame: &Frame) -> Ray {
    let point = match reg.get(ObjectId::from(frame.target)) {
        Some(o) => o.position() + Vec3::new(frame.jitter.0, frame.jitter.1, 0.0),
        None => viewer + Vec3::Y,
    };
    Ray::towards(viewer, point)
}

proptest! {
    /// Property: never more than one grabbed box, and the state agrees with the flags.
    #[test]
    fn at_most_one_grabbed(frames in prop::collection::vec(frame_strategy(5), 1..80)) {
        let viewer = Vec3::new(10.0, 2.0, 10.0);
        let mut reg = ObjectRegistry::from_positions(layout());
        let mut state = InteractionState::new();
        let policy = GrabPolicy::default();

        for frame in &frames {
            let input = StepInput {
                elapsed: 1.0 / 60.0,
                ray: aim(&reg, viewer, frame),
                grab_held: frame.held,
                scroll_delta: frame.scroll,
                viewer_position: viewer,
            };
            state = step(&mut reg, state, &input, &policy).state;

            let grabbed: Vec<ObjectId> = reg
                .iter()
                .filter(|(_, o)| o.is_grabbed())
                .map(|(id, _)| id)
                .collect();
            prop_assert!(grabbed.len() <= 1);
            prop_assert_eq!(state.is_grabbing(), grabbed.len() == 1);
            prop_assert_eq!(state.grabbed(), grabbed.first().copied());
        }
    }

    /// Property: while the button stays held, the held box never changes.
    #[test]
    fn held_grab_is_never_stolen(frames in prop::collection::vec(frame_strategy(5), 1..60)) {
        let viewer = Vec3::new(10.0, 2.0, 10.0);
        let mut reg = ObjectRegistry::from_positions(layout());
        let policy = GrabPolicy::default();

        // Start by holding box 0.
        let start = StepInput {
            elapsed: 0.0,
            ray: Ray::towards(viewer, Vec3::new(0.0, 1.0, 0.0)),
            grab_held: true,
            scroll_delta: 0.0,
            viewer_position: viewer,
        };
        let mut state = step(&mut reg, InteractionState::new(), &start, &policy).state;
        let held = state.grabbed();
        prop_assert!(held.is_some());

        for frame in &frames {
            let input = StepInput {
                elapsed: 1.0 / 60.0,
                ray: aim(&reg, viewer, frame),
                grab_held: true,
                scroll_delta: frame.scroll,
                viewer_position: viewer,
            };
            state = step(&mut reg, state, &input, &policy).state;
            prop_assert_eq!(state.grabbed(), held);
        }
    }

    /// Property: bounds always track position exactly after a step.
    #[test]
    fn bounds_follow_position(frames in prop::collection::vec(frame_strategy(5), 1..40)) {
        let viewer = Vec3::new(10.0, 2.0, 10.0);
        let mut reg = ObjectRegistry::from_positions(layout());
        let mut state = InteractionState::new();
        let policy = GrabPolicy::default();

        for frame in &frames {
            let input = StepInput {
                elapsed: 1.0 / 60.0,
                ray: aim(&reg, viewer, frame),
                grab_held: frame.held,
                scroll_delta: frame.scroll,
                viewer_position: viewer,
            };
            state = step(&mut reg, state, &input, &policy).state;
            for (_, o) in reg.iter() {
                prop_assert_eq!(o.bounds().min, o.position() - Vec3::splat(0.5));
                prop_assert_eq!(o.bounds().max, o.position() + Vec3::splat(0.5));
            }
        }
    }
}

#[test]
fn release_then_same_ray_does_not_regrab() {
    let viewer = Vec3::new(0.0, 0.0, 10.0);
    let ray = Ray::new(viewer, Vec3::NEG_Z);
    let mut reg = ObjectRegistry::from_positions([Vec3::ZERO]);
    let policy = GrabPolicy::default();
    let frame = |held| StepInput {
        elapsed: 1.0 / 60.0,
        ray,
        grab_held: held,
        scroll_delta: 0.0,
        viewer_position: viewer,
    };

    let s = step(&mut reg, InteractionState::new(), &frame(true), &policy).state;
    let s = step(&mut reg, s, &frame(false), &policy).state;
    let s = step(&mut reg, s, &frame(false), &policy).state;
    assert!(!s.is_grabbing());
    assert_eq!(reg.grabbed_count(), 0);
    assert!(reg.get(ObjectId(0)).unwrap().is_looked_at());

    // Pressing again while still sighted grabs it afresh.
    let s = step(&mut reg, s, &frame(true), &policy).state;
    assert_eq!(s.grabbed(), Some(ObjectId(0)));
}

#[test]
fn ray_missing_every_box_changes_nothing() {
    let mut reg = ObjectRegistry::from_positions(layout());
    let viewer = Vec3::new(10.0, 2.0, 10.0);
    let input = StepInput {
        elapsed: 1.0 / 60.0,
        ray: Ray::new(viewer, Vec3::Y),
        grab_held: true,
        scroll_delta: 1.0,
        viewer_position: viewer,
    };
    let before: Vec<Vec3> = reg.iter().map(|(_, o)| o.position()).collect();
    let out = step(&mut reg, InteractionState::new(), &input, &GrabPolicy::default());

    assert!(reg.iter().all(|(_, o)| !o.is_looked_at() && !o.is_grabbed()));
    assert!(!out.state.is_grabbing());
    assert!(out.events.is_empty());
    let after: Vec<Vec3> = reg.iter().map(|(_, o)| o.position()).collect();
    assert_eq!(before, after);
}
