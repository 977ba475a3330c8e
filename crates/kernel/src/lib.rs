//! Scene kernel: the fixed object registry and the per-frame interaction step.
//!
//! # Invariants
//! - Objects are created once; the registry never grows or shrinks.
//! - `position` and `bounds` change together through `ObjectRegistry::reposition`.
//! - At most one object is grabbed, and `InteractionState::grabbed` names it.
//! - The interaction step owns no hidden state: it takes the state by value and returns it.

pub mod interaction;
pub mod registry;

pub use interaction::{
    GrabPolicy, InteractionEvent, InteractionState, StepInput, StepOutcome, step,
};
pub use registry::{GrabbableObject, KernelError, ObjectRegistry};
