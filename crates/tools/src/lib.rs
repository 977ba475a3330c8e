//! Developer tooling: read-only scene inspection.
//!
//! # Invariants
//! - Tools never mutate the registry or interaction state.

mod inspector;

pub use inspector::{ObjectInfo, SceneInspector, SceneSummary};
