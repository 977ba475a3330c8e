//! Shared types and geometry for the pixelgrab viewer.
//!
//! # Invariants
//! - Geometry functions are pure and total over finite inputs.
//! - A degenerate ray (zero-length or non-finite direction) never hits anything.

pub mod geometry;
pub mod types;

pub use geometry::{Aabb, Ray, UNIT_HALF_EXTENT};
pub use types::ObjectId;
