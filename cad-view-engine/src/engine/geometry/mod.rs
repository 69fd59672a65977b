//! Geometric primitives shared by the compositor, the profile tool and the
//! demo scene.
//!
//! Everything here is pure math over `glam` types re-exported by Bevy and is
//! unit tested without a GPU or an `App`.

/// Clip plane in `n·p + c = 0` form with transform application.
pub mod plane;

/// Ray queries: triangle hits, closest points on lines and plane crossings.
pub mod ray;

/// Feature-edge extraction producing line-list meshes from triangle meshes.
pub mod edges;
