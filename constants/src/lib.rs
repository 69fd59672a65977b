//! Shared constants for the CAD view engine.
//!
//! Values here back the `Default` impls of runtime configuration and the
//! CPU-side mirrors of shader math, so tests and shaders agree on a single
//! source of truth.

/// Compositor thresholds, weights and edge tones.
pub mod render_settings;

/// Profile plane dimensions, handle geometry and axis detection tolerance.
pub mod profile;

/// Orthographic camera defaults.
pub mod camera;
