//! Orthographic orbit camera.
//!
//! Middle-drag orbits about the focus, right-drag pans in the view plane and
//! the wheel zooms through the orthographic scale. The directional light is
//! turned with the camera so shading reads the same from every side.

/// Orbit state resource, controller and light-follow systems.
pub mod viewport_camera;
