//! Interactive tools.
//!
//! The only tool is the profile (section) plane: pick a face of a solid to
//! create a clip plane, then drag its arrow and ring handles to move and
//! turn it. Solids behind the plane are cut away by the section material and
//! their edges by the compositor.

/// Clip plane controller, face and handle picking, and handle gizmos.
pub mod profile;
