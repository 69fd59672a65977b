use bevy::prelude::*;
use constants::profile::{
    HANDLE_ARROW_LENGTH, HANDLE_ARROW_OFFSET, HANDLE_EYE_RING_RADIUS, HANDLE_PICK_TOLERANCE,
    HANDLE_RING_RADIUS, PLANE_HEIGHT, PLANE_HELPER_SIZE, PLANE_WIDTH,
};
use serde::{Deserialize, Serialize};

use super::handles::HandleName;

/// Solids that can be picked to create a profile plane and are clipped by it.
#[derive(Component, Default, Clone, Copy)]
pub struct SectionTarget;

/// The translucent quad visualising the profile plane.
#[derive(Component)]
pub struct ProfilePlaneMesh;

/// Plane and handle sizes, in world units.
#[derive(Resource, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileDimensions {
    pub plane_width: f32,
    pub plane_height: f32,
    pub helper_size: f32,
    pub arrow_length: f32,
    pub arrow_offset: f32,
    pub ring_radius: f32,
    pub eye_ring_radius: f32,
    pub pick_tolerance: f32,
}

impl Default for ProfileDimensions {
    fn default() -> Self {
        Self {
            plane_width: PLANE_WIDTH,
            plane_height: PLANE_HEIGHT,
            helper_size: PLANE_HELPER_SIZE,
            arrow_length: HANDLE_ARROW_LENGTH,
            arrow_offset: HANDLE_ARROW_OFFSET,
            ring_radius: HANDLE_RING_RADIUS,
            eye_ring_radius: HANDLE_EYE_RING_RADIUS,
            pick_tolerance: HANDLE_PICK_TOLERANCE,
        }
    }
}

impl ProfileDimensions {
    /// First vertex of the plane quad in its local space.
    pub fn first_vertex(&self) -> Vec3 {
        Vec3::new(-self.plane_width * 0.5, self.plane_height * 0.5, 0.0)
    }
}

/// Profile lifecycle notifications, forwarded to the web frontend.
#[derive(Event, Debug, Clone, PartialEq)]
pub enum ProfileEvent {
    PlanePicked { normal: Vec3, constant: f32 },
    DragStarted { handle: HandleName },
    DragStopped { normal: Vec3, constant: f32 },
}

impl ProfileEvent {
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::PlanePicked { normal, constant } => serde_json::json!({
                "event": "plane_picked",
                "normal": normal.to_array(),
                "constant": constant,
            }),
            Self::DragStarted { handle } => serde_json::json!({
                "event": "drag_started",
                "handle": handle.as_str(),
            }),
            Self::DragStopped { normal, constant } => serde_json::json!({
                "event": "drag_stopped",
                "normal": normal.to_array(),
                "constant": constant,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_vertex_is_top_left_corner() {
        let dimensions = ProfileDimensions::default();
        assert_eq!(dimensions.first_vertex(), Vec3::new(-20.0, 20.0, 0.0));
    }

    #[test]
    fn events_serialize_handle_names() {
        let event = ProfileEvent::DragStarted {
            handle: HandleName::XRotate,
        };
        assert_eq!(event.to_json()["handle"], "xr_handle");
    }
}
