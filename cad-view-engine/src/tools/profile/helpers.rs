use bevy::prelude::*;
use constants::profile::{
    HANDLE_ACTIVE_COLOUR, HANDLE_EYE_COLOUR, HANDLE_X_COLOUR, HANDLE_Y_COLOUR, HANDLE_Z_COLOUR,
    PLANE_HELPER_COLOUR,
};

use super::axis::HandleAxis;
use super::controller::ProfileController;
use super::handles::{HandleName, arrow_segment};

pub fn handle_colour(handle: HandleName, active: Option<HandleName>) -> Color {
    if active == Some(handle) {
        return HANDLE_ACTIVE_COLOUR;
    }
    match handle.axis() {
        Some(HandleAxis::X) => HANDLE_X_COLOUR,
        Some(HandleAxis::Y) => HANDLE_Y_COLOUR,
        Some(HandleAxis::Z) => HANDLE_Z_COLOUR,
        None => HANDLE_EYE_COLOUR,
    }
}

/// Draws the plane helper square and the manipulator handles.
pub fn draw_profile_helpers(
    mut gizmos: Gizmos,
    controller: Res<ProfileController>,
    cameras: Query<&GlobalTransform, With<Camera3d>>,
) {
    if controller.plane.is_none() {
        return;
    }
    let Ok(camera_transform) = cameras.single() else {
        return;
    };
    let view_direction = *camera_transform.forward();
    let dimensions = &controller.dimensions;
    let frame = &controller.frame;
    let active = controller.active_handle();

    gizmos.rect(
        Isometry3d::new(controller.mesh.translation, controller.mesh.rotation),
        Vec2::splat(dimensions.helper_size),
        PLANE_HELPER_COLOUR,
    );

    for handle in HandleName::ALL {
        let colour = handle_colour(handle, active);
        if let Some(direction) = handle.arrow_direction(frame) {
            let (start, end) = arrow_segment(direction, frame, dimensions);
            gizmos.arrow(start, end, colour);
        } else if let Some(normal) = handle.ring_normal(frame, view_direction) {
            let rotation = Quat::from_rotation_arc(Vec3::Z, normal);
            gizmos
                .circle(
                    Isometry3d::new(frame.position, rotation),
                    handle.ring_radius(dimensions),
                    colour,
                )
                .resolution(64);
        }
    }
}
