use bevy::color::Color;

pub const PLANE_WIDTH: f32 = 40.0;
pub const PLANE_HEIGHT: f32 = 40.0;
pub const PLANE_HELPER_SIZE: f32 = 60.0;

/// Minimum |cos| between the clip normal and a reference plane normal for
/// the plane to count as aligned with that axis.
pub const AXIS_SIMILARITY_THRESHOLD: f32 = 0.95;

pub const HANDLE_ARROW_LENGTH: f32 = 12.0;
/// Arrows start this far from the frame centre so they do not overlap the rings.
pub const HANDLE_ARROW_OFFSET: f32 = 2.0;
pub const HANDLE_RING_RADIUS: f32 = 8.0;
pub const HANDLE_EYE_RING_RADIUS: f32 = 10.0;
pub const HANDLE_PICK_TOLERANCE: f32 = 1.0;

pub const PLANE_COLOUR: Color = Color::srgba(1.0, 1.0, 0.2, 0.35);
pub const PLANE_HELPER_COLOUR: Color = Color::srgb(1.0, 0.0, 0.0);
pub const HANDLE_X_COLOUR: Color = Color::srgb(0.9, 0.2, 0.2);
pub const HANDLE_Y_COLOUR: Color = Color::srgb(0.2, 0.8, 0.2);
pub const HANDLE_Z_COLOUR: Color = Color::srgb(0.2, 0.4, 0.95);
pub const HANDLE_EYE_COLOUR: Color = Color::srgb(0.85, 0.85, 0.85);
pub const HANDLE_ACTIVE_COLOUR: Color = Color::srgb(1.0, 0.85, 0.0);
