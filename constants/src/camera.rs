/// Visible world height of the orthographic frustum.
pub const FRUSTUM_HEIGHT: f32 = 150.0;
pub const NEAR: f32 = 0.1;
pub const FAR: f32 = 1000.0;
pub const INITIAL_POSITION: [f32; 3] = [10.0, 10.0, 100.0];

pub const ORBIT_SENSITIVITY: f32 = 0.005;
pub const ZOOM_SENSITIVITY: f32 = 0.1;
pub const MIN_ZOOM: f32 = 0.05;
pub const MAX_ZOOM: f32 = 20.0;
