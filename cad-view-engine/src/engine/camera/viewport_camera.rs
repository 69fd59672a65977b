use bevy::input::mouse::{AccumulatedMouseMotion, AccumulatedMouseScroll, MouseScrollUnit};
use bevy::prelude::*;
use bevy::window::PrimaryWindow;
use constants::camera::{MAX_ZOOM, MIN_ZOOM, ORBIT_SENSITIVITY, ZOOM_SENSITIVITY};

/// Pitch is kept just short of the poles so `looking_at` never degenerates.
const PITCH_LIMIT: f32 = 1.55;
const PIXEL_SCROLL_SCALE: f32 = 0.05;

/// Orbit state of the orthographic viewport camera.
///
/// The camera sits `distance` away from `focus`, turned by `yaw` about world
/// Y and `pitch` about its own X. Zoom is the orthographic scale, so it
/// changes the visible frustum without moving the camera.
#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub struct ViewportCamera {
    pub focus: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    pub distance: f32,
    pub zoom: f32,
}

impl Default for ViewportCamera {
    fn default() -> Self {
        Self {
            focus: Vec3::ZERO,
            yaw: 0.0,
            pitch: 0.0,
            distance: 100.0,
            zoom: 1.0,
        }
    }
}

impl ViewportCamera {
    /// Orbit that reproduces a camera placed at `position` looking at `focus`.
    pub fn from_position(position: Vec3, focus: Vec3) -> Self {
        let offset = position - focus;
        let distance = offset.length().max(f32::EPSILON);
        let pitch = (offset.y / distance).clamp(-1.0, 1.0).asin();
        let yaw = offset.x.atan2(offset.z);
        Self {
            focus,
            yaw,
            pitch: -pitch,
            distance,
            zoom: 1.0,
        }
    }

    pub fn rotation(&self) -> Quat {
        Quat::from_euler(EulerRot::YXZ, self.yaw, self.pitch, 0.0)
    }

    pub fn transform(&self) -> Transform {
        let rotation = self.rotation();
        let translation = self.focus + rotation * Vec3::Z * self.distance;
        Transform::from_translation(translation).with_rotation(rotation)
    }

    pub fn orbit(&mut self, delta: Vec2) {
        self.yaw -= delta.x * ORBIT_SENSITIVITY;
        self.pitch = (self.pitch - delta.y * ORBIT_SENSITIVITY).clamp(-PITCH_LIMIT, PITCH_LIMIT);
    }

    /// Moves the focus in the view plane. `world_per_pixel` converts a
    /// cursor delta into world units at the current zoom.
    pub fn pan(&mut self, delta: Vec2, world_per_pixel: f32) {
        let rotation = self.rotation();
        let right = rotation * Vec3::X;
        let up = rotation * Vec3::Y;
        self.focus += (-right * delta.x + up * delta.y) * world_per_pixel;
    }

    pub fn zoom_by(&mut self, scroll: f32) {
        self.zoom = (self.zoom * (1.0 - scroll * ZOOM_SENSITIVITY)).clamp(MIN_ZOOM, MAX_ZOOM);
    }
}

/// Middle button orbits, right button pans, wheel zooms.
pub fn camera_controller(
    mut cameras: Query<(&mut Transform, &mut Projection), With<Camera3d>>,
    mut viewport_camera: ResMut<ViewportCamera>,
    mouse_button: Res<ButtonInput<MouseButton>>,
    mouse_motion: Res<AccumulatedMouseMotion>,
    mouse_scroll: Res<AccumulatedMouseScroll>,
    windows: Query<&Window, With<PrimaryWindow>>,
) {
    let Ok((mut transform, mut projection)) = cameras.single_mut() else {
        return;
    };

    let delta = mouse_motion.delta;
    if delta != Vec2::ZERO {
        if mouse_button.pressed(MouseButton::Middle) {
            viewport_camera.orbit(delta);
        } else if mouse_button.pressed(MouseButton::Right) {
            let world_per_pixel = match (&*projection, windows.single()) {
                (Projection::Orthographic(ortho), Ok(window)) if window.height() > 0.0 => {
                    ortho.area.height() / window.height()
                }
                _ => 1.0,
            };
            viewport_camera.pan(delta, world_per_pixel);
        }
    }

    let scroll = match mouse_scroll.unit {
        MouseScrollUnit::Line => mouse_scroll.delta.y,
        MouseScrollUnit::Pixel => mouse_scroll.delta.y * PIXEL_SCROLL_SCALE,
    };
    if scroll.abs() > f32::EPSILON {
        viewport_camera.zoom_by(scroll);
    }

    let zoom = viewport_camera.zoom;
    let stale_scale = matches!(
        &*projection,
        Projection::Orthographic(ortho) if (ortho.scale - zoom).abs() > f32::EPSILON
    );
    if stale_scale {
        if let Projection::Orthographic(ortho) = &mut *projection {
            ortho.scale = zoom;
        }
    }

    let target = viewport_camera.transform();
    if *transform != target {
        *transform = target;
    }
}

/// Keeps the key light shining along the view direction.
pub fn light_follows_camera(
    cameras: Query<&Transform, (With<Camera3d>, Changed<Transform>)>,
    mut lights: Query<&mut Transform, (With<DirectionalLight>, Without<Camera3d>)>,
) {
    let Ok(camera) = cameras.single() else {
        return;
    };
    for mut light in &mut lights {
        light.rotation = camera.rotation;
    }
}

/// World-space ray under the cursor, plus the camera's forward direction.
pub fn cursor_ray(
    window: &Window,
    camera: &Camera,
    camera_transform: &GlobalTransform,
) -> Option<(Ray3d, Vec3)> {
    let cursor = window.cursor_position()?;
    let ray = camera.viewport_to_world(camera_transform, cursor).ok()?;
    Some((ray, *camera_transform.forward()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-3;

    #[test]
    fn from_position_round_trips_through_transform() {
        let position = Vec3::new(10.0, 10.0, 100.0);
        let orbit = ViewportCamera::from_position(position, Vec3::ZERO);
        let transform = orbit.transform();

        assert!((transform.translation - position).length() < EPS);
        let forward = transform.forward();
        assert!((*forward - (-position.normalize())).length() < EPS);
    }

    #[test]
    fn orbit_clamps_pitch() {
        let mut orbit = ViewportCamera::default();
        orbit.orbit(Vec2::new(0.0, -100_000.0));
        assert!(orbit.pitch <= PITCH_LIMIT);
        orbit.orbit(Vec2::new(0.0, 100_000.0));
        assert!(orbit.pitch >= -PITCH_LIMIT);
    }

    #[test]
    fn pan_moves_focus_in_view_plane() {
        let mut orbit = ViewportCamera::default();
        orbit.pan(Vec2::new(10.0, 0.0), 0.5);
        assert!((orbit.focus - Vec3::new(-5.0, 0.0, 0.0)).length() < EPS);
        assert_eq!(orbit.distance, 100.0);
    }

    #[test]
    fn zoom_stays_in_range() {
        let mut orbit = ViewportCamera::default();
        for _ in 0..200 {
            orbit.zoom_by(5.0);
        }
        assert!((orbit.zoom - MIN_ZOOM).abs() < EPS);
        for _ in 0..200 {
            orbit.zoom_by(-5.0);
        }
        assert!((orbit.zoom - MAX_ZOOM).abs() < EPS);
    }
}
