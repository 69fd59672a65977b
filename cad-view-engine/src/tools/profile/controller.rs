use bevy::prelude::*;

use super::axis::{AxisDetection, detect_axis, rebase_mesh};
use super::handles::HandleName;
use super::pick::FaceHit;
use super::state::ProfileDimensions;
use crate::engine::geometry::plane::ClipPlane;

/// How the handle frame reacts to plane changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnchorMode {
    /// Rotation drags also rotate the frame.
    #[default]
    Inherit,
    /// The frame keeps its orientation; set after a re-base so the handles
    /// stay where the user grabbed them.
    Fixed,
}

/// Pose of the manipulator handles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HandleFrame {
    pub position: Vec3,
    pub rotation: Quat,
    pub mode: AnchorMode,
}

impl Default for HandleFrame {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            mode: AnchorMode::Inherit,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HandleMotion {
    Translate(Vec3),
    /// World-space rotation about the plane mesh centre.
    Rotate(Quat),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DragSession {
    pub handle: HandleName,
    pub plane_mesh: Option<Entity>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProfilePhase {
    #[default]
    Idle,
    Armed,
    Dragging(DragSession),
}

impl ProfilePhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Armed => "armed",
            Self::Dragging(_) => "dragging",
        }
    }
}

/// Clip plane state machine: `Idle -> Armed -> Dragging -> Armed`.
///
/// Every event returns whether it was accepted; events that arrive in the
/// wrong phase leave the controller untouched.
#[derive(Resource, Debug, Clone, Default)]
pub struct ProfileController {
    pub phase: ProfilePhase,
    pub plane: Option<ClipPlane>,
    /// World transform of the plane mesh.
    pub mesh: Transform,
    pub frame: HandleFrame,
    pub plane_mesh: Option<Entity>,
    pub dimensions: ProfileDimensions,
}

impl ProfileController {
    pub fn is_armed(&self) -> bool {
        self.phase == ProfilePhase::Armed
    }

    pub fn active_handle(&self) -> Option<HandleName> {
        match self.phase {
            ProfilePhase::Dragging(session) => Some(session.handle),
            _ => None,
        }
    }

    pub fn detected_axis(&self) -> Option<AxisDetection> {
        self.plane
            .map(|plane| detect_axis(plane.normal, self.frame.rotation))
    }

    /// Creates or replaces the plane from a picked face.
    pub fn on_pick(&mut self, hit: Option<&FaceHit>) -> bool {
        let Some(hit) = hit else {
            return false;
        };
        if matches!(self.phase, ProfilePhase::Dragging(_)) {
            return false;
        }
        let [a, b, c] = hit.triangle;
        let Some(plane) = ClipPlane::from_coplanar_points(a, b, c) else {
            warn!("Picked a degenerate triangle, keeping the current plane");
            return false;
        };

        self.plane = Some(plane);
        self.mesh = Transform::from_translation(hit.point).with_rotation(plane.orientation());
        self.frame = HandleFrame {
            position: self.mesh.translation,
            rotation: self.mesh.rotation,
            mode: AnchorMode::Inherit,
        };
        self.phase = ProfilePhase::Armed;
        info!(
            "Profile plane created: normal {:?}, constant {:.3}",
            plane.normal, plane.constant
        );
        true
    }

    pub fn on_drag_start(&mut self, handle: HandleName) -> bool {
        if !self.is_armed() {
            return false;
        }
        let Some(plane) = self.plane else {
            return false;
        };

        self.frame.mode = AnchorMode::Inherit;
        if let Some(handle_axis) = handle.axis().filter(|_| handle.is_translation()) {
            let detection = detect_axis(plane.normal, self.frame.rotation);
            debug!(
                "Plane axis {:?} (similarity {:.3}, aligned {})",
                detection.axis, detection.similarity, detection.aligned
            );
            if detection.axis != handle_axis {
                self.mesh = rebase_mesh(&self.mesh, self.frame.rotation, detection.axis, handle_axis);
                self.plane = Some(ClipPlane::from_transform(&self.mesh));
                self.frame.mode = AnchorMode::Fixed;
                info!(
                    "Profile plane re-based from {} to {}",
                    detection.axis.as_str(),
                    handle_axis.as_str()
                );
            }
        }

        self.phase = ProfilePhase::Dragging(DragSession {
            handle,
            plane_mesh: self.plane_mesh,
        });
        info!("Profile drag started on {}", handle.as_str());
        true
    }

    pub fn on_drag(&mut self, motion: HandleMotion) -> bool {
        let ProfilePhase::Dragging(session) = self.phase else {
            return false;
        };

        match motion {
            HandleMotion::Translate(delta) => {
                self.mesh.translation += delta;
                self.frame.position += delta;
            }
            HandleMotion::Rotate(rotation) => {
                self.mesh.rotation = (rotation * self.mesh.rotation).normalize();
                if self.frame.mode == AnchorMode::Inherit {
                    self.frame.rotation = (rotation * self.frame.rotation).normalize();
                }
            }
        }
        self.recompute_plane(session.handle);
        true
    }

    pub fn on_drag_stop(&mut self) -> bool {
        let ProfilePhase::Dragging(session) = self.phase else {
            return false;
        };
        self.recompute_plane(session.handle);
        self.phase = ProfilePhase::Armed;
        info!("Profile drag stopped on {}", session.handle.as_str());
        true
    }

    /// Translation keeps the normal and moves the plane through the mesh's
    /// first vertex; rotation re-derives the whole plane from the mesh.
    fn recompute_plane(&mut self, handle: HandleName) {
        if handle.is_translation() {
            if let Some(plane) = self.plane.as_mut() {
                let first_vertex = self.mesh.transform_point(self.dimensions.first_vertex());
                let distance = plane.normal.dot(first_vertex);
                plane.constant = -distance;
            }
        } else {
            self.plane = Some(ClipPlane::from_transform(&self.mesh));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::profile::axis::HandleAxis;

    const EPS: f32 = 1e-4;

    /// Hit on the face `z = 5` of a wall, facing +Z.
    fn wall_hit(point: Vec3) -> FaceHit {
        FaceHit {
            entity: Entity::PLACEHOLDER,
            point,
            triangle: [
                Vec3::new(-5.0, 5.0, 5.0),
                Vec3::new(-5.0, -5.0, 5.0),
                Vec3::new(5.0, 5.0, 5.0),
            ],
            normal: Vec3::Z,
            distance: 10.0,
        }
    }

    fn armed() -> ProfileController {
        let mut controller = ProfileController::default();
        assert!(controller.on_pick(Some(&wall_hit(Vec3::new(1.0, 2.0, 5.0)))));
        controller
    }

    #[test]
    fn pick_creates_plane_through_face() {
        let controller = armed();
        let plane = controller.plane.unwrap();

        assert_eq!(controller.phase, ProfilePhase::Armed);
        assert!((plane.normal - Vec3::Z).length() < EPS);
        assert!((plane.constant - -5.0).abs() < EPS);
        assert!(plane.signed_distance(Vec3::new(1.0, 2.0, 5.0)).abs() < EPS);
        assert!((controller.mesh.rotation * Vec3::Z - plane.normal).length() < EPS);
        assert_eq!(controller.frame.position, controller.mesh.translation);
        assert_eq!(controller.frame.rotation, controller.mesh.rotation);
    }

    #[test]
    fn reversed_winding_flips_the_plane() {
        let mut controller = ProfileController::default();
        let mut hit = wall_hit(Vec3::new(1.0, 2.0, 5.0));
        hit.triangle.swap(0, 2);
        assert!(controller.on_pick(Some(&hit)));

        let plane = controller.plane.unwrap();
        assert!((plane.normal - Vec3::NEG_Z).length() < EPS);
        assert!((plane.constant - 5.0).abs() < EPS);
        assert!((controller.mesh.rotation * Vec3::Z - Vec3::NEG_Z).length() < EPS);
    }

    #[test]
    fn miss_does_nothing() {
        let mut controller = ProfileController::default();
        assert!(!controller.on_pick(None));
        assert_eq!(controller.phase, ProfilePhase::Idle);
        assert!(controller.plane.is_none());
    }

    #[test]
    fn degenerate_triangle_is_rejected() {
        let mut controller = ProfileController::default();
        let mut hit = wall_hit(Vec3::ZERO);
        hit.triangle = [Vec3::ZERO, Vec3::X, Vec3::new(2.0, 0.0, 0.0)];
        assert!(!controller.on_pick(Some(&hit)));
    }

    #[test]
    fn drag_requires_armed_phase() {
        let mut controller = ProfileController::default();
        assert!(!controller.on_drag_start(HandleName::ZPositive));
        assert!(!controller.on_drag(HandleMotion::Translate(Vec3::X)));
        assert!(!controller.on_drag_stop());
        assert_eq!(controller.phase, ProfilePhase::Idle);
    }

    #[test]
    fn pick_is_ignored_while_dragging() {
        let mut controller = armed();
        assert!(controller.on_drag_start(HandleName::ZPositive));
        let before = controller.plane;

        assert!(!controller.on_pick(Some(&wall_hit(Vec3::new(-3.0, 0.0, 5.0)))));
        assert_eq!(controller.plane, before);
        assert_eq!(controller.active_handle(), Some(HandleName::ZPositive));
    }

    #[test]
    fn translation_drag_sets_constant_to_negative_distance() {
        let mut controller = armed();
        assert!(controller.on_drag_start(HandleName::ZPositive));
        let normal = controller.plane.unwrap().normal;

        assert!(controller.on_drag(HandleMotion::Translate(normal * 2.5)));
        let plane = controller.plane.unwrap();
        let first_vertex = controller
            .mesh
            .transform_point(controller.dimensions.first_vertex());
        let distance = plane.normal.dot(first_vertex);

        assert_eq!(plane.constant, -distance);
        assert_eq!(plane.normal, normal);
        assert!(plane.signed_distance(Vec3::new(0.0, 0.0, 7.5)).abs() < EPS);
    }

    #[test]
    fn drag_stop_returns_to_armed() {
        let mut controller = armed();
        assert!(controller.on_drag_start(HandleName::ZNegative));
        assert!(controller.on_drag_stop());
        assert_eq!(controller.phase, ProfilePhase::Armed);
        assert!(!controller.on_drag_stop());
    }

    #[test]
    fn off_axis_translation_handle_rebases_plane() {
        let mut controller = armed();
        let translation = controller.mesh.translation;

        assert!(controller.on_drag_start(HandleName::XPositive));

        assert_eq!(controller.mesh.translation, translation);
        assert_eq!(controller.frame.mode, AnchorMode::Fixed);
        let detection = controller.detected_axis().unwrap();
        assert_eq!(detection.axis, HandleAxis::X);
        assert!(detection.aligned);
    }

    #[test]
    fn on_axis_handle_keeps_frame_inherited() {
        let mut controller = armed();
        let rotation = controller.mesh.rotation;
        assert!(controller.on_drag_start(HandleName::ZPositive));
        assert_eq!(controller.frame.mode, AnchorMode::Inherit);
        assert_eq!(controller.mesh.rotation, rotation);
    }

    #[test]
    fn rotation_drag_turns_plane_and_frame() {
        let mut controller = armed();
        assert!(controller.on_drag_start(HandleName::YRotate));

        let turn = Quat::from_rotation_y(std::f32::consts::FRAC_PI_2);
        assert!(controller.on_drag(HandleMotion::Rotate(turn)));

        let plane = controller.plane.unwrap();
        assert!((plane.normal - turn * Vec3::Z).length() < EPS);
        assert!((controller.frame.rotation * Vec3::Z - plane.normal).length() < EPS);
        assert!(plane.signed_distance(controller.mesh.translation).abs() < EPS);
    }

    #[test]
    fn unknown_handle_names_are_ignored() {
        let mut controller = armed();
        let accepted = HandleName::from_name("bogus_handle")
            .is_some_and(|handle| controller.on_drag_start(handle));
        assert!(!accepted);
        assert!(controller.is_armed());
    }
}
