use bevy::prelude::*;

use super::axis::HandleAxis;
use super::controller::{HandleFrame, HandleMotion};
use super::state::ProfileDimensions;
use crate::engine::geometry::ray::{ray_line_closest, ray_plane, ray_segment_distance};

/// On-screen manipulator handles. The string names are shared with the web
/// frontend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandleName {
    XPositive,
    XNegative,
    YPositive,
    YNegative,
    ZPositive,
    ZNegative,
    XRotate,
    YRotate,
    ZRotate,
    EyeRotate,
}

impl HandleName {
    pub const ALL: [HandleName; 10] = [
        HandleName::XPositive,
        HandleName::XNegative,
        HandleName::YPositive,
        HandleName::YNegative,
        HandleName::ZPositive,
        HandleName::ZNegative,
        HandleName::XRotate,
        HandleName::YRotate,
        HandleName::ZRotate,
        HandleName::EyeRotate,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|handle| handle.as_str() == name)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::XPositive => "xpt_handle",
            Self::XNegative => "xnt_handle",
            Self::YPositive => "ypt_handle",
            Self::YNegative => "ynt_handle",
            Self::ZPositive => "zpt_handle",
            Self::ZNegative => "znt_handle",
            Self::XRotate => "xr_handle",
            Self::YRotate => "yr_handle",
            Self::ZRotate => "zr_handle",
            Self::EyeRotate => "er_handle",
        }
    }

    pub fn is_translation(self) -> bool {
        matches!(
            self,
            Self::XPositive
                | Self::XNegative
                | Self::YPositive
                | Self::YNegative
                | Self::ZPositive
                | Self::ZNegative
        )
    }

    /// Frame axis of the handle; `None` for the eye ring.
    pub fn axis(self) -> Option<HandleAxis> {
        match self {
            Self::XPositive | Self::XNegative | Self::XRotate => Some(HandleAxis::X),
            Self::YPositive | Self::YNegative | Self::YRotate => Some(HandleAxis::Y),
            Self::ZPositive | Self::ZNegative | Self::ZRotate => Some(HandleAxis::Z),
            Self::EyeRotate => None,
        }
    }

    fn sign(self) -> f32 {
        match self {
            Self::XNegative | Self::YNegative | Self::ZNegative => -1.0,
            _ => 1.0,
        }
    }

    /// World direction of a translation arrow.
    pub fn arrow_direction(self, frame: &HandleFrame) -> Option<Vec3> {
        if !self.is_translation() {
            return None;
        }
        let axis = self.axis()?;
        Some(frame.rotation * axis.unit() * self.sign())
    }

    /// World normal of a rotation ring. The eye ring faces the viewer.
    pub fn ring_normal(self, frame: &HandleFrame, view_direction: Vec3) -> Option<Vec3> {
        if self.is_translation() {
            return None;
        }
        Some(match self.axis() {
            Some(axis) => frame.rotation * axis.unit(),
            None => -view_direction,
        })
    }

    pub fn ring_radius(self, dimensions: &ProfileDimensions) -> f32 {
        if self == Self::EyeRotate {
            dimensions.eye_ring_radius
        } else {
            dimensions.ring_radius
        }
    }
}

/// World-space end points of a translation arrow.
pub fn arrow_segment(direction: Vec3, frame: &HandleFrame, dimensions: &ProfileDimensions) -> (Vec3, Vec3) {
    let start = frame.position + direction * dimensions.arrow_offset;
    (start, start + direction * dimensions.arrow_length)
}

/// Nearest handle within pick tolerance of the ray.
pub fn pick_handle(
    ray: Ray3d,
    frame: &HandleFrame,
    view_direction: Vec3,
    dimensions: &ProfileDimensions,
) -> Option<HandleName> {
    let mut best: Option<(f32, HandleName)> = None;

    for handle in HandleName::ALL {
        let hit_depth = if let Some(direction) = handle.arrow_direction(frame) {
            let (start, end) = arrow_segment(direction, frame, dimensions);
            ray_segment_distance(ray, start, end)
                .filter(|(_, distance)| *distance <= dimensions.pick_tolerance)
                .map(|(t, _)| t)
        } else {
            handle
                .ring_normal(frame, view_direction)
                .and_then(|normal| ray_plane(ray, frame.position, normal))
                .filter(|t| {
                    let offset = ray.get_point(*t).distance(frame.position);
                    (offset - handle.ring_radius(dimensions)).abs() <= dimensions.pick_tolerance
                })
        };

        if let Some(t) = hit_depth {
            if best.is_none_or(|(best_t, _)| t < best_t) {
                best = Some((t, handle));
            }
        }
    }

    best.map(|(_, handle)| handle)
}

/// Drag state captured when a handle is grabbed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HandleGrip {
    /// Position along the arrow axis under the cursor.
    Axis {
        origin: Vec3,
        direction: Vec3,
        parameter: f32,
    },
    /// In-plane vector from the frame centre to the cursor.
    Angle {
        centre: Vec3,
        normal: Vec3,
        vector: Vec3,
    },
}

impl HandleGrip {
    pub fn begin(handle: HandleName, frame: &HandleFrame, ray: Ray3d, view_direction: Vec3) -> Option<Self> {
        if let Some(direction) = handle.arrow_direction(frame) {
            let (_, parameter) = ray_line_closest(ray, frame.position, direction)?;
            return Some(Self::Axis {
                origin: frame.position,
                direction,
                parameter,
            });
        }

        let normal = handle.ring_normal(frame, view_direction)?;
        let vector = ring_vector(ray, frame.position, normal)?;
        Some(Self::Angle {
            centre: frame.position,
            normal,
            vector,
        })
    }

    /// Motion since the previous call. `None` when the ray cannot be
    /// resolved against the grip, e.g. parallel to the arrow.
    pub fn advance(&mut self, ray: Ray3d) -> Option<HandleMotion> {
        match self {
            Self::Axis {
                origin,
                direction,
                parameter,
            } => {
                let (_, current) = ray_line_closest(ray, *origin, *direction)?;
                let delta = current - *parameter;
                *parameter = current;
                Some(HandleMotion::Translate(*direction * delta))
            }
            Self::Angle {
                centre,
                normal,
                vector,
            } => {
                let current = ring_vector(ray, *centre, *normal)?;
                let angle = normal.dot(vector.cross(current)).atan2(vector.dot(current));
                *vector = current;
                Some(HandleMotion::Rotate(Quat::from_axis_angle(*normal, angle)))
            }
        }
    }
}

fn ring_vector(ray: Ray3d, centre: Vec3, normal: Vec3) -> Option<Vec3> {
    let t = ray_plane(ray, centre, normal)?;
    (ray.get_point(t) - centre).try_normalize()
}
