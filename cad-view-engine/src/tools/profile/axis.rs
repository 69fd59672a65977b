use std::f32::consts::FRAC_PI_2;

use bevy::prelude::*;
use constants::profile::AXIS_SIMILARITY_THRESHOLD;

/// Frame axis a plane or handle is associated with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandleAxis {
    X,
    Y,
    Z,
}

impl HandleAxis {
    pub fn unit(self) -> Vec3 {
        match self {
            Self::X => Vec3::X,
            Self::Y => Vec3::Y,
            Self::Z => Vec3::Z,
        }
    }

    /// Local rotation taking the plane quad from the `xy` plane to the plane
    /// perpendicular to this axis.
    pub fn basis_rotation(self) -> Quat {
        match self {
            Self::X => Quat::from_rotation_y(FRAC_PI_2),
            Self::Y => Quat::from_rotation_x(FRAC_PI_2),
            Self::Z => Quat::IDENTITY,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::X => "x",
            Self::Y => "y",
            Self::Z => "z",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisDetection {
    pub axis: HandleAxis,
    /// `|cos|` between the plane normal and the winning reference normal.
    pub similarity: f32,
    pub aligned: bool,
}

/// Labels a plane normal with the handle frame axis it is closest to.
///
/// References are the frame's `xy`, `yz` and `zx` plane normals, tried in
/// that order; an exact tie keeps the earlier one.
pub fn detect_axis(normal: Vec3, frame_rotation: Quat) -> AxisDetection {
    let references = [
        (HandleAxis::Z, frame_rotation * Vec3::Z),
        (HandleAxis::X, frame_rotation * Vec3::X),
        (HandleAxis::Y, frame_rotation * Vec3::Y),
    ];

    let (mut axis, mut similarity) = (HandleAxis::Z, f32::NEG_INFINITY);
    for (candidate, reference) in references {
        let value = normal.dot(reference).abs();
        if value > similarity {
            axis = candidate;
            similarity = value;
        }
    }

    AxisDetection {
        axis,
        similarity,
        aligned: similarity > AXIS_SIMILARITY_THRESHOLD,
    }
}

/// Rotation carrying a plane based on `from` to one based on `to`, in the
/// handle frame's local space.
pub fn rebase_rotation(from: HandleAxis, to: HandleAxis) -> Quat {
    to.basis_rotation() * from.basis_rotation().inverse()
}

/// Re-orients the plane mesh so it is perpendicular to `to` instead of
/// `from`. Only the rotation changes; the mesh stays where it is.
pub fn rebase_mesh(mesh: &Transform, frame_rotation: Quat, from: HandleAxis, to: HandleAxis) -> Transform {
    let change = frame_rotation * rebase_rotation(from, to) * frame_rotation.inverse();
    Transform {
        rotation: (change * mesh.rotation).normalize(),
        ..*mesh
    }
}
