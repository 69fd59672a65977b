use bevy::prelude::*;

/// Oriented plane satisfying `normal · p + constant = 0`.
///
/// The normal is kept at unit length; every constructor and transform
/// re-normalizes it. Points with a negative signed distance lie on the
/// clipped side.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipPlane {
    pub normal: Vec3,
    pub constant: f32,
}

impl Default for ClipPlane {
    fn default() -> Self {
        Self {
            normal: Vec3::Z,
            constant: 0.0,
        }
    }
}

impl ClipPlane {
    /// Packed form used when no plane is active. Every point has a positive
    /// signed distance, so nothing is clipped.
    pub const DISABLED: Vec4 = Vec4::new(0.0, 0.0, 0.0, 1.0);

    pub fn new(normal: Vec3, constant: f32) -> Self {
        let length = normal.length();
        if length <= f32::EPSILON {
            return Self::default();
        }
        Self {
            normal: normal / length,
            constant: constant / length,
        }
    }

    pub fn from_normal_and_point(normal: Vec3, point: Vec3) -> Self {
        let normal = normal.normalize_or(Vec3::Z);
        Self {
            normal,
            constant: -normal.dot(point),
        }
    }

    /// Plane through three points, wound so the normal is `(c - b) × (a - b)`.
    /// Returns `None` for collinear or coincident points.
    pub fn from_coplanar_points(a: Vec3, b: Vec3, c: Vec3) -> Option<Self> {
        let normal = (c - b).cross(a - b).try_normalize()?;
        Some(Self {
            normal,
            constant: -normal.dot(a),
        })
    }

    /// The plane's local XY plane (`Z`, `0`) carried through a transform.
    pub fn from_transform(transform: &Transform) -> Self {
        Self::default().transformed(&transform.compute_matrix())
    }

    pub fn signed_distance(&self, point: Vec3) -> f32 {
        self.normal.dot(point) + self.constant
    }

    pub fn coplanar_point(&self) -> Vec3 {
        self.normal * -self.constant
    }

    pub fn project_point(&self, point: Vec3) -> Vec3 {
        point - self.normal * self.signed_distance(point)
    }

    /// Applies an affine transform. The normal goes through the
    /// inverse-transpose of the upper 3x3 so non-uniform scale keeps it
    /// perpendicular.
    pub fn transformed(&self, matrix: &Mat4) -> Self {
        let normal_matrix = Mat3::from_mat4(*matrix).inverse().transpose();
        let reference = matrix.transform_point3(self.coplanar_point());
        let normal = (normal_matrix * self.normal).normalize_or(self.normal);
        Self {
            normal,
            constant: -reference.dot(normal),
        }
    }

    /// Rotation that carries local `+Z` onto the plane normal.
    pub fn orientation(&self) -> Quat {
        Quat::from_rotation_arc(Vec3::Z, self.normal)
    }

    pub fn to_vec4(&self) -> Vec4 {
        self.normal.extend(self.constant)
    }
}
