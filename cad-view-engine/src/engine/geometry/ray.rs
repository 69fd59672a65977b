use bevy::prelude::*;

const PARALLEL_EPSILON: f32 = 1e-6;

/// Two-sided Möller–Trumbore intersection. Returns the ray parameter of
/// the hit, ignoring hits behind the origin.
pub fn ray_triangle(ray: Ray3d, a: Vec3, b: Vec3, c: Vec3) -> Option<f32> {
    let direction = *ray.direction;
    let edge1 = b - a;
    let edge2 = c - a;
    let p = direction.cross(edge2);
    let det = edge1.dot(p);
    if det.abs() < PARALLEL_EPSILON {
        return None;
    }

    let inv_det = 1.0 / det;
    let s = ray.origin - a;
    let u = s.dot(p) * inv_det;
    if !(0.0..=1.0).contains(&u) {
        return None;
    }

    let q = s.cross(edge1);
    let v = direction.dot(q) * inv_det;
    if v < 0.0 || u + v > 1.0 {
        return None;
    }

    let t = edge2.dot(q) * inv_det;
    (t >= 0.0).then_some(t)
}

/// Ray parameter where the ray crosses the plane through `point` with
/// `normal`, or `None` when parallel or behind the origin.
pub fn ray_plane(ray: Ray3d, point: Vec3, normal: Vec3) -> Option<f32> {
    let denom = normal.dot(*ray.direction);
    if denom.abs() < PARALLEL_EPSILON {
        return None;
    }
    let t = normal.dot(point - ray.origin) / denom;
    (t >= 0.0).then_some(t)
}

/// Closest approach between a ray and the infinite line
/// `line_origin + s * line_direction`.
///
/// Returns `(t, s)`: the ray parameter and the line parameter of the two
/// closest points. `None` when the ray runs parallel to the line.
pub fn ray_line_closest(ray: Ray3d, line_origin: Vec3, line_direction: Vec3) -> Option<(f32, f32)> {
    let d1 = *ray.direction;
    let d2 = line_direction;
    let r = ray.origin - line_origin;
    let a = d1.dot(d1);
    let b = d1.dot(d2);
    let c = d2.dot(d2);
    let d = d1.dot(r);
    let e = d2.dot(r);
    let denom = a * c - b * b;
    if denom.abs() < PARALLEL_EPSILON * a * c {
        return None;
    }
    let t = (b * e - c * d) / denom;
    let s = (a * e - b * d) / denom;
    Some((t, s))
}

/// Distance between a ray and the segment `start..end`.
///
/// Returns `(t, distance)` with `t` the ray parameter of the closest point.
pub fn ray_segment_distance(ray: Ray3d, start: Vec3, end: Vec3) -> Option<(f32, f32)> {
    let span = end - start;
    let length = span.length();
    if length <= f32::EPSILON {
        return None;
    }
    let axis = span / length;
    let (t, s) = ray_line_closest(ray, start, axis)?;
    if t < 0.0 {
        return None;
    }
    let on_segment = start + axis * s.clamp(0.0, length);
    let on_ray = ray.get_point(t.max(0.0));
    Some((t, on_ray.distance(on_segment)))
}
