use bevy::prelude::*;

use crate::engine::geometry::edges::triangles;
use crate::engine::geometry::plane::ClipPlane;
use crate::engine::geometry::ray::ray_triangle;

/// Closest face under the cursor, in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceHit {
    pub entity: Entity,
    pub point: Vec3,
    pub triangle: [Vec3; 3],
    pub normal: Vec3,
    pub distance: f32,
}

/// Casts `ray` against every target and returns the nearest face hit.
///
/// Hits on the clipped side of `clip` are skipped, so the user can pick
/// through the section into the geometry behind it.
pub fn pick_face<'a>(
    ray: Ray3d,
    targets: impl IntoIterator<Item = (Entity, &'a Mesh, &'a GlobalTransform)>,
    clip: Option<&ClipPlane>,
) -> Option<FaceHit> {
    let mut nearest: Option<FaceHit> = None;

    for (entity, mesh, transform) in targets {
        let Some(local_triangles) = triangles(mesh) else {
            continue;
        };
        let matrix = transform.compute_matrix();

        for local in local_triangles {
            let triangle = local.map(|vertex| matrix.transform_point3(vertex));
            let [a, b, c] = triangle;
            let Some(distance) = ray_triangle(ray, a, b, c) else {
                continue;
            };
            if nearest.is_some_and(|hit| hit.distance <= distance) {
                continue;
            }

            let point = ray.get_point(distance);
            if clip.is_some_and(|plane| plane.signed_distance(point) < 0.0) {
                continue;
            }

            let normal = (c - b).cross(a - b).normalize_or_zero();
            nearest = Some(FaceHit {
                entity,
                point,
                triangle,
                normal,
                distance,
            });
        }
    }

    nearest
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-4;

    fn down_ray(x: f32, y: f32) -> Ray3d {
        Ray3d::new(Vec3::new(x, y, 50.0), Dir3::NEG_Z)
    }

    #[test]
    fn nearest_face_wins() {
        let cube = Mesh::from(Cuboid::new(2.0, 2.0, 2.0));
        let near = GlobalTransform::from_translation(Vec3::new(0.0, 0.0, 10.0));
        let far = GlobalTransform::from_translation(Vec3::ZERO);
        let targets = [
            (Entity::from_raw(1), &cube, &far),
            (Entity::from_raw(2), &cube, &near),
        ];

        let hit = pick_face(down_ray(0.2, 0.3), targets, None).unwrap();

        assert_eq!(hit.entity, Entity::from_raw(2));
        assert!((hit.point - Vec3::new(0.2, 0.3, 11.0)).length() < EPS);
        assert!((hit.normal.abs() - Vec3::Z).length() < EPS);
    }

    #[test]
    fn miss_returns_none() {
        let cube = Mesh::from(Cuboid::new(2.0, 2.0, 2.0));
        let transform = GlobalTransform::IDENTITY;
        let hit = pick_face(down_ray(5.0, 5.0), [(Entity::from_raw(1), &cube, &transform)], None);
        assert!(hit.is_none());
    }

    #[test]
    fn clipped_hits_are_skipped() {
        let cube = Mesh::from(Cuboid::new(2.0, 2.0, 2.0));
        let transform = GlobalTransform::IDENTITY;
        // Keeps z < 0.5, so the top face at z = 1 is cut away.
        let clip = ClipPlane::new(Vec3::NEG_Z, 0.5);

        let hit = pick_face(
            down_ray(0.1, 0.1),
            [(Entity::from_raw(1), &cube, &transform)],
            Some(&clip),
        )
        .unwrap();

        assert!((hit.point.z + 1.0).abs() < EPS);
    }

    #[test]
    fn line_meshes_are_not_pickable() {
        let lines = crate::engine::geometry::edges::feature_edge_mesh(&Mesh::from(Cuboid::default()), 30.0);
        let transform = GlobalTransform::IDENTITY;
        let hit = pick_face(down_ray(0.0, 0.0), [(Entity::from_raw(1), &lines, &transform)], None);
        assert!(hit.is_none());
    }
}
