use bevy::prelude::*;
use bevy::render::mesh::{PrimitiveTopology, VertexAttributeValues};
use bevy::render::render_asset::RenderAssetUsages;
use std::collections::BTreeMap;

/// Positions are welded on a grid this fine before edges are matched, so
/// split vertices (per-face normals or UVs) still share their edges.
const WELD_SCALE: f32 = 1.0e4;

type VertexKey = [i64; 3];

fn weld(position: Vec3) -> VertexKey {
    [
        (position.x * WELD_SCALE).round() as i64,
        (position.y * WELD_SCALE).round() as i64,
        (position.z * WELD_SCALE).round() as i64,
    ]
}

/// Triangles of a triangle-list mesh in local space.
pub fn triangles(mesh: &Mesh) -> Option<Vec<[Vec3; 3]>> {
    if mesh.primitive_topology() != PrimitiveTopology::TriangleList {
        return None;
    }
    let Some(VertexAttributeValues::Float32x3(positions)) =
        mesh.attribute(Mesh::ATTRIBUTE_POSITION)
    else {
        return None;
    };

    let indices: Vec<usize> = match mesh.indices() {
        Some(indices) => indices.iter().collect(),
        None => (0..positions.len()).collect(),
    };

    let triangles = indices
        .chunks_exact(3)
        .filter_map(|tri| {
            let a = positions.get(tri[0])?;
            let b = positions.get(tri[1])?;
            let c = positions.get(tri[2])?;
            Some([Vec3::from(*a), Vec3::from(*b), Vec3::from(*c)])
        })
        .collect();

    Some(triangles)
}

struct EdgeRecord {
    endpoints: (Vec3, Vec3),
    normals: Vec<Vec3>,
}

/// Endpoint pairs of every boundary edge and every edge whose adjacent
/// faces meet at more than `threshold_degrees`.
pub fn feature_edges(mesh: &Mesh, threshold_degrees: f32) -> Vec<(Vec3, Vec3)> {
    let Some(triangles) = triangles(mesh) else {
        return Vec::new();
    };
    let threshold_dot = threshold_degrees.to_radians().cos();
    let mut edges: BTreeMap<(VertexKey, VertexKey), EdgeRecord> = BTreeMap::new();

    for [a, b, c] in triangles {
        let Some(normal) = (b - a).cross(c - a).try_normalize() else {
            continue;
        };
        for (start, end) in [(a, b), (b, c), (c, a)] {
            let (ks, ke) = (weld(start), weld(end));
            let key = if ks <= ke { (ks, ke) } else { (ke, ks) };
            edges
                .entry(key)
                .or_insert_with(|| EdgeRecord {
                    endpoints: (start, end),
                    normals: Vec::new(),
                })
                .normals
                .push(normal);
        }
    }

    edges
        .into_values()
        .filter(|edge| match edge.normals.as_slice() {
            [_] => true,
            [first, second, ..] => first.dot(*second) <= threshold_dot,
            [] => false,
        })
        .map(|edge| edge.endpoints)
        .collect()
}

/// Line-list mesh of a mesh's feature edges, suitable for the edge
/// classification pass.
pub fn feature_edge_mesh(mesh: &Mesh, threshold_degrees: f32) -> Mesh {
    let positions: Vec<[f32; 3]> = feature_edges(mesh, threshold_degrees)
        .into_iter()
        .flat_map(|(start, end)| [start.to_array(), end.to_array()])
        .collect();

    Mesh::new(PrimitiveTopology::LineList, RenderAssetUsages::default())
        .with_inserted_attribute(Mesh::ATTRIBUTE_POSITION, positions)
}
