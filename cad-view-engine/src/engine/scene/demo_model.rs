use bevy::prelude::*;
use bevy::render::mesh::{Indices, PrimitiveTopology};
use bevy::render::render_asset::RenderAssetUsages;
use constants::render_settings::{EDGE_LINE_COLOUR, FEATURE_EDGE_THRESHOLD_DEGREES, MODEL_COLOUR};
use std::f32::consts::FRAC_PI_3;

use crate::engine::geometry::edges::feature_edge_mesh;
use crate::engine::render::section_material::{SectionMaterial, section_material};
use crate::tools::profile::SectionTarget;

const WALL_COUNT: usize = 6;
const WALL_HALF_EXTENT: f32 = 5.0;

/// Single 10x10 wall facing +Z, offset 5 units from the Y axis.
fn wall_mesh() -> Mesh {
    let h = WALL_HALF_EXTENT;
    let positions = vec![[-h, h, h], [-h, -h, h], [h, h, h], [h, -h, h]];

    let mut mesh = Mesh::new(
        PrimitiveTopology::TriangleList,
        RenderAssetUsages::default(),
    )
    .with_inserted_attribute(Mesh::ATTRIBUTE_POSITION, positions)
    .with_inserted_indices(Indices::U16(vec![0, 1, 2, 1, 3, 2]));
    mesh.compute_normals();
    mesh
}

/// Spawns a solid with its feature-edge lines as a child, so both follow
/// the same transform.
fn spawn_section_solid(
    commands: &mut Commands,
    meshes: &mut Assets<Mesh>,
    solid: Mesh,
    surface: Handle<SectionMaterial>,
    lines: Handle<SectionMaterial>,
    transform: Transform,
) {
    let edges = meshes.add(feature_edge_mesh(&solid, FEATURE_EDGE_THRESHOLD_DEGREES));
    let solid = meshes.add(solid);

    commands
        .spawn((
            Mesh3d(solid),
            MeshMaterial3d(surface),
            transform,
            SectionTarget,
        ))
        .with_children(|parent| {
            parent.spawn((Mesh3d(edges), MeshMaterial3d(lines), Transform::IDENTITY));
        });
}

/// Hexagonal ring of walls plus a box, each outlined by its feature edges.
pub fn spawn_demo_model(
    commands: &mut Commands,
    meshes: &mut Assets<Mesh>,
    materials: &mut Assets<SectionMaterial>,
) {
    let surface = materials.add(section_material(StandardMaterial {
        base_color: MODEL_COLOUR,
        cull_mode: None,
        double_sided: true,
        ..default()
    }));
    let lines = materials.add(section_material(StandardMaterial {
        base_color: EDGE_LINE_COLOUR,
        unlit: true,
        ..default()
    }));

    for i in 0..WALL_COUNT {
        let rotation = Quat::from_rotation_y(FRAC_PI_3 * i as f32);
        spawn_section_solid(
            commands,
            meshes,
            wall_mesh(),
            surface.clone(),
            lines.clone(),
            Transform::from_rotation(rotation),
        );
    }

    spawn_section_solid(
        commands,
        meshes,
        Mesh::from(Cuboid::new(16.0, 10.0, 12.0)),
        surface,
        lines,
        Transform::from_xyz(-30.0, 0.0, 0.0),
    );

    info!("Demo model spawned: {} walls and one box", WALL_COUNT);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::geometry::edges::feature_edges;

    #[test]
    fn wall_is_a_single_outlined_quad() {
        let wall = wall_mesh();
        assert_eq!(feature_edges(&wall, FEATURE_EDGE_THRESHOLD_DEGREES).len(), 4);
        assert!(wall.attribute(Mesh::ATTRIBUTE_NORMAL).is_some());
    }
}
