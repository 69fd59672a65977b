use bevy::prelude::*;
use bevy::render::extract_component::ExtractComponent;
use bevy::render::mesh::PrimitiveTopology;

/// Render category of a scene node, resolved once when the node appears.
///
/// Compositor passes select their geometry by kind instead of toggling
/// scene visibility, so the main pass always sees the scene as authored.
#[derive(Component, ExtractComponent, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Solid,
    Line,
    Helper,
    Other,
}

impl NodeKind {
    pub fn from_topology(topology: PrimitiveTopology) -> Self {
        match topology {
            PrimitiveTopology::TriangleList | PrimitiveTopology::TriangleStrip => Self::Solid,
            PrimitiveTopology::LineList | PrimitiveTopology::LineStrip => Self::Line,
            PrimitiveTopology::PointList => Self::Other,
        }
    }
}

/// Tags every untagged mesh entity once its mesh asset is available.
/// Entities spawned with an explicit kind (helpers) are left alone.
pub fn classify_scene_nodes(
    mut commands: Commands,
    meshes: Res<Assets<Mesh>>,
    untagged: Query<(Entity, &Mesh3d), Without<NodeKind>>,
) {
    for (entity, mesh) in &untagged {
        let Some(mesh) = meshes.get(&mesh.0) else {
            continue;
        };
        let kind = NodeKind::from_topology(mesh.primitive_topology());
        debug!("Classified {:?} as {:?}", entity, kind);
        commands.entity(entity).insert(kind);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::render::render_asset::RenderAssetUsages;

    fn run_classification(mesh: Mesh, preset: Option<NodeKind>) -> Option<NodeKind> {
        let mut app = App::new();
        app.init_resource::<Assets<Mesh>>()
            .add_systems(Update, classify_scene_nodes);

        let handle = app.world_mut().resource_mut::<Assets<Mesh>>().add(mesh);
        let mut entity = app.world_mut().spawn(Mesh3d(handle));
        if let Some(kind) = preset {
            entity.insert(kind);
        }
        let entity = entity.id();

        app.update();
        app.world().get::<NodeKind>(entity).copied()
    }

    #[test]
    fn triangle_meshes_are_solid() {
        let kind = run_classification(Mesh::from(Cuboid::default()), None);
        assert_eq!(kind, Some(NodeKind::Solid));
    }

    #[test]
    fn line_meshes_are_lines() {
        let lines = Mesh::new(PrimitiveTopology::LineList, RenderAssetUsages::default())
            .with_inserted_attribute(Mesh::ATTRIBUTE_POSITION, vec![[0.0f32; 3], [1.0; 3]]);
        assert_eq!(run_classification(lines, None), Some(NodeKind::Line));
    }

    #[test]
    fn explicit_kind_is_kept() {
        let kind = run_classification(Mesh::from(Rectangle::default()), Some(NodeKind::Helper));
        assert_eq!(kind, Some(NodeKind::Helper));
    }
}
