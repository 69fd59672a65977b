use std::collections::HashMap;

use bevy::prelude::*;
use bevy::render::render_resource::{
    BindGroup, BindGroupEntries, Buffer, BufferInitDescriptor, BufferUsages,
};
use bevy::render::renderer::{RenderDevice, RenderQueue};
use bevy::render::texture::TextureCache;
use bevy::render::view::ExtractedView;
use bytemuck::{Pod, Zeroable};

use super::buffers::{BufferSetLayout, ViewCadBuffers};
use super::edge_math::texture_matrix;
use super::mesh_phase::CadMeshPipeline;
use super::passes::BufferSlot;
use super::settings::ExtractedCadPass;
use crate::engine::render::section_material::SectionClip;

/// Uniform block shared by every compositor pass. Field order matches
/// `CadPass` in the WGSL shaders.
#[repr(C)]
#[derive(Pod, Zeroable, Copy, Clone, Debug, PartialEq)]
pub struct CadPassUniform {
    pub texture_matrix: [[f32; 4]; 4],
    /// `(transparent, colored, visible_edge, hidden_edge)`.
    pub params: [f32; 4],
    pub near_far: [f32; 2],
    pub tex_size: [f32; 2],
    pub clip_plane: [f32; 4],
}

impl CadPassUniform {
    pub fn new(
        cad_pass: &ExtractedCadPass,
        clip_from_view: Mat4,
        view_from_world: Mat4,
        layout: &BufferSetLayout,
        section: &SectionClip,
    ) -> Self {
        Self {
            texture_matrix: texture_matrix(clip_from_view, view_from_world).to_cols_array_2d(),
            params: cad_pass.settings.params().to_array(),
            near_far: [cad_pass.near, cad_pass.far],
            tex_size: layout.size().as_vec2().to_array(),
            clip_plane: section.plane.to_array(),
        }
    }
}

/// Returns the cached value for `entity`, creating it on first use. The
/// flag is `true` when the value was just created.
fn cached_or_insert<T: Clone>(
    cache: &mut HashMap<Entity, T>,
    entity: Entity,
    create: impl FnOnce() -> T,
) -> (T, bool) {
    let mut created = false;
    let value = cache.entry(entity).or_insert_with(|| {
        created = true;
        create()
    });
    (value.clone(), created)
}

/// Per-view GPU state for the current frame, rebuilt before the graph runs.
#[derive(Component)]
pub struct ViewCadPassResources {
    pub buffers: ViewCadBuffers,
    pub uniform: Buffer,
    pub uniform_bind_group: BindGroup,
    pub edge_bind_group: BindGroup,
}

/// Sizes the buffer set from the current viewport and builds the uniform
/// block and mesh-pass bind groups of every compositing view.
pub fn prepare_cad_pass_resources(
    mut commands: Commands,
    render_device: Res<RenderDevice>,
    render_queue: Res<RenderQueue>,
    mut texture_cache: ResMut<TextureCache>,
    cad_pipeline: Res<CadMeshPipeline>,
    section: Res<SectionClip>,
    views: Query<(Entity, &ExtractedView, &ExtractedCadPass)>,
    mut layouts: Local<HashMap<Entity, BufferSetLayout>>,
    mut uniforms: Local<HashMap<Entity, Buffer>>,
) {
    layouts.retain(|entity, _| views.contains(*entity));
    uniforms.retain(|entity, _| views.contains(*entity));

    for (entity, view, cad_pass) in &views {
        let layout = layouts.entry(entity).or_default();
        if layout.resize(cad_pass.logical_size, cad_pass.scale_factor) {
            let size = layout.size();
            debug!("CAD buffers for {:?} resized to {}x{}", entity, size.x, size.y);
        }
        let layout = *layout;

        let buffers = ViewCadBuffers::allocate(layout, view.hdr, &mut texture_cache, &render_device);

        let view_from_world = view.world_from_view.compute_matrix().inverse();
        let uniform_data =
            CadPassUniform::new(cad_pass, view.clip_from_view, view_from_world, &layout, &section);
        let uniform_block = [uniform_data];
        let contents: &[u8] = bytemuck::cast_slice(&uniform_block);
        let (uniform, created) = cached_or_insert(&mut uniforms, entity, || {
            render_device.create_buffer_with_data(&BufferInitDescriptor {
                label: Some("cad_pass_uniform"),
                contents,
                usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
            })
        });
        if !created {
            render_queue.write_buffer(&uniform, 0, contents);
        }

        let uniform_bind_group = render_device.create_bind_group(
            "cad_mesh_uniform_bind_group",
            &cad_pipeline.uniform_layout,
            &BindGroupEntries::single(uniform.as_entire_binding()),
        );
        let edge_bind_group = render_device.create_bind_group(
            "cad_mesh_edge_bind_group",
            &cad_pipeline.edge_layout,
            &BindGroupEntries::sequential((
                uniform.as_entire_binding(),
                buffers.view(BufferSlot::Depth),
            )),
        );

        commands.entity(entity).insert(ViewCadPassResources {
            buffers,
            uniform,
            uniform_bind_group,
            edge_bind_group,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::geometry::plane::ClipPlane;
    use crate::engine::render::cad_pass::settings::CadPassSettings;
    use constants::camera::{FAR, NEAR};

    fn extracted() -> ExtractedCadPass {
        ExtractedCadPass {
            settings: CadPassSettings {
                hidden_edge: true,
                ..default()
            },
            near: NEAR,
            far: FAR,
            logical_size: Vec2::new(400.0, 300.0),
            scale_factor: 2.0,
        }
    }

    #[test]
    fn view_cache_creates_once_per_view() {
        let mut cache = HashMap::new();
        let first = Entity::from_raw(1);
        let second = Entity::from_raw(2);
        let mut created = 0;

        for frame in 0..3u32 {
            for entity in [first, second] {
                let (value, fresh) = cached_or_insert(&mut cache, entity, || {
                    created += 1;
                    (entity, frame)
                });
                assert_eq!(value, (entity, 0));
                assert_eq!(fresh, frame == 0);
            }
        }
        assert_eq!(created, 2);

        cache.retain(|entity, _| *entity != first);
        let (_, fresh) = cached_or_insert(&mut cache, first, || (first, 3));
        assert!(fresh);
    }

    #[test]
    fn uniform_matches_shader_block_size() {
        assert_eq!(size_of::<CadPassUniform>(), 112);
    }

    #[test]
    fn uniform_carries_flags_extent_and_plane() {
        let cad_pass = extracted();
        let layout = BufferSetLayout::new(cad_pass.logical_size, cad_pass.scale_factor);
        let section = SectionClip::from_plane(Some(ClipPlane::new(Vec3::X, -2.0)));

        let uniform =
            CadPassUniform::new(&cad_pass, Mat4::IDENTITY, Mat4::IDENTITY, &layout, &section);

        assert_eq!(uniform.params, [0.0, 1.0, 1.0, 1.0]);
        assert_eq!(uniform.near_far, [NEAR, FAR]);
        assert_eq!(uniform.tex_size, [800.0, 600.0]);
        assert_eq!(uniform.clip_plane, [1.0, 0.0, 0.0, -2.0]);
    }

    #[test]
    fn missing_plane_disables_clipping() {
        let cad_pass = extracted();
        let layout = BufferSetLayout::default();
        let uniform = CadPassUniform::new(
            &cad_pass,
            Mat4::IDENTITY,
            Mat4::IDENTITY,
            &layout,
            &SectionClip::default(),
        );
        assert_eq!(uniform.clip_plane, [0.0, 0.0, 0.0, 1.0]);
    }
}
