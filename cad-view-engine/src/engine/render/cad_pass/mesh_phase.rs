use std::collections::HashSet;
use std::ops::Range;

use bevy::ecs::query::ROQueryItem;
use bevy::ecs::system::SystemParamItem;
use bevy::math::FloatOrd;
use bevy::pbr::{
    DrawMesh, MeshPipeline, MeshPipelineKey, MeshPipelineViewLayoutKey, RenderMeshInstances,
    SetMeshBindGroup, SetMeshViewBindGroup,
};
use bevy::prelude::*;
use bevy::render::mesh::{MeshVertexBufferLayoutRef, RenderMesh};
use bevy::render::render_asset::RenderAssets;
use bevy::render::render_phase::{
    CachedRenderPipelinePhaseItem, DrawFunctionId, DrawFunctions, PhaseItem,
    PhaseItemExtraIndex, RenderCommand, RenderCommandResult, SetItemPipeline, SortedPhaseItem,
    TrackedRenderPass, ViewSortedRenderPhases,
};
use bevy::render::render_resource::{
    BindGroupLayout, BindGroupLayoutEntries, BlendComponent, BlendFactor, BlendOperation,
    BlendState, BufferSize, CachedRenderPipelineId, ColorTargetState, ColorWrites, CompareFunction, DepthBiasState, DepthStencilState, Face,
    FragmentState, FrontFace, MultisampleState, PipelineCache, PolygonMode, PrimitiveState,
    RenderPipelineDescriptor, ShaderDefVal, ShaderStages, SpecializedMeshPipeline,
    SpecializedMeshPipelineError, SpecializedMeshPipelines, StencilState, TextureFormat,
    TextureSampleType, VertexState,
    binding_types::{texture_2d, uniform_buffer_sized},
};
use bevy::render::renderer::RenderDevice;
use bevy::render::sync_world::MainEntity;
use bevy::render::view::{ExtractedView, RenderVisibleEntities, RetainedViewEntity};
use bevy::render::Extract;

use super::buffers::view_format;
use super::passes::MeshPass;
use super::prepare::{CadPassUniform, ViewCadPassResources};
use super::settings::{CadPassSettings, ExtractedCadPass};
use crate::engine::scene::node_kind::NodeKind;

const CAD_MESH_SHADER_PATH: &str = "shaders/cad_mesh_passes.wgsl";

/// Per-channel maximum, so overlapping line fragments keep the strongest
/// classification whatever order they rasterise in.
const EDGE_MAX_COMPONENT: BlendComponent = BlendComponent {
    src_factor: BlendFactor::One,
    dst_factor: BlendFactor::One,
    operation: BlendOperation::Max,
};
const EDGE_BLEND: BlendState = BlendState {
    color: EDGE_MAX_COMPONENT,
    alpha: EDGE_MAX_COMPONENT,
};

/// Phase item for the compositor's mesh passes. Items sort by pass first,
/// so each pass draws one contiguous range.
pub struct CadMeshPhase {
    pub pass: MeshPass,
    pub distance: FloatOrd,
    pub entity: (Entity, MainEntity),
    pub pipeline: CachedRenderPipelineId,
    pub draw_function: DrawFunctionId,
    pub batch_range: Range<u32>,
    pub extra_index: PhaseItemExtraIndex,
    pub indexed: bool,
}

impl PhaseItem for CadMeshPhase {
    fn entity(&self) -> Entity {
        self.entity.0
    }

    fn main_entity(&self) -> MainEntity {
        self.entity.1
    }

    fn draw_function(&self) -> DrawFunctionId {
        self.draw_function
    }

    fn batch_range(&self) -> &Range<u32> {
        &self.batch_range
    }

    fn batch_range_mut(&mut self) -> &mut Range<u32> {
        &mut self.batch_range
    }

    fn extra_index(&self) -> PhaseItemExtraIndex {
        self.extra_index.clone()
    }

    fn batch_range_and_extra_index_mut(&mut self) -> (&mut Range<u32>, &mut PhaseItemExtraIndex) {
        (&mut self.batch_range, &mut self.extra_index)
    }
}

impl SortedPhaseItem for CadMeshPhase {
    type SortKey = (MeshPass, FloatOrd);

    fn sort_key(&self) -> Self::SortKey {
        (self.pass, self.distance)
    }

    fn sort(items: &mut [Self]) {
        items.sort_by_key(SortedPhaseItem::sort_key);
    }

    fn indexed(&self) -> bool {
        self.indexed
    }
}

impl CachedRenderPipelinePhaseItem for CadMeshPhase {
    fn cached_pipeline(&self) -> CachedRenderPipelineId {
        self.pipeline
    }
}

/// Range of items belonging to `pass` in a slice sorted by pass.
pub fn mesh_pass_range<T>(items: &[T], pass: MeshPass, pass_of: impl Fn(&T) -> MeshPass) -> Range<usize> {
    let start = items.partition_point(|item| pass_of(item) < pass);
    let end = items.partition_point(|item| pass_of(item) <= pass);
    start..end
}

pub type DrawCadMesh = (
    SetItemPipeline,
    SetMeshViewBindGroup<0>,
    SetMeshBindGroup<1>,
    SetCadPassBindGroup<2>,
    DrawMesh,
);

/// Binds the per-view pass uniforms to `@group(I)`. The edge pass also
/// gets the packed depth buffer; the depth and silhouette passes write to
/// it and so must not sample it.
pub struct SetCadPassBindGroup<const I: usize>;

impl<const I: usize> RenderCommand<CadMeshPhase> for SetCadPassBindGroup<I> {
    type Param = ();
    type ViewQuery = &'static ViewCadPassResources;
    type ItemQuery = ();

    #[inline]
    fn render<'w>(
        item: &CadMeshPhase,
        resources: ROQueryItem<'w, Self::ViewQuery>,
        _entity: Option<()>,
        _param: SystemParamItem<'w, '_, Self::Param>,
        pass: &mut TrackedRenderPass<'w>,
    ) -> RenderCommandResult {
        let bind_group = match item.pass {
            MeshPass::Depth | MeshPass::Silhouette => &resources.uniform_bind_group,
            MeshPass::EdgeClassify => &resources.edge_bind_group,
        };
        pass.set_bind_group(I, bind_group, &[]);
        RenderCommandResult::Success
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CadMeshPipelineKey {
    pub mesh_key: MeshPipelineKey,
    pub pass: MeshPass,
}

/// Specialized mesh pipeline for the depth, silhouette and edge passes.
#[derive(Resource)]
pub struct CadMeshPipeline {
    mesh_pipeline: MeshPipeline,
    shader: Handle<Shader>,
    /// `@group(2)` for passes that write the depth buffer.
    pub uniform_layout: BindGroupLayout,
    /// `@group(2)` for the edge pass: uniforms plus the packed depth buffer.
    pub edge_layout: BindGroupLayout,
}

impl FromWorld for CadMeshPipeline {
    fn from_world(world: &mut World) -> Self {
        let render_device = world.resource::<RenderDevice>();
        let uniform_size = BufferSize::new(size_of::<CadPassUniform>() as u64);

        let uniform_layout = render_device.create_bind_group_layout(
            "cad_mesh_uniform_layout",
            &BindGroupLayoutEntries::single(
                ShaderStages::VERTEX_FRAGMENT,
                uniform_buffer_sized(false, uniform_size),
            ),
        );
        let edge_layout = render_device.create_bind_group_layout(
            "cad_mesh_edge_layout",
            &BindGroupLayoutEntries::sequential(
                ShaderStages::VERTEX_FRAGMENT,
                (
                    uniform_buffer_sized(false, uniform_size),
                    texture_2d(TextureSampleType::Float { filterable: false }),
                ),
            ),
        );

        Self {
            mesh_pipeline: MeshPipeline::from_world(world),
            shader: world.load_asset(CAD_MESH_SHADER_PATH),
            uniform_layout,
            edge_layout,
        }
    }
}

impl SpecializedMeshPipeline for CadMeshPipeline {
    type Key = CadMeshPipelineKey;

    fn specialize(
        &self,
        key: Self::Key,
        layout: &MeshVertexBufferLayoutRef,
    ) -> Result<RenderPipelineDescriptor, SpecializedMeshPipelineError> {
        let mut vertex_attributes = vec![Mesh::ATTRIBUTE_POSITION.at_shader_location(0)];
        let mut shader_defs: Vec<ShaderDefVal> = Vec::new();
        if let Some(batch_size) = self.mesh_pipeline.per_object_buffer_batch_size {
            shader_defs.push(ShaderDefVal::UInt(
                "PER_OBJECT_BUFFER_BATCH_SIZE".into(),
                batch_size,
            ));
        }

        let (fragment_entry, group_layout, target_format, cull_mode, depth_stencil) = match key.pass {
            MeshPass::Depth => (
                "depth_fragment",
                self.uniform_layout.clone(),
                TextureFormat::Rgba8Unorm,
                Some(Face::Back),
                Some(depth_attachment_state(true)),
            ),
            MeshPass::Silhouette => {
                vertex_attributes.push(Mesh::ATTRIBUTE_NORMAL.at_shader_location(1));
                shader_defs.push("SILHOUETTE".into());
                (
                    "silhouette_fragment",
                    self.uniform_layout.clone(),
                    view_format(key.mesh_key.contains(MeshPipelineKey::HDR)),
                    Some(Face::Front),
                    Some(depth_attachment_state(false)),
                )
            }
            MeshPass::EdgeClassify => {
                shader_defs.push("EDGE_PASS".into());
                (
                    "edge_fragment",
                    self.edge_layout.clone(),
                    TextureFormat::Rgba8Unorm,
                    None,
                    None,
                )
            }
        };

        let blend = matches!(key.pass, MeshPass::EdgeClassify).then_some(EDGE_BLEND);
        let vertex_buffer_layout = layout.0.get_layout(&vertex_attributes)?;

        Ok(RenderPipelineDescriptor {
            label: Some(format!("cad_{:?}_mesh_pipeline", key.pass).to_lowercase().into()),
            layout: vec![
                self.mesh_pipeline
                    .get_view_layout(MeshPipelineViewLayoutKey::from(key.mesh_key))
                    .clone(),
                self.mesh_pipeline.mesh_layouts.model_only.clone(),
                group_layout,
            ],
            push_constant_ranges: vec![],
            vertex: VertexState {
                shader: self.shader.clone(),
                entry_point: "vertex".into(),
                shader_defs: shader_defs.clone(),
                buffers: vec![vertex_buffer_layout],
            },
            fragment: Some(FragmentState {
                shader: self.shader.clone(),
                entry_point: fragment_entry.into(),
                shader_defs,
                targets: vec![Some(ColorTargetState {
                    format: target_format,
                    blend,
                    write_mask: ColorWrites::ALL,
                })],
            }),
            primitive: PrimitiveState {
                topology: key.mesh_key.primitive_topology(),
                front_face: FrontFace::Ccw,
                cull_mode,
                polygon_mode: PolygonMode::Fill,
                ..default()
            },
            depth_stencil,
            // Offscreen targets are single sampled regardless of the view.
            multisample: MultisampleState::default(),
            zero_initialize_workgroup_memory: false,
        })
    }
}

/// Reverse-z test against the compositor's own depth attachment.
fn depth_attachment_state(write: bool) -> DepthStencilState {
    DepthStencilState {
        format: TextureFormat::Depth32Float,
        depth_write_enabled: write,
        depth_compare: CompareFunction::GreaterEqual,
        stencil: StencilState::default(),
        bias: DepthBiasState::default(),
    }
}

/// Creates a phase for every active camera that runs the compositor.
pub fn extract_cad_camera_phases(
    mut cad_phases: ResMut<ViewSortedRenderPhases<CadMeshPhase>>,
    cameras: Extract<Query<(Entity, &Camera), (With<Camera3d>, With<CadPassSettings>)>>,
    mut live_entities: Local<HashSet<RetainedViewEntity>>,
) {
    live_entities.clear();
    for (main_entity, camera) in &cameras {
        if !camera.is_active {
            continue;
        }

        let retained_view_entity = RetainedViewEntity::new(main_entity.into(), None, 0);
        cad_phases.insert_or_clear(retained_view_entity);
        live_entities.insert(retained_view_entity);
    }
    cad_phases.retain(|camera_entity, _| live_entities.contains(camera_entity));
}

/// Queues visible nodes into each mesh pass according to their kind.
pub fn queue_cad_meshes(
    draw_functions: Res<DrawFunctions<CadMeshPhase>>,
    mut pipelines: ResMut<SpecializedMeshPipelines<CadMeshPipeline>>,
    pipeline_cache: Res<PipelineCache>,
    cad_pipeline: Res<CadMeshPipeline>,
    render_meshes: Res<RenderAssets<RenderMesh>>,
    render_mesh_instances: Res<RenderMeshInstances>,
    mut cad_phases: ResMut<ViewSortedRenderPhases<CadMeshPhase>>,
    views: Query<(&ExtractedView, &RenderVisibleEntities, &Msaa, &ExtractedCadPass)>,
    node_kinds: Query<&NodeKind>,
) {
    let draw_function = draw_functions.read().id::<DrawCadMesh>();

    for (view, visible_entities, msaa, cad_pass) in &views {
        let Some(phase) = cad_phases.get_mut(&view.retained_view_entity) else {
            continue;
        };

        let view_key = MeshPipelineKey::from_msaa_samples(msaa.samples())
            | MeshPipelineKey::from_hdr(view.hdr);
        let rangefinder = view.rangefinder3d();
        let passes: &[MeshPass] = if cad_pass.settings.draws_silhouette() {
            &MeshPass::ALL
        } else {
            &[MeshPass::Depth, MeshPass::EdgeClassify]
        };

        for (render_entity, visible_entity) in visible_entities.iter::<Mesh3d>() {
            let Ok(kind) = node_kinds.get(*render_entity) else {
                continue;
            };
            let Some(mesh_instance) = render_mesh_instances.render_mesh_queue_data(*visible_entity)
            else {
                continue;
            };
            let Some(mesh) = render_meshes.get(mesh_instance.mesh_asset_id) else {
                continue;
            };

            let mesh_key =
                view_key | MeshPipelineKey::from_primitive_topology(mesh.primitive_topology());
            let distance = rangefinder.distance_translation(&mesh_instance.translation);

            for &pass in passes.iter().filter(|pass| pass.node_kind() == *kind) {
                let pipeline_id = match pipelines.specialize(
                    &pipeline_cache,
                    &cad_pipeline,
                    CadMeshPipelineKey { mesh_key, pass },
                    &mesh.layout,
                ) {
                    Ok(id) => id,
                    Err(err) => {
                        error!("CAD {:?} pipeline specialization failed: {}", pass, err);
                        continue;
                    }
                };

                phase.add(CadMeshPhase {
                    pass,
                    distance: FloatOrd(distance),
                    entity: (*render_entity, *visible_entity),
                    pipeline: pipeline_id,
                    draw_function,
                    batch_range: 0..1,
                    extra_index: PhaseItemExtraIndex::None,
                    indexed: mesh.indexed(),
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pass_ranges_partition_sorted_items() {
        let items = [
            MeshPass::Depth,
            MeshPass::Depth,
            MeshPass::EdgeClassify,
            MeshPass::EdgeClassify,
            MeshPass::EdgeClassify,
        ];
        let pass_of = |pass: &MeshPass| *pass;

        assert_eq!(mesh_pass_range(&items, MeshPass::Depth, pass_of), 0..2);
        assert_eq!(mesh_pass_range(&items, MeshPass::Silhouette, pass_of), 2..2);
        assert_eq!(mesh_pass_range(&items, MeshPass::EdgeClassify, pass_of), 2..5);
    }

    #[test]
    fn pass_dominates_distance_in_sort_order() {
        let near_edge = (MeshPass::EdgeClassify, FloatOrd(1.0));
        let far_depth = (MeshPass::Depth, FloatOrd(900.0));
        assert!(far_depth < near_edge);
    }
}
