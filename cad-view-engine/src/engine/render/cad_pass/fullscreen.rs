use bevy::core_pipeline::fullscreen_vertex_shader::fullscreen_shader_vertex_state;
use bevy::prelude::*;
use bevy::render::render_resource::{
    BindGroupLayout, BindGroupLayoutEntries, BufferSize, CachedRenderPipelineId,
    ColorTargetState, ColorWrites, FilterMode, FragmentState, MultisampleState, PipelineCache,
    PrimitiveState, RenderPipelineDescriptor, Sampler, SamplerBindingType, SamplerDescriptor,
    ShaderStages, SpecializedRenderPipeline, SpecializedRenderPipelines, TextureFormat,
    TextureSampleType,
    binding_types::{sampler, texture_2d, uniform_buffer_sized},
};
use bevy::render::renderer::RenderDevice;
use bevy::render::view::ExtractedView;

use super::buffers::view_format;
use super::passes::CadPassId;
use super::prepare::CadPassUniform;
use super::settings::ExtractedCadPass;

const COPY_SHADER_PATH: &str = "shaders/cad_copy.wgsl";
const BOLD_SHADER_PATH: &str = "shaders/cad_bold.wgsl";
const COMPOSITE_SHADER_PATH: &str = "shaders/cad_composite.wgsl";

/// Fullscreen programs of the compositor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FullscreenProgram {
    /// Snapshot and present.
    Copy,
    Bold,
    Composite,
}

impl CadPassId {
    pub fn fullscreen_program(self) -> Option<FullscreenProgram> {
        match self {
            Self::Snapshot | Self::Present => Some(FullscreenProgram::Copy),
            Self::Bold => Some(FullscreenProgram::Bold),
            Self::Composite => Some(FullscreenProgram::Composite),
            Self::Depth | Self::Silhouette | Self::EdgeClassify => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CadFullscreenKey {
    pub program: FullscreenProgram,
    pub hdr: bool,
}

#[derive(Resource)]
pub struct CadFullscreenPipeline {
    pub copy_layout: BindGroupLayout,
    pub bold_layout: BindGroupLayout,
    pub composite_layout: BindGroupLayout,
    pub sampler: Sampler,
    copy_shader: Handle<Shader>,
    bold_shader: Handle<Shader>,
    composite_shader: Handle<Shader>,
}

impl FromWorld for CadFullscreenPipeline {
    fn from_world(world: &mut World) -> Self {
        let render_device = world.resource::<RenderDevice>();
        let uniform_size = BufferSize::new(size_of::<CadPassUniform>() as u64);

        let copy_layout = render_device.create_bind_group_layout(
            "cad_copy_bind_group_layout",
            &BindGroupLayoutEntries::sequential(
                ShaderStages::FRAGMENT,
                (
                    texture_2d(TextureSampleType::Float { filterable: false }),
                    sampler(SamplerBindingType::NonFiltering),
                ),
            ),
        );

        let bold_layout = render_device.create_bind_group_layout(
            "cad_bold_bind_group_layout",
            &BindGroupLayoutEntries::sequential(
                ShaderStages::FRAGMENT,
                (
                    texture_2d(TextureSampleType::Float { filterable: false }),
                    sampler(SamplerBindingType::NonFiltering),
                    uniform_buffer_sized(false, uniform_size),
                ),
            ),
        );

        let composite_layout = render_device.create_bind_group_layout(
            "cad_composite_bind_group_layout",
            &BindGroupLayoutEntries::sequential(
                ShaderStages::FRAGMENT,
                (
                    texture_2d(TextureSampleType::Float { filterable: false }),
                    texture_2d(TextureSampleType::Float { filterable: false }),
                    sampler(SamplerBindingType::NonFiltering),
                    uniform_buffer_sized(false, uniform_size),
                ),
            ),
        );

        // Edge coverage must not be smeared by filtering.
        let sampler = render_device.create_sampler(&SamplerDescriptor {
            label: Some("cad_nearest_sampler"),
            mag_filter: FilterMode::Nearest,
            min_filter: FilterMode::Nearest,
            ..default()
        });

        Self {
            copy_layout,
            bold_layout,
            composite_layout,
            sampler,
            copy_shader: world.load_asset(COPY_SHADER_PATH),
            bold_shader: world.load_asset(BOLD_SHADER_PATH),
            composite_shader: world.load_asset(COMPOSITE_SHADER_PATH),
        }
    }
}

impl SpecializedRenderPipeline for CadFullscreenPipeline {
    type Key = CadFullscreenKey;

    fn specialize(&self, key: Self::Key) -> RenderPipelineDescriptor {
        let (label, layout, shader, format) = match key.program {
            FullscreenProgram::Copy => (
                "cad_copy_pipeline",
                &self.copy_layout,
                &self.copy_shader,
                view_format(key.hdr),
            ),
            FullscreenProgram::Bold => (
                "cad_bold_pipeline",
                &self.bold_layout,
                &self.bold_shader,
                TextureFormat::Rgba8Unorm,
            ),
            FullscreenProgram::Composite => (
                "cad_composite_pipeline",
                &self.composite_layout,
                &self.composite_shader,
                view_format(key.hdr),
            ),
        };

        RenderPipelineDescriptor {
            label: Some(label.into()),
            layout: vec![layout.clone()],
            vertex: fullscreen_shader_vertex_state(),
            fragment: Some(FragmentState {
                shader: shader.clone(),
                shader_defs: vec![],
                entry_point: "fragment".into(),
                targets: vec![Some(ColorTargetState {
                    format,
                    blend: None,
                    write_mask: ColorWrites::ALL,
                })],
            }),
            primitive: PrimitiveState::default(),
            depth_stencil: None,
            multisample: MultisampleState::default(),
            push_constant_ranges: vec![],
            zero_initialize_workgroup_memory: false,
        }
    }
}

/// Fullscreen pipeline ids for one view.
#[derive(Component, Clone, Copy)]
pub struct ViewCadPipelines {
    pub copy: CachedRenderPipelineId,
    pub bold: CachedRenderPipelineId,
    pub composite: CachedRenderPipelineId,
}

impl ViewCadPipelines {
    pub fn get(&self, program: FullscreenProgram) -> CachedRenderPipelineId {
        match program {
            FullscreenProgram::Copy => self.copy,
            FullscreenProgram::Bold => self.bold,
            FullscreenProgram::Composite => self.composite,
        }
    }
}

pub fn prepare_cad_fullscreen_pipelines(
    mut commands: Commands,
    pipeline_cache: Res<PipelineCache>,
    mut pipelines: ResMut<SpecializedRenderPipelines<CadFullscreenPipeline>>,
    fullscreen_pipeline: Res<CadFullscreenPipeline>,
    views: Query<(Entity, &ExtractedView), With<ExtractedCadPass>>,
) {
    for (entity, view) in &views {
        let mut specialize = |program| {
            pipelines.specialize(
                &pipeline_cache,
                &fullscreen_pipeline,
                CadFullscreenKey {
                    program,
                    hdr: view.hdr,
                },
            )
        };
        let view_pipelines = ViewCadPipelines {
            copy: specialize(FullscreenProgram::Copy),
            bold: specialize(FullscreenProgram::Bold),
            composite: specialize(FullscreenProgram::Composite),
        };
        commands.entity(entity).insert(view_pipelines);
    }
}
