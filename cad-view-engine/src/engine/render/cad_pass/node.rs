use bevy::ecs::query::QueryItem;
use bevy::prelude::*;
use bevy::render::render_graph::{NodeRunError, RenderGraphContext, RenderLabel, ViewNode};
use bevy::render::render_phase::ViewSortedRenderPhases;
use bevy::render::render_resource::{
    BindGroup, BindGroupEntries, LoadOp, Operations, PipelineCache, RenderPassColorAttachment,
    RenderPassDepthStencilAttachment, RenderPassDescriptor, RenderPipeline, StoreOp, TextureView,
};
use bevy::render::renderer::RenderContext;
use bevy::render::view::{ExtractedView, ViewTarget};

use super::fullscreen::{CadFullscreenPipeline, FullscreenProgram, ViewCadPipelines};
use super::mesh_phase::{CadMeshPhase, mesh_pass_range};
use super::passes::{BufferSlot, CadPassId, MeshPass, PassTarget};
use super::prepare::ViewCadPassResources;
use super::settings::ExtractedCadPass;

#[derive(Debug, Hash, PartialEq, Eq, Clone, RenderLabel)]
pub struct CadPassLabel;

/// Runs the whole compositor sequence for one view.
#[derive(Default)]
pub struct CadPassNode;

impl ViewNode for CadPassNode {
    type ViewQuery = (
        &'static ExtractedView,
        &'static ViewTarget,
        &'static ExtractedCadPass,
        &'static ViewCadPassResources,
        &'static ViewCadPipelines,
    );

    fn run(
        &self,
        graph: &mut RenderGraphContext,
        render_context: &mut RenderContext,
        (view, view_target, cad_pass, resources, view_pipelines): QueryItem<Self::ViewQuery>,
        world: &World,
    ) -> Result<(), NodeRunError> {
        let Some(phases) = world.get_resource::<ViewSortedRenderPhases<CadMeshPhase>>() else {
            return Ok(());
        };
        let Some(phase) = phases.get(&view.retained_view_entity) else {
            return Ok(());
        };

        let pipeline_cache = world.resource::<PipelineCache>();
        let fullscreen = world.resource::<CadFullscreenPipeline>();

        // Leave the frame untouched until every fullscreen program is compiled.
        let (Some(copy), Some(bold), Some(composite)) = (
            pipeline_cache.get_render_pipeline(view_pipelines.get(FullscreenProgram::Copy)),
            pipeline_cache.get_render_pipeline(view_pipelines.get(FullscreenProgram::Bold)),
            pipeline_cache.get_render_pipeline(view_pipelines.get(FullscreenProgram::Composite)),
        ) else {
            return Ok(());
        };
        if phase
            .items
            .iter()
            .any(|item| pipeline_cache.get_render_pipeline(item.pipeline).is_none())
        {
            return Ok(());
        }

        let view_entity = graph.view_entity();
        let buffers = &resources.buffers;
        let device = render_context.render_device().clone();
        let main_texture = view_target.main_texture_view();

        let target_view = |target: PassTarget| -> &TextureView {
            match target {
                PassTarget::ViewTarget => main_texture,
                PassTarget::Buffer(slot) => buffers.view(slot),
            }
        };

        for pass_id in CadPassId::FRAME_ORDER {
            if pass_id == CadPassId::Silhouette && !cad_pass.settings.draws_silhouette() {
                continue;
            }
            let color_target = target_view(pass_id.writes()[0]);

            if let Some(mesh_pass) = pass_id.mesh_pass() {
                let range = mesh_pass_range(&phase.items, mesh_pass, |item| item.pass);
                let (color_load, depth_ops) = match mesh_pass {
                    MeshPass::Depth => (
                        LoadOp::Clear(LinearRgba::WHITE.into()),
                        Some(Operations {
                            load: LoadOp::Clear(0.0),
                            store: StoreOp::Store,
                        }),
                    ),
                    MeshPass::Silhouette => (
                        LoadOp::Load,
                        Some(Operations {
                            load: LoadOp::Load,
                            store: StoreOp::Discard,
                        }),
                    ),
                    MeshPass::EdgeClassify => {
                        (LoadOp::Clear(LinearRgba::BLACK.into()), None)
                    }
                };

                let depth_stencil_attachment = depth_ops.map(|depth_ops| {
                    RenderPassDepthStencilAttachment {
                        view: buffers.view(BufferSlot::DepthStencil),
                        depth_ops: Some(depth_ops),
                        stencil_ops: None,
                    }
                });

                let mut render_pass =
                    render_context.begin_tracked_render_pass(RenderPassDescriptor {
                        label: Some(pass_id.label()),
                        color_attachments: &[Some(RenderPassColorAttachment {
                            view: color_target,
                            resolve_target: None,
                            ops: Operations {
                                load: color_load,
                                store: StoreOp::Store,
                            },
                        })],
                        depth_stencil_attachment,
                        timestamp_writes: None,
                        occlusion_query_set: None,
                    });

                if let Err(draw_err) = phase.render_range(&mut render_pass, world, view_entity, range)
                {
                    error!("CAD {:?} pass failed: {:?}", mesh_pass, draw_err);
                    return Err(NodeRunError::DrawError(draw_err));
                }
                continue;
            }

            let (pipeline, bind_group): (&RenderPipeline, BindGroup) = match pass_id
                .fullscreen_program()
            {
                Some(FullscreenProgram::Copy) => (
                    copy,
                    device.create_bind_group(
                        "cad_copy_bind_group",
                        &fullscreen.copy_layout,
                        &BindGroupEntries::sequential((
                            target_view(pass_id.reads()[0]),
                            &fullscreen.sampler,
                        )),
                    ),
                ),
                Some(FullscreenProgram::Bold) => (
                    bold,
                    device.create_bind_group(
                        "cad_bold_bind_group",
                        &fullscreen.bold_layout,
                        &BindGroupEntries::sequential((
                            buffers.view(BufferSlot::Edge),
                            &fullscreen.sampler,
                            resources.uniform.as_entire_binding(),
                        )),
                    ),
                ),
                Some(FullscreenProgram::Composite) => (
                    composite,
                    device.create_bind_group(
                        "cad_composite_bind_group",
                        &fullscreen.composite_layout,
                        &BindGroupEntries::sequential((
                            buffers.view(BufferSlot::Origin),
                            buffers.view(BufferSlot::EdgeAccum),
                            &fullscreen.sampler,
                            resources.uniform.as_entire_binding(),
                        )),
                    ),
                ),
                None => continue,
            };

            let mut render_pass = render_context.begin_tracked_render_pass(RenderPassDescriptor {
                label: Some(pass_id.label()),
                color_attachments: &[Some(RenderPassColorAttachment {
                    view: color_target,
                    resolve_target: None,
                    ops: Operations::default(),
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            render_pass.set_render_pipeline(pipeline);
            render_pass.set_bind_group(0, &bind_group, &[]);
            render_pass.draw(0..3, 0..1);
        }

        Ok(())
    }
}
