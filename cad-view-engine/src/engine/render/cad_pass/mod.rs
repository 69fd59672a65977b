//! Multi-pass edge compositor.
//!
//! Runs after tonemapping for every camera carrying [`CadPassSettings`]:
//! snapshots the shaded frame, renders packed depth of the solids,
//! classifies line fragments against it, widens the result and composites
//! the edges back over the snapshot. Pass order and buffer usage live in
//! [`passes`].

use bevy::core_pipeline::core_3d::graph::{Core3d, Node3d};
use bevy::pbr::MeshPipeline;
use bevy::prelude::*;
use bevy::render::extract_component::ExtractComponentPlugin;
use bevy::render::extract_resource::ExtractResourcePlugin;
use bevy::render::render_graph::{RenderGraphApp, ViewNodeRunner};
use bevy::render::render_phase::{
    AddRenderCommand, DrawFunctions, SortedRenderPhasePlugin, ViewSortedRenderPhases,
    sort_phase_system,
};
use bevy::render::render_resource::{SpecializedMeshPipelines, SpecializedRenderPipelines};
use bevy::render::{ExtractSchedule, Render, RenderApp, RenderDebugFlags, RenderSet};

use crate::engine::render::section_material::SectionClip;
use crate::engine::scene::node_kind::NodeKind;

pub mod buffers;
pub mod edge_math;
pub mod fullscreen;
pub mod mesh_phase;
pub mod node;
pub mod passes;
pub mod prepare;
pub mod settings;

#[cfg(test)]
mod reference;

use fullscreen::{CadFullscreenPipeline, prepare_cad_fullscreen_pipelines};
use mesh_phase::{
    CadMeshPhase, CadMeshPipeline, DrawCadMesh, extract_cad_camera_phases, queue_cad_meshes,
};
use node::{CadPassLabel, CadPassNode};
use prepare::prepare_cad_pass_resources;
pub use settings::CadPassSettings;

pub struct CadPassPlugin;

impl Plugin for CadPassPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins((
            ExtractComponentPlugin::<CadPassSettings>::default(),
            ExtractComponentPlugin::<NodeKind>::default(),
            ExtractResourcePlugin::<SectionClip>::default(),
            SortedRenderPhasePlugin::<CadMeshPhase, MeshPipeline>::new(RenderDebugFlags::default()),
        ));

        let Some(render_app) = app.get_sub_app_mut(RenderApp) else {
            return;
        };

        render_app
            .init_resource::<SpecializedMeshPipelines<CadMeshPipeline>>()
            .init_resource::<SpecializedRenderPipelines<CadFullscreenPipeline>>()
            .init_resource::<DrawFunctions<CadMeshPhase>>()
            .init_resource::<ViewSortedRenderPhases<CadMeshPhase>>()
            .add_render_command::<CadMeshPhase, DrawCadMesh>()
            .add_systems(ExtractSchedule, extract_cad_camera_phases)
            .add_systems(
                Render,
                (
                    queue_cad_meshes.in_set(RenderSet::QueueMeshes),
                    sort_phase_system::<CadMeshPhase>.in_set(RenderSet::PhaseSort),
                    prepare_cad_fullscreen_pipelines.in_set(RenderSet::Prepare),
                    prepare_cad_pass_resources.in_set(RenderSet::PrepareResources),
                ),
            )
            .add_render_graph_node::<ViewNodeRunner<CadPassNode>>(Core3d, CadPassLabel)
            .add_render_graph_edges(
                Core3d,
                (
                    Node3d::Tonemapping,
                    CadPassLabel,
                    Node3d::EndMainPassPostProcessing,
                ),
            );
    }

    fn finish(&self, app: &mut App) {
        let Some(render_app) = app.get_sub_app_mut(RenderApp) else {
            return;
        };

        render_app
            .init_resource::<CadMeshPipeline>()
            .init_resource::<CadFullscreenPipeline>();
    }
}
