use bevy::pbr::{ExtendedMaterial, MaterialExtension};
use bevy::prelude::*;
use bevy::render::extract_resource::ExtractResource;
use bevy::render::render_resource::{AsBindGroup, ShaderRef};

use crate::engine::geometry::plane::ClipPlane;

const SECTION_CLIP_SHADER_PATH: &str = "shaders/section_clip.wgsl";

/// Standard PBR surface that discards fragments behind the active clip plane.
pub type SectionMaterial = ExtendedMaterial<StandardMaterial, SectionClipExtension>;

#[derive(Asset, AsBindGroup, Reflect, Debug, Clone)]
pub struct SectionClipExtension {
    /// `(normal, constant)`; fragments with `dot(n, p) + c < 0` are discarded.
    #[uniform(100)]
    pub plane: Vec4,
}

impl Default for SectionClipExtension {
    fn default() -> Self {
        Self {
            plane: ClipPlane::DISABLED,
        }
    }
}

impl MaterialExtension for SectionClipExtension {
    fn fragment_shader() -> ShaderRef {
        SECTION_CLIP_SHADER_PATH.into()
    }

    fn deferred_fragment_shader() -> ShaderRef {
        SECTION_CLIP_SHADER_PATH.into()
    }
}

pub fn section_material(base: StandardMaterial) -> SectionMaterial {
    ExtendedMaterial {
        base,
        extension: SectionClipExtension::default(),
    }
}

/// Clip plane shared by section materials and the compositor.
#[derive(Resource, ExtractResource, Debug, Clone, Copy, PartialEq)]
pub struct SectionClip {
    pub plane: Vec4,
}

impl Default for SectionClip {
    fn default() -> Self {
        Self {
            plane: ClipPlane::DISABLED,
        }
    }
}

impl SectionClip {
    pub fn from_plane(plane: Option<ClipPlane>) -> Self {
        Self {
            plane: plane.map_or(ClipPlane::DISABLED, |plane| plane.to_vec4()),
        }
    }

    pub fn is_active(&self) -> bool {
        self.plane != ClipPlane::DISABLED
    }
}

/// Pushes the current clip plane into every section material.
pub fn sync_section_materials(
    section: Res<SectionClip>,
    mut materials: ResMut<Assets<SectionMaterial>>,
) {
    if !section.is_changed() {
        return;
    }
    for (_, material) in materials.iter_mut() {
        material.extension.plane = section.plane;
    }
}
