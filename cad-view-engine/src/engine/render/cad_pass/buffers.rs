use bevy::prelude::*;
use bevy::render::render_resource::{
    Extent3d, TextureDescriptor, TextureDimension, TextureFormat, TextureUsages, TextureView,
};
use bevy::render::renderer::RenderDevice;
use bevy::render::texture::{CachedTexture, TextureCache};
use bevy::render::view::ViewTarget;

use super::passes::BufferSlot;

/// Format of the main view texture the compositor reads from and writes back to.
pub fn view_format(hdr: bool) -> TextureFormat {
    if hdr {
        ViewTarget::TEXTURE_FORMAT_HDR
    } else {
        TextureFormat::bevy_default()
    }
}

/// Shared extent of every offscreen target. Buffers are only ever allocated
/// from a layout, so the set cannot disagree on size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferSetLayout {
    size: UVec2,
}

impl Default for BufferSetLayout {
    fn default() -> Self {
        Self { size: UVec2::ONE }
    }
}

impl BufferSetLayout {
    pub fn new(logical_size: Vec2, scale_factor: f32) -> Self {
        let mut layout = Self::default();
        layout.resize(logical_size, scale_factor);
        layout
    }

    /// Recomputes the physical extent. Returns whether it changed.
    pub fn resize(&mut self, logical_size: Vec2, scale_factor: f32) -> bool {
        let physical = (logical_size * scale_factor).round().max(Vec2::ONE);
        let size = UVec2::new(physical.x as u32, physical.y as u32);
        let changed = size != self.size;
        self.size = size;
        changed
    }

    pub fn size(&self) -> UVec2 {
        self.size
    }

    pub fn extent(&self) -> Extent3d {
        Extent3d {
            width: self.size.x,
            height: self.size.y,
            depth_or_array_layers: 1,
        }
    }

    pub fn format(&self, slot: BufferSlot, hdr: bool) -> TextureFormat {
        match slot {
            BufferSlot::Origin | BufferSlot::Frame => view_format(hdr),
            BufferSlot::Depth | BufferSlot::Edge | BufferSlot::EdgeAccum => {
                TextureFormat::Rgba8Unorm
            }
            BufferSlot::DepthStencil => TextureFormat::Depth32Float,
        }
    }

    pub fn descriptor(&self, slot: BufferSlot, hdr: bool) -> TextureDescriptor<'static> {
        let usage = match slot {
            BufferSlot::DepthStencil => TextureUsages::RENDER_ATTACHMENT,
            _ => TextureUsages::RENDER_ATTACHMENT | TextureUsages::TEXTURE_BINDING,
        };
        TextureDescriptor {
            label: Some(slot.label()),
            size: self.extent(),
            mip_level_count: 1,
            sample_count: 1,
            dimension: TextureDimension::D2,
            format: self.format(slot, hdr),
            usage,
            view_formats: &[],
        }
    }
}

/// Offscreen targets of one view for the current frame.
#[derive(Clone)]
pub struct ViewCadBuffers {
    pub layout: BufferSetLayout,
    pub origin: CachedTexture,
    pub depth: CachedTexture,
    pub edge: CachedTexture,
    pub edge_accum: CachedTexture,
    pub frame: CachedTexture,
    pub depth_stencil: CachedTexture,
}

impl ViewCadBuffers {
    pub fn allocate(
        layout: BufferSetLayout,
        hdr: bool,
        texture_cache: &mut TextureCache,
        render_device: &RenderDevice,
    ) -> Self {
        let mut get = |slot: BufferSlot| texture_cache.get(render_device, layout.descriptor(slot, hdr));
        Self {
            layout,
            origin: get(BufferSlot::Origin),
            depth: get(BufferSlot::Depth),
            edge: get(BufferSlot::Edge),
            edge_accum: get(BufferSlot::EdgeAccum),
            frame: get(BufferSlot::Frame),
            depth_stencil: get(BufferSlot::DepthStencil),
        }
    }

    pub fn view(&self, slot: BufferSlot) -> &TextureView {
        let texture = match slot {
            BufferSlot::Origin => &self.origin,
            BufferSlot::Depth => &self.depth,
            BufferSlot::Edge => &self.edge,
            BufferSlot::EdgeAccum => &self.edge_accum,
            BufferSlot::Frame => &self.frame,
            BufferSlot::DepthStencil => &self.depth_stencil,
        };
        &texture.default_view
    }
}
