use crate::engine::scene::node_kind::NodeKind;

/// Offscreen targets of the buffer set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BufferSlot {
    Origin,
    Depth,
    Edge,
    EdgeAccum,
    Frame,
    DepthStencil,
}

impl BufferSlot {
    pub const ALL: [BufferSlot; 6] = [
        BufferSlot::Origin,
        BufferSlot::Depth,
        BufferSlot::Edge,
        BufferSlot::EdgeAccum,
        BufferSlot::Frame,
        BufferSlot::DepthStencil,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Origin => "cad_origin_buffer",
            Self::Depth => "cad_depth_buffer",
            Self::Edge => "cad_edge_buffer",
            Self::EdgeAccum => "cad_edge_accum_buffer",
            Self::Frame => "cad_frame_buffer",
            Self::DepthStencil => "cad_depth_stencil_buffer",
        }
    }
}

/// Where a pass reads from or writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassTarget {
    ViewTarget,
    Buffer(BufferSlot),
}

/// Compositor passes in frame order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CadPassId {
    Snapshot,
    Depth,
    Silhouette,
    EdgeClassify,
    Bold,
    Composite,
    Present,
}

/// Mesh passes drawn from the compositor's sorted phase. The discriminant
/// is the primary sort key, so all items of one pass are contiguous.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MeshPass {
    Depth = 0,
    Silhouette = 1,
    EdgeClassify = 2,
}

impl MeshPass {
    pub const ALL: [MeshPass; 3] = [MeshPass::Depth, MeshPass::Silhouette, MeshPass::EdgeClassify];

    /// Scene nodes this pass draws; everything else is skipped at queue time.
    pub fn node_kind(self) -> NodeKind {
        match self {
            Self::Depth | Self::Silhouette => NodeKind::Solid,
            Self::EdgeClassify => NodeKind::Line,
        }
    }

    pub fn pass_id(self) -> CadPassId {
        match self {
            Self::Depth => CadPassId::Depth,
            Self::Silhouette => CadPassId::Silhouette,
            Self::EdgeClassify => CadPassId::EdgeClassify,
        }
    }
}

impl CadPassId {
    pub const FRAME_ORDER: [CadPassId; 7] = [
        CadPassId::Snapshot,
        CadPassId::Depth,
        CadPassId::Silhouette,
        CadPassId::EdgeClassify,
        CadPassId::Bold,
        CadPassId::Composite,
        CadPassId::Present,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Snapshot => "cad_snapshot_pass",
            Self::Depth => "cad_depth_pass",
            Self::Silhouette => "cad_silhouette_pass",
            Self::EdgeClassify => "cad_edge_classify_pass",
            Self::Bold => "cad_bold_pass",
            Self::Composite => "cad_composite_pass",
            Self::Present => "cad_present_pass",
        }
    }

    pub fn mesh_pass(self) -> Option<MeshPass> {
        match self {
            Self::Depth => Some(MeshPass::Depth),
            Self::Silhouette => Some(MeshPass::Silhouette),
            Self::EdgeClassify => Some(MeshPass::EdgeClassify),
            _ => None,
        }
    }

    pub fn reads(self) -> &'static [PassTarget] {
        use BufferSlot::*;
        match self {
            Self::Snapshot => &[PassTarget::ViewTarget],
            Self::Depth => &[],
            Self::Silhouette => &[PassTarget::Buffer(DepthStencil)],
            Self::EdgeClassify => &[PassTarget::Buffer(Depth)],
            Self::Bold => &[PassTarget::Buffer(Edge)],
            Self::Composite => &[PassTarget::Buffer(Origin), PassTarget::Buffer(EdgeAccum)],
            Self::Present => &[PassTarget::Buffer(Frame)],
        }
    }

    pub fn writes(self) -> &'static [PassTarget] {
        use BufferSlot::*;
        match self {
            Self::Snapshot => &[PassTarget::Buffer(Origin)],
            Self::Depth => &[PassTarget::Buffer(Depth), PassTarget::Buffer(DepthStencil)],
            Self::Silhouette => &[PassTarget::Buffer(Origin)],
            Self::EdgeClassify => &[PassTarget::Buffer(Edge)],
            Self::Bold => &[PassTarget::Buffer(EdgeAccum)],
            Self::Composite => &[PassTarget::Buffer(Frame)],
            Self::Present => &[PassTarget::ViewTarget],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_read_is_produced_earlier_in_the_frame() {
        let mut written = vec![PassTarget::ViewTarget];
        for pass in CadPassId::FRAME_ORDER {
            for read in pass.reads() {
                assert!(written.contains(read), "{pass:?} reads {read:?} before it is written");
            }
            written.extend_from_slice(pass.writes());
        }
    }

    #[test]
    fn frame_order_is_sorted_and_complete() {
        let mut sorted = CadPassId::FRAME_ORDER;
        sorted.sort();
        assert_eq!(sorted, CadPassId::FRAME_ORDER);
    }

    #[test]
    fn every_buffer_is_written() {
        for slot in BufferSlot::ALL {
            let target = PassTarget::Buffer(slot);
            assert!(
                CadPassId::FRAME_ORDER.iter().any(|pass| pass.writes().contains(&target)),
                "{slot:?} is never written"
            );
        }
    }

    #[test]
    fn mesh_passes_select_by_kind() {
        assert_eq!(MeshPass::Depth.node_kind(), NodeKind::Solid);
        assert_eq!(MeshPass::EdgeClassify.node_kind(), NodeKind::Line);
        for mesh_pass in MeshPass::ALL {
            assert_eq!(mesh_pass.pass_id().mesh_pass(), Some(mesh_pass));
        }
    }
}
