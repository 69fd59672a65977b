//! Scene content and per-node render categories.

/// Demo scene: a hexagonal ring of walls and a box with feature-edge lines.
pub mod demo_model;

/// `NodeKind` classification used by the compositor's pass filters.
pub mod node_kind;
