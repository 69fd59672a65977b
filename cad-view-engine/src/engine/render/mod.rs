//! Rendering systems for section-clipped solids and classified edges.
//!
//! The main pass shades the scene with [`section_material::SectionMaterial`];
//! the edge compositor then redraws edge lines on top of the tonemapped frame.

/// Multi-pass edge compositor running after tonemapping.
///
/// Packs solid depth, classifies line fragments as visible or hidden, widens
/// the coverage and composites it over the shaded snapshot.
pub mod cad_pass;

/// PBR material extension discarding fragments behind the active clip plane.
pub mod section_material;
