//! CPU mirrors of the compositor shader math.
//!
//! Each function here has a WGSL twin in `assets/shaders/cad_*.wgsl`; keep
//! the two in lockstep.

use bevy::prelude::*;
use constants::render_settings::{
    BOLD_NEIGHBOUR_WEIGHT, BOLD_SATURATION, EDGE_DEPTH_EPSILON, HIDDEN_EDGE_TONE,
    SILHOUETTE_THICKNESS, SILHOUETTE_TONE, VISIBLE_EDGE_DARKEN,
};

use super::settings::CadPassSettings;

const PACK_FACTORS: Vec4 = Vec4::new(1.0, 255.0, 65025.0, 16581375.0);
const UNPACK_FACTORS: Vec4 = Vec4::new(1.0, 1.0 / 255.0, 1.0 / 65025.0, 1.0 / 16581375.0);

/// Packs a `[0, 1]` depth into four base-255 fractional digits.
/// Depth at or beyond the far plane packs to all ones.
pub fn pack_depth(depth: f32) -> Vec4 {
    if depth >= 1.0 {
        return Vec4::ONE;
    }
    let encoded = (PACK_FACTORS * depth.max(0.0)).fract();
    encoded - Vec4::new(encoded.y, encoded.z, encoded.w, 0.0) / 255.0
}

pub fn unpack_depth(rgba: Vec4) -> f32 {
    if rgba.cmpge(Vec4::ONE).all() {
        return 1.0;
    }
    rgba.dot(UNPACK_FACTORS)
}

/// Linear `[0, 1]` depth of a positive view-space distance.
pub fn view_depth_to_orthographic(view_depth: f32, near: f32, far: f32) -> f32 {
    (view_depth - near) / (far - near)
}

pub fn orthographic_to_view_depth(depth: f32, near: f32, far: f32) -> f32 {
    depth * (far - near) + near
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeClass {
    Visible,
    Hidden,
    Suppressed,
}

impl EdgeClass {
    /// Encoding written into the edge buffer: red = visible, green = hidden.
    pub fn rgba(self) -> Vec4 {
        match self {
            Self::Visible => Vec4::new(1.0, 0.0, 0.0, 1.0),
            Self::Hidden => Vec4::new(0.0, 1.0, 0.0, 1.0),
            Self::Suppressed => Vec4::new(0.0, 0.0, 0.0, 1.0),
        }
    }
}

/// Classifies a line fragment against the nearest solid surface. Both
/// depths are positive view-space distances from the camera.
pub fn classify_edge(
    fragment_view_depth: f32,
    stored_view_depth: f32,
    settings: &CadPassSettings,
) -> EdgeClass {
    if settings.transparent {
        return EdgeClass::Visible;
    }
    if fragment_view_depth - stored_view_depth > EDGE_DEPTH_EPSILON {
        if settings.hidden_edge {
            EdgeClass::Hidden
        } else {
            EdgeClass::Suppressed
        }
    } else {
        EdgeClass::Visible
    }
}

/// Value left in the edge buffer when another line fragment lands on an
/// already classified texel. The pass blends with a per-channel maximum.
pub fn merge_edge_fragment(stored: Vec4, fragment: Vec4) -> Vec4 {
    stored.max(fragment)
}

/// Sorts five coverage samples descending and folds them with the
/// over operator, starting from the weakest sample.
pub fn accumulate_sorted(mut samples: [f32; 5]) -> f32 {
    samples.sort_by(|a, b| b.total_cmp(a));
    let mut coverage = samples[4];
    for sample in samples[..4].iter().rev() {
        coverage = coverage * (1.0 - sample) + sample;
    }
    coverage
}

/// Widened coverage of one edge channel from the centre texel and its four
/// axis neighbours.
pub fn bold_coverage(centre: f32, neighbours: [f32; 4]) -> f32 {
    if centre > BOLD_SATURATION {
        return centre;
    }
    let [n0, n1, n2, n3] = neighbours.map(|n| n * BOLD_NEIGHBOUR_WEIGHT);
    accumulate_sorted([centre, n0, n1, n2, n3])
}

/// Final pixel from the origin snapshot and the bold coverage
/// (`x` = visible, `y` = hidden).
pub fn composite_pixel(origin: Vec4, coverage: Vec2, settings: &CadPassSettings) -> Vec4 {
    let visible = if settings.visible_edge { coverage.x } else { 0.0 };
    if visible > 0.0 {
        return (origin.truncate() * (1.0 - visible * VISIBLE_EDGE_DARKEN)).extend(1.0);
    }
    let hidden = if settings.hidden_edge { coverage.y } else { 0.0 };
    if hidden > 0.0 {
        let blended = origin.truncate() * (1.0 - hidden) + Vec3::splat(HIDDEN_EDGE_TONE) * hidden;
        return blended.extend(1.0);
    }
    origin
}

/// Pushes a back-face vertex outward along its projected normal. The
/// offset is scaled by `w` so the outline keeps a constant screen width.
pub fn silhouette_offset(clip_position: Vec4, clip_normal: Vec2) -> Vec4 {
    let Some(direction) = clip_normal.try_normalize() else {
        return clip_position;
    };
    let offset = direction * SILHOUETTE_THICKNESS * clip_position.w * 0.5;
    (clip_position.xy() + offset).extend(clip_position.z).extend(clip_position.w)
}

pub fn silhouette_colour() -> Vec4 {
    Vec3::splat(SILHOUETTE_TONE).extend(1.0)
}

/// Maps clip-space `[-1, 1]` onto texture space `[0, 1]` with a top-left
/// origin.
pub fn texture_bias_matrix() -> Mat4 {
    Mat4::from_cols(
        Vec4::new(0.5, 0.0, 0.0, 0.0),
        Vec4::new(0.0, -0.5, 0.0, 0.0),
        Vec4::new(0.0, 0.0, 1.0, 0.0),
        Vec4::new(0.5, 0.5, 0.0, 1.0),
    )
}

/// Projects world positions into the depth buffer's texture space.
pub fn texture_matrix(clip_from_view: Mat4, view_from_world: Mat4) -> Mat4 {
    texture_bias_matrix() * clip_from_view * view_from_world
}

#[cfg(test)]
pub(crate) fn quantize_unorm8(value: Vec4) -> Vec4 {
    (value.clamp(Vec4::ZERO, Vec4::ONE) * 255.0).round() / 255.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use constants::camera::{FAR, NEAR};

    const EPS: f32 = 1e-5;

    /// Stored view depth after a trip through the 8-bit depth buffer.
    fn stored_view_depth(view_depth: f32) -> f32 {
        let packed = pack_depth(view_depth_to_orthographic(view_depth, NEAR, FAR));
        orthographic_to_view_depth(unpack_depth(quantize_unorm8(packed)), NEAR, FAR)
    }

    fn with_hidden_edges() -> CadPassSettings {
        CadPassSettings {
            hidden_edge: true,
            ..default()
        }
    }

    #[test]
    fn packed_depth_survives_eight_bit_storage() {
        for depth in [0.0, 0.0049, 0.25, 0.5, 0.731, 0.999] {
            let restored = unpack_depth(quantize_unorm8(pack_depth(depth)));
            assert!((restored - depth).abs() < 1e-4, "{depth} -> {restored}");
        }
    }

    #[test]
    fn silhouette_offset_is_screen_constant() {
        let near = silhouette_offset(Vec4::new(0.2, 0.1, 0.5, 1.0), Vec2::new(3.0, 0.0));
        let far = silhouette_offset(Vec4::new(0.4, 0.2, 0.5, 2.0), Vec2::new(3.0, 0.0));

        assert!((near.x / near.w - (0.2 + SILHOUETTE_THICKNESS * 0.5)).abs() < EPS);
        assert!((far.x / far.w - (0.2 + SILHOUETTE_THICKNESS * 0.5)).abs() < EPS);
        assert_eq!(near.zw(), Vec2::new(0.5, 1.0));

        let flat = Vec4::new(0.1, 0.1, 0.1, 1.0);
        assert_eq!(silhouette_offset(flat, Vec2::ZERO), flat);
        assert_eq!(silhouette_colour().x, SILHOUETTE_TONE);
    }

    #[test]
    fn far_plane_packs_to_white() {
        assert_eq!(pack_depth(1.0), Vec4::ONE);
        assert_eq!(pack_depth(3.0), Vec4::ONE);
        assert_eq!(unpack_depth(Vec4::ONE), 1.0);
    }

    #[test]
    fn orthographic_depth_round_trip() {
        let depth = view_depth_to_orthographic(42.0, NEAR, FAR);
        assert!((orthographic_to_view_depth(depth, NEAR, FAR) - 42.0).abs() < 1e-3);
        assert!(view_depth_to_orthographic(NEAR, NEAR, FAR).abs() < EPS);
    }

    #[test]
    fn nearer_line_is_visible() {
        let stored = stored_view_depth(5.2);
        let class = classify_edge(5.0, stored, &with_hidden_edges());

        assert_eq!(class, EdgeClass::Visible);
        assert_eq!(class.rgba().x, 1.0);
    }

    #[test]
    fn occluded_line_is_hidden() {
        let stored = stored_view_depth(4.8);
        let class = classify_edge(5.0, stored, &with_hidden_edges());

        assert_eq!(class, EdgeClass::Hidden);
        assert_eq!(class.rgba().y, 1.0);
    }

    #[test]
    fn occluded_line_is_suppressed_without_hidden_edges() {
        let class = classify_edge(5.0, stored_view_depth(4.8), &CadPassSettings::default());
        assert_eq!(class, EdgeClass::Suppressed);
        assert_eq!(class.rgba().truncate(), Vec3::ZERO);
    }

    #[test]
    fn line_within_epsilon_of_surface_is_visible() {
        let class = classify_edge(5.05, 5.0, &with_hidden_edges());
        assert_eq!(class, EdgeClass::Visible);
    }

    #[test]
    fn transparent_forces_visible() {
        let settings = CadPassSettings {
            transparent: true,
            ..with_hidden_edges()
        };
        assert_eq!(classify_edge(50.0, 5.0, &settings), EdgeClass::Visible);
    }

    #[test]
    fn overlapping_visible_edge_survives_any_draw_order() {
        let settings = with_hidden_edges();
        let visible = EdgeClass::Visible.rgba();
        let hidden = EdgeClass::Hidden.rgba();
        let suppressed = EdgeClass::Suppressed.rgba();
        let cleared = Vec4::new(0.0, 0.0, 0.0, 1.0);

        let front_first = merge_edge_fragment(merge_edge_fragment(cleared, visible), hidden);
        let back_first = merge_edge_fragment(merge_edge_fragment(cleared, hidden), visible);
        assert_eq!(front_first, back_first);
        assert_eq!(merge_edge_fragment(visible, suppressed), visible);

        let coverage = Vec2::new(
            bold_coverage(front_first.x, [0.0; 4]),
            bold_coverage(front_first.y, [0.0; 4]),
        );
        let origin = Vec4::new(0.8, 0.8, 0.8, 1.0);
        let pixel = composite_pixel(origin, coverage, &settings);
        let darkened = (origin.truncate() * (1.0 - VISIBLE_EDGE_DARKEN)).extend(1.0);
        assert!((pixel - darkened).length() < EPS);
    }

    #[test]
    fn bold_of_equal_binary_samples_is_identity() {
        for v in [0.0, 1.0] {
            assert_eq!(accumulate_sorted([v; 5]), v);
            assert_eq!(bold_coverage(v, [v; 4]), v);
        }
    }

    #[test]
    fn bold_widens_a_neighbouring_edge() {
        let coverage = bold_coverage(0.0, [1.0, 0.0, 0.0, 0.0]);
        assert!((coverage - BOLD_NEIGHBOUR_WEIGHT).abs() < EPS);

        let two = bold_coverage(0.0, [1.0, 1.0, 0.0, 0.0]);
        assert!((two - 0.36).abs() < EPS);
    }

    #[test]
    fn bold_fold_is_order_independent() {
        let a = accumulate_sorted([0.1, 0.7, 0.0, 0.3, 0.2]);
        let b = accumulate_sorted([0.3, 0.2, 0.7, 0.1, 0.0]);
        assert_eq!(a, b);
    }

    #[test]
    fn composite_without_coverage_is_origin() {
        let origin = Vec4::new(0.2, 0.4, 0.6, 0.8);
        let settings = CadPassSettings {
            hidden_edge: true,
            ..default()
        };
        assert_eq!(composite_pixel(origin, Vec2::ZERO, &settings), origin);
    }

    #[test]
    fn visible_coverage_darkens() {
        let origin = Vec4::new(1.0, 0.5, 0.25, 1.0);
        let out = composite_pixel(origin, Vec2::new(1.0, 1.0), &with_hidden_edges());

        let expected = origin.truncate() * (1.0 - VISIBLE_EDGE_DARKEN);
        assert!((out.truncate() - expected).length() < EPS);
        assert_eq!(out.w, 1.0);
    }

    #[test]
    fn hidden_coverage_blends_towards_grey() {
        let origin = Vec4::new(0.0, 0.0, 0.0, 1.0);
        let out = composite_pixel(origin, Vec2::new(0.0, 1.0), &with_hidden_edges());
        assert!((out.truncate() - Vec3::splat(HIDDEN_EDGE_TONE)).length() < EPS);

        let disabled = composite_pixel(origin, Vec2::new(0.0, 1.0), &CadPassSettings::default());
        assert_eq!(disabled, origin);
    }

    #[test]
    fn bias_maps_clip_corners_to_texture_corners() {
        let bias = texture_bias_matrix();
        let top_left = bias * Vec4::new(-1.0, 1.0, 0.5, 1.0);
        let bottom_right = bias * Vec4::new(1.0, -1.0, 0.5, 1.0);

        assert!((top_left.truncate().truncate() - Vec2::ZERO).length() < EPS);
        assert!((bottom_right.truncate().truncate() - Vec2::ONE).length() < EPS);
    }

    #[test]
    fn texture_matrix_centres_the_view_axis() {
        let projection = Mat4::orthographic_rh(-10.0, 10.0, -10.0, 10.0, NEAR, FAR);
        let view = Mat4::look_at_rh(Vec3::new(0.0, 0.0, 50.0), Vec3::ZERO, Vec3::Y);
        let projected = texture_matrix(projection, view) * Vec4::new(0.0, 0.0, 0.0, 1.0);
        let uv = projected.truncate().truncate() / projected.w;

        assert!((uv - Vec2::splat(0.5)).length() < EPS);
    }
}
