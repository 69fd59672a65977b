//! CPU rendition of the fullscreen passes over small images.

use bevy::prelude::*;

use super::edge_math::{bold_coverage, composite_pixel, quantize_unorm8};
use super::settings::CadPassSettings;

/// Row-major RGBA image.
#[derive(Debug, Clone, PartialEq)]
pub struct Image2d {
    pub size: UVec2,
    pub pixels: Vec<Vec4>,
}

impl Image2d {
    pub fn filled(size: UVec2, value: Vec4) -> Self {
        Self {
            size,
            pixels: vec![value; (size.x * size.y) as usize],
        }
    }

    fn index(&self, x: u32, y: u32) -> usize {
        (y * self.size.x + x) as usize
    }

    pub fn get(&self, x: u32, y: u32) -> Vec4 {
        self.pixels[self.index(x, y)]
    }

    /// Clamp-to-edge fetch, as the nearest sampler does.
    pub fn fetch(&self, x: i32, y: i32) -> Vec4 {
        let x = x.clamp(0, self.size.x as i32 - 1) as u32;
        let y = y.clamp(0, self.size.y as i32 - 1) as u32;
        self.get(x, y)
    }

    pub fn set(&mut self, x: u32, y: u32, value: Vec4) {
        let index = self.index(x, y);
        self.pixels[index] = value;
    }
}

pub fn bold(edge: &Image2d) -> Image2d {
    let mut out = Image2d::filled(edge.size, Vec4::ZERO);
    for y in 0..edge.size.y {
        for x in 0..edge.size.x {
            let (xi, yi) = (x as i32, y as i32);
            let centre = edge.fetch(xi, yi);
            let neighbours = [
                edge.fetch(xi + 1, yi),
                edge.fetch(xi - 1, yi),
                edge.fetch(xi, yi + 1),
                edge.fetch(xi, yi - 1),
            ];
            let visible = bold_coverage(centre.x, neighbours.map(|n| n.x));
            let hidden = bold_coverage(centre.y, neighbours.map(|n| n.y));
            out.set(x, y, quantize_unorm8(Vec4::new(visible, hidden, 0.0, 1.0)));
        }
    }
    out
}

pub fn composite(origin: &Image2d, accum: &Image2d, settings: &CadPassSettings) -> Image2d {
    let pixels = origin
        .pixels
        .iter()
        .zip(&accum.pixels)
        .map(|(origin, coverage)| composite_pixel(*origin, coverage.truncate().truncate(), settings))
        .collect();
    Image2d {
        size: origin.size,
        pixels,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::render::cad_pass::edge_math::EdgeClass;
    use constants::render_settings::{BOLD_NEIGHBOUR_WEIGHT, VISIBLE_EDGE_DARKEN};

    const EPS: f32 = 1.0 / 255.0;

    fn edge_image_with_vertical_line(class: EdgeClass) -> Image2d {
        let mut edge = Image2d::filled(UVec2::new(7, 5), EdgeClass::Suppressed.rgba());
        for y in 0..5 {
            edge.set(3, y, class.rgba());
        }
        edge
    }

    #[test]
    fn identical_inputs_give_identical_frames() {
        let settings = CadPassSettings {
            hidden_edge: true,
            ..default()
        };
        let mut edge = edge_image_with_vertical_line(EdgeClass::Visible);
        edge.set(5, 2, EdgeClass::Hidden.rgba());
        let origin = Image2d::filled(edge.size, Vec4::new(0.3, 0.6, 0.9, 1.0));

        let first = composite(&origin, &bold(&edge), &settings);
        let second = composite(&origin, &bold(&edge), &settings);
        assert_eq!(first, second);
    }

    #[test]
    fn bold_widens_line_by_one_texel() {
        let accum = bold(&edge_image_with_vertical_line(EdgeClass::Visible));

        assert_eq!(accum.get(3, 2).x, 1.0);
        assert!((accum.get(2, 2).x - BOLD_NEIGHBOUR_WEIGHT).abs() < EPS);
        assert!((accum.get(4, 2).x - BOLD_NEIGHBOUR_WEIGHT).abs() < EPS);
        assert_eq!(accum.get(0, 2).x, 0.0);
        assert_eq!(accum.get(3, 2).y, 0.0);
    }

    #[test]
    fn empty_edge_buffer_leaves_origin() {
        let edge = Image2d::filled(UVec2::new(4, 4), EdgeClass::Suppressed.rgba());
        let origin = Image2d::filled(edge.size, Vec4::new(0.1, 0.2, 0.3, 1.0));

        let frame = composite(&origin, &bold(&edge), &CadPassSettings::default());
        assert_eq!(frame, origin);
    }

    #[test]
    fn visible_line_darkens_its_pixels() {
        let white = Vec4::ONE;
        let accum = bold(&edge_image_with_vertical_line(EdgeClass::Visible));
        let origin = Image2d::filled(accum.size, white);

        let frame = composite(&origin, &accum, &CadPassSettings::default());
        let on_line = frame.get(3, 1);
        assert!((on_line.x - (1.0 - VISIBLE_EDGE_DARKEN)).abs() < 1e-5);
        assert_eq!(frame.get(0, 1), white);
    }

    #[test]
    fn hidden_line_disappears_when_hidden_edges_are_off() {
        let accum = bold(&edge_image_with_vertical_line(EdgeClass::Hidden));
        let origin = Image2d::filled(accum.size, Vec4::new(0.5, 0.5, 0.5, 1.0));

        let frame = composite(&origin, &accum, &CadPassSettings::default());
        assert_eq!(frame, origin);
    }
}
