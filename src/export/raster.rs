// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Offscreen rasterization of a composition.
//!
//! Produces the same picture the canvas shows, at the background's native
//! resolution: the background, then every field in order as outlined text.
//! Selection decorations are never drawn here.

use crate::error::{MemeError, Result};
use crate::io::media::LoadedImage;
use crate::models::composition::Composition;
use crate::models::field::{Font, Rgb, TextField};
use fontdue::layout::{CoordinateSystem, Layout, LayoutSettings, TextStyle};
use image::{Rgba, RgbaImage};
use std::collections::HashMap;

/// Width of the black outline around caption glyphs, in image pixels.
pub const STROKE_WIDTH: f32 = 2.0;

/// Parsed typefaces available to the rasterizer.
#[derive(Default)]
pub struct FontBook {
    faces: HashMap<Font, fontdue::Font>,
}

impl FontBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(&mut self, font: Font, bytes: &[u8]) -> Result<()> {
        let face = fontdue::Font::from_bytes(bytes, fontdue::FontSettings::default())
            .map_err(|e| MemeError::ResourceLoad {
                name: font.resource_name().to_string(),
                reason: e.to_string(),
            })?;
        self.faces.insert(font, face);
        Ok(())
    }

    pub fn get(&self, font: Font) -> Option<&fontdue::Font> {
        self.faces.get(&font)
    }

    pub fn len(&self) -> usize {
        self.faces.len()
    }
}

/// Single-channel coverage buffer placed at `(left, top)` in image space.
#[derive(Debug, Clone, PartialEq)]
struct Mask {
    left: i32,
    top: i32,
    width: usize,
    height: usize,
    data: Vec<u8>,
}

impl Mask {
    fn new(left: i32, top: i32, width: usize, height: usize) -> Self {
        Self {
            left,
            top,
            width,
            height,
            data: vec![0; width * height],
        }
    }

    fn get(&self, x: i32, y: i32) -> u8 {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return 0;
        }
        self.data[y as usize * self.width + x as usize]
    }

    fn max_in(&mut self, x: usize, y: usize, value: u8) {
        let slot = &mut self.data[y * self.width + x];
        *slot = (*slot).max(value);
    }

    /// Grow coverage by `radius` pixels in every direction.
    fn dilate(&self, radius: i32) -> Mask {
        let mut out = self.clone();
        let r2 = radius * radius;
        for y in 0..self.height as i32 {
            for x in 0..self.width as i32 {
                let mut best = 0u8;
                for dy in -radius..=radius {
                    for dx in -radius..=radius {
                        if dx * dx + dy * dy <= r2 {
                            best = best.max(self.get(x + dx, y + dy));
                        }
                    }
                }
                out.data[y as usize * self.width + x as usize] = best;
            }
        }
        out
    }
}

/// Straight-alpha source-over of `color` at coverage `alpha` onto `dst`.
fn blend(dst: &mut Rgba<u8>, color: Rgb, alpha: u8) {
    if alpha == 0 {
        return;
    }
    let sa = alpha as f32 / 255.0;
    let da = dst[3] as f32 / 255.0;
    let out_a = sa + da * (1.0 - sa);
    let mix = |s: u8, d: u8| -> u8 {
        let c = (s as f32 * sa + d as f32 * da * (1.0 - sa)) / out_a;
        c.round().clamp(0.0, 255.0) as u8
    };
    *dst = Rgba([
        mix(color.r, dst[0]),
        mix(color.g, dst[1]),
        mix(color.b, dst[2]),
        (out_a * 255.0).round() as u8,
    ]);
}

fn paint_mask(canvas: &mut RgbaImage, mask: &Mask, color: Rgb) {
    for my in 0..mask.height {
        let y = mask.top + my as i32;
        if y < 0 || y as u32 >= canvas.height() {
            continue;
        }
        for mx in 0..mask.width {
            let x = mask.left + mx as i32;
            if x < 0 || x as u32 >= canvas.width() {
                continue;
            }
            let coverage = mask.data[my * mask.width + mx];
            blend(canvas.get_pixel_mut(x as u32, y as u32), color, coverage);
        }
    }
}

/// Coverage of a field's glyphs, padded for the outline and clipped to a
/// `width` x `height` canvas. `None` when nothing would land on the canvas.
fn field_mask(
    field: &TextField,
    face: &fontdue::Font,
    pad: i32,
    width: u32,
    height: u32,
) -> Option<Mask> {
    let size = field.size as f32;
    let mut layout: Layout<()> = Layout::new(CoordinateSystem::PositiveYDown);
    layout.reset(&LayoutSettings {
        x: field.position.x,
        y: field.position.y,
        ..LayoutSettings::default()
    });
    layout.append(&[face], &TextStyle::new(&field.text, size, 0));

    let glyphs: Vec<_> = layout
        .glyphs()
        .iter()
        .filter(|g| g.width > 0 && g.height > 0)
        .copied()
        .collect();
    if glyphs.is_empty() {
        return None;
    }

    // Positions are unbounded, so bounds are computed wide and then clipped.
    let pad = pad as i64;
    let origin = |v: f32| v.floor() as i64;
    let left = glyphs.iter().map(|g| origin(g.x)).min()?.saturating_sub(pad);
    let top = glyphs.iter().map(|g| origin(g.y)).min()?.saturating_sub(pad);
    let right = glyphs
        .iter()
        .map(|g| origin(g.x).saturating_add(g.width as i64))
        .max()?
        .saturating_add(pad);
    let bottom = glyphs
        .iter()
        .map(|g| origin(g.y).saturating_add(g.height as i64))
        .max()?
        .saturating_add(pad);

    // Keep `pad` pixels of margin so dilation at the canvas edge still sees
    // glyphs just outside it.
    let left = left.max(-pad);
    let top = top.max(-pad);
    let right = right.min(width as i64 + pad);
    let bottom = bottom.min(height as i64 + pad);
    if right <= left || bottom <= top {
        return None;
    }

    let mut mask = Mask::new(
        left as i32,
        top as i32,
        (right - left) as usize,
        (bottom - top) as usize,
    );
    for glyph in &glyphs {
        let gx = origin(glyph.x).saturating_sub(left);
        let gy = origin(glyph.y).saturating_sub(top);
        if gx >= mask.width as i64 || gy >= mask.height as i64 {
            continue;
        }
        let (metrics, coverage) = face.rasterize_config(glyph.key);
        for row in 0..metrics.height {
            let y = gy + row as i64;
            if y < 0 || y >= mask.height as i64 {
                continue;
            }
            for col in 0..metrics.width {
                let x = gx + col as i64;
                if x < 0 || x >= mask.width as i64 {
                    continue;
                }
                mask.max_in(x as usize, y as usize, coverage[row * metrics.width + col]);
            }
        }
    }
    Some(mask)
}

/// Render the composition over `background`.
pub fn render(
    composition: &Composition,
    background: &LoadedImage,
    fonts: &FontBook,
) -> Result<RgbaImage> {
    let bg = background
        .to_rgba_image()
        .ok_or_else(|| MemeError::Capture("background pixel buffer has the wrong size".into()))?;

    // Background alpha is kept as-is, so uncovered areas export transparent.
    let mut canvas = bg;

    let radius = STROKE_WIDTH.ceil() as i32;
    for field in composition.fields() {
        let face = fonts
            .get(field.font)
            .ok_or_else(|| MemeError::Capture(format!("font {} not loaded", field.font.label())))?;
        let Some(fill) = field_mask(field, face, radius, canvas.width(), canvas.height()) else {
            continue;
        };
        paint_mask(&mut canvas, &fill.dilate(radius), Rgb::BLACK);
        paint_mask(&mut canvas, &fill, field.color);
    }

    Ok(canvas)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::composition::BackgroundSource;
    use crate::models::field::{FieldDefaults, Position};

    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
    const BLUE: Rgba<u8> = Rgba([0, 0, 255, 255]);
    const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);

    /// egui ships a typeface, so text can be drawn without fetching one.
    fn bundled_fonts() -> FontBook {
        let definitions = egui::FontDefinitions::default();
        let data = &definitions.font_data["Hack"];
        let mut fonts = FontBook::new();
        fonts.load(Font::Anton, &data.font).unwrap();
        fonts
    }

    fn caption(color: Rgb, position: Position) -> FieldDefaults {
        FieldDefaults {
            text: "Hi".to_string(),
            color,
            position,
            ..FieldDefaults::default()
        }
    }

    /// Bounding box `(min_x, min_y, max_x, max_y)` and count of pixels equal
    /// to `color`.
    fn pixels_of(img: &RgbaImage, color: Rgba<u8>) -> (usize, Option<(u32, u32, u32, u32)>) {
        let mut count = 0;
        let mut bounds: Option<(u32, u32, u32, u32)> = None;
        for (x, y, pixel) in img.enumerate_pixels() {
            if *pixel != color {
                continue;
            }
            count += 1;
            bounds = Some(match bounds {
                None => (x, y, x, y),
                Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
            });
        }
        (count, bounds)
    }

    fn background(width: u32, height: u32, alpha: u8) -> LoadedImage {
        let mut pixels = Vec::new();
        for _ in 0..width * height {
            pixels.extend_from_slice(&[200, 100, 50, alpha]);
        }
        LoadedImage {
            width,
            height,
            pixels,
        }
    }

    #[test]
    fn test_background_only_render() {
        let composition = Composition::new(BackgroundSource::Remote("bg".into()));
        let img = render(&composition, &background(4, 3, 255), &FontBook::new()).unwrap();
        assert_eq!(img.dimensions(), (4, 3));
        assert_eq!(img.get_pixel(3, 2), &Rgba([200, 100, 50, 255]));
    }

    #[test]
    fn test_uncovered_area_stays_transparent() {
        let composition = Composition::new(BackgroundSource::Remote("bg".into()));
        let img = render(&composition, &background(2, 2, 0), &FontBook::new()).unwrap();
        assert_eq!(img.get_pixel(0, 0)[3], 0);
    }

    #[test]
    fn test_missing_font_is_a_capture_error() {
        let mut composition = Composition::new(BackgroundSource::Remote("bg".into()));
        composition.add_field(FieldDefaults::default());
        let err = render(&composition, &background(4, 4, 255), &FontBook::new()).unwrap_err();
        assert!(matches!(err, MemeError::Capture(_)));
    }

    #[test]
    fn test_bad_font_bytes_are_rejected() {
        let mut fonts = FontBook::new();
        assert!(fonts.load(Font::Anton, b"not a font").is_err());
        assert_eq!(fonts.len(), 0);
    }

    #[test]
    fn test_dilate_grows_coverage() {
        let mut mask = Mask::new(0, 0, 5, 5);
        mask.max_in(2, 2, 255);
        let grown = mask.dilate(1);
        assert_eq!(grown.get(2, 1), 255);
        assert_eq!(grown.get(1, 2), 255);
        // Corners are outside a radius-1 disc.
        assert_eq!(grown.get(1, 1), 0);
        assert_eq!(grown.get(0, 0), 0);
    }

    #[test]
    fn test_blend_over_transparent_and_opaque() {
        let mut clear = Rgba([0, 0, 0, 0]);
        blend(&mut clear, Rgb::WHITE, 255);
        assert_eq!(clear, Rgba([255, 255, 255, 255]));

        let mut opaque = Rgba([0, 0, 0, 255]);
        blend(&mut opaque, Rgb::WHITE, 128);
        assert_eq!(opaque[3], 255);
        assert!((126..=130).contains(&opaque[0]));
    }

    #[test]
    fn test_paint_mask_clips_to_canvas() {
        let mut canvas = RgbaImage::from_pixel(2, 2, Rgba([0, 0, 0, 0]));
        let mut mask = Mask::new(-1, -1, 3, 3);
        for y in 0..3 {
            for x in 0..3 {
                mask.max_in(x, y, 255);
            }
        }
        paint_mask(&mut canvas, &mask, Rgb::new(10, 20, 30));
        assert_eq!(canvas.get_pixel(0, 0), &Rgba([10, 20, 30, 255]));
        assert_eq!(canvas.get_pixel(1, 1), &Rgba([10, 20, 30, 255]));
    }

    #[test]
    fn test_caption_is_filled_and_outlined() {
        let mut composition = Composition::new(BackgroundSource::Remote("bg".into()));
        composition.add_field(caption(Rgb::new(255, 0, 0), Position::new(10.0, 10.0)));

        let img = render(&composition, &background(120, 80, 255), &bundled_fonts()).unwrap();

        let (red, red_box) = pixels_of(&img, RED);
        let (black, black_box) = pixels_of(&img, BLACK);
        assert!(red > 0, "no fill drawn");
        assert!(black > 0, "no outline drawn");

        let (rx0, ry0, rx1, ry1) = red_box.unwrap();
        let (bx0, by0, bx1, by1) = black_box.unwrap();
        assert!(bx0 < rx0 && by0 < ry0 && bx1 > rx1 && by1 > ry1);
        assert_eq!(img.get_pixel(119, 79), &Rgba([200, 100, 50, 255]));
    }

    #[test]
    fn test_later_field_paints_over_earlier() {
        let mut composition = Composition::new(BackgroundSource::Remote("bg".into()));
        composition.add_field(caption(Rgb::new(255, 0, 0), Position::new(10.0, 10.0)));
        composition.add_field(caption(Rgb::new(0, 0, 255), Position::new(10.0, 10.0)));

        let img = render(&composition, &background(120, 80, 255), &bundled_fonts()).unwrap();

        assert_eq!(pixels_of(&img, RED).0, 0);
        assert!(pixels_of(&img, BLUE).0 > 0);
    }

    #[test]
    fn test_far_off_canvas_positions_render_nothing() {
        let bg = background(40, 30, 255);
        let expected = bg.to_rgba_image().unwrap();
        for position in [
            Position::new(3.0e9, 10.0),
            Position::new(-3.0e9, 10.0),
            Position::new(10.0, 3.0e9),
            Position::new(10.0, -3.0e9),
            Position::new(-3.0e9, -3.0e9),
        ] {
            let mut composition = Composition::new(BackgroundSource::Remote("bg".into()));
            composition.add_field(caption(Rgb::new(255, 0, 0), position));

            let img = render(&composition, &bg, &bundled_fonts()).unwrap();
            assert_eq!(img, expected, "caption at {:?} reached the canvas", position);
        }
    }

    #[test]
    fn test_caption_straddling_the_edge_is_clipped() {
        let mut composition = Composition::new(BackgroundSource::Remote("bg".into()));
        composition.add_field(caption(Rgb::new(255, 0, 0), Position::new(-15.0, -20.0)));

        let img = render(&composition, &background(60, 40, 255), &bundled_fonts()).unwrap();
        assert_eq!(img.dimensions(), (60, 40));
        assert!(pixels_of(&img, BLACK).0 > 0);
    }
}
