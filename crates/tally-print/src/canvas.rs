//! # Canvas
//!
//! The RGBA surface a sheet is drawn onto. Every primitive is integer-only
//! so the same plan always yields the same pixels.
//!
//! Text uses the 8×8 `font8x8` glyphs scaled by a whole factor
//! (`size_px / 8`, at least 1). The glyph's top row sits `7 × scale`
//! pixels above the baseline.

use std::io::Cursor;

use font8x8::{UnicodeFonts, BASIC_FONTS};
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};

use tally_core::layout::{Color, Rect, TextSpan};

use crate::error::PrintResult;

const GLYPH: i64 = 8;

fn rgba(color: Color) -> Rgba<u8> {
    Rgba([color.r, color.g, color.b, 255])
}

/// Fixed-size drawing surface.
#[derive(Debug)]
pub struct Canvas {
    image: RgbaImage,
}

impl Canvas {
    /// Creates a canvas filled with `background`.
    pub fn new(width: u32, height: u32, background: Color) -> Self {
        Self {
            image: RgbaImage::from_pixel(width, height, rgba(background)),
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Pixel at (x, y) as RGBA.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        self.image.get_pixel_checked(x, y).map(|p| p.0)
    }

    fn put(&mut self, x: i64, y: i64, color: Rgba<u8>) {
        if x < 0 || y < 0 {
            return;
        }
        if let Some(pixel) = self.image.get_pixel_mut_checked(x as u32, y as u32) {
            *pixel = color;
        }
    }

    /// Fills a rectangle, clipped to the canvas.
    pub fn fill_rect(&mut self, rect: Rect, color: Color) {
        let color = rgba(color);
        let right = rect.right().min(self.width());
        let bottom = rect.bottom().min(self.height());
        for y in rect.y..bottom {
            for x in rect.x..right {
                self.image.put_pixel(x, y, color);
            }
        }
    }

    /// Copies `raster` into `rect`, scaling with nearest-neighbour sampling.
    pub fn draw_raster(&mut self, rect: Rect, raster: &RgbaImage) {
        let (src_w, src_h) = raster.dimensions();
        if src_w == 0 || src_h == 0 || rect.width == 0 || rect.height == 0 {
            return;
        }

        for dy in 0..rect.height {
            let sy = (dy as u64 * src_h as u64 / rect.height as u64) as u32;
            for dx in 0..rect.width {
                let sx = (dx as u64 * src_w as u64 / rect.width as u64) as u32;
                let pixel = *raster.get_pixel(sx, sy);
                self.put((rect.x + dx) as i64, (rect.y + dy) as i64, pixel);
            }
        }
    }

    /// Draws a centred line of text.
    ///
    /// Characters outside the basic Latin set are drawn as `?`.
    pub fn draw_text(&mut self, span: &TextSpan) {
        let scale = (span.size_px as i64 / GLYPH).max(1);
        let advance = GLYPH * scale;
        let glyphs: Vec<[u8; 8]> = span
            .text
            .chars()
            .map(|c| BASIC_FONTS.get(c).or_else(|| BASIC_FONTS.get('?')).unwrap_or([0; 8]))
            .collect();

        let width = glyphs.len() as i64 * advance;
        let left = span.center_x as i64 - width / 2;
        let top = span.baseline as i64 - 7 * scale;
        let color = rgba(span.color);
        let strokes: &[i64] = if span.bold { &[0, 1] } else { &[0] };

        for (i, glyph) in glyphs.iter().enumerate() {
            let origin_x = left + i as i64 * advance;
            for (row, bits) in glyph.iter().enumerate() {
                for col in 0..8 {
                    if bits & (1 << col) == 0 {
                        continue;
                    }
                    let x0 = origin_x + col as i64 * scale;
                    let y0 = top + row as i64 * scale;
                    for &offset in strokes {
                        for sy in 0..scale {
                            for sx in 0..scale {
                                self.put(x0 + sx + offset, y0 + sy, color);
                            }
                        }
                    }
                }
            }
        }
    }

    /// Encodes the canvas as PNG.
    pub fn into_png(self) -> PrintResult<Vec<u8>> {
        let mut bytes = Vec::new();
        DynamicImage::ImageRgba8(self.image).write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
        Ok(bytes)
    }
}
