//! Software rasterizer: a straight-alpha RGBA pixel buffer
//!
//! Shapes are anti-aliased from signed distances; glyph coverage comes from
//! the face. PNG encoding and the shadow blur go through resvg/tiny-skia.

use super::{baseline_for, vector, Rect, Surface};
use crate::color::Color;
use crate::error::{Error, Result};
use crate::font::{Face, GlyphBitmap};
use resvg::tiny_skia::{ColorU8, Pixmap, Transform};
use std::collections::HashMap;
use tracing::trace;

/// Pixel buffer surface
pub struct RasterSurface {
    pub width: usize,
    pub height: usize,
    /// 0xAARRGGBB, straight alpha
    pub pixels: Vec<u32>,
    glyphs: HashMap<(char, u32), Option<GlyphBitmap>>,
    glyph_family: String,
}

impl RasterSurface {
    /// A fully transparent buffer.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width * height],
            glyphs: HashMap::new(),
            glyph_family: String::new(),
        }
    }

    pub fn clear(&mut self, color: Color) {
        self.pixels.fill(color.to_u32_with_alpha());
    }

    pub fn pixel(&self, x: usize, y: usize) -> Option<Color> {
        if x < self.width && y < self.height {
            Some(Color::from_u32_with_alpha(self.pixels[y * self.width + x]))
        } else {
            None
        }
    }

    pub fn set_pixel(&mut self, x: usize, y: usize, color: Color) {
        if x < self.width && y < self.height {
            self.pixels[y * self.width + x] = color.to_u32_with_alpha();
        }
    }

    /// Blend a pixel with coverage
    pub fn blend_pixel(&mut self, x: i32, y: i32, color: Color, coverage: u8) {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height || coverage == 0 {
            return;
        }
        let idx = y as usize * self.width + x as usize;
        let dst = Color::from_u32_with_alpha(self.pixels[idx]);
        self.pixels[idx] = color.over(dst, coverage).to_u32_with_alpha();
    }

    /// Calls `shade` for every pixel centre near `bounds` and blends `color`
    /// with the coverage it returns.
    fn shade(&mut self, bounds: Rect, color: Color, shade: impl Fn(f32, f32) -> f32) {
        if self.width == 0 || self.height == 0 {
            return;
        }
        let x0 = bounds.x.floor().max(0.0) as i32;
        let y0 = bounds.y.floor().max(0.0) as i32;
        let x1 = (bounds.right().ceil() as i32).min(self.width as i32);
        let y1 = (bounds.bottom().ceil() as i32).min(self.height as i32);

        for py in y0..y1 {
            for px in x0..x1 {
                let coverage = shade(px as f32 + 0.5, py as f32 + 0.5).clamp(0.0, 1.0);
                if coverage > 0.0 {
                    self.blend_pixel(px, py, color, (coverage * 255.0).round() as u8);
                }
            }
        }
    }

    fn glyph(&mut self, ch: char, face: &dyn Face) -> Option<GlyphBitmap> {
        if self.glyph_family != face.family() {
            self.glyphs.clear();
            self.glyph_family = face.family().to_string();
        }
        self.glyphs
            .entry((ch, face.size().to_bits()))
            .or_insert_with(|| face.rasterize(ch))
            .clone()
    }

    /// Copies the buffer into a premultiplied tiny-skia pixmap.
    pub fn to_pixmap(&self) -> Result<Pixmap> {
        let mut pixmap = Pixmap::new(self.width as u32, self.height as u32)
            .ok_or_else(|| Error::Encode(format!("cannot allocate {}x{} pixmap", self.width, self.height)))?;
        for (dst, src) in pixmap.pixels_mut().iter_mut().zip(&self.pixels) {
            let c = Color::from_u32_with_alpha(*src);
            *dst = ColorU8::from_rgba(c.r, c.g, c.b, c.a).premultiply();
        }
        Ok(pixmap)
    }

    /// Encodes the buffer as PNG.
    pub fn encode_png(&self) -> Result<Vec<u8>> {
        self.to_pixmap()?
            .encode_png()
            .map_err(|e| Error::Encode(format!("png: {e}")))
    }
}

/// Signed distance from a point to a rounded rectangle; negative inside.
fn rounded_rect_distance(px: f32, py: f32, rect: Rect, radius: f32) -> f32 {
    let hx = rect.width / 2.0;
    let hy = rect.height / 2.0;
    let r = radius.min(hx).min(hy).max(0.0);
    let qx = (px - (rect.x + hx)).abs() - (hx - r);
    let qy = (py - (rect.y + hy)).abs() - (hy - r);
    let outside = qx.max(0.0).hypot(qy.max(0.0));
    let inside = qx.max(qy).min(0.0);
    outside + inside - r
}

impl Surface for RasterSurface {
    fn fill_rounded_rect(&mut self, rect: Rect, radius: f32, color: Color) {
        if rect.width <= 0.0 || rect.height <= 0.0 {
            return;
        }
        self.shade(rect.inflate(1.0), color, |px, py| {
            0.5 - rounded_rect_distance(px, py, rect, radius)
        });
    }

    fn stroke_rounded_rect(&mut self, rect: Rect, radius: f32, stroke_width: f32, color: Color) {
        if rect.width <= 0.0 || rect.height <= 0.0 || stroke_width <= 0.0 {
            return;
        }
        let half = stroke_width / 2.0;
        self.shade(rect.inflate(half + 1.0), color, |px, py| {
            0.5 - (rounded_rect_distance(px, py, rect, radius).abs() - half)
        });
    }

    fn fill_circle(&mut self, cx: f32, cy: f32, radius: f32, color: Color) {
        if radius <= 0.0 {
            return;
        }
        let bounds = Rect::new(cx - radius, cy - radius, 2.0 * radius, 2.0 * radius).inflate(1.0);
        self.shade(bounds, color, |px, py| 0.5 - ((px - cx).hypot(py - cy) - radius));
    }

    fn draw_text(&mut self, x: f32, y: f32, text: &str, color: Color, face: &dyn Face) {
        let baseline = baseline_for(y, face).round() as i32;
        let mut pen = x;
        for ch in text.chars() {
            if let Some(glyph) = self.glyph(ch, face) {
                let gx = pen.round() as i32 + glyph.xmin;
                let gy = baseline - (glyph.height as i32 + glyph.ymin);
                for (i, alpha) in glyph.coverage.iter().enumerate() {
                    if *alpha == 0 {
                        continue;
                    }
                    let px = gx + (i % glyph.width) as i32;
                    let py = gy + (i / glyph.width) as i32;
                    self.blend_pixel(px, py, color, *alpha);
                }
            }
            let advance = face.advance(ch);
            debug_assert!(advance.is_ok(), "no advance for {ch:?} in {}", face.family());
            pen += advance.unwrap_or(0) as f32;
        }
    }

    fn drop_shadow(&mut self, rect: Rect, radius: f32, blur: f32, color: Color) -> Result<()> {
        let (w, h) = (self.width as u32, self.height as u32);
        let svg = format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}"><defs>{}</defs>{}</svg>"#,
            vector::shadow_filter("shadow", blur),
            vector::shadow_rect("shadow", rect, radius, color),
        );
        let tree = usvg::Tree::from_str(&svg, &usvg::Options::default())
            .map_err(|e| Error::Encode(format!("drop shadow: {e}")))?;
        let mut pixmap =
            Pixmap::new(w, h).ok_or_else(|| Error::Encode(format!("cannot allocate {w}x{h} pixmap")))?;
        resvg::render(&tree, Transform::default(), &mut pixmap.as_mut());
        trace!(w, h, blur, "rendered drop shadow");

        for (i, px) in pixmap.pixels().iter().enumerate() {
            let c = px.demultiply();
            if c.alpha() == 0 {
                continue;
            }
            let src = Color::from_rgba(c.red(), c.green(), c.blue(), c.alpha());
            self.blend_pixel((i % self.width) as i32, (i / self.width) as i32, src, 255);
        }
        Ok(())
    }
}
