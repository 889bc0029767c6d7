//! Drawing surfaces
//!
//! Elements paint through the [`Surface`] trait only. Each output backend
//! implements it once: [`RasterSurface`] fills a pixel buffer that encodes
//! to PNG, [`VectorSurface`] builds an SVG document. Both accept the same
//! operation sequence and produce equivalent pictures.

pub mod raster;
pub mod vector;

pub use raster::RasterSurface;
pub use vector::VectorSurface;

use crate::color::Color;
use crate::error::Result;
use crate::font::Face;

/// An axis-aligned rectangle in surface pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Grows the rectangle by `d` on every side.
    pub fn inflate(&self, d: f32) -> Rect {
        Rect::new(self.x - d, self.y - d, self.width + 2.0 * d, self.height + 2.0 * d)
    }
}

/// The four drawing primitives every backend provides, plus the drop shadow
/// which delegates to the backend's blur filter.
///
/// Colours arrive already resolved; no theme lookups happen at this layer.
pub trait Surface {
    fn fill_rounded_rect(&mut self, rect: Rect, radius: f32, color: Color);

    /// Strokes the outline centred on the rectangle edge.
    fn stroke_rounded_rect(&mut self, rect: Rect, radius: f32, stroke_width: f32, color: Color);

    fn fill_circle(&mut self, cx: f32, cy: f32, radius: f32, color: Color);

    /// Draws `text` with its left edge at `x` and the lower edge of its line
    /// cell at `y`.
    fn draw_text(&mut self, x: f32, y: f32, text: &str, color: Color, face: &dyn Face);

    /// Paints a rounded rectangle blurred by `blur` pixels.
    fn drop_shadow(&mut self, rect: Rect, radius: f32, blur: f32, color: Color) -> Result<()>;
}

/// Baseline y for text whose line cell ends at `bottom`.
pub(crate) fn baseline_for(bottom: f32, face: &dyn Face) -> f32 {
    bottom - face.line_height() as f32 + face.baseline() as f32
}

/// One recorded drawing operation.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    FillRoundedRect {
        rect: Rect,
        radius: f32,
        color: Color,
    },
    StrokeRoundedRect {
        rect: Rect,
        radius: f32,
        stroke_width: f32,
        color: Color,
    },
    FillCircle {
        cx: f32,
        cy: f32,
        radius: f32,
        color: Color,
    },
    Text {
        x: f32,
        y: f32,
        text: String,
        color: Color,
    },
    DropShadow {
        rect: Rect,
        radius: f32,
        blur: f32,
        color: Color,
    },
}

/// A surface that records operations instead of painting them.
#[derive(Debug, Default, Clone)]
pub struct Recorder {
    ops: Vec<DrawOp>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ops(&self) -> &[DrawOp] {
        &self.ops
    }

    pub fn into_ops(self) -> Vec<DrawOp> {
        self.ops
    }

    /// Text of every text operation, in order.
    pub fn texts(&self) -> Vec<&str> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Replays the recording onto `target` in the original order, drawing
    /// text with `face`. Nothing is drawn when `face` lacks a glyph the
    /// recorded text uses.
    pub fn replay(&self, target: &mut dyn Surface, face: &dyn Face) -> Result<()> {
        for text in self.texts() {
            for ch in text.chars() {
                face.advance(ch)?;
            }
        }
        for op in &self.ops {
            match op {
                DrawOp::FillRoundedRect { rect, radius, color } => {
                    target.fill_rounded_rect(*rect, *radius, *color)
                }
                DrawOp::StrokeRoundedRect {
                    rect,
                    radius,
                    stroke_width,
                    color,
                } => target.stroke_rounded_rect(*rect, *radius, *stroke_width, *color),
                DrawOp::FillCircle { cx, cy, radius, color } => {
                    target.fill_circle(*cx, *cy, *radius, *color)
                }
                DrawOp::Text { x, y, text, color } => target.draw_text(*x, *y, text, *color, face),
                DrawOp::DropShadow {
                    rect,
                    radius,
                    blur,
                    color,
                } => target.drop_shadow(*rect, *radius, *blur, *color)?,
            }
        }
        Ok(())
    }
}

impl Surface for Recorder {
    fn fill_rounded_rect(&mut self, rect: Rect, radius: f32, color: Color) {
        self.ops.push(DrawOp::FillRoundedRect { rect, radius, color });
    }

    fn stroke_rounded_rect(&mut self, rect: Rect, radius: f32, stroke_width: f32, color: Color) {
        self.ops.push(DrawOp::StrokeRoundedRect {
            rect,
            radius,
            stroke_width,
            color,
        });
    }

    fn fill_circle(&mut self, cx: f32, cy: f32, radius: f32, color: Color) {
        self.ops.push(DrawOp::FillCircle { cx, cy, radius, color });
    }

    fn draw_text(&mut self, x: f32, y: f32, text: &str, color: Color, _face: &dyn Face) {
        self.ops.push(DrawOp::Text {
            x,
            y,
            text: text.to_string(),
            color,
        });
    }

    fn drop_shadow(&mut self, rect: Rect, radius: f32, blur: f32, color: Color) -> Result<()> {
        self.ops.push(DrawOp::DropShadow {
            rect,
            radius,
            blur,
            color,
        });
        Ok(())
    }
}
