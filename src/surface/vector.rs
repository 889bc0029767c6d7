//! SVG document backend

use super::{baseline_for, Rect, Surface};
use crate::color::Color;
use crate::error::Result;
use crate::font::Face;

/// Retained vector document surface.
pub struct VectorSurface {
    width: f32,
    height: f32,
    defs: String,
    body: String,
    shadows: usize,
}

impl VectorSurface {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            defs: String::new(),
            body: String::new(),
            shadows: 0,
        }
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    /// Finishes the document.
    pub fn finish(&self) -> String {
        let (w, h) = (self.width.ceil(), self.height.ceil());
        let mut svg = format!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\">",
        );
        if !self.defs.is_empty() {
            svg.push_str("<defs>");
            svg.push_str(&self.defs);
            svg.push_str("</defs>");
        }
        svg.push_str(&self.body);
        svg.push_str("</svg>\n");
        svg
    }
}

/// `fill="#rrggbb"` plus `fill-opacity` when translucent.
fn paint_attrs(attr: &str, color: Color) -> String {
    let rgb = Color { a: 255, ..color }.to_hex();
    if color.is_opaque() {
        format!("{attr}=\"{rgb}\"")
    } else {
        format!(
            "{attr}=\"{rgb}\" {attr}-opacity=\"{:.3}\"",
            color.a as f32 / 255.0
        )
    }
}

fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

fn corner(rect: Rect, radius: f32) -> f32 {
    radius.min(rect.width / 2.0).min(rect.height / 2.0).max(0.0)
}

/// Gaussian blur filter definition for a drop shadow.
pub(crate) fn shadow_filter(id: &str, blur: f32) -> String {
    format!(
        "<filter id=\"{id}\" x=\"-50%\" y=\"-50%\" width=\"200%\" height=\"200%\"><feGaussianBlur stdDeviation=\"{blur:.2}\"/></filter>"
    )
}

/// The rounded rectangle a drop shadow blurs.
pub(crate) fn shadow_rect(filter_id: &str, rect: Rect, radius: f32, color: Color) -> String {
    format!(
        "<rect x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" rx=\"{:.2}\" {} filter=\"url(#{filter_id})\"/>",
        rect.x,
        rect.y,
        rect.width,
        rect.height,
        corner(rect, radius),
        paint_attrs("fill", color),
    )
}

impl Surface for VectorSurface {
    fn fill_rounded_rect(&mut self, rect: Rect, radius: f32, color: Color) {
        if rect.width <= 0.0 || rect.height <= 0.0 {
            return;
        }
        self.body.push_str(&format!(
            "<rect x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" rx=\"{:.2}\" {}/>",
            rect.x,
            rect.y,
            rect.width,
            rect.height,
            corner(rect, radius),
            paint_attrs("fill", color),
        ));
    }

    fn stroke_rounded_rect(&mut self, rect: Rect, radius: f32, stroke_width: f32, color: Color) {
        if rect.width <= 0.0 || rect.height <= 0.0 || stroke_width <= 0.0 {
            return;
        }
        self.body.push_str(&format!(
            "<rect x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" rx=\"{:.2}\" fill=\"none\" {} stroke-width=\"{stroke_width:.2}\"/>",
            rect.x,
            rect.y,
            rect.width,
            rect.height,
            corner(rect, radius),
            paint_attrs("stroke", color),
        ));
    }

    fn fill_circle(&mut self, cx: f32, cy: f32, radius: f32, color: Color) {
        if radius <= 0.0 {
            return;
        }
        self.body.push_str(&format!(
            "<circle cx=\"{cx:.2}\" cy=\"{cy:.2}\" r=\"{radius:.2}\" {}/>",
            paint_attrs("fill", color),
        ));
    }

    fn draw_text(&mut self, x: f32, y: f32, text: &str, color: Color, face: &dyn Face) {
        // Blank glyphs paint nothing.
        if text.chars().all(char::is_whitespace) {
            return;
        }
        self.body.push_str(&format!(
            "<text x=\"{x:.2}\" y=\"{:.2}\" font-family=\"{}, monospace\" font-size=\"{:.2}\" xml:space=\"preserve\" {}>{}</text>",
            baseline_for(y, face),
            escape_xml(face.family()),
            face.size(),
            paint_attrs("fill", color),
            escape_xml(text),
        ));
    }

    fn drop_shadow(&mut self, rect: Rect, radius: f32, blur: f32, color: Color) -> Result<()> {
        self.shadows += 1;
        let id = format!("shadow{}", self.shadows);
        self.defs.push_str(&shadow_filter(&id, blur));
        self.body.push_str(&shadow_rect(&id, rect, radius, color));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::FixedFace;

    fn parses(svg: &str) -> usvg::Tree {
        usvg::Tree::from_str(svg, &usvg::Options::default()).expect("valid svg")
    }

    #[test]
    fn empty_document_has_requested_size() {
        let svg = VectorSurface::new(120.4, 80.0).finish();
        assert!(svg.contains("width=\"121\""), "{svg}");
        let tree = parses(&svg);
        assert_eq!(tree.size().width(), 121.0);
        assert_eq!(tree.size().height(), 80.0);
    }

    #[test]
    fn emits_one_element_per_primitive() {
        let face = FixedFace::new(10, 20);
        let mut doc = VectorSurface::new(100.0, 100.0);
        doc.fill_rounded_rect(Rect::new(0.0, 0.0, 100.0, 100.0), 8.0, Color::WHITE);
        doc.stroke_rounded_rect(Rect::new(0.0, 0.0, 100.0, 100.0), 8.0, 1.0, Color::BLACK);
        doc.fill_circle(10.0, 10.0, 4.0, Color::DOT_RED);
        doc.draw_text(10.0, 40.0, "<&>", Color::BLACK, &face);
        let svg = doc.finish();
        assert_eq!(svg.matches("<rect").count(), 2);
        assert_eq!(svg.matches("<circle").count(), 1);
        assert!(svg.contains("&lt;&amp;&gt;"), "{svg}");
        parses(&svg);
    }

    #[test]
    fn blank_text_is_skipped() {
        let face = FixedFace::new(10, 20);
        let mut doc = VectorSurface::new(10.0, 10.0);
        doc.draw_text(0.0, 20.0, " ", Color::BLACK, &face);
        assert!(!doc.finish().contains("<text"));
    }

    #[test]
    fn translucent_colours_use_opacity() {
        let mut doc = VectorSurface::new(10.0, 10.0);
        doc.fill_circle(5.0, 5.0, 5.0, Color::from_rgba(0, 0, 0, 0x80));
        let svg = doc.finish();
        assert!(svg.contains("fill=\"#000000\" fill-opacity=\"0.502\""), "{svg}");
    }

    #[test]
    fn shadows_get_unique_filters() {
        let mut doc = VectorSurface::new(100.0, 100.0);
        let r = Rect::new(10.0, 10.0, 50.0, 50.0);
        doc.drop_shadow(r, 4.0, 8.0, Color::BLACK).unwrap();
        doc.drop_shadow(r, 4.0, 8.0, Color::BLACK).unwrap();
        let svg = doc.finish();
        assert!(svg.contains("id=\"shadow1\"") && svg.contains("id=\"shadow2\""));
        assert!(svg.contains("feGaussianBlur"));
        parses(&svg);
    }
}
