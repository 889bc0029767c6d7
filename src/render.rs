//! Snippet rendering: builds the element tree for a source text, sizes the
//! output from it, and paints it onto a raster or vector canvas.

use crate::code::Code;
use crate::element::{Dots, Element, Insets, Size, Text};
use crate::error::{Error, Result};
use crate::font::Face;
use crate::lexer::Lexer;
use crate::surface::{RasterSurface, Rect, Surface, VectorSurface};
use crate::theme::Theme;
use std::fmt;
use std::path::Path;
use tracing::{debug, info_span};

/// Radius of a title-bar dot before scaling.
pub const DOT_RADIUS: f32 = 7.0;
/// Gap between title-bar dots before scaling.
pub const DOT_SPACING: f32 = 9.0;

/// Knobs for one render. Theme values apply unless overridden here.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderOptions {
    pub scale: f32,
    pub line_numbers: bool,
    pub decorations: bool,
    pub title: Option<String>,
    pub shadow: bool,
    pub border_radius: Option<f32>,
    pub border_width: Option<f32>,
    pub tab_width: usize,
    pub trim: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            scale: 1.0,
            line_numbers: false,
            decorations: false,
            title: None,
            shadow: false,
            border_radius: None,
            border_width: None,
            tab_width: 4,
            trim: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputFormat {
    Png,
    Svg,
}

impl OutputFormat {
    pub fn from_name(name: &str) -> Result<Self> {
        match name.to_lowercase().as_str() {
            "png" => Ok(OutputFormat::Png),
            "svg" => Ok(OutputFormat::Svg),
            other => Err(Error::Config(format!("unsupported output format {other:?}"))),
        }
    }

    /// Picks the format from the file extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        Self::from_name(ext).map_err(|_| {
            Error::Config(format!(
                "no supported output format for {} (use .png or .svg)",
                path.display()
            ))
        })
    }

    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Svg => "svg",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// A painted snippet, ready to encode.
pub enum Canvas {
    Raster(RasterSurface),
    Vector(VectorSurface),
}

impl Canvas {
    /// An empty canvas of `size`, rounded up to whole pixels.
    pub fn new(format: OutputFormat, size: Size) -> Self {
        let (w, h) = (size.width.max(0.0).ceil(), size.height.max(0.0).ceil());
        match format {
            OutputFormat::Png => Canvas::Raster(RasterSurface::new(w as usize, h as usize)),
            OutputFormat::Svg => Canvas::Vector(VectorSurface::new(w, h)),
        }
    }

    pub fn format(&self) -> OutputFormat {
        match self {
            Canvas::Raster(_) => OutputFormat::Png,
            Canvas::Vector(_) => OutputFormat::Svg,
        }
    }

    /// Width and height in whole pixels.
    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            Canvas::Raster(r) => (r.width as u32, r.height as u32),
            Canvas::Vector(v) => (v.width().ceil() as u32, v.height().ceil() as u32),
        }
    }

    pub fn surface(&mut self) -> &mut dyn Surface {
        match self {
            Canvas::Raster(r) => r as &mut dyn Surface,
            Canvas::Vector(v) => v,
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        match self {
            Canvas::Raster(r) => r.encode_png(),
            Canvas::Vector(v) => Ok(v.finish().into_bytes()),
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let bytes = self.encode()?;
        std::fs::write(path, bytes).map_err(|e| Error::io(path, e))
    }
}

/// Normalizes line endings, expands tabs and, with `trim`, drops blank
/// leading lines and trailing whitespace.
pub fn preprocess(source: &str, options: &RenderOptions) -> String {
    let text = source
        .replace("\r\n", "\n")
        .replace('\t', &" ".repeat(options.tab_width));
    if !options.trim {
        return text;
    }
    let text = text.trim_end();
    let skip: usize = text
        .lines()
        .take_while(|l| l.trim().is_empty())
        .map(|l| l.len() + 1)
        .sum();
    text[skip.min(text.len())..].to_string()
}

/// Builds the element tree for `source`.
///
/// `source` is used as given; run it through [`preprocess`] first. The face
/// must already be at the scaled font size.
pub fn layout<'f>(
    source: &str,
    lexer: &dyn Lexer,
    theme: &Theme,
    face: &'f dyn Face,
    options: &RenderOptions,
) -> Result<Element<'f>> {
    let scale = options.scale;
    let scaled = theme.scaled(scale);
    let code = Code::new(source, lexer, theme, face, options.line_numbers)?;

    let mut column = Vec::with_capacity(2);
    if options.decorations || options.title.is_some() {
        column.push(title_bar(theme, face, options)?);
    }
    column.push(Element::Code(code));

    let radius = options.border_radius.map_or(scaled.border_radius, |r| r * scale);
    let border_width = options.border_width.map_or(scaled.border_width, |w| w * scale);
    let card = Element::card(
        theme.window(),
        theme.border(),
        radius,
        border_width,
        Element::padding(Insets::uniform(scaled.code_padding), Element::Column(column)),
    );
    Ok(Element::padding(Insets::uniform(scaled.window_padding), card))
}

/// Dots and/or a title, followed by a gap of one dot diameter.
fn title_bar<'f>(theme: &Theme, face: &'f dyn Face, options: &RenderOptions) -> Result<Element<'f>> {
    let radius = DOT_RADIUS * options.scale;
    let diameter = 2.0 * radius;
    let dots = Dots::window_controls(radius, DOT_SPACING * options.scale);

    let bar = match (&options.title, options.decorations) {
        (Some(title), true) => Element::Row(vec![
            dots.into(),
            Element::padding(
                Insets::new(0.0, 0.0, 0.0, diameter),
                Text::new(title.as_str(), theme.title(), face)?.into(),
            ),
        ]),
        (Some(title), false) => Text::new(title.as_str(), theme.title(), face)?.into(),
        (None, _) => dots.into(),
    };
    Ok(Element::padding(Insets::new(0.0, 0.0, diameter, 0.0), bar))
}

/// Paints background, optional shadow and the tree onto `surface`.
///
/// `size` is the measured size of `root`; the card sits inside the window
/// padding.
pub fn paint(root: &Element, size: Size, theme: &Theme, options: &RenderOptions, surface: &mut dyn Surface) -> Result<()> {
    surface.fill_rounded_rect(Rect::new(0.0, 0.0, size.width, size.height), 0.0, theme.background());

    if options.shadow {
        let scaled = theme.scaled(options.scale);
        let pad = scaled.window_padding;
        let radius = options
            .border_radius
            .map_or(scaled.border_radius, |r| r * options.scale);
        let card = Rect::new(pad, pad + pad / 4.0, size.width - 2.0 * pad, size.height - 2.0 * pad);
        surface.drop_shadow(card, radius, pad / 4.0, theme.shadow())?;
    }

    root.draw(surface, 0.0, 0.0);
    Ok(())
}

/// Renders `source` to a canvas in `format`.
pub fn render(
    source: &str,
    lexer: &dyn Lexer,
    theme: &Theme,
    face: &dyn Face,
    options: &RenderOptions,
    format: OutputFormat,
) -> Result<Canvas> {
    let _span = info_span!("render", %format, lexer = lexer.name()).entered();

    let text = preprocess(source, options);
    let root = layout(&text, lexer, theme, face, options)?;
    let size = root.measure();
    debug!(width = size.width, height = size.height, "measured snippet");

    let mut canvas = Canvas::new(format, size);
    paint(&root, size, theme, options, canvas.surface())?;
    Ok(canvas)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;
    use crate::font::FixedFace;
    use crate::lexer::PlainLexer;
    use crate::surface::{DrawOp, Recorder};

    fn theme() -> Theme {
        let mut theme = Theme {
            window_padding: 10.0,
            code_padding: 5.0,
            border_radius: 4.0,
            border_width: 1.0,
            ..Theme::default()
        };
        for (role, hex) in [("background", "#000"), ("window", "#222"), ("foreground", "#eee")] {
            theme.colors.insert(role.into(), hex.parse().unwrap());
        }
        theme
    }

    #[test]
    fn preprocess_expands_tabs_and_trims() {
        let opts = RenderOptions::default();
        assert_eq!(preprocess("\n\n\tx\r\ny  \n\n", &opts), "    x\ny");
        assert_eq!(preprocess("  \n \n", &opts), "");

        let raw = RenderOptions {
            trim: false,
            tab_width: 2,
            ..RenderOptions::default()
        };
        assert_eq!(preprocess("\n\tx\n", &raw), "\n  x\n");
    }

    #[test]
    fn output_format_from_extension() {
        assert_eq!(OutputFormat::from_path(Path::new("a/b.PNG")).unwrap(), OutputFormat::Png);
        assert_eq!(OutputFormat::from_path(Path::new("b.svg")).unwrap(), OutputFormat::Svg);
        assert!(matches!(OutputFormat::from_path(Path::new("b.jpg")), Err(Error::Config(_))));
        assert!(matches!(OutputFormat::from_path(Path::new("noext")), Err(Error::Config(_))));
    }

    #[test]
    fn layout_wraps_code_in_card_and_paddings() {
        let face = FixedFace::new(10, 20);
        let root = layout("ab\nc", &PlainLexer, &theme(), &face, &RenderOptions::default()).unwrap();
        // code 20x40, code padding 5, window padding 10
        assert_eq!(root.measure(), Size::new(20.0 + 10.0 + 20.0, 40.0 + 10.0 + 20.0));
        let report = root.report();
        let kinds: Vec<&str> = report
            .lines()
            .map(|l| l.trim_start().split(' ').next().unwrap_or(""))
            .collect();
        assert_eq!(kinds, ["Padding", "Card", "Padding", "Column", "Code"]);
    }

    #[test]
    fn decorations_add_a_title_bar() {
        let face = FixedFace::new(10, 20);
        let opts = RenderOptions {
            decorations: true,
            ..RenderOptions::default()
        };
        let plain = layout("x", &PlainLexer, &theme(), &face, &RenderOptions::default()).unwrap();
        let decorated = layout("x", &PlainLexer, &theme(), &face, &opts).unwrap();
        let (p, d) = (plain.measure(), decorated.measure());
        // dots 14 tall plus a 14 px gap
        assert_eq!(d.height - p.height, 28.0);
        // three dots: 3 * 14 + 2 * 9
        assert_eq!(d.width, 60.0 + 30.0);
    }

    #[test]
    fn title_sits_right_of_the_dots() {
        let face = FixedFace::new(10, 20);
        let opts = RenderOptions {
            decorations: true,
            title: Some("main.rs".into()),
            ..RenderOptions::default()
        };
        let root = layout("x", &PlainLexer, &theme(), &face, &opts).unwrap();
        let mut rec = Recorder::new();
        root.draw(&mut rec, 0.0, 0.0);
        let title = rec.ops().iter().find_map(|op| match op {
            DrawOp::Text { x, text, .. } if text == "main.rs" => Some(*x),
            _ => None,
        });
        // window 10 + code 5 + dots 60 + gap 14
        assert_eq!(title, Some(89.0));
    }

    #[test]
    fn scale_multiplies_lengths() {
        let face = FixedFace::new(10, 20);
        let opts = RenderOptions {
            scale: 2.0,
            ..RenderOptions::default()
        };
        let root = layout("ab", &PlainLexer, &theme(), &face, &opts).unwrap();
        assert_eq!(root.measure(), Size::new(20.0 + 20.0 + 40.0, 20.0 + 20.0 + 40.0));
    }

    #[test]
    fn paint_fills_background_then_shadow_then_card() {
        let face = FixedFace::new(10, 20);
        let opts = RenderOptions {
            shadow: true,
            ..RenderOptions::default()
        };
        let theme = theme();
        let root = layout("x", &PlainLexer, &theme, &face, &opts).unwrap();
        let size = root.measure();
        let mut rec = Recorder::new();
        paint(&root, size, &theme, &opts, &mut rec).unwrap();
        let ops = rec.ops();
        assert!(matches!(ops[0], DrawOp::FillRoundedRect { color, .. } if color == Color::BLACK));
        assert!(matches!(ops[1], DrawOp::DropShadow { .. }));
        assert!(matches!(ops[2], DrawOp::FillRoundedRect { rect, .. } if rect.x == 10.0 && rect.y == 10.0));
    }

    #[test]
    fn canvas_matches_measured_size() {
        let face = FixedFace::new(10, 20);
        let canvas = render("ab\ncd", &PlainLexer, &theme(), &face, &RenderOptions::default(), OutputFormat::Png)
            .unwrap();
        assert_eq!(canvas.dimensions(), (50, 70));
        assert_eq!(canvas.format(), OutputFormat::Png);

        let svg = render("ab\ncd", &PlainLexer, &theme(), &face, &RenderOptions::default(), OutputFormat::Svg)
            .unwrap();
        assert_eq!(svg.dimensions(), (50, 70));
        let text = String::from_utf8(svg.encode().unwrap()).unwrap();
        assert!(text.starts_with("<svg"));
    }

    #[test]
    fn glyph_errors_abort_the_render() {
        let face = FixedFace::new(10, 20).without(['λ']);
        let err = render("λ", &PlainLexer, &theme(), &face, &RenderOptions::default(), OutputFormat::Png)
            .err()
            .unwrap();
        assert!(matches!(err, Error::Glyph { .. }));
    }
}
