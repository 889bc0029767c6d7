//! Layout elements
//!
//! Every element answers two questions: how big it is ([`Element::measure`])
//! and how to paint itself with its top-left corner at a given position
//! ([`Element::draw`]). Composites derive their size from their children
//! and hand each child its absolute position while drawing; positions are
//! never stored.

use crate::code::Code;
use crate::color::Color;
use crate::error::Result;
use crate::font::Face;
use crate::surface::{Rect, Surface};
use std::fmt::Write;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// Space around a padded child.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Insets {
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub left: f32,
}

impl Insets {
    pub const fn new(top: f32, right: f32, bottom: f32, left: f32) -> Self {
        Self {
            top,
            right,
            bottom,
            left,
        }
    }

    pub const fn uniform(v: f32) -> Self {
        Self::new(v, v, v, v)
    }
}

/// A row of filled circles, the window controls of a title bar.
#[derive(Debug, Clone, PartialEq)]
pub struct Dots {
    pub count: usize,
    pub radius: f32,
    pub spacing: f32,
    /// Cycled through when `count` exceeds its length.
    pub colors: Vec<Color>,
}

impl Dots {
    /// Red, yellow and green controls.
    pub fn window_controls(radius: f32, spacing: f32) -> Self {
        Self {
            count: 3,
            radius,
            spacing,
            colors: vec![Color::DOT_RED, Color::DOT_YELLOW, Color::DOT_GREEN],
        }
    }

    fn measure(&self) -> Size {
        if self.count == 0 {
            return Size::new(0.0, 2.0 * self.radius);
        }
        let step = 2.0 * self.radius + self.spacing;
        Size::new(self.count as f32 * step - self.spacing, 2.0 * self.radius)
    }

    fn draw(&self, surface: &mut dyn Surface, x: f32, y: f32) {
        let step = 2.0 * self.radius + self.spacing;
        for i in 0..self.count {
            let color = match self.colors.len() {
                0 => Color::MISSING,
                n => self.colors[i % n],
            };
            let cx = x + self.radius + i as f32 * step;
            surface.fill_circle(cx, y + self.radius, self.radius, color);
        }
    }
}

/// A single-line label.
pub struct Text<'a> {
    label: String,
    color: Color,
    face: &'a dyn Face,
    width: i32,
}

impl<'a> Text<'a> {
    /// Fails with [`crate::Error::Glyph`] when the face cannot show the label.
    pub fn new(label: impl Into<String>, color: Color, face: &'a dyn Face) -> Result<Self> {
        let label = label.into();
        let mut width = 0;
        for ch in label.chars() {
            width += face.advance(ch)?;
        }
        Ok(Self {
            label,
            color,
            face,
            width,
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

/// A filled, bordered rounded rectangle sized by its body.
pub struct Card<'a> {
    pub fill: Color,
    pub border: Color,
    pub radius: f32,
    pub border_width: f32,
    pub body: Box<Element<'a>>,
}

pub enum Element<'a> {
    Code(Code<'a>),
    Dots(Dots),
    Text(Text<'a>),
    Column(Vec<Element<'a>>),
    Row(Vec<Element<'a>>),
    Padding {
        insets: Insets,
        child: Box<Element<'a>>,
    },
    Card(Card<'a>),
}

impl<'a> Element<'a> {
    pub fn padding(insets: Insets, child: Element<'a>) -> Self {
        Element::Padding {
            insets,
            child: Box::new(child),
        }
    }

    pub fn card(fill: Color, border: Color, radius: f32, border_width: f32, body: Element<'a>) -> Self {
        Element::Card(Card {
            fill,
            border,
            radius,
            border_width,
            body: Box::new(body),
        })
    }

    pub fn measure(&self) -> Size {
        match self {
            Element::Code(code) => code.measure(),
            Element::Dots(dots) => dots.measure(),
            Element::Text(text) => Size::new(text.width as f32, text.face.line_height() as f32),
            Element::Column(children) => children.iter().map(Element::measure).fold(
                Size::default(),
                |acc, s| Size::new(acc.width.max(s.width), acc.height + s.height),
            ),
            Element::Row(children) => children.iter().map(Element::measure).fold(
                Size::default(),
                |acc, s| Size::new(acc.width + s.width, acc.height.max(s.height)),
            ),
            Element::Padding { insets, child } => {
                let s = child.measure();
                Size::new(
                    s.width + insets.left + insets.right,
                    s.height + insets.top + insets.bottom,
                )
            }
            // The border stroke straddles the edge and is not counted.
            Element::Card(card) => card.body.measure(),
        }
    }

    pub fn draw(&self, surface: &mut dyn Surface, x: f32, y: f32) {
        match self {
            Element::Code(code) => code.draw(surface, x, y),
            Element::Dots(dots) => dots.draw(surface, x, y),
            Element::Text(text) => {
                let bottom = y + text.face.line_height() as f32;
                surface.draw_text(x, bottom, &text.label, text.color, text.face);
            }
            Element::Column(children) => {
                let mut cy = y;
                for child in children {
                    child.draw(surface, x, cy);
                    cy += child.measure().height;
                }
            }
            Element::Row(children) => {
                let mut cx = x;
                for child in children {
                    child.draw(surface, cx, y);
                    cx += child.measure().width;
                }
            }
            Element::Padding { insets, child } => {
                child.draw(surface, x + insets.left, y + insets.top)
            }
            Element::Card(card) => {
                let size = card.body.measure();
                let rect = Rect::new(x, y, size.width, size.height);
                surface.fill_rounded_rect(rect, card.radius, card.fill);
                if card.border_width > 0.0 {
                    surface.stroke_rounded_rect(rect, card.radius, card.border_width, card.border);
                }
                card.body.draw(surface, x, y);
            }
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Element::Code(_) => "Code",
            Element::Dots(_) => "Dots",
            Element::Text(_) => "Text",
            Element::Column(_) => "Column",
            Element::Row(_) => "Row",
            Element::Padding { .. } => "Padding",
            Element::Card(_) => "Card",
        }
    }

    /// Indented dump of the tree with every node's measured size.
    pub fn report(&self) -> String {
        let mut out = String::new();
        self.report_node(&mut out, 0);
        out
    }

    fn report_node(&self, out: &mut String, indent: usize) {
        let size = self.measure();
        let extra = match self {
            Element::Code(code) => format!(" lines={}", code.lines()),
            Element::Text(text) => format!(" label='{}'", text.label),
            Element::Dots(dots) => format!(" count={} r={}", dots.count, dots.radius),
            Element::Padding { insets, .. } => format!(
                " insets=({}, {}, {}, {})",
                insets.top, insets.right, insets.bottom, insets.left
            ),
            Element::Card(card) => format!(" radius={}", card.radius),
            Element::Column(_) | Element::Row(_) => String::new(),
        };
        let _ = writeln!(
            out,
            "{}{} -> (w={}, h={}){}",
            " ".repeat(indent),
            self.name(),
            size.width,
            size.height,
            extra
        );
        match self {
            Element::Column(children) | Element::Row(children) => {
                for child in children {
                    child.report_node(out, indent + 2);
                }
            }
            Element::Padding { child, .. } => child.report_node(out, indent + 2),
            Element::Card(card) => card.body.report_node(out, indent + 2),
            Element::Code(_) | Element::Dots(_) | Element::Text(_) => {}
        }
    }
}

impl<'a> From<Code<'a>> for Element<'a> {
    fn from(code: Code<'a>) -> Self {
        Element::Code(code)
    }
}

impl From<Dots> for Element<'_> {
    fn from(dots: Dots) -> Self {
        Element::Dots(dots)
    }
}

impl<'a> From<Text<'a>> for Element<'a> {
    fn from(text: Text<'a>) -> Self {
        Element::Text(text)
    }
}
