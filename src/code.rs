//! Code element: highlighted, monospaced source text with an optional
//! line-number gutter

use crate::color::Color;
use crate::element::Size;
use crate::error::Result;
use crate::font::Face;
use crate::lexer::Lexer;
use crate::surface::Surface;
use crate::theme::Theme;
use std::collections::HashMap;
use tracing::debug;

/// A token with its colour resolved.
#[derive(Debug, Clone, PartialEq)]
struct Span {
    text: String,
    color: Color,
}

/// Source text, tokenized and coloured once at construction.
///
/// Construction does all the fallible work: the lexer runs here and every
/// code point is checked against the face. Measuring and drawing afterwards
/// cannot fail and never re-tokenize.
pub struct Code<'a> {
    spans: Vec<Span>,
    advances: HashMap<char, i32>,
    face: &'a dyn Face,
    lines: usize,
    line_numbers: bool,
    number_color: Color,
}

impl<'a> Code<'a> {
    pub fn new(
        text: &str,
        lexer: &dyn Lexer,
        theme: &Theme,
        face: &'a dyn Face,
        line_numbers: bool,
    ) -> Result<Self> {
        let tokens = lexer.tokenize(text)?;

        let mut advances = HashMap::new();
        let digits = if line_numbers { "0123456789" } else { "" };
        for ch in text.chars().chain(digits.chars()) {
            if ch == '\n' || advances.contains_key(&ch) {
                continue;
            }
            advances.insert(ch, face.advance(ch)?);
        }

        let spans: Vec<Span> = tokens
            .into_iter()
            .map(|t| Span {
                color: theme.color(t.kind.name()),
                text: t.text,
            })
            .collect();
        let lines = 1 + text.matches('\n').count();
        debug!(lexer = lexer.name(), spans = spans.len(), lines, "prepared code");

        Ok(Self {
            spans,
            advances,
            face,
            lines,
            line_numbers,
            number_color: theme.line_number(),
        })
    }

    /// Number of lines, counting the empty line after a trailing newline.
    pub fn lines(&self) -> usize {
        self.lines
    }

    fn advance(&self, ch: char) -> i32 {
        self.advances.get(&ch).copied().unwrap_or(0)
    }

    fn text_width(&self, text: &str) -> i32 {
        text.chars().map(|ch| self.advance(ch)).sum()
    }

    /// Left and right gutter widths; zero without line numbers.
    pub fn gutter(&self) -> (i32, i32) {
        if !self.line_numbers {
            return (0, 0);
        }
        let nine = self.advance('9');
        ((gutter_digits(self.lines) as i32 + 2) * nine, nine)
    }

    pub fn measure(&self) -> Size {
        let mut widest = 0;
        let mut width = 0;
        for ch in self.spans.iter().flat_map(|s| s.text.chars()) {
            if ch == '\n' {
                width = 0;
                continue;
            }
            width += self.advance(ch);
            widest = widest.max(width);
        }
        let (left, right) = self.gutter();
        Size::new(
            (widest + left + right) as f32,
            (self.lines as i32 * self.face.line_height()) as f32,
        )
    }

    pub fn draw(&self, surface: &mut dyn Surface, x: f32, y: f32) {
        let line_height = self.face.line_height() as f32;
        let (left, _) = self.gutter();
        let start = x + left as f32;

        let mut pen = start;
        let mut row = 0usize;
        for span in &self.spans {
            for (i, segment) in span.text.split('\n').enumerate() {
                if i > 0 {
                    row += 1;
                    pen = start;
                }
                if segment.is_empty() {
                    continue;
                }
                let bottom = y + (row + 1) as f32 * line_height;
                surface.draw_text(pen, bottom, segment, span.color, self.face);
                pen += self.text_width(segment) as f32;
            }
        }

        if self.line_numbers {
            let right_edge = x + left as f32 / 2.0;
            for i in 0..self.lines {
                let label = (i + 1).to_string();
                let bottom = y + (i + 1) as f32 * line_height;
                let lx = right_edge - self.text_width(&label) as f32;
                surface.draw_text(lx, bottom, &label, self.number_color, self.face);
            }
        }
    }
}

/// Smallest `d` with `10^d >= lines`.
fn gutter_digits(lines: usize) -> u32 {
    let mut digits = 0;
    let mut reach = 1usize;
    while reach < lines {
        reach = reach.saturating_mul(10);
        digits += 1;
    }
    digits
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::font::FixedFace;
    use crate::lexer::{PlainLexer, Token, TokenKind};
    use crate::surface::{DrawOp, Recorder};

    const RED: Color = Color::from_rgb(255, 0, 0);
    const GREY: Color = Color::from_rgb(0x80, 0x80, 0x80);

    fn theme() -> Theme {
        let mut theme = Theme::default();
        theme.colors.insert("foreground".into(), RED);
        theme.colors.insert("lineNumber".into(), GREY);
        theme
    }

    /// Splits on spaces, tagging words as keywords.
    struct Words;

    impl Lexer for Words {
        fn name(&self) -> &str {
            "words"
        }

        fn tokenize(&self, text: &str) -> Result<Vec<Token>> {
            Ok(text
                .split_inclusive(' ')
                .map(|w| Token::new(TokenKind::Keyword, w))
                .collect())
        }
    }

    struct Refuses;

    impl Lexer for Refuses {
        fn name(&self) -> &str {
            "refuses"
        }

        fn tokenize(&self, _text: &str) -> Result<Vec<Token>> {
            Err(Error::Tokenize("nope".into()))
        }
    }

    #[test]
    fn trailing_newline_counts_an_extra_line() {
        let face = FixedFace::new(10, 20);
        let code = Code::new("a\nbb\n", &PlainLexer, &theme(), &face, false).unwrap();
        assert_eq!(code.lines(), 3);
        assert_eq!(code.measure(), Size::new(20.0, 60.0));
    }

    #[test]
    fn empty_input_is_one_empty_line() {
        let face = FixedFace::new(10, 20);
        let code = Code::new("", &PlainLexer, &theme(), &face, false).unwrap();
        assert_eq!(code.measure(), Size::new(0.0, 20.0));

        let numbered = Code::new("", &PlainLexer, &theme(), &face, true).unwrap();
        // One digit of gutter is never needed for a single line.
        assert_eq!(numbered.gutter(), (20, 10));
        assert_eq!(numbered.measure(), Size::new(30.0, 20.0));
    }

    #[test]
    fn gutter_grows_with_line_count() {
        assert_eq!(gutter_digits(1), 0);
        assert_eq!(gutter_digits(2), 1);
        assert_eq!(gutter_digits(10), 1);
        assert_eq!(gutter_digits(11), 2);
        assert_eq!(gutter_digits(100), 2);
        assert_eq!(gutter_digits(101), 3);

        let face = FixedFace::new(10, 20);
        let text = vec!["x"; 12].join("\n");
        let code = Code::new(&text, &PlainLexer, &theme(), &face, true).unwrap();
        assert_eq!(code.gutter(), (40, 10));
        assert_eq!(code.measure(), Size::new(60.0, 240.0));
    }

    #[test]
    fn draws_each_line_in_its_cell() {
        let face = FixedFace::new(10, 20);
        let code = Code::new("ab\ncd", &PlainLexer, &theme(), &face, false).unwrap();
        let mut rec = Recorder::new();
        code.draw(&mut rec, 5.0, 7.0);
        assert_eq!(
            rec.ops(),
            &[
                DrawOp::Text { x: 5.0, y: 27.0, text: "ab".into(), color: RED },
                DrawOp::Text { x: 5.0, y: 47.0, text: "cd".into(), color: RED },
            ]
        );
    }

    #[test]
    fn tokens_advance_the_pen_and_take_theme_colours() {
        let face = FixedFace::new(10, 20);
        let mut theme = theme();
        theme.colors.insert("keyword".into(), GREY);
        let code = Code::new("let x", &Words, &theme, &face, false).unwrap();
        let mut rec = Recorder::new();
        code.draw(&mut rec, 0.0, 0.0);
        assert_eq!(
            rec.ops(),
            &[
                DrawOp::Text { x: 0.0, y: 20.0, text: "let ".into(), color: GREY },
                DrawOp::Text { x: 40.0, y: 20.0, text: "x".into(), color: GREY },
            ]
        );
    }

    #[test]
    fn line_numbers_are_right_aligned_in_the_left_gutter() {
        let face = FixedFace::new(10, 20);
        let text = vec!["x"; 10].join("\n");
        let code = Code::new(&text, &PlainLexer, &theme(), &face, true).unwrap();
        // One digit: left gutter 30, labels end at 15.
        let mut rec = Recorder::new();
        code.draw(&mut rec, 0.0, 0.0);
        let labels: Vec<_> = rec
            .ops()
            .iter()
            .filter_map(|op| match op {
                DrawOp::Text { x, y, text, color } if *color == GREY => Some((*x, *y, text.clone())),
                _ => None,
            })
            .collect();
        assert_eq!(labels.len(), 10);
        assert_eq!(labels[0], (5.0, 20.0, "1".to_string()));
        assert_eq!(labels[9], (-5.0, 200.0, "10".to_string()));

        let first_code = rec.ops().iter().find_map(|op| match op {
            DrawOp::Text { x, color, .. } if *color == RED => Some(*x),
            _ => None,
        });
        assert_eq!(first_code, Some(30.0));
    }

    #[test]
    fn missing_glyph_fails_at_construction() {
        let face = FixedFace::new(10, 20).without(['λ']);
        let err = Code::new("let λ = 1;", &PlainLexer, &theme(), &face, false).err().unwrap();
        assert!(matches!(err, Error::Glyph { ch: 'λ', .. }), "{err:?}");
    }

    #[test]
    fn missing_digit_fails_only_with_line_numbers() {
        let face = FixedFace::new(10, 20).without(['7']);
        assert!(Code::new("abc", &PlainLexer, &theme(), &face, false).is_ok());
        assert!(matches!(
            Code::new("abc", &PlainLexer, &theme(), &face, true),
            Err(Error::Glyph { ch: '7', .. })
        ));
    }

    #[test]
    fn lexer_failure_is_propagated() {
        let face = FixedFace::new(10, 20);
        assert!(matches!(
            Code::new("x", &Refuses, &theme(), &face, false),
            Err(Error::Tokenize(_))
        ));
    }

    #[test]
    fn measure_is_idempotent() {
        let face = FixedFace::new(7, 15);
        let code = Code::new("fn main() {\n    todo!()\n}", &PlainLexer, &theme(), &face, true).unwrap();
        assert_eq!(code.measure(), code.measure());
    }
}
