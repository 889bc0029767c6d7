//! Property-based invariant tests for tokenizing and layout.
//!
//! Verifies:
//! 1. Tokenize round-trip: every lexer's tokens concatenate to the input
//! 2. Short hex colours equal their doubled long form
//! 3. Code height grows with appended lines, width with a longer line
//! 4. Padding adds exactly its insets
//! 5. Column and Row swap the roles of sum and max
//! 6. Measuring twice gives the same size

use codecard::{
    parse_hex_color, Code, Color, Dots, Element, FixedFace, Insets, Lexer, PlainLexer, Size, Text, Theme,
    TreeSitterLexer,
};
use proptest::prelude::*;

// ── Strategy helpers ──────────────────────────────────────────────────

fn arb_source() -> impl Strategy<Value = String> {
    prop_oneof![
        ".{0,200}",
        "[a-z_ (){};:=<>&'\"#!/*\n0-9]{0,200}",
        Just("fn main() {\n    println!(\"{}\", 1);\n}\n".to_string()),
        Just("func main() {\n\tfmt.Println(`raw`, 'x')\n}\n".to_string()),
        Just("def f(x):\n    return f\"{x!r}\" # done\n".to_string()),
        Just("const re = /a+b/g; let s = `${re}`;\n".to_string()),
    ]
}

fn arb_line() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 ]{0,40}"
}

fn arb_dots() -> impl Strategy<Value = Dots> {
    (0usize..6, 1.0f32..20.0, 0.0f32..20.0).prop_map(|(count, radius, spacing)| Dots {
        count,
        ..Dots::window_controls(radius, spacing)
    })
}

fn theme() -> Theme {
    let mut theme = Theme::default();
    theme.colors.insert("foreground".into(), Color::WHITE);
    theme
}

fn joined(lexer: &dyn Lexer, text: &str) -> String {
    lexer
        .tokenize(text)
        .unwrap()
        .into_iter()
        .map(|t| t.text)
        .collect()
}

// ── Properties ────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn tokens_partition_the_input(src in arb_source()) {
        prop_assert_eq!(joined(&PlainLexer, &src), src.clone());
        prop_assert_eq!(joined(&TreeSitterLexer::rust(), &src), src.clone());
        prop_assert_eq!(joined(&TreeSitterLexer::go(), &src), src.clone());
        prop_assert_eq!(joined(&TreeSitterLexer::python(), &src), src.clone());
        prop_assert_eq!(joined(&TreeSitterLexer::javascript(), &src), src.clone());
        prop_assert_eq!(joined(&TreeSitterLexer::markdown(), &src), src);
    }

    #[test]
    fn short_hex_equals_doubled_form(r in 0u8..16, g in 0u8..16, b in 0u8..16) {
        let hex = |v: u8| format!("{v:x}");
        let short = format!("#{}{}{}", hex(r), hex(g), hex(b));
        let long = format!("#{0}{0}{1}{1}{2}{2}", hex(r), hex(g), hex(b));
        prop_assert_eq!(parse_hex_color(&short).unwrap(), parse_hex_color(&long).unwrap());
        prop_assert_eq!(parse_hex_color(&short).unwrap().a, 0xff);
    }

    #[test]
    fn appending_a_line_adds_one_line_height(
        lines in prop::collection::vec(arb_line(), 1..20),
        extra in arb_line(),
        numbers in any::<bool>(),
    ) {
        let face = FixedFace::new(9, 17);
        let theme = theme();
        let text = lines.join("\n");
        let longer = format!("{text}\n{extra}");
        let before = Code::new(&text, &PlainLexer, &theme, &face, numbers).unwrap().measure();
        let after = Code::new(&longer, &PlainLexer, &theme, &face, numbers).unwrap().measure();
        prop_assert_eq!(after.height, before.height + 17.0);
        prop_assert!(after.width >= before.width);
    }

    #[test]
    fn a_longer_longest_line_widens_the_code(lines in prop::collection::vec(arb_line(), 1..20)) {
        let face = FixedFace::new(9, 17);
        let theme = theme();
        let text = lines.join("\n");
        let longest = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0);
        let wider = format!("{text}\n{}", "x".repeat(longest + 1));
        let before = Code::new(&text, &PlainLexer, &theme, &face, false).unwrap().measure();
        let after = Code::new(&wider, &PlainLexer, &theme, &face, false).unwrap().measure();
        prop_assert_eq!(before.width, longest as f32 * 9.0);
        prop_assert!(after.width > before.width);
    }

    #[test]
    fn padding_is_additive(
        dots in arb_dots(),
        (top, right, bottom, left) in (0.0f32..50.0, 0.0f32..50.0, 0.0f32..50.0, 0.0f32..50.0),
    ) {
        let inner = Element::Dots(dots.clone()).measure();
        let padded = Element::padding(Insets::new(top, right, bottom, left), Element::Dots(dots)).measure();
        prop_assert_eq!(padded, Size::new(inner.width + left + right, inner.height + top + bottom));
    }

    #[test]
    fn column_and_row_are_dual(
        dots in prop::collection::vec(arb_dots(), 0..6),
        labels in prop::collection::vec("[a-z]{0,12}", 0..4),
    ) {
        let face = FixedFace::new(8, 16);
        let children = || -> Vec<Element> {
            dots.iter()
                .cloned()
                .map(Element::Dots)
                .chain(labels.iter().map(|l| Text::new(l.as_str(), Color::WHITE, &face).unwrap().into()))
                .collect()
        };
        let sizes: Vec<Size> = children().iter().map(Element::measure).collect();
        let col = Element::Column(children()).measure();
        let row = Element::Row(children()).measure();

        let widths: f32 = sizes.iter().map(|s| s.width).sum();
        let heights: f32 = sizes.iter().map(|s| s.height).sum();
        let max_w = sizes.iter().map(|s| s.width).fold(0.0, f32::max);
        let max_h = sizes.iter().map(|s| s.height).fold(0.0, f32::max);
        prop_assert_eq!(col, Size::new(max_w, heights));
        prop_assert_eq!(row, Size::new(widths, max_h));
    }

    #[test]
    fn measure_is_idempotent(src in ".{0,120}", numbers in any::<bool>()) {
        let face = FixedFace::new(7, 14);
        let theme = theme();
        let code = Code::new(&src, &PlainLexer, &theme, &face, numbers).unwrap();
        let root = Element::padding(Insets::uniform(3.0), Element::Column(vec![code.into()]));
        prop_assert_eq!(root.measure(), root.measure());
    }
}
