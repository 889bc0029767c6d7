//! codecard - renders source code as a styled snippet card (PNG or SVG)
//!
//! A render tokenizes the text once, builds a small element tree
//! (padding, card, title bar, code), measures it to size the output, and
//! paints it in one pass onto a raster or vector surface.

pub mod batch;
pub mod code;
pub mod color;
pub mod element;
pub mod error;
pub mod font;
pub mod lexer;
pub mod render;
pub mod surface;
pub mod theme;

pub use batch::{plan_jobs, run_batch, BatchOptions, BatchReport, CancelToken, Input, Job, Outcome, Resources};
pub use code::Code;
pub use color::{parse_hex_color, Color};
pub use element::{Dots, Element, Insets, Size, Text};
pub use error::{Error, Result};
pub use font::{Face, FixedFace, FontFace, FontMatch, FontRegistry};
pub use lexer::{Lexer, LexerRegistry, PlainLexer, Token, TokenKind, TreeSitterLexer};
pub use render::{layout, paint, preprocess, render, Canvas, OutputFormat, RenderOptions};
pub use surface::{DrawOp, RasterSurface, Recorder, Rect, Surface, VectorSurface};
pub use theme::{Theme, ThemeRegistry, DEFAULT_THEME};
