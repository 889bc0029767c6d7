//! Error types for snippet rendering

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for rendering operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while rendering a snippet.
///
/// Every variant is terminal for the render it occurs in. The batch driver
/// reports it and moves on to the next input.
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed colour or theme literal
    #[error("Invalid format: {0}")]
    Format(String),

    /// The font has no glyph for a code point in the input
    #[error("Font {family:?} has no glyph for {ch:?} (U+{code:04X})", code = code_point(.ch))]
    Glyph { family: String, ch: char },

    /// The lexer rejected the input
    #[error("Tokenizing failed: {0}")]
    Tokenize(String),

    /// Missing or unusable font, theme, or syntax resource
    #[error("Resource unavailable: {0}")]
    Resource(String),

    /// Unsupported output format, unknown theme or syntax name
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Encoding the finished surface failed
    #[error("Encoding failed: {0}")]
    Encode(String),

    /// Reading input or writing output failed
    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn code_point(ch: &char) -> u32 {
    u32::from(*ch)
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}
