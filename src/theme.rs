//! Colour themes: palette roles plus the numeric layout constants of a card

use crate::color::Color;
use crate::error::{Error, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

/// Name of the theme used when none is requested.
pub const DEFAULT_THEME: &str = "solarized-dark";

const BUILTIN_THEMES: &[(&str, &str)] = &[
    ("solarized-dark", include_str!("../themes/solarized-dark.json")),
    ("solarized-light", include_str!("../themes/solarized-light.json")),
    ("monokai", include_str!("../themes/monokai.json")),
    ("github", include_str!("../themes/github.json")),
];

/// A palette mapping role and token-class names to colours, plus layout
/// parameters. Read-only once loaded.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Theme {
    #[serde(default)]
    pub colors: HashMap<String, Color>,
    #[serde(default = "default_window_padding")]
    pub window_padding: f32,
    #[serde(default = "default_code_padding")]
    pub code_padding: f32,
    #[serde(default = "default_border_radius")]
    pub border_radius: f32,
    #[serde(default = "default_border_width")]
    pub border_width: f32,
    #[serde(default = "default_font_size")]
    pub font_size: f32,
    #[serde(default = "default_font")]
    pub font: String,
}

fn default_window_padding() -> f32 {
    32.0
}

fn default_code_padding() -> f32 {
    16.0
}

fn default_border_radius() -> f32 {
    8.0
}

fn default_border_width() -> f32 {
    1.0
}

fn default_font_size() -> f32 {
    16.0
}

fn default_font() -> String {
    "RobotoMono-Regular".to_string()
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            colors: HashMap::new(),
            window_padding: default_window_padding(),
            code_padding: default_code_padding(),
            border_radius: default_border_radius(),
            border_width: default_border_width(),
            font_size: default_font_size(),
            font: default_font(),
        }
    }
}

impl Theme {
    /// Parses a theme from JSON text.
    pub fn from_json(name: &str, json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::Format(format!("theme {name:?}: {e}")))
    }

    /// Looks up a colour for a token class or role.
    ///
    /// A miss falls back to `foreground`; a theme without `foreground`
    /// yields [`Color::MISSING`]. Never fails.
    pub fn color(&self, name: &str) -> Color {
        self.colors
            .get(name)
            .or_else(|| self.colors.get("foreground"))
            .copied()
            .unwrap_or(Color::MISSING)
    }

    /// Looks up a UI role with an explicit fallback instead of `foreground`.
    pub fn role_or(&self, name: &str, fallback: Color) -> Color {
        self.colors.get(name).copied().unwrap_or(fallback)
    }

    pub fn background(&self) -> Color {
        self.color("background")
    }

    pub fn window(&self) -> Color {
        self.color("window")
    }

    pub fn foreground(&self) -> Color {
        self.color("foreground")
    }

    pub fn line_number(&self) -> Color {
        self.color("lineNumber")
    }

    pub fn border(&self) -> Color {
        self.role_or("border", self.window())
    }

    pub fn title(&self) -> Color {
        self.role_or("title", self.line_number())
    }

    /// Shadow colour: the `shadow` role, else the window colour darkened
    /// (halved when the window is bright) at half opacity.
    pub fn shadow(&self) -> Color {
        if let Some(c) = self.colors.get("shadow") {
            return *c;
        }
        let window = self.window();
        let factor = if window.luma() > 200 { 0.5 } else { 0.8 };
        window.darken(factor).with_alpha(0x80)
    }

    /// Returns a copy with every length and the font size multiplied by `scale`.
    pub fn scaled(&self, scale: f32) -> Theme {
        Theme {
            window_padding: self.window_padding * scale,
            code_padding: self.code_padding * scale,
            border_radius: self.border_radius * scale,
            border_width: self.border_width * scale,
            font_size: self.font_size * scale,
            ..self.clone()
        }
    }
}

/// Built-in themes plus loading of external theme files.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThemeRegistry;

impl ThemeRegistry {
    pub fn new() -> Self {
        Self
    }

    /// Names of the built-in themes.
    pub fn names(&self) -> impl Iterator<Item = &'static str> {
        BUILTIN_THEMES.iter().map(|(name, _)| *name)
    }

    /// Loads a built-in theme by name, or a theme file when `name_or_path`
    /// ends in `.json` or names an existing file.
    pub fn load(&self, name_or_path: &str) -> Result<Theme> {
        if let Some((name, json)) = BUILTIN_THEMES.iter().find(|(n, _)| *n == name_or_path) {
            debug!(theme = name, "loading built-in theme");
            return Theme::from_json(name, json);
        }

        let path = Path::new(name_or_path);
        if name_or_path.ends_with(".json") || path.is_file() {
            debug!(path = %path.display(), "loading theme file");
            let json = std::fs::read_to_string(path)
                .map_err(|e| Error::Resource(format!("theme file {}: {e}", path.display())))?;
            return Theme::from_json(name_or_path, &json);
        }

        Err(Error::Config(format!(
            "unknown theme {name_or_path:?} (built-in themes: {})",
            self.names().collect::<Vec<_>>().join(", ")
        )))
    }
}
