//! Glyph metrics: advance widths and line heights for a font at a pixel size

use crate::error::{Error, Result};
use fontdue::{Font, FontSettings};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use usvg::fontdb::{self, Database, FaceInfo, Family, Query, Source, Style, Weight};

/// Extra pixels added to every line height to match native terminal spacing.
pub const LINE_LEADING: i32 = 2;

/// Environment variable naming an extra font search directory.
pub const FONT_DIR_ENV: &str = "CODECARD_FONT_DIR";

/// Coverage bitmap of one rasterized glyph, positioned relative to the pen
/// on the baseline (y grows upward, as fontdue reports it).
#[derive(Debug, Clone, PartialEq)]
pub struct GlyphBitmap {
    pub width: usize,
    pub height: usize,
    pub xmin: i32,
    pub ymin: i32,
    pub coverage: Vec<u8>,
}

/// A font at a specific size.
///
/// Every width and height in a layout is a sum of [`Face::advance`] and
/// [`Face::line_height`].
pub trait Face: Send + Sync {
    /// Font family name, used by vector output.
    fn family(&self) -> &str;

    /// Pixel size.
    fn size(&self) -> f32;

    /// Advance width of `ch` in whole pixels; [`Error::Glyph`] when the
    /// font has no glyph for it.
    fn advance(&self, ch: char) -> Result<i32>;

    /// Height of one line in whole pixels, leading included.
    fn line_height(&self) -> i32;

    /// Distance from the top of a line cell to the baseline.
    fn baseline(&self) -> i32;

    /// Coverage bitmap for raster output; `None` for blank glyphs.
    fn rasterize(&self, ch: char) -> Option<GlyphBitmap>;
}

/// A parsed font file at one pixel size.
pub struct FontFace {
    font: Font,
    family: String,
    px: f32,
    ascent: f32,
    line_height: i32,
}

impl FontFace {
    pub fn from_bytes(family: impl Into<String>, data: &[u8], px: f32) -> Result<Self> {
        Self::parse(family.into(), data, 0, px)
    }

    /// Parses the first face in `path`, naming it after the family in its
    /// name table.
    pub fn from_file(path: &Path, px: f32) -> Result<Self> {
        let data = std::fs::read(path)
            .map_err(|e| Error::Resource(format!("cannot read font {}: {e}", path.display())))?;
        let family = family_name(&data, 0)
            .or_else(|| path.file_stem().map(|s| s.to_string_lossy().into_owned()))
            .unwrap_or_else(|| "monospace".to_string());
        Self::parse(family, &data, 0, px)
    }

    fn parse(family: String, data: &[u8], index: u32, px: f32) -> Result<Self> {
        let font = Font::from_bytes(
            data,
            FontSettings {
                scale: px,
                collection_index: index,
                ..FontSettings::default()
            },
        )
        .map_err(|e| Error::Resource(format!("cannot parse font {family:?}: {e}")))?;

        let (ascent, line_height) = match font.horizontal_line_metrics(px) {
            Some(m) => (m.ascent, (m.ascent - m.descent + m.line_gap).round() as i32),
            None => (px, (px * 1.25).round() as i32),
        };

        Ok(Self {
            font,
            family,
            px,
            ascent,
            line_height: line_height + LINE_LEADING,
        })
    }

    fn has_glyph(&self, ch: char) -> bool {
        self.font.lookup_glyph_index(ch) != 0
    }
}

impl Face for FontFace {
    fn family(&self) -> &str {
        &self.family
    }

    fn size(&self) -> f32 {
        self.px
    }

    fn advance(&self, ch: char) -> Result<i32> {
        if !self.has_glyph(ch) {
            return Err(Error::Glyph {
                family: self.family.clone(),
                ch,
            });
        }
        Ok(self.font.metrics(ch, self.px).advance_width.round() as i32)
    }

    fn line_height(&self) -> i32 {
        self.line_height
    }

    fn baseline(&self) -> i32 {
        LINE_LEADING / 2 + self.ascent.round() as i32
    }

    fn rasterize(&self, ch: char) -> Option<GlyphBitmap> {
        let (m, coverage) = self.font.rasterize(ch, self.px);
        if m.width == 0 || m.height == 0 {
            return None;
        }
        Some(GlyphBitmap {
            width: m.width,
            height: m.height,
            xmin: m.xmin,
            ymin: m.ymin,
            coverage,
        })
    }
}

/// A synthetic monospace face: every glyph is `advance` pixels wide and
/// every line `line_height` pixels tall. Glyphs rasterize as solid blocks.
#[derive(Debug, Clone)]
pub struct FixedFace {
    advance: i32,
    line_height: i32,
    missing: Vec<char>,
}

impl FixedFace {
    pub fn new(advance: i32, line_height: i32) -> Self {
        Self {
            advance,
            line_height,
            missing: Vec::new(),
        }
    }

    /// Marks code points the face has no glyph for.
    pub fn without(mut self, chars: impl IntoIterator<Item = char>) -> Self {
        self.missing.extend(chars);
        self
    }
}

impl Face for FixedFace {
    fn family(&self) -> &str {
        "monospace"
    }

    fn size(&self) -> f32 {
        (self.line_height - LINE_LEADING).max(1) as f32
    }

    fn advance(&self, ch: char) -> Result<i32> {
        if self.missing.contains(&ch) {
            return Err(Error::Glyph {
                family: self.family().to_string(),
                ch,
            });
        }
        Ok(self.advance)
    }

    fn line_height(&self) -> i32 {
        self.line_height
    }

    fn baseline(&self) -> i32 {
        self.line_height * 4 / 5
    }

    fn rasterize(&self, ch: char) -> Option<GlyphBitmap> {
        if ch.is_whitespace() {
            return None;
        }
        let width = (self.advance - 2).max(1) as usize;
        let height = (self.baseline() - 2).max(1) as usize;
        Some(GlyphBitmap {
            width,
            height,
            xmin: 1,
            ymin: 0,
            coverage: vec![255; width * height],
        })
    }
}

/// Font discovery backed by a [`fontdb::Database`] of every face found in
/// the searched directories.
#[derive(Clone, Default)]
pub struct FontRegistry {
    db: Database,
}

/// A face picked by [`FontRegistry::find`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontMatch {
    pub id: fontdb::ID,
    /// Typographic family name of the matched face.
    pub family: String,
    /// True when nothing matched the requested name and a monospace face
    /// was substituted.
    pub fallback: bool,
}

impl FontRegistry {
    /// Indexes `extra_dirs`, then `$CODECARD_FONT_DIR`, then the system fonts.
    pub fn new(extra_dirs: impl IntoIterator<Item = PathBuf>) -> Self {
        let mut registry = Self::with_dirs(extra_dirs);
        if let Some(dir) = std::env::var_os(FONT_DIR_ENV) {
            registry.db.load_fonts_dir(PathBuf::from(dir));
        }
        registry.db.load_system_fonts();
        debug!(faces = registry.db.len(), "indexed fonts");
        registry
    }

    /// A registry that only indexes the given directories.
    pub fn with_dirs(dirs: impl IntoIterator<Item = PathBuf>) -> Self {
        let mut db = Database::new();
        for dir in dirs {
            db.load_fonts_dir(dir);
        }
        Self { db }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn is_empty(&self) -> bool {
        self.db.is_empty()
    }

    /// Looks `name` up as a family name, then as a PostScript name or file
    /// stem (case-insensitively). Falls back to a monospace face.
    pub fn find(&self, name: &str) -> Result<FontMatch> {
        let exact = self.db.query(&Query {
            families: &[Family::Name(name)],
            ..Query::default()
        });
        if let Some(found) = exact.or_else(|| self.find_loose(name)) {
            return Ok(self.matched(found, false));
        }

        let mono = self
            .db
            .query(&Query {
                families: &[Family::Monospace],
                ..Query::default()
            })
            .or_else(|| preferred(self.db.faces().filter(|f| f.monospaced)));
        match mono {
            Some(found) => {
                let found = self.matched(found, true);
                warn!(requested = name, family = %found.family, "font not found, using a monospace fallback");
                Ok(found)
            }
            None => Err(Error::Resource(format!(
                "font {name:?} not found and no monospace fallback among {} faces (add fonts with --font-dir or ${FONT_DIR_ENV})",
                self.db.len()
            ))),
        }
    }

    /// Loads `name` at `px` pixels. An existing file path is loaded directly.
    pub fn load(&self, name: &str, px: f32) -> Result<FontFace> {
        let direct = Path::new(name);
        if direct.is_file() {
            return FontFace::from_file(direct, px);
        }
        let found = self.find(name)?;
        debug!(font = name, family = %found.family, "resolved font");
        self.db
            .with_face_data(found.id, |data, index| {
                FontFace::parse(found.family.clone(), data, index, px)
            })
            .unwrap_or_else(|| Err(Error::Resource(format!("cannot read font data for {:?}", found.family))))
    }

    fn find_loose(&self, name: &str) -> Option<fontdb::ID> {
        let wanted = name.to_lowercase();
        preferred(self.db.faces().filter(|face| {
            face.families.iter().any(|(family, _)| family.to_lowercase() == wanted)
                || face.post_script_name.to_lowercase() == wanted
                || source_stem(&face.source).is_some_and(|stem| stem == wanted)
        }))
    }

    fn matched(&self, id: fontdb::ID, fallback: bool) -> FontMatch {
        let family = self
            .db
            .face(id)
            .and_then(|face| face.families.first())
            .map(|(family, _)| family.clone())
            .unwrap_or_else(|| "monospace".to_string());
        FontMatch { id, family, fallback }
    }
}

impl std::fmt::Debug for FontRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontRegistry").field("faces", &self.db.len()).finish()
    }
}

/// The regular upright face among `faces`, else the first.
fn preferred<'a>(faces: impl Iterator<Item = &'a FaceInfo>) -> Option<fontdb::ID> {
    let faces: Vec<&FaceInfo> = faces.collect();
    faces
        .iter()
        .find(|f| f.weight == Weight::NORMAL && f.style == Style::Normal)
        .or_else(|| faces.first())
        .map(|f| f.id)
}

fn source_stem(source: &Source) -> Option<String> {
    let path = match source {
        Source::File(path) | Source::SharedFile(path, _) => path,
        Source::Binary(_) => return None,
    };
    path.file_stem().map(|s| s.to_string_lossy().to_lowercase())
}

/// Typographic family name stored in the font's name table.
fn family_name(data: &[u8], index: u32) -> Option<String> {
    let mut db = Database::new();
    db.load_font_data(data.to_vec());
    let family = db
        .faces()
        .find(|face| face.index == index)
        .and_then(|face| face.families.first())
        .map(|(family, _)| family.clone());
    family
}
