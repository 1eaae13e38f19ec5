//! Font loading and text measurement with `ttf-parser`; glyph painting
//! faces through `rusttype`.
//!
//! Without a loaded font file every family falls back to Helvetica-like
//! heuristic metrics, which keeps measurement deterministic. Loading a
//! TTF/OTF switches both measurement and rasterization to real glyph data.

use std::collections::HashMap;

use crate::error::{Error, Result};

/// A loaded font face with metrics.
#[derive(Clone)]
pub struct FontData {
    /// Raw font bytes (kept alive for ttf-parser's zero-copy API).
    pub bytes: Vec<u8>,
    pub units_per_em: f32,
    pub ascender: f32,
    pub descender: f32,
}

/// Manages loaded fonts.
#[derive(Clone, Default)]
pub struct FontManager {
    fonts: HashMap<FontKey, FontData>,
    /// First font loaded; used for families that have no face of their own.
    fallback: Option<FontKey>,
}

#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct FontKey {
    pub family: String,
    pub bold: bool,
    pub italic: bool,
}

impl FontKey {
    pub fn new(family: &str, bold: bool, italic: bool) -> Self {
        Self {
            family: family.to_ascii_lowercase(),
            bold,
            italic,
        }
    }
}

impl FontManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a TTF/OTF font from bytes.
    pub fn load_font(&mut self, family: &str, bold: bool, italic: bool, bytes: Vec<u8>) -> Result<()> {
        let face = ttf_parser::Face::parse(&bytes, 0)
            .map_err(|e| Error::Font(format!("failed to parse font '{family}': {e}")))?;

        let data = FontData {
            units_per_em: face.units_per_em() as f32,
            ascender: face.ascender() as f32,
            descender: face.descender() as f32,
            bytes,
        };

        let key = FontKey::new(family, bold, italic);
        log::debug!("Loaded font {key:?} ({} units/em)", data.units_per_em);
        if self.fallback.is_none() {
            self.fallback = Some(key.clone());
        }
        self.fonts.insert(key, data);
        Ok(())
    }

    /// Real font data for a style, trying the exact face, the regular face
    /// of the family, then the first loaded font.
    fn face_data(&self, family: &str, bold: bool, italic: bool) -> Option<&FontData> {
        self.fonts
            .get(&FontKey::new(family, bold, italic))
            .or_else(|| self.fonts.get(&FontKey::new(family, false, false)))
            .or_else(|| self.fallback.as_ref().and_then(|k| self.fonts.get(k)))
    }

    /// Check if any real font bytes are loaded.
    pub fn has_real_fonts(&self) -> bool {
        !self.fonts.is_empty()
    }

    /// Measure the width of a string at a given font size (in px).
    /// With a loaded font we sum glyph advances; otherwise each character
    /// gets a heuristic advance (see [`heuristic_advance`]).
    pub fn measure_text_width(&self, text: &str, font_size: f32, bold: bool, italic: bool, family: &str) -> f32 {
        let Some(data) = self.face_data(family, bold, italic) else {
            return text
                .chars()
                .map(|c| heuristic_advance(c, font_size, bold, family))
                .sum();
        };

        match ttf_parser::Face::parse(&data.bytes, 0) {
            Ok(face) => {
                let scale = font_size / data.units_per_em;
                text.chars()
                    .map(|ch| match face.glyph_index(ch) {
                        Some(gid) => face.glyph_hor_advance(gid).unwrap_or(0) as f32 * scale,
                        None => heuristic_advance(ch, font_size, bold, family),
                    })
                    .sum()
            }
            Err(_) => text
                .chars()
                .map(|c| heuristic_advance(c, font_size, bold, family))
                .sum(),
        }
    }

    /// Measure the line height in px.
    pub fn line_height_px(&self, font_size: f32, line_height_factor: f32) -> f32 {
        font_size * line_height_factor
    }

    /// Get the ascender in px for the given font.
    pub fn ascender_px(&self, font_size: f32, bold: bool, italic: bool, family: &str) -> f32 {
        match self.face_data(family, bold, italic) {
            Some(data) => data.ascender * font_size / data.units_per_em,
            None => font_size * 0.75,
        }
    }

    /// A `rusttype` face for painting text in this style, or `None` when
    /// no real font is loaded.
    pub fn glyph_font(&self, bold: bool, italic: bool, family: &str) -> Option<GlyphFont<'_>> {
        let data = self.face_data(family, bold, italic)?;
        let font = rusttype::Font::try_from_bytes(&data.bytes)?;
        Some(GlyphFont {
            font,
            height_per_em: (data.ascender - data.descender) / data.units_per_em,
        })
    }
}

/// Loaded face ready for rasterization.
pub struct GlyphFont<'a> {
    pub font: rusttype::Font<'a>,
    /// Ascent minus descent, in em.
    height_per_em: f32,
}

impl GlyphFont<'_> {
    /// `rusttype` scales to the ascent-descent height, CSS sizes are em.
    pub fn scale(&self, font_size_px: f32) -> rusttype::Scale {
        rusttype::Scale::uniform(font_size_px * self.height_per_em)
    }
}

/// Average-advance heuristic: ~0.5 em for proportional Latin text (bold
/// ~10 % wider), 0.6 em for monospace, a full em for wide CJK characters.
pub fn heuristic_advance(c: char, font_size: f32, bold: bool, family: &str) -> f32 {
    if is_wide(c) {
        return font_size;
    }
    let family = family.to_ascii_lowercase();
    let avg = if family.contains("courier") || family.contains("mono") {
        0.6
    } else if bold {
        0.55
    } else {
        0.5
    };
    font_size * avg
}

/// East Asian wide characters (Hangul, CJK ideographs, kana, full-width forms).
pub fn is_wide(c: char) -> bool {
    matches!(c as u32,
        0x1100..=0x115F
        | 0x2E80..=0x303E
        | 0x3041..=0x33FF
        | 0x3400..=0x4DBF
        | 0x4E00..=0x9FFF
        | 0xA960..=0xA97F
        | 0xAC00..=0xD7A3
        | 0xF900..=0xFAFF
        | 0xFF00..=0xFF60
        | 0xFFE0..=0xFFE6)
}
