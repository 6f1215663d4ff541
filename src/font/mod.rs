//! # Font Management
//!
//! The metrics service the layout engine measures text against, plus the
//! face data the PDF writer embeds.
//!
//! The engine only ever talks to the [`FontMetrics`] trait: a width for a
//! string at a size. Line height is the layout configuration's leading
//! times the size, so it never depends on the face. [`FontContext`] is the stock
//! implementation. It serves either one of the standard PDF families (no
//! embedding, AFM widths) or a regular/bold pair of TrueType faces parsed
//! with ttf-parser.

pub mod metrics;

pub use metrics::StandardFontMetrics;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// The two weights a checklist uses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Weight {
    #[default]
    Regular,
    Bold,
}

/// Text measurement for a font family.
///
/// Implementations must be pure: the same arguments always give the same
/// answer, which is what lets [`crate::text::TextMeasurer`] cache results.
pub trait FontMetrics: Sync {
    /// Advance width of one character in points.
    fn char_width(&self, ch: char, weight: Weight, size: f64) -> f64;

    /// Width of a string in points.
    fn text_width(&self, text: &str, weight: Weight, size: f64) -> f64 {
        text.chars().map(|ch| self.char_width(ch, weight, size)).sum()
    }
}

/// Standard PDF font families that need no embedding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum StandardFamily {
    #[default]
    Helvetica,
    Courier,
}

impl StandardFamily {
    pub fn metrics(&self, weight: Weight) -> &'static StandardFontMetrics {
        match (self, weight) {
            (StandardFamily::Helvetica, Weight::Regular) => &metrics::HELVETICA,
            (StandardFamily::Helvetica, Weight::Bold) => &metrics::HELVETICA_BOLD,
            (StandardFamily::Courier, _) => &metrics::COURIER,
        }
    }

    /// The PDF base font name for this family at `weight`.
    pub fn pdf_name(&self, weight: Weight) -> &'static str {
        match (self, weight) {
            (StandardFamily::Helvetica, Weight::Regular) => "Helvetica",
            (StandardFamily::Helvetica, Weight::Bold) => "Helvetica-Bold",
            (StandardFamily::Courier, Weight::Regular) => "Courier",
            (StandardFamily::Courier, Weight::Bold) => "Courier-Bold",
        }
    }
}

/// Parsed metrics from a TrueType/OpenType font via ttf-parser.
#[derive(Debug, Clone)]
pub struct CustomFontMetrics {
    pub units_per_em: u16,
    pub advance_widths: HashMap<char, u16>,
    pub default_advance: u16,
    pub ascender: i16,
    pub descender: i16,
    pub cap_height: i16,
    /// Font bounding box as (x_min, y_min, x_max, y_max) in font units.
    pub bbox: (i16, i16, i16, i16),
}

impl CustomFontMetrics {
    /// Get the advance width of a character in points.
    pub fn char_width(&self, ch: char, font_size: f64) -> f64 {
        (self.advance_units(ch) as f64 / self.units_per_em as f64) * font_size
    }

    /// Advance width of a character in font units.
    pub fn advance_units(&self, ch: char) -> u16 {
        self.advance_widths
            .get(&ch)
            .copied()
            .unwrap_or(self.default_advance)
    }

    /// Parse metrics from font data using ttf-parser.
    pub fn from_font_data(data: &[u8]) -> Result<Self> {
        let face = ttf_parser::Face::parse(data, 0)?;
        let units_per_em = face.units_per_em();

        let mut advance_widths = HashMap::new();
        let mut default_advance = 0u16;

        // Latin-1 plus general punctuation covers every character the PDF
        // writer can encode for a simple TrueType font.
        let ranges = [0x20u32..=0xFF, 0x2000..=0x206F, 0x20AC..=0x20AC, 0x2122..=0x2122];
        for code in ranges.into_iter().flatten() {
            if let Some(ch) = char::from_u32(code) {
                if let Some(glyph_id) = face.glyph_index(ch) {
                    let advance = face.glyph_hor_advance(glyph_id).unwrap_or(0);
                    advance_widths.insert(ch, advance);
                    if ch == ' ' {
                        default_advance = advance;
                    }
                }
            }
        }

        if default_advance == 0 {
            default_advance = units_per_em / 2;
        }

        let rect = face.global_bounding_box();
        Ok(CustomFontMetrics {
            units_per_em,
            advance_widths,
            default_advance,
            ascender: face.ascender(),
            descender: face.descender(),
            cap_height: face.capital_height().unwrap_or_else(|| face.ascender()),
            bbox: (rect.x_min, rect.y_min, rect.x_max, rect.y_max),
        })
    }
}

/// A TrueType face loaded from disk or memory, kept whole for embedding.
#[derive(Debug, Clone)]
pub struct TrueTypeFace {
    /// PDF base font name (no spaces).
    pub name: String,
    pub data: Vec<u8>,
    pub metrics: CustomFontMetrics,
}

impl TrueTypeFace {
    pub fn parse(name: &str, data: Vec<u8>) -> Result<Self> {
        let metrics = CustomFontMetrics::from_font_data(&data)?;
        let name: String = name.chars().filter(|c| c.is_ascii_alphanumeric() || *c == '-').collect();
        if name.is_empty() {
            return Err(Error::Font("font name has no usable characters".to_string()));
        }
        Ok(Self {
            name,
            data,
            metrics,
        })
    }

    /// Load a face from a font file, naming it after the file stem.
    pub fn load(path: &std::path::Path) -> Result<Self> {
        let data = std::fs::read(path)?;
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self::parse(&stem, data)
    }
}

/// Which faces a [`FontContext`] measures with.
#[derive(Debug, Clone)]
pub enum FontFaces {
    Standard(StandardFamily),
    TrueType {
        regular: Box<TrueTypeFace>,
        bold: Box<TrueTypeFace>,
    },
}

/// Shared font context used by layout and PDF serialization.
#[derive(Debug, Clone)]
pub struct FontContext {
    faces: FontFaces,
}

impl Default for FontContext {
    fn default() -> Self {
        Self::standard(StandardFamily::Helvetica)
    }
}

impl FontContext {
    pub fn standard(family: StandardFamily) -> Self {
        Self {
            faces: FontFaces::Standard(family),
        }
    }

    pub fn truetype(regular: TrueTypeFace, bold: TrueTypeFace) -> Self {
        Self {
            faces: FontFaces::TrueType {
                regular: Box::new(regular),
                bold: Box::new(bold),
            },
        }
    }

    pub fn faces(&self) -> &FontFaces {
        &self.faces
    }
}

impl FontMetrics for FontContext {
    fn char_width(&self, ch: char, weight: Weight, size: f64) -> f64 {
        match &self.faces {
            FontFaces::Standard(family) => family.metrics(weight).char_width(ch, size),
            FontFaces::TrueType { regular, bold } => match weight {
                Weight::Regular => regular.metrics.char_width(ch, size),
                Weight::Bold => bold.metrics.char_width(ch, size),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_font_context_helvetica() {
        let ctx = FontContext::default();
        let w = ctx.char_width(' ', Weight::Regular, 12.0);
        assert!((w - 3.336).abs() < 0.001);
    }

    #[test]
    fn test_font_context_bold_wider() {
        let ctx = FontContext::default();
        let regular = ctx.text_width("checklist", Weight::Regular, 12.0);
        let bold = ctx.text_width("checklist", Weight::Bold, 12.0);
        assert!(bold > regular, "bold text should be wider than regular");
    }

    #[test]
    fn test_pdf_names() {
        assert_eq!(StandardFamily::Helvetica.pdf_name(Weight::Bold), "Helvetica-Bold");
        assert_eq!(StandardFamily::Courier.pdf_name(Weight::Regular), "Courier");
    }

    #[test]
    fn test_invalid_truetype_data_is_an_error() {
        let err = TrueTypeFace::parse("Broken", vec![0, 1, 2, 3]).unwrap_err();
        assert!(matches!(err, Error::Font(_)));
    }
}
