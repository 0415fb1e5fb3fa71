//! # Font Management
//!
//! Text measurement needs advance widths. Built-in faces cover the sans,
//! serif and monospace families notes are written in; custom TrueType/OpenType
//! faces can be registered and are measured with their real metrics via
//! ttf-parser.

pub mod metrics;

pub use metrics::StandardFontMetrics;

use std::collections::HashMap;

use crate::error::{FolioError, Result};

/// Built-in faces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StandardFont {
    Helvetica,
    HelveticaBold,
    Times,
    TimesBold,
    Courier,
}

impl StandardFont {
    pub fn metrics(&self) -> StandardFontMetrics {
        match self {
            Self::Helvetica => StandardFontMetrics::HELVETICA,
            Self::HelveticaBold => StandardFontMetrics::HELVETICA_BOLD,
            Self::Times => StandardFontMetrics::TIMES,
            Self::TimesBold => StandardFontMetrics::TIMES_BOLD,
            Self::Courier => StandardFontMetrics::COURIER,
        }
    }

    /// Map a CSS family name to a built-in face.
    fn for_family(family: &str, bold: bool) -> Self {
        let family = family.to_ascii_lowercase();
        let serif = matches!(
            family.as_str(),
            "serif" | "times" | "times new roman" | "georgia" | "cambria" | "garamond"
        );
        let mono = matches!(
            family.as_str(),
            "monospace" | "courier" | "courier new" | "consolas" | "menlo" | "monaco"
        ) || family.ends_with(" mono");
        match (serif, mono, bold) {
            (_, true, _) => Self::Courier,
            (true, _, false) => Self::Times,
            (true, _, true) => Self::TimesBold,
            (_, _, false) => Self::Helvetica,
            (_, _, true) => Self::HelveticaBold,
        }
    }
}

/// Parsed metrics from a TrueType/OpenType font via ttf-parser.
#[derive(Debug, Clone)]
pub struct CustomFontMetrics {
    pub units_per_em: u16,
    pub advance_widths: HashMap<char, u16>,
    pub default_advance: u16,
}

impl CustomFontMetrics {
    /// Get the advance width of a character in pixels.
    pub fn char_width(&self, ch: char, font_size: f64) -> f64 {
        let w = self
            .advance_widths
            .get(&ch)
            .copied()
            .unwrap_or(self.default_advance);
        (w as f64 / self.units_per_em as f64) * font_size
    }

    /// Parse metrics from font data using ttf-parser.
    pub fn from_font_data(data: &[u8]) -> Option<Self> {
        let face = ttf_parser::Face::parse(data, 0).ok()?;
        let units_per_em = face.units_per_em();

        let mut advance_widths = HashMap::new();
        let mut default_advance = 0u16;

        // Basic Multilingual Plane is enough for note text
        for code in 32u32..=0xFFFF {
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

        Some(CustomFontMetrics {
            units_per_em,
            advance_widths,
            default_advance,
        })
    }
}

#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct FontKey {
    pub family: String,
    pub bold: bool,
}

/// Shared font context used by measurement.
#[derive(Debug, Clone, Default)]
pub struct FontContext {
    custom: HashMap<FontKey, CustomFontMetrics>,
}

impl FontContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a custom face. The family name is matched case-insensitively.
    pub fn register(&mut self, family: &str, weight: u32, data: &[u8]) -> Result<()> {
        let metrics = CustomFontMetrics::from_font_data(data)
            .ok_or_else(|| FolioError::Font(format!("'{}' is not a TrueType/OpenType font", family)))?;
        log::debug!(
            "registered font '{}' ({} glyph advances)",
            family,
            metrics.advance_widths.len()
        );
        self.custom.insert(
            FontKey {
                family: family.to_ascii_lowercase(),
                bold: weight >= 600,
            },
            metrics,
        );
        Ok(())
    }

    /// Register a font file from disk.
    pub fn register_file(&mut self, family: &str, weight: u32, path: &std::path::Path) -> Result<()> {
        let data = std::fs::read(path)?;
        self.register(family, weight, &data)
    }

    fn custom_face(&self, family: &str, bold: bool) -> Option<&CustomFontMetrics> {
        let family = family.to_ascii_lowercase();
        self.custom
            .get(&FontKey {
                family: family.clone(),
                bold,
            })
            .or_else(|| self.custom.get(&FontKey { family, bold: !bold }))
    }

    /// Get the advance width of a single character in pixels.
    pub fn char_width(&self, ch: char, family: &str, weight: u32, font_size: f64) -> f64 {
        let bold = weight >= 600;
        match self.custom_face(family, bold) {
            Some(m) => m.char_width(ch, font_size),
            None => StandardFont::for_family(family, bold)
                .metrics()
                .char_width(ch, font_size),
        }
    }

    /// Measure the width of a string in pixels.
    pub fn measure_string(&self, text: &str, family: &str, weight: u32, font_size: f64) -> f64 {
        let bold = weight >= 600;
        match self.custom_face(family, bold) {
            Some(m) => text.chars().map(|ch| m.char_width(ch, font_size)).sum(),
            None => StandardFont::for_family(family, bold)
                .metrics()
                .measure_string(text, font_size, 0.0),
        }
    }

    pub fn custom_font_count(&self) -> usize {
        self.custom.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn helvetica_space_width() {
        let ctx = FontContext::new();
        let w = ctx.char_width(' ', "Helvetica", 400, 12.0);
        assert!((w - 3.336).abs() < 0.001);
    }

    #[test]
    fn bold_is_wider() {
        let ctx = FontContext::new();
        let regular = ctx.char_width('A', "Arial", 400, 12.0);
        let bold = ctx.char_width('A', "Arial", 700, 12.0);
        assert!(bold > regular, "Bold A should be wider than regular A");
    }

    #[test]
    fn unknown_family_falls_back_to_sans() {
        let ctx = FontContext::new();
        let w1 = ctx.char_width('A', "Helvetica", 400, 12.0);
        let w2 = ctx.char_width('A', "UnknownFont", 400, 12.0);
        assert!((w1 - w2).abs() < 0.001);
    }

    #[test]
    fn generic_families_resolve() {
        assert_eq!(StandardFont::for_family("monospace", true), StandardFont::Courier);
        assert_eq!(StandardFont::for_family("Georgia", false), StandardFont::Times);
        assert_eq!(StandardFont::for_family("JetBrains Mono", false), StandardFont::Courier);
    }

    #[test]
    fn register_rejects_garbage() {
        let mut ctx = FontContext::new();
        let err = ctx.register("Broken", 400, b"not a font").unwrap_err();
        assert!(matches!(err, FolioError::Font(_)));
        assert_eq!(ctx.custom_font_count(), 0);
    }

    #[test]
    fn measure_string_sums_chars() {
        let ctx = FontContext::new();
        let w = ctx.measure_string("ab", "Helvetica", 400, 10.0);
        let expected = ctx.char_width('a', "Helvetica", 400, 10.0) + ctx.char_width('b', "Helvetica", 400, 10.0);
        assert!((w - expected).abs() < 1e-9);
    }
}
