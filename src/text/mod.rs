//! # Text Layout
//!
//! Greedy line breaking over styled inline content.
//!
//! An inline formatting context is flattened into a stream of measured
//! glyphs (text, forced breaks and atomic boxes such as inline images).
//! UAX#14 supplies the break opportunities; lines are filled greedily and
//! every line is as tall as the tallest line-height on it, never shorter
//! than the block's strut.

use crate::font::FontContext;
use unicode_linebreak::{linebreaks, BreakOpportunity};

/// A run of text sharing one font.
#[derive(Debug, Clone)]
pub struct TextSpan {
    pub text: String,
    pub font_family: String,
    pub font_weight: u32,
    pub font_size: f64,
    /// Used line height in px.
    pub line_height: f64,
}

/// One item of an inline formatting context.
#[derive(Debug, Clone)]
pub enum InlineItem {
    Text(TextSpan),
    /// A `<br>`.
    LineBreak { line_height: f64 },
    /// A replaced element laid out as a single unbreakable box.
    Atomic { width: f64, height: f64 },
}

/// A laid-out line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineBox {
    pub width: f64,
    pub height: f64,
}

/// How whitespace and wrapping behave in one formatting context.
#[derive(Debug, Clone, Copy)]
pub struct WrapMode {
    /// Keep newlines and runs of spaces (`pre`, `pre-wrap`).
    pub preserve_whitespace: bool,
    /// Break lines that overflow the available width.
    pub wrap: bool,
}

impl Default for WrapMode {
    fn default() -> Self {
        Self {
            preserve_whitespace: false,
            wrap: true,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Glyph {
    ch: char,
    width: f64,
    line_height: f64,
}

impl Glyph {
    fn is_space(&self) -> bool {
        self.ch == ' '
    }
}

const OBJECT_REPLACEMENT: char = '\u{FFFC}';

/// Compute UAX#14 line break opportunities, indexed by char position.
/// `result[i]` is the opportunity for breaking *before* char `i`.
fn compute_break_opportunities(text: &str) -> Vec<Option<BreakOpportunity>> {
    let char_count = text.chars().count();
    let mut result = vec![None; char_count];

    let mut byte_to_char = vec![0usize; text.len() + 1];
    for (char_idx, (byte_idx, _)) in text.char_indices().enumerate() {
        byte_to_char[byte_idx] = char_idx;
    }
    byte_to_char[text.len()] = char_count;

    for (byte_offset, opp) in linebreaks(text) {
        let char_idx = byte_to_char[byte_offset];
        // A break at the very end of the text is implicit.
        if char_idx < char_count {
            result[char_idx] = Some(opp);
        }
    }

    result
}

pub struct TextLayout;

impl Default for TextLayout {
    fn default() -> Self {
        Self::new()
    }
}

impl TextLayout {
    pub fn new() -> Self {
        Self
    }

    /// Break inline items into lines no wider than `max_width`.
    ///
    /// `strut` is the line height of the containing block. Content that
    /// collapses to nothing produces no lines at all.
    pub fn break_into_lines(
        &self,
        fonts: &FontContext,
        items: &[InlineItem],
        max_width: f64,
        strut: f64,
        mode: WrapMode,
    ) -> Vec<LineBox> {
        let glyphs = self.flatten(fonts, items, mode);
        if glyphs.is_empty() {
            return Vec::new();
        }

        let plain_text: String = glyphs.iter().map(|g| g.ch).collect();
        let break_opps = compute_break_opportunities(&plain_text);

        let mut lines = Vec::new();
        let mut line_start = 0;
        let mut line_width = 0.0;
        let mut last_break_point: Option<usize> = None;

        for (i, glyph) in glyphs.iter().enumerate() {
            if i > line_start {
                match break_opps[i] {
                    Some(BreakOpportunity::Mandatory) => {
                        lines.push(line_box(&glyphs[line_start..i], strut));
                        line_start = i;
                        line_width = 0.0;
                        last_break_point = None;
                    }
                    Some(BreakOpportunity::Allowed) => last_break_point = Some(i),
                    None => {}
                }
            }

            if glyph.ch == '\n' {
                continue;
            }

            let overflows = mode.wrap && line_width + glyph.width > max_width && i > line_start;
            // Trailing spaces hang past the edge instead of wrapping.
            if overflows && !glyph.is_space() {
                match last_break_point.filter(|&bp| bp > line_start) {
                    Some(bp) => {
                        lines.push(line_box(&glyphs[line_start..bp], strut));
                        line_start = bp;
                        line_width = glyphs[bp..i].iter().map(|g| g.width).sum();
                    }
                    None => {
                        // No opportunity on this line: break inside the word.
                        lines.push(line_box(&glyphs[line_start..i], strut));
                        line_start = i;
                        line_width = 0.0;
                    }
                }
                last_break_point = None;
            }

            line_width += glyph.width;
        }

        if line_start < glyphs.len() {
            lines.push(line_box(&glyphs[line_start..], strut));
        }

        lines
    }

    /// Total height of the lines produced by [`break_into_lines`](Self::break_into_lines).
    pub fn measure_height(
        &self,
        fonts: &FontContext,
        items: &[InlineItem],
        max_width: f64,
        strut: f64,
        mode: WrapMode,
    ) -> f64 {
        self.break_into_lines(fonts, items, max_width, strut, mode)
            .iter()
            .map(|l| l.height)
            .sum()
    }

    /// Turn inline items into measured glyphs, collapsing whitespace
    /// unless the mode preserves it.
    fn flatten(&self, fonts: &FontContext, items: &[InlineItem], mode: WrapMode) -> Vec<Glyph> {
        let mut glyphs: Vec<Glyph> = Vec::new();

        for item in items {
            match item {
                InlineItem::Text(span) => {
                    for ch in span.text.chars() {
                        let ch = match ch {
                            '\r' => continue,
                            '\t' if !mode.preserve_whitespace => ' ',
                            '\n' if !mode.preserve_whitespace => ' ',
                            c if c.is_whitespace() && c != '\n' && c != '\u{a0}' => ' ',
                            c => c,
                        };
                        if ch == ' ' && !mode.preserve_whitespace {
                            let collapses = match glyphs.last() {
                                None => true,
                                Some(prev) => prev.is_space() || prev.ch == '\n',
                            };
                            if collapses {
                                continue;
                            }
                        }
                        let width = if ch == '\n' {
                            0.0
                        } else {
                            fonts.char_width(ch, &span.font_family, span.font_weight, span.font_size)
                        };
                        glyphs.push(Glyph {
                            ch,
                            width,
                            line_height: span.line_height,
                        });
                    }
                }
                InlineItem::LineBreak { line_height } => {
                    if !mode.preserve_whitespace {
                        while glyphs.last().is_some_and(Glyph::is_space) {
                            glyphs.pop();
                        }
                    }
                    glyphs.push(Glyph {
                        ch: '\n',
                        width: 0.0,
                        line_height: *line_height,
                    });
                }
                InlineItem::Atomic { width, height } => glyphs.push(Glyph {
                    ch: OBJECT_REPLACEMENT,
                    width: *width,
                    line_height: *height,
                }),
            }
        }

        if !mode.preserve_whitespace {
            while glyphs.last().is_some_and(Glyph::is_space) {
                glyphs.pop();
            }
        }

        glyphs
    }
}

fn line_box(glyphs: &[Glyph], strut: f64) -> LineBox {
    let trailing = glyphs.iter().rev().take_while(|g| g.is_space()).count();
    let width = glyphs[..glyphs.len() - trailing]
        .iter()
        .map(|g| g.width)
        .sum();
    let height = glyphs
        .iter()
        .map(|g| g.line_height)
        .fold(strut, f64::max);
    LineBox { width, height }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(text: &str, size: f64) -> InlineItem {
        InlineItem::Text(TextSpan {
            text: text.to_string(),
            font_family: "Helvetica".to_string(),
            font_weight: 400,
            font_size: size,
            line_height: size * 1.2,
        })
    }

    fn lines(items: &[InlineItem], width: f64) -> Vec<LineBox> {
        TextLayout::new().break_into_lines(&FontContext::new(), items, width, 12.0, WrapMode::default())
    }

    #[test]
    fn single_line() {
        let result = lines(&[span("Hello", 10.0)], 200.0);
        assert_eq!(result.len(), 1);
        assert!((result[0].height - 12.0).abs() < 1e-9);
    }

    #[test]
    fn wraps_at_spaces() {
        let result = lines(&[span("Hello World again", 10.0)], 40.0);
        assert!(result.len() >= 2);
        assert!(result.iter().all(|l| l.width <= 40.0));
    }

    #[test]
    fn line_break_item_forces_new_line() {
        let items = [span("one", 10.0), InlineItem::LineBreak { line_height: 12.0 }, span("two", 10.0)];
        assert_eq!(lines(&items, 500.0).len(), 2);
    }

    #[test]
    fn whitespace_only_content_has_no_lines() {
        assert!(lines(&[span("  \n\t ", 10.0)], 100.0).is_empty());
    }

    #[test]
    fn preserved_newlines_break() {
        let mode = WrapMode {
            preserve_whitespace: true,
            wrap: true,
        };
        let result = TextLayout::new().break_into_lines(
            &FontContext::new(),
            &[span("a\nb\nc", 10.0)],
            500.0,
            12.0,
            mode,
        );
        assert_eq!(result.len(), 3);
    }

    #[test]
    fn long_word_breaks_inside() {
        let result = lines(&[span("abcdefghijklmnopqrstuvwxyz", 10.0)], 30.0);
        assert!(result.len() > 1);
    }

    #[test]
    fn tallest_run_sets_line_height() {
        let items = [span("small ", 10.0), span("BIG", 30.0)];
        let result = lines(&items, 500.0);
        assert_eq!(result.len(), 1);
        assert!((result[0].height - 36.0).abs() < 1e-9);
    }

    #[test]
    fn atomic_box_sets_line_height() {
        let items = [InlineItem::Atomic {
            width: 50.0,
            height: 80.0,
        }];
        let result = lines(&items, 500.0);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].height, 80.0);
    }

    #[test]
    fn nowrap_keeps_one_line() {
        let mode = WrapMode {
            preserve_whitespace: false,
            wrap: false,
        };
        let result = TextLayout::new().break_into_lines(
            &FontContext::new(),
            &[span("many words that would otherwise wrap", 10.0)],
            20.0,
            12.0,
            mode,
        );
        assert_eq!(result.len(), 1);
    }
}
