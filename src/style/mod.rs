//! # Style System
//!
//! A CSS subset covering what rich-text notes actually use: typography,
//! box model, colours, display type. Declarations from the user-agent
//! defaults, the base stylesheet and inline `style` attributes are cascaded
//! into a [`Style`] (everything optional), which is then resolved against the
//! parent into a [`ResolvedStyle`] with concrete pixel values.
//!
//! We don't try to implement all of CSS. The fixed style vocabulary the
//! editor and the base stylesheet produce is what must paginate correctly.

pub mod css;

pub use css::{parse_declarations, Stylesheet, StyleResolver};

use crate::model::Edges;
use serde::{Deserialize, Serialize};

/// Root font size used for `rem` units and the initial style.
pub const ROOT_FONT_SIZE: f64 = 16.0;

/// Multiplier used for `line-height: normal` and unparseable line heights.
pub const NORMAL_LINE_HEIGHT: f64 = 1.2;

const PT_TO_PX: f64 = 96.0 / 72.0;

/// Declared (cascaded, unresolved) style of one element.
#[derive(Debug, Clone, Default)]
pub struct Style {
    // ── Box Model ──────────────────────────────────────────────
    pub display: Option<Display>,
    pub width: Option<Dimension>,
    pub height: Option<Dimension>,
    pub max_width: Option<Dimension>,
    pub margin: EdgeValues<Option<Dimension>>,
    pub padding: EdgeValues<Option<Dimension>>,
    pub border_width: EdgeValues<Option<Dimension>>,
    pub border_color: Option<String>,

    // ── Typography ─────────────────────────────────────────────
    pub font_family: Option<String>,
    pub font_size: Option<Dimension>,
    pub font_weight: Option<u32>,
    pub font_style: Option<FontStyle>,
    pub line_height: Option<LineHeight>,
    pub text_align: Option<TextAlign>,
    pub text_decoration: Option<TextDecoration>,
    pub white_space: Option<WhiteSpace>,

    // ── Color & Background ─────────────────────────────────────
    pub color: Option<String>,
    pub background_color: Option<String>,
}

/// A length as written in CSS.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Dimension {
    Px(f64),
    Em(f64),
    Rem(f64),
    Percent(f64),
    Auto,
}

impl Dimension {
    /// Resolve to pixels. `em` is relative to `font_size`, `%` to
    /// `percent_base`. Returns None for Auto.
    pub fn resolve(&self, font_size: f64, percent_base: f64) -> Option<f64> {
        match self {
            Dimension::Px(v) => Some(*v),
            Dimension::Em(v) => Some(v * font_size),
            Dimension::Rem(v) => Some(v * ROOT_FONT_SIZE),
            Dimension::Percent(p) => Some(percent_base * p / 100.0),
            Dimension::Auto => None,
        }
    }
}

/// `line-height` keeps its declared form so multipliers inherit as
/// multipliers, the way CSS specifies.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum LineHeight {
    Normal,
    Multiplier(f64),
    Px(f64),
}

impl Default for LineHeight {
    fn default() -> Self {
        LineHeight::Normal
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Display {
    Block,
    #[default]
    Inline,
    ListItem,
    Table,
    TableRowGroup,
    TableRow,
    TableCell,
    None,
}

impl Display {
    pub fn is_block_level(&self) -> bool {
        !matches!(self, Display::Inline | Display::None)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontStyle {
    #[default]
    Normal,
    Italic,
    Oblique,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    #[default]
    Left,
    Right,
    Center,
    Justify,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TextDecoration {
    #[default]
    None,
    Underline,
    LineThrough,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WhiteSpace {
    #[default]
    Normal,
    Pre,
    PreWrap,
    NoWrap,
}

impl WhiteSpace {
    pub fn preserves_newlines(&self) -> bool {
        matches!(self, WhiteSpace::Pre | WhiteSpace::PreWrap)
    }
}

/// Values for each edge (top, right, bottom, left).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EdgeValues<T: Copy> {
    pub top: T,
    pub right: T,
    pub bottom: T,
    pub left: T,
}

impl<T: Copy> EdgeValues<T> {
    pub fn uniform(v: T) -> Self {
        Self {
            top: v,
            right: v,
            bottom: v,
            left: v,
        }
    }

    /// Expand the 1–4 value CSS shorthand order.
    fn from_shorthand(values: &[T]) -> Option<Self> {
        let (top, right, bottom, left) = match values {
            [a] => (*a, *a, *a, *a),
            [a, b] => (*a, *b, *a, *b),
            [a, b, c] => (*a, *b, *c, *b),
            [a, b, c, d] => (*a, *b, *c, *d),
            _ => return None,
        };
        Some(Self {
            top,
            right,
            bottom,
            left,
        })
    }
}

fn resolve_edges(edges: &EdgeValues<Option<Dimension>>, font_size: f64, base: f64) -> Edges {
    let side = |d: Option<Dimension>| d.and_then(|d| d.resolve(font_size, base)).unwrap_or(0.0);
    Edges {
        top: side(edges.top),
        right: side(edges.right),
        bottom: side(edges.bottom),
        left: side(edges.left),
    }
}

/// Resolved style: concrete pixel values, inherited properties filled in.
/// This is what measurement and the layout extractor work with.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedStyle {
    pub display: Display,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub max_width: Option<f64>,
    pub margin: Edges,
    pub padding: Edges,
    pub border_width: Edges,
    pub border_color: Option<String>,

    pub font_family: String,
    pub font_size: f64,
    pub font_weight: u32,
    pub font_style: FontStyle,
    pub line_height: LineHeight,
    pub text_align: TextAlign,
    pub text_decoration: TextDecoration,
    pub white_space: WhiteSpace,

    /// Colours are passed through exactly as declared.
    pub color: Option<String>,
    pub background_color: Option<String>,
}

impl ResolvedStyle {
    /// The initial style of the page content container.
    pub fn root() -> Self {
        Self {
            display: Display::Block,
            width: None,
            height: None,
            max_width: None,
            margin: Edges::default(),
            padding: Edges::default(),
            border_width: Edges::default(),
            border_color: None,
            font_family: "Helvetica".to_string(),
            font_size: ROOT_FONT_SIZE,
            font_weight: 400,
            font_style: FontStyle::Normal,
            line_height: LineHeight::Normal,
            text_align: TextAlign::Left,
            text_decoration: TextDecoration::None,
            white_space: WhiteSpace::Normal,
            color: None,
            background_color: None,
        }
    }

    /// Used line height in pixels.
    pub fn line_height_px(&self) -> f64 {
        match self.line_height {
            LineHeight::Normal => NORMAL_LINE_HEIGHT * self.font_size,
            LineHeight::Multiplier(m) => m * self.font_size,
            LineHeight::Px(px) => px,
        }
    }

    pub fn is_bold(&self) -> bool {
        self.font_weight >= 600
    }

    pub fn is_italic(&self) -> bool {
        matches!(self.font_style, FontStyle::Italic | FontStyle::Oblique)
    }
}

impl Style {
    /// Apply one declaration. Unknown properties and unparseable values are
    /// ignored, like a browser would.
    pub fn apply(&mut self, name: &str, value: &str) {
        let value = value.trim().trim_end_matches("!important").trim();
        match name {
            "display" => self.display = parse_display(value).or(self.display),
            "width" => self.width = parse_dimension(value).or(self.width),
            "height" => self.height = parse_dimension(value).or(self.height),
            "max-width" => self.max_width = parse_dimension(value).or(self.max_width),

            "margin" => apply_edge_shorthand(&mut self.margin, value),
            "margin-top" => self.margin.top = parse_dimension(value).or(self.margin.top),
            "margin-right" => self.margin.right = parse_dimension(value).or(self.margin.right),
            "margin-bottom" => self.margin.bottom = parse_dimension(value).or(self.margin.bottom),
            "margin-left" => self.margin.left = parse_dimension(value).or(self.margin.left),

            "padding" => apply_edge_shorthand(&mut self.padding, value),
            "padding-top" => self.padding.top = parse_dimension(value).or(self.padding.top),
            "padding-right" => self.padding.right = parse_dimension(value).or(self.padding.right),
            "padding-bottom" => {
                self.padding.bottom = parse_dimension(value).or(self.padding.bottom)
            }
            "padding-left" => self.padding.left = parse_dimension(value).or(self.padding.left),

            "border" => {
                let (width, color) = parse_border(value);
                self.border_width = EdgeValues::uniform(Some(width));
                if color.is_some() {
                    self.border_color = color;
                }
            }
            "border-top" | "border-right" | "border-bottom" | "border-left" => {
                let (width, color) = parse_border(value);
                match name {
                    "border-top" => self.border_width.top = Some(width),
                    "border-right" => self.border_width.right = Some(width),
                    "border-bottom" => self.border_width.bottom = Some(width),
                    _ => self.border_width.left = Some(width),
                }
                if color.is_some() {
                    self.border_color = color;
                }
            }
            "border-width" => apply_edge_shorthand(&mut self.border_width, value),
            "border-color" => self.border_color = Some(value.to_string()),

            "font-family" => self.font_family = parse_font_family(value).or(self.font_family.take()),
            "font-size" => self.font_size = parse_font_size(value).or(self.font_size),
            "font-weight" => self.font_weight = parse_font_weight(value).or(self.font_weight),
            "font-style" => {
                self.font_style = match value {
                    "italic" => Some(FontStyle::Italic),
                    "oblique" => Some(FontStyle::Oblique),
                    "normal" => Some(FontStyle::Normal),
                    _ => self.font_style,
                }
            }
            "line-height" => self.line_height = Some(parse_line_height(value)),
            "text-align" => {
                self.text_align = match value {
                    "left" | "start" => Some(TextAlign::Left),
                    "right" | "end" => Some(TextAlign::Right),
                    "center" => Some(TextAlign::Center),
                    "justify" => Some(TextAlign::Justify),
                    _ => self.text_align,
                }
            }
            "text-decoration" | "text-decoration-line" => {
                self.text_decoration = Some(if value.contains("underline") {
                    TextDecoration::Underline
                } else if value.contains("line-through") {
                    TextDecoration::LineThrough
                } else {
                    TextDecoration::None
                })
            }
            "white-space" => {
                self.white_space = match value {
                    "pre" => Some(WhiteSpace::Pre),
                    "pre-wrap" | "pre-line" | "break-spaces" => Some(WhiteSpace::PreWrap),
                    "nowrap" => Some(WhiteSpace::NoWrap),
                    "normal" => Some(WhiteSpace::Normal),
                    _ => self.white_space,
                }
            }
            "color" => self.color = Some(value.to_string()),
            "background-color" => self.background_color = Some(value.to_string()),
            "background" => {
                if let Some(color) = value.split_whitespace().find(|t| looks_like_color(t)) {
                    self.background_color = Some(color.to_string());
                }
            }
            _ => {}
        }
    }

    /// Resolve this style against a parent's resolved style and the width
    /// of the containing block.
    pub fn resolve(&self, parent: Option<&ResolvedStyle>, available_width: f64) -> ResolvedStyle {
        let root = ResolvedStyle::root();
        let parent = parent.unwrap_or(&root);

        let font_size = match self.font_size {
            // em and % on font-size are relative to the parent font size.
            Some(d) => d
                .resolve(parent.font_size, parent.font_size)
                .unwrap_or(parent.font_size),
            None => parent.font_size,
        };

        let line_height = self.line_height.unwrap_or(parent.line_height);

        ResolvedStyle {
            display: self.display.unwrap_or_default(),
            width: self.width.and_then(|d| d.resolve(font_size, available_width)),
            height: self.height.and_then(|d| d.resolve(font_size, 0.0)),
            max_width: self.max_width.and_then(|d| d.resolve(font_size, available_width)),
            margin: resolve_edges(&self.margin, font_size, available_width),
            padding: resolve_edges(&self.padding, font_size, available_width),
            border_width: resolve_edges(&self.border_width, font_size, available_width),
            border_color: self.border_color.clone(),

            font_family: self
                .font_family
                .clone()
                .unwrap_or_else(|| parent.font_family.clone()),
            font_size,
            font_weight: self.font_weight.unwrap_or(parent.font_weight),
            font_style: self.font_style.unwrap_or(parent.font_style),
            line_height,
            text_align: self.text_align.unwrap_or(parent.text_align),
            text_decoration: self.text_decoration.unwrap_or_default(),
            white_space: self.white_space.unwrap_or(parent.white_space),

            color: self.color.clone().or_else(|| parent.color.clone()),
            background_color: self.background_color.clone(),
        }
    }
}

fn apply_edge_shorthand(edges: &mut EdgeValues<Option<Dimension>>, value: &str) {
    let parts: Vec<Option<Dimension>> = value.split_whitespace().map(parse_dimension).collect();
    if parts.iter().any(Option::is_none) {
        return;
    }
    if let Some(expanded) = EdgeValues::from_shorthand(&parts) {
        *edges = expanded;
    }
}

/// Parse a CSS length. Bare `0` is accepted; other unitless numbers are not.
pub fn parse_dimension(value: &str) -> Option<Dimension> {
    let v = value.trim().to_ascii_lowercase();
    if v == "auto" {
        return Some(Dimension::Auto);
    }
    let number = |suffix: &str| v.strip_suffix(suffix).and_then(|n| n.trim().parse::<f64>().ok());
    if let Some(n) = number("px") {
        Some(Dimension::Px(n))
    } else if let Some(n) = number("pt") {
        Some(Dimension::Px(n * PT_TO_PX))
    } else if let Some(n) = number("rem") {
        Some(Dimension::Rem(n))
    } else if let Some(n) = number("em") {
        Some(Dimension::Em(n))
    } else if let Some(n) = number("%") {
        Some(Dimension::Percent(n))
    } else if let Some(n) = number("cm") {
        Some(Dimension::Px(n * 96.0 / 2.54))
    } else if let Some(n) = number("mm") {
        Some(Dimension::Px(n * 96.0 / 25.4))
    } else if let Some(n) = number("in") {
        Some(Dimension::Px(n * 96.0))
    } else if v.parse::<f64>().ok() == Some(0.0) {
        Some(Dimension::Px(0.0))
    } else {
        None
    }
}

fn parse_font_size(value: &str) -> Option<Dimension> {
    let keyword = match value {
        "xx-small" => Some(9.0),
        "x-small" => Some(10.0),
        "small" => Some(13.0),
        "medium" => Some(16.0),
        "large" => Some(18.0),
        "x-large" => Some(24.0),
        "xx-large" => Some(32.0),
        _ => None,
    };
    match keyword {
        Some(px) => Some(Dimension::Px(px)),
        None => match parse_dimension(value) {
            Some(Dimension::Auto) => None,
            other => other,
        },
    }
}

fn parse_font_weight(value: &str) -> Option<u32> {
    match value {
        "normal" | "lighter" => Some(400),
        "bold" | "bolder" => Some(700),
        other => other.parse::<u32>().ok().map(|w| w.clamp(100, 900)),
    }
}

/// Non-pixel, non-multiplier values fall back to the `normal` multiplier.
pub fn parse_line_height(value: &str) -> LineHeight {
    let v = value.trim();
    if v == "normal" {
        return LineHeight::Normal;
    }
    if let Ok(multiplier) = v.parse::<f64>() {
        return LineHeight::Multiplier(multiplier);
    }
    match parse_dimension(v) {
        Some(Dimension::Px(px)) => LineHeight::Px(px),
        Some(Dimension::Em(em)) => LineHeight::Multiplier(em),
        Some(Dimension::Percent(p)) => LineHeight::Multiplier(p / 100.0),
        Some(Dimension::Rem(r)) => LineHeight::Px(r * ROOT_FONT_SIZE),
        _ => LineHeight::Multiplier(NORMAL_LINE_HEIGHT),
    }
}

fn parse_display(value: &str) -> Option<Display> {
    match value {
        "block" | "flex" | "grid" | "flow-root" => Some(Display::Block),
        "inline" | "inline-block" | "inline-flex" => Some(Display::Inline),
        "list-item" => Some(Display::ListItem),
        "table" => Some(Display::Table),
        "table-row-group" | "table-header-group" | "table-footer-group" => {
            Some(Display::TableRowGroup)
        }
        "table-row" => Some(Display::TableRow),
        "table-cell" => Some(Display::TableCell),
        "none" => Some(Display::None),
        _ => None,
    }
}

fn parse_font_family(value: &str) -> Option<String> {
    value
        .split(',')
        .map(|f| f.trim().trim_matches('"').trim_matches('\'').trim())
        .find(|f| !f.is_empty())
        .map(str::to_string)
}

/// `border: 1px solid #ccc` → width and colour. `none` resets the width.
fn parse_border(value: &str) -> (Dimension, Option<String>) {
    let mut width = Dimension::Px(0.0);
    let mut color = None;
    let mut has_style = false;
    for token in value.split_whitespace() {
        match token {
            "none" | "hidden" => return (Dimension::Px(0.0), None),
            "solid" | "dashed" | "dotted" | "double" | "groove" | "ridge" | "inset" | "outset" => {
                has_style = true
            }
            "thin" => width = Dimension::Px(1.0),
            "medium" => width = Dimension::Px(3.0),
            "thick" => width = Dimension::Px(5.0),
            t => {
                if let Some(d) = parse_dimension(t) {
                    width = d;
                } else if looks_like_color(t) {
                    color = Some(t.to_string());
                }
            }
        }
    }
    if has_style && width == Dimension::Px(0.0) && !value.contains('0') {
        width = Dimension::Px(3.0);
    }
    (width, color)
}

fn looks_like_color(token: &str) -> bool {
    token.starts_with('#')
        || token.starts_with("rgb")
        || token.starts_with("hsl")
        || named_color_hex(token).is_some()
}

/// Normalise a CSS colour to `RRGGBB` (uppercase, no `#`). Transparent and
/// unrecognised values return None.
pub fn css_color_to_hex(value: &str) -> Option<String> {
    let v = value.trim().to_ascii_lowercase();
    if let Some(hex) = v.strip_prefix('#') {
        let full = match hex.len() {
            3 | 4 => hex.chars().take(3).flat_map(|c| [c, c]).collect::<String>(),
            6 | 8 => hex[..6].to_string(),
            _ => return None,
        };
        if full.chars().all(|c| c.is_ascii_hexdigit()) {
            return Some(full.to_ascii_uppercase());
        }
        return None;
    }
    if let Some(args) = v
        .strip_prefix("rgba(")
        .or_else(|| v.strip_prefix("rgb("))
        .and_then(|rest| rest.strip_suffix(')'))
    {
        let parts: Vec<&str> = args
            .split(|c: char| c == ',' || c == '/' || c.is_whitespace())
            .filter(|p| !p.is_empty())
            .collect();
        if parts.len() < 3 {
            return None;
        }
        if let Some(alpha) = parts.get(3).and_then(|a| a.parse::<f64>().ok()) {
            if alpha == 0.0 {
                return None;
            }
        }
        let channel = |p: &str| -> Option<u8> {
            if let Some(pct) = p.strip_suffix('%') {
                pct.parse::<f64>()
                    .ok()
                    .map(|x| (x.clamp(0.0, 100.0) * 2.55).round() as u8)
            } else {
                p.parse::<f64>().ok().map(|x| x.clamp(0.0, 255.0).round() as u8)
            }
        };
        let (r, g, b) = (channel(parts[0])?, channel(parts[1])?, channel(parts[2])?);
        return Some(format!("{:02X}{:02X}{:02X}", r, g, b));
    }
    named_color_hex(&v).map(str::to_string)
}

fn named_color_hex(name: &str) -> Option<&'static str> {
    let hex = match name {
        "black" => "000000",
        "white" => "FFFFFF",
        "red" => "FF0000",
        "green" => "008000",
        "blue" => "0000FF",
        "yellow" => "FFFF00",
        "orange" => "FFA500",
        "purple" => "800080",
        "gray" | "grey" => "808080",
        "silver" => "C0C0C0",
        "maroon" => "800000",
        "navy" => "000080",
        "teal" => "008080",
        "olive" => "808000",
        "lime" => "00FF00",
        "aqua" | "cyan" => "00FFFF",
        "fuchsia" | "magenta" => "FF00FF",
        "pink" => "FFC0CB",
        "brown" => "A52A2A",
        _ => return None,
    };
    Some(hex)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn style_of(decls: &[(&str, &str)]) -> Style {
        let mut style = Style::default();
        for (k, v) in decls {
            style.apply(k, v);
        }
        style
    }

    #[test]
    fn em_font_size_is_relative_to_parent() {
        let parent = ResolvedStyle::root();
        let resolved = style_of(&[("font-size", "2em")]).resolve(Some(&parent), 680.0);
        assert_eq!(resolved.font_size, 32.0);
    }

    #[test]
    fn margin_shorthand_expands_two_values() {
        let resolved = style_of(&[("margin", "10px 20px")]).resolve(None, 680.0);
        assert_eq!(resolved.margin.top, 10.0);
        assert_eq!(resolved.margin.right, 20.0);
        assert_eq!(resolved.margin.bottom, 10.0);
        assert_eq!(resolved.margin.left, 20.0);
    }

    #[test]
    fn unparseable_lengths_resolve_to_zero() {
        let resolved = style_of(&[("padding-top", "calc(1px + 2px)")]).resolve(None, 680.0);
        assert_eq!(resolved.padding.top, 0.0);
    }

    #[test]
    fn line_height_falls_back_to_normal_multiplier() {
        assert_eq!(parse_line_height("inherit-ish"), LineHeight::Multiplier(1.2));
        assert_eq!(parse_line_height("1.5"), LineHeight::Multiplier(1.5));
        assert_eq!(parse_line_height("24px"), LineHeight::Px(24.0));
        let resolved = style_of(&[("font-size", "20px")]).resolve(None, 680.0);
        assert!((resolved.line_height_px() - 24.0).abs() < 1e-9);
    }

    #[test]
    fn multiplier_line_height_inherits_as_multiplier() {
        let parent = style_of(&[("line-height", "1.5")]).resolve(None, 680.0);
        let child = style_of(&[("font-size", "20px")]).resolve(Some(&parent), 680.0);
        assert_eq!(child.line_height_px(), 30.0);
    }

    #[test]
    fn colors_pass_through_and_inherit() {
        let parent = style_of(&[("color", "rgb(10, 20, 30)")]).resolve(None, 680.0);
        let child = Style::default().resolve(Some(&parent), 680.0);
        assert_eq!(child.color.as_deref(), Some("rgb(10, 20, 30)"));
        assert_eq!(child.background_color, None);
    }

    #[test]
    fn percent_width_uses_containing_block() {
        let resolved = style_of(&[("width", "50%")]).resolve(None, 600.0);
        assert_eq!(resolved.width, Some(300.0));
    }

    #[test]
    fn border_shorthand() {
        let resolved = style_of(&[("border", "2px solid #333")]).resolve(None, 680.0);
        assert_eq!(resolved.border_width.left, 2.0);
        assert_eq!(resolved.border_color.as_deref(), Some("#333"));
    }

    #[test]
    fn color_normalisation() {
        assert_eq!(css_color_to_hex("#abc").as_deref(), Some("AABBCC"));
        assert_eq!(css_color_to_hex("rgb(255, 0, 16)").as_deref(), Some("FF0010"));
        assert_eq!(css_color_to_hex("rgba(0, 0, 0, 0)"), None);
        assert_eq!(css_color_to_hex("Navy").as_deref(), Some("000080"));
        assert_eq!(css_color_to_hex("currentColor"), None);
    }

    #[test]
    fn font_weight_keywords() {
        let bold = style_of(&[("font-weight", "bold")]).resolve(None, 680.0);
        assert!(bold.is_bold());
        let semi = style_of(&[("font-weight", "600")]).resolve(None, 680.0);
        assert!(semi.is_bold());
        let normal = style_of(&[("font-weight", "500")]).resolve(None, 680.0);
        assert!(!normal.is_bold());
    }
}
