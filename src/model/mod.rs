//! # Document Model
//!
//! Blocks are the unit of content flow: typed, self-contained pieces of
//! markup with a style snapshot attached. Pages are what the pagination
//! engine produces from them.
//!
//! A block's attached data depends on what kind of block it is, so the
//! payload is a tagged union ([`BlockContent`]) rather than a bag of
//! optional fields. Matching on it is exhaustive over the block kinds.

use crate::dom::Element;
use crate::style::{FontStyle, TextAlign};
use serde::{Deserialize, Serialize};

/// A4 at 96 DPI.
pub const A4_WIDTH_PX: f64 = 794.0;
pub const A4_HEIGHT_PX: f64 = 1123.0;

/// Printable area of an A4 page at 96 DPI, after margins.
pub const PAGE_CONTENT_WIDTH: f64 = 680.0;
pub const PAGE_CONTENT_HEIGHT: f64 = 952.0;

/// Page geometry in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageConfig {
    #[serde(default = "default_page_width")]
    pub page_width: f64,
    #[serde(default = "default_page_height")]
    pub page_height: f64,
    #[serde(default = "default_content_width")]
    pub content_width: f64,
    #[serde(default = "default_content_height")]
    pub content_height: f64,
}

fn default_page_width() -> f64 {
    A4_WIDTH_PX
}

fn default_page_height() -> f64 {
    A4_HEIGHT_PX
}

fn default_content_width() -> f64 {
    PAGE_CONTENT_WIDTH
}

fn default_content_height() -> f64 {
    PAGE_CONTENT_HEIGHT
}

impl Default for PageConfig {
    fn default() -> Self {
        Self::a4()
    }
}

impl PageConfig {
    pub fn a4() -> Self {
        Self {
            page_width: A4_WIDTH_PX,
            page_height: A4_HEIGHT_PX,
            content_width: PAGE_CONTENT_WIDTH,
            content_height: PAGE_CONTENT_HEIGHT,
        }
    }

    /// Margins that centre the content area on the page.
    pub fn margin(&self) -> Edges {
        let horizontal = ((self.page_width - self.content_width) / 2.0).max(0.0);
        let vertical = ((self.page_height - self.content_height) / 2.0).max(0.0);
        Edges::symmetric(vertical, horizontal)
    }
}

/// Edge values (top, right, bottom, left) used for margin, padding and
/// border widths, in pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Edges {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Edges {
    pub fn uniform(v: f64) -> Self {
        Self {
            top: v,
            right: v,
            bottom: v,
            left: v,
        }
    }

    pub fn symmetric(vertical: f64, horizontal: f64) -> Self {
        Self {
            top: vertical,
            right: horizontal,
            bottom: vertical,
            left: horizontal,
        }
    }

    pub fn horizontal(&self) -> f64 {
        self.left + self.right
    }

    pub fn vertical(&self) -> f64 {
        self.top + self.bottom
    }
}

/// Sequential block identifier. Split fragments keep their block's id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockId(pub usize);

/// Discriminant of a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BlockKind {
    Heading,
    Paragraph,
    List,
    ListItem,
    Image,
    Table,
}

impl BlockKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockKind::Heading => "heading",
            BlockKind::Paragraph => "paragraph",
            BlockKind::List => "list",
            BlockKind::ListItem => "list-item",
            BlockKind::Image => "image",
            BlockKind::Table => "table",
        }
    }
}

/// Normalised style snapshot of a rendered element. Lengths in pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutModel {
    pub font_size: f64,
    pub line_height: f64,
    pub font_family: String,
    pub font_weight: u32,
    pub font_style: FontStyle,
    pub text_align: TextAlign,
    pub margin: Edges,
    pub padding: Edges,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
}

/// A run of text sharing one accumulated style.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineRun {
    pub text: String,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub highlight: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageMeta {
    pub src: String,
    /// Declared or intrinsic width; 0 when unknown at parse time.
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListItemMeta {
    pub layout: LayoutModel,
    pub inline: Vec<InlineRun>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableCellMeta {
    pub is_header: bool,
    pub col_span: u32,
    pub layout: LayoutModel,
    pub inline: Vec<InlineRun>,
    pub border_width: Edges,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub border_color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableRowMeta {
    pub is_header: bool,
    pub cells: Vec<TableCellMeta>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableMeta {
    pub rows: Vec<TableRowMeta>,
}

impl TableMeta {
    pub fn column_count(&self) -> usize {
        self.rows
            .iter()
            .map(|r| r.cells.iter().map(|c| c.col_span.max(1) as usize).sum())
            .max()
            .unwrap_or(0)
    }
}

/// Per-kind payload of a block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum BlockContent {
    Heading {
        level: u8,
        inline: Vec<InlineRun>,
    },
    Paragraph {
        inline: Vec<InlineRun>,
    },
    List {
        ordered: bool,
        items: Vec<ListItemMeta>,
    },
    ListItem {
        ordered: bool,
        /// 1-based position within its list.
        number: usize,
        inline: Vec<InlineRun>,
    },
    Image(ImageMeta),
    Table(TableMeta),
}

impl BlockContent {
    pub fn kind(&self) -> BlockKind {
        match self {
            BlockContent::Heading { .. } => BlockKind::Heading,
            BlockContent::Paragraph { .. } => BlockKind::Paragraph,
            BlockContent::List { .. } => BlockKind::List,
            BlockContent::ListItem { .. } => BlockKind::ListItem,
            BlockContent::Image(_) => BlockKind::Image,
            BlockContent::Table(_) => BlockKind::Table,
        }
    }

    /// Inline runs for text-bearing single-run-list kinds.
    pub fn inline(&self) -> Option<&[InlineRun]> {
        match self {
            BlockContent::Heading { inline, .. }
            | BlockContent::Paragraph { inline }
            | BlockContent::ListItem { inline, .. } => Some(inline),
            _ => None,
        }
    }
}

/// The atomic unit of content flow.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Block {
    pub id: BlockId,
    /// Self-contained markup for this block only.
    pub html: String,
    pub layout: LayoutModel,
    pub content: BlockContent,
    #[serde(skip)]
    element: Element,
}

impl Block {
    pub fn new(id: BlockId, element: Element, layout: LayoutModel, content: BlockContent) -> Self {
        Self {
            id,
            html: element.to_html(),
            layout,
            content,
            element,
        }
    }

    pub fn kind(&self) -> BlockKind {
        self.content.kind()
    }

    /// The parsed element the `html` was serialized from.
    pub fn element(&self) -> &Element {
        &self.element
    }

    pub fn is_heading(&self) -> bool {
        self.kind() == BlockKind::Heading
    }

    pub fn is_image(&self) -> bool {
        self.kind() == BlockKind::Image
    }
}

/// How a page entry relates to its block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Fragment {
    /// The whole block.
    Whole,
    /// First part of a split block.
    Head,
    /// Neither first nor last part of a block split over three or more pages.
    Middle,
    /// Last part of a split block.
    Tail,
    /// Stand-in for content that could not be rendered (a broken image).
    Placeholder,
}

/// One block (or fragment) placed on a page.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageEntry {
    pub block_id: BlockId,
    pub kind: BlockKind,
    pub fragment: Fragment,
    pub html: String,
    /// Measured height in pixels.
    pub height: f64,
    /// Presentation hint: this list continues a same-kind list from the
    /// previous page.
    pub continuation: bool,
}

/// Logical page: the block-to-page assignment without a live DOM.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageLayout {
    pub page_index: usize,
    pub entries: Vec<PageEntry>,
}

impl PageLayout {
    pub fn new(page_index: usize) -> Self {
        Self {
            page_index,
            entries: Vec::new(),
        }
    }

    pub fn used_height(&self) -> f64 {
        self.entries.iter().map(|e| e.height).sum()
    }

    /// Check if this page holds any part of a given block.
    pub fn contains_block(&self, id: BlockId) -> bool {
        self.entries.iter().any(|e| e.block_id == id)
    }
}

/// Materialised page: a `div.page-content` container holding the placed
/// markup, ready for preview.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DomPage {
    pub page_index: usize,
    pub content: Element,
}

impl DomPage {
    /// No element children and no non-whitespace text.
    pub fn is_empty(&self) -> bool {
        self.content.child_elements().next().is_none() && self.content.text_content().trim().is_empty()
    }

    pub fn to_html(&self) -> String {
        self.content.to_html()
    }
}

/// Output of a pagination run. Both vectors describe the same assignment.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationResult {
    pub pages: Vec<PageLayout>,
    pub dom_pages: Vec<DomPage>,
}

impl PaginationResult {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Indices of the pages holding any part of `id`.
    pub fn pages_of(&self, id: BlockId) -> Vec<usize> {
        self.pages
            .iter()
            .filter(|p| p.contains_block(id))
            .map(|p| p.page_index)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: usize, height: f64) -> PageEntry {
        PageEntry {
            block_id: BlockId(id),
            kind: BlockKind::Paragraph,
            fragment: Fragment::Whole,
            html: "<p>x</p>".to_string(),
            height,
            continuation: false,
        }
    }

    #[test]
    fn a4_margins_centre_content() {
        let margin = PageConfig::a4().margin();
        assert_eq!(margin.left, 57.0);
        assert_eq!(margin.top, 85.5);
    }

    #[test]
    fn page_layout_tracks_blocks() {
        let page = PageLayout {
            page_index: 0,
            entries: vec![entry(0, 100.0), entry(2, 50.5)],
        };
        assert_eq!(page.used_height(), 150.5);
        assert!(page.contains_block(BlockId(2)));
        assert!(!page.contains_block(BlockId(1)));
    }

    #[test]
    fn block_kind_names() {
        assert_eq!(BlockKind::ListItem.as_str(), "list-item");
        let json = serde_json::to_string(&BlockKind::ListItem).unwrap();
        assert_eq!(json, "\"list-item\"");
    }

    #[test]
    fn empty_dom_page_detection() {
        let blank = DomPage {
            page_index: 0,
            content: Element::new("div").with_children(vec![crate::dom::Node::text("  \n")]),
        };
        assert!(blank.is_empty());
    }
}
