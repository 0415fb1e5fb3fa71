//! WordprocessingML body built from whole-list blocks.
//!
//! Blocks map one-to-one onto body elements: headings and paragraphs onto
//! `w:p`, lists onto one `w:p` per item with a text marker and a left
//! indent, tables onto `w:tbl` with per-cell borders and margins, and
//! images onto inline drawings scaled to the content width.

use super::units::{eighth_points, emu, half_points, twips};
use super::XmlOut;
use crate::error::Result;
use crate::model::{
    Block, BlockContent, Edges, ImageMeta, InlineRun, LayoutModel, PageConfig, TableMeta,
};
use crate::style::{css_color_to_hex, TextAlign};

const W_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
const R_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const WP_NS: &str = "http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing";
const A_NS: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
const PIC_NS: &str = "http://schemas.openxmlformats.org/drawingml/2006/picture";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocxRun {
    pub text: String,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    /// Half-points.
    pub size: Option<u32>,
    /// `RRGGBB`.
    pub color: Option<String>,
    /// `RRGGBB` background shading.
    pub shading: Option<String>,
    pub font: Option<String>,
}

impl DocxRun {
    fn from_inline(run: &InlineRun) -> Self {
        Self {
            text: run.text.clone(),
            bold: run.bold,
            italic: run.italic,
            underline: run.underline,
            size: run.font_size.map(half_points),
            color: run.color.as_deref().and_then(css_color_to_hex),
            shading: run.highlight.as_deref().and_then(css_color_to_hex),
            font: run.font_family.as_deref().map(primary_family),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocxParagraph {
    /// Paragraph style id, e.g. `Heading1`.
    pub style: Option<String>,
    pub align: Option<&'static str>,
    /// Twips.
    pub space_before: i64,
    pub space_after: i64,
    pub indent_left: i64,
    /// Line spacing in 240ths of a line.
    pub line: Option<i64>,
    /// Marker text in front of list items.
    pub marker: Option<String>,
    pub runs: Vec<DocxRun>,
}

impl DocxParagraph {
    fn from_layout(layout: &LayoutModel, inline: &[InlineRun]) -> Self {
        Self {
            style: None,
            align: match layout.text_align {
                TextAlign::Left => None,
                TextAlign::Center => Some("center"),
                TextAlign::Right => Some("right"),
                TextAlign::Justify => Some("both"),
            },
            space_before: twips(layout.margin.top),
            space_after: twips(layout.margin.bottom),
            indent_left: twips(layout.margin.left + layout.padding.left),
            line: (layout.font_size > 0.0)
                .then(|| (layout.line_height / layout.font_size * 240.0).round() as i64),
            marker: None,
            runs: inline.iter().map(DocxRun::from_inline).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DocxCell {
    pub grid_span: u32,
    /// Twips.
    pub width: i64,
    pub header: bool,
    /// Eighths of a point, top/right/bottom/left.
    pub borders: [u32; 4],
    pub border_color: Option<String>,
    /// Twips, top/right/bottom/left.
    pub margins: [i64; 4],
    pub paragraph: DocxParagraph,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DocxRow {
    pub header: bool,
    pub cells: Vec<DocxCell>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DocxTable {
    /// Grid column width in twips.
    pub column_width: i64,
    pub columns: usize,
    pub rows: Vec<DocxRow>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DocxImage {
    pub id: usize,
    pub rel_id: String,
    pub src: String,
    /// EMU.
    pub cx: i64,
    pub cy: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DocxElement {
    Paragraph(DocxParagraph),
    Table(DocxTable),
    Image(DocxImage),
}

/// The `w:body` of a document plus the media it references.
#[derive(Debug, Clone, PartialEq)]
pub struct DocxBody {
    pub elements: Vec<DocxElement>,
    pub page: PageConfig,
}

impl DocxBody {
    pub fn from_blocks(blocks: &[Block], page: &PageConfig) -> Self {
        let mut body = DocxBody {
            elements: Vec::new(),
            page: *page,
        };
        for block in blocks {
            body.push_block(block);
        }
        body
    }

    /// Images in document order.
    pub fn media(&self) -> impl Iterator<Item = &DocxImage> {
        self.elements.iter().filter_map(|e| match e {
            DocxElement::Image(img) => Some(img),
            _ => None,
        })
    }

    fn push_block(&mut self, block: &Block) {
        match &block.content {
            BlockContent::Heading { level, inline } => {
                let mut p = DocxParagraph::from_layout(&block.layout, inline);
                p.style = Some(format!("Heading{}", level));
                self.elements.push(DocxElement::Paragraph(p));
            }
            BlockContent::Paragraph { inline } => {
                let p = DocxParagraph::from_layout(&block.layout, inline);
                self.elements.push(DocxElement::Paragraph(p));
            }
            BlockContent::List { ordered, items } => {
                let indent = block.layout.padding.left;
                let start = crate::parser::list_start(block.element());
                for (i, item) in items.iter().enumerate() {
                    let mut p = DocxParagraph::from_layout(&item.layout, &item.inline);
                    p.indent_left += twips(indent);
                    p.marker = Some(if *ordered {
                        format!("{}.", start + i)
                    } else {
                        "\u{2022}".to_string()
                    });
                    self.elements.push(DocxElement::Paragraph(p));
                }
            }
            BlockContent::ListItem {
                ordered,
                number,
                inline,
            } => {
                let mut p = DocxParagraph::from_layout(&block.layout, inline);
                p.marker = Some(if *ordered {
                    format!("{}.", number)
                } else {
                    "\u{2022}".to_string()
                });
                self.elements.push(DocxElement::Paragraph(p));
            }
            BlockContent::Image(meta) => self.push_image(meta),
            BlockContent::Table(meta) => {
                let table = self.table(meta);
                self.elements.push(DocxElement::Table(table));
            }
        }
    }

    fn push_image(&mut self, meta: &ImageMeta) {
        if meta.width <= 0.0 || meta.height <= 0.0 {
            log::warn!("skipping image '{}' with unknown size", meta.src);
            return;
        }
        let scale = (self.page.content_width / meta.width).min(1.0);
        let id = self.media().count() + 1;
        self.elements.push(DocxElement::Image(DocxImage {
            id,
            rel_id: format!("rIdImage{}", id),
            src: meta.src.clone(),
            cx: emu(meta.width * scale),
            cy: emu(meta.height * scale),
        }));
    }

    fn table(&self, meta: &TableMeta) -> DocxTable {
        let columns = meta.column_count().max(1);
        let column_width = twips(self.page.content_width / columns as f64);
        let rows = meta
            .rows
            .iter()
            .map(|row| DocxRow {
                header: row.is_header,
                cells: row
                    .cells
                    .iter()
                    .map(|cell| DocxCell {
                        grid_span: cell.col_span.max(1),
                        width: column_width * cell.col_span.max(1) as i64,
                        header: cell.is_header,
                        borders: edges_array(&cell.border_width).map(eighth_points),
                        border_color: cell.border_color.as_deref().and_then(css_color_to_hex),
                        margins: edges_array(&cell.layout.padding).map(twips),
                        paragraph: DocxParagraph {
                            space_before: 0,
                            space_after: 0,
                            indent_left: 0,
                            ..DocxParagraph::from_layout(&cell.layout, &cell.inline)
                        },
                    })
                    .collect(),
            })
            .collect();
        DocxTable {
            column_width,
            columns,
            rows,
        }
    }

    /// Serialize to `word/document.xml`.
    pub fn to_document_xml(&self) -> Result<String> {
        let mut out = XmlOut::new()?;
        out.start(
            "w:document",
            &[
                ("xmlns:w", W_NS),
                ("xmlns:r", R_NS),
                ("xmlns:wp", WP_NS),
                ("xmlns:a", A_NS),
                ("xmlns:pic", PIC_NS),
            ],
        )?;
        out.start("w:body", &[])?;
        for element in &self.elements {
            match element {
                DocxElement::Paragraph(p) => write_paragraph(&mut out, p)?,
                DocxElement::Table(t) => write_table(&mut out, t)?,
                DocxElement::Image(img) => write_image(&mut out, img)?,
            }
        }
        self.write_section(&mut out)?;
        out.end("w:body")?;
        out.end("w:document")?;
        out.finish()
    }

    fn write_section(&self, out: &mut XmlOut) -> Result<()> {
        let margin = self.page.margin();
        let (w, h) = (twips(self.page.page_width), twips(self.page.page_height));
        let (top, right) = (twips(margin.top), twips(margin.right));
        let (bottom, left) = (twips(margin.bottom), twips(margin.left));
        out.start("w:sectPr", &[])?;
        out.empty(
            "w:pgSz",
            &[("w:w", &w.to_string()), ("w:h", &h.to_string())],
        )?;
        out.empty(
            "w:pgMar",
            &[
                ("w:top", &top.to_string()),
                ("w:right", &right.to_string()),
                ("w:bottom", &bottom.to_string()),
                ("w:left", &left.to_string()),
                ("w:header", "0"),
                ("w:footer", "0"),
                ("w:gutter", "0"),
            ],
        )?;
        out.end("w:sectPr")
    }
}

fn edges_array(edges: &Edges) -> [f64; 4] {
    [edges.top, edges.right, edges.bottom, edges.left]
}

/// First family of a CSS font-family list, unquoted.
fn primary_family(family: &str) -> String {
    family
        .split(',')
        .next()
        .unwrap_or(family)
        .trim()
        .trim_matches(|c| c == '"' || c == '\'')
        .to_string()
}

fn write_paragraph(out: &mut XmlOut, p: &DocxParagraph) -> Result<()> {
    out.start("w:p", &[])?;
    out.start("w:pPr", &[])?;
    if let Some(style) = &p.style {
        out.empty("w:pStyle", &[("w:val", style)])?;
    }
    let (before, after) = (p.space_before.to_string(), p.space_after.to_string());
    match p.line {
        Some(line) => out.empty(
            "w:spacing",
            &[
                ("w:before", &before),
                ("w:after", &after),
                ("w:line", &line.to_string()),
                ("w:lineRule", "auto"),
            ],
        )?,
        None => out.empty("w:spacing", &[("w:before", &before), ("w:after", &after)])?,
    }
    if p.indent_left > 0 {
        out.empty("w:ind", &[("w:left", &p.indent_left.to_string())])?;
    }
    if let Some(align) = p.align {
        out.empty("w:jc", &[("w:val", align)])?;
    }
    out.end("w:pPr")?;

    if let Some(marker) = &p.marker {
        let base = p.runs.first().cloned().unwrap_or_default();
        write_run(
            out,
            &DocxRun {
                text: format!("{}\t", marker),
                ..base
            },
        )?;
    }
    for run in &p.runs {
        write_run(out, run)?;
    }
    out.end("w:p")
}

fn write_run(out: &mut XmlOut, run: &DocxRun) -> Result<()> {
    out.start("w:r", &[])?;
    out.start("w:rPr", &[])?;
    if let Some(font) = &run.font {
        out.empty("w:rFonts", &[("w:ascii", font), ("w:hAnsi", font), ("w:cs", font)])?;
    }
    if run.bold {
        out.empty("w:b", &[])?;
    }
    if run.italic {
        out.empty("w:i", &[])?;
    }
    if run.underline {
        out.empty("w:u", &[("w:val", "single")])?;
    }
    if let Some(color) = &run.color {
        out.empty("w:color", &[("w:val", color)])?;
    }
    if let Some(size) = run.size {
        out.empty("w:sz", &[("w:val", &size.to_string())])?;
    }
    if let Some(fill) = &run.shading {
        out.empty("w:shd", &[("w:val", "clear"), ("w:color", "auto"), ("w:fill", fill)])?;
    }
    out.end("w:rPr")?;
    out.text_element("w:t", &[("xml:space", "preserve")], &run.text)?;
    out.end("w:r")
}

fn write_table(out: &mut XmlOut, table: &DocxTable) -> Result<()> {
    let total = (table.column_width * table.columns as i64).to_string();
    let column = table.column_width.to_string();
    out.start("w:tbl", &[])?;
    out.start("w:tblPr", &[])?;
    out.empty("w:tblW", &[("w:w", &total), ("w:type", "dxa")])?;
    out.empty("w:tblLayout", &[("w:type", "fixed")])?;
    out.end("w:tblPr")?;
    out.start("w:tblGrid", &[])?;
    for _ in 0..table.columns {
        out.empty("w:gridCol", &[("w:w", &column)])?;
    }
    out.end("w:tblGrid")?;

    for row in &table.rows {
        out.start("w:tr", &[])?;
        if row.header {
            out.start("w:trPr", &[])?;
            out.empty("w:tblHeader", &[])?;
            out.end("w:trPr")?;
        }
        for cell in &row.cells {
            write_cell(out, cell)?;
        }
        out.end("w:tr")?;
    }
    out.end("w:tbl")
}

fn write_cell(out: &mut XmlOut, cell: &DocxCell) -> Result<()> {
    const SIDES: [&str; 4] = ["w:top", "w:right", "w:bottom", "w:left"];
    out.start("w:tc", &[])?;
    out.start("w:tcPr", &[])?;
    out.empty("w:tcW", &[("w:w", &cell.width.to_string()), ("w:type", "dxa")])?;
    if cell.grid_span > 1 {
        out.empty("w:gridSpan", &[("w:val", &cell.grid_span.to_string())])?;
    }
    let color = cell.border_color.as_deref().unwrap_or("auto");
    out.start("w:tcBorders", &[])?;
    for (side, size) in SIDES.iter().zip(cell.borders) {
        if size == 0 {
            out.empty(side, &[("w:val", "nil")])?;
        } else {
            out.empty(
                side,
                &[("w:val", "single"), ("w:sz", &size.to_string()), ("w:color", color)],
            )?;
        }
    }
    out.end("w:tcBorders")?;
    out.start("w:tcMar", &[])?;
    for (side, margin) in SIDES.iter().zip(cell.margins) {
        out.empty(side, &[("w:w", &margin.to_string()), ("w:type", "dxa")])?;
    }
    out.end("w:tcMar")?;
    out.end("w:tcPr")?;

    let mut paragraph = cell.paragraph.clone();
    if cell.header {
        for run in &mut paragraph.runs {
            run.bold = true;
        }
    }
    // A cell must hold at least one paragraph, which this always writes.
    write_paragraph(out, &paragraph)?;
    out.end("w:tc")
}

fn write_image(out: &mut XmlOut, img: &DocxImage) -> Result<()> {
    let (cx, cy) = (img.cx.to_string(), img.cy.to_string());
    let id = img.id.to_string();
    let name = format!("Picture {}", img.id);
    out.start("w:p", &[])?;
    out.start("w:r", &[])?;
    out.start("w:drawing", &[])?;
    out.start("wp:inline", &[])?;
    out.empty("wp:extent", &[("cx", &cx), ("cy", &cy)])?;
    out.empty("wp:docPr", &[("id", &id), ("name", &name)])?;
    out.start("a:graphic", &[])?;
    out.start("a:graphicData", &[("uri", PIC_NS)])?;
    out.start("pic:pic", &[])?;
    out.start("pic:nvPicPr", &[])?;
    out.empty("pic:cNvPr", &[("id", &id), ("name", &name)])?;
    out.empty("pic:cNvPicPr", &[])?;
    out.end("pic:nvPicPr")?;
    out.start("pic:blipFill", &[])?;
    out.empty("a:blip", &[("r:embed", &img.rel_id)])?;
    out.start("a:stretch", &[])?;
    out.empty("a:fillRect", &[])?;
    out.end("a:stretch")?;
    out.end("pic:blipFill")?;
    out.start("pic:spPr", &[])?;
    out.start("a:xfrm", &[])?;
    out.empty("a:off", &[("x", "0"), ("y", "0")])?;
    out.empty("a:ext", &[("cx", &cx), ("cy", &cy)])?;
    out.end("a:xfrm")?;
    out.start("a:prstGeom", &[("prst", "rect")])?;
    out.empty("a:avLst", &[])?;
    out.end("a:prstGeom")?;
    out.end("pic:spPr")?;
    out.end("pic:pic")?;
    out.end("a:graphicData")?;
    out.end("a:graphic")?;
    out.end("wp:inline")?;
    out.end("w:drawing")?;
    out.end("w:r")?;
    out.end("w:p")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{BlockParser, ListPolicy};
    use crate::style::StyleResolver;

    fn body(html: &str) -> DocxBody {
        let resolver = StyleResolver::default();
        let blocks = BlockParser::new(&resolver, 680.0)
            .with_policy(ListPolicy::WholeList)
            .parse(html);
        DocxBody::from_blocks(&blocks, &PageConfig::a4())
    }

    fn paragraphs(body: &DocxBody) -> Vec<&DocxParagraph> {
        body.elements
            .iter()
            .filter_map(|e| match e {
                DocxElement::Paragraph(p) => Some(p),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn heading_gets_style_and_size() {
        let b = body("<h2>Title</h2>");
        let p = paragraphs(&b)[0];
        assert_eq!(p.style.as_deref(), Some("Heading2"));
        // 24px = 18pt = 36 half-points
        assert_eq!(p.runs[0].size, Some(36));
        assert!(p.runs[0].bold);
    }

    #[test]
    fn list_items_become_marked_paragraphs() {
        let b = body(r#"<ol start="3"><li>a</li><li>b</li></ol>"#);
        let ps = paragraphs(&b);
        assert_eq!(ps.len(), 2);
        assert_eq!(ps[1].marker.as_deref(), Some("4."));
        // 40px list padding
        assert_eq!(ps[0].indent_left, 600);
    }

    #[test]
    fn run_colours_are_normalised() {
        let b = body(r#"<p><span style="color: rgb(255, 0, 0)">r</span></p>"#);
        assert_eq!(paragraphs(&b)[0].runs[0].color.as_deref(), Some("FF0000"));
    }

    #[test]
    fn wide_images_scale_to_content_width() {
        let b = body(r#"<img src="a.png" width="1360" height="200">"#);
        let img = b.media().next().unwrap();
        assert_eq!(img.cx, emu(680.0));
        assert_eq!(img.cy, emu(100.0));
        assert_eq!(img.rel_id, "rIdImage1");
    }

    #[test]
    fn table_cells_carry_borders_and_span() {
        let b = body(
            r#"<table><tr><td colspan="2" style="border: 2px solid #000; padding: 4px">x</td></tr><tr><td>a</td><td>b</td></tr></table>"#,
        );
        let DocxElement::Table(t) = &b.elements[0] else {
            panic!("expected table");
        };
        assert_eq!(t.columns, 2);
        let cell = &t.rows[0].cells[0];
        assert_eq!(cell.grid_span, 2);
        assert_eq!(cell.borders, [12, 12, 12, 12]);
        assert_eq!(cell.margins, [60, 60, 60, 60]);
        assert_eq!(cell.border_color.as_deref(), Some("000000"));
    }

    #[test]
    fn document_xml_is_well_formed() {
        let xml = body("<h1>T &amp; U</h1><table><tr><th>h</th></tr></table><img src=\"a.png\" width=\"10\" height=\"10\">")
            .to_document_xml()
            .unwrap();
        let mut reader = quick_xml::Reader::from_str(&xml);
        let mut depth = 0i32;
        loop {
            match reader.read_event().unwrap() {
                quick_xml::events::Event::Start(_) => depth += 1,
                quick_xml::events::Event::End(_) => depth -= 1,
                quick_xml::events::Event::Eof => break,
                _ => {}
            }
        }
        assert_eq!(depth, 0);
        assert!(xml.contains("T &amp; U"));
        assert!(xml.contains("<w:tblHeader/>"));
        assert!(xml.contains("r:embed=\"rIdImage1\""));
        assert!(xml.contains("<w:pgSz w:w=\"11910\" w:h=\"16845\"/>"));
    }
}
