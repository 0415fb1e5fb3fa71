//! PresentationML slides built from per-item blocks.
//!
//! `h1`/`h2` headings open a new slide titled by the heading. Everything
//! else lands on the current slide as a text, picture or table item. A
//! slide holds at most [`MAX_ITEMS_PER_SLIDE`] items; overflow continues
//! on a slide titled `"<title> (cont.)"`.

use serde::Serialize;

use super::units::{centipoints, emu};
use super::XmlOut;
use crate::error::Result;
use crate::model::{Block, BlockContent, ImageMeta, InlineRun, TableMeta};
use crate::style::css_color_to_hex;

const P_NS: &str = "http://schemas.openxmlformats.org/presentationml/2006/main";
const A_NS: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
const R_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

pub const MAX_ITEMS_PER_SLIDE: usize = 8;

/// 16:9 slide, in px.
const SLIDE_WIDTH: f64 = 1280.0;
const SLIDE_HEIGHT: f64 = 720.0;
const SLIDE_MARGIN: f64 = 64.0;
const TITLE_TOP: f64 = 40.0;
const TITLE_HEIGHT: f64 = 80.0;
const BODY_TOP: f64 = 140.0;
const TEXT_ITEM_HEIGHT: f64 = 44.0;
const TABLE_ROW_HEIGHT: f64 = 36.0;
const TITLE_SIZE: f64 = 40.0;
const BODY_SIZE: f64 = 24.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum Bullet {
    None,
    Char,
    Number { value: usize },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", tag = "type")]
pub enum SlideItem {
    Text {
        runs: Vec<InlineRun>,
        bullet: Bullet,
        /// Heading text inside a slide is emphasised.
        emphasis: bool,
    },
    Picture {
        src: String,
        /// EMU.
        cx: i64,
        cy: i64,
    },
    Table {
        rows: Vec<Vec<String>>,
        header_rows: usize,
    },
}

impl SlideItem {
    fn height_px(&self) -> f64 {
        match self {
            SlideItem::Text { .. } => TEXT_ITEM_HEIGHT,
            SlideItem::Picture { cy, .. } => *cy as f64 / super::units::EMU_PER_PX,
            SlideItem::Table { rows, .. } => rows.len() as f64 * TABLE_ROW_HEIGHT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Slide {
    pub title: String,
    pub items: Vec<SlideItem>,
}

impl Slide {
    fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            items: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlideDeck {
    pub title: String,
    pub width_emu: i64,
    pub height_emu: i64,
    pub slides: Vec<Slide>,
}

impl SlideDeck {
    pub fn from_blocks(title: &str, blocks: &[Block]) -> Self {
        let mut builder = DeckBuilder {
            deck_title: title.to_string(),
            slides: vec![Slide::new(title)],
        };
        for block in blocks {
            builder.push_block(block);
        }
        let mut slides = builder.slides;
        // Drop the opening slide when a heading replaced it before any content.
        if slides.len() > 1 && slides[0].items.is_empty() && slides[0].title == title {
            slides.remove(0);
        }
        SlideDeck {
            title: title.to_string(),
            width_emu: emu(SLIDE_WIDTH),
            height_emu: emu(SLIDE_HEIGHT),
            slides,
        }
    }

    /// One `ppt/slides/slideN.xml` per slide.
    pub fn slides_xml(&self) -> Result<Vec<String>> {
        self.slides.iter().map(slide_xml).collect()
    }
}

struct DeckBuilder {
    deck_title: String,
    slides: Vec<Slide>,
}

impl DeckBuilder {
    fn current(&mut self) -> &mut Slide {
        if self.slides.is_empty() {
            self.slides.push(Slide::new(self.deck_title.clone()));
        }
        let last = self.slides.len() - 1;
        &mut self.slides[last]
    }

    fn push_item(&mut self, item: SlideItem) {
        if self.current().items.len() >= MAX_ITEMS_PER_SLIDE {
            let title = format!("{} (cont.)", self.current().title.trim_end_matches(" (cont.)"));
            self.slides.push(Slide::new(title));
        }
        self.current().items.push(item);
    }

    fn push_block(&mut self, block: &Block) {
        match &block.content {
            BlockContent::Heading { level, inline } if *level <= 2 => {
                let title = runs_text(inline);
                self.slides.push(Slide::new(title));
            }
            BlockContent::Heading { inline, .. } => self.push_item(SlideItem::Text {
                runs: inline.clone(),
                bullet: Bullet::None,
                emphasis: true,
            }),
            BlockContent::Paragraph { inline } => {
                if !runs_text(inline).is_empty() {
                    self.push_item(SlideItem::Text {
                        runs: inline.clone(),
                        bullet: Bullet::None,
                        emphasis: false,
                    });
                }
            }
            BlockContent::ListItem {
                ordered,
                number,
                inline,
            } => self.push_item(SlideItem::Text {
                runs: inline.clone(),
                bullet: bullet(*ordered, *number),
                emphasis: false,
            }),
            BlockContent::List { ordered, items } => {
                let start = crate::parser::list_start(block.element());
                for (i, item) in items.iter().enumerate() {
                    self.push_item(SlideItem::Text {
                        runs: item.inline.clone(),
                        bullet: bullet(*ordered, start + i),
                        emphasis: false,
                    });
                }
            }
            BlockContent::Image(meta) => {
                if let Some(item) = picture(meta) {
                    self.push_item(item);
                }
            }
            BlockContent::Table(meta) => self.push_item(table(meta)),
        }
    }
}

fn bullet(ordered: bool, number: usize) -> Bullet {
    if ordered {
        Bullet::Number { value: number }
    } else {
        Bullet::Char
    }
}

fn runs_text(runs: &[InlineRun]) -> String {
    runs.iter().map(|r| r.text.as_str()).collect::<String>().trim().to_string()
}

fn picture(meta: &ImageMeta) -> Option<SlideItem> {
    if meta.width <= 0.0 || meta.height <= 0.0 {
        log::warn!("skipping image '{}' with unknown size", meta.src);
        return None;
    }
    let max_w = SLIDE_WIDTH - 2.0 * SLIDE_MARGIN;
    let max_h = SLIDE_HEIGHT - BODY_TOP - SLIDE_MARGIN / 2.0;
    let scale = (max_w / meta.width).min(max_h / meta.height).min(1.0);
    Some(SlideItem::Picture {
        src: meta.src.clone(),
        cx: emu(meta.width * scale),
        cy: emu(meta.height * scale),
    })
}

fn table(meta: &TableMeta) -> SlideItem {
    let rows: Vec<Vec<String>> = meta
        .rows
        .iter()
        .map(|row| row.cells.iter().map(|c| runs_text(&c.inline)).collect())
        .collect();
    let header_rows = meta.rows.iter().take_while(|r| r.is_header).count();
    SlideItem::Table { rows, header_rows }
}

fn slide_xml(slide: &Slide) -> Result<String> {
    let mut out = XmlOut::new()?;
    out.start("p:sld", &[("xmlns:a", A_NS), ("xmlns:r", R_NS), ("xmlns:p", P_NS)])?;
    out.start("p:cSld", &[])?;
    out.start("p:spTree", &[])?;
    out.start("p:nvGrpSpPr", &[])?;
    out.empty("p:cNvPr", &[("id", "1"), ("name", "")])?;
    out.empty("p:cNvGrpSpPr", &[])?;
    out.empty("p:nvPr", &[])?;
    out.end("p:nvGrpSpPr")?;
    out.empty("p:grpSpPr", &[])?;

    let mut ids = 2usize;
    let frame = Frame {
        x: SLIDE_MARGIN,
        y: TITLE_TOP,
        w: SLIDE_WIDTH - 2.0 * SLIDE_MARGIN,
        h: TITLE_HEIGHT,
    };
    let title_run = InlineRun {
        text: slide.title.clone(),
        bold: true,
        font_size: Some(TITLE_SIZE),
        ..InlineRun::default()
    };
    write_text_shape(&mut out, ids, "Title", frame, &[(&Bullet::None, false, &[title_run][..])])?;
    ids += 1;

    let mut y = BODY_TOP;
    let mut pictures = 0usize;
    let mut pending: Vec<&SlideItem> = Vec::new();
    for item in &slide.items {
        if matches!(item, SlideItem::Text { .. }) {
            pending.push(item);
            continue;
        }
        y = flush_text(&mut out, &mut ids, &mut pending, y)?;
        let w = SLIDE_WIDTH - 2.0 * SLIDE_MARGIN;
        match item {
            SlideItem::Picture { cx, cy, .. } => {
                pictures += 1;
                write_picture(&mut out, ids, pictures, SLIDE_MARGIN, y, *cx, *cy)?;
            }
            SlideItem::Table { rows, header_rows } => {
                let h = item.height_px();
                write_table(&mut out, ids, Frame { x: SLIDE_MARGIN, y, w, h }, rows, *header_rows)?;
            }
            SlideItem::Text { .. } => {}
        }
        ids += 1;
        y += item.height_px() + 12.0;
    }
    flush_text(&mut out, &mut ids, &mut pending, y)?;

    out.end("p:spTree")?;
    out.end("p:cSld")?;
    out.end("p:sld")?;
    out.finish()
}

#[derive(Debug, Clone, Copy)]
struct Frame {
    x: f64,
    y: f64,
    w: f64,
    h: f64,
}

/// Write consecutive text items as one body text box. Returns the next free `y`.
fn flush_text(out: &mut XmlOut, ids: &mut usize, pending: &mut Vec<&SlideItem>, y: f64) -> Result<f64> {
    if pending.is_empty() {
        return Ok(y);
    }
    let paragraphs: Vec<(&Bullet, bool, &[InlineRun])> = pending
        .iter()
        .filter_map(|item| match item {
            SlideItem::Text {
                runs,
                bullet,
                emphasis,
            } => Some((bullet, *emphasis, runs.as_slice())),
            _ => None,
        })
        .collect();
    let h = paragraphs.len() as f64 * TEXT_ITEM_HEIGHT;
    let frame = Frame {
        x: SLIDE_MARGIN,
        y,
        w: SLIDE_WIDTH - 2.0 * SLIDE_MARGIN,
        h,
    };
    write_text_shape(out, *ids, &format!("Body {}", ids), frame, &paragraphs)?;
    *ids += 1;
    pending.clear();
    Ok(y + h + 12.0)
}

fn write_xfrm(out: &mut XmlOut, tag: &str, x: i64, y: i64, cx: i64, cy: i64) -> Result<()> {
    out.start(tag, &[])?;
    out.empty("a:off", &[("x", &x.to_string()), ("y", &y.to_string())])?;
    out.empty("a:ext", &[("cx", &cx.to_string()), ("cy", &cy.to_string())])?;
    out.end(tag)
}

fn write_text_shape(
    out: &mut XmlOut,
    id: usize,
    name: &str,
    frame: Frame,
    paragraphs: &[(&Bullet, bool, &[InlineRun])],
) -> Result<()> {
    out.start("p:sp", &[])?;
    out.start("p:nvSpPr", &[])?;
    out.empty("p:cNvPr", &[("id", &id.to_string()), ("name", name)])?;
    out.empty("p:cNvSpPr", &[("txBox", "1")])?;
    out.empty("p:nvPr", &[])?;
    out.end("p:nvSpPr")?;
    out.start("p:spPr", &[])?;
    write_xfrm(out, "a:xfrm", emu(frame.x), emu(frame.y), emu(frame.w), emu(frame.h))?;
    out.start("a:prstGeom", &[("prst", "rect")])?;
    out.empty("a:avLst", &[])?;
    out.end("a:prstGeom")?;
    out.end("p:spPr")?;
    out.start("p:txBody", &[])?;
    out.start("a:bodyPr", &[("wrap", "square")])?;
    out.empty("a:normAutofit", &[])?;
    out.end("a:bodyPr")?;
    out.empty("a:lstStyle", &[])?;
    for (bullet, emphasis, runs) in paragraphs {
        write_paragraph(out, bullet, *emphasis, runs)?;
    }
    out.end("p:txBody")?;
    out.end("p:sp")
}

fn write_paragraph(out: &mut XmlOut, bullet: &Bullet, emphasis: bool, runs: &[InlineRun]) -> Result<()> {
    out.start("a:p", &[])?;
    match bullet {
        Bullet::None => out.empty("a:pPr", &[("marL", "0"), ("indent", "0")])?,
        Bullet::Char => {
            out.start("a:pPr", &[("marL", "342900"), ("indent", "-342900")])?;
            out.empty("a:buChar", &[("char", "\u{2022}")])?;
            out.end("a:pPr")?;
        }
        Bullet::Number { value } => {
            out.start("a:pPr", &[("marL", "342900"), ("indent", "-342900")])?;
            out.empty(
                "a:buAutoNum",
                &[("type", "arabicPeriod"), ("startAt", &value.to_string())],
            )?;
            out.end("a:pPr")?;
        }
    }
    for run in runs.iter().filter(|r| !r.text.is_empty()) {
        write_run(out, run, emphasis)?;
    }
    out.end("a:p")
}

fn write_run(out: &mut XmlOut, run: &InlineRun, emphasis: bool) -> Result<()> {
    let size = centipoints(run.font_size.unwrap_or(BODY_SIZE).max(BODY_SIZE)).to_string();
    let mut attrs: Vec<(&str, &str)> = vec![("lang", "en-US"), ("sz", &size)];
    if run.bold || emphasis {
        attrs.push(("b", "1"));
    }
    if run.italic {
        attrs.push(("i", "1"));
    }
    if run.underline {
        attrs.push(("u", "sng"));
    }
    out.start("a:r", &[])?;
    match run.color.as_deref().and_then(css_color_to_hex) {
        Some(color) => {
            out.start("a:rPr", &attrs)?;
            out.start("a:solidFill", &[])?;
            out.empty("a:srgbClr", &[("val", &color)])?;
            out.end("a:solidFill")?;
            out.end("a:rPr")?;
        }
        None => out.empty("a:rPr", &attrs)?,
    }
    out.text_element("a:t", &[], &run.text)?;
    out.end("a:r")
}

fn write_picture(out: &mut XmlOut, id: usize, n: usize, x: f64, y: f64, cx: i64, cy: i64) -> Result<()> {
    let name = format!("Picture {}", n);
    let rel = format!("rIdImage{}", n);
    out.start("p:pic", &[])?;
    out.start("p:nvPicPr", &[])?;
    out.empty("p:cNvPr", &[("id", &id.to_string()), ("name", &name)])?;
    out.empty("p:cNvPicPr", &[])?;
    out.empty("p:nvPr", &[])?;
    out.end("p:nvPicPr")?;
    out.start("p:blipFill", &[])?;
    out.empty("a:blip", &[("r:embed", &rel)])?;
    out.start("a:stretch", &[])?;
    out.empty("a:fillRect", &[])?;
    out.end("a:stretch")?;
    out.end("p:blipFill")?;
    out.start("p:spPr", &[])?;
    write_xfrm(out, "a:xfrm", emu(x), emu(y), cx, cy)?;
    out.start("a:prstGeom", &[("prst", "rect")])?;
    out.empty("a:avLst", &[])?;
    out.end("a:prstGeom")?;
    out.end("p:spPr")?;
    out.end("p:pic")
}

fn write_table(out: &mut XmlOut, id: usize, frame: Frame, rows: &[Vec<String>], header_rows: usize) -> Result<()> {
    let columns = rows.iter().map(Vec::len).max().unwrap_or(0).max(1);
    let col_w = emu(frame.w / columns as f64).to_string();
    let row_h = emu(TABLE_ROW_HEIGHT).to_string();
    let size = centipoints(BODY_SIZE * 0.75).to_string();

    out.start("p:graphicFrame", &[])?;
    out.start("p:nvGraphicFramePr", &[])?;
    out.empty("p:cNvPr", &[("id", &id.to_string()), ("name", &format!("Table {}", id))])?;
    out.empty("p:cNvGraphicFramePr", &[])?;
    out.empty("p:nvPr", &[])?;
    out.end("p:nvGraphicFramePr")?;
    write_xfrm(out, "p:xfrm", emu(frame.x), emu(frame.y), emu(frame.w), emu(frame.h))?;
    out.start("a:graphic", &[])?;
    out.start("a:graphicData", &[("uri", "http://schemas.openxmlformats.org/drawingml/2006/table")])?;
    out.start("a:tbl", &[])?;
    let first_row = if header_rows > 0 { "1" } else { "0" };
    out.empty("a:tblPr", &[("firstRow", first_row), ("bandRow", "1")])?;
    out.start("a:tblGrid", &[])?;
    for _ in 0..columns {
        out.empty("a:gridCol", &[("w", &col_w)])?;
    }
    out.end("a:tblGrid")?;
    for (r, row) in rows.iter().enumerate() {
        out.start("a:tr", &[("h", &row_h)])?;
        for c in 0..columns {
            let text = row.get(c).map(String::as_str).unwrap_or("");
            out.start("a:tc", &[])?;
            out.start("a:txBody", &[])?;
            out.empty("a:bodyPr", &[])?;
            out.empty("a:lstStyle", &[])?;
            out.start("a:p", &[])?;
            out.start("a:r", &[])?;
            if r < header_rows {
                out.empty("a:rPr", &[("lang", "en-US"), ("sz", &size), ("b", "1")])?;
            } else {
                out.empty("a:rPr", &[("lang", "en-US"), ("sz", &size)])?;
            }
            out.text_element("a:t", &[], text)?;
            out.end("a:r")?;
            out.end("a:p")?;
            out.end("a:txBody")?;
            out.empty("a:tcPr", &[])?;
            out.end("a:tc")?;
        }
        out.end("a:tr")?;
    }
    out.end("a:tbl")?;
    out.end("a:graphicData")?;
    out.end("a:graphic")?;
    out.end("p:graphicFrame")
}
