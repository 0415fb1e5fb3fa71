//! The built-in layout backend: a block/inline box model over the style
//! cascade, with text measured by real font metrics.
//!
//! Height of a block = vertical margins + borders + padding + content. An
//! explicit CSS `height` replaces the content height. Adjacent margins do
//! not collapse. Table columns share the table width evenly and a row is as
//! tall as its tallest cell.

use std::collections::HashMap;

use super::LayoutBackend;
use crate::dom::{Element, Node};
use crate::error::Result;
use crate::font::FontContext;
use crate::image_loader::ImageLoader;
use crate::model::PAGE_CONTENT_WIDTH;
use crate::style::{Display, ResolvedStyle, StyleResolver, WhiteSpace};
use crate::text::{InlineItem, TextLayout, TextSpan, WrapMode};

/// Class of the element every page's content is rendered into.
pub const PAGE_CONTENT_CLASS: &str = "page-content";

/// The page content container, as seen by selectors.
pub fn page_container() -> Element {
    Element::new("div").with_attr("class", PAGE_CONTENT_CLASS)
}

pub struct NativeBackend {
    resolver: StyleResolver,
    fonts: FontContext,
    text: TextLayout,
    loader: ImageLoader,
    /// Intrinsic sizes by source; None for sources that failed to load.
    image_sizes: HashMap<String, Option<(f64, f64)>>,
    content_width: f64,
}

impl NativeBackend {
    pub fn new(resolver: StyleResolver, fonts: FontContext, content_width: f64) -> Self {
        Self {
            resolver,
            fonts,
            text: TextLayout::new(),
            loader: ImageLoader::new(),
            image_sizes: HashMap::new(),
            content_width,
        }
    }

    pub fn with_image_loader(mut self, loader: ImageLoader) -> Self {
        self.loader = loader;
        self
    }

    pub fn resolver(&self) -> &StyleResolver {
        &self.resolver
    }

    pub fn fonts(&self) -> &FontContext {
        &self.fonts
    }

    fn root_style(&self, container: &Element) -> ResolvedStyle {
        let mut root = self
            .resolver
            .resolve(container, &[], None, self.content_width);
        // The container's own box is the page margin area.
        root.margin = Default::default();
        root.padding = Default::default();
        root.border_width = Default::default();
        root
    }

    fn intrinsic_size(&mut self, src: &str) -> Option<(f64, f64)> {
        if let Some(size) = self.image_sizes.get(src) {
            return *size;
        }
        let size = match self.loader.dimensions(src) {
            Ok((w, h)) => Some((w as f64, h as f64)),
            Err(e) => {
                log::debug!("image unavailable: {}", e);
                None
            }
        };
        self.image_sizes.insert(src.to_string(), size);
        size
    }

    fn block_height(
        &mut self,
        el: &Element,
        ancestors: &[&Element],
        parent: &ResolvedStyle,
        avail: f64,
    ) -> f64 {
        let style = self.resolver.resolve(el, ancestors, Some(parent), avail);
        if style.display == Display::None {
            return 0.0;
        }
        if el.is("img") {
            let (_, h) = self.image_size(el, &style, avail);
            return h + style.margin.vertical();
        }
        if el.is("br") {
            return style.line_height_px();
        }

        let chrome_h = style.padding.horizontal() + style.border_width.horizontal();
        let mut outer_w = match style.width {
            Some(w) => w + chrome_h,
            None => avail - style.margin.horizontal(),
        };
        if let Some(max) = style.max_width {
            outer_w = outer_w.min(max + chrome_h);
        }
        let inner_w = (outer_w - chrome_h).max(0.0);

        let content = match style.height {
            Some(h) => h,
            None => {
                let mut chain = ancestors.to_vec();
                chain.push(el);
                if style.display == Display::Table {
                    self.table_height(el, &style, &chain, inner_w)
                } else {
                    self.flow_height(&el.children, &style, &chain, inner_w)
                }
            }
        };

        style.margin.vertical() + style.border_width.vertical() + style.padding.vertical() + content
    }

    /// Stack block-level children; runs of inline content between them
    /// form anonymous line boxes.
    fn flow_height(
        &mut self,
        children: &[Node],
        style: &ResolvedStyle,
        chain: &[&Element],
        width: f64,
    ) -> f64 {
        let mut total = 0.0;
        let mut inline: Vec<InlineItem> = Vec::new();

        for child in children {
            if let Node::Element(e) = child {
                let child_style = self.resolver.resolve(e, chain, Some(style), width);
                if child_style.display.is_block_level() {
                    total += self.inline_height(&inline, style, width);
                    inline.clear();
                    total += self.block_height(e, chain, style, width);
                    continue;
                }
            }
            self.collect_inline(child, chain, style, width, &mut inline);
        }

        total + self.inline_height(&inline, style, width)
    }

    fn inline_height(&self, items: &[InlineItem], style: &ResolvedStyle, width: f64) -> f64 {
        if items.is_empty() {
            return 0.0;
        }
        let mode = WrapMode {
            preserve_whitespace: style.white_space.preserves_newlines(),
            wrap: !matches!(style.white_space, WhiteSpace::Pre | WhiteSpace::NoWrap),
        };
        self.text
            .measure_height(&self.fonts, items, width, style.line_height_px(), mode)
    }

    fn collect_inline(
        &mut self,
        node: &Node,
        chain: &[&Element],
        parent: &ResolvedStyle,
        width: f64,
        items: &mut Vec<InlineItem>,
    ) {
        match node {
            Node::Text { text } => items.push(InlineItem::Text(TextSpan {
                text: text.clone(),
                font_family: parent.font_family.clone(),
                font_weight: parent.font_weight,
                font_size: parent.font_size,
                line_height: parent.line_height_px(),
            })),
            Node::Element(e) => {
                let style = self.resolver.resolve(e, chain, Some(parent), width);
                if style.display == Display::None {
                    return;
                }
                if e.is("br") {
                    items.push(InlineItem::LineBreak {
                        line_height: style.line_height_px(),
                    });
                } else if e.is("img") {
                    let (w, h) = self.image_size(e, &style, width);
                    if w > 0.0 || h > 0.0 {
                        items.push(InlineItem::Atomic {
                            width: w + style.margin.horizontal(),
                            height: h + style.margin.vertical(),
                        });
                    }
                } else {
                    let mut next = chain.to_vec();
                    next.push(e);
                    for child in &e.children {
                        self.collect_inline(child, &next, &style, width, items);
                    }
                }
            }
        }
    }

    fn table_height(
        &mut self,
        table: &Element,
        style: &ResolvedStyle,
        chain: &[&Element],
        width: f64,
    ) -> f64 {
        let mut total = 0.0;
        // (row group, row)
        let mut rows: Vec<(Option<&Element>, &Element)> = Vec::new();
        for child in table.child_elements() {
            match child.tag.as_str() {
                "caption" => total += self.block_height(child, chain, style, width),
                "thead" | "tbody" | "tfoot" => rows.extend(
                    child
                        .child_elements()
                        .filter(|r| r.is("tr"))
                        .map(|r| (Some(child), r)),
                ),
                "tr" => rows.push((None, child)),
                _ => {}
            }
        }

        let columns = rows
            .iter()
            .map(|(_, tr)| cells(tr).map(col_span).sum::<usize>())
            .max()
            .unwrap_or(1)
            .max(1);
        let column_width = width / columns as f64;

        for (group, tr) in rows {
            let mut row_chain = chain.to_vec();
            let mut row_parent = style.clone();
            if let Some(group) = group {
                row_parent = self
                    .resolver
                    .resolve(group, &row_chain, Some(&row_parent), width);
                row_chain.push(group);
            }
            let row_style = self
                .resolver
                .resolve(tr, &row_chain, Some(&row_parent), width);
            if row_style.display == Display::None {
                continue;
            }
            row_chain.push(tr);

            let mut row_height = row_style.height.unwrap_or(0.0);
            for cell in cells(tr) {
                let span = col_span(cell) as f64;
                let h = self.block_height(cell, &row_chain, &row_style, column_width * span);
                row_height = row_height.max(h);
            }
            total += row_height;
        }

        total
    }

    /// Rendered size of an image from its declared and intrinsic sizes.
    fn image_size(&mut self, img: &Element, style: &ResolvedStyle, avail: f64) -> (f64, f64) {
        let src = img.attr("src").unwrap_or("").to_string();
        let Some((iw, ih)) = self.intrinsic_size(&src) else {
            return (0.0, 0.0);
        };

        let declared_w = style.width.or_else(|| numeric_attr(img, "width"));
        let declared_h = style.height.or_else(|| numeric_attr(img, "height"));
        let (mut w, mut h) = match (declared_w, declared_h) {
            (Some(w), Some(h)) => (w, h),
            (Some(w), None) if iw > 0.0 => (w, w * ih / iw),
            (None, Some(h)) if ih > 0.0 => (h * iw / ih, h),
            (Some(w), None) => (w, 0.0),
            (None, Some(h)) => (0.0, h),
            (None, None) => (iw, ih),
        };

        let limit = style.max_width.unwrap_or(f64::INFINITY).min(avail);
        if w > limit && w > 0.0 {
            h *= limit / w;
            w = limit;
        }
        (w, h)
    }
}

impl LayoutBackend for NativeBackend {
    fn measure(&mut self, element: &Element) -> Result<f64> {
        let container = page_container();
        let root = self.root_style(&container);
        Ok(self.block_height(element, &[&container], &root, self.content_width))
    }

    fn image_box(&mut self, img: &Element) -> Result<(f64, f64)> {
        let container = page_container();
        let root = self.root_style(&container);
        let style = self
            .resolver
            .resolve(img, &[&container], Some(&root), self.content_width);
        Ok(self.image_size(img, &style, self.content_width))
    }

    fn preload_images(&mut self, sources: &[String]) {
        for src in sources {
            self.intrinsic_size(src);
        }
    }

    fn content_width(&self) -> f64 {
        self.content_width
    }
}

impl Default for NativeBackend {
    fn default() -> Self {
        Self::new(StyleResolver::default(), FontContext::new(), PAGE_CONTENT_WIDTH)
    }
}

fn cells(tr: &Element) -> impl Iterator<Item = &Element> {
    tr.child_elements().filter(|c| c.is("td") || c.is("th"))
}

fn col_span(cell: &Element) -> usize {
    cell.attr("colspan")
        .and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(1)
        .max(1)
}

fn numeric_attr(el: &Element, name: &str) -> Option<f64> {
    el.attr(name)
        .and_then(|v| v.trim().trim_end_matches("px").parse::<f64>().ok())
        .filter(|v| *v >= 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::parse_element;
    use crate::style::Stylesheet;

    fn backend() -> NativeBackend {
        NativeBackend::default()
    }

    fn measure(html: &str) -> f64 {
        let el = parse_element(html).unwrap();
        backend().measure(&el).unwrap()
    }

    fn png_data_uri(width: u32, height: u32) -> String {
        use base64::Engine;
        let img = image::RgbaImage::new(width, height);
        let mut buf = Vec::new();
        let encoder = image::codecs::png::PngEncoder::new(&mut buf);
        image::ImageEncoder::write_image(encoder, img.as_raw(), width, height, image::ColorType::Rgba8)
            .unwrap();
        format!(
            "data:image/png;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(buf)
        )
    }

    #[test]
    fn explicit_height_wins() {
        assert_eq!(measure(r#"<p style="height: 500px; margin: 0">text</p>"#), 500.0);
    }

    #[test]
    fn margins_are_included() {
        assert_eq!(measure(r#"<div style="height: 100px; margin: 10px 0 20px"></div>"#), 130.0);
    }

    #[test]
    fn paragraph_has_one_line_plus_margins() {
        // 16px text, normal line height 19.2px, 1em margins
        let h = measure("<p>Short</p>");
        assert!((h - (19.2 + 32.0)).abs() < 1e-6, "got {h}");
    }

    #[test]
    fn long_paragraph_wraps() {
        let text = "word ".repeat(400);
        let h = measure(&format!("<p style=\"margin:0\">{text}</p>"));
        assert!(h > 19.2 * 10.0);
    }

    #[test]
    fn display_none_is_zero() {
        assert_eq!(measure(r#"<p style="display: none">hidden</p>"#), 0.0);
    }

    #[test]
    fn list_items_stack() {
        let h = measure(
            r#"<ul style="margin:0"><li style="height:10px"></li><li style="height:15px"></li></ul>"#,
        );
        assert_eq!(h, 25.0);
    }

    #[test]
    fn table_rows_take_tallest_cell() {
        let h = measure(
            r#"<table><tr><td style="height:30px;padding:0"></td><td style="height:50px;padding:0"></td></tr>
               <tr><td style="height:10px;padding:0"></td></tr></table>"#,
        );
        assert_eq!(h, 60.0);
    }

    #[test]
    fn stylesheet_rules_apply() {
        let resolver = StyleResolver::new(Stylesheet::parse(".tall { height: 77px; margin: 0 }"));
        let mut b = NativeBackend::new(resolver, FontContext::new(), 680.0);
        let el = parse_element(r#"<p class="tall">x</p>"#).unwrap();
        assert_eq!(b.measure(&el).unwrap(), 77.0);
    }

    #[test]
    fn broken_image_has_no_size() {
        let el = parse_element(r#"<img src="missing.png" width="100" height="100">"#).unwrap();
        assert_eq!(backend().image_box(&el).unwrap(), (0.0, 0.0));
    }

    #[test]
    fn image_keeps_aspect_ratio_from_intrinsic_size() {
        let src = png_data_uri(20, 10);
        let el = parse_element(&format!(r#"<img src="{src}" width="200">"#)).unwrap();
        assert_eq!(backend().image_box(&el).unwrap(), (200.0, 100.0));
    }

    #[test]
    fn wide_image_is_clamped_to_content_width() {
        let src = png_data_uri(10, 10);
        let el = parse_element(&format!(r#"<img src="{src}" width="1360" height="1360">"#)).unwrap();
        assert_eq!(backend().image_box(&el).unwrap(), (680.0, 680.0));
    }
}
