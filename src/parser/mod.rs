//! # Block Parser
//!
//! Turns an HTML fragment into the ordered list of top-level [`Block`]s
//! the paginator flows. Classification is by tag:
//!
//! | top-level element              | block                                   |
//! |--------------------------------|-----------------------------------------|
//! | `h1`..`h3`                     | heading                                 |
//! | `img`, or `p` holding only one | image                                   |
//! | `table`                        | table                                   |
//! | `ul` / `ol`                    | one list, or one block per item         |
//! | anything else                  | paragraph (empty `p` elements dropped)  |
//!
//! A fragment whose only element is a generic container (`div`,
//! `section`, `article`, `main`) is unwrapped first.

use serde::{Deserialize, Serialize};

use crate::dom::{parse_fragment, Element, Node};
use crate::extract::{extract_layout, StyleExtractor};
use crate::image_loader::ImageLoader;
use crate::model::{
    Block, BlockContent, BlockId, ImageMeta, ListItemMeta, TableCellMeta, TableMeta, TableRowMeta,
};
use crate::style::{ResolvedStyle, StyleResolver};

/// How lists become blocks. Word-style export keeps whole lists;
/// slide-style export wants every item on its own.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ListPolicy {
    #[default]
    WholeList,
    PerItem,
}

const GENERIC_CONTAINERS: [&str; 4] = ["div", "section", "article", "main"];

pub struct BlockParser<'a> {
    extractor: StyleExtractor<'a>,
    policy: ListPolicy,
    images: ImageLoader,
}

impl<'a> BlockParser<'a> {
    pub fn new(resolver: &'a StyleResolver, content_width: f64) -> Self {
        Self {
            extractor: StyleExtractor::new(resolver, content_width),
            policy: ListPolicy::default(),
            images: ImageLoader::new(),
        }
    }

    pub fn with_policy(mut self, policy: ListPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_image_loader(mut self, images: ImageLoader) -> Self {
        self.images = images;
        self
    }

    pub fn policy(&self) -> ListPolicy {
        self.policy
    }

    /// Parse `html` into blocks with ids `0..n` in document order.
    pub fn parse(&self, html: &str) -> Vec<Block> {
        let nodes = unwrap_container(parse_fragment(html));
        let mut blocks = Vec::new();
        for node in nodes {
            match node {
                Node::Text { text } => {
                    if text.trim().is_empty() {
                        continue;
                    }
                    let p = Element::new("p").with_children(vec![Node::Text { text }]);
                    self.push_paragraph(p, &mut blocks);
                }
                Node::Element(el) => self.classify(el, &mut blocks),
            }
        }
        log::debug!(
            "parsed {} block(s) ({:?} list policy)",
            blocks.len(),
            self.policy
        );
        blocks
    }

    fn classify(&self, el: Element, blocks: &mut Vec<Block>) {
        match el.tag.as_str() {
            "h1" | "h2" | "h3" => {
                let level = el.tag[1..].parse::<u8>().unwrap_or(1);
                let style = self.extractor.top_level_style(&el);
                let inline = self.extractor.inline_runs(&el, &[], &style);
                push(blocks, el, &style, BlockContent::Heading { level, inline });
            }
            "p" => {
                if let Some(img) = sole_image(&el) {
                    let meta = self.image_meta(img);
                    self.push_image(el, meta, blocks);
                } else if el.has_visible_content() {
                    self.push_paragraph(el, blocks);
                } else {
                    log::trace!("dropping empty paragraph");
                }
            }
            "img" => {
                let meta = self.image_meta(&el);
                self.push_image(el, meta, blocks);
            }
            "table" => {
                let style = self.extractor.top_level_style(&el);
                let meta = self.table_meta(&el, &style);
                push(blocks, el, &style, BlockContent::Table(meta));
            }
            "ul" | "ol" => match self.policy {
                ListPolicy::WholeList => self.push_list(el, blocks),
                ListPolicy::PerItem => self.push_list_items(el, blocks),
            },
            _ => self.push_paragraph(el, blocks),
        }
    }

    fn push_paragraph(&self, el: Element, blocks: &mut Vec<Block>) {
        let style = self.extractor.top_level_style(&el);
        let inline = self.extractor.inline_runs(&el, &[], &style);
        push(blocks, el, &style, BlockContent::Paragraph { inline });
    }

    fn push_image(&self, el: Element, meta: ImageMeta, blocks: &mut Vec<Block>) {
        let style = self.extractor.top_level_style(&el);
        push(blocks, el, &style, BlockContent::Image(meta));
    }

    fn push_list(&self, list: Element, blocks: &mut Vec<Block>) {
        let style = self.extractor.top_level_style(&list);
        let items = list
            .child_elements()
            .filter(|li| li.is("li"))
            .map(|li| {
                let li_style = self.extractor.style_of(li, &[&list], &style);
                ListItemMeta {
                    layout: extract_layout(&li_style),
                    inline: self.extractor.inline_runs(li, &[&list], &li_style),
                }
            })
            .collect();
        let ordered = list.is("ol");
        push(blocks, list, &style, BlockContent::List { ordered, items });
    }

    fn push_list_items(&self, list: Element, blocks: &mut Vec<Block>) {
        let ordered = list.is("ol");
        let start = list_start(&list);
        let list_style = self.extractor.top_level_style(&list);
        let items = list
            .child_elements()
            .filter(|li| li.is("li") && li.has_visible_content());

        for (offset, li) in items.enumerate() {
            let number = start + offset;
            let li_style = self.extractor.style_of(li, &[&list], &list_style);
            let inline = self.extractor.inline_runs(li, &[&list], &li_style);

            let mut wrapper = list.shallow_clone();
            if ordered {
                wrapper.set_attr("start", &number.to_string());
            }
            wrapper.push(Node::Element(li.clone()));

            let id = BlockId(blocks.len());
            blocks.push(Block::new(
                id,
                wrapper,
                extract_layout(&li_style),
                BlockContent::ListItem {
                    ordered,
                    number,
                    inline,
                },
            ));
        }
    }

    fn image_meta(&self, img: &Element) -> ImageMeta {
        let src = img.attr("src").unwrap_or("").to_string();
        let declared = |name: &str| {
            img.attr(name)
                .and_then(|v| v.trim().trim_end_matches("px").parse::<f64>().ok())
        };
        let (width, height) = match (declared("width"), declared("height")) {
            (Some(w), Some(h)) => (w, h),
            (w, h) => match self.images.dimensions(&src) {
                Ok((iw, ih)) => {
                    let (iw, ih) = (iw as f64, ih as f64);
                    match (w, h) {
                        (Some(w), None) if iw > 0.0 => (w, w * ih / iw),
                        (None, Some(h)) if ih > 0.0 => (h * iw / ih, h),
                        _ => (iw, ih),
                    }
                }
                Err(_) => (w.unwrap_or(0.0), h.unwrap_or(0.0)),
            },
        };
        ImageMeta { src, width, height }
    }

    fn table_meta(&self, table: &Element, table_style: &ResolvedStyle) -> TableMeta {
        let mut rows = Vec::new();
        for child in table.child_elements() {
            match child.tag.as_str() {
                "thead" | "tbody" | "tfoot" => {
                    let group_style = self.extractor.style_of(child, &[table], table_style);
                    for tr in child.child_elements().filter(|r| r.is("tr")) {
                        rows.push(self.row_meta(
                            tr,
                            &[table, child],
                            &group_style,
                            child.is("thead"),
                        ));
                    }
                }
                "tr" => rows.push(self.row_meta(child, &[table], table_style, false)),
                _ => {}
            }
        }
        TableMeta { rows }
    }

    fn row_meta(
        &self,
        tr: &Element,
        ancestors: &[&Element],
        parent: &ResolvedStyle,
        in_head: bool,
    ) -> TableRowMeta {
        let row_style = self.extractor.style_of(tr, ancestors, parent);
        let mut chain = ancestors.to_vec();
        chain.push(tr);

        let cells: Vec<TableCellMeta> = tr
            .child_elements()
            .filter(|c| c.is("td") || c.is("th"))
            .map(|cell| {
                let style = self.extractor.style_of(cell, &chain, &row_style);
                TableCellMeta {
                    is_header: in_head || cell.is("th"),
                    col_span: cell
                        .attr("colspan")
                        .and_then(|v| v.trim().parse().ok())
                        .unwrap_or(1)
                        .max(1),
                    layout: extract_layout(&style),
                    inline: self.extractor.inline_runs(cell, &chain, &style),
                    border_width: style.border_width,
                    border_color: style.border_color.clone(),
                }
            })
            .collect();

        let is_header = in_head || (!cells.is_empty() && cells.iter().all(|c| c.is_header));
        TableRowMeta { is_header, cells }
    }
}

fn push(blocks: &mut Vec<Block>, el: Element, style: &ResolvedStyle, content: BlockContent) {
    let id = BlockId(blocks.len());
    blocks.push(Block::new(id, el, extract_layout(style), content));
}

/// Descend through a lone generic container wrapping the whole fragment.
fn unwrap_container(mut nodes: Vec<Node>) -> Vec<Node> {
    loop {
        let mut significant = nodes.iter().filter(|n| !n.is_blank_text());
        let only = match (significant.next(), significant.next()) {
            (Some(Node::Element(el)), None) if GENERIC_CONTAINERS.contains(&el.tag.as_str()) => {
                el.children.clone()
            }
            _ => return nodes,
        };
        nodes = only;
    }
}

/// The `<img>` of a paragraph that holds nothing else.
fn sole_image(p: &Element) -> Option<&Element> {
    let mut significant = p.children.iter().filter(|n| !n.is_blank_text());
    match (significant.next(), significant.next()) {
        (Some(Node::Element(img)), None) if img.is("img") => Some(img),
        _ => None,
    }
}

/// First number of an ordered list.
pub fn list_start(list: &Element) -> usize {
    list.attr("start")
        .and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::BlockKind;

    fn parse(html: &str, policy: ListPolicy) -> Vec<Block> {
        let resolver = StyleResolver::default();
        BlockParser::new(&resolver, 680.0).with_policy(policy).parse(html)
    }

    fn kinds(blocks: &[Block]) -> Vec<BlockKind> {
        blocks.iter().map(Block::kind).collect()
    }

    #[test]
    fn classifies_top_level_elements() {
        let blocks = parse(
            "<h1>T</h1><p>text</p><p><img src=\"a.png\" width=\"10\" height=\"20\"></p>\
             <table><tr><td>x</td></tr></table><ul><li>a</li></ul><blockquote>q</blockquote>",
            ListPolicy::WholeList,
        );
        assert_eq!(
            kinds(&blocks),
            vec![
                BlockKind::Heading,
                BlockKind::Paragraph,
                BlockKind::Image,
                BlockKind::Table,
                BlockKind::List,
                BlockKind::Paragraph,
            ]
        );
        let ids: Vec<usize> = blocks.iter().map(|b| b.id.0).collect();
        assert_eq!(ids, vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn unwraps_single_container() {
        let blocks = parse(
            "<div><section><h2>A</h2><p>b</p></section></div>",
            ListPolicy::WholeList,
        );
        assert_eq!(kinds(&blocks), vec![BlockKind::Heading, BlockKind::Paragraph]);
    }

    #[test]
    fn keeps_container_among_siblings() {
        let blocks = parse("<div><p>a</p></div><p>b</p>", ListPolicy::WholeList);
        assert_eq!(blocks.len(), 2);
        assert!(blocks[0].html.starts_with("<div>"));
    }

    #[test]
    fn drops_empty_paragraphs() {
        let blocks = parse("<p>  </p><p><br></p><p>x</p>", ListPolicy::WholeList);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].id, BlockId(0));
    }

    #[test]
    fn h4_is_a_paragraph() {
        let blocks = parse("<h4>small</h4>", ListPolicy::WholeList);
        assert_eq!(kinds(&blocks), vec![BlockKind::Paragraph]);
    }

    #[test]
    fn heading_level_is_recorded() {
        let blocks = parse("<h3>x</h3>", ListPolicy::WholeList);
        assert!(matches!(blocks[0].content, BlockContent::Heading { level: 3, .. }));
    }

    #[test]
    fn whole_list_keeps_items_together() {
        let blocks = parse("<ol><li>a</li><li>b</li></ol>", ListPolicy::WholeList);
        match &blocks[0].content {
            BlockContent::List { ordered, items } => {
                assert!(*ordered);
                assert_eq!(items.len(), 2);
                assert_eq!(items[1].inline[0].text, "b");
            }
            other => panic!("expected list, got {other:?}"),
        }
    }

    #[test]
    fn per_item_numbers_follow_start() {
        let blocks = parse(
            r#"<ol start="4"><li>a</li><li>  </li><li>b</li></ol>"#,
            ListPolicy::PerItem,
        );
        assert_eq!(blocks.len(), 2);
        assert!(matches!(blocks[1].content, BlockContent::ListItem { number: 5, .. }));
        assert!(blocks[1].html.starts_with(r#"<ol start="5">"#));
    }

    #[test]
    fn block_html_reparses_to_same_kind() {
        let html = "<h2>t</h2><p>p</p><img src=\"x.png\" width=\"1\" height=\"1\">\
                    <table><tr><th>h</th></tr></table><ul><li>i</li></ul>";
        for policy in [ListPolicy::WholeList, ListPolicy::PerItem] {
            for block in parse(html, policy) {
                let again = parse(&block.html, policy);
                assert_eq!(again.len(), 1, "{}", block.html);
                assert_eq!(again[0].kind(), block.kind());
            }
        }
    }

    #[test]
    fn table_header_rows() {
        let blocks = parse(
            "<table><thead><tr><td>h</td></tr></thead><tbody><tr><th>a</th><td colspan=\"2\">b</td></tr></tbody></table>",
            ListPolicy::WholeList,
        );
        let BlockContent::Table(meta) = &blocks[0].content else {
            panic!("expected table");
        };
        assert!(meta.rows[0].is_header);
        assert!(!meta.rows[1].is_header);
        assert!(meta.rows[1].cells[0].is_header);
        assert_eq!(meta.rows[1].cells[1].col_span, 2);
        assert_eq!(meta.column_count(), 3);
    }

    #[test]
    fn bare_text_becomes_paragraph() {
        let blocks = parse("loose text", ListPolicy::WholeList);
        assert_eq!(blocks[0].html, "<p>loose text</p>");
    }

    #[test]
    fn image_meta_uses_declared_size() {
        let blocks = parse(r#"<img src="nope.png" width="320" height="200">"#, ListPolicy::WholeList);
        let BlockContent::Image(meta) = &blocks[0].content else {
            panic!("expected image");
        };
        assert_eq!((meta.width, meta.height), (320.0, 200.0));
    }
}
