//! # Layout & Style Extraction
//!
//! Reads computed style back off elements as they render inside the page
//! content container, and flattens inline content into styled text runs.
//! Exporters consume these models instead of re-deriving CSS.

use crate::dom::{Element, Node};
use crate::measure::native::page_container;
use crate::model::{InlineRun, LayoutModel};
use crate::style::{Display, ResolvedStyle, StyleResolver, TextDecoration};

/// Layout model from a computed style.
pub fn extract_layout(style: &ResolvedStyle) -> LayoutModel {
    LayoutModel {
        font_size: style.font_size,
        line_height: style.line_height_px(),
        font_family: style.font_family.clone(),
        font_weight: style.font_weight,
        font_style: style.font_style,
        text_align: style.text_align,
        margin: style.margin,
        padding: style.padding,
        color: style.color.clone(),
        background_color: style.background_color.clone(),
    }
}

/// Styling accumulated while walking down inline content.
#[derive(Debug, Clone)]
struct InlineContext {
    bold: bool,
    italic: bool,
    underline: bool,
    color: Option<String>,
    highlight: Option<String>,
    font_size: f64,
    font_family: String,
}

impl InlineContext {
    fn descend(&self, element: &Element, style: &ResolvedStyle) -> Self {
        Self {
            bold: self.bold || is_bold_tag(element) || style.is_bold(),
            italic: self.italic || is_italic_tag(element) || style.is_italic(),
            underline: self.underline
                || element.is("u")
                || style.text_decoration == TextDecoration::Underline,
            color: style.color.clone().or_else(|| self.color.clone()),
            highlight: style
                .background_color
                .clone()
                .or_else(|| self.highlight.clone()),
            font_size: style.font_size,
            font_family: style.font_family.clone(),
        }
    }
}

fn is_bold_tag(el: &Element) -> bool {
    el.is("b") || el.is("strong")
}

fn is_italic_tag(el: &Element) -> bool {
    el.is("i") || el.is("em")
}

/// Resolves styles in page context for the block parser.
pub struct StyleExtractor<'a> {
    resolver: &'a StyleResolver,
    container: Element,
    root: ResolvedStyle,
    content_width: f64,
}

impl<'a> StyleExtractor<'a> {
    pub fn new(resolver: &'a StyleResolver, content_width: f64) -> Self {
        let container = page_container();
        let mut root = resolver.resolve(&container, &[], None, content_width);
        root.margin = Default::default();
        root.padding = Default::default();
        Self {
            resolver,
            container,
            root,
            content_width,
        }
    }

    /// The page content container's style.
    pub fn root(&self) -> &ResolvedStyle {
        &self.root
    }

    /// Computed style of a top-level element.
    pub fn top_level_style(&self, element: &Element) -> ResolvedStyle {
        self.resolver.resolve(
            element,
            &[&self.container],
            Some(&self.root),
            self.content_width,
        )
    }

    /// Computed style of `element` below `ancestors` (outermost first, page
    /// container excluded).
    pub fn style_of(
        &self,
        element: &Element,
        ancestors: &[&Element],
        parent: &ResolvedStyle,
    ) -> ResolvedStyle {
        let mut chain = vec![&self.container];
        chain.extend_from_slice(ancestors);
        self.resolver
            .resolve(element, &chain, Some(parent), self.content_width)
    }

    /// Flatten the inline content of `element` into runs. `style` is the
    /// element's own computed style; `ancestors` as for [`style_of`](Self::style_of).
    pub fn inline_runs(
        &self,
        element: &Element,
        ancestors: &[&Element],
        style: &ResolvedStyle,
    ) -> Vec<InlineRun> {
        let ctx = InlineContext {
            bold: false,
            italic: false,
            underline: false,
            color: None,
            highlight: None,
            font_size: style.font_size,
            font_family: style.font_family.clone(),
        }
        .descend(element, style);
        // A block's own background is layout, not a highlight.
        let ctx = InlineContext {
            highlight: None,
            ..ctx
        };

        let mut chain = ancestors.to_vec();
        chain.push(element);
        let mut runs = Vec::new();
        for child in &element.children {
            self.walk(child, &chain, style, &ctx, &mut runs);
        }
        runs
    }

    fn walk(
        &self,
        node: &Node,
        chain: &[&Element],
        parent: &ResolvedStyle,
        ctx: &InlineContext,
        runs: &mut Vec<InlineRun>,
    ) {
        match node {
            Node::Text { text } => {
                if text.trim().is_empty() {
                    return;
                }
                let text = if parent.white_space.preserves_newlines() {
                    text.clone()
                } else {
                    collapse_whitespace(text)
                };
                runs.push(InlineRun {
                    text,
                    bold: ctx.bold,
                    italic: ctx.italic,
                    underline: ctx.underline,
                    color: ctx.color.clone(),
                    highlight: ctx.highlight.clone(),
                    font_size: Some(ctx.font_size),
                    font_family: Some(ctx.font_family.clone()),
                });
            }
            Node::Element(e) => {
                let style = self.style_of(e, chain, parent);
                if style.display == Display::None {
                    return;
                }
                let inner = ctx.descend(e, &style);
                let mut next = chain.to_vec();
                next.push(e);
                for child in &e.children {
                    self.walk(child, &next, &style, &inner, runs);
                }
            }
        }
    }
}

/// Collapse whitespace runs to single spaces, keeping one at either end.
fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_space = false;
    for ch in text.chars() {
        if ch.is_whitespace() && ch != '\u{a0}' {
            if !in_space {
                out.push(' ');
            }
            in_space = true;
        } else {
            out.push(ch);
            in_space = false;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::parse_element;
    use crate::style::Stylesheet;

    fn runs_of(html: &str, css: &str) -> Vec<InlineRun> {
        let resolver = StyleResolver::new(Stylesheet::parse(css));
        let extractor = StyleExtractor::new(&resolver, 680.0);
        let el = parse_element(html).unwrap();
        let style = extractor.top_level_style(&el);
        extractor.inline_runs(&el, &[], &style)
    }

    #[test]
    fn one_run_per_text_node() {
        let runs = runs_of("<p>Hello <b>bold</b> world</p>", "");
        let texts: Vec<&str> = runs.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(texts, vec!["Hello ", "bold", " world"]);
        assert!(!runs[0].bold);
        assert!(runs[1].bold);
    }

    #[test]
    fn formatting_is_inherited() {
        let runs = runs_of("<p><em>a <span>b</span></em></p>", "");
        assert!(runs.iter().all(|r| r.italic));
    }

    #[test]
    fn css_weight_and_decoration_count() {
        let runs = runs_of(
            r#"<p><span class="heavy">x</span><span style="text-decoration: underline">y</span></p>"#,
            ".heavy { font-weight: 700 }",
        );
        assert!(runs[0].bold && !runs[0].underline);
        assert!(runs[1].underline && !runs[1].bold);
    }

    #[test]
    fn headings_are_bold() {
        let runs = runs_of("<h1>Title</h1>", "");
        assert!(runs[0].bold);
        assert_eq!(runs[0].font_size, Some(32.0));
    }

    #[test]
    fn whitespace_only_nodes_are_dropped() {
        let runs = runs_of("<p><b>a</b>   \n  <i>b</i></p>", "");
        assert_eq!(runs.len(), 2);
    }

    #[test]
    fn color_and_highlight() {
        let runs = runs_of(
            r#"<p style="color: #333"><mark>hi</mark> <span style="color: red">there</span></p>"#,
            "",
        );
        assert_eq!(runs[0].color.as_deref(), Some("#333"));
        assert_eq!(runs[0].highlight.as_deref(), Some("yellow"));
        assert_eq!(runs[1].color.as_deref(), Some("red"));
        assert_eq!(runs[1].highlight, None);
    }

    #[test]
    fn layout_model_reads_computed_values() {
        let resolver = StyleResolver::default();
        let extractor = StyleExtractor::new(&resolver, 680.0);
        let el = parse_element(r#"<p style="text-align: center; line-height: 2">x</p>"#).unwrap();
        let layout = extract_layout(&extractor.top_level_style(&el));
        assert_eq!(layout.margin.top, 16.0);
        assert_eq!(layout.line_height, 32.0);
        assert_eq!(layout.text_align, crate::style::TextAlign::Center);
    }
}
