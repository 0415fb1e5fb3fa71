//! # Pagination Engine
//!
//! Flows blocks into fixed-height pages. This is the heart of Folio.
//!
//! Every block is measured in the workspace at page width before it is
//! committed. A block that fits is placed; one that does not is moved to a
//! new page or split, depending on its kind:
//!
//! - **Lists and tables** split as soon as they overflow. Ordered lists
//!   keep their numbering; tables repeat their header rows.
//! - **Paragraphs, headings and list items** move whole to the next page,
//!   and are only split when taller than a full page.
//! - **Images** never split. Oversized ones are scaled down, broken ones
//!   become a small placeholder.
//!
//! Headings are kept with what follows them, empty leading and trailing
//! pages are dropped, and a list that carries on from the previous page is
//! tagged as a continuation.

pub mod page_break;
pub mod split;

use serde::{Deserialize, Serialize};

use self::page_break::{decide_break, fits, heading_would_strand, BreakDecision, SplitPolicy};
use self::split::{Split, Splitter};
use crate::dom::{Element, Node};
use crate::error::{FolioError, Result};
use crate::measure::native::page_container;
use crate::measure::{LayoutBackend, MeasurementWorkspace, WorkspaceGuard};
use crate::model::{
    Block, BlockKind, DomPage, Fragment, PageEntry, PageLayout, PaginationResult,
};

/// Class added to a list that continues one from the previous page.
pub const CONTINUATION_CLASS: &str = "list-continuation";

/// Tunables of the pagination rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PaginationRules {
    /// Space a heading must leave below itself, in px.
    pub heading_trailing_allowance: f64,
    /// Largest share of the page height an image may take.
    pub image_page_fraction: f64,
    /// Height of the stand-in for a broken image, in px.
    pub placeholder_height: f64,
    pub placeholder_text: String,
}

impl Default for PaginationRules {
    fn default() -> Self {
        Self {
            heading_trailing_allowance: 48.0,
            image_page_fraction: 0.9,
            placeholder_height: 24.0,
            placeholder_text: "Image unavailable".to_string(),
        }
    }
}

/// The page being filled.
struct PageCursor {
    index: usize,
    used: f64,
    layout: PageLayout,
    content: Element,
}

impl PageCursor {
    fn new(index: usize) -> Self {
        Self {
            index,
            used: 0.0,
            layout: PageLayout::new(index),
            content: page_container(),
        }
    }

    fn is_empty(&self) -> bool {
        self.layout.entries.is_empty()
    }

    fn finalize(self) -> (PageLayout, DomPage) {
        let dom = DomPage {
            page_index: self.index,
            content: self.content,
        };
        (self.layout, dom)
    }
}

/// Finished pages plus the cursor.
struct PageFlow {
    page_height: f64,
    cursor: PageCursor,
    done: Vec<(PageLayout, DomPage)>,
}

impl PageFlow {
    fn new(page_height: f64) -> Self {
        Self {
            page_height,
            cursor: PageCursor::new(0),
            done: Vec::new(),
        }
    }

    fn remaining(&self) -> f64 {
        (self.page_height - self.cursor.used).max(0.0)
    }

    fn decide(&self, height: f64, policy: SplitPolicy) -> BreakDecision {
        decide_break(
            height,
            self.remaining(),
            self.page_height,
            self.cursor.is_empty(),
            policy,
        )
    }

    fn place(&mut self, block: &Block, fragment: Fragment, element: Element, height: f64) {
        let entry = PageEntry {
            block_id: block.id,
            kind: block.kind(),
            fragment,
            html: element.to_html(),
            height,
            continuation: false,
        };
        log::trace!(
            "page {}: block {} ({:?}) {:.1}px",
            self.cursor.index,
            block.id.0,
            fragment,
            height
        );
        self.cursor.used += height;
        self.cursor.layout.entries.push(entry);
        self.cursor.content.push(Node::Element(element));
    }

    fn new_page(&mut self) {
        let next = PageCursor::new(self.cursor.index + 1);
        let finished = std::mem::replace(&mut self.cursor, next);
        self.done.push(finished.finalize());
    }

    fn finish(mut self) -> PaginationResult {
        self.done.push(self.cursor.finalize());
        let (pages, dom_pages) = self.done.into_iter().unzip();
        PaginationResult { pages, dom_pages }
    }
}

fn fragment_for(part: usize, last: bool) -> Fragment {
    match (part, last) {
        (0, true) => Fragment::Whole,
        (0, false) => Fragment::Head,
        (_, true) => Fragment::Tail,
        (_, false) => Fragment::Middle,
    }
}

#[derive(Debug, Clone, Default)]
pub struct PaginationEngine {
    rules: PaginationRules,
}

impl PaginationEngine {
    pub fn new(rules: PaginationRules) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &PaginationRules {
        &self.rules
    }

    /// Paginate `blocks` into pages `page_content_height` px tall.
    ///
    /// The workspace is cleared again when this returns, on success and on
    /// error alike.
    pub fn paginate<B: LayoutBackend>(
        &self,
        blocks: &[Block],
        page_content_height: f64,
        workspace: &mut MeasurementWorkspace<B>,
    ) -> Result<PaginationResult> {
        if !(page_content_height > 0.0) {
            return Err(FolioError::MissingContainer(format!(
                "page content area has no usable height ({})",
                page_content_height
            )));
        }
        let mut ws = workspace.acquire()?;
        ws.prepare(blocks);

        let mut flow = PageFlow::new(page_content_height);
        for (i, block) in blocks.iter().enumerate() {
            let height = ws.measure(block.element())?;

            if block.is_heading() {
                let keeps_with_next = blocks.get(i + 1).is_some_and(|next| !next.is_image());
                if keeps_with_next
                    && heading_would_strand(
                        height,
                        flow.remaining(),
                        self.rules.heading_trailing_allowance,
                        flow.cursor.is_empty(),
                    )
                {
                    log::debug!("moving heading {} to the next page", block.id.0);
                    flow.new_page();
                }
            }

            match block.kind() {
                BlockKind::Image => self.place_image(&mut ws, &mut flow, block, height)?,
                BlockKind::List => self.place_flowing(
                    &mut ws,
                    &mut flow,
                    block,
                    height,
                    Splitter::List,
                    SplitPolicy::WhenOverflowing,
                )?,
                BlockKind::Table => self.place_flowing(
                    &mut ws,
                    &mut flow,
                    block,
                    height,
                    Splitter::Table,
                    SplitPolicy::WhenOverflowing,
                )?,
                BlockKind::Heading | BlockKind::Paragraph | BlockKind::ListItem => self
                    .place_flowing(
                        &mut ws,
                        &mut flow,
                        block,
                        height,
                        Splitter::Generic,
                        SplitPolicy::WhenTallerThanPage,
                    )?,
            }
        }
        drop(ws);

        let mut result = flow.finish();
        trim_empty_pages(&mut result);
        mark_list_continuations(&mut result);
        log::info!(
            "paginated {} block(s) into {} page(s)",
            blocks.len(),
            result.page_count()
        );
        Ok(result)
    }

    fn place_flowing<B: LayoutBackend>(
        &self,
        ws: &mut WorkspaceGuard<'_, B>,
        flow: &mut PageFlow,
        block: &Block,
        height: f64,
        splitter: Splitter,
        policy: SplitPolicy,
    ) -> Result<()> {
        let mut element = block.element().clone();
        let mut height = height;
        let mut part = 0;

        loop {
            match flow.decide(height, policy) {
                BreakDecision::Place => {
                    flow.place(block, fragment_for(part, true), element, height);
                    return Ok(());
                }
                BreakDecision::MoveToNextPage => {
                    flow.new_page();
                    continue;
                }
                BreakDecision::Split => {}
            }

            // Blocks taller than a page may be cut inside a child wherever they start.
            let fresh_page = flow.cursor.is_empty();
            let cut_inside = fresh_page
                || (policy == SplitPolicy::WhenTallerThanPage && !fits(height, flow.page_height));
            match splitter.split(ws, &element, flow.remaining(), cut_inside)? {
                Some(Split {
                    first,
                    rest: Some(rest),
                }) => {
                    let first_height = ws.measure(&first)?;
                    flow.place(block, fragment_for(part, false), first, first_height);
                    flow.new_page();
                    height = ws.measure(&rest)?;
                    element = rest;
                    part += 1;
                }
                Some(Split { first, rest: None }) => {
                    let first_height = ws.measure(&first)?;
                    flow.place(block, fragment_for(part, true), first, first_height);
                    return Ok(());
                }
                None if !fresh_page => flow.new_page(),
                None => {
                    log::warn!(
                        "{} block {} does not fit on an empty page and cannot be split; placing it whole",
                        block.kind().as_str(),
                        block.id.0
                    );
                    flow.place(block, fragment_for(part, true), element, height);
                    return Ok(());
                }
            }
        }
    }

    fn place_image<B: LayoutBackend>(
        &self,
        ws: &mut WorkspaceGuard<'_, B>,
        flow: &mut PageFlow,
        block: &Block,
        height: f64,
    ) -> Result<()> {
        let image_height = match block.element().find_first(&|e| e.is("img")) {
            Some(img) => ws.image_box(img)?.1,
            None => 0.0,
        };
        if image_height <= 0.0 || height <= 0.0 {
            self.place_placeholder(flow, block);
            return Ok(());
        }

        let limit = flow.page_height * self.rules.image_page_fraction;
        let decision = flow.decide(height, SplitPolicy::Never);
        if decision != BreakDecision::Place {
            flow.new_page();
        }
        let oversized = match decision {
            BreakDecision::Place => height > limit,
            _ => height > flow.page_height,
        };

        let mut element = block.element().clone();
        let mut height = height;
        if oversized {
            let (scaled, scaled_height) = self.scale_image(ws, element, height, image_height, limit)?;
            element = scaled;
            height = scaled_height;
        }
        flow.place(block, Fragment::Whole, element, height);
        Ok(())
    }

    /// Shrink the image inside `element` so the whole block fits in `limit`.
    fn scale_image<B: LayoutBackend>(
        &self,
        ws: &mut WorkspaceGuard<'_, B>,
        mut element: Element,
        block_height: f64,
        image_height: f64,
        limit: f64,
    ) -> Result<(Element, f64)> {
        let overhead = (block_height - image_height).max(0.0);
        let ratio = ((limit - overhead).max(1.0) / image_height).min(1.0);

        if let Some(img) = element.find_first_mut(&|e| e.is("img")) {
            let (w, h) = ws.image_box(img)?;
            let (w, h) = (w * ratio, h * ratio);
            img.set_attr("width", &format!("{}", w.round()));
            img.set_attr("height", &format!("{}", h.round()));
            img.set_style_property("width", &format!("{:.2}px", w));
            img.set_style_property("height", &format!("{:.2}px", h));
        }

        let scaled_height = ws.measure(&element)?;
        log::debug!(
            "scaled oversized image from {:.1}px to {:.1}px",
            block_height,
            scaled_height
        );
        Ok((element, scaled_height))
    }

    fn place_placeholder(&self, flow: &mut PageFlow, block: &Block) {
        log::warn!(
            "image block {} could not be rendered; using a placeholder",
            block.id.0
        );
        let height = self.rules.placeholder_height;
        let placeholder = Element::new("p")
            .with_attr("class", "image-placeholder")
            .with_attr("style", &format!("height: {}px; margin: 0", height))
            .with_children(vec![Node::text(&self.rules.placeholder_text)]);

        if !fits(height, flow.remaining()) && !flow.cursor.is_empty() {
            flow.new_page();
        }
        flow.place(block, Fragment::Placeholder, placeholder, height);
    }
}

/// Drop empty pages from both ends and renumber. Running it twice changes
/// nothing.
pub fn trim_empty_pages(result: &mut PaginationResult) {
    while result.dom_pages.first().is_some_and(DomPage::is_empty) {
        result.dom_pages.remove(0);
        result.pages.remove(0);
    }
    while result.dom_pages.last().is_some_and(DomPage::is_empty) {
        result.dom_pages.pop();
        result.pages.pop();
    }
    for (index, (page, dom)) in result
        .pages
        .iter_mut()
        .zip(result.dom_pages.iter_mut())
        .enumerate()
    {
        page.page_index = index;
        dom.page_index = index;
    }
}

fn is_list(el: &Element) -> bool {
    el.is("ul") || el.is("ol")
}

/// Tag a page's leading list when the previous page ended in a list of the
/// same kind.
pub fn mark_list_continuations(result: &mut PaginationResult) {
    for i in 1..result.dom_pages.len() {
        let previous_tag = result.dom_pages[i - 1]
            .content
            .child_elements()
            .last()
            .and_then(|last| last.find_last(&is_list))
            .map(|list| list.tag.clone());
        let Some(previous_tag) = previous_tag else {
            continue;
        };

        let page = &mut result.dom_pages[i];
        let Some(first) = page.content.children.iter_mut().find_map(Node::as_element_mut) else {
            continue;
        };
        match first.find_first_mut(&is_list) {
            Some(list) if list.tag == previous_tag => {
                list.add_class(CONTINUATION_CLASS);
                list.set_attr("data-continuation", "true");
            }
            _ => continue,
        }

        let html = first.to_html();
        if let Some(entry) = result.pages[i].entries.first_mut() {
            entry.continuation = true;
            entry.html = html;
        }
    }
}
