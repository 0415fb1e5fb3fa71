//! Splitting blocks that do not fit into a part that does and a remainder.
//!
//! Every splitter grows the first part one child at a time, re-measuring
//! after each addition, and rolls back the child that overflows. The first
//! part is never empty: when nothing fits the splitter returns `None`.
//! Cutting inside a child (a run of words, an inline element, a single list
//! item) happens only when the caller passes `cut_inside`: on a fresh page,
//! or for a block taller than a whole page, where moving on would not help.

use super::page_break::fits;
use crate::dom::{Element, Node};
use crate::error::Result;
use crate::measure::{LayoutBackend, WorkspaceGuard};
use crate::parser::list_start;

/// A block cut in two. `rest` is None when everything fit after all.
#[derive(Debug, Clone)]
pub struct Split {
    pub first: Element,
    pub rest: Option<Element>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Splitter {
    /// Child-by-child, for paragraphs, headings and other flow content.
    Generic,
    /// Item-by-item, keeping ordered numbering continuous.
    List,
    /// Row-by-row, repeating header rows on the remainder.
    Table,
}

impl Splitter {
    pub fn split<B: LayoutBackend>(
        self,
        ws: &mut WorkspaceGuard<'_, B>,
        element: &Element,
        budget: f64,
        cut_inside: bool,
    ) -> Result<Option<Split>> {
        match self {
            Splitter::Generic => split_generic(ws, element, budget, cut_inside),
            Splitter::List => split_list(ws, element, budget, cut_inside),
            Splitter::Table => split_table(ws, element, budget),
        }
    }
}

/// Wraps a partial element into the candidate that is actually measured.
type Frame<'f> = &'f dyn Fn(Element) -> Element;

pub fn split_generic<B: LayoutBackend>(
    ws: &mut WorkspaceGuard<'_, B>,
    element: &Element,
    budget: f64,
    cut_inside: bool,
) -> Result<Option<Split>> {
    split_children(ws, element, &|e| e, budget, cut_inside)
}

fn split_children<B: LayoutBackend>(
    ws: &mut WorkspaceGuard<'_, B>,
    element: &Element,
    frame: Frame<'_>,
    budget: f64,
    cut_inside: bool,
) -> Result<Option<Split>> {
    let mut first = element.shallow_clone();

    for (i, child) in element.children.iter().enumerate() {
        first.push(child.clone());
        if fits(ws.measure(&frame(first.clone()))?, budget) {
            continue;
        }
        first.children.pop();

        let mut cut = None;
        if cut_inside && !first.has_visible_content() {
            cut = cut_child(ws, &first, child, frame, budget)?;
        }

        let mut rest = element.shallow_clone();
        match cut {
            Some((head, tail)) => {
                first.push(head);
                rest.push(tail);
            }
            None if !first.has_visible_content() => return Ok(None),
            None => rest.push(child.clone()),
        }
        rest.children.extend(element.children[i + 1..].iter().cloned());
        return Ok(Some(Split {
            first,
            rest: Some(rest),
        }));
    }

    Ok(Some(Split { first, rest: None }))
}

/// Cut the overflowing `child` of `prefix` in two.
fn cut_child<B: LayoutBackend>(
    ws: &mut WorkspaceGuard<'_, B>,
    prefix: &Element,
    child: &Node,
    frame: Frame<'_>,
    budget: f64,
) -> Result<Option<(Node, Node)>> {
    let inner = |partial: Node| {
        let mut parent = prefix.clone();
        parent.push(partial);
        frame(parent)
    };

    match child {
        Node::Text { text } => {
            let cut = split_text(ws, text, &|head| inner(Node::Text { text: head }), budget)?;
            Ok(cut.map(|(head, tail)| (Node::Text { text: head }, Node::Text { text: tail })))
        }
        Node::Element(el) if !is_atomic(el) => {
            let split = split_children(ws, el, &|partial| inner(Node::Element(partial)), budget, true)?;
            Ok(split.and_then(|s| {
                s.rest
                    .map(|rest| (Node::Element(s.first), Node::Element(rest)))
            }))
        }
        Node::Element(_) => Ok(None),
    }
}

/// Longest run of leading words that fits, and the rest of the text.
fn split_text<B: LayoutBackend>(
    ws: &mut WorkspaceGuard<'_, B>,
    text: &str,
    frame: &dyn Fn(String) -> Element,
    budget: f64,
) -> Result<Option<(String, String)>> {
    // Byte offsets where a word starts after whitespace.
    let cuts: Vec<usize> = text
        .char_indices()
        .zip(text.chars().skip(1))
        .filter(|((_, prev), next)| prev.is_whitespace() && !next.is_whitespace())
        .map(|((i, prev), _)| i + prev.len_utf8())
        .collect();

    // Cut counts in lo..hi are undecided; `best` is the largest known fit.
    let (mut lo, mut hi) = (0, cuts.len());
    let mut best = None;
    while lo < hi {
        let mid = (lo + hi) / 2;
        let head = text[..cuts[mid]].trim_end().to_string();
        if !head.trim().is_empty() && fits(ws.measure(&frame(head))?, budget) {
            best = Some(cuts[mid]);
            lo = mid + 1;
        } else {
            hi = mid;
        }
    }

    Ok(best.map(|at| (text[..at].trim_end().to_string(), text[at..].to_string())))
}

fn is_atomic(el: &Element) -> bool {
    matches!(
        el.tag.as_str(),
        "img" | "hr" | "br" | "svg" | "video" | "canvas" | "table" | "iframe"
    )
}

pub fn split_list<B: LayoutBackend>(
    ws: &mut WorkspaceGuard<'_, B>,
    list: &Element,
    budget: f64,
    cut_inside: bool,
) -> Result<Option<Split>> {
    let ordered = list.is("ol");
    let start = list_start(list);
    let mut first = list.shallow_clone();
    let mut placed = 0usize;

    for (i, child) in list.children.iter().enumerate() {
        let is_item = child.as_element().is_some_and(|e| e.is("li"));
        first.push(child.clone());
        if !is_item || fits(ws.measure(&first)?, budget) {
            placed += usize::from(is_item);
            continue;
        }
        first.children.pop();

        let mut rest = list.shallow_clone();
        if placed == 0 {
            // A single item taller than the space: cut inside it.
            let (true, Node::Element(li)) = (cut_inside, child) else {
                return Ok(None);
            };
            let Some(Split {
                first: head,
                rest: Some(mut tail),
            }) = split_children(
                ws,
                li,
                &|partial| {
                    let mut l = first.clone();
                    l.push(Node::Element(partial));
                    l
                },
                budget,
                true,
            )?
            else {
                return Ok(None);
            };
            first.push(Node::Element(head));
            // The tail continues the same item, so it gets no marker.
            tail.set_style_property("list-style-type", "none");
            rest.push(Node::Element(tail));
            if ordered {
                rest.set_attr("start", &start.to_string());
            }
        } else {
            rest.push(child.clone());
            if ordered {
                rest.set_attr("start", &(start + placed).to_string());
            }
        }
        rest.children.extend(list.children[i + 1..].iter().cloned());
        return Ok(Some(Split {
            first,
            rest: Some(rest),
        }));
    }

    Ok(Some(Split { first, rest: None }))
}

/// A body row and the `tbody` it came from (`None` for bare rows).
type BodyRow<'t> = (Option<&'t Element>, &'t Element);

/// A table taken apart into the pieces the splitter reassembles.
struct TableParts<'t> {
    table: &'t Element,
    caption: Option<&'t Element>,
    head_group: Option<&'t Element>,
    head: Vec<&'t Element>,
    body: Vec<BodyRow<'t>>,
    foot_group: Option<&'t Element>,
    foot: Vec<&'t Element>,
}

impl<'t> TableParts<'t> {
    fn of(table: &'t Element) -> Self {
        let mut parts = TableParts {
            table,
            caption: None,
            head_group: None,
            head: Vec::new(),
            body: Vec::new(),
            foot_group: None,
            foot: Vec::new(),
        };
        for child in table.child_elements() {
            match child.tag.as_str() {
                "caption" => parts.caption = Some(child),
                "thead" => {
                    parts.head_group = Some(child);
                    parts.head.extend(rows_of(child));
                }
                "tbody" => parts.body.extend(rows_of(child).map(|r| (Some(child), r))),
                "tfoot" => {
                    parts.foot_group = Some(child);
                    parts.foot.extend(rows_of(child));
                }
                "tr" => parts.body.push((None, child)),
                _ => {}
            }
        }

        // Without a thead, leading all-th rows act as the header.
        if parts.head.is_empty() {
            let leading = parts.body.iter().take_while(|(_, r)| is_header_row(r)).count();
            if leading < parts.body.len() {
                parts.head = parts.body.drain(..leading).map(|(_, r)| r).collect();
            }
        }
        parts
    }

    /// Rebuild a table from `rows`. Consecutive rows of one `tbody` share a
    /// copy of it; the footer goes only on the last fragment.
    fn assemble(&self, with_caption: bool, rows: &[BodyRow<'t>], with_foot: bool) -> Element {
        let mut table = self.table.shallow_clone();
        if let (true, Some(caption)) = (with_caption, self.caption) {
            table.push(Node::Element(caption.clone()));
        }
        if !self.head.is_empty() {
            table.push(Node::Element(group("thead", self.head_group, &self.head)));
        }

        let mut start = 0;
        while start < rows.len() {
            let source = rows[start].0;
            let len = rows[start..]
                .iter()
                .take_while(|(g, _)| same_group(*g, source))
                .count();
            let run: Vec<&Element> = rows[start..start + len].iter().map(|(_, r)| *r).collect();
            table.push(Node::Element(group("tbody", source, &run)));
            start += len;
        }

        if with_foot && !self.foot.is_empty() {
            table.push(Node::Element(group("tfoot", self.foot_group, &self.foot)));
        }
        table
    }
}

fn rows_of(group: &Element) -> impl Iterator<Item = &Element> {
    group.child_elements().filter(|r| r.is("tr"))
}

fn group(tag: &str, source: Option<&Element>, rows: &[&Element]) -> Element {
    let mut el = source
        .map(Element::shallow_clone)
        .unwrap_or_else(|| Element::new(tag));
    el.children = rows.iter().map(|r| Node::Element((*r).clone())).collect();
    el
}

fn same_group(a: Option<&Element>, b: Option<&Element>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => std::ptr::eq(a, b),
        (None, None) => true,
        _ => false,
    }
}

fn is_header_row(tr: &Element) -> bool {
    let mut cells = tr.child_elements().filter(|c| c.is("td") || c.is("th")).peekable();
    cells.peek().is_some() && cells.all(|c| c.is("th"))
}

pub fn split_table<B: LayoutBackend>(
    ws: &mut WorkspaceGuard<'_, B>,
    table: &Element,
    budget: f64,
) -> Result<Option<Split>> {
    let parts = TableParts::of(table);
    let total = parts.body.len();
    let mut placed = 0;
    while placed < total {
        let candidate = parts.assemble(true, &parts.body[..placed + 1], placed + 1 == total);
        if !fits(ws.measure(&candidate)?, budget) {
            break;
        }
        placed += 1;
    }

    if placed == 0 {
        return Ok(None);
    }
    let first = parts.assemble(true, &parts.body[..placed], placed == total);
    let rest = (placed < total).then(|| parts.assemble(false, &parts.body[placed..], true));
    Ok(Some(Split { first, rest }))
}
