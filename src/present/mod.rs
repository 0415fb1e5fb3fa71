//! # Presentation
//!
//! Turns pagination output into visible page frames, and tracks which
//! pagination run a preview is showing.
//!
//! Runs are identified by [`RunTicket`]s. A run that finishes after a newer
//! one was started is stale: its output is discarded rather than rendered.

use crate::dom::escape_text;
use crate::error::{FolioError, Result};
use crate::model::{PageConfig, PaginationResult};
use crate::style::Stylesheet;

/// Styles for the page frames themselves.
const PAGE_FRAME_CSS: &str = r#"
.folio-pages { display: flex; flex-direction: column; align-items: center; gap: 24px; padding: 24px 0; background: #e5e5e5; }
.page { background: #fff; box-shadow: 0 1px 4px rgba(0, 0, 0, 0.2); box-sizing: border-box; overflow: hidden; }
.page-content { width: 100%; height: 100%; }
.image-placeholder { color: #888; font-style: italic; }
@media print {
  .folio-pages { display: block; padding: 0; gap: 0; background: none; }
  .page { box-shadow: none; page-break-after: always; break-after: page; }
}
"#;

/// Renders pages with the same stylesheet used for measuring.
#[derive(Debug, Clone)]
pub struct Presenter {
    stylesheet: Stylesheet,
    page: PageConfig,
    rendered: Vec<String>,
}

impl Presenter {
    pub fn new(stylesheet: Stylesheet, page: PageConfig) -> Self {
        Self {
            stylesheet,
            page,
            rendered: Vec::new(),
        }
    }

    /// Replace everything currently shown with one frame per page.
    pub fn present(&mut self, result: &PaginationResult) -> &[String] {
        self.rendered = result
            .dom_pages
            .iter()
            .map(|dom| self.page_frame(dom.page_index, &dom.to_html()))
            .collect();
        log::debug!("presenting {} page(s)", self.rendered.len());
        &self.rendered
    }

    pub fn clear(&mut self) {
        self.rendered.clear();
    }

    pub fn rendered(&self) -> &[String] {
        &self.rendered
    }

    /// A standalone HTML document showing the current pages.
    pub fn document(&self, title: &str) -> String {
        let mut out = String::new();
        out.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
        out.push_str(&format!("<title>{}</title>\n", escape_text(title)));
        out.push_str(&format!(
            "<style>\n@page {{ size: {}px {}px; margin: 0; }}\n{}\n{}</style>\n",
            self.page.page_width,
            self.page.page_height,
            self.stylesheet.source(),
            PAGE_FRAME_CSS
        ));
        out.push_str("</head>\n<body>\n<div class=\"folio-pages\">\n");
        for frame in &self.rendered {
            out.push_str(frame);
            out.push('\n');
        }
        out.push_str("</div>\n</body>\n</html>\n");
        out
    }

    fn page_frame(&self, index: usize, content_html: &str) -> String {
        let margin = self.page.margin();
        format!(
            "<section class=\"page\" data-page=\"{}\" style=\"width: {}px; height: {}px; padding: {}px {}px {}px {}px\">{}</section>",
            index + 1,
            self.page.page_width,
            self.page.page_height,
            margin.top,
            margin.right,
            margin.bottom,
            margin.left,
            content_html
        )
    }
}

/// Identifies one pagination run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RunTicket(u64);

impl RunTicket {
    pub fn id(&self) -> u64 {
        self.0
    }
}

/// What the preview shows.
#[derive(Debug, Clone, PartialEq)]
pub enum PreviewState {
    Idle,
    Loading,
    Ready { pages: usize },
    Failed(String),
}

/// A preview that is re-paginated whenever its input changes.
#[derive(Debug, Clone)]
pub struct PreviewSession {
    presenter: Presenter,
    latest: u64,
    state: PreviewState,
}

impl PreviewSession {
    pub fn new(presenter: Presenter) -> Self {
        Self {
            presenter,
            latest: 0,
            state: PreviewState::Idle,
        }
    }

    /// Start a run. Any run begun earlier becomes stale.
    pub fn begin(&mut self) -> RunTicket {
        self.latest += 1;
        self.state = PreviewState::Loading;
        RunTicket(self.latest)
    }

    pub fn is_current(&self, ticket: RunTicket) -> bool {
        ticket.0 == self.latest
    }

    /// Deliver the outcome of a run. Stale outcomes are rejected and leave
    /// the preview untouched.
    pub fn finish(&mut self, ticket: RunTicket, outcome: Result<PaginationResult>) -> Result<()> {
        if !self.is_current(ticket) {
            log::debug!(
                "discarding output of run {} (latest is {})",
                ticket.0,
                self.latest
            );
            return Err(FolioError::Superseded {
                ticket: ticket.0,
                latest: self.latest,
            });
        }

        match outcome {
            Ok(result) => {
                let pages = self.presenter.present(&result).len();
                self.state = PreviewState::Ready { pages };
            }
            Err(e) => {
                log::error!("pagination failed: {}", e);
                self.presenter.clear();
                self.state = PreviewState::Failed(e.to_string());
            }
        }
        Ok(())
    }

    pub fn state(&self) -> &PreviewState {
        &self.state
    }

    pub fn pages(&self) -> &[String] {
        self.presenter.rendered()
    }

    pub fn presenter(&self) -> &Presenter {
        &self.presenter
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{Element, Node};
    use crate::model::{DomPage, PageLayout};

    fn one_page(text: &str) -> PaginationResult {
        let content = Element::new("div")
            .with_attr("class", "page-content")
            .with_children(vec![Node::Element(
                Element::new("p").with_children(vec![Node::text(text)]),
            )]);
        PaginationResult {
            pages: vec![PageLayout::new(0)],
            dom_pages: vec![DomPage {
                page_index: 0,
                content,
            }],
        }
    }

    fn session() -> PreviewSession {
        PreviewSession::new(Presenter::new(
            Stylesheet::parse("p { color: red }"),
            PageConfig::a4(),
        ))
    }

    #[test]
    fn frames_are_page_sized() {
        let mut presenter = Presenter::new(Stylesheet::empty(), PageConfig::a4());
        let frames = presenter.present(&one_page("hello"));
        assert_eq!(frames.len(), 1);
        assert!(frames[0].contains("width: 794px; height: 1123px"));
        assert!(frames[0].contains("<p>hello</p>"));
    }

    #[test]
    fn document_includes_stylesheet() {
        let mut s = session();
        let ticket = s.begin();
        s.finish(ticket, Ok(one_page("x"))).unwrap();
        let doc = s.presenter().document("Notes & more");
        assert!(doc.contains("p { color: red }"));
        assert!(doc.contains("<title>Notes &amp; more</title>"));
    }

    #[test]
    fn stale_runs_are_discarded() {
        let mut s = session();
        let old = s.begin();
        let new = s.begin();
        assert!(!s.is_current(old));

        let err = s.finish(old, Ok(one_page("old"))).unwrap_err();
        assert!(matches!(err, FolioError::Superseded { ticket: 1, latest: 2 }));
        assert_eq!(s.state(), &PreviewState::Loading);
        assert!(s.pages().is_empty());

        s.finish(new, Ok(one_page("new"))).unwrap();
        assert_eq!(s.state(), &PreviewState::Ready { pages: 1 });
        assert!(s.pages()[0].contains("new"));
    }

    #[test]
    fn failure_clears_preview() {
        let mut s = session();
        let t = s.begin();
        s.finish(t, Ok(one_page("x"))).unwrap();
        let t = s.begin();
        s.finish(
            t,
            Err(FolioError::WorkspaceUnavailable("gone".to_string())),
        )
        .unwrap();
        assert!(matches!(s.state(), PreviewState::Failed(_)));
        assert!(s.pages().is_empty());
    }
}
