//! # Folio
//!
//! Page-native reflow of rich-text notes.
//!
//! Editors produce HTML as one endless column. Folio turns it into fixed
//! A4 pages: every block is measured at page width before it is placed,
//! and blocks that would cross the page boundary are moved or split there.
//! Content is never sliced after the fact. It flows *into* pages.
//!
//! ## Architecture
//!
//! ```text
//! HTML fragment
//!       ↓
//!   [parser]   — typed blocks (heading, paragraph, list, image, table)
//!       ↓        with layout and inline-run metadata from [extract]
//!   [layout]   — measure in the [measure] workspace, place, split
//!       ↓
//!   [present]  — page frames for preview
//!   [export]   — print document (PDF), WordprocessingML (DOCX), slides (PPTX)
//! ```

pub mod config;
pub mod dom;
pub mod error;
pub mod export;
pub mod extract;
pub mod font;
pub mod image_loader;
pub mod layout;
pub mod measure;
pub mod model;
pub mod parser;
pub mod present;
pub mod style;
pub mod text;

#[cfg(feature = "wasm")]
pub mod wasm;

use config::FolioConfig;
use error::Result;
use layout::PaginationEngine;
use measure::native::NativeBackend;
use measure::MeasurementWorkspace;
use model::{Block, PaginationResult};
use parser::{BlockParser, ListPolicy};
use style::{StyleResolver, Stylesheet};

/// A pagination session.
///
/// Holds the measurement workspace and the stylesheet, loaded once, so
/// repeated runs (a live preview re-paginating on every edit) reuse them.
/// The workspace is reset after every run.
pub struct Folio {
    config: FolioConfig,
    engine: PaginationEngine,
    workspace: MeasurementWorkspace<NativeBackend>,
}

impl Folio {
    /// Build a session, reading the stylesheet and fonts named in `config`.
    pub fn new(config: FolioConfig) -> Self {
        let stylesheet = config.load_stylesheet();
        Self::with_stylesheet(config, stylesheet)
    }

    pub fn with_stylesheet(config: FolioConfig, stylesheet: Stylesheet) -> Self {
        let backend = NativeBackend::new(
            StyleResolver::new(stylesheet),
            config.font_context(),
            config.page.content_width,
        )
        .with_image_loader(config.image_loader());
        Self {
            engine: PaginationEngine::new(config.rules.clone()),
            workspace: MeasurementWorkspace::new(backend),
            config,
        }
    }

    pub fn config(&self) -> &FolioConfig {
        &self.config
    }

    pub fn resolver(&self) -> &StyleResolver {
        self.workspace.backend().resolver()
    }

    /// Parse `html` into blocks, one per top-level element.
    pub fn parse(&self, html: &str, policy: ListPolicy) -> Vec<Block> {
        BlockParser::new(self.resolver(), self.config.page.content_width)
            .with_policy(policy)
            .with_image_loader(self.config.image_loader())
            .parse(html)
    }

    pub fn paginate(&mut self, html: &str) -> Result<PaginationResult> {
        let blocks = self.parse(html, ListPolicy::WholeList);
        self.paginate_blocks(&blocks)
    }

    pub fn paginate_blocks(&mut self, blocks: &[Block]) -> Result<PaginationResult> {
        self.engine
            .paginate(blocks, self.config.page.content_height, &mut self.workspace)
    }

    /// Tear the workspace down. Later runs fail with
    /// [`error::FolioError::WorkspaceUnavailable`].
    pub fn release(&mut self) {
        self.workspace.release();
    }

    pub fn workspace(&self) -> &MeasurementWorkspace<NativeBackend> {
        &self.workspace
    }
}

/// Parse an HTML fragment into blocks with the given base CSS.
pub fn parse_blocks(html: &str, css: &str, policy: ListPolicy) -> Vec<Block> {
    let config = FolioConfig::default();
    Folio::with_stylesheet(config, Stylesheet::parse(css)).parse(html, policy)
}

/// Paginate an HTML fragment in a one-off session.
pub fn paginate_html(html: &str, css: &str, config: &FolioConfig) -> Result<PaginationResult> {
    let mut folio = Folio::with_stylesheet(config.clone(), Stylesheet::parse(css));
    let result = folio.paginate(html);
    folio.release();
    result
}
