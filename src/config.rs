//! # Configuration
//!
//! Everything a pagination or export run can be tuned with, read from a
//! JSON file:
//!
//! ```json
//! {
//!   "page": { "contentWidth": 680, "contentHeight": 952 },
//!   "rules": { "headingTrailingAllowance": 48 },
//!   "stylesheet": "notes.css",
//!   "fonts": [{ "family": "Inter", "weight": 700, "path": "Inter-Bold.ttf" }],
//!   "imageBaseDir": "assets"
//! }
//! ```
//!
//! Every field is optional. A stylesheet or font that cannot be read is
//! logged and skipped; only malformed JSON is an error.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::font::FontContext;
use crate::image_loader::ImageLoader;
use crate::layout::PaginationRules;
use crate::model::PageConfig;
use crate::style::Stylesheet;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FontFile {
    pub family: String,
    #[serde(default = "default_weight")]
    pub weight: u32,
    pub path: PathBuf,
}

fn default_weight() -> u32 {
    400
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FolioConfig {
    pub page: PageConfig,
    pub rules: PaginationRules,
    /// Base stylesheet shared by measurement, preview and print.
    pub stylesheet: Option<PathBuf>,
    pub fonts: Vec<FontFile>,
    /// Directory relative image paths resolve against.
    pub image_base_dir: Option<PathBuf>,
}

impl FolioConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read a config file. Relative paths inside it are resolved against
    /// the file's directory.
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let mut config = Self::from_json(&json)?;
        if let Some(dir) = path.parent() {
            config.resolve_paths(dir);
        }
        log::debug!("loaded config from {}", path.display());
        Ok(config)
    }

    fn resolve_paths(&mut self, dir: &Path) {
        let rebase = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = dir.join(&*p);
            }
        };
        if let Some(p) = self.stylesheet.as_mut() {
            rebase(p);
        }
        if let Some(p) = self.image_base_dir.as_mut() {
            rebase(p);
        }
        for font in &mut self.fonts {
            rebase(&mut font.path);
        }
    }

    /// The configured stylesheet, or an empty one if none is set or it
    /// cannot be read.
    pub fn load_stylesheet(&self) -> Stylesheet {
        let Some(path) = &self.stylesheet else {
            return Stylesheet::empty();
        };
        match std::fs::read_to_string(path) {
            Ok(css) => Stylesheet::parse(&css),
            Err(e) => {
                log::warn!(
                    "cannot read stylesheet {}: {}; continuing without it",
                    path.display(),
                    e
                );
                Stylesheet::empty()
            }
        }
    }

    /// Font context with every configured face that could be registered.
    pub fn font_context(&self) -> FontContext {
        let mut fonts = FontContext::new();
        for font in &self.fonts {
            if let Err(e) = fonts.register_file(&font.family, font.weight, &font.path) {
                log::warn!(
                    "skipping font '{}' from {}: {}",
                    font.family,
                    font.path.display(),
                    e
                );
            }
        }
        fonts
    }

    pub fn image_loader(&self) -> ImageLoader {
        match &self.image_base_dir {
            Some(dir) => ImageLoader::with_base_dir(dir.clone()),
            None => ImageLoader::new(),
        }
    }
}
