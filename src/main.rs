//! # Folio CLI
//!
//! Usage:
//!   folio notes.html -o pages.json
//!   folio notes.html --css base.css --format preview -o preview.html
//!   cat notes.html | folio --format docx -o notes.docx
//!
//! Formats:
//!   pages    pagination result as JSON (default)
//!   preview  standalone HTML showing the pages
//!   print    print document handed to a PDF engine
//!   docx     Word document
//!   pptx     PowerPoint deck
//!   slides   slide deck model as JSON

use std::env;
use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;
use std::process;

use folio::config::FolioConfig;
use folio::error::{FolioError, Result};
use folio::export::{print, ExportFormat, Exporter, OpcWriter, PrintEngine, SlideDeck};
use folio::model::PageConfig;
use folio::parser::ListPolicy;
use folio::present::Presenter;
use folio::Folio;

/// The CLI has no PDF renderer; `--format print` emits the print document instead.
struct NoPrintEngine;

impl PrintEngine for NoPrintEngine {
    fn print_to_pdf(&self, _document_html: &str, _page: &PageConfig) -> Result<Vec<u8>> {
        Err(FolioError::Export(
            "no PDF engine available; use --format print".to_string(),
        ))
    }
}

struct Args {
    input: Option<String>,
    output: Option<String>,
    css: Option<String>,
    config: Option<String>,
    format: String,
}

fn parse_args() -> Args {
    let args: Vec<String> = env::args().collect();
    let value_of = |flag: &str| {
        args.windows(2)
            .find(|w| w[0] == flag)
            .map(|w| w[1].clone())
    };
    let flags_with_values = ["-o", "--css", "--config", "--format"];
    let input = args
        .iter()
        .enumerate()
        .skip(1)
        .find(|(i, a)| !a.starts_with('-') && !flags_with_values.contains(&args[i - 1].as_str()))
        .map(|(_, a)| a.clone());
    Args {
        input,
        output: value_of("-o"),
        css: value_of("--css"),
        config: value_of("--config"),
        format: value_of("--format").unwrap_or_else(|| "pages".to_string()),
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = parse_args();
    match run(&args) {
        Ok(bytes) => {
            if let Err(e) = write_output(args.output.as_deref(), &bytes) {
                eprintln!("✗ Failed to write output: {}", e);
                process::exit(1);
            }
            if let Some(path) = &args.output {
                eprintln!("✓ Written {} bytes to {}", bytes.len(), path);
            }
        }
        Err(e) => {
            eprintln!("✗ {}", e);
            process::exit(1);
        }
    }
}

fn run(args: &Args) -> Result<Vec<u8>> {
    let html = match &args.input {
        Some(path) => fs::read_to_string(path)?,
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };
    let title = args
        .input
        .as_deref()
        .and_then(|p| Path::new(p).file_stem())
        .and_then(|s| s.to_str())
        .unwrap_or("Untitled")
        .to_string();

    let mut config = match &args.config {
        Some(path) => FolioConfig::load(Path::new(path))?,
        None => FolioConfig::default(),
    };
    if let Some(css) = &args.css {
        config.stylesheet = Some(css.into());
    }
    let stylesheet = config.load_stylesheet();
    let mut folio = Folio::with_stylesheet(config.clone(), stylesheet.clone());

    let bytes = match args.format.as_str() {
        "pages" => {
            let result = folio.paginate(&html)?;
            to_json(&result)?
        }
        "preview" => {
            let result = folio.paginate(&html)?;
            let mut presenter = Presenter::new(stylesheet, config.page);
            presenter.present(&result);
            presenter.document(&title).into_bytes()
        }
        "print" => {
            print::print_document(&title, &html, stylesheet.source(), &config.page).into_bytes()
        }
        "docx" | "pptx" => {
            let format: ExportFormat = args.format.parse()?;
            let writer = OpcWriter::new(config.image_loader());
            Exporter::new(folio.resolver(), config.page, &NoPrintEngine, &writer)
                .with_image_loader(config.image_loader())
                .export_as(format, &title, &html)?
        }
        "slides" => {
            let blocks = folio.parse(&html, ListPolicy::PerItem);
            to_json(&SlideDeck::from_blocks(&title, &blocks))?
        }
        other => {
            return Err(FolioError::Export(format!(
                "unknown format '{}' (expected pages, preview, print, docx, pptx or slides)",
                other
            )))
        }
    };
    folio.release();
    Ok(bytes)
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<Vec<u8>> {
    serde_json::to_vec_pretty(value).map_err(|e| FolioError::Export(format!("JSON output failed: {}", e)))
}

fn write_output(path: Option<&str>, bytes: &[u8]) -> io::Result<()> {
    match path {
        Some(path) => fs::write(path, bytes),
        None => io::stdout().write_all(bytes),
    }
}
