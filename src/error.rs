//! Structured error types for the Folio pagination engine.
//!
//! Only caller-contract breaches and export failures surface as errors.
//! Content problems (a broken image, an unreadable stylesheet, an empty table
//! fragment) are logged and absorbed where they happen.

use thiserror::Error;

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, FolioError>;

/// The unified error type returned by all public Folio API functions.
#[derive(Debug, Error)]
pub enum FolioError {
    /// A JSON configuration file failed to parse.
    #[error("Failed to parse config: {source}{}", format_hint(.hint))]
    Config {
        source: serde_json::Error,
        hint: String,
    },

    /// Reading an input file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Measurement was requested from a workspace that was released or is
    /// already holding a candidate element.
    #[error("Measurement workspace unavailable: {0}")]
    WorkspaceUnavailable(String),

    /// A required container (page content, table body) was missing.
    #[error("Missing required container: {0}")]
    MissingContainer(String),

    /// A custom font could not be registered.
    #[error("Font error: {0}")]
    Font(String),

    /// A document builder failed. No partial payload is returned.
    #[error("Export failed: {0}")]
    Export(String),

    /// A pagination run finished after a newer run had started.
    #[error("Pagination run {ticket} was superseded by run {latest}")]
    Superseded { ticket: u64, latest: u64 },
}

fn format_hint(hint: &str) -> String {
    if hint.is_empty() {
        String::new()
    } else {
        format!("\n  Hint: {}", hint)
    }
}

impl From<serde_json::Error> for FolioError {
    fn from(e: serde_json::Error) -> Self {
        let hint = match e.classify() {
            serde_json::error::Category::Syntax => {
                "Check for trailing commas, missing quotes, or unescaped characters.".to_string()
            }
            serde_json::error::Category::Data => {
                "The JSON is valid but doesn't match the config schema. Check field names and types.".to_string()
            }
            serde_json::error::Category::Eof => {
                "Unexpected end of input. Is the JSON truncated?".to_string()
            }
            serde_json::error::Category::Io => String::new(),
        };
        FolioError::Config { source: e, hint }
    }
}
