//! Structured error types for the checksheet engine.
//!
//! Layout itself fails in exactly two ways: a block the renderer does not
//! understand, or page geometry that leaves no room for a column. Everything
//! else here comes from the edges of the pipeline (reading input, parsing
//! JSON, loading font files).

use thiserror::Error;

/// Errors raised by a layout pass. A pass that returns one of these
/// produces no pages at all.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LayoutError {
    /// A content block with an unknown variant or out-of-range bold spans.
    #[error("malformed block {block} in section {section} of page {page}: {reason}")]
    MalformedBlock {
        page: usize,
        section: usize,
        block: usize,
        reason: String,
    },
    /// Page geometry with a non-positive column width or height.
    #[error("impossible page geometry: {0}")]
    ImpossibleGeometry(String),
}

/// The unified error type returned by the public checksheet API.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Layout(#[from] LayoutError),

    /// JSON input (a document or a configuration file) failed to parse.
    #[error("failed to parse JSON: {source}{}", hint_suffix(.hint))]
    Parse {
        source: serde_json::Error,
        hint: String,
    },

    /// A TrueType font file could not be parsed.
    #[error("font error: {0}")]
    Font(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

fn hint_suffix(hint: &str) -> String {
    if hint.is_empty() {
        String::new()
    } else {
        format!("\n  Hint: {}", hint)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        let hint = match e.classify() {
            serde_json::error::Category::Syntax => {
                "Check for trailing commas, missing quotes, or unescaped characters.".to_string()
            }
            serde_json::error::Category::Data => {
                "The JSON is valid but doesn't match the expected schema. Check field names and types.".to_string()
            }
            serde_json::error::Category::Eof => {
                "Unexpected end of input. Is the JSON truncated?".to_string()
            }
            serde_json::error::Category::Io => String::new(),
        };
        Error::Parse { source: e, hint }
    }
}

impl From<ttf_parser::FaceParsingError> for Error {
    fn from(e: ttf_parser::FaceParsingError) -> Self {
        Error::Font(e.to_string())
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
