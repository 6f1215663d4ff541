//! # checksheet
//!
//! Lays out incident checklists into dense, two-column print sheets.
//!
//! A checklist is a strict tree: pages, each with a title, hold sections,
//! each with a header, hold content blocks (paragraphs, bullets, checkboxes).
//! The engine flows every section into fixed-size columns, column after
//! column and sheet after sheet, in a single deterministic pass. Headers are
//! never stranded at the foot of a column, every Document Page starts on a
//! fresh sheet, and a line too tall for any column is placed anyway so the
//! pass always terminates.
//!
//! ## Architecture
//!
//! ```text
//! Input (Markdown / JSON)
//!       ↓
//!   [markdown] / [model]   — Document tree: pages, sections, blocks
//!       ↓
//!   [layout::render]       — Blocks → RenderedLines, via [text] and [font]
//!       ↓
//!   [layout::page_break]   — Column packer
//!       ↓
//!   [layout]               — Planner + pagination driver → PhysicalPages
//!       ↓
//!   [pdf]                  — Serialize to PDF bytes
//! ```

pub mod config;
pub mod error;
pub mod font;
pub mod layout;
pub mod markdown;
pub mod model;
pub mod pdf;
pub mod text;

pub use config::LayoutConfig;
pub use error::{Error, LayoutError, Result};

use font::FontContext;
use layout::{LayoutEngine, PhysicalPage};
use model::Document;
use pdf::PdfWriter;

/// The font context a configuration asks for: its standard family.
pub fn font_context(config: &LayoutConfig) -> FontContext {
    FontContext::standard(config.font_family)
}

/// Lay out a document without serializing it.
///
/// All-or-nothing: on error no pages are returned.
pub fn layout_document(
    document: &Document,
    config: &LayoutConfig,
    fonts: &FontContext,
) -> Result<Vec<PhysicalPage>> {
    Ok(LayoutEngine::new(config, fonts).paginate(document)?)
}

/// Render a document to PDF bytes.
pub fn render_document(document: &Document, config: &LayoutConfig, fonts: &FontContext) -> Result<Vec<u8>> {
    let pages = layout_document(document, config, fonts)?;
    Ok(PdfWriter::new().write(&pages, &document.metadata(), fonts))
}

/// Render a Markdown checklist to PDF bytes with the configured standard
/// font family.
///
/// This is the primary entry point.
pub fn render_markdown(source: &str, config: &LayoutConfig) -> Result<Vec<u8>> {
    let document = markdown::parse(source);
    render_document(&document, config, &font_context(config))
}
