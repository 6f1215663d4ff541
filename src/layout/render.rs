//! # Block Rendering
//!
//! Turns content blocks into [`RenderedLine`]s, the atomic units the column
//! packer places. A line's `height` is its whole vertical slot: the text's
//! line height plus any spacing the block puts before or after it. The
//! height of a rendered block is therefore just the sum of its lines, known
//! before any placement happens.

use serde::Serialize;

use crate::config::LayoutConfig;
use crate::error::LayoutError;
use crate::font::Weight;
use crate::model::{BoldSpan, ContentBlock};
use crate::text::{InlineRun, TextMeasurer, TextRun, WrappedLine};

/// What a rendered line belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LineKind {
    /// The large title above a Document Page's columns.
    Title,
    /// A section header.
    SectionHeader,
    /// A header block inside a section.
    SubHeader,
    /// Paragraph, bullet, or checkbox text.
    Body,
}

impl LineKind {
    pub fn is_header(&self) -> bool {
        matches!(self, LineKind::SectionHeader | LineKind::SubHeader)
    }
}

/// Glyph drawn in the indent before a block's first line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Marker {
    Bullet,
    Checkbox { checked: bool },
}

/// One placeable line of text.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedLine {
    pub kind: LineKind,
    /// Line-level weight. Headers are bold; body lines are regular even when
    /// some of their runs are bold.
    pub style: Weight,
    pub runs: Vec<TextRun>,
    /// Width of the visible text.
    pub width: f64,
    /// Full vertical slot, spacing included.
    pub height: f64,
    /// Offset of the text's top edge within the slot.
    pub text_top: f64,
    /// Height of the text itself.
    pub line_height: f64,
    pub size: f64,
    /// Horizontal offset of the text from the column edge.
    pub indent: f64,
    pub marker: Option<Marker>,
    /// Number of following lines that must share this line's column.
    pub keep_with_next: usize,
    /// Index of the section within its Document Page.
    pub section: usize,
}

impl RenderedLine {
    fn from_wrapped(line: WrappedLine, kind: LineKind, style: Weight, size: f64, indent: f64) -> Self {
        Self {
            kind,
            style,
            width: line.width,
            height: line.height,
            text_top: 0.0,
            line_height: line.height,
            runs: line.runs,
            size,
            indent,
            marker: None,
            keep_with_next: 0,
            section: 0,
        }
    }

    /// The line's text with run boundaries removed.
    pub fn text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }
}

/// Total height of a run of rendered lines.
pub fn rendered_height(lines: &[RenderedLine]) -> f64 {
    lines.iter().map(|l| l.height).sum()
}

/// Where a block sits in the document, for error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockLocation {
    pub page: usize,
    pub section: usize,
    pub block: usize,
}

impl BlockLocation {
    fn malformed(self, reason: impl Into<String>) -> LayoutError {
        LayoutError::MalformedBlock {
            page: self.page,
            section: self.section,
            block: self.block,
            reason: reason.into(),
        }
    }
}

pub struct BlockRenderer<'a> {
    measurer: &'a TextMeasurer<'a>,
    config: &'a LayoutConfig,
}

impl<'a> BlockRenderer<'a> {
    pub fn new(measurer: &'a TextMeasurer<'a>, config: &'a LayoutConfig) -> Self {
        Self { measurer, config }
    }

    /// Render one content block for a column `column_width` points wide.
    pub fn render(
        &self,
        block: &ContentBlock,
        column_width: f64,
        at: BlockLocation,
    ) -> Result<Vec<RenderedLine>, LayoutError> {
        let indent = self.config.marker_indent;

        let mut lines = match block {
            ContentBlock::Header { text } => {
                return Ok(self.render_header(text, LineKind::SubHeader, column_width));
            }
            ContentBlock::Paragraph { text, bold } => {
                let runs = inline_runs(text, bold).map_err(|r| at.malformed(r))?;
                self.body_lines(&runs, column_width, 0.0)
            }
            ContentBlock::Bullet { text, bold } => {
                let runs = inline_runs(text, bold).map_err(|r| at.malformed(r))?;
                let mut lines = self.body_lines(&runs, column_width - indent, indent);
                lines[0].marker = Some(Marker::Bullet);
                lines
            }
            ContentBlock::Checkbox {
                text,
                checked,
                bold,
            } => {
                let runs = inline_runs(text, bold).map_err(|r| at.malformed(r))?;
                let mut lines = self.body_lines(&runs, column_width - indent, indent);
                lines[0].marker = Some(Marker::Checkbox { checked: *checked });
                lines
            }
            ContentBlock::Unsupported => {
                return Err(at.malformed("unsupported block type"));
            }
        };

        if let Some(last) = lines.last_mut() {
            last.height += self.config.block_spacing;
        }
        Ok(lines)
    }

    /// Render a bold header, wrapped if needed, with spacing around it.
    pub fn render_header(&self, text: &str, kind: LineKind, column_width: f64) -> Vec<RenderedLine> {
        let size = self.config.fonts.header;
        let mut lines: Vec<RenderedLine> = self
            .measurer
            .wrap(&[InlineRun::new(text, Weight::Bold)], size, column_width)
            .into_iter()
            .map(|l| RenderedLine::from_wrapped(l, kind, Weight::Bold, size, 0.0))
            .collect();

        let before = self.config.header_space_before;
        if let Some(first) = lines.first_mut() {
            first.height += before;
            first.text_top = before;
        }
        if let Some(last) = lines.last_mut() {
            last.height += self.config.header_space_after;
        }
        lines
    }

    /// Render a page title in upper case across the full content width.
    pub fn render_title(&self, title: &str, width: f64) -> Vec<RenderedLine> {
        let size = self.config.fonts.title;
        self.measurer
            .wrap(&[InlineRun::new(title.to_uppercase(), Weight::Bold)], size, width)
            .into_iter()
            .map(|l| RenderedLine::from_wrapped(l, LineKind::Title, Weight::Bold, size, 0.0))
            .collect()
    }

    fn body_lines(&self, runs: &[InlineRun], width: f64, indent: f64) -> Vec<RenderedLine> {
        let size = self.config.fonts.body;
        self.measurer
            .wrap(runs, size, width)
            .into_iter()
            .map(|l| RenderedLine::from_wrapped(l, LineKind::Body, Weight::Regular, size, indent))
            .collect()
    }
}

/// Split text into regular and bold runs. Overlapping spans merge.
fn inline_runs(text: &str, spans: &[BoldSpan]) -> Result<Vec<InlineRun>, String> {
    for span in spans {
        if span.start > span.end || span.end > text.len() {
            return Err(format!(
                "bold span {}..{} is outside text of length {}",
                span.start,
                span.end,
                text.len()
            ));
        }
        if !text.is_char_boundary(span.start) || !text.is_char_boundary(span.end) {
            return Err(format!(
                "bold span {}..{} does not fall on character boundaries",
                span.start, span.end
            ));
        }
    }

    let mut sorted = spans.to_vec();
    sorted.sort_by_key(|s| s.start);

    let mut runs = Vec::new();
    let mut pos = 0;
    for span in sorted {
        let start = span.start.max(pos);
        if span.end <= start {
            continue;
        }
        if start > pos {
            runs.push(InlineRun::new(&text[pos..start], Weight::Regular));
        }
        runs.push(InlineRun::new(&text[start..span.end], Weight::Bold));
        pos = span.end;
    }
    if pos < text.len() || runs.is_empty() {
        runs.push(InlineRun::new(&text[pos..], Weight::Regular));
    }
    Ok(runs)
}
