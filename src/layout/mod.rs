//! # Column Layout Engine
//!
//! Flows a checklist document into fixed-size column boxes.
//!
//! The page is the unit of layout, and so is the column. Nothing is laid
//! out on an unbounded canvas and sliced afterwards. The algorithm is:
//!
//! 1. Each Document Page opens a fresh physical page whose first columns
//!    sit below the page title.
//! 2. Each section is rendered into one flat line sequence (header first,
//!    then its blocks in order).
//! 3. The column packer places as much of that sequence as fits in the
//!    current column and hands back the remainder.
//! 4. While a remainder exists, move to the next column, opening a new
//!    physical page when the columns run out, and pack again.
//! 5. The next section continues in the same column if room remains.
//!
//! Headers are kept with their first lines by the packer's keep-with-next
//! rule. An empty column always accepts at least one line, so every pass
//! terminates even when a single line is taller than a column.

pub mod page_break;
pub mod render;

use log::debug;
use serde::Serialize;

use crate::config::{Color, LayoutConfig, SectionFrame};
use crate::error::LayoutError;
use crate::font::{FontMetrics, Weight};
use crate::model::{Document, Section};
use crate::text::TextMeasurer;

use page_break::{pack, PackResult};
pub use render::{rendered_height, BlockLocation, BlockRenderer, LineKind, Marker, RenderedLine};

/// Baseline position below the top of a line box, as a fraction of the
/// font size (after the half-leading).
const ASCENT_RATIO: f64 = 0.8;

/// Stroke width of the rule under a page title.
const TITLE_RULE_WIDTH: f64 = 2.0;

/// A fixed-size vertical region of a physical page.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    /// Top-left corner in page coordinates (origin at the top-left).
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub lines: Vec<RenderedLine>,
    pub used_height: f64,
    /// A line taller than the column was placed here.
    pub overflowed: bool,
}

impl Column {
    fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
            lines: Vec::new(),
            used_height: 0.0,
            overflowed: false,
        }
    }

    pub fn remaining_height(&self) -> f64 {
        (self.height - self.used_height).max(0.0)
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    fn place(&mut self, placed: Vec<RenderedLine>, used_height: f64, forced: bool) {
        self.used_height += used_height;
        self.overflowed |= forced;
        self.lines.extend(placed);
    }
}

/// The title printed across the top of a Document Page's first sheet.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TitleBlock {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub lines: Vec<RenderedLine>,
    /// Vertical position of the rule drawn under the title.
    pub rule_y: f64,
}

/// One sheet of output.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PhysicalPage {
    /// 1-based position in the whole output.
    pub number: usize,
    /// Index of the Document Page this sheet belongs to.
    pub document_page: usize,
    pub width: f64,
    pub height: f64,
    pub title: Option<TitleBlock>,
    pub columns: Vec<Column>,
    /// Side length of checkbox markers.
    pub checkbox_size: f64,
    pub section_frame: Option<SectionFrame>,
}

/// What to draw, in page coordinates with the origin at the top-left.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum DrawCommand {
    BeginPage {
        number: usize,
        width: f64,
        height: f64,
    },
    /// A text run with its baseline at `y`.
    Text {
        x: f64,
        y: f64,
        size: f64,
        weight: Weight,
        color: Color,
        text: String,
    },
    /// A rectangle whose top-left corner is at (`x`, `y`).
    Rect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        fill: Option<Color>,
        stroke: Option<Color>,
        line_width: f64,
    },
    /// A square box whose top-left corner is at (`x`, `y`).
    CheckBox {
        x: f64,
        y: f64,
        size: f64,
        checked: bool,
    },
    Rule {
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
        width: f64,
    },
}

impl PhysicalPage {
    /// Every line on the sheet, title first, then column by column.
    pub fn lines(&self) -> impl Iterator<Item = &RenderedLine> {
        self.title
            .iter()
            .flat_map(|t| t.lines.iter())
            .chain(self.columns.iter().flat_map(|c| c.lines.iter()))
    }

    /// Absolute draw commands for this sheet.
    pub fn draw_commands(&self) -> Vec<DrawCommand> {
        let mut commands = vec![DrawCommand::BeginPage {
            number: self.number,
            width: self.width,
            height: self.height,
        }];

        if let Some(title) = &self.title {
            let mut y = title.y;
            for line in &title.lines {
                self.draw_line(&mut commands, title.x, y, line, Color::BLACK);
                y += line.height;
            }
            commands.push(DrawCommand::Rule {
                x1: title.x,
                y1: title.rule_y,
                x2: title.x + title.width,
                y2: title.rule_y,
                width: TITLE_RULE_WIDTH,
            });
        }

        for column in &self.columns {
            if let Some(frame) = &self.section_frame {
                draw_section_frames(&mut commands, column, frame);
            }
            let mut y = column.y;
            for line in &column.lines {
                let color = match &self.section_frame {
                    Some(frame) if line.kind == LineKind::SectionHeader => frame.bar_text,
                    _ => Color::BLACK,
                };
                self.draw_line(&mut commands, column.x, y, line, color);
                y += line.height;
            }
        }

        commands
    }

    fn draw_line(
        &self,
        commands: &mut Vec<DrawCommand>,
        x: f64,
        top: f64,
        line: &RenderedLine,
        color: Color,
    ) {
        let text_top = top + line.text_top;
        let baseline = text_top + (line.line_height - line.size) / 2.0 + line.size * ASCENT_RATIO;

        match line.marker {
            Some(Marker::Bullet) => commands.push(DrawCommand::Text {
                x,
                y: baseline,
                size: line.size,
                weight: Weight::Regular,
                color,
                text: "\u{2022}".to_string(),
            }),
            Some(Marker::Checkbox { checked }) => {
                let size = self.checkbox_size;
                commands.push(DrawCommand::CheckBox {
                    x,
                    y: text_top + (line.line_height - size) / 2.0,
                    size,
                    checked,
                });
            }
            None => {}
        }

        for run in &line.runs {
            commands.push(DrawCommand::Text {
                x: x + line.indent + run.x,
                y: baseline,
                size: line.size,
                weight: run.weight,
                color,
                text: run.text.clone(),
            });
        }
    }
}

/// Frame each section's share of a column, with a title bar behind its
/// header lines. A section continued from an earlier column has no bar.
fn draw_section_frames(commands: &mut Vec<DrawCommand>, column: &Column, frame: &SectionFrame) {
    let x = column.x - frame.outset;
    let width = column.width + 2.0 * frame.outset;
    let mut top = column.y;

    for group in column.lines.chunk_by(|a, b| a.section == b.section) {
        let bottom = top + rendered_height(group);
        let header_lines = group
            .iter()
            .take_while(|l| l.kind == LineKind::SectionHeader)
            .count();
        // The header's space-before stays outside the frame.
        let frame_top = match group.first() {
            Some(first) if header_lines > 0 => top + first.text_top,
            _ => top,
        };

        commands.push(DrawCommand::Rect {
            x,
            y: frame_top,
            width,
            height: bottom - frame_top,
            fill: Some(frame.background),
            stroke: Some(frame.bar),
            line_width: frame.stroke_width,
        });
        if header_lines > 0 {
            let bar_bottom = top + rendered_height(&group[..header_lines]);
            commands.push(DrawCommand::Rect {
                x,
                y: frame_top,
                width,
                height: bar_bottom - frame_top,
                fill: Some(frame.bar),
                stroke: None,
                line_width: 0.0,
            });
        }
        top = bottom;
    }
}

/// Tracks the current column during a layout pass.
struct ColumnCursor<'c> {
    config: &'c LayoutConfig,
    finished: Vec<PhysicalPage>,
    page: PhysicalPage,
    column: usize,
}

impl<'c> ColumnCursor<'c> {
    fn new(config: &'c LayoutConfig, first: PhysicalPage) -> Self {
        Self {
            config,
            finished: Vec::new(),
            page: first,
            column: 0,
        }
    }

    fn current_mut(&mut self) -> &mut Column {
        &mut self.page.columns[self.column]
    }

    /// Move to the next column, opening a continuation page when needed.
    fn advance(&mut self) {
        self.column += 1;
        if self.column == self.page.columns.len() {
            let next = continuation_page(self.config, self.page.document_page);
            self.finished.push(std::mem::replace(&mut self.page, next));
            self.column = 0;
            debug!(
                "document page {}: opened continuation sheet {}",
                self.page.document_page,
                self.finished.len() + 1
            );
        }
    }

    fn finish(mut self) -> Vec<PhysicalPage> {
        self.finished.push(self.page);
        self.finished
    }
}

fn page_with_columns(
    config: &LayoutConfig,
    document_page: usize,
    top: f64,
    column_height: f64,
) -> PhysicalPage {
    let (width, height) = config.page_dimensions();
    let column_width = config.column_width();
    PhysicalPage {
        number: 0,
        document_page,
        width,
        height,
        title: None,
        checkbox_size: config.checkbox_size,
        section_frame: config.section_frame,
        columns: (0..config.columns)
            .map(|i| Column::new(config.column_x(i), top, column_width, column_height))
            .collect(),
    }
}

fn continuation_page(config: &LayoutConfig, document_page: usize) -> PhysicalPage {
    page_with_columns(config, document_page, config.margin.top, config.content_height())
}

/// The main layout engine. One engine serves one layout pass.
pub struct LayoutEngine<'a> {
    config: &'a LayoutConfig,
    measurer: TextMeasurer<'a>,
}

impl<'a> LayoutEngine<'a> {
    pub fn new(config: &'a LayoutConfig, metrics: &'a dyn FontMetrics) -> Self {
        Self {
            config,
            measurer: TextMeasurer::new(metrics, config.leading),
        }
    }

    fn renderer(&self) -> BlockRenderer<'_> {
        BlockRenderer::new(&self.measurer, self.config)
    }

    /// Lay out a whole document into globally numbered physical pages.
    ///
    /// Each Document Page starts on a fresh sheet. Any error aborts the pass
    /// and no pages are returned.
    pub fn paginate(&self, document: &Document) -> Result<Vec<PhysicalPage>, LayoutError> {
        self.config.validate()?;

        let mut output = Vec::new();
        for (index, page) in document.pages.iter().enumerate() {
            let first = self.title_page(index, &page.title)?;
            let sheets = self.layout_sections(&page.sections, first)?;
            debug!(
                "document page {} ({:?}) laid out on {} sheet(s)",
                index,
                page.title,
                sheets.len()
            );
            output.extend(sheets);
        }

        for (i, page) in output.iter_mut().enumerate() {
            page.number = i + 1;
        }
        Ok(output)
    }

    /// Open the first sheet of a Document Page: the title across the top and
    /// shortened columns beneath it.
    pub fn title_page(&self, document_page: usize, title: &str) -> Result<PhysicalPage, LayoutError> {
        let config = self.config;
        let width = config.content_width();
        let lines = self.renderer().render_title(title, width);
        let text_height = rendered_height(&lines);
        let block_height = config
            .title_area_height
            .max(text_height + config.title_rule_gap);

        let column_height = config.content_height() - block_height;
        if column_height <= 0.0 {
            return Err(LayoutError::ImpossibleGeometry(format!(
                "title {:?} leaves {:.2}pt for the columns",
                title, column_height
            )));
        }

        let mut page = page_with_columns(
            config,
            document_page,
            config.margin.top + block_height,
            column_height,
        );
        page.title = Some(TitleBlock {
            x: config.margin.left,
            y: config.margin.top,
            width,
            lines,
            rule_y: config.margin.top + text_height + config.title_rule_gap / 2.0,
        });
        Ok(page)
    }

    /// Flow a Document Page's sections into columns, starting on `first`.
    pub fn layout_sections(
        &self,
        sections: &[Section],
        first: PhysicalPage,
    ) -> Result<Vec<PhysicalPage>, LayoutError> {
        let document_page = first.document_page;
        let mut cursor = ColumnCursor::new(self.config, first);

        for (index, section) in sections.iter().enumerate() {
            let mut lines = self.render_section(document_page, index, section)?;

            loop {
                let column = cursor.current_mut();
                let PackResult {
                    placed,
                    remainder,
                    used_height,
                    forced,
                } = pack(lines, column.remaining_height(), column.is_empty());

                if forced {
                    debug!(
                        "section {:?}: line of {:.2}pt forced into a {:.2}pt column",
                        section.header, used_height, column.height
                    );
                }
                if placed.is_empty() {
                    debug!("section {:?}: moving to next column", section.header);
                }
                column.place(placed, used_height, forced);

                if remainder.is_empty() {
                    break;
                }
                lines = remainder;
                cursor.advance();
            }
        }

        Ok(cursor.finish())
    }

    /// Render a section into one flat line sequence, header first.
    pub fn render_section(
        &self,
        document_page: usize,
        section_index: usize,
        section: &Section,
    ) -> Result<Vec<RenderedLine>, LayoutError> {
        let renderer = self.renderer();
        let width = self.config.column_width();

        let mut lines = renderer.render_header(&section.header, LineKind::SectionHeader, width);
        for (block, content) in section.blocks.iter().enumerate() {
            let at = BlockLocation {
                page: document_page,
                section: section_index,
                block,
            };
            lines.extend(renderer.render(content, width, at)?);
        }

        let total = lines.len();
        let threshold = self.config.orphan_lines;
        for (i, line) in lines.iter_mut().enumerate() {
            line.section = section_index;
            if line.kind.is_header() {
                line.keep_with_next = threshold.min(total - 1 - i);
            }
        }
        Ok(lines)
    }
}
