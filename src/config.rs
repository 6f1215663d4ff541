//! # Layout Configuration
//!
//! Page geometry and typographic settings. Every field has a default, so a
//! JSON configuration file only needs to name what it changes. The defaults
//! reproduce a US Letter, two-column checklist with 8pt body text.

use serde::{Deserialize, Serialize};

use crate::error::{LayoutError, Result};
use crate::font::StandardFamily;
use crate::model::{Edges, PageSize};

/// Default line height as a multiple of font size.
pub const DEFAULT_LEADING: f64 = 1.375;

/// Font sizes per block type, in points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FontSizes {
    /// Page title printed above the columns.
    pub title: f64,
    /// Section headers and sub-headers.
    pub header: f64,
    /// Paragraphs, bullets, and checkboxes.
    pub body: f64,
}

impl Default for FontSizes {
    fn default() -> Self {
        Self {
            title: 24.0,
            header: 10.0,
            body: 8.0,
        }
    }
}

/// An RGB colour with components in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0.0, 0.0, 0.0);
    pub const WHITE: Color = Color::rgb(1.0, 1.0, 1.0);

    pub const fn rgb(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b }
    }

    pub fn is_black(&self) -> bool {
        self.r == 0.0 && self.g == 0.0 && self.b == 0.0
    }
}

/// The box drawn around each section, its header set in white on a dark
/// title bar.
///
/// The frame is decoration only: it sits `outset` points outside the
/// column edges and starts below the header's space-before, so it never
/// changes how lines are packed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SectionFrame {
    pub stroke_width: f64,
    /// Horizontal distance from the column edge to the frame.
    pub outset: f64,
    pub background: Color,
    /// Title bar fill and frame stroke.
    pub bar: Color,
    pub bar_text: Color,
}

impl Default for SectionFrame {
    fn default() -> Self {
        Self {
            stroke_width: 1.5,
            outset: 4.0,
            background: Color::rgb(245.0 / 255.0, 245.0 / 255.0, 240.0 / 255.0),
            bar: Color::rgb(26.0 / 255.0, 26.0 / 255.0, 26.0 / 255.0),
            bar_text: Color::WHITE,
        }
    }
}

/// Everything the layout engine needs to know about the page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LayoutConfig {
    pub page_size: PageSize,
    pub margin: Edges,
    /// Number of columns per physical page.
    pub columns: usize,
    /// Horizontal gap between adjacent columns.
    pub column_gap: f64,
    pub fonts: FontSizes,
    pub font_family: StandardFamily,
    /// Line height as a multiple of font size.
    pub leading: f64,
    /// Space reserved above the columns for a page title.
    pub title_area_height: f64,
    /// Gap between the title's last line and the rule drawn under it.
    pub title_rule_gap: f64,
    pub header_space_before: f64,
    pub header_space_after: f64,
    /// Space after every content block.
    pub block_spacing: f64,
    /// Indent of bullet and checkbox text from the column edge.
    pub marker_indent: f64,
    pub checkbox_size: f64,
    /// Number of following lines a header must keep in its column.
    pub orphan_lines: usize,
    /// Box around each section; `null` in JSON draws bare columns.
    pub section_frame: Option<SectionFrame>,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            page_size: PageSize::Letter,
            margin: Edges {
                top: 72.0,
                right: 54.0,
                bottom: 54.0,
                left: 54.0,
            },
            columns: 2,
            column_gap: 18.0,
            fonts: FontSizes::default(),
            font_family: StandardFamily::Helvetica,
            leading: DEFAULT_LEADING,
            title_area_height: 50.0,
            title_rule_gap: 8.0,
            header_space_before: 6.0,
            header_space_after: 2.0,
            block_spacing: 4.0,
            marker_indent: 12.0,
            checkbox_size: 7.0,
            orphan_lines: 1,
            section_frame: Some(SectionFrame::default()),
        }
    }
}

impl LayoutConfig {
    /// Load a configuration from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn page_dimensions(&self) -> (f64, f64) {
        self.page_size.dimensions()
    }

    pub fn content_width(&self) -> f64 {
        self.page_dimensions().0 - self.margin.horizontal()
    }

    pub fn content_height(&self) -> f64 {
        self.page_dimensions().1 - self.margin.vertical()
    }

    pub fn column_width(&self) -> f64 {
        let columns = self.columns.max(1) as f64;
        (self.content_width() - (columns - 1.0) * self.column_gap) / columns
    }

    /// Left edge of column `index`, in page coordinates.
    pub fn column_x(&self, index: usize) -> f64 {
        self.margin.left + index as f64 * (self.column_width() + self.column_gap)
    }

    /// Width available to marker-indented text.
    pub fn indented_width(&self) -> f64 {
        self.column_width() - self.marker_indent
    }

    /// Reject geometry that leaves no positive room for a column or a line.
    pub fn validate(&self) -> std::result::Result<(), LayoutError> {
        let (page_w, page_h) = self.page_dimensions();
        if !(page_w > 0.0 && page_h > 0.0) {
            return Err(LayoutError::ImpossibleGeometry(format!(
                "page size {page_w}x{page_h} must be positive"
            )));
        }
        if self.columns == 0 {
            return Err(LayoutError::ImpossibleGeometry(
                "at least one column is required".to_string(),
            ));
        }
        if !(self.column_width() > 0.0) {
            return Err(LayoutError::ImpossibleGeometry(format!(
                "column width {:.2} leaves no room for text",
                self.column_width()
            )));
        }
        if !(self.indented_width() > 0.0) {
            return Err(LayoutError::ImpossibleGeometry(format!(
                "marker indent {} is wider than the column",
                self.marker_indent
            )));
        }
        if !(self.content_height() > 0.0) {
            return Err(LayoutError::ImpossibleGeometry(format!(
                "column height {:.2} leaves no room for text",
                self.content_height()
            )));
        }
        let sizes = [self.fonts.title, self.fonts.header, self.fonts.body, self.leading];
        if sizes.iter().any(|v| !(*v > 0.0)) {
            return Err(LayoutError::ImpossibleGeometry(
                "font sizes and leading must be positive".to_string(),
            ));
        }
        if let Some(frame) = &self.section_frame {
            if !(frame.stroke_width >= 0.0 && frame.outset >= 0.0) {
                return Err(LayoutError::ImpossibleGeometry(format!(
                    "section frame stroke {} and outset {} must not be negative",
                    frame.stroke_width, frame.outset
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_geometry_matches_letter_two_column() {
        let cfg = LayoutConfig::default();
        assert!((cfg.content_width() - 504.0).abs() < 1e-9);
        assert!((cfg.column_width() - 243.0).abs() < 1e-9);
        assert!((cfg.content_height() - 666.0).abs() < 1e-9);
        assert!((cfg.column_x(1) - 315.0).abs() < 1e-9);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg = LayoutConfig::from_json(r#"{ "columns": 3, "fonts": { "body": 9 } }"#).unwrap();
        assert_eq!(cfg.columns, 3);
        assert_eq!(cfg.fonts.body, 9.0);
        assert_eq!(cfg.fonts.header, 10.0);
        assert_eq!(cfg.margin.top, 72.0);
    }

    #[test]
    fn zero_columns_is_impossible() {
        let cfg = LayoutConfig {
            columns: 0,
            ..Default::default()
        };
        assert!(matches!(cfg.validate(), Err(LayoutError::ImpossibleGeometry(_))));
    }

    #[test]
    fn margins_eating_the_page_are_impossible() {
        let cfg = LayoutConfig {
            margin: Edges::uniform(400.0),
            ..Default::default()
        };
        assert!(matches!(cfg.validate(), Err(LayoutError::ImpossibleGeometry(_))));
    }

    #[test]
    fn gap_wider_than_page_is_impossible() {
        let cfg = LayoutConfig {
            column_gap: 600.0,
            ..Default::default()
        };
        assert!(matches!(cfg.validate(), Err(LayoutError::ImpossibleGeometry(_))));
    }

    #[test]
    fn non_positive_leading_is_impossible() {
        for leading in [0.0, -1.5, f64::NAN] {
            let cfg = LayoutConfig {
                leading,
                ..Default::default()
            };
            assert!(
                matches!(cfg.validate(), Err(LayoutError::ImpossibleGeometry(_))),
                "leading {} should be rejected",
                leading
            );
        }
    }

    #[test]
    fn section_frame_defaults_and_can_be_disabled() {
        let cfg = LayoutConfig::default();
        let frame = cfg.section_frame.unwrap();
        assert_eq!(frame.stroke_width, 1.5);
        assert!((frame.bar.r - 26.0 / 255.0).abs() < 1e-9);
        assert_eq!(frame.bar_text, Color::WHITE);

        let cfg = LayoutConfig::from_json(r#"{ "sectionFrame": null }"#).unwrap();
        assert_eq!(cfg.section_frame, None);

        let cfg = LayoutConfig::from_json(r#"{ "sectionFrame": { "outset": 2 } }"#).unwrap();
        let frame = cfg.section_frame.unwrap();
        assert_eq!(frame.outset, 2.0);
        assert_eq!(frame.stroke_width, 1.5);
    }

    #[test]
    fn negative_frame_outset_is_rejected() {
        let cfg = LayoutConfig {
            section_frame: Some(SectionFrame {
                outset: -1.0,
                ..Default::default()
            }),
            ..Default::default()
        };
        assert!(matches!(cfg.validate(), Err(LayoutError::ImpossibleGeometry(_))));
    }
}
