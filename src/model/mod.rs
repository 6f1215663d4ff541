//! # Document Model
//!
//! The input representation for the layout engine: a strict three-level tree
//! of pages, sections, and content blocks. The tree is plain owned data with
//! no sharing. It is built once (by the Markdown parser or from JSON) and
//! only read during layout.
//!
//! A **Page** is a top-level unit. It always starts a fresh physical page
//! and carries the large title printed above its columns. A **Section** is a
//! headed group of blocks that flows through the columns. It may split
//! across columns and pages but its blocks are never reordered.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A complete document ready for layout.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub pages: Vec<Page>,
}

impl Document {
    /// Parse a document tree from its JSON form.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize the document tree as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Metadata embedded in the serialized output.
    pub fn metadata(&self) -> Metadata {
        Metadata {
            title: self.pages.first().map(|p| p.title.clone()),
            ..Default::default()
        }
    }
}

/// Document metadata embedded in the PDF Info dictionary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
}

/// A top-level unit: a title and the sections printed beneath it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub title: String,
    #[serde(default)]
    pub sections: Vec<Section>,
}

impl Page {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            sections: Vec::new(),
        }
    }
}

/// A headed group of content blocks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub header: String,
    #[serde(default)]
    pub blocks: Vec<ContentBlock>,
}

impl Section {
    pub fn new(header: impl Into<String>) -> Self {
        Self {
            header: header.into(),
            blocks: Vec::new(),
        }
    }

    pub fn with_blocks(header: impl Into<String>, blocks: Vec<ContentBlock>) -> Self {
        Self {
            header: header.into(),
            blocks,
        }
    }
}

/// One semantic unit of content.
///
/// JSON uses an internal `type` tag. Tags this build does not know
/// deserialize to [`ContentBlock::Unsupported`] so the renderer can reject
/// them with a located error instead of failing the whole parse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ContentBlock {
    /// A bold sub-heading inside a section.
    Header { text: String },
    /// Running text with optional bold spans.
    Paragraph {
        text: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        bold: Vec<BoldSpan>,
    },
    /// A bulleted item.
    Bullet {
        text: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        bold: Vec<BoldSpan>,
    },
    /// An item preceded by an empty (or ticked) box.
    Checkbox {
        text: String,
        #[serde(default)]
        checked: bool,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        bold: Vec<BoldSpan>,
    },
    #[serde(other)]
    Unsupported,
}

impl ContentBlock {
    pub fn header(text: impl Into<String>) -> Self {
        ContentBlock::Header { text: text.into() }
    }

    pub fn paragraph(text: impl Into<String>) -> Self {
        ContentBlock::Paragraph {
            text: text.into(),
            bold: Vec::new(),
        }
    }

    pub fn bullet(text: impl Into<String>) -> Self {
        ContentBlock::Bullet {
            text: text.into(),
            bold: Vec::new(),
        }
    }

    pub fn checkbox(text: impl Into<String>) -> Self {
        ContentBlock::Checkbox {
            text: text.into(),
            checked: false,
            bold: Vec::new(),
        }
    }

    /// The block's text, if it has any.
    pub fn text(&self) -> Option<&str> {
        match self {
            ContentBlock::Header { text }
            | ContentBlock::Paragraph { text, .. }
            | ContentBlock::Bullet { text, .. }
            | ContentBlock::Checkbox { text, .. } => Some(text),
            ContentBlock::Unsupported => None,
        }
    }
}

/// A bold range of a block's text, as byte offsets (`start..end`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoldSpan {
    pub start: usize,
    pub end: usize,
}

impl BoldSpan {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

/// Standard page sizes in points.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub enum PageSize {
    A4,
    A3,
    A5,
    #[default]
    Letter,
    Legal,
    Tabloid,
    Custom {
        width: f64,
        height: f64,
    },
}

impl PageSize {
    /// Returns (width, height) in points.
    pub fn dimensions(&self) -> (f64, f64) {
        match self {
            PageSize::A4 => (595.28, 841.89),
            PageSize::A3 => (841.89, 1190.55),
            PageSize::A5 => (419.53, 595.28),
            PageSize::Letter => (612.0, 792.0),
            PageSize::Legal => (612.0, 1008.0),
            PageSize::Tabloid => (792.0, 1224.0),
            PageSize::Custom { width, height } => (*width, *height),
        }
    }
}

/// Edge values (top, right, bottom, left) used for page margins.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Edges {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Edges {
    pub fn uniform(v: f64) -> Self {
        Self {
            top: v,
            right: v,
            bottom: v,
            left: v,
        }
    }

    pub fn horizontal(&self) -> f64 {
        self.left + self.right
    }

    pub fn vertical(&self) -> f64 {
        self.top + self.bottom
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocks_deserialize_from_tagged_json() {
        let json = r#"{
            "pages": [{
                "title": "Fire Response",
                "sections": [{
                    "header": "Initial Assessment",
                    "blocks": [
                        { "type": "paragraph", "text": "Stay calm", "bold": [{ "start": 0, "end": 4 }] },
                        { "type": "bullet", "text": "Count exits" },
                        { "type": "checkbox", "text": "Call 911" },
                        { "type": "header", "text": "Then" }
                    ]
                }]
            }]
        }"#;
        let doc = Document::from_json(json).unwrap();
        let blocks = &doc.pages[0].sections[0].blocks;
        assert_eq!(blocks.len(), 4);
        assert_eq!(
            blocks[0],
            ContentBlock::Paragraph {
                text: "Stay calm".to_string(),
                bold: vec![BoldSpan::new(0, 4)],
            }
        );
        assert_eq!(blocks[2], ContentBlock::checkbox("Call 911"));
        assert_eq!(blocks[3], ContentBlock::header("Then"));
    }

    #[test]
    fn unknown_block_type_is_unsupported() {
        let json = r#"{ "pages": [{ "title": "T", "sections": [{ "header": "H",
            "blocks": [{ "type": "table", "rows": 3 }] }] }] }"#;
        let doc = Document::from_json(json).unwrap();
        assert_eq!(doc.pages[0].sections[0].blocks[0], ContentBlock::Unsupported);
    }

    #[test]
    fn json_round_trip_preserves_tree() {
        let mut page = Page::new("Flood");
        page.sections.push(Section::with_blocks(
            "Evacuate",
            vec![ContentBlock::bullet("Go uphill"), ContentBlock::checkbox("Grab kit")],
        ));
        let doc = Document { pages: vec![page] };
        let back = Document::from_json(&doc.to_json().unwrap()).unwrap();
        assert_eq!(doc, back);
    }

    #[test]
    fn metadata_uses_first_page_title() {
        let doc = Document {
            pages: vec![Page::new("Fire Response"), Page::new("Flood")],
        };
        assert_eq!(doc.metadata().title.as_deref(), Some("Fire Response"));
    }

    #[test]
    fn page_size_dimensions() {
        assert_eq!(PageSize::Letter.dimensions(), (612.0, 792.0));
        assert_eq!(
            PageSize::Custom { width: 100.0, height: 200.0 }.dimensions(),
            (100.0, 200.0)
        );
    }
}
