//! # Markdown Input
//!
//! A line-oriented reader for the small Markdown dialect checklists are
//! written in:
//!
//! ```text
//! # Page title
//! ## Section header
//! ### Sub-header
//! - [ ] unchecked item
//! - [x] checked item
//! - bullet
//! Running text, joined across lines
//! until a blank line.
//! ```
//!
//! `**bold**` inside text becomes a [`BoldSpan`] over the stripped text.
//! Content with no page or section to belong to is dropped with a warning.

use log::warn;

use crate::model::{BoldSpan, ContentBlock, Document, Page, Section};

/// Parse Markdown source into a [`Document`].
pub fn parse(source: &str) -> Document {
    let mut parser = Parser::default();
    for (index, line) in source.lines().enumerate() {
        parser.line(index + 1, line);
    }
    parser.finish()
}

#[derive(Default)]
struct Parser {
    pages: Vec<Page>,
    page: Option<Page>,
    section: Option<Section>,
    paragraph: Vec<String>,
    paragraph_start: usize,
}

impl Parser {
    fn line(&mut self, number: usize, line: &str) {
        if let Some(title) = line.strip_prefix("# ") {
            self.flush_page();
            self.page = Some(Page::new(title.trim()));
        } else if let Some(header) = line.strip_prefix("## ") {
            self.flush_section();
            if self.page.is_none() {
                warn!("line {number}: section {:?} has no page and is dropped", header.trim());
            }
            self.section = Some(Section::new(header.trim()));
        } else if let Some(header) = line.strip_prefix("### ") {
            self.flush_paragraph();
            self.push_block(number, ContentBlock::header(header.trim()));
        } else if let Some(item) = line.strip_prefix("- [ ] ") {
            self.flush_paragraph();
            self.push_block(number, checkbox(item, false));
        } else if let Some(item) = line
            .strip_prefix("- [x] ")
            .or_else(|| line.strip_prefix("- [X] "))
        {
            self.flush_paragraph();
            self.push_block(number, checkbox(item, true));
        } else if let Some(item) = line.strip_prefix("- ") {
            self.flush_paragraph();
            let (text, bold) = strip_bold(item.trim());
            self.push_block(number, ContentBlock::Bullet { text, bold });
        } else if line.trim().is_empty() {
            self.flush_paragraph();
        } else {
            if self.paragraph.is_empty() {
                self.paragraph_start = number;
            }
            self.paragraph.push(line.trim().to_string());
        }
    }

    fn push_block(&mut self, number: usize, block: ContentBlock) {
        match &mut self.section {
            Some(section) => section.blocks.push(block),
            None => warn!("line {number}: content outside a section is dropped"),
        }
    }

    fn flush_paragraph(&mut self) {
        if self.paragraph.is_empty() {
            return;
        }
        let joined = self.paragraph.join(" ");
        self.paragraph.clear();
        let (text, bold) = strip_bold(&joined);
        self.push_block(self.paragraph_start, ContentBlock::Paragraph { text, bold });
    }

    fn flush_section(&mut self) {
        self.flush_paragraph();
        if let Some(section) = self.section.take() {
            if let Some(page) = &mut self.page {
                page.sections.push(section);
            }
        }
    }

    fn flush_page(&mut self) {
        self.flush_section();
        if let Some(page) = self.page.take() {
            self.pages.push(page);
        }
    }

    fn finish(mut self) -> Document {
        self.flush_page();
        Document { pages: self.pages }
    }
}

fn checkbox(item: &str, checked: bool) -> ContentBlock {
    let (text, bold) = strip_bold(item.trim());
    ContentBlock::Checkbox {
        text,
        checked,
        bold,
    }
}

/// Remove `**` pairs from `text`, returning the stripped text and the byte
/// ranges they enclosed. A bold run holds at least one character; an
/// unmatched `**` stays in the text.
fn strip_bold(text: &str) -> (String, Vec<BoldSpan>) {
    let mut out = String::with_capacity(text.len());
    let mut spans = Vec::new();
    let mut rest = text;

    while let Some(open) = rest.find("**") {
        let inner = &rest[open + 2..];
        let Some(first) = inner.chars().next() else {
            break;
        };
        let Some(close) = inner[first.len_utf8()..]
            .find("**")
            .map(|i| i + first.len_utf8())
        else {
            break;
        };

        out.push_str(&rest[..open]);
        let start = out.len();
        out.push_str(&inner[..close]);
        spans.push(BoldSpan::new(start, out.len()));
        rest = &inner[close + 2..];
    }
    out.push_str(rest);
    (out, spans)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
# Fire Response

## Initial Assessment
- [ ] Confirm **all** exits clear
- [x] Alarm raised
- Call the fire brigade

Stay calm and
keep talking.

### Evacuation
- Use stairs

## Aftercare
Count heads.

# Flood
## Power
- [ ] Cut mains
";

    #[test]
    fn parses_pages_sections_and_blocks() {
        let doc = parse(SAMPLE);
        assert_eq!(doc.pages.len(), 2);
        assert_eq!(doc.pages[0].title, "Fire Response");
        assert_eq!(doc.pages[0].sections.len(), 2);
        assert_eq!(doc.pages[1].sections[0].header, "Power");

        let blocks = &doc.pages[0].sections[0].blocks;
        assert_eq!(blocks.len(), 6);
        assert!(matches!(blocks[0], ContentBlock::Checkbox { checked: false, .. }));
        assert!(matches!(blocks[1], ContentBlock::Checkbox { checked: true, .. }));
        assert_eq!(blocks[2], ContentBlock::bullet("Call the fire brigade"));
        assert_eq!(blocks[3], ContentBlock::paragraph("Stay calm and keep talking."));
        assert_eq!(blocks[4], ContentBlock::header("Evacuation"));
        assert_eq!(blocks[5], ContentBlock::bullet("Use stairs"));
    }

    #[test]
    fn bold_markers_become_spans() {
        let doc = parse(SAMPLE);
        match &doc.pages[0].sections[0].blocks[0] {
            ContentBlock::Checkbox { text, bold, .. } => {
                assert_eq!(text, "Confirm all exits clear");
                assert_eq!(bold, &vec![BoldSpan::new(8, 11)]);
                assert_eq!(&text[8..11], "all");
            }
            other => panic!("expected checkbox, got {other:?}"),
        }
    }

    #[test]
    fn paragraph_flushes_at_section_end() {
        let doc = parse(SAMPLE);
        assert_eq!(
            doc.pages[0].sections[1].blocks,
            vec![ContentBlock::paragraph("Count heads.")]
        );
    }

    #[test]
    fn content_outside_a_section_is_dropped() {
        let doc = parse("stray text\n- stray bullet\n# Page\nintro\n## Section\n- kept\n");
        assert_eq!(doc.pages.len(), 1);
        assert_eq!(doc.pages[0].sections.len(), 1);
        assert_eq!(doc.pages[0].sections[0].blocks, vec![ContentBlock::bullet("kept")]);
    }

    #[test]
    fn section_before_any_page_is_dropped() {
        let doc = parse("## Orphan\n- item\n# Page\n## Real\n");
        assert_eq!(doc.pages.len(), 1);
        assert_eq!(doc.pages[0].sections.len(), 1);
        assert_eq!(doc.pages[0].sections[0].header, "Real");
    }

    #[test]
    fn unmatched_markers_stay_literal() {
        assert_eq!(strip_bold("a ** b"), ("a ** b".to_string(), vec![]));
        assert_eq!(strip_bold("****"), ("****".to_string(), vec![]));
        let (text, spans) = strip_bold("**x** and **y");
        assert_eq!(text, "x and **y");
        assert_eq!(spans, vec![BoldSpan::new(0, 1)]);
    }

    #[test]
    fn bold_spans_use_byte_offsets() {
        let (text, spans) = strip_bold("caf\u{e9} **cr\u{e8}me**");
        assert_eq!(text, "caf\u{e9} cr\u{e8}me");
        assert_eq!(spans, vec![BoldSpan::new(6, 12)]);
        assert_eq!(&text[6..12], "cr\u{e8}me");
    }

    #[test]
    fn crlf_line_endings() {
        let doc = parse("# P\r\n## S\r\n- [ ] one\r\n");
        assert_eq!(doc.pages[0].sections[0].blocks.len(), 1);
        assert_eq!(doc.pages[0].sections[0].header, "S");
    }
}
