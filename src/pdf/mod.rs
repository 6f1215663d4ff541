//! # PDF Serializer
//!
//! Takes the laid-out pages from the layout engine and writes a valid PDF file.
//!
//! This is a from-scratch PDF 1.7 writer. The layout engine hands over
//! [`DrawCommand`]s in top-left-origin points; this module flips them into
//! PDF's bottom-left space and emits the operators. Checklists only need
//! text in two weights, boxes, and lines, so the subset is small.
//!
//! ## PDF Structure (simplified)
//!
//! ```text
//! %PDF-1.7            <- header
//! 1 0 obj ... endobj  <- objects (fonts, pages, content streams, etc.)
//! 2 0 obj ... endobj
//! ...
//! xref                <- cross-reference table (byte offsets of each object)
//! trailer             <- points to the root object
//! %%EOF
//! ```
//!
//! Text is encoded with WinAnsiEncoding. Standard fonts are referenced by
//! name; TrueType faces are embedded whole as simple fonts with a `/Widths`
//! array over the same encoding.

use std::collections::BTreeSet;
use std::fmt::Write as FmtWrite; // for write! on String
use std::io::Write as IoWrite; // for write! on Vec<u8>

use log::warn;
use miniz_oxide::deflate::compress_to_vec_zlib;

use crate::font::{FontContext, FontFaces, TrueTypeFace, Weight};
use crate::layout::{DrawCommand, PhysicalPage};
use crate::model::Metadata;

/// Stroke width of checkbox outlines.
const BOX_STROKE: f64 = 0.75;

/// Windows-1252 code points outside the Latin-1 ranges.
const WINANSI_SPECIALS: [(char, u8); 27] = [
    ('\u{20AC}', 0x80), // Euro sign
    ('\u{201A}', 0x82),
    ('\u{0192}', 0x83),
    ('\u{201E}', 0x84),
    ('\u{2026}', 0x85), // Horizontal ellipsis
    ('\u{2020}', 0x86),
    ('\u{2021}', 0x87),
    ('\u{02C6}', 0x88),
    ('\u{2030}', 0x89),
    ('\u{0160}', 0x8A),
    ('\u{2039}', 0x8B),
    ('\u{0152}', 0x8C),
    ('\u{017D}', 0x8E),
    ('\u{2018}', 0x91), // Curly quotes
    ('\u{2019}', 0x92),
    ('\u{201C}', 0x93),
    ('\u{201D}', 0x94),
    ('\u{2022}', 0x95), // Bullet
    ('\u{2013}', 0x96), // En dash
    ('\u{2014}', 0x97), // Em dash
    ('\u{02DC}', 0x98),
    ('\u{2122}', 0x99), // Trade mark sign
    ('\u{0161}', 0x9A),
    ('\u{203A}', 0x9B),
    ('\u{0153}', 0x9C),
    ('\u{017E}', 0x9E),
    ('\u{0178}', 0x9F),
];

#[derive(Default)]
pub struct PdfWriter;

/// Tracks allocated PDF objects during writing.
struct PdfBuilder {
    objects: Vec<PdfObject>,
    /// Object ids of the regular (`/F0`) and bold (`/F1`) fonts.
    font_objects: [usize; 2],
    /// Characters that had no WinAnsi code and were replaced.
    unencodable: BTreeSet<char>,
}

struct PdfObject {
    data: Vec<u8>,
}

impl PdfBuilder {
    fn push(&mut self, data: Vec<u8>) -> usize {
        self.objects.push(PdfObject { data });
        self.objects.len() - 1
    }
}

impl PdfWriter {
    pub fn new() -> Self {
        Self
    }

    /// Write laid-out pages to a PDF byte vector.
    pub fn write(&self, pages: &[PhysicalPage], metadata: &Metadata, font_context: &FontContext) -> Vec<u8> {
        let mut builder = PdfBuilder {
            objects: Vec::new(),
            font_objects: [0; 2],
            unencodable: BTreeSet::new(),
        };

        // Reserve object IDs:
        // 0 = placeholder (PDF objects are 1-indexed)
        // 1 = Catalog
        // 2 = Pages (page tree root)
        // 3+ = fonts, then content streams and page objects
        for _ in 0..3 {
            builder.push(Vec::new());
        }

        self.register_fonts(&mut builder, font_context);

        let mut page_obj_ids: Vec<usize> = Vec::new();
        for page in pages {
            let content = self.build_content_stream(page, &mut builder.unencodable);
            let compressed = compress_to_vec_zlib(&content, 6);

            let mut content_data: Vec<u8> = Vec::new();
            let _ = write!(
                content_data,
                "<< /Length {} /Filter /FlateDecode >>\nstream\n",
                compressed.len()
            );
            content_data.extend_from_slice(&compressed);
            content_data.extend_from_slice(b"\nendstream");
            let content_obj_id = builder.push(content_data);

            let page_dict = format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {:.2} {:.2}] \
                 /Contents {} 0 R /Resources << /Font << /F0 {} 0 R /F1 {} 0 R >> >> >>",
                page.width,
                page.height,
                content_obj_id,
                builder.font_objects[0],
                builder.font_objects[1]
            );
            page_obj_ids.push(builder.push(page_dict.into_bytes()));
        }

        builder.objects[1].data = b"<< /Type /Catalog /Pages 2 0 R >>".to_vec();

        let kids: String = page_obj_ids
            .iter()
            .map(|id| format!("{} 0 R", id))
            .collect::<Vec<_>>()
            .join(" ");
        builder.objects[2].data = format!(
            "<< /Type /Pages /Kids [{}] /Count {} >>",
            kids,
            page_obj_ids.len()
        )
        .into_bytes();

        let mut info: Vec<u8> = b"<< ".to_vec();
        let fields = [
            ("Title", &metadata.title),
            ("Author", &metadata.author),
            ("Subject", &metadata.subject),
        ];
        for (key, value) in fields {
            if let Some(value) = value {
                let _ = write!(info, "/{} (", key);
                info.extend(encode_text(value, &mut builder.unencodable));
                info.extend_from_slice(b") ");
            }
        }
        info.extend_from_slice(b"/Producer (checksheet) /Creator (checksheet) >>");
        let info_obj_id = builder.push(info);

        if !builder.unencodable.is_empty() {
            let chars: String = builder.unencodable.iter().collect();
            warn!("no WinAnsi code for {:?}; replaced with '?'", chars);
        }

        self.serialize(&builder, info_obj_id)
    }

    /// Build the content stream for a single page.
    fn build_content_stream(&self, page: &PhysicalPage, unencodable: &mut BTreeSet<char>) -> Vec<u8> {
        let mut stream: Vec<u8> = Vec::new();
        let flip = |y: f64| page.height - y;

        for command in page.draw_commands() {
            match command {
                DrawCommand::BeginPage { .. } => {}
                DrawCommand::Text {
                    x,
                    y,
                    size,
                    weight,
                    color,
                    text,
                } => {
                    let font = match weight {
                        Weight::Regular => 0,
                        Weight::Bold => 1,
                    };
                    // Fill colour outlives ET, so coloured text gets its own q/Q.
                    let colored = !color.is_black();
                    if colored {
                        let _ = write!(stream, "q {:.3} {:.3} {:.3} rg ", color.r, color.g, color.b);
                    }
                    stream.extend_from_slice(b"BT ");
                    let _ = write!(
                        stream,
                        "/F{} {:.2} Tf {:.2} {:.2} Td (",
                        font,
                        size,
                        x,
                        flip(y)
                    );
                    stream.extend(encode_text(&text, unencodable));
                    stream.extend_from_slice(b") Tj ET");
                    stream.extend_from_slice(if colored { b" Q\n" } else { b"\n" });
                }
                DrawCommand::Rect {
                    x,
                    y,
                    width,
                    height,
                    fill,
                    stroke,
                    line_width,
                } => {
                    stream.extend_from_slice(b"q\n");
                    if let Some(c) = fill {
                        let _ = write!(stream, "{:.3} {:.3} {:.3} rg\n", c.r, c.g, c.b);
                    }
                    if let Some(c) = stroke {
                        let _ = write!(
                            stream,
                            "{:.3} {:.3} {:.3} RG\n{:.2} w\n",
                            c.r, c.g, c.b, line_width
                        );
                    }
                    let paint = match (fill.is_some(), stroke.is_some()) {
                        (true, true) => "B",
                        (true, false) => "f",
                        (false, true) => "S",
                        (false, false) => "n",
                    };
                    let _ = write!(
                        stream,
                        "{:.2} {:.2} {:.2} {:.2} re\n{}\nQ\n",
                        x,
                        flip(y + height),
                        width,
                        height,
                        paint
                    );
                }
                DrawCommand::CheckBox {
                    x,
                    y,
                    size,
                    checked,
                } => {
                    let bottom = flip(y + size);
                    let _ = write!(
                        stream,
                        "{:.2} w {:.2} {:.2} {:.2} {:.2} re S\n",
                        BOX_STROKE, x, bottom, size, size
                    );
                    if checked {
                        let _ = write!(
                            stream,
                            "{:.2} {:.2} m {:.2} {:.2} l {:.2} {:.2} l S\n",
                            x + size * 0.2,
                            bottom + size * 0.5,
                            x + size * 0.4,
                            bottom + size * 0.2,
                            x + size * 0.8,
                            bottom + size * 0.8
                        );
                    }
                }
                DrawCommand::Rule {
                    x1,
                    y1,
                    x2,
                    y2,
                    width,
                } => {
                    let _ = write!(
                        stream,
                        "{:.2} w {:.2} {:.2} m {:.2} {:.2} l S\n",
                        width,
                        x1,
                        flip(y1),
                        x2,
                        flip(y2)
                    );
                }
            }
        }

        stream
    }

    /// Register the regular and bold fonts as `/F0` and `/F1`.
    fn register_fonts(&self, builder: &mut PdfBuilder, font_context: &FontContext) {
        match font_context.faces() {
            FontFaces::Standard(family) => {
                for (slot, weight) in [Weight::Regular, Weight::Bold].into_iter().enumerate() {
                    let font_dict = format!(
                        "<< /Type /Font /Subtype /Type1 /BaseFont /{} \
                         /Encoding /WinAnsiEncoding >>",
                        family.pdf_name(weight)
                    );
                    builder.font_objects[slot] = builder.push(font_dict.into_bytes());
                }
            }
            FontFaces::TrueType { regular, bold } => {
                builder.font_objects[0] = self.write_truetype_font(builder, regular, false);
                builder.font_objects[1] = self.write_truetype_font(builder, bold, true);
            }
        }
    }

    /// Embed a TrueType face as a simple font: FontFile2, FontDescriptor,
    /// then the font dictionary. Returns the font dictionary's id.
    fn write_truetype_font(&self, builder: &mut PdfBuilder, face: &TrueTypeFace, bold: bool) -> usize {
        let metrics = &face.metrics;

        let compressed = compress_to_vec_zlib(&face.data, 6);
        let mut font_file: Vec<u8> = Vec::new();
        let _ = write!(
            font_file,
            "<< /Length {} /Length1 {} /Filter /FlateDecode >>\nstream\n",
            compressed.len(),
            face.data.len()
        );
        font_file.extend_from_slice(&compressed);
        font_file.extend_from_slice(b"\nendstream");
        let font_file_id = builder.push(font_file);

        let scale = 1000.0 / metrics.units_per_em as f64;
        let to_pdf = |v: i16| (v as f64 * scale) as i32;
        let (x_min, y_min, x_max, y_max) = metrics.bbox;
        // Flag 32: nonsymbolic, glyphs drawn from the standard Latin set.
        let descriptor = format!(
            "<< /Type /FontDescriptor /FontName /{} /Flags 32 \
             /FontBBox [{} {} {} {}] /ItalicAngle 0 \
             /Ascent {} /Descent {} /CapHeight {} /StemV {} \
             /FontFile2 {} 0 R >>",
            face.name,
            to_pdf(x_min),
            to_pdf(y_min),
            to_pdf(x_max),
            to_pdf(y_max),
            to_pdf(metrics.ascender),
            to_pdf(metrics.descender),
            to_pdf(metrics.cap_height),
            if bold { 120 } else { 80 },
            font_file_id
        );
        let descriptor_id = builder.push(descriptor.into_bytes());

        let mut widths = String::new();
        for code in 32u8..=255 {
            let units = winansi_to_unicode(code)
                .map(|ch| metrics.advance_units(ch))
                .unwrap_or(metrics.default_advance);
            let _ = write!(widths, "{} ", (units as f64 * scale).round() as i32);
        }
        let font_dict = format!(
            "<< /Type /Font /Subtype /TrueType /BaseFont /{} \
             /FirstChar 32 /LastChar 255 /Widths [{}] \
             /FontDescriptor {} 0 R /Encoding /WinAnsiEncoding >>",
            face.name,
            widths.trim_end(),
            descriptor_id
        );
        builder.push(font_dict.into_bytes())
    }

    /// Serialize all objects into the final PDF byte stream.
    fn serialize(&self, builder: &PdfBuilder, info_obj_id: usize) -> Vec<u8> {
        let mut output: Vec<u8> = Vec::new();
        let mut offsets: Vec<usize> = vec![0; builder.objects.len()];

        output.extend_from_slice(b"%PDF-1.7\n");
        output.extend_from_slice(b"%\xe2\xe3\xcf\xd3\n");

        for (i, obj) in builder.objects.iter().enumerate().skip(1) {
            offsets[i] = output.len();
            let _ = write!(output, "{} 0 obj\n", i);
            output.extend_from_slice(&obj.data);
            output.extend_from_slice(b"\nendobj\n\n");
        }

        let xref_offset = output.len();
        let _ = write!(output, "xref\n0 {}\n", builder.objects.len());
        let _ = write!(output, "0000000000 65535 f \n");
        for offset in offsets.iter().skip(1) {
            let _ = write!(output, "{:010} 00000 n \n", offset);
        }

        let _ = write!(
            output,
            "trailer\n<< /Size {} /Root 1 0 R /Info {} 0 R >>\nstartxref\n{}\n%%EOF\n",
            builder.objects.len(),
            info_obj_id,
            xref_offset
        );

        output
    }
}

/// Map a Unicode character to its WinAnsiEncoding byte.
///
/// WinAnsiEncoding is Windows-1252: printable ASCII and most of Latin-1 map
/// directly, and 0x80..=0x9F holds quotes, dashes, the bullet and a few
/// letters.
fn unicode_to_winansi(ch: char) -> Option<u8> {
    let cp = ch as u32;
    if (0x20..=0x7E).contains(&cp) || (0xA0..=0xFF).contains(&cp) {
        return Some(cp as u8);
    }
    WINANSI_SPECIALS
        .iter()
        .find(|(c, _)| *c == ch)
        .map(|(_, code)| *code)
}

fn winansi_to_unicode(code: u8) -> Option<char> {
    match code {
        0x20..=0x7E | 0xA0..=0xFF => Some(code as char),
        _ => WINANSI_SPECIALS
            .iter()
            .find(|(_, c)| *c == code)
            .map(|(ch, _)| *ch),
    }
}

/// Encode text as the body of a PDF literal string: WinAnsi bytes with
/// delimiters escaped and high bytes written as octal escapes.
fn encode_text(text: &str, unencodable: &mut BTreeSet<char>) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len());
    for ch in text.chars() {
        let byte = match unicode_to_winansi(ch) {
            Some(b) => b,
            None if ch == '\t' => b' ',
            None => {
                unencodable.insert(ch);
                b'?'
            }
        };
        match byte {
            b'(' | b')' | b'\\' => {
                out.push(b'\\');
                out.push(byte);
            }
            0x80..=0xFF => {
                let _ = write!(out, "\\{:03o}", byte);
            }
            _ => out.push(byte),
        }
    }
    out
}
