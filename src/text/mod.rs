//! # Text Layout
//!
//! Greedy word wrapping and text measurement.
//!
//! Words are the segments between UAX#14 break opportunities, so a line may
//! end after a space or a hyphen but never inside a word. A word wider than
//! the available width sits alone on its own line and overhangs; it is never
//! cut. Every line of a given size has the same height, whatever its weight.

use std::cell::RefCell;
use std::collections::HashMap;

use serde::Serialize;
use unicode_linebreak::{linebreaks, BreakOpportunity};

use crate::font::{FontMetrics, Weight};

/// Tolerance for "exactly fits" comparisons on accumulated widths.
const FIT_EPSILON: f64 = 1e-6;

/// A piece of input text in a single weight.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InlineRun {
    pub text: String,
    pub weight: Weight,
}

impl InlineRun {
    pub fn new(text: impl Into<String>, weight: Weight) -> Self {
        Self {
            text: text.into(),
            weight,
        }
    }
}

/// A positioned run within a wrapped line. `x` is relative to the line start.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextRun {
    pub text: String,
    pub weight: Weight,
    pub x: f64,
    pub width: f64,
}

/// A line of text after line-breaking.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WrappedLine {
    pub runs: Vec<TextRun>,
    /// Width of the visible text, trailing whitespace excluded.
    pub width: f64,
    pub height: f64,
}

impl WrappedLine {
    /// The line's text with run boundaries removed.
    pub fn text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }
}

/// The plain result of [`TextMeasurer::measure`]: one entry per line.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasuredLine {
    pub text: String,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct WrapKey {
    runs: Vec<InlineRun>,
    size: u64,
    max_width: u64,
}

/// A word plus its trailing whitespace, as a char range.
#[derive(Debug, Clone, Copy)]
struct Segment {
    start: usize,
    end: usize,
    /// Width without trailing whitespace.
    content_width: f64,
    /// Width including trailing whitespace.
    full_width: f64,
    /// A hard line break follows this segment.
    mandatory: bool,
}

/// Wraps text against an injected [`FontMetrics`].
///
/// Results are cached by (runs, size, width) for the life of the measurer,
/// which is one layout pass.
pub struct TextMeasurer<'a> {
    metrics: &'a dyn FontMetrics,
    /// Line height as a multiple of the font size.
    leading: f64,
    cache: RefCell<HashMap<WrapKey, Vec<WrappedLine>>>,
}

impl<'a> TextMeasurer<'a> {
    pub fn new(metrics: &'a dyn FontMetrics, leading: f64) -> Self {
        Self {
            metrics,
            leading,
            cache: RefCell::new(HashMap::new()),
        }
    }

    /// Number of distinct wraps computed so far.
    pub fn cached_entries(&self) -> usize {
        self.cache.borrow().len()
    }

    /// Width of a string on a single line.
    pub fn measure_width(&self, text: &str, weight: Weight, size: f64) -> f64 {
        self.metrics.text_width(text, weight, size)
    }

    /// Fixed line height for text set at `size`.
    pub fn line_height(&self, size: f64) -> f64 {
        size * self.leading
    }

    /// Wrap plain text in one weight into lines no wider than `max_width`.
    pub fn measure(&self, text: &str, weight: Weight, size: f64, max_width: f64) -> Vec<MeasuredLine> {
        self.wrap(&[InlineRun::new(text, weight)], size, max_width)
            .into_iter()
            .map(|line| MeasuredLine {
                text: line.text(),
                width: line.width,
                height: line.height,
            })
            .collect()
    }

    /// Wrap a sequence of weighted runs into lines no wider than `max_width`.
    ///
    /// Always returns at least one line; empty input gives one empty line.
    pub fn wrap(&self, runs: &[InlineRun], size: f64, max_width: f64) -> Vec<WrappedLine> {
        let key = WrapKey {
            runs: runs.to_vec(),
            size: size.to_bits(),
            max_width: max_width.to_bits(),
        };
        if let Some(lines) = self.cache.borrow().get(&key) {
            return lines.clone();
        }
        let lines = self.break_runs(runs, size, max_width);
        self.cache.borrow_mut().insert(key, lines.clone());
        lines
    }

    fn break_runs(&self, runs: &[InlineRun], size: f64, max_width: f64) -> Vec<WrappedLine> {
        let line_height = self.line_height(size);

        let mut text = String::new();
        let mut chars: Vec<(char, Weight)> = Vec::new();
        for run in runs {
            text.push_str(&run.text);
            chars.extend(run.text.chars().map(|ch| (ch, run.weight)));
        }
        let widths: Vec<f64> = chars
            .iter()
            .map(|&(ch, weight)| {
                if is_hard_break(ch) {
                    0.0
                } else {
                    self.metrics.char_width(ch, weight, size)
                }
            })
            .collect();

        let segments = segment(&text, &chars, &widths);

        let mut ranges: Vec<(usize, usize)> = Vec::new();
        // (start, width, has visible text)
        let mut current: Option<(usize, f64, bool)> = None;
        let last = segments.len().saturating_sub(1);

        for (i, seg) in segments.iter().enumerate() {
            let inked = chars[seg.start..seg.end]
                .iter()
                .any(|&(ch, _)| !ch.is_whitespace());
            current = match current {
                Some((start, width, true)) if width + seg.content_width > max_width + FIT_EPSILON => {
                    ranges.push((start, seg.start));
                    Some((seg.start, seg.full_width, inked))
                }
                Some((start, width, true)) => Some((start, width + seg.full_width, true)),
                // Leading whitespace is trimmed from the line, so a line
                // with nothing visible yet restarts at this segment.
                _ => Some((seg.start, seg.full_width, inked)),
            };
            if seg.mandatory && i != last {
                if let Some((start, _, _)) = current.take() {
                    ranges.push((start, seg.end));
                }
            }
        }
        if let Some((start, _, _)) = current {
            ranges.push((start, chars.len()));
        }

        let mut lines: Vec<WrappedLine> = ranges
            .into_iter()
            .map(|(start, end)| make_line(&chars, &widths, start, end, line_height))
            .collect();
        if lines.is_empty() {
            lines.push(WrappedLine {
                runs: Vec::new(),
                width: 0.0,
                height: line_height,
            });
        }
        lines
    }
}

fn is_hard_break(ch: char) -> bool {
    matches!(ch, '\n' | '\r' | '\u{2028}' | '\u{2029}')
}

/// Split text into segments at UAX#14 break opportunities.
fn segment(text: &str, chars: &[(char, Weight)], widths: &[f64]) -> Vec<Segment> {
    // linebreaks() yields byte offsets; segments are tracked in chars.
    let mut byte_to_char = vec![0usize; text.len() + 1];
    for (char_idx, (byte_idx, _)) in text.char_indices().enumerate() {
        byte_to_char[byte_idx] = char_idx;
    }
    byte_to_char[text.len()] = chars.len();

    let mut segments = Vec::new();
    let mut start = 0;
    for (byte_offset, opp) in linebreaks(text) {
        let end = byte_to_char[byte_offset];
        if end <= start {
            continue;
        }
        let full_width: f64 = widths[start..end].iter().sum();
        let trailing: f64 = (start..end)
            .rev()
            .take_while(|&i| chars[i].0.is_whitespace())
            .map(|i| widths[i])
            .sum();
        segments.push(Segment {
            start,
            end,
            content_width: full_width - trailing,
            full_width,
            mandatory: matches!(opp, BreakOpportunity::Mandatory),
        });
        start = end;
    }
    segments
}

/// Build a line from a char range, trimming surrounding whitespace and
/// grouping consecutive characters of the same weight into runs.
fn make_line(
    chars: &[(char, Weight)],
    widths: &[f64],
    mut start: usize,
    mut end: usize,
    height: f64,
) -> WrappedLine {
    while start < end && chars[start].0.is_whitespace() {
        start += 1;
    }
    while end > start && chars[end - 1].0.is_whitespace() {
        end -= 1;
    }

    let mut runs: Vec<TextRun> = Vec::new();
    let mut x = 0.0;
    for i in start..end {
        let (ch, weight) = chars[i];
        match runs.last_mut() {
            Some(run) if run.weight == weight => {
                run.text.push(ch);
                run.width += widths[i];
            }
            _ => runs.push(TextRun {
                text: ch.to_string(),
                weight,
                x,
                width: widths[i],
            }),
        }
        x += widths[i];
    }

    WrappedLine {
        runs,
        width: x,
        height,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::{FontContext, StandardFamily};

    /// Courier at 10pt: every glyph is 6pt wide, lines are 20pt tall.
    fn courier() -> FontContext {
        FontContext::standard(StandardFamily::Courier)
    }

    #[test]
    fn test_single_line() {
        let fc = courier();
        let tm = TextMeasurer::new(&fc, 2.0);
        let lines = tm.measure("Hello World", Weight::Regular, 10.0, 200.0);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].text, "Hello World");
        assert!((lines[0].width - 66.0).abs() < 1e-9);
        assert!((lines[0].height - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_line_break_at_space() {
        let fc = courier();
        let tm = TextMeasurer::new(&fc, 2.0);
        let lines = tm.measure("Hello World", Weight::Regular, 10.0, 40.0);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].text, "Hello");
        assert!((lines[0].width - 30.0).abs() < 1e-9);
        assert_eq!(lines[1].text, "World");
    }

    #[test]
    fn test_exact_fit_stays_on_one_line() {
        let fc = courier();
        let tm = TextMeasurer::new(&fc, 2.0);
        // 9 chars * 6pt = 54pt
        let lines = tm.measure("aaaa bbbb", Weight::Regular, 10.0, 54.0);
        assert_eq!(lines.len(), 1);
    }

    #[test]
    fn test_overlong_word_sits_alone_untruncated() {
        let fc = courier();
        let tm = TextMeasurer::new(&fc, 2.0);
        let token = "x".repeat(500);
        let text = format!("go {} now", token);
        let lines = tm.measure(&text, Weight::Regular, 10.0, 100.0);
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].text, "go");
        assert_eq!(lines[1].text, token);
        assert!((lines[1].width - 3000.0).abs() < 1e-6);
        assert_eq!(lines[2].text, "now");
    }

    #[test]
    fn test_explicit_newline() {
        let fc = courier();
        let tm = TextMeasurer::new(&fc, 2.0);
        let lines = tm.measure("Hello\nWorld", Weight::Regular, 10.0, 200.0);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].text, "Hello");
        assert_eq!(lines[1].text, "World");
    }

    #[test]
    fn test_empty_string() {
        let fc = courier();
        let tm = TextMeasurer::new(&fc, 2.0);
        let lines = tm.measure("", Weight::Regular, 10.0, 200.0);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].width, 0.0);
        assert!((lines[0].height - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_bold_runs_share_a_line() {
        let fc = courier();
        let tm = TextMeasurer::new(&fc, 2.0);
        let runs = [
            InlineRun::new("Call ", Weight::Regular),
            InlineRun::new("now", Weight::Bold),
        ];
        let lines = tm.wrap(&runs, 10.0, 200.0);
        assert_eq!(lines.len(), 1);
        let line = &lines[0];
        assert_eq!(line.runs.len(), 2);
        assert_eq!(line.runs[1].text, "now");
        assert_eq!(line.runs[1].weight, Weight::Bold);
        assert!((line.runs[1].x - 30.0).abs() < 1e-9);
        assert_eq!(line.text(), "Call now");
    }

    #[test]
    fn test_bold_word_wraps_with_its_weight() {
        let fc = courier();
        let tm = TextMeasurer::new(&fc, 2.0);
        let runs = [
            InlineRun::new("Check the ", Weight::Regular),
            InlineRun::new("exits", Weight::Bold),
        ];
        let lines = tm.wrap(&runs, 10.0, 60.0);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].text(), "Check the");
        assert_eq!(lines[1].runs[0].weight, Weight::Bold);
        assert_eq!(lines[1].runs[0].x, 0.0);
    }

    #[test]
    fn test_results_are_cached() {
        let fc = courier();
        let tm = TextMeasurer::new(&fc, 2.0);
        let a = tm.measure("repeat me", Weight::Regular, 10.0, 30.0);
        let b = tm.measure("repeat me", Weight::Regular, 10.0, 30.0);
        assert_eq!(a, b);
        assert_eq!(tm.cached_entries(), 1);
        tm.measure("repeat me", Weight::Regular, 10.0, 31.0);
        assert_eq!(tm.cached_entries(), 2);
    }

    #[test]
    fn test_leading_whitespace_never_makes_an_empty_line() {
        let fc = courier();
        let tm = TextMeasurer::new(&fc, 2.0);
        // 10 chars * 6pt = 60pt, the whole width, after three spaces
        let lines = tm.measure("   xxxxxxxxxx", Weight::Regular, 10.0, 60.0);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].text, "xxxxxxxxxx");

        let lines = tm.measure("   aaaa bbbb", Weight::Regular, 10.0, 54.0);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].text, "aaaa bbbb");
    }

    #[test]
    fn test_blank_line_between_hard_breaks_is_kept() {
        let fc = courier();
        let tm = TextMeasurer::new(&fc, 2.0);
        let lines = tm.measure("a\n  \nb", Weight::Regular, 10.0, 200.0);
        let texts: Vec<&str> = lines.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, ["a", "", "b"]);
    }

    #[test]
    fn test_line_height_is_size_times_leading() {
        let fc = courier();
        let tm = TextMeasurer::new(&fc, 3.0);
        assert!((tm.line_height(8.0) - 24.0).abs() < 1e-9);
        let lines = tm.measure("bold or not", Weight::Bold, 8.0, 200.0);
        assert!((lines[0].height - 24.0).abs() < 1e-9);
    }

    #[test]
    fn test_helvetica_measures_proportionally() {
        let fc = FontContext::default();
        let tm = TextMeasurer::new(&fc, 2.0);
        assert!(tm.measure_width("WWW", Weight::Regular, 10.0) > tm.measure_width("iii", Weight::Regular, 10.0));
    }
}
