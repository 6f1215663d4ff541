//! # Column Break Decisions
//!
//! Logic for deciding how much of a line sequence goes into the current
//! column. Lines are atomic: a break only ever falls between two lines.
//!
//! Two rules shape the cut beyond plain greedy filling. A line marked
//! `keep_with_next` (a header) is never left at the bottom of a column
//! without its followers. And a column that is still empty always takes at
//! least one line, even one taller than the column, so layout terminates.

use super::render::{rendered_height, RenderedLine};

/// Tolerance for "exactly fits" comparisons on accumulated heights.
const FIT_EPSILON: f64 = 1e-6;

/// What to do with a line sequence in the current column.
#[derive(Debug, Clone, PartialEq)]
pub enum BreakDecision {
    /// Everything fits.
    Place,
    /// Nothing goes here; continue in the next column.
    MoveToNextColumn,
    /// Place the first lines here and carry the rest over.
    Split {
        /// How many lines fit in the current column.
        lines_in_column: usize,
    },
    /// The column is empty and its first line is taller than the column.
    /// Place that line anyway.
    ForceOne,
}

/// Given the remaining height of a column and the lines waiting to be
/// placed, decide where to cut.
pub fn decide_break(remaining_height: f64, lines: &[RenderedLine], column_empty: bool) -> BreakDecision {
    if lines.is_empty() {
        return BreakDecision::Place;
    }

    // Greedy fill: stop before the first line that would overflow.
    let mut running = 0.0;
    let mut fit_count = 0;
    for line in lines {
        if running + line.height > remaining_height + FIT_EPSILON {
            break;
        }
        running += line.height;
        fit_count += 1;
    }

    if fit_count == lines.len() {
        return BreakDecision::Place;
    }

    // Pull back any header left without enough of its followers.
    let mut kept = fit_count;
    while let Some(i) = orphaned_keeper(lines, kept) {
        kept = i;
    }

    if kept > 0 {
        return BreakDecision::Split {
            lines_in_column: kept,
        };
    }
    if !column_empty {
        return BreakDecision::MoveToNextColumn;
    }

    // An empty column must make progress, keep rules or not.
    if fit_count > 0 {
        BreakDecision::Split {
            lines_in_column: fit_count,
        }
    } else {
        BreakDecision::ForceOne
    }
}

/// The last of the first `placed` lines that wants more followers in its
/// column than it would get.
fn orphaned_keeper(lines: &[RenderedLine], placed: usize) -> Option<usize> {
    (0..placed)
        .rev()
        .find(|&i| lines[i].keep_with_next > placed - 1 - i)
}

/// The outcome of packing one column.
#[derive(Debug, Clone, PartialEq)]
pub struct PackResult {
    pub placed: Vec<RenderedLine>,
    pub remainder: Vec<RenderedLine>,
    pub used_height: f64,
    /// The single placed line is taller than the space it was given.
    pub forced: bool,
}

/// Fill a column greedily from the front of `lines`.
///
/// Returns the lines placed, the lines left over for the next column, and the
/// height the placed lines use. `column_empty` enables the forced-overflow
/// rule: with nothing placed yet, at least one line is always taken.
pub fn pack(mut lines: Vec<RenderedLine>, available_height: f64, column_empty: bool) -> PackResult {
    let decision = decide_break(available_height, &lines, column_empty);
    let count = match decision {
        BreakDecision::Place => lines.len(),
        BreakDecision::MoveToNextColumn => 0,
        BreakDecision::Split { lines_in_column } => lines_in_column,
        BreakDecision::ForceOne => 1,
    };
    let remainder = lines.split_off(count);
    PackResult {
        used_height: rendered_height(&lines),
        placed: lines,
        remainder,
        forced: decision == BreakDecision::ForceOne,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::Weight;
    use crate::layout::render::LineKind;

    fn line(height: f64) -> RenderedLine {
        RenderedLine {
            kind: LineKind::Body,
            style: Weight::Regular,
            runs: vec![],
            width: 0.0,
            height,
            text_top: 0.0,
            line_height: height,
            size: 10.0,
            indent: 0.0,
            marker: None,
            keep_with_next: 0,
            section: 0,
        }
    }

    fn header(height: f64, keep: usize) -> RenderedLine {
        RenderedLine {
            kind: LineKind::SectionHeader,
            style: Weight::Bold,
            keep_with_next: keep,
            ..line(height)
        }
    }

    #[test]
    fn everything_fits() {
        let lines = vec![line(20.0), line(30.0), line(40.0)];
        assert_eq!(decide_break(100.0, &lines, false), BreakDecision::Place);
    }

    #[test]
    fn exact_fit_is_placed() {
        let lines = vec![line(20.0), line(30.0), line(50.0)];
        assert_eq!(decide_break(100.0, &lines, false), BreakDecision::Place);
    }

    #[test]
    fn split_at_right_point() {
        let lines = vec![line(20.0), line(30.0), line(40.0)];
        assert_eq!(
            decide_break(55.0, &lines, false),
            BreakDecision::Split { lines_in_column: 2 }
        );
    }

    #[test]
    fn nothing_fits_in_a_partly_filled_column() {
        let lines = vec![line(20.0)];
        assert_eq!(decide_break(10.0, &lines, false), BreakDecision::MoveToNextColumn);
    }

    #[test]
    fn oversized_line_is_forced_into_an_empty_column() {
        let lines = vec![line(900.0), line(20.0)];
        let result = pack(lines, 500.0, true);
        assert!(result.forced);
        assert_eq!(result.placed.len(), 1);
        assert_eq!(result.remainder.len(), 1);
        assert!((result.used_height - 900.0).abs() < 1e-9);
    }

    #[test]
    fn header_is_not_orphaned() {
        // Body fills 80 of 100; the header fits but its first line does not.
        let lines = vec![line(40.0), line(40.0), header(20.0, 1), line(20.0)];
        assert_eq!(
            decide_break(100.0, &lines, false),
            BreakDecision::Split { lines_in_column: 2 }
        );
    }

    #[test]
    fn header_leading_the_sequence_moves_to_next_column() {
        let lines = vec![header(20.0, 1), line(20.0)];
        assert_eq!(decide_break(30.0, &lines, false), BreakDecision::MoveToNextColumn);
    }

    #[test]
    fn header_threshold_of_two_lines() {
        let lines = vec![header(20.0, 2), line(20.0), line(20.0), line(20.0)];
        // Header plus one follower fits, but two are required.
        assert_eq!(decide_break(50.0, &lines, false), BreakDecision::MoveToNextColumn);
        assert_eq!(
            decide_break(60.0, &lines, false),
            BreakDecision::Split { lines_in_column: 3 }
        );
    }

    #[test]
    fn stacked_headers_move_together() {
        let lines = vec![line(20.0), header(20.0, 1), header(20.0, 1), line(20.0)];
        assert_eq!(
            decide_break(60.0, &lines, false),
            BreakDecision::Split { lines_in_column: 1 }
        );
    }

    #[test]
    fn empty_column_ignores_keep_rule_to_make_progress() {
        let lines = vec![header(20.0, 1), line(900.0)];
        assert_eq!(
            decide_break(500.0, &lines, true),
            BreakDecision::Split { lines_in_column: 1 }
        );
    }

    #[test]
    fn pack_preserves_order_and_reports_remainder() {
        let lines: Vec<RenderedLine> = (1..=5).map(|i| line(i as f64 * 10.0)).collect();
        let result = pack(lines, 60.0, true);
        let placed: Vec<f64> = result.placed.iter().map(|l| l.height).collect();
        let rest: Vec<f64> = result.remainder.iter().map(|l| l.height).collect();
        assert_eq!(placed, vec![10.0, 20.0, 30.0]);
        assert_eq!(rest, vec![40.0, 50.0]);
        assert!((result.used_height - 60.0).abs() < 1e-9);
        assert!(!result.forced);
    }
}
