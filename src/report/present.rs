// src/report/present.rs
//! Visual grouping of the assembled table: vertical merges and alternating
//! fills over runs of equal group-by values.

use tracing::debug;

use super::sheet::ReportSheet;
use crate::process::records::CellValue;

/// Two-colour fill cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Shade {
    Even,
    Odd,
}

/// Maximal block of data rows (0-based, inclusive) sharing a group value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Run {
    pub first: usize,
    pub last: usize,
    pub shade: Shade,
}

impl Run {
    pub fn len(&self) -> usize {
        self.last - self.first + 1
    }
}

/// A vertical merge of one column over data rows `first..=last`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MergeRange {
    pub col: usize,
    pub first: usize,
    pub last: usize,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SheetLayout {
    pub runs: Vec<Run>,
    pub merges: Vec<MergeRange>,
}

/// Contiguous `(first, last)` spans of equal values in `col`.
pub fn find_runs(rows: &[Vec<CellValue>], col: usize) -> Vec<(usize, usize)> {
    let blank = CellValue::Text(String::new());
    let value = |r: usize| rows[r].get(col).unwrap_or(&blank);

    let mut spans = Vec::new();
    let mut start = 0;
    for r in 1..=rows.len() {
        if r == rows.len() || value(r) != value(start) {
            if r > start {
                spans.push((start, r - 1));
            }
            start = r;
        }
    }
    spans
}

fn shade_for(rows: &[Vec<CellValue>], first: usize, index_col: usize, ordinal: usize) -> Shade {
    let n = match rows[first].get(index_col) {
        Some(CellValue::Integer(n)) => *n as usize,
        _ => ordinal + 1,
    };
    if n % 2 == 0 {
        Shade::Even
    } else {
        Shade::Odd
    }
}

/// Computes the layout for `sheet` and stores it on the sheet.
pub fn present(sheet: &mut ReportSheet, merge_cols: &[usize], group_col: usize, index_col: usize) {
    let mut layout = SheetLayout::default();
    for (ordinal, (first, last)) in find_runs(&sheet.rows, group_col).into_iter().enumerate() {
        let run = Run {
            first,
            last,
            shade: shade_for(&sheet.rows, first, index_col, ordinal),
        };
        if run.len() > 1 {
            layout
                .merges
                .extend(merge_cols.iter().map(|&col| MergeRange { col, first, last }));
        }
        layout.runs.push(run);
    }
    debug!(
        sheet = %sheet.name,
        runs = layout.runs.len(),
        merges = layout.merges.len(),
        "computed layout"
    );
    sheet.layout = Some(layout);
}
