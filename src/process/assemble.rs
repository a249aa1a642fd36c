// src/process/assemble.rs

use chrono::NaiveDateTime;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::RowError;
use crate::mapping::Mapping;
use crate::process::column::cell;
use crate::process::expand::expand_row;
use crate::process::normalize::{build_home_id, parse_timestamp};
use crate::process::records::PersonRecord;

/// A source row dropped because a later submission has the same HomeID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateReport {
    pub home_id: String,
    pub dropped_row: usize,
    pub kept_row: usize,
}

/// Result of assembling one sheet.
#[derive(Debug, Default)]
pub struct AssembledTable {
    pub records: Vec<PersonRecord>,
    pub duplicates: Vec<DuplicateReport>,
    pub failures: Vec<RowError>,
    /// Number of non-empty data rows seen.
    pub rows_read: usize,
    /// Number of households written (== highest display index).
    pub households: usize,
}

impl AssembledTable {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

struct KeyedRow {
    row_number: usize,
    home_id: String,
    timestamp: Option<NaiveDateTime>,
    cells: Vec<String>,
}

/// Pads every row with empty strings up to `width`.
pub fn pad_rows(rows: &[Vec<String>], width: usize) -> Vec<Vec<String>> {
    rows.iter()
        .map(|row| {
            let mut padded = row.clone();
            if padded.len() < width {
                padded.resize(width, String::new());
            }
            padded
        })
        .collect()
}

/// Assembles a full sheet snapshot whose first row is the header.
pub fn assemble_sheet(values: &[Vec<String>], mapping: &Mapping) -> AssembledTable {
    let width = values.iter().map(Vec::len).max().unwrap_or(0);
    match values.split_first() {
        Some((_header, data)) => assemble_rows(data, width, mapping),
        None => AssembledTable::default(),
    }
}

/// Pads, sorts, deduplicates and expands data rows (header excluded).
pub fn assemble_rows(rows: &[Vec<String>], width: usize, mapping: &Mapping) -> AssembledTable {
    let key = mapping.key;
    let mut keyed: Vec<KeyedRow> = pad_rows(rows, width)
        .into_iter()
        .enumerate()
        .filter_map(|(i, cells)| {
            let row_number = i + 1;
            let (block, floor, unit) = (
                cell(&cells, key.block),
                cell(&cells, key.floor),
                cell(&cells, key.unit),
            );
            if [block, floor, unit].iter().all(|s| s.trim().is_empty()) {
                debug!(row = row_number, "skipping empty row");
                return None;
            }
            let ts_text = cell(&cells, key.timestamp);
            let timestamp = parse_timestamp(ts_text, &mapping.timestamp_format);
            if timestamp.is_none() && !ts_text.trim().is_empty() {
                debug!(row = row_number, value = ts_text, "unparseable timestamp, sorting as oldest");
            }
            Some(KeyedRow {
                row_number,
                home_id: build_home_id(block, floor, unit),
                timestamp,
                cells,
            })
        })
        .collect();

    let mut table = AssembledTable {
        rows_read: keyed.len(),
        ..Default::default()
    };

    // HomeID ascending, newest submission first, later source row first on ties
    keyed.sort_by(|a, b| {
        a.home_id
            .cmp(&b.home_id)
            .then_with(|| b.timestamp.cmp(&a.timestamp))
            .then_with(|| b.row_number.cmp(&a.row_number))
    });

    let mut survivors: Vec<KeyedRow> = Vec::with_capacity(keyed.len());
    for row in keyed {
        if let Some(kept) = survivors.last() {
            if kept.home_id == row.home_id {
                warn!(
                    home_id = %row.home_id,
                    row = row.row_number,
                    kept_row = kept.row_number,
                    "duplicate HomeID, keeping the latest submission"
                );
                table.duplicates.push(DuplicateReport {
                    home_id: row.home_id.clone(),
                    dropped_row: row.row_number,
                    kept_row: kept.row_number,
                });
                continue;
            }
        }
        survivors.push(row);
    }

    for row in survivors {
        match expand_row(&row.cells, row.row_number, table.households + 1, mapping) {
            Ok(records) => {
                table.households += 1;
                table.records.extend(records);
            }
            Err(e) => {
                warn!(row = row.row_number, error = %e, "skipping row");
                table.failures.push(e);
            }
        }
    }

    table
}
