// src/pipeline.rs
//! End-to-end conversion of one spreadsheet into one report workbook.

use std::{collections::HashSet, path::Path};
use tracing::{debug, info, info_span, instrument, warn};

use crate::error::{PipelineError, SheetError};
use crate::fetch::{SheetInfo, SheetSource, Snapshot, SnapshotSource, VALUE_COLUMNS};
use crate::mapping::Mapping;
use crate::process::assemble_sheet;
use crate::report::{present, sanitize_sheet_name, write_workbook, ReportSheet};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SheetStatus {
    Written {
        worksheet: String,
        households: usize,
        people: usize,
        duplicates: usize,
        failed_rows: usize,
    },
    Skipped(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetOutcome {
    pub title: String,
    pub status: SheetStatus,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub sheets: Vec<SheetOutcome>,
}

impl RunSummary {
    pub fn processed(&self) -> usize {
        self.sheets
            .iter()
            .filter(|s| matches!(s.status, SheetStatus::Written { .. }))
            .count()
    }

    pub fn people(&self) -> usize {
        self.sheets
            .iter()
            .map(|s| match s.status {
                SheetStatus::Written { people, .. } => people,
                SheetStatus::Skipped(_) => 0,
            })
            .sum()
    }
}

/// Visible sheets, or every sheet when all of them are hidden.
pub fn select_sheets(all: Vec<SheetInfo>) -> Vec<SheetInfo> {
    let visible: Vec<SheetInfo> = all.iter().filter(|s| !s.hidden).cloned().collect();
    if visible.is_empty() {
        warn!("all sheets are hidden, using all sheets instead");
        all
    } else {
        visible
    }
}

fn build_sheet<S: SheetSource>(
    source: &S,
    doc_id: &str,
    info: &SheetInfo,
    mapping: &Mapping,
    used_names: &mut HashSet<String>,
) -> Result<(ReportSheet, SheetStatus), SheetError> {
    let values = source
        .get_values(doc_id, &info.title, VALUE_COLUMNS)
        .map_err(|source| SheetError::Fetch {
            sheet: info.title.clone(),
            source,
        })?;
    if values.is_empty() {
        return Err(SheetError::NoValidData(info.title.clone()));
    }

    let table = assemble_sheet(&values, mapping);
    debug!(
        rows = table.rows_read,
        households = table.households,
        failed = table.failures.len(),
        "assembled sheet"
    );
    if table.is_empty() {
        return Err(SheetError::NoValidData(info.title.clone()));
    }

    let name = sanitize_sheet_name(&info.title, used_names);
    let sheet = ReportSheet::from_records(name.clone(), &table.records, mapping);
    let status = SheetStatus::Written {
        worksheet: name,
        households: table.households,
        people: table.records.len(),
        duplicates: table.duplicates.len(),
        failed_rows: table.failures.len(),
    };
    Ok((sheet, status))
}

/// Fetches, assembles and renders every selected sheet of `doc_id`, then
/// writes `output` once. Fails only when no sheet could be processed.
#[instrument(level = "info", skip(source, mapping, output), fields(output = %output.as_ref().display()))]
pub fn run<S: SheetSource, P: AsRef<Path>>(
    source: &S,
    doc_id: &str,
    mapping: &Mapping,
    output: P,
) -> Result<RunSummary, PipelineError> {
    let all = source
        .list_sheets(doc_id)
        .map_err(|source| PipelineError::ListSheets {
            doc_id: doc_id.to_string(),
            source,
        })?;
    if all.is_empty() {
        return Err(PipelineError::NoSheets(doc_id.to_string()));
    }
    let selected = select_sheets(all);
    info!("found {} sheet(s)", selected.len());

    let mut summary = RunSummary::default();
    let mut sheets = Vec::with_capacity(selected.len());
    let mut used_names = HashSet::new();

    for info in &selected {
        let _span = info_span!("sheet", title = %info.title).entered();
        info!("processing sheet");
        let status = match build_sheet(source, doc_id, info, mapping, &mut used_names) {
            Ok((sheet, status)) => {
                info!(?status, "processed sheet");
                sheets.push(sheet);
                status
            }
            Err(e) => {
                warn!(error = %e, "skipping sheet");
                SheetStatus::Skipped(e.to_string())
            }
        };
        summary.sheets.push(SheetOutcome {
            title: info.title.clone(),
            status,
        });
    }

    if sheets.is_empty() {
        return Err(PipelineError::NoSheetsProcessed);
    }

    for sheet in &mut sheets {
        present(
            sheet,
            &mapping.merge_columns,
            mapping.group_by_column,
            mapping.index_column(),
        );
    }

    let output = output.as_ref();
    write_workbook(&sheets, output).map_err(|source| PipelineError::Write {
        path: output.to_path_buf(),
        source,
    })?;

    info!(
        sheets = summary.processed(),
        people = summary.people(),
        "converted to {}",
        output.display()
    );
    Ok(summary)
}

/// Like [`run`], but first captures the whole spreadsheet into a snapshot at
/// `dump` and converts from that copy, so each sheet is fetched once. A failed
/// capture or save is logged and the conversion proceeds.
pub fn run_with_snapshot<S: SheetSource, P: AsRef<Path>, Q: AsRef<Path>>(
    source: &S,
    doc_id: &str,
    mapping: &Mapping,
    output: P,
    dump: Q,
) -> Result<RunSummary, PipelineError> {
    let dump = dump.as_ref();
    match Snapshot::capture(source, doc_id) {
        Ok(snapshot) => {
            match snapshot.save(dump) {
                Ok(()) => info!("saved snapshot to {}", dump.display()),
                Err(e) => warn!(error = %format!("{e:#}"), "could not save snapshot"),
            }
            run(&SnapshotSource::new(snapshot), doc_id, mapping, output)
        }
        Err(e) => {
            warn!(error = %format!("{e:#}"), "snapshot capture failed, converting from the source");
            run(source, doc_id, mapping, output)
        }
    }
}
