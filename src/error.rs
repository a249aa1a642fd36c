//! Error taxonomy for the report pipeline.
//!
//! Fatal conditions are [`ConfigError`] and [`PipelineError`]; everything else
//! is scoped to one sheet ([`SheetError`]) or one source row ([`RowError`]) and
//! is logged and skipped by the caller.

use std::path::PathBuf;

/// A column label that is not a spreadsheet letter column.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ColumnError {
    #[error("invalid column label {0:?}")]
    InvalidLabel(String),
}

/// A non-blank cell that does not match the expected date format.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{value:?} does not match date format {format:?}")]
pub struct DateParseError {
    pub value: String,
    pub format: String,
}

/// Configuration problems. Always fatal for the whole run.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not find `doc_id` in pointer file {0}")]
    MissingDocId(PathBuf),

    #[error("mapping key `{key}`: {source}")]
    BadLabel {
        key: &'static str,
        #[source]
        source: ColumnError,
    },

    #[error("mapping key `{key}` must list exactly {expected} columns, found {found}")]
    WrongLength {
        key: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("mapping keys `{ids}` and `{names}` differ in length ({id_len} vs {name_len})")]
    NamesMismatch {
        ids: &'static str,
        names: &'static str,
        id_len: usize,
        name_len: usize,
    },

    #[error("mapping key `{key}`: column {label} is past the last worksheet column XFD")]
    ColumnOutOfRange { key: &'static str, label: String },

    #[error("destination column {0} is assigned more than once")]
    DuplicateDestination(String),

    #[error("mapping key `{key}` refers to column {label}, which is not a destination column")]
    UnknownDestination { key: &'static str, label: String },

    #[error("mapping key `{key}`: invalid date format {format:?}")]
    BadDateFormat { key: &'static str, format: String },

    #[error("reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parsing {path}: {message}")]
    Parse { path: PathBuf, message: String },
}

/// Failure to materialize a single source row. The row is skipped.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RowError {
    #[error("row {row}: {field} {value:?} does not match date format {format:?}")]
    DateParse {
        row: usize,
        field: &'static str,
        value: String,
        format: String,
    },

    #[error("row {row}: required field {field} is blank")]
    MissingField { row: usize, field: &'static str },
}

impl RowError {
    pub fn row(&self) -> usize {
        match self {
            RowError::DateParse { row, .. } | RowError::MissingField { row, .. } => *row,
        }
    }
}

/// Failure of one input sheet. The sheet is skipped and the run continues.
#[derive(Debug, thiserror::Error)]
pub enum SheetError {
    #[error("fetching sheet {sheet:?}: {source:#}")]
    Fetch {
        sheet: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("no valid data in sheet {0:?}")]
    NoValidData(String),
}

/// Whole-run failures surfaced to the binary.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("no sheets found in spreadsheet {0}")]
    NoSheets(String),

    #[error("listing sheets of {doc_id}: {source:#}")]
    ListSheets {
        doc_id: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("no sheets could be processed successfully")]
    NoSheetsProcessed,

    #[error("writing workbook {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: rust_xlsxwriter::XlsxError,
    },
}
