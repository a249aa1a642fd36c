// src/fetch/mod.rs
//! Collaborators that bring sheet values into the pipeline.

use anyhow::Result;
use serde::{Deserialize, Serialize};

pub mod auth;
pub mod pointer;
pub mod sheets;
pub mod snapshot;

pub use auth::{CredentialProvider, StaticToken, TokenCache};
pub use pointer::read_doc_id;
pub use sheets::GoogleSheets;
pub use snapshot::{Snapshot, SnapshotSource};

/// Columns requested from every sheet; rows are open-ended.
pub const VALUE_COLUMNS: &str = "A1:ZZ";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetInfo {
    pub title: String,
    #[serde(default)]
    pub hidden: bool,
}

/// Read access to a spreadsheet's tabs and cell values.
pub trait SheetSource {
    fn list_sheets(&self, doc_id: &str) -> Result<Vec<SheetInfo>>;

    /// Rows of text cells for `columns` (A1 column span) of one sheet.
    /// Trailing empty cells and rows may be omitted.
    fn get_values(&self, doc_id: &str, title: &str, columns: &str) -> Result<Vec<Vec<String>>>;
}
