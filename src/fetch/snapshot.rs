// src/fetch/snapshot.rs
//! Local JSON copy of a spreadsheet, for offline runs and fixtures.

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};
use tracing::{info, warn};

use super::{SheetInfo, SheetSource, VALUE_COLUMNS};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotSheet {
    pub title: String,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub values: Vec<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub doc_id: Option<String>,
    pub sheets: Vec<SnapshotSheet>,
}

impl Snapshot {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading snapshot {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parsing snapshot {}", path.display()))
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        fs::write(path, serde_json::to_string_pretty(self)?)
            .with_context(|| format!("writing snapshot {}", path.display()))
    }

    /// Copies every sheet of `doc_id` out of `source`. Sheets that fail to
    /// fetch are logged and left out.
    pub fn capture<S: SheetSource>(source: &S, doc_id: &str) -> Result<Self> {
        let mut sheets = Vec::new();
        for info in source.list_sheets(doc_id)? {
            match source.get_values(doc_id, &info.title, VALUE_COLUMNS) {
                Ok(values) => sheets.push(SnapshotSheet {
                    title: info.title,
                    hidden: info.hidden,
                    values,
                }),
                Err(e) => warn!(sheet = %info.title, error = %e, "not captured"),
            }
        }
        info!(doc_id, sheets = sheets.len(), "captured snapshot");
        Ok(Self {
            doc_id: Some(doc_id.to_string()),
            sheets,
        })
    }
}

/// Serves a [`Snapshot`] through the [`SheetSource`] interface. The
/// document id is not checked; a snapshot holds exactly one spreadsheet.
pub struct SnapshotSource {
    snapshot: Snapshot,
}

impl SnapshotSource {
    pub fn new(snapshot: Snapshot) -> Self {
        Self { snapshot }
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        Snapshot::load(path).map(Self::new)
    }
}

impl SheetSource for SnapshotSource {
    fn list_sheets(&self, _doc_id: &str) -> Result<Vec<SheetInfo>> {
        Ok(self
            .snapshot
            .sheets
            .iter()
            .map(|s| SheetInfo {
                title: s.title.clone(),
                hidden: s.hidden,
            })
            .collect())
    }

    fn get_values(&self, _doc_id: &str, title: &str, _columns: &str) -> Result<Vec<Vec<String>>> {
        self.snapshot
            .sheets
            .iter()
            .find(|s| s.title == title)
            .map(|s| s.values.clone())
            .ok_or_else(|| anyhow!("sheet {:?} not in snapshot", title))
    }
}
