// src/report/sheet.rs

use std::collections::HashSet;

use super::present::SheetLayout;
use crate::mapping::Mapping;
use crate::process::records::{CellValue, PersonRecord};

/// Longest worksheet name xlsx accepts.
pub const MAX_SHEET_NAME: usize = 31;
const FORBIDDEN: &[char] = &['[', ']', ':', '*', '?', '/', '\\'];

/// One output worksheet: header plus a dense grid of typed cells laid out at
/// their destination columns.
#[derive(Debug, Clone)]
pub struct ReportSheet {
    pub name: String,
    pub header: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
    pub layout: Option<SheetLayout>,
}

impl ReportSheet {
    pub fn from_records(name: impl Into<String>, records: &[PersonRecord], mapping: &Mapping) -> Self {
        let width = mapping.dest_width();
        let mut header = vec![String::new(); width];
        for (col, title) in mapping.dest_columns.iter().zip(&mapping.dest_names) {
            header[*col] = title.clone();
        }

        let rows = records
            .iter()
            .map(|rec| {
                let mut row = vec![CellValue::Text(String::new()); width];
                for (col, value) in mapping.dest_columns.iter().zip(rec.cells()) {
                    row[*col] = value;
                }
                row
            })
            .collect();

        Self {
            name: name.into(),
            header,
            rows,
            layout: None,
        }
    }

    pub fn width(&self) -> usize {
        self.header.len()
    }
}

/// Makes `title` a legal, unique (case-insensitive) worksheet name.
pub fn sanitize_sheet_name(title: &str, used: &mut HashSet<String>) -> String {
    let cleaned: String = title
        .chars()
        .map(|c| if FORBIDDEN.contains(&c) { '_' } else { c })
        .collect();
    let cleaned = cleaned.trim().trim_matches('\'').trim();
    let base: String = if cleaned.is_empty() {
        "Sheet".to_string()
    } else {
        cleaned.chars().take(MAX_SHEET_NAME).collect()
    };

    let mut candidate = base.clone();
    let mut n = 2;
    while used.contains(&candidate.to_lowercase()) {
        let suffix = format!(" ({n})");
        let keep = MAX_SHEET_NAME - suffix.chars().count();
        candidate = base.chars().take(keep).collect::<String>() + &suffix;
        n += 1;
    }
    used.insert(candidate.to_lowercase());
    candidate
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::ColumnMapping;
    use crate::process::records::{HouseholdRecord, PersonFields, RecordKind};

    #[test]
    fn names_are_cleaned_and_unique() {
        let mut used = HashSet::new();
        assert_eq!(sanitize_sheet_name("Tòa C1/2024", &mut used), "Tòa C1_2024");
        assert_eq!(sanitize_sheet_name("tòa c1/2024", &mut used), "tòa c1_2024 (2)");
        assert_eq!(sanitize_sheet_name("'[]'", &mut used), "__");
        assert_eq!(sanitize_sheet_name("   ", &mut used), "Sheet");

        let long = "x".repeat(40);
        let first = sanitize_sheet_name(&long, &mut used);
        assert_eq!(first.chars().count(), MAX_SHEET_NAME);
        let second = sanitize_sheet_name(&long, &mut used);
        assert_eq!(second.chars().count(), MAX_SHEET_NAME);
        assert!(second.ends_with(" (2)"));
    }

    #[test]
    fn cells_land_on_destination_columns() {
        let mut cfg = ColumnMapping::default();
        // leave column J empty, push the source row to K
        cfg.dest_additional_info_ids = vec!["K".into()];
        let m = cfg.resolve().unwrap();

        let rec = PersonRecord {
            household: HouseholdRecord {
                index: 1,
                block: "C1".into(),
                home_id: "C1-0101".into(),
                kind: RecordKind::Owner,
            },
            person: PersonFields {
                name: "A".into(),
                ..Default::default()
            },
            source_row: 12,
        };
        let sheet = ReportSheet::from_records("C1", &[rec], &m);
        assert_eq!(sheet.width(), 11);
        assert_eq!(sheet.header[2], "HomeID");
        assert_eq!(sheet.header[9], "");
        assert_eq!(sheet.header[10], "Source Row");
        assert!(sheet.rows[0][9].is_empty());
        assert_eq!(sheet.rows[0][10], CellValue::Integer(12));
    }
}
