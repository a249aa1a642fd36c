// src/mapping/resolve.rs

use chrono::format::{Item, StrftimeItems};
use std::collections::HashSet;

use super::ColumnMapping;
use crate::error::ConfigError;
use crate::process::column::{to_index, to_label};

pub const HOUSEHOLD_FIELDS: usize = 4;
pub const OWNER_FIELDS: usize = 4;
pub const MEMBER_FIELDS: usize = 5;
pub const ADDITIONAL_FIELDS: usize = 1;
/// Last column a worksheet can hold (XFD).
pub const MAX_DEST_COLUMN: usize = 16_383;
/// Total number of fields in one output record.
pub const RECORD_FIELDS: usize = HOUSEHOLD_FIELDS + MEMBER_FIELDS + ADDITIONAL_FIELDS;

/// Source columns feeding the HomeID and the duplicate tie-break.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyColumns {
    pub timestamp: usize,
    pub block: usize,
    pub floor: usize,
    pub unit: usize,
}

/// Source columns of one person group, in source order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PersonColumns {
    pub name: usize,
    pub sex: usize,
    pub birthday: usize,
    pub phone: usize,
    /// Only member groups carry a relationship column.
    pub relationship: Option<usize>,
}

/// A [`ColumnMapping`] checked once and turned into 0-based indices.
#[derive(Debug, Clone)]
pub struct Mapping {
    pub key: KeyColumns,
    pub owner: PersonColumns,
    pub owner_next: usize,
    pub member: PersonColumns,
    /// Width of one member group, excluding its "has more" flag.
    pub member_width: usize,
    pub member_next: usize,

    /// Destination column of each record field, in record order.
    pub dest_columns: [usize; RECORD_FIELDS],
    /// Header text of each record field, in record order.
    pub dest_names: [String; RECORD_FIELDS],
    pub merge_columns: Vec<usize>,
    pub group_by_column: usize,

    pub birthday_input_format: String,
    pub birthday_output_format: String,
    pub timestamp_format: String,
}

fn resolve_one(key: &'static str, label: &str) -> Result<usize, ConfigError> {
    to_index(label).map_err(|source| ConfigError::BadLabel { key, source })
}

fn resolve_list(
    key: &'static str,
    labels: &[String],
    expected: usize,
) -> Result<Vec<usize>, ConfigError> {
    if labels.len() != expected {
        return Err(ConfigError::WrongLength {
            key,
            expected,
            found: labels.len(),
        });
    }
    labels.iter().map(|l| resolve_one(key, l)).collect()
}

/// Like [`resolve_one`], for columns that are written to the report.
fn resolve_dest(key: &'static str, label: &str) -> Result<usize, ConfigError> {
    let col = resolve_one(key, label)?;
    if col > MAX_DEST_COLUMN {
        return Err(ConfigError::ColumnOutOfRange {
            key,
            label: label.to_string(),
        });
    }
    Ok(col)
}

fn resolve_dest_list(
    key: &'static str,
    labels: &[String],
    expected: usize,
) -> Result<Vec<usize>, ConfigError> {
    resolve_list(key, labels, expected)?;
    labels.iter().map(|l| resolve_dest(key, l)).collect()
}

fn check_names(
    ids: &'static str,
    names: &'static str,
    id_list: &[String],
    name_list: &[String],
) -> Result<(), ConfigError> {
    if id_list.len() != name_list.len() {
        return Err(ConfigError::NamesMismatch {
            ids,
            names,
            id_len: id_list.len(),
            name_len: name_list.len(),
        });
    }
    Ok(())
}

fn check_date_format(key: &'static str, format: &str) -> Result<(), ConfigError> {
    let broken = format.trim().is_empty()
        || StrftimeItems::new(format).any(|item| matches!(item, Item::Error));
    if broken {
        return Err(ConfigError::BadDateFormat {
            key,
            format: format.to_string(),
        });
    }
    Ok(())
}

impl ColumnMapping {
    /// Validate every key and resolve letter labels to indices.
    pub fn resolve(&self) -> Result<Mapping, ConfigError> {
        let common = resolve_list("src_common_info_id", &self.src_common_info_id, HOUSEHOLD_FIELDS)?;
        let owner = resolve_list("src_owner_info_id", &self.src_owner_info_id, OWNER_FIELDS)?;
        let member = resolve_list("src_member_info_id", &self.src_member_info_id, MEMBER_FIELDS)?;
        let owner_next = resolve_one("src_owner_info_next_id", &self.src_owner_info_next_id)?;
        let member_next = resolve_one("src_member_info_next_id", &self.src_member_info_next_id)?;

        check_names(
            "dest_common_info_ids",
            "dest_common_info_names",
            &self.dest_common_info_ids,
            &self.dest_common_info_names,
        )?;
        check_names(
            "dest_member_info_ids",
            "dest_member_info_names",
            &self.dest_member_info_ids,
            &self.dest_member_info_names,
        )?;
        check_names(
            "dest_additional_info_ids",
            "dest_additional_info_names",
            &self.dest_additional_info_ids,
            &self.dest_additional_info_names,
        )?;
        let dest_common =
            resolve_dest_list("dest_common_info_ids", &self.dest_common_info_ids, HOUSEHOLD_FIELDS)?;
        let dest_member =
            resolve_dest_list("dest_member_info_ids", &self.dest_member_info_ids, MEMBER_FIELDS)?;
        let dest_additional = resolve_dest_list(
            "dest_additional_info_ids",
            &self.dest_additional_info_ids,
            ADDITIONAL_FIELDS,
        )?;

        let dest_columns: Vec<usize> = dest_common
            .into_iter()
            .chain(dest_member)
            .chain(dest_additional)
            .collect();
        let mut seen = HashSet::new();
        for &col in &dest_columns {
            if !seen.insert(col) {
                return Err(ConfigError::DuplicateDestination(to_label(col)));
            }
        }

        let merge_columns = self
            .dest_merge_cells_ids
            .iter()
            .map(|label| {
                let col = resolve_dest("dest_merge_cells_ids", label)?;
                if !seen.contains(&col) {
                    return Err(ConfigError::UnknownDestination {
                        key: "dest_merge_cells_ids",
                        label: label.clone(),
                    });
                }
                Ok(col)
            })
            .collect::<Result<Vec<_>, _>>()?;
        let group_by_column = resolve_dest("dest_group_by_id", &self.dest_group_by_id)?;
        if !seen.contains(&group_by_column) {
            return Err(ConfigError::UnknownDestination {
                key: "dest_group_by_id",
                label: self.dest_group_by_id.clone(),
            });
        }

        check_date_format("birthday_input_format", &self.birthday_input_format)?;
        check_date_format("birthday_output_format", &self.birthday_output_format)?;
        check_date_format("timestamp_format", &self.timestamp_format)?;

        let dest_names: Vec<String> = self
            .dest_common_info_names
            .iter()
            .chain(&self.dest_member_info_names)
            .chain(&self.dest_additional_info_names)
            .cloned()
            .collect();

        Ok(Mapping {
            key: KeyColumns {
                timestamp: common[0],
                block: common[1],
                floor: common[2],
                unit: common[3],
            },
            owner: PersonColumns {
                name: owner[0],
                sex: owner[1],
                birthday: owner[2],
                phone: owner[3],
                relationship: None,
            },
            owner_next,
            member: PersonColumns {
                name: member[0],
                sex: member[1],
                birthday: member[2],
                relationship: Some(member[3]),
                phone: member[4],
            },
            member_width: MEMBER_FIELDS,
            member_next,
            // lengths were checked above
            dest_columns: dest_columns.try_into().unwrap_or([0; RECORD_FIELDS]),
            dest_names: dest_names
                .try_into()
                .unwrap_or_else(|_| std::array::from_fn(|_| String::new())),
            merge_columns,
            group_by_column,
            birthday_input_format: self.birthday_input_format.clone(),
            birthday_output_format: self.birthday_output_format.clone(),
            timestamp_format: self.timestamp_format.clone(),
        })
    }
}

impl Mapping {
    /// Destination column holding the display index.
    pub fn index_column(&self) -> usize {
        self.dest_columns[0]
    }

    /// Number of destination columns the sheet spans (highest used + 1).
    pub fn dest_width(&self) -> usize {
        self.dest_columns.iter().max().map_or(0, |m| m + 1)
    }
}
