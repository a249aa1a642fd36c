// src/mapping/types.rs

use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

use crate::error::ConfigError;

pub const DEFAULT_BIRTHDAY_INPUT_FORMAT: &str = "%m/%d/%Y";
pub const DEFAULT_BIRTHDAY_OUTPUT_FORMAT: &str = "%d/%m/%Y";
pub const DEFAULT_TIMESTAMP_FORMAT: &str = "%m/%d/%Y %H:%M:%S";

/// Source/destination column layout as written by a user, in letter notation.
///
/// Field order inside each list is fixed:
/// - `src_common_info_id`: timestamp, block, floor, unit
/// - `src_owner_info_id`: full name, sex, birthday, phone
/// - `src_member_info_id`: full name, sex, birthday, relationship, phone
/// - `dest_common_info_*`: display index, block, HomeID, record type
/// - `dest_member_info_*`: full name, sex, birthday, phone, relationship
/// - `dest_additional_info_*`: source row number
///
/// Unknown keys (e.g. descriptive `src_*_names` lists) are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMapping {
    pub src_common_info_id: Vec<String>,
    pub src_owner_info_id: Vec<String>,
    pub src_owner_info_next_id: String,
    pub src_member_info_id: Vec<String>,
    pub src_member_info_next_id: String,

    pub dest_common_info_ids: Vec<String>,
    pub dest_common_info_names: Vec<String>,
    pub dest_member_info_ids: Vec<String>,
    pub dest_member_info_names: Vec<String>,
    pub dest_additional_info_ids: Vec<String>,
    pub dest_additional_info_names: Vec<String>,

    pub dest_merge_cells_ids: Vec<String>,
    pub dest_group_by_id: String,

    #[serde(default = "default_birthday_input_format")]
    pub birthday_input_format: String,
    #[serde(default = "default_birthday_output_format")]
    pub birthday_output_format: String,
    #[serde(default = "default_timestamp_format")]
    pub timestamp_format: String,
}

fn default_birthday_input_format() -> String {
    DEFAULT_BIRTHDAY_INPUT_FORMAT.to_string()
}

fn default_birthday_output_format() -> String {
    DEFAULT_BIRTHDAY_OUTPUT_FORMAT.to_string()
}

fn default_timestamp_format() -> String {
    DEFAULT_TIMESTAMP_FORMAT.to_string()
}

fn labels(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for ColumnMapping {
    /// Layout of the household registration form.
    fn default() -> Self {
        Self {
            src_common_info_id: labels(&["A", "B", "C", "D"]),
            src_owner_info_id: labels(&["F", "G", "H", "I"]),
            src_owner_info_next_id: "J".into(),
            src_member_info_id: labels(&["K", "L", "M", "N", "O"]),
            src_member_info_next_id: "P".into(),

            dest_common_info_ids: labels(&["A", "B", "C", "D"]),
            dest_common_info_names: labels(&["Counting", "Block", "HomeID", "Type"]),
            dest_member_info_ids: labels(&["E", "F", "G", "H", "I"]),
            dest_member_info_names: labels(&[
                "Full Name",
                "Sex",
                "Birthday",
                "Phone",
                "Relationship",
            ]),
            dest_additional_info_ids: labels(&["J"]),
            dest_additional_info_names: labels(&["Source Row"]),

            dest_merge_cells_ids: labels(&["A", "B", "C"]),
            dest_group_by_id: "C".into(),

            birthday_input_format: default_birthday_input_format(),
            birthday_output_format: default_birthday_output_format(),
            timestamp_format: default_timestamp_format(),
        }
    }
}

impl ColumnMapping {
    /// Load a mapping from a YAML (or JSON) file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_yaml::from_str(&text).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn loads_yaml_with_format_defaults() -> Result<()> {
        let yaml = r#"
src_common_info_id: [A, B, C, D]
src_common_info_names: [Timestamp, Block, Floor, Unit]
src_owner_info_id: [F, G, H, I]
src_owner_info_next_id: J
src_member_info_id: [K, L, M, N, O]
src_member_info_next_id: P
dest_common_info_ids: [A, B, C, D]
dest_common_info_names: [Counting, Block, HomeID, Type]
dest_member_info_ids: [E, F, G, H, I]
dest_member_info_names: [Full Name, Sex, Birthday, Phone, Relationship]
dest_additional_info_ids: [J]
dest_additional_info_names: [Source Row]
dest_merge_cells_ids: [A, B, C]
dest_group_by_id: C
"#;
        let mut file = NamedTempFile::new()?;
        file.write_all(yaml.as_bytes())?;

        let mapping = ColumnMapping::from_path(file.path())?;
        assert_eq!(mapping, ColumnMapping::default());
        Ok(())
    }

    #[test]
    fn missing_key_is_a_config_error() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        file.write_all(b"src_common_info_id: [A, B, C, D]\n")?;

        let err = ColumnMapping::from_path(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }), "{err}");
        assert!(err.to_string().contains("missing field"));
        Ok(())
    }

    #[test]
    fn json_is_accepted() -> Result<()> {
        let json = serde_json::to_string(&ColumnMapping::default())?;
        let mut file = NamedTempFile::new()?;
        file.write_all(json.as_bytes())?;
        assert_eq!(ColumnMapping::from_path(file.path())?, ColumnMapping::default());
        Ok(())
    }
}
