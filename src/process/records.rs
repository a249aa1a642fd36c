// src/process/records.rs

use serde::Serialize;
use std::fmt;

use crate::mapping::RECORD_FIELDS;

/// Answer tokens used by the form's "has more members" questions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Answer {
    Yes,
    No,
}

impl Answer {
    pub const YES: &'static str = "Có";
    pub const NO: &'static str = "Không";

    /// Only an exact (trimmed) affirmative token counts as `Yes`.
    pub fn from_cell(s: &str) -> Option<Self> {
        match s.trim() {
            Self::YES => Some(Answer::Yes),
            Self::NO => Some(Answer::No),
            _ => None,
        }
    }

    pub fn is_yes(s: &str) -> bool {
        Self::from_cell(s) == Some(Answer::Yes)
    }
}

/// Relationship label written for the primary person.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    Owner,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Owner => "Owner",
        }
    }
}

/// Primary owner vs. dependent member.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum RecordKind {
    Owner,
    Member,
}

impl RecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Owner => "Owner",
            RecordKind::Member => "Member",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HouseholdRecord {
    /// 1-based display index, one per surviving source row.
    pub index: usize,
    pub block: String,
    pub home_id: String,
    pub kind: RecordKind,
}

/// Person fields in destination order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct PersonFields {
    pub name: String,
    pub sex: String,
    pub birthday: String,
    pub phone: String,
    pub relationship: String,
}

/// One row of the final table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PersonRecord {
    pub household: HouseholdRecord,
    pub person: PersonFields,
    /// 1-based data row number in the source sheet (header excluded).
    pub source_row: usize,
}

/// A typed output cell.
#[derive(Clone, Debug, PartialEq)]
pub enum CellValue {
    Text(String),
    Integer(u64),
}

impl CellValue {
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Text(s) if s.is_empty())
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Text(s) => f.write_str(s),
            CellValue::Integer(n) => write!(f, "{n}"),
        }
    }
}

impl PersonRecord {
    /// Field values in record order (household, person, additional).
    pub fn cells(&self) -> [CellValue; RECORD_FIELDS] {
        let h = &self.household;
        let p = &self.person;
        [
            CellValue::Integer(h.index as u64),
            CellValue::Text(h.block.clone()),
            CellValue::Text(h.home_id.clone()),
            CellValue::Text(h.kind.as_str().to_string()),
            CellValue::Text(p.name.clone()),
            CellValue::Text(p.sex.clone()),
            CellValue::Text(p.birthday.clone()),
            CellValue::Text(p.phone.clone()),
            CellValue::Text(p.relationship.clone()),
            CellValue::Integer(self.source_row as u64),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn answers() {
        assert!(Answer::is_yes("Có"));
        assert!(Answer::is_yes(" Có "));
        assert!(!Answer::is_yes("Không"));
        assert!(!Answer::is_yes(""));
        assert!(!Answer::is_yes("có rồi"));
        assert_eq!(Answer::from_cell("Không"), Some(Answer::No));
    }

    #[test]
    fn cells_follow_record_order() {
        let rec = PersonRecord {
            household: HouseholdRecord {
                index: 3,
                block: "C1".into(),
                home_id: "C1-1207".into(),
                kind: RecordKind::Member,
            },
            person: PersonFields {
                name: "Lê Văn B".into(),
                sex: "Nam".into(),
                birthday: "01/02/2010".into(),
                phone: "0901".into(),
                relationship: "Con".into(),
            },
            source_row: 7,
        };
        let cells = rec.cells();
        assert_eq!(cells[0], CellValue::Integer(3));
        assert_eq!(cells[2].to_string(), "C1-1207");
        assert_eq!(cells[3].to_string(), "Member");
        assert_eq!(cells[7].to_string(), "0901");
        assert_eq!(cells[8].to_string(), "Con");
        assert_eq!(cells[9], CellValue::Integer(7));
    }
}
