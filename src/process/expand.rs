// src/process/expand.rs

use tracing::{trace, warn};

use crate::error::RowError;
use crate::mapping::{Mapping, PersonColumns};
use crate::process::column::cell;
use crate::process::normalize::{build_home_id, normalize_date, normalize_name};
use crate::process::records::{
    Answer, HouseholdRecord, PersonFields, PersonRecord, RecordKind, Role,
};

/// Upper bound on member groups read from one row.
pub const MAX_MEMBER_GROUPS: usize = 64;

/// Walks the repeating member groups of one row.
///
/// Group `n` starts `n * (width + 1)` columns after the first group; the
/// extra column is the group's own "has more" flag. Iteration continues
/// while that flag reads [`Answer::Yes`] and lies inside the row.
pub struct MemberCursor<'a> {
    row: &'a [String],
    row_number: usize,
    columns: PersonColumns,
    next_flag: usize,
    stride: usize,
    offset: usize,
    yielded: usize,
    done: bool,
}

impl<'a> MemberCursor<'a> {
    pub fn new(row: &'a [String], row_number: usize, mapping: &Mapping) -> Self {
        Self {
            row,
            row_number,
            columns: mapping.member,
            next_flag: mapping.member_next,
            stride: mapping.member_width + 1,
            offset: 0,
            yielded: 0,
            done: false,
        }
    }

    fn read(&self, col: usize) -> String {
        cell(self.row, col + self.offset).to_string()
    }
}

impl Iterator for MemberCursor<'_> {
    /// Raw (un-normalized) fields in destination order.
    type Item = PersonFields;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        if self.yielded >= MAX_MEMBER_GROUPS {
            warn!(
                row = self.row_number,
                groups = MAX_MEMBER_GROUPS,
                "member group cap reached"
            );
            self.done = true;
            return None;
        }

        let c = self.columns;
        // source order: name, sex, birthday, relationship, phone
        let mut fields = [
            self.read(c.name),
            self.read(c.sex),
            self.read(c.birthday),
            c.relationship.map(|r| self.read(r)).unwrap_or_default(),
            self.read(c.phone),
        ];
        // destination wants phone before relationship
        fields.swap(3, 4);
        let [name, sex, birthday, phone, relationship] = fields;

        let flag_col = self.next_flag + self.offset;
        if flag_col >= self.row.len() || !Answer::is_yes(&self.row[flag_col]) {
            self.done = true;
        } else {
            self.offset += self.stride;
        }
        self.yielded += 1;

        Some(PersonFields {
            name,
            sex,
            birthday,
            phone,
            relationship,
        })
    }
}

fn normalize_person(
    mut person: PersonFields,
    row_number: usize,
    field: &'static str,
    mapping: &Mapping,
) -> Result<PersonFields, RowError> {
    person.name = normalize_name(&person.name);
    person.sex = person.sex.trim().to_string();
    person.phone = person.phone.trim().to_string();
    person.relationship = person.relationship.trim().to_string();
    person.birthday = normalize_date(
        &person.birthday,
        &mapping.birthday_input_format,
        &mapping.birthday_output_format,
    )
    .map_err(|e| RowError::DateParse {
        row: row_number,
        field,
        value: e.value,
        format: e.format,
    })?;
    Ok(person)
}

/// Turns one padded source row into its owner record plus one record per
/// declared member, all sharing the same household fields.
pub fn expand_row(
    row: &[String],
    row_number: usize,
    index: usize,
    mapping: &Mapping,
) -> Result<Vec<PersonRecord>, RowError> {
    let block = cell(row, mapping.key.block).trim().to_string();
    if block.is_empty() {
        return Err(RowError::MissingField {
            row: row_number,
            field: "block",
        });
    }
    let home_id = build_home_id(
        &block,
        cell(row, mapping.key.floor),
        cell(row, mapping.key.unit),
    );

    let o = mapping.owner;
    let owner = PersonFields {
        name: cell(row, o.name).to_string(),
        sex: cell(row, o.sex).to_string(),
        birthday: cell(row, o.birthday).to_string(),
        phone: cell(row, o.phone).to_string(),
        relationship: Role::Owner.as_str().to_string(),
    };
    let owner = normalize_person(owner, row_number, "owner birthday", mapping)?;
    if owner.name.is_empty() {
        return Err(RowError::MissingField {
            row: row_number,
            field: "owner full name",
        });
    }

    let household = |kind| HouseholdRecord {
        index,
        block: block.clone(),
        home_id: home_id.clone(),
        kind,
    };

    let mut out = vec![PersonRecord {
        household: household(RecordKind::Owner),
        person: owner,
        source_row: row_number,
    }];

    if !Answer::is_yes(cell(row, mapping.owner_next)) {
        trace!(row = row_number, %home_id, "owner only");
        return Ok(out);
    }

    for raw in MemberCursor::new(row, row_number, mapping) {
        let person = normalize_person(raw, row_number, "member birthday", mapping)?;
        out.push(PersonRecord {
            household: household(RecordKind::Member),
            person,
            source_row: row_number,
        });
    }

    trace!(row = row_number, %home_id, people = out.len(), "expanded row");
    Ok(out)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::mapping::ColumnMapping;

    pub(crate) fn mapping() -> Mapping {
        ColumnMapping::default().resolve().unwrap()
    }

    /// Builds a row in the default form layout:
    /// A ts | B block | C floor | D unit | E - | F..I owner | J more |
    /// then per member: name, sex, birthday, relationship, phone, more.
    pub(crate) fn form_row(
        ts: &str,
        block: &str,
        floor: &str,
        unit: &str,
        owner: &str,
        members: &[(&str, &str, &str, &str, &str)],
    ) -> Vec<String> {
        let more = if members.is_empty() {
            Answer::NO
        } else {
            Answer::YES
        };
        let mut row: Vec<String> = [
            ts, block, floor, unit, "", owner, "Nam", "01/15/1980", "0901000000", more,
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        for (i, (name, sex, bday, rel, phone)) in members.iter().enumerate() {
            let more = if i + 1 < members.len() {
                Answer::YES
            } else {
                Answer::NO
            };
            row.extend([*name, *sex, *bday, *rel, *phone, more].iter().map(|s| s.to_string()));
        }
        row
    }

    #[test]
    fn owner_only_when_flag_is_negative() {
        let m = mapping();
        let row = form_row("10/01/2024 08:00:00", "C1", "Tầng 12", "Căn 07", "trần thị a", &[]);
        let out = expand_row(&row, 4, 1, &m).unwrap();

        assert_eq!(out.len(), 1);
        let rec = &out[0];
        assert_eq!(rec.household.home_id, "C1-1207");
        assert_eq!(rec.household.kind, RecordKind::Owner);
        assert_eq!(rec.person.name, "Trần Thị A");
        assert_eq!(rec.person.birthday, "15/01/1980");
        assert_eq!(rec.person.relationship, "Owner");
        assert_eq!(rec.source_row, 4);
    }

    #[test]
    fn members_are_expanded_and_swapped() {
        let m = mapping();
        let row = form_row(
            "10/01/2024 08:00:00",
            "B2",
            "3",
            "9",
            "lê văn c",
            &[
                ("lê thị d", "Nữ", "02/03/1985", "Vợ", "0902"),
                ("lê văn e", "Nam", "04/05/2010", "Con", "0903"),
                ("lê văn f", "Nam", "06/07/2012", "Con", ""),
            ],
        );
        let out = expand_row(&row, 2, 5, &m).unwrap();

        assert_eq!(out.len(), 4);
        assert!(out.iter().all(|r| r.household.index == 5));
        assert!(out.iter().all(|r| r.household.home_id == "B2-0309"));
        assert_eq!(out[0].household.kind, RecordKind::Owner);
        assert!(out[1..]
            .iter()
            .all(|r| r.household.kind == RecordKind::Member));

        assert_eq!(out[1].person.name, "Lê Thị D");
        assert_eq!(out[1].person.birthday, "03/02/1985");
        assert_eq!(out[1].person.relationship, "Vợ");
        assert_eq!(out[1].person.phone, "0902");
        assert_eq!(out[2].person.relationship, "Con");
        assert_eq!(out[2].person.phone, "0903");
        assert_eq!(out[3].person.name, "Lê Văn F");
    }

    #[test]
    fn stops_when_flag_is_outside_the_row() {
        let m = mapping();
        let mut row = form_row("", "A1", "1", "1", "x", &[("y", "Nam", "", "Con", "1")]);
        // drop the member's own flag column entirely
        row.pop();
        let out = expand_row(&row, 1, 1, &m).unwrap();
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn ragged_row_never_faults() {
        let m = mapping();
        let mut row = form_row("", "A1", "1", "1", "x", &[]);
        row[9] = Answer::YES.to_string();
        // member group columns are missing entirely: one blank member
        let out = expand_row(&row, 1, 1, &m).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[1].household.kind, RecordKind::Member);
        assert_eq!(out[1].person, PersonFields::default());

        let short: Vec<String> = vec!["".into(), "A1".into(), "".into(), "".into(), "".into(), "x".into()];
        let out = expand_row(&short, 2, 1, &m).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].household.home_id, "A1-0000");
        assert_eq!(out[0].person.phone, "");
    }

    #[test]
    fn malformed_birthday_fails_the_row() {
        let m = mapping();
        let row = form_row(
            "",
            "C1",
            "1",
            "2",
            "x",
            &[("y", "Nam", "not a date", "Con", "1")],
        );
        let err = expand_row(&row, 9, 1, &m).unwrap_err();
        assert_eq!(err.row(), 9);
        assert!(matches!(
            err,
            RowError::DateParse {
                field: "member birthday",
                ..
            }
        ));
    }

    #[test]
    fn missing_block_fails_the_row() {
        let m = mapping();
        let row = form_row("", " ", "1", "2", "x", &[]);
        assert!(matches!(
            expand_row(&row, 3, 1, &m),
            Err(RowError::MissingField { field: "block", .. })
        ));
    }

    #[test]
    fn cursor_uses_explicit_stride() {
        let m = mapping();
        let row = form_row(
            "",
            "C1",
            "1",
            "2",
            "x",
            &[
                ("a", "", "", "r1", "p1"),
                ("b", "", "", "r2", "p2"),
            ],
        );
        let groups: Vec<_> = MemberCursor::new(&row, 1, &m).collect();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[1].name, "b");
        assert_eq!(groups[1].phone, "p2");
        assert_eq!(groups[1].relationship, "r2");
    }

    #[test]
    fn blank_declared_groups_are_emitted() {
        let m = mapping();
        let row = form_row(
            "",
            "C1",
            "1",
            "2",
            "x",
            &[("", "", "", "", ""), ("b", "Nam", "", "Con", "1")],
        );
        let out = expand_row(&row, 1, 1, &m).unwrap();
        assert_eq!(out.len(), 3);
        assert_eq!(out[1].person.name, "");
        assert_eq!(out[1].household.kind, RecordKind::Member);
        assert_eq!(out[2].person.name, "B");
    }

    #[test]
    fn member_groups_are_capped() {
        let m = mapping();
        let mut row = form_row("", "C1", "1", "2", "x", &[]);
        row[m.owner_next] = Answer::YES.to_string();
        for i in 0..MAX_MEMBER_GROUPS + 5 {
            let name = format!("m{i}");
            row.extend([name.as_str(), "Nam", "", "Con", "", Answer::YES].map(String::from));
        }
        let out = expand_row(&row, 1, 1, &m).unwrap();
        assert_eq!(out.len(), 1 + MAX_MEMBER_GROUPS);
        assert_eq!(out.last().unwrap().person.name, format!("M{}", MAX_MEMBER_GROUPS - 1));
    }
}
