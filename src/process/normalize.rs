use chrono::{NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::DateParseError;

static DIGIT_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[0-9]+").expect("digit-run regex should compile"));

/// `"  nguyễn   văn AN "` → `"Nguyễn Văn An"`.
pub fn normalize_name(text: &str) -> String {
    text.split_whitespace()
        .map(|token| {
            let mut chars = token.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Re-renders a date from `in_fmt` to `out_fmt` (chrono strftime syntax).
/// Blank input stays blank; anything else must parse.
pub fn normalize_date(text: &str, in_fmt: &str, out_fmt: &str) -> Result<String, DateParseError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(String::new());
    }
    NaiveDate::parse_from_str(trimmed, in_fmt)
        .map(|d| d.format(out_fmt).to_string())
        .map_err(|_| DateParseError {
            value: trimmed.to_string(),
            format: in_fmt.to_string(),
        })
}

/// First run of digits, left-padded with zeros to width 2. `"00"` if none.
pub fn extract_padded_number(text: &str) -> String {
    match DIGIT_RUN.find(text) {
        Some(m) => format!("{:0>2}", m.as_str()),
        None => "00".to_string(),
    }
}

/// `build_home_id("C1", "Tầng 12", "Căn hộ 07")` → `"C1-1207"`.
pub fn build_home_id(block: &str, floor_text: &str, unit_text: &str) -> String {
    format!(
        "{}-{}{}",
        block.trim(),
        extract_padded_number(floor_text),
        extract_padded_number(unit_text)
    )
}

/// Parses a submission timestamp. `None` for blank or unparseable cells.
pub fn parse_timestamp(text: &str, fmt: &str) -> Option<NaiveDateTime> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    NaiveDateTime::parse_from_str(trimmed, fmt).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_title_cased() {
        assert_eq!(normalize_name("  nguyễn   văn AN "), "Nguyễn Văn An");
        assert_eq!(normalize_name("ĐỖ thị LAN"), "Đỗ Thị Lan");
        assert_eq!(normalize_name(""), "");
    }

    #[test]
    fn dates_are_reformatted() {
        assert_eq!(
            normalize_date("05/03/1990", "%m/%d/%Y", "%d/%m/%Y").unwrap(),
            "03/05/1990"
        );
        assert_eq!(normalize_date("  ", "%m/%d/%Y", "%d/%m/%Y").unwrap(), "");
    }

    #[test]
    fn malformed_date_is_an_error() {
        let err = normalize_date("31/31/1990", "%m/%d/%Y", "%d/%m/%Y").unwrap_err();
        assert_eq!(err.value, "31/31/1990");
        assert!(normalize_date("không rõ", "%m/%d/%Y", "%d/%m/%Y").is_err());
    }

    #[test]
    fn padded_numbers() {
        assert_eq!(extract_padded_number("Tầng 12"), "12");
        assert_eq!(extract_padded_number("Căn hộ 7"), "07");
        assert_eq!(extract_padded_number("P.3 lô 15"), "03");
        assert_eq!(extract_padded_number("tầng trệt"), "00");
        assert_eq!(extract_padded_number("105"), "105");
    }

    #[test]
    fn home_ids() {
        assert_eq!(build_home_id("C1", "Tầng 12", "Căn hộ 07"), "C1-1207");
        assert_eq!(build_home_id("C1", "trệt", "không"), "C1-0000");
        assert_eq!(build_home_id(" B2 ", "3", "9"), "B2-0309");
    }

    #[test]
    fn timestamps() {
        let ts = parse_timestamp("10/15/2024 14:03:22", "%m/%d/%Y %H:%M:%S").unwrap();
        assert_eq!(ts.to_string(), "2024-10-15 14:03:22");
        assert!(parse_timestamp("", "%m/%d/%Y %H:%M:%S").is_none());
        assert!(parse_timestamp("yesterday", "%m/%d/%Y %H:%M:%S").is_none());
    }
}
