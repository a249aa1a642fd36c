use crate::error::ColumnError;

/// Converts a letter column label into a 0-based column index.
/// `A` → 0, `Z` → 25, `AA` → 26. Case-insensitive.
pub fn to_index(label: &str) -> Result<usize, ColumnError> {
    let trimmed = label.trim();
    if trimmed.is_empty() {
        return Err(ColumnError::InvalidLabel(label.to_string()));
    }

    let mut acc: usize = 0;
    for ch in trimmed.chars() {
        if !ch.is_ascii_alphabetic() {
            return Err(ColumnError::InvalidLabel(label.to_string()));
        }
        let digit = (ch.to_ascii_uppercase() as u8 - b'A' + 1) as usize;
        acc = acc
            .checked_mul(26)
            .and_then(|v| v.checked_add(digit))
            .ok_or_else(|| ColumnError::InvalidLabel(label.to_string()))?;
    }

    Ok(acc - 1)
}

/// Inverse of [`to_index`]: 0 → `A`, 27 → `AB`.
pub fn to_label(index: usize) -> String {
    let mut n = index + 1;
    let mut out = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        out.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

/// Cell at `index`, or `""` when the row is shorter than that.
pub fn cell(row: &[String], index: usize) -> &str {
    row.get(index).map(String::as_str).unwrap_or("")
}
