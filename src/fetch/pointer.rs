use serde::Deserialize;
use std::{fs, path::Path};

use crate::error::ConfigError;

#[derive(Deserialize)]
struct PointerFile {
    doc_id: Option<String>,
}

/// Reads the spreadsheet id out of a `.gsheet` pointer file.
pub fn read_doc_id<P: AsRef<Path>>(path: P) -> Result<String, ConfigError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let pointer: PointerFile = serde_json::from_str(&text).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    pointer
        .doc_id
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ConfigError::MissingDocId(path.to_path_buf()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn pointer(body: &str) -> Result<NamedTempFile> {
        let mut f = NamedTempFile::new()?;
        f.write_all(body.as_bytes())?;
        Ok(f)
    }

    #[test]
    fn reads_doc_id() -> Result<()> {
        let f = pointer(r#"{"url": "https://docs.google.com/...", "doc_id": "1AbC", "email": "x@y"}"#)?;
        assert_eq!(read_doc_id(f.path())?, "1AbC");
        Ok(())
    }

    #[test]
    fn missing_or_blank_doc_id_is_fatal() -> Result<()> {
        for body in [r#"{"url": "x"}"#, r#"{"doc_id": "  "}"#] {
            let f = pointer(body)?;
            assert!(matches!(read_doc_id(f.path()), Err(ConfigError::MissingDocId(_))));
        }
        let f = pointer("not json")?;
        assert!(matches!(read_doc_id(f.path()), Err(ConfigError::Parse { .. })));
        Ok(())
    }
}
