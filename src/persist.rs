//! Whole-file JSON persistence.
//!
//! Every JSON artifact is written to a sibling temp file and renamed into
//! place, so a reader never observes a half-written file and a re-run simply
//! replaces the previous output.

use crate::error::Pdf2DatasetError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;

/// Serialise `value` as pretty UTF-8 JSON and atomically replace `path`.
pub fn write_json_atomic<T: Serialize + ?Sized>(
    path: &Path,
    value: &T,
) -> Result<(), Pdf2DatasetError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| Pdf2DatasetError::write_failed(parent, e))?;
    }

    let mut json = serde_json::to_string_pretty(value)
        .map_err(|e| Pdf2DatasetError::Internal(format!("JSON serialisation failed: {e}")))?;
    json.push('\n');

    let tmp_path = path.with_extension("json.tmp");
    std::fs::write(&tmp_path, json).map_err(|e| Pdf2DatasetError::write_failed(path, e))?;
    std::fs::rename(&tmp_path, path).map_err(|e| Pdf2DatasetError::write_failed(path, e))?;
    Ok(())
}

/// Read a JSON file; `Ok(None)` when it does not exist.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<Result<T, String>>, std::io::Error> {
    match std::fs::read_to_string(path) {
        Ok(raw) => Ok(Some(serde_json::from_str(&raw).map_err(|e| e.to_string()))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn writes_pretty_json_and_replaces() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/out.json");

        write_json_atomic(&path, &json!([{"page": 1, "text": "Ünïcode"}])).unwrap();
        let first = std::fs::read_to_string(&path).unwrap();
        assert!(first.contains("\n  {"), "expected indented output: {first}");
        assert!(first.contains("Ünïcode"), "non-ASCII must not be escaped");

        write_json_atomic(&path, &json!([])).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "[]\n");
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn read_json_distinguishes_missing_and_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let missing: Option<Result<Vec<u32>, String>> =
            read_json(&dir.path().join("none.json")).unwrap();
        assert!(missing.is_none());

        let bad = dir.path().join("bad.json");
        std::fs::write(&bad, "{not json").unwrap();
        let parsed: Option<Result<Vec<u32>, String>> = read_json(&bad).unwrap();
        assert!(matches!(parsed, Some(Err(_))));

        let good = dir.path().join("good.json");
        std::fs::write(&good, "[1,2]").unwrap();
        let parsed: Option<Result<Vec<u32>, String>> = read_json(&good).unwrap();
        assert_eq!(parsed, Some(Ok(vec![1, 2])));
    }
}
