use csv::{ReaderBuilder, Trim};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use crate::domain::error::{AppError, Result};
use crate::infrastructure::encoding::decode;

/// Read a comma-separated (or one-per-line) list of keys from a file
pub fn read_key_list(path: &Path) -> Result<BTreeSet<String>> {
    let bytes = fs::read(path).map_err(|e| {
        AppError::IoError(format!("Failed to read key list {}: {}", path.display(), e))
    })?;
    parse_key_list(&decode(&bytes).text)
}

/// Parse keys separated by commas and/or line breaks; blanks are skipped
pub fn parse_key_list(content: &str) -> Result<BTreeSet<String>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(content.as_bytes());

    let mut keys = BTreeSet::new();
    for (index, result) in reader.records().enumerate() {
        let record = result.map_err(|e| {
            AppError::ParseError(format!("Failed to parse key list row {}: {}", index + 1, e))
        })?;
        keys.extend(
            record
                .iter()
                .filter(|k| !k.is_empty())
                .map(str::to_string),
        );
    }

    Ok(keys)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_comma_separated() {
        let keys = parse_key_list("EVTNAME1, EVTDESC1 ,,EVTOPTA1").unwrap();
        assert_eq!(
            keys.into_iter().collect::<Vec<_>>(),
            vec!["EVTDESC1", "EVTNAME1", "EVTOPTA1"]
        );
    }

    #[test]
    fn test_parse_multiline() {
        let keys = parse_key_list("A,B\nC\n\nA").unwrap();
        assert_eq!(keys.len(), 3);
    }

    #[test]
    fn test_read_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keys.txt");
        std::fs::write(&path, "K1,K2").unwrap();
        let keys = read_key_list(&path).unwrap();
        assert!(keys.contains("K1") && keys.contains("K2"));
    }
}
