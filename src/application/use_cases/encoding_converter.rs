use encoding_rs::Encoding;
use std::path::Path;

use super::batch::{rewrite_files, Rewrite};
use crate::domain::error::{AppError, Result};
use crate::domain::loc::FixReport;
use crate::infrastructure::encoding::{decode, encode};
use crate::infrastructure::storage::WriteOptions;

/// Re-encode one file's bytes into `target`.
///
/// Files already valid in `target` (ASCII, or the same encoding without a
/// BOM) come back unchanged.
pub fn convert_bytes(bytes: &[u8], target: &'static Encoding) -> Result<Rewrite> {
    let decoded = decode(bytes);
    if decoded.had_errors {
        return Err(AppError::EncodingError(format!(
            "Input is not valid {}",
            decoded.source
        )));
    }
    if decoded.source.matches(target) {
        return Ok(Rewrite::unchanged(bytes));
    }

    Ok(Rewrite {
        bytes: encode(&decoded.text, target)?,
        changes: vec![format!(
            "Converted encoding from {} to {}",
            decoded.source,
            target.name()
        )],
    })
}

pub fn convert_encoding(
    target: &Path,
    encoding: &'static Encoding,
    options: &WriteOptions,
) -> Result<FixReport> {
    tracing::info!("Converting {} to {}", target.display(), encoding.name());
    rewrite_files("Encoding conversion", target, options, |_, bytes| {
        convert_bytes(bytes, encoding)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use encoding_rs::{UTF_8, WINDOWS_1252};
    use std::fs;

    #[test]
    fn test_utf8_to_windows_1252() {
        let rewrite = convert_bytes("K;Café €\r\r\n".as_bytes(), WINDOWS_1252).unwrap();
        assert_eq!(rewrite.bytes, b"K;Caf\xE9 \x80\r\r\n".to_vec());
        assert_eq!(rewrite.changes, vec!["Converted encoding from utf-8 to windows-1252"]);
    }

    #[test]
    fn test_bom_is_dropped() {
        let rewrite = convert_bytes(b"\xEF\xBB\xBFK;x", UTF_8).unwrap();
        assert_eq!(rewrite.bytes, b"K;x".to_vec());
    }

    #[test]
    fn test_ascii_and_matching_files_unchanged() {
        for (bytes, target) in [
            (b"K;plain".to_vec(), WINDOWS_1252),
            (b"K;caf\xE9".to_vec(), WINDOWS_1252),
            ("K;café".as_bytes().to_vec(), UTF_8),
        ] {
            let rewrite = convert_bytes(&bytes, target).unwrap();
            assert_eq!(rewrite.bytes, bytes);
            assert!(rewrite.changes.is_empty());
        }
    }

    #[test]
    fn test_unmappable_character_fails_loudly() {
        let err = convert_bytes("A;ok\nB;日本".as_bytes(), WINDOWS_1252).unwrap_err();
        assert!(matches!(err, AppError::EncodingError(_)));
        assert!(err.to_string().contains("line 2, column 3"), "{}", err);
    }

    #[test]
    fn test_convert_directory_keeps_going_after_failure() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.csv"), "A;日本").unwrap();
        fs::write(dir.path().join("b.csv"), "B;é").unwrap();

        let report = convert_encoding(dir.path(), WINDOWS_1252, &WriteOptions::default()).unwrap();
        assert_eq!(report.files_failed(), 1);
        assert_eq!(report.files_fixed(), 1);
        assert_eq!(fs::read(dir.path().join("a.csv")).unwrap(), "A;日本".as_bytes());
        assert_eq!(fs::read(dir.path().join("b.csv")).unwrap(), b"B;\xE9".to_vec());
    }
}
