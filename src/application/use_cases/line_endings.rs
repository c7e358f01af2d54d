// ============================================================
// LINE ENDING NORMALIZER
// ============================================================
// Rewrite every line break of a file into one form

use std::path::Path;

use super::batch::{rewrite_files, Rewrite};
use crate::domain::error::{AppError, Result};
use crate::domain::loc::{normalize_line_endings, FixReport, LineEnding, LineEndingStats};
use crate::infrastructure::encoding::{decode, detect_encoding, encode_like_source, SourceEncoding};
use crate::infrastructure::storage::WriteOptions;

fn describe(stats: &LineEndingStats, target: LineEnding) -> Vec<String> {
    let mut changes: Vec<String> = LineEnding::ALL
        .into_iter()
        .filter(|&ending| ending != target && stats.count(ending) > 0)
        .map(|ending| {
            format!(
                "Converted {} {} line ending(s) to {}",
                stats.count(ending),
                ending.escaped(),
                target.escaped()
            )
        })
        .collect();

    if stats.cr_runs > 0 {
        changes.push(format!(
            "Collapsed {} run(s) of three or more CRs into {}",
            stats.cr_runs,
            target.escaped()
        ));
    }
    changes
}

/// Normalize the line breaks of one file's raw bytes.
///
/// ASCII-compatible files are rewritten byte-wise. UTF-16 files are
/// decoded first and written back in the same encoding.
pub fn normalize_file_bytes(bytes: &[u8], target: LineEnding) -> Result<Rewrite> {
    let source = detect_encoding(bytes);

    let (stats, normalized) = match source {
        SourceEncoding::Utf16Le | SourceEncoding::Utf16Be => {
            let decoded = decode(bytes);
            let stats = LineEndingStats::of(decoded.text.as_bytes());
            let text = String::from_utf8(normalize_line_endings(decoded.text.as_bytes(), target))
                .map_err(|e| AppError::Internal(format!("Line break rewrite broke UTF-8: {}", e)))?;
            (stats, encode_like_source(&text, source)?)
        }
        _ => (
            LineEndingStats::of(bytes),
            normalize_line_endings(bytes, target),
        ),
    };

    Ok(Rewrite {
        bytes: normalized,
        changes: describe(&stats, target),
    })
}

/// Normalize line endings of a file or every `*.csv` in a directory
pub fn fix_line_endings(
    target: &Path,
    line_ending: LineEnding,
    options: &WriteOptions,
) -> Result<FixReport> {
    tracing::info!(
        "Normalizing line endings to {} under {}",
        line_ending.escaped(),
        target.display()
    );
    rewrite_files("Line ending fix", target, options, |_, bytes| {
        normalize_file_bytes(bytes, line_ending)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_mixed_breaks_become_target() {
        let rewrite = normalize_file_bytes(b"A;1\nB;2\r\nC;3\rD;4\r\r\r\nE;5", LineEnding::CrCrLf)
            .unwrap();
        assert_eq!(
            rewrite.bytes,
            b"A;1\r\r\nB;2\r\r\nC;3\r\r\nD;4\r\r\nE;5".to_vec()
        );
        assert_eq!(rewrite.changes.len(), 4);
        assert!(rewrite.changes[0].contains("1 \\n"));
        assert!(rewrite.changes[3].contains("three or more CRs"));
    }

    #[test]
    fn test_already_normalized_has_no_changes() {
        let bytes = b"A;1\r\r\nB;2\r\r\n";
        let rewrite = normalize_file_bytes(bytes, LineEnding::CrCrLf).unwrap();
        assert_eq!(rewrite.bytes, bytes.to_vec());
        assert!(rewrite.changes.is_empty());
    }

    #[test]
    fn test_windows_1252_bytes_untouched() {
        let rewrite = normalize_file_bytes(b"K;caf\xE9\n", LineEnding::CrLf).unwrap();
        assert_eq!(rewrite.bytes, b"K;caf\xE9\r\n".to_vec());
    }

    #[test]
    fn test_utf16_keeps_encoding() {
        let bytes = b"\xFF\xFEA\x00\n\x00B\x00".to_vec();
        let rewrite = normalize_file_bytes(&bytes, LineEnding::CrLf).unwrap();
        assert_eq!(rewrite.bytes, b"\xFF\xFEA\x00\r\x00\n\x00B\x00".to_vec());
    }

    #[test]
    fn test_fix_directory() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.csv"), "A;1\nB;2\n").unwrap();
        fs::write(dir.path().join("b.csv"), "C;1\r\r\n").unwrap();

        let options = WriteOptions {
            backup: true,
            ..Default::default()
        };
        let report = fix_line_endings(dir.path(), LineEnding::CrCrLf, &options).unwrap();

        assert_eq!(report.files_fixed(), 1);
        assert!(report.results[0].backup_path.is_some());
        assert!(report.results[1].backup_path.is_none());
        assert_eq!(
            fs::read(dir.path().join("a.csv")).unwrap(),
            b"A;1\r\r\nB;2\r\r\n".to_vec()
        );
    }
}
