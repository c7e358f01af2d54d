// ============================================================
// LOCALISATION FIXER
// ============================================================
// Rewrite files into the exact on-disk format

use encoding_rs::Encoding;
use std::path::Path;

use super::batch::{rewrite_files, Rewrite};
use super::column_normalizer::normalize_record;
use super::duplicate_resolver::{apply_removals, within_file_duplicates, RemovalReason};
use crate::domain::error::{AppError, Result};
use crate::domain::loc::{FixReport, FormatConfig};
use crate::infrastructure::csv::LocParser;
use crate::infrastructure::encoding::{decode, encode, resolve_encoding, SourceEncoding};
use crate::infrastructure::storage::WriteOptions;

pub struct LocFixer {
    parser: LocParser,
    target: &'static Encoding,
    dedupe_within: bool,
}

impl LocFixer {
    pub fn new(config: FormatConfig) -> Result<Self> {
        let target = resolve_encoding(&config.encoding)?;
        Ok(Self {
            parser: LocParser::new(config),
            target,
            dedupe_within: false,
        })
    }

    /// Also drop later repeats of a key within each file
    pub fn with_dedupe(mut self, dedupe_within: bool) -> Self {
        self.dedupe_within = dedupe_within;
        self
    }

    /// Fix a file or every `*.csv` in a directory
    pub fn fix_path(&self, target: &Path, options: &WriteOptions) -> Result<FixReport> {
        tracing::info!("Fixing {}", target.display());
        rewrite_files("Format fix", target, options, |path, bytes| {
            self.fix_bytes(path, bytes)
        })
    }

    pub fn fix_bytes(&self, path: &Path, bytes: &[u8]) -> Result<Rewrite> {
        let config = self.parser.config();
        let decoded = decode(bytes);
        if decoded.had_errors {
            return Err(AppError::EncodingError(format!(
                "Input is not valid {}",
                decoded.source
            )));
        }

        let mut changes = Vec::new();
        if decoded.source == SourceEncoding::Utf8Bom {
            changes.push("Removed UTF-8 BOM".to_string());
        }
        if !decoded.source.matches(self.target) {
            changes.push(format!(
                "Converted encoding from {} to {}",
                decoded.source,
                self.target.name()
            ));
        }

        let mut file = self.parser.parse_decoded(path, decoded);

        let before = file.lines.len();
        file.lines.retain(|line| !line.is_blank());
        let blanks = before - file.lines.len();
        if blanks > 0 {
            changes.push(format!("Removed {} empty line(s)", blanks));
        }

        if self.dedupe_within {
            let duplicates = within_file_duplicates(&file);
            if !duplicates.is_empty() {
                apply_removals(&mut file, &duplicates, RemovalReason::Duplicate, None);
                changes.push(format!("Removed {} duplicate key(s)", duplicates.len()));
            }
        }

        let (mut resized, mut terminated) = (0, 0);
        for line in file.lines.iter_mut() {
            if let Some(record) = line.as_fields_mut() {
                let change = normalize_record(record, config);
                if let Some(from) = change.resized_from {
                    tracing::debug!(
                        "{}:{} {} -> {} columns",
                        file.name,
                        record.line_number,
                        from,
                        config.columns
                    );
                    resized += 1;
                }
                if change.terminator_set {
                    terminated += 1;
                }
            }
        }
        if resized > 0 {
            changes.push(format!(
                "Normalized column count to {} on {} line(s)",
                config.columns, resized
            ));
        }
        if terminated > 0 {
            changes.push(format!(
                "Set terminator '{}' on {} line(s)",
                config.terminator_value, terminated
            ));
        }

        if file.line_endings.foreign(config.line_ending) > 0 {
            changes.push(format!(
                "Normalized line endings to {}",
                config.line_ending.escaped()
            ));
        }
        if !file.lines.is_empty() && !file.trailing_newline {
            changes.push("Added final line break".to_string());
        }
        file.trailing_newline = true;

        let text = file.render(config.line_ending);
        Ok(Rewrite {
            bytes: encode(&text, self.target)?,
            changes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;

    fn fixer() -> LocFixer {
        LocFixer::new(FormatConfig::default()).unwrap()
    }

    fn fix(bytes: &[u8]) -> Rewrite {
        fixer().fix_bytes(&PathBuf::from("a.csv"), bytes).unwrap()
    }

    #[test]
    fn test_fix_produces_exact_format() {
        let rewrite = fix("\u{FEFF}#CODE;ENGLISH\nK;Café\n\nJ;a;b\n".as_bytes());
        let expected = [
            "#CODE;ENGLISH",
            "K;Café;;;;;;;;;;;;;x;;;;",
            "J;a;b;;;;;;;;;;;;x;;;;",
        ]
        .iter()
        .map(|l| format!("{}\r\r\n", l))
        .collect::<String>();

        assert_eq!(rewrite.bytes, encode(&expected, encoding_rs::WINDOWS_1252).unwrap());
        assert!(rewrite.changes.contains(&"Removed UTF-8 BOM".to_string()));
        assert!(rewrite.changes.contains(&"Removed 1 empty line(s)".to_string()));
        assert!(rewrite
            .changes
            .iter()
            .any(|c| c.starts_with("Normalized column count to 19 on 2")));
    }

    #[test]
    fn test_fix_is_idempotent() {
        let once = fix(b"K;x\r\nJ;;;;;;;;;;;;;;y;;;;;;;");
        let twice = fix(&once.bytes);
        assert_eq!(once.bytes, twice.bytes);
        assert!(twice.changes.is_empty(), "{:?}", twice.changes);
    }

    #[test]
    fn test_fix_with_dedupe() {
        let rewrite = fixer()
            .with_dedupe(true)
            .fix_bytes(&PathBuf::from("a.csv"), b"K;one\nK;two\n")
            .unwrap();
        assert!(rewrite.changes.contains(&"Removed 1 duplicate key(s)".to_string()));
        assert_eq!(rewrite.bytes, b"K;one;;;;;;;;;;;;;x;;;;\r\r\n".to_vec());
    }

    #[test]
    fn test_fix_path_with_backup() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("text.csv");
        fs::write(&path, "K;x\n").unwrap();

        let options = WriteOptions {
            backup: true,
            backup_dir: Some(dir.path().join("bak")),
            ..Default::default()
        };
        let report = fixer().fix_path(dir.path(), &options).unwrap();
        let result = &report.results[0];
        assert!(result.written);
        assert_eq!(fs::read(result.backup_path.as_ref().unwrap()).unwrap(), b"K;x\n");
        assert_eq!(fs::read(&path).unwrap(), b"K;x;;;;;;;;;;;;;x;;;;\r\r\n".to_vec());

        let again = fixer().fix_path(&path, &options).unwrap();
        assert!(!again.results[0].written);
    }

    #[test]
    fn test_keyless_line_is_padded_not_dropped() {
        let rewrite = fix(b"A;x\r\r\n;orphan text;only three\r\r\n");
        let expected = b"A;x;;;;;;;;;;;;;x;;;;\r\r\n;orphan text;only three;;;;;;;;;;;;x;;;;\r\r\n";
        assert_eq!(rewrite.bytes, expected.to_vec());
        assert!(rewrite
            .changes
            .contains(&"Normalized column count to 19 on 2 line(s)".to_string()));
    }

    #[test]
    fn test_unmappable_text_fails() {
        let err = fixer()
            .fix_bytes(&PathBuf::from("a.csv"), "K;日本".as_bytes())
            .unwrap_err();
        assert!(matches!(err, AppError::EncodingError(_)));
    }
}
