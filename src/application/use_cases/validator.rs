// ============================================================
// LOCALISATION VALIDATOR
// ============================================================
// Report format problems without touching any file

use encoding_rs::Encoding;
use std::path::Path;

use super::batch::read_file;
use super::duplicate_resolver::{cross_file_dead_entries, within_file_duplicates};
use crate::domain::error::Result;
use crate::domain::loc::{
    FileValidationResult, FormatConfig, IssueType, LineEnding, LocFile, LocLine, PriorityRule,
    Severity, ValidationIssue, ValidationReport,
};
use crate::infrastructure::csv::LocParser;
use crate::infrastructure::encoding::{decode, find_unmappable, resolve_encoding};
use crate::infrastructure::storage::collect_csv_files;

pub struct LocValidator {
    parser: LocParser,
    target: &'static Encoding,
    priority: PriorityRule,
}

impl LocValidator {
    pub fn new(config: FormatConfig, priority: PriorityRule) -> Result<Self> {
        let target = resolve_encoding(&config.encoding)?;
        Ok(Self {
            parser: LocParser::new(config),
            target,
            priority,
        })
    }

    fn config(&self) -> &FormatConfig {
        self.parser.config()
    }

    /// Validate a file or every `*.csv` in a directory, then across files
    pub fn validate_path(&self, target: &Path) -> Result<ValidationReport> {
        let mut report = ValidationReport::default();
        let mut parsed = Vec::new();

        for path in collect_csv_files(target)? {
            tracing::info!("Validating {}", path.display());
            match read_file(&path) {
                Ok(bytes) => {
                    let (result, file) = self.validate_bytes(&path, &bytes);
                    report.file_results.push(result);
                    parsed.push(file);
                }
                Err(e) => {
                    tracing::warn!("{}", e);
                    let mut result = FileValidationResult::new(&path);
                    result.issues.push(ValidationIssue::new(
                        &path,
                        IssueType::Unreadable,
                        Severity::Error,
                        e.to_string(),
                    ));
                    report.file_results.push(result);
                }
            }
        }

        report.cross_file_issues = self.cross_file_issues(&parsed);
        tracing::info!(
            "Validated {} files: {} errors, {} warnings",
            report.total_files(),
            report.total_errors(),
            report.total_warnings()
        );
        Ok(report)
    }

    /// Validate one file's bytes; the parsed file is returned for cross-file checks
    pub fn validate_bytes(&self, path: &Path, bytes: &[u8]) -> (FileValidationResult, LocFile) {
        let decoded = decode(bytes);
        let mut result = FileValidationResult::new(path);
        result.encoding_detected = decoded.source.label().to_string();

        if decoded.had_errors {
            result.issues.push(
                ValidationIssue::new(
                    path,
                    IssueType::Encoding,
                    Severity::Error,
                    format!("Malformed {} byte sequences", decoded.source),
                )
                .with_suggestion("Re-save the file as UTF-8 or Windows-1252"),
            );
        }

        if !decoded.source.matches(self.target) {
            result.issues.push(
                ValidationIssue::new(
                    path,
                    IssueType::Encoding,
                    Severity::Warning,
                    format!(
                        "File is {}, expected {}",
                        decoded.source,
                        self.target.name()
                    ),
                )
                .with_suggestion("Run `lockit convert`"),
            );
            if let Some(bad) = find_unmappable(&decoded.text, self.target) {
                result.issues.push(
                    ValidationIssue::new(
                        path,
                        IssueType::Encoding,
                        Severity::Error,
                        format!(
                            "'{}' (U+{:04X}) cannot be encoded as {}",
                            bad.ch,
                            bad.ch as u32,
                            self.target.name()
                        ),
                    )
                    .at_line(bad.line)
                    .with_suggestion("Replace the character"),
                );
            }
        }

        let file = self.parser.parse_decoded(path, decoded);
        result.line_count = file.lines.len();
        result.record_count = file.record_count();
        result.column_count = file.records().next().map(|r| r.column_count()).unwrap_or(0);
        result.line_endings = file.line_endings;

        self.check_line_endings(&file, &mut result);
        self.check_lines(&file, &mut result);

        for dup in within_file_duplicates(&file) {
            let differs = if dup.text_differs {
                " with different text"
            } else {
                ""
            };
            result.issues.push(
                ValidationIssue::new(
                    path,
                    IssueType::DuplicateKeySameFile,
                    Severity::Warning,
                    format!(
                        "Duplicate key '{}'{} (first defined on line {})",
                        dup.key, differs, dup.kept_line
                    ),
                )
                .at_line(dup.line_number)
                .with_suggestion("Run `lockit dedupe --scope within`"),
            );
        }

        (result, file)
    }

    fn check_line_endings(&self, file: &LocFile, result: &mut FileValidationResult) {
        let expected = self.config().line_ending;
        let stats = &file.line_endings;

        if stats.foreign(expected) > 0 {
            let found: Vec<String> = LineEnding::ALL
                .into_iter()
                .filter(|&e| e != expected && stats.count(e) > 0)
                .map(|e| format!("{} x{}", e.escaped(), stats.count(e)))
                .chain((stats.cr_runs > 0).then(|| format!("CR runs x{}", stats.cr_runs)))
                .collect();
            result.issues.push(
                ValidationIssue::new(
                    &file.path,
                    IssueType::LineEnding,
                    Severity::Error,
                    format!(
                        "Expected {} line endings, found {}",
                        expected.escaped(),
                        found.join(", ")
                    ),
                )
                .with_suggestion("Run `lockit line-endings`"),
            );
        }

        if !file.lines.is_empty() && !file.trailing_newline {
            result.issues.push(ValidationIssue::new(
                &file.path,
                IssueType::LineEnding,
                Severity::Info,
                "File does not end with a line break",
            ));
        }
    }

    fn check_lines(&self, file: &LocFile, result: &mut FileValidationResult) {
        let config = self.config();

        for line in &file.lines {
            let record = match line {
                LocLine::Record(record) | LocLine::Keyless(record) => record,
                // A leading blank line is not in the body.
                LocLine::Blank { line_number, .. } if *line_number > 1 => {
                    result.issues.push(
                        ValidationIssue::new(
                            &file.path,
                            IssueType::EmptyLine,
                            Severity::Warning,
                            "Empty line",
                        )
                        .at_line(*line_number)
                        .with_suggestion("Run `lockit fix`"),
                    );
                    continue;
                }
                LocLine::Blank { .. } | LocLine::Comment { .. } => continue,
            };
            let text = record.to_line();

            if record.column_count() != config.columns {
                result.issues.push(
                    ValidationIssue::new(
                        &file.path,
                        IssueType::ColumnCount,
                        Severity::Error,
                        format!(
                            "Expected {} columns, found {}",
                            config.columns,
                            record.column_count()
                        ),
                    )
                    .at_line(record.line_number)
                    .with_context(&text)
                    .with_suggestion("Run `lockit fix`"),
                );
            }

            let terminator = record.fields.get(config.terminator_index);
            if terminator.map(String::as_str) != Some(config.terminator_value.as_str()) {
                result.issues.push(
                    ValidationIssue::new(
                        &file.path,
                        IssueType::MissingTerminator,
                        Severity::Warning,
                        format!(
                            "Column {} should be '{}', found '{}'",
                            config.terminator_index + 1,
                            config.terminator_value,
                            terminator.map(String::as_str).unwrap_or("")
                        ),
                    )
                    .at_line(record.line_number)
                    .with_context(&text),
                );
            }

            let key_problem = if record.key.is_empty() {
                Some("Empty key".to_string())
            } else if record.key.chars().any(char::is_whitespace) {
                Some(format!("Key '{}' contains whitespace", record.key))
            } else {
                None
            };
            if let Some(message) = key_problem {
                result.issues.push(
                    ValidationIssue::new(
                        &file.path,
                        IssueType::InvalidKey,
                        Severity::Warning,
                        message,
                    )
                    .at_line(record.line_number)
                    .with_context(&text),
                );
            }
        }
    }

    /// Dead entries across the parsed files, reported on the overridden occurrence
    pub fn cross_file_issues(&self, files: &[LocFile]) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();
        for (file, dead) in files
            .iter()
            .zip(cross_file_dead_entries(files, self.priority))
        {
            for entry in dead {
                issues.push(
                    ValidationIssue::new(
                        &file.path,
                        IssueType::DuplicateKeyCrossFile,
                        Severity::Warning,
                        format!(
                            "Key '{}' is overridden by {}:{}",
                            entry.key, entry.kept_in, entry.kept_line
                        ),
                    )
                    .at_line(entry.line_number)
                    .with_suggestion("Run `lockit dedupe --scope cross`"),
                );
            }
        }
        issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;

    fn validator() -> LocValidator {
        LocValidator::new(FormatConfig::default(), PriorityRule::LastLoadedWins).unwrap()
    }

    fn good_line(key: &str) -> String {
        format!("{};text;;;;;;;;;;;;;x;;;;", key)
    }

    fn types(result: &FileValidationResult) -> Vec<IssueType> {
        result.issues.iter().map(|i| i.issue_type).collect()
    }

    #[test]
    fn test_clean_file_is_valid() {
        let content = format!("#CODE;ENGLISH\r\r\n{}\r\r\n{}\r\r\n", good_line("A"), good_line("B"));
        let (result, _) = validator().validate_bytes(&PathBuf::from("a.csv"), content.as_bytes());
        assert!(result.is_valid());
        assert!(result.issues.is_empty(), "{:?}", result.issues);
        assert_eq!(result.record_count, 2);
        assert_eq!(result.column_count, 19);
        assert_eq!(result.encoding_detected, "ascii");
    }

    #[test]
    fn test_reports_each_issue_type() {
        let content = format!(
            "{}\nSHORT;text\r\r\n\r\r\nBAD KEY;t;;;;;;;;;;;;;x;;;;\r\r\n{}\r\r\n",
            good_line("A"),
            good_line("A")
        );
        let (result, _) = validator().validate_bytes(&PathBuf::from("a.csv"), content.as_bytes());
        let found = types(&result);

        assert!(found.contains(&IssueType::LineEnding));
        assert!(found.contains(&IssueType::ColumnCount));
        assert!(found.contains(&IssueType::MissingTerminator));
        assert!(found.contains(&IssueType::EmptyLine));
        assert!(found.contains(&IssueType::InvalidKey));
        assert!(found.contains(&IssueType::DuplicateKeySameFile));
        assert!(!result.is_valid());

        let column = result
            .issues
            .iter()
            .find(|i| i.issue_type == IssueType::ColumnCount)
            .unwrap();
        assert_eq!(column.line_number, Some(2));
        assert_eq!(column.context, "SHORT;text");
    }

    #[test]
    fn test_keyless_line_is_checked() {
        let content = format!("{}\r\r\n;orphan text;only three\r\r\n", good_line("A"));
        let (result, _) = validator().validate_bytes(&PathBuf::from("a.csv"), content.as_bytes());
        assert!(!result.is_valid());

        let on_line_2: Vec<_> = result
            .issues
            .iter()
            .filter(|i| i.line_number == Some(2))
            .map(|i| i.issue_type)
            .collect();
        assert_eq!(
            on_line_2,
            vec![
                IssueType::ColumnCount,
                IssueType::MissingTerminator,
                IssueType::InvalidKey
            ]
        );
        let key = result
            .issues
            .iter()
            .find(|i| i.issue_type == IssueType::InvalidKey)
            .unwrap();
        assert_eq!(key.message, "Empty key");
        assert_eq!(result.record_count, 1);
    }

    #[test]
    fn test_leading_blank_line_is_not_reported() {
        let content = format!("\r\r\n{}\r\r\n\r\r\n{}\r\r\n", good_line("A"), good_line("B"));
        let (result, _) = validator().validate_bytes(&PathBuf::from("a.csv"), content.as_bytes());
        let empty: Vec<_> = result
            .issues
            .iter()
            .filter(|i| i.issue_type == IssueType::EmptyLine)
            .map(|i| i.line_number)
            .collect();
        assert_eq!(empty, vec![Some(3)]);
    }

    #[test]
    fn test_encoding_warning_and_unmappable_error() {
        let content = format!("{}\r\r\nK;日本;;;;;;;;;;;;;x;;;;\r\r\n", good_line("A"));
        let (result, _) = validator().validate_bytes(&PathBuf::from("a.csv"), content.as_bytes());
        let encoding: Vec<_> = result
            .issues
            .iter()
            .filter(|i| i.issue_type == IssueType::Encoding)
            .collect();
        assert_eq!(encoding.len(), 2);
        assert_eq!(encoding[0].severity, Severity::Warning);
        assert_eq!(encoding[1].severity, Severity::Error);
        assert_eq!(encoding[1].line_number, Some(2));
    }

    #[test]
    fn test_missing_final_break_is_info() {
        let (result, _) =
            validator().validate_bytes(&PathBuf::from("a.csv"), good_line("A").as_bytes());
        assert!(result.is_valid());
        assert_eq!(result.issues.len(), 1);
        assert_eq!(result.issues[0].severity, Severity::Info);
    }

    #[test]
    fn test_cross_file_issue_on_overridden_occurrence() {
        let dir = tempfile::tempdir().unwrap();
        let line = format!("{}\r\r\n", good_line("SHARED"));
        fs::write(dir.path().join("00_mod.csv"), &line).unwrap();
        fs::write(dir.path().join("zz_base.csv"), &line).unwrap();

        let report = validator().validate_path(dir.path()).unwrap();
        assert_eq!(report.total_files(), 2);
        assert_eq!(report.cross_file_issues.len(), 1);
        let issue = &report.cross_file_issues[0];
        assert_eq!(issue.file_name(), "zz_base.csv");
        assert_eq!(issue.issue_type, IssueType::DuplicateKeyCrossFile);
        assert!(issue.message.contains("00_mod.csv:1"));
        assert_eq!(report.total_errors(), 0);
    }
}
