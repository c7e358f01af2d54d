use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use super::LineEndingStats;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Cosmetic or best practice
    Info,
    /// May cause issues in game
    Warning,
    /// Breaks loading of the file
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueType {
    Encoding,
    ColumnCount,
    LineEnding,
    EmptyLine,
    DuplicateKeySameFile,
    DuplicateKeyCrossFile,
    MissingTerminator,
    InvalidKey,
    /// The file could not be read at all
    Unreadable,
}

impl IssueType {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueType::Encoding => "encoding",
            IssueType::ColumnCount => "column_count",
            IssueType::LineEnding => "line_ending",
            IssueType::EmptyLine => "empty_line",
            IssueType::DuplicateKeySameFile => "duplicate_key_same_file",
            IssueType::DuplicateKeyCrossFile => "duplicate_key_cross_file",
            IssueType::MissingTerminator => "missing_terminator",
            IssueType::InvalidKey => "invalid_key",
            IssueType::Unreadable => "unreadable",
        }
    }
}

impl fmt::Display for IssueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single validation finding
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub file_path: PathBuf,
    pub issue_type: IssueType,
    pub severity: Severity,
    pub line_number: Option<usize>,
    pub message: String,

    /// The offending line or key, shortened for display
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub context: String,

    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub suggestion: String,
}

impl ValidationIssue {
    pub fn new(
        file_path: impl Into<PathBuf>,
        issue_type: IssueType,
        severity: Severity,
        message: impl Into<String>,
    ) -> Self {
        Self {
            file_path: file_path.into(),
            issue_type,
            severity,
            line_number: None,
            message: message.into(),
            context: String::new(),
            suggestion: String::new(),
        }
    }

    pub fn at_line(mut self, line_number: usize) -> Self {
        self.line_number = Some(line_number);
        self
    }

    pub fn with_context(mut self, context: &str) -> Self {
        self.context = shorten(context, 80);
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = suggestion.into();
        self
    }

    pub fn file_name(&self) -> String {
        self.file_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.file_path.display().to_string())
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let location = self
            .line_number
            .map(|n| format!(":{}", n))
            .unwrap_or_default();
        write!(
            f,
            "[{}] {}{}: {}",
            self.severity.as_str().to_uppercase(),
            self.file_name(),
            location,
            self.message
        )
    }
}

/// Truncate to `max_chars` characters, marking the cut with "..."
pub fn shorten(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let head: String = text.chars().take(max_chars).collect();
        format!("{}...", head)
    }
}

/// Validation result for one file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileValidationResult {
    pub file_path: PathBuf,
    pub encoding_detected: String,
    pub line_count: usize,
    pub record_count: usize,

    /// Column count of the first record, 0 when the file has none
    pub column_count: usize,

    pub line_endings: LineEndingStats,
    pub issues: Vec<ValidationIssue>,
}

impl FileValidationResult {
    pub fn new(file_path: impl Into<PathBuf>) -> Self {
        Self {
            file_path: file_path.into(),
            ..Default::default()
        }
    }

    pub fn is_valid(&self) -> bool {
        self.error_count() == 0
    }

    pub fn error_count(&self) -> usize {
        count_severity(&self.issues, Severity::Error)
    }

    pub fn warning_count(&self) -> usize {
        count_severity(&self.issues, Severity::Warning)
    }
}

/// Validation report for a set of files
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationReport {
    pub file_results: Vec<FileValidationResult>,
    pub cross_file_issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn total_files(&self) -> usize {
        self.file_results.len()
    }

    pub fn valid_files(&self) -> usize {
        self.file_results.iter().filter(|r| r.is_valid()).count()
    }

    pub fn total_errors(&self) -> usize {
        self.file_results.iter().map(|r| r.error_count()).sum::<usize>()
            + count_severity(&self.cross_file_issues, Severity::Error)
    }

    pub fn total_warnings(&self) -> usize {
        self.file_results.iter().map(|r| r.warning_count()).sum::<usize>()
            + count_severity(&self.cross_file_issues, Severity::Warning)
    }

    /// Every issue, per-file ones first
    pub fn all_issues(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.file_results
            .iter()
            .flat_map(|r| r.issues.iter())
            .chain(self.cross_file_issues.iter())
    }
}

fn count_severity(issues: &[ValidationIssue], severity: Severity) -> usize {
    issues.iter().filter(|i| i.severity == severity).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_display() {
        let issue = ValidationIssue::new(
            "/mods/loc/text.csv",
            IssueType::ColumnCount,
            Severity::Error,
            "Column count 3, expected 19",
        )
        .at_line(7);
        assert_eq!(
            issue.to_string(),
            "[ERROR] text.csv:7: Column count 3, expected 19"
        );
    }

    #[test]
    fn test_shorten_counts_chars() {
        assert_eq!(shorten("abc", 3), "abc");
        assert_eq!(shorten("äöüß", 2), "äö...");
    }

    #[test]
    fn test_report_totals() {
        let mut file = FileValidationResult::new("a.csv");
        file.issues.push(ValidationIssue::new(
            "a.csv",
            IssueType::EmptyLine,
            Severity::Warning,
            "Empty line",
        ));
        let mut bad = FileValidationResult::new("b.csv");
        bad.issues.push(ValidationIssue::new(
            "b.csv",
            IssueType::LineEnding,
            Severity::Error,
            "Wrong line ending",
        ));
        let report = ValidationReport {
            file_results: vec![file, bad],
            cross_file_issues: vec![ValidationIssue::new(
                "a.csv",
                IssueType::DuplicateKeyCrossFile,
                Severity::Warning,
                "dup",
            )],
        };
        assert_eq!(report.total_files(), 2);
        assert_eq!(report.valid_files(), 1);
        assert_eq!(report.total_errors(), 1);
        assert_eq!(report.total_warnings(), 2);
        assert_eq!(report.all_issues().count(), 3);
    }
}
