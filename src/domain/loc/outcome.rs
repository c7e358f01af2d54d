// ============================================================
// OPERATION OUTCOMES
// ============================================================
// Results of fix, dedupe, scan and compare runs

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

/// Result of rewriting one file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FixResult {
    pub file_path: PathBuf,
    pub success: bool,
    pub backup_path: Option<PathBuf>,
    pub changes_made: Vec<String>,

    /// Whether new bytes were (or, in a dry run, would be) written
    pub written: bool,

    pub error: Option<String>,
}

impl FixResult {
    pub fn new(file_path: impl Into<PathBuf>) -> Self {
        Self {
            file_path: file_path.into(),
            success: true,
            ..Default::default()
        }
    }

    pub fn failed(file_path: impl Into<PathBuf>, error: impl Into<String>) -> Self {
        Self {
            file_path: file_path.into(),
            success: false,
            error: Some(error.into()),
            ..Default::default()
        }
    }

    pub fn was_modified(&self) -> bool {
        !self.changes_made.is_empty()
    }
}

/// Results of a batch rewrite
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FixReport {
    pub title: String,
    pub results: Vec<FixResult>,
    pub dry_run: bool,
}

impl FixReport {
    pub fn new(title: impl Into<String>, dry_run: bool) -> Self {
        Self {
            title: title.into(),
            results: Vec::new(),
            dry_run,
        }
    }

    pub fn files_fixed(&self) -> usize {
        self.results
            .iter()
            .filter(|r| r.was_modified() && r.success)
            .count()
    }

    pub fn files_failed(&self) -> usize {
        self.results.iter().filter(|r| !r.success).count()
    }
}

/// A key removed because another definition wins
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemovedEntry {
    pub key: String,
    pub line_number: usize,

    /// File holding the surviving definition
    pub kept_in: String,
    pub kept_line: usize,

    /// Whether the removed text differs from the surviving one
    pub text_differs: bool,
}

/// Dead entries found in one file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DedupeFileResult {
    pub file_path: PathBuf,
    pub within_file: Vec<RemovedEntry>,
    pub cross_file: Vec<RemovedEntry>,
    pub fix: Option<FixResult>,
}

impl DedupeFileResult {
    pub fn removed_count(&self) -> usize {
        self.within_file.len() + self.cross_file.len()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DedupeReport {
    pub dry_run: bool,
    pub iterations: usize,
    pub files: Vec<DedupeFileResult>,
}

impl DedupeReport {
    pub fn total_removed(&self) -> usize {
        self.files.iter().map(|f| f.removed_count()).sum()
    }

    pub fn conflicts(&self) -> impl Iterator<Item = (&DedupeFileResult, &RemovedEntry)> {
        self.files.iter().flat_map(|f| {
            f.within_file
                .iter()
                .chain(f.cross_file.iter())
                .filter(|e| e.text_differs)
                .map(move |e| (f, e))
        })
    }

    pub fn files_failed(&self) -> usize {
        self.files
            .iter()
            .filter(|f| f.fix.as_ref().map(|r| !r.success).unwrap_or(false))
            .count()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyCategory {
    Event,
    Decision,
    Modifier,
}

impl KeyCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyCategory::Event => "event",
            KeyCategory::Decision => "decision",
            KeyCategory::Modifier => "modifier",
        }
    }

    pub fn plural_title(&self) -> &'static str {
        match self {
            KeyCategory::Event => "Events",
            KeyCategory::Decision => "Decisions",
            KeyCategory::Modifier => "Modifiers",
        }
    }
}

/// Keys referenced by game script files
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanResult {
    pub event_keys: BTreeSet<String>,
    pub decision_keys: BTreeSet<String>,
    pub modifier_keys: BTreeSet<String>,
}

/// A referenced key with no localisation entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissingKey {
    pub key: String,
    pub source_file: PathBuf,
    pub category: KeyCategory,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MissingKeysReport {
    pub missing_keys: Vec<MissingKey>,
}

impl MissingKeysReport {
    pub fn by_category(&self) -> BTreeMap<KeyCategory, Vec<&MissingKey>> {
        let mut grouped: BTreeMap<KeyCategory, Vec<&MissingKey>> = BTreeMap::new();
        for key in &self.missing_keys {
            grouped.entry(key.category).or_default().push(key);
        }
        grouped
    }

    pub fn total_missing(&self) -> usize {
        self.missing_keys.len()
    }
}

/// A key defined in both folders with different fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueDifference {
    pub key: String,
    pub problem_text: String,
    pub reference_text: String,
}

/// One file name compared across a problem folder and a reference folder
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileComparison {
    pub file_name: String,
    pub in_problem: bool,
    pub in_reference: bool,

    /// Encoding detected for the problem copy
    pub encoding: Option<String>,

    pub empty_lines: usize,
    pub column_issues: usize,
    pub format_errors: usize,
    pub format_warnings: usize,

    pub problem_only_keys: Vec<String>,
    pub reference_only_keys: Vec<String>,
    pub different_values: Vec<ValueDifference>,

    pub error: Option<String>,
}

impl FileComparison {
    /// Ranking weight: empty lines plus column issues
    pub fn severity(&self) -> usize {
        self.empty_lines + self.column_issues
    }

    pub fn has_content_diff(&self) -> bool {
        !self.problem_only_keys.is_empty()
            || !self.reference_only_keys.is_empty()
            || !self.different_values.is_empty()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ComparisonReport {
    pub problem_dir: PathBuf,
    pub reference_dir: PathBuf,
    pub files: Vec<FileComparison>,
}

impl ComparisonReport {
    pub fn missing_in_problem(&self) -> impl Iterator<Item = &FileComparison> {
        self.files.iter().filter(|f| !f.in_problem)
    }

    pub fn missing_in_reference(&self) -> impl Iterator<Item = &FileComparison> {
        self.files.iter().filter(|f| !f.in_reference)
    }

    /// Problem files with format issues, worst first, ties by name
    pub fn ranked(&self) -> Vec<&FileComparison> {
        let mut ranked: Vec<_> = self.files.iter().filter(|f| f.severity() > 0).collect();
        ranked.sort_by(|a, b| {
            b.severity()
                .cmp(&a.severity())
                .then_with(|| a.file_name.cmp(&b.file_name))
        });
        ranked
    }

    /// Named totals with a non-zero count, largest first
    pub fn totals(&self) -> Vec<(&'static str, usize)> {
        let sum = |f: fn(&FileComparison) -> usize| self.files.iter().map(f).sum::<usize>();
        let mut totals = vec![
            ("missing in problem folder", self.missing_in_problem().count()),
            ("only in problem folder", self.missing_in_reference().count()),
            ("empty lines", sum(|f| f.empty_lines)),
            ("column issues", sum(|f| f.column_issues)),
            ("keys only in problem folder", sum(|f| f.problem_only_keys.len())),
            ("keys only in reference folder", sum(|f| f.reference_only_keys.len())),
            ("different values", sum(|f| f.different_values.len())),
        ];
        totals.retain(|(_, count)| *count > 0);
        totals.sort_by(|a, b| b.1.cmp(&a.1));
        totals
    }
}
