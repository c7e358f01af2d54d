// ============================================================
// FOLDER COMPARER
// ============================================================
// Diff a problem localisation folder against a working reference

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use super::batch::read_file;
use super::validator::LocValidator;
use crate::domain::error::{AppError, Result};
use crate::domain::loc::{
    ComparisonReport, FileComparison, FormatConfig, IssueType, LocFile, LocRecord, PriorityRule,
    ValueDifference,
};
use crate::infrastructure::csv::LocParser;
use crate::infrastructure::storage::collect_csv_files;

fn csv_files_by_name(dir: &Path) -> Result<BTreeMap<String, PathBuf>> {
    if !dir.is_dir() {
        return Err(AppError::NotFound(format!(
            "Folder does not exist: {}",
            dir.display()
        )));
    }
    Ok(collect_csv_files(dir)?
        .into_iter()
        .filter_map(|path| {
            let name = path.file_name()?.to_string_lossy().to_string();
            Some((name, path))
        })
        .collect())
}

/// First definition of each key, the one the game uses
fn effective_records(file: &LocFile) -> BTreeMap<&str, &LocRecord> {
    let mut records = BTreeMap::new();
    for record in file.records() {
        records.entry(record.key.as_str()).or_insert(record);
    }
    records
}

fn diff_keys(comparison: &mut FileComparison, problem: &LocFile, reference: &LocFile) {
    let problem = effective_records(problem);
    let reference = effective_records(reference);

    comparison.problem_only_keys = problem
        .keys()
        .filter(|key| !reference.contains_key(*key))
        .map(|key| key.to_string())
        .collect();
    comparison.reference_only_keys = reference
        .keys()
        .filter(|key| !problem.contains_key(*key))
        .map(|key| key.to_string())
        .collect();

    for (key, record) in &problem {
        if let Some(other) = reference.get(key) {
            if record.fields != other.fields {
                comparison.different_values.push(ValueDifference {
                    key: key.to_string(),
                    problem_text: record.primary_text().to_string(),
                    reference_text: other.primary_text().to_string(),
                });
            }
        }
    }
}

pub struct FolderComparer {
    validator: LocValidator,
    parser: LocParser,
}

impl FolderComparer {
    pub fn new(config: FormatConfig) -> Result<Self> {
        Ok(Self {
            validator: LocValidator::new(config.clone(), PriorityRule::default())?,
            parser: LocParser::new(config),
        })
    }

    /// Compare every `*.csv` name found in either folder
    pub fn compare(&self, problem_dir: &Path, reference_dir: &Path) -> Result<ComparisonReport> {
        let problem = csv_files_by_name(problem_dir)?;
        let reference = csv_files_by_name(reference_dir)?;
        let names: BTreeSet<&String> = problem.keys().chain(reference.keys()).collect();

        let mut report = ComparisonReport {
            problem_dir: problem_dir.to_path_buf(),
            reference_dir: reference_dir.to_path_buf(),
            files: Vec::new(),
        };
        for name in names {
            tracing::info!("Comparing {}", name);
            report
                .files
                .push(self.compare_file(name, problem.get(name), reference.get(name)));
        }

        tracing::info!(
            "Compared {} file names: {} missing in {}, {} only there",
            report.files.len(),
            report.missing_in_problem().count(),
            problem_dir.display(),
            report.missing_in_reference().count()
        );
        Ok(report)
    }

    fn compare_file(
        &self,
        name: &str,
        problem: Option<&PathBuf>,
        reference: Option<&PathBuf>,
    ) -> FileComparison {
        let mut comparison = FileComparison {
            file_name: name.to_string(),
            in_problem: problem.is_some(),
            in_reference: reference.is_some(),
            ..Default::default()
        };
        if let Some(problem) = problem {
            if let Err(e) = self.inspect(&mut comparison, problem, reference) {
                tracing::warn!("{}: {}", name, e);
                comparison.error = Some(e.to_string());
            }
        }
        comparison
    }

    fn inspect(
        &self,
        comparison: &mut FileComparison,
        problem: &Path,
        reference: Option<&PathBuf>,
    ) -> Result<()> {
        let (result, problem_file) = self.validator.validate_bytes(problem, &read_file(problem)?);
        comparison.encoding = Some(result.encoding_detected.clone());
        comparison.format_errors = result.error_count();
        comparison.format_warnings = result.warning_count();
        for issue in &result.issues {
            match issue.issue_type {
                IssueType::EmptyLine => comparison.empty_lines += 1,
                IssueType::ColumnCount => comparison.column_issues += 1,
                _ => {}
            }
        }

        if let Some(reference) = reference {
            let reference_file = self.parser.parse_file(reference)?;
            diff_keys(comparison, &problem_file, &reference_file);
        }
        Ok(())
    }
}
