// ============================================================
// REPORTS
// ============================================================
// Markdown and JSON renderings of run results

use serde::Serialize;

use crate::domain::error::Result;
use crate::domain::loc::{
    ComparisonReport, DedupeReport, FixReport, MissingKeysReport, Severity, ValidationIssue,
    ValidationReport,
};

/// Missing keys listed per category before the list is cut short
const MISSING_KEYS_SHOWN: usize = 20;

const RANKED_FILES_SHOWN: usize = 20;
const KEYS_SHOWN_PER_FILE: usize = 5;

fn key_sample(keys: &[String]) -> String {
    let mut text = keys
        .iter()
        .take(KEYS_SHOWN_PER_FILE)
        .map(|k| format!("`{}`", k))
        .collect::<Vec<_>>()
        .join(", ");
    if keys.len() > KEYS_SHOWN_PER_FILE {
        text.push_str(&format!(" and {} more", keys.len() - KEYS_SHOWN_PER_FILE));
    }
    text
}

pub fn to_json<T: Serialize>(report: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

fn marker(severity: Severity) -> &'static str {
    match severity {
        Severity::Error => "[ERROR]",
        Severity::Warning => "[WARN]",
        Severity::Info => "[INFO]",
    }
}

fn issue_line(issue: &ValidationIssue) -> String {
    let line = issue
        .line_number
        .map(|n| n.to_string())
        .unwrap_or_else(|| "-".to_string());
    let mut text = format!(
        "- {} Line {} ({}): {}",
        marker(issue.severity),
        line,
        issue.issue_type,
        issue.message
    );
    if !issue.context.is_empty() {
        text.push_str(&format!(" `{}`", issue.context));
    }
    text
}

pub fn validation_markdown(report: &ValidationReport) -> String {
    let mut lines = vec![
        "# Localisation Validation Report".to_string(),
        String::new(),
        format!("**Files Scanned**: {}", report.total_files()),
        format!("**Valid Files**: {}", report.valid_files()),
        format!("**Total Errors**: {}", report.total_errors()),
        format!("**Total Warnings**: {}", report.total_warnings()),
        String::new(),
    ];

    if report.all_issues().next().is_none() {
        lines.push("All files passed validation.".to_string());
        return lines.join("\n");
    }

    let with_issues: Vec<_> = report
        .file_results
        .iter()
        .filter(|r| !r.issues.is_empty())
        .collect();
    if !with_issues.is_empty() {
        lines.push("## Issues by File".to_string());
        lines.push(String::new());
        for result in with_issues {
            let name = result
                .file_path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            lines.push(format!("### {} ({})", name, result.encoding_detected));
            lines.extend(result.issues.iter().map(issue_line));
            lines.push(String::new());
        }
    }

    if !report.cross_file_issues.is_empty() {
        lines.push("## Cross-File Duplicates".to_string());
        lines.push(String::new());
        for issue in &report.cross_file_issues {
            lines.push(format!(
                "- {} {}:{}: {}",
                marker(issue.severity),
                issue.file_name(),
                issue.line_number.unwrap_or(0),
                issue.message
            ));
        }
    }

    lines.join("\n")
}

pub fn fix_markdown(report: &FixReport) -> String {
    let mode = if report.dry_run { "[DRY RUN] " } else { "" };
    let mut lines = vec![
        format!("# {}{} Report", mode, report.title),
        String::new(),
        format!("**Files Processed**: {}", report.results.len()),
        format!("**Files Fixed**: {}", report.files_fixed()),
        format!("**Files Failed**: {}", report.files_failed()),
        String::new(),
    ];

    let changed: Vec<_> = report
        .results
        .iter()
        .filter(|r| r.success && r.was_modified())
        .collect();
    if changed.is_empty() && report.files_failed() == 0 {
        lines.push("All files already correct.".to_string());
        return lines.join("\n");
    }

    if !changed.is_empty() {
        lines.push("## Changes Made".to_string());
        lines.push(String::new());
        for result in changed {
            lines.push(format!("### {}", result.file_path.display()));
            lines.extend(result.changes_made.iter().map(|c| format!("- {}", c)));
            if let Some(backup) = &result.backup_path {
                lines.push(format!("- Backup: {}", backup.display()));
            }
            lines.push(String::new());
        }
    }

    let failed: Vec<_> = report.results.iter().filter(|r| !r.success).collect();
    if !failed.is_empty() {
        lines.push("## Errors".to_string());
        lines.push(String::new());
        for result in failed {
            lines.push(format!(
                "- {}: {}",
                result.file_path.display(),
                result.error.as_deref().unwrap_or("unknown error")
            ));
        }
    }

    lines.join("\n")
}

pub fn dedupe_markdown(report: &DedupeReport) -> String {
    let mode = if report.dry_run { "[DRY RUN] " } else { "" };
    let mut lines = vec![
        format!("# {}Duplicate Key Report", mode),
        String::new(),
        format!("**Files Processed**: {}", report.files.len()),
        format!("**Entries Removed**: {}", report.total_removed()),
        format!("**Passes**: {}", report.iterations),
        format!("**Files Failed**: {}", report.files_failed()),
        String::new(),
    ];

    if report.total_removed() == 0 && report.files_failed() == 0 {
        lines.push("No duplicate keys found.".to_string());
        return lines.join("\n");
    }

    for file in report.files.iter().filter(|f| f.removed_count() > 0) {
        lines.push(format!("### {}", file.file_path.display()));
        for entry in &file.within_file {
            lines.push(format!(
                "- line {}: `{}` duplicate of line {}",
                entry.line_number, entry.key, entry.kept_line
            ));
        }
        for entry in &file.cross_file {
            lines.push(format!(
                "- line {}: `{}` overridden by {}:{}",
                entry.line_number, entry.key, entry.kept_in, entry.kept_line
            ));
        }
        if let Some(backup) = file.fix.as_ref().and_then(|f| f.backup_path.as_ref()) {
            lines.push(format!("- Backup: {}", backup.display()));
        }
        lines.push(String::new());
    }

    let conflicts: Vec<_> = report.conflicts().collect();
    if !conflicts.is_empty() {
        lines.push("## Conflicting Text".to_string());
        lines.push(String::new());
        lines.push("Removed entries whose text differed from the surviving one:".to_string());
        for (file, entry) in conflicts {
            let name = file
                .file_path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            lines.push(format!("- `{}` in {}:{}", entry.key, name, entry.line_number));
        }
        lines.push(String::new());
    }

    let failed: Vec<_> = report
        .files
        .iter()
        .filter_map(|f| f.fix.as_ref().filter(|r| !r.success))
        .collect();
    if !failed.is_empty() {
        lines.push("## Errors".to_string());
        lines.push(String::new());
        for result in failed {
            lines.push(format!(
                "- {}: {}",
                result.file_path.display(),
                result.error.as_deref().unwrap_or("unknown error")
            ));
        }
    }

    lines.join("\n")
}

pub fn missing_markdown(report: &MissingKeysReport) -> String {
    let mut lines = vec![
        "# Missing Localisation Keys".to_string(),
        String::new(),
        format!("**Total Missing**: {}", report.total_missing()),
        String::new(),
    ];

    if report.total_missing() == 0 {
        lines.push("All keys have localisation entries.".to_string());
        return lines.join("\n");
    }

    for (category, keys) in report.by_category() {
        lines.push(format!(
            "## {} ({} missing)",
            category.plural_title(),
            keys.len()
        ));
        lines.push(String::new());
        for missing in keys.iter().take(MISSING_KEYS_SHOWN) {
            let source = missing
                .source_file
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            lines.push(format!("- `{}` from {}", missing.key, source));
        }
        if keys.len() > MISSING_KEYS_SHOWN {
            lines.push(format!("- ... and {} more", keys.len() - MISSING_KEYS_SHOWN));
        }
        lines.push(String::new());
    }

    lines.join("\n")
}

pub fn comparison_markdown(report: &ComparisonReport) -> String {
    let mut lines = vec![
        "# Localisation Folder Comparison".to_string(),
        String::new(),
        format!("**Problem Folder**: {}", report.problem_dir.display()),
        format!("**Reference Folder**: {}", report.reference_dir.display()),
        format!("**File Names**: {}", report.files.len()),
        String::new(),
    ];

    let totals = report.totals();
    if totals.is_empty() && report.files.iter().all(|f| f.error.is_none()) {
        lines.push("Folders match and no format problems were found.".to_string());
        return lines.join("\n");
    }

    if !totals.is_empty() {
        lines.push("## Summary".to_string());
        lines.push(String::new());
        lines.extend(totals.iter().map(|(name, count)| format!("- {}: {}", name, count)));
        lines.push(String::new());
    }

    let missing: Vec<_> = report
        .missing_in_problem()
        .map(|f| format!("- [ERROR] {} missing in problem folder", f.file_name))
        .chain(
            report
                .missing_in_reference()
                .map(|f| format!("- [INFO] {} only in problem folder", f.file_name)),
        )
        .collect();
    if !missing.is_empty() {
        lines.push("## Files".to_string());
        lines.push(String::new());
        lines.extend(missing);
        lines.push(String::new());
    }

    let ranked = report.ranked();
    if !ranked.is_empty() {
        lines.push("## Most Problematic Files".to_string());
        lines.push(String::new());
        for file in ranked.iter().take(RANKED_FILES_SHOWN) {
            lines.push(format!(
                "- [{} issues] {} ({}): empty lines {}, column issues {}",
                file.severity(),
                file.file_name,
                file.encoding.as_deref().unwrap_or("-"),
                file.empty_lines,
                file.column_issues
            ));
        }
        lines.push(String::new());
    }

    let differing: Vec<_> = report.files.iter().filter(|f| f.has_content_diff()).collect();
    if !differing.is_empty() {
        lines.push("## Content Differences".to_string());
        lines.push(String::new());
        for file in differing {
            lines.push(format!("### {}", file.file_name));
            if !file.problem_only_keys.is_empty() {
                lines.push(format!(
                    "- Only in problem folder: {}",
                    key_sample(&file.problem_only_keys)
                ));
            }
            if !file.reference_only_keys.is_empty() {
                lines.push(format!(
                    "- Only in reference folder: {}",
                    key_sample(&file.reference_only_keys)
                ));
            }
            for diff in file.different_values.iter().take(KEYS_SHOWN_PER_FILE) {
                lines.push(format!(
                    "- `{}`: `{}` vs `{}`",
                    diff.key, diff.problem_text, diff.reference_text
                ));
            }
            if file.different_values.len() > KEYS_SHOWN_PER_FILE {
                lines.push(format!(
                    "- ... and {} more differing values",
                    file.different_values.len() - KEYS_SHOWN_PER_FILE
                ));
            }
            lines.push(String::new());
        }
    }

    let failed: Vec<_> = report.files.iter().filter(|f| f.error.is_some()).collect();
    if !failed.is_empty() {
        lines.push("## Errors".to_string());
        lines.push(String::new());
        for file in failed {
            lines.push(format!(
                "- {}: {}",
                file.file_name,
                file.error.as_deref().unwrap_or_default()
            ));
        }
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::loc::{
        DedupeFileResult, FileComparison, FileValidationResult, FixResult, IssueType,
        KeyCategory, MissingKey, RemovedEntry, ValueDifference,
    };
    use std::path::PathBuf;

    #[test]
    fn test_clean_validation_summary() {
        let mut report = ValidationReport::default();
        report.file_results.push(FileValidationResult::new("a.csv"));
        let md = validation_markdown(&report);
        assert!(md.contains("**Files Scanned**: 1"));
        assert!(md.contains("All files passed validation."));
    }

    #[test]
    fn test_validation_summary_lists_issues() {
        let mut result = FileValidationResult::new("/loc/a.csv");
        result.encoding_detected = "utf-8".to_string();
        result.issues.push(
            ValidationIssue::new(
                "/loc/a.csv",
                IssueType::ColumnCount,
                Severity::Error,
                "Expected 19 columns, found 2",
            )
            .at_line(3)
            .with_context("K;x"),
        );
        let report = ValidationReport {
            file_results: vec![result],
            cross_file_issues: vec![ValidationIssue::new(
                "/loc/b.csv",
                IssueType::DuplicateKeyCrossFile,
                Severity::Warning,
                "Key 'K' is overridden by a.csv:3",
            )
            .at_line(1)],
        };

        let md = validation_markdown(&report);
        assert!(md.contains("### a.csv (utf-8)"));
        assert!(md.contains("- [ERROR] Line 3 (column_count): Expected 19 columns, found 2 `K;x`"));
        assert!(md.contains("- [WARN] b.csv:1: Key 'K' is overridden by a.csv:3"));
    }

    #[test]
    fn test_fix_summary() {
        let mut report = FixReport::new("Format fix", true);
        let mut fixed = FixResult::new("a.csv");
        fixed.changes_made.push("Removed 1 empty line(s)".to_string());
        report.results.push(fixed);
        report.results.push(FixResult::failed("b.csv", "bad bytes"));

        let md = fix_markdown(&report);
        assert!(md.starts_with("# [DRY RUN] Format fix Report"));
        assert!(md.contains("- Removed 1 empty line(s)"));
        assert!(md.contains("- b.csv: bad bytes"));
    }

    #[test]
    fn test_dedupe_summary_lists_conflicts() {
        let report = DedupeReport {
            dry_run: false,
            iterations: 2,
            files: vec![DedupeFileResult {
                file_path: PathBuf::from("zz.csv"),
                cross_file: vec![RemovedEntry {
                    key: "K".to_string(),
                    line_number: 4,
                    kept_in: "00.csv".to_string(),
                    kept_line: 1,
                    text_differs: true,
                }],
                ..Default::default()
            }],
        };
        let md = dedupe_markdown(&report);
        assert!(md.contains("- line 4: `K` overridden by 00.csv:1"));
        assert!(md.contains("- `K` in zz.csv:4"));
    }

    #[test]
    fn test_missing_summary_truncates() {
        let report = MissingKeysReport {
            missing_keys: (0..25)
                .map(|i| MissingKey {
                    key: format!("EVTNAME{}", i),
                    source_file: PathBuf::from("events/a.txt"),
                    category: KeyCategory::Event,
                })
                .collect(),
        };
        let md = missing_markdown(&report);
        assert!(md.contains("## Events (25 missing)"));
        assert!(md.contains("- ... and 5 more"));
        assert!(md.contains("- `EVTNAME0` from a.txt"));
    }

    #[test]
    fn test_comparison_summary() {
        let report = ComparisonReport {
            problem_dir: PathBuf::from("broken"),
            reference_dir: PathBuf::from("working"),
            files: vec![
                FileComparison {
                    file_name: "events.csv".to_string(),
                    in_reference: true,
                    ..Default::default()
                },
                FileComparison {
                    file_name: "text.csv".to_string(),
                    in_problem: true,
                    in_reference: true,
                    encoding: Some("utf-8".to_string()),
                    empty_lines: 2,
                    column_issues: 1,
                    problem_only_keys: (0..7).map(|i| format!("K{}", i)).collect(),
                    different_values: vec![ValueDifference {
                        key: "A".to_string(),
                        problem_text: "one".to_string(),
                        reference_text: "uno".to_string(),
                    }],
                    ..Default::default()
                },
            ],
        };

        let md = comparison_markdown(&report);
        assert!(md.contains("- [ERROR] events.csv missing in problem folder"));
        assert!(md.contains("- [3 issues] text.csv (utf-8): empty lines 2, column issues 1"));
        assert!(md.contains("`K4` and 2 more"));
        assert!(md.contains("- `A`: `one` vs `uno`"));
        assert!(md.contains("- keys only in problem folder: 7"));
    }

    #[test]
    fn test_matching_folders_summary() {
        let report = ComparisonReport::default();
        assert!(comparison_markdown(&report).contains("Folders match"));
    }

    #[test]
    fn test_json_output() {
        let json = to_json(&MissingKeysReport::default()).unwrap();
        assert!(json.contains("\"missing_keys\": []"));
    }
}
