use csv::WriterBuilder;
use serde::Serialize;

use crate::domain::error::{AppError, Result};
use crate::domain::loc::ValidationReport;

#[derive(Serialize)]
struct IssueRow<'a> {
    file: String,
    line: Option<usize>,
    severity: &'a str,
    issue_type: &'a str,
    message: &'a str,
    context: &'a str,
    suggestion: &'a str,
}

/// Flatten every issue of a report into comma-separated rows with a header
pub fn issues_to_csv(report: &ValidationReport) -> Result<Vec<u8>> {
    let mut writer = WriterBuilder::new().has_headers(true).from_writer(Vec::new());

    for issue in report.all_issues() {
        writer.serialize(IssueRow {
            file: issue.file_name(),
            line: issue.line_number,
            severity: issue.severity.as_str(),
            issue_type: issue.issue_type.as_str(),
            message: &issue.message,
            context: &issue.context,
            suggestion: &issue.suggestion,
        })?;
    }

    writer
        .into_inner()
        .map_err(|e| AppError::Internal(format!("Failed to flush CSV export: {}", e)))
}
