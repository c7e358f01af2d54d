use std::fs;
use std::path::Path;

use crate::domain::error::{AppError, Result};
use crate::domain::loc::{FixReport, FixResult};
use crate::infrastructure::storage::{collect_csv_files, commit, WriteOptions};

/// New content for a file and the changes that produced it
#[derive(Debug, Clone, Default)]
pub struct Rewrite {
    pub bytes: Vec<u8>,
    pub changes: Vec<String>,
}

impl Rewrite {
    pub fn unchanged(bytes: &[u8]) -> Self {
        Self {
            bytes: bytes.to_vec(),
            changes: Vec::new(),
        }
    }
}

pub fn read_file(path: &Path) -> Result<Vec<u8>> {
    fs::read(path)
        .map_err(|e| AppError::IoError(format!("Failed to read {}: {}", path.display(), e)))
}

/// Apply `transform` to every localisation file under `target`.
///
/// A failing file is recorded in its result and the batch moves on.
pub fn rewrite_files<F>(
    title: &str,
    target: &Path,
    options: &WriteOptions,
    mut transform: F,
) -> Result<FixReport>
where
    F: FnMut(&Path, &[u8]) -> Result<Rewrite>,
{
    let files = collect_csv_files(target)?;
    let mut report = FixReport::new(title, options.dry_run);

    for path in files {
        report
            .results
            .push(rewrite_file(&path, options, &mut transform));
    }

    tracing::info!(
        "{}: {} of {} files changed, {} failed",
        title,
        report.files_fixed(),
        report.results.len(),
        report.files_failed()
    );
    Ok(report)
}

pub fn rewrite_file<F>(path: &Path, options: &WriteOptions, transform: F) -> FixResult
where
    F: FnOnce(&Path, &[u8]) -> Result<Rewrite>,
{
    match try_rewrite(path, options, transform) {
        Ok(result) => result,
        Err(e) => {
            tracing::warn!("{}: {}", path.display(), e);
            FixResult::failed(path, e.to_string())
        }
    }
}

fn try_rewrite<F>(path: &Path, options: &WriteOptions, transform: F) -> Result<FixResult>
where
    F: FnOnce(&Path, &[u8]) -> Result<Rewrite>,
{
    let original = read_file(path)?;
    let rewrite = transform(path, &original)?;
    write_result(path, &original, rewrite, options)
}

/// Commit `rewrite` when its bytes differ from `original`
pub fn write_result(
    path: &Path,
    original: &[u8],
    rewrite: Rewrite,
    options: &WriteOptions,
) -> Result<FixResult> {
    let mut result = FixResult::new(path);
    result.changes_made = rewrite.changes;

    if rewrite.bytes == original {
        tracing::debug!("{}: already clean", path.display());
        return Ok(result);
    }

    result.backup_path = commit(path, &rewrite.bytes, options)?;
    result.written = true;
    tracing::info!(
        "{}{}: {} change(s)",
        if options.dry_run { "[dry run] " } else { "" },
        path.display(),
        result.changes_made.len()
    );
    Ok(result)
}
