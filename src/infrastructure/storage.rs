use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::domain::error::{AppError, Result};

fn io_err(msg: impl Into<String>) -> AppError {
    AppError::IoError(msg.into())
}

/// How a rewrite touches the disk
#[derive(Debug, Clone, Default)]
pub struct WriteOptions {
    /// Compute and report changes without writing
    pub dry_run: bool,

    /// Copy the original file aside before replacing it
    pub backup: bool,

    /// Where backups go; next to the original when unset
    pub backup_dir: Option<PathBuf>,
}

/// Expand `target` into the localisation files to process.
///
/// A file is returned as-is. A directory yields its `*.csv` entries
/// (non-recursive, extension matched case-insensitively) sorted by name.
pub fn collect_csv_files(target: &Path) -> Result<Vec<PathBuf>> {
    if target.is_file() {
        return Ok(vec![target.to_path_buf()]);
    }
    if !target.is_dir() {
        return Err(AppError::NotFound(format!(
            "Path does not exist: {}",
            target.display()
        )));
    }

    let mut files = Vec::new();
    for entry in fs::read_dir(target)
        .map_err(|e| io_err(format!("Failed to read dir {}: {e}", target.display())))?
    {
        let entry = entry.map_err(|e| io_err(format!("Failed dir entry: {e}")))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let is_csv = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("csv"))
            .unwrap_or(false);
        if is_csv {
            files.push(path);
        }
    }

    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

fn ensure_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path)
        .map_err(|e| io_err(format!("Failed to create dir {}: {e}", path.display())))?;
    Ok(())
}

/// Replace `path` with `bytes` through a temp file and rename
pub fn atomic_write_bytes(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        ensure_dir(parent)?;
    }

    let tmp_path = path.with_extension(format!("tmp-{}", Uuid::new_v4()));
    {
        let mut file = fs::File::create(&tmp_path).map_err(|e| {
            io_err(format!(
                "Failed to create temp file {}: {e}",
                tmp_path.display()
            ))
        })?;
        file.write_all(bytes).map_err(|e| {
            io_err(format!(
                "Failed to write temp file {}: {e}",
                tmp_path.display()
            ))
        })?;
        file.sync_all().ok();
    }

    // Rename cannot replace an existing file on Windows; move the old one aside first.
    if path.exists() {
        let displaced = path.with_extension(format!("old-{}", Uuid::new_v4()));
        fs::rename(path, &displaced).map_err(|e| {
            let _ = fs::remove_file(&tmp_path);
            io_err(format!(
                "Failed to move existing file {} to {}: {e}",
                path.display(),
                displaced.display()
            ))
        })?;

        if let Err(e) = fs::rename(&tmp_path, path) {
            let _ = fs::rename(&displaced, path);
            let _ = fs::remove_file(&tmp_path);
            return Err(io_err(format!(
                "Failed to rename temp file {} to {}: {e}",
                tmp_path.display(),
                path.display()
            )));
        }

        let _ = fs::remove_file(&displaced);
        Ok(())
    } else {
        fs::rename(&tmp_path, path).map_err(|e| {
            io_err(format!(
                "Failed to rename temp file {} to {}: {e}",
                tmp_path.display(),
                path.display()
            ))
        })
    }
}

/// Copy `path` to `<name>.<timestamp>.bak`.
///
/// The suffix keeps backups out of `*.csv` enumeration.
pub fn backup_file(path: &Path, backup_dir: Option<&Path>) -> Result<PathBuf> {
    let dir = match backup_dir {
        Some(dir) => {
            ensure_dir(dir)?;
            dir.to_path_buf()
        }
        None => path.parent().map(Path::to_path_buf).unwrap_or_default(),
    };

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .ok_or_else(|| AppError::ValidationError(format!("Not a file: {}", path.display())))?;
    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S").to_string();

    let mut backup_path = dir.join(format!("{}.{}.bak", name, timestamp));
    let mut attempt = 1;
    while backup_path.exists() {
        attempt += 1;
        backup_path = dir.join(format!("{}.{}_{}.bak", name, timestamp, attempt));
    }

    fs::copy(path, &backup_path).map_err(|e| {
        io_err(format!(
            "Backup of {} to {} failed: {e}",
            path.display(),
            backup_path.display()
        ))
    })?;

    Ok(backup_path)
}

/// Write `bytes` over `path` honouring `options`; returns the backup path if one was made
pub fn commit(path: &Path, bytes: &[u8], options: &WriteOptions) -> Result<Option<PathBuf>> {
    if options.dry_run {
        return Ok(None);
    }

    let backup = if options.backup {
        Some(backup_file(path, options.backup_dir.as_deref())?)
    } else {
        None
    };

    atomic_write_bytes(path, bytes)?;
    Ok(backup)
}
