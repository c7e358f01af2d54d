// ============================================================
// DEDUPE SERVICE
// ============================================================
// Load a localisation folder, resolve duplicate keys, write the survivors

use std::path::Path;

use super::batch::{read_file, rewrite_file, write_result, Rewrite};
use super::duplicate_resolver::{remove_keys, DedupeScope, DuplicateResolver};
use crate::domain::error::{AppError, Result};
use crate::domain::loc::{
    line_spans, DedupeFileResult, DedupeReport, FixReport, FixResult, LocFile, PriorityRule,
};
use crate::infrastructure::csv::{read_key_list, LocParser};
use crate::infrastructure::encoding::{decode, encode_like_source, SourceEncoding};
use crate::infrastructure::storage::{collect_csv_files, WriteOptions};

#[derive(Debug, Clone)]
pub struct DedupeOptions {
    pub scope: DedupeScope,
    pub priority: PriorityRule,

    /// Comment removed lines out instead of deleting them
    pub annotate: bool,

    pub write: WriteOptions,
}

/// A parsed file plus what is needed to write it back unchanged in form
struct Loaded {
    file: LocFile,
    source: SourceEncoding,
    original: Vec<u8>,

    /// Raw break text after each source line, indexed by line number - 1
    breaks: Vec<String>,
}

fn line_breaks(text: &str) -> Vec<String> {
    let spans = line_spans(text.as_bytes());
    spans
        .iter()
        .enumerate()
        .map(|(idx, span)| {
            let next = spans.get(idx + 1).map(|n| n.start).unwrap_or(text.len());
            text[span.end..next].to_string()
        })
        .collect()
}

fn load(parser: &LocParser, path: &Path) -> Result<Loaded> {
    load_bytes(parser, path, read_file(path)?)
}

fn load_bytes(parser: &LocParser, path: &Path, original: Vec<u8>) -> Result<Loaded> {
    let decoded = decode(&original);
    if decoded.had_errors {
        return Err(AppError::EncodingError(format!(
            "{} is not valid {}",
            path.display(),
            decoded.source
        )));
    }
    let source = decoded.source;
    let breaks = line_breaks(&decoded.text);
    Ok(Loaded {
        file: parser.parse_decoded(path, decoded),
        source,
        original,
        breaks,
    })
}

/// Render surviving lines with their own breaks in the file's own encoding
fn render_like_source(loaded: &Loaded) -> Result<Vec<u8>> {
    let mut text = String::new();
    for line in &loaded.file.lines {
        text.push_str(&line.to_text());
        if let Some(ending) = loaded.breaks.get(line.line_number() - 1) {
            text.push_str(ending);
        }
    }
    encode_like_source(&text, loaded.source)
}

pub struct DedupeService {
    parser: LocParser,
    options: DedupeOptions,
}

impl DedupeService {
    pub fn new(parser: LocParser, options: DedupeOptions) -> Self {
        Self { parser, options }
    }

    fn annotate_prefix(&self) -> Option<&str> {
        self.options
            .annotate
            .then(|| self.parser.config().comment_prefix.as_str())
    }

    /// Remove dead entries from every `*.csv` under `target`
    pub fn dedupe(&self, target: &Path) -> Result<DedupeReport> {
        let mut report = DedupeReport {
            dry_run: self.options.write.dry_run,
            ..Default::default()
        };

        let mut loaded = Vec::new();
        for path in collect_csv_files(target)? {
            match load(&self.parser, &path) {
                Ok(file) => loaded.push(file),
                Err(e) => {
                    tracing::warn!("Skipping {}: {}", path.display(), e);
                    report.files.push(DedupeFileResult {
                        file_path: path.clone(),
                        fix: Some(FixResult::failed(path, e.to_string())),
                        ..Default::default()
                    });
                }
            }
        }
        tracing::info!(
            "Loaded {} localisation files from {}",
            loaded.len(),
            target.display()
        );

        let mut resolver = DuplicateResolver::new(self.options.priority, self.options.scope);
        if let Some(prefix) = self.annotate_prefix() {
            resolver = resolver.with_annotation(prefix);
        }

        let mut files: Vec<LocFile> = loaded.iter().map(|l| l.file.clone()).collect();
        let resolution = resolver.resolve(&mut files);
        report.iterations = resolution.iterations;

        for ((mut entry, file), removals) in loaded.into_iter().zip(files).zip(resolution.files) {
            entry.file = file;
            let mut result = DedupeFileResult {
                file_path: entry.file.path.clone(),
                within_file: removals.within_file,
                cross_file: removals.cross_file,
                fix: None,
            };
            if result.removed_count() > 0 {
                result.fix = Some(self.write(&entry, &result));
            }
            report.files.push(result);
        }

        tracing::info!(
            "Removed {} entries in {} pass(es)",
            report.total_removed(),
            report.iterations
        );
        Ok(report)
    }

    fn write(&self, loaded: &Loaded, removed: &DedupeFileResult) -> FixResult {
        let path = &loaded.file.path;
        let mut changes = Vec::new();
        if !removed.within_file.is_empty() {
            changes.push(format!(
                "Removed {} duplicate key(s) within the file",
                removed.within_file.len()
            ));
        }
        if !removed.cross_file.is_empty() {
            changes.push(format!(
                "Removed {} key(s) overridden by higher priority files",
                removed.cross_file.len()
            ));
        }

        let outcome = render_like_source(loaded).and_then(|bytes| {
            write_result(
                path,
                &loaded.original,
                Rewrite { bytes, changes },
                &self.options.write,
            )
        });
        outcome.unwrap_or_else(|e| {
            tracing::warn!("{}: {}", path.display(), e);
            FixResult::failed(path, e.to_string())
        })
    }

    /// Remove every key listed in `keys_file` from `file`
    pub fn remove_listed_keys(&self, file: &Path, keys_file: &Path) -> Result<FixReport> {
        let keys = read_key_list(keys_file)?;
        if keys.is_empty() {
            return Err(AppError::ValidationError(format!(
                "No keys listed in {}",
                keys_file.display()
            )));
        }
        if !file.is_file() {
            return Err(AppError::NotFound(format!(
                "File does not exist: {}",
                file.display()
            )));
        }
        tracing::info!("Removing {} key(s) from {}", keys.len(), file.display());

        let mut report = FixReport::new("Key removal", self.options.write.dry_run);
        let result = rewrite_file(file, &self.options.write, |path, bytes| {
            let mut loaded = load_bytes(&self.parser, path, bytes.to_vec())?;
            let removed = remove_keys(&mut loaded.file, &keys, self.annotate_prefix());

            let found: Vec<&str> = removed.iter().map(|e| e.key.as_str()).collect();
            for key in keys.iter().filter(|k| !found.contains(&k.as_str())) {
                tracing::warn!("{}: key {} not found", path.display(), key);
            }

            let changes = if removed.is_empty() {
                Vec::new()
            } else {
                vec![format!("Removed {} line(s) for listed keys", removed.len())]
            };
            Ok(Rewrite {
                bytes: render_like_source(&loaded)?,
                changes,
            })
        });
        report.results.push(result);
        Ok(report)
    }
}
