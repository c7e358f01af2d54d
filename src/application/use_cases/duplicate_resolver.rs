use std::collections::{BTreeSet, HashMap};

use crate::domain::loc::{priority_tiers, LocFile, LocLine, PriorityRule, RemovedEntry};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DedupeScope {
    /// Only repeated keys inside one file
    WithinFile,
    /// Only keys overridden by a higher-priority file
    CrossFile,
    All,
}

impl DedupeScope {
    fn within(&self) -> bool {
        matches!(self, DedupeScope::WithinFile | DedupeScope::All)
    }

    fn cross(&self) -> bool {
        matches!(self, DedupeScope::CrossFile | DedupeScope::All)
    }
}

/// Why a line is being dropped; decides the annotation text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalReason {
    Duplicate,
    Overridden,
    Listed,
}

/// Later repeats of a key inside one file (first-key-wins)
pub fn within_file_duplicates(file: &LocFile) -> Vec<RemovedEntry> {
    let mut first: HashMap<&str, (usize, &str)> = HashMap::new();
    let mut removed = Vec::new();

    for record in file.records() {
        match first.get(record.key.as_str()) {
            Some(&(line, text)) => removed.push(RemovedEntry {
                key: record.key.clone(),
                line_number: record.line_number,
                kept_in: file.name.clone(),
                kept_line: line,
                text_differs: record.primary_text() != text,
            }),
            None => {
                first.insert(&record.key, (record.line_number, record.primary_text()));
            }
        }
    }

    removed
}

/// Dead entries of every file: records whose key a strictly higher-priority file defines.
///
/// The result is indexed like `files`. Files sharing a priority tier never
/// kill each other's keys, so the outcome does not depend on their order.
pub fn cross_file_dead_entries(files: &[LocFile], rule: PriorityRule) -> Vec<Vec<RemovedEntry>> {
    let names: Vec<&str> = files.iter().map(|f| f.name.as_str()).collect();
    let mut dead: Vec<Vec<RemovedEntry>> = vec![Vec::new(); files.len()];

    // key -> (file index, line, primary text) of the surviving definition
    let mut winners: HashMap<&str, (usize, usize, &str)> = HashMap::new();

    for mut tier in priority_tiers(&names, rule) {
        tier.sort_by(|&a, &b| files[a].path.cmp(&files[b].path));

        for &idx in &tier {
            for record in files[idx].records() {
                if let Some(&(winner, line, text)) = winners.get(record.key.as_str()) {
                    dead[idx].push(RemovedEntry {
                        key: record.key.clone(),
                        line_number: record.line_number,
                        kept_in: files[winner].name.clone(),
                        kept_line: line,
                        text_differs: record.primary_text() != text,
                    });
                }
            }
        }

        for &idx in &tier {
            for record in files[idx].records() {
                winners.entry(record.key.as_str()).or_insert((
                    idx,
                    record.line_number,
                    record.primary_text(),
                ));
            }
        }
    }

    dead
}

fn annotation(prefix: &str, entry: &RemovedEntry, reason: RemovalReason) -> String {
    match reason {
        RemovalReason::Duplicate => format!(
            "{} {} removed - duplicate of line {}",
            prefix, entry.key, entry.kept_line
        ),
        RemovalReason::Overridden => format!(
            "{} {} removed - overridden by higher priority file",
            prefix, entry.key
        ),
        RemovalReason::Listed => format!("{} {} removed", prefix, entry.key),
    }
}

/// Drop (or comment out, when `annotate_prefix` is set) the lines named by `entries`
pub fn apply_removals(
    file: &mut LocFile,
    entries: &[RemovedEntry],
    reason: RemovalReason,
    annotate_prefix: Option<&str>,
) {
    if entries.is_empty() {
        return;
    }
    let by_line: HashMap<usize, &RemovedEntry> =
        entries.iter().map(|e| (e.line_number, e)).collect();

    let lines = std::mem::take(&mut file.lines);
    file.lines = lines
        .into_iter()
        .filter_map(|line| {
            let entry = match &line {
                LocLine::Record(record) => by_line.get(&record.line_number).copied(),
                _ => None,
            };
            match (entry, annotate_prefix) {
                (None, _) => Some(line),
                (Some(entry), Some(prefix)) => Some(LocLine::Comment {
                    line_number: entry.line_number,
                    text: annotation(prefix, entry, reason),
                }),
                (Some(_), None) => None,
            }
        })
        .collect();
}

/// Remove every record whose key is in `keys`
pub fn remove_keys(
    file: &mut LocFile,
    keys: &BTreeSet<String>,
    annotate_prefix: Option<&str>,
) -> Vec<RemovedEntry> {
    let entries: Vec<RemovedEntry> = file
        .records()
        .filter(|r| keys.contains(&r.key))
        .map(|r| RemovedEntry {
            key: r.key.clone(),
            line_number: r.line_number,
            kept_in: String::new(),
            kept_line: 0,
            text_differs: false,
        })
        .collect();

    apply_removals(file, &entries, RemovalReason::Listed, annotate_prefix);
    entries
}

/// Entries removed from one file over the whole run
#[derive(Debug, Clone, Default)]
pub struct FileRemovals {
    pub within_file: Vec<RemovedEntry>,
    pub cross_file: Vec<RemovedEntry>,
}

#[derive(Debug, Clone, Default)]
pub struct Resolution {
    pub iterations: usize,
    /// Indexed like the resolved files
    pub files: Vec<FileRemovals>,
}

/// Iterative dead-entry removal over a set of parsed files
#[derive(Debug, Clone)]
pub struct DuplicateResolver {
    rule: PriorityRule,
    scope: DedupeScope,
    annotate_prefix: Option<String>,
}

impl DuplicateResolver {
    pub fn new(rule: PriorityRule, scope: DedupeScope) -> Self {
        Self {
            rule,
            scope,
            annotate_prefix: None,
        }
    }

    /// Comment removed lines out with `prefix` instead of deleting them
    pub fn with_annotation(mut self, prefix: impl Into<String>) -> Self {
        self.annotate_prefix = Some(prefix.into());
        self
    }

    /// Remove dead entries until no file holds a key a higher-priority file defines.
    ///
    /// Every pass removes at least one record or stops, so the loop is
    /// bounded by the total record count.
    pub fn resolve(&self, files: &mut [LocFile]) -> Resolution {
        let mut resolution = Resolution {
            iterations: 0,
            files: vec![FileRemovals::default(); files.len()],
        };
        let bound = files.iter().map(|f| f.record_count()).sum::<usize>() + 1;
        let prefix = self.annotate_prefix.as_deref();

        while resolution.iterations < bound {
            resolution.iterations += 1;
            let mut removed = 0;

            if self.scope.cross() {
                let dead = cross_file_dead_entries(files, self.rule);
                for (idx, entries) in dead.into_iter().enumerate() {
                    removed += entries.len();
                    apply_removals(&mut files[idx], &entries, RemovalReason::Overridden, prefix);
                    resolution.files[idx].cross_file.extend(entries);
                }
            }

            if self.scope.within() {
                for (idx, file) in files.iter_mut().enumerate() {
                    let entries = within_file_duplicates(file);
                    removed += entries.len();
                    apply_removals(file, &entries, RemovalReason::Duplicate, prefix);
                    resolution.files[idx].within_file.extend(entries);
                }
            }

            tracing::debug!(
                "dedupe pass {} removed {} entries",
                resolution.iterations,
                removed
            );
            if removed == 0 {
                break;
            }
        }

        resolution
    }
}
