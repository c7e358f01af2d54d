// ============================================================
// MISSING KEY SCANNER
// ============================================================
// Find localisation keys referenced by game script files

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use super::batch::read_file;
use crate::domain::error::{AppError, Result};
use crate::domain::loc::{KeyCategory, MissingKey, MissingKeysReport, ScanResult};
use crate::infrastructure::csv::LocParser;
use crate::infrastructure::encoding::decode;
use crate::infrastructure::storage::collect_csv_files;

// A quoted value is taken whole so inline text is rejected by the key heuristic.
static TITLE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"\btitle\s*=\s*(?:"([^"\r\n]*)"|([A-Za-z0-9_]+))"#).unwrap());
static DESC_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"\bdesc\s*=\s*(?:"([^"\r\n]*)"|([A-Za-z0-9_]+))"#).unwrap());
static NAME_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"\bname\s*=\s*(?:"([^"\r\n]*)"|([A-Za-z0-9_]+))"#).unwrap());
static MODIFIER_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^([A-Za-z_][A-Za-z0-9_]*)\s*=\s*\{").unwrap());

const KEY_PREFIXES: [&str; 6] = ["EVT", "MODIFIER", "DECISION", "DESC_", "TITLE_", "OPTION_"];

/// Block names in modifier files that are not modifiers
const NON_MODIFIER_BLOCKS: [&str; 4] = ["icon", "duration", "trigger", "effect"];

const MODIFIER_FILES: [&str; 3] = [
    "event_modifiers.txt",
    "triggered_modifiers.txt",
    "static_modifiers.txt",
];

/// Whether a script value looks like a localisation key rather than inline text
pub fn is_localisation_key(text: &str) -> bool {
    if text.is_empty() || text.contains(char::is_whitespace) {
        return false;
    }

    let upper = text.to_ascii_uppercase();
    if KEY_PREFIXES.iter().any(|p| upper.starts_with(p)) {
        return true;
    }

    let has_letter = text.chars().any(|c| c.is_alphabetic());
    if has_letter && text.chars().count() > 3 && !text.chars().any(char::is_lowercase) {
        return true;
    }

    text.contains('_') && text.chars().all(|c| c == '_' || c.is_alphanumeric())
}

/// Drop `#` comments; script files have no string escapes for `#`
fn strip_comments(content: &str) -> String {
    content
        .lines()
        .map(|line| match line.find('#') {
            Some(idx) => &line[..idx],
            None => line,
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn captured_values<'a>(pattern: &'a Regex, content: &'a str) -> impl Iterator<Item = &'a str> + 'a {
    pattern
        .captures_iter(content)
        .filter_map(|caps| caps.get(1).or_else(|| caps.get(2)))
        .map(|m| m.as_str().trim())
}

/// `*.txt` files directly inside `dir`, sorted; a missing directory has none
fn script_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        tracing::debug!("{} not found, skipping", dir.display());
        return Ok(Vec::new());
    }

    let mut files: Vec<PathBuf> = fs::read_dir(dir)
        .map_err(|e| AppError::IoError(format!("Failed to read dir {}: {}", dir.display(), e)))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .map(|ext| ext.eq_ignore_ascii_case("txt"))
                    .unwrap_or(false)
        })
        .collect();
    files.sort();
    Ok(files)
}

/// Decoded script text without comments; an unreadable file is logged and skipped
fn read_script(path: &Path) -> Option<String> {
    match read_file(path) {
        Ok(bytes) => Some(strip_comments(&decode(&bytes).text)),
        Err(e) => {
            tracing::warn!("Skipping {}: {}", path.display(), e);
            None
        }
    }
}

/// Scans a mod root's `events/`, `decisions/` and `common/` folders
pub struct KeyScanner {
    mod_root: PathBuf,
}

impl KeyScanner {
    pub fn new(mod_root: impl Into<PathBuf>) -> Self {
        Self {
            mod_root: mod_root.into(),
        }
    }

    /// Every referenced key with the first file that references it
    fn references(&self) -> Result<BTreeMap<(KeyCategory, String), PathBuf>> {
        if !self.mod_root.is_dir() {
            return Err(AppError::NotFound(format!(
                "Mod root does not exist: {}",
                self.mod_root.display()
            )));
        }

        let mut found = BTreeMap::new();
        let mut record = |category: KeyCategory, key: &str, source: &Path| {
            if is_localisation_key(key) {
                found
                    .entry((category, key.to_string()))
                    .or_insert_with(|| source.to_path_buf());
            }
        };

        for path in script_files(&self.mod_root.join("events"))? {
            let Some(content) = read_script(&path) else {
                continue;
            };
            for pattern in [&*TITLE_PATTERN, &*DESC_PATTERN, &*NAME_PATTERN] {
                for key in captured_values(pattern, &content) {
                    record(KeyCategory::Event, key, &path);
                }
            }
        }

        for path in script_files(&self.mod_root.join("decisions"))? {
            let Some(content) = read_script(&path) else {
                continue;
            };
            for pattern in [&*TITLE_PATTERN, &*DESC_PATTERN] {
                for key in captured_values(pattern, &content) {
                    record(KeyCategory::Decision, key, &path);
                }
            }
        }

        let common = self.mod_root.join("common");
        for name in MODIFIER_FILES {
            let path = common.join(name);
            if !path.is_file() {
                continue;
            }
            let Some(content) = read_script(&path) else {
                continue;
            };
            for caps in MODIFIER_PATTERN.captures_iter(&content) {
                let block = &caps[1];
                if NON_MODIFIER_BLOCKS.contains(&block) {
                    continue;
                }
                // Modifier names are keys whatever their casing.
                found
                    .entry((KeyCategory::Modifier, block.to_string()))
                    .or_insert_with(|| path.clone());
            }
        }

        Ok(found)
    }

    pub fn scan(&self) -> Result<ScanResult> {
        let mut result = ScanResult::default();
        for (category, key) in self.references()?.into_keys() {
            let set = match category {
                KeyCategory::Event => &mut result.event_keys,
                KeyCategory::Decision => &mut result.decision_keys,
                KeyCategory::Modifier => &mut result.modifier_keys,
            };
            set.insert(key);
        }
        tracing::info!(
            "Found {} event, {} decision and {} modifier keys",
            result.event_keys.len(),
            result.decision_keys.len(),
            result.modifier_keys.len()
        );
        Ok(result)
    }

    /// Referenced keys absent from `existing`, grouped by category then key
    pub fn find_missing(&self, existing: &BTreeSet<String>) -> Result<MissingKeysReport> {
        let missing_keys = self
            .references()?
            .into_iter()
            .filter(|((_, key), _)| !existing.contains(key))
            .map(|((category, key), source_file)| MissingKey {
                key,
                source_file,
                category,
            })
            .collect::<Vec<_>>();

        tracing::info!("{} referenced keys have no localisation", missing_keys.len());
        Ok(MissingKeysReport { missing_keys })
    }
}

/// Every key defined in the `*.csv` files under `localisation`
pub fn existing_keys(parser: &LocParser, localisation: &Path) -> Result<BTreeSet<String>> {
    Ok(keys_in_files(parser, collect_csv_files(localisation)?))
}

fn keys_in_files(parser: &LocParser, paths: Vec<PathBuf>) -> BTreeSet<String> {
    let mut keys = BTreeSet::new();
    for path in paths {
        match parser.parse_file(&path) {
            Ok(file) => keys.extend(file.keys()),
            Err(e) => tracing::warn!("Skipping {}: {}", path.display(), e),
        }
    }
    keys
}
