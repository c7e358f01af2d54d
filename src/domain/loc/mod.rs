// ============================================================
// LOCALISATION DOMAIN LAYER
// ============================================================
// Core types and value objects for localisation files
// No I/O

mod format_config;
mod issue;
mod line_ending;
mod load_order;
mod outcome;
mod record;

pub use format_config::{FormatConfig, DELIMITER, DELIMITER_STR};
pub use issue::{
    shorten, FileValidationResult, IssueType, Severity, ValidationIssue, ValidationReport,
};
pub use line_ending::{
    line_spans, normalize_line_endings, split_lines, LineEnding, LineEndingStats, LineSpan,
};
pub use load_order::{load_order, priority_tiers, PriorityRule};
pub use outcome::{
    ComparisonReport, DedupeFileResult, DedupeReport, FileComparison, FixReport, FixResult,
    KeyCategory, MissingKey, MissingKeysReport, RemovedEntry, ScanResult, ValueDifference,
};
pub use record::{LocFile, LocLine, LocRecord};
