// ============================================================
// LOCALISATION RECORD TYPES
// ============================================================
// Data structures representing parsed localisation content

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::PathBuf;

use super::{FormatConfig, LineEnding, LineEndingStats, DELIMITER, DELIMITER_STR};

/// A keyed line: key plus every `;`-separated field (key included)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocRecord {
    /// 1-based line number in the source file
    pub line_number: usize,

    /// First field, trimmed
    pub key: String,

    /// All fields in order, `fields[0]` is the untrimmed key
    pub fields: Vec<String>,
}

impl LocRecord {
    pub fn new(line_number: usize, fields: Vec<String>) -> Self {
        let key = fields.first().map(|f| f.trim().to_string()).unwrap_or_default();
        Self {
            line_number,
            key,
            fields,
        }
    }

    pub fn column_count(&self) -> usize {
        self.fields.len()
    }

    /// Text of the first locale column (usually English)
    pub fn primary_text(&self) -> &str {
        self.fields.get(1).map(String::as_str).unwrap_or("")
    }

    pub fn to_line(&self) -> String {
        self.fields.join(DELIMITER_STR)
    }
}

/// One logical line of a localisation file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LocLine {
    Record(LocRecord),
    /// Fields with an empty first field; laid out like a record but defines nothing
    Keyless(LocRecord),
    Comment { line_number: usize, text: String },
    Blank { line_number: usize, text: String },
}

impl LocLine {
    /// Classify a decoded line (without its line break)
    pub fn parse(line_number: usize, text: &str, config: &FormatConfig) -> Self {
        if text.trim().is_empty() {
            return LocLine::Blank {
                line_number,
                text: text.to_string(),
            };
        }

        let fields: Vec<String> = text.split(DELIMITER).map(str::to_string).collect();
        let record = LocRecord::new(line_number, fields);

        if config.is_comment_key(&record.key) {
            return LocLine::Comment {
                line_number,
                text: text.to_string(),
            };
        }
        if record.key.is_empty() {
            return LocLine::Keyless(record);
        }

        LocLine::Record(record)
    }

    pub fn line_number(&self) -> usize {
        match self {
            LocLine::Record(record) | LocLine::Keyless(record) => record.line_number,
            LocLine::Comment { line_number, .. } | LocLine::Blank { line_number, .. } => {
                *line_number
            }
        }
    }

    pub fn as_record(&self) -> Option<&LocRecord> {
        match self {
            LocLine::Record(record) => Some(record),
            _ => None,
        }
    }

    /// Keyed or keyless fields, the lines held to the column layout
    pub fn as_fields_mut(&mut self) -> Option<&mut LocRecord> {
        match self {
            LocLine::Record(record) | LocLine::Keyless(record) => Some(record),
            _ => None,
        }
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, LocLine::Blank { .. })
    }

    pub fn to_text(&self) -> String {
        match self {
            LocLine::Record(record) | LocLine::Keyless(record) => record.to_line(),
            LocLine::Comment { text, .. } | LocLine::Blank { text, .. } => text.clone(),
        }
    }
}

/// A parsed localisation file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocFile {
    pub path: PathBuf,

    /// File name used for load ordering
    pub name: String,

    /// Name of the encoding the bytes were decoded with
    pub encoding: String,

    /// Line break forms found in the raw bytes
    pub line_endings: LineEndingStats,

    /// Whether the raw bytes end with a line break
    pub trailing_newline: bool,

    pub lines: Vec<LocLine>,
}

impl LocFile {
    pub fn records(&self) -> impl Iterator<Item = &LocRecord> {
        self.lines.iter().filter_map(LocLine::as_record)
    }

    /// Distinct keys defined in this file
    pub fn keys(&self) -> BTreeSet<String> {
        self.records().map(|r| r.key.clone()).collect()
    }

    pub fn record_count(&self) -> usize {
        self.records().count()
    }

    /// Join the lines back into text with `ending` between them
    pub fn render(&self, ending: LineEnding) -> String {
        let mut out = String::new();
        for (idx, line) in self.lines.iter().enumerate() {
            if idx > 0 {
                out.push_str(ending.as_str());
            }
            out.push_str(&line.to_text());
        }
        if self.trailing_newline && !self.lines.is_empty() {
            out.push_str(ending.as_str());
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> FormatConfig {
        FormatConfig::default()
    }

    #[test]
    fn test_parse_record_line() {
        let line = LocLine::parse(3, " EVTNAME1 ;Hello;Bonjour", &config());
        let record = line.as_record().unwrap();
        assert_eq!(record.key, "EVTNAME1");
        assert_eq!(record.column_count(), 3);
        assert_eq!(record.primary_text(), "Hello");
        assert_eq!(record.to_line(), " EVTNAME1 ;Hello;Bonjour");
    }

    #[test]
    fn test_parse_comment_and_blank() {
        assert!(matches!(
            LocLine::parse(1, "#CODE;ENGLISH", &config()),
            LocLine::Comment { line_number: 1, .. }
        ));
        assert!(LocLine::parse(3, "   ", &config()).is_blank());
    }

    #[test]
    fn test_empty_key_is_keyless_not_comment() {
        let mut line = LocLine::parse(2, ";orphan text;only three", &config());
        assert!(matches!(line, LocLine::Keyless(_)));
        assert!(line.as_record().is_none());
        assert_eq!(line.line_number(), 2);
        assert_eq!(line.as_fields_mut().unwrap().column_count(), 3);
        assert_eq!(line.to_text(), ";orphan text;only three");
    }

    #[test]
    fn test_file_keys_and_render() {
        let file = LocFile {
            path: PathBuf::from("a.csv"),
            name: "a.csv".to_string(),
            encoding: "windows-1252".to_string(),
            line_endings: LineEndingStats::default(),
            trailing_newline: true,
            lines: vec![
                LocLine::parse(1, "K;first", &config()),
                LocLine::parse(2, "K;second", &config()),
            ],
        };
        assert_eq!(file.records().next().unwrap().primary_text(), "first");
        assert_eq!(file.record_count(), 2);
        assert_eq!(file.keys().len(), 1);
        assert_eq!(file.render(LineEnding::CrLf), "K;first\r\nK;second\r\n");
    }
}
