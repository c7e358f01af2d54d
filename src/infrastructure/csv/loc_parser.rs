// ============================================================
// LOCALISATION PARSER
// ============================================================
// Parse localisation files with encoding detection

use std::fs;
use std::path::Path;

use crate::domain::error::{AppError, Result};
use crate::domain::loc::{line_spans, FormatConfig, LineEndingStats, LocFile, LocLine};
use crate::infrastructure::encoding::{decode, Decoded};

/// Parser for `;`-delimited localisation files
#[derive(Debug, Clone, Default)]
pub struct LocParser {
    config: FormatConfig,
}

impl LocParser {
    /// Create a parser for the given record format
    pub fn new(config: FormatConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FormatConfig {
        &self.config
    }

    /// Read and parse a file from disk
    pub fn parse_file(&self, path: &Path) -> Result<LocFile> {
        let bytes = fs::read(path).map_err(|e| {
            AppError::IoError(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Ok(self.parse_bytes(path, &bytes))
    }

    /// Parse raw bytes as if read from `path`
    pub fn parse_bytes(&self, path: &Path, bytes: &[u8]) -> LocFile {
        let decoded = decode(bytes);
        if decoded.had_errors {
            tracing::warn!(
                "{}: malformed {} input replaced with U+FFFD",
                path.display(),
                decoded.source
            );
        }
        self.parse_decoded(path, decoded)
    }

    pub fn parse_decoded(&self, path: &Path, decoded: Decoded) -> LocFile {
        let text = decoded.text;
        let trailing_newline = line_spans(text.as_bytes())
            .last()
            .map(|s| s.ending.is_some())
            .unwrap_or(false);

        LocFile {
            path: path.to_path_buf(),
            name: file_name(path),
            encoding: decoded.source.label().to_string(),
            line_endings: LineEndingStats::of(text.as_bytes()),
            trailing_newline,
            lines: self.parse_content(&text),
        }
    }

    /// Parse decoded text into classified lines
    pub fn parse_content(&self, content: &str) -> Vec<LocLine> {
        line_spans(content.as_bytes())
            .iter()
            .enumerate()
            .map(|(idx, span)| {
                LocLine::parse(idx + 1, &content[span.start..span.end], &self.config)
            })
            .collect()
    }
}

pub(crate) fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::loc::LineEnding;
    use std::path::PathBuf;

    #[test]
    fn test_parse_mixed_file() {
        let parser = LocParser::default();
        let bytes = b"#CODE;ENGLISH;x\r\r\nEVTNAME1;Hello;x\r\r\n\r\r\nEVTDESC1;Caf\xE9\n";
        let file = parser.parse_bytes(&PathBuf::from("/mod/localisation/00_events.csv"), bytes);

        assert_eq!(file.name, "00_events.csv");
        assert_eq!(file.encoding, "windows-1252");
        assert_eq!(file.lines.len(), 4);
        assert!(matches!(file.lines[0], LocLine::Comment { .. }));
        assert!(file.lines[2].is_blank());
        assert_eq!(file.record_count(), 2);
        assert_eq!(file.lines[3].as_record().unwrap().primary_text(), "Café");
        assert_eq!(file.line_endings.count(LineEnding::CrCrLf), 3);
        assert_eq!(file.line_endings.count(LineEnding::Lf), 1);
        assert!(file.trailing_newline);
    }

    #[test]
    fn test_parse_content_numbers_lines() {
        let parser = LocParser::default();
        let lines = parser.parse_content("A;1\nB;2");
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1].line_number(), 2);
    }

    #[test]
    fn test_parse_missing_file() {
        let parser = LocParser::default();
        let err = parser.parse_file(Path::new("/definitely/not/here.csv")).unwrap_err();
        assert!(matches!(err, AppError::IoError(_)));
    }
}
