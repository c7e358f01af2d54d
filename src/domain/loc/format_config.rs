// ============================================================
// RECORD FORMAT CONFIGURATION
// ============================================================
// The on-disk layout the game engine expects. Treated as constants,
// never inferred from file contents.

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use super::LineEnding;
use crate::domain::error::{AppError, Result};

/// Field separator for every localisation line
pub const DELIMITER: char = ';';
pub const DELIMITER_STR: &str = ";";

/// Configuration for the localisation record format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_terminator_position"))]
#[serde(default)]
pub struct FormatConfig {
    /// Total number of `;`-separated columns per record (default: 19)
    #[validate(range(min = 1, max = 1024))]
    pub columns: usize,

    /// 0-based position of the terminator field (default: 14)
    pub terminator_index: usize,

    /// Sentinel the terminator field must hold (default: "x")
    #[validate(length(min = 1))]
    pub terminator_value: String,

    /// Line break written between records (default: `\r\r\n`)
    pub line_ending: LineEnding,

    /// WHATWG label of the encoding files are written in (default: windows-1252)
    #[validate(custom(function = "validate_encoding_label"))]
    pub encoding: String,

    /// Lines whose key starts with this prefix are comments (default: "#")
    #[validate(length(min = 1))]
    pub comment_prefix: String,
}

impl Default for FormatConfig {
    fn default() -> Self {
        Self {
            columns: 19,
            terminator_index: 14,
            terminator_value: "x".to_string(),
            line_ending: LineEnding::CrCrLf,
            encoding: "windows-1252".to_string(),
            comment_prefix: "#".to_string(),
        }
    }
}

impl FormatConfig {
    /// Run the derive rules and fold the result into an `AppError`
    pub fn check(&self) -> Result<()> {
        self.validate()
            .map_err(|e| AppError::ConfigError(format!("Invalid [format] section: {}", e)))
    }

    pub fn is_comment_key(&self, key: &str) -> bool {
        key.starts_with(self.comment_prefix.as_str())
    }
}

fn validate_terminator_position(config: &FormatConfig) -> std::result::Result<(), ValidationError> {
    if config.terminator_index >= config.columns {
        let mut err = ValidationError::new("terminator_index");
        err.message = Some(
            format!(
                "terminator_index {} must be < columns {}",
                config.terminator_index, config.columns
            )
            .into(),
        );
        return Err(err);
    }
    Ok(())
}

fn validate_encoding_label(label: &str) -> std::result::Result<(), ValidationError> {
    match encoding_rs::Encoding::for_label(label.trim().as_bytes()) {
        // UTF-16 encoders emit UTF-8, so they cannot be write targets.
        Some(encoding) if encoding.output_encoding() == encoding => Ok(()),
        Some(_) => {
            let mut err = ValidationError::new("encoding");
            err.message = Some(format!("'{}' cannot be used as a write encoding", label).into());
            Err(err)
        }
        None => {
            let mut err = ValidationError::new("encoding");
            err.message = Some(format!("unknown encoding label '{}'", label).into());
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(FormatConfig::default().check().is_ok());
    }

    #[test]
    fn test_terminator_outside_columns_rejected() {
        let config = FormatConfig {
            columns: 10,
            terminator_index: 14,
            ..Default::default()
        };
        let err = config.check().unwrap_err();
        assert!(err.to_string().contains("terminator_index"));
    }

    #[test]
    fn test_encoding_labels() {
        let ok = FormatConfig {
            encoding: "utf-8".to_string(),
            ..Default::default()
        };
        assert!(ok.check().is_ok());

        let unknown = FormatConfig {
            encoding: "klingon".to_string(),
            ..Default::default()
        };
        assert!(unknown.check().is_err());

        let utf16 = FormatConfig {
            encoding: "utf-16le".to_string(),
            ..Default::default()
        };
        assert!(utf16.check().is_err());
    }

    #[test]
    fn test_comment_key() {
        let config = FormatConfig::default();
        assert!(config.is_comment_key("#CODE"));
        assert!(!config.is_comment_key("EVTNAME1"));
    }
}
