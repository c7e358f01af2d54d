use encoding_rs::{Encoding, UTF_16BE, UTF_16LE, UTF_8, WINDOWS_1252};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Encoding guessed from a file's bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceEncoding {
    /// UTF-8 with a leading `EF BB BF`
    Utf8Bom,
    Utf16Le,
    Utf16Be,
    /// Only bytes below 0x80, valid in every target encoding
    Ascii,
    Utf8,
    Windows1252,
}

impl SourceEncoding {
    pub fn label(&self) -> &'static str {
        match self {
            SourceEncoding::Utf8Bom => "utf-8-bom",
            SourceEncoding::Utf16Le => "utf-16le",
            SourceEncoding::Utf16Be => "utf-16be",
            SourceEncoding::Ascii => "ascii",
            SourceEncoding::Utf8 => "utf-8",
            SourceEncoding::Windows1252 => "windows-1252",
        }
    }

    pub fn encoding(&self) -> &'static Encoding {
        match self {
            SourceEncoding::Utf8Bom | SourceEncoding::Ascii | SourceEncoding::Utf8 => UTF_8,
            SourceEncoding::Utf16Le => UTF_16LE,
            SourceEncoding::Utf16Be => UTF_16BE,
            SourceEncoding::Windows1252 => WINDOWS_1252,
        }
    }

    pub fn bom_len(&self) -> usize {
        match self {
            SourceEncoding::Utf8Bom => 3,
            SourceEncoding::Utf16Le | SourceEncoding::Utf16Be => 2,
            _ => 0,
        }
    }

    /// Whether bytes in this encoding are already valid for `target`
    pub fn matches(&self, target: &'static Encoding) -> bool {
        match self {
            SourceEncoding::Ascii => target.is_ascii_compatible(),
            SourceEncoding::Utf8 => target == UTF_8,
            SourceEncoding::Windows1252 => target == WINDOWS_1252,
            SourceEncoding::Utf8Bom | SourceEncoding::Utf16Le | SourceEncoding::Utf16Be => false,
        }
    }
}

impl fmt::Display for SourceEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Guess the encoding from a BOM, then from the byte range.
///
/// Bytes that are not valid UTF-8 are taken to be Windows-1252.
pub fn detect_encoding(bytes: &[u8]) -> SourceEncoding {
    if bytes.starts_with(&[0xEF, 0xBB, 0xBF]) {
        return SourceEncoding::Utf8Bom;
    }
    if bytes.starts_with(&[0xFF, 0xFE]) {
        return SourceEncoding::Utf16Le;
    }
    if bytes.starts_with(&[0xFE, 0xFF]) {
        return SourceEncoding::Utf16Be;
    }

    if bytes.is_ascii() {
        return SourceEncoding::Ascii;
    }

    if std::str::from_utf8(bytes).is_ok() {
        SourceEncoding::Utf8
    } else {
        SourceEncoding::Windows1252
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_boms() {
        assert_eq!(detect_encoding(b"\xEF\xBB\xBFkey;x"), SourceEncoding::Utf8Bom);
        assert_eq!(detect_encoding(b"\xFF\xFEk\x00"), SourceEncoding::Utf16Le);
        assert_eq!(detect_encoding(b"\xFE\xFF\x00k"), SourceEncoding::Utf16Be);
    }

    #[test]
    fn test_detect_byte_range() {
        assert_eq!(detect_encoding(b"key;text;x"), SourceEncoding::Ascii);
        assert_eq!(detect_encoding("key;café".as_bytes()), SourceEncoding::Utf8);
        // 0xE9 is é in Windows-1252 and never valid alone in UTF-8
        assert_eq!(detect_encoding(b"key;caf\xE9"), SourceEncoding::Windows1252);
        assert_eq!(detect_encoding(b""), SourceEncoding::Ascii);
    }

    #[test]
    fn test_matches_target() {
        assert!(SourceEncoding::Ascii.matches(WINDOWS_1252));
        assert!(SourceEncoding::Windows1252.matches(WINDOWS_1252));
        assert!(!SourceEncoding::Utf8.matches(WINDOWS_1252));
        assert!(!SourceEncoding::Utf8Bom.matches(UTF_8));
    }
}
