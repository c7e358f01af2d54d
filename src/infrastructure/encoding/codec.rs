use encoding_rs::Encoding;

use super::{detect_encoding, SourceEncoding};
use crate::domain::error::{AppError, Result};
use crate::domain::loc::line_spans;

/// Text decoded from raw file bytes
#[derive(Debug, Clone)]
pub struct Decoded {
    pub text: String,
    pub source: SourceEncoding,

    /// Malformed input was replaced with U+FFFD
    pub had_errors: bool,
}

/// A character the target encoding cannot represent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unmappable {
    pub ch: char,
    /// 1-based
    pub line: usize,
    /// 1-based, in characters
    pub column: usize,
}

/// Decode bytes under the detected encoding, dropping any BOM
pub fn decode(bytes: &[u8]) -> Decoded {
    let source = detect_encoding(bytes);
    let body = &bytes[source.bom_len()..];
    let (text, had_errors) = source.encoding().decode_without_bom_handling(body);

    Decoded {
        text: text.into_owned(),
        source,
        had_errors,
    }
}

/// Look up a write encoding by its WHATWG label
pub fn resolve_encoding(label: &str) -> Result<&'static Encoding> {
    let encoding = Encoding::for_label(label.trim().as_bytes())
        .ok_or_else(|| AppError::ConfigError(format!("Unknown encoding label '{}'", label)))?;

    if encoding.output_encoding() != encoding {
        return Err(AppError::ConfigError(format!(
            "'{}' cannot be used as a write encoding",
            label
        )));
    }

    Ok(encoding)
}

/// Encode text, failing on the first character `target` cannot represent
pub fn encode(text: &str, target: &'static Encoding) -> Result<Vec<u8>> {
    let (bytes, _, had_errors) = target.encode(text);
    if !had_errors {
        return Ok(bytes.into_owned());
    }

    match find_unmappable(text, target) {
        Some(bad) => Err(AppError::EncodingError(format!(
            "'{}' (U+{:04X}) at line {}, column {} cannot be encoded as {}",
            bad.ch,
            bad.ch as u32,
            bad.line,
            bad.column,
            target.name()
        ))),
        None => Err(AppError::EncodingError(format!(
            "Text cannot be encoded as {}",
            target.name()
        ))),
    }
}

/// Encode text back into the encoding a file was read in, BOM included
pub fn encode_like_source(text: &str, source: SourceEncoding) -> Result<Vec<u8>> {
    match source {
        SourceEncoding::Utf8Bom => {
            let mut bytes = vec![0xEF, 0xBB, 0xBF];
            bytes.extend_from_slice(text.as_bytes());
            Ok(bytes)
        }
        // encoding_rs only decodes UTF-16, so the units are written by hand.
        SourceEncoding::Utf16Le => Ok([0xFF, 0xFE]
            .into_iter()
            .chain(text.encode_utf16().flat_map(u16::to_le_bytes))
            .collect()),
        SourceEncoding::Utf16Be => Ok([0xFE, 0xFF]
            .into_iter()
            .chain(text.encode_utf16().flat_map(u16::to_be_bytes))
            .collect()),
        SourceEncoding::Ascii | SourceEncoding::Utf8 => Ok(text.as_bytes().to_vec()),
        SourceEncoding::Windows1252 => encode(text, source.encoding()),
    }
}

/// Locate the first character of `text` that `target` cannot represent
pub fn find_unmappable(text: &str, target: &'static Encoding) -> Option<Unmappable> {
    for (line_idx, span) in line_spans(text.as_bytes()).into_iter().enumerate() {
        let line = &text[span.start..span.end];
        for (col_idx, ch) in line.chars().enumerate() {
            if ch.is_ascii() {
                continue;
            }
            let mut buf = [0u8; 4];
            let (_, _, had_errors) = target.encode(ch.encode_utf8(&mut buf));
            if had_errors {
                return Some(Unmappable {
                    ch,
                    line: line_idx + 1,
                    column: col_idx + 1,
                });
            }
        }
    }
    None
}
