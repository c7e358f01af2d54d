// ============================================================
// LINE ENDING
// ============================================================
// End-of-line byte sequences understood by the normalizer

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A line break representation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineEnding {
    /// `\n`
    Lf,

    /// `\r\n`
    CrLf,

    /// A lone `\r`
    Cr,

    /// `\r\r\n`, the form the game engine expects
    CrCrLf,
}

impl Default for LineEnding {
    fn default() -> Self {
        LineEnding::CrCrLf
    }
}

impl LineEnding {
    pub const ALL: [LineEnding; 4] = [
        LineEnding::Lf,
        LineEnding::CrLf,
        LineEnding::Cr,
        LineEnding::CrCrLf,
    ];

    pub fn as_bytes(&self) -> &'static [u8] {
        match self {
            LineEnding::Lf => b"\n",
            LineEnding::CrLf => b"\r\n",
            LineEnding::Cr => b"\r",
            LineEnding::CrCrLf => b"\r\r\n",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LineEnding::Lf => "\n",
            LineEnding::CrLf => "\r\n",
            LineEnding::Cr => "\r",
            LineEnding::CrCrLf => "\r\r\n",
        }
    }

    /// Short name used in configuration and on the command line
    pub fn label(&self) -> &'static str {
        match self {
            LineEnding::Lf => "lf",
            LineEnding::CrLf => "crlf",
            LineEnding::Cr => "cr",
            LineEnding::CrCrLf => "crcrlf",
        }
    }

    /// Escaped form for human readable reports
    pub fn escaped(&self) -> &'static str {
        match self {
            LineEnding::Lf => "\\n",
            LineEnding::CrLf => "\\r\\n",
            LineEnding::Cr => "\\r",
            LineEnding::CrCrLf => "\\r\\r\\n",
        }
    }
}

impl fmt::Display for LineEnding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for LineEnding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lf" => Ok(LineEnding::Lf),
            "crlf" => Ok(LineEnding::CrLf),
            "cr" => Ok(LineEnding::Cr),
            "crcrlf" => Ok(LineEnding::CrCrLf),
            other => Err(format!(
                "unknown line ending '{}', expected one of lf, crlf, cr, crcrlf",
                other
            )),
        }
    }
}

/// Count of each line break form found in a byte buffer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineEndingStats {
    pub lf: usize,
    pub crlf: usize,
    pub cr: usize,
    pub crcrlf: usize,

    /// Three or more CRs before an LF
    pub cr_runs: usize,
}

impl LineEndingStats {
    pub fn of(bytes: &[u8]) -> Self {
        let mut stats = Self::default();
        for span in line_spans(bytes) {
            match span.ending {
                Some(_) if span.overlong => stats.cr_runs += 1,
                Some(ending) => stats.record(ending),
                None => {}
            }
        }
        stats
    }

    pub fn record(&mut self, ending: LineEnding) {
        match ending {
            LineEnding::Lf => self.lf += 1,
            LineEnding::CrLf => self.crlf += 1,
            LineEnding::Cr => self.cr += 1,
            LineEnding::CrCrLf => self.crcrlf += 1,
        }
    }

    pub fn count(&self, ending: LineEnding) -> usize {
        match ending {
            LineEnding::Lf => self.lf,
            LineEnding::CrLf => self.crlf,
            LineEnding::Cr => self.cr,
            LineEnding::CrCrLf => self.crcrlf,
        }
    }

    pub fn total(&self) -> usize {
        self.lf + self.crlf + self.cr + self.crcrlf + self.cr_runs
    }

    /// Number of breaks that are not `target`
    pub fn foreign(&self, target: LineEnding) -> usize {
        self.total() - self.count(target)
    }
}

/// One line of a buffer: `start..end` excludes the break
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineSpan {
    pub start: usize,
    pub end: usize,

    /// `None` for a final line with no break after it
    pub ending: Option<LineEnding>,

    /// The break was a run of three or more CRs before an LF
    pub overlong: bool,
}

/// Split a buffer into lines.
///
/// A run of CRs terminated by LF is a single break (`\r\n`, `\r\r\n`, or an
/// overlong run). CRs not followed by LF are one break each. A trailing
/// break does not open an empty final line.
pub fn line_spans(bytes: &[u8]) -> Vec<LineSpan> {
    let mut spans = Vec::new();
    let mut start = 0;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'\n' => {
                spans.push(LineSpan {
                    start,
                    end: i,
                    ending: Some(LineEnding::Lf),
                    overlong: false,
                });
                i += 1;
                start = i;
            }
            b'\r' => {
                let mut j = i;
                while j < bytes.len() && bytes[j] == b'\r' {
                    j += 1;
                }
                let run = j - i;

                if j < bytes.len() && bytes[j] == b'\n' {
                    let ending = if run == 1 {
                        LineEnding::CrLf
                    } else {
                        LineEnding::CrCrLf
                    };
                    spans.push(LineSpan {
                        start,
                        end: i,
                        ending: Some(ending),
                        overlong: run > 2,
                    });
                    i = j + 1;
                } else {
                    spans.push(LineSpan {
                        start,
                        end: i,
                        ending: Some(LineEnding::Cr),
                        overlong: false,
                    });
                    for _ in 1..run {
                        spans.push(LineSpan {
                            start: j,
                            end: j,
                            ending: Some(LineEnding::Cr),
                            overlong: false,
                        });
                    }
                    i = j;
                }
                start = i;
            }
            _ => i += 1,
        }
    }

    if start < bytes.len() {
        spans.push(LineSpan {
            start,
            end: bytes.len(),
            ending: None,
            overlong: false,
        });
    }

    spans
}

/// Split decoded text into lines without their breaks
pub fn split_lines(text: &str) -> Vec<&str> {
    // CR and LF are ASCII, so every span boundary is a char boundary.
    line_spans(text.as_bytes())
        .into_iter()
        .map(|span| &text[span.start..span.end])
        .collect()
}

/// Rewrite every line break in `bytes` as `target`
pub fn normalize_line_endings(bytes: &[u8], target: LineEnding) -> Vec<u8> {
    let mut out = Vec::with_capacity(bytes.len() + bytes.len() / 16);
    for span in line_spans(bytes) {
        out.extend_from_slice(&bytes[span.start..span.end]);
        if span.ending.is_some() {
            out.extend_from_slice(target.as_bytes());
        }
    }
    out
}
