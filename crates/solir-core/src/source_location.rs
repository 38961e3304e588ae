use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

pub const MAX_LINES: usize = 1_000_000;

pub const MAX_FILE_SIZE: usize = u32::MAX as usize;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SourceLocationError {
    #[error("File exceeds maximum line count: {0} lines")]
    TooManyLines(usize),
    #[error("File exceeds maximum size: {0} bytes")]
    FileTooLarge(usize),
    #[error("Offset {offset} is past the end of a {len} byte buffer")]
    OffsetOutOfRange { offset: usize, len: usize },
}

pub type Result<T> = std::result::Result<T, SourceLocationError>;

/// Location attached to every IR operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Location {
    #[default]
    Unknown,
    FileLineCol {
        file: Arc<str>,
        line: u32,
        column: u32,
    },
}

impl Location {
    pub fn file_line_col(file: &str, line: u32, column: u32) -> Self {
        Location::FileLineCol {
            file: Arc::from(file),
            line,
            column,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Location::Unknown)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Unknown => write!(f, "loc(unknown)"),
            Location::FileLineCol { file, line, column } => {
                write!(f, "loc(\"{}\":{}:{})", file, line, column)
            }
        }
    }
}

/// A source file with precomputed line starts, used to translate byte
/// offsets from the front end into line/column pairs.
#[derive(Debug, Clone)]
pub struct SourceBuffer {
    name: Arc<str>,
    text: Arc<String>,
    line_starts: Arc<Vec<usize>>,
}

impl SourceBuffer {
    pub fn new(name: &str, text: String) -> Result<Self> {
        if text.len() > MAX_FILE_SIZE {
            return Err(SourceLocationError::FileTooLarge(text.len()));
        }

        let line_starts = compute_line_starts(&text)?;

        Ok(Self {
            name: Arc::from(name),
            text: Arc::new(text),
            line_starts: Arc::new(line_starts),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// 1-based line and column of a byte offset. Columns count characters.
    pub fn translate_position(&self, offset: usize) -> Result<(u32, u32)> {
        if offset > self.text.len() {
            return Err(SourceLocationError::OffsetOutOfRange {
                offset,
                len: self.text.len(),
            });
        }

        let line_idx = self
            .line_starts
            .partition_point(|&start| start <= offset)
            .saturating_sub(1);

        let line_start = self.line_starts[line_idx];
        let end = find_char_boundary(self.text.as_bytes(), offset);
        let column = self.text[line_start..end].chars().count() as u32 + 1;

        Ok(((line_idx + 1) as u32, column))
    }

    pub fn location(&self, offset: usize) -> Result<Location> {
        let (line, column) = self.translate_position(offset)?;
        Ok(Location::FileLineCol {
            file: self.name.clone(),
            line,
            column,
        })
    }

    pub fn get_line(&self, line: usize) -> Option<&str> {
        if line == 0 {
            return None;
        }

        let line_idx = line - 1;
        if line_idx >= self.line_starts.len() {
            return None;
        }

        let start = self.line_starts[line_idx];
        let end = if line_idx + 1 < self.line_starts.len() {
            self.line_starts[line_idx + 1]
        } else {
            self.text.len()
        };

        self.text
            .get(start..end)
            .map(|s| s.trim_end_matches(&['\r', '\n'][..]))
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }
}

fn compute_line_starts(text: &str) -> Result<Vec<usize>> {
    let mut line_starts = Vec::with_capacity(64);
    line_starts.push(0);

    let bytes = text.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        if line_starts.len() >= MAX_LINES {
            return Err(SourceLocationError::TooManyLines(line_starts.len()));
        }

        match bytes[i] {
            b'\r' => {
                if i + 1 < bytes.len() && bytes[i + 1] == b'\n' {
                    i += 2;
                } else {
                    i += 1;
                }
                line_starts.push(i);
            }
            b'\n' => {
                i += 1;
                line_starts.push(i);
            }
            _ => {
                i += 1;
            }
        }
    }

    Ok(line_starts)
}

fn find_char_boundary(bytes: &[u8], mut index: usize) -> usize {
    if index >= bytes.len() {
        return bytes.len();
    }

    while index > 0 && (bytes[index] & 0b1100_0000) == 0b1000_0000 {
        index -= 1;
    }

    index
}
