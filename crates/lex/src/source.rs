use std::fmt;
use std::sync::Arc;

/// A position in a source file. Lines and columns are 1-based; `offset` is the
/// byte offset into the buffer the location was produced from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceLocation {
    pub file: Arc<str>,
    pub line: u32,
    pub column: u32,
    pub offset: usize,
}

impl SourceLocation {
    pub fn new(file: Arc<str>, line: u32, column: u32, offset: usize) -> Self {
        Self {
            file,
            line,
            column,
            offset,
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

/// Owns the text of one translation unit and answers offset -> line/column queries.
///
/// `\n`, `\r\n` and a lone `\r` each terminate a line.
#[derive(Debug, Clone)]
pub struct SourceBuffer {
    name: Arc<str>,
    text: String,
    line_starts: Vec<usize>,
}

impl SourceBuffer {
    pub fn new(name: &str, text: impl Into<String>) -> Self {
        let text = text.into();
        let line_starts = compute_line_starts(text.as_bytes());
        Self {
            name: Arc::from(name),
            text,
            line_starts,
        }
    }

    pub fn name(&self) -> &Arc<str> {
        &self.name
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn bytes(&self) -> &[u8] {
        self.text.as_bytes()
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Physical location of `offset`. Offsets past the end clamp to the end of the buffer.
    pub fn location_at(&self, offset: usize) -> SourceLocation {
        let offset = offset.min(self.text.len());
        let line_idx = match self.line_starts.binary_search(&offset) {
            Ok(i) => i,
            Err(i) => i - 1,
        };
        let line_start = self.line_starts[line_idx];
        let column = self.text.as_bytes()[line_start..offset]
            .iter()
            .filter(|b| (**b & 0xC0) != 0x80)
            .count();
        SourceLocation::new(
            self.name.clone(),
            (line_idx + 1) as u32,
            (column + 1) as u32,
            offset,
        )
    }

    /// Text of the 1-based physical line `line`, without its terminator.
    pub fn line_text(&self, line: usize) -> Option<&str> {
        let start = *self.line_starts.get(line.checked_sub(1)?)?;
        let rest = &self.text[start..];
        let end = rest.find(['\n', '\r']).unwrap_or(rest.len());
        Some(&rest[..end])
    }
}

fn compute_line_starts(bytes: &[u8]) -> Vec<usize> {
    let mut starts = vec![0];
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\n' => starts.push(i + 1),
            b'\r' => {
                if bytes.get(i + 1) == Some(&b'\n') {
                    i += 1;
                }
                starts.push(i + 1);
            }
            _ => {}
        }
        i += 1;
    }
    starts
}
