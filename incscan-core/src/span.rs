//! Source positions and spans.
//!
//! Offsets are byte offsets into the scanned text. Lines and columns are
//! 1-based; columns count characters, not bytes.

use std::ops::Range;

/// A single point in the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Position {
    pub offset: usize,
    pub line: u32,
    pub column: u32,
}

impl Position {
    /// Position of the first byte of any input.
    pub const START: Position = Position {
        offset: 0,
        line: 1,
        column: 1,
    };
}

impl Default for Position {
    fn default() -> Self {
        Self::START
    }
}

/// Half-open byte range `[start, end)` plus the line/column of `start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SourceSpan {
    pub start: usize,
    pub end: usize,
    pub line: u32,
    pub column: u32,
}

impl SourceSpan {
    /// Span from `start` (whose line/column are known) up to the byte offset `end`.
    pub fn new(start: Position, end: usize) -> Self {
        debug_assert!(start.offset <= end);
        Self {
            start: start.offset,
            end,
            line: start.line,
            column: start.column,
        }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    /// True if `other` lies entirely within this span.
    pub fn contains(&self, other: &SourceSpan) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// The slice of `src` covered by this span.
    ///
    /// `src` must be the text the span was produced from.
    pub fn text<'a>(&self, src: &'a str) -> &'a str {
        &src[self.range()]
    }
}

/// Running line/column counter.
///
/// Both the classifier and the directive extractor advance one of these over
/// the input so every record they emit carries a human-readable position.
/// `\r\n` counts as a single line break, as do bare `\r` and bare `\n`.
#[derive(Debug, Clone)]
pub struct PositionTracker<'a> {
    src: &'a str,
    pos: Position,
}

impl<'a> PositionTracker<'a> {
    pub fn new(src: &'a str) -> Self {
        Self {
            src,
            pos: Position::START,
        }
    }

    pub fn position(&self) -> Position {
        self.pos
    }

    pub fn offset(&self) -> usize {
        self.pos.offset
    }

    pub fn is_at_end(&self) -> bool {
        self.pos.offset >= self.src.len()
    }

    /// Text from the current position to the end of input.
    pub fn rest(&self) -> &'a str {
        &self.src[self.pos.offset..]
    }

    pub fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    /// Consume one character, updating line and column.
    pub fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos.offset += c.len_utf8();
        match c {
            '\n' => self.newline(),
            // A `\r` directly followed by `\n` is finished off by the `\n`.
            '\r' if self.peek() != Some('\n') => self.newline(),
            _ => self.pos.column += 1,
        }
        Some(c)
    }

    /// Consume `n` bytes worth of characters. `n` must land on a char boundary.
    pub fn bump_bytes(&mut self, n: usize) {
        let target = self.pos.offset + n;
        while self.pos.offset < target && self.bump().is_some() {}
    }

    /// Advance to byte offset `target` (no-op if already past it).
    pub fn advance_to(&mut self, target: usize) {
        if target > self.pos.offset {
            self.bump_bytes(target - self.pos.offset);
        }
    }

    fn newline(&mut self) {
        self.pos.line += 1;
        self.pos.column = 1;
    }
}

/// Offset → position lookup for consumers that only hold byte offsets.
#[derive(Debug, Clone)]
pub struct LineIndex {
    /// Byte offset at which each line starts; `line_starts[0] == 0`.
    line_starts: Vec<usize>,
}

impl LineIndex {
    pub fn new(src: &str) -> Self {
        let mut line_starts = vec![0];
        let bytes = src.as_bytes();
        let mut i = 0;
        while i < bytes.len() {
            match bytes[i] {
                b'\r' if bytes.get(i + 1) == Some(&b'\n') => {
                    i += 2;
                    line_starts.push(i);
                    continue;
                }
                b'\r' | b'\n' => line_starts.push(i + 1),
                _ => {}
            }
            i += 1;
        }
        Self { line_starts }
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Position of `offset` within `src`. Offsets past the end clamp to the end.
    pub fn position(&self, src: &str, offset: usize) -> Position {
        let offset = offset.min(src.len());
        let line_idx = match self.line_starts.binary_search(&offset) {
            Ok(i) => i,
            Err(i) => i - 1,
        };
        let line_start = self.line_starts[line_idx];
        let column = src[line_start..offset].chars().count() as u32 + 1;
        Position {
            offset,
            line: line_idx as u32 + 1,
            column,
        }
    }
}
