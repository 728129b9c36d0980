// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Line/column addressing for byte-offset spans.
//!
//! The analyzer works in byte offsets internally; editors speak in lines and
//! columns. `LineIndex` precomputes the start offset of every line so the
//! definitions↔usages index can answer positional queries without rescanning
//! the source, and so diagnostics can be rendered with line numbers.
//!
//! Lines are 1-indexed and columns are 0-indexed byte offsets within the
//! line, per the analyzer's external contract. Hosts that speak the
//! 0-indexed line convention convert at the boundary.

use super::Span;

/// A position in a source file.
///
/// `line` is 1-indexed; `column` is a 0-indexed **byte** offset within the
/// line and must lie on a UTF-8 character boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    /// Line number (1-indexed).
    pub line: u32,
    /// Column offset in bytes from the start of the line (0-indexed).
    pub column: u32,
}

impl Position {
    /// Creates a new position.
    #[must_use]
    pub const fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

/// Precomputed line-start offsets for a source document.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LineIndex {
    /// Byte offset of the first character of each line. Always starts with 0.
    line_starts: Vec<u32>,
    /// Total length of the source in bytes.
    len: u32,
}

impl LineIndex {
    /// Builds a line index for the given source text.
    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        reason = "source files over 4GB are not supported"
    )]
    pub fn new(source: &str) -> Self {
        let mut line_starts = vec![0u32];
        for (i, byte) in source.bytes().enumerate() {
            if byte == b'\n' {
                line_starts.push(i as u32 + 1);
            }
        }
        Self {
            line_starts,
            len: source.len() as u32,
        }
    }

    /// Returns the number of lines in the source (at least 1).
    #[must_use]
    pub fn line_count(&self) -> u32 {
        u32::try_from(self.line_starts.len()).unwrap_or(u32::MAX)
    }

    /// Converts a byte offset to a position.
    ///
    /// Offsets past the end of the source clamp to the final position.
    #[must_use]
    pub fn position(&self, offset: u32) -> Position {
        let offset = offset.min(self.len);
        let line = self.line_starts.partition_point(|&start| start <= offset) - 1;
        let column = offset - self.line_starts[line];
        Position::new(u32::try_from(line).unwrap_or(u32::MAX - 1) + 1, column)
    }

    /// Converts a position back to a byte offset.
    ///
    /// Returns `None` if the line does not exist or the column runs past the
    /// end of that line.
    #[must_use]
    pub fn offset(&self, position: Position) -> Option<u32> {
        if position.line == 0 {
            return None;
        }
        let line = position.line as usize - 1;
        let start = *self.line_starts.get(line)?;
        let line_end = self
            .line_starts
            .get(line + 1)
            .map_or(self.len, |&next| next.saturating_sub(1));
        let offset = start + position.column;
        (offset <= line_end).then_some(offset)
    }

    /// Converts a span to its start and end positions.
    #[must_use]
    pub fn range(&self, span: Span) -> (Position, Position) {
        (self.position(span.start()), self.position(span.end()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_for_offsets() {
        let index = LineIndex::new("hello\nworld\n!");
        assert_eq!(index.position(0), Position::new(1, 0));
        assert_eq!(index.position(5), Position::new(1, 5));
        assert_eq!(index.position(6), Position::new(2, 0));
        assert_eq!(index.position(11), Position::new(2, 5));
        assert_eq!(index.position(12), Position::new(3, 0));
    }

    #[test]
    fn offset_for_positions() {
        let index = LineIndex::new("hello\nworld\n!");
        assert_eq!(index.offset(Position::new(1, 0)), Some(0));
        assert_eq!(index.offset(Position::new(1, 5)), Some(5));
        assert_eq!(index.offset(Position::new(2, 0)), Some(6));
        assert_eq!(index.offset(Position::new(3, 1)), Some(13));
    }

    #[test]
    fn offset_out_of_bounds() {
        let index = LineIndex::new("hello\nworld");
        assert_eq!(index.offset(Position::new(0, 0)), None);
        assert_eq!(index.offset(Position::new(5, 0)), None);
        assert_eq!(index.offset(Position::new(1, 6)), None);
    }

    #[test]
    fn empty_source_has_one_line() {
        let index = LineIndex::new("");
        assert_eq!(index.line_count(), 1);
        assert_eq!(index.position(0), Position::new(1, 0));
        assert_eq!(index.offset(Position::new(1, 0)), Some(0));
    }

    #[test]
    fn multibyte_columns_are_byte_offsets() {
        // é is two bytes
        let index = LineIndex::new("héllo\nx");
        assert_eq!(index.position(3), Position::new(1, 3));
        assert_eq!(index.position(7), Position::new(2, 0));
    }

    #[test]
    fn offset_clamps_past_end() {
        let index = LineIndex::new("ab");
        assert_eq!(index.position(100), Position::new(1, 2));
    }
}
