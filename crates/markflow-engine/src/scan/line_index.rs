//! Byte offset to line/column conversion.

use std::ops::Range;

use crate::tree::{Point, Position};

/// Start offsets of every line of a text.
#[derive(Debug, Clone)]
pub struct LineIndex<'a> {
    text: &'a str,
    line_starts: Vec<usize>,
}

impl<'a> LineIndex<'a> {
    pub fn new(text: &'a str) -> Self {
        let line_starts = std::iter::once(0)
            .chain(text.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Self { text, line_starts }
    }

    /// The point at `offset`, clamped to the end of the text.
    pub fn point(&self, offset: usize) -> Point {
        let offset = offset.min(self.text.len());
        let line = self.line_starts.partition_point(|&start| start <= offset);
        let line_start = self.line_starts[line - 1];
        let column = self
            .text
            .get(line_start..offset)
            .map_or(offset - line_start, |prefix| prefix.chars().count());
        Point::new(line, column + 1, offset)
    }

    pub fn position(&self, range: Range<usize>) -> Position {
        Position::new(self.point(range.start), self.point(range.end))
    }
}
