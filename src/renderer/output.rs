//! Stateful cell output.
//!
//! Tracks the last written attributes and cursor position so consecutive
//! cells skip redundant escape sequences.

use std::io::{self, Write};

use crossterm::cursor::MoveTo;
use crossterm::queue;
use crossterm::style::{Attribute, Print, SetAttribute};
use unicode_width::UnicodeWidthChar;

use super::buffer::CONTINUATION;
use crate::types::{Attr, Cell};

/// Writes cells while remembering terminal state between them.
#[derive(Debug, Default)]
pub struct StatefulCellRenderer {
    attrs: Option<Attr>,
    cursor: Option<(u16, u16)>,
}

impl StatefulCellRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget tracked state; the next cell writes everything.
    pub fn reset(&mut self) {
        self.attrs = None;
        self.cursor = None;
    }

    /// Write a cell at an absolute position.
    pub fn render_cell<W: Write>(&mut self, out: &mut W, x: u16, y: u16, cell: &Cell) -> io::Result<()> {
        if cell.char == CONTINUATION {
            return Ok(());
        }
        if self.cursor != Some((x, y)) {
            queue!(out, MoveTo(x, y))?;
        }
        self.apply_attrs(out, cell.attrs)?;
        queue!(out, Print(cell.char))?;
        let width = cell.char.width().unwrap_or(1).max(1) as u16;
        self.cursor = Some((x.saturating_add(width), y));
        Ok(())
    }

    /// Write a cell at the current cursor position.
    pub fn render_cell_inline<W: Write>(&mut self, out: &mut W, cell: &Cell) -> io::Result<()> {
        if cell.char == CONTINUATION {
            return Ok(());
        }
        self.apply_attrs(out, cell.attrs)?;
        queue!(out, Print(cell.char))
    }

    fn apply_attrs<W: Write>(&mut self, out: &mut W, attrs: Attr) -> io::Result<()> {
        if self.attrs == Some(attrs) {
            return Ok(());
        }
        queue!(out, SetAttribute(Attribute::Reset))?;
        for (flag, attribute) in [
            (Attr::BOLD, Attribute::Bold),
            (Attr::DIM, Attribute::Dim),
            (Attr::UNDERLINE, Attribute::Underlined),
            (Attr::INVERSE, Attribute::Reverse),
        ] {
            if attrs.contains(flag) {
                queue!(out, SetAttribute(attribute))?;
            }
        }
        self.attrs = Some(attrs);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(char: char, attrs: Attr) -> Cell {
        Cell { char, attrs }
    }

    #[test]
    fn test_sequential_cells_skip_cursor_moves() {
        let mut out = Vec::new();
        let mut renderer = StatefulCellRenderer::new();
        renderer.render_cell(&mut out, 0, 0, &cell('a', Attr::NONE)).unwrap();
        renderer.render_cell(&mut out, 1, 0, &cell('b', Attr::NONE)).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.matches('H').count(), 1);
        assert!(text.ends_with("ab"));
    }

    #[test]
    fn test_same_attrs_written_once() {
        let mut out = Vec::new();
        let mut renderer = StatefulCellRenderer::new();
        renderer.render_cell_inline(&mut out, &cell('a', Attr::BOLD)).unwrap();
        let after_first = out.len();
        renderer.render_cell_inline(&mut out, &cell('b', Attr::BOLD)).unwrap();
        assert_eq!(out.len(), after_first + 1);
    }

    #[test]
    fn test_continuation_cell_skipped() {
        let mut out = Vec::new();
        let mut renderer = StatefulCellRenderer::new();
        renderer.render_cell_inline(&mut out, &cell(CONTINUATION, Attr::NONE)).unwrap();
        assert!(out.is_empty());
    }
}
