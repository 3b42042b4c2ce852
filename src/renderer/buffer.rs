//! FrameBuffer - a 2D grid of terminal cells.
//!
//! Flat row-major storage: `index = y * width + x`. Wide characters occupy
//! two cells; the second holds the continuation marker `'\0'` and is skipped
//! on output.

use unicode_width::UnicodeWidthChar;

use crate::types::{Attr, Cell, ClipRect};

/// Marker stored in the cell after a double-width character.
pub const CONTINUATION: char = '\0';

/// A 2D buffer of terminal cells.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameBuffer {
    width: u16,
    height: u16,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    /// Create a buffer filled with blank cells.
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            cells: vec![Cell::default(); width as usize * height as usize],
        }
    }

    #[inline]
    pub fn width(&self) -> u16 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u16 {
        self.height
    }

    /// The full buffer as a rect.
    #[inline]
    pub fn bounds(&self) -> ClipRect {
        ClipRect::new(0, 0, self.width, self.height)
    }

    #[inline]
    fn index(&self, x: u16, y: u16) -> usize {
        y as usize * self.width as usize + x as usize
    }

    #[inline]
    pub fn in_bounds(&self, x: u16, y: u16) -> bool {
        x < self.width && y < self.height
    }

    #[inline]
    pub fn get(&self, x: u16, y: u16) -> Option<&Cell> {
        if self.in_bounds(x, y) {
            self.cells.get(self.index(x, y))
        } else {
            None
        }
    }

    #[inline]
    pub fn get_mut(&mut self, x: u16, y: u16) -> Option<&mut Cell> {
        if self.in_bounds(x, y) {
            let idx = self.index(x, y);
            self.cells.get_mut(idx)
        } else {
            None
        }
    }

    /// Reset every cell to blank.
    pub fn clear(&mut self) {
        self.cells.fill(Cell::default());
    }

    /// Set one cell. Returns false when out of bounds or clipped.
    pub fn set_cell(&mut self, x: u16, y: u16, char: char, attrs: Attr, clip: Option<&ClipRect>) -> bool {
        if clip.is_some_and(|c| !c.contains(x, y)) {
            return false;
        }
        match self.get_mut(x, y) {
            Some(cell) => {
                *cell = Cell { char, attrs };
                true
            }
            None => false,
        }
    }

    /// Draw text starting at (x, y) on a single row.
    ///
    /// Returns the number of columns advanced. Text past the right edge is
    /// dropped.
    pub fn draw_text(&mut self, x: u16, y: u16, text: &str, attrs: Attr, clip: Option<&ClipRect>) -> u16 {
        let mut col = x;
        for ch in text.chars() {
            if col >= self.width {
                break;
            }
            let width = ch.width().unwrap_or(0) as u16;
            if width == 0 {
                continue;
            }
            if self.set_cell(col, y, ch, attrs, clip) && width == 2 {
                self.set_cell(col + 1, y, CONTINUATION, attrs, clip);
            }
            col = col.saturating_add(width);
        }
        col.saturating_sub(x)
    }

    /// Text of one row with trailing blanks removed.
    pub fn row_text(&self, y: u16) -> String {
        let mut row: String = (0..self.width)
            .filter_map(|x| self.get(x, y))
            .map(|cell| cell.char)
            .filter(|&ch| ch != CONTINUATION)
            .collect();
        row.truncate(row.trim_end().len());
        row
    }

    /// Number of rows up to and including the last non-blank one.
    pub fn content_height(&self) -> u16 {
        (0..self.height)
            .rev()
            .find(|&y| !self.row_text(y).is_empty())
            .map_or(0, |y| y + 1)
    }
}

// =============================================================================
// Tests
// =============================================================================
