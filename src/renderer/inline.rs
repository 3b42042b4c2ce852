//! Inline renderer for normal terminal mode.
//!
//! Writes to the normal screen buffer instead of the alternate one. Each
//! frame moves back over the previous output, erases it and writes the new
//! content, so scrollback above the region is preserved. Only rows up to the
//! last non-blank one are written.

use std::io::{self, Stdout, Write};

use crossterm::cursor::{MoveToColumn, MoveUp};
use crossterm::queue;
use crossterm::style::{Attribute, Print, SetAttribute};
use crossterm::terminal::{BeginSynchronizedUpdate, Clear, ClearType, EndSynchronizedUpdate};
use unicode_width::UnicodeWidthStr;

use super::buffer::FrameBuffer;
use super::output::StatefulCellRenderer;

/// Inline renderer for normal terminal mode.
pub struct InlineRenderer<W: Write = Stdout> {
    out: W,
    cell_renderer: StatefulCellRenderer,
    previous_height: u16,
}

impl InlineRenderer<Stdout> {
    pub fn new() -> Self {
        Self::with_writer(io::stdout())
    }
}

impl Default for InlineRenderer<Stdout> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write> InlineRenderer<W> {
    pub fn with_writer(out: W) -> Self {
        Self {
            out,
            cell_renderer: StatefulCellRenderer::new(),
            previous_height: 0,
        }
    }

    /// Erase the previous frame and write this one.
    pub fn render(&mut self, buffer: &FrameBuffer) -> io::Result<()> {
        queue!(self.out, BeginSynchronizedUpdate)?;
        self.erase_previous()?;
        self.cell_renderer.reset();

        let height = buffer.content_height();
        for y in 0..height {
            let row_width = buffer.row_text(y).width() as u16;
            for x in 0..row_width.min(buffer.width()) {
                if let Some(cell) = buffer.get(x, y) {
                    self.cell_renderer.render_cell_inline(&mut self.out, cell)?;
                }
            }
            if y + 1 < height {
                queue!(self.out, Print("\r\n"))?;
            }
        }

        queue!(self.out, SetAttribute(Attribute::Reset), EndSynchronizedUpdate)?;
        self.out.flush()?;
        self.previous_height = height;
        Ok(())
    }

    /// Erase whatever was rendered and forget it.
    pub fn clear(&mut self) -> io::Result<()> {
        self.erase_previous()?;
        self.out.flush()?;
        self.previous_height = 0;
        Ok(())
    }

    fn erase_previous(&mut self) -> io::Result<()> {
        if self.previous_height == 0 {
            return Ok(());
        }
        if self.previous_height > 1 {
            queue!(self.out, MoveUp(self.previous_height - 1))?;
        }
        queue!(self.out, MoveToColumn(0), Clear(ClearType::FromCursorDown))
    }

    pub fn previous_height(&self) -> u16 {
        self.previous_height
    }

    pub fn writer(&self) -> &W {
        &self.out
    }
}

// =============================================================================
// Tests
// =============================================================================
