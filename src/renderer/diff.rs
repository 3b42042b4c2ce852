//! Differential renderer for fullscreen mode.
//!
//! Compares the current frame to the previous one and writes only the cells
//! that changed.
//!
//! # Algorithm
//!
//! 1. Begin a synchronized update
//! 2. For each cell: skip it if the previous frame has the same size and an
//!    equal cell at that position, otherwise write it
//! 3. End the synchronized update and flush once
//! 4. Keep the frame as the baseline for the next call

use std::io::{self, Stdout, Write};

use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::event::{DisableMouseCapture, EnableMouseCapture};
use crossterm::style::{Attribute, SetAttribute};
use crossterm::terminal::{
    BeginSynchronizedUpdate, Clear, ClearType, EndSynchronizedUpdate, EnterAlternateScreen,
    LeaveAlternateScreen,
};
use crossterm::queue;

use super::buffer::FrameBuffer;
use super::output::StatefulCellRenderer;

/// Differential renderer for fullscreen mode.
pub struct DiffRenderer<W: Write = Stdout> {
    out: W,
    cell_renderer: StatefulCellRenderer,
    previous: Option<FrameBuffer>,
}

impl DiffRenderer<Stdout> {
    /// Renderer writing to stdout.
    pub fn new() -> Self {
        Self::with_writer(io::stdout())
    }
}

impl Default for DiffRenderer<Stdout> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write> DiffRenderer<W> {
    pub fn with_writer(out: W) -> Self {
        Self {
            out,
            cell_renderer: StatefulCellRenderer::new(),
            previous: None,
        }
    }

    /// Render a frame, writing only changed cells.
    ///
    /// Returns true if any cell was written.
    pub fn render(&mut self, buffer: &FrameBuffer) -> io::Result<bool> {
        let mut has_changes = false;
        queue!(self.out, BeginSynchronizedUpdate)?;
        self.cell_renderer.reset();

        let comparable = self
            .previous
            .as_ref()
            .filter(|prev| prev.width() == buffer.width() && prev.height() == buffer.height());

        for y in 0..buffer.height() {
            for x in 0..buffer.width() {
                let Some(cell) = buffer.get(x, y) else {
                    continue;
                };
                let changed = comparable.and_then(|prev| prev.get(x, y)) != Some(cell);
                if changed {
                    has_changes = true;
                    self.cell_renderer.render_cell(&mut self.out, x, y, cell)?;
                }
            }
        }

        queue!(self.out, EndSynchronizedUpdate)?;
        self.out.flush()?;
        self.previous = Some(buffer.clone());
        Ok(has_changes)
    }

    /// Redraw every cell, ignoring the previous frame.
    pub fn render_full(&mut self, buffer: &FrameBuffer) -> io::Result<()> {
        self.invalidate();
        self.render(buffer).map(|_| ())
    }

    /// Drop the baseline; the next render is a full redraw.
    pub fn invalidate(&mut self) {
        self.previous = None;
    }

    pub fn has_previous(&self) -> bool {
        self.previous.is_some()
    }

    /// Switch to the alternate screen with the cursor hidden and mouse captured.
    pub fn enter_fullscreen(&mut self) -> io::Result<()> {
        queue!(
            self.out,
            EnterAlternateScreen,
            Hide,
            Clear(ClearType::All),
            MoveTo(0, 0),
            EnableMouseCapture
        )?;
        self.out.flush()?;
        self.invalidate();
        Ok(())
    }

    /// Restore the main screen.
    pub fn exit_fullscreen(&mut self) -> io::Result<()> {
        queue!(
            self.out,
            DisableMouseCapture,
            SetAttribute(Attribute::Reset),
            Show,
            LeaveAlternateScreen
        )?;
        self.out.flush()
    }

    pub fn writer(&self) -> &W {
        &self.out
    }
}

// =============================================================================
// Tests
// =============================================================================
