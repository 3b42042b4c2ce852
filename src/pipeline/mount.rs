//! Terminal mount - run a component tree in the terminal.
//!
//! The component is mounted into a [`HeadlessDocument`] exactly as it would
//! be anywhere else. The terminal side only observes that document: each
//! frame lays it out, refreshes the hit grid and hands the buffer to the
//! renderer for the active [`RenderMode`]. Clicks travel the other way,
//! through the hit grid into [`HeadlessDocument::dispatch`], where listeners
//! call `set_state` and the reconciler patches the document.
//!
//! # Example
//!
//! ```ignore
//! use spark_vdom::pipeline::mount_terminal;
//!
//! let mut app = mount_terminal(&ComponentRef::new(Game))?;
//!
//! // Option 1: blocking loop until q / Esc / Ctrl+C
//! app.run()?;
//!
//! // Option 2: drive it yourself
//! while app.tick()? {
//!     // Your logic here
//! }
//!
//! app.unmount()?;
//! ```

use std::rc::Rc;
use std::time::Duration;

use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use tracing::{debug, info, warn};

use super::terminal::{
    detect_terminal_size, render_mode, set_terminal_size, take_resized, terminal_height, terminal_width,
    RenderMode,
};
use crate::component::ComponentRef;
use crate::document::HeadlessDocument;
use crate::error::Result;
use crate::mount::{mount, MountHandle};
use crate::renderer::{layout, DiffRenderer, HitRegion, InlineRenderer};
use crate::state::input::{self, InputEvent};
use crate::state::mouse;

/// Poll timeout per tick (~60fps).
const TICK: Duration = Duration::from_millis(16);

enum Output {
    Fullscreen(DiffRenderer),
    Inline {
        renderer: InlineRenderer,
        origin_row: u16,
    },
}

// =============================================================================
// Terminal App
// =============================================================================

/// A component mounted into the terminal.
pub struct TerminalApp {
    doc: Rc<HeadlessDocument>,
    handle: Option<MountHandle>,
    output: Output,
    running: bool,
    full_redraw: bool,
    frames: u64,
    restored: bool,
}

/// Mount `component` and take over the terminal.
///
/// This sets up:
/// 1. Terminal size detection
/// 2. A headless document with the component mounted into its body
/// 3. Raw mode, mouse capture and the renderer for the current mode
/// 4. The first frame
///
/// If step 3 fails part way, raw mode and mouse capture are released before
/// the error is returned.
pub fn mount_terminal(component: &ComponentRef) -> Result<TerminalApp> {
    detect_terminal_size();
    take_resized();

    let doc = HeadlessDocument::new();
    let handle = mount(component, &doc, doc.body())?;

    let mode = render_mode();
    enable_raw_mode()?;
    let output = undo_on_error(|| open_output(mode), || abandon_setup(mode))?;

    info!(component = component.name(), %mode, "terminal app mounted");

    let mut app = TerminalApp {
        doc,
        handle: Some(handle),
        output,
        running: true,
        full_redraw: true,
        frames: 0,
        restored: false,
    };
    app.draw()?;
    Ok(app)
}

fn open_output(mode: RenderMode) -> Result<Output> {
    match mode {
        RenderMode::Fullscreen => {
            let mut renderer = DiffRenderer::new();
            renderer.enter_fullscreen()?;
            Ok(Output::Fullscreen(renderer))
        }
        RenderMode::Inline => {
            input::enable_mouse()?;
            let (_, origin_row) = crossterm::cursor::position()?;
            Ok(Output::Inline {
                renderer: InlineRenderer::new(),
                origin_row,
            })
        }
    }
}

/// Release whatever a failed [`open_output`] may have acquired.
fn abandon_setup(mode: RenderMode) {
    let released = match mode {
        RenderMode::Fullscreen => DiffRenderer::new().exit_fullscreen(),
        RenderMode::Inline => input::disable_mouse(),
    };
    for err in [released, disable_raw_mode()].into_iter().filter_map(|r| r.err()) {
        warn!(%err, "terminal not fully restored after failed setup");
    }
}

/// Run `setup`; if it fails, run `undo` before handing back the error.
fn undo_on_error<T>(setup: impl FnOnce() -> Result<T>, undo: impl FnOnce()) -> Result<T> {
    setup().inspect_err(|_| undo())
}

impl TerminalApp {
    /// The document the component is mounted in.
    pub fn document(&self) -> &Rc<HeadlessDocument> {
        &self.doc
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Request a graceful stop; the next tick returns false.
    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Frames drawn so far.
    pub fn frame_count(&self) -> u64 {
        self.frames
    }

    /// Redraw if the document changed or the terminal was resized.
    pub fn draw(&mut self) -> Result<()> {
        let full = std::mem::take(&mut self.full_redraw) | take_resized();
        let dirty = !self.doc.take_mutations().is_empty();
        if self.frames > 0 && !full && !dirty {
            return Ok(());
        }

        let (width, height) = (terminal_width(), terminal_height());
        let frame = layout(&self.doc, self.doc.body(), width, height)?;
        let origin_row = match &self.output {
            Output::Inline { origin_row, .. } => *origin_row,
            Output::Fullscreen(_) => 0,
        };
        let regions: Vec<_> = frame
            .hit_regions
            .iter()
            .map(|region| mouse_region(region, origin_row))
            .collect();
        mouse::apply_hit_regions(width, height, &regions);

        match &mut self.output {
            Output::Fullscreen(renderer) if full => renderer.render_full(&frame.buffer)?,
            Output::Fullscreen(renderer) => {
                renderer.render(&frame.buffer)?;
            }
            Output::Inline { renderer, .. } => renderer.render(&frame.buffer)?,
        }
        self.frames += 1;
        Ok(())
    }

    /// Apply one input event.
    pub fn handle_event(&mut self, event: InputEvent) -> Result<()> {
        match event {
            InputEvent::Click { x, y } => {
                mouse::dispatch_click(&self.doc, x, y)?;
            }
            InputEvent::Quit => {
                debug!("quit requested");
                self.running = false;
            }
            InputEvent::Resize(width, height) => set_terminal_size(width, height),
            InputEvent::Key(_) | InputEvent::None => {}
        }
        Ok(())
    }

    /// Run the loop once: poll, handle, redraw.
    ///
    /// Returns `Ok(false)` once the app should stop.
    pub fn tick(&mut self) -> Result<bool> {
        if !self.running {
            return Ok(false);
        }
        if let Some(event) = input::poll_event(TICK)? {
            self.handle_event(event)?;
        }
        if self.running {
            self.draw()?;
        }
        Ok(self.running)
    }

    /// Block until stopped.
    pub fn run(&mut self) -> Result<()> {
        while self.tick()? {}
        Ok(())
    }

    /// Restore the terminal and unmount the component.
    pub fn unmount(mut self) -> Result<()> {
        self.restore()?;
        if let Some(handle) = self.handle.take() {
            handle.unmount()?;
        }
        Ok(())
    }

    fn restore(&mut self) -> Result<()> {
        if self.restored {
            return Ok(());
        }
        self.restored = true;
        self.running = false;
        match &mut self.output {
            Output::Fullscreen(renderer) => renderer.exit_fullscreen()?,
            Output::Inline { .. } => {
                input::disable_mouse()?;
                println!();
            }
        }
        disable_raw_mode()?;
        Ok(())
    }
}

impl Drop for TerminalApp {
    fn drop(&mut self) {
        // Best effort
        let _ = self.restore();
    }
}

/// Hit regions are frame-relative; inline frames start at `origin_row`.
fn mouse_region(region: &HitRegion, origin_row: u16) -> HitRegion {
    HitRegion {
        y: region.y.saturating_add(origin_row),
        ..*region
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::document::UnitId;

    #[test]
    fn test_undo_runs_only_when_setup_fails() {
        let undone = Cell::new(0);

        let ok = undo_on_error(|| Ok(3), || undone.set(undone.get() + 1));
        assert_eq!(ok.unwrap(), 3);
        assert_eq!(undone.get(), 0);

        let failed: Result<()> = undo_on_error(
            || Err(std::io::Error::other("no tty").into()),
            || undone.set(undone.get() + 1),
        );
        assert!(matches!(failed, Err(crate::error::Error::Io(_))));
        assert_eq!(undone.get(), 1);
    }

    #[test]
    fn test_mouse_region_offsets_inline_frames() {
        let region = HitRegion {
            x: 2,
            y: 1,
            width: 3,
            height: 1,
            unit: UnitId(9),
        };
        assert_eq!(mouse_region(&region, 0), region);
        assert_eq!(mouse_region(&region, 10).y, 11);
        assert_eq!(mouse_region(&region, 10).unit, UnitId(9));
    }
}
