//! Terminal state.
//!
//! Thread-local terminal dimensions and render mode. The run loop reads them
//! on every frame; a size change raises a flag that forces a full redraw.

use std::cell::Cell;
use std::fmt;
use std::str::FromStr;

use tracing::debug;

// =============================================================================
// Terminal Size
// =============================================================================

thread_local! {
    static TERMINAL_SIZE: Cell<(u16, u16)> = const { Cell::new((80, 24)) };
    static RESIZED: Cell<bool> = const { Cell::new(false) };
    static RENDER_MODE: Cell<RenderMode> = const { Cell::new(RenderMode::Fullscreen) };
}

pub fn terminal_width() -> u16 {
    TERMINAL_SIZE.with(|s| s.get().0)
}

pub fn terminal_height() -> u16 {
    TERMINAL_SIZE.with(|s| s.get().1)
}

/// Set the terminal size (called on resize events).
///
/// A change of size marks the terminal as resized.
pub fn set_terminal_size(width: u16, height: u16) {
    let previous = TERMINAL_SIZE.with(|s| s.replace((width, height)));
    if previous != (width, height) {
        debug!(width, height, "terminal size changed");
        RESIZED.with(|r| r.set(true));
    }
}

/// True if the size changed since the last call. Clears the flag.
pub fn take_resized() -> bool {
    RESIZED.with(|r| r.replace(false))
}

// =============================================================================
// Render Mode
// =============================================================================

/// How the application is drawn on the terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderMode {
    /// Alternate screen buffer, differential rendering.
    #[default]
    Fullscreen,
    /// Normal buffer, the region is erased and redrawn each frame.
    Inline,
}

impl FromStr for RenderMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fullscreen" | "full" => Ok(RenderMode::Fullscreen),
            "inline" => Ok(RenderMode::Inline),
            other => Err(format!("unknown render mode '{other}', expected 'fullscreen' or 'inline'")),
        }
    }
}

impl fmt::Display for RenderMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderMode::Fullscreen => f.write_str("fullscreen"),
            RenderMode::Inline => f.write_str("inline"),
        }
    }
}

pub fn render_mode() -> RenderMode {
    RENDER_MODE.with(Cell::get)
}

pub fn set_render_mode(mode: RenderMode) {
    RENDER_MODE.with(|m| m.set(mode));
}

/// Environment variable that selects the render mode.
pub const RENDER_MODE_ENV: &str = "SPARK_VDOM_MODE";

/// Apply [`RENDER_MODE_ENV`] if it is set and return the active mode.
///
/// An unparsable value leaves the current mode untouched.
pub fn render_mode_from_env() -> Result<RenderMode, String> {
    if let Ok(raw) = std::env::var(RENDER_MODE_ENV) {
        set_render_mode(raw.parse()?);
    }
    Ok(render_mode())
}

// =============================================================================
// Terminal Detection
// =============================================================================

/// Query the real terminal size through crossterm and store it.
pub fn detect_terminal_size() {
    if let Ok((width, height)) = crossterm::terminal::size() {
        set_terminal_size(width, height);
    }
}

// =============================================================================
// Tests
// =============================================================================
