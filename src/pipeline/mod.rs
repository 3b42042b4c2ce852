//! Terminal Pipeline
//!
//! Connects a mounted component tree to the terminal.
//!
//! ```text
//! set_state → reconcile → HeadlessDocument ──layout──► FrameBuffer ──► renderer
//!      ▲                                                   │
//!      └──── listener ◄── dispatch ◄── hit grid ◄── click ─┘
//! ```
//!
//! - [`terminal`] - terminal size and render mode
//! - [`mount`] - [`TerminalApp`]: setup, tick loop, teardown

pub mod mount;
pub mod terminal;

pub use mount::{mount_terminal, TerminalApp};
pub use terminal::{
    detect_terminal_size, render_mode, set_render_mode, set_terminal_size, take_resized, terminal_height,
    terminal_width, render_mode_from_env, RenderMode, RENDER_MODE_ENV,
};
