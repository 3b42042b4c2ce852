//! State Module - runtime state for the terminal backend.
//!
//! - **Mouse** - HitGrid, click routing into the document
//! - **Input** - crossterm event conversion and polling

pub mod input;
pub mod mouse;

pub use input::{convert_event, poll_event, InputEvent};
pub use mouse::{apply_hit_regions, dispatch_click, hit_test, HitGrid};
