//! Terminal renderer - paints a headless document onto the terminal.
//!
//! # Architecture
//!
//! ```text
//! HeadlessDocument ──layout──► Frame { FrameBuffer, HitRegions }
//!                                        │
//!                      ┌─────────────────┴─────────────────┐
//!                      ▼                                   ▼
//!               DiffRenderer                        InlineRenderer
//!          (alternate screen, only           (normal screen, erase and
//!           changed cells written)            rewrite the region)
//! ```
//!
//! The renderers only know about cells. Hit regions go to the hit grid in
//! [`crate::state::mouse`].

pub mod buffer;
pub mod diff;
pub mod inline;
pub mod layout;
pub mod output;

pub use buffer::FrameBuffer;
pub use diff::DiffRenderer;
pub use inline::InlineRenderer;
pub use layout::{layout, Frame, HitRegion};
pub use output::StatefulCellRenderer;
