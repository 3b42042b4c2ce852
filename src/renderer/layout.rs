//! Flow layout - paint a document subtree into a [`FrameBuffer`].
//!
//! A deliberately small text-mode layout:
//!
//! - Block tags start on a fresh line and end the line after them.
//! - `ol`/`ul` indent their items by two columns; `li` inside `ol` gets a
//!   `N. ` marker, inside `ul` a `- ` marker.
//! - `button` renders as `[content]` in bold, `[ ]` when empty.
//! - `h1`-`h3` render bold and underlined.
//! - Every element with a `click` listener yields a [`HitRegion`] covering
//!   the cells it painted.

use crate::document::{HeadlessDocument, UnitId, UnitKind};
use crate::error::Result;
use crate::types::Attr;

use super::buffer::FrameBuffer;

const BLOCK_TAGS: &[&str] = &["div", "p", "ol", "ul", "li", "h1", "h2", "h3", "body", "section"];
const LIST_INDENT: u16 = 2;

/// Cells occupied by a clickable unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HitRegion {
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
    pub unit: UnitId,
}

/// Output of one layout pass.
#[derive(Debug, Clone)]
pub struct Frame {
    pub buffer: FrameBuffer,
    pub hit_regions: Vec<HitRegion>,
}

/// Lay out `root` and everything under it.
pub fn layout(doc: &HeadlessDocument, root: UnitId, width: u16, height: u16) -> Result<Frame> {
    let mut flow = Flow {
        doc,
        buffer: FrameBuffer::new(width, height),
        hit_regions: Vec::new(),
        x: 0,
        y: 0,
        indent: 0,
    };
    flow.visit(root, None, Attr::NONE)?;
    Ok(Frame {
        buffer: flow.buffer,
        hit_regions: flow.hit_regions,
    })
}

struct Flow<'a> {
    doc: &'a HeadlessDocument,
    buffer: FrameBuffer,
    hit_regions: Vec<HitRegion>,
    x: u16,
    y: u16,
    indent: u16,
}

impl Flow<'_> {
    fn visit(&mut self, unit: UnitId, parent_tag: Option<&str>, attrs: Attr) -> Result<()> {
        match self.doc.kind(unit)? {
            UnitKind::Text { content } => {
                self.write(&content, attrs);
                Ok(())
            }
            UnitKind::Element { tag } => self.visit_element(unit, &tag, parent_tag, attrs),
        }
    }

    fn visit_element(&mut self, unit: UnitId, tag: &str, parent_tag: Option<&str>, attrs: Attr) -> Result<()> {
        let block = BLOCK_TAGS.contains(&tag);
        if block {
            self.line_break();
        }

        let attrs = match tag {
            "button" => attrs | Attr::BOLD,
            "h1" | "h2" | "h3" => attrs | Attr::BOLD | Attr::UNDERLINE,
            _ => attrs,
        };

        if tag == "li" {
            match parent_tag {
                Some("ol") => {
                    let marker = format!("{}. ", self.position_among_items(unit)?);
                    self.write(&marker, Attr::NONE);
                }
                Some("ul") => self.write("- ", Attr::NONE),
                _ => {}
            }
        }

        let (start_x, start_y) = (self.x, self.y);
        let children = self.doc.children(unit)?;

        let nested = matches!(tag, "ol" | "ul");
        if nested {
            self.indent += LIST_INDENT;
        }

        if tag == "button" {
            self.write("[", attrs);
            if children.is_empty() || self.doc.text_content(unit)?.is_empty() {
                self.write(" ", attrs);
            }
        }
        for child in &children {
            self.visit(*child, Some(tag), attrs)?;
        }
        if tag == "button" {
            self.write("]", attrs);
        }

        if nested {
            self.indent -= LIST_INDENT;
        }

        if self.doc.has_listener(unit, "click") {
            self.record_hit(unit, start_x, start_y);
        }

        if block {
            self.line_break();
        }
        Ok(())
    }

    /// 1-based index of an `li` among its `li` siblings.
    fn position_among_items(&self, unit: UnitId) -> Result<usize> {
        let Some(parent) = self.doc.parent(unit)? else {
            return Ok(1);
        };
        let mut position = 0;
        for sibling in self.doc.children(parent)? {
            if self.doc.tag(sibling)?.as_deref() == Some("li") {
                position += 1;
            }
            if sibling == unit {
                break;
            }
        }
        Ok(position)
    }

    fn write(&mut self, text: &str, attrs: Attr) {
        if self.x < self.indent {
            self.x = self.indent;
        }
        let advanced = self.buffer.draw_text(self.x, self.y, text, attrs, None);
        self.x = self.x.saturating_add(advanced);
    }

    fn line_break(&mut self) {
        if self.x > 0 {
            self.x = 0;
            self.y = self.y.saturating_add(1);
        }
    }

    fn record_hit(&mut self, unit: UnitId, start_x: u16, start_y: u16) {
        let region = if self.y == start_y {
            HitRegion {
                x: start_x,
                y: start_y,
                width: self.x.saturating_sub(start_x),
                height: 1,
                unit,
            }
        } else {
            let bottom = if self.x > 0 { self.y + 1 } else { self.y };
            HitRegion {
                x: 0,
                y: start_y,
                width: self.buffer.width(),
                height: bottom.saturating_sub(start_y),
                unit,
            }
        };
        if region.width > 0 && region.height > 0 {
            self.hit_regions.push(region);
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
