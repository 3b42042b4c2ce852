//! Mouse Module - hit testing and click routing.
//!
//! The [`HitGrid`] maps every terminal cell to the document unit painted
//! there, if that unit listens for clicks. A left click looks the unit up and
//! hands it to [`HeadlessDocument::dispatch`], which bubbles the `click`
//! event through the unit's ancestors.
//!
//! # API
//!
//! - `resize_hit_grid`, `clear_hit_grid`, `apply_hit_regions` - maintain the grid
//! - `hit_test` - unit at a cell
//! - `dispatch_click` - route a click to the document
//! - `last_click` - position of the most recent click

use std::cell::{Cell, RefCell};

use tracing::trace;

use crate::document::{HeadlessDocument, UnitId};
use crate::error::Result;
use crate::renderer::HitRegion;

// =============================================================================
// HIT GRID
// =============================================================================

/// A grid for O(1) cell-to-unit lookup.
#[derive(Debug, Clone)]
pub struct HitGrid {
    width: u16,
    height: u16,
    cells: Vec<Option<UnitId>>,
}

impl HitGrid {
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            cells: vec![None; width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    /// Resize the grid, clearing all contents.
    pub fn resize(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
        self.cells.resize(width as usize * height as usize, None);
        self.clear();
    }

    pub fn clear(&mut self) {
        self.cells.fill(None);
    }

    /// Fill a rectangle with a unit. Parts outside the grid are ignored.
    pub fn fill_rect(&mut self, x: u16, y: u16, width: u16, height: u16, unit: UnitId) {
        let x_end = x.saturating_add(width).min(self.width);
        let y_end = y.saturating_add(height).min(self.height);
        for cy in y..y_end {
            for cx in x..x_end {
                let idx = cy as usize * self.width as usize + cx as usize;
                if let Some(cell) = self.cells.get_mut(idx) {
                    *cell = Some(unit);
                }
            }
        }
    }

    pub fn get(&self, x: u16, y: u16) -> Option<UnitId> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.cells
            .get(y as usize * self.width as usize + x as usize)
            .copied()
            .flatten()
    }
}

// =============================================================================
// GLOBAL HIT GRID
// =============================================================================

thread_local! {
    static HIT_GRID: RefCell<HitGrid> = RefCell::new(HitGrid::new(80, 24));
    static LAST_CLICK: Cell<Option<(u16, u16)>> = const { Cell::new(None) };
}

pub fn resize_hit_grid(width: u16, height: u16) {
    HIT_GRID.with(|g| g.borrow_mut().resize(width, height));
}

pub fn clear_hit_grid() {
    HIT_GRID.with(|g| g.borrow_mut().clear());
}

pub fn hit_grid_size() -> (u16, u16) {
    HIT_GRID.with(|g| {
        let grid = g.borrow();
        (grid.width(), grid.height())
    })
}

/// Replace the grid contents with a fresh set of regions, resizing first if
/// the terminal size changed.
pub fn apply_hit_regions(width: u16, height: u16, regions: &[HitRegion]) {
    HIT_GRID.with(|g| {
        let mut grid = g.borrow_mut();
        if (grid.width(), grid.height()) != (width, height) {
            grid.resize(width, height);
        } else {
            grid.clear();
        }
        for region in regions {
            grid.fill_rect(region.x, region.y, region.width, region.height, region.unit);
        }
    });
}

/// Unit at a position in the global grid.
pub fn hit_test(x: u16, y: u16) -> Option<UnitId> {
    HIT_GRID.with(|g| g.borrow().get(x, y))
}

/// Position of the most recent click.
pub fn last_click() -> Option<(u16, u16)> {
    LAST_CLICK.with(Cell::get)
}

// =============================================================================
// CLICK ROUTING
// =============================================================================

/// Route a click at (x, y) to the unit under it.
///
/// Returns true if a unit was hit. The grid borrow is released before the
/// event is dispatched, so listeners may re-render.
pub fn dispatch_click(doc: &HeadlessDocument, x: u16, y: u16) -> Result<bool> {
    LAST_CLICK.with(|s| s.set(Some((x, y))));
    let Some(unit) = hit_test(x, y) else {
        return Ok(false);
    };
    trace!(x, y, ?unit, "click hit");
    doc.dispatch(unit, "click")?;
    Ok(true)
}

// =============================================================================
// TESTS
// =============================================================================
