//! Grid geometry.
//!
//! Tiles occupy axis-aligned rectangles of whole cells.  A rectangle
//! `(col, row, w, h)` covers the half-open ranges `[col, col + w)` and
//! `[row, row + h)`, so two tiles that merely touch never overlap.
//!
//! This module also converts between pixels and cells and derives the
//! visible column/row count from viewport metrics.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Smallest usable width (in pixels) when deriving the column count.
const MIN_AVAILABLE_WIDTH: f64 = 320.0;

/// A tile's placement in the current visual grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridPosition {
    /// Left-most column (0-indexed).
    pub col: u32,
    /// Top-most row (0-indexed).
    pub row: u32,
    /// Width in cells.
    pub w: u32,
    /// Height in cells.
    pub h: u32,
}

impl GridPosition {
    pub fn new(col: u32, row: u32, w: u32, h: u32) -> Self {
        Self { col, row, w, h }
    }

    /// First column to the right of the rectangle.
    pub fn right(&self) -> u32 {
        self.col.saturating_add(self.w)
    }

    /// First row below the rectangle.
    pub fn bottom(&self) -> u32 {
        self.row.saturating_add(self.h)
    }

    /// Number of cells covered.
    pub fn area(&self) -> u32 {
        self.w.saturating_mul(self.h)
    }

    /// Whether the rectangle has a non-empty footprint and fits within
    /// `cols` columns.
    pub fn fits(&self, cols: u32) -> bool {
        self.w >= 1 && self.h >= 1 && self.right() <= cols
    }

    /// Half-open overlap test on both axes.
    pub fn overlaps(&self, other: &GridPosition) -> bool {
        !(self.right() <= other.col
            || self.col >= other.right()
            || self.bottom() <= other.row
            || self.row >= other.bottom())
    }

    /// Whether the cell `(col, row)` lies inside the rectangle.
    pub fn contains(&self, col: u32, row: u32) -> bool {
        col >= self.col && col < self.right() && row >= self.row && row < self.bottom()
    }

    /// Iterate over every covered cell as `(col, row)`.
    pub fn cells(&self) -> impl Iterator<Item = (u32, u32)> {
        let (col, right, bottom) = (self.col, self.right(), self.bottom());
        (self.row..bottom).flat_map(move |r| (col..right).map(move |c| (c, r)))
    }
}

/// Set of occupied cells, used while placing tiles one after another.
#[derive(Debug, Clone, Default)]
pub struct Occupancy {
    cells: HashSet<(u32, u32)>,
}

impl Occupancy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an occupancy set covering every given rectangle.
    pub fn from_positions<'a>(positions: impl IntoIterator<Item = &'a GridPosition>) -> Self {
        let mut occupancy = Self::new();
        for pos in positions {
            occupancy.mark(pos);
        }
        occupancy
    }

    /// Mark every cell of `pos` as occupied.
    pub fn mark(&mut self, pos: &GridPosition) {
        self.cells.extend(pos.cells());
    }

    /// Whether no cell of `pos` is occupied yet.
    pub fn is_free(&self, pos: &GridPosition) -> bool {
        pos.cells().all(|cell| !self.cells.contains(&cell))
    }

    /// Whether `pos` fits within `cols` and touches no occupied cell.
    pub fn can_place(&self, pos: &GridPosition, cols: u32) -> bool {
        pos.fits(cols) && self.is_free(pos)
    }

    /// Row-major scan for the first free `w × h` rectangle.
    ///
    /// Rows `start_row .. start_row + row_limit` are searched, left to right
    /// within each row.  Returns `None` when the footprint is empty, wider
    /// than the grid, or no free rectangle exists in the scanned rows.
    pub fn scan(
        &self,
        w: u32,
        h: u32,
        cols: u32,
        start_row: u32,
        row_limit: u32,
    ) -> Option<GridPosition> {
        if w == 0 || h == 0 || w > cols {
            return None;
        }
        let end_row = start_row.saturating_add(row_limit);
        (start_row..end_row)
            .flat_map(|row| (0..=cols - w).map(move |col| GridPosition::new(col, row, w, h)))
            .find(|pos| self.is_free(pos))
    }

    /// Number of occupied cells.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Convert a pixel offset (relative to the grid origin) to the nearest cell.
///
/// Each axis is `round(px / (cell_size + gap))`, clamped to `>= 0`.
pub fn pixel_to_grid(x: f64, y: f64, cell_size: f64, gap: f64) -> (u32, u32) {
    let pitch = cell_size + gap;
    if !(pitch > 0.0) {
        return (0, 0);
    }
    let snap = |px: f64| (px / pitch).round().max(0.0) as u32;
    (snap(x), snap(y))
}

/// Pixel offset of the top-left corner of cell `(col, row)`.
pub fn grid_to_pixel(col: u32, row: u32, cell_size: f64, gap: f64) -> (f64, f64) {
    let pitch = cell_size + gap;
    (col as f64 * pitch, row as f64 * pitch)
}

/// Pixel length spanned by `cells` consecutive cells, including the gaps
/// between them.
pub fn span_px(cells: u32, cell_size: f64, gap: f64) -> f64 {
    if cells == 0 {
        return 0.0;
    }
    cells as f64 * cell_size + (cells - 1) as f64 * gap
}

/// Number of columns that fit in a viewport of `width` pixels.
///
/// Solves `n * cell + (n - 1) * gap <= available` for `n`, then clamps to
/// `[min_cols, max_cols]` (`min_cols` wins if the bounds cross).
pub fn columns_for_width(
    width: f64,
    horizontal_padding: f64,
    cell_size: f64,
    gap: f64,
    min_cols: u32,
    max_cols: u32,
) -> u32 {
    let available = (width - horizontal_padding).max(MIN_AVAILABLE_WIDTH);
    let pitch = cell_size + gap;
    let fit = if pitch > 0.0 {
        ((available + gap) / pitch).floor().max(0.0) as u32
    } else {
        max_cols
    };
    min_cols.max(max_cols.min(fit))
}

/// Number of whole rows that fit in a viewport of `height` pixels.
pub fn rows_for_height(height: f64, vertical_padding: f64, cell_size: f64, gap: f64) -> u32 {
    let available = (height - vertical_padding).max(0.0);
    let pitch = cell_size + gap;
    if !(pitch > 0.0) {
        return 0;
    }
    ((available + gap) / pitch).floor().max(0.0) as u32
}

//  Tests
