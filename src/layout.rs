//! Adaptive tile layout.
//!
//! The [`LayoutManager`] owns the authoritative `item -> position` map and
//! the `item -> anchor` map.  The visual grid has a variable column count
//! (it follows the viewport), while anchors are expressed against a fixed
//! *reference* column count.  An anchor is a tile's home: when the grid
//! narrows, tiles are packed wherever they fit; when it widens again they
//! return to their anchors if those cells are free.
//!
//! Anchors are created once, the first time an item is placed, and only
//! change through an explicit user relocation ([`LayoutManager::move_item`]
//! or [`LayoutManager::swap_items`]).  Automatic reflows never touch them.
//!
//! All rectangles use half-open intervals, see
//! [`GridPosition::overlaps`].

use crate::geometry::{pixel_to_grid, GridPosition, Occupancy};
use crate::item::{Anchor, Anchors, GridItem, Layout, LayoutSnapshot};
use log::{debug, info, warn};
use std::collections::{BTreeSet, HashSet};

/// Reference column count used for anchors unless configured otherwise.
pub const DEFAULT_REFERENCE_COLS: u32 = 10;

/// Number of rows searched for a free rectangle before giving up.
pub const DEFAULT_SCAN_ROWS: u32 = 100;

/// Fixed parameters of the placement algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutParams {
    /// Column count of the reference grid anchors are expressed in.
    pub reference_cols: u32,
    /// How many rows a free-rectangle scan covers.
    pub scan_rows: u32,
}

impl Default for LayoutParams {
    fn default() -> Self {
        Self {
            reference_cols: DEFAULT_REFERENCE_COLS,
            scan_rows: DEFAULT_SCAN_ROWS,
        }
    }
}

impl LayoutParams {
    /// Anchor index of the reference cell `(col, row)`.
    pub fn encode_anchor(&self, col: u32, row: u32) -> Anchor {
        row.saturating_mul(self.reference_cols).saturating_add(col)
    }

    /// Reference cell `(col, row)` of an anchor.
    pub fn decode_anchor(&self, anchor: Anchor) -> (u32, u32) {
        let cols = self.reference_cols.max(1);
        (anchor % cols, anchor / cols)
    }
}

/// What a [`compute`] call did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComputeReport {
    /// The layout was rebuilt from anchors.
    pub reflowed: bool,
    /// Ids whose layout/anchor entries were dropped because they left the
    /// inventory.
    pub pruned: Vec<String>,
    /// Items placed for the first time (they had no anchor before).
    pub placed: Vec<String>,
    /// Items for which no free rectangle was found.
    pub unplaced: Vec<String>,
}

impl ComputeReport {
    /// Whether the layout or anchors changed.
    pub fn changed(&self) -> bool {
        self.reflowed || !self.pruned.is_empty() || !self.placed.is_empty()
    }
}

/// Compute the layout for `items` on a grid of `cols` columns.
///
/// `prev_cols` is the column count of the previous call (`None` on the very
/// first one).  The result depends only on the arguments, so calling it again
/// with its own output and the same `items` / `cols` returns that output
/// unchanged.
pub fn compute(
    items: &[GridItem],
    cols: u32,
    prev_cols: Option<u32>,
    prev: &LayoutSnapshot,
    params: &LayoutParams,
) -> (LayoutSnapshot, ComputeReport) {
    let items = dedup(items);
    let ids: HashSet<&str> = items.iter().map(|item| item.id.as_str()).collect();
    let mut report = ComputeReport::default();

    let mut layout = prev.layout.clone();
    let mut anchors = prev.anchors.clone();

    //  1. Prune

    let pruned: BTreeSet<String> = layout
        .keys()
        .chain(anchors.keys())
        .filter(|id| !ids.contains(id.as_str()))
        .cloned()
        .collect();
    if !pruned.is_empty() {
        layout.retain(|id, _| !pruned.contains(id));
        anchors.retain(|id, _| !pruned.contains(id));
        debug!("pruned {:?}", pruned);
    }
    report.pruned = pruned.into_iter().collect();

    //  2. Decide

    let cols_changed = prev_cols.is_some_and(|prev| prev != cols);
    let overflowing: Vec<&str> = layout
        .iter()
        .filter(|(_, pos)| !pos.fits(cols))
        .map(|(id, _)| id.as_str())
        .collect();
    let resized: Vec<&str> = items
        .iter()
        .filter(|item| {
            layout
                .get(&item.id)
                .is_some_and(|pos| (pos.w, pos.h) != (item.width, item.height))
        })
        .map(|item| item.id.as_str())
        .collect();

    if cols_changed || !overflowing.is_empty() || !resized.is_empty() {
        info!(
            "reflow on {} columns (columns changed: {}, overflowing: {:?}, resized: {:?})",
            cols, cols_changed, overflowing, resized
        );
        layout = reflow(&items, cols, &mut anchors, params, &mut report);
        report.reflowed = true;
    } else {
        place_missing(&items, cols, &mut layout, &mut anchors, params, &mut report);
    }

    (LayoutSnapshot { layout, anchors }, report)
}

/// Drop repeated ids, keeping the first occurrence.
fn dedup(items: &[GridItem]) -> Vec<&GridItem> {
    let mut seen = HashSet::new();
    items
        .iter()
        .filter(|item| {
            let fresh = seen.insert(item.id.as_str());
            if !fresh {
                warn!("duplicate item id {:?} ignored", item.id);
            }
            fresh
        })
        .collect()
}

/// Rebuild the whole layout in anchor order.
fn reflow(
    items: &[&GridItem],
    cols: u32,
    anchors: &mut Anchors,
    params: &LayoutParams,
    report: &mut ComputeReport,
) -> Layout {
    // Fresh anchors continue after the highest existing one.  Items with a
    // four-cell footprint reserve four indices.
    let mut next_anchor = anchors.values().max().map_or(0, |max| max.saturating_add(1));
    let mut fresh = HashSet::new();
    for item in items {
        if !anchors.contains_key(&item.id) {
            anchors.insert(item.id.clone(), next_anchor);
            fresh.insert(item.id.as_str());
            let step = if item.area() == 4 { 4 } else { 1 };
            next_anchor = next_anchor.saturating_add(step);
        }
    }

    let anchor_of = |item: &GridItem| anchors.get(&item.id).copied().unwrap_or_default();
    let mut ordered: Vec<&GridItem> = items.to_vec();
    ordered.sort_by_key(|item| anchor_of(*item));

    let mut occupancy = Occupancy::new();
    let mut layout = Layout::new();
    for item in ordered {
        let (col_ref, row_ref) = params.decode_anchor(anchor_of(item));
        let home = item.at(col_ref, row_ref);
        let pos = if occupancy.can_place(&home, cols) {
            Some(home)
        } else {
            occupancy
                .scan(item.width, item.height, cols, row_ref, params.scan_rows)
                .or_else(|| occupancy.scan(item.width, item.height, cols, 0, params.scan_rows))
        };
        match pos {
            Some(pos) => {
                debug!("{} -> ({}, {}), anchor ({}, {})", item.id, pos.col, pos.row, col_ref, row_ref);
                occupancy.mark(&pos);
                layout.insert(item.id.clone(), pos);
                if fresh.contains(item.id.as_str()) {
                    report.placed.push(item.id.clone());
                }
            }
            None => {
                warn!("no room for {} ({}x{}) on {} columns", item.id, item.width, item.height, cols);
                report.unplaced.push(item.id.clone());
            }
        }
    }
    layout
}

/// Place items that have no position yet around the existing ones.
fn place_missing(
    items: &[&GridItem],
    cols: u32,
    layout: &mut Layout,
    anchors: &mut Anchors,
    params: &LayoutParams,
    report: &mut ComputeReport,
) {
    let mut occupancy = Occupancy::from_positions(layout.values());
    let missing: Vec<&GridItem> = items
        .iter()
        .copied()
        .filter(|item| !layout.contains_key(&item.id))
        .collect();
    for item in missing {
        let anchor = anchors.get(&item.id).copied();
        let home = anchor
            .map(|anchor| {
                let (col, row) = params.decode_anchor(anchor);
                item.at(col, row)
            })
            .filter(|home| occupancy.can_place(home, cols));
        let pos =
            home.or_else(|| occupancy.scan(item.width, item.height, cols, 0, params.scan_rows));

        let Some(pos) = pos else {
            warn!("no room for {} ({}x{}) on {} columns", item.id, item.width, item.height, cols);
            report.unplaced.push(item.id.clone());
            continue;
        };
        debug!("{} placed at ({}, {})", item.id, pos.col, pos.row);
        occupancy.mark(&pos);
        layout.insert(item.id.clone(), pos);
        if anchor.is_none() {
            anchors.insert(item.id.clone(), params.encode_anchor(pos.col, pos.row));
            report.placed.push(item.id.clone());
        }
    }
}

/// Owns the layout and anchors and is the only writer of both.
///
/// # Typical usage
///
/// ```
/// use launchgrid::item::GridItem;
/// use launchgrid::layout::LayoutManager;
///
/// let mut manager = LayoutManager::default();
/// let items = vec![GridItem::weather(), GridItem::app("app-files")];
/// manager.compute(&items, 10);
/// assert!(manager.move_item("app-files", 6, 0, 1, 1));
/// ```
#[derive(Debug, Clone, Default)]
pub struct LayoutManager {
    snapshot: LayoutSnapshot,
    /// Column count of the last [`compute`](Self::compute) call.
    cols: Option<u32>,
    params: LayoutParams,
}

impl LayoutManager {
    pub fn new(params: LayoutParams) -> Self {
        Self {
            snapshot: LayoutSnapshot::default(),
            cols: None,
            params,
        }
    }

    /// Start from a previously persisted snapshot.
    ///
    /// Entries with an empty footprint, and entries overlapping one that
    /// comes earlier in anchor order, are dropped; their anchors are kept so
    /// the next [`compute`](Self::compute) can place them again.  A layout
    /// entry without an anchor gets one derived from its position.
    ///
    /// Returns the ids whose positions were dropped.
    pub fn restore(&mut self, snapshot: LayoutSnapshot) -> Vec<String> {
        let LayoutSnapshot { layout, mut anchors } = snapshot;
        for (id, pos) in &layout {
            anchors
                .entry(id.clone())
                .or_insert_with(|| self.params.encode_anchor(pos.col, pos.row));
        }

        let mut entries: Vec<(String, GridPosition)> = layout.into_iter().collect();
        entries.sort_by_key(|(id, pos)| (anchors.get(id).copied(), pos.row, pos.col));

        let mut kept = Layout::new();
        let mut dropped = Vec::new();
        for (id, pos) in entries {
            if pos.w == 0 || pos.h == 0 || kept.values().any(|other| other.overlaps(&pos)) {
                warn!("restored position of {} at ({}, {}) is unusable", id, pos.col, pos.row);
                dropped.push(id);
            } else {
                kept.insert(id, pos);
            }
        }

        self.snapshot = LayoutSnapshot {
            layout: kept,
            anchors,
        };
        self.cols = None;
        dropped
    }

    /// Recompute the layout for `items` on `cols` columns.
    ///
    /// Call whenever the item list or the column count changes.
    pub fn compute(&mut self, items: &[GridItem], cols: u32) -> ComputeReport {
        let (snapshot, report) = compute(items, cols, self.cols, &self.snapshot, &self.params);
        self.snapshot = snapshot;
        self.cols = Some(cols);
        report
    }

    //  Accessors

    /// Column count the layout was last computed for.
    pub fn cols(&self) -> u32 {
        self.cols.unwrap_or(self.params.reference_cols)
    }

    pub fn params(&self) -> &LayoutParams {
        &self.params
    }

    pub fn layout(&self) -> &Layout {
        &self.snapshot.layout
    }

    /// Current anchors.
    pub fn anchors(&self) -> &Anchors {
        &self.snapshot.anchors
    }

    /// Copy of the layout/anchor pair.
    pub fn snapshot(&self) -> LayoutSnapshot {
        self.snapshot.clone()
    }

    pub fn position(&self, id: &str) -> Option<GridPosition> {
        self.snapshot.layout.get(id).copied()
    }

    /// Ids of every placed item overlapping `rect`.
    pub fn occupants(&self, rect: &GridPosition) -> Vec<&str> {
        self.snapshot
            .layout
            .iter()
            .filter(|(_, pos)| pos.overlaps(rect))
            .map(|(id, _)| id.as_str())
            .collect()
    }

    /// First free `w × h` rectangle in row-major order, if any.
    pub fn find_free_position(&self, w: u32, h: u32) -> Option<GridPosition> {
        Occupancy::from_positions(self.snapshot.layout.values()).scan(
            w,
            h,
            self.cols(),
            0,
            self.params.scan_rows,
        )
    }

    /// First row below every placed item.
    pub fn bottom_row(&self) -> u32 {
        self.snapshot
            .layout
            .values()
            .map(GridPosition::bottom)
            .max()
            .unwrap_or(0)
    }

    /// See [`geometry::pixel_to_grid`](crate::geometry::pixel_to_grid).
    pub fn pixel_to_grid(x: f64, y: f64, cell_size: f64, gap: f64) -> (u32, u32) {
        pixel_to_grid(x, y, cell_size, gap)
    }

    //  Relocation

    /// Whether `id` could occupy `(col, row, w, h)`: inside the grid and not
    /// overlapping any other item.
    pub fn is_position_valid(&self, id: &str, col: u32, row: u32, w: u32, h: u32) -> bool {
        let target = GridPosition::new(col, row, w, h);
        if !target.fits(self.cols()) {
            return false;
        }
        self.snapshot
            .layout
            .iter()
            .filter(|(other, _)| other.as_str() != id)
            .all(|(_, pos)| !pos.overlaps(&target))
    }

    /// Move a placed item and make the target its new anchor.
    ///
    /// Returns `false` (and changes nothing) if the item is not placed or the
    /// target is out of bounds or overlaps another item.
    pub fn move_item(&mut self, id: &str, col: u32, row: u32, w: u32, h: u32) -> bool {
        if !self.snapshot.layout.contains_key(id) {
            debug!("move of unplaced item {} rejected", id);
            return false;
        }
        if !self.is_position_valid(id, col, row, w, h) {
            debug!("move of {} to ({}, {}) rejected", id, col, row);
            return false;
        }
        let anchor = self.params.encode_anchor(col, row);
        self.snapshot
            .layout
            .insert(id.to_string(), GridPosition::new(col, row, w, h));
        self.snapshot.anchors.insert(id.to_string(), anchor);
        info!("moved {} to ({}, {}), anchor {}", id, col, row, anchor);
        true
    }

    /// Exchange the positions and anchors of two placed items.
    ///
    /// The caller is responsible for only swapping items with equal
    /// footprints.  Returns `false` if either item is not placed.
    pub fn swap_items(&mut self, a: &str, b: &str) -> bool {
        if a == b {
            return false;
        }
        let layout = &mut self.snapshot.layout;
        let (Some(pos_a), Some(pos_b)) = (layout.get(a).copied(), layout.get(b).copied()) else {
            debug!("swap of {} and {} rejected", a, b);
            return false;
        };
        layout.insert(a.to_string(), pos_b);
        layout.insert(b.to_string(), pos_a);

        let anchors = &mut self.snapshot.anchors;
        let anchor_a = anchors.remove(a);
        let anchor_b = anchors.remove(b);
        if let Some(anchor) = anchor_b {
            anchors.insert(a.to_string(), anchor);
        }
        if let Some(anchor) = anchor_a {
            anchors.insert(b.to_string(), anchor);
        }
        info!("swapped {} and {}", a, b);
        true
    }
}

//  Tests

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::WEATHER_ID;

    fn apps(ids: &[&str]) -> Vec<GridItem> {
        ids.iter().map(|id| GridItem::app(*id)).collect()
    }

    fn with_weather(ids: &[&str]) -> Vec<GridItem> {
        let mut items = vec![GridItem::weather()];
        items.extend(apps(ids));
        items
    }

    fn assert_consistent(manager: &LayoutManager) {
        let cols = manager.cols();
        let entries: Vec<_> = manager.layout().iter().collect();
        for (i, (id, pos)) in entries.iter().enumerate() {
            assert!(pos.fits(cols), "{} out of bounds: {:?}", id, pos);
            for (other, other_pos) in &entries[i + 1..] {
                assert!(!pos.overlaps(other_pos), "{} overlaps {}", id, other);
            }
        }
    }

    #[test]
    fn first_compute_places_items_row_major() {
        let mut m = LayoutManager::default();
        let report = m.compute(&with_weather(&["a", "b"]), 10);
        assert!(!report.reflowed);
        assert_eq!(report.placed, vec![WEATHER_ID, "a", "b"]);
        assert_eq!(m.position(WEATHER_ID), Some(GridPosition::new(0, 0, 3, 2)));
        assert_eq!(m.position("a"), Some(GridPosition::new(3, 0, 1, 1)));
        assert_eq!(m.position("b"), Some(GridPosition::new(4, 0, 1, 1)));
        assert_eq!(m.anchors()["b"], 4);
        assert_consistent(&m);
    }

    #[test]
    fn compute_is_idempotent() {
        let mut m = LayoutManager::default();
        let items = with_weather(&["a", "b", "c"]);
        m.compute(&items, 10);
        m.compute(&items, 6);
        let first = m.snapshot();
        let report = m.compute(&items, 6);
        assert_eq!(m.snapshot(), first);
        assert!(!report.changed());
    }

    #[test]
    fn pure_compute_matches_manager() {
        let items = with_weather(&["a"]);
        let params = LayoutParams::default();
        let (snapshot, _) = compute(&items, 10, None, &LayoutSnapshot::default(), &params);
        let (again, report) = compute(&items, 10, Some(10), &snapshot, &params);
        assert_eq!(snapshot, again);
        assert!(!report.changed());
    }

    #[test]
    fn anchors_restore_home_positions() {
        let mut m = LayoutManager::default();
        let mut snapshot = LayoutSnapshot::default();
        snapshot.layout.insert(WEATHER_ID.into(), GridPosition::new(3, 0, 3, 2));
        snapshot.anchors.insert(WEATHER_ID.into(), 3);
        m.restore(snapshot);
        let items = with_weather(&["a", "b"]);

        m.compute(&items, 10);
        assert_eq!(m.position(WEATHER_ID), Some(GridPosition::new(3, 0, 3, 2)));

        let report = m.compute(&items, 5);
        assert!(report.reflowed);
        assert_consistent(&m);
        assert_ne!(m.position(WEATHER_ID), Some(GridPosition::new(3, 0, 3, 2)));

        m.compute(&items, 10);
        assert_eq!(m.position(WEATHER_ID), Some(GridPosition::new(3, 0, 3, 2)));
        assert_eq!(m.anchors()[WEATHER_ID], 3);
        assert_consistent(&m);
    }

    #[test]
    fn reflow_does_not_touch_existing_anchors() {
        let mut m = LayoutManager::default();
        let items = with_weather(&["a", "b", "c", "d"]);
        m.compute(&items, 10);
        let anchors = m.anchors().clone();
        m.compute(&items, 4);
        m.compute(&items, 3);
        assert_eq!(m.anchors(), &anchors);
    }

    #[test]
    fn removal_keeps_remaining_positions() {
        let mut m = LayoutManager::default();
        m.compute(&with_weather(&["a", "b", "c"]), 10);
        let c = m.position("c");
        let report = m.compute(&with_weather(&["a", "c"]), 10);
        assert!(!report.reflowed);
        assert_eq!(report.pruned, vec!["b"]);
        assert_eq!(m.position("c"), c);
        assert!(!m.anchors().contains_key("b"));
    }

    #[test]
    fn fresh_anchors_skip_four_after_square_tiles() {
        let mut m = LayoutManager::default();
        m.compute(&apps(&["a"]), 10);
        let items = vec![
            GridItem::app("a"),
            GridItem::widget("widget-cpu-0"),
            GridItem::app("b"),
        ];
        let report = m.compute(&items, 8);
        assert!(report.reflowed);
        assert_eq!(m.anchors()["widget-cpu-0"], 1);
        assert_eq!(m.anchors()["b"], 5);
        assert_eq!(m.position("widget-cpu-0"), Some(GridPosition::new(1, 0, 2, 2)));
        assert_eq!(m.position("b"), Some(GridPosition::new(5, 0, 1, 1)));
        assert_eq!(report.placed, vec!["widget-cpu-0", "b"]);
    }

    #[test]
    fn overflowing_restored_layout_reflows_on_first_compute() {
        let mut m = LayoutManager::default();
        let mut snapshot = LayoutSnapshot::default();
        snapshot.layout.insert("a".into(), GridPosition::new(8, 0, 1, 1));
        snapshot.anchors.insert("a".into(), 8);
        m.restore(snapshot);
        let report = m.compute(&apps(&["a"]), 5);
        assert!(report.reflowed);
        assert_eq!(m.position("a"), Some(GridPosition::new(0, 0, 1, 1)));
        assert_eq!(m.anchors()["a"], 8);
    }

    #[test]
    fn footprint_change_forces_reflow() {
        let mut m = LayoutManager::default();
        let mut snapshot = LayoutSnapshot::default();
        snapshot.layout.insert(WEATHER_ID.into(), GridPosition::new(0, 0, 2, 2));
        m.restore(snapshot);
        let report = m.compute(&[GridItem::weather()], 10);
        assert!(report.reflowed);
        assert_eq!(m.position(WEATHER_ID), Some(GridPosition::new(0, 0, 3, 2)));
    }

    #[test]
    fn full_grid_leaves_items_unplaced_until_it_widens() {
        let params = LayoutParams {
            scan_rows: 1,
            ..LayoutParams::default()
        };
        let mut m = LayoutManager::new(params);
        let items = apps(&["a", "b", "c", "d"]);
        let report = m.compute(&items, 3);
        assert_eq!(report.unplaced, vec!["d"]);
        assert!(m.position("d").is_none());
        assert!(!m.anchors().contains_key("d"));

        let again = m.compute(&items, 3);
        assert_eq!(again.unplaced, vec!["d"]);

        let report = m.compute(&items, 4);
        assert!(report.unplaced.is_empty());
        assert_eq!(m.position("d"), Some(GridPosition::new(3, 0, 1, 1)));
        assert_consistent(&m);
    }

    #[test]
    fn restore_drops_overlaps_and_derives_anchors() {
        let mut m = LayoutManager::default();
        let mut snapshot = LayoutSnapshot::default();
        snapshot.layout.insert("a".into(), GridPosition::new(0, 0, 2, 2));
        snapshot.layout.insert("b".into(), GridPosition::new(1, 1, 1, 1));
        snapshot.layout.insert("c".into(), GridPosition::new(2, 1, 1, 1));
        snapshot.anchors.insert("b".into(), 40);
        let dropped = m.restore(snapshot);
        assert_eq!(dropped, vec!["b"]);
        assert_eq!(m.anchors()["a"], 0);
        assert_eq!(m.anchors()["c"], 12);
        assert_eq!(m.anchors()["b"], 40);

        // b goes back to its anchor on the next compute.
        let items = vec![GridItem::widget("a"), GridItem::app("b"), GridItem::app("c")];
        m.compute(&items, 10);
        assert_eq!(m.position("b"), Some(GridPosition::new(0, 4, 1, 1)));
        assert_consistent(&m);
    }

    #[test]
    fn restore_keeps_stored_anchors_over_positions() {
        // saved while narrow: weather sits away from its home at (3, 0)
        let mut snapshot = LayoutSnapshot::default();
        snapshot.layout.insert(WEATHER_ID.into(), GridPosition::new(0, 1, 3, 2));
        snapshot.layout.insert("d".into(), GridPosition::new(3, 0, 1, 1));
        snapshot.anchors.insert(WEATHER_ID.into(), 3);
        snapshot.anchors.insert("d".into(), 6);
        let mut m = LayoutManager::default();
        assert!(m.restore(snapshot).is_empty());
        assert_eq!(m.anchors()[WEATHER_ID], 3);
        assert_eq!(m.anchors()["d"], 6);

        let items = with_weather(&["d"]);
        m.compute(&items, 10);
        m.compute(&items, 5);
        m.compute(&items, 10);
        assert_eq!(m.position(WEATHER_ID), Some(GridPosition::new(3, 0, 3, 2)));
        assert_eq!(m.position("d"), Some(GridPosition::new(6, 0, 1, 1)));
        assert_consistent(&m);
    }

    #[test]
    fn move_item_updates_anchor() {
        let mut m = LayoutManager::default();
        m.compute(&with_weather(&["a"]), 10);
        assert!(m.move_item("a", 7, 2, 1, 1));
        assert_eq!(m.position("a"), Some(GridPosition::new(7, 2, 1, 1)));
        assert_eq!(m.anchors()["a"], 27);
    }

    #[test]
    fn repeated_move_is_a_no_op() {
        let mut m = LayoutManager::default();
        m.compute(&with_weather(&["a"]), 10);
        assert!(m.move_item(WEATHER_ID, 5, 1, 3, 2));
        let after_first = m.snapshot();
        assert!(m.move_item(WEATHER_ID, 5, 1, 3, 2));
        assert_eq!(m.snapshot(), after_first);
    }

    #[test]
    fn move_item_rejects_invalid_targets() {
        let mut m = LayoutManager::default();
        m.compute(&with_weather(&["a", "b"]), 10);
        let before = m.snapshot();
        assert!(!m.move_item("a", 1, 1, 1, 1), "overlaps weather");
        assert!(!m.move_item("a", 4, 0, 1, 1), "overlaps b");
        assert!(!m.move_item("a", 10, 0, 1, 1), "out of bounds");
        assert!(!m.move_item(WEATHER_ID, 8, 0, 3, 2), "sticks out");
        assert!(!m.move_item("ghost", 9, 9, 1, 1), "unknown id");
        assert_eq!(m.snapshot(), before);
    }

    #[test]
    fn adjacent_targets_are_valid() {
        let mut m = LayoutManager::default();
        m.compute(&with_weather(&["a"]), 10);
        assert!(m.is_position_valid("a", 3, 1, 1, 1));
        assert!(m.is_position_valid("a", 0, 2, 1, 1));
        assert!(!m.is_position_valid("a", 2, 1, 1, 1));
    }

    #[test]
    fn swap_exchanges_positions_and_anchors() {
        let mut m = LayoutManager::default();
        m.compute(&apps(&["x", "y"]), 10);
        assert!(m.move_item("x", 2, 0, 1, 1));
        assert!(m.move_item("y", 3, 0, 1, 1));
        assert!(m.swap_items("x", "y"));
        assert_eq!(m.position("x"), Some(GridPosition::new(3, 0, 1, 1)));
        assert_eq!(m.position("y"), Some(GridPosition::new(2, 0, 1, 1)));
        assert_eq!(m.anchors()["x"], 3);
        assert_eq!(m.anchors()["y"], 2);
        assert!(!m.swap_items("x", "ghost"));
    }

    #[test]
    fn occupants_and_free_position() {
        let mut m = LayoutManager::default();
        m.compute(&with_weather(&["a"]), 4);
        assert_eq!(m.occupants(&GridPosition::new(2, 1, 1, 1)), vec![WEATHER_ID]);
        assert_eq!(m.occupants(&GridPosition::new(3, 1, 1, 1)), Vec::<&str>::new());
        assert_eq!(m.find_free_position(1, 1), Some(GridPosition::new(3, 1, 1, 1)));
        assert_eq!(m.bottom_row(), 2);
    }

    #[test]
    fn duplicate_ids_are_placed_once() {
        let mut m = LayoutManager::default();
        let report = m.compute(&apps(&["a", "a"]), 10);
        assert_eq!(report.placed, vec!["a"]);
        assert_eq!(m.layout().len(), 1);
    }
}
