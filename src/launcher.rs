//! The orchestrator that ties the layout, the drag controller and the
//! persistence store together.
//!
//! [`Launcher`] owns the [`LayoutManager`] and the [`DragController`].  It
//! derives the grid size from the viewport, feeds the current inventory
//! (weather, apps, widgets) to the layout, maps drops onto cells, and decides
//! when the layout is handed to the [`LayoutStore`].
//!
//! # Persistence policy
//!
//! * After mounting, the grid is recomputed once more when the settle timer
//!   fires, and that snapshot is sent **once** with `manual = false`.
//! * After that, every user-caused change (a drop or swap, a widget added or
//!   removed, a newly installed app placed) arms the save timer; when it
//!   fires the latest record is sent with `manual = true`.
//! * Reflows caused by resizing are never saved, so a narrow window cannot
//!   overwrite the wide layout.

use crate::command::{HostEvent, Viewport};
use crate::config::Config;
use crate::drag::{DragController, DragPosition, DragSource, Dropped, GestureOutcome, PointerInput, ScreenRect};
use crate::geometry::{columns_for_width, grid_to_pixel, pixel_to_grid, rows_for_height, span_px, GridPosition};
use crate::item::{Anchors, GridItem, Layout, LauncherRecord, Widget};
use crate::layout::{ComputeReport, LayoutManager};
use crate::timer::Timer;
use crate::traits::{LauncherEvent, LayoutStore};
use log::{debug, error, info, warn};
use std::collections::HashSet;
use std::sync::mpsc;
use std::time::Instant;

/// Possible errors from the launcher.
#[derive(Debug, thiserror::Error)]
pub enum LauncherError {
    /// The layout store failed to save.
    #[error("persistence error: {0}")]
    Persistence(String),
}

/// Adaptive tile grid with drag-and-drop.
///
/// The launcher is generic over any [`LayoutStore`], so it does not care
/// whether layouts end up in a file, a settings service or a test recorder.
/// It never reads the clock: every entry point takes `now`, and the host
/// calls [`tick`](Self::tick) to fire due timers.
///
/// # Typical usage
///
/// ```ignore
/// let mut launcher = Launcher::new(Config::default(), store, saved_record);
/// launcher.set_apps(installed_apps, now);
/// launcher.mount(Viewport::new(1388.0, 800.0), now);
/// // later, from the event loop
/// launcher.tick(Instant::now())?;
/// ```
pub struct Launcher<S: LayoutStore> {
    config: Config,
    store: S,
    layout: LayoutManager,
    drag: DragController,
    events: Option<mpsc::Sender<LauncherEvent>>,

    apps: Vec<String>,
    widgets: Vec<Widget>,
    next_widget: u64,

    mounted: bool,
    viewport: Option<Viewport>,
    pending_viewport: Option<Viewport>,
    cols: u32,
    rows: u32,

    resize_timer: Timer,
    settle_timer: Timer,
    save_timer: Timer,
    initial_saved: bool,
    /// A user change happened while unmounted; saved after the next settle.
    deferred_save: bool,
}

impl<S: LayoutStore> Launcher<S> {
    /// Create a launcher, optionally starting from a persisted record.
    ///
    /// Nothing is laid out until [`mount`](Self::mount).
    pub fn new(config: Config, store: S, initial: Option<LauncherRecord>) -> Self {
        let grid = &config.grid;
        if grid.max_cols > grid.base_cols {
            warn!(
                "max_cols {} exceeds base_cols {}, clamping",
                grid.max_cols, grid.base_cols
            );
        }
        let mut layout = LayoutManager::new(grid.layout_params());
        let mut apps = Vec::new();
        let mut widgets: Vec<Widget> = Vec::new();

        if let Some(record) = initial {
            let dropped = layout.restore(record.snapshot);
            if !dropped.is_empty() {
                warn!("dropped unusable saved positions: {:?}", dropped);
            }
            for widget in record.widgets {
                if widgets.iter().any(|w| w.widget_type == widget.widget_type || w.id == widget.id) {
                    warn!("ignoring duplicate saved widget {}", widget.id);
                } else {
                    widgets.push(widget);
                }
            }
            apps = record.apps;
            info!(
                "restored {} positions, {} widgets, {} apps",
                layout.layout().len(),
                widgets.len(),
                apps.len()
            );
        }

        let cols = grid.effective_max_cols();
        let rows = grid.base_rows;
        let drag = DragController::new(config.drag.clone());
        Self {
            next_widget: widgets.len() as u64,
            config,
            store,
            layout,
            drag,
            events: None,
            apps,
            widgets,
            mounted: false,
            viewport: None,
            pending_viewport: None,
            cols,
            rows,
            resize_timer: Timer::new(),
            settle_timer: Timer::new(),
            save_timer: Timer::new(),
            initial_saved: false,
            deferred_save: false,
        }
    }

    /// Attach a channel for cosmetic [`LauncherEvent`]s (drag previews,
    /// rejected drops, grid size changes).
    pub fn set_events(&mut self, tx: mpsc::Sender<LauncherEvent>) {
        self.events = Some(tx);
    }

    /// Process a single [`HostEvent`].
    ///
    /// `now` is the time the event happened.  [`HostEvent::Advance`] only
    /// fires due timers: the caller is expected to have advanced `now`
    /// already.
    ///
    /// A failed save from an overdue timer is returned, but only after the
    /// event itself has been applied.
    pub fn handle(&mut self, event: HostEvent, now: Instant) -> Result<(), LauncherError> {
        // Overdue timers fire before the event so their effects keep order.
        let ticked = self.tick(now);
        match event {
            HostEvent::Mount(viewport) => self.mount(viewport, now),
            HostEvent::Resize(viewport) => self.set_viewport(viewport, now),
            HostEvent::Apps(apps) => self.set_apps(apps, now),
            HostEvent::AddWidget(widget_type) => {
                self.add_widget(&widget_type, now);
            }
            HostEvent::RemoveWidget { id } => {
                self.remove_widget(&id, now);
            }
            HostEvent::PointerDown {
                pointer,
                item_id,
                on_control,
            } => {
                self.pointer_down(&pointer, &item_id, on_control, now);
            }
            HostEvent::PointerMove(pointer) => {
                self.pointer_move(&pointer, now);
            }
            HostEvent::PointerUp(pointer) => {
                self.pointer_up(&pointer, now);
            }
            HostEvent::PointerCancel(pointer) => {
                self.pointer_cancel(&pointer, now);
            }
            HostEvent::Advance { .. } => {}
            HostEvent::Teardown => self.teardown(),
        }
        ticked
    }

    //  Lifecycle

    /// The launcher became visible.  Lays the grid out immediately and arms
    /// the settle timer.
    pub fn mount(&mut self, viewport: Viewport, now: Instant) {
        info!("mount {}x{}", viewport.width, viewport.height);
        self.mounted = true;
        self.viewport = Some(viewport);
        self.pending_viewport = None;
        self.resize_timer.cancel();
        self.relayout();
        self.settle_timer.arm(now, self.config.timing.settle());
    }

    /// The viewport changed.  The new size takes effect once resizes stop
    /// for the debounce period.
    pub fn set_viewport(&mut self, viewport: Viewport, now: Instant) {
        debug!("resize to {}x{}", viewport.width, viewport.height);
        self.pending_viewport = Some(viewport);
        self.resize_timer.arm(now, self.config.timing.resize_debounce());
    }

    /// Cancel every timer and any gesture in flight.  Pending saves are
    /// discarded.
    pub fn teardown(&mut self) {
        info!("teardown");
        self.resize_timer.cancel();
        self.settle_timer.cancel();
        self.save_timer.cancel();
        if let Some(item_id) = self.drag.active_item().map(str::to_string) {
            self.emit(LauncherEvent::DragEnded { item_id });
        }
        self.drag.cancel();
        self.mounted = false;
    }

    /// Fire every due timer.
    pub fn tick(&mut self, now: Instant) -> Result<(), LauncherError> {
        if let Some(position) = self.drag.tick(now) {
            self.preview(&position);
        }

        if self.resize_timer.fire(now) {
            if let Some(viewport) = self.pending_viewport.take() {
                self.viewport = Some(viewport);
                if self.mounted {
                    self.relayout();
                }
            }
        }

        if self.settle_timer.fire(now) {
            self.relayout();
            if !self.initial_saved {
                self.initial_saved = true;
                self.deferred_save = false;
                self.save(false)?;
            } else if self.deferred_save {
                self.deferred_save = false;
                self.save_timer.arm(now, self.config.timing.save_debounce());
            }
        }

        if self.save_timer.fire(now) {
            self.save(true)?;
        }
        Ok(())
    }

    /// Earliest instant at which [`tick`](Self::tick) has work to do.
    pub fn next_deadline(&self) -> Option<Instant> {
        [
            self.drag.next_deadline(),
            self.resize_timer.deadline(),
            self.settle_timer.deadline(),
            self.save_timer.deadline(),
        ]
        .into_iter()
        .flatten()
        .min()
    }

    //  Inventory

    /// Replace the installed app list.
    ///
    /// Newly installed apps that get placed count as a user change;
    /// uninstalled apps are pruned without saving.
    pub fn set_apps(&mut self, apps: Vec<String>, now: Instant) {
        debug!("{} apps", apps.len());
        self.apps = apps;
        if !self.mounted {
            return;
        }
        let report = self.relayout();
        if !report.placed.is_empty() {
            self.manual_change(now);
        }
    }

    /// Add a widget of `widget_type`.  Returns its id, or `None` if a widget
    /// of that type already exists.
    pub fn add_widget(&mut self, widget_type: &str, now: Instant) -> Option<String> {
        if self.widgets.iter().any(|w| w.widget_type == widget_type) {
            debug!("widget {} already present", widget_type);
            return None;
        }
        let mut id = format!("widget-{}-{}", widget_type, self.next_widget);
        while self.widgets.iter().any(|w| w.id == id) {
            self.next_widget += 1;
            id = format!("widget-{}-{}", widget_type, self.next_widget);
        }
        self.next_widget += 1;
        info!("add widget {}", id);
        self.widgets.push(Widget::new(id.clone(), widget_type));
        if self.mounted {
            self.relayout();
        }
        self.manual_change(now);
        Some(id)
    }

    /// Remove the widget `id`.  Returns whether it existed.
    pub fn remove_widget(&mut self, id: &str, now: Instant) -> bool {
        let Some(index) = self.widgets.iter().position(|w| w.id == id) else {
            debug!("no widget {}", id);
            return false;
        };
        info!("remove widget {}", id);
        self.widgets.remove(index);
        if self.mounted {
            self.relayout();
        }
        self.manual_change(now);
        true
    }

    //  Pointer input

    /// Pointer pressed on tile `item_id`.  Returns whether a gesture
    /// started.
    pub fn pointer_down(
        &mut self,
        input: &PointerInput,
        item_id: &str,
        on_control: bool,
        now: Instant,
    ) -> bool {
        let Some(pos) = self.layout.position(item_id) else {
            debug!("press on unplaced item {}", item_id);
            return false;
        };
        let source = DragSource {
            item_id: item_id.to_string(),
            width: pos.w,
            height: pos.h,
            rect: self.screen_rect(&pos),
            in_excluded_control: on_control,
        };
        self.drag.pointer_down(input, source, now)
    }

    /// Pointer moved.  Returns the dragged tile's live position.
    pub fn pointer_move(&mut self, input: &PointerInput, now: Instant) -> Option<DragPosition> {
        let position = self.drag.pointer_move(input, now)?;
        self.preview(&position);
        Some(position)
    }

    /// Pointer released.  Drops are applied to the layout before returning.
    pub fn pointer_up(&mut self, input: &PointerInput, now: Instant) -> GestureOutcome {
        let outcome = self.drag.pointer_up(input, now);
        match &outcome {
            GestureOutcome::Click { item_id } => {
                debug!("activate {}", item_id);
                self.emit(LauncherEvent::Activated {
                    item_id: item_id.clone(),
                });
            }
            GestureOutcome::Drop(drop) => {
                self.emit(LauncherEvent::DragEnded {
                    item_id: drop.item_id.clone(),
                });
                self.apply_drop(drop, now);
            }
            GestureOutcome::Ignored => {}
        }
        outcome
    }

    /// The host cancelled the pointer.  Ends any gesture without a drop.
    pub fn pointer_cancel(&mut self, input: &PointerInput, now: Instant) {
        let item_id = self.drag.active_item().map(str::to_string);
        if self.drag.pointer_cancel(input, now) {
            if let Some(item_id) = item_id {
                self.emit(LauncherEvent::DragEnded { item_id });
            }
        }
    }

    /// Map a drop onto the grid: move there, or swap two single-cell apps.
    ///
    /// Returns whether the layout changed.
    fn apply_drop(&mut self, drop: &Dropped, now: Instant) -> bool {
        let (col, row) = self.drop_cell(drop.x, drop.y);
        let (w, h) = (drop.width, drop.height);

        if self.layout.move_item(&drop.item_id, col, row, w, h) {
            self.manual_change(now);
            return true;
        }

        if let Some(other) = self.swap_partner(&drop.item_id, col, row) {
            if self.layout.swap_items(&drop.item_id, &other) {
                self.manual_change(now);
                return true;
            }
        }

        info!("drop of {} at ({}, {}) rejected", drop.item_id, col, row);
        self.emit(LauncherEvent::Rejected {
            item_id: drop.item_id.clone(),
        });
        false
    }

    /// The single 1×1 app at `(col, row)` that `item_id` may swap with.
    fn swap_partner(&self, item_id: &str, col: u32, row: u32) -> Option<String> {
        if !self.is_single_cell_app(item_id) {
            return None;
        }
        let target = GridPosition::new(col, row, 1, 1);
        let occupants: Vec<&str> = self
            .layout
            .occupants(&target)
            .into_iter()
            .filter(|id| *id != item_id)
            .collect();
        match occupants.as_slice() {
            [other] if self.is_single_cell_app(other) => Some(other.to_string()),
            _ => None,
        }
    }

    fn is_single_cell_app(&self, id: &str) -> bool {
        self.apps.iter().any(|app| app == id)
            && self
                .layout
                .position(id)
                .is_some_and(|pos| GridItem::app(id).at(pos.col, pos.row) == pos)
    }

    //  Accessors

    /// Current column count.
    pub fn cols(&self) -> u32 {
        self.cols
    }

    /// Current row count, including empty rows kept for the base grid.
    pub fn rows(&self) -> u32 {
        self.rows
    }

    pub fn layout(&self) -> &Layout {
        self.layout.layout()
    }

    pub fn anchors(&self) -> &Anchors {
        self.layout.anchors()
    }

    pub fn widgets(&self) -> &[Widget] {
        &self.widgets
    }

    pub fn apps(&self) -> &[String] {
        &self.apps
    }

    pub fn viewport(&self) -> Option<Viewport> {
        self.viewport
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    /// Whether the most recent gesture dragged; used to swallow clicks.
    pub fn has_dragged(&self) -> bool {
        self.drag.has_dragged()
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_dragging()
    }

    /// Whether a user change is waiting for the save timer.
    pub fn has_pending_save(&self) -> bool {
        self.save_timer.is_armed()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Everything the store would receive right now.
    pub fn record(&self) -> LauncherRecord {
        LauncherRecord::new(self.layout.snapshot(), self.widgets.clone(), &self.apps)
    }

    /// Items in inventory order: weather, apps, widgets.
    pub fn items(&self) -> Vec<GridItem> {
        std::iter::once(GridItem::weather())
            .chain(self.apps.iter().map(GridItem::app))
            .chain(self.widgets.iter().map(Widget::item))
            .collect()
    }

    //  Internals

    /// Recompute columns, layout and rows for the current viewport.
    fn relayout(&mut self) -> ComputeReport {
        let Some(viewport) = self.viewport else {
            return ComputeReport::default();
        };
        let grid = &self.config.grid;
        let cols = columns_for_width(
            viewport.width,
            grid.horizontal_padding,
            grid.slot_size,
            grid.gap,
            grid.effective_min_cols(),
            grid.effective_max_cols(),
        );
        let items = self.items();
        let report = self.layout.compute(&items, cols);
        if !report.unplaced.is_empty() {
            warn!("left unplaced on {} columns: {:?}", cols, report.unplaced);
        }

        let rows = self.rows_for(&viewport, &items, cols);
        if (cols, rows) != (self.cols, self.rows) {
            debug!("grid {}x{} -> {}x{}", self.cols, self.rows, cols, rows);
            self.cols = cols;
            self.rows = rows;
            self.emit(LauncherEvent::GridResized { cols, rows });
        }
        report
    }

    fn rows_for(&self, viewport: &Viewport, items: &[GridItem], cols: u32) -> u32 {
        let grid = &self.config.grid;
        let fit = rows_for_height(viewport.height, grid.vertical_padding, grid.slot_size, grid.gap);
        let mut seen = HashSet::new();
        let needed: u32 = items
            .iter()
            .filter(|item| seen.insert(item.id.as_str()))
            .map(GridItem::area)
            .sum();
        let slots = (grid.base_cols * grid.base_rows).max(needed);
        let by_slots = slots.div_ceil(cols.max(1));
        grid.base_rows
            .max(fit)
            .max(by_slots)
            .max(self.layout.bottom_row())
    }

    /// Arm the save timer for a user change.  Before the initial snapshot
    /// went out the change simply rides along with it.  While unmounted the
    /// layout is stale, so the save waits until the grid has settled again.
    fn manual_change(&mut self, now: Instant) {
        if !self.mounted {
            debug!("unmounted, save deferred");
            self.deferred_save = true;
        } else if self.initial_saved {
            debug!("save in {:?}", self.config.timing.save_debounce());
            self.save_timer.arm(now, self.config.timing.save_debounce());
        }
    }

    fn save(&mut self, manual: bool) -> Result<(), LauncherError> {
        let record = self.record();
        info!(
            "saving layout ({} positions, manual: {})",
            record.snapshot.layout.len(),
            manual
        );
        self.store.on_layout_change(&record, manual).map_err(|e| {
            error!("failed to save layout: {}", e);
            LauncherError::Persistence(e.to_string())
        })
    }

    fn screen_rect(&self, pos: &GridPosition) -> ScreenRect {
        let grid = &self.config.grid;
        let origin = self.viewport.unwrap_or_default();
        let (x, y) = grid_to_pixel(pos.col, pos.row, grid.slot_size, grid.gap);
        ScreenRect {
            x: origin.grid_left + x,
            y: origin.grid_top + y,
            w: span_px(pos.w, grid.slot_size, grid.gap),
            h: span_px(pos.h, grid.slot_size, grid.gap),
        }
    }

    /// Cell under a tile's top-left screen position.
    fn drop_cell(&self, x: f64, y: f64) -> (u32, u32) {
        let grid = &self.config.grid;
        let origin = self.viewport.unwrap_or_default();
        pixel_to_grid(x - origin.grid_left, y - origin.grid_top, grid.slot_size, grid.gap)
    }

    fn preview(&self, position: &DragPosition) {
        let (col, row) = self.drop_cell(position.x, position.y);
        let col = col.min(self.cols.saturating_sub(position.width));
        self.emit(LauncherEvent::DragPreview {
            item_id: position.item_id.clone(),
            x: position.x,
            y: position.y,
            target: GridPosition::new(col, row, position.width, position.height),
        });
    }

    fn emit(&self, event: LauncherEvent) {
        if let Some(tx) = &self.events {
            let _ = tx.send(event);
        }
    }
}

//  Tests
