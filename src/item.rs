//! Tiles, widgets and the snapshots exchanged with the persistence store.
//!
//! Every tile on the grid is a [`GridItem`].  Its footprint is fixed by its
//! [`ItemKind`] when built through the convenience constructors, but the
//! layout engine only ever looks at `width` / `height`.
//!
//! The persisted form is a [`LauncherRecord`]:
//!
//! ```json
//! {
//!   "layout":  { "weather": { "col": 3, "row": 0, "w": 3, "h": 2 } },
//!   "anchors": { "weather": 3 },
//!   "widgets": [ { "id": "widget-storage-0", "type": "storage" } ],
//!   "apps":    [ "app-nextcloud" ]
//! }
//! ```

use crate::geometry::GridPosition;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Id of the single weather tile.
pub const WEATHER_ID: &str = "weather";

/// A tile's stable home index in the reference grid:
/// `row_ref * reference_cols + col_ref`.
pub type Anchor = u32;

/// `item id -> placement in the current grid`.
pub type Layout = BTreeMap<String, GridPosition>;

/// `item id -> anchor`.
pub type Anchors = BTreeMap<String, Anchor>;

/// What a tile represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    App,
    Widget,
    Weather,
}

impl ItemKind {
    /// Default footprint `(width, height)` in cells.
    pub fn footprint(self) -> (u32, u32) {
        match self {
            ItemKind::App => (1, 1),
            ItemKind::Widget => (2, 2),
            ItemKind::Weather => (3, 2),
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemKind::App => write!(f, "app"),
            ItemKind::Widget => write!(f, "widget"),
            ItemKind::Weather => write!(f, "weather"),
        }
    }
}

/// A tile to be placed on the grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridItem {
    pub id: String,
    pub kind: ItemKind,
    pub width: u32,
    pub height: u32,
}

impl GridItem {
    pub fn new(id: impl Into<String>, kind: ItemKind, width: u32, height: u32) -> Self {
        Self {
            id: id.into(),
            kind,
            width,
            height,
        }
    }

    /// A tile with the default footprint of `kind`.
    pub fn of_kind(id: impl Into<String>, kind: ItemKind) -> Self {
        let (width, height) = kind.footprint();
        Self::new(id, kind, width, height)
    }

    pub fn app(id: impl Into<String>) -> Self {
        Self::of_kind(id, ItemKind::App)
    }

    pub fn widget(id: impl Into<String>) -> Self {
        Self::of_kind(id, ItemKind::Widget)
    }

    pub fn weather() -> Self {
        Self::of_kind(WEATHER_ID, ItemKind::Weather)
    }

    pub fn area(&self) -> u32 {
        self.width.saturating_mul(self.height)
    }

    /// Whether this is a plain 1×1 app tile (the only kind that can be
    /// swapped by dropping it onto another).
    pub fn is_single_cell_app(&self) -> bool {
        self.kind == ItemKind::App && self.width == 1 && self.height == 1
    }

    /// The rectangle this item would occupy with its top-left at
    /// `(col, row)`.
    pub fn at(&self, col: u32, row: u32) -> GridPosition {
        GridPosition::new(col, row, self.width, self.height)
    }
}

/// A user-added widget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Widget {
    pub id: String,
    #[serde(rename = "type")]
    pub widget_type: String,
}

impl Widget {
    pub fn new(id: impl Into<String>, widget_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            widget_type: widget_type.into(),
        }
    }

    /// The grid tile backing this widget.
    pub fn item(&self) -> GridItem {
        GridItem::widget(self.id.clone())
    }
}

/// The layout/anchor pair owned by the
/// [`LayoutManager`](crate::layout::LayoutManager).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutSnapshot {
    #[serde(default)]
    pub layout: Layout,
    #[serde(default)]
    pub anchors: Anchors,
}

/// Everything handed to the persistence store.
///
/// Every field is optional on the wire, so records written by older
/// versions (or hand-edited ones) still load.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LauncherRecord {
    #[serde(flatten)]
    pub snapshot: LayoutSnapshot,
    /// Widgets the user has added.
    #[serde(default)]
    pub widgets: Vec<Widget>,
    /// Placed app ids in row-major visual order.
    #[serde(default)]
    pub apps: Vec<String>,
}

impl LauncherRecord {
    /// Build a record, deriving the visual app order from the layout.
    pub fn new(snapshot: LayoutSnapshot, widgets: Vec<Widget>, app_ids: &[String]) -> Self {
        let mut placed: Vec<(&String, &GridPosition)> = snapshot
            .layout
            .iter()
            .filter(|(id, _)| app_ids.contains(*id))
            .collect();
        placed.sort_by_key(|(_, pos)| (pos.row, pos.col));
        let apps = placed.into_iter().map(|(id, _)| id.clone()).collect();
        Self {
            snapshot,
            widgets,
            apps,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_footprints() {
        assert_eq!(GridItem::app("a").area(), 1);
        assert_eq!(GridItem::widget("widget-cpu-0").area(), 4);
        let weather = GridItem::weather();
        assert_eq!((weather.width, weather.height), (3, 2));
        assert_eq!(weather.id, WEATHER_ID);
    }

    #[test]
    fn only_one_by_one_apps_are_single_cell() {
        assert!(GridItem::app("a").is_single_cell_app());
        assert!(!GridItem::new("a", ItemKind::App, 2, 1).is_single_cell_app());
        assert!(!GridItem::new("w", ItemKind::Widget, 1, 1).is_single_cell_app());
    }

    #[test]
    fn record_deserializes_with_missing_sections() {
        let rec: LauncherRecord = serde_json::from_str("{}").unwrap();
        assert_eq!(rec, LauncherRecord::default());

        let json = r#"{
            "layout": { "weather": { "col": 3, "row": 0, "w": 3, "h": 2 } },
            "anchors": { "weather": 3 },
            "widgets": [ { "id": "widget-storage-0", "type": "storage" } ]
        }"#;
        let rec: LauncherRecord = serde_json::from_str(json).unwrap();
        assert_eq!(rec.snapshot.layout["weather"], GridPosition::new(3, 0, 3, 2));
        assert_eq!(rec.snapshot.anchors["weather"], 3);
        assert_eq!(rec.widgets[0].widget_type, "storage");
        assert!(rec.apps.is_empty());
    }

    #[test]
    fn record_orders_apps_row_major() {
        let mut snapshot = LayoutSnapshot::default();
        snapshot.layout.insert("b".into(), GridPosition::new(0, 1, 1, 1));
        snapshot.layout.insert("a".into(), GridPosition::new(4, 0, 1, 1));
        snapshot.layout.insert("c".into(), GridPosition::new(1, 0, 1, 1));
        snapshot.layout.insert(WEATHER_ID.into(), GridPosition::new(0, 2, 3, 2));
        let apps = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let rec = LauncherRecord::new(snapshot, Vec::new(), &apps);
        assert_eq!(rec.apps, vec!["c", "a", "b"]);
    }

    #[test]
    fn record_serializes_flat() {
        let rec = LauncherRecord::default();
        let value = serde_json::to_value(&rec).unwrap();
        assert!(value.get("layout").is_some());
        assert!(value.get("anchors").is_some());
        assert!(value.get("snapshot").is_none());
    }
}
