//! Traits that decouple the launcher from its persistence backend and from
//! the transport that delivers host input.
//!
//! Every concrete collaborator (a settings service, a JSON file, a replay
//! script, a test harness, …) implements one of these traits.  The
//! [`Launcher`](crate::launcher::Launcher) only depends on these
//! abstractions.

use crate::command::HostEvent;
use crate::geometry::GridPosition;
use crate::item::LauncherRecord;
use serde::Serialize;
use std::sync::mpsc;

/// Receives the layout whenever the launcher decides it should be saved.
///
/// An implementation might write a file, post to a settings backend, or
/// simply record the calls in a test.
pub trait LayoutStore {
    /// The error type produced by this store.
    type Error: std::error::Error + Send + 'static;

    /// Persist `record`.
    ///
    /// `manual` is `false` for the one-off snapshot emitted once the grid
    /// has settled after mounting, and `true` for every save caused by the
    /// user (drops, swaps, widgets added or removed, new tiles placed).
    fn on_layout_change(&mut self, record: &LauncherRecord, manual: bool) -> Result<(), Self::Error>;
}

impl<S: LayoutStore + ?Sized> LayoutStore for &mut S {
    type Error = S::Error;

    fn on_layout_change(&mut self, record: &LauncherRecord, manual: bool) -> Result<(), S::Error> {
        (**self).on_layout_change(record, manual)
    }
}

//  Cosmetic events

/// Events sent from the [`Launcher`](crate::launcher::Launcher) to the
/// renderer over an [`mpsc`](std::sync::mpsc) channel.
///
/// They never carry state the renderer has to keep in sync; dropping them is
/// harmless.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LauncherEvent {
    /// The dragged tile is hovering over `target`.  Highlight those cells.
    DragPreview {
        item_id: String,
        x: f64,
        y: f64,
        target: GridPosition,
    },

    /// A tile was clicked rather than dragged.  Open it.
    Activated { item_id: String },

    /// The drag is over; clear the highlight.
    DragEnded { item_id: String },

    /// A drop could not be applied.  Shake the tile.
    Rejected { item_id: String },

    /// The column or row count changed.
    GridResized { cols: u32, rows: u32 },
}

//  Event Source

/// A source of [`HostEvent`]s.
///
/// Implementations read from some transport (stdin, a socket, an in-memory
/// script, …) and forward parsed events into the provided
/// [`mpsc::Sender`].
///
/// # Contract
///
/// * [`run`](EventSource::run) **blocks** until the source is exhausted or
///   an unrecoverable error occurs.
/// * Each received event must be sent through `sink` exactly once, in
///   arrival order.
/// * Implementations must be [`Send`] so they can run on a dedicated thread.
pub trait EventSource: Send {
    /// The error type produced by this source.
    type Error: std::error::Error + Send + 'static;

    /// Start reading and forward every incoming [`HostEvent`] into `sink`.
    fn run(&mut self, sink: mpsc::Sender<HostEvent>) -> Result<(), Self::Error>;
}
