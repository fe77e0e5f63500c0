//! **launchgrid**: an adaptive tile grid with drag-and-drop for application
//! launcher shells.
//!
//! Tiles (apps, a weather tile, widgets) are placed on a grid whose column
//! count follows the viewport.  Every tile remembers a *home* cell (its
//! anchor) in a fixed reference grid, so shrinking the window packs tiles
//! wherever they fit and widening it puts them back where the user left
//! them.
//!
//! # Architecture
//!
//! * [`layout::LayoutManager`]: owns positions and anchors; placement,
//!   reflow, move and swap.
//! * [`drag::DragController`]: turns pointer input into clicks, live drag
//!   positions and drops.
//! * [`launcher::Launcher`]: wires viewport size, inventory and drops to
//!   the layout and decides when to persist.
//!
//! The launcher depends on two traits so it is not coupled to any backend:
//!
//! * [`traits::LayoutStore`]: receives layouts to persist.
//! * [`traits::EventSource`]: delivers host input (see [`ipc`] for the
//!   line-delimited JSON implementation).

pub mod command;
pub mod config;
pub mod drag;
pub mod geometry;
pub mod ipc;
pub mod item;
pub mod launcher;
pub mod layout;
pub mod timer;
pub mod traits;
