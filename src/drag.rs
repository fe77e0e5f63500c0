//! Turns raw pointer input into click / drag / drop decisions.
//!
//! # Gesture phases
//!
//! | Phase      | Entered by                                  | Left by                               |
//! |------------|---------------------------------------------|---------------------------------------|
//! | `Idle`     | up, cancel, teardown                        | primary pointer-down on a tile        |
//! | `Pending`  | pointer-down                                | long-press elapsed, slop exceeded, up |
//! | `Dragging` | long-press elapsed or pointer left the slop | pointer-up (drop), cancel             |
//!
//! 1. **Pointer-down** captures the pointer for the new gesture, remembers
//!    where inside the tile it was grabbed and arms the long-press timer.
//! 2. **Pointer-up while `Pending`** is a [`GestureOutcome::Click`].
//! 3. **Long-press elapsed** ([`DragController::tick`]) or **movement past
//!    [`DragConfig::drag_threshold_px`]** switches to `Dragging` and reports
//!    the tile's live position (`pointer - grab offset`).
//! 4. **Pointer-up while `Dragging`** is a [`GestureOutcome::Drop`] carrying
//!    the final position and the tile's initial screen rect.
//!
//! The controller knows nothing about the grid; the
//! [`Launcher`](crate::launcher::Launcher) maps drops onto cells.

use crate::command::PointerButton;
use crate::timer::Timer;
use log::debug;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Tuning knobs for gesture recognition.
///
/// `long_press_ms` is how long a pointer must stay down on a tile before a
/// drag starts.  `drag_threshold_px` is how far (on either axis) the tile
/// must travel before the gesture counts as having dragged.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DragConfig {
    /// Hold time before a press becomes a drag.  Default: `200`.
    pub long_press_ms: u64,
    /// Per-axis travel that marks a gesture as dragged.  Default: `5.0`.
    pub drag_threshold_px: f64,
}

impl Default for DragConfig {
    fn default() -> Self {
        Self {
            long_press_ms: 200,
            drag_threshold_px: 5.0,
        }
    }
}

impl DragConfig {
    pub fn long_press(&self) -> Duration {
        Duration::from_millis(self.long_press_ms)
    }
}

/// One pointer event in screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerInput {
    pub pointer_id: u32,
    #[serde(default)]
    pub button: PointerButton,
    pub x: f64,
    pub y: f64,
}

impl PointerInput {
    pub fn primary(pointer_id: u32, x: f64, y: f64) -> Self {
        Self {
            pointer_id,
            button: PointerButton::Primary,
            x,
            y,
        }
    }
}

/// Screen rectangle in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScreenRect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

/// The tile a pointer-down landed on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DragSource {
    pub item_id: String,
    /// Footprint in cells.
    pub width: u32,
    pub height: u32,
    /// The tile's on-screen rect at pointer-down.
    pub rect: ScreenRect,
    /// The press landed on a control inside the tile (context menu, remove
    /// button, ...), which never starts a gesture.
    #[serde(default)]
    pub in_excluded_control: bool,
}

/// Monotonic gesture counter.
pub type GestureId = u64;

/// Exclusive ownership of one pointer id by one gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointerCapture {
    pub pointer_id: u32,
    pub gesture: GestureId,
}

/// Live top-left position of the dragged tile.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DragPosition {
    pub item_id: String,
    pub width: u32,
    pub height: u32,
    pub x: f64,
    pub y: f64,
}

/// A finished drag.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dropped {
    pub item_id: String,
    pub width: u32,
    pub height: u32,
    /// Final top-left position of the tile.
    pub x: f64,
    pub y: f64,
    /// Top-left of the tile's rect when the gesture started.
    pub initial_x: f64,
    pub initial_y: f64,
    pub has_dragged: bool,
}

/// What a pointer-up resolved to.
#[derive(Debug, Clone, PartialEq)]
pub enum GestureOutcome {
    /// No gesture owned this pointer.
    Ignored,
    /// Released before the drag started: activate the tile.
    Click { item_id: String },
    Drop(Dropped),
}

impl GestureOutcome {
    /// Whether the host must swallow the click event that follows this
    /// pointer-up.
    pub fn suppress_click(&self) -> bool {
        match self {
            GestureOutcome::Drop(drop) => drop.has_dragged,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Pending,
    Dragging,
}

/// State of the gesture in flight.
#[derive(Debug)]
struct Gesture {
    phase: Phase,
    capture: PointerCapture,
    source: DragSource,
    /// Pointer position relative to the tile's top-left at pointer-down.
    offset: (f64, f64),
    /// Latest known pointer position.
    latest: (f64, f64),
}

impl Gesture {
    fn position(&self) -> DragPosition {
        DragPosition {
            item_id: self.source.item_id.clone(),
            width: self.source.width,
            height: self.source.height,
            x: self.latest.0 - self.offset.0,
            y: self.latest.1 - self.offset.1,
        }
    }

    /// Whether the tile has travelled more than `threshold` from its
    /// initial rect on either axis.
    fn exceeds(&self, threshold: f64) -> bool {
        let pos = self.position();
        (pos.x - self.source.rect.x).abs() > threshold
            || (pos.y - self.source.rect.y).abs() > threshold
    }
}

/// Pointer gesture state machine.
#[derive(Debug)]
pub struct DragController {
    config: DragConfig,
    gesture: Option<Gesture>,
    long_press: Timer,
    next_gesture: GestureId,
    has_dragged: bool,
}

impl DragController {
    pub fn new(config: DragConfig) -> Self {
        Self {
            config,
            gesture: None,
            long_press: Timer::new(),
            next_gesture: 0,
            has_dragged: false,
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(DragConfig::default())
    }

    pub fn config(&self) -> &DragConfig {
        &self.config
    }

    /// Start a gesture on `source`.
    ///
    /// Returns `false` (and leaves any gesture in flight untouched) for
    /// non-primary buttons and presses on excluded controls.  Otherwise any
    /// active gesture is superseded.
    pub fn pointer_down(&mut self, input: &PointerInput, source: DragSource, now: Instant) -> bool {
        if input.button != PointerButton::Primary {
            debug!("ignoring {} button press on {}", input.button, source.item_id);
            return false;
        }
        if source.in_excluded_control {
            debug!("ignoring press on a control inside {}", source.item_id);
            return false;
        }
        if let Some(old) = self.gesture.take() {
            debug!(
                "gesture {} on {} superseded",
                old.capture.gesture, old.source.item_id
            );
        }

        let gesture = self.next_gesture;
        self.next_gesture = self.next_gesture.wrapping_add(1);
        debug!(
            "gesture {} pending on {} (pointer {})",
            gesture, source.item_id, input.pointer_id
        );
        self.gesture = Some(Gesture {
            phase: Phase::Pending,
            capture: PointerCapture {
                pointer_id: input.pointer_id,
                gesture,
            },
            offset: (input.x - source.rect.x, input.y - source.rect.y),
            latest: (input.x, input.y),
            source,
        });
        self.has_dragged = false;
        self.long_press.arm(now, self.config.long_press());
        true
    }

    /// Fire the long-press timer if it is due.  Returns the initial drag
    /// position when the gesture switched to dragging.
    pub fn tick(&mut self, now: Instant) -> Option<DragPosition> {
        if !self.long_press.fire(now) {
            return None;
        }
        let gesture = self.gesture.as_mut()?;
        if gesture.phase != Phase::Pending {
            return None;
        }
        gesture.phase = Phase::Dragging;
        debug!("gesture {} dragging after long press", gesture.capture.gesture);
        Some(gesture.position())
    }

    /// Track the pointer.  Returns the tile's live position while dragging.
    pub fn pointer_move(&mut self, input: &PointerInput, now: Instant) -> Option<DragPosition> {
        self.tick(now);
        let threshold = self.config.drag_threshold_px;
        let gesture = self.captured(input.pointer_id)?;
        gesture.latest = (input.x, input.y);
        let exceeded = gesture.exceeds(threshold);

        match gesture.phase {
            Phase::Pending if exceeded => {
                gesture.phase = Phase::Dragging;
                debug!(
                    "gesture {} dragging after leaving the slop",
                    gesture.capture.gesture
                );
            }
            Phase::Pending => return None,
            Phase::Dragging => {}
        }
        let position = gesture.position();
        if exceeded {
            self.long_press.cancel();
            self.has_dragged = true;
        }
        Some(position)
    }

    /// Finish the gesture owned by `input.pointer_id`.
    pub fn pointer_up(&mut self, input: &PointerInput, now: Instant) -> GestureOutcome {
        self.tick(now);
        let threshold = self.config.drag_threshold_px;
        if self.captured(input.pointer_id).is_none() {
            return GestureOutcome::Ignored;
        }
        let Some(mut gesture) = self.gesture.take() else {
            return GestureOutcome::Ignored;
        };
        self.long_press.cancel();
        gesture.latest = (input.x, input.y);

        match gesture.phase {
            Phase::Pending => {
                debug!("gesture {} resolved to a click", gesture.capture.gesture);
                GestureOutcome::Click {
                    item_id: gesture.source.item_id,
                }
            }
            Phase::Dragging => {
                if gesture.exceeds(threshold) {
                    self.has_dragged = true;
                }
                let position = gesture.position();
                debug!(
                    "gesture {} dropped {} at ({:.1}, {:.1})",
                    gesture.capture.gesture, position.item_id, position.x, position.y
                );
                GestureOutcome::Drop(Dropped {
                    item_id: position.item_id,
                    width: position.width,
                    height: position.height,
                    x: position.x,
                    y: position.y,
                    initial_x: gesture.source.rect.x,
                    initial_y: gesture.source.rect.y,
                    has_dragged: self.has_dragged,
                })
            }
        }
    }

    /// The host took the pointer away (e.g. a system gesture).  Ends the
    /// gesture without a drop.  Returns whether a gesture was cancelled.
    pub fn pointer_cancel(&mut self, input: &PointerInput, now: Instant) -> bool {
        self.tick(now);
        if self.captured(input.pointer_id).is_none() {
            return false;
        }
        self.cancel();
        true
    }

    /// Drop any gesture in flight and its timer.
    pub fn cancel(&mut self) {
        self.long_press.cancel();
        if let Some(gesture) = self.gesture.take() {
            debug!("gesture {} cancelled", gesture.capture.gesture);
        }
    }

    /// Whether the most recent gesture moved past the drag threshold.
    /// Reset on every pointer-down.
    pub fn has_dragged(&self) -> bool {
        self.has_dragged
    }

    pub fn is_dragging(&self) -> bool {
        self.gesture
            .as_ref()
            .is_some_and(|g| g.phase == Phase::Dragging)
    }

    pub fn is_pending(&self) -> bool {
        self.gesture
            .as_ref()
            .is_some_and(|g| g.phase == Phase::Pending)
    }

    pub fn captured_pointer(&self) -> Option<PointerCapture> {
        self.gesture.as_ref().map(|g| g.capture)
    }

    /// Id of the tile being pressed or dragged.
    pub fn active_item(&self) -> Option<&str> {
        self.gesture.as_ref().map(|g| g.source.item_id.as_str())
    }

    /// Next instant at which [`tick`](Self::tick) has work to do.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.long_press.deadline()
    }

    fn captured(&mut self, pointer_id: u32) -> Option<&mut Gesture> {
        match self.gesture.as_mut() {
            Some(g) if g.capture.pointer_id == pointer_id => Some(g),
            Some(g) => {
                debug!(
                    "stale event for pointer {} (gesture {} owns pointer {})",
                    pointer_id, g.capture.gesture, g.capture.pointer_id
                );
                None
            }
            None => {
                debug!("stale event for pointer {} (no gesture)", pointer_id);
                None
            }
        }
    }
}

//  Tests
