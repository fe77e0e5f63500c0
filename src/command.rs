//! Host events and the types they carry.
//!
//! This module defines the vocabulary shared by the transport and the
//! launcher: [`HostEvent`] describes everything a host shell can tell the
//! engine, and [`Viewport`] / [`PointerButton`] are its supporting types.
//!
//! Events use serde's externally tagged encoding, one JSON value per line:
//!
//! ```json
//! {"Mount": {"width": 1388, "height": 800}}
//! {"Apps": ["app-nextcloud", "app-jellyfin"]}
//! {"PointerDown": {"pointer": {"pointer_id": 1, "x": 150, "y": 40}, "item_id": "app-nextcloud"}}
//! {"Advance": {"ms": 250}}
//! "Teardown"
//! ```
//!
//! Pointer buttons accept names (`"primary"`, `"right"`, …) or the DOM
//! numeric codes (`0`, `1`, `2`).

use crate::drag::PointerInput;
use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Which pointer button triggered an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PointerButton {
    #[default]
    Primary,
    Secondary,
    Middle,
}

impl fmt::Display for PointerButton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PointerButton::Primary => write!(f, "primary"),
            PointerButton::Secondary => write!(f, "secondary"),
            PointerButton::Middle => write!(f, "middle"),
        }
    }
}

/// Parse a button name (case-insensitive; accepts "primary", "left", "Right", "aux", ...).
fn parse_button(s: &str) -> Option<PointerButton> {
    let normalized: String = s
        .trim()
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
        .flat_map(|c| c.to_lowercase())
        .collect();
    match normalized.as_str() {
        "primary" | "left" | "0" => Some(PointerButton::Primary),
        "middle" | "auxiliary" | "aux" | "1" => Some(PointerButton::Middle),
        "secondary" | "right" | "2" => Some(PointerButton::Secondary),
        _ => None,
    }
}

impl<'de> Deserialize<'de> for PointerButton {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::Visitor;
        struct V;
        impl<'de> Visitor<'de> for V {
            type Value = PointerButton;
            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "button name or DOM button code")
            }
            fn visit_u64<E>(self, n: u64) -> Result<PointerButton, E>
            where
                E: DeError,
            {
                parse_button(&n.to_string())
                    .ok_or_else(|| DeError::custom(format!("invalid button code: {}", n)))
            }
            fn visit_i64<E>(self, n: i64) -> Result<PointerButton, E>
            where
                E: DeError,
            {
                parse_button(&n.to_string())
                    .ok_or_else(|| DeError::custom(format!("invalid button code: {}", n)))
            }
            fn visit_str<E>(self, s: &str) -> Result<PointerButton, E>
            where
                E: DeError,
            {
                parse_button(s).ok_or_else(|| DeError::custom(format!("invalid button: {:?}", s)))
            }
        }
        deserializer.deserialize_any(V)
    }
}

/// Size of the launcher surface and where the grid sits on screen.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Viewport {
    /// Surface width in pixels.
    pub width: f64,
    /// Surface height in pixels.
    pub height: f64,
    /// Screen x of the grid's top-left corner.
    #[serde(default)]
    pub grid_left: f64,
    /// Screen y of the grid's top-left corner.
    #[serde(default)]
    pub grid_top: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            grid_left: 0.0,
            grid_top: 0.0,
        }
    }
}

/// Everything a host shell can tell the launcher.
///
/// Events are produced by [`EventSource`](crate::traits::EventSource)
/// implementations and dispatched to the
/// [`Launcher`](crate::launcher::Launcher) by the host loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum HostEvent {
    /// The launcher became visible with the given viewport.
    Mount(Viewport),

    /// The viewport changed size.  Debounced before it takes effect.
    Resize(Viewport),

    /// The full list of installed app ids, replacing the previous one.
    Apps(Vec<String>),

    /// Add a widget of the given type (e.g. `"cpu-ram"`).
    AddWidget(String),

    /// Remove the widget with the given id.
    RemoveWidget { id: String },

    /// Pointer pressed on a tile.
    ///
    /// `on_control` marks presses on an interactive control inside the
    /// tile (context menu, remove button), which never start a drag.
    PointerDown {
        pointer: PointerInput,
        item_id: String,
        #[serde(default)]
        on_control: bool,
    },

    PointerMove(PointerInput),

    PointerUp(PointerInput),

    /// The host took the pointer away mid-gesture.
    PointerCancel(PointerInput),

    /// Advance the clock by `ms` milliseconds and fire due timers.
    ///
    /// Replay scripts use this to drive time deterministically.
    Advance { ms: u64 },

    /// The launcher is going away.  Cancels every timer and gesture.
    Teardown,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn button_display() {
        assert_eq!(PointerButton::Primary.to_string(), "primary");
        assert_eq!(PointerButton::Secondary.to_string(), "secondary");
        assert_eq!(PointerButton::Middle.to_string(), "middle");
    }

    #[test]
    fn parse_button_names() {
        assert_eq!(parse_button("left"), Some(PointerButton::Primary));
        assert_eq!(parse_button(" Right "), Some(PointerButton::Secondary));
        assert_eq!(parse_button("AUX"), Some(PointerButton::Middle));
        assert_eq!(parse_button("0"), Some(PointerButton::Primary));
        assert_eq!(parse_button("2"), Some(PointerButton::Secondary));
        assert_eq!(parse_button("thumb"), None);
    }

    #[test]
    fn button_deserializes_from_number_or_string() {
        let b: PointerButton = serde_json::from_str("2").unwrap();
        assert_eq!(b, PointerButton::Secondary);
        let b: PointerButton = serde_json::from_str("\"middle\"").unwrap();
        assert_eq!(b, PointerButton::Middle);
        assert!(serde_json::from_str::<PointerButton>("7").is_err());
    }

    #[test]
    fn mount_event_defaults_grid_origin() {
        let ev: HostEvent =
            serde_json::from_str(r#"{"Mount": {"width": 1388, "height": 800}}"#).unwrap();
        assert_eq!(ev, HostEvent::Mount(Viewport::new(1388.0, 800.0)));
    }

    #[test]
    fn pointer_down_event() {
        let json = r#"{"PointerDown": {
            "pointer": {"pointer_id": 3, "button": "left", "x": 150.5, "y": 40},
            "item_id": "app-a"
        }}"#;
        let ev: HostEvent = serde_json::from_str(json).unwrap();
        match ev {
            HostEvent::PointerDown {
                pointer,
                item_id,
                on_control,
            } => {
                assert_eq!(pointer.pointer_id, 3);
                assert_eq!(pointer.button, PointerButton::Primary);
                assert_eq!(pointer.x, 150.5);
                assert_eq!(item_id, "app-a");
                assert!(!on_control);
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn pointer_button_defaults_to_primary() {
        let ev: HostEvent =
            serde_json::from_str(r#"{"PointerUp": {"pointer_id": 1, "x": 0, "y": 0}}"#).unwrap();
        assert_eq!(ev, HostEvent::PointerUp(PointerInput::primary(1, 0.0, 0.0)));
    }

    #[test]
    fn unit_and_struct_events() {
        let ev: HostEvent = serde_json::from_str("\"Teardown\"").unwrap();
        assert_eq!(ev, HostEvent::Teardown);
        let ev: HostEvent = serde_json::from_str(r#"{"Advance": {"ms": 250}}"#).unwrap();
        assert_eq!(ev, HostEvent::Advance { ms: 250 });
        let ev: HostEvent = serde_json::from_str(r#"{"AddWidget": "cpu-ram"}"#).unwrap();
        assert_eq!(ev, HostEvent::AddWidget("cpu-ram".into()));
    }

    #[test]
    fn unknown_event_is_an_error() {
        assert!(serde_json::from_str::<HostEvent>(r#"{"Explode": 1}"#).is_err());
    }
}
