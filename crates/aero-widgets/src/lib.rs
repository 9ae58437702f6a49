#![forbid(unsafe_code)]

//! Widgets for the operator control panel and the broadcast overlay.
//!
//! Each widget wraps a [`Component`](aero_core::Component) around a view
//! type implementing [`Widget`](aero_core::Widget) and exposes imperative
//! entry points (`show`, `hide`, `update_*`) that translate into partial
//! state updates. UI text is Portuguese, as shown on air.

pub mod control_buttons;
pub mod custom_message;
pub mod flight_results;
pub mod notification_toast;
pub mod overlay_view;
pub mod status_indicator;
pub mod team_card;
pub mod team_info_card;

pub use control_buttons::ControlButtons;
pub use custom_message::CustomMessage;
pub use flight_results::FlightResults;
pub use notification_toast::{NotificationToast, ToastKind};
pub use overlay_view::OverlayView;
pub use status_indicator::StatusIndicator;
pub use team_card::TeamCard;
pub use team_info_card::TeamInfoCard;

/// Markup rendered when a widget has nothing to show.
pub const PLACEHOLDER: &str = "<div></div>";

/// Class toggled on a widget's host element while it is shown.
pub const VISIBLE_CLASS: &str = "visible";
