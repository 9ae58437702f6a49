#![forbid(unsafe_code)]

//! Transient success/error toast.
//!
//! Auto-hide is driven by the caller's clock: `show_at` records a deadline
//! and `tick` hides the toast once the deadline has passed. A new `show`
//! replaces any pending deadline.

use std::fmt;
use std::time::Duration;

use aero_core::{Component, State, StateExt, Widget, escape, state};
use web_time::Instant;

pub const DEFAULT_DURATION: Duration = Duration::from_millis(3000);

const STYLES: &str = "\
:host { display: block; }
.notification { position: fixed; top: 20px; right: 20px; padding: 15px 20px; border-radius: 8px; color: white; font-weight: 600; box-shadow: 0 4px 12px rgba(0, 0, 0, 0.2); opacity: 0; transform: translateX(100%); transition: all 0.3s; z-index: 1000; min-width: 200px; }
.notification.visible { opacity: 1; transform: translateX(0); }
.notification.success { background: #00cc66; }
.notification.error { background: #ff4757; }
";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToastKind {
    #[default]
    Success,
    Error,
}

impl ToastKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for ToastKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub struct NotificationToastView;

impl Widget for NotificationToastView {
    fn tag(&self) -> &'static str {
        "notification-toast"
    }

    fn initial_state(&self) -> State {
        state! { "visible" => false, "message" => "", "type" => ToastKind::Success.as_str() }
    }

    fn template(&self, state: &State) -> String {
        let kind = state.get_str("type").unwrap_or(ToastKind::Success.as_str());
        let visible = if state.is_truthy("visible") { " visible" } else { "" };
        format!(
            r#"<div class="notification {}{visible}">{}</div>"#,
            escape(kind),
            escape(state.get_str("message").unwrap_or_default()),
        )
    }

    fn styles(&self) -> &str {
        STYLES
    }
}

pub struct NotificationToast {
    component: Component<NotificationToastView>,
    hide_at: Option<Instant>,
}

impl Default for NotificationToast {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationToast {
    #[must_use]
    pub fn new() -> Self {
        Self {
            component: Component::new(NotificationToastView),
            hide_at: None,
        }
    }

    /// Show `message` now, hiding after `duration`.
    pub fn show(&mut self, message: &str, kind: ToastKind, duration: Duration) {
        self.show_at(message, kind, duration, Instant::now());
    }

    /// Show `message` as of `now`, hiding after `duration`.
    pub fn show_at(&mut self, message: &str, kind: ToastKind, duration: Duration, now: Instant) {
        self.hide_at = Some(now + duration);
        self.component.set_state(state! {
            "visible" => true,
            "message" => message,
            "type" => kind.as_str(),
        });
    }

    pub fn hide(&mut self) {
        self.hide_at = None;
        self.component.set_state(state! { "visible" => false });
    }

    /// Hide if the pending deadline has passed. Returns whether it hid.
    pub fn tick(&mut self, now: Instant) -> bool {
        match self.hide_at {
            Some(deadline) if now >= deadline => {
                self.hide();
                true
            }
            _ => false,
        }
    }

    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.component.get_state().is_truthy("visible")
    }

    /// Text of the current (or last) notification.
    #[must_use]
    pub fn message(&self) -> String {
        self.component
            .get_state()
            .get_str("message")
            .unwrap_or_default()
            .to_string()
    }

    #[must_use]
    pub fn hide_at(&self) -> Option<Instant> {
        self.hide_at
    }

    #[must_use]
    pub fn component(&self) -> &Component<NotificationToastView> {
        &self.component
    }

    pub fn component_mut(&mut self) -> &mut Component<NotificationToastView> {
        &mut self.component
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hidden_until_shown() {
        let toast = NotificationToast::new();
        assert!(!toast.is_visible());
        assert_eq!(
            toast.component().root().markup(),
            r#"<div class="notification success"></div>"#
        );
    }

    #[test]
    fn auto_hides_after_duration() {
        let mut toast = NotificationToast::new();
        let t0 = Instant::now();
        toast.show_at("Overlay exibido", ToastKind::Success, DEFAULT_DURATION, t0);
        assert!(toast.is_visible());
        assert!(toast.component().root().query(".notification.visible").is_some());

        assert!(!toast.tick(t0 + Duration::from_millis(2999)));
        assert!(toast.is_visible());
        assert!(toast.tick(t0 + DEFAULT_DURATION));
        assert!(!toast.is_visible());
        assert!(!toast.tick(t0 + Duration::from_secs(10)));
    }

    #[test]
    fn new_show_replaces_pending_hide() {
        let mut toast = NotificationToast::new();
        let t0 = Instant::now();
        toast.show_at("first", ToastKind::Success, DEFAULT_DURATION, t0);
        let t1 = t0 + Duration::from_millis(2000);
        toast.show_at("Falha ao conectar", ToastKind::Error, DEFAULT_DURATION, t1);

        assert!(!toast.tick(t0 + DEFAULT_DURATION));
        assert!(toast.is_visible());
        assert!(toast.component().root().query(".notification.error").is_some());
        assert!(toast.tick(t1 + DEFAULT_DURATION));
    }

    #[test]
    fn manual_hide_clears_deadline() {
        let mut toast = NotificationToast::new();
        toast.show("ok", ToastKind::Success, DEFAULT_DURATION);
        toast.hide();
        assert_eq!(toast.hide_at(), None);
        assert!(!toast.is_visible());
    }
}
