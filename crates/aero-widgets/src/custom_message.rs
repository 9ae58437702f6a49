#![forbid(unsafe_code)]

//! Free-text banner at the top of the overlay.

use aero_core::{Component, State, StateExt, Widget, escape, state};

use crate::{PLACEHOLDER, VISIBLE_CLASS};

const STYLES: &str = "\
:host { display: block; position: absolute; top: 40px; left: 50%; transform: translateX(-50%) translateY(-100%); opacity: 0; transition: all 0.5s ease; max-width: 80%; }
:host(.visible) { opacity: 1; transform: translateX(-50%) translateY(0); }
.custom-message { background: linear-gradient(135deg, rgba(255, 170, 0, 0.95), rgba(255, 136, 0, 0.95)); border-radius: 10px; padding: 15px 30px; box-shadow: 0 8px 32px rgba(0, 0, 0, 0.4); border: 2px solid rgba(255, 255, 255, 0.3); }
.custom-message-text { font-size: 24px; font-weight: bold; color: white; text-shadow: 2px 2px 4px rgba(0, 0, 0, 0.5); text-align: center; }
";

pub struct CustomMessageView;

impl Widget for CustomMessageView {
    fn tag(&self) -> &'static str {
        "custom-message"
    }

    fn initial_state(&self) -> State {
        state! { "visible" => false, "message" => "" }
    }

    fn template(&self, state: &State) -> String {
        match state.get_str("message") {
            Some(message) if !message.is_empty() => format!(
                r#"<div class="custom-message"><div class="custom-message-text">{}</div></div>"#,
                escape(message)
            ),
            _ => PLACEHOLDER.to_string(),
        }
    }

    fn styles(&self) -> &str {
        STYLES
    }

    fn observed_attributes(&self) -> &[&'static str] {
        &["visible", "message"]
    }

    fn attribute_changed(&self, name: &str, _old: Option<&str>, new: Option<&str>) -> Option<State> {
        match name {
            "visible" => Some(state! { "visible" => new.is_some() }),
            "message" => Some(state! { "message" => new.unwrap_or_default() }),
            _ => None,
        }
    }
}

pub struct CustomMessage {
    component: Component<CustomMessageView>,
}

impl Default for CustomMessage {
    fn default() -> Self {
        Self::new()
    }
}

impl CustomMessage {
    #[must_use]
    pub fn new() -> Self {
        Self {
            component: Component::new(CustomMessageView),
        }
    }

    pub fn show(&mut self, message: Option<&str>) {
        self.component.set_state(state! {
            "visible" => true,
            "message" => message.unwrap_or_default(),
        });
        self.component.add_class(VISIBLE_CLASS);
    }

    pub fn hide(&mut self) {
        self.component.set_state(state! { "visible" => false });
        self.component.remove_class(VISIBLE_CLASS);
    }

    pub fn update_message(&mut self, message: Option<&str>) {
        self.component
            .set_state(state! { "message" => message.unwrap_or_default() });
    }

    #[must_use]
    pub fn message(&self) -> String {
        self.component
            .get_state()
            .get_str("message")
            .unwrap_or_default()
            .to_string()
    }

    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.component.has_class(VISIBLE_CLASS)
    }

    #[must_use]
    pub fn component(&self) -> &Component<CustomMessageView> {
        &self.component
    }

    pub fn component_mut(&mut self) -> &mut Component<CustomMessageView> {
        &mut self.component
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_message_is_placeholder() {
        let mut banner = CustomMessage::new();
        assert_eq!(banner.component().root().markup(), PLACEHOLDER);
        banner.show(None);
        assert!(banner.is_visible());
        assert_eq!(banner.component().root().markup(), PLACEHOLDER);
    }

    #[test]
    fn show_update_hide() {
        let mut banner = CustomMessage::new();
        banner.show(Some("Próxima bateria em 5 minutos"));
        assert!(
            banner
                .component()
                .root()
                .markup()
                .contains("Próxima bateria em 5 minutos")
        );
        banner.update_message(Some("Intervalo"));
        assert_eq!(banner.message(), "Intervalo");
        banner.hide();
        assert!(!banner.is_visible());
    }

    #[test]
    fn attributes_reflect_into_state() {
        let mut banner = CustomMessage::new();
        banner.component_mut().set_attribute("message", Some("Ao vivo"));
        assert_eq!(banner.message(), "Ao vivo");
        banner.component_mut().set_attribute("visible", Some(""));
        assert_eq!(banner.component().get("visible"), Some(serde_json::json!(true)));
        banner.component_mut().set_attribute("message", None);
        assert_eq!(banner.component().root().markup(), PLACEHOLDER);
    }
}
