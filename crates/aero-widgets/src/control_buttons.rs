#![forbid(unsafe_code)]

//! Show / hide / toggle buttons. Stateless; each click emits the matching
//! overlay command event with a `null` detail.

use aero_core::event::names;
use aero_core::{Component, Emitter, RenderRoot, State, Widget};
use serde_json::Value;

const MARKUP: &str = concat!(
    r#"<div class="controls">"#,
    r#"<button class="button button-show">✅ Mostrar Overlay</button>"#,
    r#"<button class="button button-hide">❌ Esconder Overlay</button>"#,
    r#"<button class="button button-toggle">🔄 Alternar Overlay</button>"#,
    "</div>",
);

const STYLES: &str = "\
:host { display: block; }
.controls { display: grid; grid-template-columns: repeat(auto-fit, minmax(200px, 1fr)); gap: 15px; }
.button { padding: 12px 24px; border: none; border-radius: 6px; font-size: 16px; font-weight: 600; cursor: pointer; transition: all 0.3s; text-align: center; font-family: inherit; }
.button:hover { transform: translateY(-2px); box-shadow: 0 4px 12px rgba(0, 0, 0, 0.2); }
.button:active { transform: translateY(0); }
.button-show { background: #00cc66; color: white; }
.button-hide { background: #ff4757; color: white; }
.button-toggle { background: #ffa502; color: white; }
";

/// Button selector and the event it emits.
pub const BUTTONS: [(&str, &str); 3] = [
    (".button-show", names::SHOW_OVERLAY),
    (".button-hide", names::HIDE_OVERLAY),
    (".button-toggle", names::TOGGLE_OVERLAY),
];

pub struct ControlButtonsView;

impl Widget for ControlButtonsView {
    fn tag(&self) -> &'static str {
        "control-buttons"
    }

    fn template(&self, _state: &State) -> String {
        MARKUP.to_string()
    }

    fn styles(&self) -> &str {
        STYLES
    }

    fn after_render(&self, _state: &State, root: &mut RenderRoot, emitter: &Emitter) {
        for (selector, event) in BUTTONS {
            let emitter = emitter.clone();
            root.bind(selector, "click", move |_| {
                emitter.emit(event, Value::Null);
            });
        }
    }
}

pub struct ControlButtons {
    component: Component<ControlButtonsView>,
}

impl Default for ControlButtons {
    fn default() -> Self {
        Self::new()
    }
}

impl ControlButtons {
    #[must_use]
    pub fn new() -> Self {
        Self {
            component: Component::new(ControlButtonsView),
        }
    }

    /// Simulate a click on `selector`.
    pub fn click(&self, selector: &str) -> usize {
        self.component.trigger(selector, "click")
    }

    #[must_use]
    pub fn component(&self) -> &Component<ControlButtonsView> {
        &self.component
    }

    pub fn component_mut(&mut self) -> &mut Component<ControlButtonsView> {
        &mut self.component
    }
}
