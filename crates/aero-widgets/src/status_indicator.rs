#![forbid(unsafe_code)]

//! Overlay on/off indicator for the control panel.

use aero_core::{Component, State, StateExt, Widget, escape, state};
use aero_sync::Team;

const STYLES: &str = "\
:host { display: block; }
.current-status { background: #f8f9fa; padding: 15px; border-radius: 8px; }
.current-status h3 { color: #333; margin-bottom: 10px; display: flex; align-items: center; }
.current-status p { color: #666; margin: 0; }
.status-indicator { display: inline-block; width: 12px; height: 12px; border-radius: 50%; margin-right: 8px; }
.status-indicator.active { background: #00cc66; animation: pulse 2s infinite; }
.status-indicator.inactive { background: #ff4757; }
@keyframes pulse { 0%, 100% { opacity: 1; } 50% { opacity: 0.5; } }
";

pub const LOADING_TEXT: &str = "Carregando...";
pub const VISIBLE_TEXT: &str = "Overlay Visível";
pub const HIDDEN_TEXT: &str = "Overlay Oculto";
pub const NO_TEAM_TEXT: &str = "Nenhuma equipe selecionada";

pub struct StatusIndicatorView;

impl Widget for StatusIndicatorView {
    fn tag(&self) -> &'static str {
        "status-indicator"
    }

    fn initial_state(&self) -> State {
        state! {
            "active" => false,
            "statusText" => LOADING_TEXT,
            "teamInfo" => NO_TEAM_TEXT,
        }
    }

    fn template(&self, state: &State) -> String {
        let dot = if state.is_truthy("active") { "active" } else { "inactive" };
        format!(
            r#"<div class="current-status"><h3><span class="status-indicator {dot}"></span><span>{}</span></h3><p>{}</p></div>"#,
            escape(state.get_str("statusText").unwrap_or(LOADING_TEXT)),
            escape(state.get_str("teamInfo").unwrap_or(NO_TEAM_TEXT)),
        )
    }

    fn styles(&self) -> &str {
        STYLES
    }

    fn observed_attributes(&self) -> &[&'static str] {
        &["active"]
    }

    fn attribute_changed(&self, _name: &str, _old: Option<&str>, new: Option<&str>) -> Option<State> {
        Some(state! { "active" => new.is_some() })
    }
}

pub struct StatusIndicator {
    component: Component<StatusIndicatorView>,
}

impl Default for StatusIndicator {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusIndicator {
    #[must_use]
    pub fn new() -> Self {
        Self {
            component: Component::new(StatusIndicatorView),
        }
    }

    pub fn update_status(&mut self, visible: bool, team: Option<&Team>) {
        let status_text = if visible { VISIBLE_TEXT } else { HIDDEN_TEXT };
        let team_info = match team {
            Some(team) => format!("Equipe: {} (Bateria {})", team.name, team.current_battery),
            None => NO_TEAM_TEXT.to_string(),
        };
        self.component.set_state(state! {
            "active" => visible,
            "statusText" => status_text,
            "teamInfo" => team_info,
        });
    }

    /// One-line summary (`status | team`), for terminal output.
    #[must_use]
    pub fn summary(&self) -> String {
        let state = self.component.get_state();
        format!(
            "{} | {}",
            state.get_str("statusText").unwrap_or(LOADING_TEXT),
            state.get_str("teamInfo").unwrap_or(NO_TEAM_TEXT)
        )
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.component.get_state().is_truthy("active")
    }

    #[must_use]
    pub fn component(&self) -> &Component<StatusIndicatorView> {
        &self.component
    }

    pub fn component_mut(&mut self) -> &mut Component<StatusIndicatorView> {
        &mut self.component
    }
}
