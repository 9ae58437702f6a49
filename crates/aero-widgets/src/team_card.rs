#![forbid(unsafe_code)]

//! Selectable team summary for the control panel.
//!
//! Clicking the card emits `team-selected` with `{"teamId": <id>}`.

use aero_core::event::names;
use aero_core::{Component, Emitter, RenderRoot, State, StateExt, Widget, escape, state};
use aero_sync::Team;
use serde_json::json;

use crate::PLACEHOLDER;

const STYLES: &str = "\
:host { display: block; }
.team-card { background: #f8f9fa; border: 2px solid #e0e0e0; border-radius: 8px; padding: 15px; cursor: pointer; transition: all 0.3s; }
.team-card:hover { border-color: #667eea; transform: translateY(-2px); box-shadow: 0 4px 12px rgba(0, 0, 0, 0.1); }
.team-card.active { border-color: #00cc66; background: #e8f8f1; }
.team-card h3 { color: #333; margin-bottom: 5px; font-size: 18px; }
.team-card p { color: #666; font-size: 13px; margin-bottom: 8px; }
.team-card .battery { display: inline-block; background: #667eea; color: white; padding: 4px 12px; border-radius: 12px; font-size: 12px; font-weight: 600; }
";

pub struct TeamCardView;

impl Widget for TeamCardView {
    fn tag(&self) -> &'static str {
        "team-card"
    }

    fn initial_state(&self) -> State {
        state! { "teamData" => serde_json::Value::Null, "active" => false }
    }

    fn template(&self, state: &State) -> String {
        let Some(team) = state.get_as::<Team>("teamData") else {
            return PLACEHOLDER.to_string();
        };
        let active = if state.is_truthy("active") { " active" } else { "" };
        format!(
            r#"<div class="team-card{active}"><h3>{}</h3><p>{}</p><span class="battery">Bateria {}</span></div>"#,
            escape(&team.name),
            escape(&team.university),
            team.current_battery,
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

    fn after_render(&self, state: &State, root: &mut RenderRoot, emitter: &Emitter) {
        let Some(id) = state
            .get("teamData")
            .and_then(|team| team.get("id"))
            .and_then(|id| id.as_str())
        else {
            return;
        };
        let id = id.to_string();
        let emitter = emitter.clone();
        root.bind(".team-card", "click", move |_| {
            emitter.emit(names::TEAM_SELECTED, json!({ "teamId": id }));
        });
    }
}

pub struct TeamCard {
    component: Component<TeamCardView>,
}

impl Default for TeamCard {
    fn default() -> Self {
        Self::new()
    }
}

impl TeamCard {
    #[must_use]
    pub fn new() -> Self {
        Self {
            component: Component::new(TeamCardView),
        }
    }

    pub fn set_team(&mut self, team: &Team) {
        self.component.set_state(state! { "teamData" => team });
    }

    pub fn set_active(&mut self, active: bool) {
        self.component.set_state(state! { "active" => active });
    }

    /// Id of the team shown, if any.
    #[must_use]
    pub fn team_id(&self) -> Option<String> {
        self.component
            .get("teamData")
            .and_then(|team| team.get("id").and_then(|id| id.as_str().map(str::to_owned)))
    }

    #[must_use]
    pub fn component(&self) -> &Component<TeamCardView> {
        &self.component
    }

    pub fn component_mut(&mut self) -> &mut Component<TeamCardView> {
        &mut self.component
    }
}
