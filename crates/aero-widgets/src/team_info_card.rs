#![forbid(unsafe_code)]

//! Lower-third card with the active team's photo, name and battery.

use aero_core::{Component, State, StateExt, Widget, escape, state};
use aero_sync::Team;

use crate::{PLACEHOLDER, VISIBLE_CLASS};

const STYLES: &str = "\
:host { display: block; position: absolute; bottom: 40px; left: 40px; opacity: 0; transform: translateX(-100%); transition: all 0.5s cubic-bezier(0.68, -0.55, 0.265, 1.55); }
:host(.visible) { opacity: 1; transform: translateX(0); }
.team-info-card { background: linear-gradient(135deg, rgba(0, 102, 204, 0.95), rgba(0, 51, 153, 0.95)); border-radius: 15px; padding: 25px; min-width: 450px; box-shadow: 0 8px 32px rgba(0, 0, 0, 0.4); border: 2px solid rgba(255, 255, 255, 0.2); }
.team-header { display: flex; align-items: center; gap: 20px; margin-bottom: 20px; }
.team-photo { width: 120px; height: 80px; border-radius: 8px; object-fit: cover; border: 2px solid rgba(255, 255, 255, 0.3); }
.team-details { flex: 1; }
.team-name { font-size: 28px; font-weight: bold; color: white; text-shadow: 2px 2px 4px rgba(0, 0, 0, 0.5); margin-bottom: 5px; }
.team-university { font-size: 16px; color: rgba(255, 255, 255, 0.9); font-weight: 500; }
.current-battery { background: rgba(255, 255, 255, 0.2); padding: 8px 15px; border-radius: 20px; display: inline-block; margin-top: 10px; }
.current-battery-label { font-size: 14px; color: rgba(255, 255, 255, 0.8); margin-right: 5px; }
.current-battery-number { font-size: 20px; font-weight: bold; color: white; }
";

pub struct TeamInfoCardView;

impl Widget for TeamInfoCardView {
    fn tag(&self) -> &'static str {
        "team-info-card"
    }

    fn initial_state(&self) -> State {
        state! {
            "visible" => false,
            "teamData" => serde_json::Value::Null,
            "showBattery" => true,
        }
    }

    fn template(&self, state: &State) -> String {
        let Some(team) = state.get_as::<Team>("teamData") else {
            return PLACEHOLDER.to_string();
        };
        let photo = team
            .aircraft_photo_url
            .as_deref()
            .filter(|url| !url.is_empty())
            .map(|url| format!(r#"<img src="{}" alt="Aircraft" class="team-photo">"#, escape(url)))
            .unwrap_or_default();
        let battery = if state.get_bool("showBattery").unwrap_or(true) {
            format!(
                r#"<div class="current-battery"><span class="current-battery-label">Bateria Atual:</span><span class="current-battery-number">{}</span></div>"#,
                team.current_battery
            )
        } else {
            String::new()
        };
        format!(
            r#"<div class="team-info-card"><div class="team-header">{photo}<div class="team-details"><div class="team-name">{}</div><div class="team-university">{}</div>{battery}</div></div></div>"#,
            escape(&team.name),
            escape(&team.university),
        )
    }

    fn styles(&self) -> &str {
        STYLES
    }

    fn observed_attributes(&self) -> &[&'static str] {
        &["visible"]
    }

    fn attribute_changed(&self, _name: &str, _old: Option<&str>, new: Option<&str>) -> Option<State> {
        Some(state! { "visible" => new.is_some() })
    }
}

pub struct TeamInfoCard {
    component: Component<TeamInfoCardView>,
}

impl Default for TeamInfoCard {
    fn default() -> Self {
        Self::new()
    }
}

impl TeamInfoCard {
    #[must_use]
    pub fn new() -> Self {
        Self {
            component: Component::new(TeamInfoCardView),
        }
    }

    pub fn show(&mut self, team: &Team, show_battery: bool) {
        self.component.set_state(state! {
            "visible" => true,
            "teamData" => team,
            "showBattery" => show_battery,
        });
        self.component.add_class(VISIBLE_CLASS);
    }

    pub fn hide(&mut self) {
        self.component.set_state(state! { "visible" => false });
        self.component.remove_class(VISIBLE_CLASS);
    }

    pub fn update_team(&mut self, team: &Team) {
        self.component.set_state(state! { "teamData" => team });
    }

    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.component.has_class(VISIBLE_CLASS)
    }

    #[must_use]
    pub fn component(&self) -> &Component<TeamInfoCardView> {
        &self.component
    }

    pub fn component_mut(&mut self) -> &mut Component<TeamInfoCardView> {
        &mut self.component
    }
}
