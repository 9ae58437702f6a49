#![forbid(unsafe_code)]

//! Flight results panel.
//!
//! Items are rendered from raw state values so a result with an unknown
//! status still renders, with its raw status as the label.

use aero_core::{Component, State, Widget, escape, state};
use aero_sync::{FlightResult, FlightStatus};
use serde_json::Value;

use crate::VISIBLE_CLASS;

pub const EMPTY_RESULTS: &str = r#"<div class="no-results">Nenhum resultado disponível</div>"#;

const STYLES: &str = "\
:host { display: block; position: absolute; top: 50%; right: 40px; transform: translateY(-50%) translateX(100%); opacity: 0; transition: all 0.5s cubic-bezier(0.68, -0.55, 0.265, 1.55); transition-delay: 0.2s; }
:host(.visible) { opacity: 1; transform: translateY(-50%) translateX(0); }
.flight-results { background: rgba(0, 0, 0, 0.85); border-radius: 15px; padding: 20px; min-width: 400px; box-shadow: 0 8px 32px rgba(0, 0, 0, 0.4); border: 2px solid rgba(255, 255, 255, 0.1); }
.results-title { font-size: 20px; font-weight: bold; color: white; margin-bottom: 15px; text-transform: uppercase; letter-spacing: 1px; }
.result-item { display: flex; align-items: center; justify-content: space-between; padding: 12px 15px; margin-bottom: 10px; border-radius: 8px; background: rgba(255, 255, 255, 0.05); border-left: 4px solid; transition: all 0.3s; }
.result-item:last-child { margin-bottom: 0; }
.result-item.validated { border-left-color: #00cc66; }
.result-item.invalidated { border-left-color: #cc0000; }
.result-item.pending { border-left-color: #ffaa00; animation: pulse 2s infinite; }
.result-item.not_flown { border-left-color: #666666; }
@keyframes pulse { 0%, 100% { opacity: 1; } 50% { opacity: 0.6; } }
.result-battery { font-size: 16px; font-weight: bold; color: white; margin-right: 10px; }
.result-status { flex: 1; font-size: 14px; color: rgba(255, 255, 255, 0.9); }
.result-score { font-size: 20px; font-weight: bold; color: white; min-width: 60px; text-align: right; }
.no-results { color: rgba(255, 255, 255, 0.6); text-align: center; padding: 10px; }
";

fn render_item(item: &Value) -> String {
    let battery = item
        .get("battery_number")
        .and_then(Value::as_u64)
        .map_or_else(|| "-".to_string(), |n| n.to_string());
    let status = item.get("status").and_then(Value::as_str).unwrap_or_default();
    let label = status
        .parse::<FlightStatus>()
        .map_or(status, |known| known.label());
    let score = item
        .get("score")
        .and_then(Value::as_f64)
        .map_or_else(|| "-".to_string(), |score| format!("{score:.1}"));
    format!(
        r#"<div class="result-item {}"><span class="result-battery">Bateria {battery}</span><span class="result-status">{}</span><span class="result-score">{score}</span></div>"#,
        escape(status),
        escape(label),
    )
}

pub struct FlightResultsView;

impl Widget for FlightResultsView {
    fn tag(&self) -> &'static str {
        "flight-results"
    }

    fn initial_state(&self) -> State {
        state! { "visible" => false, "results" => Vec::<FlightResult>::new() }
    }

    fn template(&self, state: &State) -> String {
        let items = match state.get("results") {
            Some(Value::Array(items)) if !items.is_empty() => {
                items.iter().map(render_item).collect::<String>()
            }
            _ => EMPTY_RESULTS.to_string(),
        };
        format!(
            r#"<div class="flight-results"><div class="results-title">Resultados dos Voos</div><div class="results-container">{items}</div></div>"#
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

pub struct FlightResults {
    component: Component<FlightResultsView>,
}

impl Default for FlightResults {
    fn default() -> Self {
        Self::new()
    }
}

impl FlightResults {
    #[must_use]
    pub fn new() -> Self {
        Self {
            component: Component::new(FlightResultsView),
        }
    }

    pub fn show(&mut self, results: &[FlightResult]) {
        self.component.set_state(state! { "visible" => true, "results" => results });
        self.component.add_class(VISIBLE_CLASS);
    }

    pub fn hide(&mut self) {
        self.component.set_state(state! { "visible" => false });
        self.component.remove_class(VISIBLE_CLASS);
    }

    pub fn update_results(&mut self, results: &[FlightResult]) {
        self.component.set_state(state! { "results" => results });
    }

    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.component.has_class(VISIBLE_CLASS)
    }

    #[must_use]
    pub fn component(&self) -> &Component<FlightResultsView> {
        &self.component
    }

    pub fn component_mut(&mut self) -> &mut Component<FlightResultsView> {
        &mut self.component
    }
}
