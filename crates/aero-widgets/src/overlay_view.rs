#![forbid(unsafe_code)]

//! The broadcast overlay: team card, results panel and message banner,
//! reconciled from `state-updated` broadcasts.
//!
//! While attached, the view holds one managed window listener for
//! `state-updated`. Each payload is decoded as an [`OverlayState`] and
//! applied to the three children:
//!
//! - hidden overlay: every child hidden;
//! - team card shown when a team is embedded and `show_team_info` is set,
//!   with the battery line following `show_current_battery`;
//! - results shown when `show_flight_results` is set and results exist;
//! - banner shown when the custom message is non-empty.
//!
//! Payloads that fail to decode are ignored.

use std::cell::{Ref, RefCell};
use std::rc::{Rc, Weak};

use aero_core::event::names;
use aero_core::{Component, Event, EventChannel, Mount, NodeId, State, Target, Widget};
use aero_sync::OverlayState;
use tracing::{debug, warn};

use crate::{CustomMessage, FlightResults, TeamInfoCard};

const STYLES: &str = "\
:host { display: block; position: fixed; inset: 0; pointer-events: none; }
.overlay-container { position: relative; width: 100%; height: 100%; }
";

#[derive(Default)]
pub struct OverlayParts {
    pub team_info: TeamInfoCard,
    pub results: FlightResults,
    pub message: CustomMessage,
    last: Option<OverlayState>,
    applied: u64,
}

impl OverlayParts {
    fn apply(&mut self, state: &OverlayState) {
        if state.visible {
            match &state.team {
                Some(team) if state.show_team_info => {
                    self.team_info.show(team, state.show_current_battery);
                }
                _ => self.team_info.hide(),
            }
            match state.results() {
                Some(results) if state.show_flight_results => self.results.show(results),
                _ => self.results.hide(),
            }
            match state.custom_message.as_deref().filter(|m| !m.is_empty()) {
                Some(message) => self.message.show(Some(message)),
                None => self.message.hide(),
            }
        } else {
            self.team_info.hide();
            self.results.hide();
            self.message.hide();
        }
        self.last = Some(state.clone());
        self.applied += 1;
        debug!(
            visible = state.visible,
            team = state.active_team_id().unwrap_or("-"),
            "overlay reconciled"
        );
    }

    /// Last state applied.
    #[must_use]
    pub fn last_state(&self) -> Option<&OverlayState> {
        self.last.as_ref()
    }

    /// Number of states applied.
    #[must_use]
    pub fn applied(&self) -> u64 {
        self.applied
    }
}

pub struct OverlayRootView {
    parts: Weak<RefCell<OverlayParts>>,
}

impl Widget for OverlayRootView {
    fn tag(&self) -> &'static str {
        "aero-overlay"
    }

    fn template(&self, _state: &State) -> String {
        r#"<div class="overlay-container"></div>"#.to_string()
    }

    fn styles(&self) -> &str {
        STYLES
    }

    fn connected(&mut self, mount: &mut Mount<'_>) {
        let parts = self.parts.clone();
        mount.listen(Target::Window, names::STATE_UPDATED, move |event: &Event| {
            let Some(parts) = parts.upgrade() else {
                return;
            };
            match serde_json::from_value::<OverlayState>(event.detail.clone()) {
                Ok(state) => parts.borrow_mut().apply(&state),
                Err(err) => warn!(error = %err, "ignoring malformed overlay state"),
            }
        });
    }
}

pub struct OverlayView {
    component: Component<OverlayRootView>,
    parts: Rc<RefCell<OverlayParts>>,
}

impl Default for OverlayView {
    fn default() -> Self {
        Self::new()
    }
}

impl OverlayView {
    #[must_use]
    pub fn new() -> Self {
        let parts = Rc::new(RefCell::new(OverlayParts::default()));
        Self {
            component: Component::new(OverlayRootView {
                parts: Rc::downgrade(&parts),
            }),
            parts,
        }
    }

    /// Attach the view and its children; starts listening for broadcasts.
    pub fn attach(&mut self, channel: &EventChannel, parent: Option<NodeId>) -> NodeId {
        let host = self.component.attach(channel, parent);
        let subtree = self.component.subtree();
        let mut parts = self.parts.borrow_mut();
        parts.team_info.component_mut().attach(channel, subtree);
        parts.results.component_mut().attach(channel, subtree);
        parts.message.component_mut().attach(channel, subtree);
        host
    }

    /// Detach the children and the view; stops listening.
    pub fn detach(&mut self) {
        {
            let mut parts = self.parts.borrow_mut();
            parts.team_info.component_mut().detach();
            parts.results.component_mut().detach();
            parts.message.component_mut().detach();
        }
        self.component.detach();
    }

    /// Apply `state` directly, as a broadcast would.
    pub fn apply(&self, state: &OverlayState) {
        self.parts.borrow_mut().apply(state);
    }

    #[must_use]
    pub fn parts(&self) -> Ref<'_, OverlayParts> {
        self.parts.borrow()
    }

    #[must_use]
    pub fn component(&self) -> &Component<OverlayRootView> {
        &self.component
    }
}
