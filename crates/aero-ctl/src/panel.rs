//! Headless control panel.
//!
//! Mounts the control-panel widgets in one component tree and wires their
//! events to bridge commands:
//!
//! - `show-overlay` / `hide-overlay` / `toggle-overlay` from the buttons
//!   run the matching command (show uses the selected team);
//! - `team-selected` from a team card selects that team and highlights
//!   its card;
//! - `state-updated` from the sync host refreshes the status indicator.
//!
//! Command outcomes land in the status indicator and the toast. Commands
//! run as `spawn_local` tasks, so the panel must live inside a `LocalSet`.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use aero_core::event::names;
use aero_core::{Event, EventChannel, ListenerId, NodeId, Target};
use aero_sync::{OverlayState, SyncBridge, SyncHost, Team, Transport};
use aero_widgets::{ControlButtons, NotificationToast, StatusIndicator, TeamCard, ToastKind};
use tracing::{debug, warn};

use crate::error::Result;

const TOAST_DURATION: Duration = Duration::from_millis(3000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OverlayCommand {
    Show,
    Hide,
    Toggle,
}

impl OverlayCommand {
    fn success_text(self, state: &OverlayState) -> &'static str {
        match self {
            Self::Show => "Overlay exibido",
            Self::Hide => "Overlay ocultado",
            Self::Toggle if state.visible => "Overlay exibido",
            Self::Toggle => "Overlay ocultado",
        }
    }
}

/// Widgets shared with the event handlers.
#[derive(Default)]
struct Shared {
    status: StatusIndicator,
    toast: NotificationToast,
    cards: Vec<TeamCard>,
    selected: Option<String>,
    last_state: Option<OverlayState>,
    broadcasts: u64,
}

impl Shared {
    fn apply_state(&mut self, state: &OverlayState) {
        self.status.update_status(state.visible, state.team.as_ref());
        self.last_state = Some(state.clone());
    }

    fn select(&mut self, team_id: &str) {
        self.selected = Some(team_id.to_string());
        for card in &mut self.cards {
            let active = card.team_id().as_deref() == Some(team_id);
            card.set_active(active);
        }
    }
}

pub struct ControlPanel<T: Transport + 'static> {
    channel: EventChannel,
    root: NodeId,
    bridge: Rc<SyncBridge<T>>,
    host: SyncHost<T>,
    buttons: ControlButtons,
    shared: Rc<RefCell<Shared>>,
    listeners: Vec<(Target, ListenerId)>,
}

impl<T: Transport + 'static> ControlPanel<T> {
    /// Build and mount the panel. Polling starts when `auto_poll` is set.
    pub fn new(bridge: Rc<SyncBridge<T>>, auto_poll: bool) -> Self {
        let channel = EventChannel::new();
        let root = channel.create_node(None, "control-panel");

        let mut host = SyncHost::new(Rc::clone(&bridge));
        if auto_poll {
            host = host.with_auto_poll();
        }
        let mut buttons = ControlButtons::new();
        buttons.component_mut().attach(&channel, Some(root));

        let mut panel = Self {
            channel,
            root,
            bridge,
            host,
            buttons,
            shared: Rc::new(RefCell::new(Shared::default())),
            listeners: Vec::new(),
        };
        panel.wire();
        panel.host.attach(&panel.channel, Some(panel.root));
        panel
    }

    fn wire(&mut self) {
        for (event, command) in [
            (names::SHOW_OVERLAY, OverlayCommand::Show),
            (names::HIDE_OVERLAY, OverlayCommand::Hide),
            (names::TOGGLE_OVERLAY, OverlayCommand::Toggle),
        ] {
            let bridge = Rc::clone(&self.bridge);
            let shared = Rc::clone(&self.shared);
            self.listen(Target::Node(self.root), event, move |_| {
                spawn_command(Rc::clone(&bridge), Rc::clone(&shared), command);
            });
        }

        let shared = Rc::clone(&self.shared);
        self.listen(Target::Node(self.root), names::TEAM_SELECTED, move |event: &Event| {
            let Some(team_id) = event.detail.get("teamId").and_then(|id| id.as_str()) else {
                warn!(detail = %event.detail, "team-selected without teamId");
                return;
            };
            debug!(team_id, "team selected");
            shared.borrow_mut().select(team_id);
        });

        let shared = Rc::clone(&self.shared);
        self.listen(Target::Window, names::STATE_UPDATED, move |event: &Event| {
            match serde_json::from_value::<OverlayState>(event.detail.clone()) {
                Ok(state) => {
                    let mut shared = shared.borrow_mut();
                    shared.apply_state(&state);
                    shared.broadcasts += 1;
                }
                Err(err) => warn!(error = %err, "ignoring malformed overlay state"),
            }
        });
    }

    fn listen(&mut self, target: Target, event: &str, handler: impl Fn(&Event) + 'static) {
        if let Some(id) = self.channel.add_listener(target, event, handler) {
            self.listeners.push((target, id));
        }
    }

    /// Replace the team cards with one per team, keeping the selection.
    pub fn set_teams(&mut self, teams: &[Team]) {
        let mut shared = self.shared.borrow_mut();
        for card in &mut shared.cards {
            card.component_mut().detach();
        }
        shared.cards = teams
            .iter()
            .map(|team| {
                let mut card = TeamCard::new();
                card.set_team(team);
                card.component_mut().attach(&self.channel, Some(self.root));
                card
            })
            .collect();
        if let Some(selected) = shared.selected.clone() {
            shared.select(&selected);
        }
    }

    /// Load the team list from the backend.
    pub async fn load_teams(&mut self) -> Result<usize> {
        let teams = self.bridge.fetch_teams().await?;
        self.set_teams(&teams);
        Ok(teams.len())
    }

    /// Simulate a click on a control button (`.button-show`, ...).
    pub fn click_button(&self, selector: &str) -> usize {
        self.buttons.click(selector)
    }

    /// Simulate a click on the card of `team_id`.
    pub fn click_team(&self, team_id: &str) -> usize {
        let handlers = {
            let shared = self.shared.borrow();
            shared
                .cards
                .iter()
                .find(|card| card.team_id().as_deref() == Some(team_id))
                .map(|card| card.component().root().handlers_for(".team-card", "click"))
                .unwrap_or_default()
        };
        for (element, handler) in &handlers {
            handler(element);
        }
        handlers.len()
    }

    #[must_use]
    pub fn selected_team(&self) -> Option<String> {
        self.shared.borrow().selected.clone()
    }

    /// Ids of the cards currently highlighted.
    #[must_use]
    pub fn active_cards(&self) -> Vec<String> {
        self.shared
            .borrow()
            .cards
            .iter()
            .filter(|card| card.component().root().query(".team-card.active").is_some())
            .filter_map(TeamCard::team_id)
            .collect()
    }

    /// One-line status from the indicator.
    #[must_use]
    pub fn status_line(&self) -> String {
        self.shared.borrow().status.summary()
    }

    /// Toast text while the toast is visible.
    #[must_use]
    pub fn toast_message(&self) -> Option<String> {
        let shared = self.shared.borrow();
        shared
            .toast
            .is_visible()
            .then(|| shared.toast.message())
    }

    /// Advance the toast clock.
    pub fn tick(&self, now: web_time::Instant) -> bool {
        self.shared.borrow_mut().toast.tick(now)
    }

    /// Last overlay state seen (broadcast or command reply).
    #[must_use]
    pub fn last_state(&self) -> Option<OverlayState> {
        self.shared.borrow().last_state.clone()
    }

    /// `state-updated` broadcasts received.
    #[must_use]
    pub fn broadcasts(&self) -> u64 {
        self.shared.borrow().broadcasts
    }

    #[must_use]
    pub fn host(&self) -> &SyncHost<T> {
        &self.host
    }

    #[must_use]
    pub fn channel(&self) -> &EventChannel {
        &self.channel
    }

    /// Unmount everything: stops polling and releases all listeners.
    pub fn close(&mut self) {
        self.host.detach();
        self.buttons.component_mut().detach();
        for card in &mut self.shared.borrow_mut().cards {
            card.component_mut().detach();
        }
        for (target, id) in self.listeners.drain(..) {
            self.channel.remove_listener(target, id);
        }
    }
}

impl<T: Transport + 'static> Drop for ControlPanel<T> {
    fn drop(&mut self) {
        self.close();
    }
}

fn spawn_command<T: Transport + 'static>(
    bridge: Rc<SyncBridge<T>>,
    shared: Rc<RefCell<Shared>>,
    command: OverlayCommand,
) {
    let selected = shared.borrow().selected.clone();
    tokio::task::spawn_local(async move {
        let outcome = match command {
            OverlayCommand::Show => bridge.show_overlay(selected.as_deref()).await,
            OverlayCommand::Hide => bridge.hide_overlay().await,
            OverlayCommand::Toggle => bridge.toggle_overlay().await,
        };
        let mut shared = shared.borrow_mut();
        match outcome {
            Ok(state) => {
                let text = command.success_text(&state);
                shared.apply_state(&state);
                shared.toast.show(text, ToastKind::Success, TOAST_DURATION);
            }
            Err(err) => {
                warn!(?command, error = %err, "overlay command failed");
                shared
                    .toast
                    .show(&format!("Erro: {err}"), ToastKind::Error, TOAST_DURATION);
            }
        }
    });
}
