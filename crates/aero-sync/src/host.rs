//! The sync host: an invisible component that owns the polling lifetime.
//!
//! Attaching it with the `auto-poll` attribute (or `auto_poll` set in the
//! config) starts polling; detaching stops the poll this host started.
//! Broadcasts are emitted from the host node, so they bubble to its
//! ancestors and reach window listeners.

use std::rc::Rc;

use aero_core::component::{Component, Mount, Widget};
use aero_core::event::{Emitter, EventChannel, NodeId};
use aero_core::state::State;

use crate::bridge::SyncBridge;
use crate::transport::Transport;

pub const AUTO_POLL_ATTRIBUTE: &str = "auto-poll";

pub struct SyncHostView<T> {
    bridge: Rc<SyncBridge<T>>,
    emitter: Emitter,
}

impl<T: Transport + 'static> Widget for SyncHostView<T> {
    fn tag(&self) -> &'static str {
        "sync-host"
    }

    fn template(&self, _state: &State) -> String {
        String::new()
    }

    fn connected(&mut self, mount: &mut Mount<'_>) {
        self.emitter = mount.emitter().clone();
        if self.bridge.config().auto_poll || mount.has_attribute(AUTO_POLL_ATTRIBUTE) {
            self.bridge.start_polling(self.emitter.clone());
        }
    }

    /// Stops the poll only when this host started it; a poll started
    /// elsewhere on the shared bridge keeps running.
    fn disconnected(&mut self) {
        self.bridge.stop_polling_from(&self.emitter);
    }
}

/// Component wrapper around a shared [`SyncBridge`].
pub struct SyncHost<T: Transport + 'static> {
    component: Component<SyncHostView<T>>,
}

impl<T: Transport + 'static> SyncHost<T> {
    #[must_use]
    pub fn new(bridge: Rc<SyncBridge<T>>) -> Self {
        Self {
            component: Component::new(SyncHostView {
                bridge,
                emitter: Emitter::inert(),
            }),
        }
    }

    /// Set the `auto-poll` attribute before attaching.
    #[must_use]
    pub fn with_auto_poll(mut self) -> Self {
        self.component.set_attribute(AUTO_POLL_ATTRIBUTE, Some(""));
        self
    }

    #[must_use]
    pub fn bridge(&self) -> &Rc<SyncBridge<T>> {
        &self.component.widget().bridge
    }

    #[must_use]
    pub fn component(&self) -> &Component<SyncHostView<T>> {
        &self.component
    }

    /// Insert into `channel` under `parent`. Must run inside a `LocalSet`
    /// when polling starts on attach.
    pub fn attach(&mut self, channel: &EventChannel, parent: Option<NodeId>) -> NodeId {
        self.component.attach(channel, parent)
    }

    /// Remove from the tree; stops polling.
    pub fn detach(&mut self) {
        self.component.detach();
    }

    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.component.is_attached()
    }

    /// Start polling from this host. `false` when detached or already
    /// polling.
    pub fn start_polling(&self) -> bool {
        let emitter = self.component.emitter();
        if !emitter.is_bound() {
            return false;
        }
        self.bridge().start_polling(emitter.clone())
    }

    /// Stop the poll this host started. `false` when the bridge is idle
    /// or polling on behalf of someone else.
    pub fn stop_polling(&self) -> bool {
        self.bridge().stop_polling_from(self.component.emitter())
    }

    #[must_use]
    pub fn is_polling(&self) -> bool {
        self.bridge().is_polling()
    }
}
