#![forbid(unsafe_code)]

//! Event channel scoped to a component tree.
//!
//! The channel is a small publish/subscribe tree. Each attached component
//! owns a host node and, beneath it, an isolated node that stands for its
//! private rendering subtree. Children attached inside a component's subtree
//! hang off that isolated node.
//!
//! # Propagation
//!
//! An [`Event`] dispatched at a node first reaches that node's listeners.
//! If it `bubbles`, it then walks up through every ancestor and finally
//! reaches [`Target::Window`]. Leaving an isolated node for its host is a
//! boundary crossing and only happens when the event `crosses_boundary`;
//! otherwise propagation stops there (and the window never sees it).
//!
//! # Re-entrancy
//!
//! Dispatch snapshots the listeners on the propagation path before invoking
//! any of them, and holds no borrow of the channel while handlers run.
//! Handlers may therefore emit further events or add and remove listeners.
//! A listener added during dispatch first fires on the next dispatch.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use serde_json::Value;
use tracing::{debug, trace};

/// Event names shared with outer orchestration code.
pub mod names {
    /// Operator asked to show the overlay.
    pub const SHOW_OVERLAY: &str = "show-overlay";
    /// Operator asked to hide the overlay.
    pub const HIDE_OVERLAY: &str = "hide-overlay";
    /// Operator asked to toggle the overlay.
    pub const TOGGLE_OVERLAY: &str = "toggle-overlay";
    /// A team card was picked. Detail: `{"teamId": …}`.
    pub const TEAM_SELECTED: &str = "team-selected";
    /// Fresh overlay state from the backend. Detail: the full state.
    pub const STATE_UPDATED: &str = "state-updated";
}

/// Identifier of a node in an [`EventChannel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl NodeId {
    /// Raw numeric id.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// Identifier of a registered listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

/// Where a listener is registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Target {
    /// The global, long-lived target at the top of every tree.
    Window,
    /// A node of the tree.
    Node(NodeId),
}

/// A named event carrying an arbitrary JSON payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    /// Event name, e.g. `state-updated`.
    pub name: String,
    /// Payload.
    pub detail: Value,
    /// Propagate to ancestors after the target.
    pub bubbles: bool,
    /// Propagate out of isolated subtrees.
    pub crosses_boundary: bool,
    /// Node the event was dispatched at (set by the channel).
    pub target: Option<NodeId>,
}

impl Event {
    /// A non-bubbling, non-crossing event.
    #[must_use]
    pub fn new(name: impl Into<String>, detail: Value) -> Self {
        Self {
            name: name.into(),
            detail,
            bubbles: false,
            crosses_boundary: false,
            target: None,
        }
    }

    /// Set whether the event bubbles.
    #[must_use]
    pub fn bubbles(mut self, bubbles: bool) -> Self {
        self.bubbles = bubbles;
        self
    }

    /// Set whether the event crosses isolated-subtree boundaries.
    #[must_use]
    pub fn crosses_boundary(mut self, crosses: bool) -> Self {
        self.crosses_boundary = crosses;
        self
    }
}

/// Shared handler type for channel listeners.
pub type Listener = Rc<dyn Fn(&Event)>;

struct ListenerEntry {
    id: ListenerId,
    event: String,
    handler: Listener,
}

struct NodeEntry {
    parent: Option<NodeId>,
    isolated: bool,
    label: String,
    listeners: Vec<ListenerEntry>,
}

#[derive(Default)]
struct ChannelInner {
    nodes: BTreeMap<NodeId, NodeEntry>,
    window: Vec<ListenerEntry>,
    next_node: u64,
    next_listener: u64,
}

impl ChannelInner {
    fn listeners_mut(&mut self, target: Target) -> Option<&mut Vec<ListenerEntry>> {
        match target {
            Target::Window => Some(&mut self.window),
            Target::Node(id) => self.nodes.get_mut(&id).map(|n| &mut n.listeners),
        }
    }

    fn collect(list: &[ListenerEntry], name: &str, out: &mut Vec<Listener>) {
        out.extend(
            list.iter()
                .filter(|l| l.event == name)
                .map(|l| Rc::clone(&l.handler)),
        );
    }
}

/// Publish/subscribe channel for one component tree.
///
/// Cloning yields another handle to the same tree.
#[derive(Clone, Default)]
pub struct EventChannel {
    inner: Rc<RefCell<ChannelInner>>,
}

impl fmt::Debug for EventChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("EventChannel")
            .field("nodes", &inner.nodes.len())
            .field("window_listeners", &inner.window.len())
            .finish()
    }
}

impl EventChannel {
    /// Create an empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether two handles refer to the same tree.
    #[must_use]
    pub fn same_channel(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Add a node under `parent` (or at the top when `None`).
    ///
    /// A missing parent is treated as top-level.
    pub fn create_node(&self, parent: Option<NodeId>, label: &str) -> NodeId {
        self.insert_node(parent, label, false)
    }

    /// Add the isolated node standing for `host`'s private subtree.
    pub fn create_isolated(&self, host: NodeId, label: &str) -> NodeId {
        self.insert_node(Some(host), label, true)
    }

    fn insert_node(&self, parent: Option<NodeId>, label: &str, isolated: bool) -> NodeId {
        let mut inner = self.inner.borrow_mut();
        inner.next_node += 1;
        let id = NodeId(inner.next_node);
        let parent = parent.filter(|p| inner.nodes.contains_key(p));
        inner.nodes.insert(
            id,
            NodeEntry {
                parent,
                isolated,
                label: label.to_string(),
                listeners: Vec::new(),
            },
        );
        trace!(node = id.0, label, isolated, "node created");
        id
    }

    /// Remove `node` and all of its descendants. Returns how many listeners
    /// were dropped with them.
    pub fn remove_node(&self, node: NodeId) -> usize {
        let mut inner = self.inner.borrow_mut();
        if !inner.nodes.contains_key(&node) {
            return 0;
        }
        let mut doomed = vec![node];
        let mut cursor = 0;
        while cursor < doomed.len() {
            let current = doomed[cursor];
            doomed.extend(
                inner
                    .nodes
                    .iter()
                    .filter(|(_, n)| n.parent == Some(current))
                    .map(|(id, _)| *id),
            );
            cursor += 1;
        }
        let mut dropped = 0;
        for id in doomed {
            if let Some(entry) = inner.nodes.remove(&id) {
                dropped += entry.listeners.len();
                trace!(node = id.0, label = %entry.label, "node removed");
            }
        }
        dropped
    }

    /// Whether `node` is part of the tree.
    #[must_use]
    pub fn contains(&self, node: NodeId) -> bool {
        self.inner.borrow().nodes.contains_key(&node)
    }

    /// Parent of `node`, if any.
    #[must_use]
    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.inner.borrow().nodes.get(&node).and_then(|n| n.parent)
    }

    /// Register `handler` for `event` on `target`.
    ///
    /// Returns `None` when the target node does not exist.
    pub fn add_listener(
        &self,
        target: Target,
        event: &str,
        handler: impl Fn(&Event) + 'static,
    ) -> Option<ListenerId> {
        let mut inner = self.inner.borrow_mut();
        inner.next_listener += 1;
        let id = ListenerId(inner.next_listener);
        let list = inner.listeners_mut(target)?;
        list.push(ListenerEntry {
            id,
            event: event.to_string(),
            handler: Rc::new(handler),
        });
        debug!(listener = id.0, ?target, event, "listener added");
        Some(id)
    }

    /// Remove a listener. Returns whether it was registered.
    pub fn remove_listener(&self, target: Target, id: ListenerId) -> bool {
        let mut inner = self.inner.borrow_mut();
        let Some(list) = inner.listeners_mut(target) else {
            return false;
        };
        let before = list.len();
        list.retain(|l| l.id != id);
        let removed = list.len() != before;
        if removed {
            debug!(listener = id.0, ?target, "listener removed");
        }
        removed
    }

    /// Listeners registered on `target`.
    #[must_use]
    pub fn listener_count(&self, target: Target) -> usize {
        let inner = self.inner.borrow();
        match target {
            Target::Window => inner.window.len(),
            Target::Node(id) => inner.nodes.get(&id).map_or(0, |n| n.listeners.len()),
        }
    }

    /// Listeners registered anywhere in the tree, window included.
    #[must_use]
    pub fn total_listeners(&self) -> usize {
        let inner = self.inner.borrow();
        inner.window.len() + inner.nodes.values().map(|n| n.listeners.len()).sum::<usize>()
    }

    /// Dispatch `event` at `target`. Returns the number of handlers run.
    pub fn dispatch(&self, target: NodeId, mut event: Event) -> usize {
        event.target = Some(target);
        let handlers = self.propagation_path(target, &event);
        trace!(
            event = %event.name,
            node = target.0,
            handlers = handlers.len(),
            "dispatch"
        );
        for handler in &handlers {
            handler(&event);
        }
        handlers.len()
    }

    /// Dispatch `event` directly at the window.
    pub fn dispatch_window(&self, event: Event) -> usize {
        let mut handlers = Vec::new();
        ChannelInner::collect(&self.inner.borrow().window, &event.name, &mut handlers);
        for handler in &handlers {
            handler(&event);
        }
        handlers.len()
    }

    fn propagation_path(&self, target: NodeId, event: &Event) -> Vec<Listener> {
        let inner = self.inner.borrow();
        let mut out = Vec::new();
        let Some(entry) = inner.nodes.get(&target) else {
            return out;
        };
        ChannelInner::collect(&entry.listeners, &event.name, &mut out);
        if !event.bubbles {
            return out;
        }

        let mut current = entry;
        loop {
            let Some(parent_id) = current.parent else {
                ChannelInner::collect(&inner.window, &event.name, &mut out);
                break;
            };
            if current.isolated && !event.crosses_boundary {
                break;
            }
            let Some(parent) = inner.nodes.get(&parent_id) else {
                break;
            };
            ChannelInner::collect(&parent.listeners, &event.name, &mut out);
            current = parent;
        }
        out
    }
}

/// Dispatches events on behalf of one component.
///
/// Cloned into post-render bindings so they can emit. Until the owning
/// component is attached (and again after it detaches) the emitter is
/// inert: `emit` runs no handlers.
#[derive(Clone, Default)]
pub struct Emitter {
    link: Rc<RefCell<Option<(EventChannel, NodeId)>>>,
}

impl fmt::Debug for Emitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let node = self.link.borrow().as_ref().map(|(_, n)| *n);
        f.debug_struct("Emitter").field("node", &node).finish()
    }
}

impl Emitter {
    /// An emitter bound to nothing.
    #[must_use]
    pub fn inert() -> Self {
        Self::default()
    }

    /// An emitter bound to `node` of `channel`.
    #[must_use]
    pub fn bound(channel: &EventChannel, node: NodeId) -> Self {
        let emitter = Self::default();
        emitter.bind(channel, node);
        emitter
    }

    pub(crate) fn bind(&self, channel: &EventChannel, node: NodeId) {
        *self.link.borrow_mut() = Some((channel.clone(), node));
    }

    pub(crate) fn unbind(&self) {
        self.link.borrow_mut().take();
    }

    /// Whether both handles belong to the same emitter (clones share it).
    #[must_use]
    pub fn same_as(&self, other: &Emitter) -> bool {
        Rc::ptr_eq(&self.link, &other.link)
    }

    /// Node this emitter dispatches at, if bound.
    #[must_use]
    pub fn node(&self) -> Option<NodeId> {
        self.link.borrow().as_ref().map(|(_, n)| *n)
    }

    /// Whether the emitter is bound.
    #[must_use]
    pub fn is_bound(&self) -> bool {
        self.link.borrow().is_some()
    }

    /// Emit a bubbling, boundary-crossing event. Returns handlers run.
    pub fn emit(&self, name: &str, detail: Value) -> usize {
        let link = self.link.borrow().clone();
        match link {
            Some((channel, node)) => channel.dispatch(
                node,
                Event::new(name, detail).bubbles(true).crosses_boundary(true),
            ),
            None => {
                trace!(event = name, "emit on unbound emitter ignored");
                0
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::cell::RefCell;

    fn recorder() -> (Rc<RefCell<Vec<String>>>, impl Fn(&str) -> Box<dyn Fn(&Event)>) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let l = Rc::clone(&log);
        let make = move |tag: &str| -> Box<dyn Fn(&Event)> {
            let l = Rc::clone(&l);
            let tag = tag.to_string();
            Box::new(move |e: &Event| l.borrow_mut().push(format!("{tag}:{}", e.name)))
        };
        (log, make)
    }

    #[test]
    fn bubbling_reaches_ancestors_then_window() {
        let ch = EventChannel::new();
        let app = ch.create_node(None, "app");
        let host = ch.create_node(Some(app), "host");
        let (log, make) = recorder();
        ch.add_listener(Target::Node(host), "ping", make("host"));
        ch.add_listener(Target::Node(app), "ping", make("app"));
        ch.add_listener(Target::Window, "ping", make("window"));
        ch.add_listener(Target::Window, "other", make("nope"));

        let ran = ch.dispatch(host, Event::new("ping", json!({})).bubbles(true));
        assert_eq!(ran, 3);
        assert_eq!(*log.borrow(), vec!["host:ping", "app:ping", "window:ping"]);
    }

    #[test]
    fn non_bubbling_stays_on_target() {
        let ch = EventChannel::new();
        let app = ch.create_node(None, "app");
        let host = ch.create_node(Some(app), "host");
        let (log, make) = recorder();
        ch.add_listener(Target::Node(app), "ping", make("app"));
        ch.add_listener(Target::Window, "ping", make("window"));

        assert_eq!(ch.dispatch(host, Event::new("ping", Value::Null)), 0);
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn isolation_boundary_requires_crossing() {
        let ch = EventChannel::new();
        let outer = ch.create_node(None, "outer");
        let shadow = ch.create_isolated(outer, "outer#shadow");
        let inner = ch.create_node(Some(shadow), "inner");
        let (log, make) = recorder();
        ch.add_listener(Target::Node(outer), "ping", make("outer"));
        ch.add_listener(Target::Window, "ping", make("window"));

        ch.dispatch(inner, Event::new("ping", Value::Null).bubbles(true));
        assert!(log.borrow().is_empty());

        ch.dispatch(
            inner,
            Event::new("ping", Value::Null)
                .bubbles(true)
                .crosses_boundary(true),
        );
        assert_eq!(*log.borrow(), vec!["outer:ping", "window:ping"]);
    }

    #[test]
    fn remove_node_drops_descendants_and_listeners() {
        let ch = EventChannel::new();
        let host = ch.create_node(None, "host");
        let shadow = ch.create_isolated(host, "host#shadow");
        let child = ch.create_node(Some(shadow), "child");
        ch.add_listener(Target::Node(host), "a", |_| {});
        ch.add_listener(Target::Node(child), "b", |_| {});
        ch.add_listener(Target::Window, "c", |_| {});

        assert_eq!(ch.remove_node(host), 2);
        assert!(!ch.contains(host));
        assert!(!ch.contains(shadow));
        assert!(!ch.contains(child));
        assert_eq!(ch.total_listeners(), 1);
        assert_eq!(ch.remove_node(host), 0);
    }

    #[test]
    fn listener_on_missing_node_is_rejected() {
        let ch = EventChannel::new();
        let node = ch.create_node(None, "gone");
        ch.remove_node(node);
        assert!(ch.add_listener(Target::Node(node), "x", |_| {}).is_none());
        assert!(!ch.remove_listener(Target::Node(node), ListenerId(1)));
    }

    #[test]
    fn handlers_may_mutate_the_channel_during_dispatch() {
        let ch = EventChannel::new();
        let node = ch.create_node(None, "n");
        let ch2 = ch.clone();
        let added = Rc::new(RefCell::new(None));
        let added2 = Rc::clone(&added);
        ch.add_listener(Target::Node(node), "go", move |_| {
            let id = ch2.add_listener(Target::Window, "go", |_| {});
            *added2.borrow_mut() = id;
        });

        assert_eq!(ch.dispatch(node, Event::new("go", Value::Null).bubbles(true)), 1);
        assert!(added.borrow().is_some());
        assert_eq!(ch.dispatch(node, Event::new("go", Value::Null).bubbles(true)), 2);
    }

    #[test]
    fn emitter_is_inert_until_bound() {
        let ch = EventChannel::new();
        let node = ch.create_node(None, "n");
        let (log, make) = recorder();
        ch.add_listener(Target::Window, names::SHOW_OVERLAY, make("window"));

        let emitter = Emitter::inert();
        assert_eq!(emitter.emit(names::SHOW_OVERLAY, json!({})), 0);

        emitter.bind(&ch, node);
        let clone = emitter.clone();
        assert_eq!(clone.emit(names::SHOW_OVERLAY, json!({})), 1);

        emitter.unbind();
        assert!(!clone.is_bound());
        assert_eq!(clone.emit(names::SHOW_OVERLAY, json!({})), 0);
        assert_eq!(log.borrow().len(), 1);
    }

    #[test]
    fn emitter_identity_follows_clones() {
        let ch = EventChannel::new();
        let node = ch.create_node(None, "n");
        let a = Emitter::bound(&ch, node);
        let b = Emitter::bound(&ch, node);
        assert!(a.same_as(&a.clone()));
        assert!(!a.same_as(&b));
    }
}
