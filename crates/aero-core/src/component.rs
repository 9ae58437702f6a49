#![forbid(unsafe_code)]

//! Components: state + render root + event wiring behind one type.
//!
//! Widgets do not subclass anything. A widget implements [`Widget`] (pure
//! template and style functions plus optional hooks) and is wrapped in a
//! [`Component`], which owns the state container, the isolated render root
//! and the listeners.
//!
//! # Lifecycle
//!
//! 1. [`Component::new`] merges the widget's initial state and renders once.
//! 2. [`Component::attach`] creates the host node (and its isolated node) in
//!    an [`EventChannel`], binds the emitter, runs [`Widget::connected`] and
//!    renders again so the post-render hook can bind against live elements.
//! 3. [`Component::set_state`] merges, calls the state-change hook, renders.
//! 4. [`Component::detach`] runs [`Widget::disconnected`], releases every
//!    managed listener and ad-hoc binding and removes the host node.
//!
//! # Invariants
//!
//! - After every `set_state`, the root holds `template(state)` for the
//!   merged state. Updates are applied in call order with one render each.
//! - The post-render hook only runs while attached; a detached component
//!   holds zero live listeners.
//! - Dropping a component detaches it.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde_json::Value;
use tracing::debug;

use crate::event::{Emitter, EventChannel, ListenerId, NodeId, Target};
use crate::render::RenderRoot;
use crate::state::{State, StateContainer};

/// The capability set a presentational widget supplies.
pub trait Widget {
    /// Element name used for the host node label.
    fn tag(&self) -> &'static str;

    /// State merged by the constructor before the first render.
    fn initial_state(&self) -> State {
        State::new()
    }

    /// Markup for `state`. Must be total over every reachable state.
    fn template(&self, state: &State) -> String;

    /// Style block for the isolated subtree.
    fn styles(&self) -> &str {
        ""
    }

    /// Attributes whose changes are reflected into state.
    fn observed_attributes(&self) -> &[&'static str] {
        &[]
    }

    /// Map an observed attribute change to a partial state.
    fn attribute_changed(&self, _name: &str, _old: Option<&str>, _new: Option<&str>) -> Option<State> {
        None
    }

    /// Called after each merge with owned snapshots.
    fn on_state_change(&mut self, _old: &State, _new: &State) {}

    /// Called after each render while attached. Ad-hoc bindings are made
    /// here; the previous generation's bindings are already gone.
    fn after_render(&self, _state: &State, _root: &mut RenderRoot, _emitter: &Emitter) {}

    /// Called once the host node exists.
    fn connected(&mut self, _mount: &mut Mount<'_>) {}

    /// Called before the component's listeners are released.
    fn disconnected(&mut self) {}
}

/// A listener registered through a component and released on detach.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagedListener {
    /// Where it is registered.
    pub target: Target,
    /// Event name.
    pub event: String,
    /// Channel-assigned id.
    pub id: ListenerId,
}

struct Attachment {
    channel: EventChannel,
    host: NodeId,
    subtree: NodeId,
}

/// Context handed to [`Widget::connected`].
pub struct Mount<'a> {
    channel: &'a EventChannel,
    host: NodeId,
    emitter: &'a Emitter,
    attributes: &'a BTreeMap<String, String>,
    managed: &'a mut Vec<ManagedListener>,
}

impl Mount<'_> {
    /// The component's emitter, already bound.
    #[must_use]
    pub fn emitter(&self) -> &Emitter {
        self.emitter
    }

    /// The component's host node.
    #[must_use]
    pub fn host(&self) -> NodeId {
        self.host
    }

    /// Whether the host carries attribute `name`.
    #[must_use]
    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    /// Register a managed listener (released on detach).
    pub fn listen(
        &mut self,
        target: Target,
        event: &str,
        handler: impl Fn(&crate::event::Event) + 'static,
    ) -> Option<ListenerId> {
        let id = self.channel.add_listener(target, event, handler)?;
        self.managed.push(ManagedListener {
            target,
            event: event.to_string(),
            id,
        });
        Some(id)
    }
}

/// One widget instance: state, isolated render root and listeners.
pub struct Component<W: Widget> {
    widget: W,
    state: StateContainer,
    root: RenderRoot,
    emitter: Emitter,
    attachment: Option<Attachment>,
    managed: Vec<ManagedListener>,
    attributes: BTreeMap<String, String>,
    classes: BTreeSet<String>,
    renders: u64,
}

impl<W: Widget> fmt::Debug for Component<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Component")
            .field("tag", &self.widget.tag())
            .field("revision", &self.state.revision())
            .field("renders", &self.renders)
            .field("attached", &self.attachment.is_some())
            .field("managed", &self.managed.len())
            .finish()
    }
}

impl<W: Widget> Component<W> {
    /// Construct the component and render its initial state.
    pub fn new(widget: W) -> Self {
        let initial = widget.initial_state();
        let mut component = Self {
            widget,
            state: StateContainer::new(),
            root: RenderRoot::new(),
            emitter: Emitter::inert(),
            attachment: None,
            managed: Vec::new(),
            attributes: BTreeMap::new(),
            classes: BTreeSet::new(),
            renders: 0,
        };
        component.set_state(initial);
        component
    }

    // ── State ────────────────────────────────────────────────────────

    /// Shallow-merge `partial`, run the state-change hook, re-render.
    pub fn set_state(&mut self, partial: State) {
        let keys: Vec<&str> = partial.keys().map(String::as_str).collect();
        debug!(tag = self.widget.tag(), ?keys, "set_state");
        let change = self.state.merge(partial);
        self.widget.on_state_change(&change.old, &change.new);
        self.render();
    }

    /// Owned copy of the current state.
    #[must_use]
    pub fn get_state(&self) -> State {
        self.state.snapshot()
    }

    /// Current value of one key (owned).
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Value> {
        self.state.current().get(key).cloned()
    }

    /// Number of merges applied.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.state.revision()
    }

    // ── Rendering ────────────────────────────────────────────────────

    /// Re-materialize the isolated subtree from the current state.
    pub fn render(&mut self) {
        let markup = self.widget.template(self.state.current());
        let style = self.widget.styles().to_string();
        self.root.replace(style, markup);
        self.renders += 1;
        if self.attachment.is_some() {
            self.widget
                .after_render(self.state.current(), &mut self.root, &self.emitter);
        }
    }

    /// The isolated render root.
    #[must_use]
    pub fn root(&self) -> &RenderRoot {
        &self.root
    }

    /// Full subtree markup including the style block.
    #[must_use]
    pub fn html(&self) -> String {
        self.root.html()
    }

    /// Renders performed so far.
    #[must_use]
    pub const fn render_count(&self) -> u64 {
        self.renders
    }

    /// Simulate user input on the first element matching `selector`.
    ///
    /// Returns how many bindings ran. When the component lives in a
    /// `RefCell` and handlers may call back into it, use [`trigger`].
    pub fn trigger(&self, selector: &str, event: &str) -> usize {
        let handlers = self.root.handlers_for(selector, event);
        for (element, handler) in &handlers {
            handler(element);
        }
        handlers.len()
    }

    // ── Events ───────────────────────────────────────────────────────

    /// Emit a bubbling, boundary-crossing event from the host node.
    pub fn emit(&self, name: &str, detail: Value) -> usize {
        self.emitter.emit(name, detail)
    }

    /// The component's emitter.
    #[must_use]
    pub fn emitter(&self) -> &Emitter {
        &self.emitter
    }

    /// Register a listener released on detach. `None` while detached.
    pub fn add_managed_listener(
        &mut self,
        target: Target,
        event: &str,
        handler: impl Fn(&crate::event::Event) + 'static,
    ) -> Option<ListenerId> {
        let attachment = self.attachment.as_ref()?;
        let id = attachment.channel.add_listener(target, event, handler)?;
        self.managed.push(ManagedListener {
            target,
            event: event.to_string(),
            id,
        });
        Some(id)
    }

    /// Release every managed listener.
    pub fn remove_all_listeners(&mut self) {
        if let Some(attachment) = &self.attachment {
            for listener in self.managed.drain(..) {
                attachment
                    .channel
                    .remove_listener(listener.target, listener.id);
            }
        } else {
            self.managed.clear();
        }
    }

    /// Managed listeners in registration order.
    #[must_use]
    pub fn managed_listeners(&self) -> &[ManagedListener] {
        &self.managed
    }

    /// Live listeners held by this component (managed + ad hoc).
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.managed.len() + self.root.binding_count()
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Insert the component under `parent` in `channel`.
    ///
    /// Attaching an attached component is a no-op returning its host.
    pub fn attach(&mut self, channel: &EventChannel, parent: Option<NodeId>) -> NodeId {
        if let Some(attachment) = &self.attachment {
            return attachment.host;
        }
        let tag = self.widget.tag();
        let host = channel.create_node(parent, tag);
        let subtree = channel.create_isolated(host, &format!("{tag}#subtree"));
        self.emitter.bind(channel, host);
        self.attachment = Some(Attachment {
            channel: channel.clone(),
            host,
            subtree,
        });
        debug!(tag, host = host.raw(), "attached");

        let mut mount = Mount {
            channel,
            host,
            emitter: &self.emitter,
            attributes: &self.attributes,
            managed: &mut self.managed,
        };
        self.widget.connected(&mut mount);
        self.render();
        host
    }

    /// Remove the component from its tree, releasing all listeners.
    pub fn detach(&mut self) {
        if self.attachment.is_none() {
            return;
        }
        self.widget.disconnected();
        self.remove_all_listeners();
        self.root.clear_bindings();
        self.emitter.unbind();
        if let Some(attachment) = self.attachment.take() {
            attachment.channel.remove_node(attachment.host);
            debug!(tag = self.widget.tag(), host = attachment.host.raw(), "detached");
        }
    }

    /// Whether the component is in a tree.
    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.attachment.is_some()
    }

    /// Host node while attached.
    #[must_use]
    pub fn host(&self) -> Option<NodeId> {
        self.attachment.as_ref().map(|a| a.host)
    }

    /// Isolated node children should attach under.
    #[must_use]
    pub fn subtree(&self) -> Option<NodeId> {
        self.attachment.as_ref().map(|a| a.subtree)
    }

    // ── Host element ─────────────────────────────────────────────────

    /// Set (`Some`) or remove (`None`) a host attribute. Observed
    /// attributes are reflected into state.
    pub fn set_attribute(&mut self, name: &str, value: Option<&str>) {
        let old = match value {
            Some(v) => self.attributes.insert(name.to_string(), v.to_string()),
            None => self.attributes.remove(name),
        };
        if old.as_deref() == value {
            return;
        }
        if !self.widget.observed_attributes().contains(&name) {
            return;
        }
        if let Some(partial) = self.widget.attribute_changed(name, old.as_deref(), value) {
            self.set_state(partial);
        }
    }

    /// Host attribute value.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Add a class to the host element.
    pub fn add_class(&mut self, class: &str) {
        self.classes.insert(class.to_string());
    }

    /// Remove a class from the host element.
    pub fn remove_class(&mut self, class: &str) {
        self.classes.remove(class);
    }

    /// Whether the host element carries `class`.
    #[must_use]
    pub fn has_class(&self, class: &str) -> bool {
        self.classes.contains(class)
    }

    // ── Widget access ────────────────────────────────────────────────

    /// The wrapped widget.
    #[must_use]
    pub fn widget(&self) -> &W {
        &self.widget
    }

    /// The wrapped widget, mutably. Changing what the template reads
    /// outside of state does not re-render; call [`Component::render`].
    pub fn widget_mut(&mut self) -> &mut W {
        &mut self.widget
    }
}

impl<W: Widget> Drop for Component<W> {
    fn drop(&mut self) {
        self.detach();
    }
}

/// Simulate user input on a component shared through a `RefCell`.
///
/// Handlers are cloned out and the borrow is released before any of them
/// runs, so listeners reached through the emitted events may borrow the
/// component again.
pub fn trigger<W: Widget>(cell: &RefCell<Component<W>>, selector: &str, event: &str) -> usize {
    let handlers = cell.borrow().root.handlers_for(selector, event);
    for (element, handler) in &handlers {
        handler(element);
    }
    handlers.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{Event, names};
    use crate::state;
    use crate::state::StateExt;
    use serde_json::json;
    use std::cell::Cell;
    use std::rc::Rc;

    struct Counter {
        changes: Rc<Cell<u32>>,
    }

    impl Widget for Counter {
        fn tag(&self) -> &'static str {
            "test-counter"
        }

        fn initial_state(&self) -> State {
            state! { "count" => 0, "label" => "clicks" }
        }

        fn template(&self, state: &State) -> String {
            format!(
                r#"<button class="inc">{} {}</button>"#,
                state.get_str("label").unwrap_or_default(),
                state.get_i64("count").unwrap_or_default()
            )
        }

        fn styles(&self) -> &str {
            ".inc { color: red; }"
        }

        fn observed_attributes(&self) -> &[&'static str] {
            &["label"]
        }

        fn attribute_changed(&self, _name: &str, _old: Option<&str>, new: Option<&str>) -> Option<State> {
            Some(state! { "label" => new.unwrap_or("clicks") })
        }

        fn on_state_change(&mut self, _old: &State, _new: &State) {
            self.changes.set(self.changes.get() + 1);
        }

        fn after_render(&self, state: &State, root: &mut RenderRoot, emitter: &Emitter) {
            let count = state.get_i64("count").unwrap_or_default();
            let emitter = emitter.clone();
            root.bind(".inc", "click", move |_| {
                emitter.emit("increment", json!({ "from": count }));
            });
        }
    }

    fn counter() -> (Component<Counter>, Rc<Cell<u32>>) {
        let changes = Rc::new(Cell::new(0));
        let component = Component::new(Counter {
            changes: Rc::clone(&changes),
        });
        (component, changes)
    }

    #[test]
    fn constructor_renders_initial_state() {
        let (c, changes) = counter();
        assert_eq!(c.render_count(), 1);
        assert_eq!(changes.get(), 1);
        assert_eq!(c.root().markup(), r#"<button class="inc">clicks 0</button>"#);
        assert!(c.html().starts_with("<style>.inc { color: red; }</style>"));
    }

    #[test]
    fn each_set_state_renders_once_in_order() {
        let (mut c, changes) = counter();
        c.set_state(state! { "count" => 1 });
        c.set_state(state! { "count" => 2 });
        c.set_state(state! { "label" => "taps" });
        assert_eq!(c.render_count(), 4);
        assert_eq!(changes.get(), 4);
        assert_eq!(c.root().markup(), r#"<button class="inc">taps 2</button>"#);
    }

    #[test]
    fn get_state_is_a_copy() {
        let (c, _) = counter();
        let mut snap = c.get_state();
        snap.insert("count".into(), json!(42));
        assert_eq!(c.get("count"), Some(json!(0)));
    }

    #[test]
    fn detached_component_binds_nothing() {
        let (c, _) = counter();
        assert_eq!(c.listener_count(), 0);
        assert_eq!(c.trigger(".inc", "click"), 0);
    }

    #[test]
    fn attach_renders_with_bindings_and_emits_upward() {
        let (mut c, _) = counter();
        let ch = EventChannel::new();
        let app = ch.create_node(None, "app");
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = Rc::clone(&seen);
        ch.add_listener(Target::Node(app), "increment", move |e: &Event| {
            s.borrow_mut().push(e.detail.clone());
        });

        c.attach(&ch, Some(app));
        assert_eq!(c.render_count(), 2);
        assert_eq!(c.listener_count(), 1);
        assert_eq!(c.trigger(".inc", "click"), 1);
        assert_eq!(*seen.borrow(), vec![json!({ "from": 0 })]);

        c.set_state(state! { "count" => 5 });
        assert_eq!(c.listener_count(), 1);
        c.trigger(".inc", "click");
        assert_eq!(seen.borrow()[1], json!({ "from": 5 }));
    }

    #[test]
    fn attach_twice_is_idempotent() {
        let (mut c, _) = counter();
        let ch = EventChannel::new();
        let first = c.attach(&ch, None);
        let second = c.attach(&ch, None);
        assert_eq!(first, second);
        assert_eq!(c.render_count(), 2);
    }

    #[test]
    fn detach_releases_everything() {
        let (mut c, _) = counter();
        let ch = EventChannel::new();
        c.attach(&ch, None);
        c.add_managed_listener(Target::Window, names::STATE_UPDATED, |_| {});
        c.add_managed_listener(Target::Window, names::TEAM_SELECTED, |_| {});
        assert_eq!(c.managed_listeners().len(), 2);
        assert_eq!(ch.total_listeners(), 2);

        let host = c.host().unwrap();
        c.detach();
        assert_eq!(c.listener_count(), 0);
        assert_eq!(ch.total_listeners(), 0);
        assert!(!ch.contains(host));
        assert!(!c.is_attached());
        assert_eq!(c.emit("increment", Value::Null), 0);

        c.set_state(state! { "count" => 9 });
        assert_eq!(c.listener_count(), 0);
    }

    #[test]
    fn managed_listener_requires_attachment() {
        let (mut c, _) = counter();
        assert!(
            c.add_managed_listener(Target::Window, "x", |_| {})
                .is_none()
        );
    }

    #[test]
    fn observed_attribute_reflects_into_state() {
        let (mut c, _) = counter();
        c.set_attribute("label", Some("presses"));
        assert_eq!(c.get("label"), Some(json!("presses")));
        let renders = c.render_count();

        c.set_attribute("label", Some("presses"));
        assert_eq!(c.render_count(), renders);

        c.set_attribute("title", Some("ignored"));
        assert_eq!(c.render_count(), renders);
        assert_eq!(c.attribute("title"), Some("ignored"));

        c.set_attribute("label", None);
        assert_eq!(c.get("label"), Some(json!("clicks")));
    }

    #[test]
    fn drop_detaches() {
        let ch = EventChannel::new();
        {
            let (mut c, _) = counter();
            c.attach(&ch, None);
            c.add_managed_listener(Target::Window, "x", |_| {});
            assert_eq!(ch.total_listeners(), 1);
        }
        assert_eq!(ch.total_listeners(), 0);
    }

    #[test]
    fn shared_trigger_releases_borrow() {
        let (c, _) = counter();
        let cell = Rc::new(RefCell::new(c));
        let ch = EventChannel::new();
        cell.borrow_mut().attach(&ch, None);

        let target = Rc::clone(&cell);
        ch.add_listener(Target::Window, "increment", move |e: &Event| {
            let next = e.detail["from"].as_i64().unwrap_or_default() + 1;
            target.borrow_mut().set_state(state! { "count" => next });
        });

        assert_eq!(trigger(&cell, ".inc", "click"), 1);
        assert_eq!(cell.borrow().get("count"), Some(json!(1)));
        trigger(&cell, "button", "click");
        assert_eq!(cell.borrow().get("count"), Some(json!(2)));
    }

    #[test]
    fn host_classes() {
        let (mut c, _) = counter();
        c.add_class("visible");
        assert!(c.has_class("visible"));
        c.remove_class("visible");
        assert!(!c.has_class("visible"));
    }
}
