#![forbid(unsafe_code)]

//! Core: component state, isolated render roots, and the event channel.
//!
//! Everything here is single-threaded. Shared handles are `Rc`/`RefCell`
//! and handlers are invoked with no borrow held, so a handler may reach
//! back into the channel or the component that fired it.

pub mod component;
pub mod event;
pub mod render;
pub mod state;

pub use component::{Component, ManagedListener, Mount, Widget, trigger};
pub use event::{Emitter, Event, EventChannel, ListenerId, NodeId, Target, names};
pub use render::{ElementRef, RenderRoot, escape};
pub use state::{State, StateContainer, StateExt};
