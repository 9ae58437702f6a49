#![forbid(unsafe_code)]

//! Sync bridge: command API over the overlay backend and the polling loop
//! that re-broadcasts the fetched overlay state as `state-updated`.
//!
//! Runs on a single-threaded executor. The bridge is shared as
//! `Rc<SyncBridge<T>>`; polling is a `spawn_local` task, so it must be
//! started inside a `tokio::task::LocalSet`.

pub mod bridge;
pub mod config;
pub mod error;
pub mod host;
pub mod http;
#[cfg(any(test, feature = "test-helpers"))]
pub mod memory;
pub mod model;
pub mod poller;
pub mod transport;

pub use bridge::SyncBridge;
pub use config::BridgeConfig;
pub use error::{BridgeError, Result};
pub use host::SyncHost;
pub use http::HttpTransport;
pub use model::{FlightResult, FlightResultReply, FlightStatus, OverlayState, Team, TeamPatch};
pub use poller::PollOutcome;
pub use transport::{Method, Request, Response, Transport};
