//! Command API over the overlay backend.
//!
//! Every operation is one logical backend call, async and fallible with
//! [`BridgeError`]. Replies are normalized: the backend answers either
//! with the bare resource or with a `{"status": "success", <key>: ...}`
//! envelope, and overlay commands answer with an acknowledgement only. An
//! acknowledgement is followed by a re-fetch so callers always receive the
//! full resource.
//!
//! Commands never touch the cached overlay state. The cache is replaced
//! wholesale by successful polls (see [`crate::poller`]) and by
//! [`SyncBridge::refresh`].

use std::cell::RefCell;
use std::rc::Rc;

use aero_core::event::names;
use aero_core::state::to_value;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, trace};

use crate::config::BridgeConfig;
use crate::error::{BridgeError, Result};
use crate::http::HttpTransport;
use crate::model::{FlightResult, FlightResultReply, OverlayState, Team, TeamPatch};
use crate::poller::PollHandle;
use crate::transport::{Request, Transport};

/// Normalized reply body.
enum Reply {
    Resource(Value),
    Ack,
}

impl Reply {
    /// Unwrap an envelope, looking for the resource under `key`.
    fn classify(body: Value, key: &str) -> Self {
        match body {
            Value::Object(mut map) if map.get("status").and_then(Value::as_str) == Some("success") => {
                match map.remove(key) {
                    Some(Value::Null) | None => Self::Ack,
                    Some(resource) => Self::Resource(resource),
                }
            }
            Value::Null => Self::Ack,
            other => Self::Resource(other),
        }
    }
}

fn decode<R: DeserializeOwned>(operation: &'static str, value: Value) -> Result<R> {
    serde_json::from_value(value).map_err(|source| BridgeError::Decode { operation, source })
}

fn empty_reply(operation: &'static str, resource: &'static str) -> BridgeError {
    BridgeError::EmptyReply {
        operation,
        resource,
    }
}

fn encode<B: Serialize + ?Sized>(operation: &'static str, body: &B) -> Result<Value> {
    serde_json::to_value(body).map_err(|source| BridgeError::Decode { operation, source })
}

/// Client of the overlay backend plus the polled state cache.
///
/// Shared as `Rc<SyncBridge<T>>` between the sync host and whatever issues
/// commands.
pub struct SyncBridge<T> {
    transport: T,
    config: BridgeConfig,
    pub(crate) cache: RefCell<Option<OverlayState>>,
    pub(crate) poll: RefCell<Option<PollHandle>>,
}

impl<T> std::fmt::Debug for SyncBridge<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncBridge")
            .field("base_url", &self.config.base_url)
            .field("polling", &self.poll.borrow().is_some())
            .field("cached", &self.cache.borrow().is_some())
            .finish_non_exhaustive()
    }
}

impl SyncBridge<HttpTransport> {
    /// Bridge over HTTP to `config.base_url`.
    pub fn connect(config: BridgeConfig) -> Result<Rc<Self>> {
        let transport = HttpTransport::new(&config)?;
        Ok(Rc::new(Self::new(transport, config)))
    }
}

impl<T> SyncBridge<T> {
    #[must_use]
    pub fn new(transport: T, config: BridgeConfig) -> Self {
        Self {
            transport,
            config,
            cache: RefCell::new(None),
            poll: RefCell::new(None),
        }
    }

    #[must_use]
    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    #[must_use]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Last overlay state stored by a poll or [`SyncBridge::refresh`].
    #[must_use]
    pub fn cached_state(&self) -> Option<OverlayState> {
        self.cache.borrow().clone()
    }
}

impl<T: Transport> SyncBridge<T> {
    async fn call(&self, request: Request) -> Result<Value> {
        let operation = request.operation;
        trace!(operation, method = request.method.as_str(), path = %request.path(), "bridge call");
        let response = self.transport.send(request).await?;
        if !response.is_success() {
            let body = match response.body {
                Value::String(text) => text,
                other => other.to_string(),
            };
            return Err(BridgeError::Status {
                operation,
                status: response.status,
                body,
            });
        }
        Ok(response.body)
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub async fn fetch_teams(&self) -> Result<Vec<Team>> {
        const OP: &str = "fetch_teams";
        match Reply::classify(self.call(Request::get(OP, ["teams"])).await?, "teams") {
            Reply::Resource(value) => decode(OP, value),
            Reply::Ack => Err(empty_reply(OP, "team list")),
        }
    }

    pub async fn fetch_team(&self, id: &str) -> Result<Team> {
        const OP: &str = "fetch_team";
        let body = self.call(Request::get(OP, ["teams", id])).await?;
        match Reply::classify(body, "team") {
            Reply::Resource(value) => decode(OP, value),
            Reply::Ack => Err(empty_reply(OP, "team")),
        }
    }

    pub async fn fetch_overlay_state(&self) -> Result<OverlayState> {
        const OP: &str = "fetch_overlay_state";
        let body = self.call(Request::get(OP, ["overlay", "state"])).await?;
        match Reply::classify(body, "state") {
            Reply::Resource(value) => decode(OP, value),
            Reply::Ack => Err(empty_reply(OP, "overlay state")),
        }
    }

    async fn overlay_reply(&self, operation: &'static str, body: Value) -> Result<OverlayState> {
        match Reply::classify(body, "state") {
            Reply::Resource(value) => decode(operation, value),
            Reply::Ack => {
                debug!(operation, "acknowledged; re-fetching overlay state");
                self.fetch_overlay_state().await
            }
        }
    }

    async fn team_reply(&self, operation: &'static str, id: &str, body: Value) -> Result<Team> {
        match Reply::classify(body, "team") {
            Reply::Resource(value) => decode(operation, value),
            Reply::Ack => self.fetch_team(id).await,
        }
    }

    // ── Overlay commands ─────────────────────────────────────────────

    /// Replace the backend's overlay state. The active team is sent as
    /// `current_team_id` even when `state` only names it through its
    /// embedded team.
    pub async fn set_overlay_state(&self, state: &OverlayState) -> Result<OverlayState> {
        const OP: &str = "set_overlay_state";
        let mut outgoing = state.clone();
        outgoing.current_team_id = state.active_team_id().map(str::to_owned);
        let body = encode(OP, &outgoing)?;
        let reply = self.call(Request::put(OP, ["overlay", "state"]).with_body(body)).await?;
        self.overlay_reply(OP, reply).await
    }

    /// Make the overlay visible, optionally focusing `team_id`.
    pub async fn show_overlay(&self, team_id: Option<&str>) -> Result<OverlayState> {
        const OP: &str = "show_overlay";
        let mut request = Request::post(OP, ["overlay", "show"]);
        if let Some(id) = team_id {
            request = request.with_query("team_id", id);
        }
        let reply = self.call(request).await?;
        self.overlay_reply(OP, reply).await
    }

    pub async fn hide_overlay(&self) -> Result<OverlayState> {
        const OP: &str = "hide_overlay";
        let reply = self.call(Request::post(OP, ["overlay", "hide"])).await?;
        self.overlay_reply(OP, reply).await
    }

    pub async fn toggle_overlay(&self) -> Result<OverlayState> {
        const OP: &str = "toggle_overlay";
        let reply = self.call(Request::post(OP, ["overlay", "toggle"])).await?;
        self.overlay_reply(OP, reply).await
    }

    /// Set (`Some`) or clear (`None`) the custom message. Reads the
    /// current state first so the other fields are preserved.
    pub async fn set_custom_message(&self, message: Option<&str>) -> Result<OverlayState> {
        let mut state = self.fetch_overlay_state().await?;
        state.custom_message = message.map(str::to_owned);
        self.set_overlay_state(&state).await
    }

    // ── Team commands ────────────────────────────────────────────────

    pub async fn update_team(&self, id: &str, patch: &TeamPatch) -> Result<Team> {
        const OP: &str = "update_team";
        let body = encode(OP, patch)?;
        let reply = self.call(Request::put(OP, ["teams", id]).with_body(body)).await?;
        self.team_reply(OP, id, reply).await
    }

    pub async fn update_current_battery(&self, id: &str, battery_number: u32) -> Result<Team> {
        const OP: &str = "update_current_battery";
        let request =
            Request::put(OP, ["teams", id, "battery"]).with_query("battery_number", battery_number);
        let reply = self.call(request).await?;
        self.team_reply(OP, id, reply).await
    }

    pub async fn add_flight_result(&self, id: &str, result: &FlightResult) -> Result<FlightResultReply> {
        const OP: &str = "add_flight_result";
        let body = encode(OP, result)?;
        let reply = self
            .call(Request::post(OP, ["teams", id, "results"]).with_body(body))
            .await?;
        match Reply::classify(reply, "team") {
            Reply::Resource(value) => decode(OP, value),
            Reply::Ack => self.fetch_team(id).await.map(FlightResultReply::Team),
        }
    }

    // ── Cache ────────────────────────────────────────────────────────

    /// Fetch now, replace the cache and, while polling, broadcast the
    /// result the same way a poll tick does.
    pub async fn refresh(&self) -> Result<OverlayState> {
        let state = self.fetch_overlay_state().await?;
        *self.cache.borrow_mut() = Some(state.clone());
        let emitter = self.poll.borrow().as_ref().map(|handle| handle.emitter.clone());
        if let Some(emitter) = emitter {
            emitter.emit(names::STATE_UPDATED, to_value(&state));
        }
        Ok(state)
    }
}

impl<T> Drop for SyncBridge<T> {
    fn drop(&mut self) {
        if let Some(handle) = self.poll.get_mut().take() {
            handle.token.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn classify_envelopes() {
        let team = json!({ "id": "t" });
        assert!(matches!(
            Reply::classify(json!({ "status": "success", "team": team.clone() }), "team"),
            Reply::Resource(v) if v == team
        ));
        assert!(matches!(
            Reply::classify(json!({ "status": "success", "visible": true }), "state"),
            Reply::Ack
        ));
        assert!(matches!(Reply::classify(Value::Null, "state"), Reply::Ack));
        // A bare flight result carries its own `status`.
        let result = json!({ "battery_number": 1, "status": "validated" });
        assert!(matches!(
            Reply::classify(result.clone(), "team"),
            Reply::Resource(v) if v == result
        ));
    }
}
