//! Cancellable overlay-state polling.
//!
//! One activation = one `spawn_local` task and one [`CancellationToken`].
//!
//! # Invariants
//!
//! - At most one poll task per bridge. Starting while active and stopping
//!   while inactive are no-ops.
//! - Ticks run strictly in sequence: the loop awaits each fetch before
//!   waiting for the next tick, and missed ticks are delayed, not bursted.
//! - The token is checked after every fetch. A response that arrives after
//!   [`SyncBridge::stop_polling`] is dropped, never cached or broadcast.
//! - A failed fetch is logged and leaves the cache and the last broadcast
//!   untouched.
//! - The task holds only a weak reference between ticks; dropping the
//!   bridge cancels it.

use std::rc::{Rc, Weak};
use std::time::Duration;

use aero_core::event::{Emitter, names};
use aero_core::state::to_value;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::bridge::SyncBridge;
use crate::transport::Transport;

/// A live polling activation.
pub(crate) struct PollHandle {
    pub(crate) token: CancellationToken,
    pub(crate) emitter: Emitter,
    task: JoinHandle<()>,
}

/// What one poll tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// Fetched, cached and broadcast.
    Broadcast,
    /// The fetch failed; nothing changed.
    Failed,
    /// Polling stopped while the fetch was in flight.
    Discarded,
}

impl<T: Transport + 'static> SyncBridge<T> {
    /// Start polling, broadcasting `state-updated` through `emitter`.
    ///
    /// Fetches once immediately, then once per configured interval.
    /// Returns `false` when already polling or when the configured
    /// interval is zero.
    ///
    /// # Panics
    ///
    /// Panics when called outside a `tokio::task::LocalSet`.
    pub fn start_polling(self: &Rc<Self>, emitter: Emitter) -> bool {
        let period = self.config().poll_interval;
        if period.is_zero() {
            warn!("refusing to poll with a zero interval");
            return false;
        }
        let mut slot = self.poll.borrow_mut();
        if slot.is_some() {
            debug!("polling already active");
            return false;
        }
        let token = CancellationToken::new();
        let task = tokio::task::spawn_local(poll_loop(
            Rc::downgrade(self),
            token.clone(),
            emitter.clone(),
            period,
        ));
        *slot = Some(PollHandle {
            token,
            emitter,
            task,
        });
        info!(interval_ms = period.as_millis() as u64, "polling started");
        true
    }

    /// Stop polling. Returns `false` when not polling.
    pub fn stop_polling(&self) -> bool {
        let Some(handle) = self.poll.borrow_mut().take() else {
            return false;
        };
        handle.token.cancel();
        info!(finished = handle.task.is_finished(), "polling stopped");
        true
    }

    /// Stop polling only if the active poll broadcasts through `emitter`.
    pub fn stop_polling_from(&self, emitter: &Emitter) -> bool {
        let owned = self
            .poll
            .borrow()
            .as_ref()
            .is_some_and(|handle| handle.emitter.same_as(emitter));
        if !owned {
            debug!("no poll owned by this emitter");
            return false;
        }
        self.stop_polling()
    }

    #[must_use]
    pub fn is_polling(&self) -> bool {
        self.poll.borrow().is_some()
    }

    /// Run one tick: fetch, then cache and broadcast unless `token` was
    /// cancelled meanwhile.
    pub async fn poll_once(&self, token: &CancellationToken, emitter: &Emitter) -> PollOutcome {
        match self.fetch_overlay_state().await {
            Ok(_) if token.is_cancelled() => {
                warn!("discarding overlay state fetched after polling stopped");
                PollOutcome::Discarded
            }
            Ok(state) => {
                let detail = to_value(&state);
                *self.cache.borrow_mut() = Some(state);
                let reached = emitter.emit(names::STATE_UPDATED, detail);
                debug!(listeners = reached, "overlay state broadcast");
                PollOutcome::Broadcast
            }
            Err(err) => {
                warn!(error = %err, "overlay state poll failed");
                PollOutcome::Failed
            }
        }
    }
}

async fn poll_loop<T: Transport + 'static>(
    bridge: Weak<SyncBridge<T>>,
    token: CancellationToken,
    emitter: Emitter,
    period: Duration,
) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            biased;
            () = token.cancelled() => break,
            _ = ticker.tick() => {}
        }
        let Some(bridge) = bridge.upgrade() else {
            break;
        };
        bridge.poll_once(&token, &emitter).await;
    }
    debug!("poll loop exited");
}
