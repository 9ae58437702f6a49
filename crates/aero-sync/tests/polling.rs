//! Polling lifecycle under paused tokio time.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use aero_core::event::{Event, EventChannel, Target, names};
use aero_core::Emitter;
use aero_sync::memory::{Fault, MemoryBackend};
use aero_sync::{BridgeConfig, OverlayState, PollOutcome, SyncBridge, SyncHost};
use pretty_assertions::assert_eq;
use tokio::task::LocalSet;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

const INTERVAL: Duration = Duration::from_millis(500);

struct Harness {
    backend: Rc<MemoryBackend>,
    bridge: Rc<SyncBridge<Rc<MemoryBackend>>>,
    channel: EventChannel,
    received: Rc<RefCell<Vec<OverlayState>>>,
}

impl Harness {
    fn new() -> Self {
        let backend = Rc::new(MemoryBackend::with_demo_teams());
        let bridge = Rc::new(SyncBridge::new(
            Rc::clone(&backend),
            BridgeConfig::default().with_poll_interval(INTERVAL),
        ));
        let channel = EventChannel::new();
        let received = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&received);
        channel.add_listener(Target::Window, names::STATE_UPDATED, move |event: &Event| {
            if let Ok(state) = serde_json::from_value(event.detail.clone()) {
                sink.borrow_mut().push(state);
            }
        });
        Self {
            backend,
            bridge,
            channel,
            received,
        }
    }

    fn emitter(&self) -> Emitter {
        let node = self.channel.create_node(None, "sync-host");
        Emitter::bound(&self.channel, node)
    }

    fn broadcasts(&self) -> usize {
        self.received.borrow().len()
    }
}

#[tokio::test(start_paused = true)]
async fn first_fetch_is_immediate_then_one_per_interval() {
    LocalSet::new()
        .run_until(async {
            let h = Harness::new();
            assert!(h.bridge.start_polling(h.emitter()));

            sleep(Duration::from_millis(1)).await;
            assert_eq!(h.broadcasts(), 1);

            sleep(INTERVAL).await;
            assert_eq!(h.broadcasts(), 2);

            sleep(INTERVAL * 2).await;
            assert_eq!(h.broadcasts(), 4);
            assert_eq!(h.bridge.cached_state(), h.received.borrow().last().cloned());
            h.bridge.stop_polling();
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn start_twice_equals_once_and_stop_twice_equals_once() {
    LocalSet::new()
        .run_until(async {
            let h = Harness::new();
            let emitter = h.emitter();
            assert!(h.bridge.start_polling(emitter.clone()));
            assert!(!h.bridge.start_polling(emitter));
            assert!(h.bridge.is_polling());

            sleep(Duration::from_millis(1)).await;
            sleep(INTERVAL).await;
            assert_eq!(h.broadcasts(), 2);

            assert!(h.bridge.stop_polling());
            assert!(!h.bridge.stop_polling());
            assert!(!h.bridge.is_polling());

            sleep(INTERVAL * 4).await;
            assert_eq!(h.broadcasts(), 2);
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn failed_poll_keeps_last_broadcast() {
    LocalSet::new()
        .run_until(async {
            let h = Harness::new();
            h.bridge.start_polling(h.emitter());
            sleep(Duration::from_millis(1)).await;
            let before = h.bridge.cached_state();
            assert!(before.is_some());

            // Backend changes, but the next two ticks fail.
            h.bridge.show_overlay(Some("team001")).await.unwrap();
            h.backend.push_fault(Fault::Network);
            h.backend.push_fault(Fault::Status(503));
            sleep(INTERVAL * 2).await;

            assert_eq!(h.broadcasts(), 1);
            assert_eq!(h.bridge.cached_state(), before);

            sleep(INTERVAL).await;
            assert_eq!(h.broadcasts(), 2);
            let latest = h.bridge.cached_state().unwrap();
            assert!(latest.visible);
            assert_eq!(latest.active_team_id(), Some("team001"));
            h.bridge.stop_polling();
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn response_after_stop_is_discarded() {
    LocalSet::new()
        .run_until(async {
            let h = Harness::new();
            h.backend.set_delay(Duration::from_millis(200));
            h.bridge.start_polling(h.emitter());

            // The first fetch is in flight.
            sleep(Duration::from_millis(50)).await;
            assert_eq!(h.backend.request_count(), 1);
            h.bridge.stop_polling();

            sleep(Duration::from_secs(2)).await;
            assert_eq!(h.broadcasts(), 0);
            assert_eq!(h.bridge.cached_state(), None);
            assert_eq!(h.backend.request_count(), 1);
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn poll_once_reports_outcomes() {
    let h = Harness::new();
    let emitter = h.emitter();
    let token = CancellationToken::new();

    assert_eq!(h.bridge.poll_once(&token, &emitter).await, PollOutcome::Broadcast);
    h.backend.push_fault(Fault::Network);
    assert_eq!(h.bridge.poll_once(&token, &emitter).await, PollOutcome::Failed);
    token.cancel();
    assert_eq!(h.bridge.poll_once(&token, &emitter).await, PollOutcome::Discarded);
    assert_eq!(h.broadcasts(), 1);
}

#[tokio::test(start_paused = true)]
async fn refresh_broadcasts_only_while_polling() {
    LocalSet::new()
        .run_until(async {
            let h = Harness::new();
            h.bridge.refresh().await.unwrap();
            assert_eq!(h.broadcasts(), 0);
            assert!(h.bridge.cached_state().is_some());

            h.bridge.start_polling(h.emitter());
            sleep(Duration::from_millis(1)).await;
            h.bridge.refresh().await.unwrap();
            assert_eq!(h.broadcasts(), 2);
            h.bridge.stop_polling();
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn sync_host_detach_stops_polling() {
    LocalSet::new()
        .run_until(async {
            let h = Harness::new();
            let app = h.channel.create_node(None, "app");
            let mut host = SyncHost::new(Rc::clone(&h.bridge)).with_auto_poll();
            host.attach(&h.channel, Some(app));
            assert!(host.is_polling());

            sleep(Duration::from_millis(1)).await;
            assert_eq!(h.broadcasts(), 1);

            host.detach();
            assert!(!h.bridge.is_polling());
            assert!(!host.start_polling());
            sleep(INTERVAL * 3).await;
            assert_eq!(h.broadcasts(), 1);
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn sync_host_without_auto_poll_waits_for_start() {
    LocalSet::new()
        .run_until(async {
            let h = Harness::new();
            let mut host = SyncHost::new(Rc::clone(&h.bridge));
            assert!(!host.start_polling());
            host.attach(&h.channel, None);
            assert!(!host.is_polling());

            assert!(host.start_polling());
            sleep(Duration::from_millis(1)).await;
            assert_eq!(h.broadcasts(), 1);
            drop(host);
            assert!(!h.bridge.is_polling());
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn dropping_the_bridge_ends_the_task() {
    LocalSet::new()
        .run_until(async {
            let h = Harness::new();
            h.bridge.start_polling(h.emitter());
            sleep(Duration::from_millis(1)).await;
            let Harness {
                backend,
                bridge,
                received,
                channel: _channel,
            } = h;
            drop(bridge);
            sleep(INTERVAL * 3).await;
            assert_eq!(received.borrow().len(), 1);
            assert_eq!(backend.request_count(), 1);
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn zero_interval_never_starts() {
    LocalSet::new()
        .run_until(async {
            let h = Harness::new();
            let bridge = Rc::new(SyncBridge::new(
                Rc::clone(&h.backend),
                BridgeConfig::default().with_poll_interval(Duration::ZERO),
            ));
            assert!(!bridge.start_polling(h.emitter()));
            assert!(!bridge.is_polling());

            sleep(INTERVAL).await;
            assert_eq!(h.broadcasts(), 0);
            assert_eq!(bridge.cached_state(), None);
            assert_eq!(h.backend.request_count(), 0);
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn detaching_a_host_leaves_a_foreign_poll_running() {
    LocalSet::new()
        .run_until(async {
            let h = Harness::new();
            assert!(h.bridge.start_polling(h.emitter()));

            let mut host = SyncHost::new(Rc::clone(&h.bridge)).with_auto_poll();
            host.attach(&h.channel, None);
            assert!(!host.stop_polling());
            host.detach();
            assert!(h.bridge.is_polling());

            sleep(Duration::from_millis(1)).await;
            sleep(INTERVAL).await;
            assert_eq!(h.broadcasts(), 2);
            assert!(h.bridge.stop_polling());
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn host_stops_only_its_own_poll() {
    LocalSet::new()
        .run_until(async {
            let h = Harness::new();
            let mut host = SyncHost::new(Rc::clone(&h.bridge));
            host.attach(&h.channel, None);
            assert!(host.start_polling());
            assert!(!h.bridge.stop_polling_from(&h.emitter()));
            assert!(h.bridge.is_polling());

            assert!(host.stop_polling());
            assert!(!h.bridge.is_polling());
        })
        .await;
}
