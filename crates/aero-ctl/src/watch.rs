//! `aero-ctl watch`: mount the control panel with polling on and print the
//! status indicator after every `state-updated` broadcast.

use std::io::Write;
use std::rc::Rc;

use aero_core::event::names;
use aero_core::{Event, Target};
use aero_sync::{SyncBridge, Transport};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::error::Result;
use crate::output::{self, OutputFormat};
use crate::panel::ControlPanel;

/// Watch until `ticks` updates were printed (forever when `None`) or
/// `shutdown` fires. Returns the number of updates printed.
pub async fn watch<T: Transport + 'static>(
    bridge: &Rc<SyncBridge<T>>,
    ticks: Option<u64>,
    format: OutputFormat,
    shutdown: &CancellationToken,
    out: &mut dyn Write,
) -> Result<u64> {
    let mut panel = ControlPanel::new(Rc::clone(bridge), true);
    // Registered before the first await so the immediate poll is seen.
    let (tx, mut rx) = mpsc::unbounded_channel();
    let listener = panel
        .channel()
        .add_listener(Target::Window, names::STATE_UPDATED, move |_: &Event| {
            let _ = tx.send(());
        });

    match panel.load_teams().await {
        Ok(count) => info!(teams = count, "team list loaded"),
        Err(err) => warn!(error = %err, "could not load teams; continuing"),
    }

    let mut printed = 0;
    while ticks.is_none_or(|limit| printed < limit) {
        tokio::select! {
            biased;
            () = shutdown.cancelled() => break,
            update = rx.recv() => {
                if update.is_none() {
                    break;
                }
            }
        }
        printed += 1;
        match (format, panel.last_state()) {
            (OutputFormat::Json, Some(state)) => output::overlay_state(out, format, &state)?,
            _ => writeln!(out, "{}", panel.status_line())?,
        }
        out.flush()?;
    }

    if let Some(id) = listener {
        panel.channel().remove_listener(Target::Window, id);
    }
    panel.close();
    Ok(printed)
}
