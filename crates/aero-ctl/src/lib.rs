#![forbid(unsafe_code)]

//! Operator console for the Aero overlay.
//!
//! One-shot commands call the sync bridge and print the result; `watch`
//! mounts the headless [`panel::ControlPanel`] and follows the polled
//! overlay state.

pub mod cli;
pub mod error;
pub mod logging;
pub mod output;
pub mod panel;
pub mod watch;

pub use cli::{Cli, Commands, execute, run, run_from_env};
pub use error::{CtlError, Result};
pub use panel::ControlPanel;
