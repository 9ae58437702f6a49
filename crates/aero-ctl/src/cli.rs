use std::io::Write;
use std::rc::Rc;
use std::time::Duration;

use aero_sync::config::{DEFAULT_BASE_URL, ENV_API_BASE, ENV_POLL_MS, ENV_TIMEOUT_MS};
use aero_sync::{BridgeConfig, FlightResult, FlightStatus, SyncBridge, Transport};
use clap::{Args, Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::error::{CtlError, Result};
use crate::logging::{self, Verbosity};
use crate::output::{self, OutputFormat};
use crate::watch;

#[derive(Debug, Parser)]
#[command(
    name = "aero-ctl",
    about = "Operator console for the Aero Design competition overlay",
    version
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Args)]
pub struct GlobalArgs {
    /// Base URL of the overlay API.
    #[arg(long, global = true, env = ENV_API_BASE, default_value = DEFAULT_BASE_URL)]
    pub api_base: String,

    /// Poll interval in milliseconds (watch only).
    #[arg(long, global = true, env = ENV_POLL_MS, default_value_t = 500)]
    pub poll_ms: u64,

    /// Per-request timeout in milliseconds.
    #[arg(long, global = true, env = ENV_TIMEOUT_MS)]
    pub timeout_ms: Option<u64>,

    /// Print results as JSON lines.
    #[arg(long, global = true)]
    pub json: bool,

    /// Emit logs as JSON on stderr.
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Debug logging.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Errors only.
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,
}

impl GlobalArgs {
    /// Bridge configuration from the flags (and their env fallbacks).
    pub fn config(&self) -> Result<BridgeConfig> {
        let config = BridgeConfig::default()
            .with_base_url(self.api_base.clone())
            .with_poll_interval(Duration::from_millis(self.poll_ms))
            .with_request_timeout(self.timeout_ms.map(Duration::from_millis));
        config.validate()?;
        Ok(config)
    }

    #[must_use]
    pub fn format(&self) -> OutputFormat {
        if self.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// List all teams.
    Teams,

    /// Show one team with its flight results.
    Team { id: String },

    /// Print the current overlay state.
    State,

    /// Make the overlay visible.
    Show {
        /// Team to put on the overlay.
        #[arg(long)]
        team: Option<String>,
    },

    /// Hide the overlay.
    Hide,

    /// Flip overlay visibility.
    Toggle,

    /// Set a team's current battery.
    Battery { id: String, battery: u32 },

    /// Record a flight result for a team.
    Result {
        id: String,

        #[arg(long)]
        battery: u32,

        /// validated, invalidated, pending or not_flown.
        #[arg(long)]
        status: FlightStatus,

        #[arg(long)]
        score: Option<f64>,

        #[arg(long)]
        notes: Option<String>,
    },

    /// Set the custom message; clears it when no text is given.
    Message { text: Option<String> },

    /// Poll the overlay state and print the status line per update.
    Watch {
        /// Stop after this many updates.
        #[arg(long)]
        ticks: Option<u64>,
    },
}

pub fn run_from_env() -> Result<()> {
    let cli = Cli::parse();
    logging::init_subscriber(
        Verbosity::from_flags(cli.global.verbose, cli.global.quiet),
        cli.global.log_json,
    );
    run(cli)
}

/// Connect to the configured backend and run one command on a
/// single-threaded runtime. Ctrl-C cancels long-running commands.
pub fn run(cli: Cli) -> Result<()> {
    let Cli { global, command } = cli;
    let config = global.config()?;
    let format = global.format();
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|err| CtlError::runtime(format!("cannot start async runtime: {err}")))?;
    let local = tokio::task::LocalSet::new();
    local.block_on(&runtime, async move {
        debug!(base_url = %config.base_url, "connecting");
        let bridge = SyncBridge::connect(config)?;
        let shutdown = CancellationToken::new();
        let on_signal = shutdown.clone();
        tokio::task::spawn_local(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("interrupted");
                on_signal.cancel();
            }
        });
        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        let outcome = execute(&bridge, command, format, &shutdown, &mut out).await;
        shutdown.cancel();
        outcome
    })
}

/// Run `command` against `bridge`, writing the result to `out`.
pub async fn execute<T: Transport + 'static>(
    bridge: &Rc<SyncBridge<T>>,
    command: Commands,
    format: OutputFormat,
    shutdown: &CancellationToken,
    out: &mut dyn Write,
) -> Result<()> {
    match command {
        Commands::Teams => output::teams(out, format, &bridge.fetch_teams().await?),
        Commands::Team { id } => output::team(out, format, &bridge.fetch_team(&id).await?),
        Commands::State => output::overlay_state(out, format, &bridge.fetch_overlay_state().await?),
        Commands::Show { team } => {
            let team = team.filter(|id| !id.trim().is_empty());
            let state = bridge.show_overlay(team.as_deref()).await?;
            output::overlay_state(out, format, &state)
        }
        Commands::Hide => output::overlay_state(out, format, &bridge.hide_overlay().await?),
        Commands::Toggle => output::overlay_state(out, format, &bridge.toggle_overlay().await?),
        Commands::Battery { id, battery } => {
            let team = bridge.update_current_battery(&id, battery).await?;
            output::team(out, format, &team)
        }
        Commands::Result {
            id,
            battery,
            status,
            score,
            notes,
        } => {
            let mut result = FlightResult::new(battery, status);
            if let Some(score) = score {
                if !score.is_finite() {
                    return Err(CtlError::invalid(format!("score must be finite, got {score}")));
                }
                result = result.with_score(score);
            }
            if let Some(notes) = notes {
                result = result.with_notes(notes);
            }
            let reply = bridge.add_flight_result(&id, &result).await?;
            output::flight_result_reply(out, format, &reply)
        }
        Commands::Message { text } => {
            let state = bridge.set_custom_message(text.as_deref()).await?;
            output::overlay_state(out, format, &state)
        }
        Commands::Watch { ticks } => {
            if ticks == Some(0) {
                return Err(CtlError::invalid("--ticks must be at least 1"));
            }
            let seen = watch::watch(bridge, ticks, format, shutdown, out).await?;
            debug!(updates = seen, "watch finished");
            Ok(())
        }
    }
}
