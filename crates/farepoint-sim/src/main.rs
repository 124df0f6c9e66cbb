//! Runs a farepoint terminal against a simulated reader, display and host.
//!
//! The main loop runs on a blocking thread; the two interrupts (the
//! communications poll and the keep-alive tick) are tokio interval tasks.

mod devices;
mod host;
mod script;

use anyhow::{Context, Result};
use clap::Parser;
use devices::{ConsoleFeedback, SleepDelay};
use farepoint_core::{MessageTable, TerminalConfig};
use farepoint_hardware::mock::{CountingWatchdog, MockReaderBus};
use farepoint_terminal::{HostChannel, KeepAliveMonitor, SharedState, Terminal};
use host::HostModel;
use script::Script;
use serde_json::json;
use static_cell::StaticCell;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;
use tokio::time::{MissedTickBehavior, interval};
use tracing::info;
use tracing_subscriber::EnvFilter;

static SHARED: SharedState = SharedState::new();
static CHANNEL: StaticCell<HostChannel<'static>> = StaticCell::new();
static HOST: StaticCell<HostModel> = StaticCell::new();

/// Simulated farepoint check-in/check-out terminal.
#[derive(Parser, Debug)]
#[command(name = "farepoint-sim", version)]
struct Cli {
    /// Terminal configuration (JSON); defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Use the Danish message table.
    #[arg(long, default_value_t = false)]
    danish: bool,
    /// Customer and host script (JSON); a demo runs when omitted.
    #[arg(long)]
    script: Option<PathBuf>,
    /// Seconds to keep running after the script's last action.
    #[arg(long, default_value = "3")]
    linger_secs: u64,
    /// Pause between main-loop iterations, in microseconds.
    #[arg(long, default_value = "100")]
    loop_pause_us: u64,
    /// Write display events and state transitions to this file as JSON.
    #[arg(long)]
    transcript: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => TerminalConfig::load(path)
            .with_context(|| format!("loading configuration {}", path.display()))?,
        None => TerminalConfig::default(),
    };
    if cli.danish {
        config.messages = MessageTable::danish();
    }
    let script = match &cli.script {
        Some(path) => Script::load(path)?,
        None => Script::demo(),
    };
    let timing = config.timing.clone();

    let monitor = KeepAliveMonitor::with_window(&SHARED, timing.keep_alive_window_ticks);
    let channel: &'static HostChannel<'static> =
        CHANNEL.init(HostChannel::new(&SHARED, monitor, config.device_id));
    let host: &'static HostModel = HOST.init(HostModel::default());

    let (bus, reader) = MockReaderBus::new();
    let (feedback, display) = ConsoleFeedback::new();
    let watchdog = CountingWatchdog::new();
    let mut terminal = Terminal::builder(&SHARED, channel)
        .with_config(config)
        .build(bus, feedback, watchdog.clone(), SleepDelay);

    host::attach(channel);

    let tick_every = Duration::from_millis(timing.keep_alive_tick_ms);
    let timer = tokio::spawn(async move {
        let mut ticks = interval(tick_every);
        ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        ticks.tick().await;
        loop {
            ticks.tick().await;
            channel.monitor().tick();
        }
    });
    let comms = tokio::spawn(host::run(
        channel,
        host,
        Duration::from_millis(timing.host_poll_interval_ms),
        (tick_every / 2).max(Duration::from_millis(1)),
    ));

    let run_for = script.duration() + Duration::from_secs(cli.linger_secs);
    let player = tokio::spawn(script::run(script, reader, host));

    let stop = Arc::new(AtomicBool::new(false));
    let pause = Duration::from_micros(cli.loop_pause_us);
    let main_loop = tokio::task::spawn_blocking({
        let stop = Arc::clone(&stop);
        move || {
            while !stop.load(Ordering::Relaxed) {
                terminal.step();
                if pause.is_zero() {
                    thread::yield_now();
                } else {
                    thread::sleep(pause);
                }
            }
            terminal
        }
    });

    info!(?run_for, "Simulation running");
    tokio::time::sleep(run_for).await;
    stop.store(true, Ordering::Relaxed);
    timer.abort();
    comms.abort();
    player.abort();

    let terminal = main_loop.await.context("main loop panicked")?;
    info!(
        steps = terminal.steps(),
        watchdog_kicks = watchdog.kicks(),
        state = %terminal.state(),
        "Simulation finished"
    );

    if let Some(path) = &cli.transcript {
        let transcript = json!({
            "transitions": terminal.history(),
            "feedback": display.events(),
        });
        std::fs::write(path, serde_json::to_string_pretty(&transcript)?)
            .with_context(|| format!("writing transcript {}", path.display()))?;
        info!(path = %path.display(), "Transcript written");
    }

    Ok(())
}
