//! Simulated fare host.
//!
//! The host drives the communications-poll interrupt: every poll interval it
//! collects the terminal's outbound report, and it sends keep-alives at
//! twice the tick rate. Card reports are answered with whatever decision the
//! script has set.

use farepoint_core::{HostResponse, Outcome};
use farepoint_protocol::{CommandCode, Payload, SetupFrame, SetupReply, encode_response};
use farepoint_terminal::HostChannel;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, info, warn};

/// Behaviour of the host, changed by the script while the simulation runs.
#[derive(Debug)]
pub struct HostModel {
    silent: AtomicBool,
    answering: AtomicBool,
    decision: Mutex<HostResponse>,
}

impl Default for HostModel {
    fn default() -> Self {
        Self {
            silent: AtomicBool::new(false),
            answering: AtomicBool::new(true),
            decision: Mutex::new(HostResponse::new(Outcome::CheckedIn, 350, 0)),
        }
    }
}

impl HostModel {
    /// Stop or resume keep-alives.
    pub fn set_silent(&self, silent: bool) {
        self.silent.store(silent, Ordering::Relaxed);
    }

    pub fn is_silent(&self) -> bool {
        self.silent.load(Ordering::Relaxed)
    }

    /// Answer the next card reports with `decision`.
    pub fn answer_with(&self, decision: HostResponse) {
        *self.decision.lock().unwrap_or_else(PoisonError::into_inner) = decision;
        self.answering.store(true, Ordering::Relaxed);
    }

    /// Leave card reports unanswered.
    pub fn ignore_cards(&self) {
        self.answering.store(false, Ordering::Relaxed);
    }

    /// React to a report from the terminal.
    pub fn on_report(&self, channel: &HostChannel<'_>, report: &Payload) {
        info!(report = ?report.as_slice(), "Host received card report");
        if !self.answering.load(Ordering::Relaxed) {
            debug!("Host ignoring card report");
            return;
        }

        let decision = *self.decision.lock().unwrap_or_else(PoisonError::into_inner);
        let payload = encode_response(&decision);
        let frame = SetupFrame::new(CommandCode::Response, [0, 0], payload.len() as u16);
        if channel.on_command(&frame) == SetupReply::AwaitPayload {
            channel.on_payload(&payload);
        }
    }
}

/// Identify the terminal and check the loopback once, as a host does when
/// a device attaches.
pub fn attach(channel: &HostChannel<'_>) {
    match channel.on_command(&SetupFrame::command_only(CommandCode::Identify)) {
        SetupReply::Data(id) => info!(device_id = ?id.as_slice(), "Terminal identified"),
        other => warn!(?other, "Unexpected Identify reply"),
    }

    let loopback = [0x5A, 0xA5];
    match channel.on_command(&SetupFrame::new(CommandCode::Echo, loopback, 0)) {
        SetupReply::Data(echo) if echo.as_slice() == loopback => debug!("Echo check passed"),
        other => warn!(?other, "Echo check failed"),
    }
}

/// Run the host side of the channel until the task is aborted.
pub async fn run(
    channel: &'static HostChannel<'static>,
    model: &'static HostModel,
    poll_every: Duration,
    keep_alive_every: Duration,
) {
    let mut poll = interval(poll_every);
    poll.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut keep_alive = interval(keep_alive_every);
    keep_alive.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = poll.tick() => {
                if let Some(report) = channel.poll() {
                    model.on_report(channel, &report);
                }
            }
            _ = keep_alive.tick() => {
                if !model.is_silent() {
                    channel.on_command(&SetupFrame::command_only(CommandCode::KeepAlive));
                }
            }
        }
    }
}
