//! Host channel: the bridge between the channel driver and the terminal.
//!
//! The driver runs in the communications-poll interrupt. It hands every
//! setup frame to [`HostChannel::on_command`] and every payload frame to
//! [`HostChannel::on_payload`], and once per poll collects the next outbound
//! report with [`HostChannel::poll`]. The main loop queues reports with
//! [`HostChannel::send`] or [`HostChannel::send_blocking`].
//!
//! Completed messages are applied here, so no callback touches terminal
//! data ad hoc:
//!
//! - `Response` is offered to the shared response slot; it is dropped unless
//!   a transaction is waiting for it.
//! - `KeepAlive` goes to the [`KeepAliveMonitor`].
//! - `Echo` payloads are queued back to the host.

use crate::keep_alive::KeepAliveMonitor;
use crate::shared::{Delivery, SharedState};
use core::cell::RefCell;
use critical_section::Mutex;
use farepoint_core::HostResponse;
use farepoint_hardware::Watchdog;
use farepoint_hardware::busy_wait::poll_until;
use farepoint_protocol::{CommandCode, HostDecoder, HostMessage, Payload, SetupFrame, SetupReply};
use tracing::{debug, info, trace, warn};

/// Why an outbound report was not queued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SendError {
    #[error("Host channel busy")]
    Busy,

    #[error("Host channel not ready after {polls} polls")]
    Timeout { polls: u32 },

    #[error("Report of {len} bytes exceeds the report size")]
    TooLong { len: usize },
}

#[derive(Debug, Default)]
struct Outbound {
    /// Report handed to the driver on the next poll.
    report: Option<Payload>,
    /// Echo waiting for the report slot to free up.
    echo: Option<Payload>,
}

pub struct HostChannel<'a> {
    shared: &'a SharedState,
    monitor: KeepAliveMonitor<'a>,
    decoder: Mutex<RefCell<HostDecoder>>,
    outbound: Mutex<RefCell<Outbound>>,
}

impl<'a> HostChannel<'a> {
    pub fn new(shared: &'a SharedState, monitor: KeepAliveMonitor<'a>, device_id: u8) -> Self {
        Self {
            shared,
            monitor,
            decoder: Mutex::new(RefCell::new(HostDecoder::new(device_id))),
            outbound: Mutex::new(RefCell::new(Outbound::default())),
        }
    }

    pub fn monitor(&self) -> &KeepAliveMonitor<'a> {
        &self.monitor
    }

    /// Setup stage of a host exchange.
    ///
    /// Returns what the driver answers. Unknown commands get an empty reply.
    pub fn on_command(&self, frame: &SetupFrame) -> SetupReply {
        let decoded = critical_section::with(|cs| self.decoder.borrow_ref_mut(cs).on_command(frame));

        match decoded {
            Ok(setup) => {
                if let Some(message) = setup.message {
                    self.apply(message);
                }
                setup.reply
            }
            Err(err) => {
                warn!(error = %err, "Rejected host command");
                SetupReply::Empty
            }
        }
    }

    /// Payload stage of a host exchange.
    ///
    /// A Response payload that cannot be decoded still answers the waiting
    /// transaction, with a generic error.
    pub fn on_payload(&self, payload: &[u8]) {
        let (pending, decoded) = critical_section::with(|cs| {
            let mut decoder = self.decoder.borrow_ref_mut(cs);
            let pending = decoder.pending_command();
            (pending, decoder.on_payload(payload))
        });

        match decoded {
            Ok(Some(message)) => self.apply(message),
            Ok(None) => {
                debug!(len = payload.len(), "Payload without a pending command ignored");
            }
            Err(err) if pending == Some(CommandCode::Response) => {
                warn!(error = %err, "Malformed host response");
                self.deliver(HostResponse::generic_error());
            }
            Err(err) => warn!(error = %err, "Rejected host payload"),
        }
    }

    /// Collect the report to transmit this poll cycle.
    pub fn poll(&self) -> Option<Payload> {
        critical_section::with(|cs| {
            let mut outbound = self.outbound.borrow_ref_mut(cs);
            let report = outbound.report.take().or_else(|| outbound.echo.take());
            if report.is_none() {
                return None;
            }
            // A waiting echo moves up once the slot is free.
            if outbound.report.is_none() {
                outbound.report = outbound.echo.take();
            }
            report
        })
    }

    /// Whether the report slot can take a new report.
    pub fn is_ready(&self) -> bool {
        critical_section::with(|cs| self.outbound.borrow_ref(cs).report.is_none())
    }

    /// Queue a report for the next poll without waiting.
    ///
    /// # Errors
    ///
    /// [`SendError::Busy`] if a report is still queued and
    /// [`SendError::TooLong`] for more than 8 bytes.
    pub fn send(&self, bytes: &[u8]) -> Result<(), SendError> {
        let report = Payload::from_slice(bytes).map_err(|_| SendError::TooLong { len: bytes.len() })?;

        critical_section::with(|cs| {
            let mut outbound = self.outbound.borrow_ref_mut(cs);
            if outbound.report.is_some() {
                return Err(SendError::Busy);
            }
            outbound.report = Some(report);
            Ok(())
        })?;

        trace!(len = bytes.len(), "Report queued");
        Ok(())
    }

    /// Queue `bytes`, retrying while the report slot is busy and kicking the
    /// watchdog between attempts.
    ///
    /// At most `limit` attempts are made in total.
    ///
    /// # Errors
    ///
    /// [`SendError::Timeout`] if the slot stays busy for `limit` attempts and
    /// [`SendError::TooLong`] for more than 8 bytes.
    pub fn send_blocking<W>(&self, bytes: &[u8], watchdog: &mut W, limit: u32) -> Result<(), SendError>
    where
        W: Watchdog + ?Sized,
    {
        let mut sent = Ok(());
        poll_until(watchdog, limit, || match self.send(bytes) {
            Err(SendError::Busy) => false,
            other => {
                sent = other;
                true
            }
        })
        .map_err(|timeout| SendError::Timeout { polls: timeout.polls })?;
        sent
    }

    fn apply(&self, message: HostMessage) {
        match message {
            HostMessage::Response(response) => self.deliver(response),
            HostMessage::KeepAlive => {
                self.monitor.signal();
            }
            HostMessage::Identify => debug!("Identify answered"),
            HostMessage::Echo(payload) => self.queue_echo(payload),
        }
    }

    fn deliver(&self, response: HostResponse) {
        let outcome = response.outcome();
        match self.shared.offer_response(response) {
            Delivery::Accepted => info!(%outcome, "Host response received"),
            Delivery::Dropped => warn!(%outcome, "Host response dropped, no transaction waiting"),
        }
    }

    fn queue_echo(&self, payload: Payload) {
        let replaced = critical_section::with(|cs| {
            let mut outbound = self.outbound.borrow_ref_mut(cs);
            if outbound.report.is_none() {
                outbound.report = Some(payload);
                false
            } else {
                outbound.echo.replace(payload).is_some()
            }
        });
        if replaced {
            debug!("Older echo replaced before it was sent");
        }
    }
}
