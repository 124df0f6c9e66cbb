//! Request/acknowledge protocol of the card reader.
//!
//! An exchange is strictly ordered:
//!
//! ```text
//! drain stale bytes -> send request -> wait for data-ready -> receive
//! ```
//!
//! Identifier answers start with [`READER_ACK`]; nothing after a wrong first
//! byte is trusted. The identifier follows last byte first and is stored
//! back to front, so the assembled [`CardId`] is in host order. The link has
//! no framing and no flush, so after any failed read whatever the reader
//! still holds is drained before the next request.

use crate::busy_wait::poll_until;
use crate::error::{ReadError, Result};
use crate::traits::{ReaderBus, Watchdog};
use farepoint_core::constants::{
    CARD_ID_LEN, DEFAULT_READER_DRAIN_LIMIT, DEFAULT_READER_READY_POLL_LIMIT, READER_ACK,
    READER_CMD_IDENTIFIER, READER_CMD_STATUS, READER_FILLER,
};
use farepoint_core::{CardId, TimingConfig};
use tracing::{debug, trace, warn};

/// Poll bounds of the link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkLimits {
    /// Polls of the data-ready line per received byte.
    pub ready_polls: u32,
    /// Stale bytes drained before giving up on an empty buffer.
    pub drain_bytes: u32,
}

impl Default for LinkLimits {
    fn default() -> Self {
        Self {
            ready_polls: DEFAULT_READER_READY_POLL_LIMIT,
            drain_bytes: DEFAULT_READER_DRAIN_LIMIT,
        }
    }
}

impl From<&TimingConfig> for LinkLimits {
    fn from(timing: &TimingConfig) -> Self {
        Self {
            ready_polls: timing.reader_ready_poll_limit,
            drain_bytes: timing.reader_drain_limit,
        }
    }
}

/// Card reader protocol on top of a [`ReaderBus`].
#[derive(Debug)]
pub struct CardLink<B> {
    bus: B,
    limits: LinkLimits,
}

impl<B: ReaderBus> CardLink<B> {
    pub fn new(bus: B) -> Self {
        Self::with_limits(bus, LinkLimits::default())
    }

    pub fn with_limits(bus: B, limits: LinkLimits) -> Self {
        Self { bus, limits }
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    /// Read the card-present line. No bytes move on the link.
    pub fn is_card_present(&mut self) -> bool {
        self.bus.card_present()
    }

    /// Read the identifier of the card in the field.
    ///
    /// Each call starts from a cleared identifier, so bytes from an earlier
    /// failed read can never leak into this one.
    ///
    /// # Errors
    ///
    /// - [`ReadError::NotAcknowledged`] if the first byte is not the ack.
    /// - [`ReadError::CardRemoved`] if the card leaves mid-read.
    /// - [`ReadError::NotReady`] if the reader stops answering.
    pub fn read_identifier<W>(&mut self, watchdog: &mut W) -> Result<CardId>
    where
        W: Watchdog + ?Sized,
    {
        let mut id = [0u8; CARD_ID_LEN];

        let result = self.fill_identifier(&mut id, watchdog);
        match result {
            Ok(()) => {
                let id = CardId::new(id);
                debug!(card_id = %id, "Card identifier read");
                Ok(id)
            }
            Err(err) => {
                warn!(error = %err, "Card identifier read failed");
                self.drain();
                Err(err)
            }
        }
    }

    /// Ask the reader for its status byte.
    ///
    /// # Errors
    ///
    /// Returns [`ReadError::NotReady`] if no answer arrives.
    pub fn query_status<W>(&mut self, watchdog: &mut W) -> Result<u8>
    where
        W: Watchdog + ?Sized,
    {
        self.request(READER_CMD_STATUS);
        self.wait_ready(watchdog)?;
        let status = self.receive();
        debug!(status = format_args!("{status:#04X}"), "Reader status");
        Ok(status)
    }

    fn fill_identifier<W>(&mut self, id: &mut [u8; CARD_ID_LEN], watchdog: &mut W) -> Result<()>
    where
        W: Watchdog + ?Sized,
    {
        self.request(READER_CMD_IDENTIFIER);
        self.wait_ready(watchdog)?;

        let ack = self.receive();
        if ack != READER_ACK {
            return Err(ReadError::not_acknowledged(ack));
        }

        for (bytes_read, slot) in id.iter_mut().rev().enumerate() {
            if !self.bus.card_present() {
                return Err(ReadError::card_removed(bytes_read));
            }
            self.wait_ready(watchdog)?;
            *slot = self.receive();
        }
        Ok(())
    }

    /// Drain, then clock out a request byte.
    fn request(&mut self, command: u8) {
        self.drain();
        trace!(byte = format_args!("{command:#04X}"), "Reader request");
        self.bus.transfer(command);
    }

    /// Receive pending bytes until the data-ready line drops.
    fn drain(&mut self) -> u32 {
        let mut drained = 0;
        while drained < self.limits.drain_bytes && self.bus.data_ready() {
            let stale = self.receive();
            trace!(byte = format_args!("{stale:#04X}"), "Drained stale byte");
            drained += 1;
        }
        if drained == self.limits.drain_bytes && self.bus.data_ready() {
            warn!(drained, "Reader still has data after drain limit");
        }
        drained
    }

    fn wait_ready<W>(&mut self, watchdog: &mut W) -> Result<()>
    where
        W: Watchdog + ?Sized,
    {
        let bus = &mut self.bus;
        poll_until(watchdog, self.limits.ready_polls, || bus.data_ready())?;
        Ok(())
    }

    fn receive(&mut self) -> u8 {
        let byte = self.bus.transfer(READER_FILLER);
        trace!(byte = format_args!("{byte:#04X}"), "Reader byte");
        byte
    }
}
