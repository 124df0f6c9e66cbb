//! Mock card reader for testing and development.
//!
//! The mock behaves like the real reader at the byte level: a request byte
//! queues an answer, the data-ready line is high while answer bytes are
//! pending, and every filler byte clocks one of them out. Faults are
//! scripted through [`MockReaderHandle`].

use super::lock;
use crate::traits::ReaderBus;
use farepoint_core::CardId;
use farepoint_core::constants::{
    READER_ACK, READER_CMD_IDENTIFIER, READER_CMD_STATUS, READER_FILLER,
};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Byte clocked in when the reader has nothing to send.
const IDLE_BYTE: u8 = 0xFF;

#[derive(Debug)]
struct ReaderState {
    card: Option<CardId>,
    ack: u8,
    status: u8,
    /// Bytes still to be delivered.
    outbox: VecDeque<u8>,
    /// Request bytes received, in order.
    requests: Vec<u8>,
    /// Card leaves after this many more delivered bytes.
    remove_after: Option<usize>,
    ready_delay: u32,
    ready_countdown: u32,
    unresponsive: bool,
}

impl Default for ReaderState {
    fn default() -> Self {
        Self {
            card: None,
            ack: READER_ACK,
            status: 0,
            outbox: VecDeque::new(),
            requests: Vec::new(),
            remove_after: None,
            ready_delay: 0,
            ready_countdown: 0,
            unresponsive: false,
        }
    }
}

/// Simulated reader link.
///
/// # Examples
///
/// ```
/// use farepoint_core::CardId;
/// use farepoint_hardware::ReaderBus;
/// use farepoint_hardware::mock::MockReaderBus;
///
/// let (mut bus, handle) = MockReaderBus::new();
/// assert!(!bus.card_present());
///
/// handle.present_card(CardId::new([1, 2, 3, 4, 5, 6, 7, 8]));
/// assert!(bus.card_present());
/// ```
#[derive(Debug, Clone)]
pub struct MockReaderBus {
    state: Arc<Mutex<ReaderState>>,
}

/// Handle for scripting a [`MockReaderBus`].
#[derive(Debug, Clone)]
pub struct MockReaderHandle {
    state: Arc<Mutex<ReaderState>>,
}

impl MockReaderBus {
    /// Create a reader with no card in the field.
    ///
    /// Returns a tuple of (MockReaderBus, MockReaderHandle) where the handle
    /// scripts cards and faults.
    pub fn new() -> (Self, MockReaderHandle) {
        let state = Arc::new(Mutex::new(ReaderState::default()));
        (
            Self {
                state: Arc::clone(&state),
            },
            MockReaderHandle { state },
        )
    }
}

impl ReaderBus for MockReaderBus {
    fn card_present(&mut self) -> bool {
        lock(&self.state).card.is_some()
    }

    fn data_ready(&mut self) -> bool {
        let mut state = lock(&self.state);
        if state.unresponsive {
            return false;
        }
        if state.ready_countdown > 0 {
            state.ready_countdown -= 1;
            return false;
        }
        !state.outbox.is_empty()
    }

    fn transfer(&mut self, byte: u8) -> u8 {
        let mut state = lock(&self.state);

        if byte == READER_FILLER {
            let Some(out) = state.outbox.pop_front() else {
                return IDLE_BYTE;
            };
            if let Some(remaining) = state.remove_after.as_mut() {
                *remaining = remaining.saturating_sub(1);
                if *remaining == 0 {
                    state.remove_after = None;
                    state.card = None;
                }
            }
            return out;
        }

        state.requests.push(byte);
        if state.unresponsive {
            return IDLE_BYTE;
        }
        state.ready_countdown = state.ready_delay;

        match byte {
            READER_CMD_IDENTIFIER => {
                let (card, ack) = (state.card, state.ack);
                if let Some(card) = card {
                    state.outbox.push_back(ack);
                    state.outbox.extend(card.as_bytes().iter().rev());
                }
            }
            READER_CMD_STATUS => {
                let status = state.status;
                state.outbox.push_back(status);
            }
            _ => {}
        }
        IDLE_BYTE
    }
}

impl MockReaderHandle {
    /// Put a card in the field. Clears any scripted removal.
    pub fn present_card(&self, card: CardId) {
        let mut state = lock(&self.state);
        state.card = Some(card);
        state.remove_after = None;
    }

    pub fn withdraw_card(&self) {
        lock(&self.state).card = None;
    }

    pub fn is_card_present(&self) -> bool {
        lock(&self.state).card.is_some()
    }

    /// First byte of every identifier answer from now on.
    pub fn set_ack(&self, ack: u8) {
        lock(&self.state).ack = ack;
    }

    /// Byte answered to status requests.
    pub fn set_status(&self, status: u8) {
        lock(&self.state).status = status;
    }

    /// Withdraw the card once `bytes` more bytes have been delivered.
    pub fn remove_card_after(&self, bytes: usize) {
        lock(&self.state).remove_after = Some(bytes);
    }

    /// Leave bytes in the reader as if a previous exchange was cut short.
    pub fn inject_stale(&self, bytes: &[u8]) {
        lock(&self.state).outbox.extend(bytes.iter().copied());
    }

    /// Keep the data-ready line low for `polls` polls after each request.
    pub fn set_ready_delay(&self, polls: u32) {
        lock(&self.state).ready_delay = polls;
    }

    /// Ignore requests and hold the data-ready line low.
    pub fn set_unresponsive(&self, unresponsive: bool) {
        lock(&self.state).unresponsive = unresponsive;
    }

    /// Request bytes received so far.
    pub fn requests(&self) -> Vec<u8> {
        lock(&self.state).requests.clone()
    }

    /// Answer bytes not yet clocked out.
    pub fn pending_bytes(&self) -> usize {
        lock(&self.state).outbox.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CARD: CardId = CardId::new([1, 2, 3, 4, 5, 6, 7, 8]);

    #[test]
    fn test_identifier_answer_is_ack_then_reversed_id() {
        let (mut bus, handle) = MockReaderBus::new();
        handle.present_card(CARD);

        bus.transfer(READER_CMD_IDENTIFIER);
        let mut answer = Vec::new();
        while bus.data_ready() {
            answer.push(bus.transfer(READER_FILLER));
        }

        assert_eq!(answer, vec![READER_ACK, 8, 7, 6, 5, 4, 3, 2, 1]);
    }

    #[test]
    fn test_no_card_no_answer() {
        let (mut bus, handle) = MockReaderBus::new();
        bus.transfer(READER_CMD_IDENTIFIER);

        assert!(!bus.data_ready());
        assert_eq!(bus.transfer(READER_FILLER), IDLE_BYTE);
        assert_eq!(handle.requests(), vec![READER_CMD_IDENTIFIER]);
    }

    #[test]
    fn test_removal_after_bytes() {
        let (mut bus, handle) = MockReaderBus::new();
        handle.present_card(CARD);
        handle.remove_card_after(2);
        bus.transfer(READER_CMD_IDENTIFIER);

        bus.transfer(READER_FILLER);
        assert!(bus.card_present());
        bus.transfer(READER_FILLER);
        assert!(!bus.card_present());
        assert_eq!(handle.pending_bytes(), 7);
    }

    #[test]
    fn test_ready_delay_counts_down() {
        let (mut bus, handle) = MockReaderBus::new();
        handle.set_ready_delay(2);
        bus.transfer(READER_CMD_STATUS);

        assert!(!bus.data_ready());
        assert!(!bus.data_ready());
        assert!(bus.data_ready());
    }
}
