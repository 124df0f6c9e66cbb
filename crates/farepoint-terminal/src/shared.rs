//! State shared between the main loop and the interrupt handlers.
//!
//! Three pieces of data cross contexts: the terminal state (with its
//! pending entry action), the keep-alive bookkeeping and the response slot.
//! Each lives in a `critical_section::Mutex<Cell<_>>`; every read-modify-write
//! runs inside one critical section, so an interrupt never sees half of an
//! update and a forced transition is never overwritten by a stale one.

use core::cell::Cell;
use critical_section::Mutex;
use farepoint_core::{HostResponse, TerminalState};

/// Keep-alive bookkeeping updated by the tick and the signal handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KeepAliveState {
    /// A keep-alive arrived since the last tick.
    pub signal_seen: bool,
    /// Consecutive ticks without a keep-alive.
    pub missed_ticks: u16,
}

/// Terminal state and whether its entry action still has to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateSlot {
    pub state: TerminalState,
    pub entry_pending: bool,
}

impl StateSlot {
    /// Move to `to` and schedule its entry action.
    pub fn enter(&mut self, to: TerminalState) {
        self.state = to;
        self.entry_pending = true;
    }
}

/// Where the host's decision for the current transaction stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ResponseSlot {
    /// No transaction is waiting; responses are dropped.
    Closed,
    /// A card id was submitted and a response is expected.
    Armed,
    Delivered(HostResponse),
}

/// Result of offering a host response to the slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Accepted,
    /// No transaction was waiting, or it already has its response.
    Dropped,
}

/// Copy of all shared data taken in one critical section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Snapshot {
    pub state: TerminalState,
    pub entry_pending: bool,
    pub keep_alive: KeepAliveState,
    pub awaiting_response: bool,
    pub response_ready: bool,
}

#[derive(Debug)]
pub struct SharedState {
    slot: Mutex<Cell<StateSlot>>,
    keep_alive: Mutex<Cell<KeepAliveState>>,
    response: Mutex<Cell<ResponseSlot>>,
}

impl SharedState {
    /// Fresh state: Starting, entry pending, no keep-alive seen yet.
    pub const fn new() -> Self {
        Self {
            slot: Mutex::new(Cell::new(StateSlot {
                state: TerminalState::Starting,
                entry_pending: true,
            })),
            keep_alive: Mutex::new(Cell::new(KeepAliveState {
                signal_seen: false,
                missed_ticks: 0,
            })),
            response: Mutex::new(Cell::new(ResponseSlot::Closed)),
        }
    }

    pub fn state(&self) -> TerminalState {
        critical_section::with(|cs| self.slot.borrow(cs).get().state)
    }

    /// Take the pending entry action, if any.
    ///
    /// Returns the state to enter. The flag is cleared, so each transition
    /// yields its entry exactly once.
    pub fn take_entry(&self) -> Option<TerminalState> {
        critical_section::with(|cs| {
            let cell = self.slot.borrow(cs);
            let mut slot = cell.get();
            if !slot.entry_pending {
                return None;
            }
            slot.entry_pending = false;
            cell.set(slot);
            Some(slot.state)
        })
    }

    /// Move from `from` to `to`, unless something else moved the terminal
    /// first.
    ///
    /// Returns `false` when the current state is no longer `from`, which
    /// happens when the keep-alive tick forced NoConnection meanwhile.
    pub fn advance(&self, from: TerminalState, to: TerminalState) -> bool {
        critical_section::with(|cs| {
            let cell = self.slot.borrow(cs);
            let mut slot = cell.get();
            if slot.state != from {
                return false;
            }
            slot.enter(to);
            cell.set(slot);
            true
        })
    }

    /// Run `f` on the state slot and keep-alive bookkeeping in one critical
    /// section.
    pub fn update_liveness<R>(&self, f: impl FnOnce(&mut StateSlot, &mut KeepAliveState) -> R) -> R {
        critical_section::with(|cs| {
            let slot_cell = self.slot.borrow(cs);
            let keep_alive_cell = self.keep_alive.borrow(cs);
            let mut slot = slot_cell.get();
            let mut keep_alive = keep_alive_cell.get();

            let result = f(&mut slot, &mut keep_alive);

            slot_cell.set(slot);
            keep_alive_cell.set(keep_alive);
            result
        })
    }

    pub fn keep_alive(&self) -> KeepAliveState {
        critical_section::with(|cs| self.keep_alive.borrow(cs).get())
    }

    /// Open the slot for the current transaction's response. A response
    /// left over from an earlier transaction is discarded.
    pub fn arm_response(&self) {
        critical_section::with(|cs| self.response.borrow(cs).set(ResponseSlot::Armed));
    }

    /// Close the slot; later responses are dropped.
    pub fn close_response(&self) {
        critical_section::with(|cs| self.response.borrow(cs).set(ResponseSlot::Closed));
    }

    /// Deliver a host response. Only an armed slot accepts it.
    pub fn offer_response(&self, response: HostResponse) -> Delivery {
        critical_section::with(|cs| {
            let cell = self.response.borrow(cs);
            match cell.get() {
                ResponseSlot::Armed => {
                    cell.set(ResponseSlot::Delivered(response));
                    Delivery::Accepted
                }
                ResponseSlot::Closed | ResponseSlot::Delivered(_) => Delivery::Dropped,
            }
        })
    }

    /// Take a delivered response, closing the slot.
    pub fn take_response(&self) -> Option<HostResponse> {
        critical_section::with(|cs| {
            let cell = self.response.borrow(cs);
            match cell.get() {
                ResponseSlot::Delivered(response) => {
                    cell.set(ResponseSlot::Closed);
                    Some(response)
                }
                ResponseSlot::Closed | ResponseSlot::Armed => None,
            }
        })
    }

    pub fn snapshot(&self) -> Snapshot {
        critical_section::with(|cs| {
            let slot = self.slot.borrow(cs).get();
            let response = self.response.borrow(cs).get();
            Snapshot {
                state: slot.state,
                entry_pending: slot.entry_pending,
                keep_alive: self.keep_alive.borrow(cs).get(),
                awaiting_response: response == ResponseSlot::Armed,
                response_ready: matches!(response, ResponseSlot::Delivered(_)),
            }
        })
    }
}

impl Default for SharedState {
    fn default() -> Self {
        Self::new()
    }
}
