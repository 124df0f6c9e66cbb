//! Host liveness tracking.
//!
//! The monitor has two triggers. [`KeepAliveMonitor::tick`] runs from the
//! periodic timer interrupt (nominally 1 Hz); [`KeepAliveMonitor::signal`]
//! runs from the host channel when a KeepAlive command arrives. Both touch
//! the terminal state and the keep-alive counters together, inside a single
//! critical section.

use crate::shared::SharedState;
use farepoint_core::TerminalState;
use farepoint_core::constants::DEFAULT_KEEP_ALIVE_WINDOW_TICKS;
use tracing::{debug, info, warn};

/// What a tick decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// A keep-alive arrived since the previous tick.
    Alive,
    /// No keep-alive yet, but the window is still open.
    Missed { missed_ticks: u16 },
    /// The window closed; the terminal was forced into NoConnection.
    ConnectionLost,
}

#[derive(Debug, Clone, Copy)]
pub struct KeepAliveMonitor<'a> {
    shared: &'a SharedState,
    window_ticks: u16,
}

impl<'a> KeepAliveMonitor<'a> {
    pub fn new(shared: &'a SharedState) -> Self {
        Self::with_window(shared, DEFAULT_KEEP_ALIVE_WINDOW_TICKS)
    }

    /// Monitor declaring the host lost after `window_ticks` silent ticks.
    pub fn with_window(shared: &'a SharedState, window_ticks: u16) -> Self {
        Self {
            shared,
            window_ticks: window_ticks.max(1),
        }
    }

    pub fn window_ticks(&self) -> u16 {
        self.window_ticks
    }

    /// Periodic timer tick.
    ///
    /// Once the window has closed, every further silent tick forces
    /// NoConnection again, which re-announces "out of order".
    pub fn tick(&self) -> TickOutcome {
        let window = self.window_ticks;
        let (outcome, previous) = self.shared.update_liveness(|slot, keep_alive| {
            if keep_alive.signal_seen {
                keep_alive.signal_seen = false;
                keep_alive.missed_ticks = 0;
                return (TickOutcome::Alive, slot.state);
            }

            keep_alive.missed_ticks = keep_alive.missed_ticks.saturating_add(1);
            if keep_alive.missed_ticks < window {
                return (
                    TickOutcome::Missed {
                        missed_ticks: keep_alive.missed_ticks,
                    },
                    slot.state,
                );
            }

            let previous = slot.state;
            slot.enter(TerminalState::NoConnection);
            (TickOutcome::ConnectionLost, previous)
        });

        match outcome {
            TickOutcome::ConnectionLost if previous != TerminalState::NoConnection => {
                warn!(from = %previous, "Host keep-alive lost, terminal out of order");
            }
            TickOutcome::Missed { missed_ticks } => {
                debug!(missed_ticks, window, "Keep-alive tick missed");
            }
            _ => {}
        }
        outcome
    }

    /// Keep-alive received from the host.
    ///
    /// Returns `true` if the terminal was out of order and now restarts.
    pub fn signal(&self) -> bool {
        let restarted = self.shared.update_liveness(|slot, keep_alive| {
            keep_alive.signal_seen = true;
            keep_alive.missed_ticks = 0;

            if slot.state == TerminalState::NoConnection {
                slot.enter(TerminalState::Starting);
                true
            } else {
                false
            }
        });

        if restarted {
            info!("Host keep-alive resumed, restarting terminal");
        }
        restarted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn idle_shared() -> SharedState {
        let shared = SharedState::new();
        shared.advance(TerminalState::Starting, TerminalState::Idle);
        shared.take_entry();
        shared
    }

    #[test]
    fn test_silent_tick_forces_no_connection() {
        let shared = idle_shared();
        let monitor = KeepAliveMonitor::new(&shared);
        // Nothing counts as heard before the first keep-alive.
        assert!(!shared.keep_alive().signal_seen);

        assert_eq!(monitor.tick(), TickOutcome::ConnectionLost);
        assert_eq!(shared.state(), TerminalState::NoConnection);
        assert_eq!(shared.take_entry(), Some(TerminalState::NoConnection));
    }

    #[test]
    fn test_signal_between_ticks_keeps_connection() {
        let shared = idle_shared();
        let monitor = KeepAliveMonitor::new(&shared);

        for _ in 0..5 {
            assert!(!monitor.signal());
            assert_eq!(monitor.tick(), TickOutcome::Alive);
        }
        assert_eq!(shared.state(), TerminalState::Idle);
        assert_eq!(shared.take_entry(), None);
    }

    #[test]
    fn test_window_counts_missed_ticks() {
        let shared = idle_shared();
        let monitor = KeepAliveMonitor::with_window(&shared, 3);

        assert_eq!(monitor.tick(), TickOutcome::Missed { missed_ticks: 1 });
        assert_eq!(monitor.tick(), TickOutcome::Missed { missed_ticks: 2 });
        assert_eq!(shared.state(), TerminalState::Idle);
        assert_eq!(monitor.tick(), TickOutcome::ConnectionLost);
        assert_eq!(shared.state(), TerminalState::NoConnection);
    }

    #[test]
    fn test_signal_resets_missed_ticks() {
        let shared = idle_shared();
        let monitor = KeepAliveMonitor::with_window(&shared, 2);

        monitor.tick();
        monitor.signal();
        assert_eq!(shared.keep_alive().missed_ticks, 0);
        assert_eq!(monitor.tick(), TickOutcome::Alive);
        assert_eq!(monitor.tick(), TickOutcome::Missed { missed_ticks: 1 });
    }

    #[test]
    fn test_repeated_silence_reannounces() {
        let shared = idle_shared();
        let monitor = KeepAliveMonitor::new(&shared);

        monitor.tick();
        assert_eq!(shared.take_entry(), Some(TerminalState::NoConnection));
        monitor.tick();
        assert_eq!(shared.take_entry(), Some(TerminalState::NoConnection));
    }

    #[test]
    fn test_signal_restarts_from_no_connection() {
        let shared = idle_shared();
        let monitor = KeepAliveMonitor::new(&shared);
        monitor.tick();
        shared.take_entry();

        assert!(monitor.signal());
        assert_eq!(shared.state(), TerminalState::Starting);
        assert_eq!(shared.take_entry(), Some(TerminalState::Starting));
    }

    #[test]
    fn test_signal_outside_no_connection_leaves_state() {
        let shared = SharedState::new();
        shared.advance(TerminalState::Starting, TerminalState::Idle);
        shared.advance(TerminalState::Idle, TerminalState::Scanning);
        let monitor = KeepAliveMonitor::new(&shared);

        assert!(!monitor.signal());
        assert_eq!(shared.state(), TerminalState::Scanning);
    }

    #[test]
    fn test_zero_window_treated_as_one() {
        let shared = idle_shared();
        let monitor = KeepAliveMonitor::with_window(&shared, 0);
        assert_eq!(monitor.window_ticks(), 1);
        assert_eq!(monitor.tick(), TickOutcome::ConnectionLost);
    }
}
