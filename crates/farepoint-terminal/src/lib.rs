//! Terminal logic of the farepoint check-in/check-out terminal.
//!
//! The terminal runs in three contexts:
//!
//! - the main loop, which owns the [`Terminal`] and calls
//!   [`Terminal::step`] forever;
//! - the communications-poll interrupt, which feeds host frames into the
//!   [`HostChannel`];
//! - the timer interrupt, which calls [`KeepAliveMonitor::tick`].
//!
//! Everything the contexts share lives in one [`SharedState`], which is
//! `const`-constructible so it can sit in a `static`.

pub mod display;
pub mod host_channel;
pub mod keep_alive;
pub mod shared;
pub mod state_machine;

pub use display::{Renderer, Screen, truncate_text};
pub use host_channel::{HostChannel, SendError};
pub use keep_alive::{KeepAliveMonitor, TickOutcome};
pub use shared::{Delivery, SharedState, Snapshot};
pub use state_machine::{StateTransition, Terminal, TerminalBuilder, Transaction};
