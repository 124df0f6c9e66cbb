//! Shared vocabulary for the farepoint check-in/check-out terminal.
//!
//! This crate holds the pieces every other farepoint crate agrees on: wire
//! constants, the outcome codes a host can return, the terminal's state set
//! and the deployment configuration (timings, display width, message table).

pub mod config;
pub mod constants;
pub mod error;
pub mod types;

pub use config::{MessageTable, TerminalConfig, TimingConfig};
pub use error::{Error, Result};
pub use types::*;

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
