//! Wire-level and timing constants for the farepoint terminal.
//!
//! The terminal speaks two byte protocols: a command/response protocol with
//! the fare host, carried in 8-byte setup frames followed by optional payload
//! frames, and a polled request/acknowledge protocol with the card reader.
//!
//! # Host frame layout
//!
//! ```text
//! setup frame   [ type | command | arg0 | arg1 | ... ]   (8 bytes)
//! response data [ outcome | balance_hi | balance_lo | price_hi | price_lo ]
//! ```
//!
//! # Reader exchange
//!
//! ```text
//! terminal -> reader : request byte (STATUS or IDENTIFIER)
//! reader   -> ready  : data-ready line goes high
//! terminal <- reader : ACK, then the payload bytes
//! ```
//!
//! # Usage
//!
//! ```
//! use farepoint_core::constants::*;
//!
//! assert_eq!(HOST_FRAME_LEN, 8);
//! assert_eq!(READER_ACK, 0x86);
//! assert_eq!(OUTCOME_GENERIC_ERROR, 99);
//! ```

// ============================================================================
// Host Channel
// ============================================================================

/// Length of a host setup frame in bytes.
pub const HOST_FRAME_LEN: usize = 8;

/// Position of the command code inside a setup frame.
pub const HOST_COMMAND_OFFSET: usize = 1;

/// Maximum length of a payload frame (and of an echoed buffer).
pub const HOST_PAYLOAD_MAX: usize = 8;

/// Command code: loopback test.
pub const CMD_ECHO: u8 = 0;

/// Command code: device identification.
pub const CMD_IDENTIFY: u8 = 1;

/// Command code: authorization result follows as a payload.
pub const CMD_RESPONSE: u8 = 3;

/// Command code: host liveness signal.
pub const CMD_KEEP_ALIVE: u8 = 4;

/// Device identifier returned for [`CMD_IDENTIFY`] when none is configured.
pub const DEFAULT_DEVICE_ID: u8 = 0x01;

// ============================================================================
// Outcome codes
// ============================================================================

/// Host reported a failure.
pub const OUTCOME_ERROR: u8 = 1;
/// The card is not known to the host.
pub const OUTCOME_CARD_NOT_FOUND: u8 = 2;
/// Balance does not cover the fare. Carries balance and price.
pub const OUTCOME_INSUFFICIENT_FUNDS: u8 = 3;
/// Check-out happened after the allowed window; a fee applies.
pub const OUTCOME_TOO_LATE_CHECK_OUT: u8 = 4;
/// The card is known but not valid for travel.
pub const OUTCOME_INVALID_CARD: u8 = 5;
/// Check-in accepted. Carries balance.
pub const OUTCOME_CHECKED_IN: u8 = 6;
/// Check-out accepted. Carries balance and price.
pub const OUTCOME_CHECKED_OUT: u8 = 7;
/// Generic acknowledgement.
pub const OUTCOME_OK: u8 = 8;
/// Local-only outcome raised when the host never answers. Never on the wire.
pub const OUTCOME_GENERIC_ERROR: u8 = 99;

/// Offset of the big-endian balance in a Response payload.
pub const RESPONSE_BALANCE_OFFSET: usize = 1;

/// Offset of the big-endian price in a Response payload.
pub const RESPONSE_PRICE_OFFSET: usize = 3;

// ============================================================================
// Card reader link
// ============================================================================

/// Request byte asking the reader for its status.
pub const READER_CMD_STATUS: u8 = 0x53;

/// Request byte asking the reader for the identifier of the present card.
pub const READER_CMD_IDENTIFIER: u8 = 0x55;

/// Acknowledgement byte that must prefix every identifier answer.
pub const READER_ACK: u8 = 0x86;

/// Filler byte clocked out while receiving.
pub const READER_FILLER: u8 = 0xF5;

/// Length of a card identifier in bytes.
pub const CARD_ID_LEN: usize = 8;

// ============================================================================
// Timing defaults
// ============================================================================

/// Hold time of the Starting state in milliseconds.
pub const DEFAULT_STARTING_SETTLE_MS: u32 = 1_000;

/// Hold time after the card leaves the Info state in milliseconds.
pub const DEFAULT_INFO_SETTLE_MS: u32 = 1_500;

/// Granularity of a settle interval. The watchdog is kicked once per step.
pub const DEFAULT_SETTLE_STEP_MS: u32 = 10;

/// Main-loop iterations Processing waits for a Response before giving up.
pub const DEFAULT_PROCESSING_TIMEOUT_POLLS: u32 = 500_000;

/// Keep-alive ticks without a signal before the host is declared unreachable.
pub const DEFAULT_KEEP_ALIVE_WINDOW_TICKS: u16 = 1;

/// Period of the keep-alive tick in milliseconds (1 Hz).
pub const DEFAULT_KEEP_ALIVE_TICK_MS: u64 = 1_000;

/// Period of the host channel poll in milliseconds (250 Hz).
pub const DEFAULT_HOST_POLL_INTERVAL_MS: u64 = 4;

/// Polls of the reader's data-ready line before a read is abandoned.
pub const DEFAULT_READER_READY_POLL_LIMIT: u32 = 100_000;

/// Stale bytes drained before a request before the link is considered stuck.
pub const DEFAULT_READER_DRAIN_LIMIT: u32 = 64;

/// Polls of the host channel before an outbound payload is abandoned.
pub const DEFAULT_CHANNEL_READY_POLL_LIMIT: u32 = 100_000;

/// Width of the character display.
pub const DEFAULT_DISPLAY_COLUMNS: usize = 16;

/// Widest display line the renderer supports.
pub const MAX_DISPLAY_COLUMNS: usize = 40;
