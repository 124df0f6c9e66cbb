//! Error types for hardware operations.
//!
//! Reader failures are all transient: the terminal turns each of them into
//! an "invalid card" result for the customer and carries on.

use farepoint_core::constants::CARD_ID_LEN;

/// Result type alias for card link operations.
pub type Result<T> = std::result::Result<T, ReadError>;

/// Errors that can occur while reading from the card reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ReadError {
    /// The first byte of the answer was not the acknowledgement.
    #[error("Reader not acknowledged: received {received:#04X}")]
    NotAcknowledged { received: u8 },

    /// The card left the field before all identifier bytes arrived.
    #[error("Card removed after {bytes_read} of {CARD_ID_LEN} identifier bytes")]
    CardRemoved { bytes_read: usize },

    /// The data-ready line never rose.
    #[error("Reader not ready after {polls} polls")]
    NotReady { polls: u32 },
}

impl ReadError {
    /// Create a not-acknowledged error.
    pub fn not_acknowledged(received: u8) -> Self {
        Self::NotAcknowledged { received }
    }

    /// Create a card-removed error.
    pub fn card_removed(bytes_read: usize) -> Self {
        Self::CardRemoved { bytes_read }
    }
}

/// A bounded busy-wait ran out of polls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Condition not met after {polls} polls")]
pub struct PollTimeout {
    pub polls: u32,
}

impl From<PollTimeout> for ReadError {
    fn from(timeout: PollTimeout) -> Self {
        ReadError::NotReady {
            polls: timeout.polls,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_acknowledged_error() {
        let err = ReadError::not_acknowledged(0x15);
        assert_eq!(err.to_string(), "Reader not acknowledged: received 0x15");
    }

    #[test]
    fn test_card_removed_error() {
        let err = ReadError::card_removed(3);
        assert_eq!(err.to_string(), "Card removed after 3 of 8 identifier bytes");
    }

    #[test]
    fn test_poll_timeout_converts_to_not_ready() {
        let err: ReadError = PollTimeout { polls: 500 }.into();
        assert_eq!(err, ReadError::NotReady { polls: 500 });
        assert_eq!(err.to_string(), "Reader not ready after 500 polls");
    }
}
