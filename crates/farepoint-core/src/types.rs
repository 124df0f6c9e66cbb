use crate::constants::{
    CARD_ID_LEN, OUTCOME_CARD_NOT_FOUND, OUTCOME_CHECKED_IN, OUTCOME_CHECKED_OUT, OUTCOME_ERROR,
    OUTCOME_GENERIC_ERROR, OUTCOME_INSUFFICIENT_FUNDS, OUTCOME_INVALID_CARD, OUTCOME_OK,
    OUTCOME_TOO_LATE_CHECK_OUT,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier read from a contactless card.
///
/// Bytes are stored in the order the host expects. The reader delivers them
/// last byte first; reassembly is the card link's job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CardId([u8; CARD_ID_LEN]);

impl CardId {
    /// Identifier with every byte cleared.
    pub const EMPTY: CardId = CardId([0; CARD_ID_LEN]);

    #[must_use]
    pub const fn new(bytes: [u8; CARD_ID_LEN]) -> Self {
        CardId(bytes)
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8; CARD_ID_LEN] {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0 == [0; CARD_ID_LEN]
    }
}

impl From<[u8; CARD_ID_LEN]> for CardId {
    fn from(bytes: [u8; CARD_ID_LEN]) -> Self {
        CardId(bytes)
    }
}

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for byte in self.0 {
            write!(f, "{byte:02X}")?;
        }
        Ok(())
    }
}

/// Result of an authorization, as reported by the host or raised locally.
///
/// Decoding never fails: any byte outside the known set becomes
/// [`Outcome::Unknown`] and is shown as a system error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    Error,
    CardNotFound,
    InsufficientFunds,
    TooLateCheckOut,
    InvalidCard,
    CheckedIn,
    CheckedOut,
    Ok,
    /// Local timeout outcome. The host never sends it.
    GenericError,
    Unknown(u8),
}

impl Outcome {
    /// Map a wire byte to an outcome.
    #[inline]
    #[must_use]
    pub fn from_code(code: u8) -> Self {
        match code {
            OUTCOME_ERROR => Outcome::Error,
            OUTCOME_CARD_NOT_FOUND => Outcome::CardNotFound,
            OUTCOME_INSUFFICIENT_FUNDS => Outcome::InsufficientFunds,
            OUTCOME_TOO_LATE_CHECK_OUT => Outcome::TooLateCheckOut,
            OUTCOME_INVALID_CARD => Outcome::InvalidCard,
            OUTCOME_CHECKED_IN => Outcome::CheckedIn,
            OUTCOME_CHECKED_OUT => Outcome::CheckedOut,
            OUTCOME_OK => Outcome::Ok,
            OUTCOME_GENERIC_ERROR => Outcome::GenericError,
            other => Outcome::Unknown(other),
        }
    }

    #[inline]
    #[must_use]
    pub fn code(self) -> u8 {
        match self {
            Outcome::Error => OUTCOME_ERROR,
            Outcome::CardNotFound => OUTCOME_CARD_NOT_FOUND,
            Outcome::InsufficientFunds => OUTCOME_INSUFFICIENT_FUNDS,
            Outcome::TooLateCheckOut => OUTCOME_TOO_LATE_CHECK_OUT,
            Outcome::InvalidCard => OUTCOME_INVALID_CARD,
            Outcome::CheckedIn => OUTCOME_CHECKED_IN,
            Outcome::CheckedOut => OUTCOME_CHECKED_OUT,
            Outcome::Ok => OUTCOME_OK,
            Outcome::GenericError => OUTCOME_GENERIC_ERROR,
            Outcome::Unknown(code) => code,
        }
    }

    /// Whether a Response with this outcome carries a balance.
    #[inline]
    #[must_use]
    pub fn carries_balance(self) -> bool {
        matches!(
            self,
            Outcome::CheckedIn | Outcome::CheckedOut | Outcome::InsufficientFunds
        )
    }

    /// Whether a Response with this outcome carries a price.
    #[inline]
    #[must_use]
    pub fn carries_price(self) -> bool {
        matches!(self, Outcome::CheckedOut | Outcome::InsufficientFunds)
    }

    /// Outcomes shown with the green indicator.
    #[inline]
    #[must_use]
    pub fn is_success(self) -> bool {
        matches!(self, Outcome::CheckedIn | Outcome::CheckedOut | Outcome::Ok)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Outcome::Error => write!(f, "Error"),
            Outcome::CardNotFound => write!(f, "CardNotFound"),
            Outcome::InsufficientFunds => write!(f, "InsufficientFunds"),
            Outcome::TooLateCheckOut => write!(f, "TooLateCheckOut"),
            Outcome::InvalidCard => write!(f, "InvalidCard"),
            Outcome::CheckedIn => write!(f, "CheckedIn"),
            Outcome::CheckedOut => write!(f, "CheckedOut"),
            Outcome::Ok => write!(f, "Ok"),
            Outcome::GenericError => write!(f, "GenericError"),
            Outcome::Unknown(code) => write!(f, "Unknown({code})"),
        }
    }
}

/// Authorization decision for one transaction.
///
/// `balance` and `price` are only ever populated for outcomes that carry
/// them, so a renderer can never show a stale amount next to the wrong
/// message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostResponse {
    outcome: Outcome,
    balance: Option<u16>,
    price: Option<u16>,
}

impl HostResponse {
    /// Build a response, discarding amounts the outcome does not carry.
    #[must_use]
    pub fn new(outcome: Outcome, balance: u16, price: u16) -> Self {
        Self {
            outcome,
            balance: outcome.carries_balance().then_some(balance),
            price: outcome.carries_price().then_some(price),
        }
    }

    /// Response without amounts.
    #[must_use]
    pub fn outcome_only(outcome: Outcome) -> Self {
        Self::new(outcome, 0, 0)
    }

    /// The locally raised timeout response.
    #[must_use]
    pub fn generic_error() -> Self {
        Self::outcome_only(Outcome::GenericError)
    }

    #[must_use]
    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    #[must_use]
    pub fn balance(&self) -> Option<u16> {
        self.balance
    }

    #[must_use]
    pub fn price(&self) -> Option<u16> {
        self.price
    }
}

/// Operational states of the terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TerminalState {
    /// Power-up or reconnect: settling before accepting cards.
    #[default]
    Starting,
    /// Waiting for a card.
    Idle,
    /// Reading the card identifier.
    Scanning,
    /// Waiting for the host's decision.
    Processing,
    /// Showing a result until the card is withdrawn.
    Info,
    /// Host unreachable; out of order until a keep-alive arrives.
    NoConnection,
}

impl TerminalState {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            TerminalState::Starting => "Starting",
            TerminalState::Idle => "Idle",
            TerminalState::Scanning => "Scanning",
            TerminalState::Processing => "Processing",
            TerminalState::Info => "Info",
            TerminalState::NoConnection => "NoConnection",
        }
    }

    /// Check whether a transition is part of the terminal's state graph.
    ///
    /// Every state may be forced into `NoConnection` by the keep-alive tick,
    /// and `NoConnection` can only be left towards `Starting`.
    ///
    /// # Examples
    ///
    /// ```
    /// use farepoint_core::TerminalState;
    ///
    /// assert!(TerminalState::Idle.can_transition_to(TerminalState::Scanning));
    /// assert!(TerminalState::Info.can_transition_to(TerminalState::NoConnection));
    /// assert!(!TerminalState::NoConnection.can_transition_to(TerminalState::Idle));
    /// ```
    #[must_use]
    pub fn can_transition_to(self, to: TerminalState) -> bool {
        use TerminalState::*;

        if to == NoConnection {
            return true;
        }

        matches!(
            (self, to),
            (Starting, Idle)
                | (Idle, Scanning)
                | (Scanning, Processing)
                | (Scanning, Info)
                | (Processing, Info)
                | (Info, Idle)
                | (NoConnection, Starting)
        )
    }
}

impl fmt::Display for TerminalState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(1, Outcome::Error)]
    #[case(2, Outcome::CardNotFound)]
    #[case(3, Outcome::InsufficientFunds)]
    #[case(4, Outcome::TooLateCheckOut)]
    #[case(5, Outcome::InvalidCard)]
    #[case(6, Outcome::CheckedIn)]
    #[case(7, Outcome::CheckedOut)]
    #[case(8, Outcome::Ok)]
    #[case(99, Outcome::GenericError)]
    fn test_outcome_codes(#[case] code: u8, #[case] outcome: Outcome) {
        assert_eq!(Outcome::from_code(code), outcome);
        assert_eq!(outcome.code(), code);
    }

    #[rstest]
    #[case(0)]
    #[case(9)]
    #[case(98)]
    #[case(255)]
    fn test_unknown_outcome_keeps_code(#[case] code: u8) {
        let outcome = Outcome::from_code(code);
        assert_eq!(outcome, Outcome::Unknown(code));
        assert_eq!(outcome.code(), code);
        assert!(!outcome.carries_balance());
        assert!(!outcome.is_success());
    }

    #[test]
    fn test_response_keeps_only_carried_amounts() {
        let checked_in = HostResponse::new(Outcome::CheckedIn, 350, 20);
        assert_eq!(checked_in.balance(), Some(350));
        assert_eq!(checked_in.price(), None);

        let checked_out = HostResponse::new(Outcome::CheckedOut, 330, 20);
        assert_eq!(checked_out.balance(), Some(330));
        assert_eq!(checked_out.price(), Some(20));

        let invalid = HostResponse::new(Outcome::InvalidCard, 1, 2);
        assert_eq!(invalid.balance(), None);
        assert_eq!(invalid.price(), None);
    }

    #[test]
    fn test_generic_error_response() {
        let response = HostResponse::generic_error();
        assert_eq!(response.outcome().code(), 99);
        assert_eq!(response.balance(), None);
    }

    #[test]
    fn test_card_id_display_and_empty() {
        let id = CardId::new([0x04, 0xA1, 0x00, 0xFF, 0x10, 0x20, 0x30, 0x40]);
        assert_eq!(id.to_string(), "04A100FF10203040");
        assert!(!id.is_empty());
        assert!(CardId::EMPTY.is_empty());
        assert_eq!(CardId::default(), CardId::EMPTY);
    }

    #[rstest]
    #[case(TerminalState::Starting, TerminalState::Idle, true)]
    #[case(TerminalState::Idle, TerminalState::Scanning, true)]
    #[case(TerminalState::Scanning, TerminalState::Info, true)]
    #[case(TerminalState::Scanning, TerminalState::Processing, true)]
    #[case(TerminalState::Processing, TerminalState::Info, true)]
    #[case(TerminalState::Info, TerminalState::Idle, true)]
    #[case(TerminalState::NoConnection, TerminalState::Starting, true)]
    #[case(TerminalState::Processing, TerminalState::NoConnection, true)]
    #[case(TerminalState::NoConnection, TerminalState::NoConnection, true)]
    #[case(TerminalState::NoConnection, TerminalState::Idle, false)]
    #[case(TerminalState::Idle, TerminalState::Processing, false)]
    #[case(TerminalState::Info, TerminalState::Scanning, false)]
    #[case(TerminalState::Processing, TerminalState::Idle, false)]
    fn test_state_graph(
        #[case] from: TerminalState,
        #[case] to: TerminalState,
        #[case] allowed: bool,
    ) {
        assert_eq!(from.can_transition_to(to), allowed);
    }

    #[test]
    fn test_state_display() {
        assert_eq!(TerminalState::NoConnection.to_string(), "NoConnection");
        assert_eq!(TerminalState::default(), TerminalState::Starting);
    }
}
