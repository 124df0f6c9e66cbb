//! Property-based tests for the host protocol decoder.
//!
//! The decoder runs in interrupt context on whatever bytes the host sends,
//! so it must never panic and must classify every outcome byte.

use farepoint_core::{HostResponse, Outcome};
use farepoint_protocol::{
    CommandCode, HostDecoder, HostMessage, SetupFrame, decode_response, encode_response,
};
use proptest::prelude::*;

/// Outcome bytes the host may legitimately send.
fn defined_outcome() -> impl Strategy<Value = u8> {
    1u8..=8u8
}

fn financial_outcome() -> impl Strategy<Value = Outcome> {
    prop_oneof![
        Just(Outcome::CheckedIn),
        Just(Outcome::CheckedOut),
        Just(Outcome::InsufficientFunds),
    ]
}

proptest! {
    /// Property: arbitrary setup frames and payloads never panic the decoder.
    #[test]
    fn prop_decoder_never_panics(
        frame in any::<[u8; 8]>(),
        payload in prop::collection::vec(any::<u8>(), 0..16),
    ) {
        let mut decoder = HostDecoder::new(1);
        let _ = decoder.on_command(&SetupFrame::from_bytes(frame));
        let _ = decoder.on_payload(&payload);
        prop_assert_eq!(decoder.pending_command(), None);
    }

    /// Property: an outcome byte outside the defined set decodes as Unknown
    /// with no amounts, whatever follows it.
    #[test]
    fn prop_undefined_outcome_is_unknown(
        code in any::<u8>().prop_filter("undefined", |c| !(1..=8).contains(c) && *c != 99),
        tail in prop::collection::vec(any::<u8>(), 0..7),
    ) {
        let mut payload = vec![code];
        payload.extend(tail);

        let response = decode_response(&payload).unwrap();
        prop_assert_eq!(response.outcome(), Outcome::Unknown(code));
        prop_assert_eq!(response.balance(), None);
        prop_assert_eq!(response.price(), None);
    }

    /// Property: defined outcomes with a full-length payload always decode.
    #[test]
    fn prop_full_payload_always_decodes(code in defined_outcome(), body in any::<[u8; 4]>()) {
        let mut payload = vec![code];
        payload.extend_from_slice(&body);

        let response = decode_response(&payload).unwrap();
        prop_assert_eq!(response.outcome().code(), code);
    }

    /// Property: balance and price survive the trip through the decoder.
    #[test]
    fn prop_amounts_round_trip(
        outcome in financial_outcome(),
        balance in any::<u16>(),
        price in any::<u16>(),
    ) {
        let sent = HostResponse::new(outcome, balance, price);
        let mut decoder = HostDecoder::new(1);
        let payload = encode_response(&sent);

        decoder
            .on_command(&SetupFrame::new(CommandCode::Response, [0, 0], payload.len() as u16))
            .unwrap();
        let message = decoder.on_payload(&payload).unwrap();

        prop_assert_eq!(message, Some(HostMessage::Response(sent)));
        prop_assert_eq!(sent.balance(), Some(balance));
    }
}
