//! Integration tests for complete host exchanges through the decoder.

mod common;

use farepoint_core::{HostResponse, Outcome};
use farepoint_protocol::{
    CommandCode, HostDecoder, HostMessage, Payload, SetupFrame, SetupReply, encode_response,
};

mod test_data {
    pub const DEVICE_ID: u8 = 0x17;
    pub const BALANCE: u16 = 350;
    pub const PRICE: u16 = 24;
}

#[test]
fn test_identify_replies_device_id() {
    let mut decoder = HostDecoder::new(test_data::DEVICE_ID);
    let (reply, message) = common::exchange(&mut decoder, CommandCode::Identify, &[]);

    assert_eq!(
        reply,
        SetupReply::Data(Payload::from_slice(&[test_data::DEVICE_ID]).unwrap())
    );
    assert_eq!(message, Some(HostMessage::Identify));
}

#[test]
fn test_response_round_trip_for_each_financial_outcome() {
    let mut decoder = HostDecoder::new(test_data::DEVICE_ID);

    for outcome in [
        Outcome::CheckedIn,
        Outcome::CheckedOut,
        Outcome::InsufficientFunds,
    ] {
        let sent = HostResponse::new(outcome, test_data::BALANCE, test_data::PRICE);
        let payload = encode_response(&sent);
        let (_, message) = common::exchange(&mut decoder, CommandCode::Response, &payload);

        assert_eq!(message, Some(HostMessage::Response(sent)));
    }
}

#[test]
fn test_interleaved_keep_alive_does_not_disturb_next_response() {
    let mut decoder = HostDecoder::new(test_data::DEVICE_ID);

    let (_, message) = common::exchange(&mut decoder, CommandCode::KeepAlive, &[]);
    assert_eq!(message, Some(HostMessage::KeepAlive));

    let (_, message) = common::exchange(&mut decoder, CommandCode::Response, &[5]);
    assert_eq!(
        message,
        Some(HostMessage::Response(HostResponse::outcome_only(
            Outcome::InvalidCard
        )))
    );
}

#[test]
fn test_keep_alive_between_setup_and_payload_replaces_pending() {
    let mut decoder = HostDecoder::new(test_data::DEVICE_ID);

    decoder
        .on_command(&SetupFrame::new(CommandCode::Response, [0, 0], 3))
        .unwrap();
    let setup = decoder
        .on_command(&SetupFrame::command_only(CommandCode::KeepAlive))
        .unwrap();
    assert_eq!(setup.message, Some(HostMessage::KeepAlive));

    // The payload now belongs to KeepAlive, which takes none.
    assert_eq!(decoder.on_payload(&[6, 0, 1]).unwrap(), None);
}

#[test]
fn test_echo_with_payload_returns_same_bytes() {
    let mut decoder = HostDecoder::new(test_data::DEVICE_ID);
    let bytes = [0xDE, 0xAD, 0xBE, 0xEF, 0x00, 0x01, 0x02, 0x03];

    let (reply, message) = common::exchange(&mut decoder, CommandCode::Echo, &bytes);

    assert_eq!(reply, SetupReply::AwaitPayload);
    assert_eq!(
        message,
        Some(HostMessage::Echo(Payload::from_slice(&bytes).unwrap()))
    );
}
