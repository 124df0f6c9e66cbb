//! Helpers shared by the host protocol integration tests.

use farepoint_protocol::{CommandCode, HostDecoder, HostMessage, SetupFrame, SetupReply};

/// Run one complete host exchange: setup frame, then the payload if the
/// decoder asks for it.
pub fn exchange(
    decoder: &mut HostDecoder,
    command: CommandCode,
    payload: &[u8],
) -> (SetupReply, Option<HostMessage>) {
    let frame = SetupFrame::new(command, [0, 0], payload.len() as u16);
    let setup = decoder.on_command(&frame).expect("known command");

    match setup.reply {
        SetupReply::AwaitPayload => {
            let message = decoder.on_payload(payload).expect("well-formed payload");
            (SetupReply::AwaitPayload, message)
        }
        reply => (reply, setup.message),
    }
}
