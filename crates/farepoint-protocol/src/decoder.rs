//! Two-phase host message decoder.
//!
//! The channel driver calls [`HostDecoder::on_command`] for every setup
//! frame and [`HostDecoder::on_payload`] when payload bytes follow. The
//! decoder remembers the last command in `pending_command` and completes it
//! into a [`HostMessage`] once everything it needs has arrived. A payload is
//! always interpreted against the command that preceded it and consumes it,
//! so a late payload can never be applied to a later command.

use crate::commands::CommandCode;
use crate::frame::SetupFrame;
use crate::response::decode_response;
use farepoint_core::constants::HOST_PAYLOAD_MAX;
use farepoint_core::{Error, HostResponse, Result};
use heapless::Vec;

/// Fixed-capacity buffer for payloads and replies.
pub type Payload = Vec<u8, HOST_PAYLOAD_MAX>;

/// What the driver answers in the setup stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetupReply {
    /// Reply these bytes in the data stage.
    Data(Payload),
    /// Accept a payload; it is handed to [`HostDecoder::on_payload`].
    AwaitPayload,
    /// Zero-length reply.
    Empty,
}

/// A complete message from the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostMessage {
    /// Echo payload to send back unchanged.
    Echo(Payload),
    Identify,
    Response(HostResponse),
    KeepAlive,
}

/// Result of the setup stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Setup {
    pub reply: SetupReply,
    /// Set when the command completed without a payload.
    pub message: Option<HostMessage>,
}

impl Setup {
    fn new(reply: SetupReply, message: Option<HostMessage>) -> Self {
        Self { reply, message }
    }
}

#[derive(Debug, Clone)]
pub struct HostDecoder {
    device_id: u8,
    pending: Option<CommandCode>,
}

impl HostDecoder {
    pub fn new(device_id: u8) -> Self {
        Self {
            device_id,
            pending: None,
        }
    }

    /// Command whose payload has not arrived yet.
    pub fn pending_command(&self) -> Option<CommandCode> {
        self.pending
    }

    /// Handle a setup frame.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidCommandCode` for an unknown command; any
    /// pending command is dropped.
    ///
    /// # Examples
    ///
    /// ```
    /// use farepoint_protocol::{
    ///     CommandCode, HostDecoder, HostMessage, Payload, SetupFrame, SetupReply,
    /// };
    ///
    /// let mut decoder = HostDecoder::new(0x2A);
    /// let setup = decoder.on_command(&SetupFrame::command_only(CommandCode::Identify)).unwrap();
    /// assert_eq!(setup.reply, SetupReply::Data(Payload::from_slice(&[0x2A]).unwrap()));
    /// assert_eq!(setup.message, Some(HostMessage::Identify));
    /// ```
    pub fn on_command(&mut self, frame: &SetupFrame) -> Result<Setup> {
        let command = match frame.command() {
            Ok(command) => command,
            Err(err) => {
                self.pending = None;
                return Err(err);
            }
        };
        self.pending = Some(command);

        let setup = match command {
            CommandCode::Echo if frame.payload_len() == 0 => {
                Setup::new(SetupReply::Data(payload_from(&frame.inline_args())?), None)
            }
            CommandCode::Echo | CommandCode::Response => Setup::new(SetupReply::AwaitPayload, None),
            CommandCode::Identify => Setup::new(
                SetupReply::Data(payload_from(&[self.device_id])?),
                Some(HostMessage::Identify),
            ),
            CommandCode::KeepAlive => {
                Setup::new(SetupReply::Empty, Some(HostMessage::KeepAlive))
            }
        };
        Ok(setup)
    }

    /// Handle a payload frame, interpreting it against the pending command.
    ///
    /// Returns `Ok(None)` when no pending command takes a payload.
    ///
    /// # Errors
    ///
    /// Returns `Error::MalformedPayload` for a truncated Response and
    /// `Error::PayloadTooLong` for an Echo payload over 8 bytes.
    pub fn on_payload(&mut self, payload: &[u8]) -> Result<Option<HostMessage>> {
        match self.pending.take() {
            Some(CommandCode::Echo) => Ok(Some(HostMessage::Echo(payload_from(payload)?))),
            Some(CommandCode::Response) => {
                decode_response(payload).map(|response| Some(HostMessage::Response(response)))
            }
            Some(CommandCode::Identify | CommandCode::KeepAlive) | None => Ok(None),
        }
    }
}

fn payload_from(bytes: &[u8]) -> Result<Payload> {
    Payload::from_slice(bytes).map_err(|_| Error::PayloadTooLong {
        len: bytes.len(),
        capacity: HOST_PAYLOAD_MAX,
    })
}
