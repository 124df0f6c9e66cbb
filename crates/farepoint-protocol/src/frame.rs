//! The 8-byte setup frame that opens every host exchange.
//!
//! ```text
//! byte  0        1         2     3     4  5   6           7
//!      [ type  | command | arg0 | arg1 | -  - | length_lo | length_hi ]
//! ```
//!
//! `arg0`/`arg1` are inline arguments (Echo replies them back when no
//! payload follows). `length` announces how many payload bytes follow the
//! setup frame.

use crate::commands::CommandCode;
use farepoint_core::Result;
use farepoint_core::constants::{HOST_COMMAND_OFFSET, HOST_FRAME_LEN};

/// Request type of a vendor request, as sent by the fare host.
pub const VENDOR_REQUEST_TYPE: u8 = 0x40;

const ARGS_OFFSET: usize = 2;
const LENGTH_OFFSET: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetupFrame([u8; HOST_FRAME_LEN]);

impl SetupFrame {
    /// Wrap raw bytes received from the channel.
    pub fn from_bytes(bytes: [u8; HOST_FRAME_LEN]) -> Self {
        SetupFrame(bytes)
    }

    /// Build a setup frame as the host would send it.
    ///
    /// # Examples
    ///
    /// ```
    /// use farepoint_protocol::{CommandCode, SetupFrame};
    ///
    /// let frame = SetupFrame::new(CommandCode::Response, [0, 0], 5);
    /// assert_eq!(frame.command_byte(), 3);
    /// assert_eq!(frame.payload_len(), 5);
    /// ```
    pub fn new(command: CommandCode, args: [u8; 2], payload_len: u16) -> Self {
        let mut bytes = [0u8; HOST_FRAME_LEN];
        bytes[0] = VENDOR_REQUEST_TYPE;
        bytes[HOST_COMMAND_OFFSET] = command.code();
        bytes[ARGS_OFFSET..ARGS_OFFSET + 2].copy_from_slice(&args);
        bytes[LENGTH_OFFSET..].copy_from_slice(&payload_len.to_le_bytes());
        SetupFrame(bytes)
    }

    /// Shorthand for a command without arguments or payload.
    pub fn command_only(command: CommandCode) -> Self {
        Self::new(command, [0, 0], 0)
    }

    #[inline]
    pub fn command_byte(&self) -> u8 {
        self.0[HOST_COMMAND_OFFSET]
    }

    /// Decode the command byte.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidCommandCode` for codes the terminal does not
    /// implement.
    pub fn command(&self) -> Result<CommandCode> {
        CommandCode::parse(self.command_byte())
    }

    #[inline]
    pub fn inline_args(&self) -> [u8; 2] {
        [self.0[ARGS_OFFSET], self.0[ARGS_OFFSET + 1]]
    }

    #[inline]
    pub fn payload_len(&self) -> u16 {
        u16::from_le_bytes([self.0[LENGTH_OFFSET], self.0[LENGTH_OFFSET + 1]])
    }

    pub fn as_bytes(&self) -> &[u8; HOST_FRAME_LEN] {
        &self.0
    }
}

impl From<[u8; HOST_FRAME_LEN]> for SetupFrame {
    fn from(bytes: [u8; HOST_FRAME_LEN]) -> Self {
        SetupFrame(bytes)
    }
}
