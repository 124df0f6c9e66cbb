//! Host channel protocol of the farepoint terminal.
//!
//! The host talks to the terminal in two phases: an 8-byte setup frame
//! naming a command, optionally followed by a payload frame. [`HostDecoder`]
//! joins the two phases into a single [`HostMessage`].

pub mod commands;
pub mod decoder;
pub mod frame;
pub mod response;

pub use commands::CommandCode;
pub use decoder::{HostDecoder, HostMessage, Payload, Setup, SetupReply};
pub use frame::SetupFrame;
pub use response::{decode_response, encode_response};
