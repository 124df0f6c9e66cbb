//! Command codes carried in byte 1 of a host setup frame.
//!
//! | Code | Command | Payload in | Reply |
//! |------|---------|------------|-------|
//! | 0 | `Echo` | up to 8 bytes | same bytes |
//! | 1 | `Identify` | none | device id |
//! | 3 | `Response` | outcome, balance, price | none |
//! | 4 | `KeepAlive` | none | none |
//!
//! ```
//! use farepoint_protocol::CommandCode;
//!
//! let cmd = CommandCode::parse(3).unwrap();
//! assert_eq!(cmd, CommandCode::Response);
//! assert_eq!(cmd.code(), 3);
//! assert!(CommandCode::parse(2).is_err());
//! ```

use farepoint_core::constants::{CMD_ECHO, CMD_IDENTIFY, CMD_KEEP_ALIVE, CMD_RESPONSE};
use farepoint_core::{Error, Result};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandCode {
    Echo,      // 0
    Identify,  // 1
    Response,  // 3
    KeepAlive, // 4
}

impl CommandCode {
    pub fn parse(code: u8) -> Result<Self> {
        match code {
            CMD_ECHO => Ok(CommandCode::Echo),
            CMD_IDENTIFY => Ok(CommandCode::Identify),
            CMD_RESPONSE => Ok(CommandCode::Response),
            CMD_KEEP_ALIVE => Ok(CommandCode::KeepAlive),
            other => Err(Error::InvalidCommandCode(other)),
        }
    }

    #[inline]
    pub fn code(&self) -> u8 {
        match self {
            CommandCode::Echo => CMD_ECHO,
            CommandCode::Identify => CMD_IDENTIFY,
            CommandCode::Response => CMD_RESPONSE,
            CommandCode::KeepAlive => CMD_KEEP_ALIVE,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CommandCode::Echo => "Echo",
            CommandCode::Identify => "Identify",
            CommandCode::Response => "Response",
            CommandCode::KeepAlive => "KeepAlive",
        }
    }

    /// Returns `true` if the command is always completed by a payload frame.
    ///
    /// Echo only expects a payload when its setup frame announces one.
    #[inline]
    pub fn requires_payload(&self) -> bool {
        matches!(self, CommandCode::Response)
    }
}

impl fmt::Display for CommandCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, CommandCode::Echo)]
    #[case(1, CommandCode::Identify)]
    #[case(3, CommandCode::Response)]
    #[case(4, CommandCode::KeepAlive)]
    fn test_parse_known_codes(#[case] code: u8, #[case] expected: CommandCode) {
        let cmd = CommandCode::parse(code).unwrap();
        assert_eq!(cmd, expected);
        assert_eq!(cmd.code(), code);
    }

    #[rstest]
    #[case(2)]
    #[case(5)]
    #[case(0xFF)]
    fn test_parse_unknown_code(#[case] code: u8) {
        let result = CommandCode::parse(code);
        assert!(matches!(result, Err(Error::InvalidCommandCode(c)) if c == code));
    }

    #[test]
    fn test_only_response_requires_payload() {
        assert!(CommandCode::Response.requires_payload());
        assert!(!CommandCode::Echo.requires_payload());
        assert!(!CommandCode::Identify.requires_payload());
        assert!(!CommandCode::KeepAlive.requires_payload());
    }

    #[test]
    fn test_display() {
        assert_eq!(CommandCode::KeepAlive.to_string(), "KeepAlive");
    }
}
