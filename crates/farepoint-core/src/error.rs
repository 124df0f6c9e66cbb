use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    // Host protocol errors
    #[error("Invalid command code: {0}")]
    InvalidCommandCode(u8),

    #[error("Malformed {command} payload: expected at least {expected} bytes, got {actual}")]
    MalformedPayload {
        command: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Payload too long: {len} bytes exceeds capacity {capacity}")]
    PayloadTooLong { len: usize, capacity: usize },

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Configuration parse error: {0}")]
    ConfigParse(#[from] serde_json::Error),
}

impl Error {
    /// Create a malformed payload error.
    pub fn malformed(command: &'static str, expected: usize, actual: usize) -> Self {
        Self::MalformedPayload {
            command,
            expected,
            actual,
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
