//! Protocol errors

use thiserror::Error;

/// Errors that can occur while talking to the GPIO module
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Device path not configured")]
    DevicePathUnset,

    #[error("Link configuration failed: {0}")]
    ConfigurationFailed(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Serial port error: {0}")]
    SerialError(String),

    #[error("Response timeout")]
    Timeout,

    #[error("Transaction cancelled")]
    Cancelled,

    #[error("No response line for command '{command}'")]
    EmptyResponse { command: String },

    #[error("Invalid base-{radix} number in response: '{text}'")]
    InvalidNumber { text: String, radix: u32 },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<serialport::Error> for ProtocolError {
    fn from(e: serialport::Error) -> Self {
        ProtocolError::SerialError(e.to_string())
    }
}
