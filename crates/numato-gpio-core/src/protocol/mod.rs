//! Serial Protocol Communication
//!
//! Implements the Numato Lab USB GPIO ASCII command protocol.
//!
//! Every command is a line of text terminated by a carriage return. The module
//! echoes the command back, sends the result (if any) on the next line and
//! finishes with a `>` prompt.

pub mod commands;
mod config;
mod error;
mod module;
pub mod response;
pub mod serial;
pub mod transport;

pub use commands::{encode_mask, Command};
pub use config::{LinkMethod, ModuleConfig};
pub use error::ProtocolError;
pub use module::GpioModule;
pub use response::{extract_response_line, read_response, CancelHandle, ReadLimits};
pub use serial::{LinkConfigurator, NativeConfigurator, SttyConfigurator};
pub use transport::{DeviceHandle, FileOpener, PortOpener, SerialOpener};

/// Default baud rate for the module's CDC ACM port
pub const DEFAULT_BAUD_RATE: u32 = 115200;

/// Location of the terminal configuration utility used by the fallback configurator
pub const DEFAULT_STTY_PATH: &str = "/bin/stty";

/// Maximum number of bytes accepted for a single reply
pub const MAX_RESPONSE_LEN: usize = 1024;

/// How often a timed read wakes up to check deadlines and cancellation
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 100;

/// Terminates every command sent to the module
pub const COMMAND_TERMINATOR: char = '\r';

/// Prompt printed by the module once it is ready for the next command
pub const PROMPT: u8 = b'>';
