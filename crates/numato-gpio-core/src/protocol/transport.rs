//! Device handle opening
//!
//! A handle is opened for each transaction and closed when it is dropped.

use std::fs::OpenOptions;
use std::io::{Read, Write};
use std::time::Duration;

use super::{ModuleConfig, ProtocolError};

/// An open read-write channel to the module
pub trait DeviceHandle: Read + Write + Send {}

impl<T: Read + Write + Send> DeviceHandle for T {}

/// Opens a fresh handle to the module's character device
pub trait PortOpener: Send + Sync {
    /// Open `path` for reading and writing
    fn open(&self, path: &str) -> Result<Box<dyn DeviceHandle>, ProtocolError>;
}

/// Opens the device as a plain read-write file.
///
/// Reads on the handle block until data arrives, so timeouts and cancellation
/// are only observed between reads. Pair with a configurator that has already
/// put the line into raw mode.
#[derive(Debug, Clone, Default)]
pub struct FileOpener;

impl PortOpener for FileOpener {
    fn open(&self, path: &str) -> Result<Box<dyn DeviceHandle>, ProtocolError> {
        let file = OpenOptions::new().read(true).write(true).open(path)?;
        Ok(Box::new(file))
    }
}

/// Opens the device through the platform serial API with a short read timeout
/// so the reply loop can wake up to check deadlines and cancellation.
#[derive(Debug, Clone)]
pub struct SerialOpener {
    baud_rate: u32,
    poll_interval: Duration,
}

impl SerialOpener {
    /// Create an opener; `poll_interval` bounds how long a single read blocks
    pub fn new(baud_rate: u32, poll_interval: Duration) -> Self {
        Self {
            baud_rate,
            poll_interval,
        }
    }

    /// Create an opener from the module configuration
    pub fn from_config(config: &ModuleConfig) -> Self {
        Self::new(config.baud_rate, config.poll_interval())
    }
}

impl PortOpener for SerialOpener {
    fn open(&self, path: &str) -> Result<Box<dyn DeviceHandle>, ProtocolError> {
        let port = serialport::new(path, self.baud_rate)
            .flow_control(serialport::FlowControl::None)
            .timeout(self.poll_interval)
            .open()?;

        // Drop a leftover prompt or late reply from an earlier transaction
        port.clear(serialport::ClearBuffer::Input)?;

        Ok(Box::new(port))
    }
}
