//! Transaction engine
//!
//! Runs one open/write/read/close cycle per public operation against the GPIO
//! module.

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};

use super::{
    response::{decode_decimal, decode_hex, decode_id, extract_response_line, read_response},
    serial::{LinkConfigurator, NativeConfigurator, SttyConfigurator},
    transport::{FileOpener, PortOpener, SerialOpener},
    CancelHandle, Command, LinkMethod, ModuleConfig, ProtocolError, ReadLimits,
};

/// Driver for a Numato Lab 32 channel USB GPIO module
///
/// ```rust,ignore
/// use numato_gpio_core::protocol::{GpioModule, ModuleConfig};
///
/// let module = GpioModule::new(ModuleConfig::new("/dev/ttyACM0"));
/// module.initialize()?;
/// module.gpio_set(1)?;
/// assert_eq!(module.gpio_read(1)?, 1);
/// ```
pub struct GpioModule {
    config: ModuleConfig,
    configurator: Box<dyn LinkConfigurator>,
    opener: Box<dyn PortOpener>,
    initialized: AtomicBool,
    cancel: CancelHandle,
}

impl GpioModule {
    /// Create a driver using the link method selected in `config`
    pub fn new(config: ModuleConfig) -> Self {
        let (configurator, opener): (Box<dyn LinkConfigurator>, Box<dyn PortOpener>) =
            match config.link_method {
                LinkMethod::Native => (
                    Box::new(NativeConfigurator::new(config.baud_rate)),
                    Box::new(SerialOpener::from_config(&config)),
                ),
                LinkMethod::Stty => (
                    Box::new(SttyConfigurator::new(config.stty_path.clone())),
                    Box::new(FileOpener),
                ),
            };
        Self::with_link(config, configurator, opener)
    }

    /// Create a driver with a custom configurator and handle opener
    pub fn with_link(
        config: ModuleConfig,
        configurator: Box<dyn LinkConfigurator>,
        opener: Box<dyn PortOpener>,
    ) -> Self {
        Self {
            config,
            configurator,
            opener,
            initialized: AtomicBool::new(false),
            cancel: CancelHandle::new(),
        }
    }

    /// Set the character device path (e.g., "/dev/ttyACM0")
    pub fn set_device_path(&mut self, path: impl Into<String>) -> &mut Self {
        self.config.device_path = path.into();
        self.initialized.store(false, Ordering::SeqCst);
        self
    }

    /// Get the configured device path
    pub fn device_path(&self) -> &str {
        &self.config.device_path
    }

    /// Get the active configuration
    pub fn config(&self) -> &ModuleConfig {
        &self.config
    }

    /// Handle that aborts the transaction in flight from another thread
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Check if the line has been initialized
    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    fn require_path(&self) -> Result<&str, ProtocolError> {
        if self.config.device_path.is_empty() {
            return Err(ProtocolError::DevicePathUnset);
        }
        Ok(&self.config.device_path)
    }

    /// Prepare the serial line. Must be called before issuing any commands.
    pub fn initialize(&self) -> Result<(), ProtocolError> {
        let path = self.require_path()?;
        self.configurator.initialize(path)?;
        self.initialized.store(true, Ordering::SeqCst);
        tracing::debug!("{}: line initialized", path);
        Ok(())
    }

    /// Send a command and return the line following its echo.
    ///
    /// The handle is opened for this call only and is closed on every exit
    /// path. A reply without a second line yields an empty string.
    pub fn transact(&self, command: &Command) -> Result<String, ProtocolError> {
        let path = self.require_path()?;
        if !self.is_initialized() {
            tracing::warn!("{}: sending '{}' before initialize()", path, command.text());
        }

        self.cancel.reset();
        let limits = ReadLimits {
            max_len: self.config.max_response_len,
            timeout: self.config.read_timeout(),
        };

        let mut handle = self.opener.open(path)?;
        let bytes = command.to_bytes();
        tracing::debug!("{}: sending {:?}", path, command.encode());
        handle.write_all(&bytes)?;
        handle.flush()?;

        let raw = read_response(&mut *handle, &limits, &self.cancel)?;
        drop(handle);

        tracing::debug!(
            "{}: received {} bytes: {:?}",
            path,
            raw.len(),
            String::from_utf8_lossy(&raw)
        );

        Ok(extract_response_line(&raw).unwrap_or_else(|| {
            tracing::debug!("{}: no response line for '{}'", path, command.text());
            String::new()
        }))
    }

    /// Run a command whose reply carries data, rejecting an empty reply line
    fn query(&self, command: &Command) -> Result<String, ProtocolError> {
        let line = self.transact(command)?;
        if line.trim().is_empty() {
            return Err(ProtocolError::EmptyResponse {
                command: command.text(),
            });
        }
        Ok(line)
    }

    /// Read the module id
    pub fn id_get(&self) -> Result<String, ProtocolError> {
        let line = self.query(&Command::IdGet)?;
        Ok(decode_id(&line))
    }

    /// Assign the module id
    pub fn id_set(&self, id: &str) -> Result<(), ProtocolError> {
        if id.contains(['\r', '\n']) {
            return Err(ProtocolError::InvalidArgument(format!(
                "id {:?} contains a line terminator",
                id
            )));
        }
        self.transact(&Command::IdSet(id.to_string()))?;
        Ok(())
    }

    /// Drive a pin low
    pub fn gpio_clear(&self, pin: u8) -> Result<(), ProtocolError> {
        self.transact(&Command::GpioClear(pin))?;
        Ok(())
    }

    /// Drive a pin high
    pub fn gpio_set(&self, pin: u8) -> Result<(), ProtocolError> {
        self.transact(&Command::GpioSet(pin))?;
        Ok(())
    }

    /// Read the digital level of a pin (0 or 1)
    pub fn gpio_read(&self, pin: u8) -> Result<u8, ProtocolError> {
        let line = self.query(&Command::GpioRead(pin))?;
        decode_decimal(&line)
    }

    /// Read the analog value of a pin (0-1023)
    pub fn adc_read(&self, pin: u8) -> Result<u16, ProtocolError> {
        let line = self.query(&Command::AdcRead(pin))?;
        decode_decimal(&line)
    }

    /// Read all pins as a bitmask, bit N = pin N
    pub fn gpio_read_all(&self) -> Result<u32, ProtocolError> {
        let line = self.query(&Command::GpioReadAll)?;
        decode_hex(&line)
    }

    /// Write all pins from a bitmask
    pub fn gpio_write_all(&self, mask: u32) -> Result<(), ProtocolError> {
        self.transact(&Command::GpioWriteAll(mask))?;
        Ok(())
    }

    /// Set the mask of pins affected by `gpio_write_all` and `gpio_write_iodir`
    pub fn gpio_write_iomask(&self, mask: u32) -> Result<(), ProtocolError> {
        self.transact(&Command::GpioIoMask(mask))?;
        Ok(())
    }

    /// Set the direction of all pins (1 = input, 0 = output)
    pub fn gpio_write_iodir(&self, mask: u32) -> Result<(), ProtocolError> {
        self.transact(&Command::GpioIoDir(mask))?;
        Ok(())
    }

    /// Query the firmware version
    pub fn version(&self) -> Result<u32, ProtocolError> {
        let line = self.query(&Command::Version)?;
        decode_hex(&line)
    }
}
