//! # numato-gpio Core Library
//!
//! Host-side driver for the Numato Lab 32 Channel USB GPIO Module.

#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

//!
//! This library provides:
//! - Serial line preparation (flow control off, raw mode)
//! - ASCII command encoding for the module's command set
//! - Bounded, cancellable reply reading and typed decoding
//!
//! Every operation opens the device, sends one command, reads the reply and
//! closes the device again.
//!
//! ## Example
//!
//! ```rust,ignore
//! use numato_gpio_core::protocol::{GpioModule, ModuleConfig};
//!
//! let module = GpioModule::new(ModuleConfig::new("/dev/ttyACM0"));
//! module.initialize()?;
//!
//! println!("Version: {:x}", module.version()?);
//! module.gpio_clear(1)?;
//! println!("GPIO 1: {}", module.gpio_read(1)?);
//! ```

pub mod protocol;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::protocol::{Command, GpioModule, LinkMethod, ModuleConfig, ProtocolError};
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
