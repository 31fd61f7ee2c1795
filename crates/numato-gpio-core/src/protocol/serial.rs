//! Serial line handling
//!
//! Prepares the module's character device for raw request/response traffic.

use std::process::Command as Process;

use super::{ProtocolError, DEFAULT_BAUD_RATE, DEFAULT_STTY_PATH};

/// Brings a character device into raw, flow-control-free mode
pub trait LinkConfigurator: Send + Sync {
    /// Clear XON/XOFF and RTS/CTS flow control on `path`
    fn disable_flow_control(&self, path: &str) -> Result<(), ProtocolError>;

    /// Switch `path` to raw (non-canonical, non-echoing) mode
    fn enable_raw_mode(&self, path: &str) -> Result<(), ProtocolError>;

    /// Full line setup. Flow control must be cleared before raw mode is requested.
    fn initialize(&self, path: &str) -> Result<(), ProtocolError> {
        self.disable_flow_control(path)?;
        self.enable_raw_mode(path)
    }
}

/// Configures the line through the platform serial API
#[derive(Debug, Clone)]
pub struct NativeConfigurator {
    baud_rate: u32,
}

impl NativeConfigurator {
    /// Create a configurator opening the port at `baud_rate`
    pub fn new(baud_rate: u32) -> Self {
        Self { baud_rate }
    }
}

impl Default for NativeConfigurator {
    fn default() -> Self {
        Self::new(DEFAULT_BAUD_RATE)
    }
}

fn configuration_error(path: &str, e: serialport::Error) -> ProtocolError {
    ProtocolError::ConfigurationFailed(format!("{}: {}", path, e))
}

impl LinkConfigurator for NativeConfigurator {
    fn disable_flow_control(&self, path: &str) -> Result<(), ProtocolError> {
        let mut port = serialport::new(path, self.baud_rate)
            .open()
            .map_err(|e| configuration_error(path, e))?;
        port.set_flow_control(serialport::FlowControl::None)
            .map_err(|e| configuration_error(path, e))?;
        tracing::debug!("{}: flow control disabled", path);
        Ok(())
    }

    fn enable_raw_mode(&self, path: &str) -> Result<(), ProtocolError> {
        // Only checks that the port opens and accepts 8N1. serialport selects
        // raw mode on open, and SerialOpener applies the same settings again on
        // every transaction.
        let mut port = serialport::new(path, self.baud_rate)
            .open()
            .map_err(|e| configuration_error(path, e))?;
        port.set_data_bits(serialport::DataBits::Eight)
            .map_err(|e| configuration_error(path, e))?;
        port.set_parity(serialport::Parity::None)
            .map_err(|e| configuration_error(path, e))?;
        port.set_stop_bits(serialport::StopBits::One)
            .map_err(|e| configuration_error(path, e))?;
        tracing::debug!("{}: raw mode enabled (8N1)", path);
        Ok(())
    }
}

/// Configures the line by running `stty` as a child process
#[derive(Debug, Clone)]
pub struct SttyConfigurator {
    stty_path: String,
}

impl SttyConfigurator {
    /// Create a configurator running the `stty` binary at `stty_path`
    pub fn new(stty_path: impl Into<String>) -> Self {
        Self {
            stty_path: stty_path.into(),
        }
    }

    /// Arguments that clear software and hardware flow control
    pub fn flow_control_args(path: &str) -> Vec<String> {
        ["-F", path, "-ixon", "-ixoff", "-crtscts"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    /// Arguments that select raw mode
    pub fn raw_mode_args(path: &str) -> Vec<String> {
        ["-F", path, "raw"].iter().map(|s| s.to_string()).collect()
    }

    fn run(&self, args: &[String]) -> Result<(), ProtocolError> {
        tracing::debug!("running {} {}", self.stty_path, args.join(" "));
        let output = Process::new(&self.stty_path)
            .args(args)
            .output()
            .map_err(|e| {
                ProtocolError::ConfigurationFailed(format!("cannot run {}: {}", self.stty_path, e))
            })?;

        if !output.status.success() {
            return Err(ProtocolError::ConfigurationFailed(format!(
                "{} {} exited with {}: {}",
                self.stty_path,
                args.join(" "),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(())
    }
}

impl Default for SttyConfigurator {
    fn default() -> Self {
        Self::new(DEFAULT_STTY_PATH)
    }
}

impl LinkConfigurator for SttyConfigurator {
    fn disable_flow_control(&self, path: &str) -> Result<(), ProtocolError> {
        self.run(&Self::flow_control_args(path))
    }

    fn enable_raw_mode(&self, path: &str) -> Result<(), ProtocolError> {
        self.run(&Self::raw_mode_args(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingConfigurator {
        calls: Mutex<Vec<String>>,
        fail_flow_control: bool,
    }

    impl LinkConfigurator for RecordingConfigurator {
        fn disable_flow_control(&self, path: &str) -> Result<(), ProtocolError> {
            self.calls.lock().unwrap().push(format!("flow {}", path));
            if self.fail_flow_control {
                return Err(ProtocolError::ConfigurationFailed("boom".into()));
            }
            Ok(())
        }

        fn enable_raw_mode(&self, path: &str) -> Result<(), ProtocolError> {
            self.calls.lock().unwrap().push(format!("raw {}", path));
            Ok(())
        }
    }

    #[test]
    fn test_initialize_order() {
        let cfg = RecordingConfigurator::default();
        cfg.initialize("/dev/ttyACM0").unwrap();
        assert_eq!(
            *cfg.calls.lock().unwrap(),
            vec!["flow /dev/ttyACM0", "raw /dev/ttyACM0"]
        );
    }

    #[test]
    fn test_initialize_stops_on_failure() {
        let cfg = RecordingConfigurator {
            fail_flow_control: true,
            ..Default::default()
        };
        assert!(cfg.initialize("/dev/ttyACM0").is_err());
        assert_eq!(*cfg.calls.lock().unwrap(), vec!["flow /dev/ttyACM0"]);
    }

    #[test]
    fn test_stty_args() {
        assert_eq!(
            SttyConfigurator::flow_control_args("/dev/ttyACM0"),
            vec!["-F", "/dev/ttyACM0", "-ixon", "-ixoff", "-crtscts"]
        );
        assert_eq!(
            SttyConfigurator::raw_mode_args("/dev/ttyACM0"),
            vec!["-F", "/dev/ttyACM0", "raw"]
        );
    }

    #[test]
    fn test_stty_missing_binary() {
        let cfg = SttyConfigurator::new("/nonexistent/bin/stty");
        let err = cfg.initialize("/dev/ttyACM0").unwrap_err();
        assert!(matches!(err, ProtocolError::ConfigurationFailed(_)));
    }

    #[test]
    fn test_native_missing_device() {
        let cfg = NativeConfigurator::default();
        let err = cfg.initialize("/dev/this-port-does-not-exist").unwrap_err();
        assert!(matches!(err, ProtocolError::ConfigurationFailed(_)));
    }

    #[test]
    fn test_native_raw_mode_missing_device() {
        let cfg = NativeConfigurator::default();
        let err = cfg
            .enable_raw_mode("/dev/this-port-does-not-exist")
            .unwrap_err();
        assert!(matches!(err, ProtocolError::ConfigurationFailed(_)));
    }
}
