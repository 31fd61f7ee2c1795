//! Protocol commands
//!
//! Defines the commands understood by the Numato Lab GPIO module firmware and
//! their ASCII encoding.

use super::COMMAND_TERMINATOR;

/// Protocol commands for the GPIO module
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Read the user-assignable module id (`id get`)
    IdGet,

    /// Assign the module id (`id set`)
    IdSet(String),

    /// Drive a pin low (`gpio clear`)
    GpioClear(u8),

    /// Drive a pin high (`gpio set`)
    GpioSet(u8),

    /// Read the digital level of a pin (`gpio read`)
    GpioRead(u8),

    /// Read the analog value of a pin (`adc read`)
    AdcRead(u8),

    /// Read all 32 pins as a bitmask (`gpio readall`)
    GpioReadAll,

    /// Write all 32 pins from a bitmask (`gpio writeall`)
    GpioWriteAll(u32),

    /// Select which pins are affected by `writeall`/`iodir` (`gpio iomask`)
    GpioIoMask(u32),

    /// Set the direction of all pins, 1 = input (`gpio iodir`)
    GpioIoDir(u32),

    /// Query the firmware version (`ver`)
    Version,
}

impl Command {
    /// Get the command text without the terminator, e.g. `gpio read 1`
    pub fn text(&self) -> String {
        match self {
            Command::IdGet => "id get".to_string(),
            Command::IdSet(id) => format!("id set {}", id),
            Command::GpioClear(pin) => format!("gpio clear {}", pin),
            Command::GpioSet(pin) => format!("gpio set {}", pin),
            Command::GpioRead(pin) => format!("gpio read {}", pin),
            Command::AdcRead(pin) => format!("adc read {}", pin),
            Command::GpioReadAll => "gpio readall".to_string(),
            Command::GpioWriteAll(mask) => format!("gpio writeall {}", encode_mask(*mask)),
            Command::GpioIoMask(mask) => format!("gpio iomask {}", encode_mask(*mask)),
            Command::GpioIoDir(mask) => format!("gpio iodir {}", encode_mask(*mask)),
            Command::Version => "ver".to_string(),
        }
    }

    /// Get the full wire form, terminated by a carriage return
    pub fn encode(&self) -> String {
        let mut text = self.text();
        text.push(COMMAND_TERMINATOR);
        text
    }

    /// Convert command to bytes for transmission
    pub fn to_bytes(&self) -> Vec<u8> {
        self.encode().into_bytes()
    }
}

/// Encode a 32-bit mask argument.
///
/// Zero is sent as the literal `00000000`. Nonzero values are sent as plain
/// lowercase hex without padding, which is what the module has been observed
/// to accept.
pub fn encode_mask(value: u32) -> String {
    if value == 0 {
        "00000000".to_string()
    } else {
        format!("{:x}", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_command_encoding() {
        assert_eq!(Command::IdGet.encode(), "id get\r");
        assert_eq!(Command::IdSet("00000000".into()).encode(), "id set 00000000\r");
        assert_eq!(Command::GpioClear(1).encode(), "gpio clear 1\r");
        assert_eq!(Command::GpioSet(31).encode(), "gpio set 31\r");
        assert_eq!(Command::GpioRead(7).encode(), "gpio read 7\r");
        assert_eq!(Command::AdcRead(1).encode(), "adc read 1\r");
        assert_eq!(Command::GpioReadAll.encode(), "gpio readall\r");
        assert_eq!(Command::Version.encode(), "ver\r");
    }

    #[test]
    fn test_mask_commands() {
        assert_eq!(
            Command::GpioWriteAll(0x7FFF_FFFF).encode(),
            "gpio writeall 7fffffff\r"
        );
        assert_eq!(Command::GpioIoMask(0).encode(), "gpio iomask 00000000\r");
        assert_eq!(Command::GpioIoDir(0xff).encode(), "gpio iodir ff\r");
    }

    #[test]
    fn test_encode_mask() {
        assert_eq!(encode_mask(0), "00000000");
        assert_eq!(encode_mask(2147483647), "7fffffff");
        assert_eq!(encode_mask(0xFFFF_FFFF), "ffffffff");
        // Nonzero values are not padded
        assert_eq!(encode_mask(1), "1");
        assert_eq!(encode_mask(0x00AB_0000), "ab0000");
    }

    #[test]
    fn test_command_to_bytes() {
        assert_eq!(Command::GpioReadAll.to_bytes(), b"gpio readall\r".to_vec());
    }
}
