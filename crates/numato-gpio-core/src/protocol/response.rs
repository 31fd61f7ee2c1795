//! Response framing and decoding
//!
//! The module answers every command with the echoed command, a result line
//! (empty for commands without data) and a `>` prompt. The firmware ends lines
//! with `\n\r`, so a result line usually starts with a stray `\r`; decoders
//! ignore surrounding whitespace.

use std::io::{ErrorKind, Read};
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::{ProtocolError, MAX_RESPONSE_LEN, PROMPT};

/// Bounds applied to a single reply read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadLimits {
    /// Stop reading once this many bytes have been received
    pub max_len: usize,
    /// Give up after this long. `None` waits until the reply is complete or the
    /// device goes away.
    pub timeout: Option<Duration>,
}

impl Default for ReadLimits {
    fn default() -> Self {
        Self {
            max_len: MAX_RESPONSE_LEN,
            timeout: None,
        }
    }
}

/// Shared flag used to abort the transaction currently in flight
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    flag: Arc<AtomicBool>,
}

impl CancelHandle {
    /// Create a handle in the non-cancelled state
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Takes effect at the next read attempt.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Check whether cancellation was requested
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    pub(crate) fn reset(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

/// Check whether a reply has been fully received: the `>` prompt has arrived
/// at the start of a line after the echo line.
///
/// A `>` inside the result line does not count, so result text is never cut
/// short when it arrives in pieces.
pub fn is_complete(raw: &[u8]) -> bool {
    let Some(echo_end) = raw.iter().position(|&b| b == b'\n') else {
        return false;
    };
    let rest = &raw[echo_end..];
    rest.iter().enumerate().any(|(i, &b)| {
        b == PROMPT && (rest[..i].ends_with(b"\n") || rest[..i].ends_with(b"\n\r"))
    })
}

/// Read a reply from `reader` until it is complete.
///
/// Reads are accumulated across calls so replies split into several fragments
/// are reassembled. Read timeouts reported by the handle are treated as
/// wake-ups to re-check the deadline and the cancel flag. When the deadline
/// passes with a partial reply, the partial bytes are returned.
pub fn read_response<R: Read + ?Sized>(
    reader: &mut R,
    limits: &ReadLimits,
    cancel: &CancelHandle,
) -> Result<Vec<u8>, ProtocolError> {
    let mut response = Vec::new();
    let mut buffer = [0u8; 256];
    let start = Instant::now();

    loop {
        if cancel.is_cancelled() {
            return Err(ProtocolError::Cancelled);
        }

        if let Some(timeout) = limits.timeout {
            if start.elapsed() > timeout {
                if response.is_empty() {
                    return Err(ProtocolError::Timeout);
                }
                tracing::warn!(
                    "reply incomplete after {}ms, using {} bytes received",
                    timeout.as_millis(),
                    response.len()
                );
                break;
            }
        }

        let room = limits.max_len.saturating_sub(response.len());
        if room == 0 {
            tracing::warn!("reply reached {} bytes, truncating", limits.max_len);
            break;
        }
        let to_read = room.min(buffer.len());

        match reader.read(&mut buffer[..to_read]) {
            Ok(0) => {
                tracing::debug!("read returned 0 (EOF)");
                break;
            }
            Ok(n) => {
                response.extend_from_slice(&buffer[..n]);
                tracing::trace!("read {} bytes, total = {}", n, response.len());
                if is_complete(&response) {
                    break;
                }
            }
            Err(ref e)
                if matches!(
                    e.kind(),
                    ErrorKind::TimedOut | ErrorKind::WouldBlock | ErrorKind::Interrupted
                ) =>
            {
                // Timed handle woke up without data, loop to re-check limits
            }
            Err(e) => return Err(ProtocolError::IoError(e)),
        }
    }

    Ok(response)
}

/// Extract the line following the command echo.
///
/// Lines are split on `\n` with one trailing `\r` removed. Returns `None` when
/// the reply has no second line.
pub fn extract_response_line(raw: &[u8]) -> Option<String> {
    let text = String::from_utf8_lossy(raw);
    text.split('\n')
        .nth(1)
        .map(|line| line.strip_suffix('\r').unwrap_or(line).to_string())
}

/// Keep only the ASCII letters and digits of a device id reply
pub fn decode_id(line: &str) -> String {
    line.chars().filter(|c| c.is_ascii_alphanumeric()).collect()
}

/// Parse a base-10 reply
pub fn decode_decimal<T: FromStr>(line: &str) -> Result<T, ProtocolError> {
    let text = line.trim();
    text.parse::<T>().map_err(|_| ProtocolError::InvalidNumber {
        text: text.to_string(),
        radix: 10,
    })
}

/// Parse a base-16 reply, with or without a `0x` prefix
pub fn decode_hex(line: &str) -> Result<u32, ProtocolError> {
    let text = line.trim();
    let digits = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);
    u32::from_str_radix(digits, 16).map_err(|_| ProtocolError::InvalidNumber {
        text: text.to_string(),
        radix: 16,
    })
}
