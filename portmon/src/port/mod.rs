//! Line source
//!
//! Wraps a byte-oriented serial connection and turns it into a sequence
//! of decoded, trimmed text lines. Reads block with a bounded timeout so
//! that a reader thread polling a shutdown flag between reads is never
//! stuck for more than one timeout interval. Any decode or I/O fault
//! ends the stream; faults are not retried.

mod serial;

pub use serial::SerialLineSource;

use std::io;

/// Read timeout for a single attempt on the underlying connection.
pub const READ_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(1);

/// Possible errors when receiving a line from a source.
#[derive(Debug)]
pub enum RecvError {
    /// The received bytes were not valid UTF-8.
    Decode,
    /// Low level IO error.
    IO(io::Error),
}

impl std::fmt::Display for RecvError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecvError::Decode => write!(f, "invalid UTF-8 in stream"),
            RecvError::IO(e) => write!(f, "read failed: {}", e),
        }
    }
}

impl std::error::Error for RecvError {}

/// Generic interface for the transport underneath a session's read loop.
///
/// `Ok(Some(line))` is a decoded, whitespace-trimmed, non-empty line.
/// `Ok(None)` means the read timed out or produced only a blank line;
/// the caller should check its loop condition and call again. Any `Err`
/// means the stream is over and the source should be discarded.
pub trait LineRead: Send {
    fn read_line(&mut self) -> Result<Option<String>, RecvError>;
}

/// The baud rates the tool knows how to ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaudRate {
    B9600,
    B19200,
    B38400,
    B57600,
    B115200,
}

impl BaudRate {
    pub const ALL: [BaudRate; 5] = [
        BaudRate::B9600,
        BaudRate::B19200,
        BaudRate::B38400,
        BaudRate::B57600,
        BaudRate::B115200,
    ];

    pub fn bps(&self) -> u32 {
        match self {
            BaudRate::B9600 => 9600,
            BaudRate::B19200 => 19200,
            BaudRate::B38400 => 38400,
            BaudRate::B57600 => 57600,
            BaudRate::B115200 => 115200,
        }
    }
}

impl TryFrom<u32> for BaudRate {
    type Error = u32;

    fn try_from(bps: u32) -> Result<Self, u32> {
        match bps {
            9600 => Ok(BaudRate::B9600),
            19200 => Ok(BaudRate::B19200),
            38400 => Ok(BaudRate::B38400),
            57600 => Ok(BaudRate::B57600),
            115200 => Ok(BaudRate::B115200),
            other => Err(other),
        }
    }
}

impl std::fmt::Display for BaudRate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.bps())
    }
}
