use super::{BaudRate, LineRead, RecvError, READ_TIMEOUT};
use serialport::SerialPort;
use std::io::{self, Read};

/// A serial connection read line by line.
///
/// Bytes accumulate in a pending buffer until a newline shows up; the
/// completed line is decoded as strict UTF-8 and trimmed. The underlying
/// handle is released on drop.
pub struct SerialLineSource {
    port: Box<dyn SerialPort>,
    pending: Vec<u8>,
}

impl SerialLineSource {
    pub fn open(port_name: &str, baud: BaudRate) -> Result<SerialLineSource, serialport::Error> {
        let port = serialport::new(port_name, baud.bps())
            .timeout(READ_TIMEOUT)
            .open()?;
        Ok(SerialLineSource {
            port,
            pending: Vec::new(),
        })
    }
}

impl LineRead for SerialLineSource {
    fn read_line(&mut self) -> Result<Option<String>, RecvError> {
        loop {
            while let Some(raw) = take_raw_line(&mut self.pending) {
                if let Some(line) = decode_line(raw)? {
                    return Ok(Some(line));
                }
            }
            let mut buf = [0u8; 256];
            match self.port.read(&mut buf) {
                Ok(0) => return Ok(None),
                Ok(n) => self.pending.extend_from_slice(&buf[..n]),
                Err(e)
                    if matches!(
                        e.kind(),
                        io::ErrorKind::TimedOut
                            | io::ErrorKind::WouldBlock
                            | io::ErrorKind::Interrupted
                    ) =>
                {
                    return Ok(None)
                }
                Err(e) => return Err(RecvError::IO(e)),
            }
        }
    }
}

/// Split the next `\n`-terminated chunk off the front of `pending`.
fn take_raw_line(pending: &mut Vec<u8>) -> Option<Vec<u8>> {
    let nl = pending.iter().position(|&b| b == b'\n')?;
    let rest = pending.split_off(nl + 1);
    Some(std::mem::replace(pending, rest))
}

/// Decode and trim one raw line. Blank lines collapse to `None`.
fn decode_line(raw: Vec<u8>) -> Result<Option<String>, RecvError> {
    let text = String::from_utf8(raw).map_err(|_| RecvError::Decode)?;
    let trimmed = text.trim();
    if trimmed.is_empty() {
        Ok(None)
    } else {
        Ok(Some(trimmed.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_newline_and_keeps_remainder() {
        let mut pending = b"first\r\nsecond\npartial".to_vec();
        assert_eq!(take_raw_line(&mut pending), Some(b"first\r\n".to_vec()));
        assert_eq!(take_raw_line(&mut pending), Some(b"second\n".to_vec()));
        assert_eq!(take_raw_line(&mut pending), None);
        assert_eq!(pending, b"partial");
    }

    #[test]
    fn decode_trims_whitespace() {
        let line = decode_line(b"  Temperature: 23.5 C\r\n".to_vec()).unwrap();
        assert_eq!(line.as_deref(), Some("Temperature: 23.5 C"));
    }

    #[test]
    fn decode_collapses_blank_lines() {
        assert!(decode_line(b"\r\n".to_vec()).unwrap().is_none());
        assert!(decode_line(b"   \n".to_vec()).unwrap().is_none());
    }

    #[test]
    fn decode_rejects_invalid_utf8() {
        assert!(matches!(
            decode_line(vec![0xff, 0xfe, b'\n']),
            Err(RecvError::Decode)
        ));
    }
}
