//! Line serialization for outbound messages.
//!
//! Every protocol message renders itself through `Display`; the
//! [`Serialize`] trait frames that text as one `\n`-terminated line into a
//! byte buffer, a `heapless::Vec`, a `core::fmt::Write` or an
//! `embedded_io::Write` target.
//!
//! # Example
//!
//! ```
//! use dataref_proto::{Response, Serialize};
//!
//! let mut buf = [0u8; 32];
//! let len = Response::Pong.serialize(&mut buf).unwrap();
//! assert_eq!(&buf[..len], b"PONG\n");
//! ```

use core::fmt::{self, Write as _};

use crate::event::Event;
use crate::fmt::SliceWriter;
use crate::parser::Command;
use crate::response::Response;

/// Maximum size of one serialized outbound line, terminator included.
///
/// Sized for a `VALUE` reply carrying a full byte array:
/// prefix(6) + key(32) + index(12) + 64 elements * 4 + type(6) + \n(1) < 384.
pub const MAX_OUTBOUND_LINE: usize = 384;

/// Error type for serialization operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SerializeError {
    /// The output buffer is too small to hold the serialized line.
    BufferTooSmall,
    /// A write operation failed (for I/O adapters).
    WriteError,
}

impl fmt::Display for SerializeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BufferTooSmall => write!(f, "buffer too small"),
            Self::WriteError => write!(f, "write error"),
        }
    }
}

/// Extension trait for serializing protocol lines.
///
/// Implemented for [`Response`], [`Event`] and [`Command`]. The provided
/// methods only need `Display`.
pub trait Serialize: fmt::Display {
    /// Serialize to the provided buffer, appending the `\n` terminator.
    ///
    /// Returns the number of bytes written on success.
    ///
    /// # Errors
    ///
    /// Returns [`SerializeError::BufferTooSmall`] if the buffer is not large enough.
    fn serialize(&self, buf: &mut [u8]) -> Result<usize, SerializeError> {
        let mut w = SliceWriter::new(buf);
        write!(w, "{}", self).map_err(|_| SerializeError::BufferTooSmall)?;
        w.write_bytes(b"\n")
            .map_err(|_| SerializeError::BufferTooSmall)?;
        Ok(w.len())
    }

    /// Serialize to a `heapless::Vec`.
    ///
    /// # Errors
    ///
    /// Returns [`SerializeError::BufferTooSmall`] if `N` is not large enough.
    fn serialize_to_vec<const N: usize>(&self) -> Result<heapless::Vec<u8, N>, SerializeError> {
        let mut vec = heapless::Vec::new();
        // Resize to full capacity to allow serialize() to write
        vec.resize(N, 0)
            .map_err(|_| SerializeError::BufferTooSmall)?;
        let len = self.serialize(&mut vec)?;
        vec.truncate(len);
        Ok(vec)
    }

    /// Serialize to a `core::fmt::Write` implementation.
    ///
    /// # Errors
    ///
    /// Returns [`SerializeError::WriteError`] if the write fails.
    fn serialize_fmt<W: fmt::Write>(&self, writer: &mut W) -> Result<(), SerializeError> {
        writeln!(writer, "{}", self).map_err(|_| SerializeError::WriteError)
    }

    /// Serialize to an `embedded_io::Write` implementation.
    ///
    /// # Errors
    ///
    /// Returns [`SerializeError::BufferTooSmall`] if the line exceeds
    /// [`MAX_OUTBOUND_LINE`], or [`SerializeError::WriteError`] if the write fails.
    #[cfg(feature = "embedded-io")]
    fn serialize_io<W: embedded_io::Write>(&self, writer: &mut W) -> Result<(), SerializeError> {
        let mut buf = [0u8; MAX_OUTBOUND_LINE];
        let len = self.serialize(&mut buf)?;
        writer
            .write_all(&buf[..len])
            .map_err(|_| SerializeError::WriteError)
    }
}

impl Serialize for Response<'_> {}
impl Serialize for Event<'_> {}
impl Serialize for Command<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::KeyRef;
    use crate::parser::parse;
    use crate::types::Value;

    #[test]
    fn test_serialize_appends_newline() {
        let mut buf = [0u8; 64];
        let len = Response::Ack {
            key: "GEAR_LED",
            value: "1",
        }
        .serialize(&mut buf)
        .unwrap();
        assert_eq!(&buf[..len], b"ACK GEAR_LED 1\n");
    }

    #[test]
    fn test_buffer_too_small() {
        // Room for the text but not the terminator
        let mut buf = [0u8; 4];
        assert_eq!(
            Response::Pong.serialize(&mut buf),
            Err(SerializeError::BufferTooSmall)
        );
        let mut buf = [0u8; 5];
        assert_eq!(Response::Pong.serialize(&mut buf), Ok(5));
    }

    #[test]
    fn test_serialize_to_vec() {
        let ev = Event::Heartbeat { uptime_secs: 42 };
        let vec: heapless::Vec<u8, 32> = ev.serialize_to_vec().unwrap();
        assert_eq!(&vec[..], b"HEARTBEAT 42\n");

        let too_small: Result<heapless::Vec<u8, 4>, _> = ev.serialize_to_vec();
        assert_eq!(too_small, Err(SerializeError::BufferTooSmall));
    }

    #[test]
    fn test_serialize_fmt() {
        let mut out: heapless::String<64> = heapless::String::new();
        let v = Value::from_bytes(&[0, 128, 255]).unwrap();
        Response::Value {
            key: "LED_STATE",
            value: &v,
            kind: None,
        }
        .serialize_fmt(&mut out)
        .unwrap();
        assert_eq!(out.as_str(), "VALUE LED_STATE 0,128,255\n");
    }

    #[test]
    fn test_full_byte_array_fits_outbound_line() {
        let v = Value::from_bytes(&[255; crate::MAX_ARRAY_LEN]).unwrap();
        let key = "ABCDEFGHIJKLMNOPQRSTUVWXYZ012345";
        let mut buf = [0u8; MAX_OUTBOUND_LINE];
        assert!(Response::Value {
            key,
            value: &v,
            kind: Some("bytes"),
        }
        .serialize(&mut buf)
        .is_ok());
    }

    #[test]
    fn test_command_line_parses_back() {
        let cmd = Command::Set {
            key: KeyRef::element("LED_STATE", 3),
            value: "255",
        };
        let mut buf = [0u8; 64];
        let len = cmd.serialize(&mut buf).unwrap();
        assert_eq!(&buf[..len], b"SET LED_STATE[3] 255\n");
        let Command::Set { key, value } = parse(&buf[..len]).unwrap() else {
            panic!("expected SET");
        };
        assert_eq!((key.name(), key.index(), value), ("LED_STATE", Some(3), "255"));
    }
}
