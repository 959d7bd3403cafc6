//! Outbound replies (device to host), one per inbound command line.

use core::fmt;

use crate::constants::{
    ACK, ACK_ERROR_TOKEN, CMD_EXECUTED, CMD_FAILED, ERROR, HANDSHAKE_PREFIX, LIST, LIST_END, PONG,
    STATUS, STATUS_END, TEST, UNKNOWN, VALUE,
};
use crate::types::{Arity, Value, ValueKind};

/// Device identity fields carried by the handshake reply.
///
/// Extra `key=value` fields are appended after the fixed ones, so readers
/// that only check the `XPDR` prefix or the first fields keep working.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Handshake<'a> {
    pub firmware_version: &'a str,
    pub board_type: &'a str,
    pub device_name: &'a str,
    pub extras: &'a [(&'a str, &'a str)],
}

impl fmt::Display for Handshake<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{};fw={};board={};name={}",
            HANDSHAKE_PREFIX, self.firmware_version, self.board_type, self.device_name
        )?;
        for (key, value) in self.extras {
            write!(f, ";{}={}", key, value)?;
        }
        Ok(())
    }
}

/// Text of an `ERROR` reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ErrorReply<'a> {
    /// A write failed to resolve its key: `ERROR Unknown key '<key>'`.
    WriteRejected { key: &'a str },
    /// A write value could not be coerced: `ERROR Invalid value '<value>'`.
    InvalidValue { value: &'a str },
    /// A read failed: `ERROR Unknown key: <key>`.
    UnknownKey { key: &'a str },
    /// `READ`/`WRITE` named a type that does not exist.
    UnknownType { kind: &'a str },
    /// A stored value cannot be shown as the requested type.
    TypeMismatch { key: &'a str, kind: &'a str },
    /// Command refused before the handshake.
    NotConnected,
    /// A reply did not fit the outbound line buffer.
    ResponseTooLong,
}

impl fmt::Display for ErrorReply<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WriteRejected { key } => write!(f, "{} Unknown key '{}'", ERROR, key),
            Self::InvalidValue { value } => write!(f, "{} Invalid value '{}'", ERROR, value),
            Self::UnknownKey { key } => write!(f, "{} Unknown key: {}", ERROR, key),
            Self::UnknownType { kind } => write!(f, "{} Unknown type: {}", ERROR, kind),
            Self::TypeMismatch { key, kind } => {
                write!(f, "{} Type mismatch: {} is not {}", ERROR, key, kind)
            }
            Self::NotConnected => write!(f, "{} Not connected", ERROR),
            Self::ResponseTooLong => write!(f, "{} Response too long", ERROR),
        }
    }
}

/// One outbound reply line.
///
/// `Display` renders the line without its terminator; use
/// [`Serialize`](crate::Serialize) to get framed bytes.
///
/// # Example
///
/// ```
/// use dataref_proto::Response;
///
/// let ack = Response::Ack { key: "LED_STATE[3]", value: "300" };
/// assert_eq!(format!("{}", ack), "ACK LED_STATE[3] 300");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Response<'a> {
    Handshake(Handshake<'a>),
    /// `ACK <key> <value>`, echoing the request text.
    Ack { key: &'a str, value: &'a str },
    /// `ACK <key> ERROR`, sent after the `ERROR` line of a failed write.
    AckError { key: &'a str },
    /// `VALUE <key> <value>`, or `VALUE <key> <value> <type>` for `READ`.
    Value {
        key: &'a str,
        value: &'a Value,
        kind: Option<&'a str>,
    },
    Error(ErrorReply<'a>),
    CmdExecuted { path: &'a str },
    CmdFailed { path: &'a str },
    Pong,
    /// First line of a `STATUS` dump.
    Status {
        connected: bool,
        device_name: &'a str,
        entries: usize,
    },
    StatusEnd,
    /// One line of a `LIST` dump: `LIST <key> <kind>` or `LIST <key> <kind>[<N>]`.
    ListEntry {
        key: &'a str,
        kind: ValueKind,
        arity: Arity,
    },
    ListEnd { count: usize },
    Test { passed: bool },
    /// `UNKNOWN: <line>`
    Unknown { line: &'a str },
    /// Device-defined reply to a custom verb, sent as-is.
    Custom { line: &'a str },
}

impl fmt::Display for Response<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Handshake(handshake) => handshake.fmt(f),
            Self::Ack { key, value } => write!(f, "{} {} {}", ACK, key, value),
            Self::AckError { key } => write!(f, "{} {} {}", ACK, key, ACK_ERROR_TOKEN),
            Self::Value { key, value, kind } => {
                write!(f, "{} {} {}", VALUE, key, value)?;
                if let Some(kind) = kind {
                    write!(f, " {}", kind)?;
                }
                Ok(())
            }
            Self::Error(err) => err.fmt(f),
            Self::CmdExecuted { path } => write!(f, "{} {}", CMD_EXECUTED, path),
            Self::CmdFailed { path } => write!(f, "{} {}", CMD_FAILED, path),
            Self::Pong => f.write_str(PONG),
            Self::Status {
                connected,
                device_name,
                entries,
            } => {
                let state = if *connected { "CONNECTED" } else { "UNIDENTIFIED" };
                write!(f, "{} {} {} {}", STATUS, state, device_name, entries)
            }
            Self::StatusEnd => f.write_str(STATUS_END),
            Self::ListEntry { key, kind, arity } => match arity {
                Arity::Scalar => write!(f, "{} {} {}", LIST, key, kind),
                Arity::Array(n) => write!(f, "{} {} {}[{}]", LIST, key, kind, n),
            },
            Self::ListEnd { count } => write!(f, "{} {}", LIST_END, count),
            Self::Test { passed } => {
                write!(f, "{} {}", TEST, if *passed { "OK" } else { "FAILED" })
            }
            Self::Unknown { line } => write!(f, "{} {}", UNKNOWN, line),
            Self::Custom { line } => f.write_str(line),
        }
    }
}
