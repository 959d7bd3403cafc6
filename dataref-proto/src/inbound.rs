//! Host-side parsing of device (outbound) lines.
//!
//! The device emits two streams on one wire: replies to host commands and
//! unsolicited events. [`parse_device_line`] classifies a line by prefix so
//! a host can route events away from its pending request.

use crate::constants::{
    ACK, ACK_ERROR_TOKEN, CMD_EXECUTED, CMD_FAILED, ERROR, HANDSHAKE_PREFIX, HEARTBEAT, INPUT,
    PONG, VALUE,
};

/// A handshake reply, `XPDR;k=v;k=v...`, kept as the raw field list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HandshakeInfo<'a> {
    fields: &'a str,
}

impl<'a> HandshakeInfo<'a> {
    /// Look up a `key=value` field. Fields without `=` are skipped.
    #[must_use]
    pub fn field(&self, key: &str) -> Option<&'a str> {
        self.fields()
            .find_map(|(k, v)| if k == key { Some(v) } else { None })
    }

    /// Iterate over all `key=value` fields in order.
    pub fn fields(&self) -> impl Iterator<Item = (&'a str, &'a str)> {
        self.fields
            .split(';')
            .filter_map(|field| field.split_once('='))
    }

    #[must_use]
    pub fn firmware_version(&self) -> Option<&'a str> {
        self.field("fw")
    }

    #[must_use]
    pub fn board_type(&self) -> Option<&'a str> {
        self.field("board")
    }

    #[must_use]
    pub fn device_name(&self) -> Option<&'a str> {
        self.field("name")
    }
}

/// One classified device line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DeviceLine<'a> {
    Handshake(HandshakeInfo<'a>),
    Ack { key: &'a str, value: &'a str },
    AckError { key: &'a str },
    /// `value` is the rest of the line; for `READ` replies it still carries
    /// the trailing type token.
    Value { key: &'a str, value: &'a str },
    Error { message: &'a str },
    CmdExecuted { path: &'a str },
    CmdFailed { path: &'a str },
    Pong,
    Input { key: &'a str, value: &'a str },
    Heartbeat { uptime_secs: Option<u32> },
    /// Anything else, including `STATUS`/`LIST` dump lines and `UNKNOWN:` echoes.
    Other(&'a str),
}

impl DeviceLine<'_> {
    /// A reply to a host command.
    #[must_use]
    pub fn is_reply(&self) -> bool {
        !self.is_event()
    }

    /// A device-initiated event.
    #[must_use]
    pub fn is_event(&self) -> bool {
        matches!(self, Self::Input { .. } | Self::Heartbeat { .. })
    }
}

/// Split `<verb> <rest>` off a line when the first token equals `verb`.
fn strip_verb<'a>(line: &'a str, verb: &str) -> Option<&'a str> {
    let rest = line.strip_prefix(verb)?;
    if rest.is_empty() {
        Some(rest)
    } else {
        rest.strip_prefix(' ').map(str::trim_start)
    }
}

/// Classify one device line. Surrounding whitespace is ignored.
///
/// # Example
///
/// ```
/// use dataref_proto::{parse_device_line, DeviceLine};
///
/// let line = parse_device_line("XPDR;fw=1.0;board=ESP32;name=MyCustomPanel");
/// let DeviceLine::Handshake(info) = line else { panic!() };
/// assert_eq!(info.device_name(), Some("MyCustomPanel"));
///
/// assert!(parse_device_line("INPUT ENC_HDG 1").is_event());
/// assert!(parse_device_line("ACK GEAR_LED 1").is_reply());
/// ```
#[must_use]
pub fn parse_device_line(line: &str) -> DeviceLine<'_> {
    let line = line.trim();

    if let Some(rest) = line.strip_prefix(HANDSHAKE_PREFIX) {
        if rest.is_empty() || rest.starts_with(';') {
            return DeviceLine::Handshake(HandshakeInfo {
                fields: rest.trim_start_matches(';'),
            });
        }
    }

    if let Some(rest) = strip_verb(line, ACK) {
        return match rest.rsplit_once(' ') {
            Some((key, ACK_ERROR_TOKEN)) => DeviceLine::AckError { key },
            Some((key, value)) => DeviceLine::Ack { key, value },
            None => DeviceLine::Other(line),
        };
    }

    if let Some(rest) = strip_verb(line, VALUE) {
        return match rest.split_once(' ') {
            Some((key, value)) => DeviceLine::Value { key, value },
            None => DeviceLine::Other(line),
        };
    }

    if let Some(message) = strip_verb(line, ERROR) {
        return DeviceLine::Error { message };
    }

    if let Some(path) = strip_verb(line, CMD_EXECUTED) {
        return DeviceLine::CmdExecuted { path };
    }

    if let Some(path) = strip_verb(line, CMD_FAILED) {
        return DeviceLine::CmdFailed { path };
    }

    if line == PONG {
        return DeviceLine::Pong;
    }

    if let Some(rest) = strip_verb(line, INPUT) {
        return match rest.rsplit_once(' ') {
            Some((key, value)) => DeviceLine::Input { key, value },
            None => DeviceLine::Other(line),
        };
    }

    if let Some(rest) = strip_verb(line, HEARTBEAT) {
        return DeviceLine::Heartbeat {
            uptime_secs: rest.parse().ok(),
        };
    }

    DeviceLine::Other(line)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handshake_fields() {
        let DeviceLine::Handshake(info) =
            parse_device_line("XPDR;fw=2.0;board=RP2040;name=Radio;proto=1")
        else {
            panic!("expected handshake");
        };
        assert_eq!(info.firmware_version(), Some("2.0"));
        assert_eq!(info.board_type(), Some("RP2040"));
        assert_eq!(info.device_name(), Some("Radio"));
        assert_eq!(info.field("proto"), Some("1"));
        assert_eq!(info.field("missing"), None);
        assert_eq!(info.fields().count(), 4);
    }

    #[test]
    fn test_xpdr_needs_separator() {
        assert_eq!(parse_device_line("XPDRX"), DeviceLine::Other("XPDRX"));
    }

    #[test]
    fn test_ack_forms() {
        assert_eq!(
            parse_device_line("ACK LED_STATE[3] 300"),
            DeviceLine::Ack {
                key: "LED_STATE[3]",
                value: "300"
            }
        );
        assert_eq!(
            parse_device_line("ACK NOPE ERROR"),
            DeviceLine::AckError { key: "NOPE" }
        );
    }

    #[test]
    fn test_value_and_error() {
        assert_eq!(
            parse_device_line("VALUE LED_STATE 1,2,3"),
            DeviceLine::Value {
                key: "LED_STATE",
                value: "1,2,3"
            }
        );
        assert_eq!(
            parse_device_line("ERROR Unknown key: X"),
            DeviceLine::Error {
                message: "Unknown key: X"
            }
        );
    }

    #[test]
    fn test_commands_and_pong() {
        assert_eq!(
            parse_device_line("CMD_EXECUTED sim/lights/landing"),
            DeviceLine::CmdExecuted {
                path: "sim/lights/landing"
            }
        );
        assert_eq!(
            parse_device_line("CMD_FAILED sim/x"),
            DeviceLine::CmdFailed { path: "sim/x" }
        );
        assert_eq!(parse_device_line("PONG\r"), DeviceLine::Pong);
    }

    #[test]
    fn test_events() {
        let input = parse_device_line("INPUT SWITCHES[2] 1");
        assert_eq!(
            input,
            DeviceLine::Input {
                key: "SWITCHES[2]",
                value: "1"
            }
        );
        assert!(input.is_event());

        let hb = parse_device_line("HEARTBEAT 12");
        assert_eq!(
            hb,
            DeviceLine::Heartbeat {
                uptime_secs: Some(12)
            }
        );
        assert!(!hb.is_reply());
    }

    #[test]
    fn test_prefix_must_be_whole_token() {
        assert_eq!(parse_device_line("ACKNOWLEDGE x y"), DeviceLine::Other("ACKNOWLEDGE x y"));
        assert_eq!(parse_device_line("INPUTS a b"), DeviceLine::Other("INPUTS a b"));
    }

    #[test]
    fn test_dump_lines_are_other_replies() {
        let line = parse_device_line("STATUS CONNECTED Panel 3");
        assert_eq!(line, DeviceLine::Other("STATUS CONNECTED Panel 3"));
        assert!(line.is_reply());
    }
}
