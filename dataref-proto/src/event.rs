//! Device-initiated event lines, sent without a matching request.

use core::fmt;

use crate::constants::{HEARTBEAT, INPUT};
use crate::types::Value;

/// An unsolicited outbound line.
///
/// Event lines always start with `INPUT` or `HEARTBEAT`, never with a
/// reply-only prefix.
#[derive(Debug, Clone, PartialEq)]
pub enum Event<'a> {
    /// `INPUT <key> <value>` or `INPUT <key>[<index>] <value>`.
    Input {
        key: &'a str,
        index: Option<usize>,
        value: &'a Value,
    },
    /// `HEARTBEAT <uptime_seconds>`.
    Heartbeat { uptime_secs: u32 },
}

impl fmt::Display for Event<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Input {
                key,
                index: Some(i),
                value,
            } => write!(f, "{} {}[{}] {}", INPUT, key, i, value),
            Self::Input {
                key,
                index: None,
                value,
            } => write!(f, "{} {} {}", INPUT, key, value),
            Self::Heartbeat { uptime_secs } => write!(f, "{} {}", HEARTBEAT, uptime_secs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::REPLY_ONLY_PREFIXES;

    #[test]
    fn test_input_format() {
        let v = Value::Int(-3);
        let ev = Event::Input {
            key: "ENC_HDG",
            index: None,
            value: &v,
        };
        assert_eq!(format!("{}", ev), "INPUT ENC_HDG -3");

        let v = Value::Bool(true);
        let ev = Event::Input {
            key: "SWITCHES",
            index: Some(4),
            value: &v,
        };
        assert_eq!(format!("{}", ev), "INPUT SWITCHES[4] 1");
    }

    #[test]
    fn test_heartbeat_format() {
        let ev = Event::Heartbeat { uptime_secs: 3600 };
        assert_eq!(format!("{}", ev), "HEARTBEAT 3600");
    }

    #[test]
    fn test_events_never_use_reply_prefixes() {
        // Even keys that look like reply prefixes come after INPUT
        let v = Value::Byte(1);
        let events = [
            Event::Input {
                key: "ACK",
                index: None,
                value: &v,
            },
            Event::Input {
                key: "VALUE",
                index: Some(0),
                value: &v,
            },
            Event::Heartbeat { uptime_secs: 0 },
        ];
        for ev in &events {
            let line = format!("{}", ev);
            for prefix in REPLY_ONLY_PREFIXES {
                assert!(!line.starts_with(prefix), "{} starts with {}", line, prefix);
            }
        }
    }
}
