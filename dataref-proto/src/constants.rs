//! Wire-level constants: line prefixes and fixed tokens.

/// Prefix of the handshake reply to `HELLO`.
pub const HANDSHAKE_PREFIX: &str = "XPDR";

pub const ACK: &str = "ACK";
pub const VALUE: &str = "VALUE";
pub const ERROR: &str = "ERROR";
pub const CMD_EXECUTED: &str = "CMD_EXECUTED";
pub const CMD_FAILED: &str = "CMD_FAILED";
pub const PONG: &str = "PONG";
pub const UNKNOWN: &str = "UNKNOWN:";
pub const STATUS: &str = "STATUS";
pub const STATUS_END: &str = "STATUS_END";
pub const LIST: &str = "LIST";
pub const LIST_END: &str = "LIST_END";
pub const TEST: &str = "TEST";

/// Event prefixes.
pub const INPUT: &str = "INPUT";
pub const HEARTBEAT: &str = "HEARTBEAT";

/// Token in `ACK <key> ERROR` marking a failed write.
pub const ACK_ERROR_TOKEN: &str = "ERROR";

/// Prefixes that only solicited replies may start with.
///
/// Device-initiated events never start with one of these, so a reader can
/// tell replies from events by prefix alone.
pub const REPLY_ONLY_PREFIXES: [&str; 3] = [ACK, VALUE, ERROR];

/// Request line sent by a host to start the handshake.
pub const HELLO_LINE: &[u8] = b"HELLO\n";
