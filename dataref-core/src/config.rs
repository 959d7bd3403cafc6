//! Engine configuration.

use dataref_proto::OverflowPolicy;

use crate::session::Identity;

/// Default `HEARTBEAT` interval in seconds.
pub const DEFAULT_HEARTBEAT_INTERVAL_SECS: u32 = 5;

/// Default `HELLO` resend interval for hosts, in milliseconds.
pub const DEFAULT_HELLO_RETRY_MS: u64 = 5_000;

/// Compile-time engine configuration.
///
/// # Example
///
/// ```
/// use dataref_core::{EngineConfig, Identity};
///
/// const CONFIG: EngineConfig = EngineConfig {
///     require_handshake: true,
///     ..EngineConfig::new(Identity::new("1.0", "RP2040", "Radio"))
/// };
/// assert!(CONFIG.echo_unknown);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EngineConfig {
    pub identity: Identity,
    /// How the framer handles lines longer than the receive buffer.
    pub overflow_policy: OverflowPolicy,
    /// Reply `UNKNOWN: <line>` to verbs the device does not handle.
    pub echo_unknown: bool,
    /// Reply `CMD_FAILED <path>` when the executor fails. When `false`,
    /// every `CMD` gets `CMD_EXECUTED`.
    pub report_cmd_failures: bool,
    /// Refuse everything but `HELLO` and `PING` until the handshake.
    pub require_handshake: bool,
    pub heartbeat_interval_secs: u32,
}

impl EngineConfig {
    #[must_use]
    pub const fn new(identity: Identity) -> Self {
        Self {
            identity,
            overflow_policy: OverflowPolicy::DiscardLine,
            echo_unknown: true,
            report_cmd_failures: true,
            require_handshake: false,
            heartbeat_interval_secs: DEFAULT_HEARTBEAT_INTERVAL_SECS,
        }
    }
}
