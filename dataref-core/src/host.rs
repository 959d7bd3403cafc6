//! Host-side handshake helper.
//!
//! A host opening a port does not know when the device is ready to listen,
//! so it resends `HELLO` until an `XPDR` line arrives.

use dataref_proto::constants::HELLO_LINE;
use dataref_proto::{parse_device_line, DeviceLine, MAX_KEY_LEN};

use crate::config::DEFAULT_HELLO_RETRY_MS;

/// Identity fields learned from a handshake reply.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceInfo {
    pub firmware_version: heapless::String<16>,
    pub board_type: heapless::String<MAX_KEY_LEN>,
    pub device_name: heapless::String<MAX_KEY_LEN>,
}

/// Resends `HELLO` on a fixed interval until the device identifies itself.
///
/// Time is supplied by the caller in milliseconds, so this works with any
/// clock.
///
/// # Example
///
/// ```
/// use dataref_core::HandshakeInitiator;
///
/// let mut host = HandshakeInitiator::new();
/// assert_eq!(host.poll(0), Some(&b"HELLO\n"[..]));
/// assert_eq!(host.poll(1_000), None);
/// assert_eq!(host.poll(5_000), Some(&b"HELLO\n"[..]));
///
/// assert!(host.on_line("XPDR;fw=1.0;board=ESP32;name=MyCustomPanel"));
/// assert_eq!(host.poll(20_000), None);
/// assert_eq!(host.device().unwrap().device_name.as_str(), "MyCustomPanel");
/// ```
#[derive(Debug, Clone)]
pub struct HandshakeInitiator {
    retry_ms: u64,
    last_sent_ms: Option<u64>,
    attempts: u32,
    device: Option<DeviceInfo>,
}

impl Default for HandshakeInitiator {
    fn default() -> Self {
        Self::new()
    }
}

impl HandshakeInitiator {
    #[must_use]
    pub const fn new() -> Self {
        Self::with_retry(DEFAULT_HELLO_RETRY_MS)
    }

    #[must_use]
    pub const fn with_retry(retry_ms: u64) -> Self {
        Self {
            retry_ms,
            last_sent_ms: None,
            attempts: 0,
            device: None,
        }
    }

    /// Returns the `HELLO` line when one is due.
    pub fn poll(&mut self, now_ms: u64) -> Option<&'static [u8]> {
        if self.device.is_some() {
            return None;
        }
        let due = match self.last_sent_ms {
            None => true,
            Some(last) => now_ms.saturating_sub(last) >= self.retry_ms,
        };
        if !due {
            return None;
        }
        if self.attempts > 0 {
            debug!("no handshake reply, resending HELLO");
        }
        self.last_sent_ms = Some(now_ms);
        self.attempts = self.attempts.saturating_add(1);
        Some(HELLO_LINE)
    }

    /// Feed a device line. Returns `true` if it was the handshake reply.
    pub fn on_line(&mut self, line: &str) -> bool {
        let DeviceLine::Handshake(info) = parse_device_line(line) else {
            return false;
        };
        let mut device = DeviceInfo::default();
        // Over-long fields are dropped rather than truncated
        if let Some(fw) = info.firmware_version() {
            device.firmware_version.push_str(fw).ok();
        }
        if let Some(board) = info.board_type() {
            device.board_type.push_str(board).ok();
        }
        if let Some(name) = info.device_name() {
            device.device_name.push_str(name).ok();
        }
        info!("device identified after {} HELLO(s)", self.attempts);
        self.device = Some(device);
        true
    }

    #[inline]
    #[must_use]
    pub fn is_identified(&self) -> bool {
        self.device.is_some()
    }

    #[inline]
    #[must_use]
    pub fn device(&self) -> Option<&DeviceInfo> {
        self.device.as_ref()
    }

    /// Number of `HELLO` lines sent so far.
    #[inline]
    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Port reopened: start over.
    pub fn reset(&mut self) {
        self.last_sent_ms = None;
        self.attempts = 0;
        self.device = None;
    }
}
