//! Input source trait and error types.

use core::fmt;
use core::future::Future;

/// Error type for input operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InputError {
    /// UART/communication I/O error.
    Io,
    /// Connection lost / stream closed.
    Disconnected,
    /// Receiver overrun; bytes were lost.
    Overrun,
    /// UART framing error.
    Framing,
}

impl fmt::Display for InputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io => write!(f, "I/O error"),
            Self::Disconnected => write!(f, "disconnected"),
            Self::Overrun => write!(f, "receiver overrun"),
            Self::Framing => write!(f, "framing error"),
        }
    }
}

/// Async trait for the inbound byte stream.
///
/// This trait abstracts where host bytes come from (UART, USB CDC, a TCP
/// socket), so the bridge can run over any of them.
///
/// # `no_std` Compatibility
///
/// All implementations must be `#![no_std]` compatible with no heap allocation.
pub trait InputSource {
    /// Wait for the next chunk of bytes and copy it into `buf`.
    ///
    /// Returns the number of bytes read, at least one.
    fn receive(&mut self, buf: &mut [u8]) -> impl Future<Output = Result<usize, InputError>>;

    /// Check if the input source is connected/ready.
    fn is_connected(&self) -> bool;
}
