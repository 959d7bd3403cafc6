//! Output sink trait, error types, and the shared output mutex.

use core::fmt;
use core::future::Future;

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::mutex::{Mutex, MutexGuard};

/// Error type for output operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OutputError {
    /// UART/communication I/O error.
    Io,
    /// Sink not ready (e.g., USB not enumerated).
    NotReady,
    /// A line did not fit the staging buffer.
    Overflow,
}

impl fmt::Display for OutputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io => write!(f, "I/O error"),
            Self::NotReady => write!(f, "not ready"),
            Self::Overflow => write!(f, "staging buffer overflow"),
        }
    }
}

/// Async trait for the outbound byte stream.
///
/// # `no_std` Compatibility
///
/// All implementations must be `#![no_std]` compatible with no heap allocation.
pub trait OutputSink {
    /// Write all of `bytes`.
    ///
    /// May block until the transport has accepted everything.
    fn write_all(&mut self, bytes: &[u8]) -> impl Future<Output = Result<(), OutputError>>;

    /// Check if the output is ready to accept data.
    fn is_ready(&self) -> bool;
}

/// An [`OutputSink`] shared by the reply path and the event emitter.
///
/// Each [`write_lines`](Self::write_lines) call holds the lock for the whole
/// buffer, so writers interleave only at the boundaries of what they pass in.
/// Callers pass whole lines.
pub struct SharedOutput<M: RawMutex, O> {
    inner: Mutex<M, O>,
}

impl<M: RawMutex, O: OutputSink> SharedOutput<M, O> {
    pub const fn new(output: O) -> Self {
        Self {
            inner: Mutex::new(output),
        }
    }

    /// Write complete lines without interleaving with other writers.
    pub async fn write_lines(&self, bytes: &[u8]) -> Result<(), OutputError> {
        if bytes.is_empty() {
            return Ok(());
        }
        let mut output = self.inner.lock().await;
        output.write_all(bytes).await
    }

    /// Lock the sink directly.
    pub async fn lock(&self) -> MutexGuard<'_, M, O> {
        self.inner.lock().await
    }

    pub fn into_inner(self) -> O {
        self.inner.into_inner()
    }
}
