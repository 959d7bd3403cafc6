//! Synchronous line sinks for the dispatcher.

use core::fmt;

/// Error from a [`LineSink`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SinkError {
    /// No room for the line.
    Full,
    /// The underlying writer failed.
    Io,
}

impl fmt::Display for SinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Full => write!(f, "sink full"),
            Self::Io => write!(f, "sink write error"),
        }
    }
}

/// Destination for complete outbound lines.
pub trait LineSink {
    /// Write one line. `line` includes its `\n` terminator and is either
    /// written whole or not at all.
    fn write_line(&mut self, line: &[u8]) -> Result<(), SinkError>;
}

impl<const N: usize> LineSink for heapless::Vec<u8, N> {
    fn write_line(&mut self, line: &[u8]) -> Result<(), SinkError> {
        self.extend_from_slice(line).map_err(|_| SinkError::Full)
    }
}

#[cfg(any(test, feature = "std"))]
impl LineSink for std::vec::Vec<u8> {
    fn write_line(&mut self, line: &[u8]) -> Result<(), SinkError> {
        self.extend_from_slice(line);
        Ok(())
    }
}

impl<S: LineSink + ?Sized> LineSink for &mut S {
    fn write_line(&mut self, line: &[u8]) -> Result<(), SinkError> {
        (**self).write_line(line)
    }
}

/// Adapts a blocking `embedded_io::Write` (a UART, a socket) to [`LineSink`].
#[cfg(feature = "embedded-io")]
pub struct IoSink<W>(pub W);

#[cfg(feature = "embedded-io")]
impl<W: embedded_io::Write> LineSink for IoSink<W> {
    fn write_line(&mut self, line: &[u8]) -> Result<(), SinkError> {
        self.0.write_all(line).map_err(|_| SinkError::Io)
    }
}
