//! Byte-level protocol engine: framer plus dispatcher for one connection.

use dataref_proto::LineFramer;

use crate::config::EngineConfig;
use crate::device::Device;
use crate::dispatch::{DispatchStats, Dispatcher};
use crate::registry::Registry;
use crate::session::Session;
use crate::sink::{LineSink, SinkError};

/// Protocol engine for one byte stream.
///
/// Owns the framer buffer, the session and the registry. Each completed
/// line is answered before the next byte is looked at.
///
/// # Example
///
/// ```
/// use dataref_core::{Engine, EngineConfig, Identity, NullDevice, Registry};
/// use dataref_proto::{Arity, ValueKind};
///
/// let mut registry: Registry<4> = Registry::new();
/// registry.register("GEAR_LED", ValueKind::Bool, Arity::Scalar).unwrap();
///
/// let config = EngineConfig::new(Identity::new("1.0", "ESP32", "MyCustomPanel"));
/// let mut engine = Engine::new(config, registry, NullDevice);
///
/// let mut out: heapless::Vec<u8, 256> = heapless::Vec::new();
/// engine.feed(b"HELLO\nSET GEAR_LED 1.0\n", &mut out).unwrap();
/// assert_eq!(
///     &out[..],
///     b"XPDR;fw=1.0;board=ESP32;name=MyCustomPanel\nACK GEAR_LED 1.0\n"
/// );
/// ```
pub struct Engine<D, const N: usize> {
    framer: LineFramer,
    dispatcher: Dispatcher<D, N>,
}

impl<D: Device, const N: usize> Engine<D, N> {
    #[must_use]
    pub fn new(config: EngineConfig, registry: Registry<N>, device: D) -> Self {
        Self {
            framer: LineFramer::with_policy(config.overflow_policy),
            dispatcher: Dispatcher::new(config, registry, device),
        }
    }

    /// Push one byte. Returns `true` when it completed a line (whether or
    /// not that line produced replies).
    ///
    /// # Errors
    ///
    /// Returns the sink error if a reply could not be written.
    pub fn push_byte<S: LineSink>(&mut self, byte: u8, out: &mut S) -> Result<bool, SinkError> {
        let overflows = self.framer.overflow_count();
        match self.framer.push(byte) {
            Some(line) => {
                trace!("line of {} bytes", line.len());
                self.dispatcher.dispatch(line, out)?;
                Ok(true)
            }
            None => {
                if self.framer.overflow_count() != overflows {
                    warn!(
                        "line longer than {} bytes dropped",
                        dataref_proto::MAX_LINE_LENGTH
                    );
                }
                Ok(false)
            }
        }
    }

    /// Feed a chunk of bytes, answering every line it completes.
    ///
    /// Returns the number of lines completed.
    ///
    /// # Errors
    ///
    /// Stops at the first sink error; bytes after the failing line are not
    /// consumed.
    pub fn feed<S: LineSink>(&mut self, bytes: &[u8], out: &mut S) -> Result<usize, SinkError> {
        let mut lines = 0;
        for &byte in bytes {
            if self.push_byte(byte, out)? {
                lines += 1;
            }
        }
        Ok(lines)
    }

    /// Handle one already-framed line, bypassing the framer.
    ///
    /// # Errors
    ///
    /// Returns the sink error if a reply could not be written.
    pub fn handle_line<S: LineSink>(&mut self, line: &[u8], out: &mut S) -> Result<usize, SinkError> {
        self.dispatcher.dispatch(line.trim_ascii(), out)
    }

    /// Stream closed: drop any partial line and start a fresh session.
    /// Registry contents are kept.
    pub fn disconnect(&mut self) {
        info!("stream closed, session reset");
        self.framer.reset();
        self.dispatcher.reset_session();
    }

    /// Continue replies that stopped on a full sink. See [`Dispatcher::resume`].
    ///
    /// # Errors
    ///
    /// Returns the sink error; after [`SinkError::Full`] the rest stays pending.
    pub fn resume_replies<S: LineSink>(&mut self, out: &mut S) -> Result<usize, SinkError> {
        self.dispatcher.resume(out)
    }

    #[inline]
    #[must_use]
    pub fn has_pending_replies(&self) -> bool {
        self.dispatcher.has_pending()
    }

    pub fn discard_pending_replies(&mut self) {
        self.dispatcher.discard_pending();
    }

    /// Drop any partial line, keeping the session.
    pub fn reset_framer(&mut self) {
        self.framer.reset();
    }

    #[inline]
    pub fn session(&self) -> &Session {
        self.dispatcher.session()
    }

    #[inline]
    pub fn registry(&self) -> &Registry<N> {
        self.dispatcher.registry()
    }

    #[inline]
    pub fn registry_mut(&mut self) -> &mut Registry<N> {
        self.dispatcher.registry_mut()
    }

    #[inline]
    pub fn device(&self) -> &D {
        self.dispatcher.device()
    }

    #[inline]
    pub fn device_mut(&mut self) -> &mut D {
        self.dispatcher.device_mut()
    }

    #[inline]
    pub fn config(&self) -> &EngineConfig {
        self.dispatcher.config()
    }

    #[inline]
    pub fn stats(&self) -> DispatchStats {
        self.dispatcher.stats()
    }

    /// Number of over-long lines dropped by the framer.
    #[inline]
    pub fn overflow_count(&self) -> u32 {
        self.framer.overflow_count()
    }

    /// Bytes of the current partial line.
    #[inline]
    pub fn buffered_len(&self) -> usize {
        self.framer.buffered_len()
    }

    pub fn into_parts(self) -> (Registry<N>, D) {
        self.dispatcher.into_parts()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::NullDevice;
    use crate::session::Identity;
    use dataref_proto::{Arity, OverflowPolicy, ValueKind, MAX_LINE_LENGTH};
    use std::vec::Vec;

    fn engine(policy: OverflowPolicy) -> Engine<NullDevice, 4> {
        let mut registry = Registry::new();
        registry
            .register("GEAR_LED", ValueKind::Bool, Arity::Scalar)
            .unwrap();
        let config = EngineConfig {
            overflow_policy: policy,
            ..EngineConfig::new(Identity::new("1.0", "ESP32", "MyCustomPanel"))
        };
        Engine::new(config, registry, NullDevice)
    }

    #[test]
    fn test_feed_split_across_chunks() {
        let mut e = engine(OverflowPolicy::DiscardLine);
        let mut out: Vec<u8> = Vec::new();
        assert_eq!(e.feed(b"PI", &mut out), Ok(0));
        assert!(out.is_empty());
        assert_eq!(e.buffered_len(), 2);
        assert_eq!(e.feed(b"NG\r\nPING\n", &mut out), Ok(2));
        assert_eq!(out, b"PONG\nPONG\n");
    }

    #[test]
    fn test_overlong_line_then_valid_line() {
        let mut e = engine(OverflowPolicy::DiscardLine);
        let mut input = vec![b'S'; MAX_LINE_LENGTH + 50];
        input.extend_from_slice(b"\nGET GEAR_LED\n");
        let mut out: Vec<u8> = Vec::new();
        e.feed(&input, &mut out).unwrap();
        assert_eq!(out, b"VALUE GEAR_LED 0\n");
        assert_eq!(e.overflow_count(), 1);
    }

    #[test]
    fn test_blank_lines_are_silent() {
        let mut e = engine(OverflowPolicy::DiscardLine);
        let mut out: Vec<u8> = Vec::new();
        assert_eq!(e.feed(b"\n\r\n   \n", &mut out), Ok(3));
        assert!(out.is_empty());
    }

    #[test]
    fn test_handle_line_trims() {
        let mut e = engine(OverflowPolicy::DiscardLine);
        let mut out: Vec<u8> = Vec::new();
        assert_eq!(e.handle_line(b"  PING \r", &mut out), Ok(1));
        assert_eq!(out, b"PONG\n");
    }

    #[test]
    fn test_disconnect_resets_session_and_framer() {
        let mut e = engine(OverflowPolicy::DiscardLine);
        let mut out: Vec<u8> = Vec::new();
        e.feed(b"HELLO\nSET GEAR_LED 1\nGET GEA", &mut out).unwrap();
        assert!(e.session().is_connected());

        e.disconnect();
        assert!(!e.session().is_connected());
        assert_eq!(e.buffered_len(), 0);

        out.clear();
        e.feed(b"GET GEAR_LED\n", &mut out).unwrap();
        // Registry survives the reconnect
        assert_eq!(out, b"VALUE GEAR_LED 1\n");
    }

    #[test]
    fn test_sink_full_is_reported() {
        let mut e = engine(OverflowPolicy::DiscardLine);
        let mut out: heapless::Vec<u8, 8> = heapless::Vec::new();
        assert_eq!(e.feed(b"HELLO\n", &mut out), Err(SinkError::Full));
        assert!(out.is_empty());
    }
}
