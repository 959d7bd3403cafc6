//! ProtocolBridge: connects an input stream to the engine and the shared output.

use embassy_sync::blocking_mutex::raw::RawMutex;

use crate::device::Device;
use crate::engine::Engine;
use crate::input::{InputError, InputSource};
use crate::output::{OutputError, OutputSink, SharedOutput};
use crate::sink::SinkError;

/// Size of the per-line reply staging buffer.
///
/// Holds the replies to one line, including a full `STATUS`/`LIST` dump.
pub const STAGING_BUFFER_SIZE: usize = 2048;

/// Size of one input read.
pub const RX_CHUNK_SIZE: usize = 64;

/// A bridge that reads host bytes, runs them through an [`Engine`], and
/// writes the replies to a [`SharedOutput`].
///
/// Replies to one line are staged and written under a single lock, so
/// events from other tasks can only land between lines. Replies larger than
/// the staging buffer (a big `STATUS` dump) go out in several writes under
/// that same lock.
///
/// # Error Handling
///
/// On input errors, the bridge drops any partial line; a disconnect also
/// resets the session so the host has to handshake again.
pub struct ProtocolBridge<'o, I, M: RawMutex, O, D, const N: usize> {
    input: I,
    output: &'o SharedOutput<M, O>,
    engine: Engine<D, N>,
    staging: heapless::Vec<u8, STAGING_BUFFER_SIZE>,
}

impl<'o, I, M, O, D, const N: usize> ProtocolBridge<'o, I, M, O, D, N>
where
    I: InputSource,
    M: RawMutex,
    O: OutputSink,
    D: Device,
{
    /// Create a new bridge from an input source, a shared output and an engine.
    pub fn new(input: I, output: &'o SharedOutput<M, O>, engine: Engine<D, N>) -> Self {
        Self {
            input,
            output,
            engine,
            staging: heapless::Vec::new(),
        }
    }

    /// Run the bridge indefinitely.
    ///
    /// This method never returns under normal operation.
    pub async fn run(&mut self) -> ! {
        loop {
            if let Err(e) = self.process_one().await {
                warn!("bridge error: {}", e);
            }
        }
    }

    /// Read one chunk of input and answer every line it completes.
    ///
    /// Returns the number of lines completed.
    pub async fn process_one(&mut self) -> Result<usize, BridgeError> {
        let mut chunk = [0u8; RX_CHUNK_SIZE];
        let len = match self.input.receive(&mut chunk).await {
            Ok(len) => len,
            Err(e) => {
                if e == InputError::Disconnected {
                    self.engine.disconnect();
                } else {
                    self.engine.reset_framer();
                }
                return Err(BridgeError::Input(e));
            }
        };

        let mut lines = 0;
        for &byte in &chunk[..len.min(RX_CHUNK_SIZE)] {
            match self.engine.push_byte(byte, &mut self.staging) {
                Ok(false) => continue,
                Ok(true) => self.flush().await?,
                Err(SinkError::Full | SinkError::Io) => self.drain().await?,
            }
            lines += 1;
        }
        Ok(lines)
    }

    async fn flush(&mut self) -> Result<(), BridgeError> {
        let result = self.output.write_lines(&self.staging).await;
        self.staging.clear();
        result.map_err(BridgeError::Output)
    }

    /// Write replies that outgrew the staging buffer.
    ///
    /// The output stays locked until the line's last reply is written, so
    /// events still only land between lines.
    async fn drain(&mut self) -> Result<(), BridgeError> {
        let output = self.output;
        let mut sink = output.lock().await;
        loop {
            let staged = self.staging.len();
            if staged > 0 {
                let result = sink.write_all(&self.staging).await;
                self.staging.clear();
                if let Err(e) = result {
                    self.engine.discard_pending_replies();
                    return Err(BridgeError::Output(e));
                }
            }
            if !self.engine.has_pending_replies() {
                return Ok(());
            }
            if self.engine.resume_replies(&mut self.staging).is_err() && staged == 0 {
                // Not even one reply fits an empty buffer
                self.engine.discard_pending_replies();
                return Err(BridgeError::Output(OutputError::Overflow));
            }
        }
    }

    /// Get a reference to the engine.
    pub fn engine(&self) -> &Engine<D, N> {
        &self.engine
    }

    /// Get a mutable reference to the engine.
    pub fn engine_mut(&mut self) -> &mut Engine<D, N> {
        &mut self.engine
    }

    /// Get a mutable reference to the input source.
    pub fn input_mut(&mut self) -> &mut I {
        &mut self.input
    }

    /// Decompose the bridge into its input and engine.
    pub fn into_parts(self) -> (I, Engine<D, N>) {
        (self.input, self.engine)
    }
}

/// Error type for bridge operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BridgeError {
    /// Error from the input source.
    Input(InputError),
    /// Error from the output sink.
    Output(OutputError),
}

impl core::fmt::Display for BridgeError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Input(e) => write!(f, "input: {}", e),
            Self::Output(e) => write!(f, "output: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::device::NullDevice;
    use crate::registry::Registry;
    use crate::session::Identity;
    use dataref_proto::{Arity, Value, ValueKind};
    use embassy_futures::block_on;
    use embassy_sync::blocking_mutex::raw::NoopRawMutex;
    use std::collections::VecDeque;
    use std::vec::Vec;

    // Scripted input: each entry is one receive() result
    struct MockInput {
        chunks: VecDeque<Result<Vec<u8>, InputError>>,
    }

    impl MockInput {
        fn new(chunks: Vec<Result<&[u8], InputError>>) -> Self {
            Self {
                chunks: chunks.into_iter().map(|c| c.map(<[u8]>::to_vec)).collect(),
            }
        }
    }

    impl InputSource for MockInput {
        async fn receive(&mut self, buf: &mut [u8]) -> Result<usize, InputError> {
            match self.chunks.pop_front() {
                Some(Ok(bytes)) => {
                    buf[..bytes.len()].copy_from_slice(&bytes);
                    Ok(bytes.len())
                }
                Some(Err(e)) => Err(e),
                None => Err(InputError::Disconnected),
            }
        }

        fn is_connected(&self) -> bool {
            !self.chunks.is_empty()
        }
    }

    struct MockOutput {
        writes: Vec<Vec<u8>>,
    }

    impl OutputSink for MockOutput {
        async fn write_all(&mut self, bytes: &[u8]) -> Result<(), OutputError> {
            self.writes.push(bytes.to_vec());
            Ok(())
        }

        fn is_ready(&self) -> bool {
            true
        }
    }

    fn engine() -> Engine<NullDevice, 4> {
        let mut registry = Registry::new();
        registry
            .register("LED_STATE", ValueKind::ByteArray, Arity::Array(16))
            .unwrap();
        Engine::new(
            EngineConfig::new(Identity::new("1.0", "ESP32", "MyCustomPanel")),
            registry,
            NullDevice,
        )
    }

    fn shared() -> SharedOutput<NoopRawMutex, MockOutput> {
        SharedOutput::new(MockOutput { writes: Vec::new() })
    }

    #[test]
    fn test_bridge_writes_one_batch_per_line() {
        let output = shared();
        let input = MockInput::new(vec![Ok(&b"HELLO\nPI"[..]), Ok(&b"NG\nSTATUS\n"[..])]);
        let mut bridge = ProtocolBridge::new(input, &output, engine());

        assert_eq!(block_on(bridge.process_one()), Ok(1));
        assert_eq!(block_on(bridge.process_one()), Ok(2));
        drop(bridge);

        let writes = output.into_inner().writes;
        assert_eq!(writes.len(), 3);
        assert_eq!(writes[0], b"XPDR;fw=1.0;board=ESP32;name=MyCustomPanel\n");
        assert_eq!(writes[1], b"PONG\n");
        assert_eq!(
            writes[2],
            &b"STATUS CONNECTED MyCustomPanel 1\nVALUE LED_STATE 0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0\nSTATUS_END\n"[..]
        );
    }

    #[test]
    fn test_dump_larger_than_staging_is_sent_whole() {
        let mut registry: Registry<10> = Registry::new();
        let lit = Value::from_bytes(&[255; 64]).unwrap();
        for i in 0..10 {
            registry
                .register_value(&format!("ARRAY_{i}"), lit.clone(), Arity::Array(64))
                .unwrap();
        }
        let engine = Engine::new(
            EngineConfig::new(Identity::new("1.0", "ESP32", "MyCustomPanel")),
            registry,
            NullDevice,
        );
        let output = shared();
        let input = MockInput::new(vec![Ok(&b"STATUS\nPING\n"[..]), Ok(&b"PING\n"[..])]);
        let mut bridge = ProtocolBridge::new(input, &output, engine);

        assert_eq!(block_on(bridge.process_one()), Ok(2));
        assert_eq!(block_on(bridge.process_one()), Ok(1));
        assert!(!bridge.engine().has_pending_replies());
        drop(bridge);

        let writes = output.into_inner().writes;
        // The dump needed more than one write
        assert!(writes.len() > 3);
        let wire = String::from_utf8(writes.concat()).unwrap();
        assert!(wire.len() > STAGING_BUFFER_SIZE);
        let lines: Vec<&str> = wire.lines().collect();
        assert_eq!(lines.len(), 14);
        assert_eq!(lines[0], "STATUS UNIDENTIFIED MyCustomPanel 10");
        for (i, line) in lines[1..11].iter().enumerate() {
            assert!(line.starts_with(&format!("VALUE ARRAY_{i} 255,")));
            assert!(line.ends_with(",255"));
        }
        assert_eq!(&lines[11..], ["STATUS_END", "PONG", "PONG"]);
    }

    #[test]
    fn test_disconnect_resets_session() {
        let output = shared();
        let input = MockInput::new(vec![Ok(&b"HELLO\nGET LED"[..])]);
        let mut bridge = ProtocolBridge::new(input, &output, engine());

        block_on(bridge.process_one()).unwrap();
        assert!(bridge.engine().session().is_connected());
        assert_eq!(bridge.engine().buffered_len(), 7);

        let result = block_on(bridge.process_one());
        assert_eq!(result, Err(BridgeError::Input(InputError::Disconnected)));
        assert!(!bridge.engine().session().is_connected());
        assert_eq!(bridge.engine().buffered_len(), 0);
    }

    #[test]
    fn test_input_error_drops_partial_line() {
        let output = shared();
        let input = MockInput::new(vec![
            Ok(&b"HELLO\nGARB"[..]),
            Err(InputError::Framing),
            Ok(&b"PING\n"[..]),
        ]);
        let mut bridge = ProtocolBridge::new(input, &output, engine());

        block_on(bridge.process_one()).unwrap();
        assert_eq!(
            block_on(bridge.process_one()),
            Err(BridgeError::Input(InputError::Framing))
        );
        // Session survives a line error
        assert!(bridge.engine().session().is_connected());
        assert_eq!(block_on(bridge.process_one()), Ok(1));
        drop(bridge);

        let writes = output.into_inner().writes;
        assert_eq!(writes.last().map(Vec::as_slice), Some(&b"PONG\n"[..]));
    }
}
