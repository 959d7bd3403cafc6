//! Device-initiated events: `INPUT` changes and `HEARTBEAT`s.
//!
//! Events share the output with the reply path through a [`SharedOutput`];
//! each event is one line written under the lock, so it never splits a
//! reply and never waits on the request pipeline.

use core::future::Future;

use dataref_proto::{is_valid_name, Event, Serialize, Value, MAX_OUTBOUND_LINE};
use embassy_sync::blocking_mutex::raw::RawMutex;

use crate::output::{OutputError, OutputSink, SharedOutput};
use crate::registry::{KeyName, RegistryError};
use crate::sink::{LineSink, SinkError};

/// An owned input change, produced by hardware tasks.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceEvent {
    pub key: KeyName,
    pub index: Option<usize>,
    pub value: Value,
}

impl DeviceEvent {
    /// A change of a whole input.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::InvalidKey`] if `key` is not a valid key name.
    pub fn new(key: &str, value: Value) -> Result<Self, RegistryError> {
        Self::build(key, None, value)
    }

    /// A change of one element of an input array.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::InvalidKey`] if `key` is not a valid key name.
    pub fn element(key: &str, index: usize, value: Value) -> Result<Self, RegistryError> {
        Self::build(key, Some(index), value)
    }

    fn build(key: &str, index: Option<usize>, value: Value) -> Result<Self, RegistryError> {
        if !is_valid_name(key) {
            return Err(RegistryError::InvalidKey);
        }
        let key = KeyName::try_from(key).map_err(|_| RegistryError::InvalidKey)?;
        Ok(Self { key, index, value })
    }

    /// The wire event for this change.
    #[must_use]
    pub fn as_event(&self) -> Event<'_> {
        Event::Input {
            key: &self.key,
            index: self.index,
            value: &self.value,
        }
    }
}

/// Async source of input changes (buttons, encoders, switches).
pub trait EventSource {
    /// Wait for the next input change.
    fn next_event(&mut self) -> impl Future<Output = DeviceEvent>;
}

/// Writes events to the shared output.
pub struct EventEmitter<'o, M: RawMutex, O> {
    output: &'o SharedOutput<M, O>,
}

impl<'o, M: RawMutex, O: OutputSink> EventEmitter<'o, M, O> {
    pub fn new(output: &'o SharedOutput<M, O>) -> Self {
        Self { output }
    }

    /// Write one event line.
    pub async fn emit(&self, event: &Event<'_>) -> Result<(), OutputError> {
        let mut buf = [0u8; MAX_OUTBOUND_LINE];
        let len = event
            .serialize(&mut buf)
            .map_err(|_| OutputError::Overflow)?;
        self.output.write_lines(&buf[..len]).await
    }

    /// `INPUT <key> <value>`, or `INPUT <key>[<index>] <value>`.
    pub async fn input(
        &self,
        key: &str,
        index: Option<usize>,
        value: &Value,
    ) -> Result<(), OutputError> {
        self.emit(&Event::Input { key, index, value }).await
    }

    /// `HEARTBEAT <uptime_secs>`.
    pub async fn heartbeat(&self, uptime_secs: u32) -> Result<(), OutputError> {
        self.emit(&Event::Heartbeat { uptime_secs }).await
    }

    /// Forward every event from `source` until an output error.
    pub async fn forward<S: EventSource>(&self, source: &mut S) -> OutputError {
        loop {
            let change = source.next_event().await;
            if let Err(e) = self.emit(&change.as_event()).await {
                warn!("event for {} not sent: {}", change.key.as_str(), e);
                return e;
            }
        }
    }
}

/// Write one event line to a synchronous sink.
///
/// For single-task devices that poll inputs between bytes instead of
/// running a separate event task.
///
/// # Errors
///
/// Returns [`SinkError::Full`] if the line does not fit, or the sink's error.
pub fn write_event<S: LineSink>(out: &mut S, event: &Event<'_>) -> Result<(), SinkError> {
    let mut buf = [0u8; MAX_OUTBOUND_LINE];
    let len = event.serialize(&mut buf).map_err(|_| SinkError::Full)?;
    out.write_line(&buf[..len])
}

#[cfg(test)]
mod tests {
    use super::*;
    use embassy_futures::block_on;
    use embassy_sync::blocking_mutex::raw::NoopRawMutex;
    use std::collections::VecDeque;
    use std::vec::Vec;

    struct Capture(Vec<u8>);

    impl OutputSink for Capture {
        async fn write_all(&mut self, bytes: &[u8]) -> Result<(), OutputError> {
            self.0.extend_from_slice(bytes);
            Ok(())
        }

        fn is_ready(&self) -> bool {
            true
        }
    }

    struct Failing;

    impl OutputSink for Failing {
        async fn write_all(&mut self, _bytes: &[u8]) -> Result<(), OutputError> {
            Err(OutputError::Io)
        }

        fn is_ready(&self) -> bool {
            false
        }
    }

    struct Script(VecDeque<DeviceEvent>);

    impl EventSource for Script {
        async fn next_event(&mut self) -> DeviceEvent {
            match self.0.pop_front() {
                Some(change) => change,
                None => core::future::pending().await,
            }
        }
    }

    #[test]
    fn test_emitter_lines() {
        let shared: SharedOutput<NoopRawMutex, _> = SharedOutput::new(Capture(Vec::new()));
        let emitter = EventEmitter::new(&shared);
        block_on(async {
            emitter.input("ENC_HDG", None, &Value::Int(-1)).await.unwrap();
            emitter
                .input("SWITCHES", Some(2), &Value::Bool(true))
                .await
                .unwrap();
            emitter.heartbeat(60).await.unwrap();
        });
        assert_eq!(
            shared.into_inner().0,
            b"INPUT ENC_HDG -1\nINPUT SWITCHES[2] 1\nHEARTBEAT 60\n"
        );
    }

    #[test]
    fn test_forward_stops_on_output_error() {
        let shared: SharedOutput<NoopRawMutex, _> = SharedOutput::new(Failing);
        let emitter = EventEmitter::new(&shared);
        let mut source = Script(VecDeque::from([
            DeviceEvent::new("BTN_AP", Value::Bool(true)).unwrap()
        ]));
        assert_eq!(block_on(emitter.forward(&mut source)), OutputError::Io);
    }

    #[test]
    fn test_device_event_rejects_bad_keys() {
        assert_eq!(
            DeviceEvent::new("has space", Value::Int(1)),
            Err(RegistryError::InvalidKey)
        );
        let ev = DeviceEvent::element("LEDS", 3, Value::Byte(9)).unwrap();
        let mut out: Vec<u8> = Vec::new();
        write_event(&mut out, &ev.as_event()).unwrap();
        assert_eq!(out, b"INPUT LEDS[3] 9\n");
    }
}
