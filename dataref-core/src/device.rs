//! Device callbacks invoked by the dispatcher.

use core::fmt;

use dataref_proto::{KeyRef, Value, MAX_OUTBOUND_LINE};

/// Buffer for a device's reply to a custom verb, without terminator.
pub type ReplyLine = heapless::String<MAX_OUTBOUND_LINE>;

/// Error from a device command executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CommandError {
    /// The device does not know this command path.
    Unsupported,
    /// The command was recognized but did not complete.
    Failed,
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unsupported => write!(f, "unsupported command"),
            Self::Failed => write!(f, "command failed"),
        }
    }
}

/// Hardware adapter behind the protocol engine.
///
/// All methods have defaults, so a device only overrides what it uses.
/// Callbacks run synchronously inside the line that triggered them.
pub trait Device {
    /// A write was stored. `value` is what the registry now holds at `key`:
    /// one byte for an indexed key, the whole array otherwise.
    fn on_write(&mut self, key: &KeyRef<'_>, value: &Value) {
        let _ = (key, value);
    }

    /// Supply a live value before a `GET`/`READ` reply. `Some` is stored
    /// in the registry first.
    fn on_read(&mut self, key: &KeyRef<'_>) -> Option<Value> {
        let _ = key;
        None
    }

    /// Execute a `CMD <path>`.
    fn execute(&mut self, path: &str) -> Result<(), CommandError> {
        let _ = path;
        Ok(())
    }

    /// Run the `TEST` self test.
    fn self_test(&mut self) -> bool {
        true
    }

    /// The session has just connected.
    fn on_connected(&mut self) {}

    /// Handle a custom verb. Write a reply into `reply` and return `true`
    /// to send it; return `false` to fall back to the default handling.
    fn handle_unknown(&mut self, line: &str, reply: &mut ReplyLine) -> bool {
        let _ = (line, reply);
        false
    }
}

/// A device with no hardware behind it; every hook keeps its default.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullDevice;

impl Device for NullDevice {}

impl<D: Device + ?Sized> Device for &mut D {
    fn on_write(&mut self, key: &KeyRef<'_>, value: &Value) {
        (**self).on_write(key, value);
    }

    fn on_read(&mut self, key: &KeyRef<'_>) -> Option<Value> {
        (**self).on_read(key)
    }

    fn execute(&mut self, path: &str) -> Result<(), CommandError> {
        (**self).execute(path)
    }

    fn self_test(&mut self) -> bool {
        (**self).self_test()
    }

    fn on_connected(&mut self) {
        (**self).on_connected();
    }

    fn handle_unknown(&mut self, line: &str, reply: &mut ReplyLine) -> bool {
        (**self).handle_unknown(line, reply)
    }
}
