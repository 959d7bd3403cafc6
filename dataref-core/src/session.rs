//! Handshake state machine.

use dataref_proto::Handshake;

/// Session state. The only transition is `Unidentified` to `Connected`,
/// triggered by `HELLO`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SessionState {
    #[default]
    Unidentified,
    Connected,
}

/// Device identity reported in the handshake reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Identity {
    pub firmware_version: &'static str,
    pub board_type: &'static str,
    pub device_name: &'static str,
    /// Extra `key=value` handshake fields, appended in order.
    pub extras: &'static [(&'static str, &'static str)],
}

impl Identity {
    #[must_use]
    pub const fn new(
        firmware_version: &'static str,
        board_type: &'static str,
        device_name: &'static str,
    ) -> Self {
        Self {
            firmware_version,
            board_type,
            device_name,
            extras: &[],
        }
    }

    #[must_use]
    pub const fn with_extras(mut self, extras: &'static [(&'static str, &'static str)]) -> Self {
        self.extras = extras;
        self
    }

    /// The handshake reply for this identity.
    #[must_use]
    pub const fn handshake(&self) -> Handshake<'static> {
        Handshake {
            firmware_version: self.firmware_version,
            board_type: self.board_type,
            device_name: self.device_name,
            extras: self.extras,
        }
    }
}

/// Per-connection session: identity plus handshake state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Session {
    identity: Identity,
    state: SessionState,
}

impl Session {
    /// A fresh, unidentified session.
    #[must_use]
    pub const fn new(identity: Identity) -> Self {
        Self {
            identity,
            state: SessionState::Unidentified,
        }
    }

    /// Handle `HELLO`: connect and return the handshake reply.
    ///
    /// Idempotent; the second return value is `true` only on the
    /// transition out of `Unidentified`.
    pub fn hello(&mut self) -> (Handshake<'static>, bool) {
        let transitioned = self.state == SessionState::Unidentified;
        self.state = SessionState::Connected;
        (self.identity.handshake(), transitioned)
    }

    #[inline]
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    #[inline]
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.state == SessionState::Connected
    }

    #[inline]
    #[must_use]
    pub fn identity(&self) -> &Identity {
        &self.identity
    }
}
