//! Platform-agnostic Dataref Bridge Protocol engine.
//!
//! This crate turns the wire types of [`dataref_proto`] into a working
//! device: a typed value store, the command dispatcher, the handshake
//! session, and async plumbing to run it over any byte stream. It has no
//! platform-specific dependencies and runs both on `no_std` targets and on
//! host for testing.
//!
//! # Overview
//!
//! - [`registry`]: typed value store ([`Registry`], [`Entry`])
//! - [`session`]: handshake state ([`Session`], [`Identity`])
//! - [`device`]: hardware callbacks ([`Device`])
//! - [`dispatch`]: one line in, reply lines out ([`Dispatcher`])
//! - [`engine`]: framer plus dispatcher per connection ([`Engine`])
//! - [`input`] / [`output`]: async stream traits ([`InputSource`], [`OutputSink`], [`SharedOutput`])
//! - [`bridge`]: async input-to-output loop ([`ProtocolBridge`])
//! - [`events`]: `INPUT` and `HEARTBEAT` lines ([`EventEmitter`])
//! - [`host`]: host-side `HELLO` resend ([`HandshakeInitiator`])
//!
//! # Example
//!
//! ```rust
//! use dataref_core::{Engine, EngineConfig, Identity, NullDevice, Registry};
//! use dataref_proto::{Arity, ValueKind};
//!
//! let mut registry: Registry<8> = Registry::new();
//! registry.register("LED_STATE", ValueKind::ByteArray, Arity::Array(16)).unwrap();
//!
//! let config = EngineConfig::new(Identity::new("1.0", "ESP32", "MyCustomPanel"));
//! let mut engine = Engine::new(config, registry, NullDevice);
//!
//! let mut out: heapless::Vec<u8, 512> = heapless::Vec::new();
//! engine.feed(b"SET LED_STATE[3] 300\nGET LED_STATE[3]\n", &mut out).unwrap();
//! assert_eq!(&out[..], b"ACK LED_STATE[3] 300\nVALUE LED_STATE[3] 255\n");
//! ```
//!
//! # Features
//!
//! - **`log`** (default): Log through the `log` facade
//! - **`defmt`**: Log through `defmt` and derive `defmt::Format` (for embedded targets)
//! - **`std`**: Enable standard library support (for host testing)
//! - **`embedded-io`**: [`IoSink`] adapter for blocking `embedded_io::Write` writers
//!
//! # No-std Support
//!
//! This crate is `#![no_std]` by default and uses no heap allocations,
//! making it suitable for embedded systems with limited resources.

#![cfg_attr(not(any(test, feature = "std")), no_std)]

// Must come first: the logging macros are used by every other module
#[macro_use]
mod fmt;

pub mod bridge;
pub mod config;
pub mod device;
pub mod dispatch;
pub mod engine;
pub mod events;
pub mod host;
pub mod input;
pub mod output;
pub mod registry;
pub mod session;
pub mod sink;

// Re-export main types at crate root
pub use bridge::{BridgeError, ProtocolBridge, RX_CHUNK_SIZE, STAGING_BUFFER_SIZE};
pub use config::{EngineConfig, DEFAULT_HEARTBEAT_INTERVAL_SECS, DEFAULT_HELLO_RETRY_MS};
pub use device::{CommandError, Device, NullDevice, ReplyLine};
pub use dispatch::{DispatchStats, Dispatcher};
pub use engine::Engine;
pub use events::{write_event, DeviceEvent, EventEmitter, EventSource};
pub use host::{DeviceInfo, HandshakeInitiator};
pub use input::{InputError, InputSource};
pub use output::{OutputError, OutputSink, SharedOutput};
pub use registry::{Entry, KeyName, Registry, RegistryError};
pub use session::{Identity, Session, SessionState};
#[cfg(feature = "embedded-io")]
pub use sink::IoSink;
pub use sink::{LineSink, SinkError};

pub use dataref_proto;
