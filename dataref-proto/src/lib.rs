//! Wire types, line framing, parsing and serialization for the Dataref
//! Bridge Protocol.
//!
//! The protocol links a host (a flight simulator plugin) to a hardware
//! panel over a serial line. Both directions carry newline-terminated
//! ASCII lines.
//!
//! - **Framing**: [`LineFramer`] turns a byte stream into bounded lines
//! - **Parsing**: [`parse()`] turns a host line into a [`Command`]
//! - **Keys**: [`KeyRef`] splits `NAME[INDEX]` keys
//! - **Values**: [`Value`], [`ValueKind`] and the [`coerce()`] rules
//! - **Replies**: [`Response`] for solicited lines, [`Event`] for
//!   unsolicited ones, both framed by the [`Serialize`] trait
//! - **Host side**: [`parse_device_line()`] classifies device lines
//!
//! # Protocol Format
//!
//! Host to device:
//!
//! ```text
//! HELLO
//! SET <key> <value>          GET <key>
//! WRITE <key> <type> <value> READ <key> <type>
//! CMD <path>
//! PING | STATUS | LIST | TEST
//! ```
//!
//! Device to host:
//!
//! ```text
//! XPDR;fw=<version>;board=<board>;name=<name>
//! ACK <key> <value>      ACK <key> ERROR
//! VALUE <key> <value>    ERROR <message>
//! CMD_EXECUTED <path>    PONG
//! INPUT <key> <value>    HEARTBEAT <seconds>
//! ```
//!
//! # Example
//!
//! ```
//! use dataref_proto::{parse, Command, LineFramer, Response, Serialize};
//!
//! let mut framer = LineFramer::new();
//! for line in framer.feed(b"SET GEAR_LED 1\r\n") {
//!     let Ok(Command::Set { key, value }) = parse(&line) else { panic!() };
//!     assert_eq!(key.name(), "GEAR_LED");
//!
//!     let mut buf = [0u8; 64];
//!     let ack = Response::Ack { key: key.raw(), value };
//!     let len = ack.serialize(&mut buf).unwrap();
//!     assert_eq!(&buf[..len], b"ACK GEAR_LED 1\n");
//! }
//! ```
//!
//! # Features
//!
//! - **`std`**: Enable standard library support (for host testing)
//! - **`defmt`**: Enable defmt formatting (for embedded logging)
//! - **`embedded-io`**: Enable `serialize_io()` for I/O peripherals
//!
//! # No-std Support
//!
//! This crate is `#![no_std]` by default and uses no heap allocations.

#![cfg_attr(not(any(test, feature = "std")), no_std)]

pub mod constants;
pub mod event;
mod fmt;
pub mod framer;
pub mod inbound;
pub mod key;
pub mod parser;
pub mod response;
pub mod serialize;
pub mod types;

// Re-export types at crate root for convenience
pub use event::Event;
pub use framer::{Line, LineFramer, Lines, OverflowPolicy, MAX_LINE_LENGTH};
pub use inbound::{parse_device_line, DeviceLine, HandshakeInfo};
pub use key::{is_valid_name, KeyRef, MAX_KEY_LEN};
pub use parser::{parse, parse_command, Command, ParseError, Verb};
pub use response::{ErrorReply, Handshake, Response};
pub use serialize::{Serialize, SerializeError, MAX_OUTBOUND_LINE};
pub use types::{
    coerce, parse_byte_list, parse_number, Arity, ByteArray, CoerceError, Value, ValueKind,
    MAX_ARRAY_LEN,
};

pub use heapless;
