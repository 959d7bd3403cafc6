//! Dataref Bridge Protocol cockpit panel for RP2040.
//!
//! This crate provides the embedded side of a simulator panel: it answers
//! host commands over UART through [`dataref_core`], drives panel LEDs from
//! registry writes, and reports button changes as `INPUT` events.
//!
//! # Hardware Configuration
//!
//! | Function   | GPIO  | Description |
//! |------------|-------|-------------|
//! | UART1 TX   | 8     | Serial transmit (replies and events) |
//! | UART1 RX   | 9     | Serial receive (host commands) |
//! | Gear LEDs  | 2-4   | `GEAR_LED` (all three together) |
//! | Annunciators | 5-7 | `LED_STATE[0..3]` |
//! | Buttons    | 12-15 | `BUTTONS[0..4]`, active low |
//! | Encoder    | 16-17 | `ENC_HDG` A/B (with `encoder` feature) |
//! | LED        | 25    | On-board LED (connection indicator) |
//!
//! # Architecture
//!
//! Three Embassy tasks share the UART transmitter through a
//! [`SharedOutput`](dataref_core::SharedOutput):
//!
//! - **Bridge Task**: Reads host bytes and writes replies
//! - **Button Task**: Scans buttons and writes `INPUT` events
//! - **Encoder Task** (`encoder` feature): Writes `INPUT ENC_HDG` steps
//! - **Heartbeat Task**: Writes `HEARTBEAT <uptime>` on a fixed interval
//!
//! # Modules
//!
//! - [`uart`]: UART byte stream adapters ([`UartInput`], [`UartOutput`])
//! - [`panel`]: LED outputs ([`PanelDevice`]) and the panel's key table
//! - [`buttons`]: Debounced button scanning ([`ButtonBank`])
//! - `encoder`: Quadrature encoder (`Encoder`, with the `encoder` feature)
//!
//! # Features
//!
//! - **`dev-panic`** (default): Use `panic-probe` for development (prints panic info via RTT)
//! - **`prod-panic`**: Use `panic-reset` for production (silent watchdog reset)
//! - **`encoder`**: Rotary encoder on GPIO 16/17
//! - **`uart-flow-control`**: Enable hardware flow control (CTS/RTS on GPIO 10/11)

#![no_std]

#[cfg(all(feature = "dev-panic", feature = "prod-panic"))]
compile_error!("Cannot enable both `dev-panic` and `prod-panic` features");

// Re-export core types for convenience
pub use dataref_core::{
    dataref_proto, Device, Engine, EngineConfig, EventEmitter, EventSource, Identity,
    ProtocolBridge, Registry, SharedOutput,
};

pub mod buttons;
#[cfg(feature = "encoder")]
pub mod encoder;
pub mod panel;
pub mod uart;

pub use buttons::{ButtonBank, BUTTONS_KEY, DEBOUNCE_MS};
#[cfg(feature = "encoder")]
pub use encoder::{Encoder, ENCODER_KEY};
pub use panel::{panel_registry, PanelDevice, PANEL_IDENTITY, PANEL_KEYS};
pub use uart::{UartInput, UartOutput, BAUD_RATE};
