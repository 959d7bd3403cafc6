//! UART byte stream adapters for the protocol bridge.
//!
//! # Pins
//!
//! Uses UART1 by default:
//! - GPIO 8: TX
//! - GPIO 9: RX
//! - GPIO 10: CTS (optional, with `uart-flow-control` feature)
//! - GPIO 11: RTS (optional, with `uart-flow-control` feature)

use dataref_core::{InputError, InputSource, OutputError, OutputSink};
use embassy_rp::uart::{Async, Error as UartError, UartRx, UartTx};

/// Host link speed, 8N1.
pub const BAUD_RATE: u32 = 115_200;

/// Convert UART errors to [`InputError`].
///
/// This is a helper function instead of a `From` impl to avoid orphan rule issues
/// (both `UartError` and `InputError` are defined in external crates).
#[inline]
fn uart_error_to_input_error(e: UartError) -> InputError {
    match e {
        UartError::Framing => InputError::Framing,
        UartError::Overrun => InputError::Overrun,
        _ => InputError::Io,
    }
}

/// Host command bytes from the UART receiver.
pub struct UartInput<'d> {
    rx: UartRx<'d, Async>,
}

impl<'d> UartInput<'d> {
    #[must_use]
    pub fn new(rx: UartRx<'d, Async>) -> Self {
        Self { rx }
    }
}

impl InputSource for UartInput<'_> {
    /// Reads a single byte so a line is answered as soon as its `\n` lands.
    async fn receive(&mut self, buf: &mut [u8]) -> Result<usize, InputError> {
        let Some(first) = buf.first_mut() else {
            return Ok(0);
        };
        let mut byte = [0u8; 1];
        self.rx
            .read(&mut byte)
            .await
            .map_err(uart_error_to_input_error)?;
        *first = byte[0];
        Ok(1)
    }

    fn is_connected(&self) -> bool {
        // UART is always "connected" if we have the peripheral
        true
    }
}

/// Reply and event bytes to the UART transmitter.
pub struct UartOutput<'d> {
    tx: UartTx<'d, Async>,
}

impl<'d> UartOutput<'d> {
    #[must_use]
    pub fn new(tx: UartTx<'d, Async>) -> Self {
        Self { tx }
    }
}

impl OutputSink for UartOutput<'_> {
    async fn write_all(&mut self, bytes: &[u8]) -> Result<(), OutputError> {
        self.tx.write(bytes).await.map_err(|_| OutputError::Io)
    }

    fn is_ready(&self) -> bool {
        true
    }
}
