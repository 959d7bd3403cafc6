//! Rotary encoder reported as `INPUT ENC_HDG <+1|-1>` per detent edge.

use dataref_core::dataref_proto::Value;
use dataref_core::{DeviceEvent, EventSource};
use defmt::trace;
use embassy_rp::gpio::Input;

/// Event key for the encoder.
pub const ENCODER_KEY: &str = "ENC_HDG";

/// Quadrature encoder decoded on channel A edges.
pub struct Encoder<'d> {
    a: Input<'d>,
    b: Input<'d>,
}

impl<'d> Encoder<'d> {
    #[must_use]
    pub fn new(a: Input<'d>, b: Input<'d>) -> Self {
        Self { a, b }
    }

    /// `+1` clockwise, `-1` counter-clockwise.
    async fn step(&mut self) -> i32 {
        self.a.wait_for_any_edge().await;
        if self.a.is_high() != self.b.is_high() {
            1
        } else {
            -1
        }
    }
}

impl EventSource for Encoder<'_> {
    async fn next_event(&mut self) -> DeviceEvent {
        loop {
            let step = self.step().await;
            trace!("encoder step {}", step);
            // ENCODER_KEY is a valid name
            if let Ok(event) = DeviceEvent::new(ENCODER_KEY, Value::Int(step)) {
                return event;
            }
        }
    }
}
