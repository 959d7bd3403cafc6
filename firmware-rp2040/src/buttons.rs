//! Debounced push buttons reported as `INPUT BUTTONS[<i>] <0|1>`.

use dataref_core::dataref_proto::Value;
use dataref_core::{DeviceEvent, EventSource};
use defmt::warn;
use embassy_rp::gpio::Input;
use embassy_time::{Duration, Ticker};

/// Event key for the button bank.
pub const BUTTONS_KEY: &str = "BUTTONS";

/// Scan period; a change must hold for two scans.
pub const DEBOUNCE_MS: u64 = 10;

/// Active-low buttons scanned on a fixed tick.
pub struct ButtonBank<'d, const K: usize> {
    pins: [Input<'d>; K],
    sampled: [bool; K],
    stable: [bool; K],
    ticker: Ticker,
}

impl<'d, const K: usize> ButtonBank<'d, K> {
    /// Buttons are expected to be pulled up; pressed reads low.
    #[must_use]
    pub fn new(pins: [Input<'d>; K]) -> Self {
        let sampled = core::array::from_fn(|i| pins[i].is_low());
        Self {
            pins,
            sampled,
            stable: sampled,
            ticker: Ticker::every(Duration::from_millis(DEBOUNCE_MS)),
        }
    }

    fn scan(&mut self) -> Option<(usize, bool)> {
        let mut changed = None;
        for (i, pin) in self.pins.iter().enumerate() {
            let pressed = pin.is_low();
            let settled = pressed == self.sampled[i];
            self.sampled[i] = pressed;
            if changed.is_none() && settled && pressed != self.stable[i] {
                self.stable[i] = pressed;
                changed = Some((i, pressed));
            }
        }
        changed
    }
}

impl<const K: usize> EventSource for ButtonBank<'_, K> {
    async fn next_event(&mut self) -> DeviceEvent {
        loop {
            if let Some((index, pressed)) = self.scan() {
                match DeviceEvent::element(BUTTONS_KEY, index, Value::Bool(pressed)) {
                    Ok(event) => return event,
                    Err(e) => warn!("button {} not reported: {}", index, e),
                }
            }
            self.ticker.next().await;
        }
    }
}
