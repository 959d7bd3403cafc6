//! Panel LEDs and the keys the host can write.

use dataref_core::dataref_proto::{Arity, KeyRef, Value, ValueKind};
use dataref_core::{CommandError, Device, Identity, Registry, RegistryError};
use defmt::{debug, info};
use embassy_rp::gpio::{Level, Output};

/// What the panel reports in its `XPDR` line.
pub const PANEL_IDENTITY: Identity = Identity::new("1.0", "RP2040", "DatarefPanel")
    .with_extras(&[("proto", "1")]);

/// Registry slots; leaves room above [`PANEL_KEYS`].
pub const PANEL_CAPACITY: usize = 8;

/// Number of wired annunciator LEDs (the first entries of `LED_STATE`).
pub const ANNUNCIATORS: usize = 3;

/// Keys registered at boot.
pub const PANEL_KEYS: &[(&str, ValueKind, Arity)] = &[
    ("GEAR_LED", ValueKind::Bool, Arity::Scalar),
    ("LED_STATE", ValueKind::ByteArray, Arity::Array(16)),
    ("BARO", ValueKind::Float, Arity::Scalar),
];

const LAMP_TEST_CMD: &str = "panel/lamp_test";

/// Build the registry with every key in [`PANEL_KEYS`].
///
/// # Errors
///
/// Returns the first registration error.
pub fn panel_registry() -> Result<Registry<PANEL_CAPACITY>, RegistryError> {
    let mut registry = Registry::new();
    for &(name, kind, arity) in PANEL_KEYS {
        registry.register(name, kind, arity)?;
    }
    Ok(registry)
}

/// LED outputs driven by registry writes.
pub struct PanelDevice<'d> {
    gear: [Output<'d>; 3],
    annunciators: [Output<'d>; ANNUNCIATORS],
    status: Output<'d>,
    gear_on: bool,
    lit: [bool; ANNUNCIATORS],
    lamp_test: bool,
}

impl<'d> PanelDevice<'d> {
    #[must_use]
    pub fn new(
        gear: [Output<'d>; 3],
        annunciators: [Output<'d>; ANNUNCIATORS],
        status: Output<'d>,
    ) -> Self {
        Self {
            gear,
            annunciators,
            status,
            gear_on: false,
            lit: [false; ANNUNCIATORS],
            lamp_test: false,
        }
    }

    fn apply(&mut self) {
        let gear = Level::from(self.gear_on || self.lamp_test);
        for pin in &mut self.gear {
            pin.set_level(gear);
        }
        for (pin, &on) in self.annunciators.iter_mut().zip(&self.lit) {
            pin.set_level(Level::from(on || self.lamp_test));
        }
    }

    fn set_annunciator(&mut self, index: usize, byte: u8) {
        if let Some(lit) = self.lit.get_mut(index) {
            *lit = byte > 0;
        }
    }
}

impl Device for PanelDevice<'_> {
    fn on_write(&mut self, key: &KeyRef<'_>, value: &Value) {
        match (key.name(), key.index(), value) {
            ("GEAR_LED", None, Value::Bool(on)) => self.gear_on = *on,
            ("LED_STATE", Some(index), Value::Byte(byte)) => {
                if let Ok(index) = usize::try_from(index) {
                    self.set_annunciator(index, *byte);
                }
            }
            ("LED_STATE", None, Value::ByteArray(bytes)) => {
                for (index, &byte) in bytes.iter().enumerate() {
                    self.set_annunciator(index, byte);
                }
            }
            // Stored for readback only
            _ => return,
        }
        self.apply();
    }

    fn execute(&mut self, path: &str) -> Result<(), CommandError> {
        if path != LAMP_TEST_CMD {
            debug!("command {} not handled", path);
            return Err(CommandError::Unsupported);
        }
        self.lamp_test = !self.lamp_test;
        info!("lamp test {}", if self.lamp_test { "on" } else { "off" });
        self.apply();
        Ok(())
    }

    /// Output latches must match the requested LED state.
    fn self_test(&mut self) -> bool {
        let gear = self.gear_on || self.lamp_test;
        let gear_ok = self.gear.iter().all(|pin| pin.is_set_high() == gear);
        let annunciators_ok = self
            .annunciators
            .iter()
            .zip(&self.lit)
            .all(|(pin, &on)| pin.is_set_high() == (on || self.lamp_test));
        gear_ok && annunciators_ok
    }

    fn on_connected(&mut self) {
        info!("host connected");
        self.status.set_high();
    }
}
