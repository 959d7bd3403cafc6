//! End-to-end protocol scenarios against a byte-level engine.

use dataref_core::{
    CommandError, Device, Engine, EngineConfig, Identity, LineSink, Registry, SinkError,
};
use dataref_proto::{Arity, KeyRef, Value, ValueKind, MAX_LINE_LENGTH};
use proptest::prelude::*;

/// Collects reply lines as strings.
#[derive(Default)]
struct Transcript(Vec<String>);

impl LineSink for Transcript {
    fn write_line(&mut self, line: &[u8]) -> Result<(), SinkError> {
        let text = std::str::from_utf8(line).map_err(|_| SinkError::Io)?;
        self.0.push(text.trim_end_matches('\n').to_string());
        Ok(())
    }
}

#[derive(Default)]
struct Panel {
    gear_led: bool,
    leds: [u8; 16],
    commands: Vec<String>,
}

impl Device for Panel {
    fn on_write(&mut self, key: &KeyRef<'_>, value: &Value) {
        match (key.name(), key.index(), value) {
            ("GEAR_LED", None, Value::Bool(on)) => self.gear_led = *on,
            ("LED_STATE", Some(i), Value::Byte(b)) => self.leds[i as usize] = *b,
            ("LED_STATE", None, Value::ByteArray(bytes)) => self.leds.copy_from_slice(bytes),
            _ => {}
        }
    }

    fn execute(&mut self, path: &str) -> Result<(), CommandError> {
        if path.starts_with("sim/") {
            self.commands.push(path.to_string());
            Ok(())
        } else {
            Err(CommandError::Unsupported)
        }
    }
}

const CONFIG: EngineConfig = EngineConfig::new(Identity::new("1.0", "ESP32", "MyCustomPanel"));

fn panel_engine() -> Engine<Panel, 8> {
    let mut registry = Registry::new();
    registry
        .register("GEAR_LED", ValueKind::Bool, Arity::Scalar)
        .unwrap();
    registry
        .register("LED_STATE", ValueKind::ByteArray, Arity::Array(16))
        .unwrap();
    registry
        .register("ALT", ValueKind::Int, Arity::Scalar)
        .unwrap();
    registry
        .register("QNH", ValueKind::Float, Arity::Scalar)
        .unwrap();
    Engine::new(CONFIG, registry, Panel::default())
}

fn exchange<D: Device, const N: usize>(engine: &mut Engine<D, N>, input: &str) -> Vec<String> {
    let mut out = Transcript::default();
    engine.feed(input.as_bytes(), &mut out).unwrap();
    out.0
}

#[test]
fn reference_session() {
    let mut engine = panel_engine();

    assert_eq!(
        exchange(&mut engine, "HELLO\n"),
        ["XPDR;fw=1.0;board=ESP32;name=MyCustomPanel"]
    );
    assert!(engine.session().is_connected());

    assert_eq!(
        exchange(&mut engine, "SET GEAR_LED 1.0\n"),
        ["ACK GEAR_LED 1.0"]
    );
    assert!(engine.device().gear_led);

    assert_eq!(
        exchange(&mut engine, "SET LED_STATE[3] 300\n"),
        ["ACK LED_STATE[3] 300"]
    );
    assert_eq!(engine.device().leds[3], 255);
    assert_eq!(
        engine.registry().read(&KeyRef::element("LED_STATE", 3)),
        Ok(Value::Byte(255))
    );

    assert_eq!(
        exchange(&mut engine, "GET UNKNOWN_KEY\n"),
        ["ERROR Unknown key: UNKNOWN_KEY"]
    );
}

#[test]
fn one_reply_per_command_line() {
    let mut engine = panel_engine();
    let input = "HELLO\r\nPING\nSET GEAR_LED 0\nGET ALT\nCMD sim/flaps_down\nNOPE\n";
    let replies = exchange(&mut engine, input);
    assert_eq!(
        replies,
        [
            "XPDR;fw=1.0;board=ESP32;name=MyCustomPanel",
            "PONG",
            "ACK GEAR_LED 0",
            "VALUE ALT 0",
            "CMD_EXECUTED sim/flaps_down",
            "UNKNOWN: NOPE",
        ]
    );
    assert_eq!(engine.device().commands, ["sim/flaps_down"]);
}

#[test]
fn unknown_keys_never_crash() {
    let mut engine = panel_engine();
    assert_eq!(
        exchange(&mut engine, "SET MISSING 1\nGET MISSING[2]\nSET ALT[0] 3\n"),
        [
            "ERROR Unknown key 'MISSING'",
            "ACK MISSING ERROR",
            "ERROR Unknown key: MISSING[2]",
            "ERROR Unknown key 'ALT[0]'",
            "ACK ALT[0] ERROR",
        ]
    );
    assert_eq!(exchange(&mut engine, "PING\n"), ["PONG"]);
}

#[test]
fn overlong_line_is_dropped_whole() {
    let mut engine = panel_engine();
    let mut input = String::from("SET ALT ");
    input.push_str(&"9".repeat(MAX_LINE_LENGTH));
    input.push_str("\nGET ALT\n");
    assert_eq!(exchange(&mut engine, &input), ["VALUE ALT 0"]);
    assert_eq!(engine.overflow_count(), 1);
}

#[test]
fn whole_array_surplus_written_silently() {
    let mut engine = panel_engine();
    let values: Vec<String> = (0..20).map(|i| (i * 10).to_string()).collect();
    let line = format!("SET LED_STATE {}\n", values.join(","));
    let replies = exchange(&mut engine, &line);
    assert_eq!(replies.len(), 1);
    assert!(replies[0].starts_with("ACK LED_STATE 0,10,20"));

    let expected: Vec<u8> = (0..16).map(|i| (i * 10).min(255) as u8).collect();
    assert_eq!(engine.device().leds.to_vec(), expected);
}

#[test]
fn cmd_failure_reported() {
    let mut engine = panel_engine();
    assert_eq!(
        exchange(&mut engine, "CMD laminar/custom\n"),
        ["CMD_FAILED laminar/custom"]
    );
}

#[test]
fn disconnect_requires_new_handshake() {
    let mut engine = Engine::new(
        EngineConfig {
            require_handshake: true,
            ..CONFIG
        },
        Registry::<2>::new(),
        Panel::default(),
    );
    assert_eq!(exchange(&mut engine, "STATUS\n"), ["ERROR Not connected"]);
    exchange(&mut engine, "HELLO\n");
    assert_eq!(
        exchange(&mut engine, "STATUS\n"),
        ["STATUS CONNECTED MyCustomPanel 0", "STATUS_END"]
    );
    engine.disconnect();
    assert_eq!(exchange(&mut engine, "LIST\n"), ["ERROR Not connected"]);
}

proptest! {
    #[test]
    fn scalar_write_then_read_is_coerced(v in -1000.0f32..1000.0) {
        let mut engine = panel_engine();
        let raw = format!("{}", v);
        let replies = exchange(&mut engine, &format!("SET QNH {raw}\nSET GEAR_LED {raw}\nSET ALT {raw}\n"));
        prop_assert_eq!(replies.len(), 3);

        let registry = engine.registry();
        prop_assert_eq!(registry.read(&KeyRef::new("QNH")), Ok(Value::Float(v)));
        prop_assert_eq!(registry.read(&KeyRef::new("GEAR_LED")), Ok(Value::Bool(v > 0.5)));
        prop_assert_eq!(
            registry.read(&KeyRef::new("ALT")),
            Ok(dataref_proto::coerce(&raw, ValueKind::Int).unwrap())
        );
    }

    #[test]
    fn indexed_writes_round_trip(index in -4i32..20, v in -50i32..400) {
        let mut engine = panel_engine();
        let replies = exchange(&mut engine, &format!("SET LED_STATE[{index}] {v}\nGET LED_STATE[{index}]\n"));
        if (0..16).contains(&index) {
            let stored = v.clamp(0, 255);
            prop_assert_eq!(&replies[0], &format!("ACK LED_STATE[{index}] {v}"));
            prop_assert_eq!(&replies[1], &format!("VALUE LED_STATE[{index}] {stored}"));
        } else {
            prop_assert_eq!(replies.len(), 3);
            prop_assert!(replies[0].starts_with("ERROR"));
            prop_assert!(replies[2].starts_with("ERROR"));
        }
    }
}
