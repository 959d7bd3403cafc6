#![no_std]
#![no_main]

use dataref_panel_rp2040::panel::PANEL_CAPACITY;
use dataref_panel_rp2040::{
    panel_registry, ButtonBank, Engine, EngineConfig, EventEmitter, PanelDevice, ProtocolBridge,
    SharedOutput, UartInput, UartOutput, BAUD_RATE, PANEL_IDENTITY,
};
use defmt::{error, info, unwrap};
use defmt_rtt as _;
use embassy_executor::Spawner;
use embassy_rp::bind_interrupts;
use embassy_rp::gpio::{Input, Level, Output, Pull};
use embassy_rp::peripherals::UART1;
use embassy_rp::uart::{Config as UartConfig, Uart};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_time::{Duration, Instant, Ticker};
use static_cell::StaticCell;

#[cfg(feature = "dev-panic")]
use panic_probe as _;
#[cfg(feature = "prod-panic")]
use panic_reset as _;

bind_interrupts!(struct Irqs {
    UART1_IRQ => embassy_rp::uart::InterruptHandler<UART1>;
});

type PanelOutput = SharedOutput<CriticalSectionRawMutex, UartOutput<'static>>;
type PanelBridge = ProtocolBridge<
    'static,
    UartInput<'static>,
    CriticalSectionRawMutex,
    UartOutput<'static>,
    PanelDevice<'static>,
    PANEL_CAPACITY,
>;

/// UART transmitter shared by replies and events.
/// Each writer holds the lock for whole lines only.
static OUTPUT: StaticCell<PanelOutput> = StaticCell::new();

const BUTTON_COUNT: usize = 4;

const CONFIG: EngineConfig = EngineConfig::new(PANEL_IDENTITY);

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Dataref panel starting...");

    let p = embassy_rp::init(embassy_rp::config::Config::default());

    // --- UART Setup ---
    let mut uart_config = UartConfig::default();
    uart_config.baudrate = BAUD_RATE;

    #[cfg(not(feature = "uart-flow-control"))]
    let uart = Uart::new(
        p.UART1,
        p.PIN_8, // TX
        p.PIN_9, // RX
        Irqs,
        p.DMA_CH0,
        p.DMA_CH1,
        uart_config,
    );
    #[cfg(feature = "uart-flow-control")]
    let uart = Uart::new_with_rtscts(
        p.UART1,
        p.PIN_8,  // TX
        p.PIN_9,  // RX
        p.PIN_11, // RTS
        p.PIN_10, // CTS
        Irqs,
        p.DMA_CH0,
        p.DMA_CH1,
        uart_config,
    );
    let (tx, rx) = uart.split();
    let output = OUTPUT.init(SharedOutput::new(UartOutput::new(tx)));

    // --- Panel Setup ---
    let device = PanelDevice::new(
        [
            Output::new(p.PIN_2, Level::Low),
            Output::new(p.PIN_3, Level::Low),
            Output::new(p.PIN_4, Level::Low),
        ],
        [
            Output::new(p.PIN_5, Level::Low),
            Output::new(p.PIN_6, Level::Low),
            Output::new(p.PIN_7, Level::Low),
        ],
        Output::new(p.PIN_25, Level::Low),
    );
    let buttons: ButtonBank<'static, BUTTON_COUNT> = ButtonBank::new([
        Input::new(p.PIN_12, Pull::Up),
        Input::new(p.PIN_13, Pull::Up),
        Input::new(p.PIN_14, Pull::Up),
        Input::new(p.PIN_15, Pull::Up),
    ]);

    let registry = unwrap!(panel_registry());
    let engine = Engine::new(CONFIG, registry, device);
    let bridge = ProtocolBridge::new(UartInput::new(rx), output, engine);

    // Spawn tasks (unwrap the SpawnToken, then spawn)
    spawner.spawn(bridge_task(bridge).unwrap());
    spawner.spawn(button_task(buttons, output).unwrap());
    spawner.spawn(heartbeat_task(output).unwrap());

    #[cfg(feature = "encoder")]
    {
        let encoder = dataref_panel_rp2040::Encoder::new(
            Input::new(p.PIN_16, Pull::Up),
            Input::new(p.PIN_17, Pull::Up),
        );
        spawner.spawn(encoder_task(encoder, output).unwrap());
    }

    info!("Dataref panel initialized, waiting for HELLO...");
}

/// Bridge task - answers host commands.
#[embassy_executor::task]
async fn bridge_task(mut bridge: PanelBridge) {
    bridge.run().await
}

/// Button task - forwards debounced button changes.
#[embassy_executor::task]
async fn button_task(mut buttons: ButtonBank<'static, BUTTON_COUNT>, output: &'static PanelOutput) {
    let emitter = EventEmitter::new(output);
    loop {
        let e = emitter.forward(&mut buttons).await;
        error!("Button event lost: {}", e);
    }
}

/// Encoder task - forwards encoder steps.
#[cfg(feature = "encoder")]
#[embassy_executor::task]
async fn encoder_task(mut encoder: dataref_panel_rp2040::Encoder<'static>, output: &'static PanelOutput) {
    let emitter = EventEmitter::new(output);
    loop {
        let e = emitter.forward(&mut encoder).await;
        error!("Encoder event lost: {}", e);
    }
}

/// Heartbeat task - reports uptime while the link is idle or busy.
#[embassy_executor::task]
async fn heartbeat_task(output: &'static PanelOutput) {
    let emitter = EventEmitter::new(output);
    let mut ticker = Ticker::every(Duration::from_secs(u64::from(CONFIG.heartbeat_interval_secs)));
    loop {
        ticker.next().await;
        let uptime = u32::try_from(Instant::now().as_secs()).unwrap_or(u32::MAX);
        if let Err(e) = emitter.heartbeat(uptime).await {
            error!("Heartbeat error: {}", e);
        }
    }
}
