//! Infoclock - LED Matrix Information Display Firmware
//!
//! Main firmware binary for an RP2040 driving a chain of MAX7219 8x8
//! modules. A clock, a marquee and three feed pollers (LHC status, weather,
//! restaurant menu) take turns on the matrix through a single access
//! broker; an ESP32 running ESP-AT provides Wi-Fi and SNTP.

#![no_std]
#![no_main]

extern crate alloc;

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::bind_interrupts;
use embassy_rp::gpio::{Level, Output};
use embassy_rp::peripherals::{DMA_CH1, FLASH, UART0};
use embassy_rp::spi::{self, Spi};
use embassy_rp::uart::{BufferedInterruptHandler, Config as UartConfig, Uart};
use embassy_rp::Peri;
use embassy_time::Delay;
use embedded_alloc::LlffHeap as Heap;
use embedded_hal_bus::spi::ExclusiveDevice;
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use infoclock_core::config::Config;
use infoclock_display::Animator;
use infoclock_drivers::Max7219;
use infoclock_hal_rp2040::{FlashSettings, StoreError};

use crate::config::{embedded_config, ConfigLoadError, ConfigPersistence};
use crate::display::{Broker, MAX7219_SPI_HZ};
use crate::wallclock::WALL_CLOCK;

// Heap for feed bodies and JSON documents
#[global_allocator]
static HEAP: Heap = Heap::empty();

// Heap size: 128KB
const HEAP_SIZE: usize = 128 * 1024;

/// Embedded default settings (compiled into firmware)
/// Edit infoclock.conf and rebuild to customize
pub const EMBEDDED_CONFIG: &str = include_str!("../infoclock.conf");

mod channels;
mod config;
mod display;
mod tasks;
mod wallclock;

bind_interrupts!(struct Irqs {
    UART0_IRQ => BufferedInterruptHandler<UART0>;
});

// Static cells for UART buffers (must live forever)
static TX_BUF: StaticCell<[u8; 512]> = StaticCell::new();
static RX_BUF: StaticCell<[u8; 2048]> = StaticCell::new();

static CONFIG: StaticCell<Config> = StaticCell::new();
static BROKER: StaticCell<Broker> = StaticCell::new();

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Infoclock firmware starting...");

    init_heap();

    let p = embassy_rp::init(Default::default());
    info!("Peripherals initialized");

    // Load settings from flash (or use embedded defaults)
    let config: &'static Config = CONFIG.init(load_config_from_flash(p.FLASH, p.DMA_CH1).await);
    WALL_CLOCK.set_offset_hours(config.utc_offset_hours());

    // MAX7219 chain on SPI0 (SCK=GPIO18, MOSI=GPIO19, CS=GPIO17)
    let mut spi_config = spi::Config::default();
    spi_config.frequency = MAX7219_SPI_HZ;
    let spi = Spi::new_txonly(p.SPI0, p.PIN_18, p.PIN_19, p.DMA_CH0, spi_config);
    let cs = Output::new(p.PIN_17, Level::High);
    let device = ExclusiveDevice::new(spi, cs, Delay).unwrap_or_else(|e| match e {});

    let segments = config.display_segments();
    let mut max7219 = Max7219::new(device, segments);
    if let Err(e) = max7219.init().await {
        error!("MAX7219 init failed: {:?}", e);
    }
    info!("Matrix initialized: {} modules", segments);

    let broker: &'static Broker = BROKER.init(Broker::new(Animator::new(max7219, Delay)));

    // Setup UART for the ESP-AT modem (GPIO0 TX, GPIO1 RX)
    let uart_config = UartConfig::default(); // 115200 baud default

    let tx_buf = TX_BUF.init([0u8; 512]);
    let rx_buf = RX_BUF.init([0u8; 2048]);

    let uart = Uart::new_blocking(p.UART0, p.PIN_0, p.PIN_1, uart_config);
    let uart = uart.into_buffered(Irqs, tx_buf, rx_buf);

    info!("UART initialized for modem communication");

    // Onboard LED on the Pico
    let led = Output::new(p.PIN_25, Level::Low);

    let clock = unwrap!(broker.register());
    let marquee = unwrap!(broker.register());
    let lhc_status = unwrap!(broker.register());
    let weather = unwrap!(broker.register());
    let menu = unwrap!(broker.register());

    // Spawn tasks
    spawner.spawn(tasks::broker_task(broker)).unwrap();
    spawner.spawn(tasks::blink_task(led)).unwrap();
    spawner.spawn(tasks::modem_task(uart)).unwrap();
    spawner.spawn(tasks::clock_task(clock)).unwrap();
    spawner.spawn(tasks::marquee_task(marquee, config)).unwrap();
    spawner.spawn(tasks::lhc_status_task(lhc_status)).unwrap();
    spawner.spawn(tasks::weather_task(weather, config)).unwrap();
    spawner.spawn(tasks::menu_task(menu, config)).unwrap();

    info!("All tasks spawned, firmware running");

    loop {
        embassy_time::Timer::after_secs(60).await;
        trace!(
            "Main loop heartbeat: clock synced={}, {}/{} waiting for display",
            WALL_CLOCK.is_synced(),
            broker.pending_len(),
            broker.capacity()
        );
    }
}

/// Initialize the heap allocator
fn init_heap() {
    use core::mem::MaybeUninit;
    static mut HEAP_MEM: [MaybeUninit<u8>; HEAP_SIZE] = [MaybeUninit::uninit(); HEAP_SIZE];
    #[allow(static_mut_refs)]
    unsafe {
        HEAP.init(HEAP_MEM.as_ptr() as usize, HEAP_SIZE)
    }
}

/// Load settings from flash storage
///
/// Falls back to the embedded defaults when flash is empty or unreadable,
/// and writes them back so the next boot finds them.
async fn load_config_from_flash(flash: Peri<'static, FLASH>, dma: Peri<'static, DMA_CH1>) -> Config {
    let mut persistence = ConfigPersistence::new(FlashSettings::new(flash, dma));

    match persistence.load().await {
        Ok(config) => {
            info!("Loaded settings from flash");
            return config;
        }
        Err(ConfigLoadError::Store(StoreError::Empty)) => {
            info!("No settings in flash, using embedded defaults");
        }
        Err(e) => {
            warn!("Stored settings unusable: {:?}", e);
            if let Err(e) = persistence.reset().await {
                error!("Failed to erase settings: {:?}", e);
            }
        }
    }

    let config = embedded_config();
    if let Err(e) = persistence.store(&config).await {
        warn!("Failed to store default settings: {:?}", e);
    }
    config
}
