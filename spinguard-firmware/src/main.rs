//! Spinguard - Motor Spin-up RPM Check Firmware
//!
//! Companion firmware for RP2040 boards wired between a flight controller
//! and its ESCs. After the vehicle arms it watches ESC telemetry and
//! requests a disarm when a commanded motor does not turn.
//!
//! UART0 RX listens to the shared ESC telemetry wire, UART1 carries the
//! framed link to the flight stack.

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::bind_interrupts;
use embassy_rp::peripherals::{UART0, UART1};
use embassy_rp::uart::{BufferedInterruptHandler, Config as UartConfig, Uart};
use embedded_alloc::LlffHeap as Heap;
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use spinguard_hal_rp2040::flash::FlashStorage;

use crate::config::{load_params, parse_config};

// Heap allocator for TOML parsing
#[global_allocator]
static HEAP: Heap = Heap::empty();

// Heap size: 4KB
const HEAP_SIZE: usize = 4 * 1024;

/// Embedded vehicle configuration (compiled into firmware)
/// Edit vehicle.toml and rebuild to customize
const EMBEDDED_CONFIG: &str = include_str!("../vehicle.toml");

/// Baud rate of KISS ESC telemetry
const ESC_TELEMETRY_BAUD: u32 = 115_200;

/// Baud rate of the flight stack link
const LINK_BAUD: u32 = 921_600;

mod channels;
mod config;
mod tasks;

bind_interrupts!(struct Irqs {
    UART0_IRQ => BufferedInterruptHandler<UART0>;
    UART1_IRQ => BufferedInterruptHandler<UART1>;
});

// Static cells for UART buffers (must live forever)
static ESC_TX_BUF: StaticCell<[u8; 16]> = StaticCell::new();
static ESC_RX_BUF: StaticCell<[u8; 256]> = StaticCell::new();
static LINK_TX_BUF: StaticCell<[u8; 512]> = StaticCell::new();
static LINK_RX_BUF: StaticCell<[u8; 256]> = StaticCell::new();

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Spinguard firmware starting...");

    // Initialize heap allocator
    init_heap();

    // Initialize RP2040 peripherals
    let p = embassy_rp::init(Default::default());
    info!("Peripherals initialized");

    // vehicle.toml is validated by build.rs, so this only fails on a
    // firmware bug
    let vehicle = match parse_config(EMBEDDED_CONFIG) {
        Ok(vehicle) => vehicle,
        Err(e) => defmt::panic!("Invalid embedded vehicle config: {:?}", e),
    };
    info!(
        "Vehicle config: {} motor(s), {} poles",
        vehicle.motors.len(),
        vehicle.esc.poles
    );

    // Stored parameter edits override the vehicle.toml defaults
    let mut storage = FlashStorage::new(p.FLASH, p.DMA_CH0);
    let params = load_params(&mut storage, vehicle.params).await;
    channels::PARAMS.lock(|t| t.set(params));
    info!("Parameters loaded");

    // ESC telemetry: receive only, the TX pin is never driven by the ESCs
    let esc_uart_config = {
        let mut cfg = UartConfig::default();
        cfg.baudrate = ESC_TELEMETRY_BAUD;
        cfg
    };
    let esc_tx_buf = ESC_TX_BUF.init([0u8; 16]);
    let esc_rx_buf = ESC_RX_BUF.init([0u8; 256]);
    let esc_uart = Uart::new_blocking(p.UART0, p.PIN_0, p.PIN_1, esc_uart_config);
    let esc_uart = esc_uart.into_buffered(Irqs, esc_tx_buf, esc_rx_buf);
    let (_esc_tx, esc_rx) = esc_uart.split();

    info!("UART0 initialized for ESC telemetry");

    // Flight stack link
    let link_uart_config = {
        let mut cfg = UartConfig::default();
        cfg.baudrate = LINK_BAUD;
        cfg
    };
    let link_tx_buf = LINK_TX_BUF.init([0u8; 512]);
    let link_rx_buf = LINK_RX_BUF.init([0u8; 256]);
    let link_uart = Uart::new_blocking(p.UART1, p.PIN_4, p.PIN_5, link_uart_config);
    let link_uart = link_uart.into_buffered(Irqs, link_tx_buf, link_rx_buf);
    let (link_tx, link_rx) = link_uart.split();

    info!("UART1 initialized for flight stack link");

    let esc_count = vehicle.motors.len();

    // Spawn tasks
    spawner.spawn(tasks::link_rx_task(link_rx)).unwrap();
    spawner.spawn(tasks::link_tx_task(link_tx)).unwrap();
    spawner
        .spawn(tasks::esc_telemetry_task(esc_rx, esc_count, vehicle.esc))
        .unwrap();
    spawner
        .spawn(tasks::param_store_task(storage, vehicle.params))
        .unwrap();
    spawner.spawn(tasks::rpm_check_task(vehicle.motors)).unwrap();

    info!("All tasks spawned, firmware running");

    // Main task has nothing else to do - all work happens in spawned tasks
    loop {
        embassy_time::Timer::after_secs(60).await;
        trace!("Main loop heartbeat");
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
