//! ESC telemetry receive task
//!
//! Collects KISS telemetry frames from the shared ESC telemetry wire and
//! stores them in the hub, one slot per ESC in answer order.

use defmt::*;
use embassy_rp::uart::BufferedUartRx;
use embassy_time::{with_timeout, Duration, Instant};
use embedded_io_async::Read;

use spinguard_drivers::esc::FrameAssembler;

use crate::channels::ESC_HUB;
use crate::config::EscConfig;

/// Buffer size for UART receive
const RX_BUF_SIZE: usize = 32;

/// ESC telemetry task - decodes frames into the telemetry hub
#[embassy_executor::task]
pub async fn esc_telemetry_task(mut rx: BufferedUartRx, esc_count: usize, esc: EscConfig) {
    info!(
        "ESC telemetry task started: {} ESC(s), {} poles",
        esc_count, esc.poles
    );

    if let Err(e) = ESC_HUB.lock(|hub| hub.borrow_mut().configure(esc_count, esc.poles)) {
        error!("Invalid ESC telemetry configuration: {:?}", e);
        return;
    }

    let gap = Duration::from_millis(esc.resync_gap_ms as u64);
    let mut assembler = FrameAssembler::new();
    let mut buf = [0u8; RX_BUF_SIZE];

    loop {
        match with_timeout(gap, rx.read(&mut buf)).await {
            Err(_) => {
                // Line idle: the next answer starts a new round
                if assembler.pending() > 0 {
                    debug!("ESC line idle, dropping {} byte(s)", assembler.pending());
                    assembler.reset();
                }
                ESC_HUB.lock(|hub| hub.borrow_mut().resync());
            }
            Ok(Ok(n)) => {
                let now_ms = Instant::now().as_millis();
                for &byte in &buf[..n] {
                    let Some(result) = assembler.push(byte) else {
                        continue;
                    };
                    match result {
                        Ok(telemetry) => {
                            let slot =
                                ESC_HUB.lock(|hub| hub.borrow_mut().record_next(telemetry, now_ms));
                            trace!("ESC {}: {} eRPM", slot, telemetry.erpm());
                        }
                        Err(e) => {
                            ESC_HUB.lock(|hub| hub.borrow_mut().record_error());
                            debug!("ESC telemetry frame rejected: {:?}", e);
                        }
                    }
                }
            }
            Ok(Err(e)) => {
                warn!("ESC UART read error: {:?}", e);
            }
        }
    }
}
