//! Link UART transmit task
//!
//! Sends disarm requests, check samples, status text and a 1 Hz heartbeat
//! to the flight stack. A pending disarm request always goes first.

use defmt::*;
use embassy_futures::select::{select3, Either3};
use embassy_rp::uart::BufferedUartTx;
use embassy_time::{Duration, Ticker};
use embedded_io_async::Write;
use portable_atomic::Ordering;

use spinguard_protocol::{MonitorMessage, MAX_FRAME_SIZE};

use crate::channels::{
    Outbound, DISARM_REQUEST, ESC_HUB, MONITOR_STATE, OUTBOUND, OUTBOUND_DROPPED,
};

/// Heartbeat interval
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(1);

/// Link TX task - sends frames to the flight stack
#[embassy_executor::task]
pub async fn link_tx_task(mut tx: BufferedUartTx) {
    info!("Link TX task started");

    let mut heartbeat = Ticker::every(HEARTBEAT_INTERVAL);
    let mut esc_errors = 0u32;

    loop {
        match select3(DISARM_REQUEST.wait(), OUTBOUND.receive(), heartbeat.next()).await {
            Either3::First(reason) => {
                send(&mut tx, &MonitorMessage::Disarm { reason }).await;
            }
            Either3::Second(Outbound::Sample(sample)) => {
                send(&mut tx, &MonitorMessage::Sample(sample)).await;
            }
            Either3::Second(Outbound::Status(status)) => {
                let msg = MonitorMessage::StatusText {
                    severity: status.severity,
                    text: status.text.as_str(),
                };
                send(&mut tx, &msg).await;
            }
            Either3::Third(()) => {
                let dropped = OUTBOUND_DROPPED.swap(0, Ordering::Relaxed);
                if dropped > 0 {
                    warn!("{} outbound message(s) dropped", dropped);
                }
                let errors = ESC_HUB.lock(|hub| hub.borrow().errors());
                if errors > esc_errors {
                    warn!("{} bad ESC telemetry frame(s), {} total", errors - esc_errors, errors);
                }
                esc_errors = errors;
                let state = MONITOR_STATE.load(Ordering::Relaxed);
                send(&mut tx, &MonitorMessage::Heartbeat { state }).await;
            }
        }
    }
}

/// Encode and write one message
async fn send(tx: &mut BufferedUartTx, msg: &MonitorMessage<'_>) {
    let frame = match msg.to_frame() {
        Ok(frame) => frame,
        Err(e) => {
            warn!("Failed to encode message: {:?}", e);
            return;
        }
    };

    let mut buf = [0u8; MAX_FRAME_SIZE];
    if let Ok(len) = frame.encode(&mut buf) {
        if let Err(e) = tx.write_all(&buf[..len]).await {
            warn!("Failed to send frame: {:?}", e);
        }
    }
}
