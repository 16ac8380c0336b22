//! Link UART receive task
//!
//! Receives frames from the flight stack and updates the shared vehicle
//! status and parameter table.

use defmt::*;
use embassy_rp::uart::BufferedUartRx;
use embassy_time::Instant;
use embedded_io_async::Read;

use spinguard_core::notify::{format_status, QueuedStatus};
use spinguard_core::Severity;
use spinguard_protocol::{FrameParser, ParamSet, VehicleMessage};

use crate::channels::{send_outbound, Outbound, StoreRequest, PARAMS, PARAM_STORE, VEHICLE};

/// Buffer size for UART receive
const RX_BUF_SIZE: usize = 64;

/// Link RX task - receives and parses frames from the flight stack
#[embassy_executor::task]
pub async fn link_rx_task(mut rx: BufferedUartRx) {
    info!("Link RX task started");

    let mut parser = FrameParser::new();
    let mut buf = [0u8; RX_BUF_SIZE];

    loop {
        match rx.read(&mut buf).await {
            Ok(n) if n > 0 => {
                trace!("RX: {} bytes", n);

                for &byte in &buf[..n] {
                    match parser.feed(byte) {
                        Ok(Some(frame)) => match VehicleMessage::from_frame(&frame) {
                            Ok(msg) => handle_vehicle_message(msg),
                            Err(e) => {
                                warn!("Failed to parse vehicle message: {:?}", e);
                            }
                        },
                        Ok(None) => {}
                        Err(e) => {
                            warn!("Frame parse error: {:?}", e);
                        }
                    }
                }
            }
            Ok(_) => {}
            Err(e) => {
                warn!("UART read error: {:?}", e);
            }
        }
    }
}

/// Handle a parsed vehicle message
fn handle_vehicle_message(msg: VehicleMessage) {
    match msg {
        VehicleMessage::Status(status) => {
            VEHICLE.lock(|v| *v.borrow_mut() = Some((status, Instant::now())));
        }
        VehicleMessage::ParamSet(set) => apply_param(set),
        VehicleMessage::ParamReset => {
            info!("Parameter reset requested");
            PARAM_STORE.signal(StoreRequest::Reset);
        }
    }
}

/// Write a parameter into the live table
///
/// Out-of-range values are rejected and reported to the operator; the old
/// value stays in effect.
fn apply_param(set: ParamSet) {
    let result = PARAMS.lock(|p| {
        let mut table = p.get();
        let result = table.set(set.param, set.value);
        if result.is_ok() {
            p.set(table);
        }
        result
    });

    match result {
        Ok(()) => {
            info!("{} = {}", set.param.name(), set.value);
            PARAM_STORE.signal(StoreRequest::Save);
        }
        Err(e) => {
            warn!("Rejected {} = {}: {:?}", set.param.name(), set.value, e);
            send_outbound(Outbound::Status(QueuedStatus {
                severity: Severity::Warning,
                text: format_status(format_args!(
                    "{} = {} rejected, out of range",
                    set.param.name(),
                    set.value
                )),
            }));
        }
    }
}
