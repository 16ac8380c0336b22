//! Parameter persistence task
//!
//! Owns the flash storage and writes parameter edits to it in the
//! background, so a flash erase never delays the check task.

use defmt::*;
use embassy_time::Timer;

use spinguard_core::config::ParamTable;
use spinguard_core::notify::{format_status, QueuedStatus};
use spinguard_core::Severity;
use spinguard_hal_rp2040::flash::FlashStorage;

use crate::channels::{send_outbound, Outbound, StoreRequest, PARAMS, PARAM_STORE};
use crate::config::{clear_params, save_params};

/// Quiet time after an edit before writing, so a burst of edits costs one
/// flash write
const STORE_DEBOUNCE_MS: u64 = 500;

/// Parameter store task - handles save and reset requests
#[embassy_executor::task]
pub async fn param_store_task(mut storage: FlashStorage<'static>, defaults: ParamTable) {
    info!("Parameter store task started");

    loop {
        let request = match PARAM_STORE.wait().await {
            StoreRequest::Save => {
                Timer::after_millis(STORE_DEBOUNCE_MS).await;
                // A reset during the wait replaces the save
                PARAM_STORE.try_take().unwrap_or(StoreRequest::Save)
            }
            StoreRequest::Reset => StoreRequest::Reset,
        };

        match request {
            StoreRequest::Save => {
                let table = PARAMS.lock(|p| p.get());
                match save_params(&mut storage, &table).await {
                    Ok(()) => info!("Parameters saved to flash"),
                    Err(e) => error!("Failed to save parameters: {:?}", e),
                }
            }
            StoreRequest::Reset => match clear_params(&mut storage).await {
                Ok(()) => {
                    PARAMS.lock(|p| p.set(defaults));
                    info!("Parameters reset to defaults");
                    send_outbound(Outbound::Status(QueuedStatus {
                        severity: Severity::Notice,
                        text: format_status(format_args!("Parameters reset to defaults")),
                    }));
                }
                Err(e) => error!("Failed to reset parameters: {:?}", e),
            },
        }
    }
}
