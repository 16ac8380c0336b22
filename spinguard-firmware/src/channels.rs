//! Inter-task communication channels
//!
//! Defines the statics shared between Embassy tasks. Values read every
//! check cycle live behind blocking critical-section mutexes so the check
//! task never awaits on them.

use core::cell::{Cell, RefCell};

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::channel::Channel;
use embassy_sync::signal::Signal;
use embassy_time::Instant;
use portable_atomic::{AtomicU32, AtomicU8, Ordering};

use spinguard_core::config::{ParamTable, MAX_MOTORS};
use spinguard_core::notify::QueuedStatus;
use spinguard_core::safety::MAX_OUTPUTS_PER_CYCLE;
use spinguard_core::traits::DisarmReason;
use spinguard_core::MotorSample;
use spinguard_drivers::esc::EscTelemetryHub;
use spinguard_protocol::VehicleStatus;

/// Vehicle status older than this is treated as link loss (ms)
pub const VEHICLE_STALE_MS: u64 = 500;

/// Room for messages from other tasks queued alongside a check cycle
const OUTBOUND_HEADROOM: usize = 4;

/// Channel capacity for outbound link messages
///
/// A whole check cycle is queued before the link TX task can run, so the
/// channel holds the worst case with room to spare.
pub const OUTBOUND_CHANNEL_SIZE: usize = MAX_OUTPUTS_PER_CYCLE + OUTBOUND_HEADROOM;

/// Live parameter table, read by the check task every cycle
pub static PARAMS: Mutex<CriticalSectionRawMutex, Cell<ParamTable>> =
    Mutex::new(Cell::new(ParamTable::new()));

/// Latest vehicle status from the flight stack, with its arrival time
pub static VEHICLE: Mutex<CriticalSectionRawMutex, RefCell<Option<(VehicleStatus, Instant)>>> =
    Mutex::new(RefCell::new(None));

/// Latest ESC telemetry per slot
pub static ESC_HUB: Mutex<CriticalSectionRawMutex, RefCell<EscTelemetryHub<MAX_MOTORS>>> =
    Mutex::new(RefCell::new(EscTelemetryHub::new()));

/// Outbound link message
#[derive(Debug, Clone)]
pub enum Outbound {
    Sample(MotorSample),
    Status(QueuedStatus),
}

/// Samples and status texts for the link TX task
pub static OUTBOUND: Channel<CriticalSectionRawMutex, Outbound, OUTBOUND_CHANNEL_SIZE> =
    Channel::new();

/// Outbound messages dropped because the channel was full
pub static OUTBOUND_DROPPED: AtomicU32 = AtomicU32::new(0);

/// Disarm request (never queued behind telemetry)
pub static DISARM_REQUEST: Signal<CriticalSectionRawMutex, DisarmReason> = Signal::new();

/// Monitor state code for the heartbeat
pub static MONITOR_STATE: AtomicU8 = AtomicU8::new(0);

/// Parameter persistence request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StoreRequest {
    /// Write the live table to flash
    Save,
    /// Erase stored values and restore the defaults
    Reset,
}

/// Signal to the parameter store task
pub static PARAM_STORE: Signal<CriticalSectionRawMutex, StoreRequest> = Signal::new();

/// Queue an outbound message, counting it if the channel is full
pub fn send_outbound(msg: Outbound) {
    if OUTBOUND.try_send(msg).is_err() {
        OUTBOUND_DROPPED.fetch_add(1, Ordering::Relaxed);
    }
}

/// Fresh vehicle status, if the link is alive
pub fn vehicle_status(now: Instant) -> Option<VehicleStatus> {
    VEHICLE.lock(|v| {
        v.borrow().as_ref().and_then(|(status, at)| {
            if now.saturating_duration_since(*at).as_millis() <= VEHICLE_STALE_MS {
                Some(status.clone())
            } else {
                None
            }
        })
    })
}
