//! Vehicle-side payloads
//!
//! The flight stack owns arming, flight detection and output mixing. It
//! reports a snapshot of those every cycle in [`VehicleStatus`], and pushes
//! parameter edits as [`ParamSet`].

use heapless::Vec;
use serde::{Deserialize, Serialize};
use spinguard_core::ParamId;

/// Maximum servo outputs reported in one status message
pub const MAX_OUTPUTS: usize = 16;

/// Current command on one servo output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct OutputPwm {
    /// Function assigned to the output (33 = motor 1, 34 = motor 2, ...)
    pub function_id: u8,
    /// Commanded pulse width (µs)
    pub pwm: u16,
}

/// Vehicle status snapshot
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct VehicleStatus {
    pub armed: bool,
    pub likely_flying: bool,
    /// Outputs with an assigned function
    pub outputs: Vec<OutputPwm, MAX_OUTPUTS>,
}

impl VehicleStatus {
    /// PWM on the first output carrying `function_id`
    pub fn pwm_for(&self, function_id: u8) -> Option<u32> {
        self.outputs
            .iter()
            .find(|o| o.function_id == function_id)
            .map(|o| o.pwm as u32)
    }
}

/// Parameter change pushed by the flight stack
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ParamSet {
    pub param: ParamId,
    pub value: u32,
}
