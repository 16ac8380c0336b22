//! Vehicle and motor feedback traits

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Why the monitor requested a disarm
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum DisarmReason {
    /// A commanded motor did not reach the minimum RPM
    MotorNotSpinning,
}

/// Arming state and the disarm action
pub trait Vehicle {
    /// Vehicle is armed
    fn is_armed(&self) -> bool;

    /// Vehicle is probably airborne
    ///
    /// Only meaningful while armed.
    fn is_likely_flying(&self) -> bool;

    /// Request a disarm
    ///
    /// Fire-and-forget: the request is not acknowledged, and the vehicle may
    /// still report armed on the next cycle.
    fn disarm(&mut self, reason: DisarmReason);
}

/// Live motor command and RPM readings
pub trait MotorFeedback {
    /// Current PWM on the output assigned to `function_id`
    ///
    /// `None` if no output carries that function.
    fn output_pwm(&self, function_id: u8) -> Option<u32>;

    /// Latest RPM from ESC telemetry slot `sensor_id`
    ///
    /// `None` if the slot has no recent data.
    fn rpm(&self, sensor_id: u8) -> Option<u32>;
}
