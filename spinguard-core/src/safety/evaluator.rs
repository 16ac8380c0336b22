//! Motor-fault evaluator

use crate::telemetry::SampleStatus;

/// Result of checking one motor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Evaluation {
    /// Motor passed (trivially true when not checked)
    pub ok: bool,
    /// Motor was commanded hard enough to be checked
    pub checked: bool,
}

impl Evaluation {
    /// Checked and below minimum RPM
    pub fn is_fault(&self) -> bool {
        self.checked && !self.ok
    }

    /// Telemetry status, or `None` when the motor was not checked
    pub fn sample_status(&self) -> Option<SampleStatus> {
        match (self.checked, self.ok) {
            (false, _) => None,
            (true, true) => Some(SampleStatus::Pass),
            (true, false) => Some(SampleStatus::Fault),
        }
    }
}

/// Check one motor
///
/// A motor commanded at or below `min_pwm` is idling and is not expected to
/// turn, so it is skipped. Above that it must reach `min_rpm`.
pub fn evaluate(commanded_pwm: u32, measured_rpm: u32, min_pwm: u32, min_rpm: u32) -> Evaluation {
    if commanded_pwm <= min_pwm {
        return Evaluation {
            ok: true,
            checked: false,
        };
    }

    Evaluation {
        ok: measured_rpm >= min_rpm,
        checked: true,
    }
}
