//! Output sinks
//!
//! Both sinks are write-only: nothing written to them feeds back into a
//! check decision.

use crate::notify::Severity;
use crate::telemetry::MotorSample;

/// Destination for per-motor check samples
pub trait TelemetrySink {
    fn write_sample(&mut self, sample: &MotorSample);
}

/// Destination for operator status messages
pub trait Notifier {
    /// Send a text message at the given severity
    fn send_text(&mut self, severity: Severity, text: &str);
}
