//! Collaborator traits
//!
//! These traits define the interface between the check logic and the
//! flight stack it runs inside: vehicle status and disarm, motor command
//! and RPM feedback, and the write-only telemetry and notification outputs.

pub mod sink;
pub mod vehicle;

pub use sink::{Notifier, TelemetrySink};
pub use vehicle::{DisarmReason, MotorFeedback, Vehicle};
