//! Board-agnostic core logic for the motor spin-up RPM check
//!
//! After the vehicle arms, the monitor waits for a spin-up delay and then
//! verifies that every motor commanded above a minimum PWM is turning at
//! least a minimum RPM. A motor that does not spin disarms the vehicle.
//!
//! This crate contains everything that does not depend on hardware:
//!
//! - Parameter store, persisted parameter record and motor channel mapping
//! - vehicle.toml parser (`alloc` feature)
//! - Motor-fault evaluator
//! - Monitor state machine
//! - Collaborator traits (vehicle, motor feedback, telemetry, notifications)
//! - Telemetry samples and status text types

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

#[cfg(feature = "alloc")]
extern crate alloc;

pub mod config;
pub mod crc;
pub mod notify;
pub mod safety;
pub mod state;
pub mod telemetry;
pub mod traits;

pub use config::{
    CheckParams, ConfigError, MotorChannel, MotorMap, ParamId, ParamTable, StoredParams,
};
pub use notify::{Severity, StatusQueue, StatusText};
pub use safety::{evaluate, Evaluation, SpinCheckMonitor};
pub use state::{DisabledReason, Latch, MonitorState, Observation};
pub use telemetry::{MotorSample, SampleLog, SampleStatus};
