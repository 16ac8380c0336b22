//! Hardware driver implementations
//!
//! This crate provides the RPM source for the spin check monitor:
//!
//! - KISS / BLHeli32 ESC telemetry frame decoding
//! - Per-ESC telemetry hub with staleness tracking, feeding
//!   `spinguard_core::traits::MotorFeedback`

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod esc;
