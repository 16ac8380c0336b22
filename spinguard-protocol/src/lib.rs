//! Spin check link protocol
//!
//! Byte-framed UART link between the spin check monitor and the flight
//! stack. The flight stack streams vehicle status and parameter changes in;
//! the monitor streams check samples, status text, disarm requests and a
//! heartbeat out.
//!
//! # Frame format
//!
//! ```text
//! ┌───────┬────────┬──────┬─────────────┬───────┐
//! │ START │ LENGTH │ TYPE │ PAYLOAD     │ CRC8  │
//! │ 1B    │ 1B     │ 1B   │ 0–128B      │ 1B    │
//! └───────┴────────┴──────┴─────────────┴───────┘
//! ```
//!
//! Structured payloads are postcard-encoded.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod frame;
pub mod messages;
pub mod vehicle;

pub use frame::{Frame, FrameError, FrameParser, FRAME_START, MAX_FRAME_SIZE, MAX_PAYLOAD_SIZE};
pub use messages::{MonitorMessage, VehicleMessage};
pub use vehicle::{OutputPwm, ParamSet, VehicleStatus, MAX_OUTPUTS};
