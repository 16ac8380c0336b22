//! Monitor state machine
//!
//! The state is explicit, finite, and deterministic: each cycle the monitor
//! takes an [`Observation`] of the vehicle and moves to the next state.

pub mod machine;
pub mod observation;

pub use machine::{DisabledReason, Latch, MonitorState};
pub use observation::Observation;
