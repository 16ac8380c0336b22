//! Motor spin safety
//!
//! The evaluator decides whether one motor is spinning; the monitor runs
//! the evaluator over every motor once the spin-up delay has passed and
//! disarms on a fault.

pub mod evaluator;
pub mod monitor;

pub use evaluator::{evaluate, Evaluation};
pub use monitor::{MotorStatus, SpinCheckMonitor, CHECK_PERIOD_MS, MAX_OUTPUTS_PER_CYCLE};
