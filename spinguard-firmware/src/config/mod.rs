//! Configuration loading and parsing
//!
//! Defaults come from the embedded vehicle.toml, parsed at boot by the
//! core crate's no_std parser. Runtime parameter edits are persisted to
//! flash and laid over the defaults at boot.

pub mod persist;

pub use persist::{clear_params, load_params, save_params};
pub use spinguard_core::config::vehicle::{parse_config, EscConfig, VehicleConfig};
