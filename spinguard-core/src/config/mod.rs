//! Configuration types
//!
//! Tunable check parameters, their persisted form, the fixed motor
//! channel mapping and the vehicle.toml parser.

pub mod channels;
pub mod params;
pub mod stored;
#[cfg(feature = "alloc")]
pub mod vehicle;

pub use channels::*;
pub use params::*;
pub use stored::*;

/// Configuration errors
///
/// Any of these at startup is fatal: the check must not run with a partial
/// or inconsistent configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// A required parameter has never been set
    MissingParam(ParamId),
    /// A parameter value is outside its valid range
    OutOfRange(ParamId),
    /// Unknown parameter name or index
    UnknownParam,
    /// Number of output functions differs from number of RPM sensors
    ChannelCountMismatch { functions: usize, sensors: usize },
    /// No motor channels configured
    NoMotors,
    /// More motor channels than `MAX_MOTORS`
    TooManyMotors,
}
