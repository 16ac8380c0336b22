//! Check parameters
//!
//! Parameters are plain integers identified by [`ParamId`], in the style of
//! autopilot parameter tables: booleans are stored as 0/1. The monitor
//! re-reads them through [`ParamSource`] on every cycle, so a value tuned
//! at runtime takes effect on the next evaluation.

use core::ops::RangeInclusive;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Number of parameters in the table
pub const PARAM_COUNT: usize = 5;

/// Parameter identifiers
///
/// The discriminant doubles as the wire index used by `ParamSet` messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ParamId {
    /// Check enabled (0/1)
    Enable = 0,
    /// Spin-up delay after arming (ms)
    ArmDelay = 1,
    /// Minimum RPM for a commanded motor
    MinRpm = 2,
    /// PWM above which a motor is expected to turn
    MinPwm = 3,
    /// ESC telemetry hardware enabled (0/1)
    EscTelemetry = 4,
}

impl ParamId {
    /// All parameters in wire-index order
    pub const ALL: [ParamId; PARAM_COUNT] = [
        ParamId::Enable,
        ParamId::ArmDelay,
        ParamId::MinRpm,
        ParamId::MinPwm,
        ParamId::EscTelemetry,
    ];

    /// Table slot / wire index
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Parameter name as shown to the operator
    pub const fn name(self) -> &'static str {
        match self {
            ParamId::Enable => "RPM_CHK_ENABLE",
            ParamId::ArmDelay => "RPM_CHK_DELAY",
            ParamId::MinRpm => "RPM_CHK_MIN_RPM",
            ParamId::MinPwm => "RPM_CHK_MIN_PWM",
            ParamId::EscTelemetry => "ESC_TLM_ENABLE",
        }
    }

    /// Valid value range (inclusive)
    pub const fn range(self) -> RangeInclusive<u32> {
        match self {
            ParamId::Enable | ParamId::EscTelemetry => RangeInclusive::new(0, 1),
            ParamId::ArmDelay => RangeInclusive::new(1000, 5000),
            ParamId::MinRpm => RangeInclusive::new(0, 50_000),
            ParamId::MinPwm => RangeInclusive::new(800, 2200),
        }
    }
}

/// Read access to live parameter values
///
/// Implementations must return the latest externally set value and have no
/// side effects. `None` means the parameter has never been set.
pub trait ParamSource {
    fn get(&self, id: ParamId) -> Option<u32>;
}

/// Fixed-size in-memory parameter table
///
/// `set` enforces each parameter's range, so a table can only ever hold
/// valid values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ParamTable {
    values: [Option<u32>; PARAM_COUNT],
}

impl ParamTable {
    /// Create an empty table (no parameter set)
    pub const fn new() -> Self {
        Self {
            values: [None; PARAM_COUNT],
        }
    }

    /// Set a parameter, rejecting values outside its range
    pub fn set(&mut self, id: ParamId, value: u32) -> Result<(), ConfigError> {
        if !id.range().contains(&value) {
            return Err(ConfigError::OutOfRange(id));
        }
        self.values[id.index()] = Some(value);
        Ok(())
    }

    /// First parameter that has not been set, if any
    pub fn first_missing(&self) -> Option<ParamId> {
        ParamId::ALL
            .iter()
            .copied()
            .find(|id| self.values[id.index()].is_none())
    }
}

impl ParamSource for ParamTable {
    fn get(&self, id: ParamId) -> Option<u32> {
        self.values[id.index()]
    }
}

/// Snapshot of all check parameters for one evaluation cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CheckParams {
    /// Check enabled
    pub enabled: bool,
    /// Spin-up delay after arming (ms)
    pub arm_delay_ms: u32,
    /// Minimum RPM for a commanded motor
    pub min_rpm: u32,
    /// PWM above which a motor is checked
    pub min_pwm: u32,
    /// ESC telemetry hardware enabled
    pub esc_telemetry_enabled: bool,
}

impl CheckParams {
    /// Read every parameter from `source`
    ///
    /// Fails on the first missing or out-of-range value, in wire-index
    /// order.
    pub fn load<S: ParamSource + ?Sized>(source: &S) -> Result<Self, ConfigError> {
        Ok(Self {
            enabled: read(source, ParamId::Enable)? != 0,
            arm_delay_ms: read(source, ParamId::ArmDelay)?,
            min_rpm: read(source, ParamId::MinRpm)?,
            min_pwm: read(source, ParamId::MinPwm)?,
            esc_telemetry_enabled: read(source, ParamId::EscTelemetry)? != 0,
        })
    }
}

fn read<S: ParamSource + ?Sized>(source: &S, id: ParamId) -> Result<u32, ConfigError> {
    let value = source.get(id).ok_or(ConfigError::MissingParam(id))?;
    if id.range().contains(&value) {
        Ok(value)
    } else {
        Err(ConfigError::OutOfRange(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_table() -> ParamTable {
        let mut table = ParamTable::new();
        table.set(ParamId::Enable, 1).unwrap();
        table.set(ParamId::ArmDelay, 2000).unwrap();
        table.set(ParamId::MinRpm, 100).unwrap();
        table.set(ParamId::MinPwm, 1080).unwrap();
        table.set(ParamId::EscTelemetry, 1).unwrap();
        table
    }

    #[test]
    fn test_load_complete_table() {
        let params = CheckParams::load(&full_table()).unwrap();
        assert!(params.enabled);
        assert!(params.esc_telemetry_enabled);
        assert_eq!(params.arm_delay_ms, 2000);
        assert_eq!(params.min_rpm, 100);
        assert_eq!(params.min_pwm, 1080);
    }

    #[test]
    fn test_missing_param_is_reported() {
        let mut table = ParamTable::new();
        table.set(ParamId::Enable, 1).unwrap();
        assert_eq!(table.first_missing(), Some(ParamId::ArmDelay));
        assert_eq!(
            CheckParams::load(&table),
            Err(ConfigError::MissingParam(ParamId::ArmDelay))
        );
        assert_eq!(full_table().first_missing(), None);
    }

    #[test]
    fn test_set_rejects_out_of_range() {
        let mut table = full_table();
        assert_eq!(
            table.set(ParamId::ArmDelay, 500),
            Err(ConfigError::OutOfRange(ParamId::ArmDelay))
        );
        assert_eq!(
            table.set(ParamId::Enable, 2),
            Err(ConfigError::OutOfRange(ParamId::Enable))
        );
        // Previous value survives a rejected write
        assert_eq!(table.get(ParamId::ArmDelay), Some(2000));
    }

    #[test]
    fn test_load_checks_foreign_sources() {
        struct Fixed;
        impl ParamSource for Fixed {
            fn get(&self, id: ParamId) -> Option<u32> {
                match id {
                    ParamId::ArmDelay => Some(9000),
                    _ => Some(1),
                }
            }
        }
        assert_eq!(
            CheckParams::load(&Fixed),
            Err(ConfigError::OutOfRange(ParamId::ArmDelay))
        );
    }

    #[test]
    fn test_table_slots_follow_all_order() {
        for (slot, id) in ParamId::ALL.iter().enumerate() {
            assert_eq!(id.index(), slot);
            assert!(id.name().starts_with("RPM_CHK_") || id.name() == "ESC_TLM_ENABLE");
        }
        assert_eq!(ParamId::ALL.len(), PARAM_COUNT);
    }
}
