//! Vehicle configuration parser
//!
//! A minimal TOML parser that handles only the subset used by
//! vehicle.toml. It does NOT support the full TOML spec.
//!
//! Supported features:
//! - Key = value pairs (integer, boolean)
//! - Single-line integer arrays: functions = [33, 34, 35, 36]
//! - [section] headers
//! - Comments (# ...)
//!
//! The firmware's build script validates the same file with the full
//! `toml` crate.

use alloc::vec::Vec;

use super::{ConfigError, MotorMap, ParamId, ParamTable, MAX_MOTORS};

/// Parse error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParseError {
    /// Unknown or malformed section header
    InvalidSection,
    /// Key not valid in its section
    UnknownKey,
    /// Value has the wrong type or is out of range
    InvalidValue,
    /// Required section never appeared
    MissingSection,
    /// Values parsed but do not form a valid configuration
    Config(ConfigError),
}

impl From<ConfigError> for ParseError {
    fn from(e: ConfigError) -> Self {
        ParseError::Config(e)
    }
}

/// Default ESC round resync gap (ms)
pub const DEFAULT_RESYNC_GAP_MS: u32 = 20;

/// ESC telemetry wiring
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EscConfig {
    /// Motor magnet poles
    pub poles: u8,
    /// Line idle time that starts a new ESC round (ms)
    pub resync_gap_ms: u32,
}

/// Everything vehicle.toml configures
#[derive(Debug, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct VehicleConfig {
    /// Parameter defaults
    pub params: ParamTable,
    pub motors: MotorMap,
    pub esc: EscConfig,
}

/// Current parsing context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Root,
    RpmCheck,
    EscTelemetry,
    Motors,
}

/// Parse TOML configuration into a VehicleConfig
pub fn parse_config(input: &str) -> Result<VehicleConfig, ParseError> {
    let mut params = ParamTable::new();
    let mut poles: Option<u8> = None;
    let mut resync_gap_ms = DEFAULT_RESYNC_GAP_MS;
    let mut functions: Option<Vec<u8>> = None;
    let mut sensors: Option<Vec<u8>> = None;
    let mut section = Section::Root;

    for line in input.lines() {
        let line = line.trim();

        // Skip empty lines and comments
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if line.starts_with('[') && line.ends_with(']') {
            section = parse_section_header(&line[1..line.len() - 1])?;
            continue;
        }

        let Some((key, value)) = parse_key_value(line) else {
            return Err(ParseError::InvalidValue);
        };

        match (section, key) {
            (Section::RpmCheck, "enable") => set_bool(&mut params, ParamId::Enable, value)?,
            (Section::RpmCheck, "delay_ms") => set_int(&mut params, ParamId::ArmDelay, value)?,
            (Section::RpmCheck, "min_rpm") => set_int(&mut params, ParamId::MinRpm, value)?,
            (Section::RpmCheck, "min_pwm") => set_int(&mut params, ParamId::MinPwm, value)?,
            (Section::EscTelemetry, "enable") => {
                set_bool(&mut params, ParamId::EscTelemetry, value)?
            }
            (Section::EscTelemetry, "poles") => {
                let p: u8 = parse_int(value)?;
                if p == 0 || p % 2 != 0 {
                    return Err(ParseError::InvalidValue);
                }
                poles = Some(p);
            }
            (Section::EscTelemetry, "resync_gap_ms") => resync_gap_ms = parse_int(value)?,
            (Section::Motors, "functions") => functions = Some(parse_int_array(value)?),
            (Section::Motors, "rpm_sensors") => sensors = Some(parse_int_array(value)?),
            _ => return Err(ParseError::UnknownKey),
        }
    }

    if let Some(id) = params.first_missing() {
        return Err(ConfigError::MissingParam(id).into());
    }

    let poles = poles.ok_or(ParseError::MissingSection)?;
    let functions = functions.ok_or(ParseError::MissingSection)?;
    let sensors = sensors.ok_or(ParseError::MissingSection)?;

    // Sensor ids index the telemetry hub
    if sensors.iter().any(|&s| s as usize >= MAX_MOTORS) {
        return Err(ParseError::InvalidValue);
    }

    Ok(VehicleConfig {
        params,
        motors: MotorMap::new(&functions, &sensors)?,
        esc: EscConfig {
            poles,
            resync_gap_ms,
        },
    })
}

/// Parse section header like "rpm_check"
fn parse_section_header(header: &str) -> Result<Section, ParseError> {
    match header.trim() {
        "rpm_check" => Ok(Section::RpmCheck),
        "esc_telemetry" => Ok(Section::EscTelemetry),
        "motors" => Ok(Section::Motors),
        _ => Err(ParseError::InvalidSection),
    }
}

/// Parse "key = value" line
fn parse_key_value(line: &str) -> Option<(&str, &str)> {
    let eq_pos = line.find('=')?;
    let key = line[..eq_pos].trim();
    let value = line[eq_pos + 1..].trim();

    // Remove inline comments
    let value = match value.find('#') {
        Some(hash_pos) => value[..hash_pos].trim(),
        None => value,
    };

    if key.is_empty() || value.is_empty() {
        return None;
    }

    Some((key, value))
}

/// Parse an integer value
fn parse_int<T: core::str::FromStr>(value: &str) -> Result<T, ParseError> {
    value
        .replace('_', "")
        .parse()
        .map_err(|_| ParseError::InvalidValue)
}

/// Parse a boolean value
fn parse_bool(value: &str) -> Result<bool, ParseError> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(ParseError::InvalidValue),
    }
}

/// Parse a single-line integer array like "[33, 34, 35]"
fn parse_int_array(value: &str) -> Result<Vec<u8>, ParseError> {
    let inner = value
        .strip_prefix('[')
        .and_then(|v| v.strip_suffix(']'))
        .ok_or(ParseError::InvalidValue)?;

    inner
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(parse_int::<u8>)
        .collect()
}

fn set_int(params: &mut ParamTable, id: ParamId, value: &str) -> Result<(), ParseError> {
    let value: u32 = parse_int(value)?;
    params.set(id, value)?;
    Ok(())
}

fn set_bool(params: &mut ParamTable, id: ParamId, value: &str) -> Result<(), ParseError> {
    params.set(id, parse_bool(value)? as u32)?;
    Ok(())
}
