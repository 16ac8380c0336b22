//! Build script for spinguard-firmware
//!
//! - Sets up linker search paths for memory.x
//! - Validates vehicle.toml at compile time

use std::env;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Monitored motors supported by the firmware
const MAX_MOTORS: usize = 8;

fn main() {
    setup_linker();
    validate_config();
}

/// Set up linker search paths for memory.x
fn setup_linker() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());

    let memory_x = include_bytes!("memory.x");
    let mut f = File::create(out_dir.join("memory.x")).unwrap();
    f.write_all(memory_x).unwrap();

    println!("cargo:rustc-link-search={}", out_dir.display());
    println!("cargo:rustc-link-arg-bins=--nmagic");
    println!("cargo:rustc-link-arg-bins=-Tlink.x");
    println!("cargo:rustc-link-arg-bins=-Tlink-rp.x");
    println!("cargo:rustc-link-arg-bins=-Tdefmt.x");

    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");
}

/// Validate vehicle.toml at compile time
///
/// The firmware's own parser only understands a subset of TOML and halts
/// on a bad value, so every problem it could hit is reported here first.
fn validate_config() {
    println!("cargo:rerun-if-changed=vehicle.toml");

    let config_path = Path::new("vehicle.toml");

    if !config_path.exists() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: vehicle.toml not found!                                  ║\n\
            ║                                                                  ║\n\
            ║  The firmware requires a vehicle.toml configuration file.        ║\n\
            ║  Please create one in the spinguard-firmware directory.          ║\n\
            ╚══════════════════════════════════════════════════════════════════╝\n"
        );
    }

    let config_content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => {
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Failed to read vehicle.toml                              ║\n\
                ║                                                                  ║\n\
                ║  Error: {:<56} ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                e
            );
        }
    };

    let config: toml::Value = match toml::from_str(&config_content) {
        Ok(value) => value,
        Err(e) => {
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Invalid TOML syntax in vehicle.toml                      ║\n\
                ╠══════════════════════════════════════════════════════════════════╣\n\
                {}\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                e
            );
        }
    };

    let mut errors = Vec::new();
    validate_rpm_check(&config, &mut errors);
    validate_esc_telemetry(&config, &mut errors);
    validate_motors(&config, &mut errors);

    if !errors.is_empty() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: Invalid vehicle configuration                            ║\n\
            ╠══════════════════════════════════════════════════════════════════╣\n\
            {}\n\
            ╚══════════════════════════════════════════════════════════════════╝\n",
            errors
                .iter()
                .map(|e| format!("║  • {:<62} ║", e))
                .collect::<Vec<_>>()
                .join("\n")
        );
    }
}

fn section<'a>(
    config: &'a toml::Value,
    name: &str,
    errors: &mut Vec<String>,
) -> Option<&'a toml::value::Table> {
    match config.get(name) {
        Some(toml::Value::Table(t)) => Some(t),
        Some(_) => {
            errors.push(format!("[{}] must be a table", name));
            None
        }
        None => {
            errors.push(format!("missing [{}] section", name));
            None
        }
    }
}

fn require_bool(table: &toml::value::Table, section: &str, key: &str, errors: &mut Vec<String>) {
    match table.get(key) {
        Some(toml::Value::Boolean(_)) => {}
        Some(_) => errors.push(format!("[{}] {} must be true or false", section, key)),
        None => errors.push(format!("[{}] missing '{}'", section, key)),
    }
}

fn require_int(
    table: &toml::value::Table,
    section: &str,
    key: &str,
    min: i64,
    max: i64,
    errors: &mut Vec<String>,
) -> Option<i64> {
    match table.get(key) {
        Some(toml::Value::Integer(v)) if (min..=max).contains(v) => Some(*v),
        Some(toml::Value::Integer(_)) => {
            errors.push(format!("[{}] {} must be {}-{}", section, key, min, max));
            None
        }
        Some(_) => {
            errors.push(format!("[{}] {} must be an integer", section, key));
            None
        }
        None => {
            errors.push(format!("[{}] missing '{}'", section, key));
            None
        }
    }
}

/// Validate the check parameter defaults
fn validate_rpm_check(config: &toml::Value, errors: &mut Vec<String>) {
    let Some(table) = section(config, "rpm_check", errors) else {
        return;
    };

    require_bool(table, "rpm_check", "enable", errors);
    require_int(table, "rpm_check", "delay_ms", 1000, 5000, errors);
    require_int(table, "rpm_check", "min_rpm", 0, 50_000, errors);
    require_int(table, "rpm_check", "min_pwm", 800, 2200, errors);
}

/// Validate the ESC telemetry settings
fn validate_esc_telemetry(config: &toml::Value, errors: &mut Vec<String>) {
    let Some(table) = section(config, "esc_telemetry", errors) else {
        return;
    };

    require_bool(table, "esc_telemetry", "enable", errors);
    if let Some(poles) = require_int(table, "esc_telemetry", "poles", 2, 254, errors) {
        if poles % 2 != 0 {
            errors.push("[esc_telemetry] poles must be even".to_string());
        }
    }
    if table.contains_key("resync_gap_ms") {
        require_int(table, "esc_telemetry", "resync_gap_ms", 2, 1000, errors);
    }
}

/// Validate the motor channel lists
fn validate_motors(config: &toml::Value, errors: &mut Vec<String>) {
    let Some(table) = section(config, "motors", errors) else {
        return;
    };

    let mut list = |key: &str, min: i64, max: i64| -> Option<usize> {
        match table.get(key) {
            Some(toml::Value::Array(items)) => {
                for item in items {
                    match item.as_integer() {
                        Some(v) if (min..=max).contains(&v) => {}
                        _ => errors.push(format!(
                            "[motors] {} entries must be integers {}-{}",
                            key, min, max
                        )),
                    }
                }
                Some(items.len())
            }
            Some(_) => {
                errors.push(format!("[motors] {} must be an array", key));
                None
            }
            None => {
                errors.push(format!("[motors] missing '{}'", key));
                None
            }
        }
    };

    let functions = list("functions", 1, 255);
    let sensors = list("rpm_sensors", 0, MAX_MOTORS as i64 - 1);

    if let (Some(functions), Some(sensors)) = (functions, sensors) {
        if functions != sensors {
            errors.push(format!(
                "[motors] {} functions but {} rpm_sensors",
                functions, sensors
            ));
        }
        if functions == 0 {
            errors.push("[motors] at least one motor is required".to_string());
        }
        if functions > MAX_MOTORS {
            errors.push(format!("[motors] at most {} motors", MAX_MOTORS));
        }
    }
}
