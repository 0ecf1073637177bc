//! Build script for equinox-firmware
//!
//! - Sets up linker search paths for memory.x
//! - Validates mount.toml at compile time

use std::env;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Hardware timer rate the tick period is counted in
const HW_TICKS_PER_SECOND: f64 = 16_000_000.0;

/// Slot table size compiled into the core
const MAX_PEC_SLOTS: i64 = 1024;

fn main() {
    setup_linker();
    validate_config();
}

/// Set up linker search paths for memory.x
fn setup_linker() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());

    // Copy memory.x to the output directory
    let memory_x = include_bytes!("memory.x");
    let mut f = File::create(out_dir.join("memory.x")).unwrap();
    f.write_all(memory_x).unwrap();

    // Tell rustc where to find memory.x
    println!("cargo:rustc-link-search={}", out_dir.display());

    // Re-run if memory.x changes
    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");
}

/// Validate mount.toml configuration at compile time
fn validate_config() {
    println!("cargo:rerun-if-changed=mount.toml");

    let config_path = Path::new("mount.toml");

    if !config_path.exists() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: mount.toml not found!                                    ║\n\
            ║                                                                  ║\n\
            ║  The firmware embeds a mount.toml as its default configuration.  ║\n\
            ║  Please create one in the equinox-firmware directory.            ║\n\
            ╚══════════════════════════════════════════════════════════════════╝\n"
        );
    }

    let config_content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => {
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Failed to read mount.toml                                ║\n\
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
            let error_msg = e.to_string();
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Invalid TOML syntax in mount.toml                        ║\n\
                ╠══════════════════════════════════════════════════════════════════╣\n\
                ║                                                                  ║\n\
                {}\n\
                ║                                                                  ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                format_error_lines(&error_msg)
            );
        }
    };

    // The firmware parser only knows these sections
    validate_sections(&config);

    let tick_period = validate_mount(&config);
    validate_axis(&config, "axis1", tick_period);
    validate_axis(&config, "axis2", tick_period);
    validate_limits(&config);
    validate_pec(&config);
    validate_guide(&config);

    println!("cargo:warning=mount.toml validated successfully");
}

/// Format error message lines with box drawing
fn format_error_lines(msg: &str) -> String {
    msg.lines()
        .map(|line| {
            let truncated = if line.len() > 64 {
                format!("{}...", &line[..61])
            } else {
                line.to_string()
            };
            format!("║  {:<64} ║", truncated)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Abort the build listing every problem found in one section
fn fail_if_any(title: &str, errors: &[String]) {
    if errors.is_empty() {
        return;
    }
    panic!(
        "\n\
        ╔══════════════════════════════════════════════════════════════════╗\n\
        ║  ERROR: {:<56} ║\n\
        ╠══════════════════════════════════════════════════════════════════╣\n\
        {}\n\
        ╚══════════════════════════════════════════════════════════════════╝\n",
        title,
        errors
            .iter()
            .map(|e| format!("║  • {:<62} ║", e))
            .collect::<Vec<_>>()
            .join("\n")
    );
}

/// Numeric value, integer or float
fn number(table: &toml::Table, key: &str) -> Option<f64> {
    match table.get(key) {
        Some(toml::Value::Integer(i)) => Some(*i as f64),
        Some(toml::Value::Float(f)) => Some(*f),
        _ => None,
    }
}

/// Check that an optional string key holds one of `allowed`
fn check_choice(
    table: &toml::Table,
    section: &str,
    key: &str,
    allowed: &[&str],
    errors: &mut Vec<String>,
) {
    match table.get(key) {
        None => {}
        Some(toml::Value::String(s)) if allowed.contains(&s.as_str()) => {}
        Some(_) => errors.push(format!(
            "[{}] {} must be one of {}",
            section,
            key,
            allowed.join(", ")
        )),
    }
}

/// Check that an optional numeric key is a number
fn check_number(table: &toml::Table, section: &str, key: &str, errors: &mut Vec<String>) {
    if table.contains_key(key) && number(table, key).is_none() {
        errors.push(format!("[{}] {} must be a number", section, key));
    }
}

/// Check that an optional key is a boolean
fn check_bool(table: &toml::Table, section: &str, key: &str, errors: &mut Vec<String>) {
    if let Some(value) = table.get(key) {
        if !value.is_bool() {
            errors.push(format!("[{}] {} must be true or false", section, key));
        }
    }
}

fn section<'a>(config: &'a toml::Value, name: &str) -> Option<&'a toml::Table> {
    config.get(name).and_then(|v| v.as_table())
}

/// Validate that required sections exist and nothing unknown is present
fn validate_sections(config: &toml::Value) {
    const KNOWN: [&str; 8] = [
        "mount", "axis1", "axis2", "limits", "pec", "guide", "site", "pointing",
    ];
    let mut errors = Vec::new();

    for required in ["mount", "axis1", "axis2"] {
        if section(config, required).is_none() {
            errors.push(format!("Missing [{}] section", required));
        }
    }

    if let Some(root) = config.as_table() {
        for (name, value) in root {
            if !value.is_table() {
                errors.push(format!("'{}' must be inside a section", name));
            } else if !KNOWN.contains(&name.as_str()) {
                errors.push(format!("Unknown section [{}]", name));
            }
        }
    }

    fail_if_any("Invalid sections in mount.toml", &errors);
}

/// Validate [mount], returning the tick period in effect
fn validate_mount(config: &toml::Value) -> f64 {
    let Some(mount) = section(config, "mount") else {
        return 1600.0;
    };
    let mut errors = Vec::new();

    check_choice(
        mount,
        "mount",
        "kind",
        &["gem", "german_equatorial", "fork", "altaz", "alt_azimuth"],
        &mut errors,
    );
    check_choice(
        mount,
        "mount",
        "meridian_flip",
        &["never", "align", "if_aligned", "always"],
        &mut errors,
    );
    check_choice(
        mount,
        "mount",
        "preferred_pier_side",
        &["best", "east", "west"],
        &mut errors,
    );
    check_choice(
        mount,
        "mount",
        "rate_compensation",
        &["none", "refraction_ra", "refraction_both", "full_ra", "full_both"],
        &mut errors,
    );
    check_choice(
        mount,
        "mount",
        "tracking_rate",
        &["sidereal", "solar", "lunar", "king"],
        &mut errors,
    );
    for key in ["pause_at_home", "auto_meridian_flip"] {
        check_bool(mount, "mount", key, &mut errors);
    }
    for key in ["home_axis1_deg", "home_axis2_deg", "slew_tolerance_steps"] {
        check_number(mount, "mount", key, &mut errors);
    }

    let tick_period = number(mount, "tick_period").unwrap_or(1600.0);
    if tick_period < 1.0 {
        errors.push("[mount] tick_period must be at least 1".to_string());
    }

    fail_if_any("Invalid [mount] configuration", &errors);
    tick_period
}

/// Validate one [axisN] section
fn validate_axis(config: &toml::Value, name: &str, tick_period: f64) {
    let Some(axis) = section(config, name) else {
        return;
    };
    let mut errors = Vec::new();

    let steps_per_degree = number(axis, "steps_per_degree").unwrap_or(12_800.0);
    if steps_per_degree <= 0.0 {
        errors.push(format!("[{}] steps_per_degree must be positive", name));
    }

    let goto_code = match axis.get("microstep_code_goto") {
        Some(toml::Value::String(s)) if s == "none" => false,
        Some(toml::Value::Integer(code)) if (0..=7).contains(code) => true,
        None => true,
        Some(_) => {
            errors.push(format!(
                "[{}] microstep_code_goto must be 0-7 or \"none\"",
                name
            ));
            true
        }
    };
    if let Some(code) = number(axis, "microstep_code") {
        if !(0.0..=7.0).contains(&code) {
            errors.push(format!("[{}] microstep_code must be 0-7", name));
        }
    }

    let multiplier = match axis.get("goto_step_multiplier") {
        Some(toml::Value::Integer(m)) => *m,
        Some(_) => {
            errors.push(format!("[{}] goto_step_multiplier must be an integer", name));
            1
        }
        None => 8,
    };
    if !(1..=256).contains(&multiplier) || multiplier.count_ones() != 1 {
        errors.push(format!(
            "[{}] goto_step_multiplier must be a power of two up to 256",
            name
        ));
    }
    if !goto_code && multiplier > 1 {
        errors.push(format!(
            "[{}] goto_step_multiplier needs a microstep_code_goto",
            name
        ));
    }
    let multiplier = if goto_code { multiplier as f64 } else { 1.0 };

    let max_slew = number(axis, "max_slew_deg_per_s").unwrap_or(4.0);
    let ticks_per_second = HW_TICKS_PER_SECOND / tick_period.max(1.0);
    let pulses_per_second = max_slew * steps_per_degree / multiplier;
    if pulses_per_second > ticks_per_second {
        errors.push(format!(
            "[{}] max slew needs {:.0} pulses/s, tick rate is {:.0}",
            name, pulses_per_second, ticks_per_second
        ));
    }

    let min_deg = number(axis, "min_deg").unwrap_or(-270.0);
    let max_deg = number(axis, "max_deg").unwrap_or(270.0);
    if min_deg >= max_deg || min_deg < -360.0 || max_deg > 360.0 {
        errors.push(format!(
            "[{}] travel must satisfy -360 <= min_deg < max_deg <= 360",
            name
        ));
    }

    check_number(axis, name, "backlash_steps", &mut errors);
    check_number(axis, name, "accel_distance_deg", &mut errors);
    check_bool(axis, name, "reverse", &mut errors);

    fail_if_any(&format!("Invalid [{}] configuration", name), &errors);
}

/// Validate [limits]
fn validate_limits(config: &toml::Value) {
    let Some(limits) = section(config, "limits") else {
        return;
    };
    let mut errors = Vec::new();

    let min_alt = number(limits, "min_altitude_deg").unwrap_or(-10.0);
    let max_alt = number(limits, "max_altitude_deg").unwrap_or(90.0);
    if min_alt >= max_alt {
        errors.push("[limits] min_altitude_deg must be below max_altitude_deg".to_string());
    }

    for key in ["min_altitude_deg", "max_altitude_deg"] {
        if let Some(value) = number(limits, key) {
            if value.abs() > 90.0 {
                errors.push(format!("[limits] {} must be within ±90", key));
            }
        }
    }
    for key in ["past_meridian_east_deg", "past_meridian_west_deg", "under_pole_deg"] {
        if let Some(value) = number(limits, key) {
            if !(0.0..=180.0).contains(&value) {
                errors.push(format!("[limits] {} must be 0-180", key));
            }
        }
    }

    fail_if_any("Invalid [limits] configuration", &errors);
}

/// Validate [pec]
fn validate_pec(config: &toml::Value) {
    let Some(pec) = section(config, "pec") else {
        return;
    };
    let mut errors = Vec::new();

    let rotation = match pec.get("steps_per_worm_rotation") {
        Some(toml::Value::Integer(steps)) => *steps,
        Some(_) => {
            errors.push("[pec] steps_per_worm_rotation must be an integer".to_string());
            0
        }
        None => 32_000,
    };
    let slots = match pec.get("slots") {
        Some(toml::Value::Integer(slots)) => *slots,
        Some(_) => {
            errors.push("[pec] slots must be an integer".to_string());
            0
        }
        None => 640,
    };

    if !(1..=MAX_PEC_SLOTS).contains(&slots) {
        errors.push(format!("[pec] slots must be 1-{}", MAX_PEC_SLOTS));
    } else if rotation <= 0 || rotation % slots != 0 {
        errors.push("[pec] slots must divide steps_per_worm_rotation".to_string());
    }

    check_bool(pec, "pec", "has_index_sensor", &mut errors);
    check_bool(pec, "pec", "play_after_record", &mut errors);

    fail_if_any("Invalid [pec] configuration", &errors);
}

/// Validate [guide]
fn validate_guide(config: &toml::Value) {
    let Some(guide) = section(config, "guide") else {
        return;
    };
    let mut errors = Vec::new();

    for key in ["rate", "pulse_rate"] {
        match guide.get(key) {
            None => {}
            Some(toml::Value::Integer(index)) if (0..=9).contains(index) => {}
            Some(_) => errors.push(format!("[guide] {} must be a rate index 0-9", key)),
        }
    }

    fail_if_any("Invalid [guide] configuration", &errors);
}
