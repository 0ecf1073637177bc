//! Minimal TOML parser for the mount configuration
//!
//! Handles only the subset needed for `mount.toml` and allocates nothing,
//! so it runs on the target at boot as well as in host tests. It does NOT
//! support the full TOML spec.
//!
//! Supported features:
//! - Key = value pairs (string, integer, float, boolean)
//! - [section] headers
//! - Comments (# ...)
//!
//! Unknown keys are ignored so newer files still load on older firmware.

use super::types::MountConfig;
use crate::goto::MountKind;
use crate::guide::GuideRate;
use crate::motion::{RateCompensationMode, TrackingRate};
use crate::state::{MeridianFlipPolicy, PreferredPierSide};

/// Parse error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParseError {
    /// Unknown or malformed section header
    InvalidSection,
    /// Invalid value type
    InvalidValue,
    /// Line is neither a section, a comment, nor `key = value`
    InvalidLine,
}

/// Current parsing context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Root,
    Mount,
    Axis1,
    Axis2,
    Limits,
    Pec,
    Guide,
    Site,
    Pointing,
}

/// Parse TOML configuration on top of the compiled defaults
pub fn parse_config(input: &str) -> Result<MountConfig, ParseError> {
    let mut config = MountConfig::default();
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

        let (key, value) = parse_key_value(line).ok_or(ParseError::InvalidLine)?;
        apply_value(section, key, value, &mut config)?;
    }

    Ok(config)
}

/// Parse section header like "mount" or "axis1"
fn parse_section_header(header: &str) -> Result<Section, ParseError> {
    match header.trim() {
        "mount" => Ok(Section::Mount),
        "axis1" | "axis.primary" => Ok(Section::Axis1),
        "axis2" | "axis.secondary" => Ok(Section::Axis2),
        "limits" => Ok(Section::Limits),
        "pec" => Ok(Section::Pec),
        "guide" => Ok(Section::Guide),
        "site" => Ok(Section::Site),
        "pointing" => Ok(Section::Pointing),
        _ => Err(ParseError::InvalidSection),
    }
}

fn apply_value(
    section: Section,
    key: &str,
    value: &str,
    config: &mut MountConfig,
) -> Result<(), ParseError> {
    match section {
        Section::Mount => match key {
            "kind" => config.kind = parse_mount_kind(value)?,
            "tick_period" => config.tick_period = parse_num(value)?,
            "home_axis1_deg" => config.home_deg[0] = parse_num(value)?,
            "home_axis2_deg" => config.home_deg[1] = parse_num(value)?,
            "slew_tolerance_steps" => config.slew_tolerance_steps = parse_num(value)?,
            "meridian_flip" => config.meridian_flip = parse_flip_policy(value)?,
            "preferred_pier_side" => config.preferred_pier_side = parse_pier_side(value)?,
            "pause_at_home" => config.pause_at_home = parse_bool(value)?,
            "auto_meridian_flip" => config.auto_meridian_flip = parse_bool(value)?,
            "rate_compensation" => config.rate_compensation = parse_compensation(value)?,
            "tracking_rate" => config.tracking_rate = parse_tracking_rate(value)?,
            _ => {}
        },
        Section::Axis1 | Section::Axis2 => {
            let axis = if section == Section::Axis1 {
                &mut config.axis1
            } else {
                &mut config.axis2
            };
            match key {
                "steps_per_degree" => axis.steps_per_degree = parse_num(value)?,
                "backlash_steps" => axis.backlash_steps = parse_num(value)?,
                "microstep_code" => axis.microstep_code = parse_num(value)?,
                "microstep_code_goto" => {
                    axis.microstep_code_goto = match parse_string(value) {
                        "none" => None,
                        v => Some(parse_num(v)?),
                    }
                }
                "goto_step_multiplier" => axis.goto_step_multiplier = parse_num(value)?,
                "max_slew_deg_per_s" => axis.max_slew_deg_per_s = parse_num(value)?,
                "accel_distance_deg" => axis.accel_distance_deg = parse_num(value)?,
                "reverse" => axis.reverse = parse_bool(value)?,
                "min_deg" => axis.min_deg = parse_num(value)?,
                "max_deg" => axis.max_deg = parse_num(value)?,
                _ => {}
            }
        }
        Section::Limits => match key {
            "min_altitude_deg" => config.limits.min_altitude_deg = parse_num(value)?,
            "max_altitude_deg" => config.limits.max_altitude_deg = parse_num(value)?,
            "past_meridian_east_deg" => config.limits.past_meridian_east_deg = parse_num(value)?,
            "past_meridian_west_deg" => config.limits.past_meridian_west_deg = parse_num(value)?,
            "under_pole_deg" => config.limits.under_pole_deg = parse_num(value)?,
            _ => {}
        },
        Section::Pec => match key {
            "steps_per_worm_rotation" => config.pec.steps_per_worm_rotation = parse_num(value)?,
            "slots" => config.pec.slots = parse_num(value)?,
            "has_index_sensor" => config.pec.has_index_sensor = parse_bool(value)?,
            "play_after_record" => config.pec.play_after_record = parse_bool(value)?,
            _ => {}
        },
        Section::Guide => match key {
            "rate" => config.guide.rate = parse_guide_rate(value)?,
            "pulse_rate" => config.guide.pulse_rate = parse_guide_rate(value)?,
            _ => {}
        },
        Section::Site => match key {
            "latitude_deg" => config.site.latitude_deg = parse_num(value)?,
            "longitude_deg" => config.site.longitude_deg = parse_num(value)?,
            _ => {}
        },
        Section::Pointing => match key {
            "polar_altitude_arcsec" => config.pointing.polar_altitude_arcsec = parse_num(value)?,
            "polar_azimuth_arcsec" => config.pointing.polar_azimuth_arcsec = parse_num(value)?,
            _ => {}
        },
        Section::Root => {
            // No root-level keys
        }
    }

    Ok(())
}

/// Parse "key = value" line
fn parse_key_value(line: &str) -> Option<(&str, &str)> {
    let eq_pos = line.find('=')?;
    let key = line[..eq_pos].trim();
    let value = line[eq_pos + 1..].trim();

    // Remove inline comments
    let value = if let Some(hash_pos) = value.find('#') {
        // Make sure # is not inside a string
        let quote_count = value[..hash_pos].matches('"').count();
        if quote_count % 2 == 0 {
            value[..hash_pos].trim()
        } else {
            value
        }
    } else {
        value
    };

    if key.is_empty() || value.is_empty() {
        return None;
    }

    Some((key, value))
}

/// Parse a string value (removes quotes)
fn parse_string(value: &str) -> &str {
    if value.starts_with('"') && value.ends_with('"') && value.len() >= 2 {
        &value[1..value.len() - 1]
    } else {
        value
    }
}

/// Parse an integer or float value
fn parse_num<T: core::str::FromStr>(value: &str) -> Result<T, ParseError> {
    parse_string(value)
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

fn parse_mount_kind(value: &str) -> Result<MountKind, ParseError> {
    match parse_string(value) {
        "gem" | "german_equatorial" => Ok(MountKind::GermanEquatorial),
        "fork" => Ok(MountKind::Fork),
        "altaz" | "alt_azimuth" => Ok(MountKind::AltAzimuth),
        _ => Err(ParseError::InvalidValue),
    }
}

fn parse_flip_policy(value: &str) -> Result<MeridianFlipPolicy, ParseError> {
    match parse_string(value) {
        "never" => Ok(MeridianFlipPolicy::Never),
        "align" | "if_aligned" => Ok(MeridianFlipPolicy::IfAligned),
        "always" => Ok(MeridianFlipPolicy::Always),
        _ => Err(ParseError::InvalidValue),
    }
}

fn parse_pier_side(value: &str) -> Result<PreferredPierSide, ParseError> {
    match parse_string(value) {
        "best" => Ok(PreferredPierSide::Best),
        "east" => Ok(PreferredPierSide::East),
        "west" => Ok(PreferredPierSide::West),
        _ => Err(ParseError::InvalidValue),
    }
}

fn parse_compensation(value: &str) -> Result<RateCompensationMode, ParseError> {
    match parse_string(value) {
        "none" => Ok(RateCompensationMode::None),
        "refraction_ra" => Ok(RateCompensationMode::RefractionRa),
        "refraction_both" => Ok(RateCompensationMode::RefractionBoth),
        "full_ra" => Ok(RateCompensationMode::FullRa),
        "full_both" => Ok(RateCompensationMode::FullBoth),
        _ => Err(ParseError::InvalidValue),
    }
}

fn parse_tracking_rate(value: &str) -> Result<TrackingRate, ParseError> {
    match parse_string(value) {
        "sidereal" => Ok(TrackingRate::Sidereal),
        "solar" => Ok(TrackingRate::Solar),
        "lunar" => Ok(TrackingRate::Lunar),
        "king" => Ok(TrackingRate::King),
        _ => Err(ParseError::InvalidValue),
    }
}

/// Guide rates are given by table index (0 = 0.25x .. 9 = max)
fn parse_guide_rate(value: &str) -> Result<GuideRate, ParseError> {
    let index: u8 = parse_num(value)?;
    GuideRate::from_index(index).ok_or(ParseError::InvalidValue)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input_gives_defaults() {
        assert_eq!(parse_config("").unwrap(), MountConfig::default());
    }

    #[test]
    fn test_parse_section_header() {
        assert_eq!(parse_section_header("mount").unwrap(), Section::Mount);
        assert_eq!(parse_section_header(" axis2 ").unwrap(), Section::Axis2);
        assert_eq!(
            parse_section_header("heater"),
            Err(ParseError::InvalidSection)
        );
    }

    #[test]
    fn test_parse_key_value_strips_comments() {
        assert_eq!(
            parse_key_value("slots = 640 # one per second"),
            Some(("slots", "640"))
        );
        assert_eq!(
            parse_key_value("kind = \"gem#1\""),
            Some(("kind", "\"gem#1\""))
        );
        assert_eq!(parse_key_value("novalue ="), None);
    }

    #[test]
    fn test_parse_full_config() {
        let input = r#"
# Example mount
[mount]
kind = "fork"
tick_period = 3200
meridian_flip = "never"
preferred_pier_side = "east"
pause_at_home = true
rate_compensation = "refraction_both"
tracking_rate = "lunar"

[axis1]
steps_per_degree = 6400.5
backlash_steps = 12
microstep_code_goto = "none"
goto_step_multiplier = 1
reverse = true

[axis2]
max_slew_deg_per_s = 2.5

[limits]
min_altitude_deg = -5
past_meridian_west_deg = 7.5

[pec]
slots = 320
has_index_sensor = false

[guide]
rate = 5
pulse_rate = 1

[site]
latitude_deg = -33.9
longitude_deg = 18.4

[pointing]
polar_altitude_arcsec = 120
"#;
        let config = parse_config(input).unwrap();
        assert_eq!(config.kind, MountKind::Fork);
        assert_eq!(config.tick_period, 3200);
        assert_eq!(config.meridian_flip, MeridianFlipPolicy::Never);
        assert_eq!(config.preferred_pier_side, PreferredPierSide::East);
        assert!(config.pause_at_home);
        assert_eq!(config.rate_compensation, RateCompensationMode::RefractionBoth);
        assert_eq!(config.tracking_rate, TrackingRate::Lunar);
        assert_eq!(config.axis1.steps_per_degree, 6400.5);
        assert_eq!(config.axis1.backlash_steps, 12);
        assert_eq!(config.axis1.microstep_code_goto, None);
        assert!(config.axis1.reverse);
        assert_eq!(config.axis2.max_slew_deg_per_s, 2.5);
        assert_eq!(config.limits.min_altitude_deg, -5.0);
        assert_eq!(config.limits.past_meridian_west_deg, 7.5);
        assert_eq!(config.pec.slots, 320);
        assert!(!config.pec.has_index_sensor);
        assert_eq!(config.guide.rate, GuideRate::X8);
        assert_eq!(config.guide.pulse_rate, GuideRate::Half);
        assert_eq!(config.site.latitude_deg, -33.9);
        assert_eq!(config.pointing.polar_altitude_arcsec, 120.0);
    }

    #[test]
    fn test_invalid_values() {
        assert_eq!(
            parse_config("[mount]\nkind = \"hexapod\""),
            Err(ParseError::InvalidValue)
        );
        assert_eq!(
            parse_config("[guide]\nrate = 12"),
            Err(ParseError::InvalidValue)
        );
        assert_eq!(
            parse_config("[pec]\nhas_index_sensor = yes"),
            Err(ParseError::InvalidValue)
        );
        assert_eq!(parse_config("[mount]\njunk"), Err(ParseError::InvalidLine));
    }
}
