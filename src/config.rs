use std::{io, path::Path, str::FromStr};

use ini::Ini;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("parsing .ini file: `{0}`")]
    ParseError(#[from] ini::Error),
    #[error("reading config file: `{0}`")]
    Io(#[from] io::Error),
}

/// Slider path baking parameters
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct CurveConfig {
    /// Parametric samples taken per unit of control polygon length
    pub steps_per_unit: f64,
    /// Interior points turning less than this (as `|sin|`) get pruned
    pub angle_threshold: f64,
    /// Forward difference step used for direction queries
    pub direction_epsilon: f64,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SliderConfig {
    /// Judgment circle grows up to `radius * follow_radius_multiplier`
    pub follow_radius_multiplier: f64,
    /// Scale change per millisecond
    pub ball_pulse_rate: f64,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FadeConfig {
    pub note_fadeout_ms: f64,
    pub slider_fadeout_ms: f64,
    pub spinner_fadeout_ms: f64,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Config {
    pub curve: CurveConfig,
    pub slider: SliderConfig,
    pub fade: FadeConfig,
}

impl Default for CurveConfig {
    fn default() -> Self {
        Self {
            steps_per_unit: 100.0,
            angle_threshold: 0.02,
            direction_epsilon: 0.001,
        }
    }
}

impl Default for SliderConfig {
    fn default() -> Self {
        Self {
            follow_radius_multiplier: 2.4,
            ball_pulse_rate: 0.01,
        }
    }
}

impl Default for FadeConfig {
    fn default() -> Self {
        Self {
            note_fadeout_ms: 60.0,
            slider_fadeout_ms: 80.0,
            spinner_fadeout_ms: 120.0,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            curve: CurveConfig::default(),
            slider: SliderConfig::default(),
            fade: FadeConfig::default(),
        }
    }
}

fn read_field<T: FromStr>(ini: &Ini, section: &str, key: &str, default: T) -> T {
    match ini.get_from(Some(section), key) {
        Some(value) => value.trim().parse().unwrap_or_else(|_| {
            tracing::warn!("Malformed config value {section}.{key} = `{value}`, using default");
            default
        }),
        None => default,
    }
}

impl Config {
    /// Parses a `judge.ini`, any absent or malformed field keeps its default
    pub fn parse(bytes: &[u8]) -> Result<Self, ConfigError> {
        let ini = Ini::read_from(&mut io::Cursor::new(bytes))?;
        let d = Self::default();

        let curve = CurveConfig {
            steps_per_unit: read_field(&ini, "Curve", "StepsPerUnit", d.curve.steps_per_unit),
            angle_threshold: read_field(&ini, "Curve", "AngleThreshold", d.curve.angle_threshold),
            direction_epsilon: read_field(&ini, "Curve", "DirectionEpsilon", d.curve.direction_epsilon),
        };

        let slider = SliderConfig {
            follow_radius_multiplier: read_field(&ini, "Slider", "FollowRadiusMultiplier", d.slider.follow_radius_multiplier),
            ball_pulse_rate: read_field(&ini, "Slider", "BallPulseRate", d.slider.ball_pulse_rate),
        };

        let fade = FadeConfig {
            note_fadeout_ms: read_field(&ini, "Fade", "Note", d.fade.note_fadeout_ms),
            slider_fadeout_ms: read_field(&ini, "Fade", "Slider", d.fade.slider_fadeout_ms),
            spinner_fadeout_ms: read_field(&ini, "Fade", "Spinner", d.fade.spinner_fadeout_ms),
        };

        Ok(Self { curve, slider, fade })
    }

    /// Missing file means defaults
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            tracing::info!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let bytes = std::fs::read(path)?;
        Self::parse(&bytes)
    }
}

#[test]
fn test_config_partial_override() {
    let ini = b"[Curve]\nStepsPerUnit = 50\nAngleThreshold = nope\n\n[Fade]\nNote = 100\n";
    let config = Config::parse(ini).unwrap();

    assert_eq!(config.curve.steps_per_unit, 50.0);
    assert_eq!(config.curve.angle_threshold, Config::default().curve.angle_threshold);
    assert_eq!(config.fade.note_fadeout_ms, 100.0);
    assert_eq!(config.slider, Config::default().slider);
}

#[test]
fn test_section_defaults_match_config() {
    let config = Config::default();

    assert_eq!(CurveConfig::default(), config.curve);
    assert_eq!(SliderConfig::default(), config.slider);
    assert_eq!(FadeConfig::default(), config.fade);
}
