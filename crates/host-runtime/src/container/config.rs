//! # Host Configuration
//!
//! Runtime parameters and detector thresholds, read from the environment.
//! Unset variables keep their defaults; a set but unparsable variable is an
//! error naming the variable.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use fl_01_telemetry_detector::{DetectorSettings, Thresholds, ThresholdsBuilder};
use flightline_telemetry::TelemetryConfig;
use shared_types::Scene;

use crate::error::RuntimeError;

/// Complete host configuration.
#[derive(Debug, Clone)]
pub struct HostConfig {
    /// Delay between ticks of the demo tick loop, in milliseconds.
    pub tick_interval_ms: u64,
    /// Upper bound on ticks driven by the tick loop.
    pub max_ticks: u64,
    /// Scene announced to lifecycle modules on start.
    pub initial_scene: Scene,
    /// Detector thresholds at start; replaceable at runtime.
    pub thresholds: Thresholds,
    /// Fixed detector settings.
    pub detector: DetectorSettings,
    /// Logging and metrics configuration.
    pub telemetry: TelemetryConfig,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 20,
            max_ticks: 600,
            initial_scene: Scene::SpaceCenter,
            thresholds: Thresholds::default(),
            detector: DetectorSettings::default(),
            telemetry: TelemetryConfig::default(),
        }
    }
}

impl HostConfig {
    /// Load configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `FL_TICK_MS`: Tick interval (default: 20)
    /// - `FL_MAX_TICKS`: Tick limit (default: 600)
    /// - `FL_INITIAL_SCENE`: `main_menu`, `space_center`, `editor`, `flight`
    ///   or `tracking_station` (default: space_center)
    /// - `FL_HIGH_SPEED_MPS`, `FL_DECAY_MARGIN_KM`, `FL_COLLISION_DISTANCE_M`,
    ///   `FL_APOAPSIS_ACCURACY_M`, `FL_PERIAPSIS_ACCURACY_M`, `FL_LOW_FUEL`,
    ///   `FL_LOW_CHARGE`, `FL_IMPACT_SPEED_MPS`: threshold overrides
    /// - `FL_FUEL_RESOURCE`, `FL_CHARGE_RESOURCE`: watched resource names
    /// - everything read by [`TelemetryConfig::from_env`]
    pub fn from_env() -> Result<Self, RuntimeError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, RuntimeError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let mut builder = ThresholdsBuilder::new();
        if let Some(v) = parse_var(&lookup, "FL_HIGH_SPEED_MPS")? {
            builder = builder.high_speed_mps(v);
        }
        if let Some(v) = parse_var(&lookup, "FL_DECAY_MARGIN_KM")? {
            builder = builder.decay_margin_km(v);
        }
        if let Some(v) = parse_var(&lookup, "FL_COLLISION_DISTANCE_M")? {
            builder = builder.collision_distance_m(v);
        }
        if let Some(v) = parse_var(&lookup, "FL_APOAPSIS_ACCURACY_M")? {
            builder = builder.apoapsis_accuracy_m(v);
        }
        if let Some(v) = parse_var(&lookup, "FL_PERIAPSIS_ACCURACY_M")? {
            builder = builder.periapsis_accuracy_m(v);
        }
        if let Some(v) = parse_var(&lookup, "FL_LOW_FUEL")? {
            builder = builder.low_fuel(v);
        }
        if let Some(v) = parse_var(&lookup, "FL_LOW_CHARGE")? {
            builder = builder.low_charge(v);
        }
        if let Some(v) = parse_var(&lookup, "FL_IMPACT_SPEED_MPS")? {
            builder = builder.impact_speed_mps(v);
        }

        let mut detector = defaults.detector;
        if let Some(name) = lookup("FL_FUEL_RESOURCE") {
            detector.fuel_resource = name;
        }
        if let Some(name) = lookup("FL_CHARGE_RESOURCE") {
            detector.charge_resource = name;
        }

        let initial_scene = match lookup("FL_INITIAL_SCENE") {
            Some(value) => parse_scene(&value).ok_or_else(|| RuntimeError::Config {
                variable: "FL_INITIAL_SCENE".to_string(),
                reason: format!("unknown scene '{}'", value),
            })?,
            None => defaults.initial_scene,
        };

        Ok(Self {
            tick_interval_ms: parse_var(&lookup, "FL_TICK_MS")?
                .unwrap_or(defaults.tick_interval_ms),
            max_ticks: parse_var(&lookup, "FL_MAX_TICKS")?.unwrap_or(defaults.max_ticks),
            initial_scene,
            thresholds: builder.build()?,
            detector,
            telemetry: TelemetryConfig::from_lookup(&lookup),
        })
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }
}

fn parse_var<T, F>(lookup: &F, variable: &str) -> Result<Option<T>, RuntimeError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(variable) {
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e: T::Err| RuntimeError::Config {
                variable: variable.to_string(),
                reason: e.to_string(),
            }),
        None => Ok(None),
    }
}

/// Parse a scene by its snake_case name.
pub fn parse_scene(value: &str) -> Option<Scene> {
    let value = value.trim().to_lowercase();
    [
        Scene::MainMenu,
        Scene::SpaceCenter,
        Scene::Editor,
        Scene::Flight,
        Scene::TrackingStation,
    ]
    .into_iter()
    .find(|scene| scene.as_str() == value)
}
