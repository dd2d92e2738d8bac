//! Detector thresholds and settings
//!
//! `Thresholds` are the eight operator-tunable values re-read every tick.
//! `DetectorSettings` are fixed at construction: resource names and the
//! small tolerances the rules compare against.
//!
//! # Example
//!
//! ```ignore
//! use fl_01_telemetry_detector::domain::ThresholdsBuilder;
//!
//! let thresholds = ThresholdsBuilder::new()
//!     .high_speed_mps(900.0)
//!     .low_fuel(120.0)
//!     .build()?;
//! ```

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Operator-tunable detection thresholds
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// High speed event: surface speed (m/s)
    pub high_speed_mps: f64,
    /// Orbit decay warning: periapsis altitude margin (km)
    pub decay_margin_km: f64,
    /// Collision warning: distance between vessels (m)
    pub collision_distance_m: f64,
    /// Apoapsis reach: accuracy band (m)
    pub apoapsis_accuracy_m: f64,
    /// Periapsis reach: accuracy band (m)
    pub periapsis_accuracy_m: f64,
    /// Low fuel warning (units)
    pub low_fuel: f64,
    /// Low charge warning (units)
    pub low_charge: f64,
    /// Impact: surface speed at ground contact (m/s)
    pub impact_speed_mps: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            high_speed_mps: 1200.0,
            decay_margin_km: 120.0,
            collision_distance_m: 1000.0,
            apoapsis_accuracy_m: 10.0,
            periapsis_accuracy_m: 10.0,
            low_fuel: 50.0,
            low_charge: 5.0,
            impact_speed_mps: 8.0,
        }
    }
}

impl Thresholds {
    /// Accepted range per field, as `(name, value, min, max)`.
    fn bounds(&self) -> [(&'static str, f64, f64, f64); 8] {
        [
            ("high_speed_mps", self.high_speed_mps, 50.0, 4000.0),
            ("decay_margin_km", self.decay_margin_km, 0.001, 200.0),
            ("collision_distance_m", self.collision_distance_m, 5.0, 2299.0),
            ("apoapsis_accuracy_m", self.apoapsis_accuracy_m, 1.0, 1300.0),
            ("periapsis_accuracy_m", self.periapsis_accuracy_m, 1.0, 1500.0),
            ("low_fuel", self.low_fuel, 1.0, 1500.0),
            ("low_charge", self.low_charge, 1.0, 1500.0),
            ("impact_speed_mps", self.impact_speed_mps, 8.0, 399.9),
        ]
    }

    /// Validate every field is finite and inside its accepted range
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value, min, max) in self.bounds() {
            if !value.is_finite() {
                return Err(ConfigError::NotFinite { field });
            }
            if value < min || value > max {
                return Err(ConfigError::OutOfRange {
                    field,
                    value,
                    min,
                    max,
                });
            }
        }
        Ok(())
    }

    /// Periapsis margin in meters
    pub fn decay_margin_m(&self) -> f64 {
        self.decay_margin_km * 1000.0
    }

    /// Parse and validate a JSON threshold document. Missing fields take
    /// their defaults.
    pub fn from_json(document: &str) -> Result<Self, ConfigError> {
        let thresholds: Self = serde_json::from_str(document)?;
        thresholds.validate()?;
        Ok(thresholds)
    }
}

/// Builder for Thresholds with validation
#[derive(Default)]
pub struct ThresholdsBuilder {
    high_speed_mps: Option<f64>,
    decay_margin_km: Option<f64>,
    collision_distance_m: Option<f64>,
    apoapsis_accuracy_m: Option<f64>,
    periapsis_accuracy_m: Option<f64>,
    low_fuel: Option<f64>,
    low_charge: Option<f64>,
    impact_speed_mps: Option<f64>,
}

impl ThresholdsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn high_speed_mps(mut self, value: f64) -> Self {
        self.high_speed_mps = Some(value);
        self
    }

    pub fn decay_margin_km(mut self, value: f64) -> Self {
        self.decay_margin_km = Some(value);
        self
    }

    pub fn collision_distance_m(mut self, value: f64) -> Self {
        self.collision_distance_m = Some(value);
        self
    }

    pub fn apoapsis_accuracy_m(mut self, value: f64) -> Self {
        self.apoapsis_accuracy_m = Some(value);
        self
    }

    pub fn periapsis_accuracy_m(mut self, value: f64) -> Self {
        self.periapsis_accuracy_m = Some(value);
        self
    }

    pub fn low_fuel(mut self, value: f64) -> Self {
        self.low_fuel = Some(value);
        self
    }

    pub fn low_charge(mut self, value: f64) -> Self {
        self.low_charge = Some(value);
        self
    }

    pub fn impact_speed_mps(mut self, value: f64) -> Self {
        self.impact_speed_mps = Some(value);
        self
    }

    /// Build the Thresholds, validating all values
    pub fn build(self) -> Result<Thresholds, ConfigError> {
        let thresholds = self.build_unchecked();
        thresholds.validate()?;
        Ok(thresholds)
    }

    /// Build without validation
    pub fn build_unchecked(self) -> Thresholds {
        let defaults = Thresholds::default();

        Thresholds {
            high_speed_mps: self.high_speed_mps.unwrap_or(defaults.high_speed_mps),
            decay_margin_km: self.decay_margin_km.unwrap_or(defaults.decay_margin_km),
            collision_distance_m: self
                .collision_distance_m
                .unwrap_or(defaults.collision_distance_m),
            apoapsis_accuracy_m: self
                .apoapsis_accuracy_m
                .unwrap_or(defaults.apoapsis_accuracy_m),
            periapsis_accuracy_m: self
                .periapsis_accuracy_m
                .unwrap_or(defaults.periapsis_accuracy_m),
            low_fuel: self.low_fuel.unwrap_or(defaults.low_fuel),
            low_charge: self.low_charge.unwrap_or(defaults.low_charge),
            impact_speed_mps: self.impact_speed_mps.unwrap_or(defaults.impact_speed_mps),
        }
    }
}

/// Fixed detector settings
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorSettings {
    /// Resource watched by the low fuel rule
    pub fuel_resource: String,
    /// Resource watched by the low charge rule
    pub charge_resource: String,
    /// Altitude at or below which a vessel is in ground contact (m)
    pub ground_contact_m: f64,
    /// Minimum throttle movement reported as a change
    pub throttle_epsilon: f64,
    /// Minimum tick-over-tick resource change reported as flow
    pub resource_epsilon: f64,
}

impl Default for DetectorSettings {
    fn default() -> Self {
        Self {
            fuel_resource: "LiquidFuel".to_string(),
            charge_resource: "ElectricCharge".to_string(),
            ground_contact_m: 0.1,
            throttle_epsilon: 0.001,
            resource_epsilon: 1e-9,
        }
    }
}
