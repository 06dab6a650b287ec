//! Vehicle configuration.
//!
//! A `VehicleConfig` is created once per session and never mutated. The
//! defaults describe a small reference vehicle; any field can be overridden
//! from JSON, missing fields keep their default.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SimError};

/// Physical and numerical parameters of the simulated vehicle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VehicleConfig {
    /// Thrust at full throttle (N)
    pub base_thrust: f64,
    /// Throttle floor that keeps gimbal authority while the engine is lit
    pub min_throttle: f64,
    /// Mass at session start (kg)
    pub initial_mass: f64,
    /// Propellant burn stops at this mass (kg)
    pub dry_mass: f64,
    /// Propellant flow at full throttle (kg/s)
    pub mass_flow_rate: f64,
    /// Per-axis gimbal deflection limit (rad)
    pub max_gimbal: f64,
    /// Principal moments of inertia about body x, y, z (kg⋅m²)
    pub inertia: Vector3<f64>,
    /// Distance from the center of mass to the gimbal pivot along body -z (m)
    pub lever_arm: f64,
    /// Gravitational acceleration magnitude, acting along inertial -z (m/s²)
    pub gravity: f64,
    /// Session timestep (s)
    pub dt: f64,
    /// Mass removed by one staging event (kg)
    pub stage_mass_drop: f64,
    /// Altitude band in which a fast vehicle counts as hitting the ground (m)
    pub ground_epsilon: f64,
    /// Speed above which ground contact is a hard impact (m/s)
    pub impact_speed: f64,
    /// Default initial pitch-up tilt about body y (rad)
    pub initial_pitch: f64,
}

impl Default for VehicleConfig {
    fn default() -> Self {
        Self {
            base_thrust: 1500.0,
            min_throttle: 0.2,
            initial_mass: 100.0,
            dry_mass: 60.0,
            mass_flow_rate: 1.0,
            max_gimbal: 60f64.to_radians(),
            inertia: Vector3::new(40.0, 40.0, 2.0),
            lever_arm: 1.0,
            gravity: 9.81,
            dt: 0.01, // 100 Hz
            stage_mass_drop: 10.0,
            ground_epsilon: 0.1,
            impact_speed: 5.0,
            initial_pitch: 5f64.to_radians(),
        }
    }
}

impl VehicleConfig {
    /// Parses a JSON document and validates the result.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let config = VehicleConfig::from_json(r#"{ "base_thrust": 2000.0 }"#)?;
    /// assert_eq!(config.dry_mass, VehicleConfig::default().dry_mass);
    /// ```
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks every field against its physical domain.
    pub fn validate(&self) -> Result<()> {
        positive("base_thrust", self.base_thrust, true)?;
        positive("initial_mass", self.initial_mass, false)?;
        positive("mass_flow_rate", self.mass_flow_rate, true)?;
        positive("lever_arm", self.lever_arm, false)?;
        positive("gravity", self.gravity, true)?;
        positive("dt", self.dt, false)?;
        positive("stage_mass_drop", self.stage_mass_drop, true)?;
        positive("ground_epsilon", self.ground_epsilon, true)?;
        positive("impact_speed", self.impact_speed, true)?;

        if !(0.0..=1.0).contains(&self.min_throttle) {
            return Err(invalid("min_throttle", "must lie in [0, 1]"));
        }
        if !(0.0..=self.initial_mass).contains(&self.dry_mass) {
            return Err(invalid("dry_mass", "must lie in [0, initial_mass]"));
        }
        if !(self.max_gimbal > 0.0 && self.max_gimbal < std::f64::consts::FRAC_PI_2) {
            return Err(invalid("max_gimbal", "must lie in (0, pi/2)"));
        }
        if self.inertia.iter().any(|i| !i.is_finite() || *i <= 0.0) {
            return Err(invalid("inertia", "all components must be finite and > 0"));
        }
        if !self.initial_pitch.is_finite() {
            return Err(invalid("initial_pitch", "must be finite"));
        }

        Ok(())
    }

    /// Thrust magnitude for a throttle setting while the engine is lit.
    ///
    /// Throttle is clamped to `[min_throttle, 1]`. Negative or non-finite
    /// throttle is rejected.
    pub fn commanded_thrust(&self, throttle: f64) -> Result<f64> {
        if !throttle.is_finite() || throttle < 0.0 {
            return Err(SimError::InvalidThrottle(throttle));
        }
        if !(0.0..=1.0).contains(&self.min_throttle) {
            return Err(invalid("min_throttle", "must lie in [0, 1]"));
        }
        Ok(self.base_thrust * throttle.clamp(self.min_throttle, 1.0))
    }
}

fn invalid(field: &'static str, reason: &'static str) -> SimError {
    SimError::InvalidConfig { field, reason }
}

fn positive(field: &'static str, value: f64, allow_zero: bool) -> Result<()> {
    if !value.is_finite() {
        return Err(invalid(field, "must be finite"));
    }
    if value < 0.0 || (!allow_zero && value == 0.0) {
        return Err(invalid(
            field,
            if allow_zero { "must be >= 0" } else { "must be > 0" },
        ));
    }
    Ok(())
}
