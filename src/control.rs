use nalgebra::{UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

use crate::config::VehicleConfig;
use crate::error::{check_timestep, Result};
use crate::quaternion;
use crate::state::VehicleState;
use crate::thrust::{self, GimbalCommand};

/// Per-axis PID gains about body x, y, z.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PidGains {
    /// Proportional gains (N⋅m per rad, or per rad/s in rate mode)
    pub kp: Vector3<f64>,
    /// Integral gains (N⋅m per rad⋅s)
    pub ki: Vector3<f64>,
    /// Derivative gains (N⋅m per rad/s)
    pub kd: Vector3<f64>,
}

impl PidGains {
    /// Same gains on all three axes.
    pub fn uniform(kp: f64, ki: f64, kd: f64) -> Self {
        Self {
            kp: Vector3::repeat(kp),
            ki: Vector3::repeat(ki),
            kd: Vector3::repeat(kd),
        }
    }
}

impl Default for PidGains {
    /// Tuned for the default vehicle (pitch/roll inertia ~40 kg⋅m², 1 m arm).
    fn default() -> Self {
        Self::uniform(400.0, 20.0, 300.0)
    }
}

/// What the controller tracks.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Setpoint {
    /// Hold a body → inertial attitude
    Attitude(UnitQuaternion<f64>),
    /// Hold a body-frame angular rate (rad/s)
    Rate(Vector3<f64>),
}

/// PID attitude controller producing a body-frame torque command.
///
/// The controller owns its integral accumulator and previous error. That
/// memory is separate from the vehicle state and is cleared with
/// [`reset`](Self::reset) whenever the session resets.
///
/// # Control Law
///
/// τ = Kp∘e + Ki∘∫e dt + Kd∘ė
///
/// where e is the body-frame attitude error (rotation vector) or the rate
/// error, ∘ is the per-axis product, ∫e is clamped component-wise to
/// `±integral_limit` and ė is the backward difference of e (zero on the first
/// tick after a reset).
#[derive(Clone, Debug)]
pub struct AttitudeController {
    gains: PidGains,
    /// Anti-windup bound on each integral component
    integral_limit: f64,

    // Controller state
    integral: Vector3<f64>,
    previous_error: Option<Vector3<f64>>,
}

impl Default for AttitudeController {
    fn default() -> Self {
        Self::new(PidGains::default(), 0.5)
    }
}

impl AttitudeController {
    /// Creates a controller with zeroed memory.
    ///
    /// # Arguments
    ///
    /// * `gains` - Per-axis PID gains
    /// * `integral_limit` - Bound on each accumulated error component; its
    ///   absolute value is used, and NaN disables the integral term
    pub fn new(gains: PidGains, integral_limit: f64) -> Self {
        Self {
            gains,
            integral_limit: if integral_limit.is_nan() {
                0.0
            } else {
                integral_limit.abs()
            },
            integral: Vector3::zeros(),
            previous_error: None,
        }
    }

    pub fn set_gains(&mut self, gains: PidGains) {
        self.gains = gains;
    }

    pub fn gains(&self) -> &PidGains {
        &self.gains
    }

    pub fn integral(&self) -> Vector3<f64> {
        self.integral
    }

    /// Clears the integral and derivative memory.
    pub fn reset(&mut self) {
        self.integral = Vector3::zeros();
        self.previous_error = None;
    }

    /// Computes the torque command for one control tick.
    ///
    /// # Arguments
    ///
    /// * `setpoint` - Desired attitude or body rate
    /// * `attitude` - Current attitude (body → inertial)
    /// * `omega` - Current body-frame angular velocity (rad/s)
    /// * `dt` - Control period (s), must be finite and > 0
    ///
    /// # Returns
    ///
    /// Desired torque about body x, y, z (N⋅m). Nothing is updated when `dt`
    /// is rejected.
    pub fn update(
        &mut self,
        setpoint: &Setpoint,
        attitude: &UnitQuaternion<f64>,
        omega: &Vector3<f64>,
        dt: f64,
    ) -> Result<Vector3<f64>> {
        check_timestep(dt)?;

        let error = match setpoint {
            Setpoint::Attitude(desired) => quaternion::attitude_error(desired, attitude),
            Setpoint::Rate(desired) => desired - omega,
        };

        let limit = self.integral_limit;
        self.integral = (self.integral + error * dt).map(|v| v.clamp(-limit, limit));

        let derivative = match self.previous_error {
            Some(previous) => (error - previous) / dt,
            None => Vector3::zeros(),
        };
        self.previous_error = Some(error);

        let p_term = self.gains.kp.component_mul(&error);
        let i_term = self.gains.ki.component_mul(&self.integral);
        let d_term = self.gains.kd.component_mul(&derivative);

        Ok(p_term + i_term + d_term)
    }

    /// Runs one tick and maps the torque to a gimbal command.
    ///
    /// The deflection is clamped to the vehicle's gimbal limit when the torque
    /// exceeds what `thrust` can deliver; with no thrust the gimbal centers.
    pub fn gimbal_command(
        &mut self,
        setpoint: &Setpoint,
        state: &VehicleState,
        thrust: f64,
        config: &VehicleConfig,
        dt: f64,
    ) -> Result<GimbalCommand> {
        let torque = self.update(setpoint, &state.attitude, &state.angular_velocity, dt)?;
        Ok(thrust::torque_to_gimbal(
            &torque,
            thrust,
            config.lever_arm,
            config.max_gimbal,
        ))
    }
}
