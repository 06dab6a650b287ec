use fast_ode;
use nalgebra::Vector3;

use crate::config::VehicleConfig;
use crate::quaternion;
use crate::state::STATE_DIM;
use crate::thrust::{self, GimbalCommand};

/// Below this mass the thrust acceleration term is dropped rather than
/// dividing by (almost) zero.
pub const MASS_FLOOR: f64 = 1e-9;

/// Ordinary Differential Equation (ODE) system for a gimballed rocket.
///
/// This structure implements the 6-DOF rigid-body model over the flat
/// 14-element state of [`VehicleState::to_array`](crate::state::VehicleState::to_array).
/// Thrust acts at the gimbal pivot, so a deflected nozzle both steers the
/// translational force and produces a torque about the center of mass.
///
/// # Fields
///
/// * `config` - Vehicle parameters (inertia, lever arm, gravity, flow rate)
/// * `gimbal` - Gimbal deflection held constant over the step (rad, clamped)
/// * `thrust` - Thrust magnitude held constant over the step (N)
pub struct TvcOde<'a> {
    pub config: &'a VehicleConfig,
    pub gimbal: GimbalCommand,
    pub thrust: f64,
}

impl<'a> TvcOde<'a> {
    pub fn new(config: &'a VehicleConfig, gimbal: GimbalCommand, thrust: f64) -> Self {
        Self {
            config,
            gimbal,
            thrust,
        }
    }

    /// The engine burns while it has thrust and propellant above dry mass.
    pub fn is_burning(&self, mass: f64) -> bool {
        self.thrust > 0.0 && mass > self.config.dry_mass
    }

    /// Propellant consumption, proportional to thrust relative to full thrust.
    fn mass_flow(&self) -> f64 {
        if self.config.base_thrust > 0.0 {
            self.config.mass_flow_rate * self.thrust / self.config.base_thrust
        } else {
            self.config.mass_flow_rate
        }
    }
}

impl fast_ode::DifferentialEquation<STATE_DIM> for TvcOde<'_> {
    /// Computes the time derivatives of the state vector.
    ///
    /// # Physics Implementation
    ///
    /// 1. Position derivatives: ṗ = v
    /// 2. Velocity derivatives: v̇ = R(q)·F_body / m - g·ẑ
    /// 3. Attitude derivatives: q̇ = ½ q ⊗ [0, ω]
    /// 4. Angular velocity derivatives: ω̇ = I⁻¹(τ - ω × Iω), τ = r × F_body
    /// 5. Mass derivative: ṁ = -flow while burning, 0 otherwise
    ///
    /// The quaternion used to rotate thrust is normalized first; the kinematic
    /// equation is applied to the raw stage quaternion. The success flag is
    /// `false` when any derivative is non-finite.
    fn ode_dot_y(&self, _t: f64, y: &fast_ode::Coord<STATE_DIM>) -> (fast_ode::Coord<STATE_DIM>, bool) {
        let state = y.0;

        let q_raw = quaternion::from_components(&[state[6], state[7], state[8], state[9]]);
        let attitude = quaternion::normalize(&q_raw);
        let omega = Vector3::new(state[10], state[11], state[12]);
        let mass = state[13];

        let burning = self.is_burning(mass);
        let thrust = if burning { self.thrust } else { 0.0 };

        // Thrust in body frame, then inertial frame
        let force_body = thrust::body_thrust(&self.gimbal, thrust);
        let force_inertial = quaternion::rotate(&attitude, &force_body);

        let mut accel = if mass > MASS_FLOOR {
            force_inertial / mass
        } else {
            Vector3::zeros()
        };
        accel.z -= self.config.gravity;

        let q_dot = quaternion::kinematic_rate(&q_raw, &omega);

        // Euler's equations with diagonal inertia
        let inertia = self.config.inertia;
        let torque = thrust::gimbal_torque(&force_body, self.config.lever_arm);
        let gyroscopic = omega.cross(&inertia.component_mul(&omega));
        let omega_dot = (torque - gyroscopic).component_div(&inertia);

        let mass_dot = if burning { -self.mass_flow() } else { 0.0 };

        let dot_y = [
            state[3], // ẋ = vx
            state[4], // ẏ = vy
            state[5], // ż = vz
            accel.x,
            accel.y,
            accel.z,
            q_dot.w,
            q_dot.i,
            q_dot.j,
            q_dot.k,
            omega_dot.x,
            omega_dot.y,
            omega_dot.z,
            mass_dot,
        ];

        let finite = dot_y.iter().all(|v| v.is_finite());
        (fast_ode::Coord(dot_y), finite)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::VehicleState;
    use approx::assert_relative_eq;
    use fast_ode::DifferentialEquation;
    use nalgebra::UnitQuaternion;

    fn derivative(ode: &TvcOde, state: &VehicleState) -> ([f64; STATE_DIM], bool) {
        let (coord, ok) = ode.ode_dot_y(0.0, &fast_ode::Coord(state.to_array()));
        (coord.0, ok)
    }

    /// Straight-up thrust equal to weight gives zero vertical acceleration.
    #[test]
    fn test_hover_balance() {
        let config = VehicleConfig::default();
        let state = VehicleState::at_rest(UnitQuaternion::identity(), config.initial_mass);
        let hover = config.initial_mass * config.gravity;
        let ode = TvcOde::new(&config, GimbalCommand::default(), hover);

        let (d, ok) = derivative(&ode, &state);
        assert!(ok);
        assert_relative_eq!(d[5], 0.0, epsilon = 1e-12);
        assert_relative_eq!(d[3], 0.0);
        assert_relative_eq!(d[4], 0.0);
        // no torque from straight thrust
        assert_eq!(&d[10..13], &[0.0, 0.0, 0.0]);
        // burning at less than full throttle
        assert_relative_eq!(d[13], -config.mass_flow_rate * hover / config.base_thrust);
    }

    /// Without thrust only gravity acts and no mass is consumed.
    #[test]
    fn test_free_fall_derivative() {
        let config = VehicleConfig::default();
        let mut state = VehicleState::initial(&config);
        state.velocity = Vector3::new(1.0, 2.0, 3.0);
        let ode = TvcOde::new(&config, GimbalCommand::new(0.3, 0.3), 0.0);

        let (d, ok) = derivative(&ode, &state);
        assert!(ok);
        assert_eq!(&d[0..3], &[1.0, 2.0, 3.0]);
        assert_eq!(&d[3..6], &[0.0, 0.0, -config.gravity]);
        assert_eq!(d[13], 0.0);
    }

    #[test]
    fn test_gimbal_produces_pitch_torque() {
        let config = VehicleConfig::default();
        let state = VehicleState::at_rest(UnitQuaternion::identity(), config.initial_mass);
        let gimbal = GimbalCommand::new(0.1, 0.0);
        let ode = TvcOde::new(&config, gimbal, config.base_thrust);

        let (d, _) = derivative(&ode, &state);
        let expected = config.lever_arm * config.base_thrust * 0.1f64.sin() / config.inertia.y;
        assert_relative_eq!(d[11], expected, epsilon = 1e-9);
        assert_relative_eq!(d[10], 0.0);
        // lateral force toward -x
        assert!(d[3] < 0.0);
    }

    #[test]
    fn test_gyroscopic_coupling() {
        let config = VehicleConfig {
            inertia: Vector3::new(1.0, 2.0, 3.0),
            ..VehicleConfig::default()
        };
        let mut state = VehicleState::at_rest(UnitQuaternion::identity(), 50.0);
        state.angular_velocity = Vector3::new(1.0, 1.0, 0.0);
        let ode = TvcOde::new(&config, GimbalCommand::default(), 0.0);

        let (d, _) = derivative(&ode, &state);
        // ω × Iω = (1,1,0) × (1,2,0) = (0, 0, 1); ω̇z = -1/3
        assert_relative_eq!(d[12], -1.0 / 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_burnout_and_empty_mass() {
        let config = VehicleConfig::default();
        let ode = TvcOde::new(&config, GimbalCommand::default(), config.base_thrust);

        let dry = VehicleState::at_rest(UnitQuaternion::identity(), config.dry_mass);
        let (d, ok) = derivative(&ode, &dry);
        assert!(ok);
        assert_eq!(d[13], 0.0);
        assert_relative_eq!(d[5], -config.gravity);

        let empty_config = VehicleConfig {
            dry_mass: 0.0,
            ..VehicleConfig::default()
        };
        let ode = TvcOde::new(&empty_config, GimbalCommand::default(), config.base_thrust);
        let empty = VehicleState::at_rest(UnitQuaternion::identity(), 0.0);
        let (d, ok) = derivative(&ode, &empty);
        assert!(ok);
        assert_relative_eq!(d[5], -config.gravity);
    }

    #[test]
    fn test_non_finite_is_flagged() {
        let config = VehicleConfig::default();
        let mut state = VehicleState::at_rest(UnitQuaternion::identity(), 50.0);
        state.angular_velocity.x = f64::NAN;
        let ode = TvcOde::new(&config, GimbalCommand::default(), 0.0);
        let (_, ok) = derivative(&ode, &state);
        assert!(!ok);
    }
}
