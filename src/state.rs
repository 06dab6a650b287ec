use nalgebra::{UnitQuaternion, Vector3};

use crate::config::VehicleConfig;
use crate::quaternion;

/// Number of scalars in the flattened state vector.
pub const STATE_DIM: usize = 14;

/// Complete rigid-body state of the vehicle.
///
/// # Fields
///
/// * `position` - Position in the inertial frame (m)
/// * `velocity` - Velocity in the inertial frame (m/s)
/// * `attitude` - Body → inertial rotation, always unit-norm
/// * `angular_velocity` - Angular velocity in the body frame (rad/s)
/// * `mass` - Current mass (kg), never negative
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VehicleState {
    pub position: Vector3<f64>,
    pub velocity: Vector3<f64>,
    pub attitude: UnitQuaternion<f64>,
    pub angular_velocity: Vector3<f64>,
    pub mass: f64,
}

impl VehicleState {
    /// Vehicle at rest at the origin with the given attitude and mass.
    pub fn at_rest(attitude: UnitQuaternion<f64>, mass: f64) -> Self {
        Self {
            position: Vector3::zeros(),
            velocity: Vector3::zeros(),
            attitude,
            angular_velocity: Vector3::zeros(),
            mass: mass.max(0.0),
        }
    }

    /// Launch state for a configuration: at rest, full mass, tilted
    /// `initial_pitch` about body y.
    pub fn initial(config: &VehicleConfig) -> Self {
        Self::at_rest(default_attitude(config.initial_pitch), config.initial_mass)
    }

    /// Converts the state to the flat array layout used by the integrator.
    ///
    /// # Returns
    ///
    /// A 14-element array:
    /// [x, y, z, vx, vy, vz, qw, qx, qy, qz, wx, wy, wz, mass]
    pub fn to_array(&self) -> [f64; STATE_DIM] {
        let q = self.attitude.quaternion();
        [
            self.position.x,
            self.position.y,
            self.position.z,
            self.velocity.x,
            self.velocity.y,
            self.velocity.z,
            q.w,
            q.i,
            q.j,
            q.k,
            self.angular_velocity.x,
            self.angular_velocity.y,
            self.angular_velocity.z,
            self.mass,
        ]
    }

    /// Rebuilds a state from the flat layout of [`to_array`](Self::to_array).
    ///
    /// The quaternion slot is renormalized (identity if degenerate) and the
    /// mass clamped at zero, so the result always satisfies the state
    /// invariants.
    pub fn from_array(arr: &[f64; STATE_DIM]) -> Self {
        let q = quaternion::from_components(&[arr[6], arr[7], arr[8], arr[9]]);
        VehicleState {
            position: Vector3::new(arr[0], arr[1], arr[2]),
            velocity: Vector3::new(arr[3], arr[4], arr[5]),
            attitude: quaternion::normalize(&q),
            angular_velocity: Vector3::new(arr[10], arr[11], arr[12]),
            mass: arr[13].max(0.0),
        }
    }

    pub fn is_finite(&self) -> bool {
        self.to_array().iter().all(|v| v.is_finite())
    }

    pub fn altitude(&self) -> f64 {
        self.position.z
    }

    pub fn speed(&self) -> f64 {
        self.velocity.norm()
    }

    /// `(roll, pitch, yaw)` of the current attitude.
    pub fn euler_angles(&self) -> (f64, f64, f64) {
        quaternion::to_euler(&self.attitude)
    }

    /// Body +z axis expressed in the inertial frame.
    pub fn body_z(&self) -> Vector3<f64> {
        quaternion::rotate(&self.attitude, &Vector3::z())
    }

    /// Drops `amount` kg (clamped at zero). Kinematics are left untouched.
    pub fn drop_mass(&mut self, amount: f64) {
        self.mass = (self.mass - amount).max(0.0);
    }
}

/// Default launch attitude: a pitch-up tilt of `pitch` radians about body y.
pub fn default_attitude(pitch: f64) -> UnitQuaternion<f64> {
    UnitQuaternion::from_axis_angle(&Vector3::y_axis(), pitch)
}
