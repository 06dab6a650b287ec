//! Gimballed engine model.
//!
//! The engine pivots at a point `lever_arm` metres below the center of mass
//! on the body -z axis. Tilting the nozzle by `(gx, gy)` deflects the thrust
//! vector away from body +z. Because the thrust acts at the pivot, the same
//! deflection produces a torque `r × F` about the center of mass.
//!
//! # Sign convention
//!
//! Positive `gx` tilts thrust toward body -x and yields positive pitch torque
//! (about +y). Positive `gy` tilts thrust toward body +y and yields positive
//! roll torque (about +x). No torque is produced about body z.

use std::f64::consts::FRAC_PI_2;

use nalgebra::{UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SimError};
use crate::quaternion;

/// Thrust authority (lever arm × thrust) below which no gimbal solution exists.
pub const AUTHORITY_FLOOR: f64 = 1e-9;

/// Commanded gimbal deflection in radians.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GimbalCommand {
    pub gx: f64,
    pub gy: f64,
}

impl GimbalCommand {
    pub fn new(gx: f64, gy: f64) -> Self {
        Self { gx, gy }
    }

    /// Builds a command from angles in degrees, the unit most drivers expose.
    pub fn from_degrees(gx: f64, gy: f64) -> Self {
        Self::new(gx.to_radians(), gy.to_radians())
    }

    /// Validates the command and clamps each axis to `±max_deflection`.
    ///
    /// Any finite angle is accepted; NaN or infinite angles are an invalid
    /// parameter, as is a negative or non-finite limit.
    pub fn clamped(&self, max_deflection: f64) -> Result<Self> {
        if !self.gx.is_finite() || !self.gy.is_finite() {
            return Err(SimError::InvalidGimbal {
                gx: self.gx,
                gy: self.gy,
            });
        }
        if !max_deflection.is_finite() || max_deflection < 0.0 {
            return Err(SimError::InvalidConfig {
                field: "max_gimbal",
                reason: "must be finite and >= 0",
            });
        }
        Ok(Self {
            gx: self.gx.clamp(-max_deflection, max_deflection),
            gy: self.gy.clamp(-max_deflection, max_deflection),
        })
    }
}

/// Thrust force in the body frame.
///
/// # Arguments
///
/// * `gimbal` - Gimbal deflection (rad), assumed already clamped
/// * `thrust` - Thrust magnitude (N), already throttle-scaled
///
/// # Returns
///
/// `[-sin(gx)·T, sin(gy)·T, cos(gx)·cos(gy)·T]`. With zero deflection this is
/// exactly `(0, 0, T)`.
pub fn body_thrust(gimbal: &GimbalCommand, thrust: f64) -> Vector3<f64> {
    Vector3::new(
        -gimbal.gx.sin() * thrust,
        gimbal.gy.sin() * thrust,
        gimbal.gx.cos() * gimbal.gy.cos() * thrust,
    )
}

/// Thrust force rotated into the inertial frame by the current attitude.
pub fn inertial_thrust(
    attitude: &UnitQuaternion<f64>,
    gimbal: &GimbalCommand,
    thrust: f64,
) -> Vector3<f64> {
    quaternion::rotate(attitude, &body_thrust(gimbal, thrust))
}

/// Body-frame torque about the center of mass from a body-frame thrust force
/// applied at the gimbal pivot `(0, 0, -lever_arm)`.
pub fn gimbal_torque(body_force: &Vector3<f64>, lever_arm: f64) -> Vector3<f64> {
    let arm = Vector3::new(0.0, 0.0, -lever_arm);
    arm.cross(body_force)
}

/// Inverts [`gimbal_torque`]: the gimbal deflection that produces `torque`
/// at the given thrust.
///
/// Only the x and y torque components are reachable. Each deflection is
/// clamped to `±max_deflection` when the request exceeds what the thrust can
/// produce. With no authority (`lever_arm·thrust` below [`AUTHORITY_FLOOR`])
/// the neutral command is returned.
///
/// The limit is taken by magnitude and capped at π/2; a non-finite limit
/// allows no deflection.
///
/// # Example
///
/// ```ignore
/// let gimbal = torque_to_gimbal(&Vector3::new(0.0, 50.0, 0.0), 1000.0, 1.0, 0.5);
/// // sin(gx) = 50 / (1.0 * 1000.0)
/// assert!((gimbal.gx - 0.05f64.asin()).abs() < 1e-12);
/// ```
pub fn torque_to_gimbal(
    torque: &Vector3<f64>,
    thrust: f64,
    lever_arm: f64,
    max_deflection: f64,
) -> GimbalCommand {
    let authority = lever_arm * thrust;
    if !authority.is_finite() || authority.abs() < AUTHORITY_FLOOR {
        return GimbalCommand::default();
    }

    let limit = if max_deflection.is_finite() {
        max_deflection.abs().min(FRAC_PI_2).sin()
    } else {
        0.0
    };
    let sin_gx = (torque.y / authority).clamp(-limit, limit);
    let sin_gy = (torque.x / authority).clamp(-limit, limit);

    GimbalCommand::new(sin_gx.asin(), sin_gy.asin())
}
