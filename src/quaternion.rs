//! Quaternion helpers for attitude representation.
//!
//! Convention used throughout the crate: quaternions are scalar-first
//! `(w, x, y, z)` and describe the rotation that takes body-frame vectors to
//! the inertial frame. `rotate` is therefore body → inertial and
//! `rotate_inverse` is inertial → body.

use nalgebra::{Quaternion, UnitQuaternion, Vector3};

/// Norms below this are treated as degenerate by [`normalize`].
pub const NORM_FLOOR: f64 = 1e-12;

/// Rotates a body-frame vector into the inertial frame.
///
/// The `UnitQuaternion` type carries the unit-norm requirement; raw
/// quaternions must pass through [`normalize`] first.
pub fn rotate(q: &UnitQuaternion<f64>, v: &Vector3<f64>) -> Vector3<f64> {
    q.transform_vector(v)
}

/// Rotates an inertial-frame vector into the body frame.
pub fn rotate_inverse(q: &UnitQuaternion<f64>, v: &Vector3<f64>) -> Vector3<f64> {
    q.inverse_transform_vector(v)
}

/// Extracts Euler angles `(roll, pitch, yaw)` in radians.
///
/// Z-Y-X convention: yaw about inertial z, then pitch about the new y, then
/// roll about the new x. The pitch arcsine argument is clamped to `[-1, 1]`,
/// so a quaternion sitting exactly at ±90° pitch (or slightly past it from
/// rounding) yields ±π/2 instead of NaN.
///
/// # Example
///
/// ```ignore
/// let q = UnitQuaternion::from_axis_angle(&Vector3::y_axis(), 0.3);
/// let (_, pitch, _) = to_euler(&q);
/// assert!((pitch - 0.3).abs() < 1e-12);
/// ```
pub fn to_euler(q: &UnitQuaternion<f64>) -> (f64, f64, f64) {
    let (w, x, y, z) = (q.w, q.i, q.j, q.k);

    let roll = (2.0 * (w * x + y * z)).atan2(1.0 - 2.0 * (x * x + y * y));
    let sin_pitch = (2.0 * (w * y - z * x)).clamp(-1.0, 1.0);
    let pitch = sin_pitch.asin();
    let yaw = (2.0 * (w * z + x * y)).atan2(1.0 - 2.0 * (y * y + z * z));

    (roll, pitch, yaw)
}

/// Normalizes a raw quaternion.
///
/// Falls back to the identity rotation when the norm is below
/// [`NORM_FLOOR`] or not finite, so this never divides by zero.
pub fn normalize(q: &Quaternion<f64>) -> UnitQuaternion<f64> {
    let norm = q.norm();
    if !norm.is_finite() || norm < NORM_FLOOR {
        return UnitQuaternion::identity();
    }
    UnitQuaternion::new_unchecked(*q / norm)
}

/// Builds a quaternion from scalar-first components `[w, x, y, z]`.
pub fn from_components(c: &[f64; 4]) -> Quaternion<f64> {
    Quaternion::new(c[0], c[1], c[2], c[3])
}

/// Scalar-first components `[w, x, y, z]`.
pub fn to_components(q: &Quaternion<f64>) -> [f64; 4] {
    [q.w, q.i, q.j, q.k]
}

/// Quaternion kinematic equation: q̇ = ½ q ⊗ [0, ω].
///
/// `omega` is the body-frame angular velocity. `q` is taken as-is (it may be
/// an intermediate Runge-Kutta stage that is slightly off the unit sphere).
pub fn kinematic_rate(q: &Quaternion<f64>, omega: &Vector3<f64>) -> Quaternion<f64> {
    let omega_quat = Quaternion::new(0.0, omega.x, omega.y, omega.z);
    *q * omega_quat * 0.5
}

/// Body-frame rotation vector (axis × angle) that takes `current` onto
/// `desired` along the shortest path.
pub fn attitude_error(desired: &UnitQuaternion<f64>, current: &UnitQuaternion<f64>) -> Vector3<f64> {
    let mut q_err = current.inverse() * desired;
    // q and -q are the same rotation; pick the hemisphere with w >= 0
    if q_err.w < 0.0 {
        q_err = UnitQuaternion::new_unchecked(-q_err.into_inner());
    }

    let axis = Vector3::new(q_err.i, q_err.j, q_err.k);
    let sin_half = axis.norm();
    if sin_half < NORM_FLOOR {
        return Vector3::zeros();
    }

    let angle = 2.0 * sin_half.atan2(q_err.w);
    axis * (angle / sin_half)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::f64::consts::FRAC_PI_2;

    fn random_unit(rng: &mut StdRng) -> UnitQuaternion<f64> {
        let raw = Quaternion::new(
            rng.gen_range(-1.0..1.0),
            rng.gen_range(-1.0..1.0),
            rng.gen_range(-1.0..1.0),
            rng.gen_range(-1.0..1.0),
        );
        normalize(&raw)
    }

    #[test]
    fn test_rotate_round_trip() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            let q = random_unit(&mut rng);
            let v = Vector3::new(
                rng.gen_range(-10.0..10.0),
                rng.gen_range(-10.0..10.0),
                rng.gen_range(-10.0..10.0),
            );
            let back = rotate_inverse(&q, &rotate(&q, &v));
            assert_relative_eq!(back, v, epsilon = 1e-9);

            let back_conj = rotate(&q.conjugate(), &rotate(&q, &v));
            assert_relative_eq!(back_conj, v, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_rotate_body_z_under_pitch() {
        // Positive pitch about y tips body +z towards inertial +x
        let q = UnitQuaternion::from_axis_angle(&Vector3::y_axis(), FRAC_PI_2);
        let z_inertial = rotate(&q, &Vector3::z());
        assert_relative_eq!(z_inertial, Vector3::x(), epsilon = 1e-12);
    }

    #[test]
    fn test_to_euler_matches_axis_rotations() {
        let roll = UnitQuaternion::from_axis_angle(&Vector3::x_axis(), 0.4);
        let pitch = UnitQuaternion::from_axis_angle(&Vector3::y_axis(), -0.2);
        let yaw = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), 1.1);

        let (r, p, y) = to_euler(&(yaw * pitch * roll));
        assert_relative_eq!(r, 0.4, epsilon = 1e-10);
        assert_relative_eq!(p, -0.2, epsilon = 1e-10);
        assert_relative_eq!(y, 1.1, epsilon = 1e-10);

        // Agrees with nalgebra's own extraction away from the singularity
        let q = yaw * pitch * roll;
        let (nr, np, ny) = q.euler_angles();
        assert_relative_eq!(r, nr, epsilon = 1e-9);
        assert_relative_eq!(p, np, epsilon = 1e-9);
        assert_relative_eq!(y, ny, epsilon = 1e-9);
    }

    #[test]
    fn test_to_euler_gimbal_lock_is_finite() {
        for angle in [FRAC_PI_2, -FRAC_PI_2] {
            let q = UnitQuaternion::from_axis_angle(&Vector3::y_axis(), angle);
            let (r, p, y) = to_euler(&q);
            assert!(r.is_finite() && p.is_finite() && y.is_finite());
            assert_relative_eq!(p, angle, epsilon = 1e-6);
        }

        // Slightly over-unit components push the arcsine argument past 1
        let q = UnitQuaternion::new_unchecked(Quaternion::new(
            0.7071067811865477,
            0.0,
            0.7071067811865477,
            0.0,
        ));
        let (_, p, _) = to_euler(&q);
        assert!(p.is_finite());
        assert_relative_eq!(p, FRAC_PI_2, epsilon = 1e-6);
    }

    #[test]
    fn test_normalize_fallback() {
        let q = normalize(&Quaternion::new(0.0, 0.0, 0.0, 0.0));
        assert_eq!(q, UnitQuaternion::identity());

        let q = normalize(&Quaternion::new(f64::NAN, 0.0, 0.0, 0.0));
        assert_eq!(q, UnitQuaternion::identity());

        let q = normalize(&Quaternion::new(2.0, 0.0, 0.0, 0.0));
        assert_relative_eq!(q.w, 1.0);
    }

    #[test]
    fn test_kinematic_rate_identity() {
        let q = Quaternion::identity();
        let rate = kinematic_rate(&q, &Vector3::new(0.2, -0.4, 0.6));
        assert_relative_eq!(rate.w, 0.0);
        assert_relative_eq!(rate.i, 0.1);
        assert_relative_eq!(rate.j, -0.2);
        assert_relative_eq!(rate.k, 0.3);
    }

    #[test]
    fn test_attitude_error() {
        let current = UnitQuaternion::identity();
        let desired = UnitQuaternion::from_axis_angle(&Vector3::x_axis(), 0.3);
        assert_relative_eq!(
            attitude_error(&desired, &current),
            Vector3::new(0.3, 0.0, 0.0),
            epsilon = 1e-12
        );

        // Sign-flipped desired quaternion is the same rotation
        let flipped = UnitQuaternion::new_unchecked(-desired.into_inner());
        assert_relative_eq!(
            attitude_error(&flipped, &current),
            Vector3::new(0.3, 0.0, 0.0),
            epsilon = 1e-12
        );

        assert_relative_eq!(attitude_error(&desired, &desired), Vector3::zeros());
    }
}
