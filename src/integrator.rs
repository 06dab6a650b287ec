//! Numerical integration of the vehicle dynamics.
//!
//! [`step`] is the fixed-step path used by sessions: classical RK4 followed by
//! restoring the state invariants. [`integrate_adaptive`] runs the same
//! dynamics through fast_ode's adaptive solver and serves as a reference.

use fast_ode;

use crate::config::VehicleConfig;
use crate::dynamics::TvcOde;
use crate::error::{check_timestep, Result, SimError};
use crate::state::VehicleState;
use crate::thrust::GimbalCommand;

/// One classical 4th-order Runge-Kutta step for any fast_ode system.
///
/// Stages are evaluated at `t`, `t + dt/2` (twice) and `t + dt` and combined
/// with weights (1, 2, 2, 1)/6. Fails with `NumericalDivergence` as soon as a
/// stage reports a non-finite derivative.
pub fn rk4_step<const N: usize, D>(ode: &D, t: f64, y: &[f64; N], dt: f64) -> Result<[f64; N]>
where
    D: fast_ode::DifferentialEquation<N>,
{
    check_timestep(dt)?;

    let eval = |t: f64, y: [f64; N]| -> Result<[f64; N]> {
        let (dy, ok) = ode.ode_dot_y(t, &fast_ode::Coord(y));
        if ok {
            Ok(dy.0)
        } else {
            Err(SimError::NumericalDivergence)
        }
    };

    let k1 = eval(t, *y)?;
    let k2 = eval(t + dt / 2.0, offset(y, &k1, dt / 2.0))?;
    let k3 = eval(t + dt / 2.0, offset(y, &k2, dt / 2.0))?;
    let k4 = eval(t + dt, offset(y, &k3, dt))?;

    let mut next = *y;
    for i in 0..N {
        next[i] += (k1[i] + 2.0 * k2[i] + 2.0 * k3[i] + k4[i]) * (dt / 6.0);
    }
    Ok(next)
}

fn offset<const N: usize>(y: &[f64; N], k: &[f64; N], h: f64) -> [f64; N] {
    let mut out = *y;
    for (o, k) in out.iter_mut().zip(k.iter()) {
        *o += k * h;
    }
    out
}

/// Advances the vehicle by one fixed timestep.
///
/// # Arguments
///
/// * `state` - Current state (unchanged on failure)
/// * `config` - Vehicle parameters
/// * `gimbal` - Commanded deflection, clamped to `config.max_gimbal`
/// * `thrust` - Thrust magnitude (N), held over the whole step
/// * `dt` - Timestep (s), used for all four stages
///
/// # Returns
///
/// The next state with a renormalized attitude and a mass that never drops
/// below dry mass through burning, or an error for invalid parameters
/// (including a config that fails [`VehicleConfig::validate`]) or a
/// non-finite result.
pub fn step(
    state: &VehicleState,
    config: &VehicleConfig,
    gimbal: &GimbalCommand,
    thrust: f64,
    dt: f64,
) -> Result<VehicleState> {
    check_timestep(dt)?;
    config.validate()?;
    if !thrust.is_finite() || thrust < 0.0 {
        return Err(SimError::InvalidThrust(thrust));
    }
    let gimbal = gimbal.clamped(config.max_gimbal)?;

    let ode = TvcOde::new(config, gimbal, thrust);
    let y = rk4_step(&ode, 0.0, &state.to_array(), dt)?;
    if y.iter().any(|v| !v.is_finite()) {
        return Err(SimError::NumericalDivergence);
    }

    let mut next = VehicleState::from_array(&y);
    if state.mass >= config.dry_mass {
        next.mass = next.mass.max(config.dry_mass);
    }
    Ok(next)
}

/// Integrates over `time_span` with fast_ode's adaptive solver.
///
/// Gimbal and thrust are held constant. The attitude is renormalized only at
/// the end, so this is meant for short spans and cross-checks rather than
/// session stepping.
pub fn integrate_adaptive(
    state: &VehicleState,
    config: &VehicleConfig,
    gimbal: &GimbalCommand,
    thrust: f64,
    time_span: (f64, f64),
    tolerance: f64,
) -> Result<VehicleState> {
    check_timestep(time_span.1 - time_span.0)?;
    config.validate()?;
    if !thrust.is_finite() || thrust < 0.0 {
        return Err(SimError::InvalidThrust(thrust));
    }
    let gimbal = gimbal.clamped(config.max_gimbal)?;
    let ode = TvcOde::new(config, gimbal, thrust);

    let initial_coord = fast_ode::Coord(state.to_array());

    let result = fast_ode::solve_ivp(
        &ode,
        time_span,
        initial_coord,
        |_, _| true,
        tolerance,
        tolerance * 10.0,
    );

    match result {
        fast_ode::IvpResult::FinalTimeReached(final_coord) => {
            Ok(VehicleState::from_array(&final_coord.0))
        }
        _ => Err(SimError::NumericalDivergence),
    }
}
