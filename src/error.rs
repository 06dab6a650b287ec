use thiserror::Error;

/// Errors surfaced by the simulation core.
///
/// Parameter errors are raised before any state is touched, so a caller that
/// receives one still holds the previous, valid state.
#[derive(Debug, Error)]
pub enum SimError {
    #[error("invalid timestep {0}: must be finite and > 0")]
    InvalidTimestep(f64),
    #[error("invalid gimbal command ({gx}, {gy}): angles must be finite")]
    InvalidGimbal { gx: f64, gy: f64 },
    #[error("invalid throttle {0}: must be finite and >= 0")]
    InvalidThrottle(f64),
    #[error("invalid thrust {0} N: must be finite and >= 0")]
    InvalidThrust(f64),
    #[error("invalid config field `{field}`: {reason}")]
    InvalidConfig {
        field: &'static str,
        reason: &'static str,
    },
    #[error("state became non-finite during integration")]
    NumericalDivergence,
    #[error("session ended by hard impact; reset before advancing")]
    SessionTerminated,
    #[error("config parse error: {0}")]
    Config(#[from] serde_json::Error),
    #[error("export error: {0}")]
    Export(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, SimError>;

/// Rejects timesteps that are zero, negative or not finite.
pub fn check_timestep(dt: f64) -> Result<()> {
    if dt.is_finite() && dt > 0.0 {
        Ok(())
    } else {
        Err(SimError::InvalidTimestep(dt))
    }
}
