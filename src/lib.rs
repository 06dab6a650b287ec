//! Six-degree-of-freedom flight dynamics for a thrust-vector-controlled rocket.
//!
//! The vehicle is a rigid body with a gimballed engine at the tail. Its state
//! is advanced in fixed RK4 steps by [`session::advance`] or through a
//! stateful [`Session`] that also handles ground contact, staging and the
//! attitude-hold controller.

pub mod config;
pub mod control;
pub mod dynamics;
pub mod error;
pub mod export;
pub mod integrator;
pub mod quaternion;
pub mod session;
pub mod state;
pub mod thrust;

pub use config::VehicleConfig;
pub use control::{AttitudeController, PidGains, Setpoint};
pub use error::{Result, SimError};
pub use export::StateRecord;
pub use session::{Session, SessionCommand, StageEvent, Steering, StepOutcome};
pub use state::VehicleState;
pub use thrust::GimbalCommand;
