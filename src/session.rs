//! Simulation session: the boundary between the physics core and a driver.
//!
//! A [`Session`] owns one vehicle state, its configuration, the attitude
//! controller memory and the engine state. The driver calls
//! [`Session::advance`] once per tick with an explicit [`SessionCommand`] and
//! reacts to the returned [`StepOutcome`]. Independent sessions share nothing,
//! so parallel what-if runs are just separate values.

use nalgebra::{UnitQuaternion, Vector3};
use tracing::{debug, info, warn};

use crate::config::VehicleConfig;
use crate::control::{AttitudeController, Setpoint};
use crate::error::{Result, SimError};
use crate::export::StateRecord;
use crate::integrator;
use crate::state::{self, VehicleState};
use crate::thrust::GimbalCommand;

/// How the gimbal is driven this tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Steering {
    /// Gimbal angles set directly by the driver
    Manual(GimbalCommand),
    /// Gimbal angles computed by the session's attitude controller
    Hold(Setpoint),
}

/// Everything the driver supplies for one tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SessionCommand {
    pub steering: Steering,
    /// Fraction of base thrust; floored at `min_throttle`, capped at 1
    pub throttle: f64,
}

impl SessionCommand {
    pub fn manual(gimbal: GimbalCommand, throttle: f64) -> Self {
        Self {
            steering: Steering::Manual(gimbal),
            throttle,
        }
    }

    pub fn hold(setpoint: Setpoint, throttle: f64) -> Self {
        Self {
            steering: Steering::Hold(setpoint),
            throttle,
        }
    }
}

/// Ground-contact classification after a step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum StepOutcome {
    /// Airborne
    Flight,
    /// At or below ground at low speed; altitude clamped and velocity zeroed
    Landed,
    /// Hit the ground too fast; the session stops accepting ticks
    Impact { altitude: f64, speed: f64 },
}

/// Classifies altitude and speed against the configured thresholds.
pub fn classify_ground_contact(altitude: f64, speed: f64, config: &VehicleConfig) -> StepOutcome {
    if altitude <= config.ground_epsilon && speed > config.impact_speed {
        StepOutcome::Impact { altitude, speed }
    } else if altitude <= 0.0 {
        StepOutcome::Landed
    } else {
        StepOutcome::Flight
    }
}

/// Classifies `state` and, on a soft landing, rests it on the ground.
///
/// Only altitude and velocity change; attitude, rates and mass are kept.
pub fn apply_ground_contact(state: &mut VehicleState, config: &VehicleConfig) -> StepOutcome {
    let outcome = classify_ground_contact(state.altitude(), state.speed(), config);
    if outcome == StepOutcome::Landed {
        state.position.z = 0.0;
        state.velocity = Vector3::zeros();
    }
    outcome
}

/// Step API: advances `state` by `dt` with a gimbal command and throttle.
///
/// Thrust is `base_thrust × clamp(throttle, min_throttle, 1)`. The input
/// state is never modified; invalid parameters, including an invalid
/// `config`, are reported before any integration. Ground contact is a
/// session concern and is not applied here.
pub fn advance(
    state: &VehicleState,
    config: &VehicleConfig,
    gimbal: &GimbalCommand,
    throttle: f64,
    dt: f64,
) -> Result<VehicleState> {
    config.validate()?;
    let thrust = config.commanded_thrust(throttle)?;
    integrator::step(state, config, gimbal, thrust, dt)
}

/// Running flight statistics.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FlightStats {
    pub max_altitude: f64,
    pub max_speed: f64,
    /// Path length travelled (m)
    pub total_distance: f64,
}

impl FlightStats {
    fn record(&mut self, previous: &VehicleState, current: &VehicleState) {
        self.max_altitude = self.max_altitude.max(current.altitude());
        self.max_speed = self.max_speed.max(current.speed());
        self.total_distance += (current.position - previous.position).norm();
    }
}

/// A staging event: when and where mass was dropped.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StageEvent {
    pub t: f64,
    pub position: Vector3<f64>,
}

#[derive(Clone, Debug)]
pub struct Session {
    config: VehicleConfig,
    state: VehicleState,
    initial_attitude: UnitQuaternion<f64>,
    controller: AttitudeController,
    time: f64,
    engine_lit: bool,
    terminated: bool,
    last_outcome: StepOutcome,
    stats: FlightStats,
    stage_events: Vec<StageEvent>,
}

impl Session {
    /// Starts a session at the configured default launch attitude.
    pub fn new(config: VehicleConfig) -> Result<Self> {
        let attitude = state::default_attitude(config.initial_pitch);
        Self::with_attitude(config, attitude)
    }

    /// Starts a session at rest with a caller-supplied attitude.
    pub fn with_attitude(config: VehicleConfig, attitude: UnitQuaternion<f64>) -> Result<Self> {
        config.validate()?;
        let state = VehicleState::at_rest(attitude, config.initial_mass);
        Ok(Self {
            config,
            state,
            initial_attitude: attitude,
            controller: AttitudeController::default(),
            time: 0.0,
            engine_lit: true,
            terminated: false,
            last_outcome: StepOutcome::Flight,
            stats: FlightStats::default(),
            stage_events: Vec::new(),
        })
    }

    /// Replaces the attitude controller (and its gains).
    pub fn with_controller(mut self, controller: AttitudeController) -> Self {
        self.controller = controller;
        self
    }

    pub fn config(&self) -> &VehicleConfig {
        &self.config
    }

    pub fn state(&self) -> &VehicleState {
        &self.state
    }

    pub fn controller(&self) -> &AttitudeController {
        &self.controller
    }

    /// Simulated time since start or last reset (s).
    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn stats(&self) -> &FlightStats {
        &self.stats
    }

    pub fn stage_events(&self) -> &[StageEvent] {
        &self.stage_events
    }

    pub fn is_engine_lit(&self) -> bool {
        self.engine_lit
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    /// Current export row.
    pub fn record(&self) -> StateRecord {
        StateRecord::from_state(self.time, &self.state)
    }

    /// Thrust the engine delivers for `throttle` in the current engine state.
    pub fn thrust_for(&self, throttle: f64) -> Result<f64> {
        let thrust = self.config.commanded_thrust(throttle)?;
        Ok(if self.engine_lit { thrust } else { 0.0 })
    }

    /// Advances the session by one configured timestep.
    ///
    /// # Returns
    ///
    /// * `Ok(StepOutcome)` - The ground-contact classification of the new state
    /// * `Err(SimError)` - Invalid command, numerical divergence, or a session
    ///   already ended by impact. The session is unchanged on error.
    pub fn advance(&mut self, command: &SessionCommand) -> Result<StepOutcome> {
        if self.terminated {
            return Err(SimError::SessionTerminated);
        }

        let dt = self.config.dt;
        let thrust = self.thrust_for(command.throttle)?;

        // Controller memory is committed only once the step succeeds
        let mut controller = self.controller.clone();
        let gimbal = match &command.steering {
            Steering::Manual(gimbal) => *gimbal,
            Steering::Hold(setpoint) => {
                controller.gimbal_command(setpoint, &self.state, thrust, &self.config, dt)?
            }
        };

        let mut next = integrator::step(&self.state, &self.config, &gimbal, thrust, dt)?;
        let outcome = apply_ground_contact(&mut next, &self.config);

        self.stats.record(&self.state, &next);
        self.state = next;
        self.controller = controller;
        self.time += dt;

        match outcome {
            StepOutcome::Impact { altitude, speed } => {
                self.terminated = true;
                warn!(t = self.time, altitude, speed, "hard impact, session terminated");
            }
            StepOutcome::Landed if self.last_outcome != StepOutcome::Landed => {
                info!(t = self.time, "vehicle landed");
            }
            StepOutcome::Flight if self.last_outcome == StepOutcome::Landed => {
                debug!(t = self.time, "vehicle lifted off");
            }
            _ => {}
        }
        self.last_outcome = outcome;

        Ok(outcome)
    }

    /// Staging: drops `stage_mass_drop` kg (clamped at zero) and cuts thrust
    /// until the next reset. Position, velocity and attitude are untouched.
    ///
    /// Fails with `SessionTerminated` after a hard impact, leaving the
    /// session untouched.
    pub fn stage(&mut self) -> Result<StageEvent> {
        if self.terminated {
            return Err(SimError::SessionTerminated);
        }
        self.state.drop_mass(self.config.stage_mass_drop);
        self.engine_lit = false;

        let event = StageEvent {
            t: self.time,
            position: self.state.position,
        };
        self.stage_events.push(event);
        info!(t = self.time, mass = self.state.mass, "stage separation");
        Ok(event)
    }

    /// Replaces the state with a fresh launch state at the session's initial
    /// attitude and clears engine cut, time, statistics, stage events,
    /// controller memory and the impact flag.
    pub fn reset(&mut self) {
        self.reset_with_attitude(self.initial_attitude);
    }

    /// Like [`reset`](Self::reset) with a new initial attitude.
    pub fn reset_with_attitude(&mut self, attitude: UnitQuaternion<f64>) {
        self.initial_attitude = attitude;
        self.state = VehicleState::at_rest(attitude, self.config.initial_mass);
        self.controller.reset();
        self.time = 0.0;
        self.engine_lit = true;
        self.terminated = false;
        self.last_outcome = StepOutcome::Flight;
        self.stats = FlightStats::default();
        self.stage_events.clear();
        debug!("session reset");
    }
}
