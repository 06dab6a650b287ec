use nalgebra::UnitQuaternion;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use tvc_sim::{AttitudeController, PidGains, Session, SessionCommand, Setpoint, VehicleConfig};

fn main() -> tvc_sim::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = VehicleConfig::default();
    let simulation_span = 10.0; // seconds
    let report_every = (1.0 / config.dt).round() as usize;

    let controller = AttitudeController::new(PidGains::uniform(400.0, 20.0, 300.0), 0.5);
    let mut session = Session::new(config)?.with_controller(controller);

    // Launch tilted, then hold vertical at 70% throttle
    let command = SessionCommand::hold(Setpoint::Attitude(UnitQuaternion::identity()), 0.7);

    let mut tick = 0;
    while session.time() < simulation_span {
        session.advance(&command)?;
        tick += 1;

        if tick % report_every == 0 {
            let state = session.state();
            let (roll, pitch, yaw) = state.euler_angles();
            println!(
                "t={:5.2}  alt={:8.2}  speed={:7.2}  rpy=({:6.3}, {:6.3}, {:6.3}) deg  mass={:.2}",
                session.time(),
                state.altitude(),
                state.speed(),
                roll.to_degrees(),
                pitch.to_degrees(),
                yaw.to_degrees(),
                state.mass
            );
        }
    }

    Ok(())
}
