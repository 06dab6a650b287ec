use std::io;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use tvc_sim::export::write_csv;
use tvc_sim::{GimbalCommand, Session, SessionCommand, StepOutcome, VehicleConfig};

// Boost with a short gimbal kick, stage, then coast to the ground.
// The trajectory is written to stdout as CSV.
fn main() -> tvc_sim::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let mut session = Session::new(VehicleConfig::default())?;
    let boost_time = 4.0;
    let mut records = vec![session.record()];

    loop {
        let t = session.time();
        if t >= boost_time && session.is_engine_lit() {
            session.stage()?;
        }

        let gimbal = if (1.0..1.5).contains(&t) {
            GimbalCommand::from_degrees(-0.5, 0.0)
        } else {
            GimbalCommand::default()
        };

        let outcome = session.advance(&SessionCommand::manual(gimbal, 1.0))?;
        records.push(session.record());

        match outcome {
            StepOutcome::Flight => {}
            StepOutcome::Landed => {
                eprintln!("landed at t={:.2}s", session.time());
                break;
            }
            StepOutcome::Impact { speed, .. } => {
                let stats = session.stats();
                eprintln!(
                    "impact at t={:.2}s, {:.1} m/s; apogee {:.1} m, path {:.1} m",
                    session.time(),
                    speed,
                    stats.max_altitude,
                    stats.total_distance
                );
                break;
            }
        }
    }

    write_csv(io::stdout().lock(), &records)
}
