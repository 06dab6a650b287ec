//! Flat export rows for logging and CSV interop.
//!
//! The column set and order is fixed:
//! `t, x, y, z, vx, vy, vz, qx, qy, qz, qw, mass`.
//! Angular velocity is tracked by the state but not exported.
//!
//! The four quaternion columns carry the state-vector slots in order, which
//! is scalar-first: `qx` holds w, `qy` holds x, `qz` holds y and `qw` holds z.
//! Existing CSV logs use this layout, so the labels are kept as they are.

use std::io;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::quaternion;
use crate::state::VehicleState;

/// Export header, in column order.
pub const COLUMNS: [&str; 12] = [
    "t", "x", "y", "z", "vx", "vy", "vz", "qx", "qy", "qz", "qw", "mass",
];

/// One exported sample. Field order is the column order.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct StateRecord {
    pub t: f64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub vx: f64,
    pub vy: f64,
    pub vz: f64,
    pub qx: f64,
    pub qy: f64,
    pub qz: f64,
    pub qw: f64,
    pub mass: f64,
}

impl StateRecord {
    pub fn from_state(t: f64, state: &VehicleState) -> Self {
        let [q0, q1, q2, q3] = quaternion::to_components(state.attitude.quaternion());
        Self {
            t,
            x: state.position.x,
            y: state.position.y,
            z: state.position.z,
            vx: state.velocity.x,
            vy: state.velocity.y,
            vz: state.velocity.z,
            qx: q0,
            qy: q1,
            qz: q2,
            qw: q3,
            mass: state.mass,
        }
    }

    /// Values in [`COLUMNS`] order.
    pub fn to_row(&self) -> [f64; 12] {
        [
            self.t, self.x, self.y, self.z, self.vx, self.vy, self.vz, self.qx, self.qy, self.qz,
            self.qw, self.mass,
        ]
    }
}

/// Writes the header followed by one line per record.
///
/// The header is written even when `records` is empty.
pub fn write_csv<'a, W, I>(writer: W, records: I) -> Result<()>
where
    W: io::Write,
    I: IntoIterator<Item = &'a StateRecord>,
{
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);

    wtr.write_record(COLUMNS)?;
    for record in records {
        wtr.serialize(record)?;
    }
    wtr.flush().map_err(csv::Error::from)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::{UnitQuaternion, Vector3};

    fn sample_state() -> VehicleState {
        VehicleState {
            position: Vector3::new(1.0, 2.0, 3.0),
            velocity: Vector3::new(-1.0, 0.5, 4.0),
            attitude: UnitQuaternion::from_axis_angle(&Vector3::y_axis(), 0.2),
            angular_velocity: Vector3::new(9.0, 9.0, 9.0),
            mass: 88.0,
        }
    }

    #[test]
    fn test_record_keeps_state_slot_order() {
        let state = sample_state();
        let record = StateRecord::from_state(1.5, &state);
        let slots = state.to_array();

        // scalar-first slots 6..10 land in qx, qy, qz, qw
        assert_eq!(
            [record.qx, record.qy, record.qz, record.qw],
            [slots[6], slots[7], slots[8], slots[9]]
        );
        assert_eq!(record.qx, state.attitude.quaternion().w);
        assert_eq!(
            record.to_row(),
            [1.5, 1.0, 2.0, 3.0, -1.0, 0.5, 4.0, slots[6], slots[7], slots[8], slots[9], 88.0]
        );
    }

    #[test]
    fn test_launch_attitude_row() {
        let config = crate::config::VehicleConfig::default();
        let record = StateRecord::from_state(0.0, &VehicleState::initial(&config));
        let half = config.initial_pitch / 2.0;

        assert_relative_eq!(record.qx, half.cos(), epsilon = 1e-15);
        assert_relative_eq!(record.qy, 0.0);
        assert_relative_eq!(record.qz, half.sin(), epsilon = 1e-15);
        assert_relative_eq!(record.qw, 0.0);
    }

    #[test]
    fn test_csv_layout() {
        let records = [
            StateRecord::from_state(0.0, &sample_state()),
            StateRecord::from_state(0.01, &sample_state()),
        ];
        let mut out = Vec::new();
        write_csv(&mut out, &records).unwrap();

        let text = String::from_utf8(out).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("t,x,y,z,vx,vy,vz,qx,qy,qz,qw,mass")
        );

        let row: Vec<f64> = lines
            .next()
            .unwrap()
            .split(',')
            .map(|v| v.parse().unwrap())
            .collect();
        assert_eq!(row, records[0].to_row().to_vec());
        assert_eq!(lines.count(), 1);
    }

    #[test]
    fn test_csv_header_without_rows() {
        let mut out = Vec::new();
        write_csv(&mut out, std::iter::empty::<&StateRecord>()).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "t,x,y,z,vx,vy,vz,qx,qy,qz,qw,mass\n"
        );
    }
}
