//! # Robot state store
//!
//! The single source of truth for the emulated arm: digital I/O, register memory, global points and
//! the motion state. One store is shared (behind an `Arc`) by every run and every external
//! operation. Each operation takes the store's lock exactly once, so operations are atomic with
//! respect to each other and never observe a half-applied update.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

pub mod io;
pub mod motion;
pub mod points;
pub mod registers;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::warn;
use std::sync::{Mutex, MutexGuard};

use delta_if::{
    api::{ErrorKind, RobotSnapshot, RobotStateResponse},
    motion::{GlobalPoint, MotionSettings, Pose, NUM_JOINTS},
    PinStatus, RegSize, TokenError,
};

use self::{
    io::DigitalIo,
    motion::{ArmState, MotionParam},
    points::{PointRef, PointTable},
    registers::RegisterMemory,
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Thread safe robot state.
#[derive(Debug, Default)]
pub struct RobotStore {
    data: Mutex<StoreData>,
}

#[derive(Debug, Default)]
struct StoreData {
    io: DigitalIo,
    registers: RegisterMemory,
    points: PointTable,
    arm: ArmState,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StoreError {
    #[error("{what} {value} is out of range ({min}-{max})")]
    OutOfRange {
        what: &'static str,
        value: i64,
        min: i64,
        max: i64,
    },

    #[error(
        "Register address {0:#06X} is outside the valid ranges (0x1000-0x1FFF, 0x3000-0x3FFF)"
    )]
    AddressOutOfRange(i64),

    #[error("{0} must not be negative (found {1})")]
    Negative(&'static str, i64),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error(transparent)]
    InvalidToken(#[from] TokenError),

    #[error("Point {0} is not defined")]
    PointNotFound(PointRef),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl StoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            StoreError::OutOfRange { .. }
            | StoreError::AddressOutOfRange(_)
            | StoreError::Negative(..) => ErrorKind::RangeError,
            StoreError::InvalidArgument(_) | StoreError::InvalidToken(_) => {
                ErrorKind::InvalidArgument
            }
            StoreError::PointNotFound(_) => ErrorKind::NotFound,
        }
    }
}

impl RobotStore {
    /// Create a store in the power-on state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store in the power-on state with the given motion parameters.
    pub fn with_motion_settings(settings: MotionSettings) -> Self {
        Self {
            data: Mutex::new(StoreData {
                arm: ArmState::new(settings),
                ..Default::default()
            }),
        }
    }

    /// Take the lock.
    ///
    /// Every update validates before it mutates, so the data behind a poisoned lock is still
    /// consistent and is recovered rather than propagated.
    fn lock(&self) -> MutexGuard<'_, StoreData> {
        self.data.lock().unwrap_or_else(|poisoned| {
            warn!("Robot store lock was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    // ---- DIGITAL I/O ----

    pub fn set_output(&self, pin: i64, status: PinStatus) -> Result<(), StoreError> {
        self.lock().io.set_output(pin, status)
    }

    pub fn get_output(&self, pin: i64) -> Result<PinStatus, StoreError> {
        self.lock().io.output(pin)
    }

    /// Set `length` outputs starting at `pin` from a bit field.
    pub fn set_outputs(&self, pin: i64, length: i64, bits: i64) -> Result<(), StoreError> {
        self.lock().io.set_outputs(pin, length, bits)
    }

    pub fn get_outputs(&self, pin: i64, length: i64) -> Result<i64, StoreError> {
        self.lock().io.outputs(pin, length)
    }

    pub fn get_input(&self, pin: i64) -> Result<PinStatus, StoreError> {
        self.lock().io.input(pin)
    }

    /// Set a local input. Inputs are driven by the outside world, so this is only reachable from
    /// test harnesses and tooling, never from a script.
    pub fn set_input(&self, pin: i64, status: PinStatus) -> Result<(), StoreError> {
        self.lock().io.set_input(pin, status)
    }

    pub fn get_inputs(&self, pin: i64, length: i64) -> Result<i64, StoreError> {
        self.lock().io.inputs(pin, length)
    }

    pub fn get_external_input(&self, address: i64, pin: i64) -> Result<PinStatus, StoreError> {
        self.lock().io.external_input(address, pin)
    }

    pub fn set_external_input(
        &self,
        address: i64,
        pin: i64,
        status: PinStatus,
    ) -> Result<(), StoreError> {
        self.lock().io.set_external_input(address, pin, status)
    }

    pub fn get_external_output(&self, address: i64, pin: i64) -> Result<PinStatus, StoreError> {
        self.lock().io.external_output(address, pin)
    }

    pub fn set_external_output(
        &self,
        address: i64,
        pin: i64,
        status: PinStatus,
    ) -> Result<(), StoreError> {
        self.lock().io.set_external_output(address, pin, status)
    }

    pub fn output_states(&self) -> std::collections::BTreeMap<u32, PinStatus> {
        self.lock().io.output_states()
    }

    // ---- REGISTERS ----

    pub fn read_register(&self, address: i64, size: RegSize) -> Result<i64, StoreError> {
        self.lock().registers.read(address, size)
    }

    /// Write a register, returning the value as stored after wrapping to the access width.
    pub fn write_register(
        &self,
        address: i64,
        value: i64,
        size: RegSize,
    ) -> Result<i64, StoreError> {
        self.lock().registers.write(address, value, size)
    }

    // ---- POINTS ----

    pub fn set_point(&self, num: i64, point: GlobalPoint) -> Result<(), StoreError> {
        self.lock().points.set(num, point)
    }

    /// Look up a point, returning its number and a copy of its definition.
    pub fn get_point(&self, point: &PointRef) -> Result<(i64, GlobalPoint), StoreError> {
        self.lock()
            .points
            .get(point)
            .map(|(num, p)| (num, p.clone()))
    }

    /// Every defined point in ascending point number order.
    pub fn points(&self) -> Vec<(i64, GlobalPoint)> {
        self.lock()
            .points
            .iter()
            .map(|(num, p)| (num, p.clone()))
            .collect()
    }

    // ---- MOTION ----

    pub fn set_pose(&self, pose: Pose) -> Result<(), StoreError> {
        self.lock().arm.set_pose(pose)
    }

    pub fn get_pose(&self) -> Pose {
        self.lock().arm.pose
    }

    pub fn get_joint_angles(&self) -> [f64; NUM_JOINTS] {
        self.lock().arm.joints
    }

    pub fn get_motion_params(&self) -> MotionSettings {
        self.lock().arm.settings
    }

    /// Move the tool centre point to a stored point, returning the point's pose.
    ///
    /// Lookup and move happen under one lock so a concurrent redefinition cannot interleave.
    pub fn move_to_point(&self, point: &PointRef) -> Result<Pose, StoreError> {
        let mut data = self.lock();
        let pose = data.points.get(point)?.1.pose;
        data.arm.set_pose(pose)?;
        Ok(pose)
    }

    pub fn set_joint(&self, joint: i64, degrees: f64) -> Result<(), StoreError> {
        self.lock().arm.set_joint(joint, degrees)
    }

    pub fn set_motion_param(&self, param: MotionParam) -> Result<(), StoreError> {
        self.lock().arm.set_param(param)
    }

    // ---- SNAPSHOTS ----

    pub fn robot_state(&self) -> RobotStateResponse {
        let data = self.lock();
        RobotStateResponse {
            position: data.arm.pose,
            joint_angles: data.arm.joints,
            motion_settings: data.arm.settings,
        }
    }

    /// Consistent copy of the whole observable state, taken under a single lock.
    pub fn snapshot(&self) -> RobotSnapshot {
        let data = self.lock();
        RobotSnapshot {
            position: data.arm.pose,
            joint_angles: data.arm.joints,
            di_state: data.io.input_states(),
            do_state: data.io.output_states(),
            motion_settings: data.arm.settings,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::{sync::Arc, thread};

    #[test]
    fn test_error_kinds() {
        let store = RobotStore::new();

        assert_eq!(
            store.set_output(13, PinStatus::On).unwrap_err().kind(),
            ErrorKind::RangeError
        );
        assert_eq!(
            store.read_register(0x2000, RegSize::W).unwrap_err().kind(),
            ErrorKind::RangeError
        );
        assert_eq!(
            store.move_to_point(&999.into()).unwrap_err().kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            StoreError::from("HIGH".parse::<PinStatus>().unwrap_err()).kind(),
            ErrorKind::InvalidArgument
        );
    }

    #[test]
    fn test_set_outputs_replaces_field() {
        let store = RobotStore::new();

        store.set_output(2, PinStatus::On).unwrap();
        assert_eq!(store.get_outputs(1, 4), Ok(0b0010));
        store.set_outputs(1, 4, 0b1001).unwrap();
        assert_eq!(store.get_outputs(1, 4), Ok(0b1001));
        assert_eq!(store.get_output(2), Ok(PinStatus::Off));
    }

    #[test]
    fn test_move_to_point() {
        let store = RobotStore::with_motion_settings(MotionSettings {
            spdl: 500.0,
            ..Default::default()
        });
        let pose = Pose {
            x: 200.0,
            y: 200.0,
            z: -100.0,
            ..Default::default()
        };

        store
            .set_point(
                1,
                GlobalPoint {
                    name: "GL_P1".into(),
                    pose,
                    extra: vec![],
                },
            )
            .unwrap();

        assert_eq!(store.move_to_point(&"GL_P1".into()), Ok(pose));
        assert_eq!(store.get_pose(), pose);
        assert_eq!(store.robot_state().position, pose);
        assert_eq!(store.get_motion_params().spdl, 500.0);

        store.set_joint(2, 30.0).unwrap();
        assert_eq!(store.get_joint_angles()[1], 30.0);

        assert!(store.set_pose(Pose::default()).is_ok());
        assert!(store
            .set_pose(Pose {
                y: f64::INFINITY,
                ..Default::default()
            })
            .is_err());
        assert_eq!(store.get_pose(), Pose::default());
    }

    #[test]
    fn test_concurrent_outputs() {
        let store = Arc::new(RobotStore::new());

        let handles: Vec<_> = (1..=12)
            .map(|pin| {
                let store = store.clone();
                thread::spawn(move || {
                    for i in 0..100 {
                        store.set_output(pin, PinStatus::from(i % 2 == 0)).unwrap();
                    }
                })
            })
            .collect();

        for h in handles {
            h.join().unwrap();
        }

        // Each thread's last write was OFF
        assert!(store.snapshot().do_state.values().all(|s| !s.is_on()));
        assert_eq!(store.snapshot().do_state.len(), 12);
    }
}
