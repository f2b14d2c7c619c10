//! # External operation payloads
//!
//! Request and response shapes of the emulator's logical operations. The framing (HTTP routes,
//! sockets, files) is left to whichever transport sits in front of the emulator, these structures
//! only fix the data exchanged.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::{
    motion::{GlobalPoint, MotionSettings, Pose, NUM_JOINTS},
    PinStatus, RegSize, Value,
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Read one digital input, or `length` consecutive inputs as a bit field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiRequest {
    pub pin: i64,

    #[serde(default)]
    pub length: Option<i64>,
}

/// Set a digital output, optionally pulsing it for `delay` seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoRequest {
    pub pin: i64,
    pub status: String,

    #[serde(default)]
    pub delay: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoResponse {
    pub pin: i64,
    pub status: PinStatus,
    pub message: String,

    /// Status the output was left in after a pulse
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delayed_status: Option<PinStatus>,
}

/// State of every local digital output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoStatesResponse {
    pub do_states: BTreeMap<u32, PinStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegReadRequest {
    pub address: i64,
    pub size: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegReadResponse {
    /// Address formatted as `0xHHHH`
    pub address: String,
    pub size: RegSize,
    pub value: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegWriteRequest {
    pub address: i64,
    pub size: String,
    pub value: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegWriteResponse {
    pub address: String,
    pub size: RegSize,

    /// Value as stored, after wrapping into the access width
    pub value: i64,
    pub message: String,
}

/// Define (or redefine) a global point.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointSetRequest {
    pub point_num: i64,
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub z: f64,

    #[serde(default)]
    pub rx: f64,
    #[serde(default)]
    pub ry: f64,
    #[serde(default)]
    pub rz: f64,

    #[serde(default)]
    pub extra: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointSetResponse {
    pub point_num: i64,
    pub name: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointGetResponse {
    pub point_num: i64,
    pub data: GlobalPoint,
}

/// Position, joints and motion parameters of the arm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RobotStateResponse {
    pub position: Pose,
    pub joint_angles: [f64; NUM_JOINTS],
    pub motion_settings: MotionSettings,
}

/// Set one motion parameter, `kind` is the parameter's function name (`SpdJ`, `Accur`, ...).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MotionParamRequest {
    pub kind: String,
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MotionParamResponse {
    pub motion_settings: MotionSettings,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptExecuteRequest {
    pub script: String,
}

/// Robot state captured at the end of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RobotSnapshot {
    pub position: Pose,
    pub joint_angles: [f64; NUM_JOINTS],
    pub di_state: BTreeMap<u32, PinStatus>,
    pub do_state: BTreeMap<u32, PinStatus>,
    pub motion_settings: MotionSettings,
}

/// Failure reported by a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub kind: ErrorKind,
    pub message: String,

    /// Zero based index of the failing command within the run, if a command failed
    #[serde(default)]
    pub command_index: Option<usize>,

    /// Script line the failure was raised on, if known
    #[serde(default)]
    pub line: Option<usize>,
}

/// Outcome of executing a script or a command sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub status: RunStatus,
    pub error: Option<ErrorDetail>,
    pub output: Vec<String>,

    /// Number of commands that completed successfully
    pub commands_executed: usize,
    pub robot_state: RobotSnapshot,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptUploadResponse {
    pub filename: String,

    #[serde(flatten)]
    pub result: ExecutionResult,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DiResponse {
    Single { pin: i64, status: PinStatus },
    Multi { pin: i64, length: i64, value: i64 },
}

/// Terminal status of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RunStatus {
    /// Every command of the run was applied
    Completed,

    /// The run was aborted by a failing command, effects of earlier commands remain
    Failed,
}

/// Classification of the errors a run can fail with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// A value lies outside its valid domain (pin, address, point number, joint index)
    RangeError,

    /// A wrong type or unrecognised token was given
    InvalidArgument,

    /// A reference to an undefined point
    NotFound,

    /// A `WAIT` without timeout whose condition does not hold
    WaitUnsatisfied,

    /// The script could not be parsed or used an unknown function
    ScriptError,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl ExecutionResult {
    pub fn is_completed(&self) -> bool {
        self.status == RunStatus::Completed
    }
}
