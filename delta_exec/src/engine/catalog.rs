//! # Command catalog
//!
//! Every operation a script can invoke, as a typed command with explicit optional parameters.
//! Commands are built either by the script binding or directly (e.g. deserialised from JSON) and
//! are executed one at a time by a [`Run`](super::Run).
//!
//! Execution validates domains (pins, addresses, delays) through the store and appends one line to
//! the run's log for every command that changes state. Pure reads log nothing.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::debug;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use delta_if::{
    motion::{GlobalPoint, Pose},
    PinStatus, RegSize, TokenError, Value,
};

use super::{driver::ExecutionLog, CmdError, DelayMode};
use crate::store::{motion::MotionParam, points::PointRef, registers::wrap_to_width, RobotStore};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Everything a command needs while it executes.
pub struct CmdContext<'a> {
    pub store: &'a RobotStore,
    pub delay_mode: DelayMode,
    pub log: &'a mut ExecutionLog,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "cmd")]
pub enum Command {
    /// Read one local input.
    Di { pin: i64 },

    /// Read `length` local inputs as a bit field.
    DiMulti { pin: i64, length: i64 },

    /// Set one local output, reverting it after `delay` seconds if given.
    Do {
        pin: i64,
        status: PinStatus,
        #[serde(default)]
        delay: Option<f64>,
    },

    /// Set `length` local outputs from a bit field, inverting them after `delay` seconds if given.
    DoMulti {
        pin: i64,
        length: i64,
        bits: i64,
        #[serde(default)]
        delay: Option<f64>,
    },

    ExtDi { address: i64, pin: i64 },

    ExtDo {
        address: i64,
        pin: i64,
        status: PinStatus,
        #[serde(default)]
        delay: Option<f64>,
    },

    /// Move to a point with joint interpolation.
    MovP { point: PointRef },

    /// Move to a point with linear interpolation.
    MovL { point: PointRef },

    MovJ { joint: i64, degree: f64 },

    SetGlobalPoint {
        num: i64,
        name: String,
        pose: Pose,
        #[serde(default)]
        extra: Vec<Value>,
    },

    ReadPoint { point: PointRef, item: PointItem },

    SetParam { param: MotionParam },

    Wait {
        condition: WaitCondition,
        #[serde(default)]
        timeout_ms: Option<f64>,
    },

    Delay { seconds: f64 },

    ReadModbus { address: i64, size: RegSize },

    WriteModbus { address: i64, size: RegSize, value: i64 },

    Print { message: String },
}

/// Condition tested by `WAIT`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source")]
pub enum WaitCondition {
    Di {
        pin: i64,
        status: PinStatus,
    },
    Do {
        pin: i64,
        status: PinStatus,
    },
    ExtDi {
        address: i64,
        pin: i64,
        status: PinStatus,
    },
    ExtDo {
        address: i64,
        pin: i64,
        status: PinStatus,
    },
    Register {
        address: i64,
        size: RegSize,
        value: i64,
    },
}

/// Field of a global point readable with `ReadPoint`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointItem {
    X,
    Y,
    Z,
    Rx,
    Ry,
    Rz,
    Name,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl<'a> CmdContext<'a> {
    fn log(&mut self, line: String) {
        debug!("{}", line);
        self.log.push(line);
    }

    fn delay(&self, seconds: f64) {
        self.delay_mode.wait(seconds);
    }
}

impl Command {
    /// Name of the script function this command corresponds to.
    pub fn fn_name(&self) -> &'static str {
        match self {
            Command::Di { .. } | Command::DiMulti { .. } => "DI",
            Command::Do { .. } | Command::DoMulti { .. } => "DO",
            Command::ExtDi { .. } => "ExtDI",
            Command::ExtDo { .. } => "ExtDO",
            Command::MovP { .. } => "MovP",
            Command::MovL { .. } => "MovL",
            Command::MovJ { .. } => "MovJ",
            Command::SetGlobalPoint { .. } => "SetGlobalPoint",
            Command::ReadPoint { .. } => "ReadPoint",
            Command::SetParam { param } => param.kind().fn_name(),
            Command::Wait { .. } => "WAIT",
            Command::Delay { .. } => "DELAY",
            Command::ReadModbus { .. } => "ReadModbus",
            Command::WriteModbus { .. } => "WriteModbus",
            Command::Print { .. } => "print",
        }
    }

    /// Execute the command, returning the value the script call evaluates to.
    ///
    /// Any delay is taken between store operations, never while the store is locked.
    pub fn execute(&self, ctx: &mut CmdContext<'_>) -> Result<Value, CmdError> {
        let store = ctx.store;

        match self {
            Command::Di { pin } => Ok(status_value(store.get_input(*pin)?)),

            Command::DiMulti { pin, length } => Ok(Value::Int(store.get_inputs(*pin, *length)?)),

            Command::Do { pin, status, delay } => {
                let delay = check_delay(self.fn_name(), *delay)?;

                store.set_output(*pin, *status)?;
                ctx.log(format!("DO({}, {})", pin, status));

                if let Some(seconds) = delay {
                    ctx.delay(seconds);
                    store.set_output(*pin, !*status)?;
                    ctx.log(format!("DO({}, {}) after delay", pin, !*status));
                }
                Ok(Value::Nil)
            }

            Command::DoMulti {
                pin,
                length,
                bits,
                delay,
            } => {
                let delay = check_delay(self.fn_name(), *delay)?;

                store.set_outputs(*pin, *length, *bits)?;
                ctx.log(format!("DO({}, {}, {})", pin, length, bits));

                if let Some(seconds) = delay {
                    let inverted = !*bits & ((1 << *length) - 1);
                    ctx.delay(seconds);
                    store.set_outputs(*pin, *length, inverted)?;
                    ctx.log(format!("DO({}, {}, {}) after delay", pin, length, inverted));
                }
                Ok(Value::Nil)
            }

            Command::ExtDi { address, pin } => {
                Ok(status_value(store.get_external_input(*address, *pin)?))
            }

            Command::ExtDo {
                address,
                pin,
                status,
                delay,
            } => {
                let delay = check_delay(self.fn_name(), *delay)?;

                store.set_external_output(*address, *pin, *status)?;
                ctx.log(format!("ExtDO({}, {}, {})", address, pin, status));

                if let Some(seconds) = delay {
                    ctx.delay(seconds);
                    store.set_external_output(*address, *pin, !*status)?;
                    ctx.log(format!(
                        "ExtDO({}, {}, {}) after delay",
                        address, pin, !*status
                    ));
                }
                Ok(Value::Nil)
            }

            Command::MovP { point } | Command::MovL { point } => {
                let pose = store.move_to_point(point)?;
                ctx.log(format!(
                    "{}({}) -> ({}, {}, {})",
                    self.fn_name(),
                    point,
                    Value::Num(pose.x),
                    Value::Num(pose.y),
                    Value::Num(pose.z)
                ));
                Ok(Value::Nil)
            }

            Command::MovJ { joint, degree } => {
                store.set_joint(*joint, *degree)?;
                ctx.log(format!("MovJ(Joint {}, {}°)", joint, Value::Num(*degree)));
                Ok(Value::Nil)
            }

            Command::SetGlobalPoint {
                num,
                name,
                pose,
                extra,
            } => {
                store.set_point(
                    *num,
                    GlobalPoint {
                        name: name.clone(),
                        pose: *pose,
                        extra: extra.clone(),
                    },
                )?;
                ctx.log(format!(
                    "SetGlobalPoint({}, '{}', {}, {}, {})",
                    num,
                    name,
                    Value::Num(pose.x),
                    Value::Num(pose.y),
                    Value::Num(pose.z)
                ));
                Ok(Value::Nil)
            }

            Command::ReadPoint { point, item } => {
                let (_, data) = store.get_point(point)?;
                Ok(item.read(&data))
            }

            Command::SetParam { param } => {
                store.set_motion_param(*param)?;
                ctx.log(param.to_string());
                Ok(Value::Nil)
            }

            Command::Wait {
                condition,
                timeout_ms,
            } => {
                let timeout_ms = check_delay(self.fn_name(), *timeout_ms)?;

                if condition.holds(store)? {
                    ctx.log(condition.to_string());
                    return Ok(Value::Bool(true));
                }

                match timeout_ms {
                    Some(ms) => {
                        ctx.delay(ms / 1000.0);
                        ctx.log(format!("{} timeout after {} ms", condition, Value::Num(ms)));
                        Ok(Value::Bool(false))
                    }
                    None => Err(CmdError::WaitUnsatisfied(condition.to_string())),
                }
            }

            Command::Delay { seconds } => {
                check_delay(self.fn_name(), Some(*seconds))?;
                ctx.delay(*seconds);
                ctx.log(format!("DELAY({}s)", Value::Num(*seconds)));
                Ok(Value::Nil)
            }

            Command::ReadModbus { address, size } => {
                let value = store.read_register(*address, *size)?;
                ctx.log(format!(
                    "ReadModbus({}, {}) = {}",
                    hex_address(*address),
                    size,
                    value
                ));
                Ok(Value::Int(value))
            }

            Command::WriteModbus {
                address,
                size,
                value,
            } => {
                store.write_register(*address, *value, *size)?;
                ctx.log(format!(
                    "WriteModbus({}, {}, {})",
                    hex_address(*address),
                    size,
                    value
                ));
                Ok(Value::Nil)
            }

            Command::Print { message } => {
                ctx.log(format!("[PRINT] {}", message));
                Ok(Value::Nil)
            }
        }
    }
}

impl WaitCondition {
    /// Evaluate the condition once against the current store state.
    pub fn holds(&self, store: &RobotStore) -> Result<bool, CmdError> {
        Ok(match self {
            WaitCondition::Di { pin, status } => store.get_input(*pin)? == *status,
            WaitCondition::Do { pin, status } => store.get_output(*pin)? == *status,
            WaitCondition::ExtDi {
                address,
                pin,
                status,
            } => store.get_external_input(*address, *pin)? == *status,
            WaitCondition::ExtDo {
                address,
                pin,
                status,
            } => store.get_external_output(*address, *pin)? == *status,
            WaitCondition::Register {
                address,
                size,
                value,
            } => store.read_register(*address, *size)? == wrap_to_width(*value, *size),
        })
    }
}

/// Formats as the `WAIT` call, e.g. `WAIT(DI, 1, ON)`.
impl fmt::Display for WaitCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WaitCondition::Di { pin, status } => write!(f, "WAIT(DI, {}, {})", pin, status),
            WaitCondition::Do { pin, status } => write!(f, "WAIT(DO, {}, {})", pin, status),
            WaitCondition::ExtDi {
                address,
                pin,
                status,
            } => write!(f, "WAIT(ExtDI, {}, {}, {})", address, pin, status),
            WaitCondition::ExtDo {
                address,
                pin,
                status,
            } => write!(f, "WAIT(ExtDO, {}, {}, {})", address, pin, status),
            WaitCondition::Register {
                address,
                size,
                value,
            } => write!(
                f,
                "WAIT(MODBUS, {}, {}, {})",
                hex_address(*address),
                size,
                value
            ),
        }
    }
}

impl PointItem {
    pub fn read(self, point: &GlobalPoint) -> Value {
        match self {
            PointItem::X => Value::Num(point.pose.x),
            PointItem::Y => Value::Num(point.pose.y),
            PointItem::Z => Value::Num(point.pose.z),
            PointItem::Rx => Value::Num(point.pose.rx),
            PointItem::Ry => Value::Num(point.pose.ry),
            PointItem::Rz => Value::Num(point.pose.rz),
            PointItem::Name => Value::Str(point.name.clone()),
        }
    }
}

impl FromStr for PointItem {
    type Err = TokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "X" => Ok(PointItem::X),
            "Y" => Ok(PointItem::Y),
            "Z" => Ok(PointItem::Z),
            "RX" => Ok(PointItem::Rx),
            "RY" => Ok(PointItem::Ry),
            "RZ" => Ok(PointItem::Rz),
            "NAME" => Ok(PointItem::Name),
            _ => Err(TokenError {
                what: "point item",
                found: s.to_string(),
                expected: "X, Y, Z, RX, RY, RZ, NAME",
            }),
        }
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Check an optional delay is a finite, non-negative number.
fn check_delay(func: &'static str, delay: Option<f64>) -> Result<Option<f64>, CmdError> {
    match delay {
        Some(d) if !d.is_finite() || d < 0.0 => Err(CmdError::invalid(
            func,
            format!("delay must be a non-negative number (found {})", d),
        )),
        _ => Ok(delay),
    }
}

fn status_value(status: PinStatus) -> Value {
    Value::Str(status.to_string())
}

pub(crate) fn hex_address(address: i64) -> String {
    format!("{:#06X}", address)
}
