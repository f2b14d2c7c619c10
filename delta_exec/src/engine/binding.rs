//! # Script binding
//!
//! Maps a script call (function name plus dynamically typed arguments) onto a typed [`Command`].
//! Only arity and argument types are checked here, domains are checked when the command executes.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::str::FromStr;

use delta_if::{motion::Pose, MotionParamKind, PinStatus, RegSize, TokenError, Value};

use super::{
    catalog::{Command, PointItem, WaitCondition},
    CmdError,
};
use crate::store::{motion::MotionParam, points::PointRef};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Names of every function a script may call.
pub const CATALOG_FNS: &[&str] = &[
    "DI",
    "DO",
    "ExtDI",
    "ExtDO",
    "MovP",
    "MovL",
    "MovJ",
    "SetGlobalPoint",
    "ReadPoint",
    "SpdJ",
    "AccJ",
    "DecJ",
    "SpdL",
    "AccL",
    "DecL",
    "Accur",
    "WAIT",
    "DELAY",
    "ReadModbus",
    "WriteModbus",
    "print",
];

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Typed accessors over the arguments of one call.
///
/// Missing trailing arguments read as `nil`.
struct Args<'a> {
    func: &'static str,
    values: &'a [Value],
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Find the catalog entry for a function name. Names are case sensitive.
pub fn lookup(name: &str) -> Option<&'static str> {
    CATALOG_FNS.iter().copied().find(|f| *f == name)
}

/// Bind a call to a catalog function.
pub fn bind(func: &'static str, values: &[Value]) -> Result<Command, CmdError> {
    let args = Args { func, values };

    match func {
        "DI" => {
            args.arity(1, 2)?;
            let pin = args.int(0, "pin")?;
            match args.opt_int(1, "length")? {
                None => Ok(Command::Di { pin }),
                Some(length) => Ok(Command::DiMulti { pin, length }),
            }
        }

        "DO" => {
            let pin = args.int(0, "pin")?;
            if let Value::Str(_) = args.get(1) {
                args.arity(2, 3)?;
                Ok(Command::Do {
                    pin,
                    status: args.status(1)?,
                    delay: args.opt_num(2, "delay")?,
                })
            } else {
                args.arity(3, 4)?;
                Ok(Command::DoMulti {
                    pin,
                    length: args.int(1, "length")?,
                    bits: args.int(2, "bits")?,
                    delay: args.opt_num(3, "delay")?,
                })
            }
        }

        "ExtDI" => {
            args.arity(2, 2)?;
            Ok(Command::ExtDi {
                address: args.int(0, "address")?,
                pin: args.int(1, "pin")?,
            })
        }

        "ExtDO" => {
            args.arity(3, 4)?;
            Ok(Command::ExtDo {
                address: args.int(0, "address")?,
                pin: args.int(1, "pin")?,
                status: args.status(2)?,
                delay: args.opt_num(3, "delay")?,
            })
        }

        "MovP" | "MovL" => {
            args.arity(1, 1)?;
            let point = args.point(0)?;
            Ok(if func == "MovP" {
                Command::MovP { point }
            } else {
                Command::MovL { point }
            })
        }

        "MovJ" => {
            args.arity(2, 2)?;
            Ok(Command::MovJ {
                joint: args.int(0, "joint")?,
                degree: args.num(1, "degree")?,
            })
        }

        "SetGlobalPoint" => {
            if values.len() < 5 {
                return Err(args.invalid(format!(
                    "expected at least 5 arguments, found {}",
                    values.len()
                )));
            }
            Ok(Command::SetGlobalPoint {
                num: args.int(0, "point number")?,
                name: args.text(1, "name")?.to_string(),
                pose: Pose {
                    x: args.num(2, "x")?,
                    y: args.num(3, "y")?,
                    z: args.num(4, "z")?,
                    rx: args.opt_num(5, "rx")?.unwrap_or(0.0),
                    ry: args.opt_num(6, "ry")?.unwrap_or(0.0),
                    rz: args.opt_num(7, "rz")?.unwrap_or(0.0),
                },
                extra: values.get(8..).unwrap_or_default().to_vec(),
            })
        }

        "ReadPoint" => {
            args.arity(2, 2)?;
            Ok(Command::ReadPoint {
                point: args.point(0)?,
                item: args.token::<PointItem>(1, "item")?,
            })
        }

        "SpdJ" | "AccJ" | "DecJ" | "SpdL" | "AccL" | "DecL" => {
            args.arity(1, 1)?;
            let kind: MotionParamKind = func
                .parse()
                .map_err(|e: TokenError| args.invalid(e.to_string()))?;
            Ok(Command::SetParam {
                param: MotionParam::from_value(kind, args.get(0))?,
            })
        }

        "Accur" => {
            args.arity(1, 2)?;
            Ok(Command::SetParam {
                param: MotionParam::Accur(args.token(0, "mode")?),
            })
        }

        "WAIT" => bind_wait(&args),

        "DELAY" => {
            args.arity(1, 1)?;
            Ok(Command::Delay {
                seconds: args.num(0, "seconds")?,
            })
        }

        "ReadModbus" => {
            args.arity(2, 2)?;
            Ok(Command::ReadModbus {
                address: args.int(0, "address")?,
                size: args.token::<RegSize>(1, "size")?,
            })
        }

        "WriteModbus" => {
            args.arity(3, 3)?;
            Ok(Command::WriteModbus {
                address: args.int(0, "address")?,
                size: args.token::<RegSize>(1, "size")?,
                value: args.int(2, "value")?,
            })
        }

        "print" => Ok(Command::Print {
            message: values
                .iter()
                .map(|v| v.to_string())
                .collect::<Vec<_>>()
                .join(" "),
        }),

        _ => Err(args.invalid("not a catalog function")),
    }
}

fn bind_wait(args: &Args<'_>) -> Result<Command, CmdError> {
    let source = args.text(0, "condition kind")?.to_ascii_uppercase();

    let (condition, timeout_at) = match source.as_str() {
        "DI" | "DO" => {
            args.arity(3, 4)?;
            let pin = args.int(1, "pin")?;
            let status = args.status(2)?;
            let condition = if source == "DI" {
                WaitCondition::Di { pin, status }
            } else {
                WaitCondition::Do { pin, status }
            };
            (condition, 3)
        }
        "EXTDI" | "EXTDO" => {
            args.arity(4, 5)?;
            let address = args.int(1, "address")?;
            let pin = args.int(2, "pin")?;
            let status = args.status(3)?;
            let condition = if source == "EXTDI" {
                WaitCondition::ExtDi {
                    address,
                    pin,
                    status,
                }
            } else {
                WaitCondition::ExtDo {
                    address,
                    pin,
                    status,
                }
            };
            (condition, 4)
        }
        "MODBUS" | "VAR" => {
            args.arity(4, 5)?;
            let condition = WaitCondition::Register {
                address: args.int(1, "address")?,
                size: args.token(2, "size")?,
                value: args.int(3, "value")?,
            };
            (condition, 4)
        }
        _ => {
            return Err(args.invalid(format!(
                "unknown condition kind \"{}\" (expected DI, DO, ExtDI, ExtDO, MODBUS or VAR)",
                source
            )))
        }
    };

    Ok(Command::Wait {
        condition,
        timeout_ms: args.opt_num(timeout_at, "timeout")?,
    })
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl<'a> Args<'a> {
    fn invalid<S: Into<String>>(&self, msg: S) -> CmdError {
        CmdError::invalid(self.func, msg)
    }

    fn arity(&self, min: usize, max: usize) -> Result<(), CmdError> {
        let n = self.values.len();
        if n < min || n > max {
            let expected = if min == max {
                format!("{}", min)
            } else {
                format!("{} to {}", min, max)
            };
            return Err(self.invalid(format!(
                "expected {} argument(s), found {}",
                expected, n
            )));
        }
        Ok(())
    }

    fn get(&self, i: usize) -> &'a Value {
        const NIL: &Value = &Value::Nil;
        self.values.get(i).unwrap_or(NIL)
    }

    fn type_error(&self, i: usize, what: &str, expected: &str) -> CmdError {
        self.invalid(format!(
            "{} must be {}, found {}",
            what,
            expected,
            self.get(i).type_name()
        ))
    }

    fn int(&self, i: usize, what: &str) -> Result<i64, CmdError> {
        self.get(i)
            .as_i64()
            .ok_or_else(|| self.type_error(i, what, "an integer"))
    }

    fn opt_int(&self, i: usize, what: &str) -> Result<Option<i64>, CmdError> {
        if self.get(i).is_nil() {
            Ok(None)
        } else {
            self.int(i, what).map(Some)
        }
    }

    fn num(&self, i: usize, what: &str) -> Result<f64, CmdError> {
        self.get(i)
            .as_f64()
            .ok_or_else(|| self.type_error(i, what, "a number"))
    }

    fn opt_num(&self, i: usize, what: &str) -> Result<Option<f64>, CmdError> {
        if self.get(i).is_nil() {
            Ok(None)
        } else {
            self.num(i, what).map(Some)
        }
    }

    fn text(&self, i: usize, what: &str) -> Result<&'a str, CmdError> {
        self.get(i)
            .as_str()
            .ok_or_else(|| self.type_error(i, what, "a string"))
    }

    fn token<T>(&self, i: usize, what: &str) -> Result<T, CmdError>
    where
        T: FromStr<Err = TokenError>,
    {
        self.text(i, what)?
            .parse::<T>()
            .map_err(|e| self.invalid(e.to_string()))
    }

    fn status(&self, i: usize) -> Result<PinStatus, CmdError> {
        self.token(i, "status")
    }

    fn point(&self, i: usize) -> Result<PointRef, CmdError> {
        match self.get(i) {
            Value::Str(name) => Ok(PointRef::Name(name.clone())),
            v => v
                .as_i64()
                .map(PointRef::Num)
                .ok_or_else(|| self.type_error(i, "point", "a point number or name")),
        }
    }
}
