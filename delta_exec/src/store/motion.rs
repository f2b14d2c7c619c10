//! # Arm motion state
//!
//! Cartesian pose, joint angles and motion parameters. Motion is instantaneous, only the end state
//! of each move is recorded.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use std::fmt;

use delta_if::{
    motion::{MotionSettings, Pose, NUM_JOINTS},
    AccurMode, MotionParamKind, Value,
};

use super::StoreError;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct ArmState {
    pub pose: Pose,
    pub joints: [f64; NUM_JOINTS],
    pub settings: MotionSettings,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// A motion parameter together with its new value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum MotionParam {
    SpdJ(f64),
    AccJ(f64),
    DecJ(f64),
    SpdL(f64),
    AccL(f64),
    DecL(f64),
    Accur(AccurMode),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl ArmState {
    pub fn new(settings: MotionSettings) -> Self {
        Self {
            settings,
            ..Default::default()
        }
    }

    pub fn set_pose(&mut self, pose: Pose) -> Result<(), StoreError> {
        if !pose.is_finite() {
            return Err(StoreError::InvalidArgument(
                "pose has non-finite coordinates".into(),
            ));
        }
        self.pose = pose;
        Ok(())
    }

    /// Set the angle of a joint, numbered from 1.
    pub fn set_joint(&mut self, joint: i64, degrees: f64) -> Result<(), StoreError> {
        if joint < 1 || joint > NUM_JOINTS as i64 {
            return Err(StoreError::OutOfRange {
                what: "joint",
                value: joint,
                min: 1,
                max: NUM_JOINTS as i64,
            });
        }
        if !degrees.is_finite() {
            return Err(StoreError::InvalidArgument(format!(
                "joint angle {} is not finite",
                degrees
            )));
        }

        self.joints[(joint - 1) as usize] = degrees;
        Ok(())
    }

    pub fn set_param(&mut self, param: MotionParam) -> Result<(), StoreError> {
        let s = &mut self.settings;

        let (slot, value) = match param {
            MotionParam::Accur(mode) => {
                s.accur = mode;
                return Ok(());
            }
            MotionParam::SpdJ(v) => (&mut s.spdj, v),
            MotionParam::AccJ(v) => (&mut s.accj, v),
            MotionParam::DecJ(v) => (&mut s.decj, v),
            MotionParam::SpdL(v) => (&mut s.spdl, v),
            MotionParam::AccL(v) => (&mut s.accl, v),
            MotionParam::DecL(v) => (&mut s.decl, v),
        };

        if !value.is_finite() || value < 0.0 {
            return Err(StoreError::InvalidArgument(format!(
                "{} must be a non-negative number (found {})",
                param.kind().fn_name(),
                value
            )));
        }

        *slot = value;
        Ok(())
    }
}

impl MotionParam {
    /// Build a parameter from its kind token and a script value.
    pub fn parse(kind: &str, value: &Value) -> Result<Self, StoreError> {
        let kind: MotionParamKind = kind.parse()?;
        Self::from_value(kind, value)
    }

    /// Build a parameter of a known kind from a script value.
    ///
    /// Accuracy takes a mode token, every other kind takes a number.
    pub fn from_value(kind: MotionParamKind, value: &Value) -> Result<Self, StoreError> {
        let num = || {
            value.as_f64().ok_or_else(|| {
                StoreError::InvalidArgument(format!(
                    "{} expects a number, found {}",
                    kind.fn_name(),
                    value.type_name()
                ))
            })
        };

        Ok(match kind {
            MotionParamKind::SpdJ => MotionParam::SpdJ(num()?),
            MotionParamKind::AccJ => MotionParam::AccJ(num()?),
            MotionParamKind::DecJ => MotionParam::DecJ(num()?),
            MotionParamKind::SpdL => MotionParam::SpdL(num()?),
            MotionParamKind::AccL => MotionParam::AccL(num()?),
            MotionParamKind::DecL => MotionParam::DecL(num()?),
            MotionParamKind::Accur => match value {
                Value::Str(s) => MotionParam::Accur(s.parse()?),
                other => {
                    return Err(StoreError::InvalidArgument(format!(
                        "Accur expects a mode name, found {}",
                        other.type_name()
                    )))
                }
            },
        })
    }

    pub fn kind(&self) -> MotionParamKind {
        match self {
            MotionParam::SpdJ(_) => MotionParamKind::SpdJ,
            MotionParam::AccJ(_) => MotionParamKind::AccJ,
            MotionParam::DecJ(_) => MotionParamKind::DecJ,
            MotionParam::SpdL(_) => MotionParamKind::SpdL,
            MotionParam::AccL(_) => MotionParamKind::AccL,
            MotionParam::DecL(_) => MotionParamKind::DecL,
            MotionParam::Accur(_) => MotionParamKind::Accur,
        }
    }
}

/// Formats as the script call which sets the parameter, e.g. `SpdJ(50.0%)`.
impl fmt::Display for MotionParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = self.kind();
        match self {
            MotionParam::Accur(mode) => write!(f, "{}({})", kind.fn_name(), mode),
            MotionParam::SpdJ(v)
            | MotionParam::AccJ(v)
            | MotionParam::DecJ(v)
            | MotionParam::SpdL(v)
            | MotionParam::AccL(v)
            | MotionParam::DecL(v) => {
                write!(f, "{}({}{})", kind.fn_name(), Value::Num(*v), kind.units())
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_joints() {
        let mut arm = ArmState::default();

        arm.set_joint(1, 90.0).unwrap();
        arm.set_joint(6, -45.5).unwrap();
        assert_eq!(arm.joints, [90.0, 0.0, 0.0, 0.0, 0.0, -45.5]);

        assert!(matches!(
            arm.set_joint(7, 0.0),
            Err(StoreError::OutOfRange { value: 7, .. })
        ));
        assert!(arm.set_joint(0, 0.0).is_err());
    }

    #[test]
    fn test_params() {
        let mut arm = ArmState::default();

        arm.set_param(MotionParam::parse("spdj", &Value::Int(50)).unwrap())
            .unwrap();
        arm.set_param(MotionParam::parse("ACCUR", &"rough".into()).unwrap())
            .unwrap();
        assert_eq!(arm.settings.spdj, 50.0);
        assert_eq!(arm.settings.accur, AccurMode::Rough);

        assert!(matches!(
            MotionParam::parse("speed", &Value::Int(1)),
            Err(StoreError::InvalidToken(_))
        ));
        assert!(MotionParam::parse("spdl", &"fast".into()).is_err());
        assert!(arm.set_param(MotionParam::DecL(-1.0)).is_err());
        assert_eq!(arm.settings.decl, 10.0);
    }

    #[test]
    fn test_param_display() {
        assert_eq!(MotionParam::SpdJ(50.0).to_string(), "SpdJ(50.0%)");
        assert_eq!(MotionParam::SpdL(250.5).to_string(), "SpdL(250.5 mm/sec)");
        assert_eq!(
            MotionParam::Accur(AccurMode::MaxRough).to_string(),
            "Accur(MAXROUGH)"
        );
    }
}
