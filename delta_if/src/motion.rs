//! # Motion types
//!
//! Pose, point and motion parameter definitions shared by the store and the external interface.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use crate::{TokenError, Value};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// The number of joints on the arm.
pub const NUM_JOINTS: usize = 6;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Cartesian pose of the tool centre point.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    /// Units: millimeters
    pub x: f64,
    /// Units: millimeters
    pub y: f64,
    /// Units: millimeters
    pub z: f64,
    /// Units: degrees
    pub rx: f64,
    /// Units: degrees
    pub ry: f64,
    /// Units: degrees
    pub rz: f64,
}

/// A named global point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalPoint {
    pub name: String,

    #[serde(flatten)]
    pub pose: Pose,

    /// Trailing payload given when the point was defined (frame offsets, configuration flags,
    /// joint range counts). Stored and returned verbatim.
    #[serde(default)]
    pub extra: Vec<Value>,
}

/// Current motion parameters of the arm.
///
/// These are recorded for inspection only, the emulated motion is not timed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionSettings {
    /// Joint speed. Units: percent
    pub spdj: f64,
    /// Joint acceleration. Units: percent
    pub accj: f64,
    /// Joint deceleration. Units: percent
    pub decj: f64,
    /// Linear speed. Units: millimeters/second
    pub spdl: f64,
    /// Linear acceleration. Units: millimeters/second^2
    pub accl: f64,
    /// Linear deceleration. Units: millimeters/second^2
    pub decl: f64,
    /// In-place accuracy
    pub accur: AccurMode,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// In-place accuracy modes, from most to least precise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AccurMode {
    High,
    Standard,
    Medium,
    Rough,
    MaxRough,
}

/// The seven recognised motion parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MotionParamKind {
    SpdJ,
    AccJ,
    DecJ,
    SpdL,
    AccL,
    DecL,
    Accur,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Pose {
    /// Returns `true` if every field is a finite number.
    pub fn is_finite(&self) -> bool {
        [self.x, self.y, self.z, self.rx, self.ry, self.rz]
            .iter()
            .all(|v| v.is_finite())
    }
}

impl Default for MotionSettings {
    fn default() -> Self {
        Self {
            spdj: 10.0,
            accj: 10.0,
            decj: 10.0,
            spdl: 100.0,
            accl: 10.0,
            decl: 10.0,
            accur: AccurMode::High,
        }
    }
}

impl FromStr for AccurMode {
    type Err = TokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "HIGH" => Ok(AccurMode::High),
            "STANDARD" => Ok(AccurMode::Standard),
            "MEDIUM" => Ok(AccurMode::Medium),
            "ROUGH" => Ok(AccurMode::Rough),
            "MAXROUGH" => Ok(AccurMode::MaxRough),
            _ => Err(TokenError {
                what: "accuracy mode",
                found: s.to_string(),
                expected: "HIGH, STANDARD, MEDIUM, ROUGH, MAXROUGH",
            }),
        }
    }
}

impl fmt::Display for AccurMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AccurMode::High => "HIGH",
            AccurMode::Standard => "STANDARD",
            AccurMode::Medium => "MEDIUM",
            AccurMode::Rough => "ROUGH",
            AccurMode::MaxRough => "MAXROUGH",
        };
        write!(f, "{}", s)
    }
}

impl MotionParamKind {
    /// The script function name which sets this parameter.
    pub fn fn_name(self) -> &'static str {
        match self {
            MotionParamKind::SpdJ => "SpdJ",
            MotionParamKind::AccJ => "AccJ",
            MotionParamKind::DecJ => "DecJ",
            MotionParamKind::SpdL => "SpdL",
            MotionParamKind::AccL => "AccL",
            MotionParamKind::DecL => "DecL",
            MotionParamKind::Accur => "Accur",
        }
    }

    /// Units the parameter is given in, used when logging.
    pub fn units(self) -> &'static str {
        match self {
            MotionParamKind::SpdJ | MotionParamKind::AccJ | MotionParamKind::DecJ => "%",
            MotionParamKind::SpdL => " mm/sec",
            MotionParamKind::AccL | MotionParamKind::DecL => " mm/sec²",
            MotionParamKind::Accur => "",
        }
    }
}

impl FromStr for MotionParamKind {
    type Err = TokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "spdj" => Ok(MotionParamKind::SpdJ),
            "accj" => Ok(MotionParamKind::AccJ),
            "decj" => Ok(MotionParamKind::DecJ),
            "spdl" => Ok(MotionParamKind::SpdL),
            "accl" => Ok(MotionParamKind::AccL),
            "decl" => Ok(MotionParamKind::DecL),
            "accur" => Ok(MotionParamKind::Accur),
            _ => Err(TokenError {
                what: "motion parameter",
                found: s.to_string(),
                expected: "spdj, accj, decj, spdl, accl, decl, accur",
            }),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_accur_tokens() {
        assert_eq!("maxrough".parse::<AccurMode>(), Ok(AccurMode::MaxRough));
        assert_eq!("Standard".parse::<AccurMode>(), Ok(AccurMode::Standard));
        assert!("FINE".parse::<AccurMode>().is_err());
        assert_eq!(AccurMode::MaxRough.to_string(), "MAXROUGH");
        assert_eq!(
            serde_json::to_string(&AccurMode::MaxRough).unwrap(),
            "\"MAXROUGH\""
        );
    }

    #[test]
    fn test_param_kinds() {
        assert_eq!("SPDJ".parse::<MotionParamKind>(), Ok(MotionParamKind::SpdJ));
        assert_eq!("accur".parse::<MotionParamKind>(), Ok(MotionParamKind::Accur));
        assert!("speed".parse::<MotionParamKind>().is_err());
    }

    #[test]
    fn test_point_serialises_flat() {
        let point = GlobalPoint {
            name: "GL_P1".into(),
            pose: Pose {
                x: 200.0,
                ..Default::default()
            },
            extra: vec![Value::Int(1), Value::List(vec![Value::Int(0)])],
        };

        let json = serde_json::to_value(&point).unwrap();
        assert_eq!(json["name"], "GL_P1");
        assert_eq!(json["x"], 200.0);
        assert_eq!(json["extra"][1][0], 0);
    }
}
