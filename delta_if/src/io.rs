//! # Digital I/O and register access tokens

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use std::{fmt, ops::Not, str::FromStr};

use crate::TokenError;

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// State of a digital pin.
///
/// Serialised and displayed as the literal `ON`/`OFF` tokens used by the robot language. Parsing is
/// case-insensitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PinStatus {
    #[serde(rename = "ON")]
    On,

    #[serde(rename = "OFF")]
    Off,
}

/// Width of a register access.
///
/// The width belongs to the access rather than the register, so the same storage may be read as a
/// word and later as a double word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RegSize {
    /// 16 bit signed word
    W,

    /// 32 bit signed double word, spanning two consecutive addresses
    DW,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl PinStatus {
    /// Returns `true` if the pin is `ON`.
    pub fn is_on(self) -> bool {
        self == PinStatus::On
    }
}

impl From<bool> for PinStatus {
    fn from(on: bool) -> Self {
        if on {
            PinStatus::On
        } else {
            PinStatus::Off
        }
    }
}

impl Not for PinStatus {
    type Output = PinStatus;

    fn not(self) -> Self::Output {
        match self {
            PinStatus::On => PinStatus::Off,
            PinStatus::Off => PinStatus::On,
        }
    }
}

impl FromStr for PinStatus {
    type Err = TokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ON" => Ok(PinStatus::On),
            "OFF" => Ok(PinStatus::Off),
            _ => Err(TokenError {
                what: "pin status",
                found: s.to_string(),
                expected: "ON, OFF",
            }),
        }
    }
}

impl fmt::Display for PinStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PinStatus::On => write!(f, "ON"),
            PinStatus::Off => write!(f, "OFF"),
        }
    }
}

impl RegSize {
    /// Number of 16 bit words covered by an access of this width.
    pub fn num_words(self) -> usize {
        match self {
            RegSize::W => 1,
            RegSize::DW => 2,
        }
    }
}

impl FromStr for RegSize {
    type Err = TokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "W" => Ok(RegSize::W),
            "DW" => Ok(RegSize::DW),
            _ => Err(TokenError {
                what: "register size",
                found: s.to_string(),
                expected: "W, DW",
            }),
        }
    }
}

impl fmt::Display for RegSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegSize::W => write!(f, "W"),
            RegSize::DW => write!(f, "DW"),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_pin_status_tokens() {
        assert_eq!("ON".parse::<PinStatus>(), Ok(PinStatus::On));
        assert_eq!("off".parse::<PinStatus>(), Ok(PinStatus::Off));
        assert_eq!(" On ".parse::<PinStatus>(), Ok(PinStatus::On));
        assert!("HIGH".parse::<PinStatus>().is_err());
        assert_eq!(!PinStatus::On, PinStatus::Off);
        assert_eq!(serde_json::to_string(&PinStatus::Off).unwrap(), "\"OFF\"");
    }

    #[test]
    fn test_reg_size_tokens() {
        assert_eq!("dw".parse::<RegSize>(), Ok(RegSize::DW));
        assert_eq!("W".parse::<RegSize>(), Ok(RegSize::W));
        assert!("DWORD".parse::<RegSize>().is_err());
        assert_eq!(RegSize::DW.num_words(), 2);
    }
}
