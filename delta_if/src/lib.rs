//! # DeltaARM interface crate.
//!
//! Provides the types shared between the emulator core, its executables and any transport layer
//! placed in front of it.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Digital I/O and register access tokens
pub mod io;

/// Motion parameter tokens
pub mod motion;

/// Dynamically typed script values
pub mod value;

/// Request and response payloads of the emulator's external operations
pub mod api;

// ------------------------------------------------------------------------------------------------
// REEXPORTS
// ------------------------------------------------------------------------------------------------

pub use io::{PinStatus, RegSize};
pub use motion::{AccurMode, MotionParamKind};
pub use value::Value;

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Error raised when a textual token cannot be parsed into one of the interface enums.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("\"{found}\" is not a valid {what} (expected one of {expected})")]
pub struct TokenError {
    /// What kind of token was being parsed
    pub what: &'static str,

    /// The text that was found
    pub found: String,

    /// Human readable list of accepted tokens
    pub expected: &'static str,
}
