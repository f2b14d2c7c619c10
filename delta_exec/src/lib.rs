//! # DeltaARM emulator library
//!
//! Emulates the controller of a DeltaARM industrial arm: a thread safe [`store::RobotStore`]
//! holding the arm's I/O, registers, points and motion state, and a command [`engine`] that
//! executes scripts in the robot language against it.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Transport agnostic facade for the external operations
pub mod api;

/// Command catalog, script front-end and execution driver
pub mod engine;

/// Parameters for the executables
pub mod params;

/// Robot state store
pub mod store;

// ------------------------------------------------------------------------------------------------
// REEXPORTS
// ------------------------------------------------------------------------------------------------

pub use api::{ApiError, DeltaApi};
pub use engine::{Engine, DelayMode};
pub use params::ExecParams;
pub use store::{RobotStore, StoreError};
