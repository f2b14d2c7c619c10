//! # Command engine
//!
//! Binds script calls onto the command catalog and drives runs against a shared
//! [`RobotStore`](crate::store::RobotStore).

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

pub mod binding;
pub mod catalog;
pub mod driver;
pub mod error;
pub mod script;

// ------------------------------------------------------------------------------------------------
// REEXPORTS
// ------------------------------------------------------------------------------------------------

pub use catalog::{Command, PointItem, WaitCondition};
pub use driver::{Engine, ExecutionLog, Run, RunState};
pub use error::CmdError;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use std::{thread, time::Duration};

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// How delays requested by a run (`DELAY`, output pulses, `WAIT` timeouts) are honoured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DelayMode {
    /// The delay is only recorded in the run's log
    #[default]
    Record,

    /// The calling run sleeps for the delay
    Sleep,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl DelayMode {
    /// Suspend the calling thread for `seconds` if in [`DelayMode::Sleep`].
    ///
    /// Must never be called while holding the store lock.
    pub fn wait(self, seconds: f64) {
        if self == DelayMode::Sleep {
            if let Ok(d) = Duration::try_from_secs_f64(seconds) {
                thread::sleep(d);
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::time::Instant;

    #[test]
    fn test_delay_modes() {
        let start = Instant::now();
        DelayMode::Record.wait(5.0);
        assert!(start.elapsed() < Duration::from_secs(1));

        let start = Instant::now();
        DelayMode::Sleep.wait(0.05);
        assert!(start.elapsed() >= Duration::from_millis(50));

        assert_eq!(
            serde_json::from_str::<DelayMode>("\"sleep\"").unwrap(),
            DelayMode::Sleep
        );
    }
}
