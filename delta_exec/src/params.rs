//! # Executable parameters

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::Deserialize;

use delta_if::motion::MotionSettings;

use crate::engine::DelayMode;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Parameters of the emulator, loaded from `params/delta_exec.toml`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExecParams {
    /// Directory, relative to the root, in which session directories are created
    pub sessions_dir: String,

    /// Whether delays suspend the run or are only logged
    pub delay_mode: DelayMode,

    /// Save each run's result into the session directory
    pub save_results: bool,

    /// Motion parameters the store starts with
    pub motion_defaults: MotionSettings,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for ExecParams {
    fn default() -> Self {
        Self {
            sessions_dir: "sessions".into(),
            delay_mode: DelayMode::Record,
            save_results: true,
            motion_defaults: MotionSettings::default(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use delta_if::AccurMode;

    #[test]
    fn test_partial_params() {
        let params: ExecParams = toml::from_str(
            r#"
            delay_mode = "sleep"

            [motion_defaults]
            spdl = 250.0
            accur = "ROUGH"
            "#,
        )
        .unwrap();

        assert_eq!(params.sessions_dir, "sessions");
        assert_eq!(params.delay_mode, DelayMode::Sleep);
        assert_eq!(params.motion_defaults.spdl, 250.0);
        assert_eq!(params.motion_defaults.spdj, 10.0);
        assert_eq!(params.motion_defaults.accur, AccurMode::Rough);
    }
}
