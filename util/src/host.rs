//! Host platform utility functions

use std::{env, path::PathBuf};

/// Environment variable naming the emulator's root directory.
pub const ROOT_ENV_VAR: &str = "DELTA_EMU_ROOT";

/// Get the root directory of the emulator installation.
///
/// Parameter files and sessions live under this directory. The value of `DELTA_EMU_ROOT` is used
/// if set, otherwise the current working directory.
pub fn get_root() -> std::io::Result<PathBuf> {
    match env::var_os(ROOT_ENV_VAR) {
        Some(root) => Ok(PathBuf::from(root)),
        None => env::current_dir(),
    }
}
