//! # Command errors

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use delta_if::api::ErrorKind;

use crate::store::StoreError;

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Error raised while binding or executing a catalog command.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CmdError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("{func}: {msg}")]
    InvalidArgument { func: &'static str, msg: String },

    #[error("{0} does not hold and no timeout was given")]
    WaitUnsatisfied(String),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl CmdError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CmdError::Store(e) => e.kind(),
            CmdError::InvalidArgument { .. } => ErrorKind::InvalidArgument,
            CmdError::WaitUnsatisfied(_) => ErrorKind::WaitUnsatisfied,
        }
    }

    pub(crate) fn invalid<S: Into<String>>(func: &'static str, msg: S) -> Self {
        CmdError::InvalidArgument {
            func,
            msg: msg.into(),
        }
    }
}
