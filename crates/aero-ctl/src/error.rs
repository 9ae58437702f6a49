use aero_sync::BridgeError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CtlError>;

#[derive(Debug, Error)]
pub enum CtlError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Bridge(#[from] BridgeError),

    #[error("invalid argument: {message}")]
    InvalidArgument { message: String },

    #[error("runtime error: {message}")]
    Runtime { message: String },
}

impl CtlError {
    /// Process exit code: 2 usage/config, 3 not found, 4 unreachable
    /// backend, 5 other backend status, 1 anything else (including a
    /// reachable backend whose reply was unusable).
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::InvalidArgument { .. } | Self::Bridge(BridgeError::InvalidConfig { .. }) => 2,
            Self::Bridge(err) if err.is_not_found() => 3,
            Self::Bridge(err) if err.is_transport() => 4,
            Self::Bridge(BridgeError::Status { .. }) => 5,
            _ => 1,
        }
    }

    #[must_use]
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn runtime(message: impl Into<String>) -> Self {
        Self::Runtime {
            message: message.into(),
        }
    }
}
