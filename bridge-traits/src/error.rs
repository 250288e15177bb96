use thiserror::Error;

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Bridge capability not available: {0}")]
    NotAvailable(String),

    #[error("Bridge operation failed: {0}")]
    OperationFailed(String),

    #[error("No decoder available for MIME type: {0}")]
    UnsupportedMime(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BridgeError {
    /// Convenience constructor for [`BridgeError::InvalidState`].
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState(message.into())
    }

    /// Convenience constructor for [`BridgeError::OperationFailed`].
    pub fn failed(message: impl Into<String>) -> Self {
        Self::OperationFailed(message.into())
    }
}

pub type Result<T> = std::result::Result<T, BridgeError>;
