//! Runtime error type.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Invalid runtime configuration (bad filter string, invalid flags).
    #[error("Configuration error: {0}")]
    Config(String),

    /// A platform capability the core needs was not provided.
    #[error("Capability missing: {capability} - {message}")]
    CapabilityMissing { capability: String, message: String },

    /// The global tracing subscriber could not be installed.
    #[error("Logging error: {0}")]
    Logging(String),
}

impl Error {
    /// Name of the missing capability, if this is a capability error.
    pub fn missing_capability(&self) -> Option<&str> {
        match self {
            Error::CapabilityMissing { capability, .. } => Some(capability),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
