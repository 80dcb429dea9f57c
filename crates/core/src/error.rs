//! Error type for the fallible (I/O and storage) side of the crate.
//! Parsing, identity and key normalization never fail and do not use it.

/// Errors surfaced to callers.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A subtitle file, episode or subtitle line does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// A request was missing required data.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    pub fn not_found<S: Into<String>>(msg: S) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn invalid_input<S: Into<String>>(msg: S) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
