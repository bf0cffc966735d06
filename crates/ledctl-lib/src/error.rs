//! Unified error type for the ledctl-lib crate.
//!
//! [`LedctlError`] wraps backend and I/O errors plus setup failures. Bad
//! command tokens are not errors at this level: the serializer reports them
//! per command. `From` impls allow `?` to propagate across module
//! boundaries seamlessly.

use std::fmt;

use crate::backend::BackendError;

/// Unified error type for ledctl-lib operations.
#[derive(Debug)]
pub enum LedctlError {
    /// LED backend error (open, query, apply).
    Backend(BackendError),
    /// Standard I/O error.
    Io(std::io::Error),
    /// Session could not be set up (backend selection, options).
    Setup(String),
}

impl fmt::Display for LedctlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LedctlError::Backend(e) => write!(f, "{e}"),
            LedctlError::Io(e) => write!(f, "I/O error: {e}"),
            LedctlError::Setup(e) => write!(f, "Setup error: {e}"),
        }
    }
}

impl std::error::Error for LedctlError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LedctlError::Backend(e) => Some(e),
            LedctlError::Io(e) => Some(e),
            LedctlError::Setup(_) => None,
        }
    }
}

impl From<BackendError> for LedctlError {
    fn from(e: BackendError) -> Self {
        LedctlError::Backend(e)
    }
}

impl From<std::io::Error> for LedctlError {
    fn from(e: std::io::Error) -> Self {
        LedctlError::Io(e)
    }
}

/// Crate-level Result alias using [`LedctlError`].
pub type Result<T> = std::result::Result<T, LedctlError>;
