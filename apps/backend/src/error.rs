use thiserror::Error;

use crate::errors::StatusCode;

/// Failures outside the status-code taxonomy: the session is gone, a
/// collaborator failed, or configuration is unusable.
///
/// A command the engine rejects for game reasons is not an error; it comes
/// back as `Ok(StatusCode)` from the service layer. `Rejected` exists for
/// callers that want to funnel a non-OK code through `?`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("Session closed")]
    SessionClosed,
    #[error("Command rejected: {0}")]
    Rejected(StatusCode),
    #[error("Catalog error: {detail}")]
    Catalog { detail: String },
    #[error("Configuration error: {detail}")]
    Config { detail: String },
}

impl EngineError {
    /// The status code a client should see for this error, if any.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            EngineError::SessionClosed => Some(StatusCode::UnknownSession),
            EngineError::Rejected(code) => Some(*code),
            EngineError::Catalog { .. } | EngineError::Config { .. } => None,
        }
    }

    pub fn catalog(detail: impl Into<String>) -> Self {
        Self::Catalog {
            detail: detail.into(),
        }
    }

    pub fn config(detail: impl Into<String>) -> Self {
        Self::Config {
            detail: detail.into(),
        }
    }

    /// Turn a non-OK status into an error.
    pub fn check(code: StatusCode) -> Result<(), EngineError> {
        if code.is_ok() {
            Ok(())
        } else {
            Err(EngineError::Rejected(code))
        }
    }
}

impl From<StatusCode> for EngineError {
    fn from(code: StatusCode) -> Self {
        EngineError::Rejected(code)
    }
}

impl From<std::env::VarError> for EngineError {
    fn from(e: std::env::VarError) -> Self {
        EngineError::config(format!("env var error: {e}"))
    }
}
