use thiserror::Error;

/// Failure taxonomy for the whole application.
///
/// `Validation`, `NotSupported` and `EmptyState` are user-recoverable: they
/// surface a message and leave all state untouched. `ExternalCommand` wraps a
/// failed git invocation. `InconsistentState` signals a programming defect in
/// the context/window bookkeeping, not something a user can fix.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("{0} is not supported here")]
    NotSupported(&'static str),

    #[error("git: {0}")]
    ExternalCommand(String),

    #[error("{0}")]
    EmptyState(&'static str),

    #[error("inconsistent state: {0}")]
    InconsistentState(String),
}

pub type Result<T> = std::result::Result<T, AppError>;

impl AppError {
    /// Whether this error should be treated as a bug rather than shown as a
    /// normal error message.
    pub fn is_defect(&self) -> bool {
        matches!(self, AppError::InconsistentState(_))
    }
}
