use thiserror::Error;

/// Conditions the session manager reports as errors.
///
/// Transitions that simply do not apply in the current state (pausing while
/// paused, sampling with no session) are not errors; those operations return
/// `None` instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("exercise session {id} is already in progress")]
    AlreadyInProgress { id: String },
    #[error("health services are not available on this device")]
    Unavailable,
    #[error("exercise session {id} left the slot before warm-up completed")]
    StartAbandoned { id: String },
}
