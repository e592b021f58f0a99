use crate::session::SessionError;
use thiserror::Error as ThisError;
use uniffi::Error;

#[derive(Debug, ThisError, Error)]
#[non_exhaustive]
pub enum PulseError {
    #[error("error: {0}")]
    Common(String),
}

// Settings errors carry their cause in the context chain.
impl From<anyhow::Error> for PulseError {
    fn from(e: anyhow::Error) -> Self {
        PulseError::Common(format!("{:#}", e))
    }
}

impl From<SessionError> for PulseError {
    fn from(e: SessionError) -> Self {
        PulseError::Common(e.to_string())
    }
}

impl From<tokio::task::JoinError> for PulseError {
    fn from(e: tokio::task::JoinError) -> Self {
        PulseError::Common(format!("background task failed: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_errors_keep_their_message() {
        let err = PulseError::from(SessionError::AlreadyInProgress {
            id: "exercise-1".into(),
        });
        assert_eq!(
            err.to_string(),
            "error: exercise session exercise-1 is already in progress"
        );
    }
}
