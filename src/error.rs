use thiserror::Error;

use crate::session::SessionError;

/// Task-local failures. Each aborts the current task only; the executor logs
/// it and moves on to the next task.
#[derive(Debug, Error)]
pub enum TaskError {
    #[error("page not ready after {attempts} attempts")]
    PageNotReady {
        attempts: u32,
        #[source]
        source: SessionError,
    },
    #[error("carousel block {index} not found on reload")]
    BlockNotFound { index: usize },
    #[error("card {target:?} not found after {iterations} iterations")]
    CardNotFound { target: String, iterations: u32 },
    #[error("activation of {target:?} failed")]
    ActivationFailed {
        target: String,
        #[source]
        source: SessionError,
    },
    #[error(transparent)]
    Session(#[from] SessionError),
}
