pub mod progress;
pub mod sessions;

use shuxue_algo::{AlgoError, SessionError};

pub use progress::{PracticeApplied, PracticePlan, ProgressService};
pub use sessions::{SessionRegistry, SessionTicket};

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Algo(#[from] AlgoError),
    #[error("session not found: {0}")]
    SessionNotFound(String),
}

impl From<SessionError> for ServiceError {
    fn from(err: SessionError) -> Self {
        Self::Algo(err.into())
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;
