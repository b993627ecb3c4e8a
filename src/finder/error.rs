use thiserror::Error;

use crate::domain::DomainError;
use crate::mx::Error as MxError;

/// Failures of a verification run that are not one of the four verdicts.
#[derive(Debug, Error)]
pub enum FinderError {
    #[error("invalid input: {}", reasons.join("; "))]
    InvalidInput { reasons: Vec<String> },
    #[error("verification cancelled after {attempts} probe(s)")]
    Cancelled {
        attempts: usize,
        tested: Vec<String>,
    },
    #[error("mail exchange lookup unavailable: {source}")]
    Service {
        #[source]
        source: MxError,
    },
}

impl FinderError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            reasons: vec![reason.into()],
        }
    }

    pub(crate) fn cancelled(tested: Vec<String>) -> Self {
        Self::Cancelled {
            attempts: tested.len(),
            tested,
        }
    }
}

impl From<DomainError> for FinderError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Invalid { reasons } => Self::InvalidInput { reasons },
            other => Self::invalid(other.to_string()),
        }
    }
}

impl From<MxError> for FinderError {
    fn from(source: MxError) -> Self {
        Self::Service { source }
    }
}
