use thiserror::Error;

/// Errors raised while turning user input into a [`Domain`](super::Domain).
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("domain is empty")]
    Empty,
    #[error("domain IDNA conversion failed")]
    IdnaConversion {
        #[source]
        source: idna::Errors,
    },
    #[error("invalid domain: {reasons:?}")]
    Invalid { reasons: Vec<String> },
}

impl DomainError {
    pub(crate) fn idna(source: idna::Errors) -> Self {
        Self::IdnaConversion { source }
    }

    pub(crate) fn invalid(reasons: Vec<String>) -> Self {
        Self::Invalid { reasons }
    }
}
