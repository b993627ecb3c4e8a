use std::time::Duration;

use thiserror::Error;

use super::types::ProbeStage;

/// Transport-level failures inside a probe. They never leave the prober:
/// each one is folded into [`ProbeOutcome::Indeterminate`](super::ProbeOutcome).
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("connection to {host}:{port} failed: {source}")]
    Connect {
        host: String,
        port: u16,
        #[source]
        source: std::io::Error,
    },
    #[error("{stage} timed out after {after:?}")]
    Timeout { stage: ProbeStage, after: Duration },
    #[error("I/O error: {source}")]
    Io {
        #[source]
        source: std::io::Error,
    },
    #[error("connection closed by peer")]
    ClosedByPeer,
    #[error("probe already resolved, connection closed")]
    Closed,
}

impl ProbeError {
    pub(crate) fn connect(host: impl Into<String>, port: u16, source: std::io::Error) -> Self {
        Self::Connect {
            host: host.into(),
            port,
            source,
        }
    }

    pub(crate) fn timeout(stage: ProbeStage, after: Duration) -> Self {
        Self::Timeout { stage, after }
    }

    pub(crate) fn io(source: std::io::Error) -> Self {
        Self::Io { source }
    }
}
