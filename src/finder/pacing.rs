use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

/// The inter-probe delay, behind a seam so runs can be replayed instantly.
#[async_trait]
pub trait Pacer: Send + Sync {
    /// Waits for `delay`. Returns `false` if `cancel` fired first (or was
    /// already set), in which case the caller must stop.
    async fn pause(&self, delay: Duration, cancel: &CancellationToken) -> bool;
}

/// Wall-clock pacing on the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioPacer;

#[async_trait]
impl Pacer for TokioPacer {
    async fn pause(&self, delay: Duration, cancel: &CancellationToken) -> bool {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => false,
            _ = tokio::time::sleep(delay) => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn completes_when_not_cancelled() {
        let cancel = CancellationToken::new();
        assert!(TokioPacer.pause(Duration::from_millis(5), &cancel).await);
    }

    #[tokio::test]
    async fn already_cancelled_returns_immediately() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let started = std::time::Instant::now();
        assert!(!TokioPacer.pause(Duration::from_secs(30), &cancel).await);
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn cancellation_interrupts_the_wait() {
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });
        let started = std::time::Instant::now();
        assert!(!TokioPacer.pause(Duration::from_secs(30), &cancel).await);
        assert!(started.elapsed() < Duration::from_secs(5));
    }
}
