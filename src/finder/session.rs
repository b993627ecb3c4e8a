use tokio_util::sync::CancellationToken;

use super::error::FinderError;
use super::types::CandidateAttempt;
use crate::permutation::Candidate;
use crate::smtp_verify::ProbeReport;

/// State of one orchestrated run. Owned by a single `verify` call and
/// dropped with it.
pub(crate) struct VerificationSession<'a> {
    candidates: Vec<Candidate>,
    next: usize,
    attempts: Vec<CandidateAttempt>,
    cancel: &'a CancellationToken,
}

impl<'a> VerificationSession<'a> {
    pub(crate) fn new(candidates: Vec<Candidate>, cancel: &'a CancellationToken) -> Self {
        Self {
            attempts: Vec::with_capacity(candidates.len()),
            candidates,
            next: 0,
            cancel,
        }
    }

    pub(crate) fn cancel(&self) -> &'a CancellationToken {
        self.cancel
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub(crate) fn total(&self) -> usize {
        self.candidates.len()
    }

    /// Hands out candidates strictly in generator order.
    pub(crate) fn next_candidate(&mut self) -> Option<Candidate> {
        let candidate = self.candidates.get(self.next).cloned()?;
        self.next += 1;
        Some(candidate)
    }

    pub(crate) fn has_more(&self) -> bool {
        self.next < self.candidates.len()
    }

    pub(crate) fn record(&mut self, candidate: Candidate, report: ProbeReport) {
        self.attempts.push(CandidateAttempt { candidate, report });
    }

    pub(crate) fn attempts(&self) -> usize {
        self.attempts.len()
    }

    /// Ends the run as cancelled, keeping what was probed so far.
    pub(crate) fn abandon(&self) -> FinderError {
        tracing::info!(
            target: "finder",
            "run cancelled after {} of {} candidate(s)",
            self.attempts.len(),
            self.candidates.len()
        );
        FinderError::cancelled(self.attempts.iter().map(CandidateAttempt::address).collect())
    }

    pub(crate) fn into_attempts(self) -> Vec<CandidateAttempt> {
        self.attempts
    }
}
