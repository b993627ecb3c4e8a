//! Verification orchestration.
//!
//! [`EmailFinder::verify`] resolves the domain's exchange, rules out
//! catch-all domains, then probes generated candidates one at a time with a
//! fixed pause between probes. It stops at the first accepted candidate and
//! never waits after the last one. Every suspension point honours the
//! caller's [`CancellationToken`].

mod error;
mod options;
mod pacing;
mod session;
mod types;

#[cfg(feature = "with-serde")]
pub mod config;

pub use error::FinderError;
pub use options::{DEFAULT_PROBE_DELAY, FinderOptions};
pub use pacing::{Pacer, TokioPacer};
pub use types::{
    AddressCheck, CandidateAttempt, CatchAllReport, Confidence, DetectionMethod,
    DomainAssessment, FollowUp, Verdict,
};

use std::future::Future;

use tokio_util::sync::CancellationToken;
use trust_dns_resolver::TokioAsyncResolver;

use crate::domain::Domain;
use crate::mx::{self, LookupMx, MailExchange, MxRecord};
use crate::permutation::generate_candidates;
use crate::smtp_verify::{MailboxProber, SmtpProber, detect_catch_all};
use session::VerificationSession;

/// Runs verifications against one resolver, prober and pacer. Holds no
/// per-run state: each call builds its own session, so one finder can serve
/// concurrent runs for different domains.
pub struct EmailFinder<R = TokioAsyncResolver, P = SmtpProber, S = TokioPacer> {
    resolver: R,
    prober: P,
    pacer: S,
    options: FinderOptions,
}

impl EmailFinder {
    /// Real DNS, real SMTP over TCP, wall-clock pacing.
    pub fn from_options(options: FinderOptions) -> Result<Self, FinderError> {
        let resolver = mx::build_resolver(&options.dns)?;
        let prober = SmtpProber::new(options.probe.clone());
        Ok(Self::with_parts(resolver, prober, TokioPacer, options))
    }
}

impl<R, P, S> EmailFinder<R, P, S>
where
    R: LookupMx,
    P: MailboxProber,
    S: Pacer,
{
    pub fn with_parts(resolver: R, prober: P, pacer: S, options: FinderOptions) -> Self {
        Self {
            resolver,
            prober,
            pacer,
            options,
        }
    }

    pub fn options(&self) -> &FinderOptions {
        &self.options
    }

    pub async fn verify(
        &self,
        first_name: &str,
        last_name: Option<&str>,
        domain: &str,
        cancel: &CancellationToken,
    ) -> Result<Verdict, FinderError> {
        self.verify_with_exchange(first_name, last_name, domain, None, cancel)
            .await
    }

    /// Like [`verify`](Self::verify), skipping MX resolution when the
    /// exchange host is already known.
    pub async fn verify_with_exchange(
        &self,
        first_name: &str,
        last_name: Option<&str>,
        domain: &str,
        known_exchange: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<Verdict, FinderError> {
        if first_name.trim().is_empty() {
            return Err(FinderError::invalid("first name is required"));
        }
        let domain = Domain::parse(domain)?;
        let candidates = generate_candidates(
            first_name,
            last_name,
            domain.as_str(),
            self.options.max_candidates,
        );
        if candidates.is_empty() {
            return Err(FinderError::invalid(
                "no candidate address could be generated from the name",
            ));
        }
        tracing::info!(
            target: "finder",
            "starting discovery for {first_name} {} at {domain} ({} candidate(s))",
            last_name.unwrap_or_default(),
            candidates.len()
        );

        let mut assessment = DomainAssessment::new(domain.clone());
        let lookup = self.exchange_for(&domain, known_exchange);
        let exchange = match or_cancel(cancel, lookup).await {
            None => return Err(FinderError::cancelled(Vec::new())),
            Some(MailExchange::Host(record)) => record.exchange,
            Some(MailExchange::NoMailService(reason)) => {
                tracing::info!(target: "finder", "{domain}: invalid_domain ({reason})");
                return Ok(Verdict::InvalidDomain { assessment, reason });
            }
        };
        assessment.with_exchange(&exchange);

        if self.options.catch_all_check {
            let check = or_cancel(
                cancel,
                detect_catch_all(&self.prober, &domain, &exchange, &self.options.catch_all),
            )
            .await
            .ok_or_else(|| FinderError::cancelled(Vec::new()))?;
            assessment.is_catch_all = Some(check.is_catch_all);
            if check.is_catch_all {
                tracing::info!(
                    target: "finder",
                    "{domain}: risky_catch_all, candidates not probed"
                );
                return Ok(Verdict::RiskyCatchAll {
                    assessment,
                    probe: check.probe,
                });
            }
        }

        let session = VerificationSession::new(candidates, cancel);
        self.probe_candidates(session, &exchange, assessment).await
    }

    async fn probe_candidates(
        &self,
        mut session: VerificationSession<'_>,
        exchange: &str,
        assessment: DomainAssessment,
    ) -> Result<Verdict, FinderError> {
        let total = session.total();
        loop {
            if session.is_cancelled() {
                return Err(session.abandon());
            }
            let Some(candidate) = session.next_candidate() else {
                break;
            };
            let address = candidate.address();
            let attempt = session.attempts() + 1;
            tracing::info!(target: "finder", "testing ({attempt}/{total}): {address}");

            let probe = self.prober.probe(exchange, &address);
            let Some(report) = or_cancel(session.cancel(), probe).await else {
                return Err(session.abandon());
            };
            let accepted = report.outcome.is_accepted();
            if report.outcome.is_transient_rejection() {
                tracing::warn!(
                    target: "finder",
                    "{address}: transient rejection, possibly greylisting ({})",
                    report.outcome
                );
            }
            session.record(candidate.clone(), report);

            if accepted {
                tracing::info!(target: "finder", "found {address} after {attempt} attempt(s)");
                return Ok(Verdict::Found {
                    assessment,
                    email: address,
                    candidate,
                    attempts: attempt,
                    method: DetectionMethod::SmtpValidation,
                    confidence: Confidence::High,
                    tested: session.into_attempts(),
                });
            }
            if !session.has_more() {
                break;
            }
            if session.is_cancelled() {
                return Err(session.abandon());
            }
            tracing::debug!(
                target: "finder",
                "pausing {:?} before the next candidate",
                self.options.probe_delay
            );
            if !self.pacer.pause(self.options.probe_delay, session.cancel()).await {
                return Err(session.abandon());
            }
        }

        tracing::info!(
            target: "finder",
            "no candidate accepted at {} after {} attempt(s)",
            assessment.domain,
            session.attempts()
        );
        Ok(Verdict::NotFound {
            assessment,
            action: FollowUp::ScheduleNightBatch,
            tested: session.into_attempts(),
        })
    }

    /// Probes one fully qualified address. MX is resolved only when no
    /// exchange host is given.
    pub async fn check_address(
        &self,
        address: &str,
        known_exchange: Option<&str>,
    ) -> Result<AddressCheck, FinderError> {
        let address = address.trim();
        let (local, domain) = address
            .rsplit_once('@')
            .filter(|(local, _)| !local.is_empty())
            .ok_or_else(|| {
                FinderError::invalid(format!("'{address}' is not a local@domain address"))
            })?;
        let domain = Domain::parse(domain)?;
        let address = format!("{local}@{domain}");

        match self.exchange_for(&domain, known_exchange).await {
            MailExchange::NoMailService(reason) => Ok(AddressCheck::NoMailService { reason }),
            MailExchange::Host(record) => {
                let report = self.prober.probe(&record.exchange, &address).await;
                Ok(AddressCheck::Probed { report })
            }
        }
    }

    /// Runs the catch-all check alone, whatever `catch_all_check` says.
    pub async fn check_catch_all(
        &self,
        domain: &str,
        known_exchange: Option<&str>,
    ) -> Result<CatchAllReport, FinderError> {
        let domain = Domain::parse(domain)?;
        let mut assessment = DomainAssessment::new(domain.clone());
        let exchange = match self.exchange_for(&domain, known_exchange).await {
            MailExchange::NoMailService(reason) => {
                return Ok(CatchAllReport::NoMailService { assessment, reason });
            }
            MailExchange::Host(record) => record.exchange,
        };
        assessment.with_exchange(&exchange);

        let check =
            detect_catch_all(&self.prober, &domain, &exchange, &self.options.catch_all).await;
        assessment.is_catch_all = Some(check.is_catch_all);
        Ok(CatchAllReport::Checked {
            assessment,
            probe: check.probe,
        })
    }

    async fn exchange_for(&self, domain: &Domain, known_exchange: Option<&str>) -> MailExchange {
        match known_exchange.map(str::trim).filter(|host| !host.is_empty()) {
            Some(host) => {
                tracing::debug!(target: "finder", "{domain}: using known exchange {host}");
                MailExchange::Host(MxRecord::new(0, mx::normalize_exchange(host.to_string())))
            }
            None => mx::resolve_mail_exchange(&self.resolver, domain).await,
        }
    }
}

/// `None` when `cancel` fires before `fut` completes; `fut` is dropped,
/// which tears down any connection it owned.
async fn or_cancel<F: Future>(cancel: &CancellationToken, fut: F) -> Option<F::Output> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => None,
        output = fut => Some(output),
    }
}

#[cfg(test)]
mod tests;
