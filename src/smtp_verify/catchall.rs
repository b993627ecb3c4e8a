use super::options::CatchAllOptions;
use super::probe::MailboxProber;
use super::types::{ProbeOutcome, ProbeReport};
use super::util::random_token;
use crate::domain::Domain;

/// Result of probing a mailbox that should not exist.
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatchAllCheck {
    pub is_catch_all: bool,
    pub probe: ProbeReport,
}

pub fn synthetic_local_part(options: &CatchAllOptions) -> String {
    format!("{}{}", options.label, random_token(options.token_len))
}

/// Probes `<label><random>@domain` once. Only an acceptance marks the domain
/// catch-all; a rejection or a transport failure both leave it "not
/// catch-all" so network noise cannot block a reachable domain.
pub async fn detect_catch_all<P>(
    prober: &P,
    domain: &Domain,
    exchange: &str,
    options: &CatchAllOptions,
) -> CatchAllCheck
where
    P: MailboxProber + ?Sized,
{
    let address = format!("{}@{}", synthetic_local_part(options), domain);
    tracing::debug!(target: "catch_all", "testing {domain} via {exchange} with <{address}>");

    let probe = prober.probe(exchange, &address).await;
    let is_catch_all = probe.outcome.is_accepted();
    match &probe.outcome {
        ProbeOutcome::Accepted { .. } => {
            tracing::warn!(target: "catch_all", "{domain} accepts any recipient (catch-all)")
        }
        ProbeOutcome::Indeterminate { .. } => tracing::warn!(
            target: "catch_all",
            "{domain}: catch-all check inconclusive, assuming not catch-all ({})",
            probe.outcome
        ),
        ProbeOutcome::Rejected { .. } => {
            tracing::info!(target: "catch_all", "{domain} is not catch-all")
        }
    }

    CatchAllCheck {
        is_catch_all,
        probe,
    }
}
