use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::*;
use crate::mx::tests::StubResolver;
use crate::mx::{Error as MxError, NoServiceReason};
use crate::smtp_verify::{ProbeOutcome, ProbeReport, ProbeStage};

const JOAO: [&str; 5] = [
    "joao.moreiramota@empresa.com",
    "jmoreiramota@empresa.com",
    "joaomoreiramota@empresa.com",
    "j.moreiramota@empresa.com",
    "joao@empresa.com",
];

type AnswerFn = dyn Fn(&str) -> ProbeOutcome + Send + Sync;

/// Answers from a closure and records every (exchange, address) probed.
/// Can cancel a token right after the n-th probe completes.
struct ScriptedProber {
    answer: Box<AnswerFn>,
    probed: Mutex<Vec<(String, String)>>,
    cancel_after: Option<(usize, CancellationToken)>,
}

impl ScriptedProber {
    fn new<F>(answer: F) -> Self
    where
        F: Fn(&str) -> ProbeOutcome + Send + Sync + 'static,
    {
        Self {
            answer: Box::new(answer),
            probed: Mutex::new(Vec::new()),
            cancel_after: None,
        }
    }

    /// Rejects everything except `address`.
    fn accepting(address: &'static str) -> Self {
        Self::new(move |probed| {
            if probed == address {
                ProbeOutcome::Accepted { code: 250 }
            } else {
                rejected(550)
            }
        })
    }

    fn cancelling_after(mut self, probes: usize, token: &CancellationToken) -> Self {
        self.cancel_after = Some((probes, token.clone()));
        self
    }

    fn addresses(&self) -> Vec<String> {
        self.probed
            .lock()
            .expect("lock")
            .iter()
            .map(|(_, address)| address.clone())
            .collect()
    }

    fn exchanges(&self) -> Vec<String> {
        self.probed
            .lock()
            .expect("lock")
            .iter()
            .map(|(exchange, _)| exchange.clone())
            .collect()
    }

    /// Probes of generated candidates, the synthetic catch-all one excluded.
    fn candidate_probes(&self) -> usize {
        self.addresses()
            .iter()
            .filter(|address| !address.starts_with("anticanary_"))
            .count()
    }
}

#[async_trait]
impl MailboxProber for ScriptedProber {
    async fn probe(&self, exchange: &str, address: &str) -> ProbeReport {
        let count = {
            let mut probed = self.probed.lock().expect("lock");
            probed.push((exchange.to_string(), address.to_string()));
            probed.len()
        };
        let outcome = (self.answer)(address);
        if let Some((after, token)) = &self.cancel_after {
            if count == *after {
                token.cancel();
            }
        }
        ProbeReport::new(address, exchange, outcome)
    }
}

/// Returns at once and records each requested delay. Can refuse the n-th
/// pause by cancelling the token, as a caller disconnecting mid-wait would.
#[derive(Default)]
struct RecordingPacer {
    delays: Mutex<Vec<Duration>>,
    cancel_on: Option<usize>,
}

impl RecordingPacer {
    fn cancelling_on(pause: usize) -> Self {
        Self {
            cancel_on: Some(pause),
            ..Self::default()
        }
    }

    fn count(&self) -> usize {
        self.delays.lock().expect("lock").len()
    }
}

#[async_trait]
impl Pacer for RecordingPacer {
    async fn pause(&self, delay: Duration, cancel: &CancellationToken) -> bool {
        let count = {
            let mut delays = self.delays.lock().expect("lock");
            delays.push(delay);
            delays.len()
        };
        if self.cancel_on == Some(count) {
            cancel.cancel();
        }
        !cancel.is_cancelled()
    }
}

fn rejected(code: u16) -> ProbeOutcome {
    ProbeOutcome::Rejected {
        stage: ProbeStage::AwaitVerdict,
        code: Some(code),
        message: "5.1.1 user unknown".into(),
    }
}

fn indeterminate() -> ProbeOutcome {
    ProbeOutcome::Indeterminate {
        stage: ProbeStage::AwaitGreeting,
        reason: "greeting timed out after 5s".into(),
    }
}

fn empresa_mx() -> StubResolver {
    StubResolver::with_records(vec![
        MxRecord::new(20, "mx2.empresa.com"),
        MxRecord::new(10, "mx1.empresa.com"),
    ])
}

type TestFinder = EmailFinder<StubResolver, ScriptedProber, RecordingPacer>;

fn finder(resolver: StubResolver, prober: ScriptedProber, pacer: RecordingPacer) -> TestFinder {
    EmailFinder::with_parts(resolver, prober, pacer, FinderOptions::default())
}

async fn verify_joao(
    finder: &TestFinder,
    cancel: &CancellationToken,
) -> Result<Verdict, FinderError> {
    finder
        .verify("João", Some("Moreira Mota"), "Empresa.com", cancel)
        .await
}

#[tokio::test]
async fn domain_without_mx_is_invalid_and_never_contacted() {
    let finder = finder(
        StubResolver::with_records(Vec::new()),
        ScriptedProber::new(|_| ProbeOutcome::Accepted { code: 250 }),
        RecordingPacer::default(),
    );
    let verdict = verify_joao(&finder, &CancellationToken::new())
        .await
        .expect("verdict");

    match &verdict {
        Verdict::InvalidDomain { assessment, reason } => {
            assert_eq!(*reason, NoServiceReason::NoRecords);
            assert!(!assessment.has_mx);
            assert_eq!(assessment.mx_host, None);
            assert_eq!(assessment.is_catch_all, None);
        }
        other => panic!("unexpected verdict: {other:?}"),
    }
    assert_eq!(verdict.tag(), "invalid_domain");
    assert_eq!(verdict.reason_code(), "no_records");
    assert!(finder.prober.addresses().is_empty());
    assert_eq!(finder.pacer.count(), 0);
}

#[tokio::test]
async fn dns_failures_are_invalid_domain_verdicts() {
    let cases = [
        (MxError::nx_domain("empresa.com"), "nxdomain"),
        (MxError::timeout("empresa.com"), "timeout"),
    ];
    for (error, code) in cases {
        let error = std::sync::Mutex::new(Some(error));
        let resolver = StubResolver::new(move |_| {
            Err(error.lock().expect("lock").take().expect("single lookup"))
        });
        let finder = finder(
            resolver,
            ScriptedProber::new(|_| rejected(550)),
            RecordingPacer::default(),
        );
        let verdict = verify_joao(&finder, &CancellationToken::new())
            .await
            .expect("verdict");
        assert_eq!(verdict.tag(), "invalid_domain");
        assert_eq!(verdict.reason_code(), code);
        assert_eq!(finder.resolver.calls(), 1, "no retry at the resolver layer");
        assert!(finder.prober.addresses().is_empty());
    }
}

#[tokio::test]
async fn catch_all_domain_gets_only_the_synthetic_mailbox() {
    let finder = finder(
        empresa_mx(),
        ScriptedProber::new(|_| ProbeOutcome::Accepted { code: 250 }),
        RecordingPacer::default(),
    );
    let verdict = verify_joao(&finder, &CancellationToken::new())
        .await
        .expect("verdict");

    match &verdict {
        Verdict::RiskyCatchAll { assessment, probe } => {
            assert_eq!(assessment.is_catch_all, Some(true));
            assert_eq!(assessment.mx_host.as_deref(), Some("mx1.empresa.com"));
            assert!(probe.address.starts_with("anticanary_"));
            assert!(probe.address.ends_with("@empresa.com"));
        }
        other => panic!("unexpected verdict: {other:?}"),
    }
    assert_eq!(finder.prober.addresses().len(), 1);
    assert_eq!(finder.prober.candidate_probes(), 0);
    assert_eq!(finder.pacer.count(), 0);
}

#[tokio::test]
async fn kth_acceptance_costs_k_checks_and_k_minus_one_delays() {
    for (index, target) in JOAO.into_iter().enumerate() {
        let k = index + 1;
        let finder = finder(
            empresa_mx(),
            ScriptedProber::accepting(target),
            RecordingPacer::default(),
        );
        let verdict = verify_joao(&finder, &CancellationToken::new())
            .await
            .expect("verdict");

        match &verdict {
            Verdict::Found {
                email,
                attempts,
                method,
                confidence,
                tested,
                assessment,
                ..
            } => {
                assert_eq!(email, target);
                assert_eq!(*attempts, k);
                assert_eq!(*method, DetectionMethod::SmtpValidation);
                assert_eq!(*confidence, Confidence::High);
                assert_eq!(tested.len(), k);
                assert_eq!(assessment.is_catch_all, Some(false));
            }
            other => panic!("unexpected verdict for k={k}: {other:?}"),
        }
        assert_eq!(finder.prober.candidate_probes(), k, "k={k}");
        assert_eq!(finder.pacer.count(), k - 1, "k={k}");
        assert_eq!(verdict.reason_code(), "smtp_validation");
    }
}

#[tokio::test]
async fn exhausted_run_reports_every_candidate_in_order() {
    let finder = finder(
        empresa_mx(),
        ScriptedProber::new(|_| rejected(550)),
        RecordingPacer::default(),
    );
    let verdict = verify_joao(&finder, &CancellationToken::new())
        .await
        .expect("verdict");

    match &verdict {
        Verdict::NotFound { action, tested, .. } => {
            assert_eq!(*action, FollowUp::ScheduleNightBatch);
            let addresses: Vec<String> = tested.iter().map(CandidateAttempt::address).collect();
            assert_eq!(addresses, JOAO);
        }
        other => panic!("unexpected verdict: {other:?}"),
    }
    assert_eq!(verdict.reason_code(), "smtp_rejected_all");
    assert_eq!(finder.prober.candidate_probes(), JOAO.len());
    assert_eq!(finder.pacer.count(), JOAO.len() - 1);
    let delays = finder.pacer.delays.lock().expect("lock").clone();
    assert!(delays.iter().all(|delay| *delay == DEFAULT_PROBE_DELAY));
}

#[tokio::test]
async fn transport_errors_keep_pacing_and_count_as_misses() {
    let finder = finder(
        empresa_mx(),
        ScriptedProber::new(|address| {
            if address.starts_with("anticanary_") || address.starts_with("joao.") {
                rejected(550)
            } else if address.starts_with("jmoreira") {
                rejected(451)
            } else {
                indeterminate()
            }
        }),
        RecordingPacer::default(),
    );
    let verdict = verify_joao(&finder, &CancellationToken::new())
        .await
        .expect("verdict");

    let tested = verdict.tested();
    assert_eq!(verdict.tag(), "not_found");
    assert_eq!(tested.len(), 5);
    assert!(tested[1].outcome().is_transient_rejection());
    assert!(matches!(
        tested[4].outcome(),
        ProbeOutcome::Indeterminate { .. }
    ));
    assert_eq!(finder.pacer.count(), 4);
}

#[tokio::test]
async fn single_candidate_has_no_trailing_delay() {
    let finder = EmailFinder::with_parts(
        empresa_mx(),
        ScriptedProber::new(|_| rejected(550)),
        RecordingPacer::default(),
        FinderOptions {
            max_candidates: 1,
            ..FinderOptions::default()
        },
    );
    let verdict = verify_joao(&finder, &CancellationToken::new())
        .await
        .expect("verdict");
    assert_eq!(verdict.tested().len(), 1);
    assert_eq!(finder.pacer.count(), 0);
}

#[tokio::test]
async fn repeated_runs_give_the_same_verdict() {
    let finder = finder(
        empresa_mx(),
        ScriptedProber::accepting("j.moreiramota@empresa.com"),
        RecordingPacer::default(),
    );
    let first = verify_joao(&finder, &CancellationToken::new())
        .await
        .expect("verdict");
    let second = verify_joao(&finder, &CancellationToken::new())
        .await
        .expect("verdict");
    assert_eq!(first, second);
}

#[tokio::test]
async fn cancellation_between_candidates_stops_checks_and_delays() {
    for i in 1..JOAO.len() {
        let cancel = CancellationToken::new();
        // catch-all probe + i candidates
        let prober = ScriptedProber::new(|_| rejected(550)).cancelling_after(i + 1, &cancel);
        let finder = finder(empresa_mx(), prober, RecordingPacer::default());

        let err = verify_joao(&finder, &cancel).await.unwrap_err();
        match err {
            FinderError::Cancelled { attempts, tested } => {
                assert_eq!(attempts, i);
                assert_eq!(tested, JOAO[..i].to_vec());
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(finder.prober.candidate_probes(), i, "i={i}");
        assert_eq!(finder.pacer.count(), i - 1, "i={i}");
    }
}

#[tokio::test]
async fn cancellation_during_a_delay_abandons_the_run() {
    let cancel = CancellationToken::new();
    let finder = finder(
        empresa_mx(),
        ScriptedProber::new(|_| rejected(550)),
        RecordingPacer::cancelling_on(2),
    );
    let err = verify_joao(&finder, &cancel).await.unwrap_err();
    assert!(matches!(err, FinderError::Cancelled { attempts: 2, .. }));
    assert_eq!(finder.prober.candidate_probes(), 2);
    assert_eq!(finder.pacer.count(), 2);
}

#[tokio::test]
async fn already_cancelled_run_does_nothing() {
    let cancel = CancellationToken::new();
    cancel.cancel();
    let finder = finder(
        empresa_mx(),
        ScriptedProber::new(|_| rejected(550)),
        RecordingPacer::default(),
    );
    let err = verify_joao(&finder, &cancel).await.unwrap_err();
    assert!(matches!(err, FinderError::Cancelled { attempts: 0, .. }));
    assert_eq!(finder.resolver.calls(), 0);
    assert!(finder.prober.addresses().is_empty());
}

#[tokio::test]
async fn known_exchange_skips_resolution() {
    let finder = finder(
        empresa_mx(),
        ScriptedProber::accepting("joao.moreiramota@empresa.com"),
        RecordingPacer::default(),
    );
    let verdict = finder
        .verify_with_exchange(
            "João",
            Some("Moreira Mota"),
            "empresa.com",
            Some("MX.Backup.Empresa.com."),
            &CancellationToken::new(),
        )
        .await
        .expect("verdict");

    assert!(verdict.is_found());
    assert_eq!(finder.resolver.calls(), 0);
    assert!(
        finder
            .prober
            .exchanges()
            .iter()
            .all(|exchange| exchange == "mx.backup.empresa.com")
    );
}

#[tokio::test]
async fn preferred_exchange_receives_every_check() {
    let finder = finder(
        empresa_mx(),
        ScriptedProber::new(|_| rejected(550)),
        RecordingPacer::default(),
    );
    verify_joao(&finder, &CancellationToken::new())
        .await
        .expect("verdict");
    let exchanges = finder.prober.exchanges();
    assert_eq!(exchanges.len(), 6);
    assert!(exchanges.iter().all(|exchange| exchange == "mx1.empresa.com"));
}

#[tokio::test]
async fn disabled_catch_all_check_tests_candidates_directly() {
    let finder = EmailFinder::with_parts(
        empresa_mx(),
        ScriptedProber::new(|_| ProbeOutcome::Accepted { code: 250 }),
        RecordingPacer::default(),
        FinderOptions {
            catch_all_check: false,
            ..FinderOptions::default()
        },
    );
    let verdict = verify_joao(&finder, &CancellationToken::new())
        .await
        .expect("verdict");
    assert_eq!(verdict.email(), Some(JOAO[0]));
    assert_eq!(verdict.assessment().is_catch_all, None);
    assert_eq!(finder.prober.addresses(), vec![JOAO[0].to_string()]);
}

#[tokio::test]
async fn bad_input_is_an_error_not_a_verdict() {
    let finder = finder(
        empresa_mx(),
        ScriptedProber::new(|_| rejected(550)),
        RecordingPacer::default(),
    );
    let cancel = CancellationToken::new();

    for (first, domain) in [("", "empresa.com"), ("  ", "empresa.com"), ("!!!", "empresa.com")] {
        let err = finder.verify(first, Some("Mota"), domain, &cancel).await.unwrap_err();
        assert!(matches!(err, FinderError::InvalidInput { .. }), "{first:?}");
    }
    for domain in ["", "localhost", "bad_domain!.com"] {
        let err = finder.verify("Ana", Some("Mota"), domain, &cancel).await.unwrap_err();
        assert!(matches!(err, FinderError::InvalidInput { .. }), "{domain:?}");
    }
    assert_eq!(finder.resolver.calls(), 0);
    assert!(finder.prober.addresses().is_empty());
}

#[tokio::test]
async fn check_address_resolves_only_without_known_exchange() {
    let finder = finder(
        empresa_mx(),
        ScriptedProber::accepting("ana@empresa.com"),
        RecordingPacer::default(),
    );

    let check = finder
        .check_address(" ana@Empresa.com ", None)
        .await
        .expect("check");
    assert!(matches!(check.outcome(), Some(ProbeOutcome::Accepted { .. })));
    assert_eq!(finder.resolver.calls(), 1);

    let check = finder
        .check_address("ana@empresa.com", Some("mx9.empresa.com"))
        .await
        .expect("check");
    match check {
        AddressCheck::Probed { report } => assert_eq!(report.exchange, "mx9.empresa.com"),
        other => panic!("unexpected check: {other:?}"),
    }
    assert_eq!(finder.resolver.calls(), 1);
}

#[tokio::test]
async fn check_address_without_mail_service() {
    let finder = finder(
        StubResolver::with_records(Vec::new()),
        ScriptedProber::new(|_| rejected(550)),
        RecordingPacer::default(),
    );
    let check = finder
        .check_address("ana@empresa.com", None)
        .await
        .expect("check");
    assert_eq!(
        check,
        AddressCheck::NoMailService {
            reason: NoServiceReason::NoRecords
        }
    );
    assert!(finder.prober.addresses().is_empty());

    let err = finder.check_address("@empresa.com", None).await.unwrap_err();
    assert!(matches!(err, FinderError::InvalidInput { .. }));
}

#[tokio::test]
async fn stand_alone_catch_all_check() {
    let finder = finder(
        empresa_mx(),
        ScriptedProber::new(|_| ProbeOutcome::Accepted { code: 250 }),
        RecordingPacer::default(),
    );
    let report = finder
        .check_catch_all("empresa.com", None)
        .await
        .expect("report");
    assert_eq!(report.is_catch_all(), Some(true));

    let finder = self::finder(
        StubResolver::with_records(Vec::new()),
        ScriptedProber::new(|_| ProbeOutcome::Accepted { code: 250 }),
        RecordingPacer::default(),
    );
    let report = finder
        .check_catch_all("empresa.com", None)
        .await
        .expect("report");
    assert_eq!(report.is_catch_all(), None);
}
