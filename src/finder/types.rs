use std::fmt;

use crate::domain::Domain;
use crate::mx::NoServiceReason;
use crate::permutation::Candidate;
use crate::smtp_verify::{ProbeOutcome, ProbeReport};

/// What is known about the target domain, filled in as the run advances:
/// MX first, then catch-all.
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainAssessment {
    pub domain: Domain,
    pub mx_host: Option<String>,
    pub has_mx: bool,
    /// `None` until a catch-all check ran.
    pub is_catch_all: Option<bool>,
}

impl DomainAssessment {
    pub fn new(domain: Domain) -> Self {
        Self {
            domain,
            mx_host: None,
            has_mx: false,
            is_catch_all: None,
        }
    }

    pub(crate) fn with_exchange(&mut self, host: &str) {
        self.mx_host = Some(host.to_string());
        self.has_mx = true;
    }
}

/// One probed candidate and how the server answered.
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateAttempt {
    pub candidate: Candidate,
    pub report: ProbeReport,
}

impl CandidateAttempt {
    pub fn address(&self) -> String {
        self.candidate.address()
    }

    pub fn outcome(&self) -> &ProbeOutcome {
        &self.report.outcome
    }
}

#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "with-serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectionMethod {
    SmtpValidation,
}

impl DetectionMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SmtpValidation => "smtp_validation",
        }
    }
}

#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "with-serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confidence {
    High,
}

impl Confidence {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::High => "high",
        }
    }
}

/// What the caller should do after an exhausted run.
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "with-serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowUp {
    /// Retry the remaining patterns off-peak, under a slower rate.
    ScheduleNightBatch,
}

impl FollowUp {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ScheduleNightBatch => "schedule_night_batch",
        }
    }
}

/// Final answer of [`EmailFinder::verify`](super::EmailFinder::verify).
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "with-serde", serde(tag = "status", rename_all = "snake_case"))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// The domain cannot receive mail; nothing was probed.
    InvalidDomain {
        assessment: DomainAssessment,
        reason: NoServiceReason,
    },
    /// The exchange accepted a mailbox that cannot exist, so per-address
    /// answers would be meaningless.
    RiskyCatchAll {
        assessment: DomainAssessment,
        probe: ProbeReport,
    },
    Found {
        assessment: DomainAssessment,
        email: String,
        candidate: Candidate,
        /// 1-based position of the accepted candidate.
        attempts: usize,
        method: DetectionMethod,
        confidence: Confidence,
        tested: Vec<CandidateAttempt>,
    },
    NotFound {
        assessment: DomainAssessment,
        action: FollowUp,
        tested: Vec<CandidateAttempt>,
    },
}

impl Verdict {
    pub fn tag(&self) -> &'static str {
        match self {
            Self::InvalidDomain { .. } => "invalid_domain",
            Self::RiskyCatchAll { .. } => "risky_catch_all",
            Self::Found { .. } => "found",
            Self::NotFound { .. } => "not_found",
        }
    }

    /// Stable machine-readable explanation of the verdict.
    pub fn reason_code(&self) -> &'static str {
        match self {
            Self::InvalidDomain { reason, .. } => reason.code(),
            Self::RiskyCatchAll { .. } => "catch_all_domain",
            Self::Found { method, .. } => method.as_str(),
            Self::NotFound { .. } => "smtp_rejected_all",
        }
    }

    pub fn assessment(&self) -> &DomainAssessment {
        match self {
            Self::InvalidDomain { assessment, .. }
            | Self::RiskyCatchAll { assessment, .. }
            | Self::Found { assessment, .. }
            | Self::NotFound { assessment, .. } => assessment,
        }
    }

    /// Candidates probed during the run, in probing order.
    pub fn tested(&self) -> &[CandidateAttempt] {
        match self {
            Self::Found { tested, .. } | Self::NotFound { tested, .. } => tested,
            Self::InvalidDomain { .. } | Self::RiskyCatchAll { .. } => &[],
        }
    }

    pub fn email(&self) -> Option<&str> {
        match self {
            Self::Found { email, .. } => Some(email),
            _ => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found { .. })
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let domain = &self.assessment().domain;
        match self {
            Self::InvalidDomain { reason, .. } => write!(f, "invalid_domain: {domain} ({reason})"),
            Self::RiskyCatchAll { .. } => {
                write!(f, "risky_catch_all: {domain} accepts any recipient")
            }
            Self::Found {
                email, attempts, ..
            } => write!(f, "found: {email} (attempt {attempts})"),
            Self::NotFound { tested, .. } => {
                write!(f, "not_found: {} candidate(s) rejected at {domain}", tested.len())
            }
        }
    }
}

/// Result of checking one fully qualified address.
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "with-serde", serde(tag = "status", rename_all = "snake_case"))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddressCheck {
    NoMailService { reason: NoServiceReason },
    Probed { report: ProbeReport },
}

impl AddressCheck {
    pub fn outcome(&self) -> Option<&ProbeOutcome> {
        match self {
            Self::Probed { report } => Some(&report.outcome),
            Self::NoMailService { .. } => None,
        }
    }
}

/// Stand-alone catch-all answer, with the assessment it was based on.
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "with-serde", serde(tag = "status", rename_all = "snake_case"))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatchAllReport {
    NoMailService {
        assessment: DomainAssessment,
        reason: NoServiceReason,
    },
    Checked {
        assessment: DomainAssessment,
        probe: ProbeReport,
    },
}

impl CatchAllReport {
    pub fn is_catch_all(&self) -> Option<bool> {
        match self {
            Self::Checked { assessment, .. } => assessment.is_catch_all,
            Self::NoMailService { .. } => None,
        }
    }
}
