#![forbid(unsafe_code)]
//! mailfinder_lib — découverte d'adresses e-mail par sondage SMTP
//!
//! Candidate addresses are generated from a person's name, the domain's MX
//! is resolved, and each candidate is probed with `HELO` / `MAIL FROM` /
//! `RCPT TO` without ever sending a message. See [`EmailFinder`].

pub mod domain;
pub mod finder;
pub mod mx;
pub mod permutation;
pub mod smtp_verify;

pub use domain::{Domain, DomainError};
pub use finder::{
    AddressCheck, CandidateAttempt, CatchAllReport, DomainAssessment, EmailFinder, FinderError,
    FinderOptions, Pacer, TokioPacer, Verdict,
};
pub use mx::{DnsOptions, Error as MxError, MailExchange, MxRecord, MxStatus, check_mx};
pub use permutation::{Candidate, LocalPattern, generate_candidates};
pub use smtp_verify::{
    CatchAllOptions, MailboxProber, ProbeOptions, ProbeOutcome, ProbeReport, SmtpProber,
};
pub use tokio_util::sync::CancellationToken;
