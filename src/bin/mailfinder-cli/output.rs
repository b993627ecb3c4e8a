use anyhow::Result;
#[cfg(not(feature = "with-serde"))]
use anyhow::bail;

use crate::args::OutputFormat;
use mailfinder_lib::{
    AddressCheck, Candidate, CandidateAttempt, CatchAllReport, DomainAssessment, MxStatus,
    ProbeReport, Verdict,
};

pub fn write_verdict(verdict: &Verdict, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Human => {
            println!("{verdict}");
            print_assessment(verdict.assessment());
            match verdict {
                Verdict::Found {
                    attempts,
                    confidence,
                    method,
                    ..
                } => println!(
                    "        method: {} (confidence {}, {attempts} attempt(s))",
                    method.as_str(),
                    confidence.as_str()
                ),
                Verdict::NotFound { action, .. } => {
                    println!("        action: {}", action.as_str())
                }
                Verdict::RiskyCatchAll { probe, .. } => {
                    println!("        synthetic: {} {}", probe.address, probe.outcome)
                }
                Verdict::InvalidDomain { .. } => {}
            }
            print_attempts(verdict.tested());
            println!("        reason: {}", verdict.reason_code());
            Ok(())
        }
        OutputFormat::Json => write_json(&payload::VerdictPayload::new(verdict)),
    }
}

pub fn write_address_check(check: &AddressCheck, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Human => {
            match check {
                AddressCheck::NoMailService { reason } => {
                    println!("[NO MX]   {reason} ({})", reason.code())
                }
                AddressCheck::Probed { report } => print_report(report),
            }
            Ok(())
        }
        OutputFormat::Json => write_json(check),
    }
}

pub fn write_catch_all(report: &CatchAllReport, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Human => {
            match report {
                CatchAllReport::NoMailService { assessment, reason } => {
                    println!("[NO MX]   {} :: {reason}", assessment.domain)
                }
                CatchAllReport::Checked { assessment, probe } => {
                    if assessment.is_catch_all == Some(true) {
                        println!("[CATCH-ALL] {}", assessment.domain);
                    } else {
                        println!("[OK]      {} is not catch-all", assessment.domain);
                    }
                    print_assessment(assessment);
                    print_report(probe);
                }
            }
            Ok(())
        }
        OutputFormat::Json => write_json(report),
    }
}

pub fn write_mx(domain: &str, status: &MxStatus, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Human => {
            match status {
                MxStatus::Records(records) => {
                    println!("{domain}:");
                    for record in records {
                        println!("        {:>5} {}", record.preference, record.exchange);
                    }
                }
                MxStatus::NoRecords => println!("{domain}: no MX records"),
            }
            Ok(())
        }
        OutputFormat::Json => write_json(status),
    }
}

pub fn write_candidates(candidates: &[Candidate], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Human => {
            for (idx, candidate) in candidates.iter().enumerate() {
                println!("{:>2}. {candidate}", idx + 1);
            }
            Ok(())
        }
        OutputFormat::Json => write_json(candidates),
    }
}

fn print_assessment(assessment: &DomainAssessment) {
    if let Some(host) = &assessment.mx_host {
        println!("        mx: {host}");
    }
    if let Some(catch_all) = assessment.is_catch_all {
        println!("        catch-all: {catch_all}");
    }
}

fn print_attempts(attempts: &[CandidateAttempt]) {
    for attempt in attempts {
        println!("        tested: {} :: {}", attempt.address(), attempt.outcome());
    }
}

fn print_report(report: &ProbeReport) {
    let label = match report.outcome.tag() {
        "accepted" => "[ACCEPTED]",
        "rejected" => "[REJECTED]",
        _ => "[UNKNOWN] ",
    };
    println!("{label} {} via {} :: {}", report.address, report.exchange, report.outcome);
    for event in &report.events {
        println!("        {}", payload::event_line(event));
    }
}

#[cfg(feature = "with-serde")]
fn write_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(not(feature = "with-serde"))]
fn write_json<T: ?Sized>(_: &T) -> Result<()> {
    bail!("format=json nécessite la feature 'with-serde'")
}

mod payload {
    use mailfinder_lib::Verdict;
    use mailfinder_lib::smtp_verify::SmtpEvent;

    /// JSON shape of a verdict: the tagged verdict plus its reason code.
    #[cfg_attr(feature = "with-serde", derive(serde::Serialize))]
    #[cfg_attr(not(feature = "with-serde"), allow(dead_code))]
    pub struct VerdictPayload<'a> {
        pub reason: &'static str,
        #[cfg_attr(feature = "with-serde", serde(flatten))]
        pub verdict: &'a Verdict,
    }

    impl<'a> VerdictPayload<'a> {
        pub fn new(verdict: &'a Verdict) -> Self {
            Self {
                reason: verdict.reason_code(),
                verdict,
            }
        }
    }

    pub fn event_line(event: &SmtpEvent) -> String {
        match event {
            SmtpEvent::Sent { command, .. } => format!("C: {command}"),
            SmtpEvent::Received { reply, .. } => format!("S: {reply}"),
            SmtpEvent::Error { stage, message } => format!("!! {stage}: {message}"),
        }
    }
}
