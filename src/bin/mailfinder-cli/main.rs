mod args;
mod output;

use std::process::ExitCode;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use args::{Cli, Commands};
use mailfinder_lib::{Domain, EmailFinder, FinderError, check_mx, generate_candidates};

// codes de sortie : 0 trouvé/positif, 2 autre verdict, 1 fatal, 130 interrompu
const EXIT_OTHER_VERDICT: u8 = 2;
const EXIT_CANCELLED: u8 = 130;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupted, cancelling the current run");
            on_signal.cancel();
        }
    });

    let options = cli.finder_options()?;
    let format = cli.format;

    let positive = match &cli.cmd {
        Commands::Find { person, mx, .. } => {
            let finder = EmailFinder::from_options(options)?;
            let verdict = match finder
                .verify_with_exchange(
                    &person.first,
                    person.last.as_deref(),
                    &person.domain,
                    mx.as_deref(),
                    &cancel,
                )
                .await
            {
                Ok(verdict) => verdict,
                Err(FinderError::Cancelled { attempts, tested }) => {
                    eprintln!("cancelled after {attempts} probe(s): {}", tested.join(", "));
                    return Ok(ExitCode::from(EXIT_CANCELLED));
                }
                Err(err) => return Err(err).context("verification failed"),
            };
            output::write_verdict(&verdict, format)?;
            verdict.is_found()
        }
        Commands::Probe { email, mx } => {
            let finder = EmailFinder::from_options(options)?;
            let check = finder.check_address(email, mx.as_deref());
            let Some(check) = until_cancelled(&cancel, check).await else {
                return Ok(ExitCode::from(EXIT_CANCELLED));
            };
            let check = check.with_context(|| format!("cannot probe '{email}'"))?;
            output::write_address_check(&check, format)?;
            check.outcome().is_some_and(|outcome| outcome.is_accepted())
        }
        Commands::CatchAll { domain, mx } => {
            let finder = EmailFinder::from_options(options)?;
            let report = finder.check_catch_all(domain, mx.as_deref());
            let Some(report) = until_cancelled(&cancel, report).await else {
                return Ok(ExitCode::from(EXIT_CANCELLED));
            };
            let report = report.with_context(|| format!("cannot check '{domain}'"))?;
            output::write_catch_all(&report, format)?;
            report.is_catch_all() == Some(false)
        }
        Commands::Mx { domain } => {
            let domain = Domain::parse(domain).context("invalid domain")?;
            let lookup = check_mx(&domain, &options.dns);
            let Some(status) = until_cancelled(&cancel, lookup).await else {
                return Ok(ExitCode::from(EXIT_CANCELLED));
            };
            let status = status.with_context(|| format!("MX lookup for {domain} failed"))?;
            output::write_mx(domain.as_str(), &status, format)?;
            status.preferred().is_some()
        }
        Commands::Candidates { person } => {
            let domain = Domain::parse(&person.domain).context("invalid domain")?;
            let candidates = generate_candidates(
                &person.first,
                person.last.as_deref(),
                domain.as_str(),
                options.max_candidates,
            );
            output::write_candidates(&candidates, format)?;
            !candidates.is_empty()
        }
    };

    Ok(if positive {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(EXIT_OTHER_VERDICT)
    })
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

async fn until_cancelled<F: std::future::Future>(
    cancel: &CancellationToken,
    fut: F,
) -> Option<F::Output> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => None,
        output = fut => Some(output),
    }
}
