use std::sync::OnceLock;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite};

use super::error::ProbeError;
use super::machine::{ProbeMachine, Step};
use super::options::ProbeOptions;
use super::session::{Connector, SmtpSession, TcpConnector};
use super::types::{ProbeOutcome, ProbeReport, ProbeStage, SmtpEvent};
use super::util::split_address;

/// Anything able to run one deliverability probe. The finder only sees this
/// trait, which keeps the orchestration testable without sockets.
#[async_trait]
pub trait MailboxProber: Send + Sync {
    /// Always yields a report: transport failures become
    /// [`ProbeOutcome::Indeterminate`], never an error.
    async fn probe(&self, exchange: &str, address: &str) -> ProbeReport;
}

/// SMTP `HELO` / `MAIL FROM` / `RCPT TO` prober over a fresh connection per
/// probe.
#[derive(Debug, Clone, Default)]
pub struct SmtpProber<C = TcpConnector> {
    connector: C,
    options: ProbeOptions,
}

impl SmtpProber<TcpConnector> {
    pub fn new(options: ProbeOptions) -> Self {
        Self::with_connector(TcpConnector, options)
    }
}

impl<C: Connector> SmtpProber<C> {
    pub fn with_connector(connector: C, options: ProbeOptions) -> Self {
        Self { connector, options }
    }

    pub fn options(&self) -> &ProbeOptions {
        &self.options
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }
}

#[async_trait]
impl<C: Connector> MailboxProber for SmtpProber<C> {
    async fn probe(&self, exchange: &str, address: &str) -> ProbeReport {
        let task_label = format!("[{address} via {exchange}]");
        let Some((_, domain)) = split_address(address) else {
            let outcome = ProbeOutcome::Indeterminate {
                stage: ProbeStage::Connecting,
                reason: format!("'{address}' is not a local@domain address"),
            };
            tracing::warn!(target: "smtp_probe", "{task_label} {outcome}");
            return ProbeReport::new(address, exchange, outcome);
        };

        let machine = ProbeMachine::new(
            self.options.helo_domain(domain),
            self.options.envelope_sender(domain),
            address,
        );
        let mut run = ProbeRun::new(machine);

        match SmtpSession::connect(
            &self.connector,
            exchange,
            self.options.port,
            self.options.connect_timeout,
            self.options.command_timeout,
        )
        .await
        {
            Ok(mut session) => {
                run.converse(&mut session).await;
                run.quit(&mut session).await;
                session.close().await;
            }
            Err(err) => run.fail(ProbeStage::Connecting, err),
        }

        let (outcome, events) = run.into_parts();
        match &outcome {
            ProbeOutcome::Accepted { .. } | ProbeOutcome::Rejected { .. } => {
                tracing::info!(target: "smtp_probe", "{task_label} {outcome}")
            }
            ProbeOutcome::Indeterminate { .. } => {
                tracing::warn!(target: "smtp_probe", "{task_label} {outcome}")
            }
        }
        ProbeReport {
            address: address.to_string(),
            exchange: exchange.to_string(),
            outcome,
            events,
        }
    }
}

/// State of one probe in flight: the conversation machine, the transcript
/// and a one-shot cell holding the outcome. The first resolution wins; any
/// later one (a failing `QUIT`, a stray reply) is only logged.
struct ProbeRun {
    machine: ProbeMachine,
    resolution: OnceLock<ProbeOutcome>,
    events: Vec<SmtpEvent>,
}

impl ProbeRun {
    fn new(machine: ProbeMachine) -> Self {
        Self {
            machine,
            resolution: OnceLock::new(),
            events: Vec::new(),
        }
    }

    fn is_resolved(&self) -> bool {
        self.resolution.get().is_some()
    }

    fn resolve(&mut self, outcome: ProbeOutcome) {
        if let Err(late) = self.resolution.set(outcome) {
            tracing::debug!(target: "smtp_probe", "ignoring late resolution: {late}");
        }
    }

    fn fail(&mut self, stage: ProbeStage, err: ProbeError) {
        let reason = err.to_string();
        self.events.push(SmtpEvent::Error {
            stage,
            message: reason.clone(),
        });
        self.resolve(ProbeOutcome::Indeterminate { stage, reason });
    }

    async fn converse<S>(&mut self, session: &mut SmtpSession<S>)
    where
        S: AsyncRead + AsyncWrite + Unpin + Send,
    {
        while !self.is_resolved() {
            let stage = self.machine.stage();
            let reply = match session.read_reply(stage).await {
                Ok(reply) => reply,
                Err(err) => {
                    self.fail(stage, err);
                    session.close().await;
                    return;
                }
            };
            match &reply {
                Ok(reply) => {
                    tracing::debug!(target: "smtp_probe", "S: {} {}", reply.code, reply.message);
                    self.events.push(SmtpEvent::Received {
                        stage,
                        reply: reply.clone(),
                    });
                }
                Err(err) => self.events.push(SmtpEvent::Error {
                    stage,
                    message: err.to_string(),
                }),
            }

            match self.machine.on_reply(reply) {
                Step::Send { stage, command } => {
                    tracing::debug!(target: "smtp_probe", "C: {command}");
                    self.events.push(SmtpEvent::Sent {
                        stage,
                        command: command.clone(),
                    });
                    if let Err(err) = session.send_command(&command, stage).await {
                        self.fail(stage, err);
                        session.close().await;
                        return;
                    }
                }
                Step::Finish(outcome) => self.resolve(outcome),
                Step::Ignore => {}
            }
        }
    }

    /// Polite `QUIT` after a verdict; skipped when the connection is gone.
    /// The server's answer is not awaited.
    async fn quit<S>(&mut self, session: &mut SmtpSession<S>)
    where
        S: AsyncRead + AsyncWrite + Unpin + Send,
    {
        if !session.is_open() {
            return;
        }
        const QUIT_CMD: &str = "QUIT";
        self.events.push(SmtpEvent::Sent {
            stage: ProbeStage::Quit,
            command: QUIT_CMD.to_string(),
        });
        if let Err(err) = session.send_command(QUIT_CMD, ProbeStage::Quit).await {
            self.fail(ProbeStage::Quit, err);
        }
    }

    fn into_parts(self) -> (ProbeOutcome, Vec<SmtpEvent>) {
        let outcome = self
            .resolution
            .into_inner()
            .unwrap_or_else(|| ProbeOutcome::Indeterminate {
                stage: ProbeStage::Connecting,
                reason: "probe ended without resolution".to_string(),
            });
        (outcome, self.events)
    }
}
