//! The probe conversation as a pure state machine.
//!
//! [`ProbeMachine`] knows nothing about sockets: it is fed parsed replies and
//! answers with the next command to send or the final outcome. Once an
//! outcome has been produced every further reply is ignored.

use super::reply::ReplyError;
use super::types::{ProbeOutcome, ProbeStage, SmtpReply};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Step {
    Send { stage: ProbeStage, command: String },
    Finish(ProbeOutcome),
    Ignore,
}

#[derive(Debug)]
pub(crate) struct ProbeMachine {
    /// `None` once resolved.
    stage: Option<ProbeStage>,
    helo: String,
    sender: String,
    recipient: String,
}

impl ProbeMachine {
    pub(crate) fn new(
        helo: impl Into<String>,
        sender: impl Into<String>,
        recipient: impl Into<String>,
    ) -> Self {
        Self {
            stage: Some(ProbeStage::AwaitGreeting),
            helo: helo.into(),
            sender: sender.into(),
            recipient: recipient.into(),
        }
    }

    /// Stage currently awaiting a reply, or [`ProbeStage::Quit`] once resolved.
    pub(crate) fn stage(&self) -> ProbeStage {
        self.stage.unwrap_or(ProbeStage::Quit)
    }

    pub(crate) fn on_reply(&mut self, reply: Result<SmtpReply, ReplyError>) -> Step {
        let Some(stage) = self.stage else {
            return Step::Ignore;
        };

        let reply = match reply {
            Ok(reply) => reply,
            Err(err) => {
                return self.finish(ProbeOutcome::Rejected {
                    stage,
                    code: None,
                    message: err.to_string(),
                });
            }
        };

        if stage == ProbeStage::AwaitVerdict {
            let outcome = if reply.is_positive_completion() {
                ProbeOutcome::Accepted { code: reply.code }
            } else {
                rejected(stage, reply)
            };
            return self.finish(outcome);
        }

        if !reply.is_positive_completion() {
            return self.finish(rejected(stage, reply));
        }

        let (next, command) = match stage {
            ProbeStage::AwaitGreeting => (ProbeStage::AwaitHeloAck, format!("HELO {}", self.helo)),
            ProbeStage::AwaitHeloAck => (
                ProbeStage::AwaitMailAck,
                format!("MAIL FROM:<{}>", self.sender),
            ),
            ProbeStage::AwaitMailAck => (
                ProbeStage::AwaitVerdict,
                format!("RCPT TO:<{}>", self.recipient),
            ),
            ProbeStage::Connecting | ProbeStage::AwaitVerdict | ProbeStage::Quit => {
                return self.finish(ProbeOutcome::Indeterminate {
                    stage,
                    reason: "reply received outside the conversation".to_string(),
                });
            }
        };
        self.stage = Some(next);
        Step::Send {
            stage: next,
            command,
        }
    }

    fn finish(&mut self, outcome: ProbeOutcome) -> Step {
        self.stage = None;
        Step::Finish(outcome)
    }
}

fn rejected(stage: ProbeStage, reply: SmtpReply) -> ProbeOutcome {
    ProbeOutcome::Rejected {
        stage,
        code: Some(reply.code),
        message: reply.message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn machine() -> ProbeMachine {
        ProbeMachine::new("acme.com", "verify@acme.com", "ana@acme.com")
    }

    fn ok(code: u16) -> Result<SmtpReply, ReplyError> {
        Ok(SmtpReply::new(code, "ok"))
    }

    fn command(step: Step) -> String {
        match step {
            Step::Send { command, .. } => command,
            other => panic!("expected a command, got {other:?}"),
        }
    }

    #[test]
    fn happy_path_sends_commands_in_order() {
        let mut m = machine();
        assert_eq!(command(m.on_reply(ok(220))), "HELO acme.com");
        assert_eq!(m.stage(), ProbeStage::AwaitHeloAck);
        assert_eq!(command(m.on_reply(ok(250))), "MAIL FROM:<verify@acme.com>");
        assert_eq!(command(m.on_reply(ok(250))), "RCPT TO:<ana@acme.com>");
        assert_eq!(m.stage(), ProbeStage::AwaitVerdict);
        assert_eq!(
            m.on_reply(ok(250)),
            Step::Finish(ProbeOutcome::Accepted { code: 250 })
        );
    }

    #[test]
    fn any_2xx_advances() {
        let mut m = machine();
        command(m.on_reply(ok(220)));
        command(m.on_reply(ok(251)));
        command(m.on_reply(ok(252)));
        assert_eq!(
            m.on_reply(ok(251)),
            Step::Finish(ProbeOutcome::Accepted { code: 251 })
        );
    }

    #[test]
    fn transient_and_permanent_verdicts_reject() {
        for code in [450, 451, 550, 553] {
            let mut m = machine();
            command(m.on_reply(ok(220)));
            command(m.on_reply(ok(250)));
            command(m.on_reply(ok(250)));
            match m.on_reply(Ok(SmtpReply::new(code, "no"))) {
                Step::Finish(outcome @ ProbeOutcome::Rejected { .. }) => {
                    assert_eq!(outcome.is_transient_rejection(), code < 500)
                }
                other => panic!("unexpected step: {other:?}"),
            }
        }
    }

    #[test]
    fn negative_greeting_rejects_without_helo() {
        let mut m = machine();
        let step = m.on_reply(Ok(SmtpReply::new(554, "no service")));
        assert_eq!(
            step,
            Step::Finish(ProbeOutcome::Rejected {
                stage: ProbeStage::AwaitGreeting,
                code: Some(554),
                message: "no service".to_string(),
            })
        );
    }

    #[test]
    fn malformed_reply_is_a_rejection() {
        let mut m = machine();
        command(m.on_reply(ok(220)));
        let step = m.on_reply(Err(ReplyError::Malformed("???".into())));
        assert!(matches!(
            step,
            Step::Finish(ProbeOutcome::Rejected {
                stage: ProbeStage::AwaitHeloAck,
                code: None,
                ..
            })
        ));
    }

    #[test]
    fn replies_after_resolution_are_ignored() {
        let mut m = machine();
        assert!(matches!(
            m.on_reply(Ok(SmtpReply::new(421, "bye"))),
            Step::Finish(_)
        ));
        assert_eq!(m.on_reply(ok(250)), Step::Ignore);
        assert_eq!(m.on_reply(ok(220)), Step::Ignore);
        assert_eq!(m.stage(), ProbeStage::Quit);
    }
}
