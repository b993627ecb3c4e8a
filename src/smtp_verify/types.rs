use std::fmt;

/// A raw SMTP reply, preserving the numeric status code and message text.
/// Multi-line replies have their lines joined with `\n`.
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmtpReply {
    pub code: u16,
    pub message: String,
}

impl SmtpReply {
    pub fn new(code: u16, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn is_positive_completion(&self) -> bool {
        (200..300).contains(&self.code)
    }
}

impl fmt::Display for SmtpReply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.code, self.message)
    }
}

/// Probe conversation stages, strictly sequential.
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "with-serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeStage {
    Connecting,
    AwaitGreeting,
    AwaitHeloAck,
    AwaitMailAck,
    AwaitVerdict,
    Quit,
}

impl fmt::Display for ProbeStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Connecting => "connect",
            Self::AwaitGreeting => "greeting",
            Self::AwaitHeloAck => "HELO",
            Self::AwaitMailAck => "MAIL FROM",
            Self::AwaitVerdict => "RCPT TO",
            Self::Quit => "QUIT",
        })
    }
}

/// A recorded SMTP transcript event used for diagnostics.
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SmtpEvent {
    Sent { stage: ProbeStage, command: String },
    Received { stage: ProbeStage, reply: SmtpReply },
    Error { stage: ProbeStage, message: String },
}

/// Terminal resolution of one probe.
///
/// `Indeterminate` counts as "does not exist" for verdicts but stays
/// distinguishable in reports and logs.
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "with-serde", serde(tag = "outcome", rename_all = "snake_case"))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// The server answered `RCPT TO` with a 2xx reply.
    Accepted { code: u16 },
    /// Any non-2xx reply, or a reply that could not be parsed. `code` is
    /// absent for malformed replies.
    Rejected {
        stage: ProbeStage,
        code: Option<u16>,
        message: String,
    },
    /// Timeout, connection failure or premature end of stream.
    Indeterminate { stage: ProbeStage, reason: String },
}

impl ProbeOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted { .. })
    }

    /// A 4xx rejection: possibly greylisting rather than an unknown user.
    /// Verdicts still treat it as a rejection.
    pub fn is_transient_rejection(&self) -> bool {
        matches!(self, Self::Rejected { code: Some(code), .. } if (400..500).contains(code))
    }

    pub fn tag(&self) -> &'static str {
        match self {
            Self::Accepted { .. } => "accepted",
            Self::Rejected { .. } => "rejected",
            Self::Indeterminate { .. } => "indeterminate",
        }
    }
}

impl fmt::Display for ProbeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Accepted { code } => write!(f, "accepted ({code})"),
            Self::Rejected {
                stage,
                code: Some(code),
                message,
            } => write!(f, "rejected at {stage} ({code} {message})"),
            Self::Rejected {
                stage,
                code: None,
                message,
            } => write!(f, "rejected at {stage} (malformed reply: {message})"),
            Self::Indeterminate { stage, reason } => {
                write!(f, "indeterminate at {stage} ({reason})")
            }
        }
    }
}

/// Detailed report for a single probe.
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeReport {
    pub address: String,
    pub exchange: String,
    pub outcome: ProbeOutcome,
    pub events: Vec<SmtpEvent>,
}

impl ProbeReport {
    pub fn new(
        address: impl Into<String>,
        exchange: impl Into<String>,
        outcome: ProbeOutcome,
    ) -> Self {
        Self {
            address: address.into(),
            exchange: exchange.into(),
            outcome,
            events: Vec::new(),
        }
    }
}
