use std::borrow::Cow;
use std::time::Duration;

/// Controls how [`SmtpProber`](crate::smtp_verify::SmtpProber) talks to a
/// mail exchanger.
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeOptions {
    pub port: u16,
    pub helo_domain: Option<String>,
    pub envelope_sender: Option<String>,
    pub connect_timeout: Duration,
    /// Applies to every single read and write on the connection.
    pub command_timeout: Duration,
}

impl Default for ProbeOptions {
    fn default() -> Self {
        Self {
            port: 25,
            helo_domain: None,
            envelope_sender: None,
            connect_timeout: Duration::from_secs(5),
            command_timeout: Duration::from_secs(5),
        }
    }
}

impl ProbeOptions {
    /// Returns the hostname used in the `HELO` command. Defaults to the domain
    /// of the probed address when none is provided.
    pub fn helo_domain<'a>(&'a self, ascii_domain: &'a str) -> Cow<'a, str> {
        self.helo_domain
            .as_deref()
            .filter(|value| !value.is_empty())
            .map(Cow::Borrowed)
            .unwrap_or_else(|| Cow::Borrowed(ascii_domain))
    }

    /// Returns the envelope sender used in the `MAIL FROM` command. When
    /// unspecified a `verify@domain` placeholder is synthesised.
    pub fn envelope_sender(&self, ascii_domain: &str) -> String {
        self.envelope_sender
            .as_ref()
            .filter(|value| !value.is_empty())
            .cloned()
            .unwrap_or_else(|| format!("verify@{ascii_domain}"))
    }
}

/// Shape of the synthetic mailbox used for catch-all detection.
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatchAllOptions {
    pub label: String,
    pub token_len: usize,
}

impl Default for CatchAllOptions {
    fn default() -> Self {
        Self {
            label: "anticanary_".to_string(),
            token_len: 8,
        }
    }
}
