use std::fmt;
use std::net::IpAddr;
use std::time::Duration;

#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MxRecord {
    pub preference: u16,
    pub exchange: String,
}

impl MxRecord {
    pub fn new(preference: u16, exchange: impl Into<String>) -> Self {
        Self {
            preference,
            exchange: exchange.into(),
        }
    }
}

/// Records in ascending preference; equal preferences keep DNS answer order.
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MxStatus {
    Records(Vec<MxRecord>),
    NoRecords,
}

impl MxStatus {
    pub fn records(&self) -> &[MxRecord] {
        match self {
            Self::Records(records) => records.as_slice(),
            Self::NoRecords => &[],
        }
    }

    pub fn preferred(&self) -> Option<&MxRecord> {
        self.records().first()
    }
}

/// Why a domain was judged unable to receive mail.
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "with-serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoServiceReason {
    NoRecords,
    NxDomain,
    Timeout,
    LookupFailed(String),
}

impl NoServiceReason {
    pub fn code(&self) -> &'static str {
        match self {
            Self::NoRecords => "no_records",
            Self::NxDomain => "nxdomain",
            Self::Timeout => "timeout",
            Self::LookupFailed(_) => "lookup_failed",
        }
    }
}

impl fmt::Display for NoServiceReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoRecords => f.write_str("no MX records"),
            Self::NxDomain => f.write_str("domain does not exist"),
            Self::Timeout => f.write_str("DNS lookup timed out"),
            Self::LookupFailed(message) => write!(f, "DNS lookup failed ({message})"),
        }
    }
}

/// Outcome of resolving a domain to the host that should be probed.
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MailExchange {
    Host(MxRecord),
    NoMailService(NoServiceReason),
}

impl MailExchange {
    pub fn host(&self) -> Option<&str> {
        match self {
            Self::Host(record) => Some(record.exchange.as_str()),
            Self::NoMailService(_) => None,
        }
    }
}

/// Resolver construction knobs. An empty server list means the system
/// configuration.
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnsOptions {
    pub servers: Vec<IpAddr>,
    pub timeout: Duration,
}

impl Default for DnsOptions {
    fn default() -> Self {
        Self {
            servers: Vec::new(),
            timeout: Duration::from_secs(5),
        }
    }
}
