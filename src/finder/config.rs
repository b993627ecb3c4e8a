//! TOML configuration file. Every key is optional; absent keys keep the
//! value already present in the [`FinderOptions`] being updated.
//!
//! ```toml
//! max_candidates = 5
//! probe_delay_ms = 13000
//! catch_all_check = true
//!
//! [probe]
//! port = 25
//! helo_domain = "probe.example.net"
//! envelope_sender = "verify@example.net"
//! connect_timeout_ms = 5000
//! command_timeout_ms = 5000
//!
//! [catch_all]
//! label = "anticanary_"
//! token_len = 8
//!
//! [dns]
//! servers = ["1.1.1.1"]
//! timeout_ms = 5000
//! ```

use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use super::FinderOptions;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub(crate) max_candidates: Option<usize>,
    pub(crate) probe_delay_ms: Option<u64>,
    pub(crate) catch_all_check: Option<bool>,
    #[serde(default)]
    pub(crate) probe: ProbeConfig,
    #[serde(default)]
    pub(crate) catch_all: CatchAllConfig,
    #[serde(default)]
    pub(crate) dns: DnsConfig,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
pub(crate) struct ProbeConfig {
    pub(crate) port: Option<u16>,
    pub(crate) helo_domain: Option<String>,
    pub(crate) envelope_sender: Option<String>,
    pub(crate) connect_timeout_ms: Option<u64>,
    pub(crate) command_timeout_ms: Option<u64>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
pub(crate) struct CatchAllConfig {
    pub(crate) label: Option<String>,
    pub(crate) token_len: Option<usize>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
pub(crate) struct DnsConfig {
    pub(crate) servers: Option<Vec<IpAddr>>,
    pub(crate) timeout_ms: Option<u64>,
}

impl ConfigFile {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn parse(raw: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(raw)
    }

    /// Overlays the keys present in the file onto `options`.
    pub fn apply(self, options: &mut FinderOptions) {
        let millis = Duration::from_millis;

        if let Some(value) = self.max_candidates {
            options.max_candidates = value;
        }
        if let Some(value) = self.probe_delay_ms {
            options.probe_delay = millis(value);
        }
        if let Some(value) = self.catch_all_check {
            options.catch_all_check = value;
        }

        let probe = &mut options.probe;
        if let Some(value) = self.probe.port {
            probe.port = value;
        }
        if let Some(value) = self.probe.helo_domain {
            probe.helo_domain = Some(value);
        }
        if let Some(value) = self.probe.envelope_sender {
            probe.envelope_sender = Some(value);
        }
        if let Some(value) = self.probe.connect_timeout_ms {
            probe.connect_timeout = millis(value);
        }
        if let Some(value) = self.probe.command_timeout_ms {
            probe.command_timeout = millis(value);
        }

        if let Some(value) = self.catch_all.label {
            options.catch_all.label = value;
        }
        if let Some(value) = self.catch_all.token_len {
            options.catch_all.token_len = value;
        }

        if let Some(value) = self.dns.servers {
            options.dns.servers = value;
        }
        if let Some(value) = self.dns.timeout_ms {
            options.dns.timeout = millis(value);
        }
    }

    pub fn into_options(self) -> FinderOptions {
        let mut options = FinderOptions::default();
        self.apply(&mut options);
        options
    }
}
