use std::time::Duration;

use crate::mx::DnsOptions;
use crate::permutation::DEFAULT_MAX_CANDIDATES;
use crate::smtp_verify::{CatchAllOptions, ProbeOptions};

/// Pause between two candidate probes. Keeps a single source under five
/// RCPT probes per minute with some margin.
pub const DEFAULT_PROBE_DELAY: Duration = Duration::from_secs(13);

/// Knobs for one [`EmailFinder`](super::EmailFinder).
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinderOptions {
    pub max_candidates: usize,
    pub probe_delay: Duration,
    /// When disabled, candidates are probed even on catch-all domains.
    pub catch_all_check: bool,
    pub probe: ProbeOptions,
    pub catch_all: CatchAllOptions,
    pub dns: DnsOptions,
}

impl Default for FinderOptions {
    fn default() -> Self {
        Self {
            max_candidates: DEFAULT_MAX_CANDIDATES,
            probe_delay: DEFAULT_PROBE_DELAY,
            catch_all_check: true,
            probe: ProbeOptions::default(),
            catch_all: CatchAllOptions::default(),
            dns: DnsOptions::default(),
        }
    }
}
