//! Candidate local-part generation from a person's name.
//!
//! The public entry point is [`generate_candidates`]. Output is deterministic,
//! deduplicated and ordered most-likely-first; its length is capped because
//! every candidate costs one rate-limited SMTP probe downstream.

mod normalize;
mod types;

pub use types::{Candidate, LocalPattern};

use std::collections::HashSet;

use normalize::name_tokens;

/// Calibrated cap on generated candidates.
pub const DEFAULT_MAX_CANDIDATES: usize = 5;

const SURNAME_PATTERNS: [LocalPattern; 4] = [
    LocalPattern::FirstDotLast,
    LocalPattern::InitialLast,
    LocalPattern::FirstLast,
    LocalPattern::InitialDotLast,
];

const FALLBACK_PATTERNS: [LocalPattern; 2] = [
    LocalPattern::FirstUnderscoreLast,
    LocalPattern::LastDotFirst,
];

/// Produces at most `limit` candidates for `first_name [last_name] @ domain`.
///
/// Order: the four surname patterns on the whole surname, then the bare first
/// name, then the same four patterns keyed on the last and on the first
/// surname token (compound surnames only), then `first_last` / `last.first`.
/// Compound given names keep their first token only.
///
/// An empty first name or domain, or one that normalises to nothing, yields
/// an empty list; callers treat that as invalid input.
pub fn generate_candidates(
    first_name: &str,
    last_name: Option<&str>,
    domain: &str,
    limit: usize,
) -> Vec<Candidate> {
    let domain = domain.trim().trim_end_matches('.').to_ascii_lowercase();
    let Some(first) = name_tokens(first_name).into_iter().next() else {
        return Vec::new();
    };
    if domain.is_empty() {
        return Vec::new();
    }

    let keys = surname_keys(&name_tokens(last_name.unwrap_or_default()));
    let mut out = CandidateList::new(&domain, limit);

    if let Some(primary) = keys.first() {
        for pattern in SURNAME_PATTERNS {
            out.push(pattern, &first, primary);
        }
    }
    out.push(LocalPattern::First, &first, "");
    for key in keys.iter().skip(1) {
        for pattern in SURNAME_PATTERNS {
            out.push(pattern, &first, key);
        }
    }
    for key in &keys {
        for pattern in FALLBACK_PATTERNS {
            out.push(pattern, &first, key);
        }
    }

    out.into_inner()
}

/// Whole surname first, then the last and first tokens of a compound one.
fn surname_keys(tokens: &[String]) -> Vec<String> {
    let mut keys: Vec<String> = Vec::new();
    if tokens.is_empty() {
        return keys;
    }
    let candidates = [
        Some(tokens.concat()),
        tokens.last().cloned(),
        tokens.first().cloned(),
    ];
    for key in candidates.into_iter().flatten() {
        if !keys.contains(&key) {
            keys.push(key);
        }
    }
    keys
}

struct CandidateList<'a> {
    domain: &'a str,
    limit: usize,
    seen: HashSet<String>,
    items: Vec<Candidate>,
}

impl<'a> CandidateList<'a> {
    fn new(domain: &'a str, limit: usize) -> Self {
        Self {
            domain,
            limit,
            seen: HashSet::new(),
            items: Vec::new(),
        }
    }

    fn push(&mut self, pattern: LocalPattern, first: &str, last: &str) {
        if self.items.len() >= self.limit {
            return;
        }
        let local = pattern.render(first, last);
        if self.seen.insert(local.clone()) {
            self.items.push(Candidate {
                local,
                domain: self.domain.to_string(),
                pattern,
            });
        }
    }

    fn into_inner(self) -> Vec<Candidate> {
        self.items
    }
}
