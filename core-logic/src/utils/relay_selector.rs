//! # Core Logic - Relay Selector
//!
//! Adaptive selection over a pool of relay (proxy) endpoints. Each endpoint
//! carries an empirical reliability score that is nudged after every use;
//! persistently failing endpoints are excluded until most of the pool has
//! been excluded, at which point the whole pool becomes eligible again.

use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashSet;
use tracing::{debug, warn};

/// Score given to freshly registered endpoints.
pub const NEUTRAL_SCORE: f64 = 0.5;
/// Endpoints whose score drops below this are excluded.
pub const EXCLUSION_FLOOR: f64 = 0.2;
/// Fraction of the pool that, once excluded, triggers a full reset.
pub const RESET_FRACTION: f64 = 0.8;
/// Number of top-ranked endpoints to pick from.
pub const TOP_CANDIDATES: usize = 3;

const DECAY: f64 = 0.8;
const REWARD: f64 = 0.2;

/// A relay endpoint and its reliability state.
#[derive(Debug, Clone, PartialEq)]
pub struct RelayEndpoint {
    pub uri: String,
    pub score: f64,
    pub excluded: bool,
}

impl RelayEndpoint {
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            score: NEUTRAL_SCORE,
            excluded: false,
        }
    }
}

/// Pool counters exposed for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RelayStats {
    pub total: usize,
    pub available: usize,
    pub excluded: usize,
}

/// Chooses a relay per wallet attempt and tracks how each one performs.
///
/// Mutated only by the single orchestration flow, so no interior locking.
#[derive(Debug, Default)]
pub struct RelaySelector {
    endpoints: Vec<RelayEndpoint>,
}

impl RelaySelector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the pool. Every new endpoint starts at the neutral score;
    /// URIs already present are ignored.
    pub fn register<I, S>(&mut self, uris: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen: HashSet<String> = self.endpoints.iter().map(|e| e.uri.clone()).collect();
        for uri in uris {
            let uri = uri.into();
            if seen.insert(uri.clone()) {
                self.endpoints.push(RelayEndpoint::new(uri));
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn endpoint(&self, uri: &str) -> Option<&RelayEndpoint> {
        self.endpoints.iter().find(|e| e.uri == uri)
    }

    /// Pick an endpoint using the thread-local RNG.
    pub fn next(&mut self) -> Option<String> {
        self.next_with(&mut rand::thread_rng())
    }

    /// Pick an endpoint: reset exclusions if they cover ≥80% of the pool,
    /// rank the eligible endpoints by score and choose uniformly among
    /// the top `min(3, eligible)`.
    pub fn next_with<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<String> {
        if self.endpoints.is_empty() {
            return None;
        }

        let excluded = self.endpoints.iter().filter(|e| e.excluded).count();
        if excluded as f64 >= self.endpoints.len() as f64 * RESET_FRACTION {
            debug!(
                "{} of {} relays excluded, resetting exclusions",
                excluded,
                self.endpoints.len()
            );
            for endpoint in &mut self.endpoints {
                endpoint.excluded = false;
            }
        }

        let mut eligible: Vec<&RelayEndpoint> =
            self.endpoints.iter().filter(|e| !e.excluded).collect();
        if eligible.is_empty() {
            return None;
        }

        eligible.sort_by(|a, b| b.score.total_cmp(&a.score));
        let top = TOP_CANDIDATES.min(eligible.len());
        eligible[..top].choose(rng).map(|e| e.uri.clone())
    }

    pub fn record_success(&mut self, uri: &str) {
        if let Some(endpoint) = self.endpoints.iter_mut().find(|e| e.uri == uri) {
            endpoint.score = (endpoint.score * DECAY + REWARD).clamp(0.0, 1.0);
            if endpoint.score >= EXCLUSION_FLOOR {
                endpoint.excluded = false;
            }
        }
    }

    pub fn record_failure(&mut self, uri: &str) {
        if let Some(endpoint) = self.endpoints.iter_mut().find(|e| e.uri == uri) {
            endpoint.score = (endpoint.score * DECAY).clamp(0.0, 1.0);
            if endpoint.score < EXCLUSION_FLOOR && !endpoint.excluded {
                endpoint.excluded = true;
                warn!(
                    "Excluding relay {} (score {:.3})",
                    redact_credentials(uri),
                    endpoint.score
                );
            }
        }
    }

    pub fn stats(&self) -> RelayStats {
        let excluded = self.endpoints.iter().filter(|e| e.excluded).count();
        RelayStats {
            total: self.endpoints.len(),
            available: self.endpoints.len() - excluded,
            excluded,
        }
    }
}

/// Strip `user:pass@` from a relay URI before it reaches a log line.
pub fn redact_credentials(uri: &str) -> String {
    match (uri.find("://"), uri.rfind('@')) {
        (Some(scheme_end), Some(at)) if at > scheme_end => {
            format!("{}***@{}", &uri[..scheme_end + 3], &uri[at + 1..])
        }
        _ => uri.to_string(),
    }
}
