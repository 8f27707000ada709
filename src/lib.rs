//! caregate: session and access-gating engine for the healthcare portal
//! client. For every navigation into a protected area it decides whether the
//! visitor may proceed, must be blocked, or must first satisfy an outstanding
//! precondition (incomplete profile, unregistered clinic). The server remains
//! the ultimate authority; this layer is a UX guard, not a security boundary.

pub mod cache;
pub mod diag;
pub mod error;
pub mod guard;
pub mod policy;
pub mod routes;
pub mod services;
pub mod session;
pub mod storage;
pub mod subject;

use serde::Deserialize;

/// Knobs an app shell may load from configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct GateConfig {
    /// Profile completeness score required before the patient area stops
    /// prompting for remediation.
    #[serde(default = "d_min_profile_percent")]
    pub min_profile_percent: u8,
    /// Freshness window for cached precondition outcomes, in seconds.
    #[serde(default = "d_freshness_secs")]
    pub freshness_secs: u64,
}

fn d_min_profile_percent() -> u8 { 50 }
fn d_freshness_secs() -> u64 { 60 }

impl Default for GateConfig {
    fn default() -> Self {
        Self { min_profile_percent: d_min_profile_percent(), freshness_secs: d_freshness_secs() }
    }
}

impl GateConfig {
    pub fn freshness(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.freshness_secs)
    }
}
