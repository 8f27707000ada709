//! Keyed, time-limited memo of remote precondition outcomes, shared by every
//! guard controller for the lifetime of the app session. In-memory only.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use tracing::debug;

use crate::routes::PreconditionKind;

/// TTL after which a record must be recomputed.
pub const DEFAULT_FRESHNESS: Duration = Duration::from_secs(60);

/// Outcome of one remote precondition check. Keyed jointly by subject id and
/// kind; a record for subject A is never readable when evaluating subject B.
#[derive(Debug, Clone)]
pub struct CheckRecord {
    pub subject_id: String,
    pub kind: PreconditionKind,
    pub satisfied: bool,
    pub computed_at: Instant,
}

pub struct PreconditionCache {
    freshness: Duration,
    inner: RwLock<HashMap<(String, PreconditionKind), CheckRecord>>,
}

impl Default for PreconditionCache {
    fn default() -> Self { Self::new(DEFAULT_FRESHNESS) }
}

impl PreconditionCache {
    pub fn new(freshness: Duration) -> Self {
        Self { freshness, inner: RwLock::new(HashMap::new()) }
    }

    /// Fresh records only; anything at or past the freshness window reads as
    /// absent and the caller must recompute.
    pub fn get(&self, subject_id: &str, kind: PreconditionKind) -> Option<CheckRecord> {
        let map = self.inner.read();
        let rec = map.get(&(subject_id.to_string(), kind))?;
        if rec.computed_at.elapsed() < self.freshness {
            Some(rec.clone())
        } else {
            debug!(target: "caregate::cache", "stale record subject={} kind={:?}", subject_id, kind);
            None
        }
    }

    /// Overwrites any prior record for the key. Last writer wins, which is
    /// safe because controllers permit a single in-flight check per key.
    pub fn put(&self, subject_id: &str, kind: PreconditionKind, satisfied: bool) {
        debug!(target: "caregate::cache", "put subject={} kind={:?} satisfied={}", subject_id, kind, satisfied);
        let rec = CheckRecord {
            subject_id: subject_id.to_string(),
            kind,
            satisfied,
            computed_at: Instant::now(),
        };
        self.inner.write().insert((subject_id.to_string(), kind), rec);
    }

    /// Drop every record for the subject, all kinds. Called on logout, and
    /// explicitly after a remediation action so the next check reflects
    /// reality instead of waiting out the TTL.
    pub fn invalidate(&self, subject_id: &str) {
        let mut map = self.inner.write();
        let before = map.len();
        map.retain(|(sid, _), _| sid != subject_id);
        debug!(target: "caregate::cache", "invalidate subject={} dropped={}", subject_id, before - map.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_within_window_after_put() {
        let cache = PreconditionCache::default();
        cache.put("u-1", PreconditionKind::ProfileCompletion, true);
        let a = cache.get("u-1", PreconditionKind::ProfileCompletion).unwrap();
        let b = cache.get("u-1", PreconditionKind::ProfileCompletion).unwrap();
        assert!(a.satisfied && b.satisfied);
        assert_eq!(a.subject_id, "u-1");
    }

    #[test]
    fn stale_record_reads_as_absent() {
        let cache = PreconditionCache::new(Duration::from_millis(20));
        cache.put("u-1", PreconditionKind::ClinicRegistered, true);
        assert!(cache.get("u-1", PreconditionKind::ClinicRegistered).is_some());
        std::thread::sleep(Duration::from_millis(40));
        assert!(cache.get("u-1", PreconditionKind::ClinicRegistered).is_none());
    }

    #[test]
    fn put_overwrites_rather_than_accumulates() {
        let cache = PreconditionCache::default();
        cache.put("u-1", PreconditionKind::ProfileCompletion, false);
        cache.put("u-1", PreconditionKind::ProfileCompletion, true);
        assert!(cache.get("u-1", PreconditionKind::ProfileCompletion).unwrap().satisfied);
        assert_eq!(cache.inner.read().len(), 1);
    }

    #[test]
    fn invalidate_drops_all_kinds_for_subject_only() {
        let cache = PreconditionCache::default();
        cache.put("u-1", PreconditionKind::ProfileCompletion, true);
        cache.put("u-1", PreconditionKind::ClinicRegistered, true);
        cache.put("u-2", PreconditionKind::ProfileCompletion, true);
        cache.invalidate("u-1");
        assert!(cache.get("u-1", PreconditionKind::ProfileCompletion).is_none());
        assert!(cache.get("u-1", PreconditionKind::ClinicRegistered).is_none());
        assert!(cache.get("u-2", PreconditionKind::ProfileCompletion).is_some());
    }

    #[test]
    fn records_are_namespaced_per_subject_and_kind() {
        let cache = PreconditionCache::default();
        cache.put("u-1", PreconditionKind::ProfileCompletion, false);
        assert!(cache.get("u-1", PreconditionKind::ClinicRegistered).is_none());
        assert!(cache.get("u-2", PreconditionKind::ProfileCompletion).is_none());
    }
}
