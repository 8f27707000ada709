//! Profile-completion gate. Applies to patients only; authentication and
//! role gating run upstream, so everyone else short-circuits to Allow.

use std::sync::Arc;

use tracing::warn;

use crate::cache::PreconditionCache;
use crate::error::ServiceError;
use crate::policy::{self, Decision, RouteRequirement};
use crate::routes::{PreconditionKind, RouteTable};
use crate::services::ProfileService;
use crate::session::SessionStore;
use crate::subject::Role;

use super::{CheckCycle, SubjectKey};

/// Completeness score below this is an unmet precondition.
pub const DEFAULT_MIN_PERCENT: u8 = 50;

pub struct ProfileGuard {
    session: Arc<SessionStore>,
    cache: Arc<PreconditionCache>,
    routes: Arc<RouteTable>,
    profiles: Arc<dyn ProfileService>,
    min_percent: u8,
    last_key: Option<SubjectKey>,
    cycle: CheckCycle,
    fail_open: bool,
    remind_later: bool,
    /// Latest completeness score observed for the current subject; side
    /// channel for the remediation prompt ("your profile is 42% complete").
    pub last_percent: Option<u8>,
}

impl ProfileGuard {
    pub fn new(
        session: Arc<SessionStore>,
        cache: Arc<PreconditionCache>,
        routes: Arc<RouteTable>,
        profiles: Arc<dyn ProfileService>,
    ) -> Self {
        Self {
            session,
            cache,
            routes,
            profiles,
            min_percent: DEFAULT_MIN_PERCENT,
            last_key: None,
            cycle: CheckCycle::Idle,
            fail_open: false,
            remind_later: false,
            last_percent: None,
        }
    }

    pub fn with_minimum(mut self, percent: u8) -> Self {
        self.min_percent = percent;
        self
    }

    /// "Remind me later": stop prompting for the rest of this app session.
    /// Transient by design - the cache record is NOT marked satisfied, the
    /// underlying profile is still incomplete, and a full reload re-prompts.
    pub fn remind_later(&mut self) {
        self.remind_later = true;
    }

    fn requirement(&self) -> RouteRequirement {
        RouteRequirement::default()
            .with_precondition(PreconditionKind::ProfileCompletion)
            .exempt(self.routes.remedy_for(PreconditionKind::ProfileCompletion))
    }

    fn reset_cycle(&mut self, key: Option<SubjectKey>) {
        self.last_key = key;
        self.cycle = CheckCycle::Idle;
        self.fail_open = false;
        self.remind_later = false;
        self.last_percent = None;
    }

    pub async fn evaluate(&mut self, current_path: &str) -> Decision {
        let snap = self.session.snapshot();
        if snap.resolving {
            return Decision::Pending;
        }

        let key = snap.subject.as_ref().map(SubjectKey::of);
        if key != self.last_key {
            self.reset_cycle(key);
        }

        let requirement = self.requirement();
        if requirement.exempt_paths.contains(current_path) {
            return Decision::Allow;
        }

        // Orthogonal to authentication: only patients carry this precondition.
        let Some(subject) = snap.subject.as_ref().filter(|s| s.role == Role::patient()) else {
            return Decision::Allow;
        };
        if self.remind_later {
            return Decision::Allow;
        }

        let mut record = self.cache.get(&subject.id, PreconditionKind::ProfileCompletion);
        if record.is_none() {
            match self.cycle {
                CheckCycle::Checking => return Decision::Pending,
                CheckCycle::Resolved if self.fail_open => return Decision::Allow,
                // Idle, or a resolved record has aged out of the freshness
                // window: issue the one remote check for this subject.
                _ => {
                    self.cycle = CheckCycle::Checking;
                    let outcome = self.profiles.profile_completion(&subject.id).await;

                    // Identity may have changed while the check was in
                    // flight; a stale subject's outcome never applies to the
                    // new subject's decision. Back to Idle so a later cycle
                    // for the same key starts a fresh check instead of
                    // parking on the discarded one.
                    let now = self.session.snapshot();
                    if now.subject.as_ref().map(SubjectKey::of) != self.last_key {
                        self.cycle = CheckCycle::Idle;
                        return Decision::Pending;
                    }
                    self.cycle = CheckCycle::Resolved;
                    match outcome {
                        Ok(pc) => {
                            // Contract says 0-100; clamp rather than trust.
                            let percent = pc.percent.min(100);
                            self.last_percent = Some(percent);
                            let satisfied = percent >= self.min_percent;
                            self.cache.put(&subject.id, PreconditionKind::ProfileCompletion, satisfied);
                        }
                        Err(ServiceError::NotFound) => {
                            // No profile yet: a legitimate "definitely unmet".
                            self.cache.put(&subject.id, PreconditionKind::ProfileCompletion, false);
                        }
                        Err(e) => {
                            // Fail open: protected areas stay reachable when
                            // the profile service itself is degraded.
                            warn!(target: "caregate::guard", "profile check failed open subject={}: {}", subject.id, e);
                            self.fail_open = true;
                            return Decision::Allow;
                        }
                    }
                    record = self.cache.get(&subject.id, PreconditionKind::ProfileCompletion);
                }
            }
        }
        policy::evaluate(&snap, &requirement, current_path, record.as_ref(), &self.routes)
    }
}
