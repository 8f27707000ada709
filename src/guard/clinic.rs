//! Clinic-registration gate. Applies to clinic administrators only. Unlike
//! the profile gate there is no "remind later" escape: the provider area
//! assumes a clinic exists, so remediation is mandatory.

use std::sync::Arc;

use tracing::warn;

use crate::cache::PreconditionCache;
use crate::error::ServiceError;
use crate::policy::{self, Decision, RouteRequirement};
use crate::routes::{PreconditionKind, RouteTable};
use crate::services::ClinicService;
use crate::session::SessionStore;
use crate::subject::Role;

use super::{CheckCycle, SubjectKey};

pub struct ClinicGuard {
    session: Arc<SessionStore>,
    cache: Arc<PreconditionCache>,
    routes: Arc<RouteTable>,
    clinics: Arc<dyn ClinicService>,
    last_key: Option<SubjectKey>,
    cycle: CheckCycle,
    fail_open: bool,
    /// Clinic resolved by the last successful lookup; side channel for the
    /// provider shell's header.
    pub last_clinic_id: Option<String>,
}

impl ClinicGuard {
    pub fn new(
        session: Arc<SessionStore>,
        cache: Arc<PreconditionCache>,
        routes: Arc<RouteTable>,
        clinics: Arc<dyn ClinicService>,
    ) -> Self {
        Self {
            session,
            cache,
            routes,
            clinics,
            last_key: None,
            cycle: CheckCycle::Idle,
            fail_open: false,
            last_clinic_id: None,
        }
    }

    fn requirement(&self) -> RouteRequirement {
        RouteRequirement::default()
            .with_precondition(PreconditionKind::ClinicRegistered)
            .exempt(self.routes.remedy_for(PreconditionKind::ClinicRegistered))
    }

    fn reset_cycle(&mut self, key: Option<SubjectKey>) {
        self.last_key = key;
        self.cycle = CheckCycle::Idle;
        self.fail_open = false;
        self.last_clinic_id = None;
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

        let Some(subject) = snap.subject.as_ref().filter(|s| s.role == Role::clinic_admin()) else {
            return Decision::Allow;
        };

        let mut record = self.cache.get(&subject.id, PreconditionKind::ClinicRegistered);
        if record.is_none() {
            match self.cycle {
                CheckCycle::Checking => return Decision::Pending,
                CheckCycle::Resolved if self.fail_open => return Decision::Allow,
                _ => {
                    self.cycle = CheckCycle::Checking;
                    let outcome = self.clinics.clinic_for_admin(&subject.id).await;

                    let now = self.session.snapshot();
                    if now.subject.as_ref().map(SubjectKey::of) != self.last_key {
                        // Settled for a subject who is no longer current; back
                        // to Idle so the same key can check afresh later.
                        self.cycle = CheckCycle::Idle;
                        return Decision::Pending;
                    }
                    self.cycle = CheckCycle::Resolved;
                    match outcome {
                        Ok(clinic) => {
                            self.last_clinic_id = Some(clinic.clinic_id);
                            self.cache.put(&subject.id, PreconditionKind::ClinicRegistered, true);
                        }
                        Err(ServiceError::NotFound) => {
                            // Unregistered administrator: definitely unmet.
                            self.cache.put(&subject.id, PreconditionKind::ClinicRegistered, false);
                        }
                        Err(e) => {
                            warn!(target: "caregate::guard", "clinic check failed open subject={}: {}", subject.id, e);
                            self.fail_open = true;
                            return Decision::Allow;
                        }
                    }
                    record = self.cache.get(&subject.id, PreconditionKind::ClinicRegistered);
                }
            }
        }
        policy::evaluate(&snap, &requirement, current_path, record.as_ref(), &self.routes)
    }
}
